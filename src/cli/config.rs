//! Configuration conversion utilities for CLI arguments

use crate::cli::main_impl::Cli;
use crate::config::{StampConfig, StampConfigBuilder};
use anyhow::{Context, Result};
use std::path::PathBuf;

/// Convert CLI arguments to a `StampConfig`
pub(crate) struct CliConfigBuilder;

impl CliConfigBuilder {
    /// Build the configuration: config file (or defaults), then flag overrides
    pub(crate) fn from_cli(cli: &Cli) -> Result<StampConfig> {
        let base = match &cli.config {
            Some(path) => StampConfig::from_file(path)
                .with_context(|| format!("Failed to load config file {}", path.display()))?,
            None => StampConfig::default(),
        };

        let mut builder = StampConfigBuilder::from_config(base);
        if let Some(api_key) = &cli.api_key {
            builder = builder.api_key(api_key.clone());
        }
        if let Some(endpoint) = &cli.endpoint {
            builder = builder.endpoint(endpoint.clone());
        }
        if cli.timeout.is_some() {
            builder = builder.timeout_secs(cli.timeout);
        }
        if cli.builtin_font {
            builder = builder.font_path(None::<PathBuf>);
        } else if let Some(font) = &cli.font {
            builder = builder.font_path(Some(font.clone()));
        }
        if let Some(size) = cli.font_size {
            builder = builder.font_size(size);
        }
        if let Some(label) = &cli.label {
            builder = builder.registration_label(label.clone());
        }
        if let Some(dpi) = cli.dpi {
            builder = builder.dpi(dpi);
        }

        builder.build().context("Invalid configuration")
    }

    /// Check that a one-shot run has everything it needs
    pub(crate) fn validate_cli(cli: &Cli) -> Result<()> {
        if cli.interactive || cli.serve_addr().is_some() {
            return Ok(());
        }
        if cli.input.is_none() {
            anyhow::bail!("An input image is required (or use --interactive)");
        }
        if cli.name.as_deref().map_or(true, |n| n.trim().is_empty()) {
            anyhow::bail!("--name is required");
        }
        if cli.registration.as_deref().map_or(true, |r| r.trim().is_empty()) {
            anyhow::bail!("--registration is required");
        }
        Ok(())
    }
}
