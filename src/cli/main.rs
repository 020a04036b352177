//! Signature stamp CLI
//!
//! One-shot generation from a file, an interactive prompt loop, or (with the
//! `web` feature) the HTTP form server.

use super::config::CliConfigBuilder;
use crate::{
    services::{download_file_name, StampIOService},
    tracing_config::{init_cli_tracing, TracingFormat},
    Caption, SignatureStamper,
};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info};

/// Signature stamp generator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "sigstamp")]
pub struct Cli {
    /// Photo or scan of the handwritten signature
    #[arg(value_name = "INPUT")]
    pub input: Option<PathBuf>,

    /// Signer name (first caption line)
    #[arg(short, long)]
    pub name: Option<String>,

    /// Registration ID (second caption line)
    #[arg(short, long)]
    pub registration: Option<String>,

    /// Optional free-text third caption line
    #[arg(short, long)]
    pub caption: Option<String>,

    /// Output PNG file [default: "Signature - <name>.png"]
    #[arg(short, long, value_name = "OUTPUT")]
    pub output: Option<PathBuf>,

    /// API key for the background removal service
    #[arg(long, env = "REMBG_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Background removal endpoint
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Request timeout in seconds [default: transport default]
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Bold TrueType font for the caption
    #[arg(long, value_name = "PATH", conflicts_with = "builtin_font")]
    pub font: Option<PathBuf>,

    /// Use the built-in bitmap font instead of a TrueType file
    #[arg(long)]
    pub builtin_font: bool,

    /// Caption font size in pixels per em
    #[arg(long)]
    pub font_size: Option<f32>,

    /// Label shown before the registration ID (e.g. CRM)
    #[arg(long)]
    pub label: Option<String>,

    /// Print resolution written to the PNG
    #[arg(long)]
    pub dpi: Option<u32>,

    /// JSON configuration file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Prompt for signatures in a loop until an empty image path is entered
    #[arg(short, long)]
    pub interactive: bool,

    /// Serve the HTTP form on this address (e.g. 127.0.0.1:5000)
    #[cfg(feature = "web")]
    #[arg(long, value_name = "ADDR")]
    pub serve: Option<std::net::SocketAddr>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = CliLogFormat::Console)]
    pub log_format: CliLogFormat,

    /// Enable verbose logging (-v: DEBUG, -vv: TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum CliLogFormat {
    Console,
    Compact,
}

impl Cli {
    #[cfg(feature = "web")]
    pub(crate) fn serve_addr(&self) -> Option<std::net::SocketAddr> {
        self.serve
    }

    #[cfg(not(feature = "web"))]
    pub(crate) fn serve_addr(&self) -> Option<std::net::SocketAddr> {
        None
    }
}

pub async fn main() -> Result<()> {
    let cli = Cli::parse();

    let format = match cli.log_format {
        CliLogFormat::Console => TracingFormat::Console,
        CliLogFormat::Compact => TracingFormat::Compact,
    };
    init_cli_tracing(cli.verbose, format).context("Failed to initialize tracing")?;

    CliConfigBuilder::validate_cli(&cli).context("Invalid CLI arguments")?;
    let config = CliConfigBuilder::from_cli(&cli).context("Failed to build configuration")?;

    #[cfg(feature = "web")]
    if let Some(addr) = cli.serve_addr() {
        return crate::web::serve(addr, config).await;
    }

    let stamper = SignatureStamper::from_config(config)
        .context("Failed to set up the background removal client")?;

    if cli.interactive {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        let mut output = io::stdout();
        return run_interactive(&stamper, &mut input, &mut output, Path::new(".")).await;
    }

    let input = cli
        .input
        .as_deref()
        .context("An input image is required")?;
    let name = cli.name.as_deref().unwrap_or_default();
    let registration = cli.registration.as_deref().unwrap_or_default();
    let caption = stamper
        .caption(name, registration, cli.caption.as_deref())
        .context("Invalid caption")?;
    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| StampIOService::default_output_path(".", caption.name()));

    let saved = process_one(&stamper, input, &caption, &output).await?;
    println!("Signature stamp saved to {}", saved.display());
    Ok(())
}

/// Read, generate and save one stamp
async fn process_one(
    stamper: &SignatureStamper,
    input: &Path,
    caption: &Caption,
    output: &Path,
) -> Result<PathBuf> {
    info!("Processing {}", input.display());
    let bytes = StampIOService::read_source(input)?;

    let spinner = create_spinner("Removing background...");
    let result = stamper.generate(&bytes, caption).await;
    spinner.finish_and_clear();
    let stamp = result.with_context(|| format!("Failed to process {}", input.display()))?;

    StampIOService::save_stamp(&stamp, output, stamper.config().dpi)?;
    Ok(output.to_path_buf())
}

fn create_spinner(message: &'static str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Print `label`, read one trimmed line; `None` on end of input
fn prompt<R: BufRead, W: Write>(input: &mut R, output: &mut W, label: &str) -> io::Result<Option<String>> {
    write!(output, "{}", label)?;
    output.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Terminal loop: one stamp per round, saved into `out_dir`
///
/// Per-signature failures are reported and the loop continues; an empty image
/// path or end of input ends it.
pub async fn run_interactive<R: BufRead, W: Write>(
    stamper: &SignatureStamper,
    input: &mut R,
    output: &mut W,
    out_dir: &Path,
) -> Result<()> {
    writeln!(output, "Signature stamp generator (empty image path to quit)")?;
    loop {
        let Some(path) = prompt(input, output, "\nImage path: ")? else {
            break;
        };
        if path.is_empty() {
            break;
        }
        let Some(name) = prompt(input, output, "Name: ")? else {
            break;
        };
        let Some(registration) = prompt(input, output, "Registration ID: ")? else {
            break;
        };
        let free_text = prompt(input, output, "Caption line (optional): ")?.unwrap_or_default();

        let caption = match stamper.caption(&name, &registration, Some(&free_text)) {
            Ok(caption) => caption,
            Err(e) => {
                writeln!(output, "Error: {}", e)?;
                continue;
            },
        };
        let destination = out_dir.join(download_file_name(caption.name()));
        match process_one(stamper, Path::new(&path), &caption, &destination).await {
            Ok(saved) => writeln!(output, "Saved {}", saved.display())?,
            Err(e) => {
                error!("{:#}", e);
                writeln!(output, "Error: {:#}", e)?;
            },
        }
    }
    writeln!(output, "Bye")?;
    Ok(())
}
