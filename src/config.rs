//! Configuration types for signature stamp generation

use crate::error::{Result, StampError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default background-removal endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.rembg.com/rmbg";

/// Default bold TrueType font looked up for the caption
pub const DEFAULT_FONT_FILE: &str = "DejaVuSans-Bold.ttf";

/// Settings for the external segmentation service
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    /// Endpoint receiving the multipart upload
    pub endpoint: String,

    /// API key sent in the `x-api-key` header
    pub api_key: String,

    /// Request timeout in seconds (None = transport default)
    pub timeout_secs: Option<u64>,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: String::new(),
            timeout_secs: None,
        }
    }
}

// Keeps the API key out of debug logs.
impl std::fmt::Debug for SegmentationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SegmentationConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &if self.api_key.is_empty() { "<unset>" } else { "<redacted>" })
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Configuration for stamp generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StampConfig {
    /// Segmentation service settings
    pub segmentation: SegmentationConfig,

    /// Bold TrueType font for the caption (None = built-in bitmap font)
    pub font_path: Option<PathBuf>,

    /// Caption font size in pixels per em
    pub font_size: f32,

    /// Label prefixed to the registration ID ("ID: 12345-SP")
    pub registration_label: String,

    /// Print resolution written into exported PNG files
    pub dpi: u32,
}

impl Default for StampConfig {
    fn default() -> Self {
        Self {
            segmentation: SegmentationConfig::default(),
            font_path: Some(PathBuf::from(DEFAULT_FONT_FILE)),
            font_size: 11.0,
            registration_label: "ID".to_string(),
            dpi: 300,
        }
    }
}

impl StampConfig {
    /// Create a new configuration builder
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sigstamp::StampConfig;
    ///
    /// let config = StampConfig::builder()
    ///     .api_key("secret")
    ///     .registration_label("CRM")
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(config.dpi, 300);
    /// ```
    #[must_use]
    pub fn builder() -> StampConfigBuilder {
        StampConfigBuilder::default()
    }

    /// Load a JSON configuration file; missing fields take their defaults
    ///
    /// # Errors
    /// - File cannot be read
    /// - File is not valid JSON for this structure
    /// - Loaded values fail validation
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| StampError::file_io_error("read config file", path, &e))?;
        let config: Self = serde_json::from_str(&contents).map_err(|e| {
            StampError::invalid_config(format!("{}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration parameters
    ///
    /// # Errors
    /// - Empty segmentation endpoint
    /// - Font size outside (0, 64]
    /// - DPI outside 1-2400
    pub fn validate(&self) -> Result<()> {
        if self.segmentation.endpoint.trim().is_empty() {
            return Err(StampError::invalid_config(
                "segmentation endpoint must not be empty",
            ));
        }

        if !(self.font_size > 0.0 && self.font_size <= 64.0) {
            return Err(StampError::config_value_error(
                "font size",
                self.font_size,
                "0-64",
                Some(11.0),
            ));
        }

        if self.dpi == 0 || self.dpi > 2400 {
            return Err(StampError::config_value_error(
                "dpi",
                self.dpi,
                "1-2400",
                Some(300),
            ));
        }

        Ok(())
    }
}

/// Builder for `StampConfig`
#[derive(Debug, Default)]
pub struct StampConfigBuilder {
    config: StampConfig,
}

impl StampConfigBuilder {
    /// Start from an existing configuration (e.g. one loaded from disk)
    #[must_use]
    pub fn from_config(config: StampConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn api_key<S: Into<String>>(mut self, api_key: S) -> Self {
        self.config.segmentation.api_key = api_key.into();
        self
    }

    #[must_use]
    pub fn endpoint<S: Into<String>>(mut self, endpoint: S) -> Self {
        self.config.segmentation.endpoint = endpoint.into();
        self
    }

    #[must_use]
    pub fn timeout_secs(mut self, timeout_secs: Option<u64>) -> Self {
        self.config.segmentation.timeout_secs = timeout_secs;
        self
    }

    /// Set the caption font; `None` selects the built-in font
    #[must_use]
    pub fn font_path<P: Into<PathBuf>>(mut self, font_path: Option<P>) -> Self {
        self.config.font_path = font_path.map(Into::into);
        self
    }

    #[must_use]
    pub fn font_size(mut self, font_size: f32) -> Self {
        self.config.font_size = font_size;
        self
    }

    #[must_use]
    pub fn registration_label<S: Into<String>>(mut self, label: S) -> Self {
        self.config.registration_label = label.into();
        self
    }

    #[must_use]
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi;
        self
    }

    /// Build the configuration
    ///
    /// # Errors
    /// - Any rule checked by [`StampConfig::validate`]
    pub fn build(self) -> Result<StampConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = StampConfig::default();
        assert_eq!(config.segmentation.endpoint, DEFAULT_ENDPOINT);
        assert!(config.segmentation.timeout_secs.is_none());
        assert_eq!(config.registration_label, "ID");
        assert_eq!(config.dpi, 300);
        assert!((config.font_size - 11.0).abs() < f32::EPSILON);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_validation() {
        assert!(StampConfig::builder().dpi(0).build().is_err());
        assert!(StampConfig::builder().font_size(0.0).build().is_err());
        assert!(StampConfig::builder().font_size(f32::NAN).build().is_err());
        assert!(StampConfig::builder().endpoint("  ").build().is_err());

        let config = StampConfig::builder()
            .api_key("k")
            .font_path(None::<PathBuf>)
            .timeout_secs(Some(30))
            .build()
            .unwrap();
        assert!(config.font_path.is_none());
        assert_eq!(config.segmentation.timeout_secs, Some(30));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = StampConfig::builder().api_key("super-secret").build().unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_from_file_partial_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "registration_label": "CRM", "segmentation": {{ "api_key": "abc" }} }}"#
        )
        .unwrap();

        let config = StampConfig::from_file(file.path()).unwrap();
        assert_eq!(config.registration_label, "CRM");
        assert_eq!(config.segmentation.api_key, "abc");
        assert_eq!(config.segmentation.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.dpi, 300);
    }

    #[test]
    fn test_from_file_rejects_invalid_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "dpi": 0 }}"#).unwrap();
        let err = StampConfig::from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("dpi"));

        let missing = StampConfig::from_file("/nonexistent/sigstamp.json");
        assert!(matches!(missing, Err(StampError::Io(_))));
    }
}
