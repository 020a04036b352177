//! Error types for signature stamp generation

use thiserror::Error;

/// Result type alias for stamp generation operations
pub type Result<T> = std::result::Result<T, StampError>;

/// Error kinds surfaced by the stamp pipeline and its adapters
#[derive(Error, Debug)]
pub enum StampError {
    /// The segmentation service answered with a non-OK status or could not be reached
    #[error("Segmentation failed: {detail}")]
    SegmentationFailed {
        /// HTTP status when the service answered, `None` for transport failures
        status: Option<u16>,
        /// Status line and/or response body, or the transport error
        detail: String,
    },

    /// No ink pixels survived alpha thresholding
    #[error("Empty mask: the cutout contains no usable signature strokes")]
    EmptyMask,

    /// The caption leaves no vertical room for the mark
    #[error(
        "Infeasible layout: caption is {caption_height}px tall, leaving {available_height}px for the signature"
    )]
    InfeasibleLayout {
        /// Rendered height of the caption block in pixels
        caption_height: u32,
        /// Computed height budget for the mark (zero or negative)
        available_height: i64,
    },

    /// Caller supplied unusable input (empty name, empty image, ...)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid configuration or parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Input/output errors (file not found, permission denied, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image decoding or encoding errors
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// Encoding and other processing errors
    #[error("Processing error: {0}")]
    Processing(String),
}

impl StampError {
    /// Create a segmentation failure from a status code and detail message
    pub fn segmentation_failed<S: Into<String>>(status: Option<u16>, detail: S) -> Self {
        Self::SegmentationFailed {
            status,
            detail: detail.into(),
        }
    }

    /// Create a new invalid input error
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new invalid configuration error
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a new processing error
    pub fn processing<S: Into<String>>(msg: S) -> Self {
        Self::Processing(msg.into())
    }

    /// Create file I/O error with operation context
    pub fn file_io_error<P: AsRef<std::path::Path>>(
        operation: &str,
        path: P,
        error: &std::io::Error,
    ) -> Self {
        let path_display = path.as_ref().display();
        Self::Io(std::io::Error::new(
            error.kind(),
            format!("Failed to {} '{}': {}", operation, path_display, error),
        ))
    }

    /// Create configuration error with valid ranges
    pub fn config_value_error<T: std::fmt::Display>(
        parameter: &str,
        value: T,
        valid_range: &str,
        recommended: Option<T>,
    ) -> Self {
        let recommendation = match recommended {
            Some(rec) => format!(" Recommended: {}", rec),
            None => String::new(),
        };

        Self::InvalidConfig(format!(
            "Invalid {}: {} (valid range: {}).{}",
            parameter, value, valid_range, recommendation
        ))
    }

    /// HTTP status returned by the segmentation service, if any
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::SegmentationFailed { status, .. } => *status,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_error_creation() {
        let err = StampError::invalid_config("test config error");
        assert!(matches!(err, StampError::InvalidConfig(_)));

        let err = StampError::segmentation_failed(Some(403), "HTTP 403 Forbidden");
        assert!(matches!(err, StampError::SegmentationFailed { .. }));
        assert_eq!(err.status(), Some(403));
    }

    #[test]
    fn test_error_display() {
        let err = StampError::invalid_input("name must not be empty");
        assert_eq!(err.to_string(), "Invalid input: name must not be empty");

        let err = StampError::InfeasibleLayout {
            caption_height: 107,
            available_height: -2,
        };
        let msg = err.to_string();
        assert!(msg.contains("107px"));
        assert!(msg.contains("-2px"));
    }

    #[test]
    fn test_transport_failure_has_no_status() {
        let err = StampError::segmentation_failed(None, "connection refused");
        assert_eq!(err.status(), None);
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_enhanced_error_context() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = StampError::file_io_error("write stamp", Path::new("/out/stamp.png"), &io_error);
        let error_string = err.to_string();
        assert!(error_string.contains("write stamp"));
        assert!(error_string.contains("/out/stamp.png"));

        let err = StampError::config_value_error("dpi", 0, "1-2400", Some(300));
        let error_string = err.to_string();
        assert!(error_string.contains("dpi"));
        assert!(error_string.contains("1-2400"));
        assert!(error_string.contains("Recommended: 300"));
    }
}
