//! Error types for shotdiff collaborators

use thiserror::Error;

/// Result type alias using the shotdiff Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the build, capture, comparison, report and status collaborators
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Build failed: {0}")]
    Build(String),

    #[error("Capture failed: {0}")]
    Capture(String),

    #[error("Comparison failed for {screenshot}: {reason}")]
    Compare { screenshot: String, reason: String },

    #[error("Status publication failed: {0}")]
    Status(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl Error {
    pub fn compare(screenshot: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Compare {
            screenshot: screenshot.into(),
            reason: reason.into(),
        }
    }
}
