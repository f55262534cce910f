//! Error types of the editor crate.

use labeldesk_api::ApiError;
use labeldesk_api::types::DbId;
use thiserror::Error;

/// Errors that can occur while fetching and decoding an item image.
#[derive(Error, Debug)]
pub enum ImageLoadError {
    /// No candidate route returned an image
    #[error("no image available for item {item_id} ({attempts} routes tried{})", last_error_suffix(.last_error))]
    Unavailable {
        item_id: DbId,
        attempts: usize,
        last_error: Option<String>,
    },

    /// The payload looked like an image but did not decode
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    /// The blocking decode task did not finish
    #[error("decode task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

fn last_error_suffix(last: &Option<String>) -> String {
    match last {
        Some(e) => format!(", last error: {}", e),
        None => String::new(),
    }
}

/// Errors that end a job watch.
#[derive(Error, Debug)]
pub enum MonitorError {
    /// The backend does not know the job
    #[error("job {0} not found")]
    NotFound(DbId),

    /// The watch was cancelled before a terminal status
    #[error("job watch cancelled")]
    Cancelled,

    /// The backend failed in a way polling cannot recover from
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Errors that can occur when loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// Configuration version does not match
    #[error("Configuration file version {file_version} is not supported (expected {supported_version})")]
    UnsupportedVersion {
        file_version: u32,
        supported_version: u32,
    },

    /// I/O error when reading/writing config
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A setting has an unusable value
    #[error("Invalid setting {key}: {message}")]
    Invalid { key: &'static str, message: String },
}
