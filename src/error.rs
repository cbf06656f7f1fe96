//! Error types for element capture and export

use thiserror::Error;

/// Result type alias for capture and export operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while capturing or exporting an element
#[derive(Error, Debug)]
pub enum Error {
    /// Selector could not be parsed
    #[error("Invalid selector `{0}`")]
    InvalidSelector(String),

    /// No element in the document matches the selector
    #[error("No element matches `{0}`")]
    ElementNotFound(String),

    /// The rendering collaborator failed
    #[error("Rendering failed: {0}")]
    RenderError(String),

    /// Export was attempted before the capture completed
    #[error("Surface is not ready: capture has not completed")]
    SurfaceNotReady,

    /// Export was attempted after the capture failed
    #[error("Capture failed: {0}")]
    CaptureFailed(String),

    /// Failed to encode the surface
    #[error("Encoding failed: {0}")]
    EncodeError(String),

    /// Malformed data URL
    #[error("Invalid data URL: {0}")]
    DataUrlError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<png::EncodingError> for Error {
    fn from(err: png::EncodingError) -> Self {
        Error::EncodeError(err.to_string())
    }
}
