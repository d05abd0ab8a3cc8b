//! Error types for stitched screenshot operations

use thiserror::Error;

/// Result type alias for stitch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while capturing or stitching a page
#[derive(Error, Debug)]
pub enum Error {
    /// The driver or browser cannot perform the requested capture
    #[error("Driver does not support {0}")]
    UnsupportedCapability(String),

    /// A driver RPC response was malformed or missing required fields
    #[error("Driver protocol error: {0}")]
    Protocol(String),

    /// The driver's HTTP endpoint could not be reached
    #[error("Driver endpoint unreachable: {0}")]
    Connectivity(String),

    /// An in-page render signal did not arrive in time
    #[error("Render signal not received within {0}s")]
    Timeout(u64),

    /// In-page script execution failed
    #[error("Script execution failed: {0}")]
    Script(String),

    /// Decoding, cropping, compositing, or encoding pixel data failed
    #[error("Image processing failed: {0}")]
    Image(String),

    /// Filesystem error while writing the stitched output
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::Image(err.to_string())
    }
}
