//! Error taxonomy shared by every ColorLens component.

use crate::image::PixelFormat;

/// Errors raised inside the core. The FFI layer flattens these into
/// boolean / null results; nothing here ever crosses the C boundary.
#[derive(Debug, thiserror::Error)]
pub enum ColorLensError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("unsupported pixel format: {format}")]
    UnsupportedFormat { format: PixelFormat },

    #[error("failed to lock image: {0}")]
    LockAcquisition(String),

    #[error("failed to allocate {bytes} bytes for pixel buffer")]
    ResourceExhausted { bytes: usize },

    #[error("asset not found: {0}")]
    AssetNotFound(String),

    #[error("transform cancelled at row {row}")]
    Cancelled { row: u32 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ColorLensError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

pub type Result<T, E = ColorLensError> = std::result::Result<T, E>;
