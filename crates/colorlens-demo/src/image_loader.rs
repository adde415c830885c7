//! Image file I/O for the demo, bridging the `image` crate and host images.

use std::path::Path;

use colorlens_core::{ColorLensError, MemoryImage};

/// Load an image from disk as a tightly packed RGBA8 host image.
pub fn load_image(path: &Path) -> Result<MemoryImage, DemoError> {
    let rgba = image::open(path).map_err(DemoError::Decode)?.to_rgba8();
    let (width, height) = rgba.dimensions();
    tracing::debug!("loaded {} ({width}x{height})", path.display());
    Ok(MemoryImage::from_rgba(width, height, rgba.into_raw()))
}

/// Write an RGBA8 host image to disk. Format follows the extension.
pub fn save_image(path: &Path, image: MemoryImage) -> Result<(), DemoError> {
    let info = colorlens_core::HostImage::info(&image)?;
    let buffer = image::RgbaImage::from_raw(info.width, info.height, image.into_data())
        .ok_or(DemoError::Geometry)?;
    buffer.save(path).map_err(DemoError::Encode)
}

/// Errors surfaced by the demo binary.
#[derive(Debug, thiserror::Error)]
pub enum DemoError {
    #[error("failed to decode image: {0}")]
    Decode(image::ImageError),
    #[error("failed to encode image: {0}")]
    Encode(image::ImageError),
    #[error("pixel buffer does not match image dimensions")]
    Geometry,
    #[error(transparent)]
    Core(#[from] ColorLensError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
