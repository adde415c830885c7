//! The host image seam: how the pipeline borrows an externally owned bitmap.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{ColorLensError, Result};
use crate::image::{ImageInfo, PixelFormat};

/// An externally owned image the pipeline may lock and rewrite in place.
///
/// This mirrors a platform bitmap API: query info, lock, touch pixels,
/// unlock. The pipeline never calls [`locked_pixels`](Self::locked_pixels)
/// outside a successful `lock_pixels` / `unlock_pixels` pair.
pub trait HostImage {
    /// Identity used to serialize concurrent calls on the same image.
    fn handle_id(&self) -> usize;

    /// Geometry and pixel format.
    fn info(&self) -> Result<ImageInfo>;

    /// Acquire exclusive access to the pixels. Must fail fast, not block.
    fn lock_pixels(&mut self) -> Result<()>;

    /// The locked pixel bytes.
    fn locked_pixels(&mut self) -> &mut [u8];

    /// Release the lock taken by `lock_pixels`.
    fn unlock_pixels(&mut self);
}

static NEXT_HANDLE: AtomicUsize = AtomicUsize::new(1);

/// Heap-backed host image, used by the demo CLI and tests.
#[derive(Debug)]
pub struct MemoryImage {
    id: usize,
    info: ImageInfo,
    data: Vec<u8>,
    locked: bool,
}

impl MemoryImage {
    pub fn new(info: ImageInfo, data: Vec<u8>) -> Self {
        Self {
            id: NEXT_HANDLE.fetch_add(1, Ordering::Relaxed),
            info,
            data,
            locked: false,
        }
    }

    /// Tightly packed canonical RGBA bytes.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self::new(ImageInfo::packed(width, height, PixelFormat::Rgba8888Bytes), data)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }
}

/// A clone owns its own pixel buffer, so it gets a fresh handle and starts
/// unlocked.
impl Clone for MemoryImage {
    fn clone(&self) -> Self {
        Self::new(self.info, self.data.clone())
    }
}

impl HostImage for MemoryImage {
    fn handle_id(&self) -> usize {
        self.id
    }

    fn info(&self) -> Result<ImageInfo> {
        Ok(self.info)
    }

    fn lock_pixels(&mut self) -> Result<()> {
        if self.locked {
            return Err(ColorLensError::LockAcquisition(
                "image is already locked".to_string(),
            ));
        }
        self.locked = true;
        Ok(())
    }

    fn locked_pixels(&mut self) -> &mut [u8] {
        &mut self.data
    }

    fn unlock_pixels(&mut self) {
        self.locked = false;
    }
}
