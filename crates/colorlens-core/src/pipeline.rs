//! Bitmap transform pipeline: lock → decode → transform → encode → unlock.
//!
//! Every acquisition is a guard whose `Drop` releases it, so the host lock
//! and the per-handle in-flight slot are released on every exit path. The
//! host image is only written by the final encode, which runs after the
//! transform has succeeded; a failed call leaves the image untouched.

use std::collections::HashSet;
use std::sync::atomic::AtomicBool;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::codec;
use crate::error::{ColorLensError, Result};
use crate::host::HostImage;
use crate::image::{ImageView, PixelFormat};
use crate::transform::apply::ColorTransform;
use crate::transform::params::TransformDescriptor;

/// What to do when the host reports a pixel format the codec cannot map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormatPolicy {
    /// Log a warning and treat the pixels as packed `0xAARRGGBB` words.
    /// Colors may come out wrong; this keeps older hosts working.
    #[default]
    Permissive,
    /// Fail with [`ColorLensError::UnsupportedFormat`].
    Strict,
}

/// Summary of a successful `process` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessReport {
    pub width: u32,
    pub height: u32,
    /// Format the host reported.
    pub reported_format: PixelFormat,
    /// Format the pixels were actually decoded as.
    pub decoded_format: PixelFormat,
}

/// Orchestrates one in-place transform of a host image.
#[derive(Debug, Default)]
pub struct BitmapTransformPipeline {
    transform: ColorTransform,
    format_policy: FormatPolicy,
    in_flight: Mutex<HashSet<usize>>,
}

impl BitmapTransformPipeline {
    pub fn new(transform: ColorTransform, format_policy: FormatPolicy) -> Self {
        Self {
            transform,
            format_policy,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn format_policy(&self) -> FormatPolicy {
        self.format_policy
    }

    /// Transform `host` in place.
    pub fn process<H: HostImage + ?Sized>(
        &self,
        host: &mut H,
        descriptor: &TransformDescriptor,
    ) -> Result<ProcessReport> {
        self.process_with_cancel(host, descriptor, None)
    }

    /// Transform `host` in place, checking `cancel` between rows.
    pub fn process_with_cancel<H: HostImage + ?Sized>(
        &self,
        host: &mut H,
        descriptor: &TransformDescriptor,
        cancel: Option<&AtomicBool>,
    ) -> Result<ProcessReport> {
        let _slot = InFlightSlot::acquire(&self.in_flight, host.handle_id())?;

        let info = host.info()?;
        let decoded_format = self.resolve_format(info.format)?;

        let mut lock = PixelLock::acquire(host)?;
        let mut view = ImageView::new(lock.pixels(), info)?;
        view.assume_format(decoded_format);

        let mut canonical = codec::decode(&view)?;
        self.transform.apply_buffer(descriptor, &mut canonical, cancel)?;
        codec::encode(&canonical, &mut view)?;

        tracing::info!(
            "processed bitmap (w={} h={}, {:?}, severity {:.2})",
            info.width,
            info.height,
            descriptor.kind(),
            descriptor.severity()
        );

        Ok(ProcessReport {
            width: info.width,
            height: info.height,
            reported_format: info.format,
            decoded_format,
        })
    }

    /// Read the RGBA of the pixel nearest the normalized coordinate
    /// `(nx, ny)`, clamped into the image.
    pub fn sample<H: HostImage + ?Sized>(&self, host: &mut H, nx: f32, ny: f32) -> Result<[u8; 4]> {
        let _slot = InFlightSlot::acquire(&self.in_flight, host.handle_id())?;

        let info = host.info()?;
        let decoded_format = self.resolve_format(info.format)?;

        let mut lock = PixelLock::acquire(host)?;
        let mut view = ImageView::new(lock.pixels(), info)?;
        view.assume_format(decoded_format);

        let x = normalized_to_index(nx, info.width);
        let y = normalized_to_index(ny, info.height);
        codec::decode_pixel(&view, x, y)
    }

    fn resolve_format(&self, reported: PixelFormat) -> Result<PixelFormat> {
        if reported.is_supported() {
            return Ok(reported);
        }
        match self.format_policy {
            FormatPolicy::Strict => Err(ColorLensError::UnsupportedFormat { format: reported }),
            FormatPolicy::Permissive => {
                tracing::warn!(
                    "bitmap format is {reported}, not a supported 8888 layout; attempting to continue as ARGB words"
                );
                Ok(PixelFormat::Argb8888Word)
            }
        }
    }
}

/// Round `n * extent` to a pixel index clamped to `[0, extent - 1]`.
fn normalized_to_index(n: f32, extent: u32) -> u32 {
    if extent == 0 || !n.is_finite() {
        return 0;
    }
    let max = (extent - 1) as f32;
    (n * extent as f32).round().clamp(0.0, max) as u32
}

/// Marks a handle as busy for the lifetime of the guard.
struct InFlightSlot<'a> {
    set: &'a Mutex<HashSet<usize>>,
    id: usize,
}

impl<'a> InFlightSlot<'a> {
    fn acquire(set: &'a Mutex<HashSet<usize>>, id: usize) -> Result<Self> {
        if !set.lock().insert(id) {
            return Err(ColorLensError::LockAcquisition(format!(
                "image {id:#x} already has a transform in flight"
            )));
        }
        Ok(Self { set, id })
    }
}

impl Drop for InFlightSlot<'_> {
    fn drop(&mut self) {
        self.set.lock().remove(&self.id);
    }
}

/// Holds the host pixel lock; unlocks on drop.
struct PixelLock<'h, H: HostImage + ?Sized> {
    host: &'h mut H,
}

impl<'h, H: HostImage + ?Sized> PixelLock<'h, H> {
    fn acquire(host: &'h mut H) -> Result<Self> {
        host.lock_pixels()?;
        Ok(Self { host })
    }

    fn pixels(&mut self) -> &mut [u8] {
        self.host.locked_pixels()
    }
}

impl<H: HostImage + ?Sized> Drop for PixelLock<'_, H> {
    fn drop(&mut self) {
        self.host.unlock_pixels();
    }
}
