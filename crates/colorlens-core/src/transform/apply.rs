//! In-place application of a transform descriptor to a canonical RGBA buffer.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{ColorLensError, Result};
use crate::image::{BYTES_PER_PIXEL, CanonicalBuffer};
use crate::transform::params::{TransformDescriptor, TransformKind};
use crate::transform::simulate::{CvdSimulator, MachadoSimulator};

/// Applies [`TransformDescriptor`]s using a pluggable simulator.
#[derive(Clone)]
pub struct ColorTransform {
    simulator: Arc<dyn CvdSimulator>,
}

impl ColorTransform {
    pub fn new(simulator: Arc<dyn CvdSimulator>) -> Self {
        Self { simulator }
    }

    /// Mutate `buffer` in place.
    ///
    /// Only the first `width * 4` bytes of each of the `height` rows are
    /// touched; row padding and anything past `height * stride` is left
    /// alone. When `cancel` is set the loop stops between rows and returns
    /// [`ColorLensError::Cancelled`], leaving the buffer partially written.
    pub fn apply(
        &self,
        descriptor: &TransformDescriptor,
        buffer: &mut [u8],
        width: u32,
        height: u32,
        stride: usize,
        cancel: Option<&AtomicBool>,
    ) -> Result<()> {
        if width == 0 || height == 0 {
            return Err(ColorLensError::invalid(format!(
                "image has zero dimensions ({width}x{height})"
            )));
        }
        let row_bytes = (width as usize)
            .checked_mul(BYTES_PER_PIXEL)
            .ok_or_else(|| ColorLensError::invalid("row size overflows"))?;
        if stride < row_bytes {
            return Err(ColorLensError::invalid(format!(
                "stride {stride} is smaller than row size {row_bytes}"
            )));
        }
        let needed = (height as usize)
            .checked_mul(stride)
            .ok_or_else(|| ColorLensError::invalid("image size overflows"))?;
        if buffer.len() < needed {
            return Err(ColorLensError::invalid(format!(
                "buffer holds {} bytes, needs {needed}",
                buffer.len()
            )));
        }

        let TransformKind::Simulate(deficiency) = descriptor.kind() else {
            return Ok(());
        };
        let severity = descriptor.severity();

        for (y, row) in buffer[..needed].chunks_exact_mut(stride).enumerate() {
            if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                return Err(ColorLensError::Cancelled { row: y as u32 });
            }
            let pixels: &mut [[u8; 4]] = bytemuck::cast_slice_mut(&mut row[..row_bytes]);
            self.simulator.simulate_row(deficiency, severity, pixels);
        }
        Ok(())
    }

    /// Convenience wrapper over [`apply`](Self::apply) for a canonical buffer.
    pub fn apply_buffer(
        &self,
        descriptor: &TransformDescriptor,
        buffer: &mut CanonicalBuffer,
        cancel: Option<&AtomicBool>,
    ) -> Result<()> {
        let (width, height, stride) = (buffer.width(), buffer.height(), buffer.stride());
        self.apply(descriptor, buffer.as_bytes_mut(), width, height, stride, cancel)
    }
}

impl Default for ColorTransform {
    fn default() -> Self {
        Self::new(Arc::new(MachadoSimulator))
    }
}

impl std::fmt::Debug for ColorTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColorTransform").finish_non_exhaustive()
    }
}
