//! Conversion between host pixel layouts and the canonical RGBA buffer.
//!
//! Each supported layout has exactly one pair of named channel-mapping
//! functions. Getting one of these wrong silently swaps red and blue, so
//! they are kept small and tested on their own.

use crate::error::{ColorLensError, Result};
use crate::image::{CanonicalBuffer, ImageView, PixelFormat};

/// Unpack a native-endian `0xAARRGGBB` word into canonical RGBA.
#[inline]
pub fn argb_word_to_rgba(word: u32) -> [u8; 4] {
    let a = (word >> 24) as u8;
    let r = (word >> 16) as u8;
    let g = (word >> 8) as u8;
    let b = word as u8;
    [r, g, b, a]
}

/// Pack canonical RGBA into a native-endian `0xAARRGGBB` word.
#[inline]
pub fn rgba_to_argb_word([r, g, b, a]: [u8; 4]) -> u32 {
    (a as u32) << 24 | (r as u32) << 16 | (g as u32) << 8 | b as u32
}

/// Reorder in-memory B, G, R, A bytes to canonical RGBA.
#[inline]
pub fn bgra_to_rgba([b, g, r, a]: [u8; 4]) -> [u8; 4] {
    [r, g, b, a]
}

/// Reorder canonical RGBA to in-memory B, G, R, A bytes.
#[inline]
pub fn rgba_to_bgra([r, g, b, a]: [u8; 4]) -> [u8; 4] {
    [b, g, r, a]
}

fn check_supported(format: PixelFormat) -> Result<()> {
    if format.is_supported() {
        Ok(())
    } else {
        Err(ColorLensError::UnsupportedFormat { format })
    }
}

/// Decode a host view into a freshly allocated, tightly packed canonical buffer.
pub fn decode(view: &ImageView<'_>) -> Result<CanonicalBuffer> {
    let format = view.format();
    check_supported(format)?;

    let mut out = CanonicalBuffer::new(view.width(), view.height())?;
    for y in 0..view.height() {
        let src: &[[u8; 4]] = bytemuck::cast_slice(view.row(y));
        let dst: &mut [[u8; 4]] = bytemuck::cast_slice_mut(out.row_mut(y));
        match format {
            PixelFormat::Rgba8888Bytes => dst.copy_from_slice(src),
            PixelFormat::Argb8888Word => {
                for (d, s) in dst.iter_mut().zip(src) {
                    *d = argb_word_to_rgba(u32::from_ne_bytes(*s));
                }
            }
            PixelFormat::Bgra8888Bytes => {
                for (d, s) in dst.iter_mut().zip(src) {
                    *d = bgra_to_rgba(*s);
                }
            }
            _ => unreachable!("format support checked above"),
        }
    }
    Ok(out)
}

/// Decode the single pixel at `(x, y)` without allocating a buffer.
pub fn decode_pixel(view: &ImageView<'_>, x: u32, y: u32) -> Result<[u8; 4]> {
    let format = view.format();
    check_supported(format)?;
    if x >= view.width() || y >= view.height() {
        return Err(ColorLensError::invalid(format!(
            "pixel ({x}, {y}) outside {}x{} image",
            view.width(),
            view.height()
        )));
    }
    let row: &[[u8; 4]] = bytemuck::cast_slice(view.row(y));
    let px = row[x as usize];
    Ok(match format {
        PixelFormat::Argb8888Word => argb_word_to_rgba(u32::from_ne_bytes(px)),
        PixelFormat::Bgra8888Bytes => bgra_to_rgba(px),
        _ => px,
    })
}

/// Encode a canonical buffer back into the host view. The buffer must have
/// the view's dimensions. Nothing is written unless validation passes.
pub fn encode(buffer: &CanonicalBuffer, view: &mut ImageView<'_>) -> Result<()> {
    let format = view.format();
    check_supported(format)?;
    if buffer.width() != view.width() || buffer.height() != view.height() {
        return Err(ColorLensError::invalid(format!(
            "buffer is {}x{}, image is {}x{}",
            buffer.width(),
            buffer.height(),
            view.width(),
            view.height()
        )));
    }

    for y in 0..view.height() {
        let src: &[[u8; 4]] = bytemuck::cast_slice(buffer.row(y));
        let dst: &mut [[u8; 4]] = bytemuck::cast_slice_mut(view.row_mut(y));
        match format {
            PixelFormat::Rgba8888Bytes => dst.copy_from_slice(src),
            PixelFormat::Argb8888Word => {
                for (d, s) in dst.iter_mut().zip(src) {
                    *d = rgba_to_argb_word(*s).to_ne_bytes();
                }
            }
            PixelFormat::Bgra8888Bytes => {
                for (d, s) in dst.iter_mut().zip(src) {
                    *d = rgba_to_bgra(*s);
                }
            }
            _ => unreachable!("format support checked above"),
        }
    }
    Ok(())
}
