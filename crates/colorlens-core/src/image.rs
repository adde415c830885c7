//! Image representations: host pixel formats, borrowed host views and the
//! canonical RGBA buffer used between decode and encode.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ColorLensError, Result};

/// Bytes per pixel for every supported packed format and the canonical layout.
pub const BYTES_PER_PIXEL: usize = 4;

/// Pixel layout tag reported by the host for an image.
///
/// Numeric codes follow the Android bitmap format constants where one exists;
/// the packed-word and BGRA layouts use codes above `0x100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelFormat {
    /// Bytes in memory R, G, B, A (Android `RGBA_8888`).
    Rgba8888Bytes,
    /// Native-endian 32-bit words laid out as `0xAARRGGBB`.
    Argb8888Word,
    /// Bytes in memory B, G, R, A.
    Bgra8888Bytes,
    /// 16-bit 5-6-5. Recognized, not supported.
    Rgb565,
    /// 16-bit 4-4-4-4. Recognized, not supported.
    Rgba4444,
    /// 8-bit alpha mask. Recognized, not supported.
    Alpha8,
    /// Half-float RGBA. Recognized, not supported.
    RgbaF16,
    /// Any code this crate does not know.
    Other(u32),
}

impl PixelFormat {
    /// Map a host format code to a format tag.
    pub const fn from_code(code: u32) -> Self {
        match code {
            1 => Self::Rgba8888Bytes,
            4 => Self::Rgb565,
            7 => Self::Rgba4444,
            8 => Self::Alpha8,
            9 => Self::RgbaF16,
            0x100 => Self::Argb8888Word,
            0x101 => Self::Bgra8888Bytes,
            other => Self::Other(other),
        }
    }

    /// Host format code for this tag.
    pub const fn code(self) -> u32 {
        match self {
            Self::Rgba8888Bytes => 1,
            Self::Rgb565 => 4,
            Self::Rgba4444 => 7,
            Self::Alpha8 => 8,
            Self::RgbaF16 => 9,
            Self::Argb8888Word => 0x100,
            Self::Bgra8888Bytes => 0x101,
            Self::Other(code) => code,
        }
    }

    /// Whether the codec can decode and encode this format.
    pub const fn is_supported(self) -> bool {
        matches!(
            self,
            Self::Rgba8888Bytes | Self::Argb8888Word | Self::Bgra8888Bytes
        )
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rgba8888Bytes => write!(f, "RGBA_8888"),
            Self::Argb8888Word => write!(f, "ARGB_8888 (packed word)"),
            Self::Bgra8888Bytes => write!(f, "BGRA_8888"),
            Self::Rgb565 => write!(f, "RGB_565"),
            Self::Rgba4444 => write!(f, "RGBA_4444"),
            Self::Alpha8 => write!(f, "A_8"),
            Self::RgbaF16 => write!(f, "RGBA_F16"),
            Self::Other(code) => write!(f, "unknown format {code}"),
        }
    }
}

/// Geometry and format of a host image, as reported before locking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row stride in bytes.
    pub stride: usize,
    /// Host pixel layout.
    pub format: PixelFormat,
}

impl ImageInfo {
    /// Tightly packed 4-byte-per-pixel image info.
    pub fn packed(width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            width,
            height,
            stride: width as usize * BYTES_PER_PIXEL,
            format,
        }
    }

    /// Bytes a pixel slice must hold for this geometry. The final row may
    /// omit its padding.
    pub fn min_len(&self) -> Result<usize> {
        let row_bytes = (self.width as usize)
            .checked_mul(BYTES_PER_PIXEL)
            .ok_or_else(|| ColorLensError::invalid("row size overflows"))?;
        (self.height as usize)
            .saturating_sub(1)
            .checked_mul(self.stride)
            .and_then(|n| n.checked_add(row_bytes))
            .ok_or_else(|| ColorLensError::invalid("image size overflows"))
    }

    fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ColorLensError::invalid(format!(
                "image has zero dimensions ({}x{})",
                self.width, self.height
            )));
        }
        let row_bytes = self.width as usize * BYTES_PER_PIXEL;
        if self.stride < row_bytes {
            return Err(ColorLensError::invalid(format!(
                "stride {} is smaller than row size {row_bytes}",
                self.stride
            )));
        }
        Ok(())
    }
}

/// A host-owned, mutable pixel buffer borrowed for the duration of one call.
///
/// Construction validates the declared geometry against the slice, so every
/// row accessor is in bounds.
#[derive(Debug)]
pub struct ImageView<'a> {
    pixels: &'a mut [u8],
    info: ImageInfo,
}

impl<'a> ImageView<'a> {
    /// Wrap a host pixel slice.
    pub fn new(pixels: &'a mut [u8], info: ImageInfo) -> Result<Self> {
        info.validate()?;
        let needed = info.min_len()?;
        if pixels.len() < needed {
            return Err(ColorLensError::invalid(format!(
                "pixel buffer holds {} bytes, {}x{} with stride {} needs {needed}",
                pixels.len(),
                info.width,
                info.height,
                info.stride
            )));
        }
        Ok(Self { pixels, info })
    }

    pub fn info(&self) -> ImageInfo {
        self.info
    }

    pub fn width(&self) -> u32 {
        self.info.width
    }

    pub fn height(&self) -> u32 {
        self.info.height
    }

    pub fn format(&self) -> PixelFormat {
        self.info.format
    }

    /// Reinterpret the pixels under a different format tag. Used by the
    /// permissive unsupported-format policy.
    pub fn assume_format(&mut self, format: PixelFormat) {
        self.info.format = format;
    }

    /// Pixel bytes of row `y`, without padding.
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.info.stride;
        &self.pixels[start..start + self.row_bytes()]
    }

    /// Mutable pixel bytes of row `y`, without padding.
    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let start = y as usize * self.info.stride;
        let len = self.row_bytes();
        &mut self.pixels[start..start + len]
    }

    fn row_bytes(&self) -> usize {
        self.info.width as usize * BYTES_PER_PIXEL
    }
}

/// Canonical RGBA8 buffer: R, G, B, A one byte each, row-major.
///
/// `data.len() == height * stride` and `stride >= width * 4` always hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalBuffer {
    data: Vec<u8>,
    width: u32,
    height: u32,
    stride: usize,
}

impl CanonicalBuffer {
    /// Zeroed, tightly packed buffer.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        Self::with_stride(width, height, width as usize * BYTES_PER_PIXEL)
    }

    /// Zeroed buffer with `stride` bytes per row.
    pub fn with_stride(width: u32, height: u32, stride: usize) -> Result<Self> {
        ImageInfo {
            width,
            height,
            stride,
            format: PixelFormat::Rgba8888Bytes,
        }
        .validate()?;

        let len = (height as usize).checked_mul(stride).ok_or(
            ColorLensError::ResourceExhausted { bytes: usize::MAX },
        )?;
        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| ColorLensError::ResourceExhausted { bytes: len })?;
        data.resize(len, 0);

        Ok(Self {
            data,
            width,
            height,
            stride,
        })
    }

    /// Wrap tightly packed RGBA bytes.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let stride = width as usize * BYTES_PER_PIXEL;
        if data.len() != height as usize * stride {
            return Err(ColorLensError::invalid(format!(
                "{} bytes do not describe a {width}x{height} RGBA image",
                data.len()
            )));
        }
        let mut buffer = Self::with_stride(width, height, stride)?;
        buffer.data = data;
        Ok(buffer)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Pixel bytes of row `y`, without padding.
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.stride;
        &self.data[start..start + self.width as usize * BYTES_PER_PIXEL]
    }

    /// Mutable pixel bytes of row `y`, without padding.
    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let start = y as usize * self.stride;
        let len = self.width as usize * BYTES_PER_PIXEL;
        &mut self.data[start..start + len]
    }

    /// RGBA of the pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = y as usize * self.stride + x as usize * BYTES_PER_PIXEL;
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }
}
