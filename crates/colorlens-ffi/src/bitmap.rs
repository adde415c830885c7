//! Host bitmap descriptor and its [`HostImage`] adapter.
//!
//! The descriptor mirrors the Android bitmap API: the host supplies
//! `get_info`, `lock_pixels` and `unlock_pixels` callbacks plus an opaque
//! `user_data` pointer identifying the bitmap.

use std::ffi::{c_int, c_void};
use std::ptr;

use colorlens_core::{ColorLensError, HostImage, ImageInfo, PixelFormat};

/// Callback status meaning success. Any other value is a failure.
pub const COLORLENS_RESULT_SUCCESS: c_int = 0;

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct ColorlensBitmapInfo {
    pub width: u32,
    pub height: u32,
    /// Row stride in bytes.
    pub stride: u32,
    /// Pixel format code (`1` = RGBA_8888, `0x100` = ARGB word, `0x101` = BGRA).
    pub format: u32,
}

pub type GetInfoFn = unsafe extern "C" fn(user_data: *mut c_void, info: *mut ColorlensBitmapInfo) -> c_int;
pub type LockPixelsFn = unsafe extern "C" fn(user_data: *mut c_void, pixels: *mut *mut c_void) -> c_int;
pub type UnlockPixelsFn = unsafe extern "C" fn(user_data: *mut c_void) -> c_int;

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ColorlensBitmap {
    pub user_data: *mut c_void,
    pub get_info: Option<GetInfoFn>,
    pub lock_pixels: Option<LockPixelsFn>,
    pub unlock_pixels: Option<UnlockPixelsFn>,
}

/// Borrowed view of a host descriptor for the duration of one call.
pub(crate) struct FfiBitmap<'a> {
    raw: &'a ColorlensBitmap,
    pixels: *mut u8,
    len: usize,
}

impl<'a> FfiBitmap<'a> {
    pub(crate) fn new(raw: &'a ColorlensBitmap) -> Self {
        Self {
            raw,
            pixels: ptr::null_mut(),
            len: 0,
        }
    }
}

impl HostImage for FfiBitmap<'_> {
    fn handle_id(&self) -> usize {
        if self.raw.user_data.is_null() {
            ptr::from_ref(self.raw) as usize
        } else {
            self.raw.user_data as usize
        }
    }

    fn info(&self) -> colorlens_core::Result<ImageInfo> {
        let get_info = self
            .raw
            .get_info
            .ok_or_else(|| ColorLensError::InvalidArgument("bitmap has no get_info".into()))?;
        let mut info = ColorlensBitmapInfo::default();
        // SAFETY: host callback contract; `info` is a valid out-pointer.
        let status = unsafe { get_info(self.raw.user_data, &mut info) };
        if status != COLORLENS_RESULT_SUCCESS {
            return Err(ColorLensError::InvalidArgument(format!(
                "get_info failed with status {status}"
            )));
        }
        Ok(ImageInfo {
            width: info.width,
            height: info.height,
            stride: info.stride as usize,
            format: PixelFormat::from_code(info.format),
        })
    }

    fn lock_pixels(&mut self) -> colorlens_core::Result<()> {
        let lock = self
            .raw
            .lock_pixels
            .ok_or_else(|| ColorLensError::LockAcquisition("bitmap has no lock_pixels".into()))?;
        let len = self.info()?.min_len()?;

        let mut pixels: *mut c_void = ptr::null_mut();
        // SAFETY: host callback contract; `pixels` is a valid out-pointer.
        let status = unsafe { lock(self.raw.user_data, &mut pixels) };
        if status != COLORLENS_RESULT_SUCCESS {
            return Err(ColorLensError::LockAcquisition(format!(
                "lock_pixels failed with status {status}"
            )));
        }
        if pixels.is_null() {
            self.unlock_pixels();
            return Err(ColorLensError::LockAcquisition(
                "lock_pixels returned a null buffer".into(),
            ));
        }
        self.pixels = pixels.cast();
        self.len = len;
        Ok(())
    }

    fn locked_pixels(&mut self) -> &mut [u8] {
        if self.pixels.is_null() {
            return &mut [];
        }
        // SAFETY: while locked the host guarantees `stride * height` bytes at
        // `pixels`; `len` never exceeds that.
        unsafe { std::slice::from_raw_parts_mut(self.pixels, self.len) }
    }

    fn unlock_pixels(&mut self) {
        self.pixels = ptr::null_mut();
        self.len = 0;
        if let Some(unlock) = self.raw.unlock_pixels {
            // SAFETY: host callback contract.
            let status = unsafe { unlock(self.raw.user_data) };
            if status != COLORLENS_RESULT_SUCCESS {
                tracing::warn!("unlock_pixels returned status {status}");
            }
        }
    }
}
