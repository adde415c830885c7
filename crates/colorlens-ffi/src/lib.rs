//! C ABI for the ColorLens native layer.
//!
//! A thin adapter over `colorlens-core`: every function validates its raw
//! arguments, calls into the core, and turns any error or panic into a
//! `false` / null result plus a `tracing` error and a thread-local message
//! readable through [`colorlens_last_error`].
#![allow(unsafe_code)]
// FFI exports necessarily take raw pointers.

mod bitmap;
mod error;

use std::ffi::{CStr, CString, c_char};
use std::path::PathBuf;

use colorlens_core::classify::dummy_prediction;
use colorlens_core::{ColorLens, ColorLensConfig, ColorPrediction, DirAssetStorage};

pub use bitmap::{
    COLORLENS_RESULT_SUCCESS, ColorlensBitmap, ColorlensBitmapInfo, GetInfoFn, LockPixelsFn,
    UnlockPixelsFn,
};
pub use error::FfiError;

use crate::bitmap::FfiBitmap;
use crate::error::{boundary, last_error_ptr};

/// Opaque context handed to the host.
pub struct ColorlensContext {
    lens: ColorLens,
}

/// Opaque asset storage handle.
pub struct ColorlensAssetStorage {
    storage: DirAssetStorage,
}

fn str_arg<'a>(ptr: *const c_char, name: &'static str) -> Result<&'a str, FfiError> {
    if ptr.is_null() {
        return Err(FfiError::Null(name));
    }
    // SAFETY: caller passes a valid NUL-terminated string.
    Ok(unsafe { CStr::from_ptr(ptr) }.to_str()?)
}

fn ref_arg<'a, T>(ptr: *const T, name: &'static str) -> Result<&'a T, FfiError> {
    // SAFETY: caller passes null or a pointer obtained from this library
    // (or a valid host struct) that outlives the call.
    unsafe { ptr.as_ref() }.ok_or(FfiError::Null(name))
}

fn into_c_string(prediction: &ColorPrediction) -> Result<*mut c_char, FfiError> {
    Ok(CString::new(prediction.to_json())?.into_raw())
}

/// Install a stderr `tracing` subscriber filtered by `COLORLENS_LOG`
/// (default `info`). Later calls are no-ops.
#[unsafe(no_mangle)]
pub extern "C" fn colorlens_init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_env("COLORLENS_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Create a context configured from `COLORLENS_*` environment variables.
#[unsafe(no_mangle)]
pub extern "C" fn colorlens_context_new() -> *mut ColorlensContext {
    boundary("colorlens_context_new", std::ptr::null_mut(), || {
        let lens = ColorLens::new(ColorLensConfig::from_env());
        Ok(Box::into_raw(Box::new(ColorlensContext { lens })))
    })
}

/// Free a context. Null is ignored.
///
/// # Safety
/// `ctx` must be null or come from [`colorlens_context_new`], and must not be
/// used afterwards.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn colorlens_context_free(ctx: *mut ColorlensContext) {
    if !ctx.is_null() {
        // SAFETY: pointer came from `Box::into_raw` in `colorlens_context_new`.
        drop(unsafe { Box::from_raw(ctx) });
    }
}

/// Open a directory as asset storage. Returns null on a null or non-UTF-8 path.
///
/// # Safety
/// `path` must be null or a valid NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn colorlens_asset_storage_open_dir(
    path: *const c_char,
) -> *mut ColorlensAssetStorage {
    boundary("colorlens_asset_storage_open_dir", std::ptr::null_mut(), || {
        let path = PathBuf::from(str_arg(path, "path")?);
        let storage = DirAssetStorage::new(path);
        Ok(Box::into_raw(Box::new(ColorlensAssetStorage { storage })))
    })
}

/// Free asset storage. Null is ignored.
///
/// # Safety
/// `storage` must be null or come from [`colorlens_asset_storage_open_dir`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn colorlens_asset_storage_free(storage: *mut ColorlensAssetStorage) {
    if !storage.is_null() {
        // SAFETY: pointer came from `Box::into_raw` in `colorlens_asset_storage_open_dir`.
        drop(unsafe { Box::from_raw(storage) });
    }
}

/// Load the model asset and the label palette. Returns false on a null
/// argument or an unreadable model asset; never unwinds.
///
/// # Safety
/// Pointers must be null or valid for the duration of the call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn colorlens_init_model(
    ctx: *const ColorlensContext,
    storage: *const ColorlensAssetStorage,
    asset_name: *const c_char,
) -> bool {
    boundary("colorlens_init_model", false, || {
        let ctx = ref_arg(ctx, "ctx")?;
        let storage = ref_arg(storage, "storage")?;
        let name = str_arg(asset_name, "asset_name")?;
        ctx.lens.init_model(&storage.storage, name)?;
        Ok(true)
    })
}

/// Classify normalized `[0, 1]` RGB. Returns a JSON record to be freed with
/// [`colorlens_string_free`]; null only for a null context.
///
/// # Safety
/// `ctx` must be null or a live context.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn colorlens_classify(
    ctx: *const ColorlensContext,
    r: f32,
    g: f32,
    b: f32,
) -> *mut c_char {
    boundary("colorlens_classify", std::ptr::null_mut(), || {
        let ctx = ref_arg(ctx, "ctx")?;
        into_c_string(&ctx.lens.classify(r, g, b))
    })
}

/// Fixed prediction for checking host wiring. Free with [`colorlens_string_free`].
#[unsafe(no_mangle)]
pub extern "C" fn colorlens_predict_dummy() -> *mut c_char {
    boundary("colorlens_predict_dummy", std::ptr::null_mut(), || {
        into_c_string(&dummy_prediction())
    })
}

/// Simulate a deficiency (0 protan, 1 deutan, 2 tritan) on the bitmap in
/// place. Severity is clamped into `[0, 1]`. On failure the bitmap is left
/// unmodified and its lock released.
///
/// # Safety
/// `ctx` and `bitmap` must be null or valid; the bitmap callbacks must honor
/// their documented contracts.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn colorlens_process_bitmap(
    ctx: *const ColorlensContext,
    bitmap: *const ColorlensBitmap,
    deficiency: i32,
    severity: f32,
) -> bool {
    boundary("colorlens_process_bitmap", false, || {
        let ctx = ref_arg(ctx, "ctx")?;
        let mut host = FfiBitmap::new(ref_arg(bitmap, "bitmap")?);
        ctx.lens.process_bitmap(&mut host, deficiency, severity)?;
        Ok(true)
    })
}

/// Classify the pixel nearest the normalized coordinate `(nx, ny)`.
/// Returns JSON to free with [`colorlens_string_free`], or null on failure.
///
/// # Safety
/// Same contract as [`colorlens_process_bitmap`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn colorlens_sample_bitmap(
    ctx: *const ColorlensContext,
    bitmap: *const ColorlensBitmap,
    nx: f32,
    ny: f32,
) -> *mut c_char {
    boundary("colorlens_sample_bitmap", std::ptr::null_mut(), || {
        let ctx = ref_arg(ctx, "ctx")?;
        let mut host = FfiBitmap::new(ref_arg(bitmap, "bitmap")?);
        into_c_string(&ctx.lens.sample(&mut host, nx, ny)?)
    })
}

/// Free a string returned by this library. Null is ignored.
///
/// # Safety
/// `s` must be null or a string returned by this library, freed once.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn colorlens_string_free(s: *mut c_char) {
    if !s.is_null() {
        // SAFETY: pointer came from `CString::into_raw`.
        drop(unsafe { CString::from_raw(s) });
    }
}

/// Last error message on the calling thread, or null. Valid until the next
/// ColorLens call on this thread.
#[unsafe(no_mangle)]
pub extern "C" fn colorlens_last_error() -> *const c_char {
    last_error_ptr()
}
