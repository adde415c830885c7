//! Exercises the C ABI the way a host would, with Rust-implemented callbacks.
#![allow(unsafe_code)]

use std::ffi::{CStr, CString, c_int, c_void};
use std::ptr;

use colorlens_ffi::*;

/// Host-side bitmap state behind `user_data`.
struct HostBitmap {
    info: ColorlensBitmapInfo,
    pixels: Vec<u8>,
    locked: bool,
    deny_lock: bool,
    locks: usize,
    unlocks: usize,
}

impl HostBitmap {
    fn argb(width: u32, height: u32, words: &[u32]) -> Self {
        Self {
            info: ColorlensBitmapInfo {
                width,
                height,
                stride: width * 4,
                format: 0x100,
            },
            pixels: words.iter().flat_map(|w| w.to_ne_bytes()).collect(),
            locked: false,
            deny_lock: false,
            locks: 0,
            unlocks: 0,
        }
    }

    fn descriptor(&mut self) -> ColorlensBitmap {
        ColorlensBitmap {
            user_data: ptr::from_mut(self).cast(),
            get_info: Some(get_info),
            lock_pixels: Some(lock_pixels),
            unlock_pixels: Some(unlock_pixels),
        }
    }
}

unsafe extern "C" fn get_info(user_data: *mut c_void, info: *mut ColorlensBitmapInfo) -> c_int {
    let host = unsafe { &*(user_data as *const HostBitmap) };
    unsafe { *info = host.info };
    COLORLENS_RESULT_SUCCESS
}

unsafe extern "C" fn lock_pixels(user_data: *mut c_void, pixels: *mut *mut c_void) -> c_int {
    let host = unsafe { &mut *(user_data as *mut HostBitmap) };
    if host.deny_lock || host.locked {
        return -1;
    }
    host.locked = true;
    host.locks += 1;
    unsafe { *pixels = host.pixels.as_mut_ptr().cast() };
    COLORLENS_RESULT_SUCCESS
}

unsafe extern "C" fn unlock_pixels(user_data: *mut c_void) -> c_int {
    let host = unsafe { &mut *(user_data as *mut HostBitmap) };
    host.locked = false;
    host.unlocks += 1;
    COLORLENS_RESULT_SUCCESS
}

fn take_string(s: *mut std::ffi::c_char) -> String {
    assert!(!s.is_null());
    let out = unsafe { CStr::from_ptr(s) }.to_string_lossy().into_owned();
    unsafe { colorlens_string_free(s) };
    out
}

#[test]
fn classify_returns_json_record() {
    let ctx = colorlens_context_new();
    let json = take_string(unsafe { colorlens_classify(ctx, 1.0, 0.0, 0.0) });
    assert!(json.contains(r#""rgb":"(255,0,0)""#), "{json}");
    assert!(json.contains(r#""name":"red-500""#), "{json}");
    unsafe { colorlens_context_free(ctx) };
}

#[test]
fn null_context_yields_null_and_error_message() {
    let s = unsafe { colorlens_classify(ptr::null(), 0.1, 0.2, 0.3) };
    assert!(s.is_null());
    let err = unsafe { CStr::from_ptr(colorlens_last_error()) }.to_string_lossy();
    assert!(err.contains("ctx"), "{err}");
}

#[test]
fn predict_dummy_is_fixed() {
    let json = take_string(colorlens_predict_dummy());
    assert!(json.starts_with(r##"{"name":"Red","hex":"#FF0000","rgb":"(255,0,0)","hsv":"(0,100,100)""##));
}

#[test]
fn init_model_reports_false_for_missing_inputs() {
    let ctx = colorlens_context_new();
    let name = CString::new("color_model.tflite").unwrap();
    assert!(!unsafe { colorlens_init_model(ctx, ptr::null(), name.as_ptr()) });

    let dir = tempfile::tempdir().unwrap();
    let root = CString::new(dir.path().to_str().unwrap()).unwrap();
    let storage = unsafe { colorlens_asset_storage_open_dir(root.as_ptr()) };
    assert!(!unsafe { colorlens_init_model(ctx, storage, name.as_ptr()) });

    std::fs::write(dir.path().join("color_model.tflite"), b"model").unwrap();
    std::fs::write(dir.path().join("color_labels.json"), b"\"Red\",\n\"Green\",\n\"Blue\",\n").unwrap();
    assert!(unsafe { colorlens_init_model(ctx, storage, name.as_ptr()) });

    unsafe {
        colorlens_asset_storage_free(storage);
        colorlens_context_free(ctx);
    }
}

#[test]
fn process_bitmap_simulates_in_place_and_unlocks() {
    let ctx = colorlens_context_new();
    let words = [0xFFFF_0000, 0xFF00_FF00, 0x8000_00FF, 0xFF80_8080];
    let mut host = HostBitmap::argb(2, 2, &words);
    let before = host.pixels.clone();
    let bitmap = host.descriptor();

    assert!(unsafe { colorlens_process_bitmap(ctx, &bitmap, 1, 1.0) });
    assert_eq!((host.locks, host.unlocks), (1, 1));
    assert!(!host.locked);
    assert_ne!(host.pixels, before, "deutan simulation should change saturated pixels");
    // Alpha bytes (the high byte of each word) are untouched.
    for (after, orig) in host.pixels.chunks(4).zip(before.chunks(4)) {
        let a = u32::from_ne_bytes(after.try_into().unwrap()) >> 24;
        let o = u32::from_ne_bytes(orig.try_into().unwrap()) >> 24;
        assert_eq!(a, o);
    }

    unsafe { colorlens_context_free(ctx) };
}

#[test]
fn process_bitmap_failures_leave_pixels_and_lock_alone() {
    let ctx = colorlens_context_new();
    let mut host = HostBitmap::argb(1, 1, &[0xFF12_3456]);
    let before = host.pixels.clone();

    host.deny_lock = true;
    let bitmap = host.descriptor();
    assert!(!unsafe { colorlens_process_bitmap(ctx, &bitmap, 0, 1.0) });
    assert_eq!((host.locks, host.unlocks), (0, 0));

    host.deny_lock = false;
    let bitmap = host.descriptor();
    assert!(!unsafe { colorlens_process_bitmap(ctx, &bitmap, 7, 1.0) });
    assert_eq!(host.pixels, before);
    assert_eq!(host.locks, host.unlocks);

    assert!(!unsafe { colorlens_process_bitmap(ctx, ptr::null(), 0, 1.0) });

    unsafe { colorlens_context_free(ctx) };
}

#[test]
fn sample_bitmap_reads_pixel_color() {
    let ctx = colorlens_context_new();
    let mut host = HostBitmap::argb(2, 1, &[0xFF00_00FF, 0xFF00_FF00]);
    let bitmap = host.descriptor();
    let json = take_string(unsafe { colorlens_sample_bitmap(ctx, &bitmap, 1.0, 0.0) });
    assert!(json.contains(r#""rgb":"(0,255,0)""#), "{json}");
    assert_eq!(host.locks, host.unlocks);
    unsafe { colorlens_context_free(ctx) };
}
