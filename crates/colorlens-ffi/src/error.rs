use std::cell::RefCell;
use std::ffi::{CString, NulError};
use std::panic::{AssertUnwindSafe, catch_unwind};

use colorlens_core::ColorLensError;

#[derive(Debug, thiserror::Error)]
pub enum FfiError {
    #[error("null argument: {0}")]
    Null(&'static str),
    #[error("string contains interior NUL: {0}")]
    Nul(#[from] NulError),
    #[error("string is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error(transparent)]
    Core(#[from] ColorLensError),
    #[error("panic in {0}")]
    Panic(&'static str),
}

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

pub(crate) fn set_last_error(err: &FfiError) {
    let msg = CString::new(err.to_string().replace('\0', " ")).unwrap_or_default();
    LAST_ERROR.with(|slot| *slot.borrow_mut() = Some(msg));
}

pub(crate) fn clear_last_error() {
    LAST_ERROR.with(|slot| *slot.borrow_mut() = None);
}

/// Pointer to the current thread's last error message, or null.
pub(crate) fn last_error_ptr() -> *const std::ffi::c_char {
    LAST_ERROR.with(|slot| {
        slot.borrow()
            .as_ref()
            .map_or(std::ptr::null(), |s| s.as_ptr())
    })
}

/// Run `f`, converting both errors and panics into `fallback`.
///
/// Nothing may unwind into the host, so every exported function funnels
/// through here.
pub(crate) fn boundary<T>(name: &'static str, fallback: T, f: impl FnOnce() -> Result<T, FfiError>) -> T {
    clear_last_error();
    let err = match catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => return value,
        Ok(Err(err)) => err,
        Err(_) => FfiError::Panic(name),
    };
    tracing::error!("{name} failed: {err}");
    set_last_error(&err);
    fallback
}
