//! Window and input wrappers.
//!
//! The windowing stdlib is only implemented on platforms with a native
//! backend; everywhere else these are honest stubs that report failure
//! so programs can fall back to console behavior. The signatures are
//! fixed by the compiler's function table.

use std::ffi::c_char;
use std::sync::atomic::{AtomicBool, Ordering};

static WARNED: AtomicBool = AtomicBool::new(false);

fn warn_unsupported() {
    if !WARNED.swap(true, Ordering::Relaxed) {
        eprintln!("delta-runtime: windowing is not supported on this platform");
    }
}

/// Open a window; returns a handle, or -1 when unsupported.
///
/// # Safety
/// `_title` must be a valid NUL-terminated string or null.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn stdOpenWindow(_title: *const c_char, _width: i32, _height: i32) -> i32 {
    warn_unsupported();
    -1
}

#[unsafe(no_mangle)]
pub extern "C" fn stdIsWindowOpen(_handle: i32) -> i8 {
    0
}

#[unsafe(no_mangle)]
pub extern "C" fn stdUpdateWindow(_handle: i32) {}

#[unsafe(no_mangle)]
pub extern "C" fn stdDestroyWindow(_handle: i32) {}

#[unsafe(no_mangle)]
pub extern "C" fn stdIsKeyPressed(_handle: i32, _key: i32) -> i8 {
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stubs_report_closed_world() {
        let handle = unsafe { stdOpenWindow(std::ptr::null(), 640, 480) };
        assert_eq!(handle, -1);
        assert_eq!(stdIsWindowOpen(handle), 0);
        assert_eq!(stdIsKeyPressed(handle, 32), 0);
        stdUpdateWindow(handle);
        stdDestroyWindow(handle);
    }
}
