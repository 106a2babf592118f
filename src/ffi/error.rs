// Copyright 2024-2026 VPL Dispatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Thread-local error message for the C surface.

use std::cell::RefCell;
use std::ffi::{c_char, CString};

use crate::abi::MfxStatus;
use crate::error::DispatchError;

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

pub(crate) fn set_last_error(msg: impl Into<String>) {
    let msg = msg.into().replace('\0', " ");
    let c = CString::new(msg).unwrap_or_default();
    LAST_ERROR.with(|e| *e.borrow_mut() = Some(c));
}

/// Record `err` and return its status.
pub(crate) fn fail(err: DispatchError) -> MfxStatus {
    set_last_error(err.to_string());
    err.status()
}

/// Message for the last failed call on this thread, or null.
///
/// The string is owned by the library and valid until the next failing
/// call on the same thread; do not free it.
#[no_mangle]
pub extern "C" fn vpl_get_last_error() -> *const c_char {
    LAST_ERROR.with(|e| e.borrow().as_ref().map_or(std::ptr::null(), |s| s.as_ptr()))
}

#[no_mangle]
pub extern "C" fn vpl_clear_last_error() {
    LAST_ERROR.with(|e| *e.borrow_mut() = None);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;

    #[test]
    fn test_last_error_round_trip() {
        vpl_clear_last_error();
        assert!(vpl_get_last_error().is_null());

        let status = fail(DispatchError::NotFound("index 3".into()));
        assert_eq!(status, MfxStatus::NOT_FOUND);
        let msg = unsafe { CStr::from_ptr(vpl_get_last_error()) };
        assert_eq!(msg.to_str().unwrap(), "not found: index 3");

        vpl_clear_last_error();
        assert!(vpl_get_last_error().is_null());
    }

    #[test]
    fn test_interior_nul_does_not_drop_message() {
        set_last_error("bad\0name");
        let msg = unsafe { CStr::from_ptr(vpl_get_last_error()) };
        assert_eq!(msg.to_str().unwrap(), "bad name");
    }
}
