// Copyright 2024-2026 VPL Dispatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Session creation and teardown for the C surface.
//!
//! The `mfxSession` given to C callers is a boxed [`Session`]; the vendor
//! session inside it is reachable through [`MFXGetVendorSession`].

use super::error::{fail, set_last_error};
use super::loader::mfxLoader;
use crate::abi::{mfxSession, MfxStatus};
use crate::loader::Session;

fn into_raw(session: Session) -> mfxSession {
    Box::into_raw(Box::new(session)) as mfxSession
}

/// Create a session on the `i`-th selectable implementation.
///
/// # Safety
/// `loader` must be a live loader handle and `session` writable.
#[no_mangle]
pub unsafe extern "C" fn MFXCreateSession(
    loader: mfxLoader,
    i: u32,
    session: *mut mfxSession,
) -> MfxStatus {
    if loader.is_null() || session.is_null() {
        set_last_error("null pointer argument");
        return MfxStatus::NULL_PTR;
    }
    let handle = &mut *loader;
    match handle.loader.create_session(i) {
        Ok(s) => {
            *session = into_raw(s);
            MfxStatus::NONE
        }
        Err(e) => fail(e),
    }
}

/// Close a session and free its handle, whatever the runtime reports.
///
/// # Safety
/// `session` must come from [`MFXCreateSession`] or [`MFXCloneSession`]
/// and must not be used afterwards.
#[no_mangle]
pub unsafe extern "C" fn MFXClose(session: mfxSession) -> MfxStatus {
    if session.is_null() {
        set_last_error("null pointer argument");
        return MfxStatus::INVALID_HANDLE;
    }
    let session = Box::from_raw(session as *mut Session);
    match session.close() {
        Ok(()) => MfxStatus::NONE,
        Err(e) => fail(e),
    }
}

/// Create a secondary session joined to `session`.
///
/// # Safety
/// `session` must be a live session handle and `clone` writable.
#[no_mangle]
pub unsafe extern "C" fn MFXCloneSession(session: mfxSession, clone: *mut mfxSession) -> MfxStatus {
    if session.is_null() {
        set_last_error("null pointer argument");
        return MfxStatus::INVALID_HANDLE;
    }
    if clone.is_null() {
        set_last_error("null pointer argument");
        return MfxStatus::NULL_PTR;
    }
    let parent = &*(session as *const Session);
    match parent.try_clone() {
        Ok(child) => {
            *clone = into_raw(child);
            MfxStatus::NONE
        }
        Err(e) => fail(e),
    }
}

/// The vendor runtime's own handle for `session`, or null.
///
/// # Safety
/// `session` must be a live session handle or null.
#[no_mangle]
pub unsafe extern "C" fn MFXGetVendorSession(session: mfxSession) -> mfxSession {
    if session.is_null() {
        return std::ptr::null_mut();
    }
    (*(session as *const Session)).as_raw()
}
