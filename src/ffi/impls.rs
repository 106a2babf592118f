// Copyright 2024-2026 VPL Dispatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Implementation enumeration for the C surface.

use super::error::{fail, set_last_error};
use super::loader::mfxLoader;
use crate::abi::{mfxHDL, CapsFormat, MfxStatus};

/// Return a capability handle for the `i`-th selectable implementation.
///
/// Triggers discovery on first use. Past the last implementation the
/// status is `MFX_ERR_NOT_FOUND`; an unknown format is
/// `MFX_ERR_UNSUPPORTED`.
///
/// # Safety
/// `loader` must be a live loader handle and `idesc` writable.
#[no_mangle]
pub unsafe extern "C" fn MFXEnumImplementations(
    loader: mfxLoader,
    i: u32,
    format: u32,
    idesc: *mut mfxHDL,
) -> MfxStatus {
    if loader.is_null() || idesc.is_null() {
        set_last_error("null pointer argument");
        return MfxStatus::NULL_PTR;
    }
    let Some(format) = CapsFormat::from_raw(format) else {
        set_last_error(format!("unknown capability format {format}"));
        return MfxStatus::UNSUPPORTED;
    };

    let handle = &mut *loader;
    match handle.loader.enum_implementations(i, format) {
        Ok(hdl) => {
            *idesc = hdl;
            MfxStatus::NONE
        }
        Err(e) => fail(e),
    }
}

/// Give back a handle from [`MFXEnumImplementations`].
///
/// # Safety
/// `loader` must be a live loader handle.
#[no_mangle]
pub unsafe extern "C" fn MFXDispReleaseImplDescription(
    loader: mfxLoader,
    hdl: mfxHDL,
) -> MfxStatus {
    if loader.is_null() {
        set_last_error("null pointer argument");
        return MfxStatus::NULL_PTR;
    }
    let handle = &mut *loader;
    match handle.loader.release_impl_description(hdl) {
        Ok(()) => MfxStatus::NONE,
        Err(e) => fail(e),
    }
}
