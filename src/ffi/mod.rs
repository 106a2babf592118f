// Copyright 2024-2026 VPL Dispatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! C entry points mirroring the dispatcher API.
//!
//! Every function checks its pointer arguments first, then maps a
//! [`DispatchError`](crate::error::DispatchError) to its `mfxStatus` and
//! records the message for [`vpl_get_last_error`].

#![allow(non_snake_case)]
#![allow(clippy::missing_safety_doc)]

mod error;
mod impls;
mod loader;
mod session;

pub use error::{vpl_clear_last_error, vpl_get_last_error};
pub use impls::{MFXDispReleaseImplDescription, MFXEnumImplementations};
pub use loader::{
    into_raw_loader, mfxConfig, mfxLoader, ConfigHandle, LoaderHandle, MFXCreateConfig, MFXLoad,
    MFXSetConfigFilterProperty, MFXUnload,
};
pub use session::{MFXCloneSession, MFXClose, MFXCreateSession, MFXGetVendorSession};
