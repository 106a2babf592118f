// Copyright 2024-2026 VPL Dispatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Entry-point sets a runtime library offers, one trait per generation.

use std::sync::Arc;

use crate::abi::{
    mfxHDL, mfxIMPL, mfxSession, CapsFormat, HandleType, InitParam, InitializationParam,
    MfxStatus, MfxVersion, Platform,
};

/// Array of capability handles returned by `MFXQueryImplsDescription`.
///
/// The array belongs to the runtime until handed back through
/// [`ModernApi::release_impls_description`].
#[derive(Debug)]
pub struct CapsArray {
    format: CapsFormat,
    handles: *mut mfxHDL,
    count: u32,
}

impl CapsArray {
    /// # Safety
    /// `handles` must be null or point to `count` handles that stay valid
    /// until the array is released to the runtime that produced it.
    pub unsafe fn from_raw(format: CapsFormat, handles: *mut mfxHDL, count: u32) -> Self {
        Self {
            format,
            handles,
            count: if handles.is_null() { 0 } else { count },
        }
    }

    pub fn format(&self) -> CapsFormat {
        self.format
    }

    pub fn len(&self) -> usize {
        self.count as usize
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn as_raw(&self) -> *mut mfxHDL {
        self.handles
    }

    pub fn get(&self, index: usize) -> Option<mfxHDL> {
        if index >= self.len() {
            return None;
        }
        // SAFETY: bounds checked; validity guaranteed by `from_raw`.
        let hdl = unsafe { *self.handles.add(index) };
        (!hdl.is_null()).then_some(hdl)
    }
}

/// Session-level entry points shared by both generations.
pub trait SessionApi: Send + Sync {
    fn close(&self, session: mfxSession) -> MfxStatus;

    fn set_handle(&self, session: mfxSession, handle_type: HandleType, hdl: mfxHDL) -> MfxStatus;

    fn clone_session(&self, session: mfxSession) -> Result<mfxSession, MfxStatus>;
}

/// A library exporting `MFXInitialize`.
pub trait ModernApi: SessionApi {
    /// Whether the library exports the named entry point.
    fn exports(&self, name: &str) -> bool;

    /// `None` when the library has no answer for `format`.
    fn query_impls_description(&self, format: CapsFormat) -> Option<CapsArray>;

    fn release_impls_description(&self, array: &CapsArray) -> MfxStatus;

    fn initialize(&self, param: InitializationParam) -> Result<mfxSession, MfxStatus>;
}

/// A library exporting only the 1.x entry points.
pub trait LegacyApi: SessionApi {
    fn init_ex(&self, param: InitParam) -> Result<mfxSession, MfxStatus>;

    fn query_version(&self, session: mfxSession) -> Result<MfxVersion, MfxStatus>;

    fn query_impl(&self, session: mfxSession) -> Result<mfxIMPL, MfxStatus>;

    /// `None` when the library does not export `MFXVideoCORE_QueryPlatform`.
    fn query_platform(&self, session: mfxSession) -> Option<Result<Platform, MfxStatus>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LibraryKind {
    Modern,
    Legacy,
}

/// An opened, validated runtime library.
#[derive(Clone)]
pub enum Runtime {
    Modern(Arc<dyn ModernApi>),
    Legacy(Arc<dyn LegacyApi>),
}

impl Runtime {
    pub fn kind(&self) -> LibraryKind {
        match self {
            Runtime::Modern(_) => LibraryKind::Modern,
            Runtime::Legacy(_) => LibraryKind::Legacy,
        }
    }

    pub fn close(&self, session: mfxSession) -> MfxStatus {
        match self {
            Runtime::Modern(api) => api.close(session),
            Runtime::Legacy(api) => api.close(session),
        }
    }

    pub fn set_handle(&self, session: mfxSession, handle_type: HandleType, hdl: mfxHDL) -> MfxStatus {
        match self {
            Runtime::Modern(api) => api.set_handle(session, handle_type, hdl),
            Runtime::Legacy(api) => api.set_handle(session, handle_type, hdl),
        }
    }

    pub fn clone_session(&self, session: mfxSession) -> Result<mfxSession, MfxStatus> {
        match self {
            Runtime::Modern(api) => api.clone_session(session),
            Runtime::Legacy(api) => api.clone_session(session),
        }
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Runtime").field(&self.kind()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caps_array_get_skips_null_entries() {
        let mut a = 1u32;
        let mut handles = [
            &mut a as *mut u32 as mfxHDL,
            std::ptr::null_mut(),
        ];
        let array = unsafe {
            CapsArray::from_raw(CapsFormat::ImplDescription, handles.as_mut_ptr(), 2)
        };
        assert_eq!(array.len(), 2);
        assert!(array.get(0).is_some());
        assert!(array.get(1).is_none());
        assert!(array.get(2).is_none());
    }

    #[test]
    fn test_null_caps_array_is_empty() {
        let array = unsafe {
            CapsArray::from_raw(CapsFormat::ImplDescription, std::ptr::null_mut(), 5)
        };
        assert!(array.is_empty());
        assert!(array.get(0).is_none());
    }
}
