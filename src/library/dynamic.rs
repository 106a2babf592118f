// Copyright 2024-2026 VPL Dispatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Runtime libraries loaded from disk with `libloading`.
//!
//! Every entry point is resolved once when the library is opened and kept
//! as a typed function pointer next to the `Library` that owns it.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use libloading::Library;
use tracing::{debug, info};

use super::runtime::{CapsArray, LegacyApi, ModernApi, SessionApi};
use super::symbols::{
    CLONE_SESSION, LEGACY_FUNCTIONS, LEGACY_QUERY_PLATFORM, MODERN_DISCRIMINATOR,
    MODERN_FUNCTIONS,
};
use super::validator::LoadError;
use crate::abi::{
    mfxHDL, mfxIMPL, mfxSession, CapsFormat, HandleType, InitParam, InitializationParam,
    MfxStatus, MfxVersion, Platform,
};

type FnInitialize = unsafe extern "C" fn(InitializationParam, *mut mfxSession) -> MfxStatus;
type FnQueryImplsDescription = unsafe extern "C" fn(u32, *mut u32) -> *mut mfxHDL;
type FnReleaseImplDescription = unsafe extern "C" fn(mfxHDL) -> MfxStatus;
type FnInitEx = unsafe extern "C" fn(InitParam, *mut mfxSession) -> MfxStatus;
type FnClose = unsafe extern "C" fn(mfxSession) -> MfxStatus;
type FnSetHandle = unsafe extern "C" fn(mfxSession, u32, mfxHDL) -> MfxStatus;
type FnCloneSession = unsafe extern "C" fn(mfxSession, *mut mfxSession) -> MfxStatus;
type FnQueryVersion = unsafe extern "C" fn(mfxSession, *mut MfxVersion) -> MfxStatus;
type FnQueryImpl = unsafe extern "C" fn(mfxSession, *mut mfxIMPL) -> MfxStatus;
type FnQueryPlatform = unsafe extern "C" fn(mfxSession, *mut Platform) -> MfxStatus;

/// Resolve `name` as a function pointer of type `T`.
///
/// # Safety
/// `T` must match the real signature of the exported symbol.
unsafe fn resolve<T: Copy>(lib: &Library, name: &str) -> Option<T> {
    lib.get::<T>(name.as_bytes()).ok().map(|sym| *sym)
}

/// Open a shared library.
pub(crate) fn open_library(path: &Path) -> Result<Library, LoadError> {
    // SAFETY: loading a library runs its initializers; candidates only come
    // from the configured search locations.
    unsafe { Library::new(path) }.map_err(|e| LoadError::Open {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Whether an opened library exports the modern discriminator.
pub(crate) fn is_modern(lib: &Library) -> bool {
    // SAFETY: only presence is checked; the pointer is not called.
    unsafe { resolve::<FnInitialize>(lib, MODERN_DISCRIMINATOR) }.is_some()
}

// ============================================================================
// Modern
// ============================================================================

pub struct DynamicModernRuntime {
    path: PathBuf,
    exported: HashSet<&'static str>,
    initialize: FnInitialize,
    query_impls_description: Option<FnQueryImplsDescription>,
    release_impl_description: Option<FnReleaseImplDescription>,
    close: Option<FnClose>,
    set_handle: Option<FnSetHandle>,
    clone_session: Option<FnCloneSession>,
    _lib: Library,
}

// SAFETY: the struct holds the library handle and plain function pointers
// into it. The library stays loaded for as long as the struct lives and
// the runtime entry points are callable from any thread.
unsafe impl Send for DynamicModernRuntime {}
unsafe impl Sync for DynamicModernRuntime {}

impl DynamicModernRuntime {
    pub(crate) fn from_library(lib: Library, path: &Path) -> Result<Self, LoadError> {
        // SAFETY: each type alias matches the C prototype of the entry point.
        unsafe {
            let initialize = resolve::<FnInitialize>(&lib, MODERN_DISCRIMINATOR).ok_or(
                LoadError::MissingSymbol {
                    path: path.to_path_buf(),
                    symbol: MODERN_DISCRIMINATOR,
                },
            )?;

            let exported: HashSet<&'static str> = MODERN_FUNCTIONS
                .iter()
                .map(|(name, _)| *name)
                .filter(|name| resolve::<unsafe extern "C" fn()>(&lib, name).is_some())
                .collect();
            debug!(
                path = %path.display(),
                exported = exported.len(),
                "resolved modern entry points"
            );

            Ok(Self {
                path: path.to_path_buf(),
                initialize,
                query_impls_description: resolve(&lib, "MFXQueryImplsDescription"),
                release_impl_description: resolve(&lib, "MFXReleaseImplDescription"),
                close: resolve(&lib, "MFXClose"),
                set_handle: resolve(&lib, "MFXVideoCORE_SetHandle"),
                clone_session: resolve(&lib, CLONE_SESSION),
                exported,
                _lib: lib,
            })
        }
    }
}

impl SessionApi for DynamicModernRuntime {
    fn close(&self, session: mfxSession) -> MfxStatus {
        match self.close {
            // SAFETY: session was produced by this library.
            Some(f) => unsafe { f(session) },
            None => MfxStatus::UNSUPPORTED,
        }
    }

    fn set_handle(&self, session: mfxSession, handle_type: HandleType, hdl: mfxHDL) -> MfxStatus {
        match self.set_handle {
            // SAFETY: session was produced by this library; hdl is opaque to us.
            Some(f) => unsafe { f(session, handle_type.0, hdl) },
            None => MfxStatus::UNSUPPORTED,
        }
    }

    fn clone_session(&self, session: mfxSession) -> Result<mfxSession, MfxStatus> {
        let f = self.clone_session.ok_or(MfxStatus::UNSUPPORTED)?;
        let mut clone: mfxSession = std::ptr::null_mut();
        // SAFETY: out-pointer is a valid local.
        unsafe { f(session, &mut clone) }.into_result()?;
        Ok(clone)
    }
}

impl ModernApi for DynamicModernRuntime {
    fn exports(&self, name: &str) -> bool {
        self.exported.contains(name)
    }

    fn query_impls_description(&self, format: CapsFormat) -> Option<CapsArray> {
        let f = self.query_impls_description?;
        let mut count = 0u32;
        // SAFETY: out-pointer is a valid local; the returned array stays
        // owned by the library until released.
        let handles = unsafe { f(format.raw(), &mut count) };
        if handles.is_null() {
            return None;
        }
        // SAFETY: the library reported `count` handles at `handles`.
        Some(unsafe { CapsArray::from_raw(format, handles, count) })
    }

    fn release_impls_description(&self, array: &CapsArray) -> MfxStatus {
        match self.release_impl_description {
            // SAFETY: the array came from this library and is released once.
            Some(f) => unsafe { f(array.as_raw() as mfxHDL) },
            None => MfxStatus::UNSUPPORTED,
        }
    }

    fn initialize(&self, param: InitializationParam) -> Result<mfxSession, MfxStatus> {
        let mut session: mfxSession = std::ptr::null_mut();
        // SAFETY: extension pointers in `param` outlive the call.
        unsafe { (self.initialize)(param, &mut session) }.into_result()?;
        info!(path = %self.path.display(), "runtime session initialized");
        Ok(session)
    }
}

// ============================================================================
// Legacy
// ============================================================================

pub struct DynamicLegacyRuntime {
    init_ex: FnInitEx,
    close: FnClose,
    query_version: FnQueryVersion,
    query_impl: FnQueryImpl,
    set_handle: FnSetHandle,
    query_platform: Option<FnQueryPlatform>,
    clone_session: Option<FnCloneSession>,
    _lib: Library,
}

// SAFETY: see `DynamicModernRuntime`.
unsafe impl Send for DynamicLegacyRuntime {}
unsafe impl Sync for DynamicLegacyRuntime {}

impl DynamicLegacyRuntime {
    /// Resolve the legacy table in order, failing on the first missing entry.
    pub(crate) fn from_library(lib: Library, path: &Path) -> Result<Self, LoadError> {
        let missing = |symbol: &'static str| LoadError::MissingSymbol {
            path: path.to_path_buf(),
            symbol,
        };

        // SAFETY: each type alias matches the C prototype of the entry point.
        unsafe {
            let init_ex = resolve::<FnInitEx>(&lib, LEGACY_FUNCTIONS[0])
                .ok_or_else(|| missing(LEGACY_FUNCTIONS[0]))?;
            let close = resolve::<FnClose>(&lib, LEGACY_FUNCTIONS[1])
                .ok_or_else(|| missing(LEGACY_FUNCTIONS[1]))?;
            let query_version = resolve::<FnQueryVersion>(&lib, LEGACY_FUNCTIONS[2])
                .ok_or_else(|| missing(LEGACY_FUNCTIONS[2]))?;
            let query_impl = resolve::<FnQueryImpl>(&lib, LEGACY_FUNCTIONS[3])
                .ok_or_else(|| missing(LEGACY_FUNCTIONS[3]))?;
            let set_handle = resolve::<FnSetHandle>(&lib, LEGACY_FUNCTIONS[4])
                .ok_or_else(|| missing(LEGACY_FUNCTIONS[4]))?;

            Ok(Self {
                init_ex,
                close,
                query_version,
                query_impl,
                set_handle,
                query_platform: resolve(&lib, LEGACY_QUERY_PLATFORM),
                clone_session: resolve(&lib, CLONE_SESSION),
                _lib: lib,
            })
        }
    }
}

impl SessionApi for DynamicLegacyRuntime {
    fn close(&self, session: mfxSession) -> MfxStatus {
        // SAFETY: session was produced by this library.
        unsafe { (self.close)(session) }
    }

    fn set_handle(&self, session: mfxSession, handle_type: HandleType, hdl: mfxHDL) -> MfxStatus {
        // SAFETY: session was produced by this library; hdl is opaque to us.
        unsafe { (self.set_handle)(session, handle_type.0, hdl) }
    }

    fn clone_session(&self, session: mfxSession) -> Result<mfxSession, MfxStatus> {
        let f = self.clone_session.ok_or(MfxStatus::UNSUPPORTED)?;
        let mut clone: mfxSession = std::ptr::null_mut();
        // SAFETY: out-pointer is a valid local.
        unsafe { f(session, &mut clone) }.into_result()?;
        Ok(clone)
    }
}

impl LegacyApi for DynamicLegacyRuntime {
    fn init_ex(&self, param: InitParam) -> Result<mfxSession, MfxStatus> {
        let mut session: mfxSession = std::ptr::null_mut();
        // SAFETY: extension pointers in `param` outlive the call.
        unsafe { (self.init_ex)(param, &mut session) }.into_result()?;
        Ok(session)
    }

    fn query_version(&self, session: mfxSession) -> Result<MfxVersion, MfxStatus> {
        let mut version = MfxVersion::default();
        // SAFETY: out-pointer is a valid local.
        unsafe { (self.query_version)(session, &mut version) }.into_result()?;
        Ok(version)
    }

    fn query_impl(&self, session: mfxSession) -> Result<mfxIMPL, MfxStatus> {
        let mut imp: mfxIMPL = 0;
        // SAFETY: out-pointer is a valid local.
        unsafe { (self.query_impl)(session, &mut imp) }.into_result()?;
        Ok(imp)
    }

    fn query_platform(&self, session: mfxSession) -> Option<Result<Platform, MfxStatus>> {
        let f = self.query_platform?;
        let mut platform = Platform::default();
        // SAFETY: out-pointer is a valid local.
        let status = unsafe { f(session, &mut platform) };
        Some(status.into_result().map(|()| platform))
    }
}
