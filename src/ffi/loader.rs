// Copyright 2024-2026 VPL Dispatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Loader and config object lifecycle for the C surface.

use std::ffi::{c_char, CStr};

use tracing::debug;

use super::error::{fail, set_last_error};
use crate::abi::{MfxStatus, MfxVariant};
use crate::config::DispatchConfig;
use crate::loader::{ConfigId, Loader};

/// Opaque loader handed to C callers (`mfxLoader`).
pub struct LoaderHandle {
    pub(crate) loader: Loader,
    /// Boxed so config pointers stay put while more are created.
    configs: Vec<Box<ConfigHandle>>,
}

/// Opaque config object handed to C callers (`mfxConfig`).
pub struct ConfigHandle {
    loader: *mut LoaderHandle,
    id: ConfigId,
}

#[allow(non_camel_case_types)]
pub type mfxLoader = *mut LoaderHandle;
#[allow(non_camel_case_types)]
pub type mfxConfig = *mut ConfigHandle;

/// Box an existing loader for use through the C entry points.
///
/// `MFXLoad` builds its loader from the environment; this lets a host or a
/// test supply its own configuration or library opener instead. Free the
/// result with [`MFXUnload`].
pub fn into_raw_loader(loader: Loader) -> mfxLoader {
    Box::into_raw(Box::new(LoaderHandle {
        loader,
        configs: Vec::new(),
    }))
}

/// Create a loader configured from the environment.
///
/// Discovery is deferred until the first enumeration or session request.
#[no_mangle]
pub extern "C" fn MFXLoad() -> mfxLoader {
    into_raw_loader(Loader::new(DispatchConfig::from_env()))
}

/// Unload every library and free the loader along with its configs.
///
/// Sessions already created stay usable until they are closed.
///
/// # Safety
/// `loader` must come from [`MFXLoad`] or [`into_raw_loader`] and must not
/// be used afterwards.
#[no_mangle]
pub unsafe extern "C" fn MFXUnload(loader: mfxLoader) {
    if loader.is_null() {
        return;
    }
    let handle = Box::from_raw(loader);
    debug!(configs = handle.configs.len(), "unloading through C surface");
    handle.loader.unload();
}

/// Create a config object owned by `loader`. Returns null on failure.
///
/// # Safety
/// `loader` must be a live loader handle.
#[no_mangle]
pub unsafe extern "C" fn MFXCreateConfig(loader: mfxLoader) -> mfxConfig {
    if loader.is_null() {
        set_last_error("null pointer argument");
        return std::ptr::null_mut();
    }
    let handle = &mut *loader;
    match handle.loader.create_config() {
        Ok(id) => {
            let mut config = Box::new(ConfigHandle { loader, id });
            let ptr: mfxConfig = &mut *config;
            handle.configs.push(config);
            ptr
        }
        Err(e) => {
            fail(e);
            std::ptr::null_mut()
        }
    }
}

/// Set one filter property on a config object.
///
/// # Safety
/// `config` must come from [`MFXCreateConfig`] on a live loader, `name`
/// must be NUL-terminated, and any pointer in `value` must be valid for
/// the property's type.
#[no_mangle]
pub unsafe extern "C" fn MFXSetConfigFilterProperty(
    config: mfxConfig,
    name: *const u8,
    value: MfxVariant,
) -> MfxStatus {
    if config.is_null() || name.is_null() {
        set_last_error("null pointer argument");
        return MfxStatus::NULL_PTR;
    }
    // The config lives inside the loader, so copy it out before borrowing
    // the loader mutably.
    let (loader, id) = ((*config).loader, (*config).id);
    if loader.is_null() {
        set_last_error("config is not attached to a loader");
        return MfxStatus::INVALID_HANDLE;
    }

    let name = match CStr::from_ptr(name as *const c_char).to_str() {
        Ok(s) => s,
        Err(_) => {
            set_last_error("invalid UTF-8 in property name");
            return MfxStatus::NOT_FOUND;
        }
    };

    let handle = &mut *loader;
    match handle.loader.set_filter_variant(id, name, &value) {
        Ok(()) => MfxStatus::NONE,
        Err(e) => fail(e),
    }
}
