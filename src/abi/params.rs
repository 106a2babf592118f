// Copyright 2024-2026 VPL Dispatch Contributors
// SPDX-License-Identifier: Apache-2.0

use std::ffi::c_void;
use std::fmt;

use super::types::MfxVersion;

/// Parameters for `MFXInitialize` (`mfxInitializationParam`).
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct InitializationParam {
    pub acceleration_mode: u32,
    pub device_copy: u16,
    pub reserved: [u16; 2],
    pub num_ext_param: u16,
    pub ext_param: *mut *mut c_void,
    pub vendor_impl_id: u32,
    pub reserved2: [u32; 3],
}

impl Default for InitializationParam {
    fn default() -> Self {
        // SAFETY: integers and a raw pointer; all-zero is valid.
        unsafe { std::mem::zeroed() }
    }
}

/// Extension-buffer part of `mfxInitParam`.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct InitParamExt {
    pub ext_param: *mut *mut c_void,
    pub num_ext_param: u16,
}

/// The anonymous union in `mfxInitParam`: extension buffers overlaid on
/// `reserved2[5]`. The reserved arm sets the size on 32-bit targets.
#[repr(C)]
#[derive(Clone, Copy)]
pub union InitParamExtArea {
    pub ext: InitParamExt,
    pub reserved2: [u16; 5],
}

impl From<InitParamExt> for InitParamExtArea {
    fn from(ext: InitParamExt) -> Self {
        Self { ext }
    }
}

impl fmt::Debug for InitParamExtArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InitParamExtArea").finish_non_exhaustive()
    }
}

/// Parameters for the legacy `MFXInitEx` (`mfxInitParam`).
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct InitParam {
    pub implementation: i32,
    pub version: MfxVersion,
    pub external_threads: u16,
    pub ext: InitParamExtArea,
    pub gpu_copy: u16,
    pub reserved: [u16; 21],
}

impl Default for InitParam {
    fn default() -> Self {
        // SAFETY: integers and a raw pointer; all-zero is valid.
        unsafe { std::mem::zeroed() }
    }
}

/// Device platform information (`mfxPlatform`).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Platform {
    pub code_name: u16,
    pub device_id: u16,
    pub media_adapter_type: u16,
    pub reserved: [u16; 13],
}
