// Copyright 2024-2026 VPL Dispatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Capability descriptor layouts (`mfxImplDescription` and friends).
//!
//! The nested arrays are raw pointer + count pairs owned by whoever filled
//! the structure: a vendor runtime, or [`crate::caps::OwnedImplDescription`]
//! for synthesized descriptors. The slice accessors are `unsafe` because
//! nothing in the type guarantees those pointers are still live.

use std::ffi::{c_char, c_void, CStr};

use super::types::{MfxRange32U, MfxVersion, StructVersion};

pub const MFX_IMPL_NAME_LEN: usize = 32;
pub const MFX_STRFIELD_LEN: usize = 128;

/// Read a NUL-terminated fixed-size C string field.
pub fn fixed_str(field: &[c_char]) -> String {
    let bytes: Vec<u8> = field
        .iter()
        .take_while(|&&c| c != 0)
        .map(|&c| c as u8)
        .collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Write `value` into a fixed-size C string field, truncating so the
/// terminating NUL always fits.
pub fn write_fixed_str(field: &mut [c_char], value: &str) {
    field.fill(0);
    let max = field.len().saturating_sub(1);
    for (dst, &src) in field.iter_mut().zip(value.as_bytes().iter().take(max)) {
        *dst = src as c_char;
    }
}

/// Build a slice from a vendor pointer/count pair, tolerating null.
///
/// # Safety
/// When non-null, `ptr` must point to `len` initialized values that outlive `'a`.
unsafe fn raw_slice<'a, T>(ptr: *const T, len: usize) -> &'a [T] {
    if ptr.is_null() || len == 0 {
        &[]
    } else {
        std::slice::from_raw_parts(ptr, len)
    }
}

// ============================================================================
// Memory descriptors
// ============================================================================

/// Surface memory capabilities shared by decoder and encoder profiles.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct MemDescription {
    pub mem_handle_type: u32,
    pub width: MfxRange32U,
    pub height: MfxRange32U,
    pub reserved: [u16; 7],
    pub num_color_formats: u16,
    pub color_formats: *mut u32,
}

impl MemDescription {
    /// # Safety
    /// `color_formats` must be null or valid for `num_color_formats` entries.
    pub unsafe fn color_formats(&self) -> &[u32] {
        raw_slice(self.color_formats, self.num_color_formats as usize)
    }
}

/// One codec profile and its memory descriptors.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CodecProfile {
    pub profile: u32,
    pub reserved: [u16; 7],
    pub num_mem_types: u16,
    pub mem_desc: *mut MemDescription,
}

pub type DecProfile = CodecProfile;
pub type EncProfile = CodecProfile;

impl CodecProfile {
    /// # Safety
    /// `mem_desc` must be null or valid for `num_mem_types` entries.
    pub unsafe fn mem_descs(&self) -> &[MemDescription] {
        raw_slice(self.mem_desc, self.num_mem_types as usize)
    }
}

// ============================================================================
// Decoder / encoder
// ============================================================================

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct DecoderCodec {
    pub codec_id: u32,
    pub reserved: [u16; 8],
    pub max_codec_level: u16,
    pub num_profiles: u16,
    pub profiles: *mut DecProfile,
}

impl DecoderCodec {
    /// # Safety
    /// `profiles` must be null or valid for `num_profiles` entries.
    pub unsafe fn profiles(&self) -> &[DecProfile] {
        raw_slice(self.profiles, self.num_profiles as usize)
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct DecoderDescription {
    pub version: StructVersion,
    pub reserved: [u16; 7],
    pub num_codecs: u16,
    pub codecs: *mut DecoderCodec,
}

impl DecoderDescription {
    /// # Safety
    /// `codecs` must be null or valid for `num_codecs` entries.
    pub unsafe fn codecs(&self) -> &[DecoderCodec] {
        raw_slice(self.codecs, self.num_codecs as usize)
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct EncoderCodec {
    pub codec_id: u32,
    pub max_codec_level: u16,
    pub bi_directional_prediction: u16,
    pub reported_stats: u16,
    pub reserved: [u16; 6],
    pub num_profiles: u16,
    pub profiles: *mut EncProfile,
}

impl EncoderCodec {
    /// # Safety
    /// `profiles` must be null or valid for `num_profiles` entries.
    pub unsafe fn profiles(&self) -> &[EncProfile] {
        raw_slice(self.profiles, self.num_profiles as usize)
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct EncoderDescription {
    pub version: StructVersion,
    pub reserved: [u16; 7],
    pub num_codecs: u16,
    pub codecs: *mut EncoderCodec,
}

impl EncoderDescription {
    /// # Safety
    /// `codecs` must be null or valid for `num_codecs` entries.
    pub unsafe fn codecs(&self) -> &[EncoderCodec] {
        raw_slice(self.codecs, self.num_codecs as usize)
    }
}

// ============================================================================
// VPP
// ============================================================================

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct VppFormat {
    pub in_format: u32,
    pub reserved: [u16; 5],
    pub num_out_format: u16,
    pub out_formats: *mut u32,
}

impl VppFormat {
    /// # Safety
    /// `out_formats` must be null or valid for `num_out_format` entries.
    pub unsafe fn out_formats(&self) -> &[u32] {
        raw_slice(self.out_formats, self.num_out_format as usize)
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct VppMemDescription {
    pub mem_handle_type: u32,
    pub width: MfxRange32U,
    pub height: MfxRange32U,
    pub reserved: [u16; 7],
    pub num_in_formats: u16,
    pub formats: *mut VppFormat,
}

impl VppMemDescription {
    /// # Safety
    /// `formats` must be null or valid for `num_in_formats` entries.
    pub unsafe fn formats(&self) -> &[VppFormat] {
        raw_slice(self.formats, self.num_in_formats as usize)
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct VppFilter {
    pub filter_fourcc: u32,
    pub max_delay_in_frames: u16,
    pub reserved: [u16; 7],
    pub num_mem_types: u16,
    pub mem_desc: *mut VppMemDescription,
}

impl VppFilter {
    /// # Safety
    /// `mem_desc` must be null or valid for `num_mem_types` entries.
    pub unsafe fn mem_descs(&self) -> &[VppMemDescription] {
        raw_slice(self.mem_desc, self.num_mem_types as usize)
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct VppDescription {
    pub version: StructVersion,
    pub reserved: [u16; 7],
    pub num_filters: u16,
    pub filters: *mut VppFilter,
}

impl VppDescription {
    /// # Safety
    /// `filters` must be null or valid for `num_filters` entries.
    pub unsafe fn filters(&self) -> &[VppFilter] {
        raw_slice(self.filters, self.num_filters as usize)
    }
}

// ============================================================================
// Device, acceleration modes, pool policies
// ============================================================================

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct SubDevice {
    pub index: u32,
    pub sub_device_id: [c_char; MFX_STRFIELD_LEN],
    pub reserved: [u32; 7],
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct DeviceDescription {
    pub version: StructVersion,
    pub reserved: [u16; 6],
    pub media_adapter_type: u16,
    pub device_id: [c_char; MFX_STRFIELD_LEN],
    pub num_sub_devices: u16,
    pub sub_devices: *mut SubDevice,
    pub reserved2: [u32; 7],
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct AccelerationModeDescription {
    pub version: StructVersion,
    pub reserved: [u16; 2],
    pub num_acceleration_modes: u16,
    pub modes: *mut u32,
}

impl AccelerationModeDescription {
    /// # Safety
    /// `modes` must be null or valid for `num_acceleration_modes` entries.
    pub unsafe fn modes(&self) -> &[u32] {
        raw_slice(self.modes, self.num_acceleration_modes as usize)
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct PoolPolicyDescription {
    pub version: StructVersion,
    pub reserved: [u16; 2],
    pub num_pool_policies: u16,
    pub policy: *mut u32,
}

// ============================================================================
// Top-level descriptors
// ============================================================================

/// Self-description of one implementation (`mfxImplDescription`).
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ImplDescription {
    pub version: StructVersion,
    pub impl_type: u32,
    pub acceleration_mode: u32,
    pub api_version: MfxVersion,
    pub impl_name: [c_char; MFX_IMPL_NAME_LEN],
    pub license: [c_char; MFX_STRFIELD_LEN],
    pub keywords: [c_char; MFX_STRFIELD_LEN],
    pub vendor_id: u32,
    pub vendor_impl_id: u32,
    pub dev: DeviceDescription,
    pub dec: DecoderDescription,
    pub enc: EncoderDescription,
    pub vpp: VppDescription,
    pub acceleration_mode_description: AccelerationModeDescription,
    pub pool_policies: PoolPolicyDescription,
    pub reserved: [u32; 8],
    pub num_ext_param: u32,
    pub ext_param: *mut *mut c_void,
}

impl Default for ImplDescription {
    fn default() -> Self {
        // SAFETY: every field is an integer, a fixed array of integers or a
        // raw pointer; the all-zero pattern is valid for each.
        unsafe { std::mem::zeroed() }
    }
}

impl ImplDescription {
    pub fn impl_name(&self) -> String {
        fixed_str(&self.impl_name)
    }

    pub fn license(&self) -> String {
        fixed_str(&self.license)
    }

    pub fn keywords(&self) -> String {
        fixed_str(&self.keywords)
    }

    pub fn device_id(&self) -> String {
        fixed_str(&self.dev.device_id)
    }
}

/// Names of the entry points an implementation exports
/// (`mfxImplementedFunctions`).
#[repr(C)]
#[derive(Debug)]
pub struct ImplementedFunctions {
    pub num_functions: u16,
    pub functions_name: *mut *mut c_char,
}

impl ImplementedFunctions {
    /// Collect the function names.
    ///
    /// # Safety
    /// `functions_name` must be null or valid for `num_functions` entries,
    /// each null or a NUL-terminated string.
    pub unsafe fn names(&self) -> Vec<String> {
        raw_slice(self.functions_name as *const *mut c_char, self.num_functions as usize)
            .iter()
            .filter(|p| !p.is_null())
            .map(|&p| CStr::from_ptr(p).to_string_lossy().into_owned())
            .collect()
    }
}

/// PCI / DRM identity of the device behind an implementation
/// (`mfxExtendedDeviceId`).
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ExtendedDeviceId {
    pub version: StructVersion,
    pub vendor_id: u16,
    pub device_id: u16,
    pub pci_domain: u32,
    pub pci_bus: u32,
    pub pci_device: u32,
    pub pci_function: u32,
    pub device_luid: [u8; 8],
    pub luid_device_node_mask: u32,
    pub luid_valid: u32,
    pub drm_render_node_num: u32,
    pub drm_primary_node_num: u32,
    pub revision_id: u8,
    pub reserved1: [u8; 19],
    pub device_name: [c_char; MFX_STRFIELD_LEN],
}

impl Default for ExtendedDeviceId {
    fn default() -> Self {
        // SAFETY: integers and integer arrays only.
        unsafe { std::mem::zeroed() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_str_stops_at_nul() {
        let mut field = [0 as c_char; 8];
        write_fixed_str(&mut field, "abc");
        assert_eq!(fixed_str(&field), "abc");
    }

    #[test]
    fn test_write_fixed_str_truncates_and_terminates() {
        let mut field = [0x41 as c_char; 4];
        write_fixed_str(&mut field, "abcdef");
        assert_eq!(fixed_str(&field), "abc");
        assert_eq!(field[3], 0);
    }

    #[test]
    fn test_null_arrays_read_as_empty() {
        let desc = ImplDescription::default();
        unsafe {
            assert!(desc.dec.codecs().is_empty());
            assert!(desc.enc.codecs().is_empty());
            assert!(desc.vpp.filters().is_empty());
            assert!(desc.acceleration_mode_description.modes().is_empty());
        }
    }

    #[test]
    fn test_implemented_functions_names() {
        let mut a = *b"MFXClose\0";
        let mut b = *b"MFXInitialize\0";
        let mut names = [a.as_mut_ptr() as *mut c_char, b.as_mut_ptr() as *mut c_char];
        let funcs = ImplementedFunctions {
            num_functions: 2,
            functions_name: names.as_mut_ptr(),
        };
        let collected = unsafe { funcs.names() };
        assert_eq!(collected, vec!["MFXClose".to_string(), "MFXInitialize".to_string()]);
    }
}
