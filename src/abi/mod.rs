// Copyright 2024-2026 VPL Dispatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Binary contract shared with vendor runtimes and applications.
//!
//! Every `#[repr(C)]` type here mirrors a structure from the media API
//! headers field for field. Vendor runtimes write these structures and
//! applications read them back through the dispatcher untouched, so none of
//! the layouts may be reordered, packed or padded differently from C.
//!
//! Raw enum-typed fields are kept as plain integers: a vendor library may
//! report values this crate does not know yet, and those must round-trip.

#![allow(non_camel_case_types)]

mod descriptor;
mod params;
mod status;
mod types;

pub use descriptor::{
    fixed_str, write_fixed_str, AccelerationModeDescription, CodecProfile, DecProfile, DecoderCodec,
    DecoderDescription, DeviceDescription, EncProfile, EncoderCodec, EncoderDescription,
    ExtendedDeviceId, ImplDescription, ImplementedFunctions, MemDescription,
    PoolPolicyDescription, SubDevice, VppDescription, VppFilter, VppFormat, VppMemDescription,
    MFX_IMPL_NAME_LEN, MFX_STRFIELD_LEN,
};
pub use params::{InitParam, InitParamExt, InitParamExtArea, InitializationParam, Platform};
pub use status::MfxStatus;
pub use types::{
    AccelerationMode, ApiVersion, CapsFormat, HandleType, ImplType, MfxRange32U, MfxVariant,
    MfxVariantData, MfxVersion, StructVersion, VariantType,
};

use std::ffi::c_void;

/// Opaque session handle (`mfxSession`).
pub type mfxSession = *mut c_void;

/// Opaque generic handle (`mfxHDL`).
pub type mfxHDL = *mut c_void;

/// Legacy implementation selector (`mfxIMPL`): adapter in the low byte,
/// acceleration backend in the `VIA` bits.
pub type mfxIMPL = i32;

pub const MFX_IMPL_AUTO: mfxIMPL = 0x0000;
pub const MFX_IMPL_SOFTWARE: mfxIMPL = 0x0001;
pub const MFX_IMPL_HARDWARE: mfxIMPL = 0x0002;
pub const MFX_IMPL_AUTO_ANY: mfxIMPL = 0x0003;
pub const MFX_IMPL_HARDWARE_ANY: mfxIMPL = 0x0004;
pub const MFX_IMPL_HARDWARE2: mfxIMPL = 0x0005;
pub const MFX_IMPL_HARDWARE3: mfxIMPL = 0x0006;
pub const MFX_IMPL_HARDWARE4: mfxIMPL = 0x0007;

pub const MFX_IMPL_VIA_ANY: mfxIMPL = 0x0100;
pub const MFX_IMPL_VIA_D3D9: mfxIMPL = 0x0200;
pub const MFX_IMPL_VIA_D3D11: mfxIMPL = 0x0300;
pub const MFX_IMPL_VIA_VAAPI: mfxIMPL = 0x0400;
pub const MFX_IMPL_VIA_HDDLUNITE: mfxIMPL = 0x0500;

/// Mask selecting the adapter part of an `mfxIMPL`.
pub const MFX_IMPL_BASETYPE_MASK: mfxIMPL = 0x00ff;

/// Intel's PCI vendor id, reported by legacy runtimes.
pub const VENDOR_ID_INTEL: u32 = 0x8086;

/// Minimum API version whose sessions answer `MFXVideoCORE_QueryPlatform`.
pub const QUERY_PLATFORM_MIN_VERSION: ApiVersion = ApiVersion::new(1, 19);

/// Struct version written into synthesized descriptors.
pub const IMPL_DESCRIPTION_VERSION: StructVersion = StructVersion { minor: 2, major: 1 };

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{offset_of, size_of};

    #[test]
    fn test_impl_description_leading_offsets() {
        assert_eq!(offset_of!(ImplDescription, version), 0);
        assert_eq!(offset_of!(ImplDescription, impl_type), 4);
        assert_eq!(offset_of!(ImplDescription, acceleration_mode), 8);
        assert_eq!(offset_of!(ImplDescription, api_version), 12);
        assert_eq!(offset_of!(ImplDescription, impl_name), 16);
        assert_eq!(offset_of!(ImplDescription, license), 48);
        assert_eq!(offset_of!(ImplDescription, keywords), 176);
        assert_eq!(offset_of!(ImplDescription, vendor_id), 304);
        assert_eq!(offset_of!(ImplDescription, vendor_impl_id), 308);
        assert_eq!(offset_of!(ImplDescription, dev), 312);
    }

    #[test]
    fn test_small_struct_sizes() {
        assert_eq!(size_of::<StructVersion>(), 2);
        assert_eq!(size_of::<MfxVersion>(), 4);
        assert_eq!(size_of::<MfxRange32U>(), 12);
        assert_eq!(size_of::<MfxVariant>(), 16);
        assert_eq!(size_of::<Platform>(), 32);
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_pointer_bearing_struct_layout() {
        assert_eq!(size_of::<DecoderDescription>(), 32);
        assert_eq!(size_of::<AccelerationModeDescription>(), 16);
        assert_eq!(size_of::<PoolPolicyDescription>(), 16);
        assert_eq!(size_of::<MemDescription>(), 56);
        assert_eq!(offset_of!(InitParam, ext), 16);
        assert_eq!(offset_of!(InitParam, gpu_copy), 32);
        assert_eq!(size_of::<InitParam>(), 80);
        assert_eq!(offset_of!(InitializationParam, ext_param), 16);
    }

    #[cfg(target_pointer_width = "32")]
    #[test]
    fn test_init_param_layout_32bit() {
        // reserved2[5] is wider than pointer + count here.
        assert_eq!(size_of::<InitParamExtArea>(), 12);
        assert_eq!(offset_of!(InitParam, ext), 12);
        assert_eq!(offset_of!(InitParam, gpu_copy), 24);
    }

    #[test]
    fn test_init_param_ext_area_covers_reserved() {
        assert!(size_of::<InitParamExtArea>() >= size_of::<[u16; 5]>());
        assert!(size_of::<InitParamExtArea>() >= size_of::<InitParamExt>());
    }

    #[test]
    fn test_impl_mask_extracts_adapter() {
        let imp = MFX_IMPL_HARDWARE3 | MFX_IMPL_VIA_VAAPI;
        assert_eq!(imp & MFX_IMPL_BASETYPE_MASK, MFX_IMPL_HARDWARE3);
    }
}
