// Copyright 2024-2026 VPL Dispatch Contributors
// SPDX-License-Identifier: Apache-2.0

use std::ffi::c_void;
use std::fmt;

/// Structure version (`mfxStructVersion`).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StructVersion {
    pub minor: u8,
    pub major: u8,
}

/// API version as laid out in C (`mfxVersion`): minor first.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MfxVersion {
    pub minor: u16,
    pub major: u16,
}

impl MfxVersion {
    /// The packed 32-bit form (`mfxVersion.Version`).
    pub fn packed(self) -> u32 {
        (u32::from(self.major) << 16) | u32::from(self.minor)
    }
}

/// API version ordered major-first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ApiVersion {
    pub major: u16,
    pub minor: u16,
}

impl ApiVersion {
    pub const fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }

    pub fn from_packed(version: u32) -> Self {
        Self {
            major: (version >> 16) as u16,
            minor: (version & 0xffff) as u16,
        }
    }

    pub fn packed(self) -> u32 {
        (u32::from(self.major) << 16) | u32::from(self.minor)
    }
}

impl From<MfxVersion> for ApiVersion {
    fn from(v: MfxVersion) -> Self {
        Self::new(v.major, v.minor)
    }
}

impl From<ApiVersion> for MfxVersion {
    fn from(v: ApiVersion) -> Self {
        Self { minor: v.minor, major: v.major }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Implementation class (`mfxImplType`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImplType {
    Software,
    Hardware,
    Other(u32),
}

impl ImplType {
    pub const RAW_SOFTWARE: u32 = 0x0001;
    pub const RAW_HARDWARE: u32 = 0x0002;

    pub fn from_raw(raw: u32) -> Self {
        match raw {
            Self::RAW_SOFTWARE => Self::Software,
            Self::RAW_HARDWARE => Self::Hardware,
            other => Self::Other(other),
        }
    }

    pub fn raw(self) -> u32 {
        match self {
            Self::Software => Self::RAW_SOFTWARE,
            Self::Hardware => Self::RAW_HARDWARE,
            Self::Other(raw) => raw,
        }
    }
}

impl fmt::Display for ImplType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImplType::Software => write!(f, "software"),
            ImplType::Hardware => write!(f, "hardware"),
            ImplType::Other(raw) => write!(f, "impl-type({raw:#x})"),
        }
    }
}

/// Hardware acceleration stack (`mfxAccelerationMode`).
#[repr(transparent)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct AccelerationMode(pub u32);

impl AccelerationMode {
    pub const NA: Self = Self(0);
    pub const D3D9: Self = Self(0x0100);
    pub const D3D11: Self = Self(0x0200);
    pub const VAAPI: Self = Self(0x0400);
    pub const VAAPI_DRM_MODESET: Self = Self(0x0401);
    pub const VAAPI_GLX: Self = Self(0x0402);
    pub const VAAPI_X11: Self = Self(0x0403);
    pub const VAAPI_WAYLAND: Self = Self(0x0404);
    pub const HDDLUNITE: Self = Self(0x0500);

    /// The vendor-interconnect (HDDL/VSI) variant that ranks below general
    /// hardware acceleration.
    pub fn is_hddl(self) -> bool {
        self == Self::HDDLUNITE
    }
}

/// Delivery format for capability queries (`mfxImplCapsDeliveryFormat`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapsFormat {
    ImplDescription,
    ImplementedFunctions,
    ImplPath,
    DeviceIdExtended,
}

impl CapsFormat {
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            1 => Some(Self::ImplDescription),
            2 => Some(Self::ImplementedFunctions),
            3 => Some(Self::ImplPath),
            4 => Some(Self::DeviceIdExtended),
            _ => None,
        }
    }

    pub fn raw(self) -> u32 {
        match self {
            Self::ImplDescription => 1,
            Self::ImplementedFunctions => 2,
            Self::ImplPath => 3,
            Self::DeviceIdExtended => 4,
        }
    }
}

/// Device handle kind passed to `MFXVideoCORE_SetHandle` (`mfxHandleType`).
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandleType(pub u32);

impl HandleType {
    pub const D3D9_DEVICE_MANAGER: Self = Self(1);
    pub const D3D11_DEVICE: Self = Self(2);
    pub const VA_DISPLAY: Self = Self(4);
}

/// Inclusive range with step (`mfxRange32U`).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MfxRange32U {
    pub min: u32,
    pub max: u32,
    pub step: u32,
}

impl MfxRange32U {
    pub const fn new(min: u32, max: u32, step: u32) -> Self {
        Self { min, max, step }
    }

    /// True when `inner` lies entirely within `self`.
    pub fn contains_range(&self, inner: &MfxRange32U) -> bool {
        inner.min >= self.min && inner.max <= self.max
    }
}

/// Type tag of an `mfxVariant`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariantType {
    Unset,
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F32,
    F64,
    Ptr,
    Fp16,
}

impl VariantType {
    pub fn from_raw(raw: u32) -> Option<Self> {
        Some(match raw {
            0 => Self::Unset,
            1 => Self::U8,
            2 => Self::I8,
            3 => Self::U16,
            4 => Self::I16,
            5 => Self::U32,
            6 => Self::I32,
            7 => Self::U64,
            8 => Self::I64,
            9 => Self::F32,
            10 => Self::F64,
            11 => Self::Ptr,
            12 => Self::Fp16,
            _ => return None,
        })
    }

    pub fn raw(self) -> u32 {
        match self {
            Self::Unset => 0,
            Self::U8 => 1,
            Self::I8 => 2,
            Self::U16 => 3,
            Self::I16 => 4,
            Self::U32 => 5,
            Self::I32 => 6,
            Self::U64 => 7,
            Self::I64 => 8,
            Self::F32 => 9,
            Self::F64 => 10,
            Self::Ptr => 11,
            Self::Fp16 => 12,
        }
    }
}

/// Payload of an `mfxVariant`.
#[repr(C)]
#[derive(Clone, Copy)]
pub union MfxVariantData {
    pub u8_: u8,
    pub i8_: i8,
    pub u16_: u16,
    pub i16_: i16,
    pub u32_: u32,
    pub i32_: i32,
    pub u64_: u64,
    pub i64_: i64,
    pub f32_: f32,
    pub f64_: f64,
    pub ptr: *mut c_void,
    pub fp16: u16,
}

/// Typed value passed to `MFXSetConfigFilterProperty` (`mfxVariant`).
#[repr(C)]
#[derive(Clone, Copy)]
pub struct MfxVariant {
    pub version: StructVersion,
    pub type_: u32,
    pub data: MfxVariantData,
}

impl MfxVariant {
    const VERSION: StructVersion = StructVersion { minor: 0, major: 1 };

    pub fn u16(value: u16) -> Self {
        Self {
            version: Self::VERSION,
            type_: VariantType::U16.raw(),
            data: MfxVariantData { u16_: value },
        }
    }

    pub fn u32(value: u32) -> Self {
        Self {
            version: Self::VERSION,
            type_: VariantType::U32.raw(),
            data: MfxVariantData { u32_: value },
        }
    }

    pub fn i32(value: i32) -> Self {
        Self {
            version: Self::VERSION,
            type_: VariantType::I32.raw(),
            data: MfxVariantData { i32_: value },
        }
    }

    pub fn ptr(value: *mut c_void) -> Self {
        Self {
            version: Self::VERSION,
            type_: VariantType::Ptr.raw(),
            data: MfxVariantData { ptr: value },
        }
    }

    pub fn variant_type(&self) -> Option<VariantType> {
        VariantType::from_raw(self.type_)
    }
}

impl fmt::Debug for MfxVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MfxVariant")
            .field("type", &self.variant_type())
            .finish_non_exhaustive()
    }
}
