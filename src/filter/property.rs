// Copyright 2024-2026 VPL Dispatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Property schema: dotted names to property ids.

use std::fmt;

use thiserror::Error;

/// Value shape a property accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    U16,
    U32,
    /// NUL-terminated string passed by pointer.
    String,
    /// `mfxRange32U` passed by pointer.
    Range,
    /// Opaque pointer.
    Pointer,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::U16 => "U16",
            ValueKind::U32 => "U32",
            ValueKind::String => "PTR (string)",
            ValueKind::Range => "PTR (range)",
            ValueKind::Pointer => "PTR",
        };
        f.write_str(name)
    }
}

/// Subtree of the schema a property belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    Top,
    Decoder,
    Encoder,
    Vpp,
    Functions,
    /// Session parameters that never filter implementations.
    Special,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PropertyError {
    #[error("unknown property {0}")]
    NotFound(String),

    #[error("{path} expects {expected}, got {found}")]
    TypeMismatch {
        path: String,
        expected: ValueKind,
        found: String,
    },

    #[error("{0} requires a non-null pointer")]
    NullValue(String),
}

macro_rules! property_ids {
    ($($id:ident => $kind:ident, $family:ident;)*) => {
        /// Every settable property.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum PropertyId {
            $($id,)*
        }

        impl PropertyId {
            pub const ALL: &'static [PropertyId] = &[$(PropertyId::$id,)*];
            pub const COUNT: usize = Self::ALL.len();

            pub fn kind(self) -> ValueKind {
                match self {
                    $(PropertyId::$id => ValueKind::$kind,)*
                }
            }

            pub fn family(self) -> Family {
                match self {
                    $(PropertyId::$id => Family::$family,)*
                }
            }

            pub fn index(self) -> usize {
                self as usize
            }
        }
    };
}

property_ids! {
    Impl => U32, Top;
    AccelerationMode => U32, Top;
    ApiVersion => U32, Top;
    ApiVersionMajor => U16, Top;
    ApiVersionMinor => U16, Top;
    ImplName => String, Top;
    License => String, Top;
    Keywords => String, Top;
    VendorId => U32, Top;
    VendorImplId => U32, Top;
    DeviceId => String, Top;
    MediaAdapterType => U16, Top;

    DecCodecId => U32, Decoder;
    DecMaxCodecLevel => U16, Decoder;
    DecProfile => U32, Decoder;
    DecMemHandleType => U32, Decoder;
    DecWidth => Range, Decoder;
    DecHeight => Range, Decoder;
    DecColorFormats => U32, Decoder;

    EncCodecId => U32, Encoder;
    EncMaxCodecLevel => U16, Encoder;
    EncBiDirectionalPrediction => U16, Encoder;
    EncReportedStats => U16, Encoder;
    EncProfile => U32, Encoder;
    EncMemHandleType => U32, Encoder;
    EncWidth => Range, Encoder;
    EncHeight => Range, Encoder;
    EncColorFormats => U32, Encoder;

    VppFilterFourCc => U32, Vpp;
    VppMaxDelayInFrames => U16, Vpp;
    VppMemHandleType => U32, Vpp;
    VppWidth => Range, Vpp;
    VppHeight => Range, Vpp;
    VppInFormat => U32, Vpp;
    VppOutFormats => U32, Vpp;

    FunctionName => String, Functions;

    HandleType => U32, Special;
    Handle => Pointer, Special;
    DeviceCopy => U16, Special;
    ExtBuffer => Pointer, Special;
}

const ROOT: &str = "mfxImplDescription";

fn parse_decoder(rest: &[&str]) -> Option<PropertyId> {
    use PropertyId::*;
    Some(match rest {
        ["CodecID"] => DecCodecId,
        ["MaxcodecLevel"] => DecMaxCodecLevel,
        ["decprofile", "Profile"] => DecProfile,
        ["decprofile", "decmemdesc", "MemHandleType"] => DecMemHandleType,
        ["decprofile", "decmemdesc", "Width"] => DecWidth,
        ["decprofile", "decmemdesc", "Height"] => DecHeight,
        ["decprofile", "decmemdesc", "ColorFormats"] => DecColorFormats,
        _ => return None,
    })
}

fn parse_encoder(rest: &[&str]) -> Option<PropertyId> {
    use PropertyId::*;
    Some(match rest {
        ["CodecID"] => EncCodecId,
        ["MaxcodecLevel"] => EncMaxCodecLevel,
        ["BiDirectionalPrediction"] => EncBiDirectionalPrediction,
        ["ReportedStats"] => EncReportedStats,
        ["encprofile", "Profile"] => EncProfile,
        ["encprofile", "encmemdesc", "MemHandleType"] => EncMemHandleType,
        ["encprofile", "encmemdesc", "Width"] => EncWidth,
        ["encprofile", "encmemdesc", "Height"] => EncHeight,
        ["encprofile", "encmemdesc", "ColorFormats"] => EncColorFormats,
        _ => return None,
    })
}

fn parse_vpp(rest: &[&str]) -> Option<PropertyId> {
    use PropertyId::*;
    Some(match rest {
        ["FilterFourCC"] => VppFilterFourCc,
        ["MaxDelayInFrames"] => VppMaxDelayInFrames,
        ["memdesc", "MemHandleType"] => VppMemHandleType,
        ["memdesc", "Width"] => VppWidth,
        ["memdesc", "Height"] => VppHeight,
        ["memdesc", "format", "InFormat"] => VppInFormat,
        ["memdesc", "format", "OutFormats"] => VppOutFormats,
        _ => return None,
    })
}

/// Parse a dotted property name. Names are case-sensitive.
pub fn parse(path: &str) -> Result<PropertyId, PropertyError> {
    use PropertyId::*;
    let segments: Vec<&str> = path.split('.').collect();
    let id = match segments.as_slice() {
        [ROOT, rest @ ..] => match rest {
            ["Impl"] => Some(Impl),
            ["AccelerationMode"] => Some(AccelerationMode),
            ["ApiVersion", "Version"] => Some(ApiVersion),
            ["ApiVersion", "Major"] => Some(ApiVersionMajor),
            ["ApiVersion", "Minor"] => Some(ApiVersionMinor),
            ["ImplName"] => Some(ImplName),
            ["License"] => Some(License),
            ["Keywords"] => Some(Keywords),
            ["VendorID"] => Some(VendorId),
            ["VendorImplID"] => Some(VendorImplId),
            ["mfxDeviceDescription", "device", "DeviceID"] => Some(DeviceId),
            ["mfxDeviceDescription", "device", "MediaAdapterType"] => Some(MediaAdapterType),
            ["mfxDecoderDescription", "decoder", leaf @ ..] => parse_decoder(leaf),
            ["mfxEncoderDescription", "encoder", leaf @ ..] => parse_encoder(leaf),
            ["mfxVPPDescription", "filter", leaf @ ..] => parse_vpp(leaf),
            _ => None,
        },
        ["mfxImplementedFunctions", "FunctionsName"] => Some(FunctionName),
        ["mfxHandleType"] => Some(HandleType),
        ["mfxHDL"] => Some(Handle),
        ["DeviceCopy"] => Some(DeviceCopy),
        ["ExtBuffer"] => Some(ExtBuffer),
        _ => None,
    };
    id.ok_or_else(|| PropertyError::NotFound(path.to_string()))
}
