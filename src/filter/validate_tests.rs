// Copyright 2024-2026 VPL Dispatch Contributors
// SPDX-License-Identifier: Apache-2.0

use super::*;
use crate::abi::{AccelerationMode, ApiVersion, MfxRange32U};
use crate::caps::{
    DecoderCodecSpec, Descriptor, EncoderCodecSpec, ImplDescriptionBuilder, MemDescSpec,
    ProfileSpec, VppFilterSpec, VppFormatSpec, VppMemDescSpec,
};
use crate::library::LibraryKind;

const AVC: u32 = 0x2043_5641;
const HEVC: u32 = 0x4356_4548;
const NV12: u32 = 0x3231_564e;
const P010: u32 = 0x3031_3050;
const MEM_VIDEO: u32 = 0x0001;

fn profile(profile: u32, color_formats: Vec<u32>) -> ProfileSpec {
    ProfileSpec {
        profile,
        mem_descs: vec![MemDescSpec {
            mem_handle_type: MEM_VIDEO,
            width: MfxRange32U::new(64, 4096, 16),
            height: MfxRange32U::new(64, 2304, 16),
            color_formats,
        }],
    }
}

fn gpu_record() -> ImplementationRecord {
    let owned = ImplDescriptionBuilder::hardware(AccelerationMode::VAAPI)
        .api_version(ApiVersion::new(2, 9))
        .impl_name("mfx-gen")
        .license("MIT,BSD")
        .keywords("GPU,VAAPI")
        .device_id("9a49/0")
        .acceleration_mode_entry(AccelerationMode::VAAPI_DRM_MODESET)
        .decoder(DecoderCodecSpec {
            codec_id: AVC,
            max_codec_level: 52,
            profiles: vec![profile(100, vec![NV12]), profile(77, vec![NV12])],
        })
        .decoder(DecoderCodecSpec {
            codec_id: HEVC,
            max_codec_level: 62,
            profiles: vec![profile(1, vec![NV12, P010]), profile(2, vec![P010])],
        })
        .encoder(EncoderCodecSpec {
            codec_id: AVC,
            max_codec_level: 51,
            bi_directional_prediction: 1,
            reported_stats: 0,
            profiles: vec![profile(100, vec![NV12])],
        })
        .vpp_filter(VppFilterSpec {
            filter_fourcc: 0x5059_4e44,
            max_delay_in_frames: 1,
            mem_descs: vec![VppMemDescSpec {
                mem_handle_type: MEM_VIDEO,
                width: MfxRange32U::new(16, 8192, 16),
                height: MfxRange32U::new(16, 8192, 16),
                formats: vec![
                    VppFormatSpec {
                        in_format: NV12,
                        out_formats: vec![NV12, P010],
                    },
                    VppFormatSpec {
                        in_format: P010,
                        out_formats: vec![P010],
                    },
                ],
            }],
        })
        .build();
    ImplementationRecord::new(0, 0, Descriptor::Synthesized(owned), LibraryKind::Modern)
}

fn software_record() -> ImplementationRecord {
    let owned = ImplDescriptionBuilder::software()
        .api_version(ApiVersion::new(2, 5))
        .build();
    ImplementationRecord::new(1, 0, Descriptor::Synthesized(owned), LibraryKind::Modern)
}

fn config(props: &[(&str, PropertyValue)]) -> ConfigObject {
    let mut cfg = ConfigObject::new(0);
    for (path, value) in props {
        cfg.set(path, value.clone()).unwrap();
    }
    cfg
}

const DEC_CODEC: &str = "mfxImplDescription.mfxDecoderDescription.decoder.CodecID";
const DEC_PROFILE: &str = "mfxImplDescription.mfxDecoderDescription.decoder.decprofile.Profile";
const DEC_COLOR: &str =
    "mfxImplDescription.mfxDecoderDescription.decoder.decprofile.decmemdesc.ColorFormats";
const DEC_WIDTH: &str =
    "mfxImplDescription.mfxDecoderDescription.decoder.decprofile.decmemdesc.Width";

#[test]
fn test_no_configs_accepts_everything() {
    assert!(accepts(&[], &gpu_record()));
    assert!(accepts(&[ConfigObject::new(0)], &software_record()));
}

#[test]
fn test_impl_type_filter() {
    let cfg = config(&[("mfxImplDescription.Impl", PropertyValue::U32(2))]);
    assert!(accepts(std::slice::from_ref(&cfg), &gpu_record()));
    assert!(!accepts(std::slice::from_ref(&cfg), &software_record()));
}

#[test]
fn test_api_version_is_a_minimum() {
    let at_least = |v: ApiVersion| {
        config(&[("mfxImplDescription.ApiVersion.Version", PropertyValue::U32(v.packed()))])
    };
    assert!(accepts(&[at_least(ApiVersion::new(2, 0))], &gpu_record()));
    assert!(accepts(&[at_least(ApiVersion::new(2, 9))], &gpu_record()));
    assert!(!accepts(&[at_least(ApiVersion::new(2, 10))], &gpu_record()));

    let major = config(&[("mfxImplDescription.ApiVersion.Major", PropertyValue::U16(3))]);
    assert!(!accepts(&[major], &gpu_record()));
}

fn record_at(version: ApiVersion) -> ImplementationRecord {
    let owned = ImplDescriptionBuilder::hardware(AccelerationMode::VAAPI)
        .api_version(version)
        .build();
    ImplementationRecord::new(0, 0, Descriptor::Synthesized(owned), LibraryKind::Modern)
}

fn version_parts(major: Option<u16>, minor: Option<u16>) -> ConfigObject {
    let mut cfg = ConfigObject::new(0);
    if let Some(major) = major {
        cfg.set("mfxImplDescription.ApiVersion.Major", PropertyValue::U16(major))
            .unwrap();
    }
    if let Some(minor) = minor {
        cfg.set("mfxImplDescription.ApiVersion.Minor", PropertyValue::U16(minor))
            .unwrap();
    }
    cfg
}

#[test]
fn test_major_and_minor_form_one_minimum() {
    let at_least_2_5 = [version_parts(Some(2), Some(5))];
    assert!(accepts(&at_least_2_5, &record_at(ApiVersion::new(3, 0))));
    assert!(accepts(&at_least_2_5, &record_at(ApiVersion::new(2, 5))));
    assert!(accepts(&at_least_2_5, &record_at(ApiVersion::new(2, 11))));
    assert!(!accepts(&at_least_2_5, &record_at(ApiVersion::new(2, 4))));
    assert!(!accepts(&at_least_2_5, &record_at(ApiVersion::new(1, 35))));

    let eval = evaluate(&at_least_2_5, &record_at(ApiVersion::new(2, 4)));
    assert_eq!(eval.state(PropertyId::ApiVersionMajor), PropertyState::Unsupported);
    assert_eq!(eval.state(PropertyId::ApiVersionMinor), PropertyState::Unsupported);
}

#[test]
fn test_major_only_ignores_minor() {
    let major_2 = [version_parts(Some(2), None)];
    assert!(accepts(&major_2, &record_at(ApiVersion::new(2, 0))));
    assert!(accepts(&major_2, &record_at(ApiVersion::new(3, 1))));
    assert!(!accepts(&major_2, &record_at(ApiVersion::new(1, 35))));
}

#[test]
fn test_minor_only_compares_within_own_major() {
    let minor_5 = [version_parts(None, Some(5))];
    assert!(accepts(&minor_5, &record_at(ApiVersion::new(2, 5))));
    assert!(accepts(&minor_5, &record_at(ApiVersion::new(2, 8))));
    assert!(!accepts(&minor_5, &record_at(ApiVersion::new(2, 4))));
    assert!(!accepts(&minor_5, &record_at(ApiVersion::new(3, 0))));
}

#[test]
fn test_acceleration_mode_matches_list_entries() {
    let modeset = config(&[(
        "mfxImplDescription.AccelerationMode",
        PropertyValue::U32(AccelerationMode::VAAPI_DRM_MODESET.0),
    )]);
    assert!(accepts(&[modeset], &gpu_record()));

    let d3d11 = config(&[(
        "mfxImplDescription.AccelerationMode",
        PropertyValue::U32(AccelerationMode::D3D11.0),
    )]);
    assert!(!accepts(&[d3d11], &gpu_record()));
}

#[test]
fn test_string_filters() {
    let record = gpu_record();
    let ok = |path: &str, s: &str| {
        accepts(&[config(&[(path, PropertyValue::String(s.into()))])], &record)
    };
    assert!(ok("mfxImplDescription.ImplName", "mfx-gen"));
    assert!(!ok("mfxImplDescription.ImplName", "mfx"));
    assert!(ok("mfxImplDescription.License", "BSD"));
    assert!(ok("mfxImplDescription.Keywords", "GPU,VAAPI"));
    assert!(!ok("mfxImplDescription.Keywords", "CPU"));
    assert!(ok("mfxImplDescription.mfxDeviceDescription.device.DeviceID", "9a49"));
    assert!(ok("mfxImplDescription.mfxDeviceDescription.device.DeviceID", "9a49/0"));
    assert!(!ok("mfxImplDescription.mfxDeviceDescription.device.DeviceID", "9a4"));
}

#[test]
fn test_codec_searched_profile_within_codec() {
    let hevc_main10 = config(&[
        (DEC_CODEC, PropertyValue::U32(HEVC)),
        (DEC_PROFILE, PropertyValue::U32(2)),
    ]);
    assert!(accepts(&[hevc_main10], &gpu_record()));

    // Profile 77 exists, but only under AVC.
    let hevc_77 = config(&[
        (DEC_CODEC, PropertyValue::U32(HEVC)),
        (DEC_PROFILE, PropertyValue::U32(77)),
    ]);
    assert!(!accepts(&[hevc_77], &gpu_record()));
}

#[test]
fn test_only_first_color_format_compared() {
    let first = config(&[
        (DEC_CODEC, PropertyValue::U32(HEVC)),
        (DEC_COLOR, PropertyValue::U32(NV12)),
    ]);
    assert!(accepts(&[first], &gpu_record()));

    // P010 is listed second under HEVC profile 1.
    let second = config(&[
        (DEC_CODEC, PropertyValue::U32(HEVC)),
        (DEC_PROFILE, PropertyValue::U32(1)),
        (DEC_COLOR, PropertyValue::U32(P010)),
    ]);
    assert!(!accepts(&[second], &gpu_record()));
}

#[test]
fn test_width_range_must_fit() {
    let fits = config(&[(DEC_WIDTH, PropertyValue::Range(MfxRange32U::new(128, 1920, 16)))]);
    assert!(accepts(&[fits], &gpu_record()));

    let too_wide = config(&[(DEC_WIDTH, PropertyValue::Range(MfxRange32U::new(128, 8192, 16)))]);
    assert!(!accepts(&[too_wide], &gpu_record()));
}

#[test]
fn test_family_absent_is_unsupported() {
    let cfg = config(&[(DEC_CODEC, PropertyValue::U32(AVC))]);
    let eval = evaluate(std::slice::from_ref(&cfg), &software_record());
    assert!(!eval.accepted());
    assert_eq!(eval.state(PropertyId::DecCodecId), PropertyState::Unsupported);
    assert_eq!(eval.rejected_by(), vec![PropertyId::DecCodecId]);
}

#[test]
fn test_encoder_and_vpp_leaves() {
    let enc = config(&[
        (
            "mfxImplDescription.mfxEncoderDescription.encoder.CodecID",
            PropertyValue::U32(AVC),
        ),
        (
            "mfxImplDescription.mfxEncoderDescription.encoder.BiDirectionalPrediction",
            PropertyValue::U16(1),
        ),
    ]);
    assert!(accepts(&[enc], &gpu_record()));

    let vpp_out = |fmt: u32| {
        config(&[(
            "mfxImplDescription.mfxVPPDescription.filter.memdesc.format.OutFormats",
            PropertyValue::U32(fmt),
        )])
    };
    assert!(accepts(&[vpp_out(NV12)], &gpu_record()));
    assert!(!accepts(&[vpp_out(P010)], &gpu_record()));
}

#[test]
fn test_later_config_overwrites_state() {
    let sw = config(&[("mfxImplDescription.Impl", PropertyValue::U32(1))]);
    let hw = config(&[("mfxImplDescription.Impl", PropertyValue::U32(2))]);
    assert!(accepts(&[sw.clone(), hw.clone()], &gpu_record()));
    assert!(!accepts(&[hw, sw], &gpu_record()));
}

#[test]
fn test_independent_codec_configs_both_satisfiable() {
    let avc = config(&[
        (DEC_CODEC, PropertyValue::U32(AVC)),
        (DEC_PROFILE, PropertyValue::U32(77)),
    ]);
    let hevc = config(&[
        (DEC_CODEC, PropertyValue::U32(HEVC)),
        (DEC_PROFILE, PropertyValue::U32(2)),
    ]);
    assert!(accepts(&[avc, hevc], &gpu_record()));
}

#[test]
fn test_function_name_requires_list() {
    let cfg = config(&[(
        "mfxImplementedFunctions.FunctionsName",
        PropertyValue::String("MFXVideoDECODE_VPP_Init".into()),
    )]);
    let configs = std::slice::from_ref(&cfg);
    assert!(!accepts(configs, &gpu_record()));

    let functions = crate::caps::OwnedImplementedFunctions::new(&["MFXVideoDECODE_VPP_Init"]);
    let with_list = gpu_record().with_functions(functions.as_handle(), functions.names());
    assert!(accepts(configs, &with_list));
}
