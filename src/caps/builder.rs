// Copyright 2024-2026 VPL Dispatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Owned capability descriptors.
//!
//! Builds an [`ImplDescription`] whose nested arrays live in heap buffers
//! owned by the same value, so the raw pointers inside stay valid for as
//! long as the [`OwnedImplDescription`] does. Used for descriptors
//! synthesized from legacy runtimes and by the mock runtimes.

use std::ffi::{c_char, CString};

use crate::abi::{
    mfxHDL, write_fixed_str, AccelerationMode, AccelerationModeDescription, ApiVersion,
    CodecProfile, DecoderCodec, EncoderCodec, ImplDescription, ImplType, ImplementedFunctions,
    MemDescription, MfxRange32U, StructVersion, VppFilter, VppFormat, VppMemDescription,
    IMPL_DESCRIPTION_VERSION, VENDOR_ID_INTEL,
};

const SUB_STRUCT_VERSION: StructVersion = StructVersion { minor: 0, major: 1 };

#[derive(Debug, Clone, Default)]
pub struct MemDescSpec {
    pub mem_handle_type: u32,
    pub width: MfxRange32U,
    pub height: MfxRange32U,
    pub color_formats: Vec<u32>,
}

#[derive(Debug, Clone, Default)]
pub struct ProfileSpec {
    pub profile: u32,
    pub mem_descs: Vec<MemDescSpec>,
}

#[derive(Debug, Clone, Default)]
pub struct DecoderCodecSpec {
    pub codec_id: u32,
    pub max_codec_level: u16,
    pub profiles: Vec<ProfileSpec>,
}

#[derive(Debug, Clone, Default)]
pub struct EncoderCodecSpec {
    pub codec_id: u32,
    pub max_codec_level: u16,
    pub bi_directional_prediction: u16,
    pub reported_stats: u16,
    pub profiles: Vec<ProfileSpec>,
}

#[derive(Debug, Clone, Default)]
pub struct VppFormatSpec {
    pub in_format: u32,
    pub out_formats: Vec<u32>,
}

#[derive(Debug, Clone, Default)]
pub struct VppMemDescSpec {
    pub mem_handle_type: u32,
    pub width: MfxRange32U,
    pub height: MfxRange32U,
    pub formats: Vec<VppFormatSpec>,
}

#[derive(Debug, Clone, Default)]
pub struct VppFilterSpec {
    pub filter_fourcc: u32,
    pub max_delay_in_frames: u16,
    pub mem_descs: Vec<VppMemDescSpec>,
}

/// Backing buffers for every nested array. Inner `Vec`s are never pushed
/// to after a pointer into them is taken.
#[derive(Default)]
struct Storage {
    u32s: Vec<Vec<u32>>,
    mem_descs: Vec<Vec<MemDescription>>,
    profiles: Vec<Vec<CodecProfile>>,
    dec_codecs: Vec<DecoderCodec>,
    enc_codecs: Vec<EncoderCodec>,
    vpp_formats: Vec<Vec<VppFormat>>,
    vpp_mem_descs: Vec<Vec<VppMemDescription>>,
    vpp_filters: Vec<VppFilter>,
}

impl Storage {
    fn keep_u32s(&mut self, values: &[u32]) -> (*mut u32, u16) {
        let mut v = values.to_vec();
        let ptr = if v.is_empty() { std::ptr::null_mut() } else { v.as_mut_ptr() };
        self.u32s.push(v);
        (ptr, values.len() as u16)
    }

    fn keep<T>(bucket: &mut Vec<Vec<T>>, mut v: Vec<T>) -> (*mut T, u16) {
        let len = v.len() as u16;
        let ptr = if v.is_empty() { std::ptr::null_mut() } else { v.as_mut_ptr() };
        bucket.push(v);
        (ptr, len)
    }

    fn profiles(&mut self, specs: &[ProfileSpec]) -> (*mut CodecProfile, u16) {
        let profiles: Vec<CodecProfile> = specs
            .iter()
            .map(|p| {
                let mems: Vec<MemDescription> = p
                    .mem_descs
                    .iter()
                    .map(|m| {
                        let (color_formats, num_color_formats) = self.keep_u32s(&m.color_formats);
                        MemDescription {
                            mem_handle_type: m.mem_handle_type,
                            width: m.width,
                            height: m.height,
                            reserved: [0; 7],
                            num_color_formats,
                            color_formats,
                        }
                    })
                    .collect();
                let (mem_desc, num_mem_types) = Self::keep(&mut self.mem_descs, mems);
                CodecProfile {
                    profile: p.profile,
                    reserved: [0; 7],
                    num_mem_types,
                    mem_desc,
                }
            })
            .collect();
        Self::keep(&mut self.profiles, profiles)
    }

    fn vpp_mem_descs(&mut self, specs: &[VppMemDescSpec]) -> (*mut VppMemDescription, u16) {
        let mems: Vec<VppMemDescription> = specs
            .iter()
            .map(|m| {
                let formats: Vec<VppFormat> = m
                    .formats
                    .iter()
                    .map(|f| {
                        let (out_formats, num_out_format) = self.keep_u32s(&f.out_formats);
                        VppFormat {
                            in_format: f.in_format,
                            reserved: [0; 5],
                            num_out_format,
                            out_formats,
                        }
                    })
                    .collect();
                let (formats, num_in_formats) = Self::keep(&mut self.vpp_formats, formats);
                VppMemDescription {
                    mem_handle_type: m.mem_handle_type,
                    width: m.width,
                    height: m.height,
                    reserved: [0; 7],
                    num_in_formats,
                    formats,
                }
            })
            .collect();
        Self::keep(&mut self.vpp_mem_descs, mems)
    }
}

/// An [`ImplDescription`] together with the memory its pointers refer to.
pub struct OwnedImplDescription {
    desc: Box<ImplDescription>,
    _storage: Storage,
}

// SAFETY: the descriptor is immutable after construction and its pointers
// only reference buffers owned by `_storage`.
unsafe impl Send for OwnedImplDescription {}
unsafe impl Sync for OwnedImplDescription {}

impl OwnedImplDescription {
    pub fn description(&self) -> &ImplDescription {
        &self.desc
    }

    /// Handle given to applications; stable while `self` is alive.
    pub fn as_handle(&self) -> mfxHDL {
        &*self.desc as *const ImplDescription as mfxHDL
    }
}

impl std::fmt::Debug for OwnedImplDescription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OwnedImplDescription")
            .field("impl_name", &self.desc.impl_name())
            .field("impl_type", &self.desc.impl_type)
            .field("acceleration_mode", &self.desc.acceleration_mode)
            .finish_non_exhaustive()
    }
}

/// Fluent builder for [`OwnedImplDescription`].
#[derive(Debug, Clone)]
pub struct ImplDescriptionBuilder {
    impl_type: ImplType,
    acceleration_mode: AccelerationMode,
    api_version: ApiVersion,
    impl_name: String,
    license: String,
    keywords: String,
    vendor_id: u32,
    vendor_impl_id: u32,
    device_id: String,
    media_adapter_type: u16,
    acceleration_modes: Vec<u32>,
    decoders: Vec<DecoderCodecSpec>,
    encoders: Vec<EncoderCodecSpec>,
    vpp_filters: Vec<VppFilterSpec>,
}

impl ImplDescriptionBuilder {
    pub fn new(impl_type: ImplType, acceleration_mode: AccelerationMode) -> Self {
        Self {
            impl_type,
            acceleration_mode,
            api_version: ApiVersion::new(2, 9),
            impl_name: String::new(),
            license: String::new(),
            keywords: String::new(),
            vendor_id: VENDOR_ID_INTEL,
            vendor_impl_id: 0,
            device_id: String::new(),
            media_adapter_type: 0,
            acceleration_modes: Vec::new(),
            decoders: Vec::new(),
            encoders: Vec::new(),
            vpp_filters: Vec::new(),
        }
    }

    pub fn hardware(acceleration_mode: AccelerationMode) -> Self {
        Self::new(ImplType::Hardware, acceleration_mode)
    }

    pub fn software() -> Self {
        Self::new(ImplType::Software, AccelerationMode::NA)
    }

    pub fn api_version(mut self, version: ApiVersion) -> Self {
        self.api_version = version;
        self
    }

    pub fn impl_name(mut self, name: &str) -> Self {
        self.impl_name = name.to_string();
        self
    }

    pub fn license(mut self, license: &str) -> Self {
        self.license = license.to_string();
        self
    }

    pub fn keywords(mut self, keywords: &str) -> Self {
        self.keywords = keywords.to_string();
        self
    }

    pub fn vendor_id(mut self, vendor_id: u32) -> Self {
        self.vendor_id = vendor_id;
        self
    }

    pub fn vendor_impl_id(mut self, vendor_impl_id: u32) -> Self {
        self.vendor_impl_id = vendor_impl_id;
        self
    }

    pub fn device_id(mut self, device_id: &str) -> Self {
        self.device_id = device_id.to_string();
        self
    }

    pub fn media_adapter_type(mut self, media_adapter_type: u16) -> Self {
        self.media_adapter_type = media_adapter_type;
        self
    }

    /// Add an entry to the acceleration-mode description list.
    pub fn acceleration_mode_entry(mut self, mode: AccelerationMode) -> Self {
        self.acceleration_modes.push(mode.0);
        self
    }

    pub fn decoder(mut self, codec: DecoderCodecSpec) -> Self {
        self.decoders.push(codec);
        self
    }

    pub fn encoder(mut self, codec: EncoderCodecSpec) -> Self {
        self.encoders.push(codec);
        self
    }

    pub fn vpp_filter(mut self, filter: VppFilterSpec) -> Self {
        self.vpp_filters.push(filter);
        self
    }

    pub fn build(self) -> OwnedImplDescription {
        let mut storage = Storage::default();
        let mut desc = Box::<ImplDescription>::default();

        desc.version = IMPL_DESCRIPTION_VERSION;
        desc.impl_type = self.impl_type.raw();
        desc.acceleration_mode = self.acceleration_mode.0;
        desc.api_version = self.api_version.into();
        write_fixed_str(&mut desc.impl_name, &self.impl_name);
        write_fixed_str(&mut desc.license, &self.license);
        write_fixed_str(&mut desc.keywords, &self.keywords);
        desc.vendor_id = self.vendor_id;
        desc.vendor_impl_id = self.vendor_impl_id;

        desc.dev.version = SUB_STRUCT_VERSION;
        desc.dev.media_adapter_type = self.media_adapter_type;
        write_fixed_str(&mut desc.dev.device_id, &self.device_id);

        let dec_codecs: Vec<DecoderCodec> = self
            .decoders
            .iter()
            .map(|c| {
                let (profiles, num_profiles) = storage.profiles(&c.profiles);
                DecoderCodec {
                    codec_id: c.codec_id,
                    reserved: [0; 8],
                    max_codec_level: c.max_codec_level,
                    num_profiles,
                    profiles,
                }
            })
            .collect();
        storage.dec_codecs = dec_codecs;
        desc.dec.version = SUB_STRUCT_VERSION;
        desc.dec.num_codecs = storage.dec_codecs.len() as u16;
        desc.dec.codecs = non_empty_ptr(&mut storage.dec_codecs);

        let enc_codecs: Vec<EncoderCodec> = self
            .encoders
            .iter()
            .map(|c| {
                let (profiles, num_profiles) = storage.profiles(&c.profiles);
                EncoderCodec {
                    codec_id: c.codec_id,
                    max_codec_level: c.max_codec_level,
                    bi_directional_prediction: c.bi_directional_prediction,
                    reported_stats: c.reported_stats,
                    reserved: [0; 6],
                    num_profiles,
                    profiles,
                }
            })
            .collect();
        storage.enc_codecs = enc_codecs;
        desc.enc.version = SUB_STRUCT_VERSION;
        desc.enc.num_codecs = storage.enc_codecs.len() as u16;
        desc.enc.codecs = non_empty_ptr(&mut storage.enc_codecs);

        let vpp_filters: Vec<VppFilter> = self
            .vpp_filters
            .iter()
            .map(|f| {
                let (mem_desc, num_mem_types) = storage.vpp_mem_descs(&f.mem_descs);
                VppFilter {
                    filter_fourcc: f.filter_fourcc,
                    max_delay_in_frames: f.max_delay_in_frames,
                    reserved: [0; 7],
                    num_mem_types,
                    mem_desc,
                }
            })
            .collect();
        storage.vpp_filters = vpp_filters;
        desc.vpp.version = SUB_STRUCT_VERSION;
        desc.vpp.num_filters = storage.vpp_filters.len() as u16;
        desc.vpp.filters = non_empty_ptr(&mut storage.vpp_filters);

        let modes = if self.acceleration_modes.is_empty() {
            vec![self.acceleration_mode.0]
        } else {
            self.acceleration_modes
        };
        let (modes_ptr, num_modes) = storage.keep_u32s(&modes);
        desc.acceleration_mode_description = AccelerationModeDescription {
            version: SUB_STRUCT_VERSION,
            reserved: [0; 2],
            num_acceleration_modes: num_modes,
            modes: modes_ptr,
        };
        desc.pool_policies.version = SUB_STRUCT_VERSION;

        OwnedImplDescription {
            desc,
            _storage: storage,
        }
    }
}

fn non_empty_ptr<T>(v: &mut [T]) -> *mut T {
    if v.is_empty() {
        std::ptr::null_mut()
    } else {
        v.as_mut_ptr()
    }
}

/// An [`ImplementedFunctions`] list with owned name strings.
pub struct OwnedImplementedFunctions {
    raw: Box<ImplementedFunctions>,
    _ptrs: Vec<*mut c_char>,
    strings: Vec<CString>,
}

// SAFETY: immutable after construction; pointers reference owned strings.
unsafe impl Send for OwnedImplementedFunctions {}
unsafe impl Sync for OwnedImplementedFunctions {}

impl OwnedImplementedFunctions {
    /// Names containing interior NUL bytes are skipped.
    pub fn new<S: AsRef<str>>(names: &[S]) -> Self {
        let names: Vec<CString> = names
            .iter()
            .filter_map(|n| CString::new(n.as_ref()).ok())
            .collect();
        let mut ptrs: Vec<*mut c_char> = names.iter().map(|n| n.as_ptr() as *mut c_char).collect();
        let raw = Box::new(ImplementedFunctions {
            num_functions: ptrs.len() as u16,
            functions_name: non_empty_ptr(&mut ptrs),
        });
        Self {
            raw,
            _ptrs: ptrs,
            strings: names,
        }
    }

    pub fn as_handle(&self) -> mfxHDL {
        &*self.raw as *const ImplementedFunctions as mfxHDL
    }

    pub fn names(&self) -> Vec<String> {
        self.strings
            .iter()
            .map(|n| n.to_string_lossy().into_owned())
            .collect()
    }
}

impl std::fmt::Debug for OwnedImplementedFunctions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn avc_decoder() -> DecoderCodecSpec {
        DecoderCodecSpec {
            codec_id: 0x2043_5641,
            max_codec_level: 51,
            profiles: vec![ProfileSpec {
                profile: 100,
                mem_descs: vec![MemDescSpec {
                    mem_handle_type: 4,
                    width: MfxRange32U::new(16, 4096, 16),
                    height: MfxRange32U::new(16, 4096, 16),
                    color_formats: vec![0x3231_564E],
                }],
            }],
        }
    }

    #[test]
    fn test_build_fills_top_level_fields() {
        let owned = ImplDescriptionBuilder::hardware(AccelerationMode::VAAPI)
            .api_version(ApiVersion::new(2, 8))
            .impl_name("mfx-gen")
            .vendor_impl_id(3)
            .device_id("56a0/0")
            .build();
        let desc = owned.description();
        assert_eq!(desc.version, IMPL_DESCRIPTION_VERSION);
        assert_eq!(desc.impl_type, ImplType::RAW_HARDWARE);
        assert_eq!(desc.acceleration_mode, AccelerationMode::VAAPI.0);
        assert_eq!(ApiVersion::from(desc.api_version), ApiVersion::new(2, 8));
        assert_eq!(desc.impl_name(), "mfx-gen");
        assert_eq!(desc.vendor_id, VENDOR_ID_INTEL);
        assert_eq!(desc.vendor_impl_id, 3);
        assert_eq!(desc.device_id(), "56a0/0");
    }

    #[test]
    fn test_nested_arrays_survive_move() {
        let owned = ImplDescriptionBuilder::hardware(AccelerationMode::VAAPI)
            .decoder(avc_decoder())
            .build();
        let moved = Box::new(owned);
        let desc = moved.description();
        unsafe {
            let codecs = desc.dec.codecs();
            assert_eq!(codecs.len(), 1);
            assert_eq!(codecs[0].codec_id, 0x2043_5641);
            let profiles = codecs[0].profiles();
            assert_eq!(profiles[0].profile, 100);
            let mems = profiles[0].mem_descs();
            assert_eq!(mems[0].width.max, 4096);
            assert_eq!(mems[0].color_formats(), &[0x3231_564E]);
        }
    }

    #[test]
    fn test_acceleration_mode_list_defaults_to_primary_mode() {
        let owned = ImplDescriptionBuilder::hardware(AccelerationMode::D3D11).build();
        let modes = unsafe { owned.description().acceleration_mode_description.modes() };
        assert_eq!(modes, &[AccelerationMode::D3D11.0]);
    }

    #[test]
    fn test_implemented_functions_roundtrip() {
        let funcs = OwnedImplementedFunctions::new(&["MFXInitialize", "MFXClose"]);
        let raw = unsafe { &*(funcs.as_handle() as *const ImplementedFunctions) };
        assert_eq!(raw.num_functions, 2);
        assert_eq!(unsafe { raw.names() }, funcs.names());
    }
}
