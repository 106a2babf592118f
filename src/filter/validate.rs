// Copyright 2024-2026 VPL Dispatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Matching filter configs against implementation descriptors.
//!
//! Every property starts `NotSet`. Configs are applied oldest first and
//! each property a config sets overwrites the state left by earlier
//! configs. An implementation is accepted when no property ends up
//! `Unsupported`.
//!
//! Decoder, encoder and VPP leaves set on one config are checked together
//! against a single codec (or filter). Codecs and profiles are searched;
//! below the profile only the first memory descriptor, the first color
//! format and the first VPP format are compared.

use crate::abi::{
    ApiVersion, CodecProfile, ImplDescription, ImplType, MemDescription, MfxRange32U, VppFilter,
};
use crate::caps::ImplementationRecord;

use super::config::ConfigObject;
use super::property::{Family, PropertyId};
use super::value::PropertyValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PropertyState {
    #[default]
    NotSet,
    Supported,
    Unsupported,
}

impl PropertyState {
    fn from_match(matched: bool) -> Self {
        if matched {
            PropertyState::Supported
        } else {
            PropertyState::Unsupported
        }
    }
}

/// Final state of every property for one implementation.
#[derive(Debug, Clone)]
pub struct Evaluation {
    states: [PropertyState; PropertyId::COUNT],
}

impl Evaluation {
    pub fn state(&self, id: PropertyId) -> PropertyState {
        self.states[id.index()]
    }

    pub fn accepted(&self) -> bool {
        !self.states.contains(&PropertyState::Unsupported)
    }

    /// Properties that rejected the implementation.
    pub fn rejected_by(&self) -> Vec<PropertyId> {
        PropertyId::ALL
            .iter()
            .copied()
            .filter(|id| self.state(*id) == PropertyState::Unsupported)
            .collect()
    }
}

/// Evaluate every config against `record`.
pub fn evaluate(configs: &[ConfigObject], record: &ImplementationRecord) -> Evaluation {
    // SAFETY: a record's descriptor and its nested arrays stay valid while
    // the record exists.
    unsafe { evaluate_description(configs, record.description(), record.function_names()) }
}

pub fn accepts(configs: &[ConfigObject], record: &ImplementationRecord) -> bool {
    evaluate(configs, record).accepted()
}

/// # Safety
/// Every array pointer reachable from `desc` must be null or valid for its
/// count.
pub(crate) unsafe fn evaluate_description(
    configs: &[ConfigObject],
    desc: &ImplDescription,
    functions: Option<&[String]>,
) -> Evaluation {
    let mut states = [PropertyState::NotSet; PropertyId::COUNT];

    for cfg in configs {
        let mut dec = Vec::new();
        let mut enc = Vec::new();
        let mut vpp = Vec::new();
        let mut version_parts = Vec::new();

        for (id, value) in cfg.filters() {
            if matches!(id, PropertyId::ApiVersionMajor | PropertyId::ApiVersionMinor) {
                version_parts.push((id, value));
                continue;
            }
            match id.family() {
                Family::Top => {
                    states[id.index()] = PropertyState::from_match(top_matches(desc, id, value));
                }
                Family::Functions => {
                    let found = match (functions, value.as_str()) {
                        (Some(names), Some(wanted)) => names.iter().any(|n| n == wanted),
                        _ => false,
                    };
                    states[id.index()] = PropertyState::from_match(found);
                }
                Family::Decoder => dec.push((id, value)),
                Family::Encoder => enc.push((id, value)),
                Family::Vpp => vpp.push((id, value)),
                Family::Special => {}
            }
        }

        if !version_parts.is_empty() {
            let query = Query::new(&version_parts);
            let matched = api_version_at_least(desc, &query);
            apply(&mut states, &version_parts, matched);
        }
        if !dec.is_empty() {
            let query = Query::new(&dec);
            let matched = desc.dec.codecs().iter().any(|codec| {
                decoder_codec_matches(&query, codec.codec_id, codec.max_codec_level, codec.profiles())
            });
            apply(&mut states, &dec, matched);
        }
        if !enc.is_empty() {
            let query = Query::new(&enc);
            let matched = desc.enc.codecs().iter().any(|codec| {
                query.u16_eq(PropertyId::EncBiDirectionalPrediction, codec.bi_directional_prediction)
                    && query.u16_eq(PropertyId::EncReportedStats, codec.reported_stats)
                    && encoder_codec_matches(
                        &query,
                        codec.codec_id,
                        codec.max_codec_level,
                        codec.profiles(),
                    )
            });
            apply(&mut states, &enc, matched);
        }
        if !vpp.is_empty() {
            let query = Query::new(&vpp);
            let matched = desc
                .vpp
                .filters()
                .iter()
                .any(|filter| vpp_filter_matches(&query, filter));
            apply(&mut states, &vpp, matched);
        }
    }

    Evaluation { states }
}

fn apply(states: &mut [PropertyState], props: &[(PropertyId, &PropertyValue)], matched: bool) {
    for (id, _) in props {
        states[id.index()] = PropertyState::from_match(matched);
    }
}

/// Leaves of one family set on one config.
struct Query<'a> {
    props: &'a [(PropertyId, &'a PropertyValue)],
}

impl<'a> Query<'a> {
    fn new(props: &'a [(PropertyId, &'a PropertyValue)]) -> Self {
        Self { props }
    }

    fn get(&self, id: PropertyId) -> Option<&'a PropertyValue> {
        self.props.iter().find(|(p, _)| *p == id).map(|(_, v)| *v)
    }

    fn has(&self, ids: &[PropertyId]) -> bool {
        ids.iter().any(|id| self.get(*id).is_some())
    }

    fn u32_eq(&self, id: PropertyId, actual: u32) -> bool {
        self.get(id).and_then(PropertyValue::as_u32).map_or(true, |v| v == actual)
    }

    fn u16_eq(&self, id: PropertyId, actual: u16) -> bool {
        self.get(id).and_then(PropertyValue::as_u16).map_or(true, |v| v == actual)
    }

    fn range_within(&self, id: PropertyId, actual: &MfxRange32U) -> bool {
        self.get(id)
            .and_then(PropertyValue::as_range)
            .map_or(true, |wanted| actual.contains_range(wanted))
    }
}

/// Ids of the memory-descriptor leaves for one codec family.
struct MemIds {
    handle_type: PropertyId,
    width: PropertyId,
    height: PropertyId,
    color_formats: PropertyId,
}

const DEC_MEM: MemIds = MemIds {
    handle_type: PropertyId::DecMemHandleType,
    width: PropertyId::DecWidth,
    height: PropertyId::DecHeight,
    color_formats: PropertyId::DecColorFormats,
};

const ENC_MEM: MemIds = MemIds {
    handle_type: PropertyId::EncMemHandleType,
    width: PropertyId::EncWidth,
    height: PropertyId::EncHeight,
    color_formats: PropertyId::EncColorFormats,
};

unsafe fn decoder_codec_matches(
    query: &Query<'_>,
    codec_id: u32,
    level: u16,
    profiles: &[CodecProfile],
) -> bool {
    query.u32_eq(PropertyId::DecCodecId, codec_id)
        && query.u16_eq(PropertyId::DecMaxCodecLevel, level)
        && profile_matches(query, PropertyId::DecProfile, &DEC_MEM, profiles)
}

unsafe fn encoder_codec_matches(
    query: &Query<'_>,
    codec_id: u32,
    level: u16,
    profiles: &[CodecProfile],
) -> bool {
    query.u32_eq(PropertyId::EncCodecId, codec_id)
        && query.u16_eq(PropertyId::EncMaxCodecLevel, level)
        && profile_matches(query, PropertyId::EncProfile, &ENC_MEM, profiles)
}

unsafe fn profile_matches(
    query: &Query<'_>,
    profile_id: PropertyId,
    mem: &MemIds,
    profiles: &[CodecProfile],
) -> bool {
    let mem_leaves = [mem.handle_type, mem.width, mem.height, mem.color_formats];
    if !query.has(&[profile_id]) && !query.has(&mem_leaves) {
        return true;
    }
    for profile in profiles {
        if !query.u32_eq(profile_id, profile.profile) {
            continue;
        }
        if !query.has(&mem_leaves) {
            return true;
        }
        if let Some(first) = profile.mem_descs().first() {
            if mem_matches(query, mem, first) {
                return true;
            }
        }
    }
    false
}

unsafe fn mem_matches(query: &Query<'_>, ids: &MemIds, mem: &MemDescription) -> bool {
    let color_ok = match query.get(ids.color_formats).and_then(PropertyValue::as_u32) {
        Some(wanted) => mem.color_formats().first() == Some(&wanted),
        None => true,
    };
    query.u32_eq(ids.handle_type, mem.mem_handle_type)
        && query.range_within(ids.width, &mem.width)
        && query.range_within(ids.height, &mem.height)
        && color_ok
}

unsafe fn vpp_filter_matches(query: &Query<'_>, filter: &VppFilter) -> bool {
    use PropertyId::*;

    if !query.u32_eq(VppFilterFourCc, filter.filter_fourcc)
        || !query.u16_eq(VppMaxDelayInFrames, filter.max_delay_in_frames)
    {
        return false;
    }
    if !query.has(&[VppMemHandleType, VppWidth, VppHeight, VppInFormat, VppOutFormats]) {
        return true;
    }
    let Some(mem) = filter.mem_descs().first() else {
        return false;
    };
    if !query.u32_eq(VppMemHandleType, mem.mem_handle_type)
        || !query.range_within(VppWidth, &mem.width)
        || !query.range_within(VppHeight, &mem.height)
    {
        return false;
    }
    if !query.has(&[VppInFormat, VppOutFormats]) {
        return true;
    }
    let Some(format) = mem.formats().first() else {
        return false;
    };
    let out_ok = match query.get(VppOutFormats).and_then(PropertyValue::as_u32) {
        Some(wanted) => format.out_formats().first() == Some(&wanted),
        None => true,
    };
    query.u32_eq(VppInFormat, format.in_format) && out_ok
}

/// `ApiVersion.Major` and `ApiVersion.Minor` set on one config form a single
/// minimum. A missing major is the implementation's own; a missing minor is 0.
fn api_version_at_least(desc: &ImplDescription, query: &Query<'_>) -> bool {
    let actual = ApiVersion::from(desc.api_version);
    let part = |id| query.get(id).map(PropertyValue::as_u16);
    let major = match part(PropertyId::ApiVersionMajor) {
        Some(Some(v)) => v,
        Some(None) => return false,
        None => actual.major,
    };
    let minor = match part(PropertyId::ApiVersionMinor) {
        Some(Some(v)) => v,
        Some(None) => return false,
        None => 0,
    };
    actual >= ApiVersion::new(major, minor)
}

/// Matches a comma-separated list entry or the whole string.
fn list_contains(list: &str, wanted: &str) -> bool {
    list == wanted || list.split(',').any(|entry| entry.trim() == wanted)
}

/// Device ids look like `<hex id>/<adapter>`; the bare hex id also matches.
fn device_id_matches(actual: &str, wanted: &str) -> bool {
    actual == wanted || actual.split('/').next() == Some(wanted)
}

unsafe fn top_matches(desc: &ImplDescription, id: PropertyId, value: &PropertyValue) -> bool {
    use PropertyId as P;

    let version = ApiVersion::from(desc.api_version);
    match (id, value) {
        (P::Impl, PropertyValue::U32(v)) => {
            ImplType::from_raw(desc.impl_type) == ImplType::from_raw(*v)
        }
        (P::AccelerationMode, PropertyValue::U32(v)) => {
            desc.acceleration_mode == *v
                || desc.acceleration_mode_description.modes().contains(v)
        }
        (P::ApiVersion, PropertyValue::U32(v)) => version >= ApiVersion::from_packed(*v),
        (P::ImplName, PropertyValue::String(s)) => desc.impl_name() == *s,
        (P::License, PropertyValue::String(s)) => list_contains(&desc.license(), s),
        (P::Keywords, PropertyValue::String(s)) => list_contains(&desc.keywords(), s),
        (P::VendorId, PropertyValue::U32(v)) => desc.vendor_id == *v,
        (P::VendorImplId, PropertyValue::U32(v)) => desc.vendor_impl_id == *v,
        (P::DeviceId, PropertyValue::String(s)) => device_id_matches(&desc.device_id(), s),
        (P::MediaAdapterType, PropertyValue::U16(v)) => desc.dev.media_adapter_type == *v,
        _ => false,
    }
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
