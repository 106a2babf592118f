// Copyright 2024-2026 VPL Dispatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Session parameters carried by config objects next to the filters.

use std::collections::HashMap;
use std::ffi::c_void;

use crate::abi::{mfxHDL, AccelerationMode, HandleType, ImplType, VENDOR_ID_INTEL};
use crate::filter::{ConfigObject, Family, PropertyId, PropertyValue};

/// Parameters applied when a session is created. Later configs win.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecialConfig {
    pub acceleration_mode: Option<AccelerationMode>,
    pub handle_type: Option<HandleType>,
    pub handle: Option<mfxHDL>,
    pub device_copy: Option<u16>,
    /// Every extension buffer set, in order.
    pub ext_buffers: Vec<*mut c_void>,
}

impl SpecialConfig {
    pub fn collect(configs: &[ConfigObject]) -> Self {
        let mut special = SpecialConfig::default();
        for (id, value) in configs.iter().flat_map(ConfigObject::properties) {
            match (id, value) {
                (PropertyId::AccelerationMode, PropertyValue::U32(mode)) => {
                    special.acceleration_mode = Some(AccelerationMode(*mode));
                }
                (PropertyId::HandleType, PropertyValue::U32(ty)) => {
                    special.handle_type = Some(HandleType(*ty));
                }
                (PropertyId::Handle, PropertyValue::Pointer(hdl)) => special.handle = Some(*hdl),
                (PropertyId::DeviceCopy, PropertyValue::U16(copy)) => {
                    special.device_copy = Some(*copy);
                }
                (PropertyId::ExtBuffer, PropertyValue::Pointer(buf)) => special.ext_buffers.push(*buf),
                _ => {}
            }
        }
        special
    }

    /// The handle to bind after session creation, when both halves are set.
    pub fn device_handle(&self) -> Option<(HandleType, mfxHDL)> {
        self.handle_type.zip(self.handle)
    }
}

/// Whether the filters ask for nothing but the vendor's hardware runtime,
/// letting discovery skip the full search.
///
/// Matches exactly `Impl = hardware` and `VendorID = 0x8086`, optionally
/// with `AccelerationMode`, after later configs override earlier ones.
pub fn is_low_latency(configs: &[ConfigObject]) -> bool {
    let mut last: HashMap<PropertyId, &PropertyValue> = HashMap::new();
    for (id, value) in configs.iter().flat_map(ConfigObject::properties) {
        if id.family() != Family::Special {
            last.insert(id, value);
        }
    }

    let hardware = matches!(
        last.get(&PropertyId::Impl),
        Some(PropertyValue::U32(v)) if ImplType::from_raw(*v) == ImplType::Hardware
    );
    let intel = matches!(
        last.get(&PropertyId::VendorId),
        Some(PropertyValue::U32(v)) if *v == VENDOR_ID_INTEL
    );
    let extra = last.len() - usize::from(hardware) - usize::from(intel);
    let only_mode = match extra {
        0 => true,
        1 => last.contains_key(&PropertyId::AccelerationMode),
        _ => false,
    };
    hardware && intel && only_mode
}
