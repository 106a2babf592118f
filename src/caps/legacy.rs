// Copyright 2024-2026 VPL Dispatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Descriptor synthesis for 1.x runtimes.
//!
//! Legacy runtimes cannot describe themselves, so this opens real probe
//! sessions to find out what they support. The probe has side effects on
//! the device and its result may differ between calls if the hardware
//! state changes.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::abi::{
    mfxIMPL, AccelerationMode, ApiVersion, InitParam, MfxStatus, Platform,
    MFX_IMPL_HARDWARE, MFX_IMPL_HARDWARE2, MFX_IMPL_HARDWARE3, MFX_IMPL_HARDWARE4,
    QUERY_PLATFORM_MIN_VERSION, VENDOR_ID_INTEL,
};
use crate::library::LegacyApi;

use super::builder::{ImplDescriptionBuilder, OwnedImplDescription};

pub const LEGACY_IMPL_NAME: &str = "mfxhw64";
pub const LEGACY_LICENSE: &str = "";
pub const LEGACY_KEYWORDS: &str = "MSDK,legacy";

/// Adapters tried in order; position is the adapter number.
const HARDWARE_ADAPTERS: [mfxIMPL; 4] = [
    MFX_IMPL_HARDWARE,
    MFX_IMPL_HARDWARE2,
    MFX_IMPL_HARDWARE3,
    MFX_IMPL_HARDWARE4,
];

/// Backends tried per adapter, with the acceleration mode each maps to.
#[cfg(windows)]
const BACKENDS: &[(mfxIMPL, AccelerationMode)] = &[
    (crate::abi::MFX_IMPL_VIA_D3D11, AccelerationMode::D3D11),
    (crate::abi::MFX_IMPL_VIA_D3D9, AccelerationMode::D3D9),
];
#[cfg(not(windows))]
const BACKENDS: &[(mfxIMPL, AccelerationMode)] =
    &[(crate::abi::MFX_IMPL_VIA_VAAPI, AccelerationMode::VAAPI)];

const REQUESTED_VERSION: ApiVersion = ApiVersion::new(1, 0);

/// The `VIA` bits selecting `mode`, if this platform has a backend for it.
pub fn backend_for(mode: AccelerationMode) -> Option<mfxIMPL> {
    BACKENDS.iter().find(|(_, m)| *m == mode).map(|(via, _)| *via)
}

/// What worked while probing a legacy runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyProbe {
    /// `MFX_IMPL_HARDWARE*` value that opened a session.
    pub adapter_impl: mfxIMPL,
    /// Zero-based adapter number.
    pub adapter: u32,
    pub acceleration_mode: AccelerationMode,
    pub api_version: ApiVersion,
    pub platform: Option<Platform>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SynthesisError {
    #[error("no hardware adapter accepted a session")]
    NoAdapter,

    #[error("no acceleration mode accepted a session")]
    NoAccelerationMode,

    #[error("probe session query failed: {0}")]
    Query(MfxStatus),
}

fn init_param(implementation: mfxIMPL) -> InitParam {
    InitParam {
        implementation,
        version: REQUESTED_VERSION.into(),
        ..InitParam::default()
    }
}

/// Probe a legacy runtime and build a descriptor for it.
pub fn synthesize(
    api: &dyn LegacyApi,
) -> Result<(LegacyProbe, OwnedImplDescription), SynthesisError> {
    let (adapter, adapter_impl, first_mode, session) = HARDWARE_ADAPTERS
        .iter()
        .enumerate()
        .flat_map(|(adapter, &hw)| {
            BACKENDS
                .iter()
                .map(move |&(via, mode)| (adapter as u32, hw, via, mode))
        })
        .find_map(|(adapter, hw, via, mode)| {
            api.init_ex(init_param(hw | via))
                .map(|session| (adapter, hw, mode, session))
                .map_err(|status| debug!(adapter, via, %status, "legacy probe rejected"))
                .ok()
        })
        .ok_or(SynthesisError::NoAdapter)?;

    let queried = api.query_version(session).map(|version| {
        let version = ApiVersion::from(version);
        let platform = if version >= QUERY_PLATFORM_MIN_VERSION {
            match api.query_platform(session) {
                Some(Ok(platform)) => Some(platform),
                Some(Err(status)) => {
                    debug!(%status, "platform query failed");
                    None
                }
                None => None,
            }
        } else {
            None
        };
        (version, platform)
    });
    let close_status = api.close(session);
    if !close_status.is_ok() {
        warn!(status = %close_status, "closing legacy probe session failed");
    }
    let (api_version, platform) = queried.map_err(SynthesisError::Query)?;

    let modes: Vec<AccelerationMode> = BACKENDS
        .iter()
        .filter(|&&(via, _)| match api.init_ex(init_param(adapter_impl | via)) {
            Ok(s) => {
                let status = api.close(s);
                if !status.is_ok() {
                    warn!(via, %status, "closing legacy mode probe session failed");
                }
                true
            }
            Err(_) => false,
        })
        .map(|&(_, mode)| mode)
        .collect();
    if modes.is_empty() {
        return Err(SynthesisError::NoAccelerationMode);
    }

    let device_id = match platform {
        Some(p) => format!("{:x}/{}", p.device_id, adapter),
        None => format!("0/{adapter}"),
    };

    let mut builder = ImplDescriptionBuilder::hardware(first_mode)
        .api_version(api_version)
        .impl_name(LEGACY_IMPL_NAME)
        .license(LEGACY_LICENSE)
        .keywords(LEGACY_KEYWORDS)
        .vendor_id(VENDOR_ID_INTEL)
        .vendor_impl_id(adapter)
        .device_id(&device_id)
        .media_adapter_type(platform.map(|p| p.media_adapter_type).unwrap_or(0));
    for mode in &modes {
        builder = builder.acceleration_mode_entry(*mode);
    }

    info!(
        adapter,
        %api_version,
        device_id = %device_id,
        modes = modes.len(),
        "synthesized legacy implementation"
    );

    let probe = LegacyProbe {
        adapter_impl,
        adapter,
        acceleration_mode: first_mode,
        api_version,
        platform,
    };
    Ok((probe, builder.build()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::ImplType;
    use crate::library::mock::MockLegacyRuntime;

    #[cfg(not(windows))]
    const VIA: mfxIMPL = crate::abi::MFX_IMPL_VIA_VAAPI;
    #[cfg(windows)]
    const VIA: mfxIMPL = crate::abi::MFX_IMPL_VIA_D3D11;

    #[test]
    fn test_no_adapter_rejects_library() {
        let mock = MockLegacyRuntime::new(ApiVersion::new(1, 35));
        assert_eq!(synthesize(&mock).unwrap_err(), SynthesisError::NoAdapter);
        assert_eq!(mock.counters().open_sessions(), 0);
    }

    #[test]
    fn test_close_failure_does_not_reject_library() {
        let mock = MockLegacyRuntime::new(ApiVersion::new(1, 35))
            .accepting(MFX_IMPL_HARDWARE | VIA)
            .fail_close(MfxStatus::UNKNOWN);
        let (probe, _) = synthesize(&mock).unwrap();
        assert_eq!(probe.adapter_impl, MFX_IMPL_HARDWARE);
        let counters = mock.counters();
        assert!(counters.sessions_created >= 2);
        assert_eq!(counters.open_sessions(), 0);
    }

    #[test]
    fn test_second_adapter_recorded() {
        let mock = MockLegacyRuntime::new(ApiVersion::new(1, 35))
            .accepting(MFX_IMPL_HARDWARE2 | VIA);
        let (probe, owned) = synthesize(&mock).unwrap();
        assert_eq!(probe.adapter, 1);
        assert_eq!(probe.adapter_impl, MFX_IMPL_HARDWARE2);

        let desc = owned.description();
        assert_eq!(desc.vendor_impl_id, 1);
        assert_eq!(desc.device_id(), "0/1");
        assert_eq!(desc.impl_name(), LEGACY_IMPL_NAME);
        assert_eq!(desc.keywords(), LEGACY_KEYWORDS);
        assert_eq!(ImplType::from_raw(desc.impl_type), ImplType::Hardware);
        assert_eq!(mock.counters().open_sessions(), 0);
    }

    #[test]
    fn test_platform_queried_only_from_1_19() {
        let platform = Platform {
            device_id: 0x9a49,
            ..Platform::default()
        };
        let new = MockLegacyRuntime::new(ApiVersion::new(1, 35))
            .accepting(MFX_IMPL_HARDWARE | VIA)
            .with_platform(platform);
        let (probe, owned) = synthesize(&new).unwrap();
        assert_eq!(probe.platform, Some(platform));
        assert_eq!(owned.description().device_id(), "9a49/0");

        let old = MockLegacyRuntime::new(ApiVersion::new(1, 17))
            .accepting(MFX_IMPL_HARDWARE | VIA)
            .with_platform(platform);
        let (probe, owned) = synthesize(&old).unwrap();
        assert_eq!(probe.platform, None);
        assert_eq!(owned.description().device_id(), "0/0");
        assert_eq!(ApiVersion::from(owned.description().api_version), ApiVersion::new(1, 17));
    }
}
