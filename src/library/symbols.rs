// Copyright 2024-2026 VPL Dispatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Entry-point tables resolved from runtime libraries.

use crate::abi::ApiVersion;

/// Presence of this export classifies a library as modern.
pub const MODERN_DISCRIMINATOR: &str = "MFXInitialize";

/// Modern entry points with the API version that introduced them.
///
/// An implementation reporting version `v` must export every entry whose
/// version is `<= v`.
pub const MODERN_FUNCTIONS: &[(&str, ApiVersion)] = &[
    ("MFXClose", ApiVersion::new(1, 0)),
    ("MFXQueryIMPL", ApiVersion::new(1, 0)),
    ("MFXQueryVersion", ApiVersion::new(1, 0)),
    ("MFXVideoCORE_SetHandle", ApiVersion::new(1, 0)),
    ("MFXJoinSession", ApiVersion::new(1, 1)),
    ("MFXDisjoinSession", ApiVersion::new(1, 1)),
    ("MFXCloneSession", ApiVersion::new(1, 1)),
    ("MFXInitialize", ApiVersion::new(2, 0)),
    ("MFXQueryImplsDescription", ApiVersion::new(2, 0)),
    ("MFXReleaseImplDescription", ApiVersion::new(2, 0)),
    ("MFXMemory_GetSurfaceForVPP", ApiVersion::new(2, 0)),
    ("MFXMemory_GetSurfaceForEncode", ApiVersion::new(2, 0)),
    ("MFXMemory_GetSurfaceForDecode", ApiVersion::new(2, 0)),
    ("MFXMemory_GetSurfaceForVPPOut", ApiVersion::new(2, 1)),
    ("MFXVideoDECODE_VPP_Init", ApiVersion::new(2, 1)),
    ("MFXVideoDECODE_VPP_DecodeFrameAsync", ApiVersion::new(2, 1)),
    ("MFXVideoDECODE_VPP_Reset", ApiVersion::new(2, 1)),
    ("MFXVideoDECODE_VPP_GetChannelParam", ApiVersion::new(2, 1)),
    ("MFXVideoDECODE_VPP_Close", ApiVersion::new(2, 1)),
    ("MFXVideoVPP_ProcessFrameAsync", ApiVersion::new(2, 1)),
];

/// Required legacy entry points, resolved in this order.
pub const LEGACY_FUNCTIONS: &[&str] = &[
    "MFXInitEx",
    "MFXClose",
    "MFXQueryVersion",
    "MFXQueryIMPL",
    "MFXVideoCORE_SetHandle",
];

pub const LEGACY_QUERY_PLATFORM: &str = "MFXVideoCORE_QueryPlatform";
pub const CLONE_SESSION: &str = "MFXCloneSession";

/// Names of modern entry points required at `version` that `exports`
/// reports missing.
pub fn missing_for_version<F>(version: ApiVersion, exports: F) -> Vec<&'static str>
where
    F: Fn(&str) -> bool,
{
    MODERN_FUNCTIONS
        .iter()
        .filter(|(name, since)| *since <= version && !exports(name))
        .map(|(name, _)| *name)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discriminator_is_gated_at_2_0() {
        let entry = MODERN_FUNCTIONS
            .iter()
            .find(|(n, _)| *n == MODERN_DISCRIMINATOR)
            .unwrap();
        assert_eq!(entry.1, ApiVersion::new(2, 0));
    }

    #[test]
    fn test_missing_ignores_newer_functions() {
        let missing = missing_for_version(ApiVersion::new(2, 0), |n| {
            !n.starts_with("MFXVideoDECODE_VPP")
        });
        assert!(missing.is_empty());

        let missing = missing_for_version(ApiVersion::new(2, 1), |n| n != "MFXVideoDECODE_VPP_Init");
        assert_eq!(missing, vec!["MFXVideoDECODE_VPP_Init"]);
    }
}
