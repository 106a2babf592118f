// Copyright 2024-2026 VPL Dispatch Contributors
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

/// Status code (`mfxStatus`) returned by every entry point.
///
/// Negative values are errors, zero is success, positive values are
/// warnings. Kept as a transparent integer so statuses coming back from a
/// vendor runtime pass through unchanged even when this crate does not
/// name them.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MfxStatus(pub i32);

impl MfxStatus {
    pub const NONE: Self = Self(0);
    pub const UNKNOWN: Self = Self(-1);
    pub const NULL_PTR: Self = Self(-2);
    pub const UNSUPPORTED: Self = Self(-3);
    pub const MEMORY_ALLOC: Self = Self(-4);
    pub const INVALID_HANDLE: Self = Self(-6);
    pub const NOT_INITIALIZED: Self = Self(-8);
    pub const NOT_FOUND: Self = Self(-9);

    /// Success or warning.
    pub fn is_ok(self) -> bool {
        self.0 >= 0
    }

    /// Turn a runtime status into a `Result`, keeping warnings as success.
    pub fn into_result(self) -> Result<(), MfxStatus> {
        if self.is_ok() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for MfxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match *self {
            Self::NONE => "MFX_ERR_NONE",
            Self::UNKNOWN => "MFX_ERR_UNKNOWN",
            Self::NULL_PTR => "MFX_ERR_NULL_PTR",
            Self::UNSUPPORTED => "MFX_ERR_UNSUPPORTED",
            Self::MEMORY_ALLOC => "MFX_ERR_MEMORY_ALLOC",
            Self::INVALID_HANDLE => "MFX_ERR_INVALID_HANDLE",
            Self::NOT_INITIALIZED => "MFX_ERR_NOT_INITIALIZED",
            Self::NOT_FOUND => "MFX_ERR_NOT_FOUND",
            _ => return write!(f, "mfxStatus({})", self.0),
        };
        f.write_str(name)
    }
}
