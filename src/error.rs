// Copyright 2024-2026 VPL Dispatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Public error type and its mapping onto `mfxStatus`.

use thiserror::Error;

use crate::abi::MfxStatus;
use crate::filter::PropertyError;

/// Failure of a dispatcher operation.
///
/// Every variant corresponds to exactly one status in the closed C
/// taxonomy; `Runtime` carries a status returned by a vendor library.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("null pointer argument")]
    NullPointer,

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("memory allocation failed")]
    MemoryAlloc,

    #[error("invalid handle")]
    InvalidHandle,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("runtime returned {0}")]
    Runtime(MfxStatus),
}

impl DispatchError {
    pub fn status(&self) -> MfxStatus {
        match self {
            DispatchError::NullPointer => MfxStatus::NULL_PTR,
            DispatchError::Unsupported(_) => MfxStatus::UNSUPPORTED,
            DispatchError::MemoryAlloc => MfxStatus::MEMORY_ALLOC,
            DispatchError::InvalidHandle => MfxStatus::INVALID_HANDLE,
            DispatchError::NotFound(_) => MfxStatus::NOT_FOUND,
            DispatchError::Runtime(status) if status.is_ok() => MfxStatus::UNKNOWN,
            DispatchError::Runtime(status) => *status,
        }
    }
}

impl From<PropertyError> for DispatchError {
    fn from(err: PropertyError) -> Self {
        match err {
            PropertyError::NotFound(path) => DispatchError::NotFound(path),
            PropertyError::TypeMismatch { .. } => DispatchError::Unsupported(err.to_string()),
            PropertyError::NullValue(_) => DispatchError::NullPointer,
        }
    }
}

impl From<MfxStatus> for DispatchError {
    fn from(status: MfxStatus) -> Self {
        match status {
            MfxStatus::NULL_PTR => DispatchError::NullPointer,
            MfxStatus::MEMORY_ALLOC => DispatchError::MemoryAlloc,
            MfxStatus::INVALID_HANDLE => DispatchError::InvalidHandle,
            other => DispatchError::Runtime(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, DispatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(DispatchError::NullPointer.status(), MfxStatus::NULL_PTR);
        assert_eq!(DispatchError::InvalidHandle.status(), MfxStatus::INVALID_HANDLE);
        assert_eq!(
            DispatchError::NotFound("index 3".into()).status(),
            MfxStatus::NOT_FOUND
        );
        assert_eq!(
            DispatchError::Unsupported("x".into()).status(),
            MfxStatus::UNSUPPORTED
        );
        assert_eq!(DispatchError::Runtime(MfxStatus(-17)).status(), MfxStatus(-17));
    }

    #[test]
    fn test_runtime_success_is_never_reported_as_error() {
        assert_eq!(DispatchError::Runtime(MfxStatus::NONE).status(), MfxStatus::UNKNOWN);
    }

    #[test]
    fn test_property_errors_map_to_taxonomy() {
        let e: DispatchError = PropertyError::NotFound("a.b".into()).into();
        assert_eq!(e.status(), MfxStatus::NOT_FOUND);
        let e: DispatchError = PropertyError::NullValue("ExtBuffer".into()).into();
        assert_eq!(e.status(), MfxStatus::NULL_PTR);
    }
}
