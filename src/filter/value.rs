// Copyright 2024-2026 VPL Dispatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Typed filter values.

use std::ffi::{c_char, c_void, CStr};

use crate::abi::{MfxRange32U, MfxVariant, VariantType};

use super::property::{PropertyError, PropertyId, ValueKind};

/// A value stored against a property.
///
/// Strings and ranges are copied out of the caller's memory when set.
/// `Pointer` values are opaque and forwarded untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    U16(u16),
    U32(u32),
    String(String),
    Range(MfxRange32U),
    Pointer(*mut c_void),
}

impl PropertyValue {
    fn describe(&self) -> String {
        match self {
            PropertyValue::U16(_) => "U16".into(),
            PropertyValue::U32(_) => "U32".into(),
            PropertyValue::String(_) => "string".into(),
            PropertyValue::Range(_) => "range".into(),
            PropertyValue::Pointer(_) => "PTR".into(),
        }
    }

    fn kind(&self) -> ValueKind {
        match self {
            PropertyValue::U16(_) => ValueKind::U16,
            PropertyValue::U32(_) => ValueKind::U32,
            PropertyValue::String(_) => ValueKind::String,
            PropertyValue::Range(_) => ValueKind::Range,
            PropertyValue::Pointer(_) => ValueKind::Pointer,
        }
    }

    pub fn as_u16(&self) -> Option<u16> {
        match *self {
            PropertyValue::U16(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match *self {
            PropertyValue::U32(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_range(&self) -> Option<&MfxRange32U> {
        match self {
            PropertyValue::Range(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_pointer(&self) -> Option<*mut c_void> {
        match *self {
            PropertyValue::Pointer(p) => Some(p),
            _ => None,
        }
    }

    /// Check that this value has the shape `id` declares.
    pub fn check(&self, id: PropertyId, path: &str) -> Result<(), PropertyError> {
        if self.kind() != id.kind() {
            return Err(PropertyError::TypeMismatch {
                path: path.to_string(),
                expected: id.kind(),
                found: self.describe(),
            });
        }
        match self {
            PropertyValue::Pointer(p) if p.is_null() => {
                Err(PropertyError::NullValue(path.to_string()))
            }
            _ => Ok(()),
        }
    }

    /// Convert a C variant into the value `id` expects, copying pointed-to
    /// strings and ranges.
    ///
    /// # Safety
    /// When the variant carries a non-null pointer it must point to a
    /// NUL-terminated string, an `mfxRange32U`, or an opaque object,
    /// according to `id`.
    pub unsafe fn from_variant(
        id: PropertyId,
        path: &str,
        variant: &MfxVariant,
    ) -> Result<Self, PropertyError> {
        let mismatch = |found: String| PropertyError::TypeMismatch {
            path: path.to_string(),
            expected: id.kind(),
            found,
        };
        let tag = variant.variant_type();
        let found = || match tag {
            Some(t) => format!("{t:?}"),
            None => format!("tag {}", variant.type_),
        };

        match (id.kind(), tag) {
            (ValueKind::U16, Some(VariantType::U16)) => Ok(PropertyValue::U16(variant.data.u16_)),
            (ValueKind::U32, Some(VariantType::U32)) => Ok(PropertyValue::U32(variant.data.u32_)),
            (ValueKind::String | ValueKind::Range | ValueKind::Pointer, Some(VariantType::Ptr)) => {
                let ptr = variant.data.ptr;
                if ptr.is_null() {
                    return Err(PropertyError::NullValue(path.to_string()));
                }
                Ok(match id.kind() {
                    ValueKind::String => PropertyValue::String(
                        CStr::from_ptr(ptr as *const c_char)
                            .to_string_lossy()
                            .into_owned(),
                    ),
                    ValueKind::Range => PropertyValue::Range(*(ptr as *const MfxRange32U)),
                    _ => PropertyValue::Pointer(ptr),
                })
            }
            _ => Err(mismatch(found())),
        }
    }
}
