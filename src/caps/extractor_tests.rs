// Copyright 2024-2026 VPL Dispatch Contributors
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use crate::abi::{AccelerationMode, ApiVersion, ImplType};
use crate::caps::{extract_modern, ImplDescriptionBuilder};
use crate::library::mock::MockModernRuntime;
use crate::library::{Candidate, LibraryRecord, Runtime};
use std::sync::Arc;

fn record_for(mock: Arc<MockModernRuntime>) -> LibraryRecord {
    LibraryRecord::new(
        Candidate {
            path: PathBuf::from("/opt/vpl/libvpl-mock.so"),
            priority: 1000,
        },
        Runtime::Modern(mock),
    )
}

#[test]
fn test_extracts_every_implementation() {
    let mock = Arc::new(
        MockModernRuntime::new()
            .with_impl(ImplDescriptionBuilder::hardware(AccelerationMode::VAAPI).build())
            .with_impl(ImplDescriptionBuilder::software().build()),
    );
    let mut lib = record_for(mock.clone());
    let records = extract_modern(0, &mut lib, mock.as_ref());

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].impl_type, ImplType::Hardware);
    assert_eq!(records[1].impl_type, ImplType::Software);
    assert_eq!(records[1].index_in_library, 1);
    assert!(records.iter().all(|r| r.function_names().is_none()));
    assert_eq!(lib.caps.len(), 1);
    assert_eq!(mock.outstanding_arrays(), 1);
}

#[test]
fn test_missing_gated_function_excludes_only_that_implementation() {
    let mock = Arc::new(
        MockModernRuntime::new()
            .with_impl(
                ImplDescriptionBuilder::hardware(AccelerationMode::VAAPI)
                    .api_version(ApiVersion::new(2, 9))
                    .build(),
            )
            .with_impl(
                ImplDescriptionBuilder::hardware(AccelerationMode::VAAPI)
                    .api_version(ApiVersion::new(2, 0))
                    .build(),
            )
            .without_export("MFXVideoDECODE_VPP_Init"),
    );
    let mut lib = record_for(mock.clone());
    let records = extract_modern(0, &mut lib, mock.as_ref());

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].api_version, ApiVersion::new(2, 0));
    assert_eq!(records[0].index_in_library, 1);
}

#[test]
fn test_function_lists_attached_by_index() {
    let mock = Arc::new(
        MockModernRuntime::new()
            .with_impl(ImplDescriptionBuilder::hardware(AccelerationMode::VAAPI).build())
            .with_functions(&["MFXInitialize", "MFXClose"]),
    );
    let mut lib = record_for(mock.clone());
    let records = extract_modern(0, &mut lib, mock.as_ref());

    let names = records[0].function_names().unwrap();
    assert_eq!(names, &["MFXInitialize".to_string(), "MFXClose".to_string()]);
    assert!(records[0].functions_handle().is_some());
    assert_eq!(lib.caps.len(), 2);
}

#[test]
fn test_library_without_descriptors_yields_nothing() {
    let mock = Arc::new(MockModernRuntime::new());
    let mut lib = record_for(mock.clone());
    assert!(extract_modern(0, &mut lib, mock.as_ref()).is_empty());
    assert!(lib.caps.is_empty());
}
