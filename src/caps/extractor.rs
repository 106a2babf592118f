// Copyright 2024-2026 VPL Dispatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Capability extraction from modern runtimes.

use tracing::{debug, info, warn};

use crate::abi::{ApiVersion, CapsFormat, ImplDescription, ImplementedFunctions};
use crate::library::{missing_for_version, LibraryKind, LibraryRecord, ModernApi};

use super::implementation::{Descriptor, ImplementationRecord};

/// Query a modern library for its implementations.
///
/// Queried arrays are stored on `library` so the loader can release them
/// at unload. An implementation whose reported API version requires an
/// entry point the library does not export is dropped on its own.
pub fn extract_modern(
    library_index: usize,
    library: &mut LibraryRecord,
    api: &dyn ModernApi,
) -> Vec<ImplementationRecord> {
    let Some(descriptions) = api.query_impls_description(CapsFormat::ImplDescription) else {
        warn!(path = %library.path.display(), "runtime returned no implementation descriptors");
        return Vec::new();
    };
    let functions = api.query_impls_description(CapsFormat::ImplementedFunctions);
    if functions.is_none() {
        debug!(path = %library.path.display(), "runtime has no implemented-functions list");
    }

    let mut records = Vec::with_capacity(descriptions.len());
    for index in 0..descriptions.len() {
        let Some(hdl) = descriptions.get(index) else {
            continue;
        };
        let desc = hdl as *const ImplDescription;
        // SAFETY: non-null handle from the runtime's descriptor array.
        let version: ApiVersion = unsafe { (*desc).api_version }.into();

        let missing = missing_for_version(version, |name| api.exports(name));
        if !missing.is_empty() {
            warn!(
                path = %library.path.display(),
                index,
                %version,
                missing = ?missing,
                "implementation excluded: required entry points not exported"
            );
            continue;
        }

        let mut record = ImplementationRecord::new(
            library_index,
            index,
            Descriptor::Vendor(desc),
            LibraryKind::Modern,
        );
        if let Some(fhdl) = functions.as_ref().and_then(|f| f.get(index)) {
            // SAFETY: non-null handle from the runtime's function-list array.
            let names = unsafe { (*(fhdl as *const ImplementedFunctions)).names() };
            record = record.with_functions(fhdl, names);
        }

        info!(
            path = %library.path.display(),
            index,
            %version,
            impl_type = %record.impl_type,
            acceleration_mode = record.acceleration_mode.0,
            "discovered implementation"
        );
        records.push(record);
    }

    library.caps.push(descriptions);
    if let Some(functions) = functions {
        library.caps.push(functions);
    }
    records
}
