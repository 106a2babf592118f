// Copyright 2024-2026 VPL Dispatch Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::abi::{mfxHDL, AccelerationMode, ApiVersion, ImplDescription, ImplType};
use crate::library::LibraryKind;
use crate::rank::{Rank, RankKey};

use super::builder::OwnedImplDescription;

/// Where an implementation's descriptor lives.
#[derive(Debug)]
pub(crate) enum Descriptor {
    /// Inside a capability array owned by the runtime library.
    Vendor(*const ImplDescription),
    /// Built by the dispatcher for a legacy runtime.
    Synthesized(OwnedImplDescription),
}

/// One selectable implementation exposed by a library.
#[derive(Debug)]
pub struct ImplementationRecord {
    /// Index of the owning library in the loader.
    pub library: usize,
    pub index_in_library: usize,
    descriptor: Descriptor,
    functions: Option<mfxHDL>,
    function_names: Option<Vec<String>>,
    pub api_version: ApiVersion,
    pub impl_type: ImplType,
    pub acceleration_mode: AccelerationMode,
    pub vendor_impl_id: u32,
    pub kind: LibraryKind,
    /// False when the implementation can never be selected, whatever the
    /// filters say.
    pub eligible: bool,
    pub rank: Rank,
}

impl ImplementationRecord {
    /// Snapshot the fields ranking and session creation need.
    pub(crate) fn new(
        library: usize,
        index_in_library: usize,
        descriptor: Descriptor,
        kind: LibraryKind,
    ) -> Self {
        let desc = descriptor_ref(&descriptor);
        Self {
            library,
            index_in_library,
            api_version: desc.api_version.into(),
            impl_type: ImplType::from_raw(desc.impl_type),
            acceleration_mode: AccelerationMode(desc.acceleration_mode),
            vendor_impl_id: desc.vendor_impl_id,
            descriptor,
            functions: None,
            function_names: None,
            kind,
            eligible: true,
            rank: Rank::Excluded,
        }
    }

    pub(crate) fn with_functions(mut self, handle: mfxHDL, names: Vec<String>) -> Self {
        self.functions = Some(handle);
        self.function_names = Some(names);
        self
    }

    pub fn description(&self) -> &ImplDescription {
        descriptor_ref(&self.descriptor)
    }

    pub fn description_handle(&self) -> mfxHDL {
        match &self.descriptor {
            Descriptor::Vendor(ptr) => *ptr as mfxHDL,
            Descriptor::Synthesized(owned) => owned.as_handle(),
        }
    }

    pub fn functions_handle(&self) -> Option<mfxHDL> {
        self.functions
    }

    pub fn function_names(&self) -> Option<&[String]> {
        self.function_names.as_deref()
    }

    pub fn rank_key(&self) -> RankKey {
        RankKey {
            api_version: self.api_version,
            impl_type: self.impl_type,
            acceleration_mode: self.acceleration_mode,
        }
    }

    /// Whether `hdl` is one of the handles this implementation gives out.
    pub fn owns_handle(&self, hdl: mfxHDL) -> bool {
        self.description_handle() == hdl || self.functions == Some(hdl)
    }
}

fn descriptor_ref(descriptor: &Descriptor) -> &ImplDescription {
    match descriptor {
        // SAFETY: vendor descriptors come from capability arrays that the
        // loader keeps unreleased until after every record is dropped.
        Descriptor::Vendor(ptr) => unsafe { &**ptr },
        Descriptor::Synthesized(owned) => owned.description(),
    }
}
