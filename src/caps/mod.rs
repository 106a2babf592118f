// Copyright 2024-2026 VPL Dispatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Capability extraction: turning opened libraries into implementations.

mod builder;
mod extractor;
mod implementation;
mod legacy;

pub use builder::{
    DecoderCodecSpec, EncoderCodecSpec, ImplDescriptionBuilder, MemDescSpec,
    OwnedImplDescription, OwnedImplementedFunctions, ProfileSpec, VppFilterSpec, VppFormatSpec,
    VppMemDescSpec,
};
pub use extractor::extract_modern;
pub(crate) use implementation::Descriptor;
pub use implementation::ImplementationRecord;
pub use legacy::{
    backend_for, synthesize, LegacyProbe, SynthesisError, LEGACY_IMPL_NAME, LEGACY_KEYWORDS,
    LEGACY_LICENSE,
};

#[cfg(test)]
#[path = "extractor_tests.rs"]
mod extractor_tests;
