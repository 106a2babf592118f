// Copyright 2024-2026 VPL Dispatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Runtime library discovery and classification.
//!
//! [`scan`] lists candidate files, [`validate`] opens them through a
//! [`LibraryOpener`] and keeps those that export a complete modern or
//! legacy entry-point table.

mod dynamic;
pub mod mock;
mod runtime;
mod scanner;
mod symbols;
mod validator;

pub use dynamic::{DynamicLegacyRuntime, DynamicModernRuntime};
pub use runtime::{CapsArray, LegacyApi, LibraryKind, ModernApi, Runtime, SessionApi};
pub use scanner::{
    is_candidate_name, scan, scan_well_known, Candidate, PRIORITY_CURRENT_DIR, PRIORITY_LEGACY,
    PRIORITY_RUNTIME_PATH, PRIORITY_SYSTEM_LIBRARY_PATH, PRIORITY_USER_SEARCH_PATH,
    WELL_KNOWN_RUNTIMES,
};
pub use symbols::{
    missing_for_version, LEGACY_FUNCTIONS, MODERN_DISCRIMINATOR, MODERN_FUNCTIONS,
};
pub use validator::{
    validate, validate_one, DynamicOpener, LibraryOpener, LibraryRecord, LoadError,
};
