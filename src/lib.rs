// Copyright 2024-2026 VPL Dispatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! VPL Dispatch
//!
//! Finds the media-processing runtimes installed on a machine, reports what
//! each one can do, filters them against application constraints, ranks the
//! survivors and opens a session on the one the application picks.
//!
//! # Pipeline
//!
//! - **Scan**: candidate files from the search tiers in [`DispatchConfig`]
//! - **Validate**: open each file, keep it if it exports a full modern or
//!   legacy entry-point table
//! - **Extract**: query modern libraries for descriptors, synthesize them for
//!   legacy ones by probing trial sessions
//! - **Filter and rank**: evaluate config objects, order by API version,
//!   accelerator and implementation type
//! - **Bind**: initialize a session on the selected implementation
//!
//! Discovery is lazy. A [`Loader`] does nothing until the first enumeration
//! or session request, then re-ranks on every filter change.
//!
//! # Boundaries
//!
//! - Libraries are only opened from the configured search roots
//! - Descriptor memory stays owned by the vendor library or the loader;
//!   handles given out are tracked until released or unloaded
//! - Sessions keep their library mapped, so they may outlive the loader

pub mod abi;
pub mod caps;
pub mod config;
pub mod error;
pub mod filter;
pub mod library;
pub mod loader;
pub mod rank;
pub mod telemetry;

#[cfg(feature = "ffi")]
pub mod ffi;

pub use caps::{ImplDescriptionBuilder, ImplementationRecord};
pub use config::{ConfigError, DispatchConfig, ReleasePolicy};
pub use error::{DispatchError, Result};
pub use filter::{ConfigObject, PropertyId, PropertyValue};
pub use library::{LibraryKind, LibraryOpener, Runtime};
pub use loader::{ConfigId, Loader, LoaderState, Session};
pub use rank::Rank;
