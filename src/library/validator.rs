// Copyright 2024-2026 VPL Dispatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Opening candidates and classifying them by exported entry points.
//!
//! A candidate that fails to open or lacks its required table is dropped
//! here and never reaches capability extraction.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use super::dynamic::{is_modern, open_library, DynamicLegacyRuntime, DynamicModernRuntime};
use super::runtime::{CapsArray, LibraryKind, Runtime};
use super::scanner::Candidate;
use crate::abi::CapsFormat;
use crate::caps::LegacyProbe;

/// Reasons a candidate is not a usable runtime. Logged, never returned to
/// applications.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path}: {reason}")]
    Open { path: PathBuf, reason: String },

    #[error("{path} does not export {symbol}")]
    MissingSymbol { path: PathBuf, symbol: &'static str },

    #[error("{0} is not a runtime library")]
    NotARuntime(PathBuf),
}

/// Turns a candidate path into a classified runtime.
pub trait LibraryOpener: Send + Sync {
    fn open(&self, path: &Path) -> Result<Runtime, LoadError>;
}

/// Opens real shared libraries.
#[derive(Debug, Default, Clone, Copy)]
pub struct DynamicOpener;

impl LibraryOpener for DynamicOpener {
    fn open(&self, path: &Path) -> Result<Runtime, LoadError> {
        let lib = open_library(path)?;
        if is_modern(&lib) {
            let runtime = DynamicModernRuntime::from_library(lib, path)?;
            Ok(Runtime::Modern(Arc::new(runtime)))
        } else {
            let runtime = DynamicLegacyRuntime::from_library(lib, path)?;
            Ok(Runtime::Legacy(Arc::new(runtime)))
        }
    }
}

/// A validated runtime library owned by a loader.
#[derive(Debug)]
pub struct LibraryRecord {
    pub path: PathBuf,
    pub priority: u32,
    pub runtime: Runtime,
    /// Adapter/backend that answered during legacy synthesis.
    pub probe: Option<LegacyProbe>,
    /// Capability arrays queried from the runtime, released at unload.
    pub caps: Vec<CapsArray>,
}

impl LibraryRecord {
    pub fn new(candidate: Candidate, runtime: Runtime) -> Self {
        Self {
            path: candidate.path,
            priority: candidate.priority,
            runtime,
            probe: None,
            caps: Vec::new(),
        }
    }

    pub fn kind(&self) -> LibraryKind {
        self.runtime.kind()
    }

    pub fn caps_for(&self, format: CapsFormat) -> Option<&CapsArray> {
        self.caps.iter().find(|a| a.format() == format)
    }
}

/// Open one candidate; `None` if it is not a usable runtime.
pub fn validate_one(candidate: Candidate, opener: &dyn LibraryOpener) -> Option<LibraryRecord> {
    match opener.open(&candidate.path) {
        Ok(runtime) => {
            info!(
                path = %candidate.path.display(),
                priority = candidate.priority,
                kind = ?runtime.kind(),
                "accepted runtime library"
            );
            Some(LibraryRecord::new(candidate, runtime))
        }
        Err(e) => {
            debug!(error = %e, "rejected candidate");
            None
        }
    }
}

/// Open every candidate, keeping the ones that classify.
pub fn validate(candidates: Vec<Candidate>, opener: &dyn LibraryOpener) -> Vec<LibraryRecord> {
    candidates
        .into_iter()
        .filter_map(|c| validate_one(c, opener))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::mock::{MockLegacyRuntime, MockModernRuntime, MockOpener};
    use crate::abi::ApiVersion;

    fn candidate(name: &str, priority: u32) -> Candidate {
        Candidate {
            path: PathBuf::from("/opt/vpl").join(name),
            priority,
        }
    }

    #[test]
    fn test_unknown_candidates_dropped() {
        let opener = MockOpener::new()
            .with_modern("libvpl-a.so", MockModernRuntime::new())
            .with_legacy("libmfxhw64.so.1", MockLegacyRuntime::new(ApiVersion::new(1, 35)));

        let libs = validate(
            vec![
                candidate("libvpl-a.so", 1000),
                candidate("libmfx-broken.so", 1001),
                candidate("libmfxhw64.so.1", 5000),
            ],
            &opener,
        );
        let kinds: Vec<_> = libs.iter().map(|l| l.kind()).collect();
        assert_eq!(kinds, vec![LibraryKind::Modern, LibraryKind::Legacy]);
        assert_eq!(libs[1].priority, 5000);
    }

    #[test]
    fn test_dynamic_opener_missing_file() {
        let err = DynamicOpener.open(Path::new("/no/such/libmfx-none.so"));
        assert!(matches!(err, Err(LoadError::Open { .. })));
    }
}
