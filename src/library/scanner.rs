// Copyright 2024-2026 VPL Dispatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Candidate library discovery across prioritized search locations.
//!
//! Scanning never fails: unreadable or missing directories are skipped.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::DispatchConfig;

pub const PRIORITY_USER_SEARCH_PATH: u32 = 1000;
pub const PRIORITY_RUNTIME_PATH: u32 = 2000;
pub const PRIORITY_SYSTEM_LIBRARY_PATH: u32 = 3000;
pub const PRIORITY_CURRENT_DIR: u32 = 4000;
pub const PRIORITY_LEGACY: u32 = 5000;

const VENDOR_PREFIXES: &[&str] = &["libvpl", "libmfx"];

/// Vendor runtimes probed directly on the low-latency path.
#[cfg(not(windows))]
pub const WELL_KNOWN_RUNTIMES: &[&str] = &["libmfx-gen.so.1.2", "libmfxhw64.so.1"];
#[cfg(windows)]
pub const WELL_KNOWN_RUNTIMES: &[&str] = &["libmfx64-gen.dll", "libmfxhw64.dll"];

/// A file that may be a runtime library. Lower priority is searched first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: PathBuf,
    pub priority: u32,
}

#[cfg(not(windows))]
fn is_dispatcher_name(name: &str) -> bool {
    name.starts_with("libvpl.so") || name.starts_with("libvpl_dispatch")
}

#[cfg(windows)]
fn is_dispatcher_name(name: &str) -> bool {
    matches!(name, "libvpl.dll" | "libvpld.dll" | "vpl_dispatch.dll")
}

/// Whether a file name looks like a vendor runtime.
pub fn is_candidate_name(name: &str) -> bool {
    #[cfg(windows)]
    let name = name.to_ascii_lowercase();
    #[cfg(windows)]
    let name = name.as_str();

    if !VENDOR_PREFIXES.iter().any(|p| name.starts_with(p)) || is_dispatcher_name(name) {
        return false;
    }
    if cfg!(windows) {
        name.ends_with(".dll")
    } else {
        name.contains(".so")
    }
}

/// Tracks resolved paths so each library is reported once.
struct CandidateList {
    seen: HashSet<PathBuf>,
    out: Vec<Candidate>,
}

impl CandidateList {
    fn new() -> Self {
        Self {
            seen: HashSet::new(),
            out: Vec::new(),
        }
    }

    fn push(&mut self, path: PathBuf, priority: u32) {
        let resolved = std::fs::canonicalize(&path).unwrap_or(path);
        if self.seen.insert(resolved.clone()) {
            self.out.push(Candidate {
                path: resolved,
                priority,
            });
        }
    }

    fn scan_dir(&mut self, dir: &Path, priority: u32) {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(dir = %dir.display(), error = %e, "skipping search directory");
                return;
            }
        };

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .map(is_candidate_name)
                    .unwrap_or(false)
            })
            .filter(|path| path.is_file())
            .collect();
        files.sort();

        debug!(dir = %dir.display(), found = files.len(), "scanned search directory");
        for path in files {
            self.push(path, priority);
        }
    }
}

/// List candidate libraries in search order.
pub fn scan(config: &DispatchConfig) -> Vec<Candidate> {
    let mut list = CandidateList::new();

    let tiers = [
        (PRIORITY_USER_SEARCH_PATH, &config.user_search_path),
        (PRIORITY_RUNTIME_PATH, &config.runtime_path),
        (PRIORITY_SYSTEM_LIBRARY_PATH, &config.system_library_path),
    ];
    for (base, dirs) in tiers {
        for (i, dir) in dirs.iter().enumerate() {
            list.scan_dir(dir, base + i as u32);
        }
    }

    if config.search_current_dir {
        if let Ok(cwd) = std::env::current_dir() {
            list.scan_dir(&cwd, PRIORITY_CURRENT_DIR);
        }
    }

    for (i, dir) in config.legacy_dirs.iter().enumerate() {
        list.scan_dir(dir, PRIORITY_LEGACY + i as u32);
    }

    list.out
}

/// List only the well-known vendor runtimes present in the legacy locations.
pub fn scan_well_known(config: &DispatchConfig) -> Vec<Candidate> {
    let mut list = CandidateList::new();
    for (i, dir) in config.legacy_dirs.iter().enumerate() {
        for name in WELL_KNOWN_RUNTIMES {
            let path = dir.join(name);
            if path.is_file() {
                list.push(path, PRIORITY_LEGACY + i as u32);
            }
        }
    }
    list.out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        File::create(&path).unwrap();
        path.canonicalize().unwrap()
    }

    #[cfg(not(windows))]
    #[test]
    fn test_candidate_names() {
        assert!(is_candidate_name("libmfx-gen.so.1.2"));
        assert!(is_candidate_name("libvpl-runtime.so"));
        assert!(is_candidate_name("libmfxhw64.so.1"));
        assert!(!is_candidate_name("libvpl.so.2"));
        assert!(!is_candidate_name("libvpl_dispatch.so"));
        assert!(!is_candidate_name("libva.so.2"));
        assert!(!is_candidate_name("libmfx.a"));
    }

    #[cfg(not(windows))]
    #[test]
    fn test_scan_orders_by_tier_and_skips_missing_dirs() {
        let user = tempfile::tempdir().unwrap();
        let runtime = tempfile::tempdir().unwrap();
        let a = touch(runtime.path(), "libmfx-a.so");
        let b = touch(user.path(), "libvpl-b.so.1");
        touch(user.path(), "libunrelated.so");

        let config = DispatchConfig {
            user_search_path: vec![user.path().to_path_buf(), PathBuf::from("/no/such/dir")],
            runtime_path: vec![runtime.path().to_path_buf()],
            ..DispatchConfig::with_search_path(Vec::<PathBuf>::new())
        };
        let found = scan(&config);
        assert_eq!(
            found,
            vec![
                Candidate { path: b, priority: PRIORITY_USER_SEARCH_PATH },
                Candidate { path: a, priority: PRIORITY_RUNTIME_PATH },
            ]
        );
    }

    #[cfg(not(windows))]
    #[test]
    fn test_scan_dedupes_first_seen_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = touch(dir.path(), "libmfx-dup.so");

        let config = DispatchConfig {
            user_search_path: vec![dir.path().to_path_buf()],
            legacy_dirs: vec![dir.path().to_path_buf()],
            ..DispatchConfig::with_search_path(Vec::<PathBuf>::new())
        };
        let found = scan(&config);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path, path);
        assert_eq!(found[0].priority, PRIORITY_USER_SEARCH_PATH);
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_dedupes_symlinks() {
        let dir = tempfile::tempdir().unwrap();
        let real = touch(dir.path(), "libmfx-gen.so.1.2.9");
        std::os::unix::fs::symlink(&real, dir.path().join("libmfx-gen.so.1.2")).unwrap();

        let found = scan(&DispatchConfig::with_search_path([dir.path()]));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path, real);
    }

    #[cfg(not(windows))]
    #[test]
    fn test_scan_well_known_ignores_other_runtimes() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "libmfx-other.so");
        let gen = touch(dir.path(), "libmfx-gen.so.1.2");

        let config = DispatchConfig {
            legacy_dirs: vec![dir.path().to_path_buf()],
            ..DispatchConfig::with_search_path(Vec::<PathBuf>::new())
        };
        let found = scan_well_known(&config);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path, gen);
    }
}
