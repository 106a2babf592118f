// Copyright 2024-2026 VPL Dispatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Search configuration for runtime discovery.
//!
//! The C surface builds its configuration from the environment only. Rust
//! hosts may instead pin everything explicitly, or load it from TOML.
//!
//! # Environment Variables
//!
//! | Variable | Tier | Description |
//! |---|---|---|
//! | `ONEVPL_SEARCH_PATH` | 1 | User-supplied runtime directories |
//! | `ONEVPL_RUNTIME_PATH` | 2 | Packaged runtime directories |
//! | `LD_LIBRARY_PATH` (Linux) / `PATH` (Windows) | 3 | OS library path |
//!
//! Lists use the platform path separator (`:` on Linux, `;` on Windows).
//! Empty entries are dropped. Nothing else is read from the environment.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ENV_USER_SEARCH_PATH: &str = "ONEVPL_SEARCH_PATH";
pub const ENV_RUNTIME_PATH: &str = "ONEVPL_RUNTIME_PATH";

#[cfg(windows)]
pub const ENV_SYSTEM_LIBRARY_PATH: &str = "PATH";
#[cfg(not(windows))]
pub const ENV_SYSTEM_LIBRARY_PATH: &str = "LD_LIBRARY_PATH";

/// When descriptor handles handed to the application are given back to the
/// owning runtime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleasePolicy {
    /// Keep every handle alive until the loader is unloaded.
    #[default]
    RetainUntilUnload,
    /// Free handles the loader does not depend on as soon as they are released.
    Immediate,
}

/// Where to look for runtimes and how to manage descriptor lifetimes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    pub user_search_path: Vec<PathBuf>,
    pub runtime_path: Vec<PathBuf>,
    pub system_library_path: Vec<PathBuf>,
    pub search_current_dir: bool,
    pub legacy_dirs: Vec<PathBuf>,
    pub release_policy: ReleasePolicy,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            user_search_path: Vec::new(),
            runtime_path: Vec::new(),
            system_library_path: Vec::new(),
            search_current_dir: true,
            legacy_dirs: default_legacy_dirs(),
            release_policy: ReleasePolicy::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Split a path-list env var, dropping empty entries.
fn parse_path_list(key: &str) -> Vec<PathBuf> {
    match std::env::var_os(key) {
        Some(val) => split_path_list(&val),
        None => Vec::new(),
    }
}

fn split_path_list(val: &OsString) -> Vec<PathBuf> {
    std::env::split_paths(val)
        .filter(|p| !p.as_os_str().is_empty())
        .collect()
}

impl DispatchConfig {
    /// Configuration used by `MFXLoad`.
    pub fn from_env() -> Self {
        Self {
            user_search_path: parse_path_list(ENV_USER_SEARCH_PATH),
            runtime_path: parse_path_list(ENV_RUNTIME_PATH),
            system_library_path: parse_path_list(ENV_SYSTEM_LIBRARY_PATH),
            ..Self::default()
        }
    }

    /// Search only `dirs`: no environment, current directory or legacy
    /// locations.
    pub fn with_search_path<I, P>(dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            user_search_path: dirs.into_iter().map(Into::into).collect(),
            runtime_path: Vec::new(),
            system_library_path: Vec::new(),
            search_current_dir: false,
            legacy_dirs: Vec::new(),
            release_policy: ReleasePolicy::default(),
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}

/// Fixed vendor install locations searched last.
#[cfg(not(windows))]
pub fn default_legacy_dirs() -> Vec<PathBuf> {
    [
        "/usr/lib/x86_64-linux-gnu",
        "/lib64",
        "/usr/lib64",
        "/lib",
        "/usr/lib",
        "/opt/intel/mediasdk/lib64",
        "/opt/intel/mediasdk/lib",
    ]
    .iter()
    .map(PathBuf::from)
    .collect()
}

/// Fixed vendor install locations searched last.
#[cfg(windows)]
pub fn default_legacy_dirs() -> Vec<PathBuf> {
    use std::os::windows::ffi::OsStringExt;
    use windows_sys::Win32::System::SystemInformation::GetSystemDirectoryW;

    let mut buf = [0u16; 260];
    // SAFETY: the buffer length passed matches the buffer.
    let len = unsafe { GetSystemDirectoryW(buf.as_mut_ptr(), buf.len() as u32) } as usize;
    if len == 0 || len > buf.len() {
        return Vec::new();
    }
    vec![PathBuf::from(OsString::from_wide(&buf[..len]))]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Serialize env-mutating tests to avoid cross-test pollution.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const ENV_KEYS: &[&str] = &[ENV_USER_SEARCH_PATH, ENV_RUNTIME_PATH, ENV_SYSTEM_LIBRARY_PATH];

    struct SavedEnv(Vec<(&'static str, Option<OsString>)>);

    impl SavedEnv {
        fn take() -> Self {
            let saved = ENV_KEYS
                .iter()
                .map(|&k| {
                    let old = std::env::var_os(k);
                    std::env::remove_var(k);
                    (k, old)
                })
                .collect();
            SavedEnv(saved)
        }
    }

    impl Drop for SavedEnv {
        fn drop(&mut self) {
            for (k, v) in &self.0 {
                match v {
                    Some(v) => std::env::set_var(k, v),
                    None => std::env::remove_var(k),
                }
            }
        }
    }

    #[test]
    fn test_defaults_are_sensible() {
        let cfg = DispatchConfig::default();
        assert!(cfg.user_search_path.is_empty());
        assert!(cfg.search_current_dir);
        assert_eq!(cfg.release_policy, ReleasePolicy::RetainUntilUnload);
        #[cfg(not(windows))]
        assert_eq!(cfg.legacy_dirs.len(), 7);
    }

    #[test]
    fn test_env_tiers_are_split() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _saved = SavedEnv::take();
        let joined = std::env::join_paths(["/opt/a", "/opt/b"]).unwrap();
        std::env::set_var(ENV_USER_SEARCH_PATH, &joined);
        std::env::set_var(ENV_RUNTIME_PATH, "/opt/runtime");

        let cfg = DispatchConfig::from_env();
        assert_eq!(
            cfg.user_search_path,
            vec![PathBuf::from("/opt/a"), PathBuf::from("/opt/b")]
        );
        assert_eq!(cfg.runtime_path, vec![PathBuf::from("/opt/runtime")]);
        assert!(cfg.system_library_path.is_empty());
    }

    #[test]
    fn test_empty_entries_dropped() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _saved = SavedEnv::take();
        #[cfg(not(windows))]
        std::env::set_var(ENV_SYSTEM_LIBRARY_PATH, "::/usr/local/lib:");
        #[cfg(windows)]
        std::env::set_var(ENV_SYSTEM_LIBRARY_PATH, ";;C:\\libs;");

        let cfg = DispatchConfig::from_env();
        assert_eq!(cfg.system_library_path.len(), 1);
    }

    #[test]
    fn test_with_search_path_isolates_discovery() {
        let cfg = DispatchConfig::with_search_path(["/tmp/x"]);
        assert!(!cfg.search_current_dir);
        assert!(cfg.legacy_dirs.is_empty());
        assert_eq!(cfg.user_search_path, vec![PathBuf::from("/tmp/x")]);
    }

    #[test]
    fn test_toml_missing_keys_take_defaults() {
        let cfg = DispatchConfig::from_toml_str(
            r#"
            user_search_path = ["/opt/vendor"]
            release_policy = "immediate"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.user_search_path, vec![PathBuf::from("/opt/vendor")]);
        assert_eq!(cfg.release_policy, ReleasePolicy::Immediate);
        assert!(cfg.search_current_dir);
    }

    #[test]
    fn test_toml_rejects_bad_policy() {
        let err = DispatchConfig::from_toml_str(r#"release_policy = "sometimes""#);
        assert!(matches!(err, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_toml_file_missing_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = DispatchConfig::from_toml_file(&dir.path().join("absent.toml"));
        assert!(matches!(err, Err(ConfigError::Io { .. })));
    }
}
