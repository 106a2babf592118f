// Copyright 2024-2026 VPL Dispatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Bookkeeping for descriptor handles given to the application.
//!
//! Handles are keyed by address: the C surface must hand out the real
//! structure pointers, so the address is the only identity the
//! application gives back.

use std::collections::HashMap;
use std::ffi::CString;
use std::path::Path;

use tracing::debug;

use crate::abi::mfxHDL;
use crate::config::ReleasePolicy;
use crate::error::{DispatchError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleState {
    Outstanding,
    Released,
}

#[derive(Debug)]
pub struct DescriptorArena {
    policy: ReleasePolicy,
    handles: HashMap<usize, HandleState>,
    /// Implementation paths allocated by the loader, keyed by implementation.
    paths: HashMap<usize, CString>,
}

impl DescriptorArena {
    pub fn new(policy: ReleasePolicy) -> Self {
        Self {
            policy,
            handles: HashMap::new(),
            paths: HashMap::new(),
        }
    }

    /// Record a handle owned by a runtime (or by the loader's records).
    pub fn hand_out(&mut self, hdl: mfxHDL) -> mfxHDL {
        self.handles.insert(hdl as usize, HandleState::Outstanding);
        hdl
    }

    /// NUL-terminated copy of `path` for implementation `implementation`.
    /// Reused until it is freed.
    pub fn path_handle(&mut self, implementation: usize, path: &Path) -> Result<mfxHDL> {
        if !self.paths.contains_key(&implementation) {
            let text = CString::new(path.to_string_lossy().into_owned()).map_err(|_| {
                DispatchError::Unsupported(format!("path {} contains NUL", path.display()))
            })?;
            self.paths.insert(implementation, text);
        }
        let hdl = self
            .paths
            .get(&implementation)
            .map(|s| s.as_ptr() as mfxHDL)
            .ok_or(DispatchError::MemoryAlloc)?;
        Ok(self.hand_out(hdl))
    }

    pub fn state(&self, hdl: mfxHDL) -> Option<HandleState> {
        self.handles.get(&(hdl as usize)).copied()
    }

    /// Mark `hdl` released. Returns false for handles never handed out.
    ///
    /// Releasing twice is not an error. Under [`ReleasePolicy::Immediate`]
    /// a path string is freed here; everything else stays until unload.
    pub fn release(&mut self, hdl: mfxHDL) -> bool {
        let key = hdl as usize;
        let Some(state) = self.handles.get_mut(&key) else {
            return false;
        };
        *state = HandleState::Released;

        if self.policy == ReleasePolicy::Immediate {
            let path_owner = self
                .paths
                .iter()
                .find(|(_, s)| s.as_ptr() as usize == key)
                .map(|(owner, _)| *owner);
            if let Some(owner) = path_owner {
                self.paths.remove(&owner);
                debug!(implementation = owner, "freed implementation path");
            }
        }
        true
    }

    pub fn outstanding(&self) -> usize {
        self.handles
            .values()
            .filter(|s| **s == HandleState::Outstanding)
            .count()
    }

    /// Forget every handle and free every path string.
    pub fn drain(&mut self) {
        let outstanding = self.outstanding();
        if outstanding > 0 {
            debug!(outstanding, "dropping descriptor handles never released");
        }
        self.handles.clear();
        self.paths.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;

    #[test]
    fn test_release_is_idempotent() {
        let mut arena = DescriptorArena::new(ReleasePolicy::RetainUntilUnload);
        let mut x = 0u8;
        let hdl = arena.hand_out(&mut x as *mut u8 as mfxHDL);
        assert!(arena.release(hdl));
        assert!(arena.release(hdl));
        assert_eq!(arena.state(hdl), Some(HandleState::Released));
        assert_eq!(arena.outstanding(), 0);
    }

    #[test]
    fn test_unknown_handle_not_released() {
        let mut arena = DescriptorArena::new(ReleasePolicy::RetainUntilUnload);
        let mut x = 0u8;
        assert!(!arena.release(&mut x as *mut u8 as mfxHDL));
    }

    #[test]
    fn test_path_reused_until_freed() {
        let mut arena = DescriptorArena::new(ReleasePolicy::Immediate);
        let a = arena.path_handle(0, Path::new("/opt/vpl/libvpl-a.so")).unwrap();
        let b = arena.path_handle(0, Path::new("/opt/vpl/libvpl-a.so")).unwrap();
        assert_eq!(a, b);
        let text = unsafe { CStr::from_ptr(a as *const std::ffi::c_char) };
        assert_eq!(text.to_str().unwrap(), "/opt/vpl/libvpl-a.so");

        assert!(arena.release(a));
        assert!(arena.release(a));
        assert_eq!(arena.state(a), Some(HandleState::Released));

        // Freed, so the next request allocates a fresh string.
        let c = arena.path_handle(0, Path::new("/opt/vpl/libvpl-a.so")).unwrap();
        assert_eq!(arena.state(c), Some(HandleState::Outstanding));
    }

    #[test]
    fn test_retained_path_survives_release() {
        let mut arena = DescriptorArena::new(ReleasePolicy::RetainUntilUnload);
        let a = arena.path_handle(3, Path::new("/lib/libmfxhw64.so.1")).unwrap();
        assert!(arena.release(a));
        let b = arena.path_handle(3, Path::new("/lib/libmfxhw64.so.1")).unwrap();
        assert_eq!(a, b);
        arena.drain();
        assert_eq!(arena.outstanding(), 0);
    }
}
