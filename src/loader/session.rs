// Copyright 2024-2026 VPL Dispatch Contributors
// SPDX-License-Identifier: Apache-2.0

use tracing::{info, warn};

use crate::abi::{mfxSession, MfxStatus};
use crate::error::Result;
use crate::library::{LibraryKind, Runtime};

/// A session bound to one implementation.
///
/// Holds a reference to the owning runtime, so the library stays mapped
/// until the session is closed even if the loader is unloaded first.
/// Dropping an open session closes it.
#[derive(Debug)]
pub struct Session {
    raw: mfxSession,
    runtime: Runtime,
}

// SAFETY: the raw session is only used through the runtime's entry points,
// which the runtime traits require to be callable from any thread.
unsafe impl Send for Session {}

impl Session {
    pub(crate) fn new(raw: mfxSession, runtime: Runtime) -> Self {
        Self { raw, runtime }
    }

    /// The vendor session handle.
    pub fn as_raw(&self) -> mfxSession {
        self.raw
    }

    pub fn kind(&self) -> LibraryKind {
        self.runtime.kind()
    }

    /// Create a secondary session sharing this session's resources.
    pub fn try_clone(&self) -> Result<Session> {
        let raw = self.runtime.clone_session(self.raw)?;
        info!(kind = ?self.kind(), "cloned session");
        Ok(Session::new(raw, self.runtime.clone()))
    }

    /// Close the session, reporting the runtime's status.
    pub fn close(mut self) -> Result<()> {
        let status = self.close_raw();
        status.into_result().map_err(Into::into)
    }

    fn close_raw(&mut self) -> MfxStatus {
        if self.raw.is_null() {
            return MfxStatus::NONE;
        }
        let status = self.runtime.close(self.raw);
        self.raw = std::ptr::null_mut();
        status
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        let status = self.close_raw();
        if !status.is_ok() {
            warn!(%status, "closing dropped session failed");
        }
    }
}
