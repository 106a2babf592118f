// Copyright 2024-2026 VPL Dispatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! In-process runtimes for testing without vendor libraries.
//!
//! The mocks keep counters behind a `Mutex` so tests can hold an `Arc` to
//! a mock, hand a clone to a [`MockOpener`], and inspect what the loader
//! did with it afterwards.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use super::runtime::{CapsArray, LegacyApi, LibraryKind, ModernApi, Runtime, SessionApi};
use super::symbols::MODERN_FUNCTIONS;
use super::validator::{LibraryOpener, LoadError};
use crate::abi::{
    mfxHDL, mfxIMPL, mfxSession, ApiVersion, CapsFormat, ExtendedDeviceId, HandleType,
    InitParam, InitializationParam, MfxStatus, MfxVersion, Platform,
};
use crate::caps::{OwnedImplDescription, OwnedImplementedFunctions};

/// Session object handed out by the mocks.
struct MockSession {
    implementation: mfxIMPL,
}

fn new_session(implementation: mfxIMPL) -> mfxSession {
    Box::into_raw(Box::new(MockSession { implementation })) as mfxSession
}

/// Handle arrays given out by `query_impls_description`.
struct HandleArray(Box<[mfxHDL]>);

// SAFETY: the handles point into descriptors owned by the same mock.
unsafe impl Send for HandleArray {}

/// Observable calls shared by both mock generations.
#[derive(Debug, Default, Clone)]
pub struct SessionCounters {
    pub sessions_created: usize,
    pub sessions_closed: usize,
    pub set_handle_calls: Vec<(HandleType, usize)>,
    pub clones: usize,
}

impl SessionCounters {
    pub fn open_sessions(&self) -> usize {
        self.sessions_created + self.clones - self.sessions_closed
    }
}

/// The parts of an `MFXInitialize` call a test can check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitCall {
    pub acceleration_mode: u32,
    pub vendor_impl_id: u32,
    pub device_copy: u16,
    pub num_ext_param: u16,
}

impl From<&InitializationParam> for InitCall {
    fn from(p: &InitializationParam) -> Self {
        Self {
            acceleration_mode: p.acceleration_mode,
            vendor_impl_id: p.vendor_impl_id,
            device_copy: p.device_copy,
            num_ext_param: p.num_ext_param,
        }
    }
}

#[derive(Default)]
struct ModernState {
    counters: SessionCounters,
    live_arrays: Vec<HandleArray>,
    queried: usize,
    released: usize,
    init_calls: Vec<InitCall>,
}

// ============================================================================
// Modern
// ============================================================================

/// A modern runtime with a fixed set of implementations.
pub struct MockModernRuntime {
    impls: Vec<OwnedImplDescription>,
    functions: Option<Vec<OwnedImplementedFunctions>>,
    extended_ids: Option<Vec<Box<ExtendedDeviceId>>>,
    exports: HashSet<&'static str>,
    fail_initialize: Option<MfxStatus>,
    set_handle_status: MfxStatus,
    state: Mutex<ModernState>,
}

impl Default for MockModernRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl MockModernRuntime {
    /// No implementations; exports the full 2.1 table.
    pub fn new() -> Self {
        Self {
            impls: Vec::new(),
            functions: None,
            extended_ids: None,
            exports: MODERN_FUNCTIONS.iter().map(|(n, _)| *n).collect(),
            fail_initialize: None,
            set_handle_status: MfxStatus::NONE,
            state: Mutex::new(ModernState::default()),
        }
    }

    pub fn with_impl(mut self, desc: OwnedImplDescription) -> Self {
        self.impls.push(desc);
        self
    }

    /// Report `names` as the implemented-functions list of every
    /// implementation.
    pub fn with_functions(mut self, names: &[&str]) -> Self {
        self.functions = Some(
            self.impls
                .iter()
                .map(|_| OwnedImplementedFunctions::new(names))
                .collect(),
        );
        self
    }

    /// Answer `MFX_IMPLCAPS_DEVICE_ID_EXTENDED` with `ids`, one per
    /// implementation.
    pub fn with_extended_device_ids(mut self, ids: Vec<ExtendedDeviceId>) -> Self {
        self.extended_ids = Some(ids.into_iter().map(Box::new).collect());
        self
    }

    /// Export only the entry points introduced at or before `version`.
    pub fn exporting_up_to(mut self, version: ApiVersion) -> Self {
        self.exports = MODERN_FUNCTIONS
            .iter()
            .filter(|(_, since)| *since <= version)
            .map(|(n, _)| *n)
            .collect();
        self
    }

    pub fn without_export(mut self, name: &str) -> Self {
        self.exports.retain(|n| *n != name);
        self
    }

    pub fn fail_initialize(mut self, status: MfxStatus) -> Self {
        self.fail_initialize = Some(status);
        self
    }

    pub fn fail_set_handle(mut self, status: MfxStatus) -> Self {
        self.set_handle_status = status;
        self
    }

    pub fn counters(&self) -> SessionCounters {
        self.state.lock().counters.clone()
    }

    /// Capability arrays handed out and not yet released.
    pub fn outstanding_arrays(&self) -> usize {
        let state = self.state.lock();
        state.queried - state.released
    }

    pub fn init_calls(&self) -> Vec<InitCall> {
        self.state.lock().init_calls.clone()
    }

    fn handles_for(&self, format: CapsFormat) -> Option<Vec<mfxHDL>> {
        match format {
            CapsFormat::ImplDescription if !self.impls.is_empty() => {
                Some(self.impls.iter().map(|d| d.as_handle()).collect())
            }
            CapsFormat::ImplementedFunctions => self
                .functions
                .as_ref()
                .map(|f| f.iter().map(|f| f.as_handle()).collect()),
            CapsFormat::DeviceIdExtended => self.extended_ids.as_ref().map(|ids| {
                ids.iter()
                    .map(|id| id.as_ref() as *const ExtendedDeviceId as mfxHDL)
                    .collect()
            }),
            _ => None,
        }
    }
}

impl SessionApi for MockModernRuntime {
    fn close(&self, session: mfxSession) -> MfxStatus {
        close_mock_session(session, &mut self.state.lock().counters)
    }

    fn set_handle(&self, _session: mfxSession, handle_type: HandleType, hdl: mfxHDL) -> MfxStatus {
        self.state
            .lock()
            .counters
            .set_handle_calls
            .push((handle_type, hdl as usize));
        self.set_handle_status
    }

    fn clone_session(&self, session: mfxSession) -> Result<mfxSession, MfxStatus> {
        clone_mock_session(session, &mut self.state.lock().counters)
    }
}

impl ModernApi for MockModernRuntime {
    fn exports(&self, name: &str) -> bool {
        self.exports.contains(name)
    }

    fn query_impls_description(&self, format: CapsFormat) -> Option<CapsArray> {
        let handles = self.handles_for(format)?;
        let mut array = HandleArray(handles.into_boxed_slice());
        let count = array.0.len() as u32;
        let ptr = array.0.as_mut_ptr();
        let mut state = self.state.lock();
        state.live_arrays.push(array);
        state.queried += 1;
        // SAFETY: the boxed slice is kept in `live_arrays` until released.
        Some(unsafe { CapsArray::from_raw(format, ptr, count) })
    }

    fn release_impls_description(&self, array: &CapsArray) -> MfxStatus {
        let mut state = self.state.lock();
        let before = state.live_arrays.len();
        state
            .live_arrays
            .retain(|a| a.0.as_ptr() as *mut mfxHDL != array.as_raw());
        if state.live_arrays.len() == before {
            return MfxStatus::INVALID_HANDLE;
        }
        state.released += 1;
        MfxStatus::NONE
    }

    fn initialize(&self, param: InitializationParam) -> Result<mfxSession, MfxStatus> {
        let mut state = self.state.lock();
        state.init_calls.push(InitCall::from(&param));
        if let Some(status) = self.fail_initialize {
            return Err(status);
        }
        state.counters.sessions_created += 1;
        Ok(new_session(param.acceleration_mode as mfxIMPL))
    }
}

// ============================================================================
// Legacy
// ============================================================================

#[derive(Default)]
struct LegacyState {
    counters: SessionCounters,
    init_attempts: Vec<mfxIMPL>,
}

/// A 1.x runtime that accepts a fixed set of `mfxIMPL` values.
pub struct MockLegacyRuntime {
    version: ApiVersion,
    accepted: HashSet<mfxIMPL>,
    platform: Option<Platform>,
    close_status: MfxStatus,
    state: Mutex<LegacyState>,
}

impl MockLegacyRuntime {
    pub fn new(version: ApiVersion) -> Self {
        Self {
            version,
            accepted: HashSet::new(),
            platform: None,
            close_status: MfxStatus::NONE,
            state: Mutex::new(LegacyState::default()),
        }
    }

    /// Let `MFXInitEx` succeed for `implementation` (adapter | backend).
    pub fn accepting(mut self, implementation: mfxIMPL) -> Self {
        self.accepted.insert(implementation);
        self
    }

    /// Export `MFXVideoCORE_QueryPlatform` answering with `platform`.
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Report `status` from `MFXClose`. The session is still freed.
    pub fn fail_close(mut self, status: MfxStatus) -> Self {
        self.close_status = status;
        self
    }

    pub fn counters(&self) -> SessionCounters {
        self.state.lock().counters.clone()
    }

    /// Every `mfxIMPL` passed to `MFXInitEx`, in call order.
    pub fn init_attempts(&self) -> Vec<mfxIMPL> {
        self.state.lock().init_attempts.clone()
    }
}

impl SessionApi for MockLegacyRuntime {
    fn close(&self, session: mfxSession) -> MfxStatus {
        match close_mock_session(session, &mut self.state.lock().counters) {
            MfxStatus::NONE => self.close_status,
            status => status,
        }
    }

    fn set_handle(&self, _session: mfxSession, handle_type: HandleType, hdl: mfxHDL) -> MfxStatus {
        self.state
            .lock()
            .counters
            .set_handle_calls
            .push((handle_type, hdl as usize));
        MfxStatus::NONE
    }

    fn clone_session(&self, session: mfxSession) -> Result<mfxSession, MfxStatus> {
        clone_mock_session(session, &mut self.state.lock().counters)
    }
}

impl LegacyApi for MockLegacyRuntime {
    fn init_ex(&self, param: InitParam) -> Result<mfxSession, MfxStatus> {
        let mut state = self.state.lock();
        state.init_attempts.push(param.implementation);
        if !self.accepted.contains(&param.implementation) {
            return Err(MfxStatus::UNSUPPORTED);
        }
        state.counters.sessions_created += 1;
        Ok(new_session(param.implementation))
    }

    fn query_version(&self, session: mfxSession) -> Result<MfxVersion, MfxStatus> {
        if session.is_null() {
            return Err(MfxStatus::INVALID_HANDLE);
        }
        Ok(self.version.into())
    }

    fn query_impl(&self, session: mfxSession) -> Result<mfxIMPL, MfxStatus> {
        if session.is_null() {
            return Err(MfxStatus::INVALID_HANDLE);
        }
        // SAFETY: non-null sessions given to this mock are `MockSession`s.
        Ok(unsafe { (*(session as *const MockSession)).implementation })
    }

    fn query_platform(&self, _session: mfxSession) -> Option<Result<Platform, MfxStatus>> {
        self.platform.map(Ok)
    }
}

fn close_mock_session(session: mfxSession, counters: &mut SessionCounters) -> MfxStatus {
    if session.is_null() {
        return MfxStatus::INVALID_HANDLE;
    }
    // SAFETY: sessions given to the mocks were created by `new_session`.
    drop(unsafe { Box::from_raw(session as *mut MockSession) });
    counters.sessions_closed += 1;
    MfxStatus::NONE
}

fn clone_mock_session(
    session: mfxSession,
    counters: &mut SessionCounters,
) -> Result<mfxSession, MfxStatus> {
    if session.is_null() {
        return Err(MfxStatus::INVALID_HANDLE);
    }
    // SAFETY: sessions given to the mocks were created by `new_session`.
    let implementation = unsafe { (*(session as *const MockSession)).implementation };
    counters.clones += 1;
    Ok(new_session(implementation))
}

// ============================================================================
// Opener
// ============================================================================

/// Maps candidate file names to mock runtimes.
#[derive(Default)]
pub struct MockOpener {
    runtimes: HashMap<String, Runtime>,
    opened: Mutex<Vec<PathBuf>>,
}

impl MockOpener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_runtime(mut self, file_name: &str, runtime: Runtime) -> Self {
        self.runtimes.insert(file_name.to_string(), runtime);
        self
    }

    pub fn with_modern(self, file_name: &str, runtime: MockModernRuntime) -> Self {
        self.with_runtime(file_name, Runtime::Modern(Arc::new(runtime)))
    }

    pub fn with_legacy(self, file_name: &str, runtime: MockLegacyRuntime) -> Self {
        self.with_runtime(file_name, Runtime::Legacy(Arc::new(runtime)))
    }

    /// Paths passed to `open`, in call order.
    pub fn opened(&self) -> Vec<PathBuf> {
        self.opened.lock().clone()
    }

    pub fn kind_of(&self, file_name: &str) -> Option<LibraryKind> {
        self.runtimes.get(file_name).map(Runtime::kind)
    }
}

impl LibraryOpener for MockOpener {
    fn open(&self, path: &Path) -> Result<Runtime, LoadError> {
        self.opened.lock().push(path.to_path_buf());
        path.file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| self.runtimes.get(n))
            .cloned()
            .ok_or_else(|| LoadError::NotARuntime(path.to_path_buf()))
    }
}
