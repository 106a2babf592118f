// Copyright 2024-2026 VPL Dispatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! The loader context: discovery, filtering, ranking and session binding.

use std::ffi::c_void;

use tracing::{debug, info, warn};

use crate::abi::{
    mfxHDL, mfxIMPL, AccelerationMode, ApiVersion, CapsFormat, InitParam, InitParamExt,
    InitializationParam, MfxVariant,
};
use crate::caps::{backend_for, extract_modern, synthesize, Descriptor, ImplementationRecord};
use crate::config::DispatchConfig;
use crate::error::{DispatchError, Result};
use crate::filter::{self, ConfigObject, PropertyValue};
use crate::library::{
    scan, scan_well_known, validate, validate_one, CapsArray, DynamicOpener, LibraryKind,
    LibraryOpener, LibraryRecord, Runtime,
};
use crate::rank::{self, Rank};

use super::arena::DescriptorArena;
use super::session::Session;
use super::special::{is_low_latency, SpecialConfig};

/// Version requested from legacy runtimes when binding a session.
const LEGACY_SESSION_VERSION: ApiVersion = ApiVersion::new(1, 0);

/// Lifecycle of a loader. Discovery runs on the first request that needs
/// implementations; after that every filter change re-ranks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderState {
    Created,
    Scanned,
    Validated,
    CapabilitiesQueried,
    Ranked,
    Unloaded,
}

/// Identifies a config object within its loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConfigId(pub(crate) usize);

impl ConfigId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One application-visible loader.
///
/// Not synchronized: drive each loader from one thread at a time.
pub struct Loader {
    config: DispatchConfig,
    opener: Box<dyn LibraryOpener>,
    state: LoaderState,
    low_latency: bool,
    libraries: Vec<LibraryRecord>,
    implementations: Vec<ImplementationRecord>,
    configs: Vec<ConfigObject>,
    arena: DescriptorArena,
}

// SAFETY: descriptor pointers held by the records point into arrays owned
// by runtimes the loader keeps alive; nothing is shared with other loaders.
unsafe impl Send for Loader {}

impl std::fmt::Debug for Loader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Loader")
            .field("state", &self.state)
            .field("libraries", &self.libraries.len())
            .field("implementations", &self.implementations.len())
            .field("configs", &self.configs.len())
            .finish()
    }
}

impl Loader {
    /// A loader that opens real shared libraries.
    pub fn new(config: DispatchConfig) -> Self {
        Self::with_opener(config, Box::new(DynamicOpener))
    }

    pub fn with_opener(config: DispatchConfig, opener: Box<dyn LibraryOpener>) -> Self {
        let arena = DescriptorArena::new(config.release_policy);
        Self {
            config,
            opener,
            state: LoaderState::Created,
            low_latency: false,
            libraries: Vec::new(),
            implementations: Vec::new(),
            configs: Vec::new(),
            arena,
        }
    }

    pub fn state(&self) -> LoaderState {
        self.state
    }

    /// Whether discovery took the vendor-runtime shortcut.
    pub fn used_low_latency(&self) -> bool {
        self.low_latency
    }

    pub fn libraries(&self) -> &[LibraryRecord] {
        &self.libraries
    }

    fn ensure_live(&self) -> Result<()> {
        if self.state == LoaderState::Unloaded {
            return Err(DispatchError::InvalidHandle);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Config objects
    // ------------------------------------------------------------------

    pub fn create_config(&mut self) -> Result<ConfigId> {
        self.ensure_live()?;
        let id = ConfigId(self.configs.len());
        self.configs.push(ConfigObject::new(id.0));
        debug!(config = id.0, "created config");
        Ok(id)
    }

    pub fn config(&self, id: ConfigId) -> Option<&ConfigObject> {
        self.configs.get(id.0)
    }

    /// Set one property on a config object and re-rank.
    pub fn set_filter_property(
        &mut self,
        id: ConfigId,
        name: &str,
        value: PropertyValue,
    ) -> Result<()> {
        self.ensure_live()?;
        let cfg = self.configs.get_mut(id.0).ok_or(DispatchError::InvalidHandle)?;
        cfg.set(name, value)?;
        self.rerank();
        Ok(())
    }

    /// Set one property from a C variant and re-rank.
    ///
    /// # Safety
    /// A pointer carried by `value` must be valid for the property's type
    /// (string, range or opaque object).
    pub unsafe fn set_filter_variant(
        &mut self,
        id: ConfigId,
        name: &str,
        value: &MfxVariant,
    ) -> Result<()> {
        self.ensure_live()?;
        let cfg = self.configs.get_mut(id.0).ok_or(DispatchError::InvalidHandle)?;
        let property = filter::parse(name)?;
        let value = PropertyValue::from_variant(property, name, value)?;
        cfg.set_parsed(property, value);
        self.rerank();
        Ok(())
    }

    fn rerank(&mut self) {
        if !matches!(
            self.state,
            LoaderState::CapabilitiesQueried | LoaderState::Ranked
        ) {
            return;
        }
        let selectable = rank::rerank(&mut self.implementations, &self.configs);
        debug!(selectable, total = self.implementations.len(), "re-ranked implementations");
        self.state = LoaderState::Ranked;
    }

    // ------------------------------------------------------------------
    // Discovery
    // ------------------------------------------------------------------

    fn ensure_discovered(&mut self) -> Result<()> {
        self.ensure_live()?;
        if self.state == LoaderState::Created {
            self.discover();
        }
        Ok(())
    }

    fn discover(&mut self) {
        self.low_latency = is_low_latency(&self.configs);
        if self.low_latency {
            let candidates = scan_well_known(&self.config);
            self.state = LoaderState::Scanned;
            info!(candidates = candidates.len(), "low-latency discovery");
            for candidate in candidates {
                let Some(library) = validate_one(candidate, self.opener.as_ref()) else {
                    continue;
                };
                if self.adopt(library) > 0 {
                    break;
                }
            }
            self.state = LoaderState::Validated;
        } else {
            let candidates = scan(&self.config);
            self.state = LoaderState::Scanned;
            debug!(candidates = candidates.len(), "scanned for runtimes");
            let libraries = validate(candidates, self.opener.as_ref());
            self.state = LoaderState::Validated;
            for library in libraries {
                self.adopt(library);
            }
        }
        self.state = LoaderState::CapabilitiesQueried;

        rank::shadow_legacy(&mut self.implementations);
        info!(
            libraries = self.libraries.len(),
            implementations = self.implementations.len(),
            "discovery complete"
        );
        self.rerank();
    }

    /// Extract implementations from `library` and keep it if it has any.
    fn adopt(&mut self, mut library: LibraryRecord) -> usize {
        let index = self.libraries.len();
        let records = match library.runtime.clone() {
            Runtime::Modern(api) => extract_modern(index, &mut library, api.as_ref()),
            Runtime::Legacy(api) => match synthesize(api.as_ref()) {
                Ok((probe, owned)) => {
                    library.probe = Some(probe);
                    vec![ImplementationRecord::new(
                        index,
                        0,
                        Descriptor::Synthesized(owned),
                        LibraryKind::Legacy,
                    )]
                }
                Err(e) => {
                    warn!(path = %library.path.display(), error = %e, "legacy runtime rejected");
                    Vec::new()
                }
            },
        };

        if records.is_empty() {
            release_caps(&mut library);
            debug!(path = %library.path.display(), "library has no usable implementations");
            return 0;
        }
        let count = records.len();
        self.libraries.push(library);
        self.implementations.extend(records);
        count
    }

    // ------------------------------------------------------------------
    // Enumeration
    // ------------------------------------------------------------------

    fn position_of(&self, index: u32) -> Result<usize> {
        self.implementations
            .iter()
            .position(|r| r.rank == Rank::Index(index))
            .ok_or_else(|| DispatchError::NotFound(format!("no implementation at index {index}")))
    }

    /// The implementation ranked at `index`.
    pub fn implementation(&mut self, index: u32) -> Result<&ImplementationRecord> {
        self.ensure_discovered()?;
        let pos = self.position_of(index)?;
        Ok(&self.implementations[pos])
    }

    /// Number of implementations the current filters let through.
    pub fn implementation_count(&mut self) -> Result<usize> {
        self.ensure_discovered()?;
        Ok(self
            .implementations
            .iter()
            .filter(|r| !r.rank.is_excluded())
            .count())
    }

    /// Hand out the capability handle of the implementation ranked at
    /// `index` in the requested format.
    pub fn enum_implementations(&mut self, index: u32, format: CapsFormat) -> Result<mfxHDL> {
        self.ensure_discovered()?;
        let pos = self.position_of(index)?;
        let record = &self.implementations[pos];

        let hdl = match format {
            CapsFormat::ImplDescription => record.description_handle(),
            CapsFormat::ImplementedFunctions => record.functions_handle().ok_or_else(|| {
                DispatchError::Unsupported("implementation has no function list".into())
            })?,
            CapsFormat::ImplPath => {
                let path = &self.libraries[record.library].path;
                return self.arena.path_handle(pos, path);
            }
            CapsFormat::DeviceIdExtended => {
                let (library, index_in_library) = (record.library, record.index_in_library);
                extended_device_id(&mut self.libraries[library], index_in_library)?
            }
        };
        Ok(self.arena.hand_out(hdl))
    }

    /// Give back a handle from [`Loader::enum_implementations`].
    ///
    /// Releasing a handle twice, or one this loader owns but never handed
    /// out, succeeds.
    pub fn release_impl_description(&mut self, hdl: mfxHDL) -> Result<()> {
        self.ensure_live()?;
        if hdl.is_null() {
            return Err(DispatchError::NullPointer);
        }
        if self.arena.release(hdl) || self.owns_handle(hdl) {
            return Ok(());
        }
        Err(DispatchError::InvalidHandle)
    }

    fn owns_handle(&self, hdl: mfxHDL) -> bool {
        self.implementations.iter().any(|r| r.owns_handle(hdl))
            || self.libraries.iter().any(|lib| {
                lib.caps_for(CapsFormat::DeviceIdExtended)
                    .is_some_and(|a| (0..a.len()).any(|i| a.get(i) == Some(hdl)))
            })
    }

    // ------------------------------------------------------------------
    // Sessions
    // ------------------------------------------------------------------

    /// Create a session on the implementation ranked at `index`.
    pub fn create_session(&mut self, index: u32) -> Result<Session> {
        self.ensure_discovered()?;
        let pos = self.position_of(index)?;
        let record = &self.implementations[pos];
        let library = &self.libraries[record.library];
        let special = SpecialConfig::collect(&self.configs);
        let mut ext_buffers: Vec<*mut c_void> = special.ext_buffers.clone();
        let mode = special.acceleration_mode.unwrap_or(record.acceleration_mode);

        let raw = match &library.runtime {
            Runtime::Modern(api) => {
                let param = InitializationParam {
                    acceleration_mode: mode.0,
                    vendor_impl_id: record.vendor_impl_id,
                    device_copy: special.device_copy.unwrap_or(0),
                    num_ext_param: ext_count(&ext_buffers)?,
                    ext_param: ext_ptr(&mut ext_buffers),
                    ..InitializationParam::default()
                };
                api.initialize(param)?
            }
            Runtime::Legacy(api) => {
                let probe = library.probe.ok_or_else(|| {
                    DispatchError::Unsupported("legacy runtime was never probed".into())
                })?;
                let via = legacy_backend(mode)?;
                let param = InitParam {
                    implementation: probe.adapter_impl | via,
                    version: LEGACY_SESSION_VERSION.into(),
                    ext: InitParamExt {
                        ext_param: ext_ptr(&mut ext_buffers),
                        num_ext_param: ext_count(&ext_buffers)?,
                    }
                    .into(),
                    gpu_copy: special.device_copy.unwrap_or(0),
                    ..InitParam::default()
                };
                api.init_ex(param)?
            }
        };
        let session = Session::new(raw, library.runtime.clone());

        if let Some((handle_type, hdl)) = special.device_handle() {
            let status = library.runtime.set_handle(raw, handle_type, hdl);
            if !status.is_ok() {
                warn!(%status, ?handle_type, "binding device handle failed");
                drop(session);
                return Err(status.into());
            }
        }

        info!(
            index,
            path = %library.path.display(),
            kind = ?library.kind(),
            acceleration_mode = mode.0,
            "created session"
        );
        Ok(session)
    }

    // ------------------------------------------------------------------
    // Teardown
    // ------------------------------------------------------------------

    /// Release everything the loader holds. Sessions already created keep
    /// their runtime mapped until they close.
    pub fn unload(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if self.state == LoaderState::Unloaded {
            return;
        }
        self.arena.drain();
        for library in &mut self.libraries {
            release_caps(library);
        }
        self.implementations.clear();
        self.libraries.clear();
        self.configs.clear();
        self.state = LoaderState::Unloaded;
        debug!("loader unloaded");
    }
}

impl Drop for Loader {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn ext_count(buffers: &[*mut c_void]) -> Result<u16> {
    u16::try_from(buffers.len())
        .map_err(|_| DispatchError::Unsupported("too many extension buffers".into()))
}

fn ext_ptr(buffers: &mut [*mut c_void]) -> *mut *mut c_void {
    if buffers.is_empty() {
        std::ptr::null_mut()
    } else {
        buffers.as_mut_ptr()
    }
}

fn legacy_backend(mode: AccelerationMode) -> Result<mfxIMPL> {
    backend_for(mode).ok_or_else(|| {
        DispatchError::Unsupported(format!(
            "acceleration mode {:#x} has no legacy backend",
            mode.0
        ))
    })
}

/// Query (once) and look up the extended device id of one implementation.
fn extended_device_id(library: &mut LibraryRecord, index_in_library: usize) -> Result<mfxHDL> {
    let Runtime::Modern(api) = library.runtime.clone() else {
        return Err(DispatchError::Unsupported(
            "legacy runtimes have no extended device id".into(),
        ));
    };
    if library.caps_for(CapsFormat::DeviceIdExtended).is_none() {
        match api.query_impls_description(CapsFormat::DeviceIdExtended) {
            Some(array) => library.caps.push(array),
            None => {
                return Err(DispatchError::Unsupported(
                    "runtime does not report extended device ids".into(),
                ))
            }
        }
    }
    library
        .caps_for(CapsFormat::DeviceIdExtended)
        .and_then(|a| a.get(index_in_library))
        .ok_or_else(|| DispatchError::Unsupported("no extended device id for implementation".into()))
}

/// Hand every queried capability array back to its runtime.
fn release_caps(library: &mut LibraryRecord) {
    let arrays: Vec<CapsArray> = library.caps.drain(..).collect();
    let Runtime::Modern(api) = &library.runtime else {
        return;
    };
    for array in &arrays {
        let status = api.release_impls_description(array);
        if !status.is_ok() {
            warn!(
                path = %library.path.display(),
                format = ?array.format(),
                %status,
                "runtime refused to release capability array"
            );
        }
    }
}

#[cfg(all(test, not(windows)))]
#[path = "context_tests.rs"]
mod tests;
