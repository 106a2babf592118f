// Copyright 2024-2026 VPL Dispatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Loader contexts and the sessions they bind.

mod arena;
mod context;
mod session;
mod special;

pub use arena::{DescriptorArena, HandleState};
pub use context::{ConfigId, Loader, LoaderState};
pub use session::Session;
pub use special::{is_low_latency, SpecialConfig};
