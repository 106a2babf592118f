// Copyright 2024-2026 VPL Dispatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Filter properties: schema, config objects and descriptor matching.

mod config;
mod property;
mod validate;
mod value;

pub use config::ConfigObject;
pub use property::{parse, Family, PropertyError, PropertyId, ValueKind};
pub use validate::{accepts, evaluate, Evaluation, PropertyState};
pub use value::PropertyValue;
