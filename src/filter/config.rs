// Copyright 2024-2026 VPL Dispatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Config objects: the per-loader containers filter properties are set on.

use super::property::{self, Family, PropertyError, PropertyId};
use super::value::PropertyValue;

/// One filter configuration object created against a loader.
///
/// Holds at most one value per property id; setting an id again replaces
/// the value in place, so its position among the other properties is kept.
#[derive(Debug, Clone, Default)]
pub struct ConfigObject {
    id: usize,
    properties: Vec<(PropertyId, PropertyValue)>,
}

impl ConfigObject {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            properties: Vec::new(),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Parse `path`, check `value` against it and store it.
    ///
    /// Nothing is stored when either step fails.
    pub fn set(&mut self, path: &str, value: PropertyValue) -> Result<PropertyId, PropertyError> {
        let id = property::parse(path)?;
        value.check(id, path)?;
        self.set_parsed(id, value);
        Ok(id)
    }

    pub(crate) fn set_parsed(&mut self, id: PropertyId, value: PropertyValue) {
        match self.properties.iter_mut().find(|(existing, _)| *existing == id) {
            Some(slot) => slot.1 = value,
            None => self.properties.push((id, value)),
        }
    }

    pub fn get(&self, id: PropertyId) -> Option<&PropertyValue> {
        self.properties
            .iter()
            .find(|(existing, _)| *existing == id)
            .map(|(_, value)| value)
    }

    /// Properties in the order they were first set.
    pub fn properties(&self) -> impl Iterator<Item = (PropertyId, &PropertyValue)> {
        self.properties.iter().map(|(id, value)| (*id, value))
    }

    /// Properties that constrain implementations (special ones excluded).
    pub fn filters(&self) -> impl Iterator<Item = (PropertyId, &PropertyValue)> {
        self.properties().filter(|(id, _)| id.family() != Family::Special)
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}
