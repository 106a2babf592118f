// Copyright 2024-2026 VPL Dispatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Implementation priority ranking.
//!
//! Three stable sorts are applied in turn, so the last one dominates and
//! earlier ones only break its ties:
//!
//! 1. API version, newest first
//! 2. general hardware before HDDL-unite (every other mode counts as general)
//! 3. implementation class, hardware before software
//!
//! Accepted implementations then get dense indices in the sorted order.

use std::cmp::Reverse;

use tracing::{debug, info};

use crate::abi::{AccelerationMode, ApiVersion, ImplType};
use crate::caps::ImplementationRecord;
use crate::filter::{self, ConfigObject};
use crate::library::LibraryKind;

/// The fields ranking looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankKey {
    pub api_version: ApiVersion,
    pub impl_type: ImplType,
    pub acceleration_mode: AccelerationMode,
}

/// Position of an implementation in enumeration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rank {
    Index(u32),
    #[default]
    Excluded,
}

impl Rank {
    pub fn index(self) -> Option<u32> {
        match self {
            Rank::Index(i) => Some(i),
            Rank::Excluded => None,
        }
    }

    pub fn is_excluded(self) -> bool {
        self == Rank::Excluded
    }
}

/// Indices of `keys` in priority order.
pub fn order(keys: &[RankKey]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..keys.len()).collect();
    order.sort_by_key(|&i| Reverse(keys[i].api_version));
    order.sort_by_key(|&i| keys[i].acceleration_mode.is_hddl());
    order.sort_by_key(|&i| Reverse(keys[i].impl_type.raw()));
    order
}

/// Rank every key; rejected keys stay `Excluded`.
pub fn rank(keys: &[RankKey], accepted: &[bool]) -> Vec<Rank> {
    let mut ranks = vec![Rank::Excluded; keys.len()];
    let mut next = 0u32;
    for i in order(keys) {
        if accepted.get(i).copied().unwrap_or(false) {
            ranks[i] = Rank::Index(next);
            next += 1;
        }
    }
    ranks
}

/// Mark legacy implementations ineligible when a modern hardware
/// implementation exists. Returns how many were shadowed.
pub fn shadow_legacy(records: &mut [ImplementationRecord]) -> usize {
    let modern_hw = records
        .iter()
        .any(|r| r.kind == LibraryKind::Modern && r.impl_type == ImplType::Hardware);
    if !modern_hw {
        return 0;
    }
    let mut shadowed = 0;
    for record in records.iter_mut().filter(|r| r.kind == LibraryKind::Legacy) {
        if record.eligible {
            record.eligible = false;
            shadowed += 1;
        }
    }
    if shadowed > 0 {
        info!(shadowed, "legacy implementations hidden behind modern hardware runtime");
    }
    shadowed
}

/// Filter and rank `records` in place against `configs`.
/// Returns the number of selectable implementations.
pub fn rerank(records: &mut [ImplementationRecord], configs: &[ConfigObject]) -> usize {
    let keys: Vec<RankKey> = records.iter().map(ImplementationRecord::rank_key).collect();
    let accepted: Vec<bool> = records
        .iter()
        .map(|r| {
            if !r.eligible {
                return false;
            }
            let eval = filter::evaluate(configs, r);
            if !eval.accepted() {
                debug!(
                    library = r.library,
                    index = r.index_in_library,
                    rejected_by = ?eval.rejected_by(),
                    "implementation filtered out"
                );
            }
            eval.accepted()
        })
        .collect();

    let ranks = rank(&keys, &accepted);
    for (record, rank) in records.iter_mut().zip(ranks) {
        record.rank = rank;
    }
    accepted.iter().filter(|a| **a).count()
}
