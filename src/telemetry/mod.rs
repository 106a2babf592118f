// Copyright 2024-2026 VPL Dispatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Logging setup for hosts embedding the dispatcher.

mod logging;

pub use logging::{init_logging, LogConfig, LogError, LogFormat};
