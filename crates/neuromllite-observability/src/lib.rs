// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # neuromllite-observability
//!
//! Logging infrastructure shared by the NeuroMLlite crates.
//!
//! Provides consistent logging across crates with per-crate debug flag
//! support, and the [`Verbosity`] setting that network generation and the
//! export handlers take explicitly instead of reading a process-wide flag.

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod config;
pub mod init;

// Re-export commonly used items
pub use cli::*;
pub use config::*;
pub use init::*;

/// Known NeuroMLlite crate names for debug flags
pub const KNOWN_CRATES: &[&str] = &[
    "neuromllite-base",
    "neuromllite-network",
    "neuromllite-config",
    "neuromllite-observability",
];
