//! relstat-core library.
//!
//! Pure, synchronous analysis of bipartite relation dumps: node universe
//! loading, relation table parsing, edge orientation, and statistics
//! aggregation, plus the on-disk layout and config shared with the CLI.
//!
//! # Conventions
//!
//! - **Errors**: typed errors ([`error::DumpError`] / [`error::FormatError`])
//!   at the library boundary; `anyhow::Result` only in config loading.
//! - **Logging**: `tracing` macros (`info!`, `warn!`, `debug!`).

pub mod analyze;
pub mod config;
pub mod error;
pub mod layout;
pub mod orient;
pub mod stats;
pub mod table;
pub mod universe;
