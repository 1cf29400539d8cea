//! ktexporter-core: Kyoto Tycoon report ingestion and metric mapping.
//!
//! Provides:
//! - `collector`: report fetcher, line parser, key classifier, db record
//!   extractor and the snapshot assembler
//! - `model`: snapshot and observation types produced by one collection cycle
//! - `exposition`: Prometheus text encoding of a snapshot

pub mod collector;
pub mod exposition;
pub mod model;

/// Crate version with the git revision it was built from.
pub const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_SHA"), ")");

/// Git revision embedded at build time.
pub const REVISION: &str = env!("GIT_SHA");
