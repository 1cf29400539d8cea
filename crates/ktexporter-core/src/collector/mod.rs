//! Kyoto Tycoon report collector.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                        Collector                          │
//! │                                                           │
//! │   ReportFetcher ──▶ parse_report ──▶ MetricDescriptors    │
//! │   GET /rpc/report    key<TAB>value      ::classify        │
//! │                                             │             │
//! │        ┌──────────────┬──────────────┬──────┴──────┐      │
//! │        ▼              ▼              ▼             ▼      │
//! │     scalar       info field        db_<N>       ignored   │
//! │        │              │       parse_db_record             │
//! │        └──────────────┴──────────────┘                    │
//! │                       │                                   │
//! │               assemble_snapshot                           │
//! └───────────────────────┼───────────────────────────────────┘
//!                         ▼
//!                     Snapshot
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use ktexporter_core::collector::{Collector, CollectorConfig, MetricDescriptors};
//!
//! let descriptors = Arc::new(MetricDescriptors::standard());
//! let collector = Collector::new(&CollectorConfig::default(), descriptors)?;
//! let snapshot = collector.collect_snapshot().await;
//! ```
//!
//! ## Without a server
//!
//! ```
//! use ktexporter_core::collector::{MetricDescriptors, assemble_snapshot};
//!
//! let snapshot = assemble_snapshot("cnt_get\t3\n", &MetricDescriptors::standard());
//! assert_eq!(snapshot.observations().len(), 3);
//! ```

#[allow(clippy::module_inception)]
mod collector;
pub mod db_record;
pub mod descriptors;
pub mod fetcher;
pub mod parser;

#[cfg(test)]
pub(crate) mod testing;

pub use collector::{Collector, CollectorConfig, DEFAULT_TIMEOUT, assemble_snapshot};
pub use db_record::{is_db_key, parse_db_record};
pub use descriptors::{Disposition, MetricDescriptors, MetricKind, NAMESPACE, ScalarDescriptor};
pub use fetcher::{DEFAULT_SERVER, FetchError, REPORT_PATH, ReportFetcher, report_url};
pub use parser::{ParseError, ParsedEntry, parse_line, parse_report};
