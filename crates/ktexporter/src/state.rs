//! Shared application state.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::sync::Arc;

use axum::extract::State;

use ktexporter_core::collector::Collector;

pub(crate) struct ExporterInner {
    // Holds the descriptor table and the HTTP client; both are read-only.
    pub(crate) collector: Collector,
    pub(crate) telemetry_path: String,
}

pub(crate) type SharedState = Arc<ExporterInner>;

pub(crate) type AppState = State<SharedState>;
