//! Collector that turns one report fetch into a `Snapshot`.
//!
//! Every call is an independent fetch-parse-emit cycle. Only the descriptor
//! table and the HTTP client are shared between cycles, both read-only.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, error, warn};

use super::db_record::parse_db_record;
use super::descriptors::{Disposition, MetricDescriptors};
use super::fetcher::{DEFAULT_SERVER, FetchError, ReportFetcher};
use super::parser::parse_report;
use crate::model::{InfoObservation, Sample, ScalarObservation, Snapshot};

/// Default timeout for the report request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(200);

/// Connection settings for the Kyoto Tycoon server.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectorConfig {
    /// Server address; scheme and report path are added when missing.
    pub server: String,
    /// Bound on the whole report request.
    pub timeout: Duration,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            server: DEFAULT_SERVER.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Builds the snapshot for a successfully fetched report.
///
/// Never fails: malformed lines, undecodable db values and non-numeric
/// values are logged and skipped or zeroed.
pub fn assemble_snapshot(report: &str, descriptors: &MetricDescriptors) -> Snapshot {
    let mut samples = Vec::new();
    let mut fields: BTreeMap<String, String> = descriptors
        .info_fields()
        .iter()
        .map(|f| (f.clone(), String::new()))
        .collect();

    for entry in parse_report(report) {
        match descriptors.classify(entry.key) {
            Disposition::Scalar(desc) => {
                let value = entry.value.parse::<f64>().unwrap_or_else(|_| {
                    warn!(key = entry.key, value = entry.value, "non-numeric value, using 0");
                    0.0
                });
                samples.push(Sample::Scalar(ScalarObservation {
                    key: entry.key.to_string(),
                    metric: desc.metric.clone(),
                    value,
                }));
            }
            Disposition::Info(field) => {
                fields.insert(field.to_string(), entry.value.to_string());
            }
            Disposition::Database => match parse_db_record(entry.value) {
                Ok(db) => samples.push(Sample::Database(db)),
                Err(e) => {
                    warn!(key = entry.key, value = entry.value, error = %e, "skipping db record");
                }
            },
            Disposition::Ignored => {}
        }
    }

    Snapshot {
        up: true,
        samples,
        info: Some(InfoObservation { fields }),
    }
}

/// Collects snapshots from one Kyoto Tycoon server.
#[derive(Debug, Clone)]
pub struct Collector {
    fetcher: ReportFetcher,
    descriptors: Arc<MetricDescriptors>,
}

impl Collector {
    /// Creates a collector. Fails only if the server address is unusable.
    pub fn new(
        config: &CollectorConfig,
        descriptors: Arc<MetricDescriptors>,
    ) -> Result<Self, FetchError> {
        Ok(Self {
            fetcher: ReportFetcher::new(&config.server, config.timeout)?,
            descriptors,
        })
    }

    pub fn descriptors(&self) -> &MetricDescriptors {
        &self.descriptors
    }

    /// Full report URL this collector scrapes.
    pub fn report_url(&self) -> &str {
        self.fetcher.url().as_str()
    }

    /// Runs one collection cycle.
    ///
    /// A failed fetch yields a snapshot with only the liveness flag cleared.
    pub async fn collect_snapshot(&self) -> Snapshot {
        let t0 = Instant::now();

        let report = match self.fetcher.fetch().await {
            Ok(report) => report,
            Err(e) => {
                error!(url = %self.fetcher.url(), error = %e, "access to /rpc/report failed");
                return Snapshot::down();
            }
        };

        let snapshot = assemble_snapshot(&report, &self.descriptors);
        debug!(
            duration_ms = t0.elapsed().as_millis() as u64,
            samples = snapshot.samples.len(),
            "snapshot collected"
        );
        snapshot
    }
}
