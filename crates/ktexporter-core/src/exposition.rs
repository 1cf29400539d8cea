//! Prometheus text exposition of a snapshot.
//!
//! A fresh `Registry` is built per scrape from the snapshot, so nothing is
//! carried over between cycles.

use std::collections::{BTreeMap, BTreeSet};

use prometheus::{Counter, Encoder, Gauge, GaugeVec, Opts, Registry, TextEncoder};
use tracing::{debug, warn};

use crate::collector::{MetricDescriptors, MetricKind, ScalarDescriptor};
use crate::model::Snapshot;

/// Content type of the encoded output.
pub const CONTENT_TYPE: &str = prometheus::TEXT_FORMAT;

/// Name of the exporter's own build info metric.
pub const BUILD_INFO_METRIC: &str = "ktexporter_build_info";

/// Registers every observation of `snapshot` into a new registry.
pub fn build_registry(
    snapshot: &Snapshot,
    descriptors: &MetricDescriptors,
) -> Result<Registry, prometheus::Error> {
    let registry = Registry::new();

    let up = Gauge::with_opts(Opts::new(
        descriptors.metric_name("up"),
        "Was the last query of kt successful.",
    ))?;
    up.set(if snapshot.up { 1.0 } else { 0.0 });
    registry.register(Box::new(up))?;

    if !snapshot.up {
        return Ok(registry);
    }

    // A key repeated in the report keeps its last value.
    let mut scalars: BTreeMap<&str, (&ScalarDescriptor, f64)> = BTreeMap::new();
    for obs in snapshot.scalars() {
        let Some(desc) = descriptors.scalar(&obs.key) else {
            debug!(key = %obs.key, "no descriptor for scalar observation");
            continue;
        };
        if scalars.insert(&desc.metric, (desc, obs.value)).is_some() {
            debug!(key = %obs.key, "duplicate scalar key in report");
        }
    }

    for (desc, value) in scalars.into_values() {
        let opts = Opts::new(desc.metric.clone(), desc.help.clone());
        match desc.kind {
            MetricKind::Counter => {
                let counter = Counter::with_opts(opts)?;
                if value >= 0.0 {
                    counter.inc_by(value);
                } else {
                    warn!(metric = %desc.metric, value, "negative counter value, exporting 0");
                }
                registry.register(Box::new(counter))?;
            }
            MetricKind::Gauge => {
                let gauge = Gauge::with_opts(opts)?;
                gauge.set(value);
                registry.register(Box::new(gauge))?;
            }
        }
    }

    let db_count = GaugeVec::new(
        Opts::new(
            descriptors.metric_name("db_count"),
            "Number of records in the database.",
        ),
        &["path"],
    )?;
    let db_size = GaugeVec::new(
        Opts::new(
            descriptors.metric_name("db_size"),
            "Size of the database in bytes.",
        ),
        &["path"],
    )?;
    // A path repeated across `db_<N>` entries keeps its last values.
    let mut seen_paths = BTreeSet::new();
    for db in snapshot.databases() {
        if !seen_paths.insert(db.path.as_str()) {
            debug!(path = %db.path, "duplicate database path in report");
        }
        db_count.with_label_values(&[db.path.as_str()]).set(db.count);
        db_size.with_label_values(&[db.path.as_str()]).set(db.size);
    }
    registry.register(Box::new(db_count))?;
    registry.register(Box::new(db_size))?;

    if let Some(ref info) = snapshot.info {
        let labels: Vec<&str> = descriptors
            .info_fields()
            .iter()
            .map(String::as_str)
            .collect();
        let info_vec = GaugeVec::new(
            Opts::new(
                descriptors.metric_name("info"),
                "Kyoto Tycoon server configuration and version information.",
            ),
            &labels,
        )?;
        let values: Vec<&str> = labels
            .iter()
            .map(|field| info.get(field).unwrap_or(""))
            .collect();
        info_vec.with_label_values(&values).set(1.0);
        registry.register(Box::new(info_vec))?;
    }

    Ok(registry)
}

/// Registers the exporter build info metric.
pub fn register_build_info(registry: &Registry) -> Result<(), prometheus::Error> {
    let build_info = GaugeVec::new(
        Opts::new(
            BUILD_INFO_METRIC,
            "A metric with a constant '1' value labeled by version and revision of ktexporter.",
        ),
        &["version", "revision"],
    )?;
    build_info
        .with_label_values(&[env!("CARGO_PKG_VERSION"), crate::REVISION])
        .set(1.0);
    registry.register(Box::new(build_info))
}

/// Encodes everything gathered by `registry` in the text format.
pub fn encode(registry: &Registry) -> Result<String, prometheus::Error> {
    let mut buf = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buf)?;
    String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

/// Builds and encodes the full scrape output for a snapshot.
pub fn encode_snapshot(
    snapshot: &Snapshot,
    descriptors: &MetricDescriptors,
) -> Result<String, prometheus::Error> {
    let registry = build_registry(snapshot, descriptors)?;
    register_build_info(&registry)?;
    encode(&registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::assemble_snapshot;
    use crate::collector::testing::SAMPLE_REPORT;

    fn sample_count(registry: &Registry) -> usize {
        registry.gather().iter().map(|mf| mf.get_metric().len()).sum()
    }

    #[test]
    fn test_sample_report_exposition() {
        let descriptors = MetricDescriptors::standard();
        let snap = assemble_snapshot(SAMPLE_REPORT, &descriptors);
        let registry = build_registry(&snap, &descriptors).unwrap();
        assert_eq!(sample_count(&registry), snap.observations().len());

        let text = encode(&registry).unwrap();
        assert!(text.contains("kyototycoon_up 1\n"));
        assert!(text.contains("# TYPE kyototycoon_cnt_get counter\n"));
        assert!(text.contains("kyototycoon_cnt_get 1\n"));
        assert!(text.contains("# TYPE kyototycoon_serv_conn_count gauge\n"));
        assert!(text.contains("kyototycoon_db_count{path=\":\"} 1\n"));
        assert!(text.contains("kyototycoon_db_size{path=\":\"} 8388691\n"));
        assert!(text.contains("conf_kc_version=\"1.2.76 (16.13)\""));
        assert!(text.contains("repl_master_host=\"\""));
        assert!(!text.contains("sys_mem_rss"));
    }

    #[test]
    fn test_down_exposition() {
        let descriptors = MetricDescriptors::standard();
        let registry = build_registry(&Snapshot::down(), &descriptors).unwrap();
        assert_eq!(sample_count(&registry), 1);
        let text = encode(&registry).unwrap();
        assert!(text.contains("kyototycoon_up 0\n"));
        assert!(!text.contains("kyototycoon_info"));
    }

    #[test]
    fn test_duplicate_scalar_keeps_last_value() {
        let descriptors = MetricDescriptors::standard();
        let snap = assemble_snapshot("cnt_get\t1\ncnt_get\t5\n", &descriptors);
        let text = encode(&build_registry(&snap, &descriptors).unwrap()).unwrap();
        assert!(text.contains("kyototycoon_cnt_get 5\n"));
    }

    #[test]
    fn test_duplicate_db_path_keeps_last_value() {
        let descriptors = MetricDescriptors::standard();
        let snap = assemble_snapshot(
            "db_0\tcount=1 size=10 path=a.kch\ndb_1\tcount=7 size=70 path=a.kch\n",
            &descriptors,
        );
        assert_eq!(snap.databases().count(), 2);

        let registry = build_registry(&snap, &descriptors).unwrap();
        let text = encode(&registry).unwrap();
        assert!(text.contains("kyototycoon_db_count{path=\"a.kch\"} 7\n"));
        assert!(text.contains("kyototycoon_db_size{path=\"a.kch\"} 70\n"));
        assert!(!text.contains("kyototycoon_db_count{path=\"a.kch\"} 1\n"));
    }

    #[test]
    fn test_encode_snapshot_includes_build_info() {
        let descriptors = MetricDescriptors::standard();
        let text = encode_snapshot(&Snapshot::down(), &descriptors).unwrap();
        assert!(text.contains(BUILD_INFO_METRIC));
        assert!(text.contains(env!("CARGO_PKG_VERSION")));
    }
}
