//! Metric descriptor table and key classification.
//!
//! `MetricDescriptors` is built once at startup and shared read-only by
//! every collection cycle. It decides what happens to each report key.

use std::collections::HashMap;

use serde::Serialize;

use super::db_record::is_db_key;

/// Metric namespace used for every Kyoto Tycoon metric.
pub const NAMESPACE: &str = "kyototycoon";

/// Prometheus metric type of a scalar descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Counter,
    Gauge,
}

/// Describes how a scalar report key is exported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalarDescriptor {
    pub metric: String,
    pub help: String,
    pub kind: MetricKind,
}

/// What a known key feeds into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyTarget {
    Scalar(ScalarDescriptor),
    /// Stored verbatim under the given info field name.
    Info(String),
}

/// Classification result for a single report key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition<'a> {
    Scalar(&'a ScalarDescriptor),
    Info(&'a str),
    Database,
    Ignored,
}

/// Scalar keys: (report key, help text, kind).
const SCALAR_KEYS: &[(&str, &str, MetricKind)] = &[
    ("cnt_get", "Number of get requests.", MetricKind::Counter),
    ("cnt_get_misses", "Number of get requests that missed.", MetricKind::Counter),
    ("cnt_set", "Number of set requests.", MetricKind::Counter),
    ("cnt_set_misses", "Number of set requests that failed.", MetricKind::Counter),
    ("cnt_remove", "Number of remove requests.", MetricKind::Counter),
    ("cnt_remove_misses", "Number of remove requests that missed.", MetricKind::Counter),
    ("cnt_script", "Number of script calls.", MetricKind::Counter),
    ("cnt_misc", "Number of miscellaneous requests.", MetricKind::Counter),
    ("repl_delay", "Replication delay in seconds.", MetricKind::Gauge),
    ("repl_interval", "Replication interval in seconds.", MetricKind::Gauge),
    ("serv_conn_count", "Number of current connections.", MetricKind::Gauge),
    ("serv_task_count", "Number of queued tasks.", MetricKind::Gauge),
];

/// Info fields, in label order. Each field is read from the report key of the same name.
const INFO_FIELDS: &[&str] = &[
    "conf_kc_features",
    "conf_kc_version",
    "conf_kt_features",
    "conf_kt_version",
    "serv_thread_count",
    "repl_master_host",
    "repl_master_port",
];

/// Key-to-descriptor table used by the classifier.
#[derive(Debug, Clone)]
pub struct MetricDescriptors {
    namespace: String,
    keys: HashMap<String, KeyTarget>,
    info_fields: Vec<String>,
}

impl Default for MetricDescriptors {
    fn default() -> Self {
        Self::standard()
    }
}

impl MetricDescriptors {
    /// The descriptor table for the Kyoto Tycoon report.
    pub fn standard() -> Self {
        let mut keys = HashMap::with_capacity(SCALAR_KEYS.len() + INFO_FIELDS.len());

        for &(key, help, kind) in SCALAR_KEYS {
            keys.insert(
                key.to_string(),
                KeyTarget::Scalar(ScalarDescriptor {
                    metric: format!("{NAMESPACE}_{key}"),
                    help: help.to_string(),
                    kind,
                }),
            );
        }

        for &field in INFO_FIELDS {
            keys.insert(field.to_string(), KeyTarget::Info(field.to_string()));
        }

        Self {
            namespace: NAMESPACE.to_string(),
            keys,
            info_fields: INFO_FIELDS.iter().map(|f| f.to_string()).collect(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Fully qualified name for a metric in this namespace.
    pub fn metric_name(&self, name: &str) -> String {
        format!("{}_{}", self.namespace, name)
    }

    /// Info field names, in label order.
    pub fn info_fields(&self) -> &[String] {
        &self.info_fields
    }

    /// Looks up the scalar descriptor for a report key.
    pub fn scalar(&self, key: &str) -> Option<&ScalarDescriptor> {
        match self.keys.get(key) {
            Some(KeyTarget::Scalar(desc)) => Some(desc),
            _ => None,
        }
    }

    /// Iterates over all scalar descriptors as (report key, descriptor).
    pub fn scalars(&self) -> impl Iterator<Item = (&str, &ScalarDescriptor)> {
        self.keys.iter().filter_map(|(key, target)| match target {
            KeyTarget::Scalar(desc) => Some((key.as_str(), desc)),
            KeyTarget::Info(_) => None,
        })
    }

    /// Decides what to do with a report key.
    pub fn classify(&self, key: &str) -> Disposition<'_> {
        match self.keys.get(key) {
            Some(KeyTarget::Scalar(desc)) => Disposition::Scalar(desc),
            Some(KeyTarget::Info(field)) => Disposition::Info(field),
            None if is_db_key(key) => Disposition::Database,
            None => Disposition::Ignored,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_table() {
        let descriptors = MetricDescriptors::standard();

        let cases: &[(&str, &str)] = &[
            ("cnt_get", "scalar"),
            ("cnt_misc", "scalar"),
            ("repl_delay", "scalar"),
            ("serv_task_count", "scalar"),
            ("conf_kc_version", "info"),
            ("repl_master_port", "info"),
            ("serv_thread_count", "info"),
            ("db_0", "db"),
            ("db_42", "db"),
            ("db_total_count", "ignored"),
            ("db_total_size", "ignored"),
            ("sys_mem_rss", "ignored"),
            ("serv_proc_id", "ignored"),
            ("", "ignored"),
        ];

        for &(key, expected) in cases {
            let got = match descriptors.classify(key) {
                Disposition::Scalar(_) => "scalar",
                Disposition::Info(_) => "info",
                Disposition::Database => "db",
                Disposition::Ignored => "ignored",
            };
            assert_eq!(got, expected, "key {key:?}");
        }
    }

    #[test]
    fn test_scalar_descriptor() {
        let descriptors = MetricDescriptors::standard();
        let desc = descriptors.scalar("cnt_get_misses").unwrap();
        assert_eq!(desc.metric, "kyototycoon_cnt_get_misses");
        assert_eq!(desc.kind, MetricKind::Counter);

        let desc = descriptors.scalar("serv_conn_count").unwrap();
        assert_eq!(desc.kind, MetricKind::Gauge);

        assert!(descriptors.scalar("conf_kt_version").is_none());
    }

    #[test]
    fn test_info_fields_order() {
        let descriptors = MetricDescriptors::standard();
        assert_eq!(descriptors.info_fields().len(), 7);
        assert_eq!(descriptors.info_fields()[0], "conf_kc_features");
        assert_eq!(descriptors.info_fields()[6], "repl_master_port");
    }

    #[test]
    fn test_no_scalar_key_looks_like_db_key() {
        let descriptors = MetricDescriptors::standard();
        assert_eq!(descriptors.scalars().count(), 12);
        assert!(descriptors.scalars().all(|(key, _)| !is_db_key(key)));
    }

    #[test]
    fn test_metric_name() {
        let descriptors = MetricDescriptors::standard();
        assert_eq!(descriptors.metric_name("up"), "kyototycoon_up");
    }
}
