//! Snapshot structures produced by one collection cycle.
//!
//! A snapshot is built fresh for every scrape and discarded once it has been
//! encoded. Nothing here is retained across cycles.

use std::collections::BTreeMap;

use serde::Serialize;

/// A direct numeric observation mapped from a known report key.
#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct ScalarObservation {
    /// Report key the value came from (e.g. `cnt_get`).
    pub key: String,
    /// Fully qualified metric name (e.g. `kyototycoon_cnt_get`).
    pub metric: String,
    pub value: f64,
}

/// Per-database statistics decoded from a `db_<N>` report entry.
#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct DbRecord {
    pub path: String,
    pub count: f64,
    pub size: f64,
}

/// Aggregated informational record, emitted once per successful cycle.
///
/// Holds every configured info field; fields missing from the report are
/// present with an empty value.
#[derive(Clone, Serialize, Debug, PartialEq, Default)]
pub struct InfoObservation {
    pub fields: BTreeMap<String, String>,
}

impl InfoObservation {
    /// Returns the raw value of an info field, if the field is configured.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }
}

/// An observation collected while walking the report, kept in line order.
#[derive(Clone, Serialize, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Sample {
    /// Source: scalar keys (`cnt_*`, `repl_*`, `serv_conn_count`, `serv_task_count`)
    Scalar(ScalarObservation),
    /// Source: `db_<N>` keys
    Database(DbRecord),
}

/// The full result of one collection cycle.
#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct Snapshot {
    /// Whether the report fetch succeeded.
    pub up: bool,

    /// Scalar and database observations in report line order.
    /// Always empty when `up` is false.
    pub samples: Vec<Sample>,

    /// Present exactly when `up` is true.
    pub info: Option<InfoObservation>,
}

/// A single emitted value, as seen by the monitoring system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Observation<'a> {
    Up(f64),
    Scalar(&'a ScalarObservation),
    DbCount { path: &'a str, value: f64 },
    DbSize { path: &'a str, value: f64 },
    Info(&'a InfoObservation),
}

impl Snapshot {
    /// Snapshot for a cycle whose fetch failed: liveness only.
    pub fn down() -> Self {
        Self {
            up: false,
            samples: Vec::new(),
            info: None,
        }
    }

    /// Iterates over scalar observations in line order.
    pub fn scalars(&self) -> impl Iterator<Item = &ScalarObservation> {
        self.samples.iter().filter_map(|s| match s {
            Sample::Scalar(obs) => Some(obs),
            Sample::Database(_) => None,
        })
    }

    /// Iterates over database records in line order.
    pub fn databases(&self) -> impl Iterator<Item = &DbRecord> {
        self.samples.iter().filter_map(|s| match s {
            Sample::Database(db) => Some(db),
            Sample::Scalar(_) => None,
        })
    }

    /// Flattens the snapshot into emission order: liveness first, then
    /// scalar and database values in line order, then the info record.
    pub fn observations(&self) -> Vec<Observation<'_>> {
        let mut out = Vec::with_capacity(self.samples.len() * 2 + 2);
        out.push(Observation::Up(if self.up { 1.0 } else { 0.0 }));

        for sample in &self.samples {
            match sample {
                Sample::Scalar(obs) => out.push(Observation::Scalar(obs)),
                Sample::Database(db) => {
                    out.push(Observation::DbCount {
                        path: &db.path,
                        value: db.count,
                    });
                    out.push(Observation::DbSize {
                        path: &db.path,
                        value: db.size,
                    });
                }
            }
        }

        if let Some(ref info) = self.info {
            out.push(Observation::Info(info));
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar(key: &str, value: f64) -> Sample {
        Sample::Scalar(ScalarObservation {
            key: key.to_string(),
            metric: format!("kyototycoon_{key}"),
            value,
        })
    }

    #[test]
    fn down_snapshot_emits_only_liveness() {
        let snap = Snapshot::down();
        assert_eq!(snap.observations(), vec![Observation::Up(0.0)]);
    }

    #[test]
    fn observations_follow_line_order_with_info_last() {
        let snap = Snapshot {
            up: true,
            samples: vec![
                scalar("cnt_get", 3.0),
                Sample::Database(DbRecord {
                    path: "casket.kch".to_string(),
                    count: 10.0,
                    size: 4096.0,
                }),
                scalar("serv_conn_count", 1.0),
            ],
            info: Some(InfoObservation::default()),
        };

        let obs = snap.observations();
        assert_eq!(obs.len(), 6);
        assert_eq!(obs[0], Observation::Up(1.0));
        assert!(matches!(obs[1], Observation::Scalar(s) if s.key == "cnt_get"));
        assert_eq!(
            obs[2],
            Observation::DbCount {
                path: "casket.kch",
                value: 10.0
            }
        );
        assert_eq!(
            obs[3],
            Observation::DbSize {
                path: "casket.kch",
                value: 4096.0
            }
        );
        assert!(matches!(obs[4], Observation::Scalar(s) if s.key == "serv_conn_count"));
        assert!(matches!(obs[5], Observation::Info(_)));
    }

    #[test]
    fn scalars_and_databases_split_samples() {
        let snap = Snapshot {
            up: true,
            samples: vec![
                scalar("cnt_set", 1.0),
                Sample::Database(DbRecord {
                    path: ":".to_string(),
                    count: 0.0,
                    size: 0.0,
                }),
            ],
            info: None,
        };
        assert_eq!(snap.scalars().count(), 1);
        assert_eq!(snap.databases().count(), 1);
    }
}
