//! Decoder for per-database report values.
//!
//! Format: `count=<N> size=<M> path=<P>`, e.g. `count=1 size=8388691 path=:`.
//! The path is the last sub-field and keeps any embedded spaces. Runs of
//! spaces between the sub-fields are treated as one separator.

use tracing::warn;

use super::parser::ParseError;
use crate::model::DbRecord;

/// Returns true for keys of the form `db_<digits>`.
pub fn is_db_key(key: &str) -> bool {
    key.strip_prefix("db_")
        .is_some_and(|idx| !idx.is_empty() && idx.bytes().all(|b| b.is_ascii_digit()))
}

/// Decodes a `db_<N>` value into a `DbRecord`.
///
/// Structural problems (missing sub-field, missing `=`, unknown name) are
/// errors. A non-numeric count or size is logged and read as 0.
pub fn parse_db_record(value: &str) -> Result<DbRecord, ParseError> {
    let parts = split_sub_fields(value);
    if parts.len() < 3 {
        return Err(ParseError::new(format!(
            "expected 3 sub-fields in db value, got {}",
            parts.len()
        )));
    }

    let mut count = None;
    let mut size = None;
    let mut path = None;

    for part in parts {
        let (name, raw) = part
            .split_once('=')
            .ok_or_else(|| ParseError::new(format!("missing '=' in db sub-field {part:?}")))?;

        match name {
            "count" => count = Some(parse_number("count", raw)),
            "size" => size = Some(parse_number("size", raw)),
            "path" => path = Some(raw.to_string()),
            _ => {
                return Err(ParseError::new(format!(
                    "unknown db sub-field {name:?}"
                )));
            }
        }
    }

    Ok(DbRecord {
        count: count.ok_or_else(|| ParseError::new("missing count in db value"))?,
        size: size.ok_or_else(|| ParseError::new("missing size in db value"))?,
        path: path.ok_or_else(|| ParseError::new("missing path in db value"))?,
    })
}

/// Splits off the first two space-separated sub-fields; the remainder
/// (without its leading spaces) is the third.
fn split_sub_fields(value: &str) -> Vec<&str> {
    let mut parts = Vec::with_capacity(3);
    let mut rest = value;
    while parts.len() < 2 {
        let trimmed = rest.trim_start_matches(' ');
        match trimmed.split_once(' ') {
            Some((field, tail)) => {
                parts.push(field);
                rest = tail;
            }
            None => {
                rest = trimmed;
                break;
            }
        }
    }

    let last = rest.trim_start_matches(' ');
    if !last.is_empty() {
        parts.push(last);
    }
    parts
}

fn parse_number(field: &str, raw: &str) -> f64 {
    raw.parse().unwrap_or_else(|_| {
        warn!(field, value = raw, "non-numeric db value, using 0");
        0.0
    })
}
