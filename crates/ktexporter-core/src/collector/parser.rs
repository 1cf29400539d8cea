//! Parser for the `/rpc/report` body.
//!
//! The report is one `key<TAB>value` pair per line. Only the first TAB splits
//! a line; the value is kept verbatim and may contain spaces, `=` or further
//! TABs.

use tracing::warn;

/// Error type for parsing failures.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Parse error: {}", self.message)
    }
}

impl std::error::Error for ParseError {}

/// One `key<TAB>value` line of the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedEntry<'a> {
    pub key: &'a str,
    pub value: &'a str,
}

/// Parses a single non-empty report line.
pub fn parse_line(line: &str) -> Result<ParsedEntry<'_>, ParseError> {
    let (key, value) = line
        .split_once('\t')
        .ok_or_else(|| ParseError::new(format!("missing value in line {line:?}")))?;

    if key.is_empty() {
        return Err(ParseError::new(format!("empty key in line {line:?}")));
    }

    Ok(ParsedEntry { key, value })
}

/// Parses the whole report, in line order.
///
/// Empty lines are skipped silently. Malformed lines are logged and skipped.
pub fn parse_report(content: &str) -> Vec<ParsedEntry<'_>> {
    let mut entries = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        if line.is_empty() {
            continue;
        }

        match parse_line(line) {
            Ok(entry) => entries.push(entry),
            Err(e) => warn!(line = idx + 1, error = %e, "skipping malformed report line"),
        }
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line() {
        let entry = parse_line("cnt_get\t42").unwrap();
        assert_eq!(entry.key, "cnt_get");
        assert_eq!(entry.value, "42");
    }

    #[test]
    fn test_parse_line_splits_on_first_tab_only() {
        let entry = parse_line("conf_kc_version\t1.2.76 (16.13)\textra").unwrap();
        assert_eq!(entry.key, "conf_kc_version");
        assert_eq!(entry.value, "1.2.76 (16.13)\textra");
    }

    #[test]
    fn test_parse_line_keeps_empty_value() {
        let entry = parse_line("repl_master_host\t").unwrap();
        assert_eq!(entry.value, "");
    }

    #[test]
    fn test_parse_line_without_value() {
        assert!(parse_line("cnt_get").is_err());
        assert!(parse_line("\t12").is_err());
    }

    #[test]
    fn test_parse_report() {
        let content = "cnt_get\t1\ndb_0\tcount=1 size=8388691 path=:\n\nserv_conn_count\t1\n";
        let entries = parse_report(content);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].key, "cnt_get");
        assert_eq!(entries[1].value, "count=1 size=8388691 path=:");
        assert_eq!(entries[2].key, "serv_conn_count");
    }

    #[test]
    fn test_parse_report_skips_malformed_lines() {
        let content = "cnt_get\t1\ngarbage\ncnt_set\t2";
        let entries = parse_report(content);
        assert_eq!(
            entries,
            vec![
                ParsedEntry {
                    key: "cnt_get",
                    value: "1"
                },
                ParsedEntry {
                    key: "cnt_set",
                    value: "2"
                },
            ]
        );
    }

    #[test]
    fn test_parse_report_crlf() {
        let entries = parse_report("cnt_get\t1\r\ncnt_set\t2\r\n");
        assert_eq!(entries[0].value, "1");
        assert_eq!(entries[1].value, "2");
    }

    #[test]
    fn test_parse_report_empty() {
        assert!(parse_report("").is_empty());
        assert!(parse_report("\n\n").is_empty());
    }
}
