//! Parsers for `/proc` filesystem files.
//!
//! These are pure functions over file contents. Each returns an explicit
//! `Result` so the sweep can drop a single malformed entry and keep going.

use std::collections::HashMap;
use std::str::FromStr;

/// Error type for parsing failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("parse error: {message}")]
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

/// Parses `/proc/uptime`: the first token is seconds since boot.
pub fn parse_uptime(content: &str) -> Result<f64, ParseError> {
    let first = content
        .split_whitespace()
        .next()
        .ok_or_else(|| ParseError::new("empty uptime"))?;
    first
        .parse()
        .map_err(|_| ParseError::new(format!("invalid uptime '{}'", first)))
}

/// Parses a `"<n> kB"` value as found in `/proc/meminfo` and `/proc/[pid]/status`.
pub fn parse_kb_value(value: &str) -> Result<u64, ParseError> {
    let number = value
        .trim()
        .strip_suffix("kB")
        .ok_or_else(|| ParseError::new(format!("expected '<n> kB', got '{}'", value)))?;
    number
        .trim()
        .parse()
        .map_err(|_| ParseError::new(format!("invalid kB value '{}'", value)))
}

/// Parses a file of `key: value` lines into a map.
///
/// Keys and values are trimmed; lines without a colon are ignored. A repeated
/// key keeps its last value.
pub fn parse_dictionary(content: &str) -> HashMap<String, String> {
    content
        .lines()
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect()
}

/// Looks up `key` in a parsed dictionary and converts it.
///
/// `Ok(None)` when the key is absent, `Err` when present but not a `T`.
pub fn parse_field<T: FromStr>(
    fields: &HashMap<String, String>,
    key: &str,
) -> Result<Option<T>, ParseError> {
    match fields.get(key) {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| ParseError::new(format!("invalid {} '{}'", key, raw))),
    }
}

/// Counters from one `cpu`/`cpuN` row of `/proc/stat`.
#[derive(Debug, Clone, PartialEq)]
pub struct CpuTimes {
    pub id: String,
    /// Fourth numeric column.
    pub idle: u64,
    /// Sum of the first seven numeric columns
    /// (user, nice, system, idle, iowait, irq, softirq).
    pub total: u64,
}

/// Parses one `cpu` row. Needs the id plus at least seven numeric columns.
pub fn parse_cpu_line(line: &str) -> Result<CpuTimes, ParseError> {
    let columns: Vec<&str> = line.split_whitespace().collect();
    if columns.len() < 8 {
        return Err(ParseError::new(format!(
            "unexpected columns: expected 8+, got {} in '{}'",
            columns.len(),
            line
        )));
    }

    let mut values = [0u64; 7];
    for (slot, raw) in values.iter_mut().zip(&columns[1..8]) {
        *slot = raw
            .parse()
            .map_err(|_| ParseError::new(format!("invalid jiffies '{}' in '{}'", raw, line)))?;
    }

    Ok(CpuTimes {
        id: columns[0].to_string(),
        idle: values[3],
        total: values.iter().fold(0u64, |acc, v| acc.saturating_add(*v)),
    })
}

/// Parses the leading `cpu*` rows of `/proc/stat`, one result per row.
///
/// Stops at the first row that is not a CPU row.
pub fn parse_cpu_lines(content: &str) -> Vec<Result<CpuTimes, ParseError>> {
    content
        .lines()
        .take_while(|line| line.starts_with("cpu"))
        .map(parse_cpu_line)
        .collect()
}

/// Scheduling counters from `/proc/[pid]/stat`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProcStatTimes {
    pub utime: u64,
    pub stime: u64,
}

/// Extracts utime (field 14) and stime (field 15) from `/proc/[pid]/stat`.
///
/// The comm field can contain spaces and parentheses, so fields are counted
/// from the last `)`.
pub fn parse_proc_stat_times(content: &str) -> Result<ProcStatTimes, ParseError> {
    let content = content.trim();
    let close_paren = content
        .rfind(')')
        .ok_or_else(|| ParseError::new("missing ')' in stat"))?;

    // Field 3 (state) is the first one after the comm.
    let fields: Vec<&str> = content[close_paren + 1..].split_whitespace().collect();
    let field = |number: usize, name: &str| -> Result<u64, ParseError> {
        fields
            .get(number - 3)
            .ok_or_else(|| ParseError::new(format!("missing field {}", name)))?
            .parse()
            .map_err(|_| ParseError::new(format!("invalid {}", name)))
    };

    Ok(ProcStatTimes {
        utime: field(14, "utime")?,
        stime: field(15, "stime")?,
    })
}

/// Reduces `/proc/[pid]/cmdline` to a single token.
///
/// Arguments are NUL-separated; the result is everything up to the first
/// separator or whitespace, i.e. the program as it was invoked.
pub fn parse_cmdline(content: &str) -> String {
    content
        .replace('\0', " ")
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_string()
}
