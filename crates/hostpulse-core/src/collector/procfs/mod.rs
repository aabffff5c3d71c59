//! Readers for the Linux `/proc` filesystem.
//!
//! `parser` holds the pure text parsers; `system` and `process` locate the
//! files under a configurable root and turn parser output into snapshots.

pub mod parser;
pub mod process;
pub mod system;

pub use parser::ParseError;
pub use process::ProcessCollector;
pub use system::SystemCollector;

/// Error type for collection failures.
#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    /// Process disappeared during collection.
    #[error("process {0} disappeared")]
    ProcessGone(i32),
    /// A whole file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    /// A whole file could not be understood.
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// A value read from one file, plus the fields that failed to parse.
///
/// Fields listed in `issues` were left at their defaults in `value`.
#[derive(Debug, Clone, Default)]
pub struct Reading<T> {
    pub value: T,
    pub issues: Vec<ParseError>,
}

impl<T> Reading<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            issues: Vec::new(),
        }
    }

    /// Keeps the parsed value, or records the failure and returns `None`.
    pub(crate) fn check<V>(&mut self, result: Result<V, ParseError>) -> Option<V> {
        match result {
            Ok(v) => Some(v),
            Err(e) => {
                self.issues.push(e);
                None
            }
        }
    }
}
