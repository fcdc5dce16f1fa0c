use thiserror::Error;

/// Broad class of a [`DataError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or missing input, unsorted timestamps, conflicting options.
    Input,
    /// An event code with no entry in the category map.
    Lookup,
}

/// Validation failures raised by the time-series operations.
///
/// Each operation checks its preconditions up front and fails fast; nothing
/// is retried or repaired internally.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    #[error("missing required column '{0}'")]
    MissingColumn(String),

    #[error("column '{column}' has type {found}, expected {expected}")]
    ColumnType {
        column: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("column '{column}' has {found} rows, expected {expected}")]
    ColumnLength {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("timestamps of {series} are not sorted ascending (row {row}: {prev} > {next})")]
    Unsorted {
        series: String,
        row: usize,
        prev: f64,
        next: f64,
    },

    #[error("invalid time window [{start}, {end}]")]
    InvalidWindow { start: f64, end: f64 },

    #[error("unsupported time unit '{0}' (expected s, ms, us or ns)")]
    UnsupportedUnit(String),

    #[error("time normalization cannot be combined with event alignment")]
    NormalizeWithEvents,

    #[error("invalid value '{value}' in column '{column}' at row {row}")]
    InvalidValue {
        column: String,
        row: usize,
        value: String,
    },

    #[error("event code '{0}' is not in the category map")]
    UnknownCategory(String),
}

impl DataError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DataError::UnknownCategory(_) => ErrorKind::Lookup,
            _ => ErrorKind::Input,
        }
    }
}
