use std::fmt;
use std::ops::Range;

use super::error::DataError;

/// Name of the time axis every timestamped table carries.
pub const TIME: &str = "time";

// ---------------------------------------------------------------------------
// Value – a single cell
// ---------------------------------------------------------------------------

/// A dynamically-typed cell as read from a text source.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl Value {
    /// Guess the type of a raw text cell.
    ///
    /// Both Python (`True`) and lowercase (`true`) spellings are booleans.
    pub fn parse(s: &str) -> Value {
        let s = s.trim();
        if s.is_empty() {
            return Value::Null;
        }
        if let Ok(i) = s.parse::<i64>() {
            return Value::Integer(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            return Value::Float(f);
        }
        match s {
            "true" | "True" | "TRUE" => Value::Bool(true),
            "false" | "False" | "FALSE" => Value::Bool(false),
            _ => Value::String(s.to_string()),
        }
    }

    /// Interpret the value as an `f64`; `Null` is NaN.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Integer(i) => Some(*i as f64),
            Value::Null => Some(f64::NAN),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{s}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Null => write!(f, "<null>"),
        }
    }
}

// ---------------------------------------------------------------------------
// Column – one typed column of a TimeSeries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Numeric(Vec<f64>),
    Boolean(Vec<bool>),
    Text(Vec<String>),
    /// Absolute wall-clock time in nanoseconds since the Unix epoch.
    Timestamp(Vec<i64>),
}

impl Column {
    /// Build a column from parsed cells, choosing the narrowest type that
    /// holds every cell: boolean, then numeric (`Null` → NaN), then text.
    pub fn from_values(values: Vec<Value>) -> Column {
        let all_bool = !values.is_empty() && values.iter().all(|v| matches!(v, Value::Bool(_)));
        if all_bool {
            return Column::Boolean(values.iter().map(|v| matches!(v, Value::Bool(true))).collect());
        }
        let numeric: Option<Vec<f64>> = values.iter().map(Value::as_f64).collect();
        match numeric {
            Some(nums) => Column::Numeric(nums),
            None => Column::Text(
                values
                    .into_iter()
                    .map(|v| match v {
                        Value::String(s) => s,
                        Value::Null => String::new(),
                        other => other.to_string(),
                    })
                    .collect(),
            ),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Column::Numeric(v) => v.len(),
            Column::Boolean(v) => v.len(),
            Column::Text(v) => v.len(),
            Column::Timestamp(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Column::Numeric(_) => "numeric",
            Column::Boolean(_) => "boolean",
            Column::Text(_) => "text",
            Column::Timestamp(_) => "timestamp",
        }
    }

    /// Plottable view of the column: booleans are 0/1, timestamps are
    /// seconds since the epoch. `None` for text.
    pub fn to_f64(&self) -> Option<Vec<f64>> {
        match self {
            Column::Numeric(v) => Some(v.clone()),
            Column::Boolean(v) => Some(v.iter().map(|&b| if b { 1.0 } else { 0.0 }).collect()),
            Column::Timestamp(v) => Some(v.iter().map(|&ns| ns as f64 / 1e9).collect()),
            Column::Text(_) => None,
        }
    }

    fn slice(&self, range: Range<usize>) -> Column {
        match self {
            Column::Numeric(v) => Column::Numeric(v[range].to_vec()),
            Column::Boolean(v) => Column::Boolean(v[range].to_vec()),
            Column::Text(v) => Column::Text(v[range].to_vec()),
            Column::Timestamp(v) => Column::Timestamp(v[range].to_vec()),
        }
    }
}

// ---------------------------------------------------------------------------
// TimeSeries – a timestamped table
// ---------------------------------------------------------------------------

/// A table of rows ordered by a numeric `time` axis.
///
/// Every column has exactly as many rows as the time axis. Sortedness is
/// not enforced on construction; operations that depend on it call
/// [`TimeSeries::validate_sorted`].
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    time: Vec<f64>,
    columns: Vec<(String, Column)>,
}

impl TimeSeries {
    pub fn new(time: Vec<f64>, columns: Vec<(String, Column)>) -> Result<Self, DataError> {
        let mut series = TimeSeries {
            time,
            columns: Vec::with_capacity(columns.len()),
        };
        for (name, column) in columns {
            series = series.with_column(name, column)?;
        }
        Ok(series)
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn time(&self) -> &[f64] {
        &self.time
    }

    /// Column names in table order, starting with `time`.
    pub fn column_names(&self) -> Vec<&str> {
        std::iter::once(TIME)
            .chain(self.columns.iter().map(|(n, _)| n.as_str()))
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        name == TIME || self.columns.iter().any(|(n, _)| n == name)
    }

    pub fn column(&self, name: &str) -> Result<&Column, DataError> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c)
            .ok_or_else(|| DataError::MissingColumn(name.to_string()))
    }

    /// A numeric column. `time` resolves to the time axis.
    pub fn numeric(&self, name: &str) -> Result<&[f64], DataError> {
        if name == TIME {
            return Ok(&self.time);
        }
        match self.column(name)? {
            Column::Numeric(v) => Ok(v),
            other => Err(type_error(name, "numeric", other)),
        }
    }

    /// A flag column. Numeric columns are accepted as 0/1 (non-zero is true).
    pub fn flags(&self, name: &str) -> Result<Vec<bool>, DataError> {
        match self.column(name)? {
            Column::Boolean(v) => Ok(v.clone()),
            Column::Numeric(v) => Ok(v.iter().map(|&x| x != 0.0 && !x.is_nan()).collect()),
            other => Err(type_error(name, "boolean", other)),
        }
    }

    pub fn text(&self, name: &str) -> Result<&[String], DataError> {
        match self.column(name)? {
            Column::Text(v) => Ok(v),
            other => Err(type_error(name, "text", other)),
        }
    }

    /// Append `column`, replacing an existing column of the same name.
    pub fn with_column(mut self, name: impl Into<String>, column: Column) -> Result<Self, DataError> {
        let name = name.into();
        if column.len() != self.time.len() {
            return Err(DataError::ColumnLength {
                column: name,
                expected: self.time.len(),
                found: column.len(),
            });
        }
        match self.columns.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = column,
            None => self.columns.push((name, column)),
        }
        Ok(self)
    }

    /// Replace the time axis, keeping all columns.
    pub(crate) fn with_time(mut self, time: Vec<f64>) -> Self {
        debug_assert_eq!(time.len(), self.time.len());
        self.time = time;
        self
    }

    /// Rows `range` as a new series.
    pub fn slice(&self, range: Range<usize>) -> TimeSeries {
        TimeSeries {
            time: self.time[range.clone()].to_vec(),
            columns: self
                .columns
                .iter()
                .map(|(n, c)| (n.clone(), c.slice(range.clone())))
                .collect(),
        }
    }

    /// Fail unless the time axis is sorted ascending.
    pub fn validate_sorted(&self, label: &str) -> Result<(), DataError> {
        check_sorted(&self.time, label)
    }
}

/// Fail with [`DataError::Unsorted`] at the first descending pair (or NaN).
pub fn check_sorted(values: &[f64], label: &str) -> Result<(), DataError> {
    for (row, pair) in values.windows(2).enumerate() {
        if !(pair[0] <= pair[1]) {
            return Err(DataError::Unsorted {
                series: label.to_string(),
                row: row + 1,
                prev: pair[0],
                next: pair[1],
            });
        }
    }
    Ok(())
}

fn type_error(name: &str, expected: &'static str, found: &Column) -> DataError {
    DataError::ColumnType {
        column: name.to_string(),
        expected,
        found: found.type_name(),
    }
}
