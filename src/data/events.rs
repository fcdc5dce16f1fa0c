use std::collections::BTreeMap;

use super::error::DataError;
use super::model::{check_sorted, Column, TimeSeries};
use super::time::TIMESTAMP_NS;

pub const LID_OPEN: &str = "lid_open";
pub const LID_CLOSE: &str = "lid_close";

// ---------------------------------------------------------------------------
// EventLog
// ---------------------------------------------------------------------------

/// One discrete event, e.g. `1614861060000000000,"Lid Opened",lid_open`.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub time: f64,
    /// Human-readable label.
    pub event: String,
    /// Key into a [`CategoryMap`].
    pub code: String,
    /// Absolute wall-clock stamp, when the table carried one.
    pub timestamp_ns: Option<i64>,
}

/// Events ordered by time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventLog {
    pub events: Vec<Event>,
}

impl EventLog {
    pub fn new(events: Vec<Event>) -> Self {
        EventLog { events }
    }

    /// Read events from a table with `event` and `code` text columns, and
    /// `timestamp_ns` when present.
    pub fn from_series(series: &TimeSeries) -> Result<Self, DataError> {
        let labels = series.text("event")?;
        let codes = series.text("code")?;
        let stamps = match series.column(TIMESTAMP_NS) {
            Ok(Column::Timestamp(v)) => Some(v.as_slice()),
            _ => None,
        };
        let events = series
            .time()
            .iter()
            .zip(labels)
            .zip(codes)
            .enumerate()
            .map(|(i, ((&time, event), code))| Event {
                time,
                event: event.clone(),
                code: code.clone(),
                timestamp_ns: stamps.map(|v| v[i]),
            })
            .collect();
        Ok(EventLog { events })
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn times(&self) -> Vec<f64> {
        self.events.iter().map(|e| e.time).collect()
    }

    /// Keep only events whose code is one of `codes`.
    pub fn filter_codes(&self, codes: &[&str]) -> EventLog {
        EventLog {
            events: self
                .events
                .iter()
                .filter(|e| codes.contains(&e.code.as_str()))
                .cloned()
                .collect(),
        }
    }

    pub fn validate_sorted(&self, label: &str) -> Result<(), DataError> {
        check_sorted(&self.times(), label)
    }
}

// ---------------------------------------------------------------------------
// CategoryMap
// ---------------------------------------------------------------------------

/// Numeric value of each event code, plus the code in force before the
/// first event.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryMap {
    values: BTreeMap<String, f64>,
    start: String,
}

impl CategoryMap {
    pub fn new(values: BTreeMap<String, f64>, start: impl Into<String>) -> Result<Self, DataError> {
        let start = start.into();
        if !values.contains_key(&start) {
            return Err(DataError::UnknownCategory(start));
        }
        Ok(CategoryMap { values, start })
    }

    /// `lid_close` → 0.0, `lid_open` → 1.0, starting closed.
    pub fn lid() -> Self {
        CategoryMap {
            values: BTreeMap::from([(LID_CLOSE.to_string(), 0.0), (LID_OPEN.to_string(), 1.0)]),
            start: LID_CLOSE.to_string(),
        }
    }

    pub fn get(&self, code: &str) -> Result<f64, DataError> {
        self.values
            .get(code)
            .copied()
            .ok_or_else(|| DataError::UnknownCategory(code.to_string()))
    }

    pub fn start_value(&self) -> f64 {
        // Checked on construction.
        self.values.get(&self.start).copied().unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Event → signal
// ---------------------------------------------------------------------------

/// Turn a sparse event log into a piecewise-constant signal sampled at
/// `reference`.
///
/// Each output value is the category of the latest event at or before the
/// reference time (an event at exactly `t` has already happened), or the
/// start value before the first event. Both inputs must be sorted; they
/// are walked once with two forward cursors.
pub fn to_signal(
    reference: &[f64],
    events: &EventLog,
    categories: &CategoryMap,
) -> Result<Vec<f64>, DataError> {
    check_sorted(reference, "reference time")?;
    events.validate_sorted("events")?;

    let mut last_value = categories.start_value();
    let mut next_event = events.events.iter().peekable();
    let mut signal = Vec::with_capacity(reference.len());

    for &t in reference {
        while let Some(event) = next_event.next_if(|e| e.time <= t) {
            last_value = categories.get(&event.code)?;
        }
        signal.push(last_value);
    }

    assert_eq!(signal.len(), reference.len());
    Ok(signal)
}
