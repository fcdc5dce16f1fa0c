use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::DataError;
use super::model::{Column, TimeSeries};

/// Name of the derived wall-clock column.
pub const TIMESTAMP_NS: &str = "timestamp_ns";

/// Unit of a raw time axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimeUnit {
    #[default]
    #[serde(rename = "s")]
    Seconds,
    #[serde(rename = "ms")]
    Milliseconds,
    #[serde(rename = "us")]
    Microseconds,
    #[serde(rename = "ns")]
    Nanoseconds,
}

impl TimeUnit {
    pub const ALL: [TimeUnit; 4] = [
        TimeUnit::Seconds,
        TimeUnit::Milliseconds,
        TimeUnit::Microseconds,
        TimeUnit::Nanoseconds,
    ];

    pub fn nanos_per_unit(self) -> f64 {
        match self {
            TimeUnit::Seconds => 1e9,
            TimeUnit::Milliseconds => 1e6,
            TimeUnit::Microseconds => 1e3,
            TimeUnit::Nanoseconds => 1.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TimeUnit::Seconds => "s",
            TimeUnit::Milliseconds => "ms",
            TimeUnit::Microseconds => "us",
            TimeUnit::Nanoseconds => "ns",
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeUnit {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimeUnit::ALL
            .into_iter()
            .find(|u| u.as_str() == s)
            .ok_or_else(|| DataError::UnsupportedUnit(s.to_string()))
    }
}

pub fn from_ns_to_s(time_ns: f64) -> f64 {
    time_ns / 1e9
}

/// Add the absolute `timestamp_ns` column computed from the raw time axis.
///
/// Must run before [`normalize`], which discards the absolute offset.
/// Fails when a stamp does not fit in `i64` nanoseconds, which usually
/// means `unit` does not match the data.
pub fn with_timestamp_ns(series: TimeSeries, unit: TimeUnit) -> Result<TimeSeries, DataError> {
    let factor = unit.nanos_per_unit();
    let stamps = series
        .time()
        .iter()
        .enumerate()
        .map(|(row, &t)| {
            let ns = (t * factor).round();
            // 2^63 itself is out of range.
            if ns.is_finite() && ns >= i64::MIN as f64 && ns < i64::MAX as f64 {
                Ok(ns as i64)
            } else {
                Err(DataError::InvalidValue {
                    column: TIMESTAMP_NS.to_string(),
                    row,
                    value: format!("{t} {unit}"),
                })
            }
        })
        .collect::<Result<Vec<_>, _>>()?;
    series.with_column(TIMESTAMP_NS, Column::Timestamp(stamps))
}

/// Shift the time axis so the first row is at zero.
pub fn normalize(series: TimeSeries) -> TimeSeries {
    let Some(&origin) = series.time().first() else {
        return series;
    };
    let shifted = series.time().iter().map(|&t| t - origin).collect();
    series.with_time(shifted)
}

/// Express the time axis in seconds. A no-op for [`TimeUnit::Seconds`].
pub fn to_seconds(series: TimeSeries, unit: TimeUnit) -> TimeSeries {
    match unit {
        TimeUnit::Seconds => series,
        TimeUnit::Nanoseconds => {
            let converted = series.time().iter().map(|&t| from_ns_to_s(t)).collect();
            series.with_time(converted)
        }
        other => {
            let per_second = 1e9 / other.nanos_per_unit();
            let converted = series.time().iter().map(|&t| t / per_second).collect();
            series.with_time(converted)
        }
    }
}
