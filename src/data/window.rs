use super::error::DataError;
use super::model::TimeSeries;

/// A closed interval `[start, end]` on a series' time axis.
///
/// Either bound may be infinite; [`TimeWindow::unbounded`] keeps every row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    pub start: f64,
    pub end: f64,
}

impl TimeWindow {
    pub fn new(start: f64, end: f64) -> Result<Self, DataError> {
        if start.is_nan() || end.is_nan() || start > end {
            return Err(DataError::InvalidWindow { start, end });
        }
        Ok(TimeWindow { start, end })
    }

    pub fn unbounded() -> Self {
        TimeWindow {
            start: f64::NEG_INFINITY,
            end: f64::INFINITY,
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.start == f64::NEG_INFINITY && self.end == f64::INFINITY
    }

    pub fn contains(&self, t: f64) -> bool {
        self.start <= t && t <= self.end
    }
}

impl Default for TimeWindow {
    fn default() -> Self {
        TimeWindow::unbounded()
    }
}

/// Trim `series` to the rows whose time lies inside `window`.
///
/// Returns `Ok(None)` (and logs a warning) when no row falls inside the
/// window. The scan is linear from both ends and relies on the time axis
/// being sorted, which is checked first.
pub fn trim(series: &TimeSeries, window: &TimeWindow) -> Result<Option<TimeSeries>, DataError> {
    series.validate_sorted("series")?;

    let time = series.time();

    let mut start = 0;
    while start < time.len() && time[start] < window.start {
        start += 1;
    }

    // `end` is exclusive.
    let mut end = time.len();
    while end > start && time[end - 1] > window.end {
        end -= 1;
    }

    log::debug!("trim to [{}, {}]: rows {start}..{end} of {}", window.start, window.end, time.len());

    if end <= start {
        log::warn!(
            "after trimming to [{}, {}] ended up with start_idx={start} and end_idx={end}; no data left",
            window.start,
            window.end
        );
        return Ok(None);
    }

    if start == 0 && end == time.len() {
        return Ok(Some(series.clone()));
    }
    Ok(Some(series.slice(start..end)))
}
