use std::path::Path;

use anyhow::{Context, Result};

use super::derive::{derive_data, HeaterSpec};
use super::error::DataError;
use super::events::EventLog;
use super::loader::load_file;
use super::model::TimeSeries;
use super::time::{normalize, to_seconds, with_timestamp_ns, TimeUnit};
use super::window::{trim, TimeWindow};

/// How a timestamped file is trimmed and re-based on load.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadOptions {
    pub window: TimeWindow,
    /// Unit of the raw `time` column (and of `window`).
    pub time_unit: TimeUnit,
    /// Shift time so the first row is at zero.
    pub normalize_time: bool,
    /// Express time in seconds after loading.
    pub convert_to_seconds: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions {
            window: TimeWindow::unbounded(),
            time_unit: TimeUnit::Seconds,
            normalize_time: true,
            convert_to_seconds: false,
        }
    }
}

/// A derived incubator series and the events it was aligned with.
#[derive(Debug, Clone)]
pub struct IncubatorData {
    pub data: TimeSeries,
    pub events: Option<EventLog>,
}

/// Trim, stamp, normalize and convert an in-memory table.
///
/// `Ok(None)` when the window leaves no rows.
pub fn prepare(table: &TimeSeries, options: &LoadOptions) -> Result<Option<TimeSeries>, DataError> {
    let Some(series) = trim(table, &options.window)? else {
        return Ok(None);
    };

    let mut series = with_timestamp_ns(series, options.time_unit)?;
    if options.normalize_time {
        series = normalize(series);
    }
    if options.convert_to_seconds {
        series = to_seconds(series, options.time_unit);
    }
    Ok(Some(series))
}

/// Load a timestamped file and [`prepare`] it.
pub fn load_timestamped(path: &Path, options: &LoadOptions) -> Result<Option<TimeSeries>> {
    let table = load_file(path)?;
    let series = prepare(&table, options).with_context(|| format!("preparing {}", path.display()))?;
    Ok(series)
}

/// Load an incubator log, optionally with its event log, and derive the
/// physical quantities.
///
/// Events are loaded with the same options as the data so both share a
/// time base, which is why normalization and events are mutually
/// exclusive. Returns `Ok(None)` when the data window is empty; an empty
/// event window just means no events.
pub fn load_data(
    data_path: &Path,
    heater: &HeaterSpec,
    events_path: Option<&Path>,
    options: &LoadOptions,
) -> Result<Option<IncubatorData>> {
    if events_path.is_some() && options.normalize_time {
        return Err(DataError::NormalizeWithEvents.into());
    }

    let Some(data) = load_timestamped(data_path, options)? else {
        return Ok(None);
    };

    let events = match events_path {
        Some(path) => {
            let table = load_timestamped(path, options)?;
            let log = match table {
                Some(table) => EventLog::from_series(&table)
                    .with_context(|| format!("reading events from {}", path.display()))?,
                None => EventLog::default(),
            };
            log::info!("Loaded {} events from {}", log.len(), path.display());
            Some(log)
        }
        None => None,
    };

    let data = derive_data(data, heater, events.as_ref()).context("deriving incubator data")?;
    Ok(Some(IncubatorData { data, events }))
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::path::PathBuf;

    use super::*;
    use crate::data::derive::{LID_OPEN_SIGNAL, POWER_IN};
    use crate::data::error::ErrorKind;
    use crate::data::model::Column;
    use crate::data::time::TIMESTAMP_NS;

    fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    const DATA: &str = "time,t1,t2,t3,heater_on,fan_on\n\
        1000000000,20.0,24.0,26.0,True,True\n\
        2000000000,20.0,25.0,27.0,True,True\n\
        3000000000,20.0,26.0,28.0,False,True\n\
        4000000000,20.0,25.0,27.0,False,True\n";

    const EVENTS: &str = "time,event,code\n\
        2000000000,\"Lid Opened\",lid_open\n\
        2500000000,\"Operator note\",note\n\
        4000000000,\"Lid Closed\",lid_close\n";

    #[test]
    fn normalize_with_events_is_rejected_before_loading() {
        let options = LoadOptions::default();
        assert!(options.normalize_time);
        let err = load_data(
            Path::new("does/not/exist.csv"),
            &HeaterSpec::default(),
            Some(Path::new("events.csv")),
            &options,
        )
        .unwrap_err();
        let data_err = err.downcast_ref::<DataError>().unwrap();
        assert_eq!(data_err, &DataError::NormalizeWithEvents);
        assert_eq!(data_err.kind(), ErrorKind::Input);
    }

    #[test]
    fn prepare_normalizes_and_converts() {
        let table = TimeSeries::new(
            vec![100.0, 150.0, 200.0],
            vec![("t1".into(), Column::Numeric(vec![1.0, 2.0, 3.0]))],
        )
        .unwrap();
        let out = prepare(&table, &LoadOptions::default()).unwrap().unwrap();
        assert_eq!(out.time(), &[0.0, 50.0, 100.0]);
        assert!(out.has_column(TIMESTAMP_NS));

        let options = LoadOptions {
            window: TimeWindow::new(120.0, 200.0).unwrap(),
            time_unit: TimeUnit::Milliseconds,
            normalize_time: false,
            convert_to_seconds: true,
        };
        let out = prepare(&table, &options).unwrap().unwrap();
        assert_eq!(out.time(), &[0.15, 0.2]);
        assert_eq!(out.column(TIMESTAMP_NS).unwrap(), &Column::Timestamp(vec![150_000_000, 200_000_000]));
    }

    #[test]
    fn empty_window_yields_none() {
        let dir = tempfile::tempdir().unwrap();
        let data = write_file(&dir, "data.csv", DATA);
        let options = LoadOptions {
            window: TimeWindow::new(5e9, 6e9).unwrap(),
            time_unit: TimeUnit::Nanoseconds,
            ..LoadOptions::default()
        };
        assert!(load_data(&data, &HeaterSpec::default(), None, &options).unwrap().is_none());
    }

    #[test]
    fn loads_and_derives_with_events() {
        let dir = tempfile::tempdir().unwrap();
        let data = write_file(&dir, "data.csv", DATA);
        let events = write_file(&dir, "events.csv", EVENTS);
        let options = LoadOptions {
            time_unit: TimeUnit::Nanoseconds,
            normalize_time: false,
            convert_to_seconds: true,
            ..LoadOptions::default()
        };
        let heater = HeaterSpec { voltage: 10.0, current: 1.0 };

        let loaded = load_data(&data, &heater, Some(&events), &options).unwrap().unwrap();
        assert_eq!(loaded.data.time(), &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(loaded.data.numeric(POWER_IN).unwrap(), &[10.0, 10.0, 0.0, 0.0]);
        assert_eq!(loaded.data.numeric(LID_OPEN_SIGNAL).unwrap(), &[0.0, 1.0, 1.0, 0.0]);

        let events = loaded.events.unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events.times(), vec![2.0, 2.5, 4.0]);
        assert_eq!(events.events[1].timestamp_ns, Some(2_500_000_000));
    }

    #[test]
    fn nanosecond_log_read_as_seconds_fails() {
        let dir = tempfile::tempdir().unwrap();
        let data = write_file(
            &dir,
            "data.csv",
            "time,t1,t2,t3,heater_on,fan_on\n1614861060000000000,20.0,24.0,26.0,True,True\n",
        );
        let err = load_data(&data, &HeaterSpec::default(), None, &LoadOptions::default()).unwrap_err();
        let data_err = err.downcast_ref::<DataError>().unwrap();
        assert!(matches!(data_err, DataError::InvalidValue { column, .. } if column == TIMESTAMP_NS));
        assert_eq!(data_err.kind(), ErrorKind::Input);
    }

    #[test]
    fn events_outside_window_mean_no_lid_activity() {
        let dir = tempfile::tempdir().unwrap();
        let data = write_file(&dir, "data.csv", DATA);
        let events = write_file(&dir, "events.csv", EVENTS);
        let options = LoadOptions {
            window: TimeWindow::new(0.0, 1.5e9).unwrap(),
            time_unit: TimeUnit::Nanoseconds,
            normalize_time: false,
            convert_to_seconds: false,
        };
        let loaded = load_data(&data, &HeaterSpec::default(), Some(&events), &options)
            .unwrap()
            .unwrap();
        assert_eq!(loaded.data.len(), 1);
        assert_eq!(loaded.data.numeric(LID_OPEN_SIGNAL).unwrap(), &[0.0]);
        assert!(loaded.events.unwrap().is_empty());
    }
}
