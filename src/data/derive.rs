use serde::{Deserialize, Serialize};

use super::error::DataError;
use super::events::{to_signal, CategoryMap, EventLog, LID_CLOSE, LID_OPEN};
use super::model::{Column, TimeSeries, TIME};

pub const ZERO_KELVIN: f64 = 273.15;
/// Mass of the air inside the incubator box, kg.
pub const AIR_MASS: f64 = 0.04;
/// Specific heat capacity of air, J kg^-1 K^-1.
pub const AIR_HEAT_CAPACITY: f64 = 700.0;

pub const POWER_IN: &str = "power_in";
pub const AVERAGE_TEMPERATURE: &str = "average_temperature";
pub const AVG_TEMP_KELVIN: &str = "avg_temp_kelvin";
pub const POTENTIAL_ENERGY: &str = "potential_energy";
pub const LID_OPEN_SIGNAL: &str = "lid_open";

/// Electrical parameters of the heater.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaterSpec {
    /// Volts.
    pub voltage: f64,
    /// Amperes.
    pub current: f64,
}

impl HeaterSpec {
    pub fn power(&self) -> f64 {
        self.voltage * self.current
    }
}

impl Default for HeaterSpec {
    fn default() -> Self {
        HeaterSpec {
            voltage: 12.0,
            current: 10.45,
        }
    }
}

/// Add the derived physical columns to an aligned incubator series.
///
/// Needs `heater_on`, `t2` and `t3`. When `events` is given its lid
/// events are aligned to the series' time axis, which must therefore share
/// the events' time base.
pub fn derive_data(
    series: TimeSeries,
    heater: &HeaterSpec,
    events: Option<&EventLog>,
) -> Result<TimeSeries, DataError> {
    let heater_on = series.flags("heater_on")?;
    let t2 = series.numeric("t2")?;
    let t3 = series.numeric("t3")?;

    let power_in: Vec<f64> = heater_on
        .iter()
        .map(|&on| if on { heater.power() } else { 0.0 })
        .collect();

    let average: Vec<f64> = t2.iter().zip(t3).map(|(a, b)| (a + b) / 2.0).collect();
    let kelvin: Vec<f64> = average.iter().map(|t| t + ZERO_KELVIN).collect();

    let energy: Vec<f64> = kelvin
        .iter()
        .map(|k| k * AIR_MASS * AIR_HEAT_CAPACITY)
        .collect();
    let baseline = energy.first().copied().unwrap_or_default();
    let energy: Vec<f64> = energy.iter().map(|e| e - baseline).collect();

    let lid_open = match events {
        Some(events) => {
            let lid_events = events.filter_codes(&[LID_CLOSE, LID_OPEN]);
            to_signal(series.numeric(TIME)?, &lid_events, &CategoryMap::lid())?
        }
        None => vec![0.0; series.len()],
    };

    series
        .with_column(POWER_IN, Column::Numeric(power_in))?
        .with_column(AVERAGE_TEMPERATURE, Column::Numeric(average))?
        .with_column(AVG_TEMP_KELVIN, Column::Numeric(kelvin))?
        .with_column(POTENTIAL_ENERGY, Column::Numeric(energy))?
        .with_column(LID_OPEN_SIGNAL, Column::Numeric(lid_open))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::events::Event;

    fn incubator() -> TimeSeries {
        TimeSeries::new(
            vec![0.0, 1.0, 2.0],
            vec![
                ("t1".into(), Column::Numeric(vec![21.0, 21.0, 21.0])),
                ("t2".into(), Column::Numeric(vec![20.0, 30.0, 40.0])),
                ("t3".into(), Column::Numeric(vec![22.0, 32.0, 42.0])),
                ("heater_on".into(), Column::Boolean(vec![false, true, true])),
            ],
        )
        .unwrap()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn derives_power_and_temperatures() {
        let heater = HeaterSpec { voltage: 12.0, current: 2.0 };
        let out = derive_data(incubator(), &heater, None).unwrap();

        assert_eq!(out.numeric(POWER_IN).unwrap(), &[0.0, 24.0, 24.0]);
        assert_eq!(out.numeric(AVERAGE_TEMPERATURE).unwrap(), &[21.0, 31.0, 41.0]);
        let kelvin = out.numeric(AVG_TEMP_KELVIN).unwrap();
        assert!(close(kelvin[0], 294.15));
        assert!(close(kelvin[2], 314.15));
        assert_eq!(out.numeric(LID_OPEN_SIGNAL).unwrap(), &[0.0; 3]);
    }

    #[test]
    fn potential_energy_is_relative_to_first_row() {
        let out = derive_data(incubator(), &HeaterSpec::default(), None).unwrap();
        let energy = out.numeric(POTENTIAL_ENERGY).unwrap();
        assert_eq!(energy[0], 0.0);
        // 10 K warmer at 0.04 kg * 700 J/(kg K)
        assert!(close(energy[1], 280.0));
        assert!(close(energy[2], 560.0));
    }

    #[test]
    fn lid_signal_follows_events() {
        let events = EventLog::new(vec![
            Event { time: 0.5, event: "Note".into(), code: "note".into(), timestamp_ns: None },
            Event { time: 1.0, event: "Lid Opened".into(), code: LID_OPEN.into(), timestamp_ns: None },
        ]);
        let out = derive_data(incubator(), &HeaterSpec::default(), Some(&events)).unwrap();
        assert_eq!(out.numeric(LID_OPEN_SIGNAL).unwrap(), &[0.0, 1.0, 1.0]);
    }

    #[test]
    fn missing_sensor_column_is_an_input_error() {
        let series = TimeSeries::new(
            vec![0.0],
            vec![
                ("t2".into(), Column::Numeric(vec![20.0])),
                ("heater_on".into(), Column::Boolean(vec![false])),
            ],
        )
        .unwrap();
        let err = derive_data(series, &HeaterSpec::default(), None).unwrap_err();
        assert_eq!(err, DataError::MissingColumn("t3".into()));
    }

    #[test]
    fn original_columns_are_kept() {
        let out = derive_data(incubator(), &HeaterSpec::default(), None).unwrap();
        assert_eq!(
            out.column_names(),
            vec![
                "time",
                "t1",
                "t2",
                "t3",
                "heater_on",
                POWER_IN,
                AVERAGE_TEMPERATURE,
                AVG_TEMP_KELVIN,
                POTENTIAL_ENERGY,
                LID_OPEN_SIGNAL,
            ]
        );
    }
}
