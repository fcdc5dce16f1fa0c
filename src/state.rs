use std::path::{Path, PathBuf};

use anyhow::Result;

use incubator_viewer::config::{AnalysisConfig, WindowConfig};
use incubator_viewer::data::analysis::{load_data, IncubatorData, LoadOptions};
use incubator_viewer::data::derive::HeaterSpec;
use incubator_viewer::data::time::TimeUnit;

use crate::color::TraceColors;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Which traces and panels the plot shows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewOptions {
    /// Draw `heater_on` as a 40/30 step over the incubator temperature.
    pub overlay_heater: bool,
    /// Add an actuators panel (heater, fan, lid).
    pub show_actuators: bool,
    /// Draw the individual `t2` / `t3` sensors next to their average.
    pub show_sensor_temperatures: bool,
    /// Use `timestamp_ns` (wall-clock) for the x axis instead of `time`.
    pub show_hr_time: bool,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            overlay_heater: true,
            show_actuators: false,
            show_sensor_temperatures: false,
            show_hr_time: false,
        }
    }
}

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Derived data (None until a log is loaded).
    pub data: Option<IncubatorData>,

    pub data_path: Option<PathBuf>,
    pub events_path: Option<PathBuf>,

    pub heater: HeaterSpec,
    pub time_unit: TimeUnit,
    pub normalize_time: bool,
    pub convert_to_seconds: bool,
    pub window: WindowConfig,

    pub view: ViewOptions,
    pub colors: TraceColors,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::from_config(&AnalysisConfig::default())
    }
}

impl AppState {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            data: None,
            data_path: config.data.clone(),
            events_path: config.events.clone(),
            heater: config.heater,
            time_unit: config.time_unit,
            normalize_time: config.normalize_time,
            convert_to_seconds: config.convert_to_seconds,
            window: config.window,
            view: ViewOptions::default(),
            colors: TraceColors::default(),
            status_message: None,
        }
    }

    /// Normalization shifts the data's time base away from the events'.
    pub fn options_conflict(&self) -> bool {
        self.normalize_time && self.events_path.is_some()
    }

    pub fn load_options(&self) -> Result<LoadOptions> {
        Ok(LoadOptions {
            window: self.window.to_window()?,
            time_unit: self.time_unit,
            normalize_time: self.normalize_time,
            convert_to_seconds: self.convert_to_seconds,
        })
    }

    pub fn set_data_path(&mut self, path: PathBuf) {
        self.data_path = Some(path);
        self.reload();
    }

    /// Attach an event log. Events need an absolute time base, so
    /// normalization is switched off.
    pub fn set_events_path(&mut self, path: PathBuf) {
        if self.normalize_time {
            log::info!("Disabling time normalization to align events");
            self.normalize_time = false;
        }
        self.events_path = Some(path);
        self.reload();
    }

    pub fn clear_events(&mut self) {
        self.events_path = None;
        self.reload();
    }

    /// Re-run the load pipeline with the current options.
    pub fn reload(&mut self) {
        let Some(data_path) = self.data_path.clone() else {
            return;
        };
        match self.try_load(&data_path) {
            Ok(Some(data)) => {
                log::info!(
                    "Loaded {} rows from {} ({} events)",
                    data.data.len(),
                    data_path.display(),
                    data.events.as_ref().map_or(0, |e| e.len())
                );
                self.data = Some(data);
                self.status_message = None;
            }
            Ok(None) => {
                log::warn!("No data left in the selected window");
                self.data = None;
                self.status_message = Some("No data in the selected time window".to_string());
            }
            Err(e) => {
                log::error!("Failed to load {}: {e:#}", data_path.display());
                self.data = None;
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    fn try_load(&self, data_path: &Path) -> Result<Option<IncubatorData>> {
        let options = self.load_options()?;
        load_data(data_path, &self.heater, self.events_path.as_deref(), &options)
    }
}
