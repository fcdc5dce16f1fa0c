use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::data::analysis::LoadOptions;
use crate::data::derive::HeaterSpec;
use crate::data::error::DataError;
use crate::data::time::TimeUnit;
use crate::data::window::TimeWindow;

/// Environment variable naming the viewer's config file.
pub const CONFIG_ENV: &str = "INCUBATOR_VIEWER_CONFIG";
/// Config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "incubator-viewer.toml";

/// Analysis settings read from TOML.
///
/// ```toml
/// time_unit = "ns"
/// normalize_time = false
/// convert_to_seconds = true
/// data = "incubator_data.csv"
/// events = "events.csv"
///
/// [heater]
/// voltage = 12.0
/// current = 10.45
///
/// [window]
/// start = 1614861000000000000
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    pub heater: HeaterSpec,
    pub time_unit: TimeUnit,
    pub normalize_time: bool,
    pub convert_to_seconds: bool,
    pub window: WindowConfig,
    pub data: Option<PathBuf>,
    pub events: Option<PathBuf>,
}

/// Window bounds; a missing bound is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WindowConfig {
    pub start: Option<f64>,
    pub end: Option<f64>,
}

impl WindowConfig {
    pub fn to_window(&self) -> Result<TimeWindow, DataError> {
        TimeWindow::new(
            self.start.unwrap_or(f64::NEG_INFINITY),
            self.end.unwrap_or(f64::INFINITY),
        )
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        let options = LoadOptions::default();
        AnalysisConfig {
            heater: HeaterSpec::default(),
            time_unit: options.time_unit,
            normalize_time: options.normalize_time,
            convert_to_seconds: options.convert_to_seconds,
            window: WindowConfig::default(),
            data: None,
            events: None,
        }
    }
}

impl AnalysisConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("parsing analysis config")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = Self::from_toml_str(&text)
            .with_context(|| format!("in {}", path.display()))?;
        log::info!("Loaded analysis config from {}", path.display());
        Ok(config)
    }

    /// Config from `$INCUBATOR_VIEWER_CONFIG`, else the nearest
    /// `incubator-viewer.toml` in the working directory or a parent, else
    /// defaults.
    pub fn discover() -> Result<Self> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Self::load_resolved(Path::new(&path));
        }
        let cwd = std::env::current_dir().context("reading working directory")?;
        Self::discover_from(&cwd)
    }

    /// Walk up from `start` looking for [`DEFAULT_CONFIG_FILE`].
    pub fn discover_from(start: &Path) -> Result<Self> {
        match locate_root(start, DEFAULT_CONFIG_FILE) {
            Ok(root) => Self::load_resolved(&root.join(DEFAULT_CONFIG_FILE)),
            Err(e) => {
                log::debug!("No config found: {e:#}");
                Ok(Self::default())
            }
        }
    }

    /// Load `path` and resolve relative `data` / `events` paths against
    /// its directory.
    fn load_resolved(path: &Path) -> Result<Self> {
        let mut config = Self::load(path)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    pub fn resolve_paths(&mut self, base: &Path) {
        for path in [&mut self.data, &mut self.events].into_iter().flatten() {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }

    pub fn load_options(&self) -> Result<LoadOptions> {
        Ok(LoadOptions {
            window: self.window.to_window()?,
            time_unit: self.time_unit,
            normalize_time: self.normalize_time,
            convert_to_seconds: self.convert_to_seconds,
        })
    }
}

/// Walk up from `start` to the first directory containing `marker`.
///
/// Fails when no ancestor has it.
pub fn locate_root(start: &Path, marker: &str) -> Result<PathBuf> {
    let start = start
        .canonicalize()
        .with_context(|| format!("resolving {}", start.display()))?;
    for dir in start.ancestors() {
        if dir.join(marker).exists() {
            return Ok(dir.to_path_buf());
        }
    }
    bail!("'{marker}' not found in {} or any parent directory", start.display())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = AnalysisConfig::from_toml_str("").unwrap();
        assert_eq!(config, AnalysisConfig::default());
        assert_eq!(config.load_options().unwrap(), LoadOptions::default());
    }

    #[test]
    fn parses_full_config() {
        let config = AnalysisConfig::from_toml_str(
            r#"
            time_unit = "ns"
            normalize_time = false
            convert_to_seconds = true
            events = "events.csv"

            [heater]
            voltage = 12.0
            current = 2.5

            [window]
            start = 1000.0
            "#,
        )
        .unwrap();
        assert_eq!(config.heater, HeaterSpec { voltage: 12.0, current: 2.5 });
        assert_eq!(config.events, Some(PathBuf::from("events.csv")));

        let options = config.load_options().unwrap();
        assert_eq!(options.time_unit, TimeUnit::Nanoseconds);
        assert!(!options.normalize_time);
        assert!(options.convert_to_seconds);
        assert_eq!(options.window.start, 1000.0);
        assert_eq!(options.window.end, f64::INFINITY);
    }

    #[test]
    fn rejects_unknown_units_and_reversed_windows() {
        assert!(AnalysisConfig::from_toml_str(r#"time_unit = "h""#).is_err());

        let config = AnalysisConfig::from_toml_str("[window]\nstart = 5.0\nend = 1.0\n").unwrap();
        assert!(config.load_options().is_err());
    }

    #[test]
    fn locate_root_walks_up_to_marker() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("incubator_dt")).unwrap();
        let nested = dir.path().join("1-Incubator-Service").join("logs");
        std::fs::create_dir_all(&nested).unwrap();

        let root = locate_root(&nested, "incubator_dt").unwrap();
        assert_eq!(root, dir.path().canonicalize().unwrap());
        assert!(locate_root(&nested, "no-such-marker-here").is_err());
    }

    #[test]
    fn discovers_config_in_a_parent_and_resolves_paths() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(DEFAULT_CONFIG_FILE),
            "time_unit = \"ns\"\nnormalize_time = false\ndata = \"logs/data.csv\"\nevents = \"/abs/events.csv\"\n",
        )
        .unwrap();
        let nested = dir.path().join("logs");
        std::fs::create_dir_all(&nested).unwrap();

        let config = AnalysisConfig::discover_from(&nested).unwrap();
        assert_eq!(config.time_unit, TimeUnit::Nanoseconds);
        let root = dir.path().canonicalize().unwrap();
        assert_eq!(config.data, Some(root.join("logs/data.csv")));
        assert_eq!(config.events, Some(PathBuf::from("/abs/events.csv")));
    }

    #[test]
    fn resolve_paths_joins_relative_paths() {
        let mut config = AnalysisConfig {
            data: Some(PathBuf::from("data.csv")),
            ..AnalysisConfig::default()
        };
        config.resolve_paths(Path::new("/srv/incubator"));
        assert_eq!(config.data, Some(PathBuf::from("/srv/incubator/data.csv")));
        assert_eq!(config.events, None);
    }
}
