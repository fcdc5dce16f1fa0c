/// Data layer: core types, loading, alignment and derivation.
///
/// Architecture:
/// ```text
///  .csv / .parquet / .json
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → TimeSeries (time axis + typed columns)
///   └──────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │ window / time │  trim to [start, end], timestamp_ns, normalize, → s
///   └──────────────┘
///        │                 events .csv → EventLog
///        ▼                        │
///   ┌──────────┐                  │
///   │  derive   │ ◄── events::to_signal (lid_open)
///   └──────────┘
///        │
///        ▼
///   IncubatorData (analysis::load_data)
/// ```

pub mod analysis;
pub mod derive;
pub mod error;
pub mod events;
pub mod loader;
pub mod model;
pub mod time;
pub mod window;
