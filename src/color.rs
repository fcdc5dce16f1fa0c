use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Trace colours: trace name → Color32
// ---------------------------------------------------------------------------

/// Every trace the incubator plot can draw, in palette order.
pub const TRACES: [&str; 8] = [
    "avg_T",
    "t2 (right)",
    "t3 (top)",
    "heater_on",
    "room",
    "fan_on",
    "lid_open",
    "events",
];

/// Fixed colour per trace so a trace keeps its colour across panels.
#[derive(Debug, Clone)]
pub struct TraceColors {
    mapping: BTreeMap<&'static str, Color32>,
    default_color: Color32,
}

impl Default for TraceColors {
    fn default() -> Self {
        let mapping = TRACES
            .iter()
            .copied()
            .zip(generate_palette(TRACES.len()))
            .collect();
        TraceColors {
            mapping,
            default_color: Color32::LIGHT_BLUE,
        }
    }
}

impl TraceColors {
    pub fn color_for(&self, trace: &str) -> Color32 {
        self.mapping
            .get(trace)
            .copied()
            .unwrap_or(self.default_color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_distinct_colours() {
        let palette = generate_palette(TRACES.len());
        assert_eq!(palette.len(), TRACES.len());
        for (i, a) in palette.iter().enumerate() {
            for b in &palette[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert!(generate_palette(0).is_empty());
    }

    #[test]
    fn unknown_trace_gets_default_colour() {
        let colors = TraceColors::default();
        assert_eq!(colors.color_for("no such trace"), Color32::LIGHT_BLUE);
        assert_ne!(colors.color_for("avg_T"), colors.color_for("room"));
    }
}
