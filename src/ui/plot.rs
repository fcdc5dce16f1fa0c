use eframe::egui::{Align2, Ui};
use egui_plot::{Legend, Line, Plot, PlotPoint, PlotPoints, Points, Text};

use incubator_viewer::data::analysis::IncubatorData;
use incubator_viewer::data::derive::{AVERAGE_TEMPERATURE, LID_OPEN_SIGNAL};
use incubator_viewer::data::model::{TimeSeries, TIME};
use incubator_viewer::data::time::TIMESTAMP_NS;

use crate::state::{AppState, ViewOptions};

/// Plots sharing this group pan and zoom together along x.
const X_AXIS_GROUP: &str = "incubator_time";
const TEMPERATURE_PANEL: &str = "incubator_temperature";

struct Trace {
    name: &'static str,
    y: Vec<f64>,
}

struct Panel {
    id: &'static str,
    title: &'static str,
    traces: Vec<Trace>,
}

/// An event label pinned to the average temperature curve.
#[derive(Debug, PartialEq)]
struct Annotation {
    x: f64,
    y: f64,
    label: String,
}

// ---------------------------------------------------------------------------
// Incubator plot (central panel)
// ---------------------------------------------------------------------------

/// Render the stacked incubator plots in the central panel.
pub fn incubator_plot(ui: &mut Ui, state: &AppState) {
    let data = match &state.data {
        Some(data) => data,
        None => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("Open an incubator log to plot it  (File → Open data…)");
            });
            return;
        }
    };

    let x_field = if state.view.show_hr_time { TIMESTAMP_NS } else { TIME };
    let Some(x) = column_values(&data.data, x_field) else {
        ui.label(format!("Column '{x_field}' cannot be plotted"));
        return;
    };
    let x_label = if state.view.show_hr_time {
        "Timestamp (s since epoch)".to_string()
    } else if state.convert_to_seconds {
        "Time (s)".to_string()
    } else {
        format!("Time ({})", state.time_unit)
    };

    let panels = build_panels(&data.data, &state.view);
    let annotations = event_annotations(data, &x, state.view.show_hr_time);

    let n_panels = panels.len() as f32;
    let spacing = ui.spacing().item_spacing.y;
    let height = ((ui.available_height() - spacing * n_panels) / n_panels).max(80.0);

    for (i, panel) in panels.iter().enumerate() {
        let mut plot = Plot::new(panel.id)
            .legend(Legend::default())
            .height(height)
            .link_axis(X_AXIS_GROUP, [true, false])
            .y_axis_label(panel.title)
            .allow_boxed_zoom(true)
            .allow_drag(true)
            .allow_scroll(true)
            .allow_zoom(true);
        if i + 1 == panels.len() {
            plot = plot.x_axis_label(x_label.clone());
        }

        plot.show(ui, |plot_ui| {
            for trace in &panel.traces {
                let points: PlotPoints = x
                    .iter()
                    .zip(trace.y.iter())
                    .map(|(&xi, &yi)| [xi, yi])
                    .collect();

                let line = Line::new(points)
                    .name(trace.name)
                    .color(state.colors.color_for(trace.name))
                    .width(1.5);

                plot_ui.line(line);
            }

            if panel.id == TEMPERATURE_PANEL && !annotations.is_empty() {
                let color = state.colors.color_for("events");
                let markers: Vec<[f64; 2]> = annotations.iter().map(|a| [a.x, a.y]).collect();
                plot_ui.points(Points::new(markers).radius(4.0).color(color).name("events"));
                for a in &annotations {
                    plot_ui.text(
                        Text::new(PlotPoint::new(a.x, a.y), a.label.clone())
                            .anchor(Align2::CENTER_BOTTOM)
                            .color(color),
                    );
                }
            }
        });
    }
}

/// A column as plottable values; `None` when absent or textual.
fn column_values(series: &TimeSeries, name: &str) -> Option<Vec<f64>> {
    if name == TIME {
        return Some(series.time().to_vec());
    }
    series.column(name).ok()?.to_f64()
}

fn push_trace(traces: &mut Vec<Trace>, series: &TimeSeries, column: &str, name: &'static str) {
    if let Some(y) = column_values(series, column) {
        traces.push(Trace { name, y });
    }
}

/// Incubator and room temperature panels, plus actuators when enabled.
/// Traces whose column is missing are skipped.
fn build_panels(series: &TimeSeries, view: &ViewOptions) -> Vec<Panel> {
    let mut incubator = Vec::new();
    if view.show_sensor_temperatures {
        push_trace(&mut incubator, series, "t2", "t2 (right)");
        push_trace(&mut incubator, series, "t3", "t3 (top)");
    }
    push_trace(&mut incubator, series, AVERAGE_TEMPERATURE, "avg_T");
    if view.overlay_heater {
        if let Ok(heater_on) = series.flags("heater_on") {
            let y = heater_on.iter().map(|&on| if on { 40.0 } else { 30.0 }).collect();
            incubator.push(Trace { name: "heater_on", y });
        }
    }

    let mut room = Vec::new();
    push_trace(&mut room, series, "t1", "room");

    let mut panels = vec![
        Panel {
            id: TEMPERATURE_PANEL,
            title: "Incubator Temperature (°C)",
            traces: incubator,
        },
        Panel {
            id: "room_temperature",
            title: "Room Temperature (°C)",
            traces: room,
        },
    ];

    if view.show_actuators {
        let mut actuators = Vec::new();
        push_trace(&mut actuators, series, "heater_on", "heater_on");
        push_trace(&mut actuators, series, "fan_on", "fan_on");
        push_trace(&mut actuators, series, LID_OPEN_SIGNAL, "lid_open");
        panels.push(Panel {
            id: "actuators",
            title: "Actuators",
            traces: actuators,
        });
    }

    panels
}

/// Place each event at the average temperature of the nearest sample.
/// On the wall-clock axis the event keeps its own stamp.
fn event_annotations(data: &IncubatorData, x: &[f64], hr_time: bool) -> Vec<Annotation> {
    let (Some(events), Ok(avg)) = (&data.events, data.data.numeric(AVERAGE_TEMPERATURE)) else {
        return Vec::new();
    };
    let time = data.data.time();
    events
        .events
        .iter()
        .filter_map(|event| {
            let idx = nearest_index(time, event.time)?;
            Some(Annotation {
                x: match (hr_time, event.timestamp_ns) {
                    (true, Some(ns)) => ns as f64 / 1e9,
                    (true, None) => x[idx],
                    (false, _) => event.time,
                },
                y: avg[idx],
                label: event.event.clone(),
            })
        })
        .collect()
}

/// Index of the value in sorted `times` closest to `t`.
fn nearest_index(times: &[f64], t: f64) -> Option<usize> {
    if times.is_empty() {
        return None;
    }
    let i = times.partition_point(|&v| v < t);
    if i == 0 {
        return Some(0);
    }
    if i == times.len() {
        return Some(times.len() - 1);
    }
    if (times[i] - t).abs() < (t - times[i - 1]).abs() {
        Some(i)
    } else {
        Some(i - 1)
    }
}
