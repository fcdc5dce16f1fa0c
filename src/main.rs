mod app;
mod color;
mod state;
mod ui;

use app::IncubatorViewerApp;
use eframe::egui;
use incubator_viewer::config::AnalysisConfig;
use state::AppState;

fn main() -> eframe::Result {
    env_logger::init();

    let state = match AnalysisConfig::discover() {
        Ok(config) => {
            let mut state = AppState::from_config(&config);
            state.reload();
            state
        }
        Err(e) => {
            log::error!("Failed to read config: {e:#}");
            let mut state = AppState::default();
            state.status_message = Some(format!("Config error: {e:#}"));
            state
        }
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Incubator Viewer",
        options,
        Box::new(|_cc| Ok(Box::new(IncubatorViewerApp::new(state)))),
    )
}
