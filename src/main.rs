mod app;
mod charts;
mod color;
mod config;
mod dashboard;
mod data;
mod state;
mod ui;

use anyhow::anyhow;
use app::OtaDashboardApp;
use clap::Parser;
use config::Config;
use eframe::egui;
use state::AppState;

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let config = Config::parse();

    // The dashboard cannot start without a valid table.
    let dataset = state::load_dataset(&config.data)?;
    let mut state = AppState::default();
    state.set_dataset(dataset);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.width, config.height])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "OTA Performance Dashboard",
        options,
        Box::new(move |cc| {
            cc.egui_ctx.set_visuals(egui::Visuals::dark());
            Ok(Box::new(OtaDashboardApp::new(state)))
        }),
    )
    .map_err(|e| anyhow!("running dashboard window: {e}"))
}
