mod app;
mod color;
mod state;
mod ui;

use anyhow::Context;
use app::TenderDashApp;
use eframe::egui;
use tender_dash::DashboardConfig;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = DashboardConfig::load().context("loading dashboard config")?;
    log::info!("Reading default data from {}", config.data_dir.display());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 820.0])
            .with_min_inner_size([640.0, 420.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Data Analysis – Tender Dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(TenderDashApp::new(config)))),
    )
    .map_err(|e| anyhow::anyhow!("running dashboard window: {e}"))
}
