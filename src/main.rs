//! LitePlots - CSV upload & interactive chart builder
//!
//! A Rust application for turning a CSV file into common interactive plots.

use eframe::egui;
use liteplots::config::AppConfig;
use liteplots::gui::LitePlotsApp;

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::load();
    log::info!("Starting LitePlots");

    // Configure native options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.window_width, config.window_height])
            .with_min_inner_size([900.0, 600.0])
            .with_title("LitePlots"),
        ..Default::default()
    };

    eframe::run_native(
        "LitePlots",
        options,
        Box::new(|cc| Ok(Box::new(LitePlotsApp::new(cc, config)))),
    )
}
