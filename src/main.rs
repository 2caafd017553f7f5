// src/main.rs
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]
mod gui;
use anyhow::Context;
use eframe::egui;
use log::{info, warn};
use neurochart::ChartConfig;
fn read_config(path: &str) -> anyhow::Result<ChartConfig> {
    ChartConfig::load(path).with_context(|| format!("failed to load chart config from {path}"))
}
// Optional first argument: path to a JSON chart config.
fn load_config() -> ChartConfig {
    let Some(path) = std::env::args().nth(1) else {
        return ChartConfig::default();
    };
    match read_config(&path) {
        Ok(config) => {
            info!("loaded chart config from {path}");
            config
        }
        Err(err) => {
            warn!("{err:#}; falling back to defaults");
            ChartConfig::default()
        }
    }
}
fn main() -> eframe::Result<()> {
    env_logger::init();
    let config = load_config();
    let viewport = egui::ViewportBuilder::default()
        .with_inner_size([1400.0, 900.0])
        .with_min_inner_size([960.0, 600.0])
        .with_title("neurochart viewer");
    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };
    eframe::run_native(
        "neurochart",
        options,
        Box::new(move |_cc| Box::new(gui::ViewerApp::new(config))),
    )
}
