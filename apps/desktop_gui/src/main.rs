//! Desktop DICOM viewer. All heavy lifting happens on a REST backend; this
//! binary is the UI plus a worker thread that talks to it.

mod backend_bridge;
mod config;
mod controller;
mod ui;
mod viewer;

use clap::Parser;
use crossbeam_channel::bounded;
use tracing_subscriber::EnvFilter;

use crate::backend_bridge::runtime::{self, WorkerConfig};
use crate::config::{load_settings, Cli};
use crate::ui::{theme, VisorApp};

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let settings = load_settings(&cli);
    tracing::info!(api_url = %settings.api_url, "starting viewer");

    let (cmd_tx, cmd_rx) = bounded(256);
    let (ui_tx, ui_rx) = bounded(2048);
    runtime::launch(
        WorkerConfig {
            api_url: settings.api_url.clone(),
        },
        cmd_rx,
        ui_tx,
    );

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Visor DICOM")
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([980.0, 640.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Visor DICOM",
        options,
        Box::new(move |cc| {
            theme::apply(&cc.egui_ctx);
            Ok(Box::new(VisorApp::new(settings, cmd_tx, ui_rx)))
        }),
    )
}
