use anyhow::Result;
use clap::Parser;

use ppu_evt_viewer_shell as viewer_shell;

const INITIAL_WIDTH: f32 = 1600.0;
const INITIAL_HEIGHT: f32 = 900.0;

fn main() -> Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Debug) // Default Log Level
        .filter(Some("naga"), log::LevelFilter::Warn)
        .filter(Some("wgpu"), log::LevelFilter::Warn)
        .filter(Some("eframe"), log::LevelFilter::Warn)
        .parse_default_env()
        .init();

    let args = viewer_shell::Args::parse();

    let options = if !args.headless {
        Some(eframe::NativeOptions {
            initial_window_size: Some(egui::vec2(INITIAL_WIDTH, INITIAL_HEIGHT)),
            ..Default::default()
        })
    } else {
        None
    };

    viewer_shell::dispatch_main(args, options)
}
