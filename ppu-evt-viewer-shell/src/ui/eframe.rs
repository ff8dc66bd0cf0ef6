use anyhow::{anyhow, Result};

use eframe::NativeOptions;

use crate::ui;
use crate::Args;

fn app_creator(args: Args) -> eframe::AppCreator {
    log::debug!("app_creator (build)");
    Box::new(move |cc| {
        log::debug!("AppCreator call");
        Box::new(ui::ViewerUi::new(args, &cc.egui_ctx, cc.storage))
    })
}

pub fn native_ui_main(args: Args, options: NativeOptions) -> Result<()> {
    eframe::run_native("PPU Event Viewer", options, app_creator(args))
        .map_err(|err| anyhow!("Failed to run viewer UI: {err}"))
}
