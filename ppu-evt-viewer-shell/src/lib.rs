use clap::Parser;

use anyhow::Result;

pub mod headless;
pub mod ui;
mod utils;

#[derive(Parser, Debug, Default)]
#[clap(version, about = "Visualize PPU_EVENT traces on a cycle x scanline grid", long_about = None)]
pub struct Args {
    /// Trace log to open on startup
    pub trace: Option<String>,

    #[clap(
        short = 'r',
        long = "reference",
        help = "Reference image to show behind the trace events"
    )]
    pub reference: Option<String>,

    #[clap(
        short = 'q',
        long = "headless",
        help = "Render the trace without opening a window (see --output / --json)"
    )]
    pub headless: bool,

    #[clap(
        short = 'f',
        long = "frame",
        help = "Only show events from the given frame (zero based)"
    )]
    pub frame: Option<usize>,

    #[clap(
        short = 'w',
        long = "width",
        help = "Headless render width in pixels [default: 1280]"
    )]
    pub width: Option<usize>,

    #[clap(
        short = 's',
        long = "show",
        help = "Headless: event type to draw (repeatable, defaults to all supported types)"
    )]
    pub show: Vec<String>,

    #[clap(short = 'o', long = "output", help = "Headless: write the rendered events to a PNG")]
    pub output: Option<String>,

    #[clap(long = "json", help = "Headless: write the displayed events as JSON")]
    pub json: Option<String>,
}

pub fn dispatch_main(args: Args, options: Option<eframe::NativeOptions>) -> Result<()> {
    if args.headless {
        headless::headless_main(args)?;
    } else {
        let options = options.unwrap_or_default();
        crate::ui::eframe::native_ui_main(args, options)?;
    }

    Ok(())
}
