use anyhow::{anyhow, Result};

use ppu_evt_viewer::{
    constants::SUPPORTED_EVENT_TYPES,
    prefs::{MemoryPreferences, Preferences},
    registry::toggle_key,
    viewer::Viewer,
};

use crate::utils;

const DEFAULT_HEADLESS_WIDTH: usize = 1280;

/// Builds a viewer for a one-shot render with exactly the requested types visible
fn setup_headless_viewer(args: &crate::Args) -> Viewer<MemoryPreferences> {
    let mut prefs = MemoryPreferences::new();
    if args.show.is_empty() {
        for event_type in SUPPORTED_EVENT_TYPES {
            prefs.set_bool(&toggle_key(event_type), true);
        }
    } else {
        for event_type in args.show.iter() {
            prefs.set_bool(&toggle_key(event_type), true);
        }
    }

    let mut viewer = Viewer::new(prefs);
    let (width, height) =
        Viewer::<MemoryPreferences>::surface_size_for_width(args.width.unwrap_or(DEFAULT_HEADLESS_WIDTH));
    viewer.resize(width, height);
    viewer
}

pub fn headless_main(args: crate::Args) -> Result<()> {
    let trace_path = args
        .trace
        .as_ref()
        .ok_or_else(|| anyhow!("Headless mode needs a trace file"))?;

    let trace = utils::read_trace_file(trace_path)?;
    if !trace.diagnostics.is_empty() {
        log::warn!("{}: {} malformed lines", trace_path, trace.diagnostics.len());
    }

    let mut viewer = setup_headless_viewer(&args);
    viewer.load_events(trace.events);
    if args.frame.is_some() {
        viewer.set_frame_filter(args.frame);
    }

    let stats = viewer.last_stats();
    println!(
        "{}: {} frames, {} points ({} drawn, {} malformed, {} hidden)",
        trace_path,
        viewer.frame_count(),
        viewer.point_count(),
        stats.drawn,
        stats.malformed,
        stats.hidden
    );
    for toggle in viewer.toggles().iter() {
        let status = match (toggle.supported, toggle.enabled) {
            (false, _) => "not supported",
            (true, true) => "shown",
            (true, false) => "hidden",
        };
        println!("  {:<28} {:>8}  {status}", toggle.event_type, viewer.type_count(&toggle.event_type));
    }

    if let Some(output) = &args.output {
        let fb = viewer.framebuffer();
        log::info!("Writing {}x{} render to {output}", fb.width(), fb.height());
        utils::save_framebuffer_png(fb, output)?;
    }
    if let Some(json) = &args.json {
        log::info!("Writing {} events to {json}", viewer.point_count());
        utils::write_events_json(viewer.displayed(), json)?;
    }

    Ok(())
}

#[test]
fn test_headless_viewer_toggles() {
    let args = crate::Args {
        show: vec!["LX_INC".to_string(), "FRAME_END".to_string()],
        width: Some(640),
        ..Default::default()
    };
    let mut viewer = setup_headless_viewer(&args);
    viewer.load_text("PPU_EVENT LX_INC cycles=10 ly=1\nPPU_EVENT SPR_FETCH_END cycles=30 ly=5\nPPU_EVENT FRAME_END");

    assert_eq!(viewer.framebuffer().width(), 640);
    assert!(viewer.toggles().is_enabled("LX_INC"));
    assert!(!viewer.toggles().is_enabled("SPR_FETCH_END"));
    assert!(!viewer.toggles().is_enabled("FRAME_END"));
    assert_eq!(viewer.last_stats().drawn, 1);

    let all = setup_headless_viewer(&crate::Args::default());
    assert_eq!(all.framebuffer().width(), DEFAULT_HEADLESS_WIDTH);
    for event_type in SUPPORTED_EVENT_TYPES {
        assert!(all.prefs().get_bool(&toggle_key(event_type), false));
    }
}

#[test]
fn test_headless_requires_trace() {
    assert!(headless_main(crate::Args { headless: true, ..Default::default() }).is_err());
}
