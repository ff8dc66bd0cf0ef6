use std::{
    num::NonZeroUsize,
    path::{Path, PathBuf},
};

use anyhow::Result;

use egui::{epaint::ImageDelta, Color32, ColorImage, RichText, TextureHandle, TextureOptions};
use ring_channel::{ring_channel, RingReceiver, RingSender, TryRecvError};

use ppu_evt_viewer::{
    event::ParsedTrace,
    framebuffer::Framebuffer,
    prefs::MemoryPreferences,
    viewer::Viewer,
};

use crate::{utils, Args};

pub mod eframe;
pub mod view;

use view::trace_events::TraceEventsView;

/// All preferences are saved as one JSON object under this eframe storage key
const PREFERENCES_STORAGE_KEY: &str = "ppu_evt_viewer_preferences";

pub fn blank_texture_for_framebuffer(ctx: &egui::Context, fb: &Framebuffer, name: &str) -> TextureHandle {
    let size = [fb.width().max(1), fb.height().max(1)];
    ctx.load_texture(name, ColorImage::new(size, Color32::TRANSPARENT), TextureOptions::NEAREST)
}

pub fn full_framebuffer_image_delta(fb: &Framebuffer) -> ImageDelta {
    ImageDelta::full(
        ColorImage::from_rgba_unmultiplied([fb.width(), fb.height()], &fb.data),
        TextureOptions::NEAREST,
    )
}

pub fn load_preferences(storage: Option<&dyn ::eframe::Storage>) -> MemoryPreferences {
    let json = match storage.and_then(|storage| storage.get_string(PREFERENCES_STORAGE_KEY)) {
        Some(json) => json,
        None => return MemoryPreferences::new(),
    };
    match MemoryPreferences::from_json(&json) {
        Ok(prefs) => prefs,
        Err(err) => {
            log::warn!("Discarding unreadable preferences: {err:?}");
            MemoryPreferences::new()
        }
    }
}

/// A trace parsed off the UI thread
struct LoadedTrace {
    path: PathBuf,
    result: Result<ParsedTrace>,
}

/// Tracks the most recent background trace load
///
/// Every load gets its own single-slot channel and only the newest receiver
/// is kept, so a superseded load can never deliver its result.
#[derive(Default)]
struct TraceLoader {
    loading: Option<PathBuf>,
    rx: Option<RingReceiver<LoadedTrace>>,
}

impl TraceLoader {
    /// Starts tracking a new load, abandoning any in flight. The returned
    /// sender is for the worker.
    fn start(&mut self, path: PathBuf) -> RingSender<LoadedTrace> {
        let (tx, rx) = ring_channel::<LoadedTrace>(NonZeroUsize::MIN);
        self.loading = Some(path);
        self.rx = Some(rx);
        tx
    }

    fn loading(&self) -> Option<&Path> {
        self.loading.as_deref()
    }

    fn poll(&mut self) -> Option<LoadedTrace> {
        let rx = self.rx.as_mut()?;
        let loaded = match rx.try_recv() {
            Ok(loaded) => Some(loaded),
            Err(TryRecvError::Empty) => return None,
            Err(err) => {
                log::error!("Trace loader exited without a result: {err:?}");
                None
            }
        };
        self.rx = None;
        self.loading = None;
        loaded
    }
}

pub struct ViewerUi {
    viewer: Viewer<MemoryPreferences>,
    trace_view: TraceEventsView,

    trace_path: Option<PathBuf>,
    loader: TraceLoader,

    // Frame requested on the command line, applied once the startup trace arrives
    pending_frame_filter: Option<usize>,

    notice: Option<(log::Level, String)>,
}

impl ViewerUi {
    pub fn new(args: Args, ctx: &egui::Context, storage: Option<&dyn ::eframe::Storage>) -> Self {
        let viewer = Viewer::new(load_preferences(storage));
        let trace_view = TraceEventsView::new(ctx, viewer.framebuffer());

        let mut ui = Self {
            viewer,
            trace_view,
            trace_path: None,
            loader: TraceLoader::default(),
            pending_frame_filter: args.frame,
            notice: None,
        };

        if let Some(ref reference) = args.reference {
            ui.open_reference_image(ctx, reference);
        }
        if let Some(ref trace) = args.trace {
            ui.open_trace(ctx, PathBuf::from(trace));
        }

        ui
    }

    fn notify(&mut self, level: log::Level, text: String) {
        log::log!(level, "{text}");
        self.notice = Some((level, text));
    }

    /// Starts reading + parsing a trace in the background
    pub fn open_trace(&mut self, ctx: &egui::Context, path: PathBuf) {
        let mut tx = self.loader.start(path.clone());
        let ctx = ctx.clone();
        std::thread::spawn(move || {
            log::debug!("Loading trace {}", path.display());
            let result = utils::read_trace_file(&path);
            if tx.send(LoadedTrace { path, result }).is_err() {
                log::debug!("Dropping trace load that was superseded");
            }
            ctx.request_repaint();
        });
    }

    fn poll_trace_loader(&mut self) {
        let loaded = match self.loader.poll() {
            Some(loaded) => loaded,
            None => return,
        };

        match loaded.result {
            Ok(trace) => {
                if trace.diagnostics.is_empty() {
                    self.notice = None;
                } else {
                    self.notify(
                        log::Level::Warn,
                        format!("{} malformed lines in {}", trace.diagnostics.len(), loaded.path.display()),
                    );
                }
                self.viewer.load_events(trace.events);
                if let Some(frame) = self.pending_frame_filter.take() {
                    self.viewer.set_frame_filter(Some(frame));
                    self.trace_view.set_frame_text(frame.to_string());
                }
                self.trace_path = Some(loaded.path);
            }
            Err(err) => self.notify(log::Level::Error, format!("{err:#}")),
        }
    }

    pub fn open_reference_image(&mut self, ctx: &egui::Context, path: impl AsRef<Path>) {
        match utils::read_rgba_image(&path) {
            Ok((width, height, data)) => {
                let image = ColorImage::from_rgba_unmultiplied([width, height], &data);
                self.trace_view.set_reference_image(ctx, image);
            }
            Err(err) => self.notify(log::Level::Error, format!("{err:#}")),
        }
    }

    fn draw_menu_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("Open Trace…").clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("Trace logs", &["log", "txt"])
                        .pick_file()
                    {
                        self.open_trace(ctx, path);
                    }
                }
                if ui.button("Open Reference Image…").clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("Images", &["png", "jpg", "jpeg", "bmp", "gif"])
                        .pick_file()
                    {
                        self.open_reference_image(ctx, path);
                    }
                }

                ui.separator();
                if let Some(path) = self.loader.loading() {
                    ui.spinner();
                    ui.label(format!("Loading {}", path.display()));
                } else if let Some(path) = &self.trace_path {
                    ui.label(path.display().to_string());
                } else {
                    ui.label("No trace loaded");
                }

                if let Some((level, text)) = &self.notice {
                    let color = match level {
                        log::Level::Error => Color32::RED,
                        log::Level::Warn => Color32::YELLOW,
                        _ => Color32::LIGHT_GRAY,
                    };
                    ui.separator();
                    ui.label(RichText::new(text).color(color));
                }
            });
        });
    }
}

impl ::eframe::App for ViewerUi {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut ::eframe::Frame) {
        self.poll_trace_loader();
        self.draw_menu_bar(ctx);
        self.trace_view.draw(&mut self.viewer, ctx);
    }

    fn save(&mut self, storage: &mut dyn ::eframe::Storage) {
        match self.viewer.prefs().to_json() {
            Ok(json) => storage.set_string(PREFERENCES_STORAGE_KEY, json),
            Err(err) => log::error!("Failed to save preferences: {err:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ppu_evt_viewer::event::parse_with_diagnostics;

    fn loaded(path: &str, text: &str) -> LoadedTrace {
        LoadedTrace {
            path: PathBuf::from(path),
            result: Ok(parse_with_diagnostics(text)),
        }
    }

    #[test]
    fn superseded_load_never_replaces_newer() {
        let mut loader = TraceLoader::default();
        assert!(loader.poll().is_none());

        let mut old_tx = loader.start(PathBuf::from("old.log"));
        let mut new_tx = loader.start(PathBuf::from("new.log"));
        assert_eq!(loader.loading(), Some(Path::new("new.log")));

        // The newer load finishes first, the older one straggles in afterwards
        assert!(new_tx.send(loaded("new.log", "PPU_EVENT LX_INC cycles=1 ly=0")).is_ok());
        let _ = old_tx.send(loaded("old.log", ""));

        let result = loader.poll().map(|loaded| loaded.path);
        assert_eq!(result, Some(PathBuf::from("new.log")));
        assert_eq!(loader.loading(), None);
        assert!(loader.poll().is_none());
    }

    #[test]
    fn worker_exit_without_result_stops_loading() {
        let mut loader = TraceLoader::default();
        drop(loader.start(PathBuf::from("gone.log")));
        assert!(loader.poll().is_none());
        assert_eq!(loader.loading(), None);
    }

    #[test]
    fn viewer_applies_only_latest_trace() {
        let ctx = egui::Context::default();
        let mut ui = ViewerUi::new(Args { frame: Some(1), ..Default::default() }, &ctx, None);

        let mut old_tx = ui.loader.start(PathBuf::from("old.log"));
        let mut new_tx = ui.loader.start(PathBuf::from("new.log"));
        assert!(new_tx
            .send(loaded(
                "new.log",
                "PPU_EVENT LX_INC cycles=1 ly=0\nPPU_EVENT FRAME_END\nPPU_EVENT LX_INC cycles=2 ly=1\nPPU_EVENT LX_INC cycles=3 ly=1"
            ))
            .is_ok());
        let _ = old_tx.send(loaded("old.log", "PPU_EVENT SPR_FETCH_END cycles=30 ly=5"));

        ui.poll_trace_loader();
        assert_eq!(ui.loader.loading(), None);
        assert_eq!(ui.trace_path.as_deref(), Some(Path::new("new.log")));
        assert_eq!(ui.viewer.trace().len(), 4);

        // The command line frame filter is applied to the first trace that arrives
        assert_eq!(ui.viewer.frame_filter(), Some(1));
        assert_eq!(ui.viewer.point_count(), 2);
        assert_eq!(ui.pending_frame_filter, None);
    }
}
