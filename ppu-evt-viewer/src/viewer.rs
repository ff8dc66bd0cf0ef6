use std::collections::HashMap;

use crate::{
    constants::LINES_PER_FRAME,
    event::{parse_with_diagnostics, Event, ParseDiagnostic},
    frame::{filter_to_frame, frame_count, frames},
    framebuffer::Framebuffer,
    hover::{hover_readout, HoverReadout},
    overlay::ReferenceOverlay,
    prefs::Preferences,
    registry::{count_types, discover_types, ToggleState},
    render::{render, RenderStats},
    transform::{CoordinateTransform, PixelPos},
};

/// A loaded trace plus everything derived from it for display
///
/// All state changes go through methods on this type which recompute the
/// derived state and repaint the framebuffer straight away, so the
/// framebuffer always reflects a fully parsed and filtered sequence.
pub struct Viewer<P: Preferences> {
    prefs: P,

    trace: Vec<Event>,
    frame_filter: Option<usize>,
    displayed: Vec<Event>,
    type_counts: HashMap<String, usize>,

    toggles: ToggleState,
    overlay: ReferenceOverlay,

    framebuffer: Framebuffer,
    last_stats: RenderStats,
    repaint_pending: bool,
}

impl<P: Preferences> Viewer<P> {
    pub fn new(prefs: P) -> Self {
        let overlay = ReferenceOverlay::load(&prefs);
        Self {
            prefs,
            trace: vec![],
            frame_filter: None,
            displayed: vec![],
            type_counts: HashMap::new(),
            toggles: ToggleState::default(),
            overlay,
            framebuffer: Framebuffer::empty(),
            last_stats: RenderStats::default(),
            repaint_pending: false,
        }
    }

    /// The surface size that fits every scanline of a frame at the given width
    pub fn surface_size_for_width(width: usize) -> (usize, usize) {
        let t = CoordinateTransform::for_surface_width(width);
        (width, t.to_px(LINES_PER_FRAME as f32).ceil() as usize)
    }

    /// Parses and loads a trace, replacing whatever was loaded before
    pub fn load_text(&mut self, text: &str) -> Vec<ParseDiagnostic> {
        let parsed = parse_with_diagnostics(text);
        self.load_events(parsed.events);
        parsed.diagnostics
    }

    /// Loads an already parsed trace. Any frame filter is cleared.
    pub fn load_events(&mut self, events: Vec<Event>) {
        log::info!("Loaded trace with {} events, {} frames", events.len(), frame_count(&events));
        self.trace = events;
        self.frame_filter = None;
        self.refresh();
    }

    /// Restricts the display to one frame of the full trace, or clears the
    /// restriction with `None`
    pub fn set_frame_filter(&mut self, frame: Option<usize>) {
        self.frame_filter = frame;
        self.refresh();
    }

    pub fn set_type_enabled(&mut self, event_type: &str, enabled: bool) {
        if self.toggles.set_enabled(event_type, enabled, &mut self.prefs) {
            self.repaint();
        }
    }

    /// Resizes the surface, repainting if the size changed
    pub fn resize(&mut self, width: usize, height: usize) {
        if width != self.framebuffer.width() || height != self.framebuffer.height() {
            log::debug!("Resizing trace surface to {width}x{height}");
            self.framebuffer.resize(width, height);
            self.repaint();
        }
    }

    pub fn set_overlay_offset(&mut self, offset: i64) {
        self.overlay.set_offset(offset, &mut self.prefs);
    }

    pub fn reset_overlay_offset(&mut self) {
        self.overlay.reset_offset(&mut self.prefs);
    }

    pub fn set_overlay_hidden(&mut self, hidden: bool) {
        self.overlay.set_hidden(hidden, &mut self.prefs);
    }

    fn refresh(&mut self) {
        self.displayed = match self.frame_filter {
            Some(frame) => filter_to_frame(&self.trace, frame),
            None => self.trace.clone(),
        };

        self.type_counts = count_types(&self.displayed);
        let types = discover_types(&self.displayed);
        let diff = self.toggles.reconcile(&types, &mut self.prefs);
        if !diff.is_empty() {
            log::debug!("Event types added: {:?}, removed: {:?}", diff.added, diff.removed);
        }

        self.repaint();
    }

    fn repaint(&mut self) {
        self.last_stats = render(&self.displayed, &self.toggles, &mut self.framebuffer);
        self.repaint_pending = true;
    }

    /// Returns `true` once after each repaint
    pub fn take_repaint(&mut self) -> bool {
        std::mem::take(&mut self.repaint_pending)
    }

    pub fn hover(&self, pointer: PixelPos) -> Option<HoverReadout> {
        hover_readout(pointer, self.framebuffer.width(), self.framebuffer.height())
    }

    pub fn transform(&self) -> CoordinateTransform {
        CoordinateTransform::for_surface_width(self.framebuffer.width())
    }

    /// Frames in the displayed sequence
    pub fn frame_count(&self) -> usize {
        frame_count(&self.displayed)
    }

    /// Frames in the full trace, regardless of any filter
    pub fn trace_frame_count(&self) -> usize {
        frame_count(&self.trace)
    }

    /// Event count for each frame of the full trace, separators excluded
    pub fn frame_event_counts(&self) -> Vec<usize> {
        frames(&self.trace).into_iter().map(|range| range.len()).collect()
    }

    /// Number of events in the displayed sequence
    pub fn point_count(&self) -> usize {
        self.displayed.len()
    }

    /// Number of displayed events of the given type
    pub fn type_count(&self, event_type: &str) -> usize {
        self.type_counts.get(event_type).copied().unwrap_or(0)
    }

    pub fn frame_filter(&self) -> Option<usize> {
        self.frame_filter
    }

    pub fn trace(&self) -> &[Event] {
        &self.trace
    }

    pub fn displayed(&self) -> &[Event] {
        &self.displayed
    }

    pub fn toggles(&self) -> &ToggleState {
        &self.toggles
    }

    pub fn overlay(&self) -> ReferenceOverlay {
        self.overlay
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    pub fn last_stats(&self) -> RenderStats {
        self.last_stats
    }

    pub fn prefs(&self) -> &P {
        &self.prefs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{color::Color32, prefs::MemoryPreferences};

    const TRACE: &str = "PPU_EVENT SPR_FETCH_START lx=10 ly=5 cycles=20\n\
                         PPU_EVENT FRAME_END\n\
                         PPU_EVENT SPR_FETCH_END cycles=30 ly=5";

    fn viewer() -> Viewer<MemoryPreferences> {
        let mut viewer = Viewer::new(MemoryPreferences::new());
        let (w, h) = Viewer::<MemoryPreferences>::surface_size_for_width(640);
        viewer.resize(w, h);
        viewer
    }

    #[test]
    fn surface_fits_a_frame() {
        assert_eq!(Viewer::<MemoryPreferences>::surface_size_for_width(640), (640, 308));
        assert_eq!(Viewer::<MemoryPreferences>::surface_size_for_width(0), (0, 0));
    }

    #[test]
    fn load_and_counts() {
        let mut viewer = viewer();
        assert!(viewer.take_repaint());
        assert_eq!(viewer.frame_count(), 0);
        assert_eq!(viewer.point_count(), 0);

        let diagnostics = viewer.load_text(TRACE);
        assert!(diagnostics.is_empty());
        assert!(viewer.take_repaint());
        assert!(!viewer.take_repaint());
        assert_eq!(viewer.frame_count(), 2);
        assert_eq!(viewer.point_count(), 3);

        let types: Vec<_> = viewer.toggles().iter().map(|t| t.event_type.as_str()).collect();
        assert_eq!(types, vec!["SPR_FETCH_START", "FRAME_END", "SPR_FETCH_END"]);
        assert_eq!(viewer.type_count("FRAME_END"), 1);
        assert_eq!(viewer.type_count("LX_INC"), 0);
    }

    #[test]
    fn toggles_persist_across_loads() {
        let mut viewer = viewer();
        viewer.load_text(TRACE);
        viewer.set_type_enabled("SPR_FETCH_END", true);
        assert!(viewer.take_repaint());
        assert_eq!(viewer.framebuffer().pixel(60, 10), Color32::from_rgb(0, 255, 0));

        assert_eq!(viewer.prefs().get("SAVE_CHECKBOX_SPR_FETCH_END").as_deref(), Some("true"));

        // A fresh session seeded with the same preferences restores the toggle
        let mut restored = Viewer::new(viewer.prefs().clone());
        restored.resize(640, 308);
        restored.load_text(TRACE);
        assert!(restored.toggles().is_enabled("SPR_FETCH_END"));
        assert_eq!(restored.framebuffer(), viewer.framebuffer());
    }

    #[test]
    fn unchanged_toggle_does_not_repaint() {
        let mut viewer = viewer();
        viewer.load_text(TRACE);
        viewer.take_repaint();
        viewer.set_type_enabled("SPR_FETCH_END", false);
        assert!(!viewer.take_repaint());
        viewer.set_type_enabled("FRAME_END", true);
        assert!(!viewer.take_repaint());
    }

    #[test]
    fn frame_filter_uses_full_trace() {
        let mut viewer = viewer();
        viewer.load_text(TRACE);

        viewer.set_frame_filter(Some(1));
        assert_eq!(viewer.point_count(), 1);
        assert_eq!(viewer.frame_count(), 1);
        assert_eq!(viewer.trace_frame_count(), 2);
        let types: Vec<_> = viewer.toggles().iter().map(|t| t.event_type.as_str()).collect();
        assert_eq!(types, vec!["SPR_FETCH_END"]);

        // Switching frames filters the whole trace again, not the previous result
        viewer.set_frame_filter(Some(0));
        assert_eq!(viewer.displayed()[0].event_type(), "SPR_FETCH_START");

        viewer.set_frame_filter(Some(99));
        assert_eq!(viewer.point_count(), 0);
        assert_eq!(viewer.frame_count(), 0);
        assert_eq!(viewer.last_stats(), RenderStats::default());

        viewer.set_frame_filter(None);
        assert_eq!(viewer.point_count(), 3);

        viewer.set_frame_filter(Some(1));
        viewer.load_text(TRACE);
        assert_eq!(viewer.frame_filter(), None);
    }

    #[test]
    fn frame_event_counts_cover_full_trace() {
        let mut viewer = viewer();
        assert!(viewer.frame_event_counts().is_empty());

        viewer.load_text("PPU_EVENT LX_INC cycles=1 ly=0\n\
                          PPU_EVENT LX_INC cycles=2 ly=0\n\
                          PPU_EVENT FRAME_END\n\
                          PPU_EVENT FRAME_END\n\
                          PPU_EVENT SPR_FETCH_END cycles=30 ly=5");
        assert_eq!(viewer.frame_event_counts(), vec![2, 0, 1]);

        // Per-frame counts describe the whole trace even while filtered, and
        // each count matches what filtering to that frame displays
        viewer.set_frame_filter(Some(2));
        let counts = viewer.frame_event_counts();
        assert_eq!(counts.len(), viewer.trace_frame_count());
        for (frame, count) in counts.into_iter().enumerate() {
            viewer.set_frame_filter(Some(frame));
            assert_eq!(viewer.point_count(), count);
        }
    }

    #[test]
    fn empty_input_is_valid() {
        let mut viewer = viewer();
        viewer.load_text("");
        assert_eq!(viewer.frame_count(), 0);
        assert_eq!(viewer.point_count(), 0);
        assert!(viewer.toggles().is_empty());
        assert!(!viewer.framebuffer().is_blank());
    }

    #[test]
    fn hover_and_overlay() {
        let mut viewer = viewer();
        let readout = viewer.hover(PixelPos { x: 201.0, y: 61.0 }).unwrap();
        assert_eq!((readout.lx, readout.ly, readout.dots), (100, 30, 180));
        assert_eq!(viewer.hover(PixelPos { x: 10.0, y: 400.0 }), None);

        assert_eq!(viewer.overlay().pixel_offset(&viewer.transform()), 24.0);
        viewer.set_overlay_offset(3);
        viewer.set_overlay_hidden(true);
        assert_eq!(viewer.prefs().get("ref-offset").as_deref(), Some("3"));
        assert_eq!(viewer.prefs().get("ref-hide").as_deref(), Some("true"));
        viewer.reset_overlay_offset();
        assert_eq!(viewer.overlay().offset, 12);
        assert!(viewer.overlay().hidden);
    }
}
