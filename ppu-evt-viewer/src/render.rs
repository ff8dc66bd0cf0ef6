use std::fmt;

use crate::{
    color::Color32,
    constants::*,
    event::Event,
    registry::ToggleState,
    transform::{CoordinateTransform, LogicalPos},
};

/// A 2D drawing target that can fill axis-aligned rectangles
pub trait Surface {
    fn width(&self) -> usize;
    fn height(&self) -> usize;

    /// Resets every pixel to transparent
    fn clear(&mut self);

    /// Fills a rectangle given in (possibly fractional) pixel units, compositing
    /// `color` over what's already there
    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color32);
}

/// Why a single event couldn't be drawn
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    MissingArg { event_type: String, key: &'static str },
    NotANumber { event_type: String, key: &'static str, value: String },
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::MissingArg { event_type, key } => {
                write!(f, "{event_type} event has no value for \"{key}\"")
            }
            RenderError::NotANumber { event_type, key, value } => {
                write!(f, "{event_type} event has non-numeric {key}={value:?}")
            }
        }
    }
}

impl std::error::Error for RenderError {}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Events that matched a draw rule and were painted
    pub drawn: usize,
    /// Visible events that were skipped because of bad coordinates
    pub malformed: usize,
    /// Events skipped because their type is toggled off
    pub hidden: usize,
}

const SPR_FETCH_BAND_COLOR: Color32 = Color32::from_rgba_unmultiplied(0, 0, 255, 32);
const SPR_FETCH_MARKER_COLOR: Color32 = Color32::from_rgb(255, 0, 0);
const SPR_FETCH_END_COLOR: Color32 = Color32::from_rgb(0, 255, 0);
const LINE_END_COLOR: Color32 = Color32::from_rgb(255, 255, 0);
const LINE_END_LATE_COLOR: Color32 = Color32::from_rgb(255, 140, 0);
const LX_INC_COLOR: Color32 = Color32::from_rgba_unmultiplied(0, 0, 0, 128);
const REFERENCE_LINE_COLOR: Color32 = Color32::from_rgb(100, 100, 255);

/// Width, in logical cycles, of the band drawn for a sprite fetch
const SPR_FETCH_BAND_WIDTH: f32 = 8.0;

/// Reads a base-10 number from the event's arguments
fn number_arg(event: &Event, key: &'static str) -> Result<f32, RenderError> {
    let value = event.arg(key).ok_or_else(|| RenderError::MissingArg {
        event_type: event.event_type().to_string(),
        key,
    })?;
    match value.trim().parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(n as f32),
        _ => Err(RenderError::NotANumber {
            event_type: event.event_type().to_string(),
            key,
            value: value.to_string(),
        }),
    }
}

/// Sprite fetcher states form a small enum, shown as a red ramp that gets
/// more opaque with later states
fn fetcher_state_color(next: f32) -> Color32 {
    let red = (next * 64.0).clamp(0.0, 255.0) as u8;
    Color32::from_rgb_opacity(red, 64, 64, 0.5 + next / 8.0)
}

/// Draws one event. Returns `Ok(false)` if the type has no draw rule.
///
/// All coordinates are read before anything is painted so a malformed
/// event never leaves a partial mark.
fn draw_event<S: Surface>(event: &Event, t: &CoordinateTransform, surface: &mut S) -> Result<bool, RenderError> {
    let at = |cycle: f32, line: f32| t.to_pixel(LogicalPos { cycle, line });

    match event.event_type() {
        SPR_FETCH_START => {
            let lx = number_arg(event, "lx")?;
            let ly = number_arg(event, "ly")?;
            let cycles = number_arg(event, "cycles")?;

            let band = at(lx, ly);
            surface.fill_rect(band.x, band.y, t.to_px(SPR_FETCH_BAND_WIDTH), 3.0, SPR_FETCH_BAND_COLOR);

            let marker = at(cycles, ly);
            surface.fill_rect(marker.x, marker.y, 2.0, t.scale(), SPR_FETCH_MARKER_COLOR);
        }
        SPR_FETCH_END => {
            let p = at(number_arg(event, "cycles")?, number_arg(event, "ly")?);
            surface.fill_rect(p.x, p.y, 3.0, 3.0, SPR_FETCH_END_COLOR);
        }
        PX_FETCH_LINE_END => {
            let cycles = number_arg(event, "cycles")?;
            let p = at(cycles, number_arg(event, "ly")?);
            let color = if cycles > LINE_LENGTH_THRESHOLD {
                LINE_END_LATE_COLOR
            } else {
                LINE_END_COLOR
            };
            surface.fill_rect(p.x, p.y, 3.0, 3.0, color);
        }
        LX_INC => {
            let p = at(number_arg(event, "cycles")?, number_arg(event, "ly")?);
            surface.fill_rect(p.x, p.y, 2.0, 2.0, LX_INC_COLOR);
        }
        SPR_FETCHER_STATE_CHANGE => {
            let p = at(number_arg(event, "cycles")?, number_arg(event, "ly")?);
            let next = number_arg(event, "next")?;
            surface.fill_rect(p.x, p.y, 2.0, 2.0, fetcher_state_color(next));
        }
        _ => return Ok(false),
    }

    Ok(true)
}

/// Repaints `surface` with every visible event, followed by the line length
/// reference marker
///
/// The surface is always cleared first and the transform is derived from its
/// current width. Events with unusable coordinates are logged and skipped.
pub fn render<S: Surface>(events: &[Event], toggles: &ToggleState, surface: &mut S) -> RenderStats {
    let t = CoordinateTransform::for_surface_width(surface.width());
    let mut stats = RenderStats::default();

    surface.clear();

    for event in events {
        if !toggles.is_enabled(event.event_type()) {
            stats.hidden += 1;
            continue;
        }
        match draw_event(event, &t, surface) {
            Ok(true) => stats.drawn += 1,
            Ok(false) => {}
            Err(err) => {
                log::warn!("Skipping malformed event ({err}): {event}");
                stats.malformed += 1;
            }
        }
    }

    let height = surface.height() as f32;
    surface.fill_rect(t.to_px(LINE_LENGTH_THRESHOLD), 0.0, 2.0, height, REFERENCE_LINE_COLOR);

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{event::parse, framebuffer::Framebuffer, frame::filter_to_frame, prefs::MemoryPreferences, registry::discover_types};

    fn all_on(events: &[Event]) -> ToggleState {
        let mut prefs = MemoryPreferences::new();
        let types = discover_types(events);
        let mut toggles = ToggleState::build(&types, &mut prefs);
        for t in types.iter() {
            toggles.set_enabled(t, true, &mut prefs);
        }
        toggles
    }

    fn reference_only(width: usize, height: usize) -> Framebuffer {
        let mut fb = Framebuffer::new(width, height);
        render(&[], &ToggleState::default(), &mut fb);
        fb
    }

    #[test]
    fn draws_reference_line_only_for_empty_input() {
        let fb = reference_only(640, 320);
        // 289 * 2 = 578
        assert_eq!(fb.pixel(578, 0), REFERENCE_LINE_COLOR);
        assert_eq!(fb.pixel(579, 319), REFERENCE_LINE_COLOR);
        assert_eq!(fb.pixel(577, 10), Color32::TRANSPARENT);
        assert_eq!(fb.pixel(580, 10), Color32::TRANSPARENT);
    }

    #[test]
    fn draw_rules() {
        let events = parse(
            "PPU_EVENT SPR_FETCH_END cycles=30 ly=5\n\
             PPU_EVENT PX_FETCH_LINE_END cycles=250 ly=10\n\
             PPU_EVENT PX_FETCH_LINE_END cycles=290 ly=20\n\
             PPU_EVENT LX_INC cycles=100 ly=30 lx=4",
        );
        let mut fb = Framebuffer::new(640, 320);
        let stats = render(&events, &all_on(&events), &mut fb);
        assert_eq!(stats, RenderStats { drawn: 4, malformed: 0, hidden: 0 });

        assert_eq!(fb.pixel(60, 10), SPR_FETCH_END_COLOR);
        assert_eq!(fb.pixel(62, 12), SPR_FETCH_END_COLOR);
        assert_eq!(fb.pixel(63, 10), Color32::TRANSPARENT);

        assert_eq!(fb.pixel(500, 20), LINE_END_COLOR);
        assert_eq!(fb.pixel(580, 40), LINE_END_LATE_COLOR);

        assert_eq!(fb.pixel(200, 60), LX_INC_COLOR);
        assert_eq!(fb.pixel(201, 61), LX_INC_COLOR);
        assert_eq!(fb.pixel(202, 60), Color32::TRANSPARENT);
    }

    #[test]
    fn sprite_fetch_start_draws_band_and_marker() {
        let events = parse("PPU_EVENT SPR_FETCH_START lx=10 ly=5 cycles=40");
        let mut fb = Framebuffer::new(640, 320);
        render(&events, &all_on(&events), &mut fb);

        // Band: 8 logical units wide, 3px tall at (20, 10)
        assert_eq!(fb.pixel(20, 10), SPR_FETCH_BAND_COLOR);
        assert_eq!(fb.pixel(35, 12), SPR_FETCH_BAND_COLOR);
        assert_eq!(fb.pixel(36, 10), Color32::TRANSPARENT);
        assert_eq!(fb.pixel(20, 13), Color32::TRANSPARENT);

        // Marker: 2px wide, one logical line tall at (80, 10)
        assert_eq!(fb.pixel(80, 10), SPR_FETCH_MARKER_COLOR);
        assert_eq!(fb.pixel(81, 11), SPR_FETCH_MARKER_COLOR);
        assert_eq!(fb.pixel(80, 12), Color32::TRANSPARENT);
    }

    #[test]
    fn fetcher_state_ramp() {
        assert_eq!(fetcher_state_color(0.0), Color32::from_rgba_unmultiplied(0, 64, 64, 128));
        assert_eq!(fetcher_state_color(2.0), Color32::from_rgba_unmultiplied(128, 64, 64, 191));
        assert_eq!(fetcher_state_color(5.0), Color32::from_rgb(255, 64, 64));

        let events = parse("PPU_EVENT SPR_FETCHER_STATE_CHANGE cycles=10 ly=1 next=5 prev=4");
        let mut fb = Framebuffer::new(320, 160);
        render(&events, &all_on(&events), &mut fb);
        assert_eq!(fb.pixel(10, 1), Color32::from_rgb(255, 64, 64));
    }

    #[test]
    fn malformed_event_is_skipped() {
        let events = parse(
            "PPU_EVENT SPR_FETCH_END cycles=abc ly=5\n\
             PPU_EVENT SPR_FETCH_START lx=10 ly=5\n\
             PPU_EVENT SPR_FETCH_END cycles=30 ly=5",
        );
        let mut fb = Framebuffer::new(640, 320);
        let stats = render(&events, &all_on(&events), &mut fb);
        assert_eq!(stats.drawn, 1);
        assert_eq!(stats.malformed, 2);

        // The bad SPR_FETCH_START drew neither its band nor its marker
        assert_eq!(fb.pixel(20, 10), Color32::TRANSPARENT);
        assert_eq!(fb.pixel(60, 10), SPR_FETCH_END_COLOR);
    }

    #[test]
    fn number_arg_errors() {
        let event = Event::new("LX_INC").with_arg("cycles", "12x");
        assert_eq!(
            number_arg(&event, "cycles"),
            Err(RenderError::NotANumber {
                event_type: "LX_INC".to_string(),
                key: "cycles",
                value: "12x".to_string()
            })
        );
        assert!(matches!(number_arg(&event, "ly"), Err(RenderError::MissingArg { .. })));
        assert!(number_arg(&Event::new("LX_INC").with_arg("ly", "inf"), "ly").is_err());
        assert_eq!(number_arg(&Event::new("LX_INC").with_arg("ly", "7.5"), "ly"), Ok(7.5));
    }

    #[test]
    fn hidden_type_leaves_no_pixels() {
        let events = parse(
            "PPU_EVENT SPR_FETCH_END cycles=30 ly=5\n\
             PPU_EVENT LX_INC cycles=100 ly=30\n\
             PPU_EVENT SPR_FETCH_END cycles=31 ly=6",
        );
        let mut prefs = MemoryPreferences::new();
        let mut toggles = all_on(&events);
        toggles.set_enabled("SPR_FETCH_END", false, &mut prefs);

        let mut fb = Framebuffer::new(640, 320);
        let stats = render(&events, &toggles, &mut fb);
        assert_eq!(stats.hidden, 2);

        let lx_inc_only: Vec<Event> = events.iter().filter(|e| e.event_type() == "LX_INC").cloned().collect();
        let mut baseline = Framebuffer::new(640, 320);
        render(&lx_inc_only, &all_on(&lx_inc_only), &mut baseline);
        assert_eq!(fb, baseline);
    }

    #[test]
    fn full_repaint_after_toggle_off() {
        let events = parse("PPU_EVENT LX_INC cycles=100 ly=30");
        let mut fb = Framebuffer::new(640, 320);
        render(&events, &all_on(&events), &mut fb);
        assert_ne!(fb, reference_only(640, 320));

        render(&events, &ToggleState::default(), &mut fb);
        assert_eq!(fb, reference_only(640, 320));
    }

    #[test]
    fn out_of_range_frame_renders_reference_only() {
        let events = parse(
            "PPU_EVENT SPR_FETCH_START lx=10 ly=5 cycles=20\n\
             PPU_EVENT FRAME_END\n\
             PPU_EVENT SPR_FETCH_END cycles=30 ly=5",
        );
        let filtered = filter_to_frame(&events, 99);
        assert!(filtered.is_empty());

        let mut fb = Framebuffer::new(640, 320);
        let stats = render(&filtered, &all_on(&events), &mut fb);
        assert_eq!(stats, RenderStats::default());
        assert_eq!(fb, reference_only(640, 320));
    }
}
