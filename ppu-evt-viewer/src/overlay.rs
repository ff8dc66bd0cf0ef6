use crate::{constants::DEFAULT_OVERLAY_OFFSET, prefs::Preferences, transform::CoordinateTransform};

pub const OVERLAY_OFFSET_KEY: &str = "ref-offset";
pub const OVERLAY_HIDDEN_KEY: &str = "ref-hide";

/// Placement of the reference image drawn behind the event surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceOverlay {
    /// Horizontal offset in logical cycles
    pub offset: i64,
    pub hidden: bool,
}

impl Default for ReferenceOverlay {
    fn default() -> Self {
        Self {
            offset: DEFAULT_OVERLAY_OFFSET,
            hidden: false,
        }
    }
}

impl ReferenceOverlay {
    pub fn load<P: Preferences + ?Sized>(prefs: &P) -> Self {
        Self {
            offset: prefs.get_i64(OVERLAY_OFFSET_KEY, DEFAULT_OVERLAY_OFFSET),
            hidden: prefs.get_bool(OVERLAY_HIDDEN_KEY, false),
        }
    }

    pub fn set_offset<P: Preferences + ?Sized>(&mut self, offset: i64, prefs: &mut P) {
        self.offset = offset;
        prefs.set_i64(OVERLAY_OFFSET_KEY, offset);
    }

    pub fn reset_offset<P: Preferences + ?Sized>(&mut self, prefs: &mut P) {
        self.set_offset(DEFAULT_OVERLAY_OFFSET, prefs);
    }

    pub fn set_hidden<P: Preferences + ?Sized>(&mut self, hidden: bool, prefs: &mut P) {
        self.hidden = hidden;
        prefs.set_bool(OVERLAY_HIDDEN_KEY, hidden);
    }

    /// The offset in surface pixels for the current scale
    pub fn pixel_offset(&self, t: &CoordinateTransform) -> f32 {
        t.to_px(self.offset as f32)
    }
}

#[test]
fn test_overlay_persistence() {
    use crate::prefs::MemoryPreferences;

    let mut prefs = MemoryPreferences::new();
    let mut overlay = ReferenceOverlay::load(&prefs);
    assert_eq!(overlay, ReferenceOverlay::default());
    assert_eq!(overlay.offset, 12);

    overlay.set_offset(20, &mut prefs);
    overlay.set_hidden(true, &mut prefs);
    assert_eq!(ReferenceOverlay::load(&prefs), ReferenceOverlay { offset: 20, hidden: true });

    overlay.reset_offset(&mut prefs);
    assert_eq!(prefs.get("ref-offset").as_deref(), Some("12"));

    let t = CoordinateTransform::for_surface_width(640);
    assert_eq!(overlay.pixel_offset(&t), 24.0);
}
