use crate::{
    constants::OAM_SCAN_DOTS,
    transform::{CoordinateTransform, PixelPos},
};

/// What's shown in the tooltip while the pointer is over the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoverReadout {
    pub lx: i64,
    pub ly: i64,
    /// Estimated dot within the whole line, assuming OAM scan precedes lx 0
    pub dots: i64,
}

/// Converts a pointer position (relative to the surface's top-left) into a
/// readout, or `None` when the pointer is outside a `width` x `height` surface
pub fn hover_readout(pointer: PixelPos, width: usize, height: usize) -> Option<HoverReadout> {
    if pointer.x < 0.0 || pointer.y < 0.0 || pointer.x >= width as f32 || pointer.y >= height as f32 {
        return None;
    }
    let (lx, ly) = CoordinateTransform::for_surface_width(width).to_logical(pointer)?;
    Some(HoverReadout {
        lx,
        ly,
        dots: OAM_SCAN_DOTS + lx,
    })
}

#[test]
fn test_hover_readout() {
    let readout = hover_readout(PixelPos { x: 201.5, y: 61.0 }, 640, 320).unwrap();
    assert_eq!(readout, HoverReadout { lx: 100, ly: 30, dots: 180 });

    assert_eq!(hover_readout(PixelPos { x: 640.0, y: 0.0 }, 640, 320), None);
    assert_eq!(hover_readout(PixelPos { x: -0.5, y: 0.0 }, 640, 320), None);
    assert_eq!(hover_readout(PixelPos { x: 0.0, y: 0.0 }, 0, 0), None);
}
