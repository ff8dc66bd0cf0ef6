use crate::constants::LOGICAL_WIDTH;

/// A position in trace space: cycle (or lx) horizontally, scanline vertically
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogicalPos {
    pub cycle: f32,
    pub line: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelPos {
    pub x: f32,
    pub y: f32,
}

/// Maps between trace space and surface pixels with one uniform scale
///
/// The scale is derived from the surface width so that the full horizontal
/// timing domain always spans the surface. It's meant to be rebuilt from the
/// current surface size for every render pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateTransform {
    scale: f32,
}

impl CoordinateTransform {
    pub fn for_surface_width(width_px: usize) -> Self {
        Self {
            scale: width_px as f32 / LOGICAL_WIDTH,
        }
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Scales a single logical length into pixels
    pub fn to_px(&self, logical: f32) -> f32 {
        logical * self.scale
    }

    pub fn to_pixel(&self, pos: LogicalPos) -> PixelPos {
        PixelPos {
            x: pos.cycle * self.scale,
            y: pos.line * self.scale,
        }
    }

    /// Inverse of [`Self::to_pixel`], floored to whole logical units
    ///
    /// Returns `None` for a zero-width surface where there's no inverse.
    pub fn to_logical(&self, pos: PixelPos) -> Option<(i64, i64)> {
        if self.scale <= 0.0 {
            return None;
        }
        let cycle = (pos.x / self.scale).floor() as i64;
        let line = (pos.y / self.scale).floor() as i64;
        Some((cycle, line))
    }
}

#[test]
fn test_scale_from_width() {
    assert_eq!(CoordinateTransform::for_surface_width(320).scale(), 1.0);
    assert_eq!(CoordinateTransform::for_surface_width(1280).scale(), 4.0);
    assert_eq!(CoordinateTransform::for_surface_width(0).to_logical(PixelPos { x: 1.0, y: 1.0 }), None);
}

#[test]
fn test_to_pixel() {
    let t = CoordinateTransform::for_surface_width(640);
    assert_eq!(
        t.to_pixel(LogicalPos { cycle: 289.0, line: 10.0 }),
        PixelPos { x: 578.0, y: 20.0 }
    );
    assert_eq!(t.to_px(8.0), 16.0);
}

#[test]
fn test_round_trip_within_a_logical_unit() {
    for width in [160usize, 320, 333, 1280, 1919] {
        let t = CoordinateTransform::for_surface_width(width);
        for x in (0..width).step_by(7) {
            for y in (0..300).step_by(11) {
                let p = PixelPos { x: x as f32, y: y as f32 };
                let (cycle, line) = t.to_logical(p).unwrap();
                let back = t.to_pixel(LogicalPos { cycle: cycle as f32, line: line as f32 });
                // Flooring loses at most one logical unit
                let tolerance = t.scale().max(1.0) + 1e-3;
                assert!(back.x <= p.x + 1e-3 && p.x - back.x < tolerance, "{width}: {p:?} -> {back:?}");
                assert!(back.y <= p.y + 1e-3 && p.y - back.y < tolerance, "{width}: {p:?} -> {back:?}");
            }
        }
    }
}

#[test]
fn test_floors_negative_positions() {
    let t = CoordinateTransform::for_surface_width(640);
    assert_eq!(t.to_logical(PixelPos { x: -1.0, y: 3.0 }), Some((-1, 1)));
}
