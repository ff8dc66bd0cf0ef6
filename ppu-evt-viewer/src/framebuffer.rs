use crate::color::Color32;
use crate::render::Surface;

pub enum FramebufferClearMode {
    /// Clears the framebuffer to the given color
    Solid(Color32),
}

/// A software RGBA8888 raster with unmultiplied alpha
///
/// This is the surface the renderer paints into. The UI uploads the whole
/// buffer as a texture after each repaint and headless mode saves it as a PNG.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Framebuffer {
    width: usize,
    height: usize,
    pub data: Vec<u8>,
}

const BPP: usize = 4;

impl Framebuffer {
    /// Creates an empty, zero-sized, place-holder framebuffer
    pub fn empty() -> Self {
        Framebuffer::new(0, 0)
    }

    /// Allocates a new, fully transparent framebuffer
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0u8; width * height * BPP],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }
    pub fn height(&self) -> usize {
        self.height
    }

    /// Reallocates the buffer if the size changed. Contents are lost either way.
    pub fn resize(&mut self, width: usize, height: usize) {
        if width != self.width || height != self.height {
            *self = Framebuffer::new(width, height);
        } else {
            self.clear(FramebufferClearMode::Solid(Color32::TRANSPARENT));
        }
    }

    pub fn pixel(&self, x: usize, y: usize) -> Color32 {
        let off = (self.width * y + x) * BPP;
        Color32([
            self.data[off],
            self.data[off + 1],
            self.data[off + 2],
            self.data[off + 3],
        ])
    }

    pub fn plot(&mut self, x: usize, y: usize, color: Color32) {
        let off = (self.width * y + x) * BPP;
        self.data[off..off + BPP].copy_from_slice(&color.0);
    }

    /// Composites `color` over the existing pixel
    pub fn blend(&mut self, x: usize, y: usize, color: Color32) {
        let dst = self.pixel(x, y);
        self.plot(x, y, color.over(dst));
    }

    pub fn clear(&mut self, mode: FramebufferClearMode) {
        match mode {
            FramebufferClearMode::Solid(color) => {
                for px in self.data.chunks_exact_mut(BPP) {
                    px.copy_from_slice(&color.0);
                }
            }
        }
    }

    /// Returns true if every pixel is fully transparent
    pub fn is_blank(&self) -> bool {
        self.data.chunks_exact(BPP).all(|px| px[3] == 0)
    }

    /// Snaps a span to whole pixels, clipped to `0..limit`
    ///
    /// Any non-empty span covers at least one pixel so thin markers stay
    /// visible at small scales.
    fn pixel_span(start: f32, len: f32, limit: usize) -> Option<(usize, usize)> {
        if !start.is_finite() || !len.is_finite() || len <= 0.0 {
            return None;
        }
        let begin = start.round();
        let mut end = (start + len).round();
        if end <= begin {
            end = begin + 1.0;
        }
        let begin = begin.max(0.0);
        let end = end.min(limit as f32);
        if begin >= end {
            return None;
        }
        Some((begin as usize, end as usize))
    }
}

impl Surface for Framebuffer {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn clear(&mut self) {
        Framebuffer::clear(self, FramebufferClearMode::Solid(Color32::TRANSPARENT));
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color32) {
        let (x0, x1) = match Framebuffer::pixel_span(x, width, self.width) {
            Some(span) => span,
            None => return,
        };
        let (y0, y1) = match Framebuffer::pixel_span(y, height, self.height) {
            Some(span) => span,
            None => return,
        };
        for py in y0..y1 {
            for px in x0..x1 {
                self.blend(px, py, color);
            }
        }
    }
}

#[test]
fn test_fill_rect_clips_and_blends() {
    let mut fb = Framebuffer::new(8, 4);
    assert!(fb.is_blank());

    fb.fill_rect(6.0, 1.0, 4.0, 2.0, Color32::from_rgb(255, 0, 0));
    assert_eq!(fb.pixel(6, 1), Color32::from_rgb(255, 0, 0));
    assert_eq!(fb.pixel(7, 2), Color32::from_rgb(255, 0, 0));
    assert_eq!(fb.pixel(5, 1), Color32::TRANSPARENT);
    assert_eq!(fb.pixel(6, 3), Color32::TRANSPARENT);

    fb.fill_rect(6.0, 1.0, 1.0, 1.0, Color32::from_rgb_opacity(0, 0, 255, 0.5));
    let mixed = fb.pixel(6, 1);
    assert_eq!(mixed.a(), 255);
    assert!(mixed.r() > 0 && mixed.b() > 0);

    // Entirely off-surface or degenerate rects draw nothing
    let before = fb.clone();
    fb.fill_rect(-10.0, 0.0, 2.0, 2.0, Color32::BLACK);
    fb.fill_rect(0.0, 0.0, 0.0, 2.0, Color32::BLACK);
    fb.fill_rect(f32::NAN, 0.0, 2.0, 2.0, Color32::BLACK);
    assert_eq!(fb, before);
}

#[test]
fn test_thin_rect_covers_one_pixel() {
    let mut fb = Framebuffer::new(4, 4);
    fb.fill_rect(1.2, 1.0, 0.1, 1.0, Color32::BLACK);
    assert_eq!(fb.pixel(1, 1), Color32::BLACK);
    assert_eq!(fb.data.chunks_exact(4).filter(|px| px[3] != 0).count(), 1);
}

#[test]
fn test_resize_clears() {
    let mut fb = Framebuffer::new(2, 2);
    fb.plot(0, 0, Color32::BLACK);
    fb.resize(2, 2);
    assert!(fb.is_blank());
    fb.resize(3, 1);
    assert_eq!(fb.data.len(), 3 * 4);
}
