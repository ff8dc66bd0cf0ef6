
/// An sRGB color with unmultiplied alpha, stored as `[r, g, b, a]`
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Color32(pub [u8; 4]);

impl Color32 {
    pub const TRANSPARENT: Color32 = Color32([0, 0, 0, 0]);
    pub const BLACK: Color32 = Color32([0, 0, 0, 0xff]);

    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b, 0xff])
    }

    pub const fn from_rgba_unmultiplied(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self([r, g, b, a])
    }

    /// Takes a CSS style opacity in the range `[0, 1]` (clamped)
    pub fn from_rgb_opacity(r: u8, g: u8, b: u8, opacity: f32) -> Self {
        let a = (opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self([r, g, b, a])
    }

    pub fn r(&self) -> u8 {
        self.0[0]
    }
    pub fn g(&self) -> u8 {
        self.0[1]
    }
    pub fn b(&self) -> u8 {
        self.0[2]
    }
    pub fn a(&self) -> u8 {
        self.0[3]
    }

    /// Composites `self` over `dst` ("source-over")
    pub fn over(self, dst: Color32) -> Color32 {
        let sa = self.a() as f32 / 255.0;
        if sa >= 1.0 {
            return self;
        }
        let da = dst.a() as f32 / 255.0;
        let oa = sa + da * (1.0 - sa);
        if oa <= 0.0 {
            return Color32::TRANSPARENT;
        }
        let channel = |s: u8, d: u8| -> u8 {
            let c = (s as f32 * sa + d as f32 * da * (1.0 - sa)) / oa;
            c.round().clamp(0.0, 255.0) as u8
        };
        Color32([
            channel(self.r(), dst.r()),
            channel(self.g(), dst.g()),
            channel(self.b(), dst.b()),
            (oa * 255.0).round() as u8,
        ])
    }
}

#[test]
fn test_source_over() {
    let blue = Color32::from_rgb_opacity(0, 0, 255, 0.5);
    assert_eq!(blue.a(), 128);

    // Over nothing, the source is unchanged
    assert_eq!(blue.over(Color32::TRANSPARENT), blue);

    // Over an opaque color the result is opaque and mixed
    let mixed = blue.over(Color32::from_rgb(255, 0, 0));
    assert_eq!(mixed.a(), 255);
    assert_eq!(mixed.r(), 127);
    assert_eq!(mixed.b(), 128);

    let green = Color32::from_rgb(0, 255, 0);
    assert_eq!(green.over(mixed), green);
    assert_eq!(Color32::TRANSPARENT.over(Color32::TRANSPARENT), Color32::TRANSPARENT);
}
