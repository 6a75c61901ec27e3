use bytemuck::{Pod, Zeroable};

/// Script-facing RGBA color, each channel in `0..=255`.
///
/// Channels are clamped on construction and on every setter. Shaders receive
/// the normalized form from [`Color::norm`].
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Color {
    red: f32,
    green: f32,
    blue: f32,
    alpha: f32,
}

impl Color {
    pub const TRANSPARENT: Color = Color {
        red: 0.0,
        green: 0.0,
        blue: 0.0,
        alpha: 0.0,
    };

    #[inline]
    pub fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red: clamp_channel(red),
            green: clamp_channel(green),
            blue: clamp_channel(blue),
            alpha: clamp_channel(alpha),
        }
    }

    #[inline]
    pub fn rgb(red: f32, green: f32, blue: f32) -> Self {
        Self::new(red, green, blue, 255.0)
    }

    #[inline]
    pub fn red(&self) -> f32 {
        self.red
    }

    #[inline]
    pub fn green(&self) -> f32 {
        self.green
    }

    #[inline]
    pub fn blue(&self) -> f32 {
        self.blue
    }

    #[inline]
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn set_red(&mut self, v: f32) {
        self.red = clamp_channel(v);
    }

    pub fn set_green(&mut self, v: f32) {
        self.green = clamp_channel(v);
    }

    pub fn set_blue(&mut self, v: f32) {
        self.blue = clamp_channel(v);
    }

    pub fn set_alpha(&mut self, v: f32) {
        self.alpha = clamp_channel(v);
    }

    /// Channels divided by 255.
    #[inline]
    pub fn norm(&self) -> [f32; 4] {
        [
            self.red / 255.0,
            self.green / 255.0,
            self.blue / 255.0,
            self.alpha / 255.0,
        ]
    }

    /// A color overlay only changes the output when it is not fully transparent.
    #[inline]
    pub fn has_effect(&self) -> bool {
        self.alpha != 0.0
    }

    /// Rounds to an 8-bit pixel.
    #[inline]
    pub fn to_rgba8(&self) -> Rgba8 {
        Rgba8([
            self.red.round() as u8,
            self.green.round() as u8,
            self.blue.round() as u8,
            self.alpha.round() as u8,
        ])
    }
}

impl From<Rgba8> for Color {
    #[inline]
    fn from(p: Rgba8) -> Self {
        let [r, g, b, a] = p.0;
        Color::new(r as f32, g as f32, b as f32, a as f32)
    }
}

#[inline]
fn clamp_channel(v: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 255.0) }
}

/// Straight-alpha 8-bit pixel as stored in bitmap surfaces.
#[repr(transparent)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct Rgba8(pub [u8; 4]);

impl Rgba8 {
    pub const TRANSPARENT: Rgba8 = Rgba8([0, 0, 0, 0]);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self([r, g, b, a])
    }

    #[inline]
    pub const fn alpha(self) -> u8 {
        self.0[3]
    }

    /// Channel-wise linear interpolation, `t` in [0, 1].
    pub fn lerp(self, other: Rgba8, t: f32) -> Rgba8 {
        let t = t.clamp(0.0, 1.0);
        let mut out = [0u8; 4];
        for (i, o) in out.iter_mut().enumerate() {
            let a = self.0[i] as f32;
            let b = other.0[i] as f32;
            *o = (a + (b - a) * t).round() as u8;
        }
        Rgba8(out)
    }
}
