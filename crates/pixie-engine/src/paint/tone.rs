/// Tone shift applied by the sprite shader.
///
/// `red`, `green`, `blue` in `-255..=255`, `gray` (desaturation) in `0..=255`.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Tone {
    red: f32,
    green: f32,
    blue: f32,
    gray: f32,
}

impl Tone {
    #[inline]
    pub fn new(red: f32, green: f32, blue: f32, gray: f32) -> Self {
        Self {
            red: clamp(red, -255.0),
            green: clamp(green, -255.0),
            blue: clamp(blue, -255.0),
            gray: clamp(gray, 0.0),
        }
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
    pub fn gray(&self) -> f32 {
        self.gray
    }

    #[inline]
    pub fn norm(&self) -> [f32; 4] {
        [
            self.red / 255.0,
            self.green / 255.0,
            self.blue / 255.0,
            self.gray / 255.0,
        ]
    }

    #[inline]
    pub fn has_effect(&self) -> bool {
        self.red != 0.0 || self.green != 0.0 || self.blue != 0.0 || self.gray != 0.0
    }
}

#[inline]
fn clamp(v: f32, min: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(min, 255.0) }
}
