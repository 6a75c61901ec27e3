//! Color model shared by bitmaps and sprites.
//!
//! Scope:
//! - script-facing color and tone values (0..255 ranges, clamped)
//! - 8-bit pixel type stored in bitmap surfaces
//! - blend modes and their GPU blend states

mod blend;
mod color;
mod tone;

pub use blend::BlendMode;
pub use color::{Color, Rgba8};
pub use tone::Tone;

/// An 8-bit opacity-like property (`0..=255`), clamped on assignment.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct NormValue(u8);

impl NormValue {
    pub const OPAQUE: NormValue = NormValue(255);

    #[inline]
    pub fn new(value: i32) -> Self {
        Self(value.clamp(0, 255) as u8)
    }

    #[inline]
    pub fn get(self) -> u8 {
        self.0
    }

    /// Value divided by 255, as uploaded to shaders.
    #[inline]
    pub fn norm(self) -> f32 {
        self.0 as f32 / 255.0
    }
}

impl Default for NormValue {
    fn default() -> Self {
        Self::OPAQUE
    }
}
