use core::ops::{Deref, DerefMut};

use crate::coords::{Affine, IntRect, Vec2};
use crate::error::PixieResult;
use crate::paint::BlendMode;

use super::Vertex;

/// Opaque handle to a device texture.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TextureId(pub u64);

/// GPU texture storage.
///
/// Pixels are always straight-alpha RGBA8.
pub trait TextureDevice {
    fn max_texture_size(&self) -> u32;

    fn create_texture(&mut self, width: u32, height: u32) -> PixieResult<TextureId>;

    /// Copies `region` of a CPU surface into the same region of `id`.
    ///
    /// `pixels` is the whole surface, `surface_width` pixels per row.
    fn upload_region(
        &mut self,
        id: TextureId,
        region: IntRect,
        pixels: &[u8],
        surface_width: u32,
    ) -> PixieResult<()>;

    fn release_texture(&mut self, id: TextureId);
}

/// Anything that samples a bound texture.
pub trait ShaderTarget {
    /// Binds `id` and writes its size into the texture-size uniform.
    fn bind_texture(&mut self, id: TextureId, width: u32, height: u32);
}

/// Sprite program variants, cheapest last.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ProgramKind {
    /// Tone, color, flash, bush, invert and pattern.
    Sprite,
    /// Opacity only.
    AlphaSprite,
    /// Plain textured quad.
    SimpleSprite,
}

/// Bush cutoff line in normalized texture space.
///
/// With `bush_y` the line is `y = slope * x + intercept`, otherwise
/// `x = slope * y + intercept`. `bush_under` selects which side is occluded.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BushUniform {
    pub slope: f32,
    pub intercept: f32,
    pub bush_y: bool,
    pub bush_under: bool,
    pub opacity: f32,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PatternUniforms {
    pub texture: TextureId,
    pub size: (u32, u32),
    pub blend: BlendMode,
    pub tile: bool,
    pub zoom: Vec2,
    pub scroll: Vec2,
    pub opacity: f32,
    /// False when the pattern is fully transparent; the shader skips sampling.
    pub render: bool,
}

/// Uniform and draw surface of the sprite shader family.
pub trait SpriteShading: ShaderTarget {
    fn bind_program(&mut self, kind: ProgramKind);
    fn apply_viewport_projection(&mut self);
    fn set_sprite_matrix(&mut self, matrix: &Affine);
    fn set_opacity(&mut self, opacity: f32);
    fn set_tone(&mut self, tone: [f32; 4]);
    fn set_color(&mut self, color: [f32; 4]);
    fn set_bush(&mut self, bush: &BushUniform);
    fn set_pattern(&mut self, pattern: Option<&PatternUniforms>);
    fn set_invert(&mut self, invert: bool);

    fn blend_mode(&self) -> BlendMode;
    fn set_blend_mode(&mut self, mode: BlendMode);

    /// Draws `vertices.len() / 4` quads in one call.
    fn draw_quads(&mut self, vertices: &[Vertex]);
}

/// Blend mode pushed for the lifetime of the guard.
///
/// The previous mode is restored on drop, so every exit path of a draw
/// leaves the GPU blend state as it found it.
pub struct BlendScope<'a, S: SpriteShading + ?Sized> {
    shading: &'a mut S,
    previous: BlendMode,
}

impl<'a, S: SpriteShading + ?Sized> BlendScope<'a, S> {
    pub fn push(shading: &'a mut S, mode: BlendMode) -> Self {
        let previous = shading.blend_mode();
        shading.set_blend_mode(mode);
        Self { shading, previous }
    }
}

impl<S: SpriteShading + ?Sized> Deref for BlendScope<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.shading
    }
}

impl<S: SpriteShading + ?Sized> DerefMut for BlendScope<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.shading
    }
}

impl<S: SpriteShading + ?Sized> Drop for BlendScope<'_, S> {
    fn drop(&mut self) {
        self.shading.set_blend_mode(self.previous);
    }
}
