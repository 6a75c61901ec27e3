use crate::bitmap::SharedBitmap;
use crate::error::{PixieError, PixieResult};
use crate::paint::NormValue;
use crate::render::{
    BlendScope, BushUniform, PatternUniforms, ProgramKind, SpriteShading, TextureDevice,
};

use super::Sprite;

impl Sprite {
    /// Shader path `draw` would take right now.
    pub fn program(&self) -> ProgramKind {
        let effects = self.tone.has_effect()
            || self.color.has_effect()
            || self.flash.is_flashing()
            || self.bush_depth != 0
            || self.invert
            || self.live_pattern().is_some();
        if effects {
            ProgramKind::Sprite
        } else if self.opacity != NormValue::OPAQUE {
            ProgramKind::AlphaSprite
        } else {
            ProgramKind::SimpleSprite
        }
    }

    /// Draws with the state resolved by the last `prepare`.
    ///
    /// Invisible sprites and colorless flashes draw nothing.
    pub fn draw<D, S>(&mut self, device: &mut D, shading: &mut S) -> PixieResult<()>
    where
        D: TextureDevice + ?Sized,
        S: SpriteShading + ?Sized,
    {
        self.ensure_live()?;
        if !self.visible || self.flash.is_empty() {
            return Ok(());
        }
        let Some(bitmap) = self.live_bitmap() else {
            log::debug!("sprite bitmap went away after prepare; skipping draw");
            return Ok(());
        };

        let matrix = self.transform.matrix();
        match self.program() {
            ProgramKind::Sprite => {
                let pattern = self.live_pattern().and_then(|p| self.pattern_uniforms(&p, device));
                let bush = self.bush.peek();
                shading.bind_program(ProgramKind::Sprite);
                shading.apply_viewport_projection();
                shading.set_sprite_matrix(&matrix);
                shading.set_tone(self.tone.norm());
                shading.set_opacity(self.opacity.norm());
                shading.set_bush(&BushUniform {
                    slope: bush.slope,
                    intercept: bush.intercept,
                    bush_y: bush.bush_y,
                    bush_under: bush.bush_under,
                    opacity: self.bush_opacity.norm(),
                });
                shading.set_pattern(pattern.as_ref());
                shading.set_invert(self.invert);
                shading.set_color(self.blended_color());
            }
            ProgramKind::AlphaSprite => {
                shading.bind_program(ProgramKind::AlphaSprite);
                shading.set_sprite_matrix(&matrix);
                shading.set_opacity(self.opacity.norm());
                shading.apply_viewport_projection();
            }
            ProgramKind::SimpleSprite => {
                shading.bind_program(ProgramKind::SimpleSprite);
                shading.set_sprite_matrix(&matrix);
                shading.apply_viewport_projection();
            }
        }

        let mut scope = BlendScope::push(shading, self.blend);
        {
            let mut b = bitmap
                .try_borrow_mut()
                .map_err(|_| PixieError::invalid_state("sprite bitmap is borrowed during draw"))?;
            b.bind_tex(device, &mut *scope)?;
        }

        let mesh = self.wave_mesh.peek();
        if mesh.active {
            if !mesh.vertices.is_empty() {
                scope.draw_quads(&mesh.vertices);
            }
        } else {
            scope.draw_quads(&self.quad.vertices());
        }
        Ok(())
    }

    /// Flash color replaces the overlay while its alpha is strictly higher.
    fn blended_color(&self) -> [f32; 4] {
        let overlay = self.color.norm();
        let flash = self.flash.color();
        if self.flash.is_flashing() && flash[3] > overlay[3] {
            flash
        } else {
            overlay
        }
    }

    fn pattern_uniforms<D: TextureDevice + ?Sized>(
        &self,
        pattern: &SharedBitmap,
        device: &mut D,
    ) -> Option<PatternUniforms> {
        let Ok(mut p) = pattern.try_borrow_mut() else {
            log::warn!("pattern bitmap busy; drawing without pattern");
            return None;
        };
        if p.has_hires() {
            log::debug!("hires pattern bitmaps are not supported; drawing without pattern");
            return None;
        }
        match p.texture(device) {
            Ok((texture, w, h)) => Some(PatternUniforms {
                texture,
                size: (w, h),
                blend: self.pattern_blend,
                tile: self.pattern_tile,
                zoom: self.pattern_zoom,
                scroll: self.pattern_scroll,
                opacity: self.pattern_opacity.norm(),
                render: self.pattern_opacity.get() > 0,
            }),
            Err(e) => {
                log::warn!("pattern bitmap unusable: {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::bitmap::{Bitmap, SharedBitmap};
    use crate::coords::{IntRect, Vec2i};
    use crate::paint::{BlendMode, Color, Tone};
    use crate::render::{Call, ProgramKind, RecordingBackend};
    use crate::scene::SceneGeometry;

    use super::*;

    fn setup(w: u32, h: u32) -> (SharedBitmap, Sprite) {
        let b = Bitmap::with_size(w, h, false).unwrap().into_shared();
        let mut s = Sprite::with_geometry(&SceneGeometry::new(IntRect::new(0, 0, 100, 100), Vec2i::default()));
        s.set_bitmap(Some(&b)).unwrap();
        (b, s)
    }

    fn draw(s: &mut Sprite) -> (RecordingBackend, RecordingBackend) {
        let mut dev = RecordingBackend::new();
        let mut gl = RecordingBackend::new();
        s.prepare().unwrap();
        s.draw(&mut dev, &mut gl).unwrap();
        (dev, gl)
    }

    // ── path selection ───────────────────────────────────────────────────

    #[test]
    fn plain_sprite_uses_simple_path() {
        let (_b, mut s) = setup(16, 16);
        let (_, gl) = draw(&mut s);
        assert_eq!(gl.programs(), vec![ProgramKind::SimpleSprite]);
        assert_eq!(gl.draws().len(), 1);
        assert_eq!(gl.draws()[0].len(), 4);
    }

    #[test]
    fn translucent_sprite_uses_alpha_path() {
        let (_b, mut s) = setup(16, 16);
        s.set_opacity(100).unwrap();
        let (_, gl) = draw(&mut s);
        assert_eq!(gl.programs(), vec![ProgramKind::AlphaSprite]);
        assert!(gl.calls().contains(&Call::Opacity(100.0 / 255.0)));
    }

    #[test]
    fn effects_force_full_path() {
        let (_b, mut s) = setup(16, 16);
        s.set_tone(Tone::new(10.0, 0.0, 0.0, 0.0)).unwrap();
        assert_eq!(s.program(), ProgramKind::Sprite);
        s.set_tone(Tone::default()).unwrap();
        s.set_bush_depth(4).unwrap();
        assert_eq!(s.program(), ProgramKind::Sprite);
        s.set_bush_depth(0).unwrap();
        s.set_invert(true).unwrap();
        assert_eq!(s.program(), ProgramKind::Sprite);
        s.set_invert(false).unwrap();
        s.flash(Some(Color::rgb(255.0, 255.0, 255.0)), 3).unwrap();
        assert_eq!(s.program(), ProgramKind::Sprite);
    }

    #[test]
    fn full_path_uploads_bush_and_color() {
        let (_b, mut s) = setup(64, 64);
        s.set_bush_depth(10).unwrap();
        s.set_color(Color::new(255.0, 0.0, 0.0, 51.0)).unwrap();
        let (_, gl) = draw(&mut s);
        let bush = gl.calls().iter().find_map(|c| match c {
            Call::Bush(b) => Some(*b),
            _ => None,
        });
        let bush = bush.unwrap();
        assert!((bush.intercept - 54.0 / 64.0).abs() < 1e-4);
        assert_eq!(bush.opacity, 128.0 / 255.0);
        assert!(gl.calls().contains(&Call::Color([1.0, 0.0, 0.0, 0.2])));
        assert!(gl.calls().contains(&Call::Pattern(None)));
    }

    #[test]
    fn stronger_flash_replaces_overlay_color() {
        let (_b, mut s) = setup(8, 8);
        s.set_color(Color::new(0.0, 0.0, 255.0, 51.0)).unwrap();
        s.flash(Some(Color::new(255.0, 255.0, 255.0, 255.0)), 10).unwrap();
        let (_, gl) = draw(&mut s);
        assert!(gl.calls().contains(&Call::Color([1.0, 1.0, 1.0, 1.0])));
    }

    #[test]
    fn pattern_uniforms_follow_properties() {
        let (_b, mut s) = setup(8, 8);
        let p = Bitmap::with_size(4, 4, false).unwrap().into_shared();
        s.set_pattern(Some(&p)).unwrap();
        s.set_pattern_opacity(0).unwrap();
        s.set_pattern_blend_type(1).unwrap();
        let (dev, gl) = draw(&mut s);
        let uniforms = gl.calls().iter().find_map(|c| match c {
            Call::Pattern(Some(u)) => Some(*u),
            _ => None,
        });
        let u = uniforms.unwrap();
        assert!(!u.render);
        assert!(u.tile);
        assert_eq!(u.blend, BlendMode::Additive);
        assert_eq!(u.size, (4, 4));
        assert_eq!(dev.live_textures(), 2);
    }

    #[test]
    fn hires_pattern_is_skipped() {
        let (_b, mut s) = setup(8, 8);
        let p = Bitmap::with_size(4, 4, true).unwrap().into_shared();
        s.set_pattern(Some(&p)).unwrap();
        let (_, gl) = draw(&mut s);
        assert_eq!(gl.programs(), vec![ProgramKind::Sprite]);
        assert!(gl.calls().contains(&Call::Pattern(None)));
        assert_eq!(gl.draws().len(), 1);
    }

    // ── draw state ───────────────────────────────────────────────────────

    #[test]
    fn blend_mode_is_restored_after_draw() {
        let (_b, mut s) = setup(8, 8);
        s.set_blend_type(2).unwrap();
        let (_, gl) = draw(&mut s);
        let blends: Vec<_> = gl
            .calls()
            .iter()
            .filter_map(|c| match c {
                Call::SetBlend(m) => Some(*m),
                _ => None,
            })
            .collect();
        assert_eq!(blends, vec![BlendMode::Subtractive, BlendMode::Normal]);
        let bind = gl.calls().iter().position(|c| matches!(c, Call::BindTexture { .. })).unwrap();
        let draw = gl.calls().iter().position(|c| matches!(c, Call::DrawQuads(_))).unwrap();
        assert!(bind < draw);
    }

    #[test]
    fn bitmap_is_uploaded_once_across_draws() {
        let (_b, mut s) = setup(8, 8);
        let mut dev = RecordingBackend::new();
        let mut gl = RecordingBackend::new();
        for _ in 0..3 {
            s.prepare().unwrap();
            s.draw(&mut dev, &mut gl).unwrap();
        }
        assert_eq!(dev.uploads().len(), 1);
        assert_eq!(gl.draws().len(), 3);
    }

    #[test]
    fn wave_strips_share_one_draw() {
        let (_b, mut s) = setup(8, 24);
        s.set_wave_amp(3).unwrap();
        let (_, gl) = draw(&mut s);
        assert_eq!(gl.draws().len(), 1);
        assert_eq!(gl.draws()[0].len(), 3 * 4);
    }

    #[test]
    fn degenerate_wave_draws_nothing() {
        let (_b, mut s) = setup(20, 8);
        s.set_wave_amp(-11).unwrap();
        let (_, gl) = draw(&mut s);
        assert!(gl.draws().is_empty());
    }

    #[test]
    fn colorless_flash_skips_draw() {
        let (_b, mut s) = setup(8, 8);
        s.flash(None, 2).unwrap();
        let (dev, gl) = draw(&mut s);
        assert!(gl.calls().is_empty());
        assert!(dev.calls().is_empty());
    }

    #[test]
    fn invisible_sprite_skips_draw() {
        let (_b, mut s) = setup(8, 8);
        s.set_opacity(0).unwrap();
        let (_, gl) = draw(&mut s);
        assert!(gl.calls().is_empty());
    }

    #[test]
    fn disposed_sprite_cannot_draw() {
        let (_b, mut s) = setup(8, 8);
        s.dispose();
        let mut dev = RecordingBackend::new();
        let mut gl = RecordingBackend::new();
        assert!(matches!(s.draw(&mut dev, &mut gl), Err(PixieError::Disposed { .. })));
    }
}
