use std::collections::HashSet;

use crate::coords::{Affine, IntRect};
use crate::error::{PixieError, PixieResult};
use crate::paint::BlendMode;

use super::{
    BushUniform, PatternUniforms, ProgramKind, ShaderTarget, SpriteShading, TextureDevice,
    TextureId, Vertex, caps,
};

/// One observed backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateTexture { id: TextureId, width: u32, height: u32 },
    Upload { id: TextureId, region: IntRect },
    Release(TextureId),
    BindTexture { id: TextureId, width: u32, height: u32 },
    BindProgram(ProgramKind),
    ApplyProjection,
    SpriteMatrix(Affine),
    Opacity(f32),
    Tone([f32; 4]),
    Color([f32; 4]),
    Bush(BushUniform),
    Pattern(Option<PatternUniforms>),
    Invert(bool),
    SetBlend(BlendMode),
    DrawQuads(Vec<Vertex>),
}

/// Device and shader stand-in that records every call.
///
/// Useful wherever draw-path selection or upload traffic must be observed
/// without a GPU.
#[derive(Debug)]
pub struct RecordingBackend {
    calls: Vec<Call>,
    blend: BlendMode,
    max_texture_size: u32,
    next_texture: u64,
    live: HashSet<TextureId>,
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self::with_max_texture_size(caps::max_texture_size())
    }
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_texture_size(max_texture_size: u32) -> Self {
        Self {
            calls: Vec::new(),
            blend: BlendMode::Normal,
            max_texture_size,
            next_texture: 1,
            live: HashSet::new(),
        }
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<Call> {
        std::mem::take(&mut self.calls)
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }

    pub fn live_textures(&self) -> usize {
        self.live.len()
    }

    pub fn is_live(&self, id: TextureId) -> bool {
        self.live.contains(&id)
    }

    /// Vertex payloads of every draw, in submission order.
    pub fn draws(&self) -> Vec<&[Vertex]> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::DrawQuads(v) => Some(v.as_slice()),
                _ => None,
            })
            .collect()
    }

    pub fn programs(&self) -> Vec<ProgramKind> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::BindProgram(k) => Some(*k),
                _ => None,
            })
            .collect()
    }

    pub fn uploads(&self) -> Vec<(TextureId, IntRect)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Upload { id, region } => Some((*id, *region)),
                _ => None,
            })
            .collect()
    }
}

impl TextureDevice for RecordingBackend {
    fn max_texture_size(&self) -> u32 {
        self.max_texture_size
    }

    fn create_texture(&mut self, width: u32, height: u32) -> PixieResult<TextureId> {
        if width == 0 || height == 0 {
            return Err(PixieError::resource(format!("zero-sized texture {width}x{height}")));
        }
        if width > self.max_texture_size || height > self.max_texture_size {
            return Err(PixieError::resource(format!(
                "texture {width}x{height} exceeds device limit {}",
                self.max_texture_size
            )));
        }
        let id = TextureId(self.next_texture);
        self.next_texture += 1;
        self.live.insert(id);
        self.calls.push(Call::CreateTexture { id, width, height });
        Ok(id)
    }

    fn upload_region(
        &mut self,
        id: TextureId,
        region: IntRect,
        _pixels: &[u8],
        _surface_width: u32,
    ) -> PixieResult<()> {
        if !self.live.contains(&id) {
            return Err(PixieError::invalid_state(format!("upload to unknown texture {id:?}")));
        }
        self.calls.push(Call::Upload { id, region });
        Ok(())
    }

    fn release_texture(&mut self, id: TextureId) {
        if self.live.remove(&id) {
            self.calls.push(Call::Release(id));
        }
    }
}

impl ShaderTarget for RecordingBackend {
    fn bind_texture(&mut self, id: TextureId, width: u32, height: u32) {
        self.calls.push(Call::BindTexture { id, width, height });
    }
}

impl SpriteShading for RecordingBackend {
    fn bind_program(&mut self, kind: ProgramKind) {
        self.calls.push(Call::BindProgram(kind));
    }

    fn apply_viewport_projection(&mut self) {
        self.calls.push(Call::ApplyProjection);
    }

    fn set_sprite_matrix(&mut self, matrix: &Affine) {
        self.calls.push(Call::SpriteMatrix(*matrix));
    }

    fn set_opacity(&mut self, opacity: f32) {
        self.calls.push(Call::Opacity(opacity));
    }

    fn set_tone(&mut self, tone: [f32; 4]) {
        self.calls.push(Call::Tone(tone));
    }

    fn set_color(&mut self, color: [f32; 4]) {
        self.calls.push(Call::Color(color));
    }

    fn set_bush(&mut self, bush: &BushUniform) {
        self.calls.push(Call::Bush(*bush));
    }

    fn set_pattern(&mut self, pattern: Option<&PatternUniforms>) {
        self.calls.push(Call::Pattern(pattern.copied()));
    }

    fn set_invert(&mut self, invert: bool) {
        self.calls.push(Call::Invert(invert));
    }

    fn blend_mode(&self) -> BlendMode {
        self.blend
    }

    fn set_blend_mode(&mut self, mode: BlendMode) {
        self.blend = mode;
        self.calls.push(Call::SetBlend(mode));
    }

    fn draw_quads(&mut self, vertices: &[Vertex]) {
        self.calls.push(Call::DrawQuads(vertices.to_vec()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::BlendScope;

    #[test]
    fn textures_are_tracked_until_released() {
        let mut b = RecordingBackend::with_max_texture_size(64);
        let id = b.create_texture(8, 8).unwrap();
        assert!(b.is_live(id));
        b.release_texture(id);
        b.release_texture(id);
        assert_eq!(b.live_textures(), 0);
        assert_eq!(b.calls().iter().filter(|c| matches!(c, Call::Release(_))).count(), 1);
    }

    #[test]
    fn oversized_texture_is_a_resource_error() {
        let mut b = RecordingBackend::with_max_texture_size(64);
        assert!(b.create_texture(65, 1).unwrap_err().is_resource());
    }

    #[test]
    fn blend_scope_restores_previous_mode() {
        let mut b = RecordingBackend::new();
        b.set_blend_mode(BlendMode::Additive);
        {
            let mut scope = BlendScope::push(&mut b, BlendMode::Subtractive);
            assert_eq!(scope.blend_mode(), BlendMode::Subtractive);
            scope.draw_quads(&[]);
        }
        assert_eq!(b.blend_mode(), BlendMode::Additive);
        let tail: Vec<_> = b.calls()[1..].to_vec();
        assert_eq!(
            tail,
            vec![
                Call::SetBlend(BlendMode::Subtractive),
                Call::DrawQuads(vec![]),
                Call::SetBlend(BlendMode::Additive),
            ]
        );
    }
}
