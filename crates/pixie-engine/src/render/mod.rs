//! Rendering seams.
//!
//! Bitmaps and sprites never talk to wgpu directly. They go through two traits:
//! - [`TextureDevice`]: create, upload and release RGBA8 textures
//! - [`SpriteShading`]: program selection, uniforms, blend state, draw calls
//!
//! Convention:
//! - Vertex positions are sprite-local pixels; the sprite matrix maps them to
//!   scene space and the projection maps scene space to NDC.
//! - Texture coordinates are source pixels.

mod backend;
pub mod caps;
mod quad;
mod record;

pub use backend::{
    BlendScope, BushUniform, PatternUniforms, ProgramKind, ShaderTarget, SpriteShading,
    TextureDevice, TextureId,
};
pub use quad::{Quad, Vertex};
pub use record::{Call, RecordingBackend};
