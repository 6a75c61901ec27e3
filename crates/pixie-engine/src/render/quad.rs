use bytemuck::{Pod, Zeroable};

use crate::coords::Rect;

/// Sprite vertex: screen position in sprite-local pixels plus texel coordinates.
///
/// Texture coordinates are in source pixels, not 0..1; the shader divides by
/// the bound texture size.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub pos: [f32; 2],
    pub tex: [f32; 2],
}

/// Textured rectangle. A negative texture width samples mirrored.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Quad {
    pub tex: Rect,
    pub pos: Rect,
}

impl Quad {
    #[inline]
    pub const fn new(tex: Rect, pos: Rect) -> Self {
        Self { tex, pos }
    }

    /// Corners in top-left, top-right, bottom-right, bottom-left order.
    pub fn vertices(&self) -> [Vertex; 4] {
        let (p0, p1) = (self.pos.min(), self.pos.max());
        let (t0, t1) = (self.tex.min(), self.tex.max());
        [
            Vertex { pos: [p0.x, p0.y], tex: [t0.x, t0.y] },
            Vertex { pos: [p1.x, p0.y], tex: [t1.x, t0.y] },
            Vertex { pos: [p1.x, p1.y], tex: [t1.x, t1.y] },
            Vertex { pos: [p0.x, p1.y], tex: [t0.x, t1.y] },
        ]
    }

    #[inline]
    pub fn push_into(&self, out: &mut Vec<Vertex>) {
        out.extend_from_slice(&self.vertices());
    }
}
