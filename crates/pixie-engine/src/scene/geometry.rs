use crate::coords::{IntRect, Vec2i};

/// Visible area of the parent scene plus its scroll origin.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct SceneGeometry {
    /// Screen rectangle the scene draws into.
    pub rect: IntRect,
    /// Scroll origin subtracted from child positions.
    pub orig: Vec2i,
}

impl SceneGeometry {
    #[inline]
    pub const fn new(rect: IntRect, orig: Vec2i) -> Self {
        Self { rect, orig }
    }

    /// Translation applied to every child transform.
    #[inline]
    pub fn offset(&self) -> Vec2i {
        self.rect.pos() - self.orig
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_is_position_minus_origin() {
        let g = SceneGeometry::new(IntRect::new(10, 20, 320, 240), Vec2i::new(3, 30));
        assert_eq!(g.offset(), Vec2i::new(7, -10));
    }
}
