use super::PixelSurface;

/// Image too large for a single texture.
///
/// It is never bound directly. The pixels stay on the CPU for raw reads and
/// saving; every drawing or binding operation rejects it.
#[derive(Debug, Clone)]
pub struct MegaSurface {
    surface: PixelSurface,
}

impl MegaSurface {
    pub fn new(surface: PixelSurface) -> Self {
        Self { surface }
    }

    #[inline]
    pub fn surface(&self) -> &PixelSurface {
        &self.surface
    }
}
