use crate::coords::IntRect;
use crate::error::PixieResult;
use crate::render::{TextureDevice, TextureId};

use super::PixelSurface;

/// One image: CPU pixels plus an optional device texture kept in sync lazily.
///
/// Writes go to the CPU surface and extend the tainted region; the next
/// [`Frame::sync`] uploads only that region.
#[derive(Debug)]
pub struct Frame {
    surface: PixelSurface,
    texture: Option<TextureId>,
    taint: Option<IntRect>,
}

impl Frame {
    /// New frame; the whole surface is pending upload.
    pub fn new(surface: PixelSurface) -> Self {
        let taint = Some(surface.rect());
        Self {
            surface,
            texture: None,
            taint,
        }
    }

    /// Wraps a texture that already holds `surface`'s pixels.
    pub fn resident(texture: TextureId, surface: PixelSurface) -> Self {
        Self {
            surface,
            texture: Some(texture),
            taint: None,
        }
    }

    /// Pixel copy with no texture of its own.
    pub fn duplicate(&self) -> Self {
        Self::new(self.surface.clone())
    }

    #[inline]
    pub fn surface(&self) -> &PixelSurface {
        &self.surface
    }

    #[inline]
    pub fn texture(&self) -> Option<TextureId> {
        self.texture
    }

    #[inline]
    pub fn rect(&self) -> IntRect {
        self.surface.rect()
    }

    #[inline]
    pub fn tainted(&self) -> Option<IntRect> {
        self.taint
    }

    pub fn taint(&mut self, rect: IntRect) {
        let Some(r) = rect.intersection(self.surface.rect()) else { return };
        self.taint = Some(match self.taint {
            Some(t) => t.union(r),
            None => r,
        });
    }

    /// Runs a pixel write and taints whatever region it reports.
    pub fn write(&mut self, op: impl FnOnce(&mut PixelSurface) -> Option<IntRect>) -> Option<IntRect> {
        let touched = op(&mut self.surface);
        if let Some(r) = touched {
            self.taint(r);
        }
        touched
    }

    /// Whole-surface write.
    pub fn write_all(&mut self, op: impl FnOnce(&mut PixelSurface)) {
        op(&mut self.surface);
        self.taint(self.surface.rect());
    }

    /// Makes the device texture current and returns it.
    pub fn sync<D: TextureDevice + ?Sized>(&mut self, device: &mut D) -> PixieResult<TextureId> {
        let id = match self.texture {
            Some(id) => id,
            None => {
                let id = device.create_texture(self.surface.width(), self.surface.height())?;
                self.texture = Some(id);
                self.taint = Some(self.surface.rect());
                id
            }
        };
        if let Some(region) = self.taint.take() {
            log::trace!("uploading {region:?} to {id:?}");
            if let Err(e) = device.upload_region(id, region, self.surface.raw(), self.surface.width()) {
                self.taint = Some(region);
                return Err(e);
            }
        }
        Ok(id)
    }

    pub fn release<D: TextureDevice + ?Sized>(&mut self, device: &mut D) {
        if let Some(id) = self.texture.take() {
            device.release_texture(id);
        }
    }
}
