use std::collections::HashMap;

use crate::coords::IntRect;
use crate::error::{PixieError, PixieResult};
use crate::render::{TextureDevice, TextureId};

use super::Gpu;

/// Texture storage on a real wgpu device.
///
/// Textures are RGBA8 (straight alpha), sampled by the sprite programs and
/// writable from the CPU through `queue.write_texture`.
pub struct WgpuTextures {
    device: wgpu::Device,
    queue: wgpu::Queue,
    max_size: u32,
    textures: HashMap<TextureId, wgpu::Texture>,
    next_id: u64,
}

impl WgpuTextures {
    pub fn new(gpu: &Gpu) -> Self {
        Self {
            device: gpu.device().clone(),
            queue: gpu.queue().clone(),
            max_size: gpu.max_texture_size(),
            textures: HashMap::new(),
            next_id: 1,
        }
    }

    pub fn texture(&self, id: TextureId) -> Option<&wgpu::Texture> {
        self.textures.get(&id)
    }

    pub fn view(&self, id: TextureId) -> Option<wgpu::TextureView> {
        self.textures
            .get(&id)
            .map(|t| t.create_view(&wgpu::TextureViewDescriptor::default()))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.textures.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}

impl TextureDevice for WgpuTextures {
    fn max_texture_size(&self) -> u32 {
        self.max_size
    }

    fn create_texture(&mut self, width: u32, height: u32) -> PixieResult<TextureId> {
        if width == 0 || height == 0 || width > self.max_size || height > self.max_size {
            return Err(PixieError::resource(format!(
                "cannot create {width}x{height} texture (device limit {})",
                self.max_size
            )));
        }
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("pixie bitmap"),
            size: wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_DST
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let id = TextureId(self.next_id);
        self.next_id += 1;
        self.textures.insert(id, texture);
        Ok(id)
    }

    fn upload_region(
        &mut self,
        id: TextureId,
        region: IntRect,
        pixels: &[u8],
        surface_width: u32,
    ) -> PixieResult<()> {
        let texture = self
            .textures
            .get(&id)
            .ok_or_else(|| PixieError::invalid_state(format!("unknown texture {id:?}")))?;
        let bounds = IntRect::from_size(texture.width() as i32, texture.height() as i32);
        if region.is_empty() || region.intersection(bounds) != Some(region) {
            return Err(PixieError::invalid_state(format!(
                "upload region {region:?} outside texture {bounds:?}"
            )));
        }

        // The whole surface is passed; the layout offset skips to the region's first texel.
        let offset = (region.y as u64 * surface_width as u64 + region.x as u64) * 4;
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d { x: region.x as u32, y: region.y as u32, z: 0 },
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset,
                bytes_per_row: Some(surface_width * 4),
                rows_per_image: Some(region.h as u32),
            },
            wgpu::Extent3d {
                width: region.w as u32,
                height: region.h as u32,
                depth_or_array_layers: 1,
            },
        );
        Ok(())
    }

    fn release_texture(&mut self, id: TextureId) {
        if let Some(texture) = self.textures.remove(&id) {
            texture.destroy();
        }
    }
}
