//! wgpu device bring-up and texture storage.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue without a window
//! - publishing the device texture limit to [`crate::render::caps`]
//! - backing [`crate::render::TextureDevice`] with real GPU textures

mod gpu;
mod textures;

pub use gpu::{Gpu, GpuInit};
pub use textures::WgpuTextures;
