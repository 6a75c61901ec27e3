//! Pixie engine crate.
//!
//! Sprite and bitmap rendering core for tile/sprite-based 2D games:
//! CPU-side bitmaps with lazily uploaded textures, sprites with wave, bush
//! and flash effects, and a scene driver that prepares then draws them.
//!
//! GPU access goes through the traits in [`render`]; [`device`] provides
//! the wgpu implementation and [`render::RecordingBackend`] a headless one.

pub mod config;
pub mod error;
pub mod logging;

pub mod cache;
pub mod coords;
pub mod paint;
pub mod signal;
pub mod time;

pub mod bitmap;
pub mod device;
pub mod render;
pub mod scene;
pub mod sprite;

pub use bitmap::{Bitmap, FrameSelect, SharedBitmap};
pub use error::{PixieError, PixieResult};
pub use scene::{Scene, SceneGeometry, SpriteId};
pub use sprite::Sprite;
