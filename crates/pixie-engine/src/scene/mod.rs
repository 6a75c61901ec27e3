//! Scene driver: owns sprites and runs the frame cycle.
//!
//! Responsibilities:
//! - deterministic paint order (z-index + creation order)
//! - geometry propagation to every sprite
//! - `update` (sprite ticks, bitmap animation) and `render`
//!   (every `prepare` strictly before the first `draw`)

mod geometry;
mod key;
mod list;

use std::rc::Rc;

use crate::bitmap::SharedBitmap;
use crate::error::PixieResult;
use crate::render::{SpriteShading, TextureDevice};
use crate::sprite::Sprite;
use crate::time::{FrameClock, Tick};

pub use geometry::SceneGeometry;
pub use key::{SortKey, ZIndex};

use list::SpriteList;

/// Handle to a sprite owned by a [`Scene`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SpriteId(u64);

#[derive(Debug, Default)]
pub struct Scene {
    geometry: SceneGeometry,
    sprites: SpriteList,
    next_id: u64,
}

impl Scene {
    pub fn new(geometry: SceneGeometry) -> Self {
        Self {
            geometry,
            ..Self::default()
        }
    }

    #[inline]
    pub fn geometry(&self) -> SceneGeometry {
        self.geometry
    }

    /// Stores the new geometry and pushes it into every sprite.
    pub fn set_geometry(&mut self, geometry: SceneGeometry) {
        if self.geometry == geometry {
            return;
        }
        self.geometry = geometry;
        for entry in self.sprites.iter_mut() {
            entry.sprite.on_geometry_change(&geometry);
        }
    }

    /// Takes ownership of `sprite` at depth `z`.
    pub fn insert(&mut self, mut sprite: Sprite, z: i32) -> SpriteId {
        let id = SpriteId(self.next_id);
        self.next_id += 1;
        sprite.on_geometry_change(&self.geometry);
        self.sprites.push(id, ZIndex::new(z), sprite);
        id
    }

    pub fn get(&self, id: SpriteId) -> Option<&Sprite> {
        self.sprites.get(id).map(|e| &e.sprite)
    }

    pub fn get_mut(&mut self, id: SpriteId) -> Option<&mut Sprite> {
        self.sprites.get_mut(id).map(|e| &mut e.sprite)
    }

    pub fn z(&self, id: SpriteId) -> Option<i32> {
        self.sprites.get(id).map(|e| e.key.z.0)
    }

    /// Returns false for unknown ids.
    pub fn set_z(&mut self, id: SpriteId, z: i32) -> bool {
        self.sprites.set_z(id, ZIndex::new(z))
    }

    /// Disposes and drops the sprite.
    pub fn remove(&mut self, id: SpriteId) -> bool {
        match self.sprites.remove(id) {
            Some(mut sprite) => {
                sprite.dispose();
                true
            }
            None => false,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// One game tick: sprite flash/wave, then bitmap animations by `dt` seconds.
    ///
    /// A bitmap shared by several sprites advances once.
    pub fn update(&mut self, dt: f64) -> PixieResult<()> {
        self.purge();
        let mut bitmaps: Vec<SharedBitmap> = Vec::new();
        for entry in self.sprites.iter_mut() {
            entry.sprite.update()?;
            if let Some(b) = entry.sprite.bitmap() {
                if !bitmaps.iter().any(|seen| Rc::ptr_eq(seen, &b)) {
                    bitmaps.push(b);
                }
            }
        }
        for b in bitmaps {
            match b.try_borrow_mut() {
                Ok(mut b) => b.advance(dt),
                Err(_) => log::warn!("bitmap busy during scene update; animation not advanced"),
            }
        }
        Ok(())
    }

    /// Steps `clock` and updates with its delta.
    pub fn tick(&mut self, clock: &mut FrameClock) -> PixieResult<Tick> {
        let tick = clock.tick();
        self.update(tick.dt)?;
        Ok(tick)
    }

    /// Prepares every sprite, then draws them back to front.
    ///
    /// A sprite that fails to draw is logged and skipped; the rest of the
    /// frame still renders.
    pub fn render<D, S>(&mut self, device: &mut D, shading: &mut S) -> PixieResult<()>
    where
        D: TextureDevice + ?Sized,
        S: SpriteShading + ?Sized,
    {
        self.purge();
        for entry in self.sprites.iter_mut() {
            entry.sprite.prepare()?;
        }

        let mut drawn = 0usize;
        self.sprites.for_each_in_paint_order(|entry| {
            if !entry.sprite.is_visible() {
                return;
            }
            match entry.sprite.draw(device, shading) {
                Ok(()) => drawn += 1,
                Err(e) => log::warn!("skipping sprite {:?}: {e}", entry.id),
            }
        });
        log::trace!("scene rendered {drawn}/{} sprites", self.sprites.len());
        Ok(())
    }

    fn purge(&mut self) {
        let removed = self.sprites.purge_disposed();
        if removed > 0 {
            log::debug!("dropped {removed} disposed sprites from scene");
        }
    }

    /// Ids in paint order, back to front.
    pub fn paint_order(&mut self) -> Vec<SpriteId> {
        let mut out = Vec::with_capacity(self.sprites.len());
        self.sprites.for_each_in_paint_order(|e| out.push(e.id));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::Bitmap;
    use crate::coords::{IntRect, Vec2i};
    use crate::render::{Call, RecordingBackend};

    fn scene() -> Scene {
        Scene::new(SceneGeometry::new(IntRect::new(0, 0, 100, 100), Vec2i::default()))
    }

    fn sprite(b: &SharedBitmap) -> Sprite {
        let mut s = Sprite::new();
        s.set_bitmap(Some(b)).unwrap();
        s
    }

    // ── ordering ─────────────────────────────────────────────────────────

    #[test]
    fn paint_order_is_z_then_creation() {
        let mut sc = scene();
        let a = sc.insert(Sprite::new(), 5);
        let b = sc.insert(Sprite::new(), 0);
        let c = sc.insert(Sprite::new(), 5);
        assert_eq!(sc.paint_order(), vec![b, a, c]);
        assert!(sc.set_z(b, 10));
        assert_eq!(sc.paint_order(), vec![a, c, b]);
        assert_eq!(sc.z(b), Some(10));
    }

    #[test]
    fn remove_disposes_and_unsubscribes() {
        let bm = Bitmap::with_size(4, 4, false).unwrap().into_shared();
        let mut sc = scene();
        let id = sc.insert(sprite(&bm), 0);
        assert_eq!(bm.borrow().modified().len(), 1);
        assert!(sc.remove(id));
        assert!(!sc.remove(id));
        assert_eq!(bm.borrow().modified().len(), 0);
        assert!(sc.is_empty());
    }

    // ── frame cycle ──────────────────────────────────────────────────────

    #[test]
    fn render_draws_visible_sprites_back_to_front() {
        let bm = Bitmap::with_size(8, 8, false).unwrap().into_shared();
        let mut sc = scene();
        let front = sc.insert(sprite(&bm), 1);
        let back = sc.insert(sprite(&bm), 0);
        sc.get_mut(front).unwrap().set_x(20).unwrap();
        let hidden = sc.insert(sprite(&bm), 2);
        sc.get_mut(hidden).unwrap().set_x(400).unwrap();

        let mut dev = RecordingBackend::new();
        let mut gl = RecordingBackend::new();
        sc.render(&mut dev, &mut gl).unwrap();

        let draws = gl.draws();
        assert_eq!(draws.len(), 2);
        assert_eq!(draws[0][0].pos, [0.0, 0.0]);
        assert_eq!(draws[1][0].pos, [0.0, 0.0]);
        let matrices: Vec<_> = gl
            .calls()
            .iter()
            .filter_map(|c| match c {
                Call::SpriteMatrix(m) => Some(m.tx),
                _ => None,
            })
            .collect();
        assert_eq!(matrices, vec![0.0, 20.0]);
        assert!(sc.get(back).unwrap().is_visible());
        assert!(!sc.get(hidden).unwrap().is_visible());
    }

    #[test]
    fn disposed_sprites_are_dropped_before_render() {
        let bm = Bitmap::with_size(8, 8, false).unwrap().into_shared();
        let mut sc = scene();
        let id = sc.insert(sprite(&bm), 0);
        sc.get_mut(id).unwrap().dispose();
        let mut dev = RecordingBackend::new();
        let mut gl = RecordingBackend::new();
        sc.render(&mut dev, &mut gl).unwrap();
        assert!(sc.is_empty());
        assert!(gl.draws().is_empty());
    }

    #[test]
    fn geometry_reaches_existing_sprites() {
        let bm = Bitmap::with_size(8, 8, false).unwrap().into_shared();
        let mut sc = scene();
        let id = sc.insert(sprite(&bm), 0);
        sc.get_mut(id).unwrap().set_x(150).unwrap();
        let mut dev = RecordingBackend::new();
        let mut gl = RecordingBackend::new();
        sc.render(&mut dev, &mut gl).unwrap();
        assert!(!sc.get(id).unwrap().is_visible());

        sc.set_geometry(SceneGeometry::new(IntRect::new(0, 0, 200, 100), Vec2i::default()));
        sc.render(&mut dev, &mut gl).unwrap();
        assert!(sc.get(id).unwrap().is_visible());
    }

    #[test]
    fn shared_bitmap_animation_advances_once() {
        let frames = (0..4).map(|_| crate::bitmap::PixelSurface::new(2, 2).unwrap()).collect();
        let bm = Bitmap::from_frames(frames, 10.0).unwrap().into_shared();
        bm.borrow_mut().play().unwrap();
        let mut sc = scene();
        sc.insert(sprite(&bm), 0);
        sc.insert(sprite(&bm), 0);
        sc.update(0.1).unwrap();
        assert_eq!(bm.borrow().current_frame_index().unwrap(), 1);
    }

    #[test]
    fn update_ticks_flash() {
        let mut sc = scene();
        let id = sc.insert(Sprite::new(), 0);
        sc.get_mut(id).unwrap().flash(None, 1).unwrap();
        sc.update(0.0).unwrap();
        assert!(sc.get(id).unwrap().is_flashing());
        sc.update(0.0).unwrap();
        assert!(!sc.get(id).unwrap().is_flashing());
    }
}
