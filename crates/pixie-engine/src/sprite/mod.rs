//! Drawable element: a transform plus a non-owning bitmap reference.
//!
//! Scope:
//! - declarative property setters (idempotent, O(1), mark-dirty only)
//! - per-frame `prepare`: wave mesh, visibility, bush geometry
//! - `draw` through one of three shader paths
//! - flash and wave animation driven by `update`
//!
//! Property changes never recompute anything eagerly. Everything derived is
//! rebuilt in [`Sprite::prepare`], which the scene runs for every sprite
//! before the first draw of a frame.

mod bush;
mod draw;
mod flash;
mod wave;

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::bitmap::{Bitmap, SharedBitmap};
use crate::cache::Cached;
use crate::coords::{Affine, IntRect, Rect, Transform, Vec2, Vec2i};
use crate::error::{PixieError, PixieResult};
use crate::paint::{BlendMode, Color, NormValue, Tone};
use crate::render::Quad;
use crate::scene::SceneGeometry;
use crate::signal::{ConnectionId, Observable};

pub use bush::{BushGeometry, BushInput};
pub use flash::Flash;
pub use wave::{STRIP_HEIGHT, WaveLayout, WaveMesh, WaveParams, tessellate};

/// Default opacity of the part of a sprite below its bush line.
pub const DEFAULT_BUSH_OPACITY: i32 = 128;

/// Weak link to an attached bitmap plus our `modified` subscription.
#[derive(Debug)]
struct BitmapLink {
    bitmap: Weak<RefCell<Bitmap>>,
    subscription: Option<ConnectionId>,
}

impl BitmapLink {
    fn points_to(&self, other: &SharedBitmap) -> bool {
        std::ptr::eq(self.bitmap.as_ptr(), Rc::as_ptr(other))
    }

    fn unsubscribe(&mut self) {
        let Some(id) = self.subscription.take() else { return };
        let Some(bitmap) = self.bitmap.upgrade() else { return };
        match bitmap.try_borrow() {
            Ok(b) => {
                b.modified().disconnect(id);
            }
            Err(_) => log::warn!("bitmap busy while unsubscribing sprite; slot left connected"),
        }
    }
}

/// Upgrades `link` if the bitmap is alive and not disposed.
fn upgrade_live(link: &Weak<RefCell<Bitmap>>) -> Option<SharedBitmap> {
    let bitmap = link.upgrade()?;
    let alive = bitmap.try_borrow().is_ok_and(|b| !b.is_disposed());
    alive.then_some(bitmap)
}

fn busy() -> PixieError {
    PixieError::invalid_state("bitmap is mutably borrowed elsewhere")
}

pub struct Sprite {
    disposed: bool,

    bitmap: Option<BitmapLink>,
    bitmap_changed: Rc<Cell<bool>>,
    pattern: Option<Weak<RefCell<Bitmap>>>,

    src_rect: Rc<Observable<IntRect>>,
    src_rect_sub: ConnectionId,
    src_rect_changed: Rc<Cell<bool>>,

    transform: Transform,
    quad: Quad,
    quad_builds: u32,
    mirrored: bool,

    bush_depth: i32,
    bush: Cached<BushGeometry>,
    bush_opacity: NormValue,

    opacity: NormValue,
    blend: BlendMode,
    color: Color,
    tone: Tone,
    invert: bool,

    pattern_blend: BlendMode,
    pattern_tile: bool,
    pattern_opacity: NormValue,
    pattern_scroll: Vec2,
    pattern_zoom: Vec2,

    wave: WaveParams,
    wave_mesh: Cached<WaveMesh>,
    flash: Flash,

    scene_rect: IntRect,
    scene_orig: Vec2i,
    visible: bool,
}

impl std::fmt::Debug for Sprite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sprite")
            .field("disposed", &self.disposed)
            .field("src_rect", &self.src_rect.get())
            .field("position", &self.transform.position())
            .field("visible", &self.visible)
            .finish_non_exhaustive()
    }
}

impl Default for Sprite {
    fn default() -> Self {
        Self::new()
    }
}

impl Sprite {
    pub fn new() -> Self {
        let src_rect = Observable::shared(IntRect::default());
        let src_rect_changed = Rc::new(Cell::new(false));
        let src_rect_sub = watch(&src_rect, &src_rect_changed);
        Self {
            disposed: false,
            bitmap: None,
            bitmap_changed: Rc::new(Cell::new(false)),
            pattern: None,
            src_rect,
            src_rect_sub,
            src_rect_changed,
            transform: Transform::new(),
            quad: Quad::default(),
            quad_builds: 0,
            mirrored: false,
            bush_depth: 0,
            bush: Cached::dirty(BushGeometry::NEUTRAL),
            bush_opacity: NormValue::new(DEFAULT_BUSH_OPACITY),
            opacity: NormValue::OPAQUE,
            blend: BlendMode::Normal,
            color: Color::TRANSPARENT,
            tone: Tone::default(),
            invert: false,
            pattern_blend: BlendMode::Normal,
            pattern_tile: true,
            pattern_opacity: NormValue::OPAQUE,
            pattern_scroll: Vec2::zero(),
            pattern_zoom: Vec2::one(),
            wave: WaveParams::default(),
            wave_mesh: Cached::dirty(WaveMesh::default()),
            flash: Flash::default(),
            scene_rect: IntRect::default(),
            scene_orig: Vec2i::default(),
            visible: false,
        }
    }

    /// New sprite already placed in `geometry`.
    pub fn with_geometry(geometry: &SceneGeometry) -> Self {
        let mut sprite = Self::new();
        sprite.on_geometry_change(geometry);
        sprite
    }

    #[inline]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn ensure_live(&self) -> PixieResult<()> {
        if self.disposed {
            return Err(PixieError::Disposed { what: "sprite" });
        }
        Ok(())
    }

    // ── bitmap ───────────────────────────────────────────────────────────

    /// The attached bitmap, if it is still alive.
    pub fn bitmap(&self) -> Option<SharedBitmap> {
        self.bitmap.as_ref()?.bitmap.upgrade()
    }

    fn live_bitmap(&self) -> Option<SharedBitmap> {
        upgrade_live(&self.bitmap.as_ref()?.bitmap)
    }

    fn bitmap_size(&self) -> Option<(i32, i32)> {
        let shared = self.bitmap.as_ref()?.bitmap.upgrade()?;
        let bitmap = shared.try_borrow().ok()?;
        let rect = bitmap.rect().ok()?;
        Some((rect.w, rect.h))
    }

    /// Attaches `bitmap` and resets the source rectangle to its bounds.
    ///
    /// Mega bitmaps are rejected. A disposed bitmap is stored as is and
    /// simply keeps the sprite invisible.
    pub fn set_bitmap(&mut self, bitmap: Option<&SharedBitmap>) -> PixieResult<()> {
        self.ensure_live()?;
        let unchanged = match (&self.bitmap, bitmap) {
            (Some(link), Some(b)) => link.points_to(b),
            (None, None) => true,
            _ => false,
        };
        if unchanged {
            return Ok(());
        }

        let Some(shared) = bitmap else {
            self.unlink_bitmap();
            self.wave_mesh.invalidate();
            return Ok(());
        };

        let b = shared.try_borrow().map_err(|_| busy())?;
        if b.is_disposed() {
            drop(b);
            self.unlink_bitmap();
            self.bitmap = Some(BitmapLink { bitmap: Rc::downgrade(shared), subscription: None });
            return Ok(());
        }
        b.ensure_non_mega()?;
        let rect = b.rect()?;
        let flag = Rc::clone(&self.bitmap_changed);
        let subscription = b.modified().connect(move || flag.set(true));
        drop(b);

        self.unlink_bitmap();
        self.bitmap = Some(BitmapLink {
            bitmap: Rc::downgrade(shared),
            subscription: Some(subscription),
        });
        self.src_rect.set(rect);
        self.src_rect_changed.set(false);
        self.rebuild_quad();
        Ok(())
    }

    fn unlink_bitmap(&mut self) {
        if let Some(mut link) = self.bitmap.take() {
            link.unsubscribe();
        }
        self.bitmap_changed.set(false);
    }

    // ── source rectangle ─────────────────────────────────────────────────

    #[inline]
    pub fn src_rect(&self) -> IntRect {
        self.src_rect.get()
    }

    /// Shared handle; writes through it are picked up on the next `prepare`.
    pub fn src_rect_handle(&self) -> Rc<Observable<IntRect>> {
        Rc::clone(&self.src_rect)
    }

    pub fn set_src_rect(&mut self, rect: IntRect) -> PixieResult<()> {
        self.ensure_live()?;
        self.src_rect.set(rect);
        self.sync_pending();
        Ok(())
    }

    /// Follows another shared rectangle from now on.
    pub fn bind_src_rect(&mut self, rect: Rc<Observable<IntRect>>) -> PixieResult<()> {
        self.ensure_live()?;
        if Rc::ptr_eq(&self.src_rect, &rect) {
            return Ok(());
        }
        self.src_rect.disconnect(self.src_rect_sub);
        self.src_rect_sub = watch(&rect, &self.src_rect_changed);
        self.src_rect = rect;
        self.src_rect_changed.set(false);
        self.rebuild_quad();
        Ok(())
    }

    /// Texture quad for the non-wave path.
    #[inline]
    pub fn quad(&self) -> Quad {
        self.quad
    }

    /// How many times the texture quad has been rebuilt.
    #[inline]
    pub fn quad_builds(&self) -> u32 {
        self.quad_builds
    }

    /// Clamps the source rectangle to the bitmap and rebuilds the quad.
    fn rebuild_quad(&mut self) {
        let (bw, bh) = self.bitmap_size().unwrap_or((0, 0));
        let r = self.src_rect.get();
        let w = r.w.min(bw - r.x).max(0);
        let h = r.h.min(bh - r.y).max(0);

        let tex = Rect::from(IntRect::new(r.x, r.y, w, h));
        let tex = if self.mirrored { tex.h_flipped() } else { tex };
        self.quad = Quad::new(tex, Rect::new(0.0, 0.0, w as f32, h as f32));
        self.quad_builds += 1;

        self.bush.invalidate();
        self.wave_mesh.invalidate();
    }

    /// Applies notifications raised since the last call.
    fn sync_pending(&mut self) {
        if self.src_rect_changed.replace(false) {
            self.rebuild_quad();
        }
        if self.bitmap_changed.replace(false) {
            self.bush.invalidate();
            self.wave_mesh.invalidate();
        }
    }

    // ── transform ────────────────────────────────────────────────────────

    #[inline]
    pub fn x(&self) -> i32 {
        self.transform.position_i().x
    }

    #[inline]
    pub fn y(&self) -> i32 {
        self.transform.position_i().y
    }

    #[inline]
    pub fn ox(&self) -> i32 {
        self.transform.origin_i().x
    }

    #[inline]
    pub fn oy(&self) -> i32 {
        self.transform.origin_i().y
    }

    #[inline]
    pub fn zoom_x(&self) -> f32 {
        self.transform.scale().x
    }

    #[inline]
    pub fn zoom_y(&self) -> f32 {
        self.transform.scale().y
    }

    #[inline]
    pub fn angle(&self) -> f32 {
        self.transform.rotation()
    }

    pub fn set_x(&mut self, x: i32) -> PixieResult<()> {
        self.ensure_live()?;
        let p = self.transform.position();
        if p.x != x as f32 {
            self.transform.set_position(Vec2::new(x as f32, p.y));
        }
        Ok(())
    }

    /// Strip alignment depends on absolute y, so this dirties the wave.
    pub fn set_y(&mut self, y: i32) -> PixieResult<()> {
        self.ensure_live()?;
        let p = self.transform.position();
        if p.y != y as f32 {
            self.transform.set_position(Vec2::new(p.x, y as f32));
            self.wave_mesh.invalidate();
        }
        Ok(())
    }

    pub fn set_ox(&mut self, ox: i32) -> PixieResult<()> {
        self.ensure_live()?;
        let o = self.transform.origin();
        if o.x != ox as f32 {
            self.transform.set_origin(Vec2::new(ox as f32, o.y));
        }
        Ok(())
    }

    pub fn set_oy(&mut self, oy: i32) -> PixieResult<()> {
        self.ensure_live()?;
        let o = self.transform.origin();
        if o.y != oy as f32 {
            self.transform.set_origin(Vec2::new(o.x, oy as f32));
        }
        Ok(())
    }

    pub fn set_zoom_x(&mut self, zoom: f32) -> PixieResult<()> {
        self.ensure_live()?;
        let s = self.transform.scale();
        if s.x != zoom {
            self.transform.set_scale(Vec2::new(zoom, s.y));
            self.bush.invalidate();
        }
        Ok(())
    }

    pub fn set_zoom_y(&mut self, zoom: f32) -> PixieResult<()> {
        self.ensure_live()?;
        let s = self.transform.scale();
        if s.y != zoom {
            self.transform.set_scale(Vec2::new(s.x, zoom));
            self.wave_mesh.invalidate();
            self.bush.invalidate();
        }
        Ok(())
    }

    /// Degrees; negative values are kept as is.
    pub fn set_angle(&mut self, degrees: f32) -> PixieResult<()> {
        self.ensure_live()?;
        if self.transform.rotation() != degrees {
            self.transform.set_rotation(degrees);
            self.bush.invalidate();
        }
        Ok(())
    }

    /// Sprite matrix, recomputed only if the transform changed.
    pub fn matrix(&mut self) -> Affine {
        self.transform.matrix()
    }

    #[inline]
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    #[inline]
    pub fn mirror(&self) -> bool {
        self.mirrored
    }

    pub fn set_mirror(&mut self, mirrored: bool) -> PixieResult<()> {
        self.ensure_live()?;
        if self.mirrored != mirrored {
            self.mirrored = mirrored;
            self.rebuild_quad();
        }
        Ok(())
    }

    /// Source rectangle width.
    #[inline]
    pub fn width(&self) -> i32 {
        self.src_rect.get().w
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.src_rect.get().h
    }

    // ── bush ─────────────────────────────────────────────────────────────

    #[inline]
    pub fn bush_depth(&self) -> i32 {
        self.bush_depth
    }

    pub fn set_bush_depth(&mut self, depth: i32) -> PixieResult<()> {
        self.ensure_live()?;
        if self.bush_depth != depth {
            self.bush_depth = depth;
            self.bush.invalidate();
        }
        Ok(())
    }

    #[inline]
    pub fn bush_opacity(&self) -> u8 {
        self.bush_opacity.get()
    }

    pub fn set_bush_opacity(&mut self, opacity: i32) -> PixieResult<()> {
        self.ensure_live()?;
        self.bush_opacity = NormValue::new(opacity);
        Ok(())
    }

    /// Cutoff line as of the last `prepare`.
    #[inline]
    pub fn bush_geometry(&self) -> BushGeometry {
        *self.bush.peek()
    }

    // ── appearance ───────────────────────────────────────────────────────

    #[inline]
    pub fn opacity(&self) -> u8 {
        self.opacity.get()
    }

    pub fn set_opacity(&mut self, opacity: i32) -> PixieResult<()> {
        self.ensure_live()?;
        self.opacity = NormValue::new(opacity);
        Ok(())
    }

    /// Script-facing integer code of the blend mode.
    #[inline]
    pub fn blend_type(&self) -> i32 {
        self.blend.code()
    }

    /// Unknown codes fall back to normal blending.
    pub fn set_blend_type(&mut self, code: i32) -> PixieResult<()> {
        self.ensure_live()?;
        self.blend = BlendMode::from_code(code);
        Ok(())
    }

    #[inline]
    pub fn color(&self) -> Color {
        self.color
    }

    pub fn set_color(&mut self, color: Color) -> PixieResult<()> {
        self.ensure_live()?;
        self.color = color;
        Ok(())
    }

    #[inline]
    pub fn tone(&self) -> Tone {
        self.tone
    }

    pub fn set_tone(&mut self, tone: Tone) -> PixieResult<()> {
        self.ensure_live()?;
        self.tone = tone;
        Ok(())
    }

    #[inline]
    pub fn invert(&self) -> bool {
        self.invert
    }

    pub fn set_invert(&mut self, invert: bool) -> PixieResult<()> {
        self.ensure_live()?;
        self.invert = invert;
        Ok(())
    }

    // ── pattern ──────────────────────────────────────────────────────────

    pub fn pattern(&self) -> Option<SharedBitmap> {
        self.pattern.as_ref()?.upgrade()
    }

    fn live_pattern(&self) -> Option<SharedBitmap> {
        upgrade_live(self.pattern.as_ref()?)
    }

    /// Overlay bitmap sampled in screen space; mega bitmaps are rejected.
    pub fn set_pattern(&mut self, pattern: Option<&SharedBitmap>) -> PixieResult<()> {
        self.ensure_live()?;
        if let Some(p) = pattern {
            let b = p.try_borrow().map_err(|_| busy())?;
            if !b.is_disposed() {
                b.ensure_non_mega()?;
            }
        }
        self.pattern = pattern.map(Rc::downgrade);
        Ok(())
    }

    #[inline]
    pub fn pattern_blend_type(&self) -> i32 {
        self.pattern_blend.code()
    }

    pub fn set_pattern_blend_type(&mut self, code: i32) -> PixieResult<()> {
        self.ensure_live()?;
        self.pattern_blend = BlendMode::from_code(code);
        Ok(())
    }

    #[inline]
    pub fn pattern_tile(&self) -> bool {
        self.pattern_tile
    }

    pub fn set_pattern_tile(&mut self, tile: bool) -> PixieResult<()> {
        self.ensure_live()?;
        self.pattern_tile = tile;
        Ok(())
    }

    #[inline]
    pub fn pattern_opacity(&self) -> u8 {
        self.pattern_opacity.get()
    }

    pub fn set_pattern_opacity(&mut self, opacity: i32) -> PixieResult<()> {
        self.ensure_live()?;
        self.pattern_opacity = NormValue::new(opacity);
        Ok(())
    }

    #[inline]
    pub fn pattern_scroll(&self) -> Vec2 {
        self.pattern_scroll
    }

    pub fn set_pattern_scroll(&mut self, x: f32, y: f32) -> PixieResult<()> {
        self.ensure_live()?;
        self.pattern_scroll = Vec2::new(x, y);
        Ok(())
    }

    #[inline]
    pub fn pattern_zoom(&self) -> Vec2 {
        self.pattern_zoom
    }

    pub fn set_pattern_zoom(&mut self, x: f32, y: f32) -> PixieResult<()> {
        self.ensure_live()?;
        self.pattern_zoom = Vec2::new(x, y);
        Ok(())
    }

    // ── wave ─────────────────────────────────────────────────────────────

    #[inline]
    pub fn wave(&self) -> WaveParams {
        self.wave
    }

    pub fn set_wave_amp(&mut self, amp: i32) -> PixieResult<()> {
        self.ensure_live()?;
        if self.wave.amp != amp {
            self.wave.amp = amp;
            self.wave_mesh.invalidate();
        }
        Ok(())
    }

    pub fn set_wave_length(&mut self, length: i32) -> PixieResult<()> {
        self.ensure_live()?;
        if self.wave.length != length {
            self.wave.length = length;
            self.wave_mesh.invalidate();
        }
        Ok(())
    }

    pub fn set_wave_speed(&mut self, speed: i32) -> PixieResult<()> {
        self.ensure_live()?;
        if self.wave.speed != speed {
            self.wave.speed = speed;
            self.wave_mesh.invalidate();
        }
        Ok(())
    }

    pub fn set_wave_phase(&mut self, phase: f32) -> PixieResult<()> {
        self.ensure_live()?;
        if self.wave.phase != phase {
            self.wave.phase = phase;
            self.wave_mesh.invalidate();
        }
        Ok(())
    }

    /// Strip mesh as of the last `prepare`.
    #[inline]
    pub fn wave_mesh(&self) -> &WaveMesh {
        self.wave_mesh.peek()
    }

    // ── flash ────────────────────────────────────────────────────────────

    /// Flashes `color` for `duration` updates; `None` hides the sprite instead.
    pub fn flash(&mut self, color: Option<Color>, duration: i32) -> PixieResult<()> {
        self.ensure_live()?;
        self.flash.start(color, duration);
        Ok(())
    }

    #[inline]
    pub fn is_flashing(&self) -> bool {
        self.flash.is_flashing()
    }

    // ── frame cycle ──────────────────────────────────────────────────────

    /// Advances flash and wave phase by one tick.
    pub fn update(&mut self) -> PixieResult<()> {
        self.ensure_live()?;
        self.flash.update();
        self.wave.phase += (self.wave.speed / 180) as f32;
        self.wave_mesh.invalidate();
        Ok(())
    }

    /// Resolves dirty state ahead of drawing.
    pub fn prepare(&mut self) -> PixieResult<()> {
        self.ensure_live()?;
        self.sync_pending();

        if self.wave_mesh.is_dirty() {
            let layout = WaveLayout {
                src_rect: self.src_rect.get(),
                mirrored: self.mirrored,
                y: self.transform.position().y,
                zoom_y: self.transform.scale().y,
            };
            self.wave_mesh.set(tessellate(&self.wave, &layout));
        }

        self.visible = self.compute_visibility();

        if self.visible && self.bush.is_dirty() {
            let (bw, bh) = self.bitmap_size().unwrap_or((0, 0));
            let input = BushInput {
                depth: self.bush_depth,
                rotation: self.transform.rotation(),
                mirrored: self.mirrored,
                scale: self.transform.scale(),
                bitmap_size: Vec2::new(bw as f32, bh as f32),
                src_rect: self.src_rect.get(),
            };
            self.bush.set(bush::compute(&input));
        }
        Ok(())
    }

    /// Visibility as of the last `prepare`.
    #[inline]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    fn compute_visibility(&self) -> bool {
        // A disposed bitmap has no rect, so this also covers disposal.
        let Some((bw, bh)) = self.bitmap_size() else { return false };
        if bw <= 0 || bh <= 0 || self.opacity.get() == 0 {
            return false;
        }
        // Displaced or transformed bounds are not worth computing exactly.
        if self.wave.is_active() {
            return true;
        }
        if self.transform.scale() != Vec2::one() || self.transform.rotation() != 0.0 {
            return true;
        }
        let pos = self.transform.position_i() - (self.transform.origin_i() + self.scene_orig);
        IntRect::new(pos.x, pos.y, bw, bh).intersects(self.scene_rect)
    }

    /// Takes the parent scene's offset and visible size.
    pub fn on_geometry_change(&mut self, geometry: &SceneGeometry) {
        self.transform.set_global_offset(geometry.offset());
        self.scene_rect.set_size(geometry.rect.size());
        self.scene_orig = geometry.orig;
    }

    /// Drops subscriptions and the wave buffer. Later calls fail with `Disposed`.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.release_subscriptions();
        self.wave_mesh = Cached::clean(WaveMesh::default());
        self.visible = false;
        self.disposed = true;
        log::trace!("sprite disposed");
    }

    fn release_subscriptions(&mut self) {
        self.src_rect.disconnect(self.src_rect_sub);
        if let Some(link) = self.bitmap.as_mut() {
            link.unsubscribe();
        }
    }
}

impl Drop for Sprite {
    fn drop(&mut self) {
        if !self.disposed {
            self.release_subscriptions();
        }
    }
}

fn watch(rect: &Observable<IntRect>, flag: &Rc<Cell<bool>>) -> ConnectionId {
    let flag = Rc::clone(flag);
    rect.connect(move || flag.set(true))
}
