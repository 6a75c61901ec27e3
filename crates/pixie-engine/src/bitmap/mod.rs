//! Bitmap resources.
//!
//! A [`Bitmap`] is exactly one of:
//! - `Plain`: one frame (CPU surface + lazily synced texture)
//! - `Mega`: larger than the device texture limit, CPU only, drawn in tiles
//! - `Animated`: an ordered list of equally sized frames with playback state
//!
//! Operations not valid for the active variant fail with
//! [`PixieError::InvalidState`]. After [`Bitmap::dispose`] every operation
//! fails with [`PixieError::Disposed`].
//!
//! Every mutation emits [`Bitmap::modified`] once it has completed.

mod animation;
mod frame;
mod mega;
mod surface;

use std::cell::RefCell;
use std::path::Path;
use std::rc::{Rc, Weak};

pub use animation::Animation;
pub use frame::Frame;
pub use mega::MegaSurface;
pub use surface::PixelSurface;

use crate::coords::IntRect;
use crate::error::{PixieError, PixieResult};
use crate::paint::{Color, Rgba8};
use crate::render::{ShaderTarget, TextureDevice, TextureId, caps};
use crate::signal::Signal;

/// Bitmaps are shared between sprites and scripts.
pub type SharedBitmap = Rc<RefCell<Bitmap>>;

/// Which frames a clone copies.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FrameSelect {
    /// Every frame plus playback state.
    All,
    /// The current frame only, as a plain bitmap.
    Current,
    /// One frame by index, as a plain bitmap.
    Index(usize),
}

#[derive(Debug)]
pub enum Storage {
    Plain(Frame),
    Mega(MegaSurface),
    Animated(Animation),
}

pub struct Bitmap {
    /// `None` once disposed.
    storage: Option<Storage>,
    hires: Option<SharedBitmap>,
    lores: Weak<RefCell<Bitmap>>,
    modified: Signal,
}

impl std::fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bitmap")
            .field("storage", &self.storage)
            .field("has_hires", &self.hires.is_some())
            .finish()
    }
}

impl Bitmap {
    fn from_storage(storage: Storage) -> Self {
        Self {
            storage: Some(storage),
            hires: None,
            lores: Weak::new(),
            modified: Signal::new(),
        }
    }

    /// Largest width or height a non-mega bitmap may have.
    #[inline]
    pub fn max_size() -> u32 {
        caps::max_texture_size()
    }

    fn check_size(width: u32, height: u32) -> PixieResult<()> {
        let max = Self::max_size();
        if width == 0 || height == 0 || width > max || height > max {
            return Err(PixieError::resource(format!(
                "bitmap size {width}x{height} outside 1..={max}"
            )));
        }
        Ok(())
    }

    /// Blank transparent bitmap. With `hires`, a sibling scaled by the
    /// configured hires factor is created and kept in step by drawing ops.
    pub fn with_size(width: u32, height: u32, hires: bool) -> PixieResult<Self> {
        Self::check_size(width, height)?;
        let mut bitmap = Self::from_storage(Storage::Plain(Frame::new(PixelSurface::new(width, height)?)));
        if hires {
            let (hw, hh) = hires_size(width, height, caps::hires_scale())?;
            let sibling = Self::with_size(hw, hh, false)?;
            bitmap.hires = Some(sibling.into_shared());
        }
        Ok(bitmap)
    }

    /// Copies `data` (tightly packed RGBA8) into a new bitmap.
    pub fn from_raw(width: u32, height: u32, data: &[u8]) -> PixieResult<Self> {
        Self::check_size(width, height)?;
        let surface = PixelSurface::from_raw(width, height, data.to_vec())?;
        Ok(Self::from_storage(Storage::Plain(Frame::new(surface))))
    }

    /// Decodes an image file. Images over the texture limit load as mega surfaces.
    pub fn from_file(path: impl AsRef<Path>) -> PixieResult<Self> {
        let path = path.as_ref();
        let image = image::open(path)?.to_rgba8();
        log::debug!("decoded {} ({}x{})", path.display(), image.width(), image.height());
        Self::from_image(image, Self::max_size())
    }

    /// Wraps decoded pixels, switching to a mega surface above `max_size`.
    pub fn from_image(image: image::RgbaImage, max_size: u32) -> PixieResult<Self> {
        let surface = PixelSurface::from_image(image)?;
        if surface.width() > max_size || surface.height() > max_size {
            log::info!(
                "image {}x{} exceeds texture limit {max_size}; using mega surface",
                surface.width(),
                surface.height()
            );
            return Ok(Self::from_storage(Storage::Mega(MegaSurface::new(surface))));
        }
        Ok(Self::from_storage(Storage::Plain(Frame::new(surface))))
    }

    /// Adopts an image already resident on the device.
    pub fn from_gpu(texture: TextureId, surface: PixelSurface) -> PixieResult<Self> {
        Self::check_size(surface.width(), surface.height())?;
        Ok(Self::from_storage(Storage::Plain(Frame::resident(texture, surface))))
    }

    /// Animated bitmap from explicit frames.
    pub fn from_frames(frames: Vec<PixelSurface>, fps: f32) -> PixieResult<Self> {
        for f in &frames {
            Self::check_size(f.width(), f.height())?;
        }
        let animation = Animation::new(frames.into_iter().map(Frame::new).collect(), fps)?;
        Ok(Self::from_storage(Storage::Animated(animation)))
    }

    /// Copies some or all frames of `other`.
    pub fn clone_frames(other: &Bitmap, select: FrameSelect) -> PixieResult<Self> {
        let storage = match (other.storage()?, select) {
            (Storage::Plain(f), _) => Storage::Plain(f.duplicate()),
            (Storage::Mega(m), _) => Storage::Mega(m.clone()),
            (Storage::Animated(a), FrameSelect::All) => Storage::Animated(a.duplicate()),
            (Storage::Animated(a), FrameSelect::Current) => Storage::Plain(a.current().duplicate()),
            (Storage::Animated(a), FrameSelect::Index(i)) => Storage::Plain(a.frame(i)?.duplicate()),
        };
        Ok(Self::from_storage(storage))
    }

    /// Moves the bitmap behind a shared handle and links a hires sibling back to it.
    pub fn into_shared(self) -> SharedBitmap {
        let shared = Rc::new(RefCell::new(self));
        let hires = shared.borrow().hires.clone();
        if let Some(h) = hires {
            h.borrow_mut().lores = Rc::downgrade(&shared);
        }
        shared
    }

    // ── state ─────────────────────────────────────────────────────────────

    fn storage(&self) -> PixieResult<&Storage> {
        self.storage.as_ref().ok_or(PixieError::Disposed { what: "bitmap" })
    }

    fn storage_mut(&mut self) -> PixieResult<&mut Storage> {
        self.storage.as_mut().ok_or(PixieError::Disposed { what: "bitmap" })
    }

    #[inline]
    pub fn is_disposed(&self) -> bool {
        self.storage.is_none()
    }

    pub fn is_mega(&self) -> PixieResult<bool> {
        Ok(matches!(self.storage()?, Storage::Mega(_)))
    }

    pub fn is_animated(&self) -> PixieResult<bool> {
        Ok(matches!(self.storage()?, Storage::Animated(_)))
    }

    pub fn rect(&self) -> PixieResult<IntRect> {
        Ok(match self.storage()? {
            Storage::Plain(f) => f.rect(),
            Storage::Mega(m) => m.surface().rect(),
            Storage::Animated(a) => a.rect(),
        })
    }

    pub fn width(&self) -> PixieResult<u32> {
        Ok(self.rect()?.w as u32)
    }

    pub fn height(&self) -> PixieResult<u32> {
        Ok(self.rect()?.h as u32)
    }

    /// Subscribers are notified after every mutation.
    #[inline]
    pub fn modified(&self) -> &Signal {
        &self.modified
    }

    pub fn ensure_non_mega(&self) -> PixieResult<()> {
        match self.storage()? {
            Storage::Mega(_) => Err(PixieError::invalid_state("operation not supported for mega surfaces")),
            _ => Ok(()),
        }
    }

    pub fn ensure_animated(&self) -> PixieResult<()> {
        match self.storage()? {
            Storage::Animated(_) => Ok(()),
            _ => Err(PixieError::invalid_state("bitmap is not animated")),
        }
    }

    pub fn ensure_non_animated(&self) -> PixieResult<()> {
        match self.storage()? {
            Storage::Animated(_) => Err(PixieError::invalid_state("operation not supported for animated bitmaps")),
            _ => Ok(()),
        }
    }

    pub fn ensure_not_playing(&self) -> PixieResult<()> {
        match self.storage()? {
            Storage::Animated(a) if a.is_playing() => {
                Err(PixieError::invalid_state("operation not supported while the animation is playing"))
            }
            _ => Ok(()),
        }
    }

    // ── hires pairing ─────────────────────────────────────────────────────

    pub fn has_hires(&self) -> bool {
        self.hires.is_some()
    }

    pub fn hires(&self) -> Option<SharedBitmap> {
        self.hires.clone()
    }

    pub fn lores(&self) -> Option<SharedBitmap> {
        self.lores.upgrade()
    }

    /// Pairs `hires` with `this`, replacing any previous sibling.
    pub fn set_hires(this: &SharedBitmap, hires: Option<SharedBitmap>) -> PixieResult<()> {
        if hires.as_ref().is_some_and(|h| Rc::ptr_eq(this, h)) {
            return Err(PixieError::invalid_state("a bitmap cannot be its own hires sibling"));
        }
        let mut me = this
            .try_borrow_mut()
            .map_err(|_| PixieError::invalid_state("bitmap is in use"))?;
        me.storage()?;
        if let Some(old) = me.hires.take() {
            if let Ok(mut old) = old.try_borrow_mut() {
                old.lores = Weak::new();
            }
        }
        if let Some(h) = &hires {
            h.try_borrow_mut()
                .map_err(|_| PixieError::invalid_state("hires bitmap is in use"))?
                .lores = Rc::downgrade(this);
        }
        me.hires = hires;
        Ok(())
    }

    /// Integer ratio between the hires sibling and this bitmap.
    fn hires_factor(&self, hires: &Bitmap) -> PixieResult<i32> {
        let base = self.width()?.max(1);
        Ok((hires.width()? / base).max(1) as i32)
    }

    /// Runs `op` on the hires sibling, if any, with the scale factor.
    fn mirror_hires(&self, op: impl FnOnce(&mut Bitmap, i32) -> PixieResult<()>) -> PixieResult<()> {
        let Some(h) = &self.hires else { return Ok(()) };
        let mut h = h
            .try_borrow_mut()
            .map_err(|_| PixieError::invalid_state("hires bitmap is in use"))?;
        let factor = self.hires_factor(&h)?;
        op(&mut h, factor)
    }

    // ── pixel access ──────────────────────────────────────────────────────

    /// Frame targeted by pixel writes: the plain frame, or the current
    /// animation frame while stopped.
    fn target_frame(&mut self) -> PixieResult<&mut Frame> {
        self.ensure_not_playing()?;
        match self.storage_mut()? {
            Storage::Plain(f) => Ok(f),
            Storage::Animated(a) => Ok(a.current_mut()),
            Storage::Mega(_) => Err(PixieError::invalid_state("operation not supported for mega surfaces")),
        }
    }

    fn read_surface(&self) -> PixieResult<&PixelSurface> {
        match self.storage()? {
            Storage::Plain(f) => Ok(f.surface()),
            Storage::Animated(a) => Ok(a.current().surface()),
            Storage::Mega(_) => Err(PixieError::invalid_state("operation not supported for mega surfaces")),
        }
    }

    /// Pixels of a plain bitmap, as a blit source.
    fn blt_source(&self) -> PixieResult<&PixelSurface> {
        match self.storage()? {
            Storage::Plain(f) => Ok(f.surface()),
            Storage::Mega(_) => Err(PixieError::invalid_state("cannot blit from a mega surface")),
            Storage::Animated(_) => Err(PixieError::invalid_state("cannot blit from an animated bitmap")),
        }
    }

    fn out_of_bounds(&self, x: i32, y: i32) -> PixieResult<PixieError> {
        let r = self.rect()?;
        Ok(if x < 0 || x >= r.w {
            PixieError::out_of_range("pixel x", x, r.w)
        } else {
            PixieError::out_of_range("pixel y", y, r.h)
        })
    }

    pub fn get_pixel(&self, x: i32, y: i32) -> PixieResult<Color> {
        match self.read_surface()?.get(x, y) {
            Some(px) => Ok(Color::from(px)),
            None => Err(self.out_of_bounds(x, y)?),
        }
    }

    pub fn set_pixel(&mut self, x: i32, y: i32, color: Color) -> PixieResult<()> {
        let px = color.to_rgba8();
        let frame = self.target_frame()?;
        if frame.write(|s| s.set(x, y, px).then(|| IntRect::new(x, y, 1, 1))).is_none() {
            return Err(self.out_of_bounds(x, y)?);
        }
        self.mirror_hires(|h, k| h.fill_rect(IntRect::new(x, y, 1, 1).scaled(k), color))?;
        self.modified.emit();
        Ok(())
    }

    /// Copies the current pixels into `out`, whose length must match exactly.
    pub fn get_raw(&self, out: &mut [u8]) -> PixieResult<()> {
        let raw = match self.storage()? {
            Storage::Mega(m) => m.surface().raw(),
            _ => self.read_surface()?.raw(),
        };
        if out.len() != raw.len() {
            return Err(PixieError::invalid_state(format!(
                "output buffer is {} bytes, bitmap holds {}",
                out.len(),
                raw.len()
            )));
        }
        out.copy_from_slice(raw);
        Ok(())
    }

    pub fn replace_raw(&mut self, data: &[u8]) -> PixieResult<()> {
        let frame = self.target_frame()?;
        let mut result = Ok(());
        frame.write_all(|s| result = s.replace_raw(data));
        result?;
        self.mirror_hires(|h, k| {
            let up = self.read_surface()?.upscaled(k as u32)?;
            if (up.width(), up.height()) != (h.width()?, h.height()?) {
                log::warn!("hires sibling is not an exact {k}x scale; raw pixels not mirrored");
                return Ok(());
            }
            h.replace_raw(up.raw())
        })?;
        self.modified.emit();
        Ok(())
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> PixieResult<()> {
        let surface = match self.storage()? {
            Storage::Mega(m) => m.surface(),
            _ => self.read_surface()?,
        };
        surface.to_image()?.save(path.as_ref())?;
        Ok(())
    }

    // ── drawing ───────────────────────────────────────────────────────────

    pub fn fill_rect(&mut self, rect: IntRect, color: Color) -> PixieResult<()> {
        let px = color.to_rgba8();
        self.target_frame()?.write(|s| s.fill_rect(rect, px));
        self.mirror_hires(|h, k| h.fill_rect(rect.scaled(k), color))?;
        self.modified.emit();
        Ok(())
    }

    pub fn gradient_fill_rect(
        &mut self,
        rect: IntRect,
        from: Color,
        to: Color,
        vertical: bool,
    ) -> PixieResult<()> {
        let (a, b) = (from.to_rgba8(), to.to_rgba8());
        self.target_frame()?.write(|s| s.gradient_fill_rect(rect, a, b, vertical));
        self.mirror_hires(|h, k| h.gradient_fill_rect(rect.scaled(k), from, to, vertical))?;
        self.modified.emit();
        Ok(())
    }

    pub fn clear_rect(&mut self, rect: IntRect) -> PixieResult<()> {
        self.target_frame()?.write(|s| s.fill_rect(rect, Rgba8::TRANSPARENT));
        self.mirror_hires(|h, k| h.clear_rect(rect.scaled(k)))?;
        self.modified.emit();
        Ok(())
    }

    pub fn clear(&mut self) -> PixieResult<()> {
        self.target_frame()?.write_all(PixelSurface::clear);
        self.mirror_hires(|h, _| h.clear())?;
        self.modified.emit();
        Ok(())
    }

    /// Copies `src_rect` of `source` to `(x, y)` at `opacity`.
    pub fn blt(&mut self, x: i32, y: i32, source: &Bitmap, src_rect: IntRect, opacity: i32) -> PixieResult<()> {
        self.stretch_blt(IntRect::new(x, y, src_rect.w, src_rect.h), source, src_rect, opacity)
    }

    /// Scaled copy of `src_rect` of `source` into `dst_rect`.
    pub fn stretch_blt(
        &mut self,
        dst_rect: IntRect,
        source: &Bitmap,
        src_rect: IntRect,
        opacity: i32,
    ) -> PixieResult<()> {
        self.ensure_non_animated()?;
        self.ensure_non_mega()?;
        let src = source.blt_source()?;
        let opacity = opacity.clamp(0, 255) as u8;
        if let Storage::Plain(f) = self.storage_mut()? {
            f.write(|s| s.stretch_blt(dst_rect, src, src_rect, opacity));
        }
        self.mirror_hires(|h, k| match source.hires.as_ref().map(|s| s.try_borrow()) {
            Some(Ok(src_hires)) => {
                let sk = source.hires_factor(&src_hires)?;
                h.stretch_blt(dst_rect.scaled(k), &src_hires, src_rect.scaled(sk), opacity as i32)
            }
            _ => h.stretch_blt(dst_rect.scaled(k), source, src_rect, opacity as i32),
        })?;
        self.modified.emit();
        Ok(())
    }

    pub fn hue_change(&mut self, hue: i32) -> PixieResult<()> {
        self.target_frame()?.write_all(|s| s.hue_change(hue));
        self.mirror_hires(|h, _| h.hue_change(hue))?;
        self.modified.emit();
        Ok(())
    }

    pub fn blur(&mut self) -> PixieResult<()> {
        self.target_frame()?.write_all(PixelSurface::blur);
        self.mirror_hires(|h, _| h.blur())?;
        self.modified.emit();
        Ok(())
    }

    pub fn radial_blur(&mut self, angle: i32, divisions: i32) -> PixieResult<()> {
        self.target_frame()?.write_all(|s| s.radial_blur(angle, divisions));
        self.mirror_hires(|h, _| h.radial_blur(angle, divisions))?;
        self.modified.emit();
        Ok(())
    }

    // ── animation ─────────────────────────────────────────────────────────

    fn animation(&self) -> PixieResult<&Animation> {
        match self.storage()? {
            Storage::Animated(a) => Ok(a),
            _ => Err(PixieError::invalid_state("bitmap is not animated")),
        }
    }

    fn animation_mut(&mut self) -> PixieResult<&mut Animation> {
        match self.storage_mut()? {
            Storage::Animated(a) => Ok(a),
            _ => Err(PixieError::invalid_state("bitmap is not animated")),
        }
    }

    /// Converts a plain bitmap into a one-frame animation.
    pub fn make_animated(&mut self, fps: f32) -> PixieResult<()> {
        self.ensure_non_mega()?;
        self.ensure_non_animated()?;
        if let Some(Storage::Plain(frame)) = self.storage.take() {
            self.storage = Some(Storage::Animated(Animation::single(frame, fps)));
        }
        self.modified.emit();
        Ok(())
    }

    pub fn play(&mut self) -> PixieResult<()> {
        self.animation_mut()?.play()
    }

    pub fn stop(&mut self) -> PixieResult<()> {
        self.animation_mut()?.stop();
        Ok(())
    }

    pub fn is_playing(&self) -> PixieResult<bool> {
        Ok(self.animation()?.is_playing())
    }

    pub fn goto_and_stop(&mut self, frame: i32) -> PixieResult<()> {
        self.animation_mut()?.goto_and_stop(frame)
    }

    pub fn goto_and_play(&mut self, frame: i32) -> PixieResult<()> {
        self.animation_mut()?.goto_and_play(frame)
    }

    pub fn num_frames(&self) -> PixieResult<usize> {
        Ok(self.animation()?.len())
    }

    pub fn current_frame_index(&self) -> PixieResult<usize> {
        Ok(self.animation()?.current_index())
    }

    pub fn next_frame(&mut self) -> PixieResult<()> {
        self.ensure_not_playing()?;
        self.animation_mut()?.next_frame();
        Ok(())
    }

    pub fn previous_frame(&mut self) -> PixieResult<()> {
        self.ensure_not_playing()?;
        self.animation_mut()?.previous_frame();
        Ok(())
    }

    /// Inserts a copy of `source`'s current image at `position` (`-1` appends).
    pub fn add_frame(&mut self, source: &Bitmap, position: i32) -> PixieResult<usize> {
        self.ensure_not_playing()?;
        self.ensure_animated()?;
        let frame = match source.storage()? {
            Storage::Plain(f) => f.duplicate(),
            Storage::Animated(a) => a.current().duplicate(),
            Storage::Mega(_) => return Err(PixieError::invalid_state("cannot add a mega surface as a frame")),
        };
        let index = self.animation_mut()?.insert(frame, position)?;
        self.modified.emit();
        Ok(index)
    }

    pub fn remove_frame<D: TextureDevice + ?Sized>(&mut self, position: i32, device: &mut D) -> PixieResult<()> {
        self.ensure_not_playing()?;
        self.animation_mut()?.remove(position, device)?;
        self.modified.emit();
        Ok(())
    }

    pub fn fps(&self) -> PixieResult<f32> {
        Ok(self.animation()?.fps())
    }

    pub fn set_fps(&mut self, fps: f32) -> PixieResult<()> {
        self.animation_mut()?.set_fps(fps);
        Ok(())
    }

    pub fn looping(&self) -> PixieResult<bool> {
        Ok(self.animation()?.looping())
    }

    pub fn set_looping(&mut self, looping: bool) -> PixieResult<()> {
        self.animation_mut()?.set_looping(looping);
        Ok(())
    }

    /// Playback tick; a no-op for non-animated or disposed bitmaps.
    pub fn advance(&mut self, dt: f64) {
        if let Some(Storage::Animated(a)) = &mut self.storage {
            a.advance(dt);
        }
    }

    // ── GPU ───────────────────────────────────────────────────────────────

    /// Uploads pending pixels and returns the texture with its size.
    pub fn texture<D: TextureDevice + ?Sized>(&mut self, device: &mut D) -> PixieResult<(TextureId, u32, u32)> {
        let frame = match self.storage_mut()? {
            Storage::Plain(f) => f,
            Storage::Animated(a) => a.current_mut(),
            Storage::Mega(_) => {
                return Err(PixieError::invalid_state("mega surfaces cannot be bound as a texture"));
            }
        };
        let id = frame.sync(device)?;
        let s = frame.surface();
        Ok((id, s.width(), s.height()))
    }

    /// Uploads pending pixels, binds the texture and sets the size uniform.
    pub fn bind_tex<D, S>(&mut self, device: &mut D, shader: &mut S) -> PixieResult<()>
    where
        D: TextureDevice + ?Sized,
        S: ShaderTarget + ?Sized,
    {
        let (id, w, h) = self.texture(device)?;
        shader.bind_texture(id, w, h);
        Ok(())
    }

    /// Releases textures and pixels and drops every subscriber.
    ///
    /// Disposing twice is a no-op. A hires sibling is disposed with its base.
    pub fn dispose<D: TextureDevice + ?Sized>(&mut self, device: &mut D) {
        let Some(storage) = self.storage.take() else { return };
        match storage {
            Storage::Plain(mut f) => f.release(device),
            Storage::Animated(mut a) => a.frames_mut().for_each(|f| f.release(device)),
            Storage::Mega(_) => {}
        }
        if let Some(h) = self.hires.take() {
            match h.try_borrow_mut() {
                Ok(mut h) => h.dispose(device),
                Err(_) => log::warn!("hires sibling busy during dispose; left alive"),
            }
        }
        self.modified.clear();
        log::trace!("bitmap disposed");
    }
}

fn hires_size(width: u32, height: u32, scale: u32) -> PixieResult<(u32, u32)> {
    match (width.checked_mul(scale), height.checked_mul(scale)) {
        (Some(w), Some(h)) => Ok((w, h)),
        _ => Err(PixieError::resource(format!(
            "hires size of {width}x{height} at scale {scale} overflows"
        ))),
    }
}
