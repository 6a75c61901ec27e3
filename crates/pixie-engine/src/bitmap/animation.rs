use crate::coords::IntRect;
use crate::error::{PixieError, PixieResult};
use crate::render::TextureDevice;

use super::Frame;

/// Ordered frames of equal size with playback state.
///
/// Playback is driven by [`Animation::advance`]; the current frame is
/// `start + floor(elapsed * fps)`, wrapped when looping, otherwise clamped
/// to the last frame where playback stops.
#[derive(Debug)]
pub struct Animation {
    frames: Vec<Frame>,
    current: usize,
    fps: f32,
    looping: bool,
    playing: bool,
    start: usize,
    elapsed: f64,
}

impl Animation {
    pub fn new(frames: Vec<Frame>, fps: f32) -> PixieResult<Self> {
        let mut frames = frames.into_iter();
        let Some(first) = frames.next() else {
            return Err(PixieError::invalid_state("an animation needs at least one frame"));
        };
        let mut animation = Self::single(first, fps);
        for frame in frames {
            if frame.rect() != animation.rect() {
                return Err(PixieError::invalid_state("animation frames differ in size"));
            }
            animation.frames.push(frame);
        }
        Ok(animation)
    }

    /// One-frame animation, stopped.
    pub fn single(frame: Frame, fps: f32) -> Self {
        Self {
            frames: vec![frame],
            current: 0,
            fps: fps.max(0.0),
            looping: true,
            playing: false,
            start: 0,
            elapsed: 0.0,
        }
    }

    /// Deep copy of frames and playback state; textures are not shared.
    pub fn duplicate(&self) -> Self {
        Self {
            frames: self.frames.iter().map(Frame::duplicate).collect(),
            ..*self
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[inline]
    pub fn rect(&self) -> IntRect {
        self.frames[0].rect()
    }

    pub fn current(&self) -> &Frame {
        &self.frames[self.current]
    }

    pub fn current_mut(&mut self) -> &mut Frame {
        &mut self.frames[self.current]
    }

    pub fn frame(&self, index: usize) -> PixieResult<&Frame> {
        self.frames
            .get(index)
            .ok_or_else(|| PixieError::out_of_range("frame", index as i64, self.len() as i64))
    }

    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    pub fn set_fps(&mut self, fps: f32) {
        self.fps = if fps.is_finite() { fps.max(0.0) } else { 0.0 };
        self.restart_clock();
    }

    #[inline]
    pub fn looping(&self) -> bool {
        self.looping
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn play(&mut self) -> PixieResult<()> {
        if self.fps <= 0.0 {
            return Err(PixieError::invalid_state("cannot play an animation at 0 fps"));
        }
        self.playing = true;
        self.restart_clock();
        Ok(())
    }

    pub fn stop(&mut self) {
        self.playing = false;
    }

    fn check_index(&self, frame: i32) -> PixieResult<usize> {
        if frame < 0 || frame as usize >= self.len() {
            return Err(PixieError::out_of_range("frame", frame, self.len() as i64));
        }
        Ok(frame as usize)
    }

    pub fn goto_and_stop(&mut self, frame: i32) -> PixieResult<()> {
        self.current = self.check_index(frame)?;
        self.stop();
        Ok(())
    }

    pub fn goto_and_play(&mut self, frame: i32) -> PixieResult<()> {
        let index = self.check_index(frame)?;
        self.play()?;
        self.current = index;
        self.restart_clock();
        Ok(())
    }

    pub fn next_frame(&mut self) {
        self.current = self.step(self.current as i64 + 1);
        self.restart_clock();
    }

    pub fn previous_frame(&mut self) {
        self.current = self.step(self.current as i64 - 1);
        self.restart_clock();
    }

    fn step(&self, target: i64) -> usize {
        let len = self.len() as i64;
        if self.looping {
            target.rem_euclid(len) as usize
        } else {
            target.clamp(0, len - 1) as usize
        }
    }

    /// Inserts `frame` at `position`; `-1` appends. Returns the new index.
    pub fn insert(&mut self, frame: Frame, position: i32) -> PixieResult<usize> {
        if frame.rect() != self.rect() {
            return Err(PixieError::invalid_state(format!(
                "frame size {:?} does not match animation size {:?}",
                frame.rect().size(),
                self.rect().size()
            )));
        }
        let index = match position {
            -1 => self.len(),
            p if p >= 0 && p as usize <= self.len() => p as usize,
            p => return Err(PixieError::out_of_range("frame position", p, self.len() as i64)),
        };
        self.frames.insert(index, frame);
        if index <= self.current && self.len() > 1 {
            self.current += 1;
        }
        Ok(index)
    }

    /// Removes the frame at `position` (`-1` = last) and releases its texture.
    pub fn remove<D: TextureDevice + ?Sized>(&mut self, position: i32, device: &mut D) -> PixieResult<()> {
        if self.len() == 1 {
            return Err(PixieError::invalid_state("cannot remove the only frame"));
        }
        let index = match position {
            -1 => self.len() - 1,
            p => self.check_index(p)?,
        };
        let mut removed = self.frames.remove(index);
        removed.release(device);
        if self.current > index || self.current >= self.len() {
            self.current = self.current.saturating_sub(1);
        }
        Ok(())
    }

    /// Advances playback by `dt` seconds.
    pub fn advance(&mut self, dt: f64) {
        if !self.playing || self.fps <= 0.0 {
            return;
        }
        self.elapsed += dt.max(0.0);
        let steps = (self.elapsed * self.fps as f64).floor() as i64;
        let target = self.start as i64 + steps;
        let last = self.len() as i64 - 1;
        if !self.looping && target >= last {
            self.current = last as usize;
            self.playing = false;
            return;
        }
        self.current = self.step(target);
    }

    fn restart_clock(&mut self) {
        self.start = self.current;
        self.elapsed = 0.0;
    }

    pub fn frames_mut(&mut self) -> impl Iterator<Item = &mut Frame> {
        self.frames.iter_mut()
    }
}
