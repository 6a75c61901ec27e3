use core::f32::consts::PI;

use crate::coords::{IntRect, Rect};
use crate::render::{Quad, Vertex};

/// Height in screen pixels of one wave strip.
pub const STRIP_HEIGHT: i32 = 8;

/// Horizontal sine displacement parameters.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct WaveParams {
    /// Peak displacement in pixels; `0` disables the effect.
    pub amp: i32,
    /// Wavelength in source pixels.
    pub length: i32,
    /// Phase advance per update, in 1/180 degree units.
    pub speed: i32,
    /// Degrees.
    pub phase: f32,
}

impl Default for WaveParams {
    fn default() -> Self {
        Self {
            amp: 0,
            length: 180,
            speed: 360,
            phase: 0.0,
        }
    }
}

impl WaveParams {
    #[inline]
    pub fn is_active(&self) -> bool {
        self.amp != 0
    }
}

/// Strip mesh of an active wave.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WaveMesh {
    pub active: bool,
    pub quads: Vec<Quad>,
    pub vertices: Vec<Vertex>,
}

impl WaveMesh {
    fn from_quads(quads: Vec<Quad>) -> Self {
        let mut vertices = Vec::with_capacity(quads.len() * 4);
        for q in &quads {
            q.push_into(&mut vertices);
        }
        Self { active: true, quads, vertices }
    }
}

/// Where the sprite sits when the mesh is built.
#[derive(Debug, Copy, Clone)]
pub struct WaveLayout {
    pub src_rect: IntRect,
    pub mirrored: bool,
    /// Screen y of the sprite; strips align to absolute 8px rows.
    pub y: f32,
    pub zoom_y: f32,
}

/// Splits the source rectangle into displaced strips.
///
/// A negative amplitude narrows the sprite symmetrically instead, and one
/// wider than half the width leaves nothing to draw.
pub fn tessellate(wave: &WaveParams, layout: &WaveLayout) -> WaveMesh {
    if !wave.is_active() {
        return WaveMesh::default();
    }

    let src = layout.src_rect;
    let width = src.w;
    let height = src.h;
    let flip = |r: Rect| if layout.mirrored { r.h_flipped() } else { r };

    if wave.amp < -(width / 2) {
        return WaveMesh { active: true, ..WaveMesh::default() };
    }

    if wave.amp < 0 {
        let x = -wave.amp;
        let w = width - x * 2;
        // Samples unflipped even when mirrored.
        let r = Rect::new(x as f32, src.y as f32, w as f32, height as f32);
        return WaveMesh::from_quads(vec![Quad::new(r, r)]);
    }

    let zoom_y = layout.zoom_y;
    let visible = ((height as f32 * zoom_y) as i32).max(0);
    let first = (layout.y as i32).rem_euclid(STRIP_HEIGHT).min(visible);
    let rest = visible - first;
    let last = rest % STRIP_HEIGHT;
    let full = rest / STRIP_HEIGHT;

    let phase = wave.phase * PI / 180.0;
    let length = wave.length.max(1) as f32;
    let strip = |chunk_y: i32, len: i32| -> Quad {
        let local_y = chunk_y as f32 / zoom_y;
        let pos_x = wave.amp as f32 * (phase + local_y / length * 2.0 * PI).sin();
        let h = len as f32 / zoom_y;
        let tex = Rect::new(src.x as f32, src.y as f32 + local_y, width as f32, h);
        let pos = Rect::new(pos_x, local_y, width as f32, h);
        Quad::new(flip(tex), pos)
    };

    let mut quads = Vec::with_capacity(full as usize + 2);
    if first > 0 {
        quads.push(strip(0, first));
    }
    for i in 0..full {
        quads.push(strip(first + i * STRIP_HEIGHT, STRIP_HEIGHT));
    }
    if last > 0 {
        quads.push(strip(first + full * STRIP_HEIGHT, last));
    }
    WaveMesh::from_quads(quads)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(w: i32, h: i32, y: f32) -> WaveLayout {
        WaveLayout {
            src_rect: IntRect::new(0, 0, w, h),
            mirrored: false,
            y,
            zoom_y: 1.0,
        }
    }

    fn wave(amp: i32) -> WaveParams {
        WaveParams { amp, ..WaveParams::default() }
    }

    #[test]
    fn zero_amplitude_is_inactive() {
        let m = tessellate(&wave(0), &layout(20, 20, 0.0));
        assert!(!m.active);
        assert!(m.quads.is_empty());
    }

    #[test]
    fn negative_amplitude_insets_both_sides() {
        let m = tessellate(&wave(-5), &layout(20, 16, 0.0));
        assert!(m.active);
        assert_eq!(m.quads.len(), 1);
        assert_eq!(m.quads[0].pos, Rect::new(5.0, 0.0, 10.0, 16.0));
        assert_eq!(m.vertices.len(), 4);
    }

    #[test]
    fn negative_amplitude_ignores_mirroring() {
        let mut l = layout(20, 20, 0.0);
        l.mirrored = true;
        let m = tessellate(&wave(-5), &l);
        assert_eq!(m.quads.len(), 1);
        assert_eq!(m.quads[0].tex, m.quads[0].pos);
        assert_eq!(m.quads[0].tex, Rect::new(5.0, 0.0, 10.0, 20.0));
    }

    #[test]
    fn amplitude_beyond_half_width_draws_nothing() {
        let m = tessellate(&wave(-11), &layout(20, 16, 0.0));
        assert!(m.active);
        assert!(m.quads.is_empty());
    }

    #[test]
    fn strips_cover_the_visible_height() {
        let m = tessellate(&wave(4), &layout(16, 20, 3.0));
        // 3px lead strip, two full strips, 1px tail.
        assert_eq!(m.quads.len(), 4);
        assert_eq!(m.quads[0].pos.size.y, 3.0);
        assert_eq!(m.quads[1].pos.origin.y, 3.0);
        assert_eq!(m.quads[3].pos.size.y, 1.0);
        let total: f32 = m.quads.iter().map(|q| q.pos.size.y).sum();
        assert_eq!(total, 20.0);
    }

    #[test]
    fn aligned_sprite_has_no_lead_strip() {
        let m = tessellate(&wave(4), &layout(16, 16, 8.0));
        assert_eq!(m.quads.len(), 2);
        assert!(m.quads.iter().all(|q| q.pos.size.y == 8.0));
    }

    #[test]
    fn displacement_follows_phase() {
        let w = WaveParams { amp: 10, length: 180, speed: 360, phase: 90.0 };
        let m = tessellate(&w, &layout(8, 8, 0.0));
        assert!((m.quads[0].pos.origin.x - 10.0).abs() < 1e-4);
    }

    #[test]
    fn zero_wavelength_does_not_divide_by_zero() {
        let w = WaveParams { amp: 3, length: 0, speed: 0, phase: 0.0 };
        let m = tessellate(&w, &layout(8, 24, 0.0));
        assert!(m.quads.iter().all(|q| q.pos.origin.x.is_finite()));
    }

    #[test]
    fn mirrored_strips_sample_flipped() {
        let mut l = layout(8, 8, 0.0);
        l.mirrored = true;
        let m = tessellate(&wave(2), &l);
        assert!(m.quads[0].tex.size.x < 0.0);
    }
}
