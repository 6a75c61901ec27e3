use core::f32::consts::PI;

use crate::coords::{IntRect, Vec2, rotate_point};
use crate::error::{PixieError, PixieResult};
use crate::paint::Rgba8;

/// CPU-side straight-alpha RGBA8 image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelSurface {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelSurface {
    /// Fully transparent surface.
    pub fn new(width: u32, height: u32) -> PixieResult<Self> {
        let len = byte_len(width, height)?;
        Ok(Self {
            width,
            height,
            data: vec![0; len],
        })
    }

    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> PixieResult<Self> {
        let len = byte_len(width, height)?;
        if data.len() != len {
            return Err(PixieError::resource(format!(
                "pixel buffer of {} bytes does not match {width}x{height}",
                data.len()
            )));
        }
        Ok(Self { width, height, data })
    }

    pub fn from_image(image: image::RgbaImage) -> PixieResult<Self> {
        let (w, h) = image.dimensions();
        Self::from_raw(w, h, image.into_raw())
    }

    pub fn to_image(&self) -> PixieResult<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width, self.height, self.data.clone())
            .ok_or_else(|| PixieError::resource("pixel buffer shorter than image"))
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn rect(&self) -> IntRect {
        IntRect::from_size(self.width as i32, self.height as i32)
    }

    #[inline]
    pub fn raw(&self) -> &[u8] {
        &self.data
    }

    /// Overwrites the whole buffer. Lengths must match exactly.
    pub fn replace_raw(&mut self, data: &[u8]) -> PixieResult<()> {
        if data.len() != self.data.len() {
            return Err(PixieError::invalid_state(format!(
                "raw buffer is {} bytes, surface holds {}",
                data.len(),
                self.data.len()
            )));
        }
        self.data.copy_from_slice(data);
        Ok(())
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> usize {
        self.pixel_index(x, y) * 4
    }

    #[inline]
    fn pixel_index(&self, x: i32, y: i32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    #[inline]
    fn pixels(&self) -> &[Rgba8] {
        bytemuck::cast_slice(&self.data)
    }

    #[inline]
    fn pixels_mut(&mut self) -> &mut [Rgba8] {
        bytemuck::cast_slice_mut(&mut self.data)
    }

    pub fn get(&self, x: i32, y: i32) -> Option<Rgba8> {
        if !self.rect().contains(x, y) {
            return None;
        }
        Some(self.pixels()[self.pixel_index(x, y)])
    }

    /// Returns `false` when `(x, y)` lies outside the surface.
    pub fn set(&mut self, x: i32, y: i32, color: Rgba8) -> bool {
        if !self.rect().contains(x, y) {
            return false;
        }
        let i = self.pixel_index(x, y);
        self.pixels_mut()[i] = color;
        true
    }

    /// Fills `rect` clipped to the surface; returns the touched region.
    pub fn fill_rect(&mut self, rect: IntRect, color: Rgba8) -> Option<IntRect> {
        let r = rect.intersection(self.rect())?;
        for y in r.y..r.bottom() {
            let start = self.pixel_index(r.x, y);
            self.pixels_mut()[start..start + r.w as usize].fill(color);
        }
        Some(r)
    }

    /// Linear gradient from `from` to `to` across `rect`, left to right or top to bottom.
    ///
    /// The gradient is laid out over the unclipped rectangle so partially
    /// visible fills keep their colors.
    pub fn gradient_fill_rect(
        &mut self,
        rect: IntRect,
        from: Rgba8,
        to: Rgba8,
        vertical: bool,
    ) -> Option<IntRect> {
        let r = rect.intersection(self.rect())?;
        let span = if vertical { rect.h } else { rect.w };
        let denom = (span - 1).max(1) as f32;
        for y in r.y..r.bottom() {
            for x in r.x..r.right() {
                let step = if vertical { y - rect.y } else { x - rect.x };
                let c = from.lerp(to, step as f32 / denom);
                let i = self.index(x, y);
                self.data[i..i + 4].copy_from_slice(&c.0);
            }
        }
        Some(r)
    }

    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    /// Copies `src_rect` of `source` into `dst_rect`, nearest-neighbour scaled,
    /// composited over the destination with `opacity` (0..=255).
    pub fn stretch_blt(
        &mut self,
        dst_rect: IntRect,
        source: &PixelSurface,
        src_rect: IntRect,
        opacity: u8,
    ) -> Option<IntRect> {
        if dst_rect.is_empty() || src_rect.is_empty() || opacity == 0 {
            return None;
        }
        let visible = dst_rect.intersection(self.rect())?;
        let sx_scale = src_rect.w as f32 / dst_rect.w as f32;
        let sy_scale = src_rect.h as f32 / dst_rect.h as f32;
        let op = opacity as f32 / 255.0;
        let mut touched = false;

        for y in visible.y..visible.bottom() {
            let sy = src_rect.y + ((y - dst_rect.y) as f32 * sy_scale) as i32;
            for x in visible.x..visible.right() {
                let sx = src_rect.x + ((x - dst_rect.x) as f32 * sx_scale) as i32;
                let Some(src) = source.get(sx, sy) else { continue };
                let i = self.index(x, y);
                let mut dst = [0u8; 4];
                dst.copy_from_slice(&self.data[i..i + 4]);
                self.data[i..i + 4].copy_from_slice(&blend_over(Rgba8(dst), src, op).0);
                touched = true;
            }
        }
        touched.then_some(visible)
    }

    /// Rotates every pixel's hue by `degrees` in YIQ space.
    pub fn hue_change(&mut self, degrees: i32) {
        let degrees = degrees.rem_euclid(360);
        if degrees == 0 {
            return;
        }
        let (s, c) = (degrees as f32 * PI / 180.0).sin_cos();
        for Rgba8(px) in self.pixels_mut() {
            let (r, g, b) = (px[0] as f32, px[1] as f32, px[2] as f32);
            let y = 0.299 * r + 0.587 * g + 0.114 * b;
            let i = 0.596 * r - 0.274 * g - 0.322 * b;
            let q = 0.211 * r - 0.523 * g + 0.312 * b;
            let (i, q) = (i * c - q * s, i * s + q * c);
            px[0] = to_u8(y + 0.956 * i + 0.621 * q);
            px[1] = to_u8(y - 0.272 * i - 0.647 * q);
            px[2] = to_u8(y - 1.106 * i + 1.703 * q);
        }
    }

    /// 3x3 binomial blur with edge clamping.
    pub fn blur(&mut self) {
        let mut tmp = vec![0u8; self.data.len()];
        horizontal_pass(&self.data, &mut tmp, self.width, self.height);
        vertical_pass(&tmp, &mut self.data, self.width, self.height);
    }

    /// Averages `divisions` copies of the image rotated about its centre,
    /// spread evenly over `angle` degrees.
    pub fn radial_blur(&mut self, angle: i32, divisions: i32) {
        let angle = angle.clamp(0, 359);
        let divisions = divisions.clamp(2, 100);
        if angle == 0 {
            return;
        }
        let centre = Vec2::new(self.width as f32 / 2.0, self.height as f32 / 2.0);
        let step = angle as f32 / (divisions - 1) as f32;
        let rotations: Vec<f32> = (0..divisions)
            .map(|d| (-(angle as f32) / 2.0 + d as f32 * step) * PI / 180.0)
            .collect();

        let src = self.clone();
        for y in 0..self.height as i32 {
            for x in 0..self.width as i32 {
                let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let mut acc = [0u32; 4];
                for &rot in &rotations {
                    let s = rotate_point(centre, rot, p);
                    if let Some(px) = src.get(s.x.floor() as i32, s.y.floor() as i32) {
                        for (a, v) in acc.iter_mut().zip(px.0) {
                            *a += v as u32;
                        }
                    }
                }
                let n = rotations.len() as u32;
                let out = acc.map(|a| ((a + n / 2) / n) as u8);
                let i = self.index(x, y);
                self.data[i..i + 4].copy_from_slice(&out);
            }
        }
    }

    /// Integer nearest-neighbour upscale.
    pub fn upscaled(&self, factor: u32) -> PixieResult<PixelSurface> {
        let (Some(w), Some(h)) = (self.width.checked_mul(factor), self.height.checked_mul(factor)) else {
            return Err(PixieError::resource(format!(
                "{}x{} upscaled by {factor} overflows",
                self.width, self.height
            )));
        };
        let mut out = PixelSurface::new(w, h)?;
        let rect = out.rect();
        out.stretch_blt(rect, self, self.rect(), 255);
        Ok(out)
    }
}

fn byte_len(width: u32, height: u32) -> PixieResult<usize> {
    if width == 0 || height == 0 {
        return Err(PixieError::resource(format!("invalid surface size {width}x{height}")));
    }
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| PixieError::resource("surface size overflow"))
}

#[inline]
fn to_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Straight-alpha source-over with an extra opacity factor.
fn blend_over(dst: Rgba8, src: Rgba8, opacity: f32) -> Rgba8 {
    let sa = src.alpha() as f32 / 255.0 * opacity;
    let da = dst.alpha() as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return Rgba8::TRANSPARENT;
    }
    let mut out = [0u8; 4];
    for c in 0..3 {
        let v = (src.0[c] as f32 * sa + dst.0[c] as f32 * da * (1.0 - sa)) / out_a;
        out[c] = to_u8(v);
    }
    out[3] = to_u8(out_a * 255.0);
    Rgba8(out)
}

const KERNEL: [u32; 3] = [1, 2, 1];

fn horizontal_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32) {
    let w = width as i32;
    for y in 0..height as i32 {
        for x in 0..w {
            let mut acc = [0u32; 4];
            for (ki, &kw) in KERNEL.iter().enumerate() {
                let sx = (x + ki as i32 - 1).clamp(0, w - 1);
                let idx = ((y * w + sx) as usize) * 4;
                for c in 0..4 {
                    acc[c] += kw * src[idx + c] as u32;
                }
            }
            let out_idx = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                dst[out_idx + c] = ((acc[c] + 2) / 4) as u8;
            }
        }
    }
}

fn vertical_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32) {
    let w = width as i32;
    let h = height as i32;
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0u32; 4];
            for (ki, &kw) in KERNEL.iter().enumerate() {
                let sy = (y + ki as i32 - 1).clamp(0, h - 1);
                let idx = ((sy * w + x) as usize) * 4;
                for c in 0..4 {
                    acc[c] += kw * src[idx + c] as u32;
                }
            }
            let out_idx = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                dst[out_idx + c] = ((acc[c] + 2) / 4) as u8;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba8 = Rgba8::new(255, 0, 0, 255);
    const BLUE: Rgba8 = Rgba8::new(0, 0, 255, 255);

    fn solid(w: u32, h: u32, c: Rgba8) -> PixelSurface {
        let mut s = PixelSurface::new(w, h).unwrap();
        s.fill_rect(s.rect(), c);
        s
    }

    // ── construction ──────────────────────────────────────────────────────

    #[test]
    fn zero_size_is_a_resource_error() {
        assert!(PixelSurface::new(0, 4).unwrap_err().is_resource());
    }

    #[test]
    fn raw_length_must_match() {
        assert!(PixelSurface::from_raw(2, 2, vec![0; 15]).is_err());
        let mut s = PixelSurface::from_raw(2, 2, vec![7; 16]).unwrap();
        assert!(s.replace_raw(&[0; 8]).is_err());
        s.replace_raw(&[1; 16]).unwrap();
        assert_eq!(s.raw(), &[1; 16]);
    }

    // ── fills ─────────────────────────────────────────────────────────────

    #[test]
    fn fill_is_clipped_to_surface() {
        let mut s = PixelSurface::new(4, 4).unwrap();
        let touched = s.fill_rect(IntRect::new(2, 2, 10, 10), RED);
        assert_eq!(touched, Some(IntRect::new(2, 2, 2, 2)));
        assert_eq!(s.get(3, 3), Some(RED));
        assert_eq!(s.get(1, 1), Some(Rgba8::TRANSPARENT));
        assert_eq!(s.fill_rect(IntRect::new(10, 10, 2, 2), RED), None);
    }

    #[test]
    fn gradient_hits_both_endpoints() {
        let mut s = PixelSurface::new(5, 1).unwrap();
        s.gradient_fill_rect(s.rect(), RED, BLUE, false);
        assert_eq!(s.get(0, 0), Some(RED));
        assert_eq!(s.get(4, 0), Some(BLUE));
        assert_eq!(s.get(2, 0), Some(Rgba8::new(128, 0, 128, 255)));
    }

    #[test]
    fn vertical_gradient_is_constant_along_rows() {
        let mut s = PixelSurface::new(3, 3).unwrap();
        s.gradient_fill_rect(s.rect(), RED, BLUE, true);
        assert_eq!(s.get(0, 1), s.get(2, 1));
        assert_eq!(s.get(1, 2), Some(BLUE));
    }

    // ── blt ───────────────────────────────────────────────────────────────

    #[test]
    fn opaque_blt_replaces_destination() {
        let mut dst = solid(4, 4, BLUE);
        let src = solid(2, 2, RED);
        let r = dst.stretch_blt(IntRect::new(1, 1, 2, 2), &src, src.rect(), 255);
        assert_eq!(r, Some(IntRect::new(1, 1, 2, 2)));
        assert_eq!(dst.get(1, 1), Some(RED));
        assert_eq!(dst.get(0, 0), Some(BLUE));
    }

    #[test]
    fn half_opacity_blends() {
        let mut dst = solid(1, 1, BLUE);
        let src = solid(1, 1, RED);
        dst.stretch_blt(dst.rect(), &src, src.rect(), 128);
        let px = dst.get(0, 0).unwrap();
        assert!(px.0[0] > 120 && px.0[0] < 135);
        assert!(px.0[2] > 120 && px.0[2] < 135);
        assert_eq!(px.alpha(), 255);
    }

    #[test]
    fn stretch_doubles_pixels() {
        let mut src = PixelSurface::new(2, 1).unwrap();
        src.set(0, 0, RED);
        src.set(1, 0, BLUE);
        let mut dst = PixelSurface::new(4, 1).unwrap();
        dst.stretch_blt(dst.rect(), &src, src.rect(), 255);
        assert_eq!(dst.get(1, 0), Some(RED));
        assert_eq!(dst.get(2, 0), Some(BLUE));
    }

    #[test]
    fn transparent_source_over_empty_stays_empty() {
        let mut dst = PixelSurface::new(1, 1).unwrap();
        let src = PixelSurface::new(1, 1).unwrap();
        dst.stretch_blt(dst.rect(), &src, src.rect(), 255);
        assert_eq!(dst.get(0, 0), Some(Rgba8::TRANSPARENT));
    }

    // ── filters ───────────────────────────────────────────────────────────

    #[test]
    fn hue_zero_and_full_turn_are_noops() {
        let mut s = solid(2, 2, Rgba8::new(10, 200, 30, 255));
        let before = s.clone();
        s.hue_change(0);
        s.hue_change(360);
        assert_eq!(s, before);
        s.hue_change(120);
        assert_ne!(s, before);
        assert_eq!(s.get(0, 0).unwrap().alpha(), 255);
    }

    #[test]
    fn gray_is_hue_invariant() {
        let gray = Rgba8::new(90, 90, 90, 255);
        let mut s = solid(1, 1, gray);
        s.hue_change(77);
        let px = s.get(0, 0).unwrap();
        for c in 0..3 {
            assert!((px.0[c] as i32 - 90).abs() <= 1);
        }
    }

    #[test]
    fn blur_of_constant_image_is_identity() {
        let mut s = solid(4, 3, Rgba8::new(10, 20, 30, 40));
        let before = s.clone();
        s.blur();
        assert_eq!(s, before);
    }

    #[test]
    fn blur_spreads_a_single_pixel() {
        let mut s = PixelSurface::new(5, 5).unwrap();
        s.set(2, 2, Rgba8::new(255, 255, 255, 255));
        s.blur();
        let lit = s.raw().chunks_exact(4).filter(|px| px[3] != 0).count();
        assert_eq!(lit, 9);
        assert!(s.get(2, 2).unwrap().alpha() < 255);
    }

    #[test]
    fn radial_blur_zero_angle_is_noop() {
        let mut s = PixelSurface::new(4, 4).unwrap();
        s.set(0, 0, RED);
        let before = s.clone();
        s.radial_blur(0, 10);
        assert_eq!(s, before);
        s.radial_blur(90, 4);
        assert_ne!(s, before);
    }

    // ── upscale ───────────────────────────────────────────────────────────

    #[test]
    fn upscale_repeats_pixels() {
        let mut s = PixelSurface::new(1, 1).unwrap();
        s.set(0, 0, RED);
        let u = s.upscaled(2).unwrap();
        assert_eq!((u.width(), u.height()), (2, 2));
        assert_eq!(u.get(1, 1), Some(RED));
        assert!(s.upscaled(u32::MAX).unwrap_err().is_resource());
    }
}
