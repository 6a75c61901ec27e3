use core::f32::consts::PI;

use crate::cache::Cached;

use super::{IntRect, Rect, Vec2, Vec2i};

/// 2D affine matrix.
///
/// Maps `(x, y)` to `(a*x + c*y + tx, b*x + d*y + ty)`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Affine {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub tx: f32,
    pub ty: f32,
}

impl Affine {
    pub const IDENTITY: Affine = Affine {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        tx: 0.0,
        ty: 0.0,
    };

    #[inline]
    pub fn apply(&self, p: Vec2) -> Vec2 {
        Vec2::new(
            self.a * p.x + self.c * p.y + self.tx,
            self.b * p.x + self.d * p.y + self.ty,
        )
    }

    /// Column-major 4x4 layout expected by shader uniforms.
    pub fn to_cols_array(&self) -> [f32; 16] {
        let mut m = [0.0; 16];
        m[0] = self.a;
        m[1] = self.b;
        m[4] = self.c;
        m[5] = self.d;
        m[10] = 1.0;
        m[12] = self.tx;
        m[13] = self.ty;
        m[15] = 1.0;
        m
    }
}

impl Default for Affine {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Position/origin/scale/rotation with a lazily derived matrix.
///
/// Every setter marks the matrix dirty; [`Transform::matrix`] recomputes it at
/// most once per batch of changes.
#[derive(Debug, Clone)]
pub struct Transform {
    position: Vec2,
    origin: Vec2,
    scale: Vec2,
    /// Degrees as set; wrapped into (-360, 360) when the matrix is derived.
    /// Negative angles stay negative.
    rotation: f32,
    /// Scene offset, silently added to the position.
    offset: Vec2i,
    matrix: Cached<Affine>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec2::zero(),
            origin: Vec2::zero(),
            scale: Vec2::one(),
            rotation: 0.0,
            offset: Vec2i::default(),
            matrix: Cached::dirty(Affine::IDENTITY),
        }
    }
}

impl Transform {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    #[inline]
    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    #[inline]
    pub fn scale(&self) -> Vec2 {
        self.scale
    }

    #[inline]
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    #[inline]
    pub fn global_offset(&self) -> Vec2i {
        self.offset
    }

    #[inline]
    pub fn position_i(&self) -> Vec2i {
        self.position.to_int()
    }

    #[inline]
    pub fn origin_i(&self) -> Vec2i {
        self.origin.to_int()
    }

    pub fn set_position(&mut self, value: Vec2) {
        self.position = value;
        self.matrix.invalidate();
    }

    pub fn set_origin(&mut self, value: Vec2) {
        self.origin = value;
        self.matrix.invalidate();
    }

    pub fn set_scale(&mut self, value: Vec2) {
        self.scale = value;
        self.matrix.invalidate();
    }

    pub fn set_rotation(&mut self, degrees: f32) {
        self.rotation = degrees;
        self.matrix.invalidate();
    }

    pub fn set_global_offset(&mut self, value: Vec2i) {
        self.offset = value;
        self.matrix.invalidate();
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.matrix.is_dirty()
    }

    /// Returns the matrix, recomputing it first if any setter ran since the last read.
    pub fn matrix(&mut self) -> Affine {
        if self.matrix.is_dirty() {
            self.rotation = wrap_degrees(self.rotation);
        }
        let (position, origin, scale, rotation, offset) =
            (self.position, self.origin, self.scale, self.rotation, self.offset);
        *self.matrix.get_or_refresh(|m| {
            *m = compose(position, origin, scale, rotation, offset);
        })
    }
}

/// Wraps into [-360, 360) keeping the sign, so -45 stays -45 and 450 becomes 90.
#[inline]
fn wrap_degrees(degrees: f32) -> f32 {
    if !(-360.0..360.0).contains(&degrees) {
        degrees % 360.0
    } else {
        degrees
    }
}

fn compose(position: Vec2, origin: Vec2, scale: Vec2, rotation: f32, offset: Vec2i) -> Affine {
    let angle = rotation * PI / 180.0;
    let (sine, cosine) = angle.sin_cos();
    let sxc = scale.x * cosine;
    let syc = scale.y * cosine;
    let sxs = scale.x * sine;
    let sys = scale.y * sine;

    Affine {
        a: sxc,
        b: -sxs,
        c: sys,
        d: syc,
        tx: -origin.x * sxc - origin.y * sys + position.x + offset.x as f32,
        ty: origin.x * sxs - origin.y * syc + position.y + offset.y as f32,
    }
}

/// Rotates `point` about `origin` by `angle` radians, counter-clockwise in a
/// +Y-up frame.
pub fn rotate_point(origin: Vec2, angle: f32, point: Vec2) -> Vec2 {
    let (s, c) = angle.sin_cos();
    let p = point - origin;
    Vec2::new(p.x * c - p.y * s + origin.x, p.x * s + p.y * c + origin.y)
}

/// Bounding rectangle of `rect` after rotating it by `degrees` about `origin`.
///
/// Bounds are rounded outward (floor on the min corner, ceil on the max
/// corner) so rotated content is never clipped by a fractional pixel.
pub fn rotate_rect(origin: Vec2i, degrees: f32, rect: IntRect) -> Rect {
    let angle = -degrees * PI / 180.0;
    let o = Vec2::from(origin);
    let corners = [
        Vec2::new(rect.x as f32, rect.y as f32),
        Vec2::new(rect.right() as f32, rect.y as f32),
        Vec2::new(rect.x as f32, rect.bottom() as f32),
        Vec2::new(rect.right() as f32, rect.bottom() as f32),
    ]
    .map(|p| rotate_point(o, angle, p));

    let (mut min, mut max) = (corners[0], corners[0]);
    for p in &corners[1..] {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
    }

    let x0 = outward_floor(min.x);
    let y0 = outward_floor(min.y);
    Rect::new(x0, y0, outward_ceil(max.x) - x0, outward_ceil(max.y) - y0)
}

// sin/cos of multiples of 90 degrees are not exact in f32; snap values
// sitting on an integer so they do not grow the bounds by a whole pixel.
const SNAP_EPSILON: f32 = 1e-3;

#[inline]
fn outward_floor(v: f32) -> f32 {
    let r = v.round();
    if (v - r).abs() < SNAP_EPSILON { r } else { v.floor() }
}

#[inline]
fn outward_ceil(v: f32) -> f32 {
    let r = v.round();
    if (v - r).abs() < SNAP_EPSILON { r } else { v.ceil() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    fn approx_affine(a: Affine, b: Affine) -> bool {
        approx(a.a, b.a)
            && approx(a.b, b.b)
            && approx(a.c, b.c)
            && approx(a.d, b.d)
            && approx(a.tx, b.tx)
            && approx(a.ty, b.ty)
    }

    // ── matrix ────────────────────────────────────────────────────────────

    #[test]
    fn default_is_identity() {
        let mut t = Transform::new();
        assert_eq!(t.matrix(), Affine::IDENTITY);
    }

    #[test]
    fn single_setter_is_reflected() {
        let mut t = Transform::new();
        t.matrix();
        t.set_position(Vec2::new(10.0, 20.0));
        assert!(t.is_dirty());
        let m = t.matrix();
        assert_eq!((m.tx, m.ty), (10.0, 20.0));
        assert_eq!((m.a, m.d), (1.0, 1.0));
    }

    #[test]
    fn repeated_reads_are_bit_identical() {
        let mut t = Transform::new();
        t.set_rotation(33.0);
        t.set_scale(Vec2::new(1.5, 0.5));
        t.set_origin(Vec2::new(4.0, 8.0));
        let first = t.matrix();
        assert!(!t.is_dirty());
        let second = t.matrix();
        assert_eq!(first.to_cols_array(), second.to_cols_array());
    }

    #[test]
    fn origin_and_global_offset_shift_translation() {
        let mut t = Transform::new();
        t.set_position(Vec2::new(100.0, 50.0));
        t.set_origin(Vec2::new(16.0, 32.0));
        t.set_global_offset(Vec2i::new(-5, 7));
        let m = t.matrix();
        assert_eq!((m.tx, m.ty), (100.0 - 16.0 - 5.0, 50.0 - 32.0 + 7.0));
        // The origin maps onto position + offset.
        let p = m.apply(Vec2::new(16.0, 32.0));
        assert!(approx(p.x, 95.0) && approx(p.y, 57.0));
    }

    #[test]
    fn scale_multiplies_axes() {
        let mut t = Transform::new();
        t.set_scale(Vec2::new(2.0, 3.0));
        let p = t.matrix().apply(Vec2::new(1.0, 1.0));
        assert_eq!(p, Vec2::new(2.0, 3.0));
    }

    // ── rotation normalization ────────────────────────────────────────────

    #[test]
    fn rotation_450_matches_90() {
        let mut a = Transform::new();
        a.set_rotation(450.0);
        let mut b = Transform::new();
        b.set_rotation(90.0);
        assert!(approx_affine(a.matrix(), b.matrix()));
        assert_eq!(a.rotation(), 90.0);
    }

    #[test]
    fn rotation_reads_back_raw_until_matrix_is_derived() {
        let mut t = Transform::new();
        t.set_rotation(450.0);
        assert_eq!(t.rotation(), 450.0);
        t.matrix();
        assert_eq!(t.rotation(), 90.0);
    }

    #[test]
    fn negative_rotation_is_preserved() {
        let mut t = Transform::new();
        t.set_rotation(-45.0);
        assert_eq!(t.rotation(), -45.0);
        t.set_rotation(-405.0);
        t.matrix();
        assert_eq!(t.rotation(), -45.0);
    }

    #[test]
    fn rotation_within_range_is_untouched() {
        let mut t = Transform::new();
        t.set_rotation(359.5);
        assert_eq!(t.rotation(), 359.5);
        t.matrix();
        assert_eq!(t.rotation(), 359.5);
        t.set_rotation(360.0);
        t.matrix();
        assert_eq!(t.rotation(), 0.0);
    }

    // ── rotate_point ──────────────────────────────────────────────────────

    #[test]
    fn rotate_point_quarter_turn() {
        let p = rotate_point(Vec2::new(1.0, 1.0), PI / 2.0, Vec2::new(2.0, 1.0));
        assert!(approx(p.x, 1.0) && approx(p.y, 2.0));
    }

    // ── rotate_rect ───────────────────────────────────────────────────────

    #[test]
    fn rotate_rect_zero_is_identity() {
        let r = IntRect::new(3, 4, 1, 1);
        assert_eq!(rotate_rect(Vec2i::new(3, 4), 0.0, r), Rect::from(r));
        let big = IntRect::new(-2, 5, 10, 20);
        assert_eq!(rotate_rect(Vec2i::new(7, 7), 0.0, big), Rect::from(big));
    }

    #[test]
    fn rotate_rect_half_turn_mirrors_about_pivot() {
        let r = IntRect::new(0, 0, 10, 20);
        assert_eq!(rotate_rect(Vec2i::new(0, 0), 180.0, r), Rect::new(-10.0, -20.0, 10.0, 20.0));

        let unit = IntRect::new(2, 2, 1, 1);
        assert_eq!(rotate_rect(Vec2i::new(0, 0), 180.0, unit), Rect::new(-3.0, -3.0, 1.0, 1.0));
    }

    #[test]
    fn rotate_rect_rounds_outward() {
        let r = IntRect::new(0, 0, 10, 10);
        let b = rotate_rect(Vec2i::new(0, 0), 45.0, r);
        // Diagonal is ~14.14 px; outward rounding must cover it fully.
        assert!(b.size.x >= 14.0 && b.size.y >= 14.0);
        assert_eq!(b.origin.x, b.origin.x.floor());
        assert_eq!(b.origin.y, b.origin.y.floor());
    }
}
