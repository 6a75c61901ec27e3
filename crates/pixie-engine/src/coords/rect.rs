use super::{Vec2, Vec2i};

/// Axis-aligned rectangle in logical pixels (top-left origin).
///
/// Width may be negative: a horizontally flipped texture rectangle keeps its
/// left edge at `origin.x + size.x` and spans back to `origin.x`.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rect {
    pub origin: Vec2,
    pub size: Vec2,
}

impl Rect {
    #[inline]
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            origin: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    #[inline]
    pub fn min(self) -> Vec2 {
        self.origin
    }

    #[inline]
    pub fn max(self) -> Vec2 {
        self.origin + self.size
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.size.x <= 0.0 || self.size.y <= 0.0
    }

    /// Mirrors the rectangle horizontally in place (texture-space flip).
    #[inline]
    pub fn h_flipped(self) -> Self {
        Rect::new(
            self.origin.x + self.size.x,
            self.origin.y,
            -self.size.x,
            self.size.y,
        )
    }

    /// Normalizes the rectangle so width/height are non-negative.
    #[inline]
    pub fn normalized(self) -> Self {
        let mut r = self;
        if r.size.x < 0.0 {
            r.origin.x += r.size.x;
            r.size.x = -r.size.x;
        }
        if r.size.y < 0.0 {
            r.origin.y += r.size.y;
            r.size.y = -r.size.y;
        }
        r
    }
}

impl From<IntRect> for Rect {
    #[inline]
    fn from(r: IntRect) -> Self {
        Rect::new(r.x as f32, r.y as f32, r.w as f32, r.h as f32)
    }
}

/// Integer rectangle: source rectangles, pixel regions, scene bounds.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct IntRect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl IntRect {
    #[inline]
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    #[inline]
    pub const fn from_size(w: i32, h: i32) -> Self {
        Self { x: 0, y: 0, w, h }
    }

    #[inline]
    pub const fn pos(self) -> Vec2i {
        Vec2i::new(self.x, self.y)
    }

    #[inline]
    pub const fn size(self) -> Vec2i {
        Vec2i::new(self.w, self.h)
    }

    #[inline]
    pub fn set_pos(&mut self, pos: Vec2i) {
        self.x = pos.x;
        self.y = pos.y;
    }

    #[inline]
    pub fn set_size(&mut self, size: Vec2i) {
        self.w = size.x;
        self.h = size.y;
    }

    #[inline]
    pub const fn right(self) -> i32 {
        self.x + self.w
    }

    #[inline]
    pub const fn bottom(self) -> i32 {
        self.y + self.h
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.w <= 0 || self.h <= 0
    }

    #[inline]
    pub const fn area(self) -> i64 {
        if self.is_empty() { 0 } else { self.w as i64 * self.h as i64 }
    }

    /// Overlap of two rectangles; `None` when they merely touch or either is empty.
    pub fn intersection(self, other: IntRect) -> Option<IntRect> {
        if self.is_empty() || other.is_empty() {
            return None;
        }
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        if x1 <= x0 || y1 <= y0 {
            None
        } else {
            Some(IntRect::new(x0, y0, x1 - x0, y1 - y0))
        }
    }

    #[inline]
    pub fn intersects(self, other: IntRect) -> bool {
        self.intersection(other).is_some()
    }

    /// Smallest rectangle containing both. Empty inputs are ignored.
    pub fn union(self, other: IntRect) -> IntRect {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        let x0 = self.x.min(other.x);
        let y0 = self.y.min(other.y);
        let x1 = self.right().max(other.right());
        let y1 = self.bottom().max(other.bottom());
        IntRect::new(x0, y0, x1 - x0, y1 - y0)
    }

    /// Half-open containment: [min, max).
    #[inline]
    pub const fn contains(self, x: i32, y: i32) -> bool {
        x >= self.x && y >= self.y && x < self.right() && y < self.bottom()
    }

    /// Multiplies position and size by an integer factor.
    #[inline]
    pub const fn scaled(self, factor: i32) -> IntRect {
        IntRect::new(self.x * factor, self.y * factor, self.w * factor, self.h * factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(x: i32, y: i32, w: i32, h: i32) -> IntRect {
        IntRect::new(x, y, w, h)
    }

    // ── Rect ──────────────────────────────────────────────────────────────

    #[test]
    fn h_flipped_moves_origin_to_right_edge() {
        let f = Rect::new(2.0, 3.0, 10.0, 5.0).h_flipped();
        assert_eq!(f, Rect::new(12.0, 3.0, -10.0, 5.0));
        assert_eq!(f.normalized(), Rect::new(2.0, 3.0, 10.0, 5.0));
    }

    #[test]
    fn from_int_rect_keeps_components() {
        assert_eq!(Rect::from(r(1, 2, 3, 4)), Rect::new(1.0, 2.0, 3.0, 4.0));
    }

    // ── intersection ──────────────────────────────────────────────────────

    #[test]
    fn intersection_overlapping() {
        assert_eq!(r(0, 0, 10, 10).intersection(r(5, 5, 10, 10)), Some(r(5, 5, 5, 5)));
    }

    #[test]
    fn touching_edges_do_not_intersect() {
        assert!(!r(0, 0, 10, 10).intersects(r(10, 0, 10, 10)));
    }

    #[test]
    fn empty_rect_never_intersects() {
        assert!(!r(0, 0, 0, 10).intersects(r(-5, -5, 20, 20)));
    }

    #[test]
    fn negative_offsets_still_intersect() {
        assert!(r(-10, -10, 11, 11).intersects(r(0, 0, 100, 100)));
        assert!(!r(-10, -10, 10, 10).intersects(r(0, 0, 100, 100)));
    }

    // ── union / contains ──────────────────────────────────────────────────

    #[test]
    fn union_covers_both() {
        assert_eq!(r(0, 0, 2, 2).union(r(5, 5, 1, 1)), r(0, 0, 6, 6));
        assert_eq!(IntRect::default().union(r(3, 3, 1, 1)), r(3, 3, 1, 1));
    }

    #[test]
    fn contains_is_half_open() {
        let rect = r(0, 0, 4, 4);
        assert!(rect.contains(0, 0));
        assert!(rect.contains(3, 3));
        assert!(!rect.contains(4, 0));
    }
}
