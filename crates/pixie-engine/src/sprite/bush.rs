use core::f32::consts::PI;

use crate::coords::{IntRect, Vec2, rotate_point};

/// Cutoff line of the bush effect in normalized texture space.
///
/// With `bush_y` the line is `y = slope * x + intercept`, otherwise
/// `x = slope * y + intercept`. `bush_under` says which side is occluded.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BushGeometry {
    pub slope: f32,
    pub intercept: f32,
    pub bush_y: bool,
    pub bush_under: bool,
}

impl BushGeometry {
    /// Disabled effect: the cutoff sits on the bottom edge.
    pub const NEUTRAL: BushGeometry = BushGeometry {
        slope: 0.0,
        intercept: 1.0,
        bush_y: true,
        bush_under: true,
    };
}

impl Default for BushGeometry {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

/// Positive remainder of `value / range`.
#[inline]
pub(crate) fn fwrap(value: f32, range: f32) -> f32 {
    let r = value % range;
    if r < 0.0 { r + range } else { r }
}

/// Input of [`compute`].
#[derive(Debug, Copy, Clone)]
pub struct BushInput {
    pub depth: i32,
    /// Degrees, as stored on the transform.
    pub rotation: f32,
    pub mirrored: bool,
    pub scale: Vec2,
    pub bitmap_size: Vec2,
    pub src_rect: IntRect,
}

/// Derives the cutoff line `depth` screen pixels above the lowest corner of
/// the rotated, scaled source rectangle.
pub fn compute(input: &BushInput) -> BushGeometry {
    let BushInput { depth, rotation, mirrored, scale, bitmap_size, src_rect } = *input;
    if depth <= 0 {
        return BushGeometry::NEUTRAL;
    }

    let scaled_w = bitmap_size.x * scale.x;
    let scaled_h = bitmap_size.y * scale.y;
    if scaled_w == 0.0 || scaled_h == 0.0 {
        return BushGeometry::NEUTRAL;
    }

    let angle = fwrap(if mirrored { -rotation } else { rotation }, 360.0);

    // Fold into 45 degree segments so the slope never approaches infinity.
    let mut slope = ((fwrap(angle - 45.0, 90.0) - 45.0).abs() * PI / 180.0).tan();
    if fwrap(angle, 180.0) > 90.0 {
        slope = -slope;
    }

    // Near 90/270 degrees the line is expressed along x instead of y.
    let bush_y = fwrap(angle + 45.0, 180.0) < 90.0;
    // Texture space is normalized, so the slope follows the scaled aspect.
    slope *= if bush_y { scaled_w / scaled_h } else { scaled_h / scaled_w };
    let bush_under = angle < 45.0 || angle >= 225.0;

    let x = src_rect.x as f32 * scale.x;
    let y = src_rect.y as f32 * scale.y;
    let w = src_rect.w as f32 * scale.x;
    let h = src_rect.h as f32 * scale.y;

    // +Y points down, so screen rotation uses the negated angle.
    let rotation = -angle * PI / 180.0;
    let p1 = Vec2::new(x, y);
    let p2 = rotate_point(p1, rotation, Vec2::new(x + w, y));
    let p3 = rotate_point(p1, rotation, Vec2::new(x, y + h));
    let p4 = rotate_point(p1, rotation, Vec2::new(x + w, y + h));
    let lowest = p1.y.max(p2.y).max(p3.y).max(p4.y);

    // In rotated space the cutoff is horizontal, so any x works.
    let point = rotate_point(p1, -rotation, Vec2::new(0.0, lowest - depth as f32));
    let px = point.x / scale.x / bitmap_size.x;
    let py = point.y / scale.y / bitmap_size.y;

    let intercept = if bush_y { py - slope * px } else { px - slope * py };
    BushGeometry { slope, intercept, bush_y, bush_under }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    fn input(depth: i32, rotation: f32) -> BushInput {
        BushInput {
            depth,
            rotation,
            mirrored: false,
            scale: Vec2::one(),
            bitmap_size: Vec2::new(64.0, 64.0),
            src_rect: IntRect::new(0, 0, 64, 64),
        }
    }

    #[test]
    fn fwrap_is_always_positive() {
        assert_eq!(fwrap(-45.0, 90.0), 45.0);
        assert_eq!(fwrap(450.0, 360.0), 90.0);
        assert_eq!(fwrap(0.0, 180.0), 0.0);
    }

    #[test]
    fn zero_depth_is_neutral() {
        assert_eq!(compute(&input(0, 37.0)), BushGeometry::NEUTRAL);
        assert_eq!(compute(&input(-3, 0.0)), BushGeometry::NEUTRAL);
    }

    #[test]
    fn upright_cutoff_is_depth_above_bottom() {
        let g = compute(&input(10, 0.0));
        assert!(g.bush_y);
        assert!(g.bush_under);
        assert!(approx(g.slope, 0.0));
        assert!(approx(g.intercept, 54.0 / 64.0));
    }

    #[test]
    fn quarter_turn_switches_to_x_axis() {
        let g = compute(&input(10, 90.0));
        assert!(!g.bush_y);
        assert!(!g.bush_under);
        assert!(approx(g.slope, 0.0));
    }

    #[test]
    fn half_turn_keeps_y_axis_with_other_side() {
        let g = compute(&input(10, 180.0));
        assert!(g.bush_y);
        assert!(!g.bush_under);
    }

    #[test]
    fn mirroring_negates_the_angle() {
        let mut a = input(8, 30.0);
        a.mirrored = true;
        let b = input(8, -30.0);
        assert_eq!(compute(&a), compute(&b));
    }

    #[test]
    fn slope_sign_follows_angle_segment() {
        let g = compute(&input(10, 20.0));
        assert!(g.bush_y);
        assert!(g.slope > 0.0);
        let g = compute(&input(10, 160.0));
        assert!(g.slope < 0.0);
    }

    #[test]
    fn degenerate_scale_is_neutral() {
        let mut i = input(10, 0.0);
        i.scale = Vec2::new(0.0, 1.0);
        assert_eq!(compute(&i), BushGeometry::NEUTRAL);
    }
}
