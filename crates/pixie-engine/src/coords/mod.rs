//! Coordinate, rectangle and transform types shared by bitmaps and sprites.
//!
//! Canonical CPU space:
//! - Logical pixels
//! - Origin top-left
//! - +X right, +Y down
//!
//! Because +Y points down, an angle that looks counter-clockwise on screen is
//! a clockwise rotation in the usual maths convention. Screen-space callers of
//! [`rotate_point`] therefore negate their angle first.

mod rect;
mod transform;
mod vec2;

pub use rect::{IntRect, Rect};
pub use transform::{rotate_point, rotate_rect, Affine, Transform};
pub use vec2::{Vec2, Vec2i};
