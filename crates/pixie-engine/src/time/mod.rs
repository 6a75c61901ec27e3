//! Frame timing for the scene update.
//!
//! `Scene::update` takes an explicit `dt`; a `FrameClock` is the usual
//! source of it. Bitmap animations advance by wall time, sprite effects by
//! whole ticks.

mod clock;

pub use clock::{FrameClock, Tick};
