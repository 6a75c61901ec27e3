use crate::paint::Color;

/// Timed color overlay that fades out linearly.
///
/// Starting a flash without a color hides the element for the duration.
#[derive(Debug, Clone, Default)]
pub struct Flash {
    color: [f32; 4],
    alpha: f32,
    duration: u32,
    counter: u32,
    flashing: bool,
    empty: bool,
}

impl Flash {
    /// Starts a flash lasting `duration` updates; `duration < 1` is ignored.
    pub fn start(&mut self, color: Option<Color>, duration: i32) {
        if duration < 1 {
            return;
        }
        self.flashing = true;
        self.duration = duration as u32;
        self.counter = 0;
        match color {
            Some(c) => {
                self.empty = false;
                self.color = c.norm();
                self.alpha = self.color[3];
            }
            None => self.empty = true,
        }
    }

    pub fn update(&mut self) {
        if !self.flashing {
            return;
        }
        self.counter += 1;
        if self.counter > self.duration {
            self.flashing = false;
            self.empty = false;
            return;
        }
        if self.empty {
            return;
        }
        let progress = self.counter as f32 / self.duration as f32;
        self.color[3] = self.alpha * (1.0 - progress);
    }

    #[inline]
    pub fn is_flashing(&self) -> bool {
        self.flashing
    }

    /// True while a colorless flash hides the element.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.flashing && self.empty
    }

    /// Current normalized color with the faded alpha.
    #[inline]
    pub fn color(&self) -> [f32; 4] {
        self.color
    }
}
