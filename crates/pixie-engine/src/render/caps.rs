//! Process-wide renderer capabilities.
//!
//! Published once by [`crate::config::RenderConfig::install`] or by
//! [`crate::device::Gpu::new_headless`]; read by bitmap constructors.

use std::sync::atomic::{AtomicU32, Ordering};

/// Conservative fallback used until a device reports its own limit.
pub const DEFAULT_MAX_TEXTURE_SIZE: u32 = 8192;

/// Scale of the high-resolution sibling created by `Bitmap::with_size(.., true)`.
pub const DEFAULT_HIRES_SCALE: u32 = 2;

static MAX_TEXTURE_SIZE: AtomicU32 = AtomicU32::new(DEFAULT_MAX_TEXTURE_SIZE);
static HIRES_SCALE: AtomicU32 = AtomicU32::new(DEFAULT_HIRES_SCALE);

#[inline]
pub fn max_texture_size() -> u32 {
    MAX_TEXTURE_SIZE.load(Ordering::Relaxed)
}

/// Zero is ignored.
pub fn set_max_texture_size(size: u32) {
    if size == 0 {
        return;
    }
    MAX_TEXTURE_SIZE.store(size, Ordering::Relaxed);
    log::debug!("max texture size set to {size}");
}

#[inline]
pub fn hires_scale() -> u32 {
    HIRES_SCALE.load(Ordering::Relaxed)
}

/// Values below 2 are ignored; a 1x sibling would duplicate the base image.
pub fn set_hires_scale(scale: u32) {
    if scale < 2 {
        return;
    }
    HIRES_SCALE.store(scale, Ordering::Relaxed);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degenerate_values_are_ignored() {
        let before = max_texture_size();
        set_max_texture_size(0);
        assert_eq!(max_texture_size(), before);
        assert!(max_texture_size() > 0);

        let scale = hires_scale();
        set_hires_scale(1);
        assert_eq!(hires_scale(), scale);
    }
}
