use crate::logging::{init_logging, LoggingConfig};
use crate::render::caps;

/// Engine-wide settings applied once at startup.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Overrides the texture size limit reported by the device.
    ///
    /// Images larger than this on either axis load as mega surfaces.
    pub max_texture_size: Option<u32>,

    /// Scale of the high-resolution sibling of a hires bitmap.
    pub hires_scale: u32,

    pub logging: LoggingConfig,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_texture_size: None,
            hires_scale: caps::DEFAULT_HIRES_SCALE,
            logging: LoggingConfig::default(),
        }
    }
}

impl RenderConfig {
    /// Installs the logger and publishes capabilities read by bitmap constructors.
    pub fn install(&self) {
        init_logging(self.logging.clone());
        if let Some(size) = self.max_texture_size {
            caps::set_max_texture_size(size);
        }
        caps::set_hires_scale(self.hires_scale);
        log::info!(
            "render config installed: max texture {}, hires x{}",
            caps::max_texture_size(),
            caps::hires_scale()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_install_keeps_device_limit() {
        let before = caps::max_texture_size();
        RenderConfig {
            logging: LoggingConfig::for_tests(),
            ..RenderConfig::default()
        }
        .install();
        assert_eq!(caps::max_texture_size(), before);
        assert_eq!(caps::hires_scale(), caps::DEFAULT_HIRES_SCALE);
    }
}
