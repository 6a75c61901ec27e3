//! Error taxonomy shared by bitmaps, sprites and the scene driver.
//!
//! Every failure is surfaced synchronously at the call that caused it.
//! Precondition violations are never silently corrected.

/// Convenience result type used across the engine.
pub type PixieResult<T> = Result<T, PixieError>;

#[derive(thiserror::Error, Debug)]
pub enum PixieError {
    /// Use of a bitmap or sprite after `dispose()`.
    #[error("{what} has been disposed")]
    Disposed { what: &'static str },

    /// A precondition (non-mega, animated, not playing, ...) does not hold.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Pixel or frame index outside the valid bounds.
    #[error("{what} index {index} out of range (len {len})")]
    OutOfRange {
        what: &'static str,
        index: i64,
        len: i64,
    },

    /// Decode failure, size limit exceeded, allocation failure.
    #[error("resource error: {0}")]
    Resource(String),

    /// Image decode/encode failure.
    #[error(transparent)]
    Image(#[from] image::ImageError),

    /// Wrapped lower-level error (GPU bring-up, IO).
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PixieError {
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn resource(msg: impl Into<String>) -> Self {
        Self::Resource(msg.into())
    }

    pub fn out_of_range(what: &'static str, index: impl Into<i64>, len: impl Into<i64>) -> Self {
        Self::OutOfRange {
            what,
            index: index.into(),
            len: len.into(),
        }
    }

    /// True for decode and size-limit failures (the resource class of errors).
    pub fn is_resource(&self) -> bool {
        matches!(self, Self::Resource(_) | Self::Image(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_disposed_object() {
        let e = PixieError::Disposed { what: "bitmap" };
        assert_eq!(e.to_string(), "bitmap has been disposed");
    }

    #[test]
    fn out_of_range_reports_index_and_len() {
        let e = PixieError::out_of_range("frame", 5, 3);
        assert_eq!(e.to_string(), "frame index 5 out of range (len 3)");
    }

    #[test]
    fn image_errors_count_as_resource_errors() {
        let e = PixieError::from(image::ImageError::Unsupported(
            image::error::UnsupportedError::from_format_and_kind(
                image::error::ImageFormatHint::Unknown,
                image::error::UnsupportedErrorKind::Format(image::error::ImageFormatHint::Unknown),
            ),
        ));
        assert!(e.is_resource());
        assert!(PixieError::resource("too big").is_resource());
        assert!(!PixieError::invalid_state("mega").is_resource());
    }
}
