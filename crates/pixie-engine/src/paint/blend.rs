/// Blend equation used when compositing a sprite or pattern.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum BlendMode {
    #[default]
    Normal,
    Additive,
    Subtractive,
}

impl BlendMode {
    /// Maps a script integer code; unknown codes fall back to `Normal`.
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => Self::Additive,
            2 => Self::Subtractive,
            _ => Self::Normal,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Self::Normal => 0,
            Self::Additive => 1,
            Self::Subtractive => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_codes_are_normal() {
        assert_eq!(BlendMode::from_code(1), BlendMode::Additive);
        assert_eq!(BlendMode::from_code(2), BlendMode::Subtractive);
        assert_eq!(BlendMode::from_code(7), BlendMode::Normal);
        assert_eq!(BlendMode::from_code(-1), BlendMode::Normal);
    }
}
