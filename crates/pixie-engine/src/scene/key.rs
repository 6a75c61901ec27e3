/// Depth of a sprite within its scene; higher values draw on top.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ZIndex(pub i32);

impl ZIndex {
    #[inline]
    pub const fn new(z: i32) -> Self {
        Self(z)
    }
}

/// Paint-order key: `z` ascending, then creation order for equal `z`.
///
/// Field order matters; the derived `Ord` compares `z` first.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SortKey {
    pub z: ZIndex,
    pub order: u32,
}

impl SortKey {
    #[inline]
    pub const fn new(z: ZIndex, order: u32) -> Self {
        Self { z, order }
    }
}
