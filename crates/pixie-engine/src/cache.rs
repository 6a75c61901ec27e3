//! Lazily recomputed values.
//!
//! Setters only flip the dirty bit; the owner recomputes on the next read.
//! Many property setters may fire per frame from script code, so keeping
//! them O(1) matters more than keeping the cached value fresh.

/// A cached value tagged with a dirty flag.
#[derive(Debug, Clone, Default)]
pub struct Cached<T> {
    value: T,
    dirty: bool,
}

impl<T> Cached<T> {
    /// Wraps a value that must be recomputed before first use.
    #[inline]
    pub const fn dirty(value: T) -> Self {
        Self { value, dirty: true }
    }

    /// Wraps a value that is already up to date.
    #[inline]
    pub const fn clean(value: T) -> Self {
        Self { value, dirty: false }
    }

    #[inline]
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// The last computed value, possibly stale.
    #[inline]
    pub fn peek(&self) -> &T {
        &self.value
    }

    /// Stores a freshly computed value and clears the dirty bit.
    #[inline]
    pub fn set(&mut self, value: T) {
        self.value = value;
        self.dirty = false;
    }

    /// Runs `refresh` exactly once per invalidation, then returns the value.
    #[inline]
    pub fn get_or_refresh(&mut self, refresh: impl FnOnce(&mut T)) -> &T {
        if self.dirty {
            refresh(&mut self.value);
            self.dirty = false;
        }
        &self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_runs_once_per_invalidation() {
        let mut c = Cached::dirty(0u32);
        let mut runs = 0;
        c.get_or_refresh(|v| {
            *v += 1;
            runs += 1;
        });
        c.get_or_refresh(|v| {
            *v += 1;
            runs += 1;
        });
        assert_eq!(runs, 1);
        assert_eq!(*c.peek(), 1);

        c.invalidate();
        assert!(c.is_dirty());
        assert_eq!(*c.get_or_refresh(|v| *v = 7), 7);
        assert!(!c.is_dirty());
    }

    #[test]
    fn set_marks_clean() {
        let mut c = Cached::dirty("old");
        c.set("new");
        assert!(!c.is_dirty());
        assert_eq!(*c.peek(), "new");
    }
}
