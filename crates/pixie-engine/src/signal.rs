//! Single-threaded change notification.
//!
//! A [`Signal`] owns its subscriber list. Subscribers are removed explicitly
//! with [`Signal::disconnect`] (sprites do this on disposal), and a publisher
//! calls [`Signal::clear`] when it is disposed so that stale subscribers are
//! never invoked afterwards.
//!
//! Slots only record that something changed (typically by setting a shared
//! flag); the receiver does the actual work on its own schedule.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Handle returned by [`Signal::connect`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

type Slot = Rc<dyn Fn()>;

#[derive(Default)]
pub struct Signal {
    slots: RefCell<Vec<(ConnectionId, Slot)>>,
    next_id: Cell<u64>,
}

impl std::fmt::Debug for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal").field("subscribers", &self.len()).finish()
    }
}

impl Signal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&self, slot: impl Fn() + 'static) -> ConnectionId {
        let id = ConnectionId(self.next_id.get());
        self.next_id.set(self.next_id.get().wrapping_add(1));
        self.slots.borrow_mut().push((id, Rc::new(slot)));
        id
    }

    /// Removes a subscriber. Returns `false` if it was not connected.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        let mut slots = self.slots.borrow_mut();
        let before = slots.len();
        slots.retain(|(sid, _)| *sid != id);
        slots.len() != before
    }

    pub fn clear(&self) {
        self.slots.borrow_mut().clear();
    }

    pub fn len(&self) -> usize {
        self.slots.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invokes every subscriber in connection order.
    ///
    /// The list is snapshotted first, so a slot may connect or disconnect
    /// without invalidating the iteration.
    pub fn emit(&self) {
        let snapshot: Vec<Slot> = self.slots.borrow().iter().map(|(_, s)| Rc::clone(s)).collect();
        for slot in snapshot {
            slot();
        }
    }
}

/// A shared value that notifies subscribers when it changes.
///
/// Scripts and sprites may hold the same `Rc<Observable<T>>`; assignments
/// from either side reach every subscriber.
#[derive(Debug, Default)]
pub struct Observable<T: Copy + PartialEq> {
    value: Cell<T>,
    changed: Signal,
}

impl<T: Copy + PartialEq> Observable<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: Cell::new(value),
            changed: Signal::new(),
        }
    }

    pub fn shared(value: T) -> Rc<Self> {
        Rc::new(Self::new(value))
    }

    #[inline]
    pub fn get(&self) -> T {
        self.value.get()
    }

    /// Stores `value` and notifies subscribers. Equal values are a no-op.
    pub fn set(&self, value: T) {
        if self.value.get() == value {
            return;
        }
        self.value.set(value);
        self.changed.emit();
    }

    /// Read-modify-write through a closure; notifies only if the value changed.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let mut v = self.value.get();
        f(&mut v);
        self.set(v);
    }

    pub fn connect(&self, slot: impl Fn() + 'static) -> ConnectionId {
        self.changed.connect(slot)
    }

    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.changed.disconnect(id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.changed.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter() -> (Rc<Cell<u32>>, impl Fn() + 'static) {
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        (hits, move || h.set(h.get() + 1))
    }

    // ── Signal ────────────────────────────────────────────────────────────

    #[test]
    fn emit_reaches_all_subscribers() {
        let s = Signal::new();
        let (a, fa) = counter();
        let (b, fb) = counter();
        s.connect(fa);
        s.connect(fb);
        s.emit();
        assert_eq!((a.get(), b.get()), (1, 1));
    }

    #[test]
    fn disconnected_slot_is_not_invoked() {
        let s = Signal::new();
        let (a, fa) = counter();
        let id = s.connect(fa);
        assert!(s.disconnect(id));
        assert!(!s.disconnect(id));
        s.emit();
        assert_eq!(a.get(), 0);
    }

    #[test]
    fn clear_drops_every_subscriber() {
        let s = Signal::new();
        let (a, fa) = counter();
        s.connect(fa);
        s.clear();
        s.emit();
        assert_eq!(a.get(), 0);
        assert!(s.is_empty());
    }

    #[test]
    fn slot_may_disconnect_itself_during_emit() {
        let s = Rc::new(Signal::new());
        let id_cell = Rc::new(Cell::new(None));
        let (s2, id2) = (Rc::clone(&s), Rc::clone(&id_cell));
        let id = s.connect(move || {
            if let Some(id) = id2.get() {
                s2.disconnect(id);
            }
        });
        id_cell.set(Some(id));
        s.emit();
        assert!(s.is_empty());
    }

    // ── Observable ────────────────────────────────────────────────────────

    #[test]
    fn equal_assignment_does_not_notify() {
        let o = Observable::new(3);
        let (hits, f) = counter();
        o.connect(f);
        o.set(3);
        assert_eq!(hits.get(), 0);
        o.set(4);
        o.update(|v| *v += 1);
        assert_eq!(hits.get(), 2);
        assert_eq!(o.get(), 5);
    }
}
