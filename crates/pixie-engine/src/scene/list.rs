use crate::sprite::Sprite;

use super::{SortKey, SpriteId, ZIndex};

#[derive(Debug)]
pub(crate) struct Entry {
    pub id: SpriteId,
    pub key: SortKey,
    pub sprite: Sprite,
}

/// Sprites of one scene with a lazily sorted paint order.
///
/// - `push()` is O(1)
/// - the index buffer is rebuilt only after an insert, removal or z change
#[derive(Debug, Default)]
pub(crate) struct SpriteList {
    entries: Vec<Entry>,
    next_order: u32,

    sorted_indices: Vec<usize>,
    sorted_dirty: bool,
}

impl SpriteList {
    pub fn push(&mut self, id: SpriteId, z: ZIndex, sprite: Sprite) {
        let order = self.next_order;
        self.next_order = self.next_order.wrapping_add(1);
        self.entries.push(Entry { id, key: SortKey::new(z, order), sprite });
        self.sorted_dirty = true;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    fn position(&self, id: SpriteId) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    pub fn get(&self, id: SpriteId) -> Option<&Entry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn get_mut(&mut self, id: SpriteId) -> Option<&mut Entry> {
        self.entries.iter_mut().find(|e| e.id == id)
    }

    pub fn remove(&mut self, id: SpriteId) -> Option<Sprite> {
        let index = self.position(id)?;
        self.sorted_dirty = true;
        Some(self.entries.remove(index).sprite)
    }

    /// Moves `id` to layer `z`; it goes on top of that layer.
    pub fn set_z(&mut self, id: SpriteId, z: ZIndex) -> bool {
        let order = self.next_order;
        let Some(entry) = self.get_mut(id) else { return false };
        if entry.key.z == z {
            return true;
        }
        entry.key = SortKey::new(z, order);
        self.next_order = self.next_order.wrapping_add(1);
        self.sorted_dirty = true;
        true
    }

    /// Drops disposed sprites; returns how many went.
    pub fn purge_disposed(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| !e.sprite.is_disposed());
        let removed = before - self.entries.len();
        if removed > 0 {
            self.sorted_dirty = true;
        }
        removed
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entry> {
        self.entries.iter_mut()
    }

    /// Indices into the entries in paint order (back to front).
    pub fn indices_in_paint_order(&mut self) -> &[usize] {
        if self.sorted_dirty {
            self.rebuild_sorted_indices();
        }
        &self.sorted_indices
    }

    /// Visits entries back to front without copying the index buffer.
    pub fn for_each_in_paint_order(&mut self, mut f: impl FnMut(&mut Entry)) {
        if self.sorted_dirty {
            self.rebuild_sorted_indices();
        }
        for &i in &self.sorted_indices {
            f(&mut self.entries[i]);
        }
    }

    fn rebuild_sorted_indices(&mut self) {
        self.sorted_indices.clear();
        self.sorted_indices.extend(0..self.entries.len());
        let entries = &self.entries;
        self.sorted_indices.sort_by_key(|&i| entries[i].key);
        self.sorted_dirty = false;
    }
}
