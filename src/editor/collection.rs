//! The box entity collection: the single source of truth for the boxes on
//! one image.
//!
//! Generic over the per-entity payload so the same manager backs garment
//! regions (type/caption fields) and try-on overlays (source image). Entries
//! keep insertion order, which is also the draw order for overlays.

use crate::geometry::RelBox;

/// One box over an image, with its domain payload.
#[derive(Debug, Clone)]
pub struct BoxEntity<T> {
    pub id: u64,
    /// Canonical geometry, relative form. Resolution independent, so the
    /// same entity stays valid on a thumbnail and on the full photo.
    pub rect: RelBox,
    pub data: T,
}

/// Ordered collection with single selection.
///
/// Ids are never reused within the collection's lifetime, so a stale id from
/// a finished drag session can be told apart from a live one: mutations that
/// reference an unknown id are benign no-ops.
#[derive(Debug, Clone)]
pub struct BoxCollection<T> {
    next_id: u64,
    entries: Vec<BoxEntity<T>>,
    selected: Option<u64>,
}

impl<T> Default for BoxCollection<T> {
    fn default() -> Self {
        Self {
            next_id: 1,
            entries: Vec::new(),
            selected: None,
        }
    }
}

impl<T> BoxCollection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new entity and return its id. Does not change the selection;
    /// callers that want select-on-create do it explicitly.
    pub fn add(&mut self, rect: RelBox, data: T) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push(BoxEntity { id, rect, data });
        id
    }

    /// Patch an entity in place. Unknown ids are ignored: a drag commit may
    /// race with a deletion, and losing that race must not be an error.
    pub fn update(&mut self, id: u64, patch: impl FnOnce(&mut BoxEntity<T>)) -> bool {
        match self.entries.iter_mut().find(|e| e.id == id) {
            Some(entity) => {
                patch(entity);
                true
            }
            None => false,
        }
    }

    /// Replace an entity's geometry, clamped into the unit square.
    pub fn set_rect(&mut self, id: u64, rect: RelBox) -> bool {
        self.update(id, |e| e.rect = rect.clamped())
    }

    pub fn remove(&mut self, id: u64) {
        self.entries.retain(|e| e.id != id);
        if self.selected == Some(id) {
            self.selected = None;
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.selected = None;
    }

    /// Single-selection model: selecting a box implicitly deselects the
    /// previous one. Selecting an unknown id clears the selection.
    pub fn select(&mut self, id: Option<u64>) {
        self.selected = id.filter(|id| self.entries.iter().any(|e| e.id == *id));
    }

    pub fn selected_id(&self) -> Option<u64> {
        self.selected
    }

    pub fn selected(&self) -> Option<&BoxEntity<T>> {
        self.selected.and_then(|id| self.get(id))
    }

    pub fn get(&self, id: u64) -> Option<&BoxEntity<T>> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &BoxEntity<T>> {
        self.entries.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.entries.iter().map(|e| e.id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
