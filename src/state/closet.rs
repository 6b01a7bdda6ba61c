//! Closet screen state: uploaded images and the garment box editor.
//!
//! The box collection is locally authoritative. Edits mark items dirty and
//! a single save action flushes creates/updates/deletes to the item store,
//! so interactive latency never waits on the network.

use std::collections::HashSet;
use std::fmt;

use crate::api::model::{ImageRecord, ItemRecord};
use crate::editor::{BoxCollection, Commit};
use crate::geometry::Size;
use crate::state::LoadedPhoto;

/// What a pointer-down on empty canvas means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditorMode {
    /// Click selects, drag moves/resizes.
    #[default]
    Select,
    /// Drag draws a new garment box.
    AddBox,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GarmentKind {
    Shirt,
    Pants,
    Outerwear,
    Dresses,
    Footwear,
}

impl GarmentKind {
    pub const ALL: [GarmentKind; 5] = [
        GarmentKind::Shirt,
        GarmentKind::Pants,
        GarmentKind::Outerwear,
        GarmentKind::Dresses,
        GarmentKind::Footwear,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            GarmentKind::Shirt => "shirt",
            GarmentKind::Pants => "pants",
            GarmentKind::Outerwear => "outerwear",
            GarmentKind::Dresses => "dresses",
            GarmentKind::Footwear => "footwear",
        }
    }

    /// Wire strings are free-form; anything unrecognized lands on shirt.
    pub fn parse(value: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .unwrap_or(GarmentKind::Shirt)
    }
}

impl fmt::Display for GarmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-box garment fields (the entity payload).
#[derive(Debug, Clone)]
pub struct Garment {
    /// Server id, `None` until the item has been flushed.
    pub server_id: Option<String>,
    pub kind: GarmentKind,
    pub caption: String,
    pub source: Option<String>,
}

impl Garment {
    fn drawn() -> Self {
        Self {
            server_id: None,
            kind: GarmentKind::Shirt,
            caption: String::new(),
            source: Some("manual".to_string()),
        }
    }
}

/// The pixel-coordinate fields editable by hand next to each item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxField {
    X,
    Y,
    W,
    H,
}

/// One unit of deferred persistence work.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingChange {
    /// `id` is the local entity id, kept so a failed flush can re-mark the
    /// entry dirty for a retry.
    Save { id: u64, record: ItemRecord },
    Delete(String),
}

#[derive(Debug, Default)]
pub struct ClosetState {
    pub images: Vec<ImageRecord>,
    pub loading: bool,
    pub uploading: bool,
    pub selected: Option<SelectedImage>,
    pub mode: EditorMode,
    /// Bumped on every image switch; drag sessions started under an older
    /// epoch are invalid and discard instead of committing.
    pub epoch: u64,
}

#[derive(Debug)]
pub struct SelectedImage {
    pub record: ImageRecord,
    /// Pixels, once fetched and decoded.
    pub photo: Option<LoadedPhoto>,
    pub items: BoxCollection<Garment>,
    dirty: HashSet<u64>,
    deleted: Vec<String>,
}

impl ClosetState {
    pub fn select_image(&mut self, record: ImageRecord) {
        self.selected = Some(SelectedImage {
            record,
            photo: None,
            items: BoxCollection::new(),
            dirty: HashSet::new(),
            deleted: Vec::new(),
        });
        self.mode = EditorMode::Select;
        self.epoch += 1;
    }

    pub fn close_image(&mut self) {
        self.selected = None;
        self.mode = EditorMode::Select;
        self.epoch += 1;
    }

    /// Natural dimensions of the edited image: decoded pixels win, the
    /// server record is the fallback, 1x1 while nothing is loaded.
    pub fn natural(&self) -> Size {
        match &self.selected {
            Some(sel) => match &sel.photo {
                Some(photo) => photo.natural,
                None => sel.record.natural_size(),
            },
            None => Size::new(1.0, 1.0),
        }
    }

    /// Replace the item collection from server records (on selection load or
    /// after a flush). Entity ids restart with the new collection, so the
    /// epoch is bumped: a drag session started against the old collection
    /// must not re-bind to whatever entity now carries its target id.
    pub fn set_items(&mut self, records: Vec<ItemRecord>) {
        let Some(sel) = &mut self.selected else {
            return;
        };
        sel.items = BoxCollection::new();
        sel.dirty.clear();
        sel.deleted.clear();
        for record in records {
            sel.items.add(
                record.rect().clamped(),
                Garment {
                    server_id: record.id.clone(),
                    kind: GarmentKind::parse(&record.kind),
                    caption: record.caption,
                    source: record.source,
                },
            );
        }
        self.epoch += 1;
    }

    /// Apply a finished drag session. Updates to a box deleted mid-drag
    /// vanish inside the collection's no-op; a draw gesture always drops
    /// the editor back into select mode, whether or not it was big enough.
    pub fn apply_commit(&mut self, commit: Commit) {
        if let Some(sel) = &mut self.selected {
            match commit {
                Commit::Update { id, rect } => {
                    if sel.items.set_rect(id, rect) {
                        sel.dirty.insert(id);
                    }
                }
                Commit::Create { rect } => {
                    let id = sel.items.add(rect, Garment::drawn());
                    sel.items.select(Some(id));
                    sel.dirty.insert(id);
                }
                Commit::Discard => {}
            }
        }
        if self.mode == EditorMode::AddBox {
            self.mode = EditorMode::Select;
        }
    }

    pub fn select_box(&mut self, id: Option<u64>) {
        if let Some(sel) = &mut self.selected {
            sel.items.select(id);
        }
    }

    pub fn set_kind(&mut self, id: u64, kind: GarmentKind) {
        if let Some(sel) = &mut self.selected {
            if sel.items.update(id, |e| e.data.kind = kind) {
                sel.dirty.insert(id);
            }
        }
    }

    pub fn set_caption(&mut self, id: u64, caption: String) {
        if let Some(sel) = &mut self.selected {
            if sel.items.update(id, |e| e.data.caption = caption) {
                sel.dirty.insert(id);
            }
        }
    }

    /// Manual coordinate entry, in natural pixels. Non-numeric input is
    /// rejected before any mutation; the prior geometry stays.
    pub fn set_box_field(&mut self, id: u64, field: BoxField, value: &str) {
        let Ok(value) = value.trim().parse::<f32>() else {
            return;
        };
        if !value.is_finite() {
            return;
        }
        let natural = self.natural();
        let Some(sel) = &mut self.selected else {
            return;
        };
        let Some(entity) = sel.items.get(id) else {
            return;
        };

        let mut px = entity.rect.to_pixels(natural);
        let value = value.round();
        match field {
            BoxField::X => px.x = value,
            BoxField::Y => px.y = value,
            BoxField::W => px.w = value,
            BoxField::H => px.h = value,
        }
        px.w = px.w.max(1.0).min(natural.width);
        px.h = px.h.max(1.0).min(natural.height);
        let px = px.clamp_position(natural);

        if sel.items.set_rect(id, px.to_relative(natural)) {
            sel.dirty.insert(id);
        }
    }

    pub fn delete_item(&mut self, id: u64) {
        if let Some(sel) = &mut self.selected {
            if let Some(entity) = sel.items.get(id) {
                if let Some(server_id) = entity.data.server_id.clone() {
                    sel.deleted.push(server_id);
                }
            }
            sel.items.remove(id);
            sel.dirty.remove(&id);
        }
    }

    pub fn has_pending(&self) -> bool {
        self.selected
            .as_ref()
            .is_some_and(|sel| !sel.dirty.is_empty() || !sel.deleted.is_empty())
    }

    /// Drain the pending creates/updates/deletes for one flush to the item
    /// store. Local state stays as-is; persistence is the caller's problem.
    pub fn take_pending(&mut self) -> Vec<PendingChange> {
        let Some(sel) = &mut self.selected else {
            return Vec::new();
        };
        let mut changes: Vec<PendingChange> =
            sel.deleted.drain(..).map(PendingChange::Delete).collect();

        let mut dirty: Vec<u64> = sel.dirty.drain().collect();
        dirty.sort_unstable();
        for id in dirty {
            if let Some(entity) = sel.items.get(id) {
                changes.push(PendingChange::Save {
                    id,
                    record: ItemRecord {
                        id: entity.data.server_id.clone(),
                        image_id: Some(sel.record.id.clone()),
                        kind: entity.data.kind.as_str().to_string(),
                        caption: entity.data.caption.clone(),
                        source: entity.data.source.clone(),
                        box_x: entity.rect.x,
                        box_y: entity.rect.y,
                        box_w: entity.rect.w,
                        box_h: entity.rect.h,
                        created_at: None,
                    },
                });
            }
        }
        changes
    }

    /// Put changes from a failed flush back on the queue so the next save
    /// retries them. Save records are rebuilt from current state at the next
    /// drain, which also absorbs edits made while the flush was in flight.
    pub fn requeue_pending(&mut self, changes: Vec<PendingChange>) {
        let Some(sel) = &mut self.selected else {
            return;
        };
        for change in changes {
            match change {
                PendingChange::Delete(id) => {
                    if !sel.deleted.contains(&id) {
                        sel.deleted.push(id);
                    }
                }
                PendingChange::Save { id, .. } => {
                    if sel.items.get(id).is_some() {
                        sel.dirty.insert(id);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::RelBox;

    fn image_record() -> ImageRecord {
        ImageRecord {
            id: "im_1".into(),
            url: "http://localhost/1.jpg".into(),
            name: None,
            width: 1000.0,
            height: 800.0,
            size: None,
        }
    }

    fn item_record(id: &str, rect: RelBox) -> ItemRecord {
        ItemRecord {
            id: Some(id.into()),
            image_id: Some("im_1".into()),
            kind: "shirt".into(),
            caption: String::new(),
            source: Some("detector".into()),
            box_x: rect.x,
            box_y: rect.y,
            box_w: rect.w,
            box_h: rect.h,
            created_at: None,
        }
    }

    fn state_with_one_item() -> (ClosetState, u64) {
        let mut state = ClosetState::default();
        state.select_image(image_record());
        state.set_items(vec![item_record("it_1", RelBox::new(0.1, 0.2, 0.3, 0.25))]);
        let id = state
            .selected
            .as_ref()
            .unwrap()
            .items
            .ids()
            .next()
            .unwrap();
        (state, id)
    }

    #[test]
    fn test_commit_after_delete_writes_nothing() {
        let (mut state, id) = state_with_one_item();
        state.delete_item(id);
        assert!(state.has_pending()); // the delete itself

        // The drag session's commit arrives after the deletion.
        state.apply_commit(Commit::Update {
            id,
            rect: RelBox::new(0.0, 0.0, 0.5, 0.5),
        });
        let pending = state.take_pending();
        assert_eq!(pending, vec![PendingChange::Delete("it_1".into())]);
        assert!(state.selected.as_ref().unwrap().items.is_empty());
    }

    #[test]
    fn test_drag_commit_marks_item_dirty() {
        let (mut state, id) = state_with_one_item();
        state.apply_commit(Commit::Update {
            id,
            rect: RelBox::new(0.15, 0.2, 0.3, 0.25),
        });
        let pending = state.take_pending();
        match &pending[..] {
            [PendingChange::Save { record, .. }] => {
                assert_eq!(record.id.as_deref(), Some("it_1"));
                assert!((record.box_x - 0.15).abs() < 1e-6);
            }
            other => panic!("unexpected pending set: {other:?}"),
        }
        // Drained: a second flush has nothing to do.
        assert!(!state.has_pending());
    }

    #[test]
    fn test_draw_commit_creates_selected_item() {
        let (mut state, _) = state_with_one_item();
        state.mode = EditorMode::AddBox;
        state.apply_commit(Commit::Create {
            rect: RelBox::new(0.5, 0.5, 0.2, 0.2),
        });

        let sel = state.selected.as_ref().unwrap();
        assert_eq!(sel.items.len(), 2);
        assert!(sel.items.selected().is_some());
        assert_eq!(state.mode, EditorMode::Select);

        // The new item flushes as a create (no server id yet).
        let pending = state.take_pending();
        assert!(pending
            .iter()
            .any(|c| matches!(c, PendingChange::Save { record, .. } if record.id.is_none())));
    }

    #[test]
    fn test_discarded_draw_leaves_collection_untouched() {
        let (mut state, _) = state_with_one_item();
        state.mode = EditorMode::AddBox;
        state.apply_commit(Commit::Discard);
        assert_eq!(state.selected.as_ref().unwrap().items.len(), 1);
        assert_eq!(state.mode, EditorMode::Select);
    }

    #[test]
    fn test_manual_entry_rejects_garbage_and_clamps() {
        let (mut state, id) = state_with_one_item();
        let before = state.selected.as_ref().unwrap().items.get(id).unwrap().rect;

        state.set_box_field(id, BoxField::X, "not a number");
        state.set_box_field(id, BoxField::W, "NaN");
        let rect = state.selected.as_ref().unwrap().items.get(id).unwrap().rect;
        assert_eq!(rect, before);
        assert!(!state.has_pending());

        // 950 + width 300 pushes past the right edge; x is pulled back.
        state.set_box_field(id, BoxField::X, "950");
        let rect = state.selected.as_ref().unwrap().items.get(id).unwrap().rect;
        assert!((rect.x - 0.7).abs() < 1e-3, "{rect:?}");
        assert!(state.has_pending());
    }

    #[test]
    fn test_failed_flush_can_be_retried() {
        let mut state = ClosetState::default();
        state.select_image(image_record());
        state.set_items(vec![
            item_record("it_1", RelBox::new(0.1, 0.2, 0.3, 0.25)),
            item_record("it_2", RelBox::new(0.5, 0.5, 0.2, 0.2)),
        ]);
        let ids: Vec<u64> = state.selected.as_ref().unwrap().items.ids().collect();
        state.apply_commit(Commit::Update {
            id: ids[0],
            rect: RelBox::new(0.15, 0.2, 0.3, 0.25),
        });
        state.delete_item(ids[1]);

        let pending = state.take_pending();
        assert_eq!(pending.len(), 2);
        assert!(!state.has_pending());

        // The flush failed; everything goes back on the queue and a second
        // save produces the same set.
        state.requeue_pending(pending.clone());
        assert!(state.has_pending());
        assert_eq!(state.take_pending(), pending);
    }

    #[test]
    fn test_requeue_drops_entries_deleted_meanwhile() {
        let (mut state, id) = state_with_one_item();
        state.apply_commit(Commit::Update {
            id,
            rect: RelBox::new(0.15, 0.2, 0.3, 0.25),
        });
        let pending = state.take_pending();

        // The item vanished while the flush was in flight; requeueing its
        // save must not resurrect it.
        state.selected.as_mut().unwrap().items.remove(id);
        state.requeue_pending(pending);
        assert!(state
            .take_pending()
            .iter()
            .all(|c| !matches!(c, PendingChange::Save { .. })));
    }

    #[test]
    fn test_items_refresh_invalidates_drag_sessions() {
        let (mut state, _) = state_with_one_item();
        let before = state.epoch;
        // A refresh rebuilds the collection and restarts entity ids; any
        // session started against the old collection must go stale.
        state.set_items(vec![item_record("it_9", RelBox::new(0.4, 0.4, 0.2, 0.2))]);
        assert!(state.epoch > before);
    }

    #[test]
    fn test_image_switch_bumps_epoch() {
        let mut state = ClosetState::default();
        let before = state.epoch;
        state.select_image(image_record());
        assert!(state.epoch > before);
        let mid = state.epoch;
        state.close_image();
        assert!(state.epoch > mid);
    }
}
