//! Try-on screen state: the user photo and the garment overlays placed on
//! top of it.

use iced::widget::image::Handle;

use crate::editor::{BoxCollection, Commit};
use crate::geometry::{RelBox, Size};
use crate::state::LoadedPhoto;

/// Where a freshly added overlay lands: centered-ish, moderate size.
pub const DEFAULT_OVERLAY_RECT: RelBox = RelBox {
    x: 0.35,
    y: 0.2,
    w: 0.3,
    h: 0.3,
};

/// Overlays can't be resized below this fraction of the photo per axis.
pub const MIN_OVERLAY_FRACTION: f32 = 0.02;

/// The garment cutout behind one overlay box. Bytes and handle arrive after
/// the fetch resolves; a failed fetch leaves them `None` and the overlay is
/// skipped at export time.
#[derive(Debug, Clone)]
pub struct OverlaySource {
    pub title: String,
    pub url: String,
    pub bytes: Option<Vec<u8>>,
    pub handle: Option<Handle>,
}

#[derive(Debug, Clone)]
pub struct UserPhoto {
    /// Original encoded bytes, kept for export.
    pub bytes: Vec<u8>,
    pub loaded: LoadedPhoto,
}

#[derive(Debug, Default)]
pub struct TryOnState {
    pub photo: Option<UserPhoto>,
    pub overlays: BoxCollection<OverlaySource>,
    pub exporting: bool,
    /// Bumped whenever the photo changes; invalidates in-flight drags.
    pub epoch: u64,
}

impl TryOnState {
    pub fn natural(&self) -> Size {
        match &self.photo {
            Some(photo) => photo.loaded.natural,
            None => Size::new(1.0, 1.0),
        }
    }

    /// A new photo starts a clean stage: overlays belong to the old photo's
    /// geometry and are dropped with it.
    pub fn set_photo(&mut self, bytes: Vec<u8>, loaded: LoadedPhoto) {
        self.photo = Some(UserPhoto { bytes, loaded });
        self.overlays.clear();
        self.epoch += 1;
    }

    pub fn clear_photo(&mut self) {
        self.photo = None;
        self.overlays.clear();
        self.epoch += 1;
    }

    /// Add an overlay at the default placement and select it. The caller
    /// kicks off the cutout fetch and reports back via
    /// [`TryOnState::overlay_fetched`].
    pub fn add_overlay(&mut self, title: String, url: String) -> u64 {
        let id = self.overlays.add(
            DEFAULT_OVERLAY_RECT,
            OverlaySource {
                title,
                url,
                bytes: None,
                handle: None,
            },
        );
        self.overlays.select(Some(id));
        id
    }

    /// Attach fetched cutout bytes. A no-op if the overlay was removed while
    /// the fetch was in flight.
    pub fn overlay_fetched(&mut self, id: u64, bytes: Vec<u8>) {
        let handle = Handle::from_bytes(bytes.clone());
        self.overlays.update(id, |entity| {
            entity.data.bytes = Some(bytes);
            entity.data.handle = Some(handle);
        });
    }

    pub fn remove_overlay(&mut self, id: u64) {
        self.overlays.remove(id);
    }

    pub fn clear_overlays(&mut self) {
        self.overlays.clear();
    }

    /// Apply a finished drag. The try-on stage never draws new boxes, so a
    /// create commit can only be stale noise and is dropped.
    pub fn apply_commit(&mut self, commit: Commit) {
        if let Commit::Update { id, rect } = commit {
            self.overlays.set_rect(id, rect);
        }
    }

    /// Snapshot for the export engine: `(geometry, bytes)` in draw order.
    pub fn export_layers(&self) -> Vec<(RelBox, Option<Vec<u8>>)> {
        self.overlays
            .iter()
            .map(|entity| (entity.rect, entity.data.bytes.clone()))
            .collect()
    }
}
