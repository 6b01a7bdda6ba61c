use iced::widget::{
    button, canvas, checkbox, column, container, pick_list, row, scrollable, text, text_input,
};
use iced::{Alignment, Element, Length, Subscription, Task, Theme};
use iced_aw::Wrap;
use rfd::FileDialog;
use std::path::PathBuf;

mod api;
mod config;
mod editor;
mod export;
mod geometry;
mod state;
mod ui;

use api::model::{ImageRecord, ItemRecord, RecommendationResponse};
use editor::Commit;
use geometry::RelBox;
use state::closet::{BoxField, ClosetState, EditorMode, GarmentKind, PendingChange};
use state::recommend::RecommendState;
use state::tryon::TryOnState;
use state::LoadedPhoto;
use ui::closet_canvas::GarmentEditor;
use ui::tryon_canvas::OverlayStage;
use ui::EditorEvent;

/// Main application state
struct OutfitStudio {
    api: api::Client,
    closet: ClosetState,
    recommend: RecommendState,
    tryon: TryOnState,
    /// Tracked globally so each canvas can capture it at pointer-down.
    shift_down: bool,
    /// Status message to display to the user
    status: String,
}

/// Application messages (events)
#[derive(Debug, Clone)]
enum Message {
    // Image store
    RefreshImages,
    ImagesListed(Result<Vec<ImageRecord>, String>),
    UploadImages,
    ImagesUploaded(Result<usize, String>),
    DeleteImage(String),
    ClearImages,
    ImagesDeleted(Result<usize, String>),
    SelectImage(ImageRecord),
    CloseImage,
    PhotoLoaded(String, Result<LoadedPhoto, String>),
    ItemsListed(Result<Vec<ItemRecord>, String>),

    // Garment box editor
    Editor(EditorEvent),
    SetMode(EditorMode),
    AddFullItem,
    KindPicked(u64, GarmentKind),
    CaptionEdited(u64, String),
    BoxFieldEdited(u64, BoxField, String),
    DeleteItem(u64),
    SaveItems,
    /// Err carries the changes that were not flushed, for requeueing.
    ItemsSaved(Result<usize, (Vec<PendingChange>, String)>),

    // Recommendations
    QueryEdited(String),
    BudgetEdited(String),
    OccasionToggled(String),
    BaseItemToggled(String),
    RequestOutfits,
    OutfitsReceived(Result<RecommendationResponse, String>),
    RenderOutfit(String),
    OutfitRendered(Result<String, String>),

    // Try-on stage
    PickUserPhoto,
    UserPhotoRead(Result<Vec<u8>, String>),
    ClearUserPhoto,
    AddOverlay { title: String, url: String },
    OverlayFetched(u64, Result<Vec<u8>, String>),
    RemoveOverlay(u64),
    ClearOverlays,
    TryOn(EditorEvent),
    ExportTryOn,
    ExportFinished(Result<PathBuf, String>),

    ShiftChanged(bool),
}

impl OutfitStudio {
    fn new() -> (Self, Task<Message>) {
        let api = api::Client::new(config::server_url());
        log::info!("closet services at {}", config::server_url());

        let app = OutfitStudio {
            api: api.clone(),
            closet: ClosetState::default(),
            recommend: RecommendState::default(),
            tryon: TryOnState::default(),
            shift_down: false,
            status: "Loading closet...".to_string(),
        };

        let images = {
            let client = api.clone();
            Task::perform(
                async move { client.list_images().await.map_err(|e| e.to_string()) },
                Message::ImagesListed,
            )
        };
        let items = {
            let client = api;
            Task::perform(
                async move { client.list_items().await.map_err(|e| e.to_string()) },
                Message::ItemsListed,
            )
        };

        (app, Task::batch([images, items]))
    }

    fn list_items_task(&self) -> Task<Message> {
        let client = self.api.clone();
        Task::perform(
            async move { client.list_items().await.map_err(|e| e.to_string()) },
            Message::ItemsListed,
        )
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            // ---- Image store ----
            Message::RefreshImages => {
                self.closet.loading = true;
                let client = self.api.clone();
                Task::perform(
                    async move { client.list_images().await.map_err(|e| e.to_string()) },
                    Message::ImagesListed,
                )
            }
            Message::ImagesListed(result) => {
                self.closet.loading = false;
                match result {
                    Ok(images) => self.closet.images = images,
                    Err(err) => {
                        log::error!("listing images failed: {err}");
                        self.status = format!("Could not list images: {err}");
                    }
                }
                Task::none()
            }
            Message::UploadImages => {
                let Some(paths) = FileDialog::new()
                    .set_title("Select Clothing Photos")
                    .add_filter("Images", &["png", "jpg", "jpeg", "webp"])
                    .pick_files()
                else {
                    return Task::none();
                };
                self.closet.uploading = true;
                self.status = format!("Uploading {} photo(s)...", paths.len());
                let client = self.api.clone();
                Task::perform(
                    async move {
                        let mut payload = Vec::new();
                        for path in &paths {
                            let name = path
                                .file_name()
                                .map(|n| n.to_string_lossy().to_string())
                                .unwrap_or_else(|| "photo.png".to_string());
                            let bytes =
                                tokio::fs::read(path).await.map_err(|e| e.to_string())?;
                            payload.push((name, bytes));
                        }
                        let count = payload.len();
                        client
                            .upload_images(payload)
                            .await
                            .map_err(|e| e.to_string())?;
                        Ok(count)
                    },
                    Message::ImagesUploaded,
                )
            }
            Message::ImagesUploaded(result) => {
                self.closet.uploading = false;
                match result {
                    Ok(count) => {
                        self.status = format!("Uploaded {count} photo(s).");
                        Task::done(Message::RefreshImages)
                    }
                    Err(err) => {
                        log::error!("upload failed: {err}");
                        self.status = format!("Upload failed: {err}");
                        Task::none()
                    }
                }
            }
            Message::DeleteImage(id) => {
                if self
                    .closet
                    .selected
                    .as_ref()
                    .is_some_and(|sel| sel.record.id == id)
                {
                    self.closet.close_image();
                }
                let client = self.api.clone();
                Task::perform(
                    async move {
                        client.delete_image(&id).await.map_err(|e| e.to_string())?;
                        Ok(1)
                    },
                    Message::ImagesDeleted,
                )
            }
            Message::ClearImages => {
                self.closet.close_image();
                let ids: Vec<String> =
                    self.closet.images.iter().map(|r| r.id.clone()).collect();
                let client = self.api.clone();
                Task::perform(
                    async move {
                        let mut deleted = 0usize;
                        for id in ids {
                            client.delete_image(&id).await.map_err(|e| e.to_string())?;
                            deleted += 1;
                        }
                        Ok(deleted)
                    },
                    Message::ImagesDeleted,
                )
            }
            Message::ImagesDeleted(result) => {
                match result {
                    Ok(count) => self.status = format!("Deleted {count} image(s)."),
                    Err(err) => {
                        log::error!("deleting images failed: {err}");
                        self.status = format!("Delete failed: {err}");
                    }
                }
                Task::done(Message::RefreshImages)
            }
            Message::SelectImage(record) => {
                let id = record.id.clone();
                let url = record.url.clone();
                self.closet.select_image(record);

                let client = self.api.clone();
                let photo = Task::perform(
                    async move {
                        let bytes =
                            client.fetch_bytes(&url).await.map_err(|e| e.to_string())?;
                        LoadedPhoto::from_bytes(bytes).map_err(|e| e.to_string())
                    },
                    move |result| Message::PhotoLoaded(id.clone(), result),
                );
                Task::batch([photo, self.list_items_task()])
            }
            Message::CloseImage => {
                self.closet.close_image();
                Task::none()
            }
            Message::PhotoLoaded(id, result) => {
                // Ignore loads that resolve after the selection moved on.
                if let Some(sel) = &mut self.closet.selected {
                    if sel.record.id == id {
                        match result {
                            Ok(photo) => sel.photo = Some(photo),
                            Err(err) => {
                                log::error!("photo load failed for {id}: {err}");
                                self.status = format!("Could not load the photo: {err}");
                            }
                        }
                    }
                }
                Task::none()
            }
            Message::ItemsListed(result) => {
                match result {
                    Ok(records) => {
                        self.recommend.all_items = records.clone();
                        let selected_id = self
                            .closet
                            .selected
                            .as_ref()
                            .map(|sel| sel.record.id.clone());
                        if let Some(image_id) = selected_id {
                            let mine = records
                                .into_iter()
                                .filter(|r| r.image_id.as_deref() == Some(image_id.as_str()))
                                .collect();
                            self.closet.set_items(mine);
                        }
                    }
                    Err(err) => {
                        log::error!("listing items failed: {err}");
                        self.status = format!("Could not list items: {err}");
                    }
                }
                Task::none()
            }

            // ---- Garment box editor ----
            Message::Editor(event) => {
                match event {
                    EditorEvent::Selected(id) => self.closet.select_box(id),
                    EditorEvent::Committed(commit) => self.closet.apply_commit(commit),
                }
                Task::none()
            }
            Message::SetMode(mode) => {
                self.closet.mode = mode;
                Task::none()
            }
            Message::AddFullItem => {
                // A freshly registered item starts as a full-image box; the
                // user shrinks it onto the garment afterwards.
                self.closet.apply_commit(Commit::Create {
                    rect: RelBox::new(0.0, 0.0, 1.0, 1.0),
                });
                Task::none()
            }
            Message::KindPicked(id, kind) => {
                self.closet.set_kind(id, kind);
                Task::none()
            }
            Message::CaptionEdited(id, caption) => {
                self.closet.set_caption(id, caption);
                Task::none()
            }
            Message::BoxFieldEdited(id, field, value) => {
                self.closet.set_box_field(id, field, &value);
                Task::none()
            }
            Message::DeleteItem(id) => {
                self.closet.delete_item(id);
                Task::none()
            }
            Message::SaveItems => {
                let changes = self.closet.take_pending();
                if changes.is_empty() {
                    return Task::none();
                }
                self.status = "Saving items...".to_string();
                let client = self.api.clone();
                Task::perform(
                    async move {
                        let mut flushed = 0usize;
                        let mut iter = changes.into_iter();
                        while let Some(change) = iter.next() {
                            let result = match &change {
                                PendingChange::Delete(id) => client.delete_item(id).await,
                                PendingChange::Save { record, .. } => {
                                    client.save_item(record).await
                                }
                            };
                            if let Err(err) = result {
                                // Hand back everything not yet flushed,
                                // including the change that failed.
                                let mut rest = vec![change];
                                rest.extend(iter);
                                return Err((rest, err.to_string()));
                            }
                            flushed += 1;
                        }
                        Ok(flushed)
                    },
                    Message::ItemsSaved,
                )
            }
            Message::ItemsSaved(result) => match result {
                Ok(count) => {
                    self.status = format!("Saved {count} change(s).");
                    // Re-list so newly created items pick up their server ids.
                    self.list_items_task()
                }
                Err((unflushed, err)) => {
                    log::error!("saving items failed: {err}");
                    self.closet.requeue_pending(unflushed);
                    self.status = format!("Save failed: {err}. Changes kept, try again.");
                    Task::none()
                }
            },

            // ---- Recommendations ----
            Message::QueryEdited(query) => {
                self.recommend.query = query;
                Task::none()
            }
            Message::BudgetEdited(budget) => {
                self.recommend.budget = budget;
                Task::none()
            }
            Message::OccasionToggled(name) => {
                self.recommend.toggle_occasion(&name);
                Task::none()
            }
            Message::BaseItemToggled(id) => {
                self.recommend.toggle_item(&id);
                Task::none()
            }
            Message::RequestOutfits => {
                self.recommend.loading = true;
                let request = self.recommend.request();
                let client = self.api.clone();
                Task::perform(
                    async move { client.recommend(&request).await.map_err(|e| e.to_string()) },
                    Message::OutfitsReceived,
                )
            }
            Message::OutfitsReceived(result) => {
                self.recommend.loading = false;
                match result {
                    Ok(response) => {
                        self.status = format!("{} outfit(s) suggested.", response.outfits.len());
                        self.recommend.outfits = response.outfits;
                    }
                    Err(err) => {
                        log::error!("recommendation failed: {err}");
                        self.status = format!("Recommendation failed: {err}");
                    }
                }
                Task::none()
            }
            Message::RenderOutfit(outfit_id) => {
                let Some(photo) = &self.tryon.photo else {
                    self.status = "Pick a photo in the try-on section first.".to_string();
                    return Task::none();
                };
                self.status = "Rendering on the server...".to_string();
                let bytes = photo.bytes.clone();
                let client = self.api.clone();
                Task::perform(
                    async move {
                        let response = client
                            .try_on(bytes, &outfit_id)
                            .await
                            .map_err(|e| e.to_string())?;
                        Ok(response.result.result_url)
                    },
                    Message::OutfitRendered,
                )
            }
            Message::OutfitRendered(result) => match result {
                Ok(url) => {
                    // Show the rendered composite on the stage.
                    let client = self.api.clone();
                    Task::perform(
                        async move { client.fetch_bytes(&url).await.map_err(|e| e.to_string()) },
                        Message::UserPhotoRead,
                    )
                }
                Err(err) => {
                    log::error!("server try-on failed: {err}");
                    self.status = format!("Server try-on failed: {err}");
                    Task::none()
                }
            },

            // ---- Try-on stage ----
            Message::PickUserPhoto => {
                let Some(path) = FileDialog::new()
                    .set_title("Select Your Photo")
                    .add_filter("Images", &["png", "jpg", "jpeg", "webp"])
                    .pick_file()
                else {
                    return Task::none();
                };
                Task::perform(
                    async move { tokio::fs::read(&path).await.map_err(|e| e.to_string()) },
                    Message::UserPhotoRead,
                )
            }
            Message::UserPhotoRead(result) => {
                match result {
                    Ok(bytes) => match LoadedPhoto::from_bytes(bytes.clone()) {
                        Ok(loaded) => {
                            self.tryon.set_photo(bytes, loaded);
                            self.status = "Photo ready.".to_string();
                        }
                        Err(err) => {
                            log::error!("photo decode failed: {err}");
                            self.status = format!("Could not decode the photo: {err}");
                        }
                    },
                    Err(err) => self.status = format!("Could not read the photo: {err}"),
                }
                Task::none()
            }
            Message::ClearUserPhoto => {
                self.tryon.clear_photo();
                Task::none()
            }
            Message::AddOverlay { title, url } => {
                if self.tryon.photo.is_none() {
                    self.status = "Pick a photo before adding garments.".to_string();
                    return Task::none();
                }
                let id = self.tryon.add_overlay(title, url.clone());
                let client = self.api.clone();
                Task::perform(
                    async move { client.fetch_bytes(&url).await.map_err(|e| e.to_string()) },
                    move |result| Message::OverlayFetched(id, result),
                )
            }
            Message::OverlayFetched(id, result) => {
                match result {
                    Ok(bytes) => self.tryon.overlay_fetched(id, bytes),
                    Err(err) => {
                        log::warn!("overlay fetch failed: {err}");
                        self.status = format!("Could not fetch the garment image: {err}");
                    }
                }
                Task::none()
            }
            Message::RemoveOverlay(id) => {
                self.tryon.remove_overlay(id);
                Task::none()
            }
            Message::ClearOverlays => {
                self.tryon.clear_overlays();
                Task::none()
            }
            Message::TryOn(event) => {
                match event {
                    EditorEvent::Selected(id) => self.tryon.overlays.select(id),
                    EditorEvent::Committed(commit) => self.tryon.apply_commit(commit),
                }
                Task::none()
            }
            Message::ExportTryOn => {
                let Some(photo) = &self.tryon.photo else {
                    return Task::none();
                };
                self.tryon.exporting = true;
                self.status = "Exporting...".to_string();
                let bytes = photo.bytes.clone();
                let layers = self.tryon.export_layers();
                let path = export::default_export_path();
                Task::perform(
                    async move {
                        export::export_png(bytes, layers, path)
                            .await
                            .map_err(|e| e.to_string())
                    },
                    Message::ExportFinished,
                )
            }
            Message::ExportFinished(result) => {
                self.tryon.exporting = false;
                match result {
                    Ok(path) => self.status = format!("Exported to {}", path.display()),
                    Err(err) => {
                        log::error!("export failed: {err}");
                        self.status = format!("Export failed: {err}");
                    }
                }
                Task::none()
            }

            Message::ShiftChanged(down) => {
                self.shift_down = down;
                Task::none()
            }
        }
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        let content = column![
            self.closet_section(),
            self.recommend_section(),
            self.tryon_section(),
            text(&self.status).size(14),
        ]
        .spacing(28)
        .padding(20);

        scrollable(container(content).width(Length::Fill)).into()
    }

    fn closet_section(&self) -> Element<Message> {
        let header = row![
            text("Closet").size(24),
            button("Refresh").on_press(Message::RefreshImages),
            button(text(if self.closet.uploading {
                "Uploading..."
            } else {
                "Upload photos"
            }))
            .on_press_maybe((!self.closet.uploading).then_some(Message::UploadImages)),
            button("Clear all")
                .on_press_maybe((!self.closet.images.is_empty()).then_some(Message::ClearImages)),
        ]
        .spacing(10)
        .align_y(Alignment::Center);

        let mut cards: Vec<Element<Message>> = Vec::new();
        for record in &self.closet.images {
            let name = record.name.clone().unwrap_or_else(|| record.id.clone());
            cards.push(
                container(
                    column![
                        text(name).size(14),
                        row![
                            button(text("Edit").size(12))
                                .on_press(Message::SelectImage(record.clone())),
                            button(text("Delete").size(12))
                                .on_press(Message::DeleteImage(record.id.clone())),
                        ]
                        .spacing(6),
                    ]
                    .spacing(6),
                )
                .padding(8)
                .style(container::rounded_box)
                .into(),
            );
        }
        let grid: Element<Message> = if cards.is_empty() {
            text(if self.closet.loading {
                "Loading images..."
            } else {
                "No images yet. Upload some clothing photos."
            })
            .size(14)
            .into()
        } else {
            Wrap::with_elements(cards).spacing(8.0).line_spacing(8.0).into()
        };

        let mut section = column![header, grid].spacing(14);
        if self.closet.selected.is_some() {
            section = section.push(self.editor_panel());
        }
        section.into()
    }

    fn editor_panel(&self) -> Element<Message> {
        let Some(sel) = &self.closet.selected else {
            return column![].into();
        };

        let stage: Element<Message> = Element::from(
            canvas(GarmentEditor {
                photo: sel.photo.as_ref(),
                items: &sel.items,
                mode: self.closet.mode,
                shift_down: self.shift_down,
                epoch: self.closet.epoch,
            })
            .width(Length::Fill)
            .height(420.0),
        )
        .map(Message::Editor);

        let toolbar = row![
            text(sel.record.name.as_deref().unwrap_or(&sel.record.id)).size(16),
            button(text("Select").size(12)).on_press_maybe(
                (self.closet.mode != EditorMode::Select)
                    .then_some(Message::SetMode(EditorMode::Select))
            ),
            button(text("Add box").size(12)).on_press_maybe(
                (self.closet.mode != EditorMode::AddBox)
                    .then_some(Message::SetMode(EditorMode::AddBox))
            ),
            button(text("Register full-image item").size(12)).on_press(Message::AddFullItem),
            button(text("Save changes").size(12))
                .on_press_maybe(self.closet.has_pending().then_some(Message::SaveItems)),
            button(text("Close").size(12)).on_press(Message::CloseImage),
        ]
        .spacing(10)
        .align_y(Alignment::Center);

        let natural = self.closet.natural();
        let mut items = column![].spacing(6);
        for entity in sel.items.iter() {
            let id = entity.id;
            let px = entity.rect.to_pixels(natural);
            let marker = if sel.items.selected_id() == Some(id) {
                "[x]"
            } else {
                "[ ]"
            };
            items = items.push(
                row![
                    button(text(marker).size(12))
                        .on_press(Message::Editor(EditorEvent::Selected(Some(id)))),
                    pick_list(GarmentKind::ALL, Some(entity.data.kind), move |kind| {
                        Message::KindPicked(id, kind)
                    })
                    .text_size(13),
                    text_input("caption", &entity.data.caption)
                        .on_input(move |s| Message::CaptionEdited(id, s))
                        .size(13)
                        .width(220),
                    coord_input("x", px.x, move |v| {
                        Message::BoxFieldEdited(id, BoxField::X, v)
                    }),
                    coord_input("y", px.y, move |v| {
                        Message::BoxFieldEdited(id, BoxField::Y, v)
                    }),
                    coord_input("w", px.w, move |v| {
                        Message::BoxFieldEdited(id, BoxField::W, v)
                    }),
                    coord_input("h", px.h, move |v| {
                        Message::BoxFieldEdited(id, BoxField::H, v)
                    }),
                    button(text("Delete").size(12)).on_press(Message::DeleteItem(id)),
                ]
                .spacing(8)
                .align_y(Alignment::Center),
            );
        }

        column![toolbar, stage, items].spacing(10).into()
    }

    fn recommend_section(&self) -> Element<Message> {
        let header = text("Outfit Ideas").size(24);

        let form = row![
            text_input("What are you dressing for?", &self.recommend.query)
                .on_input(Message::QueryEdited)
                .width(320),
            text_input("budget (optional)", &self.recommend.budget)
                .on_input(Message::BudgetEdited)
                .width(160),
            button(text(if self.recommend.loading {
                "Thinking..."
            } else {
                "Get outfits"
            }))
            .on_press_maybe((!self.recommend.loading).then_some(Message::RequestOutfits)),
        ]
        .spacing(10)
        .align_y(Alignment::Center);

        let mut occasions: Vec<Element<Message>> = Vec::new();
        for (name, selected) in &self.recommend.occasions {
            let toggled = name.clone();
            occasions.push(
                checkbox(name.clone(), *selected)
                    .on_toggle(move |_| Message::OccasionToggled(toggled.clone()))
                    .size(16)
                    .into(),
            );
        }
        let occasions: Element<Message> =
            Wrap::with_elements(occasions).spacing(10.0).line_spacing(6.0).into();

        let mut base_items: Vec<Element<Message>> = Vec::new();
        for item in &self.recommend.all_items {
            let Some(id) = item.id.clone() else {
                continue;
            };
            let checked = self.recommend.selected_items.contains(&id);
            let label = if item.caption.is_empty() {
                format!("{} ({})", item.kind, id)
            } else {
                format!("{}: {}", item.kind, item.caption)
            };
            base_items.push(
                checkbox(label, checked)
                    .on_toggle(move |_| Message::BaseItemToggled(id.clone()))
                    .size(16)
                    .into(),
            );
        }
        let base_items: Element<Message> = if base_items.is_empty() {
            text("Save some garment boxes to build outfits around them.")
                .size(13)
                .into()
        } else {
            Wrap::with_elements(base_items).spacing(10.0).line_spacing(6.0).into()
        };

        let mut results = column![].spacing(12);
        for outfit in &self.recommend.outfits {
            let mut pieces: Vec<Element<Message>> = Vec::new();
            for piece in &outfit.items {
                pieces.push(
                    container(
                        column![
                            text(&piece.title).size(13),
                            text(&piece.category).size(11),
                            button(text("Add to try-on").size(12)).on_press(
                                Message::AddOverlay {
                                    title: piece.title.clone(),
                                    url: piece.src.clone(),
                                }
                            ),
                        ]
                        .spacing(4),
                    )
                    .padding(8)
                    .style(container::rounded_box)
                    .into(),
                );
            }
            let mut card = column![
                text(format!("Score {:.2}", outfit.score)).size(15),
            ]
            .spacing(4);
            if !outfit.explanation.is_empty() {
                card = card.push(text(&outfit.explanation).size(12));
            }
            card = card.push(
                Element::from(Wrap::with_elements(pieces).spacing(8.0).line_spacing(8.0)),
            );
            if let Some(outfit_id) = &outfit.id {
                card = card.push(
                    button(text("Render on server").size(12))
                        .on_press(Message::RenderOutfit(outfit_id.clone())),
                );
            }
            results = results.push(card);
        }

        column![header, form, occasions, base_items, results]
            .spacing(12)
            .into()
    }

    fn tryon_section(&self) -> Element<Message> {
        let has_photo = self.tryon.photo.is_some();

        let header = row![
            text("Try-On").size(24),
            button("Pick photo").on_press(Message::PickUserPhoto),
            button("Clear photo").on_press_maybe(has_photo.then_some(Message::ClearUserPhoto)),
            button("Clear overlays").on_press_maybe(
                (!self.tryon.overlays.is_empty()).then_some(Message::ClearOverlays)
            ),
            button(text(if self.tryon.exporting {
                "Exporting..."
            } else {
                "Export PNG"
            }))
            .on_press_maybe(
                (has_photo && !self.tryon.exporting).then_some(Message::ExportTryOn)
            ),
        ]
        .spacing(10)
        .align_y(Alignment::Center);

        let stage: Element<Message> = Element::from(
            canvas(OverlayStage {
                photo: self.tryon.photo.as_ref().map(|p| &p.loaded),
                overlays: &self.tryon.overlays,
                shift_down: self.shift_down,
                epoch: self.tryon.epoch,
            })
            .width(Length::Fill)
            .height(420.0),
        )
        .map(Message::TryOn);

        let mut overlays = column![].spacing(4);
        for entity in self.tryon.overlays.iter() {
            let id = entity.id;
            let status = if entity.data.handle.is_some() {
                ""
            } else {
                " (loading)"
            };
            overlays = overlays.push(
                row![
                    text(format!("{}{}", entity.data.title, status)).size(13),
                    button(text("Remove").size(12)).on_press(Message::RemoveOverlay(id)),
                ]
                .spacing(8)
                .align_y(Alignment::Center),
            );
        }

        let hint = text("Drag an overlay to move it; drag its corner to resize. Hold Shift to keep the aspect ratio.")
            .size(12);

        column![header, stage, overlays, hint].spacing(10).into()
    }

    fn subscription(&self) -> Subscription<Message> {
        use iced::keyboard::{self, key::Named, Key};

        Subscription::batch([
            keyboard::on_key_press(|key, _modifiers| match key {
                Key::Named(Named::Shift) => Some(Message::ShiftChanged(true)),
                _ => None,
            }),
            keyboard::on_key_release(|key, _modifiers| match key {
                Key::Named(Named::Shift) => Some(Message::ShiftChanged(false)),
                _ => None,
            }),
        ])
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

/// Small labeled number input for manual pixel-coordinate entry.
fn coord_input<'a>(
    label: &'a str,
    value: f32,
    on_input: impl Fn(String) -> Message + 'a,
) -> Element<'a, Message> {
    row![
        text(label).size(12),
        text_input("", &format!("{}", value as i64))
            .on_input(on_input)
            .size(13)
            .width(64),
    ]
    .spacing(4)
    .align_y(Alignment::Center)
    .into()
}

fn main() -> iced::Result {
    env_logger::init();

    iced::application("Outfit Studio", OutfitStudio::update, OutfitStudio::view)
        .subscription(OutfitStudio::subscription)
        .theme(OutfitStudio::theme)
        .centered()
        .run_with(OutfitStudio::new)
}
