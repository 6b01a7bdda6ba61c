//! The try-on stage: garment cutouts layered over the user photo.
//!
//! Simpler gestures than the closet editor: dragging an overlay's body moves
//! it, its bottom-right handle resizes it (shift locks the aspect ratio at
//! pointer-down), and there is no draw mode.

use iced::mouse::{self, Cursor};
use iced::widget::canvas::{self, Program};
use iced::{Color, Point, Rectangle, Renderer, Theme};

use crate::editor::project::{handles, hit_box, project};
use crate::editor::{Commit, DragSession, GestureContext, Handle};
use crate::geometry::{fit_rect, DisplayRect, Size};
use crate::state::tryon::{OverlaySource, MIN_OVERLAY_FRACTION};
use crate::state::LoadedPhoto;
use crate::ui::{local_pointer, EditorEvent, StageState};

pub struct OverlayStage<'a> {
    pub photo: Option<&'a LoadedPhoto>,
    pub overlays: &'a crate::editor::BoxCollection<OverlaySource>,
    pub shift_down: bool,
    pub epoch: u64,
}

impl OverlayStage<'_> {
    fn natural(&self) -> Size {
        match self.photo {
            Some(photo) => photo.natural,
            None => Size::new(1.0, 1.0),
        }
    }

    fn display(&self, bounds: Rectangle) -> DisplayRect {
        fit_rect(Size::new(bounds.width, bounds.height), self.natural())
    }

    fn context(&self, display: &DisplayRect) -> GestureContext {
        let natural = self.natural();
        GestureContext::new(display.size(), natural).with_min_box(Size::new(
            MIN_OVERLAY_FRACTION * natural.width,
            MIN_OVERLAY_FRACTION * natural.height,
        ))
    }

    /// The single resize affordance: the selected overlay's bottom-right
    /// handle.
    fn resize_handle(&self, point: Point, display: &DisplayRect) -> Option<u64> {
        let entity = self.overlays.selected()?;
        let frame = project(entity.rect, display);
        handles(frame)
            .into_iter()
            .find(|(handle, rect)| *handle == Handle::SouthEast && rect.contains(point))
            .map(|_| entity.id)
    }
}

impl Program<EditorEvent> for OverlayStage<'_> {
    type State = StageState;

    fn update(
        &self,
        state: &mut Self::State,
        event: canvas::Event,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> (canvas::event::Status, Option<EditorEvent>) {
        let display = self.display(bounds);
        let ctx = self.context(&display);

        match event {
            canvas::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) => {
                let Some(point) = cursor.position_in(bounds) else {
                    return (canvas::event::Status::Ignored, None);
                };
                if self.photo.is_none() {
                    return (canvas::event::Status::Ignored, None);
                }
                let pointer = display.to_local(point.x, point.y);
                state.pointer = Some(pointer);

                if let Some(id) = self.resize_handle(point, &display) {
                    if let Some(entity) = self.overlays.get(id) {
                        state.session = Some(DragSession::begin_resize(
                            id,
                            entity.rect.to_pixels(ctx.natural),
                            Handle::SouthEast,
                            pointer,
                            self.shift_down,
                            self.epoch,
                        ));
                        return (canvas::event::Status::Captured, None);
                    }
                }

                if let Some(id) =
                    hit_box(point, self.overlays.iter().map(|e| (e.id, e.rect)), &display)
                {
                    if let Some(entity) = self.overlays.get(id) {
                        state.session = Some(DragSession::begin_move(
                            id,
                            entity.rect.to_pixels(ctx.natural),
                            pointer,
                            self.epoch,
                        ));
                    }
                    return (
                        canvas::event::Status::Captured,
                        Some(EditorEvent::Selected(Some(id))),
                    );
                }
                (
                    canvas::event::Status::Captured,
                    Some(EditorEvent::Selected(None)),
                )
            }

            canvas::Event::Mouse(mouse::Event::CursorMoved { .. }) => {
                if let Some(pointer) = local_pointer(cursor, bounds, &display) {
                    state.pointer = Some(pointer);
                }
                if state.session.is_some() {
                    return (canvas::event::Status::Captured, None);
                }
                (canvas::event::Status::Ignored, None)
            }

            canvas::Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left)) => {
                let Some(session) = state.session.take() else {
                    return (canvas::event::Status::Ignored, None);
                };
                let commit = if session.epoch() != self.epoch {
                    Commit::Discard
                } else {
                    // Releases outside the canvas commit from the last move.
                    match local_pointer(cursor, bounds, &display).or(state.pointer) {
                        Some(pointer) => session.finish(pointer, &ctx),
                        None => Commit::Discard,
                    }
                };
                (
                    canvas::event::Status::Captured,
                    Some(EditorEvent::Committed(commit)),
                )
            }

            _ => (canvas::event::Status::Ignored, None),
        }
    }

    fn draw(
        &self,
        state: &Self::State,
        renderer: &Renderer,
        theme: &Theme,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> Vec<canvas::Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());
        frame.fill_rectangle(
            Point::ORIGIN,
            bounds.size(),
            Color::from_rgb(0.11, 0.11, 0.12),
        );

        let Some(photo) = self.photo else {
            return vec![frame.into_geometry()];
        };

        let display = self.display(bounds);
        frame.draw_image(
            Rectangle {
                x: display.x,
                y: display.y,
                width: display.width,
                height: display.height,
            },
            canvas::Image::new(photo.handle.clone()),
        );

        let ctx = self.context(&display);
        let pointer = local_pointer(cursor, bounds, &display).or(state.pointer);
        let session = state.session.as_ref();
        let accent = theme.palette().primary;

        for entity in self.overlays.iter() {
            let rect = match (session, pointer) {
                (Some(session), Some(pointer)) if session.target() == Some(entity.id) => {
                    session.live_box(pointer, &ctx).to_relative(ctx.natural)
                }
                _ => entity.rect,
            };
            let projected = project(rect, &display);

            match &entity.data.handle {
                Some(handle) => frame.draw_image(projected, canvas::Image::new(handle.clone())),
                // Still fetching (or the fetch failed): a translucent slab
                // marks where the garment will land.
                None => frame.fill_rectangle(
                    Point::new(projected.x, projected.y),
                    projected.size(),
                    Color::from_rgba(0.5, 0.5, 0.55, 0.35),
                ),
            }

            let selected = self.overlays.selected_id() == Some(entity.id);
            let path = canvas::Path::rectangle(
                Point::new(projected.x, projected.y),
                projected.size(),
            );
            frame.stroke(
                &path,
                canvas::Stroke::default()
                    .with_width(if selected { 2.0 } else { 1.0 })
                    .with_color(if selected {
                        accent
                    } else {
                        Color::from_rgba(0.9, 0.9, 0.9, 0.6)
                    }),
            );

            if selected {
                for (handle, handle_rect) in handles(projected) {
                    if handle == Handle::SouthEast {
                        frame.fill_rectangle(
                            Point::new(handle_rect.x, handle_rect.y),
                            handle_rect.size(),
                            accent,
                        );
                    }
                }
            }
        }

        vec![frame.into_geometry()]
    }

    fn mouse_interaction(
        &self,
        state: &Self::State,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> mouse::Interaction {
        if state.session.is_some() {
            return mouse::Interaction::Grabbing;
        }
        let Some(point) = cursor.position_in(bounds) else {
            return mouse::Interaction::default();
        };
        if self.photo.is_none() {
            return mouse::Interaction::default();
        }
        let display = self.display(bounds);
        if self.resize_handle(point, &display).is_some() {
            return mouse::Interaction::Crosshair;
        }
        if hit_box(point, self.overlays.iter().map(|e| (e.id, e.rect)), &display).is_some() {
            return mouse::Interaction::Grab;
        }
        mouse::Interaction::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::BoxCollection;
    use crate::geometry::RelBox;
    use iced::widget::image::Handle as ImageHandle;

    fn photo_1000x800() -> LoadedPhoto {
        LoadedPhoto {
            handle: ImageHandle::from_bytes(vec![1, 2, 3]),
            natural: Size::new(1000.0, 800.0),
        }
    }

    fn overlay_source() -> OverlaySource {
        OverlaySource {
            title: "jacket".into(),
            url: "http://x/jacket.png".into(),
            bytes: None,
            handle: None,
        }
    }

    fn bounds() -> Rectangle {
        Rectangle {
            x: 0.0,
            y: 0.0,
            width: 500.0,
            height: 400.0,
        }
    }

    #[test]
    fn test_release_outside_canvas_commits_last_move() {
        let mut overlays = BoxCollection::new();
        let id = overlays.add(RelBox::new(0.35, 0.2, 0.3, 0.3), overlay_source());
        let photo = photo_1000x800();
        let stage = OverlayStage {
            photo: Some(&photo),
            overlays: &overlays,
            shift_down: false,
            epoch: 0,
        };
        let mut state = StageState::default();

        // Press on the overlay body, drag by display (+25, +20).
        stage.update(
            &mut state,
            canvas::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)),
            bounds(),
            Cursor::Available(Point::new(200.0, 100.0)),
        );
        assert!(state.session.is_some());
        stage.update(
            &mut state,
            canvas::Event::Mouse(mouse::Event::CursorMoved {
                position: Point::new(225.0, 120.0),
            }),
            bounds(),
            Cursor::Available(Point::new(225.0, 120.0)),
        );

        let (_, message) = stage.update(
            &mut state,
            canvas::Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left)),
            bounds(),
            Cursor::Unavailable,
        );
        match message {
            Some(EditorEvent::Committed(Commit::Update { id: got, rect })) => {
                assert_eq!(got, id);
                // Natural delta (+50, +40) on the (350, 160) origin.
                assert!((rect.x - 0.4).abs() < 1e-4, "{rect:?}");
                assert!((rect.y - 0.25).abs() < 1e-4, "{rect:?}");
                assert!((rect.w - 0.3).abs() < 1e-4, "{rect:?}");
                assert!((rect.h - 0.3).abs() < 1e-4, "{rect:?}");
            }
            other => panic!("expected update, got {other:?}"),
        }
        assert!(state.session.is_none());
    }
}
