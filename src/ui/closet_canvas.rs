//! The garment box editor drawn over a closet image.
//!
//! The drag session lives in the canvas [`Program::State`], so it exists only
//! between pointer-down and pointer-up. While a drag is live the dragged
//! box's geometry is recomputed from session + cursor on every frame; nothing
//! is written to the collection until release.

use iced::mouse::{self, Cursor};
use iced::widget::canvas::{self, Program};
use iced::{Color, Point, Rectangle, Renderer, Theme};

use crate::editor::project::{handles, hit_box, hit_handle, project};
use crate::editor::{Commit, DragSession, GestureContext, Handle};
use crate::geometry::{fit_rect, DisplayRect, RelBox, Size};
use crate::state::closet::{EditorMode, Garment};
use crate::state::LoadedPhoto;
use crate::ui::{local_pointer, EditorEvent, StageState};

pub struct GarmentEditor<'a> {
    pub photo: Option<&'a LoadedPhoto>,
    pub items: &'a crate::editor::BoxCollection<Garment>,
    pub mode: EditorMode,
    pub shift_down: bool,
    /// Current editor generation; sessions started under an older one are
    /// stale and discard on release.
    pub epoch: u64,
}

impl GarmentEditor<'_> {
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
        GestureContext::new(display.size(), self.natural())
    }

    /// The geometry to draw for one box: the live session result while that
    /// box is being dragged, its committed rect otherwise.
    fn rect_for(
        &self,
        id: u64,
        rect: RelBox,
        session: Option<&DragSession>,
        pointer: Option<(f32, f32)>,
        ctx: &GestureContext,
    ) -> RelBox {
        match (session, pointer) {
            (Some(session), Some(pointer)) if session.target() == Some(id) => {
                session.live_box(pointer, ctx).to_relative(ctx.natural)
            }
            _ => rect,
        }
    }
}

impl Program<EditorEvent> for GarmentEditor<'_> {
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

                // A handle of the selected box wins over everything under it.
                if let Some(entity) = self.items.selected() {
                    let frame = project(entity.rect, &display);
                    if let Some(handle) = hit_handle(point, frame) {
                        state.session = Some(DragSession::begin_resize(
                            entity.id,
                            entity.rect.to_pixels(ctx.natural),
                            handle,
                            pointer,
                            self.shift_down,
                            self.epoch,
                        ));
                        return (canvas::event::Status::Captured, None);
                    }
                }

                if self.mode == EditorMode::AddBox {
                    if display.contains(point.x, point.y) {
                        state.session = Some(DragSession::begin_draw(pointer, self.epoch));
                        return (canvas::event::Status::Captured, None);
                    }
                    return (canvas::event::Status::Ignored, None);
                }

                if let Some(id) = hit_box(point, self.items.iter().map(|e| (e.id, e.rect)), &display)
                {
                    if let Some(entity) = self.items.get(id) {
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
                    // Capturing forces a redraw, which re-derives the live
                    // geometry from the new pointer position.
                    return (canvas::event::Status::Captured, None);
                }
                (canvas::event::Status::Ignored, None)
            }

            canvas::Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left)) => {
                let Some(session) = state.session.take() else {
                    return (canvas::event::Status::Ignored, None);
                };
                let commit = if session.epoch() != self.epoch {
                    // The image changed under the drag.
                    Commit::Discard
                } else {
                    // The cursor may be gone (released outside the window);
                    // the commit must observe the last move, not a made-up
                    // position.
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

        for entity in self.items.iter() {
            let rect = self.rect_for(entity.id, entity.rect, session, pointer, &ctx);
            let projected = project(rect, &display);
            let selected = self.items.selected_id() == Some(entity.id);

            let path = canvas::Path::rectangle(
                Point::new(projected.x, projected.y),
                projected.size(),
            );
            frame.stroke(
                &path,
                canvas::Stroke::default()
                    .with_width(if selected { 2.5 } else { 1.5 })
                    .with_color(if selected {
                        accent
                    } else {
                        Color::from_rgb(0.85, 0.85, 0.85)
                    }),
            );

            if selected {
                for (_, handle_rect) in handles(projected) {
                    frame.fill_rectangle(
                        Point::new(handle_rect.x, handle_rect.y),
                        handle_rect.size(),
                        accent,
                    );
                }
            }
        }

        // Draw-in-progress preview, dashed.
        if let (Some(session), Some(pointer)) = (session, pointer) {
            if session.is_draw() {
                let rect = session.live_box(pointer, &ctx).to_relative(ctx.natural);
                let projected = project(rect, &display);
                let path = canvas::Path::rectangle(
                    Point::new(projected.x, projected.y),
                    projected.size(),
                );
                frame.stroke(
                    &path,
                    canvas::Stroke {
                        line_dash: canvas::LineDash {
                            segments: &[6.0, 4.0],
                            offset: 0,
                        },
                        ..canvas::Stroke::default().with_width(1.5).with_color(accent)
                    },
                );
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

        if let Some(entity) = self.items.selected() {
            if let Some(handle) = hit_handle(point, project(entity.rect, &display)) {
                return match handle {
                    Handle::North | Handle::South => mouse::Interaction::ResizingVertically,
                    Handle::East | Handle::West => mouse::Interaction::ResizingHorizontally,
                    _ => mouse::Interaction::Crosshair,
                };
            }
        }
        if self.mode == EditorMode::AddBox {
            return mouse::Interaction::Crosshair;
        }
        if hit_box(point, self.items.iter().map(|e| (e.id, e.rect)), &display).is_some() {
            return mouse::Interaction::Grab;
        }
        mouse::Interaction::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::BoxCollection;
    use crate::state::closet::GarmentKind;
    use iced::widget::image::Handle as ImageHandle;

    fn photo_1000x800() -> LoadedPhoto {
        LoadedPhoto {
            handle: ImageHandle::from_bytes(vec![1, 2, 3]),
            natural: Size::new(1000.0, 800.0),
        }
    }

    fn garment() -> Garment {
        Garment {
            server_id: None,
            kind: GarmentKind::Shirt,
            caption: String::new(),
            source: None,
        }
    }

    // 500x400 canvas over a 1000x800 photo: the fit is exact, no letterbox.
    fn bounds() -> Rectangle {
        Rectangle {
            x: 0.0,
            y: 0.0,
            width: 500.0,
            height: 400.0,
        }
    }

    fn pressed() -> canvas::Event {
        canvas::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left))
    }

    fn moved(x: f32, y: f32) -> canvas::Event {
        canvas::Event::Mouse(mouse::Event::CursorMoved {
            position: Point::new(x, y),
        })
    }

    fn released() -> canvas::Event {
        canvas::Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left))
    }

    #[test]
    fn test_release_outside_canvas_commits_last_move() {
        let mut items = BoxCollection::new();
        let id = items.add(RelBox::new(0.2, 0.2, 0.3, 0.25), garment());
        let photo = photo_1000x800();
        let editor = GarmentEditor {
            photo: Some(&photo),
            items: &items,
            mode: EditorMode::Select,
            shift_down: false,
            epoch: 1,
        };
        let mut state = StageState::default();

        // Press inside the box, drag by display (+25, +10).
        let (_, message) = editor.update(
            &mut state,
            pressed(),
            bounds(),
            Cursor::Available(Point::new(150.0, 120.0)),
        );
        assert_eq!(message, Some(EditorEvent::Selected(Some(id))));
        assert!(state.session.is_some());
        editor.update(
            &mut state,
            moved(175.0, 130.0),
            bounds(),
            Cursor::Available(Point::new(175.0, 130.0)),
        );

        // The cursor is gone at release; the commit must still observe the
        // last move, not some fabricated position.
        let (_, message) = editor.update(&mut state, released(), bounds(), Cursor::Unavailable);
        match message {
            Some(EditorEvent::Committed(Commit::Update { id: got, rect })) => {
                assert_eq!(got, id);
                assert!((rect.x - 0.25).abs() < 1e-4, "{rect:?}");
                assert!((rect.y - 0.225).abs() < 1e-4, "{rect:?}");
                assert!((rect.w - 0.3).abs() < 1e-4, "{rect:?}");
                assert!((rect.h - 0.25).abs() < 1e-4, "{rect:?}");
            }
            other => panic!("expected update, got {other:?}"),
        }
        assert!(state.session.is_none());
    }

    #[test]
    fn test_drag_keeps_tracking_past_the_canvas_edge() {
        let mut items = BoxCollection::new();
        let id = items.add(RelBox::new(0.2, 0.2, 0.3, 0.25), garment());
        let photo = photo_1000x800();
        let editor = GarmentEditor {
            photo: Some(&photo),
            items: &items,
            mode: EditorMode::Select,
            shift_down: false,
            epoch: 1,
        };
        let mut state = StageState::default();

        editor.update(
            &mut state,
            pressed(),
            bounds(),
            Cursor::Available(Point::new(150.0, 120.0)),
        );
        // Pointer runs off the right edge; the move clamps at the image
        // boundary instead of being lost.
        editor.update(
            &mut state,
            moved(900.0, 120.0),
            bounds(),
            Cursor::Available(Point::new(900.0, 120.0)),
        );
        let (_, message) = editor.update(&mut state, released(), bounds(), Cursor::Unavailable);
        match message {
            Some(EditorEvent::Committed(Commit::Update { id: got, rect })) => {
                assert_eq!(got, id);
                assert!((rect.x + rect.w - 1.0).abs() < 1e-4, "{rect:?}");
                assert!((rect.y - 0.2).abs() < 1e-4, "{rect:?}");
            }
            other => panic!("expected update, got {other:?}"),
        }
    }

    #[test]
    fn test_stale_epoch_discards_on_release() {
        let mut items = BoxCollection::new();
        items.add(RelBox::new(0.2, 0.2, 0.3, 0.25), garment());
        let photo = photo_1000x800();
        let mut state = StageState::default();
        {
            let editor = GarmentEditor {
                photo: Some(&photo),
                items: &items,
                mode: EditorMode::Select,
                shift_down: false,
                epoch: 1,
            };
            editor.update(
                &mut state,
                pressed(),
                bounds(),
                Cursor::Available(Point::new(150.0, 120.0)),
            );
        }
        // The image switched mid-drag.
        let editor = GarmentEditor {
            photo: Some(&photo),
            items: &items,
            mode: EditorMode::Select,
            shift_down: false,
            epoch: 2,
        };
        let (_, message) = editor.update(
            &mut state,
            released(),
            bounds(),
            Cursor::Available(Point::new(175.0, 130.0)),
        );
        assert_eq!(message, Some(EditorEvent::Committed(Commit::Discard)));
    }
}
