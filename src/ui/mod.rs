/// Canvas widgets for the two box editors.
///
/// Both canvases are `canvas::Program<EditorEvent>`; the application maps
/// the events into its own message type, so the widgets know nothing about
/// networking or persistence.
pub mod closet_canvas;
pub mod tryon_canvas;

use iced::mouse::Cursor;
use iced::Rectangle;

use crate::editor::{Commit, DragSession};
use crate::geometry::DisplayRect;

/// What a canvas interaction produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EditorEvent {
    /// Pointer-down changed which box is selected.
    Selected(Option<u64>),
    /// A drag finished; geometry (if any) is ready to write back.
    Committed(Commit),
}

/// Per-canvas widget state.
///
/// The last seen pointer position is tracked alongside the session so a
/// release outside the canvas bounds still commits the geometry from the
/// most recent move instead of a fabricated position.
#[derive(Debug, Default)]
pub struct StageState {
    pub session: Option<DragSession>,
    /// Last pointer position, local to the drawn image.
    pub pointer: Option<(f32, f32)>,
}

/// Pointer position local to the drawn image, clamped into it. Unlike
/// `Cursor::position_in`, this keeps working while the pointer is outside
/// the canvas bounds, so a drag can run past the edge.
pub fn local_pointer(
    cursor: Cursor,
    bounds: Rectangle,
    display: &DisplayRect,
) -> Option<(f32, f32)> {
    let point = cursor.position()?;
    Some(display.to_local(point.x - bounds.x, point.y - bounds.y))
}
