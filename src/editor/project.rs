//! Projection of logical box geometry onto the screen.
//!
//! Pure functions from canonical geometry plus the current display rectangle
//! to widget-space rectangles. Nothing here is cached: a viewport resize
//! changes the display rectangle and the next frame re-derives everything.

use iced::{Point, Rectangle};

use crate::geometry::{DisplayRect, RelBox};
use crate::editor::session::Handle;

/// Side length of a resize handle, in display pixels. Handles are centered
/// on the box edge so half of each sits outside the stroked border.
pub const HANDLE_SIZE: f32 = 12.0;

/// Map a relative box to its on-screen rectangle in widget coordinates.
pub fn project(rect: RelBox, display: &DisplayRect) -> Rectangle {
    Rectangle {
        x: display.x + rect.x * display.width,
        y: display.y + rect.y * display.height,
        width: rect.w * display.width,
        height: rect.h * display.height,
    }
}

/// Handle rectangles for a projected box: four corners plus four edge
/// midpoints.
pub fn handles(frame: Rectangle) -> [(Handle, Rectangle); 8] {
    let cx = frame.x + frame.width / 2.0;
    let cy = frame.y + frame.height / 2.0;
    let right = frame.x + frame.width;
    let bottom = frame.y + frame.height;
    [
        (Handle::NorthWest, centered(frame.x, frame.y)),
        (Handle::North, centered(cx, frame.y)),
        (Handle::NorthEast, centered(right, frame.y)),
        (Handle::East, centered(right, cy)),
        (Handle::SouthEast, centered(right, bottom)),
        (Handle::South, centered(cx, bottom)),
        (Handle::SouthWest, centered(frame.x, bottom)),
        (Handle::West, centered(frame.x, cy)),
    ]
}

fn centered(x: f32, y: f32) -> Rectangle {
    Rectangle {
        x: x - HANDLE_SIZE / 2.0,
        y: y - HANDLE_SIZE / 2.0,
        width: HANDLE_SIZE,
        height: HANDLE_SIZE,
    }
}

/// Which resize handle of a projected box, if any, is under the pointer.
pub fn hit_handle(point: Point, frame: Rectangle) -> Option<Handle> {
    handles(frame)
        .into_iter()
        .find(|(_, rect)| rect.contains(point))
        .map(|(handle, _)| handle)
}

/// The topmost box under the pointer, from `(id, rect)` pairs in draw order.
pub fn hit_box<I>(point: Point, boxes: I, display: &DisplayRect) -> Option<u64>
where
    I: DoubleEndedIterator<Item = (u64, RelBox)>,
{
    boxes
        .rev()
        .find(|(_, rect)| project(*rect, display).contains(point))
        .map(|(id, _)| id)
}
