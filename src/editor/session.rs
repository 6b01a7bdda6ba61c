//! The drag/gesture state machine.
//!
//! A [`DragSession`] exists only between pointer-down and pointer-up. It
//! holds a working copy of one box's geometry and never touches the entity
//! collection itself: live geometry is recomputed from the session plus the
//! current pointer on every frame, and a single [`Commit`] is produced at
//! release. Deleting the target box or switching images mid-gesture simply
//! makes the commit a no-op.

use crate::geometry::{display_to_natural, PixelBox, RelBox, Size};

/// A draw gesture smaller than this (per axis, in display pixels) is
/// discarded instead of creating a box, so accidental clicks don't leave
/// zero-size boxes behind.
pub const MIN_DRAW_EXTENT: f32 = 6.0;

/// Resize affordances: four corners plus four edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handle {
    NorthWest,
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
}

impl Handle {
    /// Which edge each axis drags: -1 = left/top, +1 = right/bottom,
    /// 0 = that axis is not dragged.
    fn dirs(self) -> (i8, i8) {
        match self {
            Handle::NorthWest => (-1, -1),
            Handle::North => (0, -1),
            Handle::NorthEast => (1, -1),
            Handle::East => (1, 0),
            Handle::SouthEast => (1, 1),
            Handle::South => (0, 1),
            Handle::SouthWest => (-1, 1),
            Handle::West => (-1, 0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum DragKind {
    Move,
    Resize(Handle),
    Draw,
}

/// Everything a session needs to map pointer positions to natural pixels.
#[derive(Debug, Clone, Copy)]
pub struct GestureContext {
    /// Size of the on-screen rectangle the image is drawn into.
    pub display: Size,
    /// The image's natural dimensions.
    pub natural: Size,
    /// Minimum box size during a resize, in natural pixels.
    pub min_box: Size,
}

impl GestureContext {
    pub fn new(display: Size, natural: Size) -> Self {
        Self {
            display,
            natural,
            min_box: Size::new(1.0, 1.0),
        }
    }

    pub fn with_min_box(mut self, min_box: Size) -> Self {
        self.min_box = min_box;
        self
    }
}

/// The result of finishing a gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Commit {
    /// Write the final geometry back to an existing box.
    Update { id: u64, rect: RelBox },
    /// A draw gesture produced a new box.
    Create { rect: RelBox },
    /// Too small, or the session was invalidated; nothing to write.
    Discard,
}

/// One in-progress pointer interaction.
#[derive(Debug, Clone)]
pub struct DragSession {
    kind: DragKind,
    /// Target box, `None` while drawing a new one.
    target: Option<u64>,
    /// Pointer-down position in display space, local to the drawn image.
    start: (f32, f32),
    /// Target geometry at pointer-down, in natural pixels.
    origin: PixelBox,
    /// Width:height ratio at pointer-down, preserved under aspect lock.
    aspect: f32,
    aspect_locked: bool,
    /// Editor generation at pointer-down. Switching to another image bumps
    /// the generation, which invalidates any session started before it.
    epoch: u64,
}

impl DragSession {
    pub fn begin_move(id: u64, origin: PixelBox, pointer: (f32, f32), epoch: u64) -> Self {
        Self {
            kind: DragKind::Move,
            target: Some(id),
            start: pointer,
            aspect: aspect_of(origin),
            origin,
            aspect_locked: false,
            epoch,
        }
    }

    pub fn begin_resize(
        id: u64,
        origin: PixelBox,
        handle: Handle,
        pointer: (f32, f32),
        aspect_locked: bool,
        epoch: u64,
    ) -> Self {
        Self {
            kind: DragKind::Resize(handle),
            target: Some(id),
            start: pointer,
            aspect: aspect_of(origin),
            origin,
            aspect_locked,
            epoch,
        }
    }

    pub fn begin_draw(pointer: (f32, f32), epoch: u64) -> Self {
        Self {
            kind: DragKind::Draw,
            target: None,
            start: pointer,
            origin: PixelBox::new(0.0, 0.0, 0.0, 0.0),
            aspect: 1.0,
            aspect_locked: false,
            epoch,
        }
    }

    pub fn target(&self) -> Option<u64> {
        self.target
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_draw(&self) -> bool {
        self.kind == DragKind::Draw
    }

    /// Live geometry for the current pointer position, in natural pixels.
    ///
    /// Pure: called on every pointer-move (and by the renderer on every
    /// frame) without mutating anything. The result is always fully inside
    /// the image bounds.
    pub fn live_box(&self, pointer: (f32, f32), ctx: &GestureContext) -> PixelBox {
        let natural = ctx.natural.sanitized();
        match self.kind {
            DragKind::Move => {
                let (ddx, ddy) = (pointer.0 - self.start.0, pointer.1 - self.start.1);
                let (ndx, ndy) = display_to_natural(ddx, ddy, ctx.display, natural);
                PixelBox {
                    x: self.origin.x + ndx.round(),
                    y: self.origin.y + ndy.round(),
                    ..self.origin
                }
                .clamp_position(natural)
            }
            DragKind::Resize(handle) => self.resized(handle, pointer, ctx),
            DragKind::Draw => {
                let (sx, sy) = to_natural(self.start, ctx);
                let (cx, cy) = to_natural(pointer, ctx);
                PixelBox {
                    x: sx.min(cx),
                    y: sy.min(cy),
                    w: (cx - sx).abs(),
                    h: (cy - sy).abs(),
                }
            }
        }
    }

    fn resized(&self, handle: Handle, pointer: (f32, f32), ctx: &GestureContext) -> PixelBox {
        let natural = ctx.natural.sanitized();
        let (dx, dy) = handle.dirs();
        let (px, py) = to_natural(pointer, ctx);

        let o = self.origin;
        let (x0, y0, x1, y1) = (o.x, o.y, o.x + o.w, o.y + o.h);

        // Extent measured from the fixed side toward the dragged one.
        let mut w = match dx {
            -1 => x1 - px,
            1 => px - x0,
            _ => o.w,
        };
        let mut h = match dy {
            -1 => y1 - py,
            1 => py - y0,
            _ => o.h,
        };
        w = w.max(ctx.min_box.width);
        h = h.max(ctx.min_box.height);

        // Room available on the dragged side before hitting the image edge.
        // Axes the handle doesn't drag can still change under aspect lock;
        // those grow away from the anchored top-left.
        let avail_w = if dx == -1 { x1 } else { natural.width - x0 };
        let avail_h = if dy == -1 { y1 } else { natural.height - y0 };

        if self.aspect_locked {
            // The dominant axis is the one the pointer changed the most,
            // relatively; the other is rescaled to the starting ratio.
            let horizontal = dx != 0
                && (dy == 0 || (w / o.w - 1.0).abs() >= (h / o.h - 1.0).abs());
            if horizontal {
                h = w / self.aspect;
            } else {
                w = h * self.aspect;
            }
            // Shrink uniformly so both axes fit, keeping the ratio intact.
            let scale = (avail_w / w).min(avail_h / h).min(1.0);
            w *= scale;
            h *= scale;
        } else {
            w = w.min(avail_w);
            h = h.min(avail_h);
        }

        PixelBox {
            x: if dx == -1 { x1 - w } else { x0 },
            y: if dy == -1 { y1 - h } else { y0 },
            w,
            h,
        }
    }

    /// Finish the gesture, producing the single write-back for this session.
    pub fn finish(&self, pointer: (f32, f32), ctx: &GestureContext) -> Commit {
        match (self.kind, self.target) {
            (DragKind::Draw, _) => {
                let spanned_x = (pointer.0 - self.start.0).abs() > MIN_DRAW_EXTENT;
                let spanned_y = (pointer.1 - self.start.1).abs() > MIN_DRAW_EXTENT;
                if spanned_x && spanned_y {
                    Commit::Create {
                        rect: self
                            .live_box(pointer, ctx)
                            .to_relative(ctx.natural)
                            .clamped(),
                    }
                } else {
                    Commit::Discard
                }
            }
            (_, Some(id)) => Commit::Update {
                id,
                rect: self
                    .live_box(pointer, ctx)
                    .to_relative(ctx.natural)
                    .clamped(),
            },
            (_, None) => Commit::Discard,
        }
    }
}

fn aspect_of(origin: PixelBox) -> f32 {
    origin.w.max(1.0) / origin.h.max(1.0)
}

/// Display-local point to natural pixels, clamped inside the image.
fn to_natural(pointer: (f32, f32), ctx: &GestureContext) -> (f32, f32) {
    let natural = ctx.natural.sanitized();
    let (x, y) = display_to_natural(pointer.0, pointer.1, ctx.display, natural);
    (x.clamp(0.0, natural.width), y.clamp(0.0, natural.height))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx_1000x800() -> GestureContext {
        // Display at half scale on both axes.
        GestureContext::new(Size::new(500.0, 400.0), Size::new(1000.0, 800.0))
    }

    #[test]
    fn test_move_translates_without_changing_size() {
        // Display delta (+25, +10) maps to (+50, +20) natural pixels.
        let session = DragSession::begin_move(
            7,
            PixelBox::new(100.0, 160.0, 300.0, 200.0),
            (200.0, 200.0),
            0,
        );
        let live = session.live_box((225.0, 210.0), &ctx_1000x800());
        assert_eq!(live, PixelBox::new(150.0, 180.0, 300.0, 200.0));
    }

    #[test]
    fn test_move_clamps_to_image_bounds() {
        let ctx = ctx_1000x800();
        let session = DragSession::begin_move(
            1,
            PixelBox::new(600.0, 500.0, 300.0, 200.0),
            (0.0, 0.0),
            0,
        );
        // Drag far past the bottom-right corner.
        let live = session.live_box((10_000.0, 10_000.0), &ctx);
        assert_eq!(live, PixelBox::new(700.0, 600.0, 300.0, 200.0));

        // And far past the top-left corner.
        let live = session.live_box((-10_000.0, -10_000.0), &ctx);
        assert_eq!(live, PixelBox::new(0.0, 0.0, 300.0, 200.0));
    }

    #[test]
    fn test_committed_move_stays_in_unit_square() {
        let ctx = ctx_1000x800();
        let session = DragSession::begin_move(
            1,
            PixelBox::new(600.0, 500.0, 300.0, 200.0),
            (0.0, 0.0),
            0,
        );
        match session.finish((2_000.0, -2_000.0), &ctx) {
            Commit::Update { id, rect } => {
                assert_eq!(id, 1);
                assert!(rect.x >= 0.0 && rect.y >= 0.0);
                assert!(rect.x + rect.w <= 1.0 + f32::EPSILON);
                assert!(rect.y + rect.h <= 1.0 + f32::EPSILON);
            }
            other => panic!("expected update, got {other:?}"),
        }
    }

    #[test]
    fn test_resize_southeast_follows_pointer() {
        let ctx = ctx_1000x800();
        let origin = PixelBox::new(100.0, 160.0, 300.0, 200.0);
        let session =
            DragSession::begin_resize(3, origin, Handle::SouthEast, (200.0, 180.0), false, 0);
        // Pointer at display (300, 280) -> natural (600, 560).
        let live = session.live_box((300.0, 280.0), &ctx);
        assert_eq!(live, PixelBox::new(100.0, 160.0, 500.0, 400.0));
    }

    #[test]
    fn test_resize_northwest_keeps_opposite_corner() {
        let ctx = ctx_1000x800();
        let origin = PixelBox::new(100.0, 160.0, 300.0, 200.0);
        let session =
            DragSession::begin_resize(3, origin, Handle::NorthWest, (50.0, 80.0), false, 0);
        let live = session.live_box((25.0, 40.0), &ctx);
        // Bottom-right corner (400, 360) must not move.
        assert_eq!(live.x + live.w, 400.0);
        assert_eq!(live.y + live.h, 360.0);
        assert_eq!(live, PixelBox::new(50.0, 80.0, 350.0, 280.0));
    }

    #[test]
    fn test_resize_enforces_minimum_size() {
        let ctx = ctx_1000x800();
        let origin = PixelBox::new(100.0, 160.0, 300.0, 200.0);
        let session =
            DragSession::begin_resize(3, origin, Handle::SouthEast, (0.0, 0.0), false, 0);
        // Drag the SE handle all the way past the NW corner.
        let live = session.live_box((0.0, 0.0), &ctx);
        assert_eq!(live.w, 1.0);
        assert_eq!(live.h, 1.0);
    }

    #[test]
    fn test_resize_never_leaves_the_image() {
        let ctx = ctx_1000x800();
        let origin = PixelBox::new(700.0, 500.0, 200.0, 200.0);
        let session =
            DragSession::begin_resize(3, origin, Handle::SouthEast, (450.0, 350.0), false, 0);
        let live = session.live_box((5_000.0, 5_000.0), &ctx);
        assert!(live.x + live.w <= 1000.0);
        assert!(live.y + live.h <= 800.0);
    }

    #[test]
    fn test_aspect_lock_preserves_starting_ratio() {
        let ctx = ctx_1000x800();
        let origin = PixelBox::new(100.0, 100.0, 300.0, 200.0); // ratio 1.5
        let session =
            DragSession::begin_resize(3, origin, Handle::SouthEast, (200.0, 150.0), true, 0);

        for pointer in [(400.0, 160.0), (260.0, 300.0), (350.0, 350.0)] {
            let live = session.live_box(pointer, &ctx);
            assert!(
                (live.w / live.h - 1.5).abs() < 1e-4,
                "ratio drifted at {pointer:?}: {live:?}"
            );
        }
    }

    #[test]
    fn test_aspect_lock_holds_even_when_clamped() {
        let ctx = ctx_1000x800();
        let origin = PixelBox::new(600.0, 500.0, 300.0, 200.0); // ratio 1.5
        let session =
            DragSession::begin_resize(3, origin, Handle::SouthEast, (450.0, 350.0), true, 0);
        let live = session.live_box((5_000.0, 5_000.0), &ctx);
        assert!(live.x + live.w <= 1000.0);
        assert!(live.y + live.h <= 800.0);
        assert!((live.w / live.h - 1.5).abs() < 1e-4, "{live:?}");
    }

    #[test]
    fn test_draw_normalizes_drag_direction() {
        let ctx = ctx_1000x800();
        // Drag up-left from the start point.
        let session = DragSession::begin_draw((200.0, 200.0), 0);
        let live = session.live_box((100.0, 120.0), &ctx);
        assert_eq!(live, PixelBox::new(200.0, 240.0, 200.0, 160.0));
    }

    #[test]
    fn test_tiny_draw_is_discarded() {
        let ctx = ctx_1000x800();
        let session = DragSession::begin_draw((200.0, 200.0), 0);
        // 5 display pixels of travel is below the threshold on both axes.
        assert_eq!(session.finish((205.0, 205.0), &ctx), Commit::Discard);
        // Even a long horizontal drag is discarded if the other axis is tiny.
        assert_eq!(session.finish((400.0, 203.0), &ctx), Commit::Discard);
    }

    #[test]
    fn test_big_enough_draw_creates_a_box() {
        let ctx = ctx_1000x800();
        let session = DragSession::begin_draw((100.0, 100.0), 0);
        match session.finish((200.0, 180.0), &ctx) {
            Commit::Create { rect } => {
                assert!((rect.x - 0.2).abs() < 1e-3);
                assert!((rect.y - 0.25).abs() < 1e-3);
                assert!((rect.w - 0.2).abs() < 1e-3);
                assert!((rect.h - 0.2).abs() < 1e-3);
            }
            other => panic!("expected create, got {other:?}"),
        }
    }
}
