//! Coordinate spaces and conversions for the box editors.
//!
//! Three spaces are in play:
//! - *natural* pixels: an image's true width/height, independent of rendering
//! - *relative* fractions: `[0,1]` coordinates over the image, the canonical
//!   storage form (survives any resolution change)
//! - *display* pixels: the on-screen rectangle the image is drawn into, which
//!   varies with window size and letterboxing
//!
//! Everything here is a pure function; the gesture and projection layers are
//! built on top of these.

use serde::{Deserialize, Serialize};

/// A width/height pair, used for both natural and display extents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// An unloaded image is treated as 1x1 so conversions stay finite.
    /// The resulting geometry is degenerate but never divides by zero.
    pub fn sanitized(self) -> Self {
        Self {
            width: self.width.max(1.0),
            height: self.height.max(1.0),
        }
    }
}

/// A box in relative (unit-interval) coordinates over an image.
///
/// Invariants after every mutation: `w > 0`, `h > 0`, `x + w <= 1`,
/// `y + h <= 1`. The gesture layer enforces this by clamping at every
/// intermediate step, not only on commit.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct RelBox {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

/// A box in natural image pixels, top-left + size form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelBox {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

/// A box in natural image pixels, two-corner form. Some collaborators still
/// emit this shape (`bbox_x0..bbox_y1`); it carries the same information.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Corners {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

/// The on-screen rectangle an image is actually drawn into, in the
/// coordinate system of its widget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl DisplayRect {
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && y >= self.y && x <= self.x + self.width && y <= self.y + self.height
    }

    /// Translate a widget-space point into display space (origin at the
    /// drawn image's top-left), clamped to the image area.
    pub fn to_local(&self, x: f32, y: f32) -> (f32, f32) {
        (
            (x - self.x).clamp(0.0, self.width),
            (y - self.y).clamp(0.0, self.height),
        )
    }
}

impl RelBox {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Multiply each fractional field by the image dimension, rounding to
    /// whole pixels.
    pub fn to_pixels(self, natural: Size) -> PixelBox {
        let natural = natural.sanitized();
        PixelBox {
            x: (self.x * natural.width).round(),
            y: (self.y * natural.height).round(),
            w: (self.w * natural.width).round(),
            h: (self.h * natural.height).round(),
        }
    }

    /// Corner-form equivalent in natural pixels.
    pub fn to_corners(self, natural: Size) -> Corners {
        let px = self.to_pixels(natural);
        Corners {
            x0: px.x,
            y0: px.y,
            x1: px.x + px.w,
            y1: px.y + px.h,
        }
    }

    /// Clamp into the unit square, shrinking only when the box itself is
    /// larger than the image.
    pub fn clamped(self) -> Self {
        let w = self.w.clamp(0.0, 1.0);
        let h = self.h.clamp(0.0, 1.0);
        Self {
            x: self.x.clamp(0.0, 1.0 - w),
            y: self.y.clamp(0.0, 1.0 - h),
            w,
            h,
        }
    }
}

impl PixelBox {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Divide by the image dimensions. No rounding: fractions keep full
    /// precision so they survive round-trips through other resolutions.
    pub fn to_relative(self, natural: Size) -> RelBox {
        let natural = natural.sanitized();
        RelBox {
            x: self.x / natural.width,
            y: self.y / natural.height,
            w: self.w / natural.width,
            h: self.h / natural.height,
        }
    }

    /// Clamp the top-left so the box stays inside the image without changing
    /// its size (the move-gesture rule).
    pub fn clamp_position(self, natural: Size) -> Self {
        let natural = natural.sanitized();
        Self {
            x: self.x.clamp(0.0, (natural.width - self.w).max(0.0)),
            y: self.y.clamp(0.0, (natural.height - self.h).max(0.0)),
            ..self
        }
    }
}

impl Corners {
    /// Normalize to top-left/size form. Uses min/max of the two corners, so
    /// the input order never matters and `w`/`h` come out non-negative.
    pub fn to_pixels(self) -> PixelBox {
        let x0 = self.x0.min(self.x1);
        let y0 = self.y0.min(self.y1);
        let x1 = self.x0.max(self.x1);
        let y1 = self.y0.max(self.y1);
        PixelBox {
            x: x0,
            y: y0,
            w: x1 - x0,
            h: y1 - y0,
        }
    }

    pub fn to_relative(self, natural: Size) -> RelBox {
        self.to_pixels().to_relative(natural)
    }
}

/// Scale a point from display space into natural image pixels. The two axes
/// only scale differently when the drawn rectangle does not preserve the
/// image's aspect ratio.
pub fn display_to_natural(x: f32, y: f32, display: Size, natural: Size) -> (f32, f32) {
    let display = display.sanitized();
    let natural = natural.sanitized();
    (
        x * natural.width / display.width,
        y * natural.height / display.height,
    )
}

/// Inverse of [`display_to_natural`].
pub fn natural_to_display(x: f32, y: f32, display: Size, natural: Size) -> (f32, f32) {
    let display = display.sanitized();
    let natural = natural.sanitized();
    (
        x * display.width / natural.width,
        y * display.height / natural.height,
    )
}

/// Compute where an image lands inside a widget's bounds under
/// object-fit: contain (centered, aspect preserved, letterboxed).
pub fn fit_rect(bounds: Size, natural: Size) -> DisplayRect {
    let bounds = bounds.sanitized();
    let natural = natural.sanitized();
    let scale = (bounds.width / natural.width).min(bounds.height / natural.height);
    let width = natural.width * scale;
    let height = natural.height * scale;
    DisplayRect {
        x: (bounds.width - width) / 2.0,
        y: (bounds.height - height) / 2.0,
        width,
        height,
    }
}
