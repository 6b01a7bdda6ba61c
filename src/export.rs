//! Composite export engine for the try-on stage.
//!
//! Flattens the user photo plus every overlay into one raster at the photo's
//! *natural* resolution. Overlay geometry is stored relatively, so export
//! multiplies fractions straight by the natural dimensions; the on-screen
//! display size at export time is irrelevant.

use std::path::PathBuf;

use image::imageops::{self, FilterType};
use image::RgbaImage;

use crate::geometry::{RelBox, Size};

pub const EXPORT_FILE_NAME: &str = "tryon.png";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("no user photo to export")]
    MissingPhoto,
    #[error("could not decode the user photo: {0}")]
    BadPhoto(#[from] image::ImageError),
    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        source: image::ImageError,
    },
}

/// One overlay ready for compositing. `image` is `None` when the source
/// failed to fetch or decode; such layers are skipped, not fatal.
#[derive(Debug, Clone)]
pub struct OverlayLayer {
    pub rect: RelBox,
    pub image: Option<RgbaImage>,
}

/// Decode fetched overlay bytes, mapping failures to skippable layers.
pub fn decode_layers(overlays: Vec<(RelBox, Option<Vec<u8>>)>) -> Vec<OverlayLayer> {
    overlays
        .into_iter()
        .map(|(rect, bytes)| {
            let image = bytes.and_then(|bytes| match image::load_from_memory(&bytes) {
                Ok(decoded) => Some(decoded.to_rgba8()),
                Err(err) => {
                    log::warn!("overlay skipped, decode failed: {err}");
                    None
                }
            });
            OverlayLayer { rect, image }
        })
        .collect()
}

/// Rasterize the composite: base drawn to fill the canvas exactly, then each
/// overlay resized into its natural-pixel rectangle, in insertion order so
/// later overlays draw on top.
pub fn compose(base: &RgbaImage, layers: &[OverlayLayer]) -> RgbaImage {
    let mut canvas = base.clone();
    let natural = Size::new(base.width() as f32, base.height() as f32);

    for layer in layers {
        let Some(source) = &layer.image else {
            log::warn!("overlay at {:?} has no image, skipping", layer.rect);
            continue;
        };
        let px = layer.rect.to_pixels(natural);
        if px.w < 1.0 || px.h < 1.0 {
            continue;
        }
        let resized = imageops::resize(source, px.w as u32, px.h as u32, FilterType::Triangle);
        imageops::overlay(&mut canvas, &resized, px.x as i64, px.y as i64);
    }

    canvas
}

/// Full export: decode the base photo, flatten, write a PNG.
///
/// All overlay loads have already resolved (or failed) before this runs, so
/// the composite is never partial: failed layers are dropped up front.
pub async fn export_png(
    photo_bytes: Vec<u8>,
    overlays: Vec<(RelBox, Option<Vec<u8>>)>,
    path: PathBuf,
) -> Result<PathBuf, ExportError> {
    if photo_bytes.is_empty() {
        return Err(ExportError::MissingPhoto);
    }
    let base = image::load_from_memory(&photo_bytes)?.to_rgba8();
    let layers = decode_layers(overlays);

    let composite = compose(&base, &layers);
    composite.save(&path).map_err(|source| ExportError::Write {
        path: path.clone(),
        source,
    })?;

    log::info!(
        "exported {}x{} composite with {} overlay(s) to {}",
        composite.width(),
        composite.height(),
        layers.iter().filter(|l| l.image.is_some()).count(),
        path.display()
    );
    Ok(path)
}

/// Default output location: the user's download directory, falling back to
/// the home directory, then the working directory.
pub fn default_export_path() -> PathBuf {
    dirs::download_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(EXPORT_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid(width: u32, height: u32, color: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba(color))
    }

    const WHITE: [u8; 4] = [255, 255, 255, 255];
    const RED: [u8; 4] = [255, 0, 0, 255];
    const BLUE: [u8; 4] = [0, 0, 255, 255];

    #[test]
    fn test_overlay_lands_at_natural_resolution() {
        // Base 1200x1600, overlay {0.35, 0.2, 0.3, 0.3} -> {420, 320, 360, 480}.
        let base = solid(1200, 1600, WHITE);
        let layers = [OverlayLayer {
            rect: RelBox::new(0.35, 0.2, 0.3, 0.3),
            image: Some(solid(50, 50, RED)),
        }];
        let out = compose(&base, &layers);

        assert_eq!(out.dimensions(), (1200, 1600));
        // Inside the overlay rectangle.
        assert_eq!(out.get_pixel(420, 320).0, RED);
        assert_eq!(out.get_pixel(779, 799).0, RED);
        assert_eq!(out.get_pixel(600, 500).0, RED);
        // Just outside each edge.
        assert_eq!(out.get_pixel(419, 320).0, WHITE);
        assert_eq!(out.get_pixel(420, 319).0, WHITE);
        assert_eq!(out.get_pixel(780, 799).0, WHITE);
        assert_eq!(out.get_pixel(779, 800).0, WHITE);
    }

    #[test]
    fn test_failed_overlay_is_skipped_not_fatal() {
        let base = solid(100, 100, WHITE);
        let layers = [
            OverlayLayer {
                rect: RelBox::new(0.0, 0.0, 0.5, 0.5),
                image: None,
            },
            OverlayLayer {
                rect: RelBox::new(0.5, 0.5, 0.5, 0.5),
                image: Some(solid(10, 10, RED)),
            },
        ];
        let out = compose(&base, &layers);
        // The dead layer leaves the base untouched, the live one draws.
        assert_eq!(out.get_pixel(10, 10).0, WHITE);
        assert_eq!(out.get_pixel(75, 75).0, RED);
    }

    #[test]
    fn test_later_overlays_draw_on_top() {
        let base = solid(100, 100, WHITE);
        let layers = [
            OverlayLayer {
                rect: RelBox::new(0.0, 0.0, 0.6, 0.6),
                image: Some(solid(10, 10, RED)),
            },
            OverlayLayer {
                rect: RelBox::new(0.2, 0.2, 0.6, 0.6),
                image: Some(solid(10, 10, BLUE)),
            },
        ];
        let out = compose(&base, &layers);
        assert_eq!(out.get_pixel(10, 10).0, RED);
        // Overlap region: the later layer wins.
        assert_eq!(out.get_pixel(40, 40).0, BLUE);
    }

    #[test]
    fn test_undecodable_bytes_become_skippable_layer() {
        let layers = decode_layers(vec![
            (RelBox::new(0.0, 0.0, 0.5, 0.5), Some(vec![0xde, 0xad])),
            (RelBox::new(0.5, 0.5, 0.5, 0.5), None),
        ]);
        assert_eq!(layers.len(), 2);
        assert!(layers.iter().all(|l| l.image.is_none()));
    }

    #[test]
    fn test_degenerate_overlay_rect_is_ignored() {
        let base = solid(100, 100, WHITE);
        let layers = [OverlayLayer {
            rect: RelBox::new(0.5, 0.5, 0.0, 0.0),
            image: Some(solid(10, 10, RED)),
        }];
        let out = compose(&base, &layers);
        assert_eq!(out.get_pixel(50, 50).0, WHITE);
    }
}
