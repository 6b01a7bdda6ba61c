/// Application state
///
/// One explicit state object per screen, passed into the gesture machine
/// and the canvases rather than captured ambiently:
/// - Image upload + garment box editing (closet.rs)
/// - Outfit recommendation requests (recommend.rs)
/// - Virtual try-on overlays and export (tryon.rs)
pub mod closet;
pub mod recommend;
pub mod tryon;

use iced::widget::image::Handle;

use crate::geometry::Size;

/// A photo with its pixels decoded: the iced handle for drawing plus the
/// natural dimensions, fixed at load time.
#[derive(Debug, Clone)]
pub struct LoadedPhoto {
    pub handle: Handle,
    pub natural: Size,
}

impl LoadedPhoto {
    /// Decode fetched bytes. The decode both validates the data and gives
    /// the authoritative natural dimensions (server records may omit them).
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, image::ImageError> {
        let decoded = image::load_from_memory(&bytes)?;
        let natural = Size::new(decoded.width() as f32, decoded.height() as f32);
        Ok(Self {
            handle: Handle::from_bytes(bytes),
            natural,
        })
    }
}
