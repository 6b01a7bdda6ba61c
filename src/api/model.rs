//! Wire records for the closet services.
//!
//! Geometry on the wire is the canonical relative form (`box_x..box_h`,
//! fractions of the owning image). One legacy collaborator still emits
//! corner-pixel boxes; [`ItemRecord::from_corner_pixels`] is the single,
//! versioned conversion point for that shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geometry::{Corners, RelBox, Size};

/// An uploaded clothing photo as the image store describes it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ImageRecord {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub width: f32,
    #[serde(default)]
    pub height: f32,
    /// Upload size in bytes, when the server reports it.
    #[serde(default)]
    pub size: Option<u64>,
}

impl ImageRecord {
    /// Natural dimensions; a record without known dimensions acts as 1x1
    /// until the pixels are decoded locally.
    pub fn natural_size(&self) -> Size {
        Size::new(self.width, self.height).sanitized()
    }
}

/// A garment region tied to an image, geometry in relative form.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ItemRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub image_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub caption: String,
    /// Which detector/upload produced this item.
    #[serde(default)]
    pub source: Option<String>,
    pub box_x: f32,
    pub box_y: f32,
    pub box_w: f32,
    pub box_h: f32,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl ItemRecord {
    pub fn rect(&self) -> RelBox {
        RelBox::new(self.box_x, self.box_y, self.box_w, self.box_h)
    }

    pub fn set_rect(&mut self, rect: RelBox) {
        self.box_x = rect.x;
        self.box_y = rect.y;
        self.box_w = rect.w;
        self.box_h = rect.h;
    }

    /// Convert a v1 corner-pixel item into the canonical relative form.
    /// Corner order is not trusted; `natural` is the owning image's size.
    pub fn from_corner_pixels(v1: CornerItemV1, natural: Size) -> Self {
        let corners = Corners {
            x0: v1.bbox_x0,
            y0: v1.bbox_y0,
            x1: v1.bbox_x1,
            y1: v1.bbox_y1,
        };
        let rect = corners.to_relative(natural).clamped();
        Self {
            id: v1.id,
            image_id: v1.image_id,
            kind: v1.kind,
            caption: v1.caption,
            source: v1.source,
            box_x: rect.x,
            box_y: rect.y,
            box_w: rect.w,
            box_h: rect.h,
            created_at: v1.created_at,
        }
    }
}

/// Legacy detection-service item shape: absolute corners in natural pixels.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct CornerItemV1 {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub image_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub source: Option<String>,
    pub bbox_x0: f32,
    pub bbox_y0: f32,
    pub bbox_x1: f32,
    pub bbox_y1: f32,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Payload for `POST /recommendations`.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RecommendationRequest {
    pub selected_item_ids: Vec<String>,
    pub query: String,
    pub occasions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<String>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
pub struct RecommendationResponse {
    #[serde(default)]
    pub outfits: Vec<Outfit>,
}

/// One ranked outfit candidate.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Outfit {
    #[serde(default)]
    pub id: Option<String>,
    pub score: f32,
    #[serde(default)]
    pub items: Vec<OutfitItem>,
    #[serde(default)]
    pub explanation: String,
}

/// A garment cutout inside an outfit; `src` is the image composited during
/// try-on.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct OutfitItem {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub category: String,
    pub src: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct TryOnResponse {
    pub result: TryOnResult,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct TryOnResult {
    pub result_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_record_wire_shape() {
        let json = r#"{
            "id": "it_1",
            "type": "shirt",
            "caption": "blue flannel",
            "box_x": 0.1, "box_y": 0.2, "box_w": 0.3, "box_h": 0.25
        }"#;
        let item: ItemRecord = serde_json::from_str(json).unwrap();
        assert_eq!(item.kind, "shirt");
        assert_eq!(item.rect(), RelBox::new(0.1, 0.2, 0.3, 0.25));

        // `type` keyword round-trips through the rename.
        let back = serde_json::to_string(&item).unwrap();
        assert!(back.contains("\"type\":\"shirt\""));
    }

    #[test]
    fn test_corner_pixel_conversion() {
        let v1: CornerItemV1 = serde_json::from_str(
            r#"{"type": "pants", "bbox_x0": 300, "bbox_y0": 400, "bbox_x1": 100, "bbox_y1": 160}"#,
        )
        .unwrap();
        let item = ItemRecord::from_corner_pixels(v1, Size::new(1000.0, 800.0));
        // Corners arrive in the wrong order and are normalized.
        assert_eq!(item.rect(), RelBox::new(0.1, 0.2, 0.2, 0.3));
    }

    #[test]
    fn test_recommendation_response_tolerates_missing_fields() {
        let resp: RecommendationResponse = serde_json::from_str(
            r#"{"outfits": [{"score": 0.92, "items": [{"title": "Blue Denim Jacket", "src": "https://x/jacket.png"}]}]}"#,
        )
        .unwrap();
        assert_eq!(resp.outfits.len(), 1);
        assert_eq!(resp.outfits[0].items[0].title, "Blue Denim Jacket");
        assert!(resp.outfits[0].explanation.is_empty());
    }

    #[test]
    fn test_unknown_image_dimensions_act_as_unit() {
        let record: ImageRecord =
            serde_json::from_str(r#"{"id": "im_1", "url": "http://x/1.jpg"}"#).unwrap();
        assert_eq!(record.natural_size(), Size::new(1.0, 1.0));
    }
}
