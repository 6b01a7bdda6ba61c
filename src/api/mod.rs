//! HTTP client for the external closet services.
//!
//! Four collaborators sit behind one base URL: the image store, the item
//! store, the recommendation service and the try-on render service. This
//! client only moves records; it never owns view state, and callers decide
//! what a failure means for the screen they drive.

pub mod model;

use serde_json::json;

use model::{
    ImageRecord, ItemRecord, RecommendationRequest, RecommendationResponse, TryOnResponse,
};

const IMAGES_PATH: &str = "/api/closet/images/";
const ITEMS_PATH: &str = "/api/closet/items/";
const RECOMMENDATIONS_PATH: &str = "/api/closet/recommendations/";
const TRYON_PATH: &str = "/api/closet/tryon/";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{context}: server returned {status}")]
    Status {
        context: &'static str,
        status: reqwest::StatusCode,
    },
}

#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    base: String,
}

impl Client {
    pub fn new(base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            http: reqwest::Client::new(),
            base: base.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn ok(
        context: &'static str,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(ApiError::Status { context, status })
        }
    }

    // ---- Image store ----

    pub async fn list_images(&self) -> Result<Vec<ImageRecord>, ApiError> {
        let response = self.http.get(self.url(IMAGES_PATH)).send().await?;
        Ok(Self::ok("list images", response).await?.json().await?)
    }

    pub async fn get_image(&self, id: &str) -> Result<ImageRecord, ApiError> {
        let url = format!("{}get-image", self.url(IMAGES_PATH));
        let response = self.http.get(url).query(&[("id", id)]).send().await?;
        Ok(Self::ok("get image", response).await?.json().await?)
    }

    /// Upload one or more photos as the `files` multipart field.
    pub async fn upload_images(&self, files: Vec<(String, Vec<u8>)>) -> Result<(), ApiError> {
        let mut form = reqwest::multipart::Form::new();
        for (name, bytes) in files {
            let part = reqwest::multipart::Part::bytes(bytes).file_name(name);
            form = form.part("files", part);
        }
        let response = self
            .http
            .post(self.url(IMAGES_PATH))
            .multipart(form)
            .send()
            .await?;
        Self::ok("upload images", response).await?;
        Ok(())
    }

    pub async fn delete_image(&self, id: &str) -> Result<(), ApiError> {
        let response = self
            .http
            .delete(self.url(IMAGES_PATH))
            .json(&json!({ "id": id }))
            .send()
            .await?;
        Self::ok("delete image", response).await?;
        Ok(())
    }

    // ---- Item store ----

    pub async fn list_items(&self) -> Result<Vec<ItemRecord>, ApiError> {
        let response = self.http.get(self.url(ITEMS_PATH)).send().await?;
        Ok(Self::ok("list items", response).await?.json().await?)
    }

    /// Create or update a garment record; the server keys on `id`.
    pub async fn save_item(&self, item: &ItemRecord) -> Result<(), ApiError> {
        let response = self
            .http
            .post(self.url(ITEMS_PATH))
            .json(item)
            .send()
            .await?;
        Self::ok("save item", response).await?;
        Ok(())
    }

    pub async fn delete_item(&self, id: &str) -> Result<(), ApiError> {
        let response = self
            .http
            .delete(self.url(ITEMS_PATH))
            .json(&json!({ "id": id }))
            .send()
            .await?;
        Self::ok("delete item", response).await?;
        Ok(())
    }

    // ---- Recommendation service ----

    pub async fn recommend(
        &self,
        request: &RecommendationRequest,
    ) -> Result<RecommendationResponse, ApiError> {
        let response = self
            .http
            .post(self.url(RECOMMENDATIONS_PATH))
            .json(request)
            .send()
            .await?;
        Ok(Self::ok("recommend", response).await?.json().await?)
    }

    // ---- Try-on render service ----

    pub async fn try_on(
        &self,
        photo: Vec<u8>,
        outfit_id: &str,
    ) -> Result<TryOnResponse, ApiError> {
        let form = reqwest::multipart::Form::new()
            .part(
                "photo",
                reqwest::multipart::Part::bytes(photo).file_name("photo.png"),
            )
            .text("outfit_id", outfit_id.to_string());
        let response = self
            .http
            .post(self.url(TRYON_PATH))
            .multipart(form)
            .send()
            .await?;
        Ok(Self::ok("try on", response).await?.json().await?)
    }

    // ---- Raw fetches (photos, garment cutouts) ----

    /// Fetch image bytes from an absolute URL, or one relative to the
    /// server base.
    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        let absolute = if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!("{}/{}", self.base, url.trim_start_matches('/'))
        };
        let response = self.http.get(absolute).send().await?;
        let bytes = Self::ok("fetch image", response).await?.bytes().await?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_normalized() {
        let client = Client::new("http://localhost:8000/");
        assert_eq!(
            client.url(IMAGES_PATH),
            "http://localhost:8000/api/closet/images/"
        );
    }

    #[test]
    fn test_recommendation_request_skips_empty_options() {
        let request = RecommendationRequest {
            selected_item_ids: vec!["it_1".into()],
            query: "casual coffee date".into(),
            occasions: vec!["casual".into()],
            source: None,
            budget: None,
        };
        let body = serde_json::to_string(&request).unwrap();
        assert!(!body.contains("budget"));
        assert!(!body.contains("source"));
    }
}
