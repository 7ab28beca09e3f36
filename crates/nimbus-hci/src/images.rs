//! Image catalog endpoints

use crate::client::HciClient;
use crate::error::Result;
use crate::models::{ImageCreateRequest, ImageSummary, TaskRef, entities};
use reqwest::multipart::{Form, Part};
use serde_json::Value;

/// Handler for image operations
pub struct ImageHandler {
    client: HciClient,
}

impl ImageHandler {
    pub fn new(client: HciClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<ImageSummary>> {
        let body = self.client.get("/v2/images").await?;
        entities(&body)
    }

    pub async fn get(&self, uuid: &str) -> Result<Value> {
        self.client.get(&format!("/v2/images/{}", uuid)).await
    }

    /// Create an image. With `source_uri` set the backend pulls the
    /// content itself; otherwise follow up with [`upload`](Self::upload).
    pub async fn create(&self, request: &ImageCreateRequest) -> Result<TaskRef> {
        let body = self.client.post("/v2/images", request).await?;
        TaskRef::from_response(&body)
    }

    /// Upload image content from a local file's bytes
    pub async fn upload(&self, uuid: &str, file_name: &str, content: Vec<u8>) -> Result<TaskRef> {
        let part = Part::bytes(content).file_name(file_name.to_string());
        let form = Form::new().part("file", part);
        let body = self
            .client
            .put_multipart(&format!("/v2/images/{}/upload", uuid), form)
            .await?;
        TaskRef::from_response(&body)
    }

    pub async fn delete(&self, uuid: &str) -> Result<TaskRef> {
        let body = self.client.delete(&format!("/v2/images/{}", uuid)).await?;
        TaskRef::from_response(&body)
    }
}
