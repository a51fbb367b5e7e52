use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client as HttpClient;
use serde_json::Value;
use showcase_contracts::api::{
    endpoint_url, GenerateImageRequest, GenerateImageResponse, NewPost, GENERATE_IMAGE_PATH,
    POSTS_PATH,
};

use crate::api::{response_json_or_error, GalleryApi};

/// The gallery's REST endpoints. No retries. Requests wait until the server
/// answers or drops the connection; the blocking client's 30 second default
/// deadline is switched off because cold-starting image hosts exceed it.
pub struct HttpGalleryApi {
    api_base: String,
    http: HttpClient,
}

impl HttpGalleryApi {
    pub fn new(api_base: impl Into<String>) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(None::<Duration>)
            .build()
            .context("failed to build gallery HTTP client")?;
        Ok(Self {
            api_base: api_base.into(),
            http,
        })
    }

    fn generate_endpoint(&self) -> String {
        endpoint_url(&self.api_base, GENERATE_IMAGE_PATH)
    }

    fn posts_endpoint(&self) -> String {
        endpoint_url(&self.api_base, POSTS_PATH)
    }
}

impl GalleryApi for HttpGalleryApi {
    fn name(&self) -> &str {
        "http"
    }

    fn generate_image(&self, request: &GenerateImageRequest) -> Result<GenerateImageResponse> {
        let endpoint = self.generate_endpoint();
        let response = self
            .http
            .post(&endpoint)
            .json(request)
            .send()
            .with_context(|| format!("Image generation request failed ({endpoint})"))?;
        let payload = response_json_or_error("Image generation", response)?;
        serde_json::from_value(payload)
            .context("Image generation response did not include a `photo` string")
    }

    fn create_post(&self, post: &NewPost) -> Result<Value> {
        let endpoint = self.posts_endpoint();
        let response = self
            .http
            .post(&endpoint)
            .json(post)
            .send()
            .with_context(|| format!("Post creation request failed ({endpoint})"))?;
        response_json_or_error("Post creation", response)
    }
}
