use serde::{Deserialize, Serialize, Serializer};

use crate::form::Photo;

pub const DEFAULT_API_BASE: &str = "https://dall-e-wco9.onrender.com/api/v1";
pub const GENERATE_IMAGE_PATH: &str = "/dalle";
pub const POSTS_PATH: &str = "/posts";

/// Body of `POST {api_base}/dalle`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateImageRequest {
    pub prompt: String,
}

/// Reply of `POST {api_base}/dalle`: bare base64 image bytes, no data URI prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateImageResponse {
    pub photo: String,
}

/// Body of `POST {api_base}/posts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPost {
    pub name: String,
    pub prompt: String,
    pub photo: Photo,
}

/// Views the client can be sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    CreatePost,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::CreatePost => "/create-post",
        }
    }
}

impl Serialize for Route {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.path())
    }
}

pub fn endpoint_url(api_base: &str, path: &str) -> String {
    format!("{}{}", api_base.trim().trim_end_matches('/'), path)
}
