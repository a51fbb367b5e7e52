use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use showcase_contracts::api::{GenerateImageRequest, GenerateImageResponse, NewPost};

use crate::api::GalleryApi;

const DRYRUN_IMAGE_DIM: u32 = 256;
const DRYRUN_JPEG_QUALITY: u8 = 90;

/// Offline backend: paints a solid tile whose colour is derived from the
/// prompt and keeps shared posts in memory.
#[derive(Debug, Default)]
pub struct DryrunGalleryApi {
    posts: Mutex<Vec<Value>>,
}

impl DryrunGalleryApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn posts(&self) -> Vec<Value> {
        self.posts
            .lock()
            .map(|posts| posts.clone())
            .unwrap_or_default()
    }
}

impl GalleryApi for DryrunGalleryApi {
    fn name(&self) -> &str {
        "dryrun"
    }

    fn generate_image(&self, request: &GenerateImageRequest) -> Result<GenerateImageResponse> {
        let bytes = dryrun_jpeg(&request.prompt, DRYRUN_IMAGE_DIM)?;
        Ok(GenerateImageResponse {
            photo: BASE64.encode(bytes),
        })
    }

    fn create_post(&self, post: &NewPost) -> Result<Value> {
        let mut posts = self
            .posts
            .lock()
            .map_err(|_| anyhow!("dryrun post store lock poisoned"))?;
        let record = json!({
            "_id": short_id(&post.name, &post.prompt, posts.len() as u64),
            "name": post.name,
            "prompt": post.prompt,
            "photo": post.photo,
        });
        posts.push(record.clone());
        Ok(json!({
            "success": true,
            "data": record,
        }))
    }
}

fn dryrun_jpeg(prompt: &str, dim: u32) -> Result<Vec<u8>> {
    let (r, g, b) = color_from_prompt(prompt);
    let mut image = RgbImage::new(dim, dim);
    for pixel in image.pixels_mut() {
        *pixel = Rgb([r, g, b]);
    }
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, DRYRUN_JPEG_QUALITY)
        .encode_image(&image)
        .context("failed to encode dryrun image")?;
    Ok(bytes)
}

fn color_from_prompt(prompt: &str) -> (u8, u8, u8) {
    let digest = Sha256::digest(prompt.as_bytes());
    (digest[0], digest[1], digest[2])
}

fn short_id(name: &str, prompt: &str, idx: u64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    hasher.update(prompt.as_bytes());
    hasher.update(idx.to_be_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..4])
}
