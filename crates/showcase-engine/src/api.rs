use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use reqwest::blocking::Response as HttpResponse;
use serde_json::Value;
use showcase_contracts::api::{GenerateImageRequest, GenerateImageResponse, NewPost};

use crate::config::GalleryConfig;
use crate::dryrun::DryrunGalleryApi;
use crate::http::HttpGalleryApi;

pub const ERROR_TEXT_MAX_CHARS: usize = 512;

/// The two remote endpoints a create-post session talks to.
pub trait GalleryApi: Send + Sync {
    fn name(&self) -> &str;
    fn generate_image(&self, request: &GenerateImageRequest) -> Result<GenerateImageResponse>;
    fn create_post(&self, post: &NewPost) -> Result<Value>;
}

#[derive(Default)]
pub struct GalleryApiRegistry {
    backends: BTreeMap<String, Arc<dyn GalleryApi>>,
}

impl GalleryApiRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<A: GalleryApi + 'static>(&mut self, api: A) {
        self.backends
            .insert(api.name().to_string(), Arc::new(api));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn GalleryApi>> {
        self.backends.get(name.trim()).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.backends.keys().cloned().collect()
    }

    pub fn resolve(&self, name: &str) -> Result<Arc<dyn GalleryApi>> {
        match self.get(name) {
            Some(api) => Ok(api),
            None => bail!(
                "Unknown backend '{}' (available: {}).",
                name.trim(),
                self.names().join(", ")
            ),
        }
    }
}

pub fn default_api_registry(config: &GalleryConfig) -> Result<GalleryApiRegistry> {
    let mut backends = GalleryApiRegistry::new();
    backends.register(DryrunGalleryApi::new());
    backends.register(HttpGalleryApi::new(config.api_base.clone())?);
    Ok(backends)
}

pub(crate) fn response_json_or_error(endpoint: &str, response: HttpResponse) -> Result<Value> {
    let status = response.status();
    let code = status.as_u16();
    let body = response
        .text()
        .with_context(|| format!("{endpoint} response body read failed"))?;
    if !status.is_success() {
        bail!(
            "{endpoint} request failed ({code}): {}",
            truncate_text(&body, ERROR_TEXT_MAX_CHARS)
        );
    }
    let parsed: Value = serde_json::from_str(&body)
        .with_context(|| format!("{endpoint} returned invalid JSON payload"))?;
    Ok(parsed)
}

/// Flattens an error and its causes into one line for the error banner.
pub fn error_chain_text(err: &anyhow::Error, max_chars: usize) -> String {
    let mut parts = Vec::new();
    for cause in err.chain() {
        let text = cause.to_string();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            continue;
        }
        if parts
            .last()
            .map(|existing| existing == trimmed)
            .unwrap_or(false)
        {
            continue;
        }
        parts.push(trimmed.to_string());
    }
    if parts.is_empty() {
        return truncate_text(&err.to_string(), max_chars);
    }
    truncate_text(&parts.join(" | caused by: "), max_chars)
}

pub(crate) fn truncate_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect::<String>() + "…"
}
