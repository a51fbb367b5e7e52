mod photo;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::NewPost;

pub use photo::{Photo, PhotoError, JPEG_DATA_URI_PREFIX};

/// Validation failures detected before any network call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("Please enter a prompt")]
    MissingPrompt,
    #[error("Please fill all the fields")]
    MissingFields,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FormField {
    Name,
    Prompt,
    Photo,
}

impl FormField {
    pub const ALL: [FormField; 3] = [FormField::Name, FormField::Prompt, FormField::Photo];

    pub fn as_str(self) -> &'static str {
        match self {
            FormField::Name => "name",
            FormField::Prompt => "prompt",
            FormField::Photo => "photo",
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormField {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase();
        FormField::ALL
            .into_iter()
            .find(|field| field.as_str() == normalized)
            .ok_or_else(|| format!("Unknown form field '{}'.", raw.trim()))
    }
}

/// The record backing the create-post form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormData {
    pub name: String,
    pub prompt: String,
    #[serde(default)]
    pub photo: Option<Photo>,
}

impl FormData {
    /// Replaces one field, leaving the others untouched. An empty photo value
    /// clears the photo.
    pub fn set_field(&mut self, field: FormField, value: impl Into<String>) {
        let value = value.into();
        match field {
            FormField::Name => self.name = value,
            FormField::Prompt => self.prompt = value,
            FormField::Photo => {
                self.photo = if value.is_empty() {
                    None
                } else {
                    Some(Photo::from_data_uri(value))
                };
            }
        }
    }

    pub fn field(&self, field: FormField) -> &str {
        match field {
            FormField::Name => &self.name,
            FormField::Prompt => &self.prompt,
            FormField::Photo => self.photo.as_ref().map(Photo::as_data_uri).unwrap_or(""),
        }
    }

    pub fn require_prompt(&self) -> Result<&str, FormError> {
        if self.prompt.is_empty() {
            return Err(FormError::MissingPrompt);
        }
        Ok(&self.prompt)
    }

    pub fn is_complete(&self) -> bool {
        FormField::ALL
            .into_iter()
            .all(|field| !self.field(field).is_empty())
    }

    /// The body for the post-creation endpoint, if every field is filled.
    pub fn to_new_post(&self) -> Result<NewPost, FormError> {
        match &self.photo {
            Some(photo) if self.is_complete() => Ok(NewPost {
                name: self.name.clone(),
                prompt: self.prompt.clone(),
                photo: photo.clone(),
            }),
            _ => Err(FormError::MissingFields),
        }
    }
}
