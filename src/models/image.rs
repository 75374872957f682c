//! Gallery images and upload results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{normalize, Keyed};

/// Where an uploaded image is used. Sent as the `image_type` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageType {
    Poster,
    Speaker,
    Event,
}

impl ImageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageType::Poster => "poster",
            ImageType::Speaker => "speaker",
            ImageType::Event => "event",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "poster" => Some(ImageType::Poster),
            "speaker" => Some(ImageType::Speaker),
            "event" => Some(ImageType::Event),
            _ => None,
        }
    }
}

/// An image in the event gallery. Identified by its storage name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventImage {
    pub url: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(
        default,
        deserialize_with = "normalize::optional_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub uploaded_at: Option<DateTime<Utc>>,
}

impl Keyed for EventImage {
    type Key = String;

    fn key(&self) -> String {
        self.name.clone()
    }
}

/// Result of a multipart upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedImage {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Request body for updating an image caption.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptionUpdate {
    pub caption: String,
}
