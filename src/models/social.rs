//! Social posting and content-generation bodies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{normalize, EntityId};

/// Request body for both generation endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub event_id: EntityId,
}

/// Generated caption text. May contain HTML markup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedContent {
    #[serde(alias = "text", alias = "caption")]
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedImage {
    #[serde(alias = "url")]
    pub image_url: String,
}

/// Connection state of a posting platform, as reported by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlatformStatus {
    #[serde(default)]
    pub connected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_name: Option<String>,
    #[serde(
        default,
        deserialize_with = "normalize::optional_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub expires_at: Option<DateTime<Utc>>,
}

impl PlatformStatus {
    /// Connected and the backend-held token has not lapsed.
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.connected && self.expires_at.map_or(true, |exp| exp > now)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectUrl {
    #[serde(alias = "url", alias = "authorization_url")]
    pub auth_url: String,
}

/// Request body for publishing a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialPost {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<EntityId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostReceipt {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_platform_status_usable() {
        let now = Utc::now();
        let mut status = PlatformStatus {
            connected: true,
            profile_name: None,
            expires_at: None,
        };
        assert!(status.is_usable(now));

        status.expires_at = Some(now - Duration::minutes(1));
        assert!(!status.is_usable(now));

        status.expires_at = Some(now + Duration::days(30));
        assert!(status.is_usable(now));

        status.connected = false;
        assert!(!status.is_usable(now));
    }
}
