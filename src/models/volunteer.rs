//! Volunteer applications.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::inquiry::{require_email, require_text};
use super::{normalize, EntityId, Keyed};
use crate::errors::PortalError;

/// A volunteer record. List fields are normalized on read because the backend
/// stores `volunteer_roles` as a JSON-encoded string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Volunteer {
    pub id: EntityId,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, deserialize_with = "normalize::string_list")]
    pub skills: Vec<String>,
    #[serde(default, deserialize_with = "normalize::string_list")]
    pub volunteer_roles: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motivation: Option<String>,
    #[serde(
        default,
        deserialize_with = "normalize::optional_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub submitted_at: Option<DateTime<Utc>>,
}

impl Volunteer {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }
}

impl Keyed for Volunteer {
    type Key = EntityId;

    fn key(&self) -> EntityId {
        self.id.clone()
    }
}

/// Request body submitted from the get-involved page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolunteerApplication {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub volunteer_roles: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motivation: Option<String>,
}

impl VolunteerApplication {
    pub fn validate(&self) -> Result<(), PortalError> {
        require_text("First name", &self.first_name)?;
        require_text("Last name", &self.last_name)?;
        require_email(&self.email)?;
        if self.volunteer_roles.iter().all(|r| r.trim().is_empty()) {
            return Err(PortalError::Validation(
                "Choose at least one volunteer role".to_string(),
            ));
        }
        Ok(())
    }
}
