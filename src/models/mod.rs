//! Data models mirrored from the backend.
//!
//! The portal holds no authoritative state; these records are plain copies of
//! what the backend returns, normalized on read where the backend is loose.

mod event;
mod image;
mod inquiry;
mod normalize;
mod social;
mod user;
mod volunteer;

pub use event::*;
pub use image::*;
pub use inquiry::*;
pub use social::*;
pub use user::*;
pub use volunteer::*;

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Backend identifier. Arrives as either a JSON string or a number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Signed(i64),
            Unsigned(u64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => EntityId(s),
            Raw::Signed(n) => EntityId(n.to_string()),
            Raw::Unsigned(n) => EntityId(n.to_string()),
        })
    }
}

/// Entities the dashboard caches locally, keyed by their identity.
pub trait Keyed {
    type Key: PartialEq + Clone + fmt::Debug + Send + Sync;

    fn key(&self) -> Self::Key;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_accepts_strings_and_numbers() {
        let ids: Vec<EntityId> = serde_json::from_str(r#"["abc", 42, -7]"#).unwrap();
        assert_eq!(ids[0].as_str(), "abc");
        assert_eq!(ids[1].as_str(), "42");
        assert_eq!(ids[2].as_str(), "-7");
    }

    #[test]
    fn test_entity_id_serializes_as_string() {
        let json = serde_json::to_string(&EntityId::from("17")).unwrap();
        assert_eq!(json, r#""17""#);
    }
}
