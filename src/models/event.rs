//! Event model with its nested speakers and agenda.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{normalize, EntityId, Keyed};

/// A speaker attached to an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Speaker {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub about: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// One slot of an event's agenda.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgendaItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub description: String,
}

/// A community event as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EntityId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(deserialize_with = "normalize::timestamp")]
    pub date_time: DateTime<Utc>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub capacity: i64,
    #[serde(default)]
    pub attendees: i64,
    #[serde(default, deserialize_with = "normalize::string_list")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub speakers: Vec<Speaker>,
    #[serde(default)]
    pub agenda: Vec<AgendaItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,
}

impl Event {
    /// No seats left.
    pub fn is_full(&self) -> bool {
        self.capacity > 0 && self.attendees >= self.capacity
    }

    pub fn spots_left(&self) -> i64 {
        (self.capacity - self.attendees).max(0)
    }

    pub fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
        self.date_time >= now
    }

    /// Badge shown next to the event in lists.
    pub fn badge(&self) -> Option<&'static str> {
        self.is_full().then_some("Full")
    }

    /// URL slug: the backend's if present, otherwise derived from the title.
    pub fn slug(&self) -> String {
        match self.slug.as_deref().map(str::trim) {
            Some(slug) if !slug.is_empty() => slug.to_string(),
            _ => slugify(&self.title),
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}

impl Keyed for Event {
    type Key = EntityId;

    fn key(&self) -> EntityId {
        self.id.clone()
    }
}

/// Lowercase ASCII slug with single dashes between words.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;
    for ch in text.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Request body for creating or updating an event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventPayload {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub date_time: String,
    pub location: String,
    pub capacity: i64,
    pub attendees: i64,
    pub tags: Vec<String>,
    pub speakers: Vec<Speaker>,
    pub agenda: Vec<AgendaItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn sample() -> Event {
        serde_json::from_value(json!({
            "id": 7,
            "title": "Rust & Coffee: Async Deep Dive!",
            "date_time": "2030-03-14T18:00:00",
            "location": "Main Hall",
            "capacity": 40,
            "attendees": 40,
            "tags": "rust, async",
            "speakers": [{"name": "Ada", "role": "Engineer"}],
            "agenda": [{"topic": "Welcome", "duration": "10m"}]
        }))
        .unwrap()
    }

    #[test]
    fn test_partial_speakers_and_agenda_decode() {
        let event: Event = serde_json::from_value(json!({
            "id": 8,
            "title": "Lightning Talks",
            "date_time": "2030-03-14T18:00:00Z",
            "capacity": 10,
            "speakers": [{"role": "Host"}],
            "agenda": [{"duration": "5m"}]
        }))
        .unwrap();
        assert_eq!(event.speakers[0].name, "");
        assert_eq!(event.speakers[0].role, "Host");
        assert_eq!(event.agenda[0].topic, "");
    }

    #[test]
    fn test_lenient_event_decoding() {
        let event = sample();
        assert_eq!(event.id.as_str(), "7");
        assert_eq!(
            event.date_time,
            Utc.with_ymd_and_hms(2030, 3, 14, 18, 0, 0).unwrap()
        );
        assert_eq!(event.tags, vec!["rust", "async"]);
        assert_eq!(event.speakers[0].company, "");
        assert!(event.speakers[0].id.is_none());
    }

    #[test]
    fn test_full_badge() {
        let mut event = sample();
        assert!(event.is_full());
        assert_eq!(event.badge(), Some("Full"));
        assert_eq!(event.spots_left(), 0);

        event.attendees = 39;
        assert!(!event.is_full());
        assert_eq!(event.badge(), None);
        assert_eq!(event.spots_left(), 1);
    }

    #[test]
    fn test_slug() {
        let mut event = sample();
        assert_eq!(event.slug(), "rust-coffee-async-deep-dive");
        event.slug = Some("rust-coffee".into());
        assert_eq!(event.slug(), "rust-coffee");
        assert_eq!(slugify("  --Hello,   World--  "), "hello-world");
    }
}
