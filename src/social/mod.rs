//! Social-media content assistant state.
//!
//! A linear pipeline: pick an event, generate an image and a caption, edit,
//! post. Generating again overwrites the previous output.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{EntityId, PlatformStatus};

#[derive(Debug, Clone, Default, Serialize)]
pub struct ContentAssistant {
    selected_event: Option<EntityId>,
    caption: String,
    image_url: Option<String>,
    platform: Option<PlatformStatus>,
    checked_at: Option<DateTime<Utc>>,
}

impl ContentAssistant {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected_event(&self) -> Option<&EntityId> {
        self.selected_event.as_ref()
    }

    pub fn caption(&self) -> &str {
        &self.caption
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    pub fn platform(&self) -> Option<&PlatformStatus> {
        self.platform.as_ref()
    }

    /// Switch events. Output for a different event is cleared.
    pub fn select_event(&mut self, event_id: EntityId) {
        if self.selected_event.as_ref() != Some(&event_id) {
            self.caption.clear();
            self.image_url = None;
        }
        self.selected_event = Some(event_id);
    }

    /// Replace the caption with generated text, stripped of markup.
    pub fn apply_generated_content(&mut self, raw: &str) {
        self.caption = strip_html(raw).trim().to_string();
    }

    pub fn apply_generated_image(&mut self, url: &str) {
        self.image_url = Some(url.to_string());
    }

    /// Manual edit.
    pub fn set_caption(&mut self, caption: &str) {
        self.caption = caption.to_string();
    }

    pub fn set_platform_status(&mut self, status: PlatformStatus, now: DateTime<Utc>) {
        self.platform = Some(status);
        self.checked_at = Some(now);
    }

    pub fn is_connected(&self, now: DateTime<Utc>) -> bool {
        self.platform.as_ref().is_some_and(|p| p.is_usable(now))
    }

    /// After a successful post the draft is spent.
    pub fn clear_draft(&mut self) {
        self.caption.clear();
        self.image_url = None;
    }
}

/// Remove tags and decode the common entities. Block-level tags become line breaks.
pub fn strip_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '<' => {
                let mut tag = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '>' {
                        closed = true;
                        break;
                    }
                    tag.push(c);
                }
                if !closed {
                    out.push('<');
                    out.push_str(&tag);
                    break;
                }
                if is_break_tag(&tag) && !out.ends_with('\n') && !out.is_empty() {
                    out.push('\n');
                }
            }
            '&' => {
                let mut entity = String::new();
                while let Some(&c) = chars.peek() {
                    if c == ';' || entity.len() > 8 || c.is_whitespace() || c == '&' {
                        break;
                    }
                    entity.push(c);
                    chars.next();
                }
                match (chars.peek(), decode_entity(&entity)) {
                    (Some(';'), Some(decoded)) => {
                        chars.next();
                        out.push(decoded);
                    }
                    _ => {
                        out.push('&');
                        out.push_str(&entity);
                    }
                }
            }
            _ => out.push(ch),
        }
    }

    out
}

fn is_break_tag(tag: &str) -> bool {
    let name: String = tag
        .trim_start_matches('/')
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    matches!(name.as_str(), "br" | "p" | "div" | "li" | "h1" | "h2" | "h3" | "h4")
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" | "#39" => Some('\''),
        "nbsp" => Some(' '),
        _ => {
            let code = entity.strip_prefix('#')?;
            let hex = code.strip_prefix('x').or_else(|| code.strip_prefix('X'));
            let value = match hex {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse().ok()?,
            };
            char::from_u32(value)
        }
    }
}
