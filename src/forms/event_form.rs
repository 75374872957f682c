//! Event create/edit form.
//!
//! Holds raw input values plus nested speaker and agenda drafts. Validation
//! runs on submit only; a failing rule blocks the request entirely.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::PortalError;
use crate::models::{AgendaItem, EntityId, Event, EventPayload, Speaker};

/// Format of a `datetime-local` input.
const INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M";
/// Earliest and latest hour an event may start at, inclusive.
const FIRST_HOUR: u32 = 6;
const LAST_HOUR: u32 = 23;
const MIN_TITLE_CHARS: usize = 3;

/// Render an instant for a `datetime-local` input in `tz`.
pub fn format_date_for_input<Tz>(instant: &DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    instant.with_timezone(tz).format(INPUT_FORMAT).to_string()
}

/// Read a `datetime-local` value (interpreted in `tz`) at minute precision.
///
/// Values carrying their own offset are accepted as-is.
pub fn parse_input_date<Tz: TimeZone>(raw: &str, tz: &Tz) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    let truncate = |dt: DateTime<Utc>| dt.with_second(0).and_then(|d| d.with_nanosecond(0));

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return truncate(dt.with_timezone(&Utc));
    }

    let naive = [INPUT_FORMAT, "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())?;
    let local = tz.from_local_datetime(&naive).earliest()?;
    truncate(local.with_timezone(&Utc))
}

/// Client-side ids for unsaved drafts: millisecond timestamps, strictly increasing.
#[derive(Debug, Clone, Default)]
pub struct TempIds {
    last: i64,
}

impl TempIds {
    pub fn next(&mut self, now: DateTime<Utc>) -> i64 {
        let millis = now.timestamp_millis();
        self.last = if millis > self.last { millis } else { self.last + 1 };
        self.last
    }

    fn observe(&mut self, key: i64) {
        self.last = self.last.max(key);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeakerDraft {
    /// Client key used for add/remove before the server assigns an id.
    #[serde(default)]
    pub key: i64,
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
    #[serde(default)]
    pub image_url: String,
}

impl SpeakerDraft {
    fn is_blank(&self) -> bool {
        [&self.name, &self.role, &self.company, &self.about, &self.image_url]
            .iter()
            .all(|f| f.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgendaDraft {
    #[serde(default)]
    pub key: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub description: String,
}

impl AgendaDraft {
    fn is_blank(&self) -> bool {
        [&self.duration, &self.topic, &self.description]
            .iter()
            .all(|f| f.trim().is_empty())
    }
}

/// Where an uploaded image URL goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadTarget {
    Poster,
    Speaker(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormError {
    TitleNumeric,
    TitleTooShort,
    TitleWithoutLetter,
    InvalidDate,
    DateInPast,
    HourOutOfRange,
    CapacityNotPositive,
    AttendeesNegative,
    AttendeesOverCapacity,
    SpeakerWithoutName,
    AgendaWithoutTopic,
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            FormError::TitleNumeric => "Title cannot be only numbers",
            FormError::TitleTooShort => "Title must be at least 3 characters",
            FormError::TitleWithoutLetter => "Title must contain at least one letter",
            FormError::InvalidDate => "Please enter a valid date and time",
            FormError::DateInPast => "Event date cannot be in the past",
            FormError::HourOutOfRange => "Event time must be between 6:00 and 23:00",
            FormError::CapacityNotPositive => "Capacity must be greater than zero",
            FormError::AttendeesNegative => "Attendees cannot be negative",
            FormError::AttendeesOverCapacity => "Attendees cannot exceed capacity",
            FormError::SpeakerWithoutName => "Every speaker needs a name",
            FormError::AgendaWithoutTopic => "Every agenda item needs a topic",
        };
        f.write_str(msg)
    }
}

impl From<FormError> for PortalError {
    fn from(err: FormError) -> Self {
        PortalError::Validation(err.to_string())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// `datetime-local` value, see [`format_date_for_input`].
    #[serde(default)]
    pub date_time: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub capacity: i64,
    #[serde(default)]
    pub attendees: i64,
    /// Comma-separated.
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub poster_url: String,
    #[serde(default)]
    pub speakers: Vec<SpeakerDraft>,
    #[serde(default)]
    pub agenda: Vec<AgendaDraft>,
    #[serde(skip)]
    temp_ids: TempIds,
}

impl EventForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefill an edit form from a saved event.
    pub fn from_event<Tz>(event: &Event, tz: &Tz, now: DateTime<Utc>) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        let mut temp_ids = TempIds::default();
        let speakers = event
            .speakers
            .iter()
            .map(|s| SpeakerDraft {
                key: temp_ids.next(now),
                id: s.id.clone(),
                name: s.name.clone(),
                role: s.role.clone(),
                company: s.company.clone(),
                about: s.about.clone(),
                image_url: s.image_url.clone().unwrap_or_default(),
            })
            .collect();
        let agenda = event
            .agenda
            .iter()
            .map(|a| AgendaDraft {
                key: temp_ids.next(now),
                id: a.id.clone(),
                duration: a.duration.clone(),
                topic: a.topic.clone(),
                description: a.description.clone(),
            })
            .collect();

        Self {
            title: event.title.clone(),
            description: event.description.clone().unwrap_or_default(),
            date_time: format_date_for_input(&event.date_time, tz),
            location: event.location.clone(),
            capacity: event.capacity,
            attendees: event.attendees,
            tags: event.tags.join(", "),
            poster_url: event.poster_url.clone().unwrap_or_default(),
            speakers,
            agenda,
            temp_ids,
        }
    }

    /// Give every draft without a key a fresh one.
    pub fn ensure_keys(&mut self, now: DateTime<Utc>) {
        for key in self
            .speakers
            .iter()
            .map(|s| s.key)
            .chain(self.agenda.iter().map(|a| a.key))
        {
            self.temp_ids.observe(key);
        }
        for speaker in self.speakers.iter_mut().filter(|s| s.key == 0) {
            speaker.key = self.temp_ids.next(now);
        }
        for item in self.agenda.iter_mut().filter(|a| a.key == 0) {
            item.key = self.temp_ids.next(now);
        }
    }

    pub fn add_speaker(&mut self, now: DateTime<Utc>) -> i64 {
        let key = self.temp_ids.next(now);
        self.speakers.push(SpeakerDraft {
            key,
            ..SpeakerDraft::default()
        });
        key
    }

    pub fn remove_speaker(&mut self, key: i64) -> bool {
        let before = self.speakers.len();
        self.speakers.retain(|s| s.key != key);
        self.speakers.len() != before
    }

    pub fn add_agenda_item(&mut self, now: DateTime<Utc>) -> i64 {
        let key = self.temp_ids.next(now);
        self.agenda.push(AgendaDraft {
            key,
            ..AgendaDraft::default()
        });
        key
    }

    pub fn remove_agenda_item(&mut self, key: i64) -> bool {
        let before = self.agenda.len();
        self.agenda.retain(|a| a.key != key);
        self.agenda.len() != before
    }

    /// Set attendees, never above capacity.
    pub fn set_attendees(&mut self, attendees: i64) {
        self.attendees = attendees.clamp(0, self.capacity.max(0));
    }

    /// Put an uploaded image's URL into the matching field.
    pub fn apply_upload(&mut self, target: UploadTarget, url: &str) -> bool {
        match target {
            UploadTarget::Poster => {
                self.poster_url = url.to_string();
                true
            }
            UploadTarget::Speaker(key) => match self.speakers.iter_mut().find(|s| s.key == key) {
                Some(speaker) => {
                    speaker.image_url = url.to_string();
                    true
                }
                None => false,
            },
        }
    }

    /// Check every rule. Returns the event's instant on success.
    pub fn validate<Tz: TimeZone>(&self, now: DateTime<Utc>, tz: &Tz) -> Result<DateTime<Utc>, FormError> {
        validate_title(&self.title)?;

        let instant = parse_input_date(&self.date_time, tz).ok_or(FormError::InvalidDate)?;
        if instant < now {
            return Err(FormError::DateInPast);
        }
        let hour = instant.with_timezone(tz).hour();
        if !(FIRST_HOUR..=LAST_HOUR).contains(&hour) {
            return Err(FormError::HourOutOfRange);
        }

        if self.capacity <= 0 {
            return Err(FormError::CapacityNotPositive);
        }
        if self.attendees < 0 {
            return Err(FormError::AttendeesNegative);
        }
        if self.attendees > self.capacity {
            return Err(FormError::AttendeesOverCapacity);
        }

        if self
            .speakers
            .iter()
            .any(|s| !s.is_blank() && s.name.trim().is_empty())
        {
            return Err(FormError::SpeakerWithoutName);
        }
        if self
            .agenda
            .iter()
            .any(|a| !a.is_blank() && a.topic.trim().is_empty())
        {
            return Err(FormError::AgendaWithoutTopic);
        }

        Ok(instant)
    }

    /// Validate and build the request body. Blank drafts are dropped.
    pub fn to_payload<Tz: TimeZone>(&self, now: DateTime<Utc>, tz: &Tz) -> Result<EventPayload, PortalError> {
        let instant = self.validate(now, tz)?;

        let mut tags: Vec<String> = Vec::new();
        for tag in self.tags.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            if !tags.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
                tags.push(tag.to_string());
            }
        }

        let speakers = self
            .speakers
            .iter()
            .filter(|s| !s.is_blank())
            .map(|s| Speaker {
                id: s.id.clone(),
                name: s.name.trim().to_string(),
                role: s.role.trim().to_string(),
                company: s.company.trim().to_string(),
                about: s.about.trim().to_string(),
                image_url: non_empty(&s.image_url),
            })
            .collect();

        let agenda = self
            .agenda
            .iter()
            .filter(|a| !a.is_blank())
            .map(|a| AgendaItem {
                id: a.id.clone(),
                duration: a.duration.trim().to_string(),
                topic: a.topic.trim().to_string(),
                description: a.description.trim().to_string(),
            })
            .collect();

        Ok(EventPayload {
            title: self.title.trim().to_string(),
            description: non_empty(&self.description),
            date_time: instant.to_rfc3339_opts(SecondsFormat::Secs, true),
            location: self.location.trim().to_string(),
            capacity: self.capacity,
            attendees: self.attendees,
            tags,
            speakers,
            agenda,
            poster_url: non_empty(&self.poster_url),
        })
    }

    /// Apply one edit from the dashboard's draft editor.
    pub fn apply_edit(&mut self, edit: FormEdit, now: DateTime<Utc>) -> Result<(), FormEditError> {
        match edit {
            FormEdit::Fields { form } => {
                let temp_ids = std::mem::take(&mut self.temp_ids);
                *self = *form;
                self.temp_ids = temp_ids;
                self.ensure_keys(now);
            }
            FormEdit::AddSpeaker => {
                self.add_speaker(now);
            }
            FormEdit::RemoveSpeaker { key } => {
                if !self.remove_speaker(key) {
                    return Err(FormEditError::UnknownKey(key));
                }
            }
            FormEdit::AddAgendaItem => {
                self.add_agenda_item(now);
            }
            FormEdit::RemoveAgendaItem { key } => {
                if !self.remove_agenda_item(key) {
                    return Err(FormEditError::UnknownKey(key));
                }
            }
            FormEdit::SetAttendees { attendees } => self.set_attendees(attendees),
        }
        Ok(())
    }
}

/// A single change to a draft form.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum FormEdit {
    /// Replace the plain fields and drafts, keeping the key sequence.
    Fields { form: Box<EventForm> },
    AddSpeaker,
    RemoveSpeaker { key: i64 },
    AddAgendaItem,
    RemoveAgendaItem { key: i64 },
    SetAttendees { attendees: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormEditError {
    UnknownKey(i64),
}

impl From<FormEditError> for PortalError {
    fn from(err: FormEditError) -> Self {
        match err {
            FormEditError::UnknownKey(key) => {
                PortalError::NotFound(format!("No draft entry with key {}", key))
            }
        }
    }
}

fn validate_title(raw: &str) -> Result<(), FormError> {
    let title = raw.trim();
    if !title.is_empty() && title.chars().all(|c| c.is_ascii_digit()) {
        return Err(FormError::TitleNumeric);
    }
    if title.chars().count() < MIN_TITLE_CHARS {
        return Err(FormError::TitleTooShort);
    }
    if !title.chars().any(char::is_alphabetic) {
        return Err(FormError::TitleWithoutLetter);
    }
    Ok(())
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
