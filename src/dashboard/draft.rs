//! The event editor's working copy.

use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

use super::DashboardHandle;
use crate::errors::PortalError;
use crate::forms::{EventForm, FormEdit};
use crate::models::{EntityId, Event};

/// Form being edited, and the event it came from (none for a new event).
#[derive(Debug, Clone, Serialize)]
pub struct EventDraft {
    pub event_id: Option<EntityId>,
    pub form: EventForm,
}

fn no_draft() -> PortalError {
    PortalError::NotFound("No event is being edited".to_string())
}

impl DashboardHandle {
    /// Open the editor, blank or prefilled from a saved event. Replaces any
    /// unsaved draft.
    pub async fn start_draft<Tz>(
        &self,
        event_id: Option<EntityId>,
        now: DateTime<Utc>,
        tz: &Tz,
    ) -> Result<EventForm, PortalError>
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        let form = match &event_id {
            None => {
                let mut form = EventForm::new();
                form.add_speaker(now);
                form.add_agenda_item(now);
                form
            }
            Some(id) => {
                let loaded = self.lock().await.events.is_loaded();
                if !loaded {
                    self.fetch_events().await?;
                }
                let dashboard = self.lock().await;
                let event = dashboard
                    .events
                    .get(id)
                    .ok_or_else(|| PortalError::NotFound(format!("Event {} not found", id)))?;
                EventForm::from_event(event, tz, now)
            }
        };

        self.lock().await.draft = Some(EventDraft {
            event_id,
            form: form.clone(),
        });
        Ok(form)
    }

    pub async fn draft(&self) -> Result<EventDraft, PortalError> {
        self.lock().await.draft.clone().ok_or_else(no_draft)
    }

    pub async fn edit_draft(&self, edit: FormEdit, now: DateTime<Utc>) -> Result<EventForm, PortalError> {
        let mut dashboard = self.lock().await;
        let draft = dashboard.draft.as_mut().ok_or_else(no_draft)?;
        draft.form.apply_edit(edit, now)?;
        Ok(draft.form.clone())
    }

    pub async fn discard_draft(&self) -> bool {
        self.lock().await.draft.take().is_some()
    }

    /// Submit the draft as a create or an update. The draft survives a
    /// failed submit so nothing typed is lost.
    pub async fn save_draft<Tz: TimeZone>(
        &self,
        now: DateTime<Utc>,
        tz: &Tz,
    ) -> Result<Event, PortalError> {
        let draft = self.draft().await?;
        let event = match &draft.event_id {
            None => self.create_event(&draft.form, now, tz).await?,
            Some(id) => self.update_event(id, &draft.form, now, tz).await?,
        };
        self.lock().await.draft = None;
        Ok(event)
    }
}
