//! Admin dashboard state orchestration.
//!
//! Four independent collections (events, users, volunteers, images) plus the
//! content assistant, each loaded on demand and patched locally after a
//! successful mutation instead of being re-fetched.

mod collection;
mod draft;
mod pagination;
mod social;
mod toast;

pub use collection::*;
pub use draft::*;
pub use toast::*;

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, MutexGuard};

use crate::api::ApiClient;
use crate::auth::{Credential, SharedSession};
use crate::errors::PortalError;
use crate::forms::{EventForm, UploadTarget};
use crate::models::{
    EntityId, Event, EventImage, ImageType, Keyed, Registration, UploadedImage, User, Volunteer,
};
use crate::social::ContentAssistant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    Events,
    Users,
    Volunteers,
    Images,
    Social,
}

impl Tab {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "events" => Some(Tab::Events),
            "users" => Some(Tab::Users),
            "volunteers" => Some(Tab::Volunteers),
            "images" | "gallery" => Some(Tab::Images),
            "social" => Some(Tab::Social),
            _ => None,
        }
    }
}

pub struct Dashboard {
    pub tab: Tab,
    pub events: Collection<Event>,
    pub users: Collection<User>,
    pub volunteers: Collection<Volunteer>,
    pub images: Collection<EventImage>,
    pub assistant: ContentAssistant,
    pub draft: Option<EventDraft>,
    pub toasts: Toasts,
}

impl Dashboard {
    pub fn new(page_size: usize, toast_ttl: std::time::Duration) -> Self {
        Self {
            tab: Tab::Events,
            events: Collection::new(page_size),
            users: Collection::new(page_size),
            volunteers: Collection::new(page_size),
            images: Collection::new(page_size),
            assistant: ContentAssistant::new(),
            draft: None,
            toasts: Toasts::new(toast_ttl),
        }
    }

    /// Drop whatever the previous session loaded or typed. Page sizes and
    /// fetch generations carry over.
    pub fn clear_session(&mut self) {
        self.tab = Tab::Events;
        self.events.invalidate();
        self.users.invalidate();
        self.volunteers.invalidate();
        self.images.invalidate();
        self.assistant = ContentAssistant::new();
        self.draft = None;
        self.toasts.clear();
    }

    pub fn set_page(&mut self, tab: Tab, page: usize) {
        match tab {
            Tab::Events | Tab::Social => self.events.set_page(page),
            Tab::Users => self.users.set_page(page),
            Tab::Volunteers => self.volunteers.set_page(page),
            Tab::Images => self.images.set_page(page),
        }
    }

    pub fn view(&mut self, now: DateTime<Utc>) -> DashboardView {
        DashboardView {
            tab: self.tab,
            events: self.events.view(EventRow::new),
            users: self.users.view(UserRow::new),
            volunteers: self.volunteers.view(Volunteer::clone),
            images: self.images.view(EventImage::clone),
            social: self.assistant.clone(),
            draft: self.draft.clone(),
            toasts: self.toasts.active(now),
        }
    }
}

/// A dashboard collection the orchestration layer can load generically.
pub trait Section: Keyed + Clone + Send + 'static {
    const LABEL: &'static str;

    fn collection(dashboard: &mut Dashboard) -> &mut Collection<Self>;
}

impl Section for Event {
    const LABEL: &'static str = "events";

    fn collection(dashboard: &mut Dashboard) -> &mut Collection<Self> {
        &mut dashboard.events
    }
}

impl Section for User {
    const LABEL: &'static str = "users";

    fn collection(dashboard: &mut Dashboard) -> &mut Collection<Self> {
        &mut dashboard.users
    }
}

impl Section for Volunteer {
    const LABEL: &'static str = "volunteers";

    fn collection(dashboard: &mut Dashboard) -> &mut Collection<Self> {
        &mut dashboard.volunteers
    }
}

impl Section for EventImage {
    const LABEL: &'static str = "images";

    fn collection(dashboard: &mut Dashboard) -> &mut Collection<Self> {
        &mut dashboard.images
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EventRow {
    #[serde(flatten)]
    pub event: Event,
    pub badge: Option<&'static str>,
    pub spots_left: i64,
}

impl EventRow {
    pub fn new(event: &Event) -> Self {
        Self {
            event: event.clone(),
            badge: event.badge(),
            spots_left: event.spots_left(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserRow {
    #[serde(flatten)]
    pub user: User,
    pub is_admin: bool,
    pub registration_count: usize,
}

impl UserRow {
    pub fn new(user: &User) -> Self {
        Self {
            user: user.clone(),
            is_admin: user.is_admin(),
            registration_count: user.registrations.len(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub tab: Tab,
    pub events: PageView<EventRow>,
    pub users: PageView<UserRow>,
    pub volunteers: PageView<Volunteer>,
    pub images: PageView<EventImage>,
    pub social: ContentAssistant,
    pub draft: Option<EventDraft>,
    pub toasts: Vec<Toast>,
}

/// Async orchestration over the shared dashboard state.
#[derive(Clone)]
pub struct DashboardHandle {
    state: Arc<Mutex<Dashboard>>,
    api: ApiClient,
    session: SharedSession,
}

impl DashboardHandle {
    pub fn new(dashboard: Dashboard, api: ApiClient, session: SharedSession) -> Self {
        Self {
            state: Arc::new(Mutex::new(dashboard)),
            api,
            session,
        }
    }

    pub async fn lock(&self) -> MutexGuard<'_, Dashboard> {
        self.state.lock().await
    }

    pub async fn view(&self) -> DashboardView {
        self.state.lock().await.view(Utc::now())
    }

    /// Drop everything loaded under the previous session.
    pub async fn reset(&self) {
        self.state.lock().await.clear_session();
    }

    pub async fn dismiss_toast(&self, id: u64) -> bool {
        self.state.lock().await.toasts.dismiss(id)
    }

    async fn credential(&self) -> Result<Credential, PortalError> {
        self.session.read().await.require_credential()
    }

    /// Surface a failure. A 401 ends the session (one toast for the
    /// transition); anything else is logged and toasted.
    async fn report(&self, context: &str, err: &PortalError) {
        if err.is_unauthorized() {
            let prompted = self.session.write().await.handle_unauthorized().await;
            if prompted {
                let mut dashboard = self.state.lock().await;
                dashboard.clear_session();
                dashboard
                    .toasts
                    .error("Your session has expired. Please log in again.");
            }
            return;
        }

        tracing::warn!(error = %err, "{}", context);
        let message = match err {
            PortalError::Validation(msg) => msg.clone(),
            other => format!("{}: {}", context, other.message()),
        };
        self.state.lock().await.toasts.error(message);
    }

    /// Run an authenticated backend call, reporting any failure.
    async fn call<R, F, Fut>(&self, context: &str, call: F) -> Result<R, PortalError>
    where
        F: FnOnce(ApiClient, Credential) -> Fut,
        Fut: Future<Output = Result<R, PortalError>>,
    {
        let result = match self.credential().await {
            Ok(credential) => call(self.api.clone(), credential).await,
            Err(e) => Err(e),
        };
        if let Err(err) = &result {
            self.report(context, err).await;
        }
        result
    }

    /// Fetch one collection, fenced by its generation counter.
    async fn load<T, F, Fut>(&self, fetch: F) -> Result<FetchOutcome, PortalError>
    where
        T: Section,
        F: FnOnce(ApiClient, Credential) -> Fut,
        Fut: Future<Output = Result<Vec<T>, PortalError>>,
    {
        let credential = match self.credential().await {
            Ok(credential) => credential,
            Err(err) => {
                self.report(&format!("Failed to load {}", T::LABEL), &err).await;
                return Err(err);
            }
        };

        let ticket = T::collection(&mut *self.state.lock().await).begin_fetch();
        let result = fetch(self.api.clone(), credential).await;

        match result {
            Ok(items) => {
                let count = items.len();
                let outcome =
                    T::collection(&mut *self.state.lock().await).finish_fetch(ticket, Some(items));
                tracing::debug!(section = T::LABEL, count, ?outcome, "Collection fetched");
                Ok(outcome)
            }
            Err(err) => {
                let outcome = T::collection(&mut *self.state.lock().await).finish_fetch(ticket, None);
                if outcome == FetchOutcome::Applied || err.is_unauthorized() {
                    self.report(&format!("Failed to load {}", T::LABEL), &err).await;
                }
                Err(err)
            }
        }
    }

    pub async fn fetch_events(&self) -> Result<FetchOutcome, PortalError> {
        self.load(|api, credential| async move { api.list_events_as(&credential).await })
            .await
    }

    pub async fn fetch_users(&self) -> Result<FetchOutcome, PortalError> {
        self.load(|api, credential| async move { api.list_users(&credential).await })
            .await
    }

    pub async fn fetch_volunteers(&self) -> Result<FetchOutcome, PortalError> {
        self.load(|api, credential| async move { api.list_volunteers(&credential).await })
            .await
    }

    pub async fn fetch_images(&self) -> Result<FetchOutcome, PortalError> {
        self.load(|api, _credential| async move { api.list_images().await })
            .await
    }

    /// Reload every collection concurrently.
    pub async fn refresh_all(&self) -> Result<(), PortalError> {
        let (events, users, volunteers, images) = tokio::join!(
            self.fetch_events(),
            self.fetch_users(),
            self.fetch_volunteers(),
            self.fetch_images()
        );
        events?;
        users?;
        volunteers?;
        images?;
        Ok(())
    }

    pub async fn refresh(&self, tab: Tab) -> Result<(), PortalError> {
        match tab {
            Tab::Events => self.fetch_events().await.map(drop),
            Tab::Users => self.fetch_users().await.map(drop),
            Tab::Volunteers => self.fetch_volunteers().await.map(drop),
            Tab::Images => self.fetch_images().await.map(drop),
            Tab::Social => {
                self.fetch_events().await?;
                self.refresh_platform_status().await.map(drop)
            }
        }
    }

    /// Switch tabs, loading the tab's collection the first time it is shown.
    pub async fn open_tab(&self, tab: Tab) -> Result<(), PortalError> {
        let needs_fetch = {
            let mut dashboard = self.state.lock().await;
            dashboard.tab = tab;
            match tab {
                Tab::Events | Tab::Social => {
                    !dashboard.events.is_loaded() && !dashboard.events.is_loading()
                }
                Tab::Users => !dashboard.users.is_loaded() && !dashboard.users.is_loading(),
                Tab::Volunteers => {
                    !dashboard.volunteers.is_loaded() && !dashboard.volunteers.is_loading()
                }
                Tab::Images => !dashboard.images.is_loaded() && !dashboard.images.is_loading(),
            }
        };

        if tab == Tab::Social {
            if needs_fetch {
                self.fetch_events().await?;
            }
            return self.refresh_platform_status().await.map(drop);
        }
        if needs_fetch {
            self.refresh(tab).await?;
        }
        Ok(())
    }

    pub async fn set_page(&self, tab: Tab, page: usize) {
        self.state.lock().await.set_page(tab, page);
    }

    pub async fn create_event<Tz: TimeZone>(
        &self,
        form: &EventForm,
        now: DateTime<Utc>,
        tz: &Tz,
    ) -> Result<Event, PortalError> {
        let payload = match form.to_payload(now, tz) {
            Ok(payload) => payload,
            Err(err) => {
                self.report("Invalid event", &err).await;
                return Err(err);
            }
        };

        let event = self
            .call("Failed to create event", |api, credential| async move {
                api.create_event(&credential, &payload).await
            })
            .await?;

        let mut dashboard = self.state.lock().await;
        dashboard.events.apply(Mutation::Insert(event.clone()));
        dashboard
            .toasts
            .success(format!("Event \"{}\" created", event.title));
        Ok(event)
    }

    pub async fn update_event<Tz: TimeZone>(
        &self,
        id: &EntityId,
        form: &EventForm,
        now: DateTime<Utc>,
        tz: &Tz,
    ) -> Result<Event, PortalError> {
        let payload = match form.to_payload(now, tz) {
            Ok(payload) => payload,
            Err(err) => {
                self.report("Invalid event", &err).await;
                return Err(err);
            }
        };

        let id = id.clone();
        let event = self
            .call("Failed to update event", |api, credential| async move {
                api.update_event(&credential, &id, &payload).await
            })
            .await?;

        let mut dashboard = self.state.lock().await;
        dashboard.events.apply(Mutation::Replace(event.clone()));
        dashboard
            .toasts
            .success(format!("Event \"{}\" updated", event.title));
        Ok(event)
    }

    pub async fn delete_event(&self, id: &EntityId) -> Result<(), PortalError> {
        let target = id.clone();
        self.call("Failed to delete event", |api, credential| async move {
            api.delete_event(&credential, &target).await
        })
        .await?;

        let mut dashboard = self.state.lock().await;
        dashboard.events.apply(Mutation::Remove(id.clone()));
        dashboard.toasts.success("Event deleted");
        Ok(())
    }

    pub async fn delete_user(&self, id: &EntityId) -> Result<(), PortalError> {
        let target = id.clone();
        self.call("Failed to delete user", |api, credential| async move {
            api.delete_user(&credential, &target).await
        })
        .await?;

        let mut dashboard = self.state.lock().await;
        dashboard.users.apply(Mutation::Remove(id.clone()));
        dashboard.toasts.success("User deleted");
        Ok(())
    }

    pub async fn delete_volunteer(&self, id: &EntityId) -> Result<(), PortalError> {
        let target = id.clone();
        self.call("Failed to delete volunteer", |api, credential| async move {
            api.delete_volunteer(&credential, &target).await
        })
        .await?;

        let mut dashboard = self.state.lock().await;
        dashboard.volunteers.apply(Mutation::Remove(id.clone()));
        dashboard.toasts.success("Volunteer deleted");
        Ok(())
    }

    pub async fn delete_image(&self, name: &str) -> Result<(), PortalError> {
        let target = name.to_string();
        self.call("Failed to delete image", |api, credential| async move {
            api.delete_image(&credential, &target).await
        })
        .await?;

        let mut dashboard = self.state.lock().await;
        dashboard.images.apply(Mutation::Remove(name.to_string()));
        dashboard.toasts.success("Image deleted");
        Ok(())
    }

    pub async fn update_caption(&self, name: &str, caption: &str) -> Result<EventImage, PortalError> {
        let (target, text) = (name.to_string(), caption.trim().to_string());
        let image = self
            .call("Failed to update caption", |api, credential| async move {
                api.update_caption(&credential, &target, &text).await
            })
            .await?;

        let mut dashboard = self.state.lock().await;
        dashboard.images.apply(Mutation::Replace(image.clone()));
        dashboard.toasts.success("Caption saved");
        Ok(image)
    }

    /// Upload a file. Gallery uploads are also added to the images list;
    /// poster and speaker uploads land in the open draft when `target` names one.
    pub async fn upload_image(
        &self,
        image_type: ImageType,
        target: Option<UploadTarget>,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadedImage, PortalError> {
        let precheck = if bytes.is_empty() {
            Err(PortalError::Validation("Please choose a file".to_string()))
        } else if !content_type.starts_with("image/") {
            Err(PortalError::Validation("Only image files can be uploaded".to_string()))
        } else {
            Ok(())
        };
        if let Err(err) = precheck {
            self.report("Upload rejected", &err).await;
            return Err(err);
        }

        let (name, mime) = (file_name.to_string(), content_type.to_string());
        let uploaded = self
            .call("Failed to upload image", |api, credential| async move {
                api.upload_image(&credential, image_type, &name, &mime, bytes)
                    .await
            })
            .await?;

        let mut dashboard = self.state.lock().await;
        if image_type == ImageType::Event {
            let image = EventImage {
                url: uploaded.url.clone(),
                name: uploaded.name.clone().unwrap_or_else(|| file_name.to_string()),
                caption: None,
                uploaded_at: Some(Utc::now()),
            };
            dashboard.images.apply(Mutation::Insert(image));
        }
        if let (Some(target), Some(draft)) = (target, dashboard.draft.as_mut()) {
            if !draft.form.apply_upload(target, &uploaded.url) {
                tracing::warn!(?target, "Uploaded image has no matching draft field");
            }
        }
        dashboard.toasts.success("Image uploaded");
        Ok(uploaded)
    }

    pub async fn event_registrations(
        &self,
        event_id: &EntityId,
    ) -> Result<Vec<Registration>, PortalError> {
        let event_id = event_id.clone();
        self.call("Failed to load registrations", |api, credential| async move {
            api.list_registrations(&credential, Some(&event_id)).await
        })
        .await
    }

    /// Cancel a registration and free its seat locally.
    pub async fn delete_registration(
        &self,
        registration_id: &EntityId,
        event_id: &EntityId,
    ) -> Result<(), PortalError> {
        let target = registration_id.clone();
        self.call("Failed to delete registration", |api, credential| async move {
            api.delete_registration(&credential, &target).await
        })
        .await?;

        let mut dashboard = self.state.lock().await;
        dashboard
            .events
            .update(event_id, |e| e.attendees = (e.attendees - 1).max(0));
        dashboard.toasts.success("Registration removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(id: u32, capacity: i64, attendees: i64) -> Event {
        serde_json::from_value(json!({
            "id": id,
            "title": format!("Event {}", id),
            "date_time": "2030-06-01T18:00:00Z",
            "capacity": capacity,
            "attendees": attendees
        }))
        .unwrap()
    }

    #[test]
    fn test_tab_parse() {
        assert_eq!(Tab::parse("Users"), Some(Tab::Users));
        assert_eq!(Tab::parse("gallery"), Some(Tab::Images));
        assert_eq!(Tab::parse("billing"), None);
    }

    #[test]
    fn test_clear_session_forgets_loaded_state() {
        let mut dashboard = Dashboard::new(10, std::time::Duration::from_secs(5));
        dashboard.tab = Tab::Users;
        let ticket = dashboard.events.begin_fetch();
        dashboard.events.finish_fetch(ticket, Some(vec![event(1, 30, 3)]));
        dashboard.draft = Some(EventDraft {
            event_id: None,
            form: EventForm::new(),
        });
        dashboard.toasts.success("Event created");

        dashboard.clear_session();
        assert_eq!(dashboard.tab, Tab::Events);
        assert!(!dashboard.events.is_loaded());
        assert!(dashboard.events.is_empty());
        assert!(dashboard.draft.is_none());
        assert!(dashboard.toasts.last().is_none());
        assert_eq!(dashboard.events.pager().page_size(), 10);
    }

    #[test]
    fn test_view_marks_full_events() {
        let mut dashboard = Dashboard::new(10, std::time::Duration::from_secs(5));
        let ticket = dashboard.events.begin_fetch();
        dashboard
            .events
            .finish_fetch(ticket, Some(vec![event(1, 30, 30), event(2, 30, 12)]));

        let view = dashboard.view(Utc::now());
        assert_eq!(view.events.items[0].badge, Some("Full"));
        assert_eq!(view.events.items[1].badge, None);
        assert_eq!(view.events.items[1].spots_left, 18);

        let encoded = serde_json::to_value(&view).unwrap();
        assert_eq!(encoded["events"]["items"][0]["badge"], "Full");
        assert_eq!(encoded["events"]["items"][0]["title"], "Event 1");
        assert_eq!(encoded["tab"], "events");
    }

    #[test]
    fn test_set_page_routes_to_collection() {
        let mut dashboard = Dashboard::new(1, std::time::Duration::from_secs(5));
        let ticket = dashboard.users.begin_fetch();
        let users: Vec<User> = serde_json::from_value(json!([
            {"id": 1, "email": "a@example.org"},
            {"id": 2, "email": "b@example.org"}
        ]))
        .unwrap();
        dashboard.users.finish_fetch(ticket, Some(users));

        dashboard.set_page(Tab::Users, 2);
        assert_eq!(dashboard.users.pager().current_page(), 2);
        assert_eq!(dashboard.events.pager().current_page(), 1);
    }
}
