//! Event endpoints.

use reqwest::Method;

use super::ApiClient;
use crate::auth::Credential;
use crate::errors::PortalError;
use crate::models::{EntityId, Event, EventPayload};

impl ApiClient {
    /// GET /events - Public event list.
    pub async fn list_events(&self) -> Result<Vec<Event>, PortalError> {
        self.send_json(self.public(Method::GET, &["events"])).await
    }

    /// GET /events - Same list, fetched with the admin's token.
    pub async fn list_events_as(&self, credential: &Credential) -> Result<Vec<Event>, PortalError> {
        self.send_json(self.authed(Method::GET, &["events"], credential))
            .await
    }

    /// Resolve an event by its URL slug.
    pub async fn event_by_slug(&self, slug: &str) -> Result<Event, PortalError> {
        self.list_events()
            .await?
            .into_iter()
            .find(|e| e.slug() == slug)
            .ok_or_else(|| PortalError::NotFound(format!("Event {} not found", slug)))
    }

    /// POST /events - Create an event.
    pub async fn create_event(
        &self,
        credential: &Credential,
        payload: &EventPayload,
    ) -> Result<Event, PortalError> {
        let request = self.authed(Method::POST, &["events"], credential).json(payload);
        self.send_json(request).await
    }

    /// PUT /events/:id - Update an event.
    pub async fn update_event(
        &self,
        credential: &Credential,
        id: &EntityId,
        payload: &EventPayload,
    ) -> Result<Event, PortalError> {
        let path = ["events", id.as_str()];
        let request = self.authed(Method::PUT, &path, credential).json(payload);
        self.send_json(request).await
    }

    /// DELETE /events/:id - Delete an event.
    pub async fn delete_event(&self, credential: &Credential, id: &EntityId) -> Result<(), PortalError> {
        let path = ["events", id.as_str()];
        self.send_empty(self.authed(Method::DELETE, &path, credential))
            .await
    }
}
