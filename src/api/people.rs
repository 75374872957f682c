//! User, volunteer and registration endpoints. All admin-only.

use reqwest::Method;

use super::ApiClient;
use crate::auth::Credential;
use crate::errors::PortalError;
use crate::models::{EntityId, Registration, User, Volunteer};

impl ApiClient {
    /// GET /admin/users
    pub async fn list_users(&self, credential: &Credential) -> Result<Vec<User>, PortalError> {
        self.send_json(self.authed(Method::GET, &["admin", "users"], credential))
            .await
    }

    /// DELETE /admin/users/:id
    pub async fn delete_user(&self, credential: &Credential, id: &EntityId) -> Result<(), PortalError> {
        let path = ["admin", "users", id.as_str()];
        self.send_empty(self.authed(Method::DELETE, &path, credential))
            .await
    }

    /// GET /admin/volunteers
    pub async fn list_volunteers(
        &self,
        credential: &Credential,
    ) -> Result<Vec<Volunteer>, PortalError> {
        self.send_json(self.authed(Method::GET, &["admin", "volunteers"], credential))
            .await
    }

    /// DELETE /admin/volunteers/:id
    pub async fn delete_volunteer(
        &self,
        credential: &Credential,
        id: &EntityId,
    ) -> Result<(), PortalError> {
        let path = ["admin", "volunteers", id.as_str()];
        self.send_empty(self.authed(Method::DELETE, &path, credential))
            .await
    }

    /// GET /admin/registrations, optionally narrowed to one event.
    pub async fn list_registrations(
        &self,
        credential: &Credential,
        event_id: Option<&EntityId>,
    ) -> Result<Vec<Registration>, PortalError> {
        let mut request = self.authed(Method::GET, &["admin", "registrations"], credential);
        if let Some(event_id) = event_id {
            request = request.query(&[("event_id", event_id.as_str())]);
        }
        self.send_json(request).await
    }

    /// DELETE /admin/registrations/:id
    pub async fn delete_registration(
        &self,
        credential: &Credential,
        id: &EntityId,
    ) -> Result<(), PortalError> {
        let path = ["admin", "registrations", id.as_str()];
        self.send_empty(self.authed(Method::DELETE, &path, credential))
            .await
    }
}
