//! Login, admin check, profile and public form endpoints.

use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::ApiClient;
use crate::auth::Credential;
use crate::errors::PortalError;
use crate::models::{ContactMessage, ProfileUpdate, SponsorshipInquiry, User, VolunteerApplication};

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// Response of the email login endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(alias = "accessToken", alias = "token")]
    pub access_token: String,
    #[serde(default)]
    pub user: Option<User>,
}

#[derive(Deserialize)]
struct AdminCheck {
    #[serde(alias = "isAdmin", alias = "admin")]
    is_admin: bool,
}

impl ApiClient {
    /// POST /auth/login
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, PortalError> {
        let request = self
            .public(Method::POST, &["auth", "login"])
            .json(&LoginRequest { email, password });
        self.send_json(request).await
    }

    /// GET /auth/admin-check
    pub async fn check_admin(&self, credential: &Credential) -> Result<bool, PortalError> {
        let check: AdminCheck = self
            .send_json(self.authed(Method::GET, &["auth", "admin-check"], credential))
            .await?;
        Ok(check.is_admin)
    }

    /// PUT /users/me
    pub async fn complete_profile(
        &self,
        credential: &Credential,
        update: &ProfileUpdate,
    ) -> Result<User, PortalError> {
        let request = self.authed(Method::PUT, &["users", "me"], credential).json(update);
        self.send_json(request).await
    }

    /// POST /contact
    pub async fn submit_contact(&self, message: &ContactMessage) -> Result<(), PortalError> {
        self.send_empty(self.public(Method::POST, &["contact"]).json(message))
            .await
    }

    /// POST /volunteers
    pub async fn submit_volunteer_application(
        &self,
        application: &VolunteerApplication,
    ) -> Result<(), PortalError> {
        self.send_empty(self.public(Method::POST, &["volunteers"]).json(application))
            .await
    }

    /// POST /sponsorship
    pub async fn submit_sponsorship(&self, inquiry: &SponsorshipInquiry) -> Result<(), PortalError> {
        self.send_empty(self.public(Method::POST, &["sponsorship"]).json(inquiry))
            .await
    }
}
