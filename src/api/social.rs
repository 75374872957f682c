//! LinkedIn posting and AI generation endpoints.

use reqwest::Method;

use super::ApiClient;
use crate::auth::Credential;
use crate::errors::PortalError;
use crate::models::{
    ConnectUrl, EntityId, GenerateRequest, GeneratedContent, GeneratedImage, PlatformStatus,
    PostReceipt, SocialPost,
};

impl ApiClient {
    /// GET /linkedin/connect?state= - Authorization URL for connecting the account.
    pub async fn linkedin_connect_url(
        &self,
        credential: &Credential,
        state: &str,
    ) -> Result<String, PortalError> {
        let request = self
            .authed(Method::GET, &["linkedin", "connect"], credential)
            .query(&[("state", state)]);
        let connect: ConnectUrl = self.send_json(request).await?;
        Ok(connect.auth_url)
    }

    /// GET /linkedin/status
    pub async fn linkedin_status(&self, credential: &Credential) -> Result<PlatformStatus, PortalError> {
        self.send_json(self.authed(Method::GET, &["linkedin", "status"], credential))
            .await
    }

    /// POST /linkedin/post
    pub async fn linkedin_post(
        &self,
        credential: &Credential,
        post: &SocialPost,
    ) -> Result<PostReceipt, PortalError> {
        let request = self.authed(Method::POST, &["linkedin", "post"], credential).json(post);
        self.send_json(request).await
    }

    /// POST /ai/generate-content
    pub async fn generate_content(
        &self,
        credential: &Credential,
        event_id: &EntityId,
    ) -> Result<GeneratedContent, PortalError> {
        let body = GenerateRequest {
            event_id: event_id.clone(),
        };
        let request = self
            .authed(Method::POST, &["ai", "generate-content"], credential)
            .json(&body);
        self.send_json(request).await
    }

    /// POST /ai/generate-image
    pub async fn generate_image(
        &self,
        credential: &Credential,
        event_id: &EntityId,
    ) -> Result<GeneratedImage, PortalError> {
        let body = GenerateRequest {
            event_id: event_id.clone(),
        };
        let request = self
            .authed(Method::POST, &["ai", "generate-image"], credential)
            .json(&body);
        self.send_json(request).await
    }
}
