//! Content assistant operations on the dashboard.

use chrono::Utc;

use super::DashboardHandle;
use crate::errors::PortalError;
use crate::models::{EntityId, PlatformStatus, PostReceipt, SocialPost};

impl DashboardHandle {
    /// Generate a caption for `event_id`. Replaces any previous caption.
    pub async fn generate_content(&self, event_id: &EntityId) -> Result<String, PortalError> {
        self.lock().await.assistant.select_event(event_id.clone());

        let target = event_id.clone();
        let generated = self
            .call("Failed to generate content", |api, credential| async move {
                api.generate_content(&credential, &target).await
            })
            .await?;

        let mut dashboard = self.lock().await;
        // The admin may have switched events while the request was in flight.
        if dashboard.assistant.selected_event() != Some(event_id) {
            tracing::debug!(event_id = %event_id, "Discarding generated content for deselected event");
            return Ok(dashboard.assistant.caption().to_string());
        }
        dashboard.assistant.apply_generated_content(&generated.content);
        Ok(dashboard.assistant.caption().to_string())
    }

    pub async fn generate_image(&self, event_id: &EntityId) -> Result<String, PortalError> {
        self.lock().await.assistant.select_event(event_id.clone());

        let target = event_id.clone();
        let generated = self
            .call("Failed to generate image", |api, credential| async move {
                api.generate_image(&credential, &target).await
            })
            .await?;

        let mut dashboard = self.lock().await;
        if dashboard.assistant.selected_event() == Some(event_id) {
            dashboard.assistant.apply_generated_image(&generated.image_url);
        }
        Ok(generated.image_url)
    }

    pub async fn edit_caption(&self, caption: &str) {
        self.lock().await.assistant.set_caption(caption);
    }

    pub async fn refresh_platform_status(&self) -> Result<PlatformStatus, PortalError> {
        let status = self
            .call("Failed to check LinkedIn connection", |api, credential| async move {
                api.linkedin_status(&credential).await
            })
            .await?;

        self.lock()
            .await
            .assistant
            .set_platform_status(status.clone(), Utc::now());
        Ok(status)
    }

    /// Start connecting the posting account. Returns the authorization URL.
    pub async fn connect_platform(&self) -> Result<String, PortalError> {
        let state = self.session.write().await.begin_oauth();
        self.call("Failed to start LinkedIn connection", |api, credential| async move {
            api.linkedin_connect_url(&credential, &state).await
        })
        .await
    }

    /// Finish a connect round trip once the provider redirects back.
    pub async fn complete_platform_connection(&self, state: &str) -> Result<PlatformStatus, PortalError> {
        if !self.session.write().await.verify_oauth_state(state) {
            let err = PortalError::Validation("LinkedIn connection could not be verified".to_string());
            self.report("LinkedIn connection rejected", &err).await;
            return Err(err);
        }
        let status = self.refresh_platform_status().await?;
        if status.connected {
            self.lock().await.toasts.success("LinkedIn connected");
        }
        Ok(status)
    }

    /// Publish the current draft.
    pub async fn publish_post(&self) -> Result<PostReceipt, PortalError> {
        let (post, connected, checked) = {
            let dashboard = self.lock().await;
            let assistant = &dashboard.assistant;
            let post = SocialPost {
                content: assistant.caption().trim().to_string(),
                image_url: assistant.image_url().map(str::to_string),
                event_id: assistant.selected_event().cloned(),
            };
            (
                post,
                assistant.is_connected(Utc::now()),
                assistant.platform().is_some(),
            )
        };

        if post.content.is_empty() {
            let err = PortalError::Validation("Write or generate a caption first".to_string());
            self.report("Post rejected", &err).await;
            return Err(err);
        }

        let connected = if checked {
            connected
        } else {
            self.refresh_platform_status()
                .await?
                .is_usable(Utc::now())
        };
        if !connected {
            let err = PortalError::Validation("Connect your LinkedIn account first".to_string());
            self.report("Post rejected", &err).await;
            return Err(err);
        }

        let receipt = self
            .call("Failed to publish post", |api, credential| async move {
                api.linkedin_post(&credential, &post).await
            })
            .await?;

        let mut dashboard = self.lock().await;
        dashboard.assistant.clear_draft();
        dashboard.toasts.success("Posted to LinkedIn");
        tracing::info!(post_id = ?receipt.id, "Social post published");
        Ok(receipt)
    }
}
