//! Image upload and gallery endpoints.

use reqwest::multipart::{Form, Part};
use reqwest::Method;

use super::ApiClient;
use crate::auth::Credential;
use crate::errors::PortalError;
use crate::models::{CaptionUpdate, EventImage, ImageType, UploadedImage};

impl ApiClient {
    /// POST /images/upload?image_type= - Multipart upload with a single `file` field.
    pub async fn upload_image(
        &self,
        credential: &Credential,
        image_type: ImageType,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadedImage, PortalError> {
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(content_type)
            .map_err(|_| PortalError::Validation(format!("Unsupported content type {}", content_type)))?;
        let form = Form::new().part("file", part);

        let request = self
            .authed(Method::POST, &["images", "upload"], credential)
            .query(&[("image_type", image_type.as_str())])
            .multipart(form);
        self.send_json(request).await
    }

    /// GET /images - Gallery listing, public.
    pub async fn list_images(&self) -> Result<Vec<EventImage>, PortalError> {
        self.send_json(self.public(Method::GET, &["images"])).await
    }

    /// DELETE /images/:name
    pub async fn delete_image(&self, credential: &Credential, name: &str) -> Result<(), PortalError> {
        let path = ["images", name];
        self.send_empty(self.authed(Method::DELETE, &path, credential))
            .await
    }

    /// PUT /images/:name/caption - Captions are stored apart from the binary.
    pub async fn update_caption(
        &self,
        credential: &Credential,
        name: &str,
        caption: &str,
    ) -> Result<EventImage, PortalError> {
        let path = ["images", name, "caption"];
        let body = CaptionUpdate {
            caption: caption.to_string(),
        };
        let request = self.authed(Method::PUT, &path, credential).json(&body);
        self.send_json(request).await
    }
}
