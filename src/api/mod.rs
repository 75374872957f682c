//! Backend REST client.
//!
//! Every call goes to `base + prefix + path`, each path segment
//! percent-encoded by `Url`. Authenticated calls carry
//! `Authorization: Bearer <token>`. Responses may be bare JSON or wrapped in
//! `{ "data": ... }`; both are accepted.

mod account;
mod events;
mod images;
mod people;
mod social;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::auth::Credential;
use crate::config::Config;
use crate::errors::{extract_message, PortalError};

/// Response body, either bare or inside a `data` envelope.
#[derive(Deserialize)]
#[serde(untagged)]
enum Payload<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Payload<T> {
    fn into_inner(self) -> T {
        match self {
            Payload::Wrapped { data } => data,
            Payload::Bare(value) => value,
        }
    }
}

/// Client for the backend REST API.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
}

fn parse_base_url(raw: &str) -> Result<Url, PortalError> {
    let url = Url::parse(raw)
        .map_err(|e| PortalError::Config(format!("Invalid backend URL {}: {}", raw, e)))?;
    if url.cannot_be_a_base() {
        return Err(PortalError::Config(format!("Backend URL {} cannot take a path", raw)));
    }
    Ok(url)
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self, PortalError> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| PortalError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: parse_base_url(&config.api_url())?,
        })
    }

    /// Client against an explicit base URL (prefix included).
    #[cfg(test)]
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: parse_base_url(base_url).expect("valid base URL"),
        }
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Checked in `parse_base_url`.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn public(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        self.http.request(method, self.url(segments))
    }

    fn authed(&self, method: Method, segments: &[&str], credential: &Credential) -> RequestBuilder {
        self.public(method, segments).bearer_auth(credential.token())
    }

    /// Send and decode a JSON body.
    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, PortalError> {
        let response = self.send(request).await?;
        let bytes = response.bytes().await?;
        let payload: Payload<T> = serde_json::from_slice(&bytes)?;
        Ok(payload.into_inner())
    }

    /// Send and discard the body.
    async fn send_empty(&self, request: RequestBuilder) -> Result<(), PortalError> {
        self.send(request).await.map(|_| ())
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, PortalError> {
        let request = request.build()?;
        let method = request.method().clone();
        let path = request.url().path().to_string();

        let response = self.http.execute(request).await?;
        let status = response.status();
        tracing::debug!(%method, %path, status = status.as_u16(), "Backend request");

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = extract_message(status.as_u16(), &body);
        Err(match status {
            StatusCode::UNAUTHORIZED => PortalError::Unauthorized(message),
            StatusCode::FORBIDDEN => PortalError::Forbidden(message),
            StatusCode::NOT_FOUND => PortalError::NotFound(message),
            _ => PortalError::Request {
                status: status.as_u16(),
                message,
            },
        })
    }
}
