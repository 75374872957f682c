//! The single normalized credential used for every authenticated call.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// How the user signed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Email,
    Google,
    Linkedin,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Email => "email",
            Provider::Google => "google",
            Provider::Linkedin => "linkedin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "email" => Some(Provider::Email),
            "google" => Some(Provider::Google),
            "linkedin" | "linkedin_oidc" => Some(Provider::Linkedin),
            _ => None,
        }
    }
}

/// A bearer token plus the provider that issued it.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
    provider: Provider,
}

impl Credential {
    pub fn new(token: impl Into<String>, provider: Provider) -> Self {
        Self {
            token: token.into(),
            provider,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    /// Build a credential from whatever shape was persisted.
    ///
    /// Backend logins store `{ "accessToken" }`, identity-provider sessions
    /// store `{ "access_token" }` or nest it under `session`. Nothing past this
    /// function needs to know which.
    pub fn from_stored(value: &Value) -> Option<Self> {
        let token = ["accessToken", "access_token"]
            .iter()
            .find_map(|key| value.get(*key).and_then(Value::as_str))
            .or_else(|| {
                value
                    .get("session")
                    .and_then(|s| s.get("access_token"))
                    .and_then(Value::as_str)
            })
            .map(str::trim)
            .filter(|t| !t.is_empty())?;

        let provider = value
            .get("provider")
            .and_then(Value::as_str)
            .and_then(Provider::parse)
            .unwrap_or(Provider::Email);

        Some(Self::new(token, provider))
    }

    /// The bundle written to the store.
    pub fn to_stored(&self) -> Value {
        json!({
            "accessToken": self.token,
            "provider": self.provider.as_str(),
        })
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("provider", &self.provider)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_stored_shapes() {
        let backend = Credential::from_stored(&json!({"accessToken": "abc"})).unwrap();
        assert_eq!(backend.token(), "abc");
        assert_eq!(backend.provider(), Provider::Email);

        let idp = Credential::from_stored(&json!({"access_token": "def", "provider": "google"}))
            .unwrap();
        assert_eq!(idp.token(), "def");
        assert_eq!(idp.provider(), Provider::Google);

        let nested = Credential::from_stored(&json!({
            "session": {"access_token": "ghi"},
            "provider": "linkedin_oidc"
        }))
        .unwrap();
        assert_eq!(nested.token(), "ghi");
        assert_eq!(nested.provider(), Provider::Linkedin);
    }

    #[test]
    fn test_from_stored_rejects_empty() {
        assert!(Credential::from_stored(&json!({})).is_none());
        assert!(Credential::from_stored(&json!({"accessToken": "  "})).is_none());
        assert!(Credential::from_stored(&json!("abc")).is_none());
    }

    #[test]
    fn test_stored_round_trip() {
        let cred = Credential::new("tok", Provider::Google);
        assert_eq!(Credential::from_stored(&cred.to_stored()), Some(cred));
    }

    #[test]
    fn test_debug_redacts_token() {
        let cred = Credential::new("super-secret", Provider::Email);
        let debug = format!("{:?}", cred);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("redacted"));
    }
}
