//! Identity-provider token decoding.
//!
//! The payload segment is base64url-decoded and read as JSON. The signature is
//! NOT verified: these claims feed display fields only. Admin privilege always
//! comes from the backend's admin check.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;

use crate::errors::PortalError;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserMetadata {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppMetadata {
    #[serde(default)]
    pub provider: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdentityClaims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: UserMetadata,
    #[serde(default)]
    pub app_metadata: AppMetadata,
    #[serde(default)]
    pub exp: Option<i64>,
}

/// Claims read from a token without checking its signature.
#[derive(Debug, Clone)]
pub struct UnverifiedClaims(IdentityClaims);

impl UnverifiedClaims {
    pub fn decode(token: &str) -> Result<Self, PortalError> {
        let mut parts = token.split('.');
        let payload = match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(_), Some(payload), Some(_), None) => payload,
            _ => {
                return Err(PortalError::Decode(
                    "Token is not a three-part JWT".to_string(),
                ))
            }
        };

        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| PortalError::Decode(format!("Token payload is not base64url: {}", e)))?;

        let claims: IdentityClaims = serde_json::from_slice(&bytes)?;
        Ok(Self(claims))
    }

    pub fn claims(&self) -> &IdentityClaims {
        &self.0
    }

    pub fn subject(&self) -> &str {
        &self.0.sub
    }

    pub fn email(&self) -> Option<&str> {
        self.0.email.as_deref()
    }

    pub fn provider(&self) -> Option<&str> {
        self.0.app_metadata.provider.as_deref()
    }

    pub fn avatar_url(&self) -> Option<&str> {
        let meta = &self.0.user_metadata;
        meta.avatar_url.as_deref().or(meta.picture.as_deref())
    }

    /// Full name, then name, then the local part of the email.
    pub fn display_name(&self) -> String {
        let meta = &self.0.user_metadata;
        meta.full_name
            .as_deref()
            .or(meta.name.as_deref())
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .or_else(|| {
                self.email()
                    .and_then(|e| e.split('@').next())
                    .filter(|local| !local.is_empty())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| "Member".to_string())
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.0.exp.and_then(|exp| Utc.timestamp_opt(exp, 0).single())
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|exp| exp <= now)
    }
}

#[cfg(test)]
pub(crate) fn encode_test_token(payload: &serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{}.{}.signature", header, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_claims() {
        let token = encode_test_token(&json!({
            "sub": "user-1",
            "email": "ada@example.org",
            "user_metadata": {"full_name": "Ada Lovelace", "picture": "https://img/ada.png"},
            "app_metadata": {"provider": "google"},
            "exp": 4_102_444_800i64
        }));

        let claims = UnverifiedClaims::decode(&token).unwrap();
        assert_eq!(claims.subject(), "user-1");
        assert_eq!(claims.display_name(), "Ada Lovelace");
        assert_eq!(claims.provider(), Some("google"));
        assert_eq!(claims.avatar_url(), Some("https://img/ada.png"));
        assert!(!claims.is_expired(Utc::now()));
    }

    #[test]
    fn test_display_name_falls_back_to_email() {
        let token = encode_test_token(&json!({"sub": "x", "email": "grace@example.org"}));
        let claims = UnverifiedClaims::decode(&token).unwrap();
        assert_eq!(claims.display_name(), "grace");

        let token = encode_test_token(&json!({"sub": "x"}));
        let claims = UnverifiedClaims::decode(&token).unwrap();
        assert_eq!(claims.display_name(), "Member");
    }

    #[test]
    fn test_expired_token() {
        let token = encode_test_token(&json!({"sub": "x", "exp": 1}));
        let claims = UnverifiedClaims::decode(&token).unwrap();
        assert!(claims.is_expired(Utc::now()));
    }

    #[test]
    fn test_rejects_malformed_tokens() {
        assert!(UnverifiedClaims::decode("opaque-token").is_err());
        assert!(UnverifiedClaims::decode("a.b.c.d").is_err());
        assert!(UnverifiedClaims::decode("a.!!!.c").is_err());
        let not_json = format!("a.{}.c", URL_SAFE_NO_PAD.encode("hello"));
        assert!(UnverifiedClaims::decode(&not_json).is_err());
    }
}
