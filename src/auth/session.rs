//! The auth context: current credential, profile summary and login prompt.
//!
//! One `Session` exists per process and is handed to every consumer through
//! shared state. It is initialized from the store at startup and torn down on
//! logout or on the first 401.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use subtle::ConstantTimeEq;
use tokio::sync::RwLock;

use super::credential::{Credential, Provider};
use super::token::UnverifiedClaims;
use crate::api::ApiClient;
use crate::errors::PortalError;
use crate::models::{require_email, require_text, ProfileUpdate, User};
use crate::store::{LocalStore, TOKEN_KEY, USER_KEY};

pub type SharedSession = Arc<RwLock<Session>>;

/// Profile summary persisted under the user key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    pub provider: Provider,
    #[serde(default)]
    pub is_admin: bool,
}

impl UserProfile {
    /// OAuth sign-ups arrive without a company; the site asks for it once.
    pub fn needs_completion(&self) -> bool {
        self.name.trim().is_empty()
            || self
                .company_name
                .as_deref()
                .map_or(true, |c| c.trim().is_empty())
    }
}

pub struct Session {
    store: LocalStore,
    credential: Option<Credential>,
    profile: Option<UserProfile>,
    login_prompt: bool,
    oauth_state: Option<String>,
}

impl Session {
    /// Restore the session from persisted credentials.
    pub async fn init(store: LocalStore) -> Result<Self, PortalError> {
        let mut session = Self {
            store,
            credential: None,
            profile: None,
            login_prompt: false,
            oauth_state: None,
        };
        session.reload().await?;
        Ok(session)
    }

    pub fn into_shared(self) -> SharedSession {
        Arc::new(RwLock::new(self))
    }

    /// Re-read both keys from the store. A half-present pair is cleared.
    pub async fn reload(&mut self) -> Result<(), PortalError> {
        let bundle: Option<Value> = self.store.get(TOKEN_KEY).await?;
        let credential = bundle.as_ref().and_then(Credential::from_stored);
        let profile: Option<UserProfile> = self.store.get(USER_KEY).await?;

        match (credential, profile) {
            (Some(credential), Some(profile)) => {
                self.credential = Some(credential);
                self.profile = Some(profile);
            }
            (None, None) => {
                self.credential = None;
                self.profile = None;
            }
            _ => {
                tracing::warn!("Persisted credentials are incomplete; clearing them");
                self.store.clear_credentials().await?;
                self.credential = None;
                self.profile = None;
            }
        }
        Ok(())
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    pub fn require_credential(&self) -> Result<Credential, PortalError> {
        self.credential
            .clone()
            .ok_or_else(|| PortalError::Unauthorized("Please log in to continue".to_string()))
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.credential.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.profile.as_ref().is_some_and(|p| p.is_admin)
    }

    /// Adopt a freshly obtained credential.
    ///
    /// Display identity comes from `known` (a backend user record) or from the
    /// token's unverified claims; admin status comes from the backend only.
    pub async fn establish(
        &mut self,
        api: &ApiClient,
        credential: Credential,
        known: Option<&User>,
    ) -> Result<UserProfile, PortalError> {
        let claims = UnverifiedClaims::decode(credential.token()).ok();
        if claims.as_ref().is_some_and(|c| c.is_expired(Utc::now())) {
            return Err(PortalError::Unauthorized("Token has expired".to_string()));
        }

        let is_admin = api.check_admin(&credential).await?;
        let profile = build_profile(&credential, claims.as_ref(), known, is_admin);

        self.store.set(TOKEN_KEY, &credential.to_stored()).await?;
        self.store.set(USER_KEY, &profile).await?;
        self.login_prompt = false;

        // Consumers read the store, not this call's locals.
        self.reload().await?;

        tracing::info!(
            provider = credential.provider().as_str(),
            admin = is_admin,
            "Session established"
        );
        Ok(profile)
    }

    pub async fn login_with_password(
        &mut self,
        api: &ApiClient,
        email: &str,
        password: &str,
    ) -> Result<UserProfile, PortalError> {
        require_email(email)?;
        require_text("Password", password)?;

        let login = api.login(email.trim(), password).await?;
        let credential = Credential::new(login.access_token, Provider::Email);
        self.establish(api, credential, login.user.as_ref()).await
    }

    pub async fn complete_profile(
        &mut self,
        api: &ApiClient,
        update: ProfileUpdate,
    ) -> Result<UserProfile, PortalError> {
        require_text("Name", &update.name)?;
        let credential = self.require_credential()?;
        let Some(mut profile) = self.profile.clone() else {
            return Err(PortalError::Unauthorized(
                "Please log in to continue".to_string(),
            ));
        };

        let user = api.complete_profile(&credential, &update).await?;
        profile.name = user.display_name().to_string();
        profile.company_name = user.company_name.or(update.company_name);

        self.store.set(USER_KEY, &profile).await?;
        self.profile = Some(profile.clone());
        Ok(profile)
    }

    pub async fn logout(&mut self) -> Result<(), PortalError> {
        self.store.clear_credentials().await?;
        self.credential = None;
        self.profile = None;
        self.login_prompt = false;
        tracing::info!("Logged out");
        Ok(())
    }

    /// React to a 401: drop credentials and raise the login prompt.
    ///
    /// Returns `true` only for the call that actually ended a session, so
    /// overlapping failures open the prompt once.
    pub async fn handle_unauthorized(&mut self) -> bool {
        let had_session = self.credential.is_some();
        self.credential = None;
        self.profile = None;
        if let Err(e) = self.store.clear_credentials().await {
            tracing::warn!("Failed to clear credentials after 401: {}", e);
        }

        if had_session && !self.login_prompt {
            tracing::info!("Session rejected by backend; prompting for login");
            self.login_prompt = true;
            return true;
        }
        false
    }

    pub fn login_prompt_pending(&self) -> bool {
        self.login_prompt
    }

    /// Consume the prompt flag once the login modal has been shown.
    pub fn take_login_prompt(&mut self) -> bool {
        std::mem::take(&mut self.login_prompt)
    }

    /// Issue a single-use OAuth `state` value.
    pub fn begin_oauth(&mut self) -> String {
        let state = uuid::Uuid::new_v4().to_string();
        self.oauth_state = Some(state.clone());
        state
    }

    /// Check a returned `state` against the issued one. Consumes it either way.
    pub fn verify_oauth_state(&mut self, provided: &str) -> bool {
        match self.oauth_state.take() {
            Some(expected) => constant_time_compare(provided, &expected),
            None => false,
        }
    }
}

fn build_profile(
    credential: &Credential,
    claims: Option<&UnverifiedClaims>,
    known: Option<&User>,
    is_admin: bool,
) -> UserProfile {
    let id = known
        .map(|u| u.id.to_string())
        .or_else(|| claims.map(|c| c.subject().to_string()))
        .unwrap_or_default();
    let email = known
        .map(|u| u.email.clone())
        .or_else(|| claims.and_then(|c| c.email()).map(str::to_string))
        .unwrap_or_default();
    let name = known
        .and_then(|u| u.name.clone())
        .filter(|n| !n.trim().is_empty())
        .or_else(|| claims.map(UnverifiedClaims::display_name))
        .unwrap_or_else(|| "Member".to_string());
    let company_name = known.and_then(|u| u.company_name.clone()).or_else(|| {
        claims.and_then(|c| c.claims().user_metadata.company_name.clone())
    });
    // The account's own provider, not necessarily the one used this time.
    let provider = known
        .and_then(|u| u.provider.as_deref())
        .or_else(|| claims.and_then(UnverifiedClaims::provider))
        .and_then(Provider::parse)
        .unwrap_or_else(|| credential.provider());

    UserProfile {
        id,
        email,
        name,
        avatar_url: claims.and_then(|c| c.avatar_url()).map(str::to_string),
        company_name,
        provider,
        is_admin,
    }
}

/// Perform constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::token::encode_test_token;
    use crate::store::init_store;
    use serde_json::json;
    use tempfile::TempDir;

    async fn store() -> (LocalStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let pool = init_store(&dir.path().join("s.sqlite")).await.unwrap();
        (LocalStore::new(pool), dir)
    }

    fn profile() -> UserProfile {
        UserProfile {
            id: "u1".into(),
            email: "ada@example.org".into(),
            name: "Ada".into(),
            avatar_url: None,
            company_name: None,
            provider: Provider::Google,
            is_admin: true,
        }
    }

    #[tokio::test]
    async fn test_init_restores_persisted_pair() {
        let (store, _dir) = store().await;
        store
            .set(TOKEN_KEY, &json!({"access_token": "tok", "provider": "google"}))
            .await
            .unwrap();
        store.set(USER_KEY, &profile()).await.unwrap();

        let session = Session::init(store).await.unwrap();
        assert!(session.is_authenticated());
        assert!(session.is_admin());
        assert_eq!(session.credential().unwrap().token(), "tok");
    }

    #[tokio::test]
    async fn test_init_clears_half_pair() {
        let (store, _dir) = store().await;
        store.set(TOKEN_KEY, &json!({"accessToken": "tok"})).await.unwrap();

        let session = Session::init(store.clone()).await.unwrap();
        assert!(!session.is_authenticated());
        assert!(store.get_raw(TOKEN_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unauthorized_prompts_exactly_once() {
        let (store, _dir) = store().await;
        store.set(TOKEN_KEY, &json!({"accessToken": "tok"})).await.unwrap();
        store.set(USER_KEY, &profile()).await.unwrap();
        let mut session = Session::init(store.clone()).await.unwrap();

        assert!(session.handle_unauthorized().await);
        assert!(!session.handle_unauthorized().await);
        assert!(!session.is_authenticated());
        assert!(store.get_raw(TOKEN_KEY).await.unwrap().is_none());
        assert!(store.get_raw(USER_KEY).await.unwrap().is_none());

        assert!(session.take_login_prompt());
        assert!(!session.take_login_prompt());
    }

    #[tokio::test]
    async fn test_oauth_state_is_single_use() {
        let (store, _dir) = store().await;
        let mut session = Session::init(store).await.unwrap();

        assert!(!session.verify_oauth_state("anything"));
        let state = session.begin_oauth();
        assert!(!session.verify_oauth_state("wrong"));
        // The failed attempt consumed it.
        assert!(!session.verify_oauth_state(&state));

        let state = session.begin_oauth();
        assert!(session.verify_oauth_state(&state));
        assert!(!session.verify_oauth_state(&state));
    }

    #[test]
    fn test_build_profile_prefers_backend_user() {
        let token = encode_test_token(&json!({
            "sub": "idp-1",
            "email": "claims@example.org",
            "user_metadata": {"full_name": "Claimed Name"}
        }));
        let claims = UnverifiedClaims::decode(&token).unwrap();
        let cred = Credential::new(token, Provider::Google);

        let from_claims = build_profile(&cred, Some(&claims), None, false);
        assert_eq!(from_claims.id, "idp-1");
        assert_eq!(from_claims.name, "Claimed Name");
        assert!(!from_claims.is_admin);
        assert!(from_claims.needs_completion());

        let user: User = serde_json::from_value(json!({
            "id": 5, "email": "real@example.org", "name": "Real Name", "company_name": "Acme"
        }))
        .unwrap();
        let from_user = build_profile(&cred, Some(&claims), Some(&user), true);
        assert_eq!(from_user.id, "5");
        assert_eq!(from_user.email, "real@example.org");
        assert_eq!(from_user.name, "Real Name");
        assert!(from_user.is_admin);
        assert!(!from_user.needs_completion());
    }

    #[test]
    fn test_build_profile_reads_provider_claim() {
        let token = encode_test_token(&json!({
            "sub": "idp-2",
            "app_metadata": {"provider": "linkedin_oidc"}
        }));
        let claims = UnverifiedClaims::decode(&token).unwrap();
        let cred = Credential::new(token, Provider::Email);
        assert_eq!(
            build_profile(&cred, Some(&claims), None, false).provider,
            Provider::Linkedin
        );

        let token = encode_test_token(&json!({"sub": "idp-3", "app_metadata": {"provider": "saml"}}));
        let claims = UnverifiedClaims::decode(&token).unwrap();
        let cred = Credential::new(token, Provider::Google);
        assert_eq!(
            build_profile(&cred, Some(&claims), None, false).provider,
            Provider::Google
        );
        assert_eq!(build_profile(&cred, None, None, false).provider, Provider::Google);
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("state-123", "state-123"));
        assert!(!constant_time_compare("state-123", "state-124"));
        assert!(!constant_time_compare("short", "much-longer-state"));
    }
}
