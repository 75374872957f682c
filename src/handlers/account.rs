//! Sign-in, sign-out and profile endpoints.

use axum::{
    extract::{Query, State},
    response::Redirect,
    Json,
};
use serde::Deserialize;

use super::{redirect_with_status, success, ApiResult, SessionView};
use crate::auth::{Credential, Provider};
use crate::models::ProfileUpdate;
use crate::AppState;

const LOGIN_SUCCESS: &str = "login_success";
const LOGIN_FAILED: &str = "login_failed";

#[derive(Debug, Deserialize)]
pub struct GoogleCallbackQuery {
    pub access_token: Option<String>,
    pub error: Option<String>,
}

/// GET /google-callback
pub async fn google_callback(
    State(state): State<AppState>,
    Query(query): Query<GoogleCallbackQuery>,
) -> Redirect {
    match (query.error, query.access_token) {
        (None, Some(token)) if !token.trim().is_empty() => {
            finish_login(&state, Credential::new(token, Provider::Google)).await
        }
        (error, _) => {
            tracing::warn!(error = ?error, "Google sign-in returned no token");
            fail_login(&state).await
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LinkedinCallbackQuery {
    #[serde(alias = "access_token")]
    pub token: Option<String>,
    pub connected: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// GET /linkedin-callback
///
/// Serves two flows: signing in with LinkedIn (`token`) and connecting the
/// posting account from the dashboard (`connected` + `state`).
pub async fn linkedin_callback(
    State(state): State<AppState>,
    Query(query): Query<LinkedinCallbackQuery>,
) -> Redirect {
    if let Some(connected) = query.connected.as_deref() {
        let nonce = query.state.as_deref().unwrap_or_default();
        let ok = connected == "true"
            && query.error.is_none()
            && state
                .dashboard
                .complete_platform_connection(nonce)
                .await
                .is_ok_and(|status| status.connected);
        let status = if ok {
            "linkedin_connected"
        } else {
            "linkedin_failed"
        };
        return redirect_with_status("/admin", status);
    }

    match (query.error, query.token) {
        (None, Some(token)) if !token.trim().is_empty() => {
            finish_login(&state, Credential::new(token, Provider::Linkedin)).await
        }
        (error, _) => {
            tracing::warn!(error = ?error, "LinkedIn sign-in returned no token");
            fail_login(&state).await
        }
    }
}

async fn finish_login(state: &AppState, credential: Credential) -> Redirect {
    let result = state
        .session
        .write()
        .await
        .establish(&state.api, credential, None)
        .await;
    if result.is_ok() {
        state.dashboard.reset().await;
    }

    match result {
        Ok(profile) if profile.is_admin => redirect_with_status("/admin", LOGIN_SUCCESS),
        Ok(_) => redirect_with_status("/", LOGIN_SUCCESS),
        Err(e) => {
            tracing::warn!("Sign-in failed: {}", e);
            fail_login(state).await
        }
    }
}

async fn fail_login(state: &AppState) -> Redirect {
    if let Err(e) = state.session.write().await.logout().await {
        tracing::warn!("Failed to clear credentials: {}", e);
    }
    redirect_with_status("/", LOGIN_FAILED)
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<SessionView> {
    let view = {
        let mut session = state.session.write().await;
        session
            .login_with_password(&state.api, &request.email, &request.password)
            .await?;
        SessionView::of(&session)
    };
    state.dashboard.reset().await;
    success(view)
}

/// POST /logout
pub async fn logout(State(state): State<AppState>) -> ApiResult<SessionView> {
    let view = {
        let mut session = state.session.write().await;
        session.logout().await?;
        SessionView::of(&session)
    };
    state.dashboard.reset().await;
    success(view)
}

/// POST /profile - Complete the profile after an OAuth sign-up.
pub async fn complete_profile(
    State(state): State<AppState>,
    Json(update): Json<ProfileUpdate>,
) -> ApiResult<SessionView> {
    let mut session = state.session.write().await;
    session.complete_profile(&state.api, update).await?;
    success(SessionView::of(&session))
}

/// GET /session - Current session. Reading it consumes a pending login prompt.
pub async fn current_session(State(state): State<AppState>) -> ApiResult<SessionView> {
    let mut session = state.session.write().await;
    let view = SessionView::of(&session);
    session.take_login_prompt();
    success(view)
}
