//! HTTP handlers.
//!
//! Every page is served as a JSON view: the resolved route, the session
//! summary the header needs and the page content.

mod account;
mod admin;
mod pages;

pub use account::*;
pub use admin::*;
pub use pages::*;

use axum::{
    extract::State,
    http::{StatusCode, Uri},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Serialize;

use crate::auth::{Session, UserProfile};
use crate::errors::PortalError;
use crate::routes::Route;
use crate::AppState;

/// Success response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, PortalError>;

pub fn success<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(ApiResponse {
        success: true,
        data,
    })
}

/// What the page chrome knows about the current user.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub authenticated: bool,
    pub is_admin: bool,
    pub profile: Option<UserProfile>,
    pub needs_profile: bool,
    pub login_prompt: bool,
}

impl SessionView {
    pub fn of(session: &Session) -> Self {
        let profile = session.profile().cloned();
        Self {
            authenticated: session.is_authenticated(),
            is_admin: session.is_admin(),
            needs_profile: profile.as_ref().is_some_and(UserProfile::needs_completion),
            profile,
            login_prompt: session.login_prompt_pending(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Page<T: Serialize> {
    pub route: Route,
    pub title: &'static str,
    pub admin_only: bool,
    pub session: SessionView,
    pub content: T,
}

async fn page<T: Serialize>(state: &AppState, route: Route, content: T) -> Page<T> {
    let session = SessionView::of(&*state.session.read().await);
    Page {
        title: route.title(),
        admin_only: route.requires_admin(),
        route,
        session,
        content,
    }
}

pub async fn render<T: Serialize>(state: &AppState, route: Route, content: T) -> ApiResult<Page<T>> {
    success(page(state, route, content).await)
}

/// 303 to `path` with a `status` query flag.
pub fn redirect_with_status(path: &str, status: &str) -> Redirect {
    Redirect::to(&format!("{}?status={}", path, status))
}

#[derive(Serialize)]
pub struct MissingPage {
    pub path: String,
}

/// Fallback for unknown paths. Known pages with a trailing slash are
/// redirected to their canonical path.
pub async fn not_found(State(state): State<AppState>, uri: Uri) -> Response {
    let path = uri.path();
    if path.len() > 1 && path.ends_with('/') && Route::resolve(path) != Route::NotFound {
        return Redirect::permanent(path.trim_end_matches('/')).into_response();
    }

    let content = MissingPage {
        path: uri.path().to_string(),
    };
    let body = ApiResponse {
        success: false,
        data: page(&state, Route::NotFound, content).await,
    };
    (StatusCode::NOT_FOUND, Json(body)).into_response()
}

pub async fn health_check() -> &'static str {
    "OK"
}
