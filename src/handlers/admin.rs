//! `/admin` endpoints. Every route here sits behind [`require_admin`].

use axum::{
    extract::{Multipart, Path, Query, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Local, Utc};
use serde::{Deserialize, Serialize};

use super::{render, success, ApiResult, Page};
use crate::dashboard::{DashboardView, EventDraft, Tab};
use crate::errors::PortalError;
use crate::forms::{EventForm, FormEdit, UploadTarget};
use crate::models::{
    CaptionUpdate, EntityId, Event, EventImage, ImageType, PlatformStatus, PostReceipt,
    Registration, UploadedImage,
};
use crate::routes::Route;
use crate::AppState;

/// Gate: no session is a 401, a non-admin session is a 403.
pub async fn require_admin(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let (authenticated, admin) = {
        let session = state.session.read().await;
        (session.is_authenticated(), session.is_admin())
    };

    if !authenticated {
        return PortalError::Unauthorized("Please log in to continue".to_string()).into_response();
    }
    if !admin {
        tracing::debug!(path = %request.uri().path(), "Non-admin denied");
        return PortalError::Forbidden("Admin access required".to_string()).into_response();
    }
    next.run(request).await
}

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    pub tab: Option<String>,
    pub page: Option<usize>,
}

impl DashboardQuery {
    fn tab(&self) -> Result<Option<Tab>, PortalError> {
        match self.tab.as_deref() {
            None => Ok(None),
            Some(raw) => Tab::parse(raw)
                .map(Some)
                .ok_or_else(|| PortalError::Validation(format!("Unknown tab {}", raw))),
        }
    }
}

/// A failed load is already surfaced as a toast; only a lost session aborts.
fn keep_unless_unauthorized(result: Result<(), PortalError>) -> Result<(), PortalError> {
    match result {
        Err(e) if e.is_unauthorized() => Err(e),
        _ => Ok(()),
    }
}

/// GET /admin?tab=&page=
pub async fn admin_dashboard(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> ApiResult<Page<DashboardView>> {
    let tab = match query.tab()? {
        Some(tab) => tab,
        None => state.dashboard.lock().await.tab,
    };
    keep_unless_unauthorized(state.dashboard.open_tab(tab).await)?;
    if let Some(page) = query.page {
        state.dashboard.set_page(tab, page).await;
    }

    let view = state.dashboard.view().await;
    render(&state, Route::Admin, view).await
}

/// POST /admin/refresh?tab= - Reload one tab, or every collection.
pub async fn refresh_dashboard(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> ApiResult<DashboardView> {
    let result = match query.tab()? {
        Some(tab) => state.dashboard.refresh(tab).await,
        None => state.dashboard.refresh_all().await,
    };
    keep_unless_unauthorized(result)?;
    success(state.dashboard.view().await)
}

/// DELETE /admin/toasts/:id
pub async fn dismiss_toast(State(state): State<AppState>, Path(id): Path<u64>) -> ApiResult<bool> {
    success(state.dashboard.dismiss_toast(id).await)
}

/// GET /admin/events/new/form - Open a blank draft.
pub async fn new_event_form(State(state): State<AppState>) -> ApiResult<EventForm> {
    let form = state.dashboard.start_draft(None, Utc::now(), &Local).await?;
    success(form)
}

/// GET /admin/events/:id/form - Open a draft prefilled from the saved event.
pub async fn edit_event_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<EventForm> {
    let form = state
        .dashboard
        .start_draft(Some(EntityId::from(id)), Utc::now(), &Local)
        .await?;
    success(form)
}

/// GET /admin/draft
pub async fn current_draft(State(state): State<AppState>) -> ApiResult<EventDraft> {
    success(state.dashboard.draft().await?)
}

/// PATCH /admin/draft
pub async fn edit_draft(
    State(state): State<AppState>,
    Json(edit): Json<FormEdit>,
) -> ApiResult<EventForm> {
    success(state.dashboard.edit_draft(edit, Utc::now()).await?)
}

/// POST /admin/draft/save
pub async fn save_draft(State(state): State<AppState>) -> ApiResult<Event> {
    success(state.dashboard.save_draft(Utc::now(), &Local).await?)
}

/// DELETE /admin/draft
pub async fn discard_draft(State(state): State<AppState>) -> ApiResult<bool> {
    success(state.dashboard.discard_draft().await)
}

/// POST /admin/events
pub async fn create_event(
    State(state): State<AppState>,
    Json(form): Json<EventForm>,
) -> ApiResult<Event> {
    let event = state.dashboard.create_event(&form, Utc::now(), &Local).await?;
    success(event)
}

/// PUT /admin/events/:id
pub async fn update_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(form): Json<EventForm>,
) -> ApiResult<Event> {
    let id = EntityId::from(id);
    let event = state
        .dashboard
        .update_event(&id, &form, Utc::now(), &Local)
        .await?;
    success(event)
}

/// DELETE /admin/events/:id
pub async fn delete_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    state.dashboard.delete_event(&EntityId::from(id)).await?;
    success(())
}

/// GET /admin/events/:id/registrations
pub async fn event_registrations(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Vec<Registration>> {
    let registrations = state
        .dashboard
        .event_registrations(&EntityId::from(id))
        .await?;
    success(registrations)
}

/// DELETE /admin/events/:event_id/registrations/:id
pub async fn delete_registration(
    State(state): State<AppState>,
    Path((event_id, id)): Path<(String, String)>,
) -> ApiResult<()> {
    state
        .dashboard
        .delete_registration(&EntityId::from(id), &EntityId::from(event_id))
        .await?;
    success(())
}

/// DELETE /admin/users/:id
pub async fn delete_user(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    state.dashboard.delete_user(&EntityId::from(id)).await?;
    success(())
}

/// DELETE /admin/volunteers/:id
pub async fn delete_volunteer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    state.dashboard.delete_volunteer(&EntityId::from(id)).await?;
    success(())
}

/// DELETE /admin/images/:name
pub async fn delete_image(State(state): State<AppState>, Path(name): Path<String>) -> ApiResult<()> {
    state.dashboard.delete_image(&name).await?;
    success(())
}

/// PUT /admin/images/:name/caption
pub async fn update_caption(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(update): Json<CaptionUpdate>,
) -> ApiResult<EventImage> {
    let image = state.dashboard.update_caption(&name, &update.caption).await?;
    success(image)
}

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    pub image_type: Option<String>,
    pub speaker_key: Option<i64>,
}

impl UploadQuery {
    /// Draft field a poster or speaker upload fills in.
    fn target(&self, image_type: ImageType) -> Option<UploadTarget> {
        match image_type {
            ImageType::Poster => Some(UploadTarget::Poster),
            ImageType::Speaker => self.speaker_key.map(UploadTarget::Speaker),
            ImageType::Event => None,
        }
    }
}

/// POST /admin/uploads?image_type=&speaker_key= - Multipart, single `file` field.
pub async fn upload_image(
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    mut multipart: Multipart,
) -> ApiResult<UploadedImage> {
    let image_type = match query.image_type.as_deref() {
        None => ImageType::Event,
        Some(raw) => ImageType::parse(raw)
            .ok_or_else(|| PortalError::Validation(format!("Unknown image type {}", raw)))?,
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| PortalError::Validation(format!("Invalid upload: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| PortalError::Validation(format!("Invalid upload: {}", e)))?;

        let uploaded = state
            .dashboard
            .upload_image(
                image_type,
                query.target(image_type),
                &file_name,
                &content_type,
                bytes.to_vec(),
            )
            .await?;
        return success(uploaded);
    }

    Err(PortalError::Validation("Please choose a file".to_string()))
}

#[derive(Debug, Deserialize)]
pub struct GenerateBody {
    pub event_id: EntityId,
}

#[derive(Debug, Serialize)]
pub struct CaptionBody {
    pub caption: String,
}

/// POST /admin/social/content
pub async fn generate_content(
    State(state): State<AppState>,
    Json(body): Json<GenerateBody>,
) -> ApiResult<CaptionBody> {
    let caption = state.dashboard.generate_content(&body.event_id).await?;
    success(CaptionBody { caption })
}

#[derive(Debug, Serialize)]
pub struct ImageBody {
    pub image_url: String,
}

/// POST /admin/social/image
pub async fn generate_image(
    State(state): State<AppState>,
    Json(body): Json<GenerateBody>,
) -> ApiResult<ImageBody> {
    let image_url = state.dashboard.generate_image(&body.event_id).await?;
    success(ImageBody { image_url })
}

/// PUT /admin/social/caption
pub async fn edit_caption(
    State(state): State<AppState>,
    Json(update): Json<CaptionUpdate>,
) -> ApiResult<CaptionBody> {
    state.dashboard.edit_caption(&update.caption).await;
    success(CaptionBody {
        caption: update.caption,
    })
}

/// GET /admin/social/status
pub async fn platform_status(State(state): State<AppState>) -> ApiResult<PlatformStatus> {
    success(state.dashboard.refresh_platform_status().await?)
}

#[derive(Debug, Serialize)]
pub struct ConnectBody {
    pub auth_url: String,
}

/// POST /admin/social/connect
pub async fn connect_platform(State(state): State<AppState>) -> ApiResult<ConnectBody> {
    let auth_url = state.dashboard.connect_platform().await?;
    success(ConnectBody { auth_url })
}

/// POST /admin/social/post
pub async fn publish_post(State(state): State<AppState>) -> ApiResult<PostReceipt> {
    success(state.dashboard.publish_post().await?)
}
