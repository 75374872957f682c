//! Public pages and form submissions.

use axum::{
    extract::{Path, Query, State},
    response::Redirect,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{render, success, ApiResult, Page};
use crate::dashboard::{Collection, PageView};
use crate::errors::PortalError;
use crate::models::{ContactMessage, Event, EventImage, SponsorshipInquiry, VolunteerApplication};
use crate::routes::Route;
use crate::AppState;

/// How many upcoming events the home page features.
const FEATURED_EVENTS: usize = 3;

const VOLUNTEER_ROLES: &[&str] = &[
    "Registration",
    "Setup",
    "Speaker support",
    "Photography",
    "Social media",
];

const SPONSOR_TIERS: &[&str] = &["Community", "Silver", "Gold", "Platinum"];

#[derive(Debug, Clone, Serialize)]
pub struct EventCard {
    #[serde(flatten)]
    pub event: Event,
    pub slug: String,
    pub badge: Option<&'static str>,
    pub spots_left: i64,
}

impl EventCard {
    pub fn new(event: &Event) -> Self {
        Self {
            slug: event.slug(),
            badge: event.badge(),
            spots_left: event.spots_left(),
            event: event.clone(),
        }
    }
}

/// Public lists degrade to empty when the backend is unreachable.
async fn public_events(state: &AppState) -> Vec<Event> {
    match state.api.list_events().await {
        Ok(mut events) => {
            events.sort_by_key(|e| e.date_time);
            events
        }
        Err(e) => {
            tracing::warn!("Failed to load events: {}", e);
            Vec::new()
        }
    }
}

#[derive(Serialize)]
pub struct HomeContent {
    pub upcoming: Vec<EventCard>,
}

/// GET /
pub async fn home(State(state): State<AppState>) -> ApiResult<Page<HomeContent>> {
    let now = Utc::now();
    let upcoming = public_events(&state)
        .await
        .iter()
        .filter(|e| e.is_upcoming(now))
        .take(FEATURED_EVENTS)
        .map(EventCard::new)
        .collect();
    render(&state, Route::Home, HomeContent { upcoming }).await
}

#[derive(Serialize)]
pub struct AboutContent {
    pub heading: &'static str,
}

/// GET /about
pub async fn about(State(state): State<AppState>) -> ApiResult<Page<AboutContent>> {
    let content = AboutContent {
        heading: "About the community",
    };
    render(&state, Route::About, content).await
}

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    pub page: Option<usize>,
    pub tag: Option<String>,
}

#[derive(Serialize)]
pub struct EventsContent {
    pub tag: Option<String>,
    pub events: PageView<EventCard>,
}

/// GET /events?page=&tag=
pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> ApiResult<Page<EventsContent>> {
    let tag = query.tag.filter(|t| !t.trim().is_empty());
    let events: Vec<Event> = public_events(&state)
        .await
        .into_iter()
        .filter(|e| tag.as_deref().map_or(true, |t| e.has_tag(t)))
        .collect();

    let mut list = Collection::new(state.config.page_size);
    let ticket = list.begin_fetch();
    list.finish_fetch(ticket, Some(events));
    list.set_page(query.page.unwrap_or(1));

    let content = EventsContent {
        tag,
        events: list.view(EventCard::new),
    };
    render(&state, Route::Events, content).await
}

/// GET /events/:slug
pub async fn event_detail(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Page<EventCard>> {
    let event = state.api.event_by_slug(&slug).await?;
    render(&state, Route::EventDetail { slug }, EventCard::new(&event)).await
}

#[derive(Serialize)]
pub struct GalleryContent {
    pub images: Vec<EventImage>,
}

/// GET /gallery
pub async fn gallery(State(state): State<AppState>) -> ApiResult<Page<GalleryContent>> {
    let images = state.api.list_images().await.unwrap_or_else(|e| {
        tracing::warn!("Failed to load gallery: {}", e);
        Vec::new()
    });
    render(&state, Route::Gallery, GalleryContent { images }).await
}

#[derive(Serialize)]
pub struct GetInvolvedContent {
    pub roles: &'static [&'static str],
}

/// GET /get-involved
pub async fn get_involved(State(state): State<AppState>) -> ApiResult<Page<GetInvolvedContent>> {
    let content = GetInvolvedContent {
        roles: VOLUNTEER_ROLES,
    };
    render(&state, Route::GetInvolved, content).await
}

#[derive(Serialize)]
pub struct Submitted {
    pub message: &'static str,
}

/// POST /get-involved
pub async fn submit_volunteer(
    State(state): State<AppState>,
    Json(application): Json<VolunteerApplication>,
) -> ApiResult<Submitted> {
    application.validate()?;
    state.api.submit_volunteer_application(&application).await?;
    tracing::info!("Volunteer application submitted");
    success(Submitted {
        message: "Thanks for volunteering! We'll be in touch.",
    })
}

#[derive(Serialize)]
pub struct SponsorshipContent {
    pub tiers: &'static [&'static str],
}

/// GET /sponsorship
pub async fn sponsorship(State(state): State<AppState>) -> ApiResult<Page<SponsorshipContent>> {
    let content = SponsorshipContent {
        tiers: SPONSOR_TIERS,
    };
    render(&state, Route::Sponsorship, content).await
}

/// POST /sponsorship - Redirects to the success page.
pub async fn submit_sponsorship(
    State(state): State<AppState>,
    Json(inquiry): Json<SponsorshipInquiry>,
) -> Result<Redirect, PortalError> {
    inquiry.validate()?;
    state.api.submit_sponsorship(&inquiry).await?;
    tracing::info!(company = %inquiry.company_name, "Sponsorship inquiry submitted");
    Ok(Redirect::to("/sponsorship/success"))
}

/// GET /sponsorship/success
pub async fn sponsorship_success(State(state): State<AppState>) -> ApiResult<Page<Submitted>> {
    let content = Submitted {
        message: "Thank you for your interest in sponsoring us.",
    };
    render(&state, Route::SponsorshipSuccess, content).await
}

#[derive(Serialize)]
pub struct ContactContent {
    pub email: &'static str,
}

/// GET /contact
pub async fn contact(State(state): State<AppState>) -> ApiResult<Page<ContactContent>> {
    let content = ContactContent {
        email: "hello@community.example",
    };
    render(&state, Route::Contact, content).await
}

/// POST /contact
pub async fn submit_contact(
    State(state): State<AppState>,
    Json(message): Json<ContactMessage>,
) -> ApiResult<Submitted> {
    message.validate()?;
    state.api.submit_contact(&message).await?;
    success(Submitted {
        message: "Message sent. We'll get back to you soon.",
    })
}
