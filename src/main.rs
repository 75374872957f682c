//! Community Portal
//!
//! Local presentation server for the community site: public pages, sign-in
//! and the admin dashboard, all backed by the remote REST API.

mod api;
mod auth;
mod config;
mod dashboard;
mod errors;
mod forms;
mod handlers;
mod models;
mod routes;
mod social;
mod store;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use api::ApiClient;
use auth::{Session, SharedSession};
use config::Config;
use dashboard::{Dashboard, DashboardHandle};
use store::LocalStore;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub api: ApiClient,
    pub session: SharedSession,
    pub dashboard: DashboardHandle,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config, api: ApiClient, session: SharedSession) -> Self {
        let dashboard = DashboardHandle::new(
            Dashboard::new(config.page_size, config.toast_ttl),
            api.clone(),
            session.clone(),
        );
        Self {
            api,
            session,
            dashboard,
            config: Arc::new(config),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    if config.log_json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!("Starting Community Portal");
    tracing::info!("Backend: {}", config.api_url());
    tracing::info!("Store path: {:?}", config.store_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    // Restore persisted credentials
    let pool = store::init_store(&config.store_path).await?;
    let session = Session::init(LocalStore::new(pool)).await?;
    if session.is_authenticated() {
        tracing::info!(admin = session.is_admin(), "Restored saved session");
    }

    let api = ApiClient::new(&config)?;
    let bind_addr = config.bind_addr;
    let state = AppState::new(config, api, session.into_shared());

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Server listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Admin routes
    let admin_routes = Router::new()
        .route("/", get(handlers::admin_dashboard))
        .route("/refresh", post(handlers::refresh_dashboard))
        .route("/toasts/{id}", delete(handlers::dismiss_toast))
        // Events
        .route("/events", post(handlers::create_event))
        .route("/events/new/form", get(handlers::new_event_form))
        .route("/events/{id}", put(handlers::update_event))
        .route("/events/{id}", delete(handlers::delete_event))
        .route("/events/{id}/form", get(handlers::edit_event_form))
        .route("/events/{id}/registrations", get(handlers::event_registrations))
        .route(
            "/events/{event_id}/registrations/{id}",
            delete(handlers::delete_registration),
        )
        // Draft editor
        .route(
            "/draft",
            get(handlers::current_draft)
                .patch(handlers::edit_draft)
                .delete(handlers::discard_draft),
        )
        .route("/draft/save", post(handlers::save_draft))
        // People
        .route("/users/{id}", delete(handlers::delete_user))
        .route("/volunteers/{id}", delete(handlers::delete_volunteer))
        // Images
        .route("/uploads", post(handlers::upload_image))
        .route("/images/{name}", delete(handlers::delete_image))
        .route("/images/{name}/caption", put(handlers::update_caption))
        // Social
        .route("/social/content", post(handlers::generate_content))
        .route("/social/image", post(handlers::generate_image))
        .route("/social/caption", put(handlers::edit_caption))
        .route("/social/status", get(handlers::platform_status))
        .route("/social/connect", post(handlers::connect_platform))
        .route("/social/post", post(handlers::publish_post))
        // Gate every admin route
        .layer(middleware::from_fn_with_state(
            state.clone(),
            handlers::require_admin,
        ));

    // Public pages
    let page_routes = Router::new()
        .route("/", get(handlers::home))
        .route("/about", get(handlers::about))
        .route("/events", get(handlers::list_events))
        .route("/events/{slug}", get(handlers::event_detail))
        .route("/gallery", get(handlers::gallery))
        .route(
            "/get-involved",
            get(handlers::get_involved).post(handlers::submit_volunteer),
        )
        .route(
            "/sponsorship",
            get(handlers::sponsorship).post(handlers::submit_sponsorship),
        )
        .route("/sponsorship/success", get(handlers::sponsorship_success))
        .route(
            "/contact",
            get(handlers::contact).post(handlers::submit_contact),
        );

    // Session
    let session_routes = Router::new()
        .route("/google-callback", get(handlers::google_callback))
        .route("/linkedin-callback", get(handlers::linkedin_callback))
        .route("/login", post(handlers::login))
        .route("/logout", post(handlers::logout))
        .route("/profile", post(handlers::complete_profile))
        .route("/session", get(handlers::current_session));

    // Health check
    let health_routes = Router::new().route("/health", get(handlers::health_check));

    Router::new()
        .nest("/admin", admin_routes)
        .merge(page_routes)
        .merge(session_routes)
        .merge(health_routes)
        .fallback(handlers::not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests;
