//! Integration tests for the portal against a mock backend.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::Utc;
use reqwest::{redirect::Policy, Client};
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::api::ApiClient;
use crate::auth::{encode_test_token, Session};
use crate::config::Config;
use crate::store::{init_store, LocalStore, TOKEN_KEY, USER_KEY};
use crate::{create_router, AppState};

type MockError = (StatusCode, Json<Value>);

/// Stand-in for the remote REST API.
#[derive(Default)]
struct MockBackend {
    events: Mutex<Vec<Value>>,
    calls: Mutex<Vec<String>>,
    admin: AtomicBool,
    reject: AtomicBool,
    drafts: AtomicUsize,
    linkedin: AtomicBool,
    slow_events: AtomicBool,
    oauth_state: Mutex<Option<String>>,
}

impl MockBackend {
    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }

    fn count(&self, call: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == call).count()
    }

    fn authorize(&self, headers: &HeaderMap) -> Result<(), MockError> {
        let bearer = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.strip_prefix("Bearer "));
        if bearer.is_none() || self.reject.load(Ordering::SeqCst) {
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(json!({"detail": "Could not validate credentials"})),
            ));
        }
        Ok(())
    }
}

type Mock = Arc<MockBackend>;

fn event_json(id: u32, title: &str, capacity: i64, attendees: i64) -> Value {
    json!({
        "id": id,
        "title": title,
        "date_time": "2031-06-01T18:00:00Z",
        "location": "Hall A",
        "capacity": capacity,
        "attendees": attendees,
        "tags": "rust, meetup"
    })
}

async fn mock_list_events(State(mock): State<Mock>, headers: HeaderMap) -> Result<Json<Value>, MockError> {
    if headers.contains_key(header::AUTHORIZATION) {
        mock.authorize(&headers)?;
    }
    mock.record("GET /events");
    let events = mock.events.lock().unwrap().clone();
    // Answers with the list as it was when the request arrived.
    if mock.slow_events.swap(false, Ordering::SeqCst) {
        tokio::time::sleep(Duration::from_millis(300)).await;
    }
    Ok(Json(json!({ "data": events })))
}

async fn mock_create_event(
    State(mock): State<Mock>,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> Result<Json<Value>, MockError> {
    mock.authorize(&headers)?;
    mock.record("POST /events");
    body["id"] = json!(100);
    mock.events.lock().unwrap().insert(0, body.clone());
    Ok(Json(body))
}

async fn mock_update_event(
    State(mock): State<Mock>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(mut body): Json<Value>,
) -> Result<Json<Value>, MockError> {
    mock.authorize(&headers)?;
    mock.record("PUT /events");
    body["id"] = json!(id);
    {
        let mut events = mock.events.lock().unwrap();
        if let Some(slot) = events.iter_mut().find(|e| e["id"].to_string() == id) {
            *slot = body.clone();
        }
    }
    Ok(Json(body))
}

async fn mock_delete_event(
    State(mock): State<Mock>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, MockError> {
    mock.authorize(&headers)?;
    mock.record("DELETE /events");
    mock.events
        .lock()
        .unwrap()
        .retain(|e| e["id"].to_string() != id);
    Ok(StatusCode::NO_CONTENT)
}

async fn mock_users(State(mock): State<Mock>, headers: HeaderMap) -> Result<Json<Value>, MockError> {
    mock.authorize(&headers)?;
    Ok(Json(json!([
        {"id": 1, "email": "ada@example.org", "name": "Ada", "role": "admin"},
        {"id": 2, "email": "lin@example.org", "registrations": [{"id": 7, "event_id": 2}]}
    ])))
}

async fn mock_volunteers(State(mock): State<Mock>, headers: HeaderMap) -> Result<Json<Value>, MockError> {
    mock.authorize(&headers)?;
    Ok(Json(json!([{
        "id": 3,
        "first_name": "Lin",
        "last_name": "Okafor",
        "email": "lin@example.org",
        "volunteer_roles": "[\"Registration\",\"Setup\"]"
    }])))
}

async fn mock_registrations(
    State(mock): State<Mock>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<Value>, MockError> {
    mock.authorize(&headers)?;
    let event_id = query.get("event_id").cloned().unwrap_or_default();
    Ok(Json(json!([{"id": 7, "event_id": event_id}])))
}

async fn mock_delete_registration(
    State(mock): State<Mock>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, MockError> {
    mock.authorize(&headers)?;
    mock.record(&format!("DELETE /admin/registrations/{}", id));
    Ok(StatusCode::NO_CONTENT)
}

async fn mock_login(State(mock): State<Mock>, Json(body): Json<Value>) -> Result<Json<Value>, MockError> {
    mock.record("POST /auth/login");
    if body["password"] != "correct-horse" {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Invalid email or password"})),
        ));
    }
    Ok(Json(json!({
        "access_token": "email-session-token",
        "user": {"id": 1, "email": body["email"], "name": "Ada", "role": "admin"}
    })))
}

async fn mock_update_profile(
    State(mock): State<Mock>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, MockError> {
    mock.authorize(&headers)?;
    mock.record("PUT /users/me");
    Ok(Json(json!({
        "id": 1,
        "email": "ada@example.org",
        "name": body["name"],
        "company_name": body["company_name"]
    })))
}

async fn mock_linkedin_connect(
    State(mock): State<Mock>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<Value>, MockError> {
    mock.authorize(&headers)?;
    let state = query.get("state").cloned().unwrap_or_default();
    *mock.oauth_state.lock().unwrap() = Some(state.clone());
    Ok(Json(json!({
        "auth_url": format!("https://linkedin.example/oauth?state={}", state)
    })))
}

async fn mock_images() -> Json<Value> {
    Json(json!([]))
}

async fn mock_admin_check(State(mock): State<Mock>, headers: HeaderMap) -> Result<Json<Value>, MockError> {
    mock.authorize(&headers)?;
    Ok(Json(json!({"is_admin": mock.admin.load(Ordering::SeqCst)})))
}

async fn mock_generate_content(
    State(mock): State<Mock>,
    headers: HeaderMap,
) -> Result<Json<Value>, MockError> {
    mock.authorize(&headers)?;
    let n = mock.drafts.fetch_add(1, Ordering::SeqCst) + 1;
    Ok(Json(json!({"content": format!("<p>Draft <b>{}</b></p>", n)})))
}

async fn mock_linkedin_status(
    State(mock): State<Mock>,
    headers: HeaderMap,
) -> Result<Json<Value>, MockError> {
    mock.authorize(&headers)?;
    Ok(Json(json!({"connected": mock.linkedin.load(Ordering::SeqCst)})))
}

async fn mock_upload(
    State(mock): State<Mock>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Result<Json<Value>, MockError> {
    mock.authorize(&headers)?;
    mock.record("POST /images/upload");
    assert!(!body.is_empty());
    Ok(Json(json!({"url": "https://cdn.example/poster.png", "name": "poster.png"})))
}

async fn mock_sponsorship(State(mock): State<Mock>) -> StatusCode {
    mock.record("POST /sponsorship");
    StatusCode::CREATED
}

fn mock_router(mock: Mock) -> Router {
    Router::new()
        .route("/api/v1/events", get(mock_list_events).post(mock_create_event))
        .route(
            "/api/v1/events/{id}",
            put(mock_update_event).delete(mock_delete_event),
        )
        .route("/api/v1/admin/registrations", get(mock_registrations))
        .route(
            "/api/v1/admin/registrations/{id}",
            delete(mock_delete_registration),
        )
        .route("/api/v1/auth/login", post(mock_login))
        .route("/api/v1/users/me", put(mock_update_profile))
        .route("/api/v1/linkedin/connect", get(mock_linkedin_connect))
        .route("/api/v1/admin/users", get(mock_users))
        .route("/api/v1/admin/volunteers", get(mock_volunteers))
        .route("/api/v1/images", get(mock_images))
        .route("/api/v1/images/upload", post(mock_upload))
        .route("/api/v1/auth/admin-check", get(mock_admin_check))
        .route("/api/v1/ai/generate-content", post(mock_generate_content))
        .route("/api/v1/linkedin/status", get(mock_linkedin_status))
        .route("/api/v1/sponsorship", post(mock_sponsorship))
        .with_state(mock)
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("Failed to get addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Test fixture: a mock backend, a portal wired to it and a client.
struct TestFixture {
    client: Client,
    base_url: String,
    mock: Mock,
    state: AppState,
    store: LocalStore,
    _temp_dir: TempDir,
}

impl TestFixture {
    async fn new() -> Self {
        Self::with_page_size(10).await
    }

    async fn with_page_size(page_size: usize) -> Self {
        let mock = Arc::new(MockBackend::default());
        mock.admin.store(true, Ordering::SeqCst);
        *mock.events.lock().unwrap() = vec![
            event_json(1, "Rust Meetup", 30, 30),
            event_json(2, "Async Workshop", 20, 5),
            event_json(3, "Community Picnic", 50, 10),
        ];
        let backend_url = serve(mock_router(mock.clone())).await;

        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store_path = temp_dir.path().join("portal.sqlite");
        let pool = init_store(&store_path).await.expect("Failed to init store");
        let store = LocalStore::new(pool);
        let session = Session::init(store.clone()).await.expect("Failed to init session");

        let config = Config {
            api_base_url: backend_url,
            api_prefix: "/api/v1".to_string(),
            store_path,
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "warn".to_string(),
            log_json: false,
            request_timeout: Duration::from_secs(5),
            page_size,
            toast_ttl: Duration::from_secs(60),
        };
        let api = ApiClient::new(&config).expect("Failed to build client");
        let state = AppState::new(config, api, session.into_shared());
        let base_url = serve(create_router(state.clone())).await;

        TestFixture {
            client: Client::builder().redirect(Policy::none()).build().unwrap(),
            base_url,
            mock,
            state,
            store,
            _temp_dir: temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn sign_in(&self) -> reqwest::Response {
        let token = encode_test_token(&json!({
            "sub": "u-1",
            "email": "ada@example.org",
            "user_metadata": {"full_name": "Ada Lovelace"},
            "app_metadata": {"provider": "google"},
            "exp": Utc::now().timestamp() + 3600
        }));
        self.client
            .get(self.url(&format!("/google-callback?access_token={}", token)))
            .send()
            .await
            .unwrap()
    }

    async fn get_json(&self, path: &str) -> (StatusCode, Value) {
        let resp = self.client.get(self.url(path)).send().await.unwrap();
        let status = StatusCode::from_u16(resp.status().as_u16()).unwrap();
        (status, resp.json().await.unwrap())
    }
}

fn location(resp: &reqwest::Response) -> &str {
    resp.headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_unknown_path_is_not_found_page() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture.get_json("/no/such/page").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["data"]["route"]["page"], "not_found");
    assert_eq!(body["data"]["content"]["path"], "/no/such/page");

    let resp = fixture
        .client
        .get(fixture.url("/gallery/"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 308);
    assert_eq!(location(&resp), "/gallery");
}

#[tokio::test]
async fn test_admin_requires_session() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture.get_json("/admin").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let resp = fixture
        .client
        .delete(fixture.url("/admin/events/1"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    assert_eq!(fixture.mock.count("DELETE /events"), 0);
}

#[tokio::test]
async fn test_admin_forbidden_for_members() {
    let fixture = TestFixture::new().await;
    fixture.mock.admin.store(false, Ordering::SeqCst);

    let resp = fixture.sign_in().await;
    assert_eq!(resp.status(), 303);
    assert_eq!(location(&resp), "/?status=login_success");

    let (status, body) = fixture.get_json("/admin").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");
}

#[tokio::test]
async fn test_google_callback_persists_credentials() {
    let fixture = TestFixture::new().await;

    let resp = fixture.sign_in().await;
    assert_eq!(resp.status(), 303);
    assert_eq!(location(&resp), "/admin?status=login_success");

    let token: Value = fixture.store.get(TOKEN_KEY).await.unwrap().unwrap();
    assert!(token["accessToken"].as_str().is_some());
    assert_eq!(token["provider"], "google");
    let user: Value = fixture.store.get(USER_KEY).await.unwrap().unwrap();
    assert_eq!(user["name"], "Ada Lovelace");
    assert_eq!(user["is_admin"], true);

    let (status, body) = fixture.get_json("/session").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["authenticated"], true);
    assert_eq!(body["data"]["is_admin"], true);
    assert_eq!(body["data"]["profile"]["email"], "ada@example.org");
}

#[tokio::test]
async fn test_google_callback_error_redirects_to_failure() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/google-callback?error=access_denied"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 303);
    assert_eq!(location(&resp), "/?status=login_failed");
    assert!(fixture.store.get_raw(TOKEN_KEY).await.unwrap().is_none());
}

#[tokio::test]
async fn test_unauthorized_clears_session_and_prompts_once() {
    let fixture = TestFixture::new().await;
    fixture.sign_in().await;

    let (status, _) = fixture.get_json("/admin?tab=events").await;
    assert_eq!(status, StatusCode::OK);

    // The backend starts rejecting the token; every collection reloads at once.
    fixture.mock.reject.store(true, Ordering::SeqCst);
    let resp = fixture
        .client
        .post(fixture.url("/admin/refresh"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    assert!(fixture.store.get_raw(TOKEN_KEY).await.unwrap().is_none());
    assert!(fixture.store.get_raw(USER_KEY).await.unwrap().is_none());

    let expired = fixture
        .state
        .dashboard
        .lock()
        .await
        .toasts
        .active(Utc::now())
        .iter()
        .filter(|t| t.message.contains("expired"))
        .count();
    assert_eq!(expired, 1);

    let (_, first) = fixture.get_json("/session").await;
    assert_eq!(first["data"]["authenticated"], false);
    assert_eq!(first["data"]["login_prompt"], true);
    let (_, second) = fixture.get_json("/session").await;
    assert_eq!(second["data"]["login_prompt"], false);

    let (status, _) = fixture.get_json("/admin").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_volunteer_roles_are_normalized() {
    let fixture = TestFixture::new().await;
    fixture.sign_in().await;

    let (status, body) = fixture.get_json("/admin?tab=volunteers").await;
    assert_eq!(status, StatusCode::OK);
    let volunteers = &body["data"]["content"]["volunteers"];
    assert_eq!(volunteers["total"], 1);
    assert_eq!(
        volunteers["items"][0]["volunteer_roles"],
        json!(["Registration", "Setup"])
    );
}

#[tokio::test]
async fn test_invalid_event_never_reaches_backend() {
    let fixture = TestFixture::new().await;
    fixture.sign_in().await;

    let resp = fixture
        .client
        .post(fixture.url("/admin/events"))
        .json(&json!({
            "title": "12345",
            "date_time": "2031-07-01T18:30",
            "location": "Hall B",
            "capacity": 40
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["message"], "Title cannot be only numbers");
    assert_eq!(fixture.mock.count("POST /events"), 0);
}

#[tokio::test]
async fn test_created_event_is_inserted_without_refetch() {
    let fixture = TestFixture::new().await;
    fixture.sign_in().await;

    fixture.get_json("/admin?tab=events").await;
    assert_eq!(fixture.mock.count("GET /events"), 1);

    let resp = fixture
        .client
        .post(fixture.url("/admin/events"))
        .json(&json!({
            "title": "Rust Night",
            "date_time": "2031-07-01T18:30",
            "location": "Hall B",
            "capacity": 40,
            "tags": "rust, Rust, evening",
            "speakers": [{"key": 1, "name": "", "role": ""}]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let created: Value = resp.json().await.unwrap();
    assert_eq!(created["data"]["id"], "100");
    assert_eq!(created["data"]["tags"], json!(["rust", "evening"]));
    assert_eq!(created["data"]["speakers"], json!([]));

    let (_, body) = fixture.get_json("/admin").await;
    let events = &body["data"]["content"]["events"];
    assert_eq!(events["total"], 4);
    assert_eq!(events["items"][0]["title"], "Rust Night");
    assert_eq!(fixture.mock.count("GET /events"), 1);
}

#[tokio::test]
async fn test_deleting_last_item_on_last_page_steps_back() {
    let fixture = TestFixture::with_page_size(2).await;
    fixture.sign_in().await;

    let (_, body) = fixture.get_json("/admin?tab=events&page=2").await;
    let events = &body["data"]["content"]["events"];
    assert_eq!(events["current_page"], 2);
    assert_eq!(events["items"].as_array().unwrap().len(), 1);
    assert_eq!(events["items"][0]["id"], "3");

    let resp = fixture
        .client
        .delete(fixture.url("/admin/events/3"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let (_, body) = fixture.get_json("/admin").await;
    let events = &body["data"]["content"]["events"];
    assert_eq!(events["current_page"], 1);
    assert_eq!(events["total_pages"], 1);
    assert_eq!(events["total"], 2);
}

#[tokio::test]
async fn test_generating_twice_overwrites_caption() {
    let fixture = TestFixture::new().await;
    fixture.sign_in().await;

    for _ in 0..2 {
        let resp = fixture
            .client
            .post(fixture.url("/admin/social/content"))
            .json(&json!({"event_id": 1}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }

    let (_, body) = fixture.get_json("/admin?tab=social").await;
    let social = &body["data"]["content"]["social"];
    assert_eq!(social["caption"], "Draft 2");
    assert_eq!(social["selected_event"], "1");
    assert_eq!(social["platform"]["connected"], false);
}

#[tokio::test]
async fn test_publish_requires_caption() {
    let fixture = TestFixture::new().await;
    fixture.sign_in().await;

    let resp = fixture
        .client
        .post(fixture.url("/admin/social/post"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["message"], "Write or generate a caption first");
}

#[tokio::test]
async fn test_public_events_show_full_badge() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture.get_json("/events").await;
    assert_eq!(status, StatusCode::OK);
    let items = &body["data"]["content"]["events"]["items"];
    assert_eq!(items[0]["title"], "Rust Meetup");
    assert_eq!(items[0]["badge"], "Full");
    assert_eq!(items[1]["badge"], Value::Null);
    assert_eq!(items[1]["spots_left"], 15);
    assert_eq!(body["data"]["session"]["authenticated"], false);

    let (_, filtered) = fixture.get_json("/events?tag=gardening").await;
    assert_eq!(filtered["data"]["content"]["events"]["total"], 0);
}

#[tokio::test]
async fn test_event_detail_by_slug() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture.get_json("/events/async-workshop").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["content"]["title"], "Async Workshop");
    assert_eq!(body["data"]["route"]["slug"], "async-workshop");

    let (status, body) = fixture.get_json("/events/unknown-event").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_sponsorship_submission_redirects() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .post(fixture.url("/sponsorship"))
        .json(&json!({
            "company_name": "Acme",
            "contact_name": "Road Runner",
            "email": "rr@acme.example"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 303);
    assert_eq!(location(&resp), "/sponsorship/success");
    assert_eq!(fixture.mock.count("POST /sponsorship"), 1);

    let resp = fixture
        .client
        .post(fixture.url("/sponsorship"))
        .json(&json!({"company_name": "", "contact_name": "x", "email": "nope"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    assert_eq!(fixture.mock.count("POST /sponsorship"), 1);
}

#[tokio::test]
async fn test_logout_clears_store() {
    let fixture = TestFixture::new().await;
    fixture.sign_in().await;
    assert!(fixture.store.get_raw(TOKEN_KEY).await.unwrap().is_some());

    let resp = fixture
        .client
        .post(fixture.url("/logout"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert!(fixture.store.get_raw(TOKEN_KEY).await.unwrap().is_none());
    assert!(fixture.store.get_raw(USER_KEY).await.unwrap().is_none());

    let (status, _) = fixture.get_json("/admin").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_draft_editor_flow() {
    let fixture = TestFixture::new().await;
    fixture.sign_in().await;

    let (status, body) = fixture.get_json("/admin/events/2/form").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Async Workshop");

    let resp = fixture
        .client
        .patch(fixture.url("/admin/draft"))
        .json(&json!({"op": "set_attendees", "attendees": 500}))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["attendees"], 20);

    let part = reqwest::multipart::Part::bytes(vec![0x89, 0x50, 0x4e, 0x47])
        .file_name("poster.png")
        .mime_str("image/png")
        .unwrap();
    let resp = fixture
        .client
        .post(fixture.url("/admin/uploads?image_type=poster"))
        .multipart(reqwest::multipart::Form::new().part("file", part))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let (_, body) = fixture.get_json("/admin/draft").await;
    assert_eq!(body["data"]["event_id"], "2");
    assert_eq!(body["data"]["form"]["poster_url"], "https://cdn.example/poster.png");

    // Start over with a new event and submit it.
    fixture.get_json("/admin/events/new/form").await;
    let resp = fixture
        .client
        .patch(fixture.url("/admin/draft"))
        .json(&json!({
            "op": "fields",
            "form": {
                "title": "Design Jam",
                "date_time": "2031-07-01T18:30",
                "location": "Studio",
                "capacity": 12
            }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = fixture
        .client
        .post(fixture.url("/admin/draft/save"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(fixture.mock.count("POST /events"), 1);

    let (status, _) = fixture.get_json("/admin/draft").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_relogin_after_unauthorized_reloads_dashboard() {
    let fixture = TestFixture::new().await;
    fixture.sign_in().await;

    let (_, body) = fixture.get_json("/admin?tab=events").await;
    assert_eq!(body["data"]["content"]["events"]["total"], 3);
    fixture.get_json("/admin/events/new/form").await;

    fixture.mock.reject.store(true, Ordering::SeqCst);
    let resp = fixture
        .client
        .post(fixture.url("/admin/refresh?tab=events"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    fixture.mock.reject.store(false, Ordering::SeqCst);

    fixture.sign_in().await;
    let (status, body) = fixture.get_json("/admin?tab=events").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["content"]["events"]["total"], 3);
    assert_eq!(body["data"]["content"]["draft"], Value::Null);
    assert_eq!(body["data"]["content"]["toasts"], json!([]));
    // The rejected fetch never got past the token check.
    assert_eq!(fixture.mock.count("GET /events"), 2);
}

#[tokio::test]
async fn test_updated_event_is_replaced_in_place() {
    let fixture = TestFixture::new().await;
    fixture.sign_in().await;
    fixture.get_json("/admin?tab=events").await;

    let resp = fixture
        .client
        .put(fixture.url("/admin/events/2"))
        .json(&json!({
            "title": "Async Workshop II",
            "date_time": "2031-07-01T18:30",
            "location": "Lab 4",
            "capacity": 25,
            "attendees": 5
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(fixture.mock.count("PUT /events"), 1);

    let (_, body) = fixture.get_json("/admin").await;
    let events = &body["data"]["content"]["events"];
    assert_eq!(events["total"], 3);
    assert_eq!(events["items"][1]["id"], "2");
    assert_eq!(events["items"][1]["title"], "Async Workshop II");
    assert_eq!(events["items"][1]["location"], "Lab 4");
    assert_eq!(fixture.mock.count("GET /events"), 1);
}

#[tokio::test]
async fn test_deleting_registration_frees_a_seat() {
    let fixture = TestFixture::new().await;
    fixture.mock.events.lock().unwrap()[2]["attendees"] = json!(0);
    fixture.sign_in().await;
    fixture.get_json("/admin?tab=events").await;

    let (status, body) = fixture.get_json("/admin/events/2/registrations").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["id"], "7");
    assert_eq!(body["data"][0]["event_id"], "2");

    for (event_id, expected) in [("2", 4), ("3", 0)] {
        let resp = fixture
            .client
            .delete(fixture.url(&format!("/admin/events/{}/registrations/7", event_id)))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);

        let (_, body) = fixture.get_json("/admin").await;
        let row = body["data"]["content"]["events"]["items"]
            .as_array()
            .unwrap()
            .iter()
            .find(|e| e["id"] == event_id)
            .cloned()
            .unwrap();
        assert_eq!(row["attendees"], expected);
    }
    assert_eq!(fixture.mock.count("DELETE /admin/registrations/7"), 2);
}

#[tokio::test]
async fn test_password_login() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .post(fixture.url("/login"))
        .json(&json!({"email": "", "password": "correct-horse"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    assert_eq!(fixture.mock.count("POST /auth/login"), 0);

    let resp = fixture
        .client
        .post(fixture.url("/login"))
        .json(&json!({"email": "ada@example.org", "password": "guess"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["message"], "Invalid email or password");
    assert!(fixture.store.get_raw(TOKEN_KEY).await.unwrap().is_none());

    let resp = fixture
        .client
        .post(fixture.url("/login"))
        .json(&json!({"email": "ada@example.org", "password": "correct-horse"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["authenticated"], true);
    assert_eq!(body["data"]["is_admin"], true);
    assert_eq!(body["data"]["profile"]["name"], "Ada");
    assert_eq!(body["data"]["profile"]["provider"], "email");

    let token: Value = fixture.store.get(TOKEN_KEY).await.unwrap().unwrap();
    assert_eq!(token["accessToken"], "email-session-token");
    assert_eq!(token["provider"], "email");
}

#[tokio::test]
async fn test_profile_completion() {
    let fixture = TestFixture::new().await;
    fixture.sign_in().await;

    let (_, body) = fixture.get_json("/session").await;
    assert_eq!(body["data"]["needs_profile"], true);

    let resp = fixture
        .client
        .post(fixture.url("/profile"))
        .json(&json!({"name": "  ", "company_name": "Analytical Engines"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    assert_eq!(fixture.mock.count("PUT /users/me"), 0);

    let resp = fixture
        .client
        .post(fixture.url("/profile"))
        .json(&json!({"name": "Ada L.", "company_name": "Analytical Engines"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["needs_profile"], false);
    assert_eq!(body["data"]["profile"]["name"], "Ada L.");

    let user: Value = fixture.store.get(USER_KEY).await.unwrap().unwrap();
    assert_eq!(user["company_name"], "Analytical Engines");
}

#[tokio::test]
async fn test_linkedin_callback_signs_in_with_token() {
    let fixture = TestFixture::new().await;
    let token = encode_test_token(&json!({
        "sub": "li-9",
        "email": "grace@example.org",
        "app_metadata": {"provider": "linkedin_oidc"}
    }));

    let resp = fixture
        .client
        .get(fixture.url(&format!("/linkedin-callback?token={}", token)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 303);
    assert_eq!(location(&resp), "/admin?status=login_success");

    let stored: Value = fixture.store.get(TOKEN_KEY).await.unwrap().unwrap();
    assert_eq!(stored["provider"], "linkedin");
    let user: Value = fixture.store.get(USER_KEY).await.unwrap().unwrap();
    assert_eq!(user["provider"], "linkedin");
    assert_eq!(user["name"], "grace");

    let resp = fixture
        .client
        .get(fixture.url("/linkedin-callback?error=user_cancelled"))
        .send()
        .await
        .unwrap();
    assert_eq!(location(&resp), "/?status=login_failed");
    assert!(fixture.store.get_raw(TOKEN_KEY).await.unwrap().is_none());
}

#[tokio::test]
async fn test_platform_connection_checks_state() {
    let fixture = TestFixture::new().await;
    fixture.sign_in().await;

    async fn connect(fixture: &TestFixture) -> String {
        let resp = fixture
            .client
            .post(fixture.url("/admin/social/connect"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        let state = fixture.mock.oauth_state.lock().unwrap().clone().unwrap();
        assert!(!state.is_empty());
        assert!(body["data"]["auth_url"].as_str().unwrap().ends_with(&state));
        state
    }

    async fn callback(fixture: &TestFixture, state: &str) -> String {
        let resp = fixture
            .client
            .get(fixture.url(&format!("/linkedin-callback?connected=true&state={}", state)))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 303);
        location(&resp).to_string()
    }

    fixture.mock.linkedin.store(true, Ordering::SeqCst);

    // A wrong state burns the pending one.
    let state = connect(&fixture).await;
    assert_eq!(callback(&fixture, "forged").await, "/admin?status=linkedin_failed");
    assert_eq!(callback(&fixture, &state).await, "/admin?status=linkedin_failed");

    let state = connect(&fixture).await;
    assert_eq!(callback(&fixture, &state).await, "/admin?status=linkedin_connected");
    // Replaying it fails.
    assert_eq!(callback(&fixture, &state).await, "/admin?status=linkedin_failed");

    let (_, body) = fixture.get_json("/admin?tab=social").await;
    assert_eq!(body["data"]["content"]["social"]["platform"]["connected"], true);
    assert!(fixture.store.get_raw(TOKEN_KEY).await.unwrap().is_some());
}

#[tokio::test]
async fn test_refresh_all_discards_overtaken_response() {
    let fixture = TestFixture::new().await;
    fixture.sign_in().await;
    fixture.get_json("/admin?tab=events").await;

    // The next events fetch is slow and answers with the old list.
    fixture.mock.slow_events.store(true, Ordering::SeqCst);
    let slow = {
        let client = fixture.client.clone();
        let url = fixture.url("/admin/refresh");
        tokio::spawn(async move { client.post(url).send().await.unwrap().status() })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;

    fixture
        .mock
        .events
        .lock()
        .unwrap()
        .push(event_json(4, "Hack Night", 15, 0));
    let resp = fixture
        .client
        .post(fixture.url("/admin/refresh?tab=events"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    assert_eq!(slow.await.unwrap(), 200);
    let (_, body) = fixture.get_json("/admin").await;
    let events = &body["data"]["content"]["events"];
    assert_eq!(events["total"], 4);
    assert_eq!(events["items"][3]["title"], "Hack Night");
    assert_eq!(fixture.mock.count("GET /events"), 3);
}
