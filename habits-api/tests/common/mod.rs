//! In-process stand-in for the REST backend, bound to a random local port.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use habits_api::{ClientConfig, HttpClient, MemoryTokenStore, Session, TokenStore};
use serde_json::{json, Value};

pub const USERNAME: &str = "alice";
pub const PASSWORD: &str = "password123";

#[derive(Debug)]
struct Tokens {
    valid_access: Option<String>,
    valid_refresh: String,
    generation: u32,
}

#[derive(Debug)]
pub struct Stub {
    tokens: Mutex<Tokens>,
    pub requests: AtomicUsize,
    pub refresh_calls: AtomicUsize,
    pub refresh_ok: AtomicBool,
    pub stats_broken: AtomicBool,
    /// Serve habits one per page in a flat envelope without `pageable`.
    pub flat_habit_pages: AtomicBool,
    refresh_delay: Duration,
}

impl Stub {
    fn new() -> Self {
        Self {
            tokens: Mutex::new(Tokens {
                valid_access: None,
                valid_refresh: String::new(),
                generation: 0,
            }),
            requests: AtomicUsize::new(0),
            refresh_calls: AtomicUsize::new(0),
            refresh_ok: AtomicBool::new(true),
            stats_broken: AtomicBool::new(false),
            flat_habit_pages: AtomicBool::new(false),
            refresh_delay: Duration::from_millis(200),
        }
    }

    /// Issue a fresh pair and make it the only valid one.
    fn rotate(&self) -> (String, String) {
        let mut tokens = self.tokens.lock().unwrap();
        tokens.generation += 1;
        let access = format!("access-{}", tokens.generation);
        let refresh = format!("refresh-{}", tokens.generation);
        tokens.valid_access = Some(access.clone());
        tokens.valid_refresh = refresh.clone();
        (access, refresh)
    }

    /// Invalidate the current access token (the refresh token stays valid).
    pub fn expire_access(&self) {
        self.tokens.lock().unwrap().valid_access = None;
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.requests.fetch_add(1, Ordering::SeqCst);
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        let presented = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        let tokens = self.tokens.lock().unwrap();
        matches!((presented, tokens.valid_access.as_deref()), (Some(p), Some(v)) if p == v)
    }
}

pub struct Backend {
    pub stub: Arc<Stub>,
    pub base_url: String,
}

impl Backend {
    pub async fn start() -> Self {
        let stub = Arc::new(Stub::new());
        let app = Router::new()
            .route("/api/auth/login", post(login))
            .route("/api/auth/register", post(register))
            .route("/api/auth/refresh", post(refresh))
            .route("/api/auth/me", get(me))
            .route("/api/auth/logout", post(logout))
            .route("/api/habits", get(list_habits).post(create_habit))
            .route("/api/habits/:id", get(get_habit).delete(delete_habit))
            .route("/api/habits/:id/toggle", patch(toggle_habit))
            .route("/api/habits/:id/progress", get(list_progress))
            .route("/api/habits/:id/progress/stats", get(progress_stats))
            .route("/api/users/:id/achievements", get(broken_achievements))
            .route("/api/slow", get(slow))
            .with_state(stub.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            stub,
            base_url: format!("http://{addr}/api"),
        }
    }

    /// A client with an empty in-memory token store.
    pub fn client(&self) -> (HttpClient, Arc<MemoryTokenStore>) {
        let store = Arc::new(MemoryTokenStore::new());
        (self.client_with_store(store.clone()), store)
    }

    pub fn client_with_store(&self, store: Arc<dyn TokenStore>) -> HttpClient {
        let config = ClientConfig::new(&self.base_url).unwrap();
        HttpClient::new(config, Arc::new(Session::new()), store).unwrap()
    }

    /// A client whose requests give up after `timeout`.
    pub fn client_with_timeout(&self, timeout: Duration) -> HttpClient {
        let config = ClientConfig::new(&self.base_url).unwrap().with_timeout(timeout);
        HttpClient::new(config, Arc::new(Session::new()), Arc::new(MemoryTokenStore::new()))
            .unwrap()
    }

    /// Log alice in server-side and return the issued pair.
    pub fn issue_tokens(&self) -> (String, String) {
        self.stub.rotate()
    }
}

fn user_json() -> Value {
    json!({
        "id": 1,
        "username": USERNAME,
        "email": "alice@example.com",
        "firstName": "Alice",
        "role": "USER",
        "createdAt": "2024-01-01T10:00:00"
    })
}

pub fn habit_json(id: i64) -> Value {
    json!({
        "id": id,
        "userId": 1,
        "title": "Run",
        "category": "SPORT",
        "unit": "km",
        "frequency": "DAILY",
        "targetValue": 5.0,
        "isActive": true,
        "_links": { "self": { "href": format!("/api/habits/{id}") } }
    })
}

fn auth_body(access: String, refresh: String) -> Value {
    json!({
        "accessToken": access,
        "refreshToken": refresh,
        "tokenType": "Bearer",
        "expiresIn": 900,
        "user": user_json()
    })
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "message": "Token expired", "code": "TOKEN_EXPIRED" })),
    )
        .into_response()
}

async fn login(State(stub): State<Arc<Stub>>, Json(body): Json<Value>) -> Response {
    stub.hit();
    if body["username"] == USERNAME && body["password"] == PASSWORD {
        let (access, refresh) = stub.rotate();
        Json(auth_body(access, refresh)).into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Invalid credentials" })),
        )
            .into_response()
    }
}

async fn register(State(stub): State<Arc<Stub>>, Json(body): Json<Value>) -> Response {
    stub.hit();
    if body["username"] == USERNAME {
        return (
            StatusCode::CONFLICT,
            Json(json!({ "message": "Username already taken", "code": "USERNAME_TAKEN" })),
        )
            .into_response();
    }
    let (access, refresh) = stub.rotate();
    (StatusCode::CREATED, Json(auth_body(access, refresh))).into_response()
}

async fn refresh(State(stub): State<Arc<Stub>>, Json(body): Json<Value>) -> Response {
    stub.hit();
    stub.refresh_calls.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(stub.refresh_delay).await;

    let known = {
        let tokens = stub.tokens.lock().unwrap();
        body["refreshToken"] == tokens.valid_refresh.as_str()
    };
    if stub.refresh_ok.load(Ordering::SeqCst) && known {
        let (access, refresh) = stub.rotate();
        Json(auth_body(access, refresh)).into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Invalid refresh token" })),
        )
            .into_response()
    }
}

async fn me(State(stub): State<Arc<Stub>>, headers: HeaderMap) -> Response {
    stub.hit();
    if !stub.authorized(&headers) {
        return unauthorized();
    }
    Json(user_json()).into_response()
}

async fn logout(State(stub): State<Arc<Stub>>) -> StatusCode {
    stub.hit();
    StatusCode::NO_CONTENT
}

async fn list_habits(
    State(stub): State<Arc<Stub>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    stub.hit();
    if !stub.authorized(&headers) {
        return unauthorized();
    }
    if stub.flat_habit_pages.load(Ordering::SeqCst) {
        let page: i64 = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(0);
        let content = if page < 2 { vec![habit_json(page + 1)] } else { Vec::new() };
        return Json(json!({ "content": content, "totalElements": 2, "totalPages": 2 }))
            .into_response();
    }
    Json(json!({
        "_embedded": { "habitResponseList": [habit_json(1), habit_json(2)] },
        "_links": { "self": { "href": "/api/habits" } },
        "page": { "size": 20, "totalElements": 2, "totalPages": 1, "number": 0 }
    }))
    .into_response()
}

async fn create_habit(
    State(stub): State<Arc<Stub>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    stub.hit();
    if !stub.authorized(&headers) {
        return unauthorized();
    }
    let mut habit = habit_json(3);
    habit["title"] = body["title"].clone();
    (StatusCode::CREATED, Json(habit)).into_response()
}

async fn get_habit(
    State(stub): State<Arc<Stub>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    stub.hit();
    if !stub.authorized(&headers) {
        return unauthorized();
    }
    if id > 100 {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "Habit not found" })),
        )
            .into_response();
    }
    Json(json!({ "content": habit_json(id), "_links": {} })).into_response()
}

async fn delete_habit(
    State(stub): State<Arc<Stub>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    stub.hit();
    if !stub.authorized(&headers) {
        return unauthorized();
    }
    if id == 1 {
        return Json(json!({ "message": "Habit deleted" })).into_response();
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn toggle_habit(
    State(stub): State<Arc<Stub>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    stub.hit();
    if !stub.authorized(&headers) {
        return unauthorized();
    }
    let mut habit = habit_json(id);
    habit["isActive"] = json!(false);
    Json(habit).into_response()
}

async fn list_progress(
    State(stub): State<Arc<Stub>>,
    headers: HeaderMap,
    Path(habit_id): Path<i64>,
) -> Response {
    stub.hit();
    if !stub.authorized(&headers) {
        return unauthorized();
    }
    let entry = |id: i64, date: &str, value: f64| {
        json!({ "id": id, "userId": 1, "habitId": habit_id, "date": date, "value": value })
    };
    Json(json!([
        entry(1, "2024-03-08", 4.0),
        entry(2, "2024-03-09", 6.0),
        entry(3, "2024-03-10", 5.0)
    ]))
    .into_response()
}

async fn progress_stats(
    State(stub): State<Arc<Stub>>,
    headers: HeaderMap,
    Path(habit_id): Path<i64>,
) -> Response {
    stub.hit();
    if !stub.authorized(&headers) {
        return unauthorized();
    }
    if stub.stats_broken.load(Ordering::SeqCst) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": "stats unavailable" })),
        )
            .into_response();
    }
    Json(json!({
        "habitId": habit_id,
        "habitTitle": "Run",
        "habitUnit": "km",
        "habitTarget": 5.0,
        "startDate": "2024-02-10",
        "endDate": "2024-03-10",
        "totalDays": 30,
        "totalEntries": 12,
        "consecutiveDays": 4,
        "completionRate": 40.0,
        "totalValue": 60.0,
        "averageValue": 5.0,
        "maxValue": 8.0,
        "minValue": 2.0,
        "lastValue": 5.0,
        "progressTrend": 0.5,
        "improvementDetected": true,
        "daysTargetReached": 7,
        "targetReachRate": 58.3,
        "consistencyScore": 40.0,
        "lastEntryDate": "2024-03-10",
        "daysSinceLastEntry": 0
    }))
    .into_response()
}

async fn broken_achievements(State(stub): State<Arc<Stub>>, headers: HeaderMap) -> Response {
    stub.hit();
    if !stub.authorized(&headers) {
        return unauthorized();
    }
    Json(json!({ "achievements": "soon" })).into_response()
}

async fn slow(State(stub): State<Arc<Stub>>) -> Json<Value> {
    stub.hit();
    tokio::time::sleep(Duration::from_millis(500)).await;
    Json(json!({ "late": true }))
}
