//! REST API server for the bank assistant
//!
//! Cookie-based login sessions, the chat endpoint, read-only account views
//! for customers, and training/log management for the administrator.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use uuid::Uuid;

use crate::analytics::{self, TOP_QUERIES};
use crate::audit::build_interaction_log;
use crate::classifier::{load_classifier, ClassifierHandle, ExampleClassifier, RemoteClassifier};
use crate::config::AppConfig;
use crate::dialogue::{Assistant, INTENT_ERROR};
use crate::error::BankError;
use crate::ledger::Ledger;
use crate::models::Turn;
use crate::responses::ResponseStore;
use crate::sessions::{Session, SessionStore, UserDirectory};

pub const SESSION_COOKIE: &str = "session_id";

/// Number of log entries shown on the admin log view
const ADMIN_LOG_LIMIT: usize = 50;

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NewTrainingRow {
    #[serde(default)]
    pub example: String,
    #[serde(default)]
    pub intent: String,
    #[serde(default)]
    pub response: String,
}

/// =============================
/// Response Wrapper
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

type ApiResult = (StatusCode, Json<ApiResponse>);

fn ok<T: Serialize>(data: T) -> ApiResult {
    (StatusCode::OK, Json(ApiResponse::success(data)))
}

fn fail(status: StatusCode, message: impl Into<String>) -> ApiResult {
    (status, Json(ApiResponse::error(message)))
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct AppState {
    pub assistant: Arc<Assistant>,
    pub sessions: Arc<SessionStore>,
    pub users: Arc<UserDirectory>,
}

impl AppState {
    pub fn new(assistant: Arc<Assistant>, users: UserDirectory) -> Self {
        Self {
            assistant,
            sessions: Arc::new(SessionStore::new()),
            users: Arc::new(users),
        }
    }

    /// Wire every component from configuration
    pub async fn from_config(config: &AppConfig) -> crate::Result<Self> {
        let responses = Arc::new(ResponseStore::open(&config.training_csv).await?);
        let classifier = load_classifier(config.nlu_url.as_deref(), &config.training_csv);
        let log = build_interaction_log(config.database_url.as_deref());

        let assistant = Assistant::new(
            Arc::new(ClassifierHandle::new(classifier)),
            responses,
            Arc::new(Ledger::demo()),
            log,
        )
        .with_threshold(config.confidence_threshold);

        Ok(Self::new(Arc::new(assistant), UserDirectory::demo()))
    }
}

/// =============================
/// Session Helpers
/// =============================

async fn current_session(state: &AppState, jar: &CookieJar) -> Option<Arc<Session>> {
    let id: Uuid = jar.get(SESSION_COOKIE)?.value().parse().ok()?;
    state.sessions.get(id).await
}

async fn require_customer(state: &AppState, jar: &CookieJar) -> Result<Arc<Session>, ApiResult> {
    match current_session(state, jar).await {
        Some(session) if session.is_customer() => Ok(session),
        _ => Err(fail(StatusCode::UNAUTHORIZED, "Please log in.")),
    }
}

async fn require_admin(state: &AppState, jar: &CookieJar) -> Result<Arc<Session>, ApiResult> {
    match current_session(state, jar).await {
        Some(session) if session.is_admin() => Ok(session),
        _ => Err(fail(StatusCode::FORBIDDEN, "❌ Access denied.")),
    }
}

/// =============================
/// Health + Auth Endpoints
/// =============================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> (StatusCode, CookieJar, Json<ApiResponse>) {
    let Some(role) = state.users.authenticate(&req.username, &req.password) else {
        info!(username = %req.username.trim(), "Login rejected");
        return (
            StatusCode::UNAUTHORIZED,
            jar,
            Json(ApiResponse::error("Invalid credentials. Try again.")),
        );
    };

    // Logging in again replaces whatever session the browser still holds
    if let Some(previous) = jar
        .get(SESSION_COOKIE)
        .and_then(|c| c.value().parse::<Uuid>().ok())
    {
        state.sessions.remove(previous).await;
    }

    let session = state.sessions.create(req.username.trim(), role).await;
    let cookie = Cookie::build((SESSION_COOKIE, session.id.to_string()))
        .path("/")
        .http_only(true);

    (
        StatusCode::OK,
        jar.add(cookie),
        Json(ApiResponse::success(serde_json::json!({
            "username": session.username,
            "role": role,
        }))),
    )
}

async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Json<ApiResponse>) {
    if let Some(id) = jar
        .get(SESSION_COOKIE)
        .and_then(|c| c.value().parse::<Uuid>().ok())
    {
        state.sessions.remove(id).await;
    }

    (
        jar.remove(Cookie::build(SESSION_COOKIE).path("/")),
        Json(ApiResponse::success(serde_json::json!({ "logged_out": true }))),
    )
}

/// =============================
/// Chat Endpoint
/// =============================

async fn chat_handler(State(state): State<AppState>, jar: CookieJar, body: Bytes) -> Json<Turn> {
    let session = match current_session(&state, &jar).await {
        Some(session) if session.is_customer() => session,
        _ => return Json(Turn::new("Authentication error.", INTENT_ERROR)),
    };

    let req: ChatRequest = serde_json::from_slice(&body).unwrap_or_default();
    let message = req.message.unwrap_or_default();

    let mut dialogue = session.dialogue().await;
    let turn = state.assistant.handle(&mut dialogue, &message).await;

    info!(
        session_id = %session.id,
        intent = %turn.intent,
        state = dialogue.name(),
        "Chat turn handled"
    );
    Json(turn)
}

/// =============================
/// Account Views
/// =============================

async fn account(State(state): State<AppState>, jar: CookieJar) -> ApiResult {
    if let Err(denied) = require_customer(&state, &jar).await {
        return denied;
    }
    ok(state.assistant.ledger().profile().await)
}

async fn transactions(State(state): State<AppState>, jar: CookieJar) -> ApiResult {
    if let Err(denied) = require_customer(&state, &jar).await {
        return denied;
    }
    ok(state.assistant.ledger().statement().await)
}

async fn cards(State(state): State<AppState>, jar: CookieJar) -> ApiResult {
    if let Err(denied) = require_customer(&state, &jar).await {
        return denied;
    }
    ok(state.assistant.ledger().cards())
}

async fn loans(State(state): State<AppState>, jar: CookieJar) -> ApiResult {
    if let Err(denied) = require_customer(&state, &jar).await {
        return denied;
    }
    ok(state.assistant.ledger().loans())
}

async fn branches(State(state): State<AppState>, jar: CookieJar) -> ApiResult {
    if let Err(denied) = require_customer(&state, &jar).await {
        return denied;
    }
    ok(state.assistant.ledger().branches())
}

/// =============================
/// Admin Endpoints
/// =============================

async fn admin_logs(State(state): State<AppState>, jar: CookieJar) -> ApiResult {
    if let Err(denied) = require_admin(&state, &jar).await {
        return denied;
    }

    match state.assistant.log().recent(ADMIN_LOG_LIMIT).await {
        Ok(entries) => ok(entries),
        Err(e) => fail(StatusCode::INTERNAL_SERVER_ERROR, format!("Failed to load logs: {}", e)),
    }
}

async fn list_training(State(state): State<AppState>, jar: CookieJar) -> ApiResult {
    if let Err(denied) = require_admin(&state, &jar).await {
        return denied;
    }

    match state.assistant.responses().rows().await {
        Ok(rows) => ok(rows),
        Err(e) => {
            warn!("Failed to read training rows: {}", e);
            ok(Vec::<crate::responses::TrainingRow>::new())
        }
    }
}

async fn add_training(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(row): Json<NewTrainingRow>,
) -> ApiResult {
    if let Err(denied) = require_admin(&state, &jar).await {
        return denied;
    }

    match state
        .assistant
        .responses()
        .append_row(&row.example, &row.intent, &row.response)
        .await
    {
        Ok(()) => ok(serde_json::json!({ "message": "✅ New training row added!" })),
        Err(BankError::TrainingDataError(_)) => {
            fail(StatusCode::BAD_REQUEST, "⚠️ Please fill all fields.")
        }
        Err(e) => fail(StatusCode::INTERNAL_SERVER_ERROR, format!("❌ Error adding row: {}", e)),
    }
}

async fn delete_training(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(index): Path<usize>,
) -> ApiResult {
    if let Err(denied) = require_admin(&state, &jar).await {
        return denied;
    }

    let responses = state.assistant.responses();
    if !responses.path().exists() {
        return fail(StatusCode::NOT_FOUND, "⚠️ Training CSV file not found.");
    }

    match responses.delete_row(index).await {
        Ok(removed) => ok(serde_json::json!({
            "message": "✅ Training row deleted successfully.",
            "removed": removed,
        })),
        Err(BankError::TrainingDataError(_)) => {
            fail(StatusCode::BAD_REQUEST, "⚠️ Invalid row index.")
        }
        Err(e) => fail(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("❌ Error deleting row: {}", e),
        ),
    }
}

async fn retrain(State(state): State<AppState>, jar: CookieJar) -> ApiResult {
    if let Err(denied) = require_admin(&state, &jar).await {
        return denied;
    }

    let responses = state.assistant.responses();

    // A configured NLU service is trained elsewhere; only the replies reload here
    let active = state.assistant.classifier().current().await;
    if active.name() == RemoteClassifier::NAME {
        if let Err(e) = responses.load().await {
            return fail(StatusCode::INTERNAL_SERVER_ERROR, format!("❌ Retrain failed: {}", e));
        }
        info!("Retrain requested with remote classifier active; responses reloaded only");
        return ok(serde_json::json!({
            "message": "✅ Responses reloaded. The remote classifier is trained by its own service.",
            "classifier": RemoteClassifier::NAME,
        }));
    }

    let classifier = match ExampleClassifier::train(responses.path()) {
        Ok(classifier) => classifier,
        Err(e) => {
            return fail(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("❌ Retrain failed: {}", e),
            )
        }
    };

    let intents: Vec<String> = classifier.intents().into_iter().map(str::to_string).collect();
    if intents.is_empty() {
        return fail(StatusCode::BAD_REQUEST, "❌ Retrain failed: no training examples");
    }

    state.assistant.classifier().replace(Arc::new(classifier)).await;
    if let Err(e) = responses.load().await {
        return fail(StatusCode::INTERNAL_SERVER_ERROR, format!("❌ Retrain failed: {}", e));
    }

    ok(serde_json::json!({
        "message": "✅ Model retrained successfully!",
        "classifier": "examples",
        "intents": intents,
    }))
}

async fn admin_analytics(State(state): State<AppState>, jar: CookieJar) -> ApiResult {
    if let Err(denied) = require_admin(&state, &jar).await {
        return denied;
    }

    match state.assistant.log().all().await {
        Ok(entries) => ok(analytics::summarize(&entries, TOP_QUERIES)),
        Err(e) => fail(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to compute analytics: {}", e),
        ),
    }
}

/// =============================
/// Router
/// =============================

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/api/chat", post(chat_handler))
        .route("/api/account", get(account))
        .route("/api/transactions", get(transactions))
        .route("/api/cards", get(cards))
        .route("/api/loans", get(loans))
        .route("/api/branches", get(branches))
        .route("/api/admin/logs", get(admin_logs))
        .route("/api/admin/training", get(list_training).post(add_training))
        .route("/api/admin/training/delete/:index", post(delete_training))
        .route("/api/admin/retrain", post(retrain))
        .route("/api/admin/analytics", get(admin_analytics))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    state: AppState,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::InMemoryInteractionLog;
    use axum::body::Body;
    use axum::http::{header, Request};
    use axum::response::Response;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use tower::ServiceExt;

    const TRAINING: &str = "\
\"send money\",\"transfer_money\",\"Sure, let's transfer.\",\"seed\"
\"transfer money to a friend\",\"transfer_money\",\"Sure, let's transfer.\",\"seed\"
\"what's my balance\",\"check_balance\",\"Let me check.\",\"seed\"
\"hello\",\"greet\",\"Hello! How can I help you today?\",\"seed\"
\"tell me a joke\",\"out_of_scope\",\"I can only assist with banking questions.\",\"seed\"
";

    struct TestApp {
        router: Router,
        state: AppState,
        _csv: NamedTempFile,
    }

    async fn app() -> TestApp {
        app_with(|path| load_classifier(None, path)).await
    }

    async fn app_with(
        classifier: impl FnOnce(&std::path::Path) -> Arc<dyn crate::IntentClassifier>,
    ) -> TestApp {
        let mut csv = NamedTempFile::new().unwrap();
        csv.write_all(TRAINING.as_bytes()).unwrap();

        let responses = Arc::new(ResponseStore::open(csv.path()).await.unwrap());
        let classifier = classifier(csv.path());
        let assistant = Assistant::new(
            Arc::new(ClassifierHandle::new(classifier)),
            responses,
            Arc::new(Ledger::demo()),
            Arc::new(InMemoryInteractionLog::new()),
        );

        let state = AppState::new(Arc::new(assistant), UserDirectory::demo());
        TestApp {
            router: create_router(state.clone()),
            state,
            _csv: csv,
        }
    }

    async fn send(
        router: &Router,
        request: Request<Body>,
    ) -> (StatusCode, serde_json::Value, Response<()>) {
        let response = router.clone().oneshot(request).await.unwrap();
        let (parts, body) = response.into_parts();
        let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (parts.status, json, Response::from_parts(parts, ()))
    }

    fn json_request(
        method: &str,
        uri: &str,
        cookie: Option<&str>,
        body: serde_json::Value,
    ) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get_request(uri: &str, cookie: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(header::COOKIE, cookie)
            .body(Body::empty())
            .unwrap()
    }

    async fn login_as(router: &Router, username: &str, password: &str) -> String {
        login_with(router, None, username, password).await
    }

    async fn login_with(
        router: &Router,
        cookie: Option<&str>,
        username: &str,
        password: &str,
    ) -> String {
        let (status, _, response) = send(
            router,
            json_request(
                "POST",
                "/login",
                cookie,
                serde_json::json!({ "username": username, "password": password }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    async fn chat(router: &Router, cookie: &str, message: &str) -> serde_json::Value {
        let (_, json, _) = send(
            router,
            json_request(
                "POST",
                "/api/chat",
                Some(cookie),
                serde_json::json!({ "message": message }),
            ),
        )
        .await;
        json
    }

    #[tokio::test]
    async fn test_chat_requires_login() {
        let app = app().await;

        let (status, json, _) = send(
            &app.router,
            json_request("POST", "/api/chat", None, serde_json::json!({ "message": "hi" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json,
            serde_json::json!({ "reply": "Authentication error.", "intent": "error" })
        );
    }

    #[tokio::test]
    async fn test_bad_credentials_rejected() {
        let app = app().await;

        let (status, json, _) = send(
            &app.router,
            json_request(
                "POST",
                "/login",
                None,
                serde_json::json!({ "username": "yesh", "password": "nope" }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["success"], false);
    }

    #[tokio::test]
    async fn test_transfer_over_http() {
        let app = app().await;
        let cookie = login_as(&app.router, "yesh", "srt123").await;

        let turn = chat(&app.router, &cookie, "send money").await;
        assert_eq!(turn["intent"], "transfer_money");

        let turn = chat(&app.router, &cookie, "Asha").await;
        assert!(turn["reply"].as_str().unwrap().contains("Asha"));

        let turn = chat(&app.router, &cookie, "2000").await;
        assert!(turn["reply"].as_str().unwrap().contains("2000.00"));

        let turn = chat(&app.router, &cookie, "yes").await;
        assert!(turn["reply"].as_str().unwrap().contains("73000.00"));

        let (_, account, _) = send(&app.router, get_request("/api/account", &cookie)).await;
        assert_eq!(account["data"]["balance"], "73000.00");

        let (_, statement, _) = send(&app.router, get_request("/api/transactions", &cookie)).await;
        let lines = statement["data"].as_array().unwrap();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[4]["desc"], "Transfer to Asha");
    }

    #[tokio::test]
    async fn test_sessions_do_not_share_dialogue() {
        let app = app().await;
        let yesh = login_as(&app.router, "yesh", "srt123").await;
        let reddy = login_as(&app.router, "reddy", "bank123").await;

        chat(&app.router, &yesh, "send money").await;
        let turn = chat(&app.router, &reddy, "hello").await;

        assert_eq!(turn["intent"], "greet");
    }

    #[tokio::test]
    async fn test_admin_cannot_chat_and_customer_cannot_admin() {
        let app = app().await;
        let admin = login_as(&app.router, "admin", "admin123").await;
        let customer = login_as(&app.router, "yesh", "srt123").await;

        let turn = chat(&app.router, &admin, "hello").await;
        assert_eq!(turn["intent"], "error");

        let (status, _, _) = send(&app.router, get_request("/api/admin/logs", &customer)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _, _) = send(&app.router, get_request("/api/account", &admin)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_logout_ends_session() {
        let app = app().await;
        let cookie = login_as(&app.router, "yesh", "srt123").await;

        let (status, _, _) = send(
            &app.router,
            json_request("POST", "/logout", Some(&cookie), serde_json::json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let turn = chat(&app.router, &cookie, "hello").await;
        assert_eq!(turn["intent"], "error");
    }

    #[tokio::test]
    async fn test_admin_training_edits_are_served_immediately() {
        let app = app().await;
        let admin = login_as(&app.router, "admin", "admin123").await;
        let customer = login_as(&app.router, "yesh", "srt123").await;

        let (status, _, _) = send(
            &app.router,
            json_request(
                "POST",
                "/api/admin/training",
                Some(&admin),
                serde_json::json!({
                    "example": "hello",
                    "intent": "greet",
                    "response": "Namaste!",
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        // Drop the seeded greeting so the new one is the only candidate
        let (status, json, _) = send(
            &app.router,
            json_request(
                "POST",
                "/api/admin/training/delete/3",
                Some(&admin),
                serde_json::json!({}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["removed"]["response"], "Hello! How can I help you today?");

        let turn = chat(&app.router, &customer, "hello").await;
        assert_eq!(turn["reply"], "Namaste!");

        let (_, rows, _) = send(&app.router, get_request("/api/admin/training", &admin)).await;
        assert_eq!(rows["data"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_training_validation() {
        let app = app().await;
        let admin = login_as(&app.router, "admin", "admin123").await;

        let (status, _, _) = send(
            &app.router,
            json_request(
                "POST",
                "/api/admin/training",
                Some(&admin),
                serde_json::json!({ "example": "hi", "intent": "", "response": "x" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _, _) = send(
            &app.router,
            json_request(
                "POST",
                "/api/admin/training/delete/99",
                Some(&admin),
                serde_json::json!({}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_retrain_and_analytics() {
        let app = app().await;
        let admin = login_as(&app.router, "admin", "admin123").await;
        let customer = login_as(&app.router, "yesh", "srt123").await;

        chat(&app.router, &customer, "hello").await;
        chat(&app.router, &customer, "hello").await;
        chat(&app.router, &customer, "tell me a joke").await;

        let (status, json, _) = send(
            &app.router,
            json_request("POST", "/api/admin/retrain", Some(&admin), serde_json::json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["intents"].as_array().unwrap().len(), 4);
        assert_eq!(json["data"]["classifier"], "examples");

        let (_, json, _) = send(&app.router, get_request("/api/admin/analytics", &admin)).await;
        let report = &json["data"];
        assert_eq!(report["total"], 3);
        assert_eq!(report["intent_distribution"][0]["intent"], "greet");
        assert_eq!(report["top_queries"][0]["message"], "hello");
        assert_eq!(report["top_queries"][0]["count"], 2);

        let (_, json, _) = send(&app.router, get_request("/api/admin/logs", &admin)).await;
        let logs = json["data"].as_array().unwrap();
        assert_eq!(logs.len(), 3);
        assert_eq!(logs[0]["user_message"], "tell me a joke");
    }

    #[tokio::test]
    async fn test_relogin_replaces_previous_session() {
        let app = app().await;
        let first = login_as(&app.router, "yesh", "srt123").await;
        let second = login_with(&app.router, Some(&first), "yesh", "srt123").await;

        assert_ne!(first, second);
        assert_eq!(app.state.sessions.len().await, 1);

        let turn = chat(&app.router, &first, "hello").await;
        assert_eq!(turn["intent"], "error");
        let turn = chat(&app.router, &second, "hello").await;
        assert_eq!(turn["intent"], "greet");
    }

    #[tokio::test]
    async fn test_retrain_keeps_remote_classifier() {
        let app = app_with(|_| {
            Arc::new(RemoteClassifier::new("http://127.0.0.1:9/parse").unwrap())
                as Arc<dyn crate::IntentClassifier>
        })
        .await;
        let admin = login_as(&app.router, "admin", "admin123").await;

        let (status, json, _) = send(
            &app.router,
            json_request("POST", "/api/admin/retrain", Some(&admin), serde_json::json!({})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["classifier"], "remote");
        assert_eq!(
            app.state.assistant.classifier().current().await.name(),
            RemoteClassifier::NAME
        );
    }
}
