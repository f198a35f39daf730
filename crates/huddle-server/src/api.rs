use std::sync::Arc;

use axum::{
    extract::State,
    http::Method,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use huddle_shared::constants::{AVAILABILITY_PATH, GROUP_PATH, MESSAGES_PATH, SCHEDULE_PATH};
use huddle_shared::protocol::{
    parse_timestamp, AvailabilityRequest, ScheduleRequest, SendMessageRequest, SendMessageResponse,
    StatusResponse,
};
use huddle_shared::{Group, Message};

use crate::auth::AuthUser;
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::intent;
use crate::store::ChatStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ChatStore>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Fresh store holding the configured group and its accounts.
    pub fn new(config: ServerConfig) -> Self {
        let members = config.accounts.iter().map(|a| a.user.clone()).collect();
        Self {
            store: Arc::new(ChatStore::new(config.group_name.clone(), members)),
            config: Arc::new(config),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route(GROUP_PATH, get(get_group))
        .route(MESSAGES_PATH, get(list_messages).post(send_message))
        .route(SCHEDULE_PATH, post(schedule_meeting))
        .route(AVAILABILITY_PATH, post(update_availability))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn get_group(State(state): State<AppState>, _user: AuthUser) -> Json<Group> {
    Json(state.store.group().await)
}

async fn list_messages(State(state): State<AppState>, _user: AuthUser) -> Json<Vec<Message>> {
    Json(
        state
            .store
            .list_messages(state.config.message_history_limit)
            .await,
    )
}

/// Store the message; if it reads like a request to meet, also open a
/// meeting proposal and return it alongside.
async fn send_message(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<SendMessageResponse>, ServerError> {
    let content = req.content.trim();
    if content.is_empty() {
        return Err(ServerError::BadRequest("Message content is required".into()));
    }

    let now = Utc::now();
    let message = state.store.create_message(&user, content).await;
    let analysis = intent::analyze(content, now);

    let meeting = if analysis.has_meeting_intent {
        Some(state.store.create_meeting(&user, content, now).await)
    } else {
        None
    };

    info!(
        id = %message.id,
        user = %user.username,
        meeting = meeting.is_some(),
        "Message posted"
    );

    Ok(Json(SendMessageResponse {
        message,
        meeting,
        nlp_analysis: Some(analysis),
    }))
}

async fn schedule_meeting(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(req): Json<ScheduleRequest>,
) -> Result<Json<StatusResponse>, ServerError> {
    let time = parse_timestamp(&req.time)?;
    state.store.schedule(req.meeting_id, time).await?;

    Ok(Json(StatusResponse {
        status: "Meeting scheduled".into(),
    }))
}

async fn update_availability(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<AvailabilityRequest>,
) -> Result<Json<StatusResponse>, ServerError> {
    state
        .store
        .update_availability(req.meeting_id, user.id, req.is_available)
        .await?;

    Ok(Json(StatusResponse {
        status: "Availability updated".into(),
    }))
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use chrono::TimeZone;
    use huddle_shared::MeetingId;
    use tower::ServiceExt;

    fn state() -> AppState {
        AppState::new(ServerConfig::default())
    }

    fn request(method: Method, path: &str, token: Option<&str>, body: Option<serde_json::Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn call(state: &AppState, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let resp = build_router(state.clone()).oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    #[tokio::test]
    async fn test_health_needs_no_token() {
        let (status, body) = call(&state(), request(Method::GET, "/health", None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_missing_or_unknown_token_is_rejected() {
        let state = state();
        let (status, body) = call(&state, request(Method::GET, GROUP_PATH, None, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["error"].is_string());

        let (status, _) = call(&state, request(Method::GET, GROUP_PATH, Some("nope"), None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_group_lists_configured_members() {
        let (status, body) =
            call(&state(), request(Method::GET, GROUP_PATH, Some("alice-token"), None)).await;
        assert_eq!(status, StatusCode::OK);
        let group: Group = serde_json::from_value(body).unwrap();
        assert_eq!(group.name, "General");
        assert_eq!(group.member_names(), "alice, bob");
    }

    #[tokio::test]
    async fn test_plain_message_has_no_meeting() {
        let state = state();
        let (status, body) = call(
            &state,
            request(
                Method::POST,
                MESSAGES_PATH,
                Some("bob-token"),
                Some(serde_json::json!({ "content": "hello" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"]["content"], "hello");
        assert_eq!(body["message"]["user"]["username"], "bob");
        assert!(body.get("meeting").is_none());
        assert_eq!(body["nlp_analysis"]["has_meeting_intent"], false);

        let (_, list) = call(&state, request(Method::GET, MESSAGES_PATH, Some("alice-token"), None)).await;
        let messages: Vec<Message> = serde_json::from_value(list).unwrap();
        assert_eq!(messages.len(), 1);
    }

    #[tokio::test]
    async fn test_blank_message_is_rejected() {
        let (status, _) = call(
            &state(),
            request(
                Method::POST,
                MESSAGES_PATH,
                Some("bob-token"),
                Some(serde_json::json!({ "content": "   " })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_meeting_intent_opens_proposal_and_schedules() {
        let state = state();
        let (_, body) = call(
            &state,
            request(
                Method::POST,
                MESSAGES_PATH,
                Some("alice-token"),
                Some(serde_json::json!({ "content": "can we meet tomorrow?" })),
            ),
        )
        .await;
        assert_eq!(body["meeting"]["title"], "Meeting initiated by alice");
        assert_eq!(body["meeting"]["description"], "can we meet tomorrow?");
        let id = MeetingId(body["meeting"]["id"].as_i64().unwrap());

        let when = Utc.with_ymd_and_hms(2026, 10, 19, 15, 0, 0).unwrap();
        let (status, body) = call(
            &state,
            request(
                Method::POST,
                SCHEDULE_PATH,
                Some("bob-token"),
                Some(serde_json::to_value(ScheduleRequest::new(id, when)).unwrap()),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "Meeting scheduled");
        let meeting = state.store.meeting(id).await.unwrap();
        assert_eq!(meeting.scheduled_time, Some(when));
    }

    #[tokio::test]
    async fn test_schedule_unknown_meeting_is_404() {
        let (status, body) = call(
            &state(),
            request(
                Method::POST,
                SCHEDULE_PATH,
                Some("alice-token"),
                Some(serde_json::json!({ "meeting_id": 99, "time": "2026-10-19T15:00:00.000Z" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Meeting not found");
    }

    #[tokio::test]
    async fn test_schedule_rejects_bad_timestamp() {
        let (status, _) = call(
            &state(),
            request(
                Method::POST,
                SCHEDULE_PATH,
                Some("alice-token"),
                Some(serde_json::json!({ "meeting_id": 1, "time": "next tuesday" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_availability_updates_caller_row() {
        let state = state();
        let meeting = state
            .store
            .create_meeting(&huddle_shared::User::new(1, "alice"), "sync", Utc::now())
            .await;

        let (status, body) = call(
            &state,
            request(
                Method::POST,
                AVAILABILITY_PATH,
                Some("bob-token"),
                Some(serde_json::json!({ "meeting_id": meeting.id, "is_available": true })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "Availability updated");

        let (status, body) = call(
            &state,
            request(
                Method::POST,
                AVAILABILITY_PATH,
                Some("bob-token"),
                Some(serde_json::json!({ "meeting_id": 77, "is_available": true })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Availability not found");
    }
}
