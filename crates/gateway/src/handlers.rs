//! Public and user-facing handlers: health, login, logout, chat, feedback.

use axum::{
    Extension,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use shanghan_core::{
    AnswerResult, ConversationRecord, ConversationTurn, FeedbackRecord, SessionHandle,
    truncate_chars,
};
use shanghan_security::{AuditEvent, AuditOutcome};
use tracing::{debug, error, info, warn};

use crate::auth::{AuthenticatedUser, session_token};
use crate::{ApiError, SharedState, api_error};

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Serialize)]
struct LoginResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'static str>,
}

fn session_cookie(name: &str, value: &str) -> String {
    format!("{name}={value}; HttpOnly; Path=/; SameSite=Lax")
}

pub async fn login(
    State(state): State<SharedState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    let email = payload.email.trim().to_lowercase();
    info!(user = %email, "Login attempt");

    if email.is_empty() || !state.credentials.verify(&email, &payload.password) {
        warn!(user = %email, "Failed login attempt");
        state.audit.log(
            AuditEvent::Login,
            &email,
            "/api/login",
            AuditOutcome::Failure,
            Some("Invalid credentials".into()),
        );
        let body = LoginResponse {
            success: false,
            redirect: None,
            session_id: None,
            error: Some("Invalid credentials"),
        };
        return Ok((StatusCode::UNAUTHORIZED, Json(body)).into_response());
    }

    let handle = state.sessions.create(&email).await.map_err(|e| {
        error!(error = %e, "Failed to open session");
        api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to open session")
    })?;
    let session_id = handle.id().to_string();

    state
        .audit
        .log(AuditEvent::Login, &email, "/api/login", AuditOutcome::Success, None);
    info!(user = %email, session = %session_id, "Login successful");

    let body = LoginResponse {
        success: true,
        redirect: Some("/chat"),
        session_id: Some(session_id.clone()),
        error: None,
    };
    Ok((
        [(header::SET_COOKIE, session_cookie(&state.cookie_name, &session_id))],
        Json(body),
    )
        .into_response())
}

/// Close the caller's session, archiving a non-empty conversation first.
/// Always succeeds, with or without a session.
pub async fn logout(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    if let Some(token) = session_token(&headers, &state.cookie_name) {
        match state.sessions.remove(&token).await {
            Ok(Some(session)) => {
                let user = session.user_email.clone();
                if !session.turns.is_empty() {
                    let record = ConversationRecord {
                        session_id: session.id,
                        user_email: session.user_email,
                        timestamp: Utc::now(),
                        messages: session.turns,
                    };
                    if let Err(e) = state.conversations.save_conversation(record).await {
                        error!(error = %e, session = %token, "Failed to archive conversation");
                    }
                }
                state
                    .audit
                    .log(AuditEvent::Logout, &user, "/api/logout", AuditOutcome::Success, None);
                info!(user = %user, "Logout completed");
            }
            Ok(None) => debug!("Logout for unknown session"),
            Err(e) => warn!(error = %e, "Session removal failed"),
        }
    }

    let cleared = format!("{}; Max-Age=0", session_cookie(&state.cookie_name, ""));
    (
        [(header::SET_COOKIE, cleared)],
        Json(serde_json::json!({ "success": true })),
    )
        .into_response()
}

#[derive(Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    message: String,
}

/// Answer a question within the caller's session.
///
/// The session lock is held from reading the history until both new turns
/// are appended, so concurrent requests on one session are serialized.
pub async fn chat(
    State(state): State<SharedState>,
    Extension(user): Extension<AuthenticatedUser>,
    Extension(handle): Extension<SessionHandle>,
    Json(payload): Json<ChatRequest>,
) -> Json<AnswerResult> {
    info!(
        user = %user.email,
        message = %truncate_chars(&payload.message, 100),
        "Chat request"
    );

    let mut session = handle.lock().await;
    let history = session.history();
    let result = state.engine.process_query(&payload.message, &history).await;

    session.push(ConversationTurn::user(payload.message));
    session.push(ConversationTurn::assistant(
        result.answer.clone(),
        result.sources.clone(),
    ));
    let message_id = format!("msg_{}", session.turns.len());
    drop(session);

    info!(user = %user.email, message_id = %message_id, "Chat response sent");
    Json(result.with_message_id(message_id))
}

#[derive(Deserialize)]
pub struct FeedbackRequest {
    #[serde(default)]
    message_id: Option<String>,
    #[serde(default)]
    rating: Option<serde_json::Value>,
    #[serde(default)]
    feedback: Option<String>,
}

pub async fn feedback(
    State(state): State<SharedState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(payload): Json<FeedbackRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    info!(
        user = %user.email,
        message_id = ?payload.message_id,
        rating = ?payload.rating,
        "Feedback received"
    );

    let rating = payload.rating.as_ref().map(|r| r.to_string());
    let record = FeedbackRecord {
        message_id: payload.message_id.clone(),
        rating: payload.rating,
        feedback: payload.feedback.unwrap_or_default(),
        timestamp: Utc::now(),
        user_email: user.email.clone(),
    };

    state.feedback.write_feedback(record).await.map_err(|e| {
        error!(error = %e, "Failed to save feedback");
        api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to save feedback")
    })?;

    state.audit.log(
        AuditEvent::Feedback {
            message_id: payload.message_id.clone(),
        },
        &user.email,
        "/api/feedback",
        AuditOutcome::Success,
        Some(format!(
            "Rating={}, Message={}",
            rating.as_deref().unwrap_or("none"),
            payload.message_id.as_deref().unwrap_or("none")
        )),
    );

    Ok(Json(serde_json::json!({ "success": true })))
}
