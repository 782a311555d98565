//! HTTP gateway for the Shang Han Lun chat service.
//!
//! Routes:
//!
//! - `GET  /health`
//! - `POST /api/login`, `POST /api/logout`
//! - `POST /api/chat`, `POST /api/feedback` (session required)
//! - `GET  /admin/api/conversations`, `/admin/api/conversation/{session_id}`,
//!   `/admin/api/feedback`, `/admin/api/audit`, `/admin/api/logs`
//!   (admin session required)
//!
//! Built on Axum; authentication, the admin guard and request logging are
//! plain middleware layers.

pub mod admin;
pub mod auth;
pub mod handlers;

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    http::StatusCode,
    middleware,
    response::Json,
    routing::{get, post},
};
use serde::Serialize;
use shanghan_config::AppConfig;
use shanghan_core::{ConversationSink, CredentialStore, FeedbackSink, SessionStore};
use shanghan_engine::ChatEngine;
use shanghan_knowledge::KnowledgeStore;
use shanghan_security::{AuditLogger, CredentialError, StaticCredentialStore};
use shanghan_store::InMemorySessionStore;
use tracing::info;

pub use auth::AuthenticatedUser;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub engine: Arc<ChatEngine>,
    pub sessions: Arc<dyn SessionStore>,
    pub credentials: Arc<dyn CredentialStore>,
    pub feedback: Arc<dyn FeedbackSink>,
    pub conversations: Arc<dyn ConversationSink>,
    pub audit: Arc<AuditLogger>,
    pub cookie_name: String,
    /// Where the admin logs endpoint looks for log files
    pub log_dir: Option<PathBuf>,
}

pub type SharedState = Arc<GatewayState>;

impl GatewayState {
    /// Wire every collaborator from configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self, CredentialError> {
        let credentials = StaticCredentialStore::from_config(&config.users)?;
        info!(users = credentials.len(), "Credential store loaded");

        let client = shanghan_providers::build_from_config(config);
        let engine = ChatEngine::new(client, KnowledgeStore::builtin());
        let sinks = shanghan_store::build_sinks(&config.storage);

        Ok(Self {
            engine: Arc::new(engine),
            sessions: Arc::new(InMemorySessionStore::new(config.gateway.max_sessions)),
            credentials: Arc::new(credentials),
            feedback: sinks.feedback,
            conversations: sinks.conversations,
            audit: Arc::new(AuditLogger::with_tracing(1_000)),
            cookie_name: config.gateway.cookie_name.clone(),
            log_dir: config.logging.log_dir.as_ref().map(PathBuf::from),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub(crate) fn api_error(status: StatusCode, message: &str) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
}

/// Build the Axum router with all gateway routes.
///
/// Layers, outermost first: HTTP trace, request log, 1 MB body limit.
/// Session and admin checks are route layers on their groups.
pub fn build_router(state: SharedState) -> Router {
    let user_api = Router::new()
        .route("/api/chat", post(handlers::chat))
        .route("/api/feedback", post(handlers::feedback))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_session,
        ));

    let admin_api = Router::new()
        .route("/admin/api/conversations", get(admin::conversations))
        .route("/admin/api/conversation/{session_id}", get(admin::conversation))
        .route("/admin/api/feedback", get(admin::feedback))
        .route("/admin/api/audit", get(admin::audit))
        .route("/admin/api/logs", get(admin::logs))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_admin,
        ));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/login", post(handlers::login))
        .route("/api/logout", post(handlers::logout))
        .merge(user_api)
        .merge(admin_api)
        .with_state(state)
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(middleware::from_fn(auth::log_request))
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let state = Arc::new(GatewayState::from_config(&config)?);
    let app = build_router(state);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, header};
    use http_body_util::BodyExt;
    use shanghan_config::UserConfig;
    use shanghan_core::{ChatClient, ChatError, ChatMessage};
    use shanghan_providers::DeepSeekClient;
    use shanghan_security::{AuditOutcome, hash_password};
    use shanghan_store::{InMemoryConversationSink, InMemoryFeedbackSink};
    use tower::ServiceExt;

    struct Harness {
        state: SharedState,
        conversations: Arc<InMemoryConversationSink>,
        feedback: Arc<InMemoryFeedbackSink>,
    }

    fn users() -> Vec<UserConfig> {
        vec![
            UserConfig {
                email: "prof@tcm.org".into(),
                password_hash: hash_password("password123").unwrap(),
                admin: true,
            },
            UserConfig {
                email: "regular@tcm.org".into(),
                password_hash: hash_password("userpass123").unwrap(),
                admin: false,
            },
        ]
    }

    fn harness_with(client: Arc<dyn ChatClient>) -> Harness {
        let conversations = Arc::new(InMemoryConversationSink::new());
        let feedback = Arc::new(InMemoryFeedbackSink::new());
        let state = Arc::new(GatewayState {
            engine: Arc::new(ChatEngine::new(client, KnowledgeStore::builtin())),
            sessions: Arc::new(InMemorySessionStore::new(10)),
            credentials: Arc::new(StaticCredentialStore::from_config(&users()).unwrap()),
            feedback: feedback.clone(),
            conversations: conversations.clone(),
            audit: Arc::new(AuditLogger::new(100)),
            cookie_name: "shanghan_session".into(),
            log_dir: None,
        });
        Harness {
            state,
            conversations,
            feedback,
        }
    }

    fn harness() -> Harness {
        harness_with(Arc::new(DeepSeekClient::new(None)))
    }

    fn post_json(uri: &str, body: serde_json::Value, session: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(id) = session {
            builder = builder.header(header::COOKIE, format!("shanghan_session={id}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get_as(uri: &str, session: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(id) = session {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {id}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn send(state: &SharedState, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = build_router(state.clone()).oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn login(state: &SharedState, email: &str, password: &str) -> String {
        let (status, body) = send(
            state,
            post_json("/api/login", serde_json::json!({"email": email, "password": password}), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body["session_id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn health_endpoint() {
        let h = harness();
        let (status, body) = send(&h.state, get_as("/health", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn login_sets_cookie() {
        let h = harness();
        let response = build_router(h.state.clone())
            .oneshot(post_json(
                "/api/login",
                serde_json::json!({"email": "prof@tcm.org", "password": "password123"}),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap().to_string();
        assert!(cookie.starts_with("shanghan_session="));
        assert!(cookie.contains("HttpOnly"));

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["redirect"], "/chat");
        assert_eq!(h.state.sessions.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn bad_password_is_rejected_and_audited() {
        let h = harness();
        let (status, body) = send(
            &h.state,
            post_json(
                "/api/login",
                serde_json::json!({"email": "prof@tcm.org", "password": "wrong"}),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, serde_json::json!({"success": false, "error": "Invalid credentials"}));
        assert_eq!(h.state.audit.entries_by_outcome(&AuditOutcome::Failure).len(), 1);
        assert_eq!(h.state.sessions.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn chat_requires_session() {
        let h = harness();
        let (status, body) = send(
            &h.state,
            post_json("/api/chat", serde_json::json!({"message": "hi"}), None),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Not authenticated");

        let (status, _) = send(
            &h.state,
            post_json("/api/chat", serde_json::json!({"message": "hi"}), Some("forged")),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn chat_without_key_answers_from_fallback_and_numbers_messages() {
        let h = harness();
        let session = login(&h.state, "regular@tcm.org", "userpass123").await;

        let (status, body) = send(
            &h.state,
            post_json("/api/chat", serde_json::json!({"message": "What is Ma Huang?"}), Some(&session)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["answer"].as_str().unwrap().starts_with("Ma Huang (Ephedra)"));
        assert_eq!(body["sources"], serde_json::json!(["Shang Han Lun - Chapter 3 (Ma Huang Tang)"]));
        assert_eq!(body["message_id"], "msg_2");

        let (_, body) = send(
            &h.state,
            post_json("/api/chat", serde_json::json!({"message": "And gui zhi?"}), Some(&session)),
        )
        .await;
        assert_eq!(body["message_id"], "msg_4");
        assert_eq!(h.state.sessions.history(&session).await.unwrap().len(), 4);
    }

    struct EchoHistory;

    #[async_trait::async_trait]
    impl ChatClient for EchoHistory {
        fn name(&self) -> &str {
            "echo"
        }

        fn model(&self) -> &str {
            "echo"
        }

        async fn chat(
            &self,
            messages: &[ChatMessage],
            _system_prompt: Option<&str>,
        ) -> Result<String, ChatError> {
            Ok(format!("seen {}", messages.len()))
        }
    }

    #[tokio::test]
    async fn history_flows_into_later_requests() {
        let h = harness_with(Arc::new(EchoHistory));
        let session = login(&h.state, "regular@tcm.org", "userpass123").await;

        let mut answers = Vec::new();
        for q in ["first", "second", "third"] {
            let (_, body) = send(
                &h.state,
                post_json("/api/chat", serde_json::json!({"message": q}), Some(&session)),
            )
            .await;
            answers.push(body["answer"].as_str().unwrap().to_string());
        }
        assert_eq!(answers, ["seen 1", "seen 3", "seen 5"]);
    }

    #[tokio::test]
    async fn concurrent_chats_on_one_session_are_serialized() {
        let h = harness();
        let session = login(&h.state, "regular@tcm.org", "userpass123").await;

        let tasks: Vec<_> = (0..5)
            .map(|i| {
                let state = h.state.clone();
                let session = session.clone();
                tokio::spawn(async move {
                    send(
                        &state,
                        post_json(
                            "/api/chat",
                            serde_json::json!({"message": format!("question {i}")}),
                            Some(&session),
                        ),
                    )
                    .await
                })
            })
            .collect();

        let mut ids = Vec::new();
        for task in tasks {
            let (_, body) = task.await.unwrap();
            ids.push(body["message_id"].as_str().unwrap().to_string());
        }
        ids.sort();
        assert_eq!(ids, ["msg_10", "msg_2", "msg_4", "msg_6", "msg_8"]);
        assert_eq!(h.state.sessions.history(&session).await.unwrap().len(), 10);
    }

    /// Answers only after `release` is notified.
    #[derive(Default)]
    struct Gated {
        started: tokio::sync::Notify,
        release: tokio::sync::Notify,
    }

    #[async_trait::async_trait]
    impl ChatClient for Gated {
        fn name(&self) -> &str {
            "gated"
        }

        fn model(&self) -> &str {
            "gated"
        }

        async fn chat(
            &self,
            _messages: &[ChatMessage],
            _system_prompt: Option<&str>,
        ) -> Result<String, ChatError> {
            self.started.notify_one();
            self.release.notified().await;
            Ok("released".into())
        }
    }

    #[tokio::test]
    async fn feedback_is_not_blocked_by_an_in_flight_chat() {
        let gate = Arc::new(Gated::default());
        let h = harness_with(gate.clone());
        let session = login(&h.state, "regular@tcm.org", "userpass123").await;

        let pending = {
            let state = h.state.clone();
            let session = session.clone();
            tokio::spawn(async move {
                send(
                    &state,
                    post_json("/api/chat", serde_json::json!({"message": "slow"}), Some(&session)),
                )
                .await
            })
        };
        gate.started.notified().await;

        let (status, _) = tokio::time::timeout(
            std::time::Duration::from_secs(2),
            send(
                &h.state,
                post_json(
                    "/api/feedback",
                    serde_json::json!({"message_id": "msg_0", "rating": "up"}),
                    Some(&session),
                ),
            ),
        )
        .await
        .expect("feedback waited on the chat's session lock");
        assert_eq!(status, StatusCode::OK);

        gate.release.notify_one();
        let (status, body) = pending.await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["answer"], "released");
        assert_eq!(body["message_id"], "msg_2");
    }

    #[tokio::test]
    async fn feedback_is_stored_with_user() {
        let h = harness();
        let session = login(&h.state, "regular@tcm.org", "userpass123").await;

        let (status, body) = send(
            &h.state,
            post_json(
                "/api/feedback",
                serde_json::json!({"message_id": "msg_2", "rating": "up", "feedback": "Helpful"}),
                Some(&session),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        let stored = h.feedback.list_feedback().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].user_email, "regular@tcm.org");
        assert_eq!(stored[0].message_id.as_deref(), Some("msg_2"));
        assert_eq!(stored[0].feedback, "Helpful");
    }

    #[tokio::test]
    async fn logout_archives_history_and_ends_session() {
        let h = harness();
        let session = login(&h.state, "regular@tcm.org", "userpass123").await;
        send(
            &h.state,
            post_json("/api/chat", serde_json::json!({"message": "What is Ma Huang?"}), Some(&session)),
        )
        .await;

        let (status, body) = send(&h.state, post_json("/api/logout", serde_json::json!({}), Some(&session))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        let archived = h.conversations.load_conversation(&session).await.unwrap().unwrap();
        assert_eq!(archived.user_email, "regular@tcm.org");
        assert_eq!(archived.messages.len(), 2);

        let (status, _) = send(
            &h.state,
            post_json("/api/chat", serde_json::json!({"message": "again"}), Some(&session)),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        // A second logout still succeeds.
        let (status, _) = send(&h.state, post_json("/api/logout", serde_json::json!({}), Some(&session))).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn logout_with_empty_history_archives_nothing() {
        let h = harness();
        let session = login(&h.state, "regular@tcm.org", "userpass123").await;
        send(&h.state, post_json("/api/logout", serde_json::json!({}), Some(&session))).await;
        assert!(h.conversations.list_conversations().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn admin_endpoints_enforce_roles() {
        let h = harness();
        let (status, body) = send(&h.state, get_as("/admin/api/feedback", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Authentication required");

        let regular = login(&h.state, "regular@tcm.org", "userpass123").await;
        let (status, body) = send(&h.state, get_as("/admin/api/feedback", Some(&regular))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Admin access required");

        let prof = login(&h.state, "prof@tcm.org", "password123").await;
        let (status, body) = send(&h.state, get_as("/admin/api/feedback", Some(&prof))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["feedbacks"], serde_json::json!([]));
        assert_eq!(h.state.audit.entries_by_outcome(&AuditOutcome::Denied).len(), 2);
    }

    #[tokio::test]
    async fn admin_sees_archived_conversations() {
        let h = harness();
        let regular = login(&h.state, "regular@tcm.org", "userpass123").await;
        send(
            &h.state,
            post_json("/api/chat", serde_json::json!({"message": "What is Ma Huang?"}), Some(&regular)),
        )
        .await;
        send(&h.state, post_json("/api/logout", serde_json::json!({}), Some(&regular))).await;

        let prof = login(&h.state, "prof@tcm.org", "password123").await;
        let (status, body) = send(&h.state, get_as("/admin/api/conversations", Some(&prof))).await;
        assert_eq!(status, StatusCode::OK);
        let list = body["conversations"].as_array().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0]["session_id"], regular.as_str());
        assert_eq!(list[0]["message_count"], 2);

        let (status, body) = send(
            &h.state,
            get_as(&format!("/admin/api/conversation/{regular}"), Some(&prof)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["messages"][0]["content"], "What is Ma Huang?");

        let (status, body) = send(&h.state, get_as("/admin/api/conversation/unknown", Some(&prof))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Conversation not found");
    }

    #[tokio::test]
    async fn admin_reads_audit_trail_newest_first() {
        let h = harness();
        let regular = login(&h.state, "regular@tcm.org", "userpass123").await;
        let (status, _) = send(&h.state, get_as("/admin/api/audit", Some(&regular))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let admin = login(&h.state, "prof@tcm.org", "password123").await;

        let (status, body) = send(&h.state, get_as("/admin/api/audit", Some(&admin))).await;
        assert_eq!(status, StatusCode::OK);
        let entries = body["entries"].as_array().unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0]["actor"], "prof@tcm.org");
        assert_eq!(entries[0]["event"]["type"], "login");
        assert_eq!(entries[2]["actor"], "regular@tcm.org");

        let (_, body) = send(&h.state, get_as("/admin/api/audit?outcome=denied", Some(&admin))).await;
        let denied = body["entries"].as_array().unwrap();
        assert_eq!(denied.len(), 1);
        assert_eq!(denied[0]["event"]["type"], "admin_denied");
        assert_eq!(denied[0]["event"]["path"], "/admin/api/audit");
        assert_eq!(denied[0]["outcome"], "denied");
    }

    #[tokio::test]
    async fn admin_logs_without_log_dir_is_empty() {
        let h = harness();
        let prof = login(&h.state, "prof@tcm.org", "password123").await;
        let (status, body) = send(&h.state, get_as("/admin/api/logs", Some(&prof))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["logs"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let h = harness();
        let response = build_router(h.state.clone())
            .oneshot(get_as("/nope", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let h = harness();
        let session = login(&h.state, "regular@tcm.org", "userpass123").await;
        let big = "a".repeat(2 * 1024 * 1024);
        let response = build_router(h.state.clone())
            .oneshot(post_json("/api/chat", serde_json::json!({"message": big}), Some(&session)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
