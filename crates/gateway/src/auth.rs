//! Request middleware: session authentication, admin guard, request log.
//!
//! A session is identified by the cookie set at login or by
//! `Authorization: Bearer <session id>`. On success the middleware inserts
//! an [`AuthenticatedUser`] and the session's handle into the request
//! extensions, and copies the user onto the response so the request log
//! can name them.

use std::time::Instant;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use shanghan_core::SessionHandle;
use shanghan_security::{AuditEvent, AuditOutcome};
use tracing::{info, warn};

use crate::{GatewayState, SharedState, api_error};

/// The identity behind an authenticated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub email: String,
    pub session_id: String,
    pub admin: bool,
}

/// Extract the session id from the bearer header or the session cookie.
pub fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .find_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (name == cookie_name && !value.is_empty()).then(|| value.to_string())
        })
}

async fn resolve(
    state: &GatewayState,
    headers: &HeaderMap,
) -> Option<(AuthenticatedUser, SessionHandle)> {
    let token = session_token(headers, &state.cookie_name)?;
    let handle = match state.sessions.get(&token).await {
        Ok(handle) => handle?,
        Err(e) => {
            warn!(error = %e, "Session lookup failed");
            return None;
        }
    };
    let email = handle.user_email().to_string();
    let admin = state.credentials.is_admin(&email);
    Some((
        AuthenticatedUser {
            email,
            session_id: token,
            admin,
        },
        handle,
    ))
}

async fn run_as(user: AuthenticatedUser, handle: SessionHandle, mut req: Request, next: Next) -> Response {
    req.extensions_mut().insert(user.clone());
    req.extensions_mut().insert(handle);
    let mut response = next.run(req).await;
    response.extensions_mut().insert(user);
    response
}

/// Reject requests without a live session (401 `Not authenticated`).
pub async fn require_session(State(state): State<SharedState>, req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();
    let Some((user, handle)) = resolve(&state, req.headers()).await else {
        warn!(path = %path, "Unauthenticated request");
        state.audit.log(
            AuditEvent::Unauthenticated { path: path.clone() },
            "anonymous",
            &path,
            AuditOutcome::Denied,
            None,
        );
        return api_error(StatusCode::UNAUTHORIZED, "Not authenticated").into_response();
    };
    run_as(user, handle, req, next).await
}

/// Admin endpoints: 401 without a session, 403 for non-admin users.
pub async fn require_admin(State(state): State<SharedState>, req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();
    let Some((user, handle)) = resolve(&state, req.headers()).await else {
        warn!(path = %path, "Admin endpoint hit without a session");
        state.audit.log(
            AuditEvent::Unauthenticated { path: path.clone() },
            "anonymous",
            &path,
            AuditOutcome::Denied,
            None,
        );
        return api_error(StatusCode::UNAUTHORIZED, "Authentication required").into_response();
    };

    if !user.admin {
        warn!(user = %user.email, path = %path, "Admin access denied");
        state.audit.log(
            AuditEvent::AdminDenied { path: path.clone() },
            &user.email,
            &path,
            AuditOutcome::Denied,
            None,
        );
        let mut response =
            api_error(StatusCode::FORBIDDEN, "Admin access required").into_response();
        response.extensions_mut().insert(user);
        return response;
    }
    run_as(user, handle, req, next).await
}

/// Log method, path, user, status and duration of every request.
pub async fn log_request(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(req).await;

    let user = response
        .extensions()
        .get::<AuthenticatedUser>()
        .map(|u| u.email.as_str())
        .unwrap_or("anonymous");
    info!(
        method = %method,
        path = %path,
        user = %user,
        status = response.status().as_u16(),
        duration_ms = started.elapsed().as_millis() as u64,
        "REQUEST"
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn token_from_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; shanghan_session=abc123; other=1"),
        );
        assert_eq!(session_token(&headers, "shanghan_session").as_deref(), Some("abc123"));
        assert_eq!(session_token(&headers, "missing"), None);
    }

    #[test]
    fn bearer_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("shanghan_session=cookie"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer token"));
        assert_eq!(session_token(&headers, "shanghan_session").as_deref(), Some("token"));
    }

    #[test]
    fn empty_values_are_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("shanghan_session="));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(session_token(&headers, "shanghan_session"), None);
    }
}
