//! Session authentication: the `CurrentUser` extractor and the sign-in,
//! callback, and sign-out endpoints.

use axum::{
    async_trait,
    extract::{FromRequestParts, Query, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use notekeep_core::defaults::{LOGIN_STATE_TTL_MINUTES, SESSION_COOKIE_NAME};
use notekeep_core::{Error, RequestContext, Result};

use crate::{ApiError, AppState, SessionSettings};

// =============================================================================
// EXTRACTOR
// =============================================================================

/// The signed-in caller, resolved from the session cookie or a Bearer token.
///
/// Handlers taking this extractor reject anonymous requests with 401.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub RequestContext);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let resolved = match session_token(&parts.headers) {
            Some(token) => state.sessions.resolve(&token).await?,
            None => None,
        };
        Ok(CurrentUser(RequestContext::from_resolved(resolved)?))
    }
}

/// Session token from `Authorization: Bearer` or the session cookie.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    CookieJar::from_headers(headers)
        .get(SESSION_COOKIE_NAME)
        .map(|c| c.value_trimmed().to_string())
        .filter(|v| !v.is_empty())
}

/// Cookie establishing a session.
pub fn session_cookie(token: &str, settings: &SessionSettings) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, token.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(settings.cookie_secure)
        .max_age(time::Duration::seconds(settings.ttl.num_seconds()))
        .build()
}

/// Expired, empty session cookie that makes the browser drop its copy.
pub fn clear_session_cookie(settings: &SessionSettings) -> Cookie<'static> {
    let mut cookie = Cookie::build(SESSION_COOKIE_NAME)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(settings.cookie_secure)
        .build();
    cookie.make_removal();
    cookie
}

/// 302 Found to `location`.
fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

// =============================================================================
// HANDLERS
// =============================================================================

/// GET /auth/login - redirect to the identity provider.
pub async fn login(State(state): State<AppState>) -> std::result::Result<Response, ApiError> {
    let redirect = state.identity.authorize();
    state
        .sessions
        .create_login_state(
            &redirect.state,
            &redirect.pkce_verifier,
            Duration::minutes(LOGIN_STATE_TTL_MINUTES),
        )
        .await?;
    Ok(found(&redirect.url))
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// GET /auth/callback - finish sign-in.
///
/// Always redirects to `/`. Failures are logged and leave the browser
/// without a session.
pub async fn callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Response {
    match complete_login(&state, params).await {
        Ok(token) => {
            let jar = jar.add(session_cookie(&token, &state.session_settings));
            (StatusCode::FOUND, jar, [(header::LOCATION, "/")]).into_response()
        }
        Err(err) => {
            warn!(
                subsystem = "auth",
                op = "callback",
                error = %err,
                "Sign-in failed"
            );
            found("/")
        }
    }
}

async fn complete_login(state: &AppState, params: CallbackParams) -> Result<String> {
    if let Some(error) = params.error {
        return Err(Error::Identity(format!("provider returned error: {}", error)));
    }

    let login_state = params
        .state
        .ok_or_else(|| Error::Identity("missing state parameter".to_string()))?;
    let pkce_verifier = state
        .sessions
        .consume_login_state(&login_state)
        .await?
        .ok_or_else(|| Error::Identity("unknown or expired login state".to_string()))?;

    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| Error::Identity("missing authorization code".to_string()))?;

    let identity = state.identity.exchange_code(&code, &pkce_verifier).await?;
    let user = state.users.upsert(&identity).await?;
    let token = state
        .sessions
        .create(&user.id, state.session_settings.ttl)
        .await?;

    info!(
        subsystem = "auth",
        op = "login",
        user_id = %user.id,
        "User signed in"
    );
    Ok(token)
}

/// POST /auth/logout - revoke the session and clear the cookie.
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> std::result::Result<Response, ApiError> {
    if let Some(token) = session_token(&headers) {
        state.sessions.revoke(&token).await?;
        info!(subsystem = "auth", op = "logout", "Session revoked");
    }
    let jar = CookieJar::new().add(clear_session_cookie(&state.session_settings));
    Ok((StatusCode::NO_CONTENT, jar).into_response())
}

/// Signed-in user.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct MeResponse {
    pub id: String,
    pub email: Option<String>,
}

/// GET /api/v1/me - the current user.
#[utoipa::path(
    get,
    path = "/api/v1/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Current user", body = MeResponse),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn me(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
) -> std::result::Result<Json<MeResponse>, ApiError> {
    let user = state.users.get(ctx.user_id()).await?;
    Ok(Json(MeResponse {
        id: ctx.user_id().to_string(),
        email: user.map(|u| u.email),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn settings(cookie_secure: bool) -> SessionSettings {
        SessionSettings {
            ttl: Duration::hours(1),
            cookie_secure,
        }
    }

    #[test]
    fn test_session_token_from_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; notekeep_session=abc123; other=1"),
        );
        assert_eq!(session_token(&headers).as_deref(), Some("abc123"));
    }

    #[test]
    fn test_session_token_from_quoted_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("notekeep_session=\"abc123\""),
        );
        assert_eq!(session_token(&headers).as_deref(), Some("abc123"));
    }

    #[test]
    fn test_session_token_prefers_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer tok"));
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("notekeep_session=cookie"),
        );
        assert_eq!(session_token(&headers).as_deref(), Some("tok"));
    }

    #[test]
    fn test_session_token_absent() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("notekeep_session="));
        assert_eq!(session_token(&headers), None);
        assert_eq!(session_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("t", &settings(true));
        assert_eq!(cookie.name(), SESSION_COOKIE_NAME);
        assert_eq!(cookie.value(), "t");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.max_age(), Some(time::Duration::hours(1)));

        let insecure = session_cookie("t", &settings(false));
        assert!(!insecure.to_string().contains("Secure"));
    }

    #[test]
    fn test_clear_session_cookie_expires_immediately() {
        let cookie = clear_session_cookie(&settings(false));
        assert_eq!(cookie.name(), SESSION_COOKIE_NAME);
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(time::Duration::ZERO));
    }
}
