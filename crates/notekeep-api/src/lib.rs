//! notekeep-api - HTTP API server for notekeep
//!
//! The library exposes the router and application state so the binary and
//! the integration tests assemble the same service.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod identity;

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Duration;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

use notekeep_core::defaults;
use notekeep_core::{
    EventBus, IdentityProvider, NoteRepository, SessionRepository, TagRepository, UserRepository,
};
use notekeep_db::{Database, MemoryStore};

pub use error::ApiError;

// =============================================================================
// REQUEST ID (UUIDv7)
// =============================================================================

/// Generates time-ordered UUIDv7 request correlation IDs.
#[derive(Clone, Default)]
pub struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

// =============================================================================
// APPLICATION STATE
// =============================================================================

/// Session cookie settings.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub ttl: Duration,
    pub cookie_secure: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            ttl: Duration::hours(defaults::SESSION_TTL_HOURS),
            cookie_secure: true,
        }
    }
}

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub notes: Arc<dyn NoteRepository>,
    pub tags: Arc<dyn TagRepository>,
    pub users: Arc<dyn UserRepository>,
    pub sessions: Arc<dyn SessionRepository>,
    pub identity: Arc<dyn IdentityProvider>,
    /// Change notifications for SSE subscribers.
    pub event_bus: Arc<EventBus>,
    pub session_settings: SessionSettings,
}

impl AppState {
    /// State backed by PostgreSQL repositories.
    pub fn from_database(
        db: Database,
        identity: Arc<dyn IdentityProvider>,
        session_settings: SessionSettings,
    ) -> Self {
        Self {
            notes: Arc::new(db.notes),
            tags: Arc::new(db.tags),
            users: Arc::new(db.users),
            sessions: Arc::new(db.sessions),
            identity,
            event_bus: Arc::new(EventBus::new(defaults::EVENT_BUS_CAPACITY)),
            session_settings,
        }
    }

    /// State backed by a single in-memory store.
    pub fn in_memory(
        store: MemoryStore,
        identity: Arc<dyn IdentityProvider>,
        session_settings: SessionSettings,
    ) -> Self {
        Self {
            notes: Arc::new(store.clone()),
            tags: Arc::new(store.clone()),
            users: Arc::new(store.clone()),
            sessions: Arc::new(store),
            identity,
            event_bus: Arc::new(EventBus::new(defaults::EVENT_BUS_CAPACITY)),
            session_settings,
        }
    }
}

// =============================================================================
// OPENAPI
// =============================================================================

#[derive(OpenApi)]
#[openapi(
    info(
        title = "notekeep API",
        description = "Personal notes with tags, archive, and search"
    ),
    paths(
        health_check,
        auth::me,
        handlers::notes::list_notes,
        handlers::notes::create_note,
        handlers::notes::get_note,
        handlers::notes::update_note,
        handlers::notes::delete_note,
        handlers::notes::archive_note,
        handlers::notes::unarchive_note,
        handlers::notes::list_archived,
        handlers::tags::list_tags,
        handlers::tags::notes_for_tag,
    ),
    components(schemas(
        notekeep_core::Note,
        notekeep_core::NoteDraft,
        notekeep_core::TagWithCount,
        auth::MeResponse,
    )),
    tags(
        (name = "Notes", description = "Note CRUD, archive, and search"),
        (name = "Tags", description = "Tag listing"),
        (name = "Auth", description = "Sign-in and session"),
        (name = "System", description = "Health checks")
    )
)]
pub struct ApiDoc;

// =============================================================================
// ROUTER
// =============================================================================

/// Build the application router with tracing and request-id middleware.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Sign-in flow
        .route("/auth/login", get(auth::login))
        .route("/auth/callback", get(auth::callback))
        .route("/auth/logout", post(auth::logout))
        .route("/api/v1/me", get(auth::me))
        // Notes
        .route(
            "/api/v1/notes",
            get(handlers::notes::list_notes).post(handlers::notes::create_note),
        )
        .route(
            "/api/v1/notes/:id",
            get(handlers::notes::get_note)
                .put(handlers::notes::update_note)
                .delete(handlers::notes::delete_note),
        )
        .route(
            "/api/v1/notes/:id/archive",
            post(handlers::notes::archive_note),
        )
        .route(
            "/api/v1/notes/:id/unarchive",
            post(handlers::notes::unarchive_note),
        )
        .route("/api/v1/archived", get(handlers::notes::list_archived))
        // Tags
        .route("/api/v1/tags", get(handlers::tags::list_tags))
        .route(
            "/api/v1/tags/:tag/notes",
            get(handlers::tags::notes_for_tag),
        )
        // Change events
        .route("/api/v1/events", get(handlers::events::sse_events))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TraceLayer::new_for_http()),
        )
        .with_state(state)
}

/// CORS layer allowing credentialed requests from `origins`.
///
/// Invalid origins are logged and skipped. An empty list allows no
/// cross-origin requests.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!("Invalid CORS origin '{}': {}", origin, e);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

/// Liveness check.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    responses((status = 200, description = "Service is up"))
)]
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
