//! Server-Sent Events stream of the caller's change notifications.

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::Stream;
use tokio_stream::StreamExt as _;

use notekeep_core::defaults::SSE_KEEPALIVE_SECS;
use notekeep_core::EventEnvelope;

use crate::auth::CurrentUser;
use crate::AppState;

/// GET /api/v1/events
///
/// Each event's `event:` field is the event type (`notes.changed`) and its
/// data is the JSON envelope. Events for other users are filtered out, and
/// a lagging client silently skips what it missed.
pub async fn sse_events(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.event_bus.subscribe();
    let user_id = ctx.user_id().to_string();

    tracing::debug!(
        subsystem = "api",
        component = "events",
        user_id = %user_id,
        "SSE subscriber connected"
    );

    let stream = tokio_stream::wrappers::BroadcastStream::new(rx).filter_map(
        move |result: Result<EventEnvelope, _>| match result {
            Ok(envelope) if envelope.is_for(&user_id) => {
                let json = serde_json::to_string(&envelope).ok()?;
                Some(Ok::<_, Infallible>(
                    Event::default().event(envelope.event_type).data(json),
                ))
            }
            _ => None,
        },
    );

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(SSE_KEEPALIVE_SECS))
            .text("keepalive"),
    )
}
