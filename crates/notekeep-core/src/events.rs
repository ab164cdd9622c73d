//! Change notifications for the presentation layer.
//!
//! Every successful mutation emits a [`ServerEvent`] on the [`EventBus`].
//! Clients subscribe (the API exposes an SSE stream) and refresh the views
//! belonging to their own user when data changes.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Kind of change applied to a user's notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteChange {
    Created,
    Updated,
    Deleted,
    Archived,
    Unarchived,
}

/// Domain events broadcast by the server.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// A user's notes (and therefore possibly tag counts) changed.
    NotesChanged {
        user_id: String,
        note_id: Uuid,
        change: NoteChange,
    },
}

impl ServerEvent {
    /// Dot-namespaced event type used as the SSE `event:` field.
    pub fn event_type(&self) -> &'static str {
        match self {
            ServerEvent::NotesChanged { .. } => "notes.changed",
        }
    }

    /// The user whose data this event concerns.
    pub fn user_id(&self) -> &str {
        match self {
            ServerEvent::NotesChanged { user_id, .. } => user_id,
        }
    }
}

/// Event wrapper carrying id and timestamp.
#[derive(Debug, Clone, Serialize)]
pub struct EventEnvelope {
    /// UUIDv7, so ids sort by emission time.
    pub event_id: Uuid,
    pub event_type: String,
    pub occurred_at: DateTime<Utc>,
    pub payload: ServerEvent,
}

impl EventEnvelope {
    pub fn new(payload: ServerEvent) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            event_type: payload.event_type().to_string(),
            occurred_at: Utc::now(),
            payload,
        }
    }

    /// Whether this event should be delivered to `user_id`.
    pub fn is_for(&self, user_id: &str) -> bool {
        self.payload.user_id() == user_id
    }
}

/// Broadcast hub for [`ServerEvent`]s.
///
/// Uses `tokio::sync::broadcast` with a configurable buffer size. Slow
/// receivers that fall behind get a `Lagged` error and miss events; a client
/// that misses a change refetches on the next one.
pub struct EventBus {
    tx: broadcast::Sender<EventEnvelope>,
}

impl EventBus {
    /// Create a new event bus with the given buffer capacity.
    ///
    /// Recommended: 256 for production, 32 for tests.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Emit an event to all subscribers. Dropped silently when nobody listens.
    pub fn emit(&self, event: ServerEvent) {
        let envelope = EventEnvelope::new(event);
        let subscriber_count = self.tx.receiver_count();
        tracing::debug!(
            event_type = %envelope.event_type,
            event_id = %envelope.event_id,
            subscriber_count,
            "EventBus emit"
        );
        let _ = self.tx.send(envelope);
    }

    /// Convenience for the common note-change event.
    pub fn notes_changed(&self, user_id: &str, note_id: Uuid, change: NoteChange) {
        self.emit(ServerEvent::NotesChanged {
            user_id: user_id.to_string(),
            note_id,
            change,
        });
    }

    /// Subscribe to receive enveloped events. Each subscriber gets its own independent stream.
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.tx.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
