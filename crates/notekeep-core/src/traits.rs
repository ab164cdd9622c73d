//! Core traits for notekeep abstractions.
//!
//! These traits define the interfaces that concrete implementations
//! must satisfy, enabling pluggable backends and testability.

use async_trait::async_trait;
use chrono::Duration;
use uuid::Uuid;

use crate::context::RequestContext;
use crate::error::Result;
use crate::models::*;

// =============================================================================
// NOTE REPOSITORY TRAITS
// =============================================================================

/// Repository for per-user note operations.
///
/// Every method is scoped to `ctx`. Single-note operations on a note the
/// caller does not own fail with `Error::NotFoundOrForbidden`, exactly as if
/// the note did not exist.
#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// Create a note with its normalized tag set.
    async fn create(&self, ctx: &RequestContext, draft: NoteDraft) -> Result<Note>;

    /// Replace title, text, and the full tag set of an owned note.
    async fn update(&self, ctx: &RequestContext, id: Uuid, draft: NoteDraft) -> Result<Note>;

    /// Permanently delete an owned note and its tag associations.
    async fn delete(&self, ctx: &RequestContext, id: Uuid) -> Result<()>;

    /// Set the archived flag. Idempotent.
    async fn set_archived(&self, ctx: &RequestContext, id: Uuid, archived: bool) -> Result<()>;

    /// Fetch an owned note by id.
    async fn fetch(&self, ctx: &RequestContext, id: Uuid) -> Result<Note>;

    /// List owned notes with the given archived flag, most recently updated
    /// first, optionally restricted to one tag (case-insensitive).
    async fn list(
        &self,
        ctx: &RequestContext,
        archived: bool,
        tag: Option<&str>,
    ) -> Result<Vec<Note>>;

    /// Case-insensitive substring search over title, text, and tag names.
    ///
    /// A blank query behaves like `list(ctx, archived, None)`.
    async fn search(&self, ctx: &RequestContext, query: &str, archived: bool)
        -> Result<Vec<Note>>;

    /// Archive an owned note.
    async fn archive(&self, ctx: &RequestContext, id: Uuid) -> Result<()> {
        self.set_archived(ctx, id, true).await
    }

    /// Unarchive an owned note.
    async fn unarchive(&self, ctx: &RequestContext, id: Uuid) -> Result<()> {
        self.set_archived(ctx, id, false).await
    }
}

// =============================================================================
// TAG REPOSITORY TRAITS
// =============================================================================

/// Repository for per-user tag queries.
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// All of the caller's tags with non-archived note counts, by name.
    async fn list_with_counts(&self, ctx: &RequestContext) -> Result<Vec<TagWithCount>>;
}

// =============================================================================
// USER / SESSION REPOSITORY TRAITS
// =============================================================================

/// Repository for application users.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert the user or refresh their email.
    async fn upsert(&self, identity: &IdentityUser) -> Result<User>;

    /// Look up a user by id.
    async fn get(&self, id: &str) -> Result<Option<User>>;
}

/// Repository for login sessions and single-use login state values.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Create a session and return the raw token handed to the client.
    async fn create(&self, user_id: &str, ttl: Duration) -> Result<String>;

    /// Resolve a raw token to its user id if the session is still valid.
    async fn resolve(&self, token: &str) -> Result<Option<String>>;

    /// Revoke a session. Unknown tokens are ignored.
    async fn revoke(&self, token: &str) -> Result<()>;

    /// Remember an outgoing login's CSRF state and PKCE verifier.
    async fn create_login_state(&self, state: &str, pkce_verifier: &str, ttl: Duration)
        -> Result<()>;

    /// Consume a login state value, returning its PKCE verifier.
    ///
    /// Returns `None` if the state is unknown, already used, or expired.
    async fn consume_login_state(&self, state: &str) -> Result<Option<String>>;
}

// =============================================================================
// IDENTITY PROVIDER TRAITS
// =============================================================================

/// External identity provider (OAuth 2.0 authorization server).
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Prepare a sign-in redirect with a fresh CSRF state and PKCE pair.
    fn authorize(&self) -> LoginRedirect;

    /// Exchange an authorization code, proven with the PKCE verifier from
    /// [`IdentityProvider::authorize`], for the signed-in user's profile.
    async fn exchange_code(&self, code: &str, pkce_verifier: &str) -> Result<IdentityUser>;
}
