//! Core data models for notekeep.
//!
//! These types are shared across all notekeep crates and represent
//! the core domain entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::tags::normalize_tags;

// =============================================================================
// USER TYPES
// =============================================================================

/// Application user, keyed by the identity provider's subject id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, utoipa::ToSchema)]
pub struct User {
    pub id: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Profile returned by the identity provider after a code exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityUser {
    pub id: String,
    pub email: String,
}

/// A prepared sign-in redirect.
///
/// `state` and `pkce_verifier` stay server-side until the provider calls
/// back; only `url` (carrying `state` and the PKCE challenge) reaches the
/// browser.
#[derive(Debug, Clone)]
pub struct LoginRedirect {
    pub url: String,
    pub state: String,
    pub pkce_verifier: String,
}

// =============================================================================
// NOTE TYPES
// =============================================================================

/// A note with its tag names populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Note {
    pub id: Uuid,
    pub owner_id: String,
    pub title: String,
    pub text: String,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Lowercase tag names, sorted.
    pub tags: Vec<String>,
}

/// User-submitted note content, as entered in the note form.
///
/// `tags` is the raw comma-separated field; repositories normalize it.
/// Missing fields deserialize as empty so they fail [`NoteDraft::validate`]
/// like blank ones.
#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub struct NoteDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub tags: String,
}

impl NoteDraft {
    pub fn new(title: impl Into<String>, text: impl Into<String>, tags: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            tags: tags.into(),
        }
    }

    /// Reject drafts with a blank title or body.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::Validation("Title is required".to_string()));
        }
        if self.text.trim().is_empty() {
            return Err(Error::Validation("Note content is required".to_string()));
        }
        Ok(())
    }

    /// Normalized tag names for this draft.
    pub fn tag_names(&self) -> Vec<String> {
        normalize_tags(&self.tags)
    }
}

// =============================================================================
// TAG TYPES
// =============================================================================

/// A user's tag with the number of non-archived notes carrying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, utoipa::ToSchema)]
pub struct TagWithCount {
    pub id: Uuid,
    pub name: String,
    pub note_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_validate_ok() {
        let draft = NoteDraft::new("Groceries", "milk, eggs", "");
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn test_draft_validate_blank_title() {
        let draft = NoteDraft::new("   ", "body", "");
        assert!(matches!(draft.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_draft_validate_blank_text() {
        let draft = NoteDraft::new("Title", "\n\t ", "");
        assert!(matches!(draft.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_draft_tag_names() {
        let draft = NoteDraft::new("t", "b", "Work, work, Planning ");
        assert_eq!(draft.tag_names(), vec!["work", "planning"]);
    }

    #[test]
    fn test_draft_deserialize_without_tags() {
        let draft: NoteDraft = serde_json::from_str(r#"{"title":"a","text":"b"}"#).unwrap();
        assert_eq!(draft.tags, "");
    }

    #[test]
    fn test_draft_missing_title_fails_validation() {
        let draft: NoteDraft = serde_json::from_str(r#"{"text":"b"}"#).unwrap();
        assert_eq!(draft.title, "");
        assert!(matches!(
            draft.validate(),
            Err(Error::Validation(msg)) if msg == "Title is required"
        ));
    }
}
