//! Per-request caller context.

use crate::error::{Error, Result};

/// The authenticated caller of a repository operation.
///
/// Built once per request from the resolved session and passed explicitly
/// into every repository call; repositories scope all reads and writes to
/// [`RequestContext::user_id`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    user_id: String,
}

impl RequestContext {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }

    /// Build a context from an optional resolved user id, failing closed.
    pub fn from_resolved(user_id: Option<String>) -> Result<Self> {
        match user_id {
            Some(id) if !id.is_empty() => Ok(Self::new(id)),
            _ => Err(Error::Unauthenticated),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}
