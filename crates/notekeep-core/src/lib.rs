//! # notekeep-core
//!
//! Core types, traits, and abstractions for notekeep.
//!
//! This crate provides the domain models, the error taxonomy, the repository
//! and identity-provider traits, tag normalization, and the change event bus
//! that the database and API crates build on.

pub mod context;
pub mod defaults;
pub mod error;
pub mod events;
pub mod models;
pub mod tags;
pub mod traits;
pub mod uuid_utils;

// Re-export commonly used types at crate root
pub use context::RequestContext;
pub use error::{Error, Result};
pub use events::{EventBus, EventEnvelope, NoteChange, ServerEvent};
pub use models::*;
pub use tags::{normalize_tag_name, normalize_tags};
pub use traits::*;
pub use uuid_utils::new_v7;
