//! HTTP handlers for notekeep-api.

pub mod events;
pub mod notes;
pub mod tags;
