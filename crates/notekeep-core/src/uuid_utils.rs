//! UUID v7 identifiers.
//!
//! Note and tag ids are UUIDv7: the first 48 bits hold a Unix millisecond
//! timestamp, so ids created later sort after earlier ones. Listings use the
//! id as a tie-breaker after `updated_at`.

use uuid::Uuid;

/// Generate a new UUIDv7 identifier.
#[inline]
pub fn new_v7() -> Uuid {
    Uuid::now_v7()
}
