//! Centralized default constants for notekeep.
//!
//! Crates reference these instead of defining their own magic numbers.

// =============================================================================
// SESSIONS
// =============================================================================

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE_NAME: &str = "notekeep_session";

/// Session lifetime in hours (30 days).
pub const SESSION_TTL_HOURS: i64 = 720;

/// Lifetime of a login CSRF state value in minutes.
pub const LOGIN_STATE_TTL_MINUTES: i64 = 10;

/// Length of generated session tokens.
pub const SESSION_TOKEN_LEN: usize = 48;

// =============================================================================
// SERVER
// =============================================================================

/// Default bind host.
pub const HOST: &str = "0.0.0.0";

/// Default bind port.
pub const PORT: u16 = 3000;

/// Broadcast buffer for change events.
pub const EVENT_BUS_CAPACITY: usize = 256;

/// SSE keep-alive interval in seconds.
pub const SSE_KEEPALIVE_SECS: u64 = 15;

// =============================================================================
// DATABASE
// =============================================================================

/// Maximum connections in the pool.
pub const DB_MAX_CONNECTIONS: u32 = 10;

/// Connections kept open while idle.
pub const DB_MIN_CONNECTIONS: u32 = 1;

/// Seconds to wait for a free connection.
pub const DB_ACQUIRE_TIMEOUT_SECS: u64 = 30;

/// Seconds before an idle connection is closed.
pub const DB_IDLE_TIMEOUT_SECS: u64 = 600;

// =============================================================================
// IDENTITY PROVIDER
// =============================================================================

/// Scopes requested from the identity provider.
pub const OAUTH_SCOPES: &str = "openid email";

/// Timeout for token and userinfo requests, in seconds.
pub const OAUTH_HTTP_TIMEOUT_SECS: u64 = 10;
