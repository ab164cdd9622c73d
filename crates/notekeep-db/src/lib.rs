//! # notekeep-db
//!
//! PostgreSQL database layer for notekeep.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for notes, tags, users, and sessions
//! - An in-memory store implementing the same traits, for tests
//!
//! ## Example
//!
//! ```rust,ignore
//! use notekeep_db::{Database, NoteDraft, NoteRepository, PoolConfig, RequestContext};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/notekeep", PoolConfig::default()).await?;
//!     let ctx = RequestContext::new("github|1234");
//!
//!     let note = db.notes.create(&ctx, NoteDraft::new("Hello", "world", "greeting")).await?;
//!     println!("Created note: {}", note.id);
//!     Ok(())
//! }
//! ```
pub mod memory;
pub mod notes;
pub mod pool;
pub mod sessions;
pub mod tags;
pub mod users;

// Test fixtures for integration tests
// Note: Always compiled so integration tests (in tests/) can use DEFAULT_TEST_DATABASE_URL
pub mod test_fixtures;

// Re-export core types
pub use notekeep_core::*;

/// Escape LIKE/ILIKE wildcard characters (`%`, `_`, `\`) in user input.
pub fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

// Re-export repository implementations
pub use memory::MemoryStore;
pub use notes::PgNoteRepository;
pub use pool::{create_pool, log_pool_metrics, PoolConfig};
pub use sessions::PgSessionRepository;
pub use tags::PgTagRepository;
pub use users::PgUserRepository;

/// Combined database context with all repositories.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Note repository.
    pub notes: PgNoteRepository,
    /// Tag listing with note counts.
    pub tags: PgTagRepository,
    /// Users keyed by identity-provider subject.
    pub users: PgUserRepository,
    /// Login sessions and login state values.
    pub sessions: PgSessionRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            notes: PgNoteRepository::new(pool.clone()),
            tags: PgTagRepository::new(pool.clone()),
            users: PgUserRepository::new(pool.clone()),
            sessions: PgSessionRepository::new(pool.clone()),
            pool,
        }
    }

    /// Connect to `url` with the given pool configuration.
    pub async fn connect(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}
