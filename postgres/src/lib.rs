//! `PostgreSQL` storage for the volunteer platform.
//!
//! [`PostgresStore`] implements every storage trait of `volunteer-core` on a
//! single connection pool. Queries are checked at runtime (`query_as`,
//! `QueryBuilder`) so the crate builds without a live database.
//!
//! # Registration Races
//!
//! `insert_registration` runs in a transaction that first locks the event
//! row (`SELECT ... FOR UPDATE`). Concurrent registrations for the same
//! event therefore serialise on that lock and each sees the committed count
//! of the previous one. The `(event_id, user_id)` unique constraint backs
//! the duplicate check independently of the lock.
//!
//! # Example
//!
//! ```no_run
//! use volunteer_postgres::PostgresStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = PostgresStore::connect("postgres://localhost/volunteer").await?;
//! store.migrate().await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod catalog;
mod directory;
mod organizations;
mod rows;

use async_trait::async_trait;
use sqlx::PgPool;
use volunteer_core::store::{StoreError, StoreResult, VolunteerStore};

/// `PostgreSQL`-backed implementation of every storage trait.
#[derive(Clone, Debug)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect with default pool settings.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the connection fails.
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(database("connect"))?;
        Ok(Self::from_pool(pool))
    }

    /// Wrap an existing pool.
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply the embedded migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if a migration fails.
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("Migration failed: {e}")))?;
        tracing::info!("Database migrations applied");
        Ok(())
    }
}

#[async_trait]
impl VolunteerStore for PostgresStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(database("ping"))?;
        Ok(())
    }
}

/// Wrap a driver error as [`StoreError::Database`], prefixed with what was
/// being attempted.
pub(crate) fn database(context: &'static str) -> impl FnOnce(sqlx::Error) -> StoreError {
    move |e| StoreError::Database(format!("Failed to {context}: {e}"))
}

pub(crate) fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.is_unique_violation())
}

pub(crate) fn is_foreign_key_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

/// Saturating conversion of a `COUNT(*)` result.
pub(crate) fn to_count(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}
