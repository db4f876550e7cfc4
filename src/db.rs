//! Database management for the journal server.
//!
//! Provides a shared SQLite connection pool that is used by the content
//! stores (posts, about, comments, users).

use crate::config::DatabaseConfig;
use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use tracing::info;

pub use sqlx::SqlitePool as DbPool;

/// Shared database for the journal server.
///
/// This struct owns the database connection pool and handles migrations.
/// It should be created once at startup and shared across components.
pub struct Database {
    pool: DbPool,
}

impl Database {
    /// Create a new database connection based on configuration.
    ///
    /// This will:
    /// - Connect to the database (creating the SQLite file if needed)
    /// - Run all pending migrations
    /// - Return a connection pool ready for use
    pub async fn new(config: &DatabaseConfig, data_dir: &Path) -> Result<Self> {
        use std::fs;

        let db_path = config
            .path
            .clone()
            .unwrap_or_else(|| data_dir.join("journal.db"));

        // Create parent directory if needed
        if let Some(parent) = db_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .context("Failed to connect to SQLite database")?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run migrations")?;

        info!(path = %db_path.display(), "Database connected");

        Ok(Self { pool })
    }

    /// Get a clone of the connection pool.
    ///
    /// Use this to pass the pool to components that need database access.
    /// The pool is cheap to clone (internally Arc-based).
    pub fn pool(&self) -> DbPool {
        self.pool.clone()
    }

    /// Connectivity probe used by the health endpoint: runs a trivial
    /// query and reports which of our tables exist.
    pub async fn health_check(&self) -> Result<Vec<String>> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("Database probe query failed")?;

        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
                .fetch_all(&self.pool)
                .await
                .context("Failed to list tables")?;

        Ok(rows.into_iter().map(|(name,)| name).collect())
    }
}
