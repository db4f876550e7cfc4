//! Reader account listing for the admin area.

use crate::db::DbPool;
use crate::posts::parse_timestamp;
use crate::sql;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::Row;

/// A reader account with activity counts for the admin list.
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub id: String,
    pub username: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: String,
    pub joined_at: DateTime<Utc>,
    pub comment_count: i64,
}

/// Database-backed user listing.
pub struct UserStore {
    pool: DbPool,
}

impl UserStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// List all accounts, newest first.
    pub async fn list(&self) -> Result<Vec<UserView>> {
        let rows = sqlx::query(sql::SELECT_ALL_USERS)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list users")?;

        rows.into_iter()
            .map(|row| {
                Ok(UserView {
                    id: row.get("id"),
                    username: row.get("username"),
                    email: row.get("email"),
                    name: row.get("name"),
                    role: row.get("role"),
                    joined_at: parse_timestamp(row.get("joined_at"))?,
                    comment_count: row.get("comment_count"),
                })
            })
            .collect()
    }

    /// Total account count, for the dashboard.
    pub async fn count(&self) -> Result<i64> {
        let row = sqlx::query(sql::COUNT_USERS)
            .fetch_one(&self.pool)
            .await
            .context("Failed to count users")?;

        Ok(row.get(0))
    }
}
