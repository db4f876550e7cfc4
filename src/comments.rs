//! Comment moderation: listing recent comments and deleting them.
//!
//! Comments are written by reader accounts out of band; the admin area
//! only moderates them.

use crate::db::DbPool;
use crate::posts::parse_timestamp;
use crate::sql;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::Row;

/// A comment joined with its post title and author name for display.
#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    pub id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub post_id: String,
    pub post_title: String,
    /// None when the author account has been deleted.
    pub author_username: Option<String>,
}

/// Database-backed comment moderation.
pub struct CommentStore {
    pool: DbPool,
}

impl CommentStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// List the most recent comments, newest first.
    pub async fn list_recent(&self, limit: i64) -> Result<Vec<CommentView>> {
        let rows = sqlx::query(sql::SELECT_RECENT_COMMENTS)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list comments")?;

        rows.into_iter()
            .map(|row| {
                Ok(CommentView {
                    id: row.get("id"),
                    content: row.get("content"),
                    created_at: parse_timestamp(row.get("created_at"))?,
                    post_id: row.get("post_id"),
                    post_title: row.get("post_title"),
                    author_username: row.get("author_username"),
                })
            })
            .collect()
    }

    /// Delete a comment. Returns false when no such comment exists.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query(sql::DELETE_COMMENT)
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete comment")?;

        Ok(result.rows_affected() > 0)
    }

    /// Total comment count, for the dashboard.
    pub async fn count(&self) -> Result<i64> {
        let row = sqlx::query(sql::COUNT_COMMENTS)
            .fetch_one(&self.pool)
            .await
            .context("Failed to count comments")?;

        Ok(row.get(0))
    }
}
