//! Storage for the "about" page body.

use crate::db::DbPool;
use crate::posts::parse_timestamp;
use crate::sql;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distr::Alphanumeric;
use serde::Serialize;
use sqlx::Row;

/// The about page content. The newest row is the live one.
#[derive(Debug, Clone, Serialize)]
pub struct About {
    pub id: String,
    pub content: String,
    pub updated_at: DateTime<Utc>,
}

/// Database-backed storage for the about page.
pub struct AboutStore {
    pool: DbPool,
}

impl AboutStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get the current about content, if any has been written.
    pub async fn get(&self) -> Result<Option<About>> {
        let row = sqlx::query(sql::SELECT_LATEST_ABOUT)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to query about content")?;

        row.map(|row| {
            Ok(About {
                id: row.get("id"),
                content: row.get("content"),
                updated_at: parse_timestamp(row.get("updated_at"))?,
            })
        })
        .transpose()
    }

    /// Replace the about content, creating the row on first write.
    pub async fn upsert(&self, content: &str) -> Result<About> {
        let now = Utc::now();

        if let Some(existing) = self.get().await? {
            sqlx::query(sql::UPDATE_ABOUT)
                .bind(content)
                .bind(now.to_rfc3339())
                .bind(&existing.id)
                .execute(&self.pool)
                .await
                .context("Failed to update about content")?;

            return Ok(About {
                id: existing.id,
                content: content.to_string(),
                updated_at: now,
            });
        }

        let id: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(24)
            .map(char::from)
            .collect::<String>()
            .to_lowercase();

        sqlx::query(sql::INSERT_ABOUT)
            .bind(&id)
            .bind(content)
            .bind(now.to_rfc3339())
            .execute(&self.pool)
            .await
            .context("Failed to create about content")?;

        Ok(About {
            id,
            content: content.to_string(),
            updated_at: now,
        })
    }
}
