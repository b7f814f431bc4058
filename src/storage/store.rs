// Voicebound - Document-to-Audiobook Client Core
// Copyright (C) 2025 Voicebound contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.


//! Durable key-value store for book metadata
//!
//! An explicitly owned store object with a defined lifecycle, injected
//! into [`crate::storage::Library`]. Keys follow the
//! `{field}_{book_id}` convention (`title_`, `author_`, `cover_`,
//! `added_`). Each operation is atomic at single-key granularity; there
//! is no cross-key transaction and the library does not need one.

use crate::error::Result;
use crate::storage::database::Database;
use sqlx::{Row, SqlitePool};

/// Key-value metadata store backed by the `book_meta` table
#[derive(Debug, Clone)]
pub struct MetadataStore {
    pool: SqlitePool,
}

impl MetadataStore {
    pub fn new(database: &Database) -> Self {
        Self {
            pool: database.pool().clone(),
        }
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let value: Option<String> =
            sqlx::query_scalar("SELECT value FROM book_meta WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        Ok(value)
    }

    /// Insert or overwrite one key
    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO book_meta (key, value) VALUES (?, ?) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Remove one key; removing an absent key is not an error
    pub async fn remove(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM book_meta WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// All keys starting with `prefix`, in insertion (rowid) order.
    ///
    /// Matched with `substr`, not `LIKE`: the `_` in prefixes like
    /// `added_` must be a literal underscore, not a wildcard.
    pub async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let rows = sqlx::query(
            "SELECT key FROM book_meta WHERE substr(key, 1, ?) = ? ORDER BY rowid",
        )
        .bind(prefix.chars().count() as i64)
        .bind(prefix)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|row| row.get::<String, _>(0)).collect())
    }
}
