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


//! The persisted book catalog
//!
//! A book is three things: an archive file named by its id, an optional
//! cover image named by its id, and a handful of metadata keys in the
//! store. The library owns all mutations across the three; nothing else
//! writes to the storage directories or the metadata namespace.
//!
//! `remove` is resilient to partial failure by design: metadata keys are
//! cleared first (the book vanishes from `list()`), then file deletion is
//! best-effort. Orphaned files are logged, never silently hidden, and a
//! later cleanup pass may collect them.

use crate::config::Config;
use crate::error::{Result, VoiceboundError};
use crate::storage::store::MetadataStore;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

const DEFAULT_AUTHOR: &str = "Unknown";

/// One catalog entry, as handed to the rendering layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Unique within the library; derived from the source document name
    pub id: String,
    pub archive_path: PathBuf,
    pub title: String,
    pub author: String,
    pub cover_path: Option<PathBuf>,
    pub added_at: DateTime<Utc>,
}

/// Persisted catalog of converted books
#[derive(Debug, Clone)]
pub struct Library {
    store: MetadataStore,
    archive_dir: PathBuf,
    cover_dir: PathBuf,
}

impl Library {
    /// Create a library over the given storage directories, creating them
    /// if needed.
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(
        store: MetadataStore,
        archive_dir: P,
        cover_dir: Q,
    ) -> Result<Self> {
        let archive_dir = archive_dir.into();
        let cover_dir = cover_dir.into();
        std::fs::create_dir_all(&archive_dir)?;
        std::fs::create_dir_all(&cover_dir)?;
        Ok(Self {
            store,
            archive_dir,
            cover_dir,
        })
    }

    pub fn from_config(store: MetadataStore, config: &Config) -> Result<Self> {
        Self::new(store, config.archive_dir(), config.cover_dir())
    }

    /// Canonical archive path for a book id
    pub fn archive_path(&self, id: &str) -> PathBuf {
        self.archive_dir.join(format!("{id}.zip"))
    }

    /// Canonical cover path for a book id
    pub fn cover_path(&self, id: &str) -> PathBuf {
        self.cover_dir.join(format!("{id}.jpg"))
    }

    /// Derive a fresh, unique book id from a source document stem.
    ///
    /// The sanitized stem is used as-is when free; on collision a random
    /// suffix is appended.
    pub async fn allocate_id(&self, source_stem: &str) -> Result<String> {
        let base = sanitize_id(source_stem);
        if self.id_is_free(&base).await? {
            return Ok(base);
        }
        loop {
            let suffix = Uuid::new_v4().simple().to_string();
            let candidate = format!("{base}_{}", &suffix[..8]);
            if self.id_is_free(&candidate).await? {
                return Ok(candidate);
            }
        }
    }

    async fn id_is_free(&self, id: &str) -> Result<bool> {
        Ok(self.store.get(&title_key(id)).await?.is_none() && !self.archive_path(id).exists())
    }

    /// Write validated archive bytes to the book's canonical location
    pub async fn write_archive(&self, id: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.archive_path(id);
        tokio::fs::write(&path, bytes).await?;
        Ok(path)
    }

    /// Write cover bytes to the book's canonical location
    pub async fn write_cover(&self, id: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.cover_path(id);
        tokio::fs::write(&path, bytes).await?;
        Ok(path)
    }

    /// Insert or replace a catalog entry.
    ///
    /// Replacing keeps the original `added_` timestamp so the book keeps
    /// its position in `list()`.
    pub async fn add_or_replace(&self, book: &Book) -> Result<()> {
        self.store.set(&title_key(&book.id), &book.title).await?;
        self.store.set(&author_key(&book.id), &book.author).await?;
        match &book.cover_path {
            Some(path) => {
                self.store
                    .set(&cover_key(&book.id), &path.display().to_string())
                    .await?
            }
            None => self.store.remove(&cover_key(&book.id)).await?,
        }
        if self.store.get(&added_key(&book.id)).await?.is_none() {
            self.store
                .set(&added_key(&book.id), &book.added_at.to_rfc3339())
                .await?;
        }
        debug!("library entry stored: {}", book.id);
        Ok(())
    }

    /// Look up one book by id
    pub async fn get(&self, id: &str) -> Result<Book> {
        let title = self
            .store
            .get(&title_key(id))
            .await?
            .ok_or_else(|| VoiceboundError::NotFound(id.to_string()))?;
        let author = self
            .store
            .get(&author_key(id))
            .await?
            .unwrap_or_else(|| DEFAULT_AUTHOR.to_string());
        let cover_path = self.store.get(&cover_key(id)).await?.map(PathBuf::from);
        let added_at = match self.store.get(&added_key(id)).await? {
            Some(raw) => DateTime::parse_from_rfc3339(&raw)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|e| {
                    warn!("unparsable added timestamp for {id}: {e}");
                    Utc::now()
                }),
            None => Utc::now(),
        };
        Ok(Book {
            id: id.to_string(),
            archive_path: self.archive_path(id),
            title,
            author,
            cover_path,
            added_at,
        })
    }

    /// Snapshot of all books in insertion order.
    ///
    /// Entries whose archive file has vanished from disk are skipped with
    /// a warning; they stay skippable until a cleanup pass or re-import.
    pub async fn list(&self) -> Result<Vec<Book>> {
        let keys = self.store.keys_with_prefix("added_").await?;
        let mut books = Vec::with_capacity(keys.len());
        for key in keys {
            let id = &key["added_".len()..];
            let book = match self.get(id).await {
                Ok(book) => book,
                Err(VoiceboundError::NotFound(_)) => continue,
                Err(e) => return Err(e),
            };
            if !book.archive_path.exists() {
                warn!("archive missing for {id}, skipping: {}", book.archive_path.display());
                continue;
            }
            books.push(book);
        }
        Ok(books)
    }

    /// Change a book's display title
    pub async fn rename_title(&self, id: &str, new_title: &str) -> Result<()> {
        let new_title = non_empty(new_title, "title")?;
        self.ensure_exists(id).await?;
        self.store.set(&title_key(id), new_title).await?;
        Ok(())
    }

    /// Change a book's author
    pub async fn rename_author(&self, id: &str, new_author: &str) -> Result<()> {
        let new_author = non_empty(new_author, "author")?;
        self.ensure_exists(id).await?;
        self.store.set(&author_key(id), new_author).await?;
        Ok(())
    }

    /// Copy a new cover image into place and record it
    pub async fn set_cover(&self, id: &str, source: &Path) -> Result<PathBuf> {
        self.ensure_exists(id).await?;
        let dest = self.cover_path(id);
        tokio::fs::copy(source, &dest).await?;
        self.store
            .set(&cover_key(id), &dest.display().to_string())
            .await?;
        Ok(dest)
    }

    /// Delete a book: metadata keys first, then files.
    ///
    /// Metadata removal is the authoritative part; file deletion failures
    /// are logged and skipped so the entry still disappears from `list()`.
    pub async fn remove(&self, id: &str) -> Result<()> {
        let book = self.get(id).await?;

        self.store.remove(&title_key(id)).await?;
        self.store.remove(&author_key(id)).await?;
        self.store.remove(&cover_key(id)).await?;
        self.store.remove(&added_key(id)).await?;

        remove_file_best_effort(&book.archive_path).await;
        if let Some(cover) = &book.cover_path {
            remove_file_best_effort(cover).await;
        }
        debug!("library entry removed: {id}");
        Ok(())
    }

    /// Best-effort removal of a book's files without touching metadata.
    ///
    /// Used to unwind a partially persisted intake; `id_is_free` checks
    /// the archive file, so leftovers would occupy the id forever.
    pub(crate) async fn discard_files(&self, id: &str) {
        remove_file_best_effort(&self.archive_path(id)).await;
        remove_file_best_effort(&self.cover_path(id)).await;
    }

    async fn ensure_exists(&self, id: &str) -> Result<()> {
        if self.store.get(&title_key(id)).await?.is_none() {
            return Err(VoiceboundError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

fn title_key(id: &str) -> String {
    format!("title_{id}")
}

fn author_key(id: &str) -> String {
    format!("author_{id}")
}

fn cover_key(id: &str) -> String {
    format!("cover_{id}")
}

fn added_key(id: &str) -> String {
    format!("added_{id}")
}

fn non_empty<'a>(value: &'a str, field: &str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(VoiceboundError::InvalidInput(format!(
            "{field} must not be empty"
        )));
    }
    Ok(trimmed)
}

/// Replace everything outside `[A-Za-z0-9._-]` so ids stay filesystem-safe
fn sanitize_id(stem: &str) -> String {
    let cleaned: String = stem
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "book".to_string()
    } else {
        cleaned
    }
}

async fn remove_file_best_effort(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!("deleted {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("failed to delete {}: {e}", path.display()),
    }
}
