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


//! Application configuration and on-disk layout
//!
//! All persistent state lives under one data directory:
//! - `audiobooks/` - archive files, one per book, named `{id}.zip`
//! - `covers/` - cover images, one per book, named `{id}.jpg`
//! - `temp_audio/` - scratch chapter extractions, purged per session and
//!   swept best-effort at startup
//! - `library.db` - book metadata key-value store

use crate::error::Result;
use std::path::{Path, PathBuf};
use url::Url;

/// Static configuration for the core: where the conversion service lives
/// and where the library keeps its files.
#[derive(Debug, Clone)]
pub struct Config {
    server_url: Url,
    data_dir: PathBuf,
}

impl Config {
    pub fn new<P: Into<PathBuf>>(server_url: Url, data_dir: P) -> Self {
        Self {
            server_url,
            data_dir: data_dir.into(),
        }
    }

    /// Base URL of the conversion service
    pub fn server_url(&self) -> &Url {
        &self.server_url
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Directory holding one archive file per book
    pub fn archive_dir(&self) -> PathBuf {
        self.data_dir.join("audiobooks")
    }

    /// Directory holding one cover image per book
    pub fn cover_dir(&self) -> PathBuf {
        self.data_dir.join("covers")
    }

    /// Scratch directory for per-chapter extractions
    pub fn scratch_dir(&self) -> PathBuf {
        self.data_dir.join("temp_audio")
    }

    /// Path of the metadata key-value store
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("library.db")
    }

    /// Create all storage directories if they do not exist yet
    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(self.archive_dir())?;
        std::fs::create_dir_all(self.cover_dir())?;
        std::fs::create_dir_all(self.scratch_dir())?;
        Ok(())
    }
}
