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


//! Scratch extraction of single chapters
//!
//! The external decoder reads plain files, so one archive entry at a time
//! is copied to a scratch location. Extraction is idempotent: repeating it
//! for the same entry overwrites the previous scratch file and always
//! reflects the archive's current bytes. All calls here are synchronous;
//! the playback session offloads them via `spawn_blocking`.

use crate::error::{Result, VoiceboundError};
use log::{debug, warn};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use zip::result::ZipError;
use zip::ZipArchive;

/// Extracts chapters into a scratch directory and cleans them up again.
///
/// Cloneable so the session can hand a copy to a blocking worker; clones
/// share the same scratch directory and the same record of extractions.
#[derive(Debug, Clone)]
pub struct ChapterCache {
    scratch_dir: PathBuf,
    extracted: Arc<Mutex<HashSet<PathBuf>>>,
}

impl ChapterCache {
    /// Create a cache over the given scratch directory, creating it if
    /// needed.
    pub fn new<P: Into<PathBuf>>(scratch_dir: P) -> Result<Self> {
        let scratch_dir = scratch_dir.into();
        std::fs::create_dir_all(&scratch_dir)?;
        Ok(Self {
            scratch_dir,
            extracted: Arc::new(Mutex::new(HashSet::new())),
        })
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    /// Scratch path dedicated to one entry name.
    ///
    /// Derived from the sanitized entry name plus a short content-free
    /// digest of the original name, so `a/b.mp3` and `a_b.mp3` cannot
    /// collide after sanitization.
    pub fn scratch_path(&self, entry_name: &str) -> PathBuf {
        let sanitized = entry_name.replace(['/', '\\'], "_");
        let digest = Sha256::digest(entry_name.as_bytes());
        let tag = hex::encode(&digest[..4]);
        self.scratch_dir.join(format!("{tag}-{sanitized}"))
    }

    /// Copy one archive entry's bytes to its scratch file, overwriting any
    /// stale output for the same entry.
    ///
    /// Fails with `ArchiveCorrupt` when the archive cannot be reopened,
    /// `EntryMissing` when the named entry is absent (archive modified
    /// externally between enumeration and extraction), or `Io` when the
    /// scratch write fails.
    pub fn extract(&self, archive_path: &Path, entry_name: &str) -> Result<PathBuf> {
        let file =
            File::open(archive_path).map_err(|e| VoiceboundError::archive_corrupt(archive_path, e))?;
        let mut archive = ZipArchive::new(BufReader::new(file))
            .map_err(|e| VoiceboundError::archive_corrupt(archive_path, e))?;

        let mut entry = match archive.by_name(entry_name) {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => {
                return Err(VoiceboundError::entry_missing(archive_path, entry_name))
            }
            Err(e) => return Err(VoiceboundError::archive_corrupt(archive_path, e)),
        };

        let dest = self.scratch_path(entry_name);
        let mut out = File::create(&dest)?;
        std::io::copy(&mut entry, &mut out)?;
        out.sync_all()?;

        if let Ok(mut extracted) = self.extracted.lock() {
            extracted.insert(dest.clone());
        }
        debug!("extracted {entry_name:?} to {}", dest.display());
        Ok(dest)
    }

    /// Delete the scratch files this cache has extracted.
    ///
    /// Best-effort: individual delete failures are logged and skipped,
    /// never surfaced to the caller.
    pub fn purge(&self) {
        let paths: Vec<PathBuf> = match self.extracted.lock() {
            Ok(mut extracted) => extracted.drain().collect(),
            Err(_) => return,
        };
        for path in paths {
            match std::fs::remove_file(&path) {
                Ok(()) => debug!("deleted scratch file {}", path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("failed to delete scratch file {}: {e}", path.display()),
            }
        }
    }

    /// Sweep every file out of the scratch directory, including leftovers
    /// from sessions that never got to clean up (crash, kill). Meant to
    /// run once at startup, before any session is open.
    pub fn purge_stale(&self) {
        let entries = match std::fs::read_dir(&self.scratch_dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    "scratch purge skipped, cannot read {}: {e}",
                    self.scratch_dir.display()
                );
                return;
            }
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                continue;
            }
            if let Err(e) = std::fs::remove_file(&path) {
                warn!("failed to delete scratch file {}: {e}", path.display());
            } else {
                debug!("deleted scratch file {}", path.display());
            }
        }
    }
}
