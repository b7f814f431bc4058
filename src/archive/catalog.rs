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


//! Archive catalog: deterministic chapter enumeration
//!
//! Chapters are derived from the archive's own central-directory order,
//! restricted to recognized audio entries. That order is a determinism
//! contract: re-opening the same archive always yields the same chapter
//! list and indices. Nothing here is persisted; the catalog is recomputed
//! on every open.

use crate::error::{Result, VoiceboundError};
use log::debug;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use zip::ZipArchive;

/// Entry name suffixes that qualify an archive entry as a chapter.
/// The conversion service emits mp3; the rest cover archives produced by
/// other tooling.
const AUDIO_EXTENSIONS: &[&str] = &[".mp3", ".m4a", ".m4b", ".ogg", ".opus", ".flac", ".wav"];

/// One playable audio entry inside an archive.
///
/// `index` is 0-based and contiguous over audio entries only; skipped
/// entries (covers, metadata files, directories) do not consume an index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    pub index: usize,
    pub entry_name: String,
    pub title: String,
}

/// An opened chapter archive with its enumerated chapter list
#[derive(Debug, Clone)]
pub struct ArchiveCatalog {
    path: PathBuf,
    chapters: Vec<Chapter>,
}

impl ArchiveCatalog {
    /// Open an archive and enumerate its chapters.
    ///
    /// Fails with `ArchiveCorrupt` when the path does not exist or the
    /// container cannot be parsed as a zip archive.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| VoiceboundError::archive_corrupt(path, e))?;
        let mut archive = ZipArchive::new(BufReader::new(file))
            .map_err(|e| VoiceboundError::archive_corrupt(path, e))?;

        let mut chapters = Vec::new();
        for i in 0..archive.len() {
            let entry = archive
                .by_index(i)
                .map_err(|e| VoiceboundError::archive_corrupt(path, e))?;
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().to_string();
            let Some(ext_len) = audio_extension_len(&name) else {
                debug!("skipping non-audio entry {name:?} in {}", path.display());
                continue;
            };
            let title = derive_title(&name, ext_len, chapters.len() + 1);
            chapters.push(Chapter {
                index: chapters.len(),
                entry_name: name,
                title,
            });
        }

        debug!(
            "opened archive {} with {} chapters",
            path.display(),
            chapters.len()
        );
        Ok(Self {
            path: path.to_path_buf(),
            chapters,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Chapters in archive encounter order, indices contiguous from 0
    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    pub fn len(&self) -> usize {
        self.chapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }

    /// Archive entry name for a chapter index
    pub fn entry(&self, index: usize) -> Result<&str> {
        self.chapters
            .get(index)
            .map(|c| c.entry_name.as_str())
            .ok_or(VoiceboundError::ChapterIndexOutOfRange {
                index,
                count: self.chapters.len(),
            })
    }
}

/// Length of the recognized audio extension at the end of `name`
/// (including the dot), or `None` if the entry is not audio.
///
/// Matching on the raw name rather than `Path::extension` keeps entries
/// like `".mp3"` (empty stem) qualifying.
fn audio_extension_len(name: &str) -> Option<usize> {
    let lower = name.to_ascii_lowercase();
    AUDIO_EXTENSIONS
        .iter()
        .find(|ext| lower.ends_with(*ext))
        .map(|ext| ext.len())
}

/// Human-readable title from an entry name: strip the extension, turn
/// path and underscore separators into spaces, trim. An empty result
/// falls back to `"Chapter {ordinal}"` (1-based among chapters).
fn derive_title(entry_name: &str, ext_len: usize, ordinal: usize) -> String {
    let stem = &entry_name[..entry_name.len() - ext_len];
    let title = stem
        .replace(['/', '\\', '_'], " ")
        .trim()
        .to_string();
    if title.is_empty() {
        format!("Chapter {ordinal}")
    } else {
        title
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::FileOptions;

    fn write_archive(dir: &TempDir, entries: &[(&str, &[u8])]) -> PathBuf {
        let path = dir.path().join("book.zip");
        let file = File::create(&path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options =
            FileOptions::default().compression_method(zip::CompressionMethod::Stored);
        for (name, data) in entries {
            if name.ends_with('/') {
                writer.add_directory(name.trim_end_matches('/'), options).unwrap();
            } else {
                writer.start_file(*name, options).unwrap();
                writer.write_all(data).unwrap();
            }
        }
        writer.finish().unwrap();
        path
    }

    #[test]
    fn test_chapters_follow_encounter_order_and_skip_non_audio() {
        let dir = TempDir::new().unwrap();
        let path = write_archive(
            &dir,
            &[
                ("01_intro.mp3", b"a".as_slice()),
                ("cover.jpg", b"b".as_slice()),
                ("02_chapter.mp3", b"c".as_slice()),
            ],
        );

        let catalog = ArchiveCatalog::open(&path).unwrap();
        let titles: Vec<&str> = catalog.chapters().iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["01 intro", "02 chapter"]);
        assert_eq!(catalog.chapters()[0].index, 0);
        assert_eq!(catalog.chapters()[1].index, 1);
        assert_eq!(catalog.entry(1).unwrap(), "02_chapter.mp3");
    }

    #[test]
    fn test_reopen_yields_identical_sequence() {
        let dir = TempDir::new().unwrap();
        let path = write_archive(
            &dir,
            &[
                ("b.mp3", b"x".as_slice()),
                ("a.mp3", b"y".as_slice()),
                ("c.mp3", b"z".as_slice()),
            ],
        );

        let first = ArchiveCatalog::open(&path).unwrap();
        let second = ArchiveCatalog::open(&path).unwrap();
        assert_eq!(first.chapters(), second.chapters());
        // Encounter order, not sorted order
        assert_eq!(first.chapters()[0].entry_name, "b.mp3");
    }

    #[test]
    fn test_empty_stem_synthesizes_positional_title() {
        let dir = TempDir::new().unwrap();
        let path = write_archive(
            &dir,
            &[
                ("one.mp3", b"1".as_slice()),
                ("two.mp3", b"2".as_slice()),
                (".mp3", b"3".as_slice()),
            ],
        );

        let catalog = ArchiveCatalog::open(&path).unwrap();
        assert_eq!(catalog.chapters()[2].title, "Chapter 3");
    }

    #[test]
    fn test_directories_do_not_consume_indices() {
        let dir = TempDir::new().unwrap();
        let path = write_archive(
            &dir,
            &[
                ("audio/", b"".as_slice()),
                ("audio/part_one.mp3", b"1".as_slice()),
            ],
        );

        let catalog = ArchiveCatalog::open(&path).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.chapters()[0].title, "audio part one");
    }

    #[test]
    fn test_missing_file_is_archive_corrupt() {
        let err = ArchiveCatalog::open("/nonexistent/book.zip").unwrap_err();
        assert_eq!(err.kind(), "archive_corrupt");
    }

    #[test]
    fn test_garbage_file_is_archive_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.zip");
        std::fs::write(&path, b"not a zip at all").unwrap();

        let err = ArchiveCatalog::open(&path).unwrap_err();
        assert_eq!(err.kind(), "archive_corrupt");
    }

    #[test]
    fn test_entry_out_of_range() {
        let dir = TempDir::new().unwrap();
        let path = write_archive(&dir, &[("only.mp3", b"1".as_slice())]);

        let catalog = ArchiveCatalog::open(&path).unwrap();
        let err = catalog.entry(1).unwrap_err();
        assert_eq!(err.kind(), "chapter_index_out_of_range");
    }
}
