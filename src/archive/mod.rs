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


//! Chapter archive access
//!
//! A downloaded book is a zip archive whose audio entries are its chapters.
//! [`catalog`] enumerates the entries in their stored order and derives
//! chapter titles; [`cache`] extracts one entry at a time to a scratch file
//! for the decoder to consume.

pub mod cache;
pub mod catalog;

// Re-export commonly used types
pub use cache::ChapterCache;
pub use catalog::{ArchiveCatalog, Chapter};
