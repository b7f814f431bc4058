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


//! Client core for a document-to-audiobook reader.
//!
//! A source document (epub, fb2, or plain text) is uploaded to a remote
//! conversion service, which answers with a zip of synthesized audio
//! chapters plus display metadata. This crate covers everything after
//! that answer arrives and everything a player shell needs:
//!
//! - [`api`] — the conversion service client and wire payloads
//! - [`storage`] — the persisted library of converted books
//! - [`archive`] — chapter enumeration and scratch extraction
//! - [`playback`] — the per-book playback session state machine
//!
//! The audio decoder itself stays behind [`playback::AudioSink`]; a
//! platform shell supplies the real implementation.

pub mod api;
pub mod archive;
pub mod config;
pub mod error;
pub mod playback;
pub mod storage;

pub use api::{ArchivePayload, ClientConfig, ConversionClient};
pub use archive::{ArchiveCatalog, Chapter, ChapterCache};
pub use config::Config;
pub use error::{Result, VoiceboundError};
pub use playback::{AudioSink, NullSink, PlaybackEvent, PlaybackSession, PlaybackState, SessionStatus};
pub use storage::{Book, Database, Library, MetadataStore};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
