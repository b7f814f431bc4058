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


//! Persistent library storage
//!
//! Book metadata lives in a SQLite-backed key-value namespace
//! (`title_{id}`, `author_{id}`, `cover_{id}`, `added_{id}`); archive and
//! cover files live in the two fixed storage directories from
//! [`crate::config::Config`]. The store object is created explicitly and
//! injected into [`Library`], never reached as ambient state.

pub mod database;
pub mod library;
pub mod store;

// Re-export commonly used types
pub use database::Database;
pub use library::{Book, Library};
pub use store::MetadataStore;
