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


//! Error types for Voicebound
//!
//! One crate-wide error enum, defined with thiserror and categorized by
//! domain: conversion transport, payload decoding, archive access, library
//! persistence, and playback. Every fallible operation in the crate returns
//! the [`Result`] alias from this module.

use std::path::Path;
use thiserror::Error;

/// Result type alias using our VoiceboundError type
pub type Result<T> = std::result::Result<T, VoiceboundError>;

/// Main error type for the Voicebound core
#[derive(Error, Debug)]
pub enum VoiceboundError {
    // ===== Conversion service errors =====

    /// The conversion service was unreachable or answered with a
    /// non-success status. Never retried by the core; the caller owns
    /// retry policy.
    #[error("conversion service error{}: {message}", status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Network {
        /// HTTP status code, if a response was received at all
        status: Option<u16>,
        message: String,
    },

    /// The service response could not be decoded into a usable payload
    /// (malformed base64, missing fields, empty archive). The job is
    /// discarded; nothing reaches the library.
    #[error("conversion payload decode failed: {0}")]
    Decode(String),

    // ===== Archive errors =====

    /// The archive file is missing or cannot be parsed as a zip container
    #[error("archive unreadable: {path}: {message}")]
    ArchiveCorrupt { path: String, message: String },

    /// A chapter index beyond the catalog size was requested
    #[error("chapter index {index} out of range (archive has {count} chapters)")]
    ChapterIndexOutOfRange { index: usize, count: usize },

    /// A named entry vanished between catalog enumeration and extraction
    /// (archive modified externally)
    #[error("entry {entry:?} missing from archive {path}")]
    EntryMissing { path: String, entry: String },

    // ===== Playback errors =====

    /// The extracted chapter bytes were rejected by the audio decoder
    #[error("media decode failed for {path}: {message}")]
    MediaDecode { path: String, message: String },

    // ===== Library errors =====

    /// No book with the given id exists in the library
    #[error("book not found: {0}")]
    NotFound(String),

    /// Caller-supplied value was rejected (unsupported document kind,
    /// empty title, and so on)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    // ===== External library errors =====

    /// Filesystem failure (scratch write, archive/cover file operations)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Database driver error from sqlx
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error that should not normally occur (e.g. a worker task
    /// panicked or was torn down mid-flight)
    #[error("internal error: {0}")]
    Internal(String),
}

impl VoiceboundError {
    /// Create a Network error from a transport-level failure (no response)
    pub fn network<S: Into<String>>(message: S) -> Self {
        VoiceboundError::Network {
            status: None,
            message: message.into(),
        }
    }

    /// Create a Network error carrying the server's status and body
    pub fn http_status<S: Into<String>>(status: u16, message: S) -> Self {
        VoiceboundError::Network {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Create a Decode error
    pub fn decode<S: Into<String>>(message: S) -> Self {
        VoiceboundError::Decode(message.into())
    }

    /// Create an ArchiveCorrupt error for a path
    pub fn archive_corrupt<E: std::fmt::Display>(path: &Path, err: E) -> Self {
        VoiceboundError::ArchiveCorrupt {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }

    /// Create an EntryMissing error
    pub fn entry_missing(path: &Path, entry: &str) -> Self {
        VoiceboundError::EntryMissing {
            path: path.display().to_string(),
            entry: entry.to_string(),
        }
    }

    /// Create a MediaDecode error for an extracted chapter file
    pub fn media_decode<E: std::fmt::Display>(path: &Path, err: E) -> Self {
        VoiceboundError::MediaDecode {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }

    /// Stable kind tag, surfaced alongside the human message so the UI
    /// layer can branch without string matching
    pub fn kind(&self) -> &'static str {
        match self {
            VoiceboundError::Network { .. } => "network",
            VoiceboundError::Decode(_) => "decode",
            VoiceboundError::ArchiveCorrupt { .. } => "archive_corrupt",
            VoiceboundError::ChapterIndexOutOfRange { .. } => "chapter_index_out_of_range",
            VoiceboundError::EntryMissing { .. } => "entry_missing",
            VoiceboundError::MediaDecode { .. } => "media_decode",
            VoiceboundError::NotFound(_) => "not_found",
            VoiceboundError::InvalidInput(_) => "invalid_input",
            VoiceboundError::Io(_) => "io",
            VoiceboundError::Database(_) => "database",
            VoiceboundError::Internal(_) => "internal",
        }
    }

    /// Check if error is plausibly transient (worth retrying by the caller)
    ///
    /// Only transport failures and 5xx server answers qualify; decode and
    /// archive errors will not improve on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            VoiceboundError::Network { status: None, .. }
                | VoiceboundError::Network {
                    status: Some(500..=599),
                    ..
                }
        )
    }

    /// Get user-friendly error message suitable for display
    pub fn user_message(&self) -> String {
        match self {
            VoiceboundError::Network {
                status: None,
                message,
            } => {
                format!("Could not reach the conversion service: {message}")
            }
            VoiceboundError::Network {
                status: Some(code),
                message,
            } => {
                if message.trim().is_empty() {
                    format!("The conversion service rejected the request (HTTP {code}).")
                } else {
                    format!("The conversion service rejected the request (HTTP {code}): {message}")
                }
            }
            VoiceboundError::Decode(_) => {
                "The conversion service sent an unreadable response. Nothing was saved.".to_string()
            }
            VoiceboundError::ArchiveCorrupt { .. } => {
                "This audiobook's archive is damaged or missing.".to_string()
            }
            VoiceboundError::MediaDecode { .. } => "This chapter could not be played.".to_string(),
            VoiceboundError::NotFound(id) => format!("Book '{id}' is not in the library."),
            _ => self.to_string(),
        }
    }
}

impl From<reqwest::Error> for VoiceboundError {
    fn from(err: reqwest::Error) -> Self {
        // A status-carrying failure keeps its code; everything else is a
        // transport failure with no response.
        let status = err.status().map(|s| s.as_u16());
        VoiceboundError::Network {
            status,
            message: err.to_string(),
        }
    }
}
