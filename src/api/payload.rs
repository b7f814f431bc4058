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


//! Conversion service wire types
//!
//! The upload endpoint answers with a JSON envelope carrying the
//! synthesized archive and its display metadata, both base64-encoded.
//! [`ArchivePayload::decode`] turns that envelope into validated bytes;
//! everything past this point in the crate deals in bytes and paths,
//! never in base64.

use crate::error::{Result, VoiceboundError};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;

/// Response envelope from the conversion endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ConversionResponse {
    /// Base64-encoded zip of synthesized audio chapters
    pub zip_file: String,
    pub metadata: ConversionMetadata,
}

/// Display metadata extracted from the source document server-side
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConversionMetadata {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    /// Base64-encoded cover image, when the document carried one
    #[serde(default)]
    pub cover: Option<String>,
}

/// Decoded conversion result, ready to persist
#[derive(Debug, Clone)]
pub struct ArchivePayload {
    pub archive: Vec<u8>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub cover: Option<Vec<u8>>,
}

impl ArchivePayload {
    /// Decode a wire envelope into raw bytes.
    ///
    /// An undecodable or empty archive is a `Decode` error; an absent,
    /// empty, or undecodable cover degrades to `None` since a book is
    /// usable without one.
    pub fn decode(response: ConversionResponse) -> Result<Self> {
        let archive = BASE64
            .decode(response.zip_file.as_bytes())
            .map_err(|e| VoiceboundError::decode(format!("invalid archive base64: {e}")))?;
        if archive.is_empty() {
            return Err(VoiceboundError::decode("conversion returned an empty archive"));
        }

        let cover = match response.metadata.cover.as_deref() {
            None | Some("") => None,
            Some(encoded) => match BASE64.decode(encoded.as_bytes()) {
                Ok(bytes) if bytes.is_empty() => None,
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    log::warn!("discarding undecodable cover image: {e}");
                    None
                }
            },
        };

        Ok(Self {
            archive,
            title: normalize(response.metadata.title),
            author: normalize(response.metadata.author),
            cover,
        })
    }
}

fn normalize(field: Option<String>) -> Option<String> {
    field
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
