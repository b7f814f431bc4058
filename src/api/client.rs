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


//! HTTP client for the conversion service
//!
//! One endpoint matters: `POST /upload` with the source document as a
//! multipart part named `file`. The response envelope is decoded by
//! [`crate::api::payload`]; [`ConversionClient::submit`] drives the full
//! intake flow from source document to persisted library entry.

use crate::api::payload::{ArchivePayload, ConversionResponse};
use crate::error::{Result, VoiceboundError};
use crate::storage::{Book, Library};
use chrono::Utc;
use lazy_static::lazy_static;
use log::{debug, info};
use regex::Regex;
use reqwest::multipart;
use std::path::Path;
use std::time::Duration;
use url::Url;

lazy_static! {
    /// Document kinds the conversion service accepts
    static ref SOURCE_EXTENSION: Regex = Regex::new(r"(?i)\.(epub|fb2|txt)$")
        .expect("static regex");
}

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000/";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
// Synthesis of a full book takes minutes, not seconds
const DEFAULT_UPLOAD_TIMEOUT: Duration = Duration::from_secs(600);

/// Conversion service endpoint configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: Url,
    pub timeout: Duration,
    pub upload_timeout: Duration,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("static url"),
            timeout: DEFAULT_TIMEOUT,
            upload_timeout: DEFAULT_UPLOAD_TIMEOUT,
            user_agent: format!("voicebound-core/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_upload_timeout(mut self, timeout: Duration) -> Self {
        self.upload_timeout = timeout;
        self
    }

    pub fn with_user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Client for the document-to-audiobook conversion service
#[derive(Debug, Clone)]
pub struct ConversionClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl ConversionClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Upload one source document and decode the conversion result.
    ///
    /// Rejects unsupported document kinds before touching the network.
    pub async fn convert(&self, source: &Path) -> Result<ArchivePayload> {
        let file_name = source_file_name(source)?;
        debug!("uploading {file_name} for conversion");

        let bytes = tokio::fs::read(source).await?;
        let part = multipart::Part::bytes(bytes).file_name(file_name.clone());
        let form = multipart::Form::new().part("file", part);

        let url = self.config.base_url.join("upload").map_err(|e| {
            VoiceboundError::Internal(format!("invalid upload url: {e}"))
        })?;
        let response = self
            .http
            .post(url)
            .timeout(self.config.upload_timeout)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VoiceboundError::http_status(status.as_u16(), body));
        }

        let envelope: ConversionResponse = response
            .json()
            .await
            .map_err(|e| VoiceboundError::decode(format!("malformed conversion response: {e}")))?;
        ArchivePayload::decode(envelope)
    }

    /// Full intake: convert a source document and persist the result as a
    /// new library entry.
    ///
    /// Metadata falls back when the service omits it: title to the source
    /// file stem, author to "Unknown".
    pub async fn submit(&self, source: &Path, library: &Library) -> Result<Book> {
        let payload = self.convert(source).await?;

        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let id = library.allocate_id(&stem).await?;
        store_payload(payload, &stem, id, library).await
    }
}

/// Persist a decoded payload as a library entry under a fresh id.
///
/// Unwinds on failure: files written before a failed catalog insert are
/// discarded, since a leftover `{id}.zip` would occupy the id without
/// ever appearing in `list()`.
async fn store_payload(
    payload: ArchivePayload,
    stem: &str,
    id: String,
    library: &Library,
) -> Result<Book> {
    let fallback_title = if stem.is_empty() {
        "Untitled".to_string()
    } else {
        stem.to_string()
    };
    let outcome: Result<Book> = async {
        let archive_path = library.write_archive(&id, &payload.archive).await?;
        let cover_path = match &payload.cover {
            Some(bytes) => Some(library.write_cover(&id, bytes).await?),
            None => None,
        };
        let book = Book {
            id: id.clone(),
            archive_path,
            title: payload.title.unwrap_or(fallback_title),
            author: payload.author.unwrap_or_else(|| "Unknown".to_string()),
            cover_path,
            added_at: Utc::now(),
        };
        library.add_or_replace(&book).await?;
        Ok(book)
    }
    .await;

    match outcome {
        Ok(book) => {
            info!("book {} added to library: {}", book.id, book.title);
            Ok(book)
        }
        Err(e) => {
            library.discard_files(&id).await;
            Err(e)
        }
    }
}

/// Validated file name for the multipart upload
fn source_file_name(source: &Path) -> Result<String> {
    let file_name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| {
            VoiceboundError::InvalidInput(format!("not a file path: {}", source.display()))
        })?;
    if !SOURCE_EXTENSION.is_match(&file_name) {
        return Err(VoiceboundError::InvalidInput(format!(
            "unsupported document type: {file_name} (expected .epub, .fb2, or .txt)"
        )));
    }
    Ok(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Database, MetadataStore};
    use std::path::PathBuf;

    #[test]
    fn test_supported_document_kinds() {
        for name in ["book.epub", "book.fb2", "book.txt", "BOOK.EPUB", "a.b.Txt"] {
            assert!(
                source_file_name(&PathBuf::from(name)).is_ok(),
                "{name} should be accepted"
            );
        }
    }

    #[test]
    fn test_unsupported_document_kinds() {
        for name in ["book.pdf", "book.mobi", "book", "epub", "book.epub.zip"] {
            let err = source_file_name(&PathBuf::from(name)).unwrap_err();
            assert_eq!(err.kind(), "invalid_input", "{name} should be rejected");
        }
    }

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url.as_str(), "http://127.0.0.1:5000/");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.user_agent.starts_with("voicebound-core/"));
    }

    #[test]
    fn test_config_builder() {
        let config = ClientConfig::new(Url::parse("https://tts.example.net/api/").unwrap())
            .with_timeout(Duration::from_secs(5))
            .with_upload_timeout(Duration::from_secs(60))
            .with_user_agent("test-agent");

        assert_eq!(config.base_url.host_str(), Some("tts.example.net"));
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.upload_timeout, Duration::from_secs(60));
        assert_eq!(config.user_agent, "test-agent");

        let url = config.base_url.join("upload").unwrap();
        assert_eq!(url.as_str(), "https://tts.example.net/api/upload");
    }

    #[test]
    fn test_client_builds_with_defaults() {
        let client = ConversionClient::new(ClientConfig::default()).unwrap();
        assert_eq!(client.config().timeout, Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_failed_catalog_insert_discards_written_files() {
        let dir = tempfile::TempDir::new().unwrap();
        let db = Database::new_in_memory().await.unwrap();
        let library = Library::new(
            MetadataStore::new(&db),
            dir.path().join("audiobooks"),
            dir.path().join("covers"),
        )
        .unwrap();
        let id = library.allocate_id("dune").await.unwrap();

        // Closing the pool makes the catalog insert fail after the files
        // have already been written
        db.close().await;

        let payload = ArchivePayload {
            archive: b"zipbytes".to_vec(),
            title: Some("Dune".to_string()),
            author: None,
            cover: Some(b"jpegbytes".to_vec()),
        };
        let err = store_payload(payload, "dune", id.clone(), &library)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "database");

        assert!(!library.archive_path(&id).exists());
        assert!(!library.cover_path(&id).exists());
    }
}
