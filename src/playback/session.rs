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


//! Chapter playback state machine
//!
//! One session plays one book. `open(chapter)` extracts the chapter to
//! scratch on a blocking worker and loads it into the sink; transport
//! controls and the position tick then drive the state machine:
//!
//! ```text
//! Idle -> Preparing -> Ready -> Playing <-> Paused
//!                        |         |
//!                        |     Completed -> (auto-advance: Preparing...)
//!                     Error
//! ```
//!
//! At most one extraction is in flight per session. A new `open` while a
//! prior extraction is outstanding supersedes it: every prepare bumps the
//! session generation, and a completion carrying a stale generation is
//! discarded on arrival. `close()` bumps the generation too, so pending
//! work becomes a no-op instead of resurrecting a closed session.
//!
//! Event callbacks run while the session lock is held; handlers must
//! return quickly and must not call back into the session.

use crate::archive::{ArchiveCatalog, ChapterCache};
use crate::error::{Result, VoiceboundError};
use crate::playback::sink::AudioSink;
use crate::storage::Book;
use log::{debug, warn};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Nominal period of position reports while playing
const TICK_PERIOD: Duration = Duration::from_millis(1000);

/// Relative skip distance for `skip_forward` / `skip_back`
const SKIP_MS: i64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Idle,
    Preparing,
    Ready,
    Playing,
    Paused,
    Seeking,
    Completed,
    Error,
}

/// Notifications pushed to the session observer
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    StateChanged {
        status: SessionStatus,
    },
    ChapterStarted {
        index: usize,
        title: String,
        duration_ms: u64,
    },
    Position {
        position_ms: u64,
        duration_ms: u64,
    },
    SessionError {
        kind: &'static str,
        message: String,
    },
}

pub type EventCallback = Arc<dyn Fn(PlaybackEvent) + Send + Sync>;

/// Point-in-time view of the session, safe to hand to a UI thread
#[derive(Debug, Clone, Serialize)]
pub struct PlaybackState {
    pub book_id: String,
    pub status: SessionStatus,
    pub chapter_index: usize,
    pub position_ms: u64,
    pub duration_ms: u64,
}

struct SessionInner {
    book: Book,
    cache: ChapterCache,
    sink: Box<dyn AudioSink>,
    callback: Option<EventCallback>,
    catalog: Option<ArchiveCatalog>,
    status: SessionStatus,
    chapter_index: usize,
    duration_ms: u64,
    generation: u64,
}

impl SessionInner {
    fn new(book: Book, cache: ChapterCache, sink: Box<dyn AudioSink>) -> Self {
        Self {
            book,
            cache,
            sink,
            callback: None,
            catalog: None,
            status: SessionStatus::Idle,
            chapter_index: 0,
            duration_ms: 0,
            generation: 0,
        }
    }

    fn emit(&self, event: PlaybackEvent) {
        if let Some(callback) = &self.callback {
            callback(event);
        }
    }

    fn set_status(&mut self, status: SessionStatus) {
        if self.status != status {
            self.status = status;
            self.emit(PlaybackEvent::StateChanged { status });
        }
    }

    fn enter_error(&mut self, error: &VoiceboundError) {
        warn!("session error for {}: {error}", self.book.id);
        self.emit(PlaybackEvent::SessionError {
            kind: error.kind(),
            message: error.to_string(),
        });
        self.set_status(SessionStatus::Error);
    }

    fn chapter_count(&self) -> usize {
        self.catalog.as_ref().map(|c| c.len()).unwrap_or(0)
    }

    /// Clamped absolute seek; restores the pre-seek status afterwards
    fn seek_to(&mut self, target_ms: i64) -> Result<()> {
        match self.status {
            SessionStatus::Ready | SessionStatus::Playing | SessionStatus::Paused => {}
            _ => {
                return Err(VoiceboundError::InvalidInput(
                    "no chapter loaded to seek in".to_string(),
                ))
            }
        }
        let prior = self.status;
        self.set_status(SessionStatus::Seeking);
        let clamped = target_ms.clamp(0, self.duration_ms as i64) as u64;
        if let Err(e) = self.sink.seek(clamped) {
            self.enter_error(&e);
            return Err(e);
        }
        self.set_status(prior);
        Ok(())
    }
}

/// Applies the outcome of one extraction to the session.
///
/// Returns `false` when the result belongs to a superseded generation and
/// was discarded without touching any state.
fn apply_prepared(
    inner: &mut SessionInner,
    generation: u64,
    index: usize,
    resume: bool,
    scratch: Result<PathBuf>,
) -> bool {
    if generation != inner.generation {
        debug!("discarding stale prepare result (generation {generation})");
        return false;
    }

    let loaded = scratch.and_then(|path| {
        let duration_ms = inner.sink.load(&path)?;
        Ok(duration_ms)
    });
    match loaded {
        Ok(duration_ms) => {
            inner.chapter_index = index;
            inner.duration_ms = duration_ms;
            let title = inner
                .catalog
                .as_ref()
                .and_then(|c| c.chapters().get(index))
                .map(|ch| ch.title.clone())
                .unwrap_or_default();
            inner.set_status(SessionStatus::Ready);
            inner.emit(PlaybackEvent::ChapterStarted {
                index,
                title,
                duration_ms,
            });
            if resume {
                match inner.sink.play() {
                    Ok(()) => inner.set_status(SessionStatus::Playing),
                    Err(e) => inner.enter_error(&e),
                }
            }
        }
        Err(e) => inner.enter_error(&e),
    }
    true
}

/// Starts one fenced extraction for `index` and returns immediately.
fn begin_prepare(
    shared: &Arc<Mutex<SessionInner>>,
    inner: &mut SessionInner,
    index: usize,
    resume: bool,
) {
    inner.generation += 1;
    let generation = inner.generation;
    inner.chapter_index = index;
    inner.set_status(SessionStatus::Preparing);

    let entry_name = match inner.catalog.as_ref().and_then(|c| c.chapters().get(index)) {
        Some(chapter) => chapter.entry_name.clone(),
        None => {
            inner.enter_error(&VoiceboundError::ChapterIndexOutOfRange {
                index,
                count: inner.chapter_count(),
            });
            return;
        }
    };
    let archive_path = inner.book.archive_path.clone();
    let cache = inner.cache.clone();
    let shared = Arc::clone(shared);

    tokio::spawn(async move {
        let result = tokio::task::spawn_blocking(move || cache.extract(&archive_path, &entry_name))
            .await
            .map_err(|e| VoiceboundError::Internal(format!("extraction task failed: {e}")))
            .and_then(|r| r);
        let mut inner = shared.lock().await;
        apply_prepared(&mut inner, generation, index, resume, result);
    });
}

/// Playback session for one library entry
pub struct PlaybackSession {
    inner: Arc<Mutex<SessionInner>>,
    tick: StdMutex<Option<JoinHandle<()>>>,
    tick_period: Duration,
}

impl PlaybackSession {
    pub fn new(book: Book, cache: ChapterCache, sink: Box<dyn AudioSink>) -> Self {
        Self::with_tick_period(book, cache, sink, TICK_PERIOD)
    }

    /// Like [`PlaybackSession::new`] with a custom position-report period.
    pub fn with_tick_period(
        book: Book,
        cache: ChapterCache,
        sink: Box<dyn AudioSink>,
        tick_period: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SessionInner::new(book, cache, sink))),
            tick: StdMutex::new(None),
            tick_period,
        }
    }

    /// Register the observer that receives [`PlaybackEvent`]s.
    ///
    /// The callback runs with the session lock held and must not call
    /// back into the session.
    pub async fn on_event(&self, callback: EventCallback) {
        self.inner.lock().await.callback = Some(callback);
    }

    /// Prepare a chapter for playback.
    ///
    /// Validates the index against the archive before any state changes;
    /// extraction then proceeds in the background and the session reports
    /// `Ready` (or `Error`) through the event callback.
    pub async fn open(&self, chapter_index: usize) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if inner.catalog.is_none() {
            let path = inner.book.archive_path.clone();
            let catalog = tokio::task::spawn_blocking(move || ArchiveCatalog::open(&path))
                .await
                .map_err(|e| VoiceboundError::Internal(format!("catalog task failed: {e}")))??;
            inner.catalog = Some(catalog);
        }
        let count = inner.chapter_count();
        if chapter_index >= count {
            return Err(VoiceboundError::ChapterIndexOutOfRange {
                index: chapter_index,
                count,
            });
        }
        begin_prepare(&self.inner, &mut inner, chapter_index, false);
        drop(inner);
        self.ensure_tick_task();
        Ok(())
    }

    pub async fn play(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        match inner.status {
            SessionStatus::Playing => Ok(()),
            SessionStatus::Ready | SessionStatus::Paused => {
                inner.sink.play()?;
                inner.set_status(SessionStatus::Playing);
                Ok(())
            }
            status => Err(VoiceboundError::InvalidInput(format!(
                "cannot play in state {status:?}"
            ))),
        }
    }

    pub async fn pause(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        match inner.status {
            SessionStatus::Paused => Ok(()),
            SessionStatus::Playing => {
                inner.sink.pause()?;
                inner.set_status(SessionStatus::Paused);
                Ok(())
            }
            status => Err(VoiceboundError::InvalidInput(format!(
                "cannot pause in state {status:?}"
            ))),
        }
    }

    /// Absolute seek, clamped to `[0, duration]`.
    pub async fn seek(&self, target_ms: i64) -> Result<()> {
        self.inner.lock().await.seek_to(target_ms)
    }

    pub async fn skip_forward(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let target = inner.sink.position() as i64 + SKIP_MS;
        inner.seek_to(target)
    }

    pub async fn skip_back(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let target = inner.sink.position() as i64 - SKIP_MS;
        inner.seek_to(target)
    }

    /// Jump to the next chapter, keeping playback going if currently playing.
    pub async fn next_chapter(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let count = inner.chapter_count();
        let next = inner.chapter_index + 1;
        if next >= count {
            return Err(VoiceboundError::ChapterIndexOutOfRange { index: next, count });
        }
        let resume = inner.status == SessionStatus::Playing;
        begin_prepare(&self.inner, &mut inner, next, resume);
        Ok(())
    }

    pub async fn previous_chapter(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let count = inner.chapter_count();
        let previous = inner.chapter_index.checked_sub(1).ok_or(
            VoiceboundError::ChapterIndexOutOfRange { index: 0, count },
        )?;
        let resume = inner.status == SessionStatus::Playing;
        begin_prepare(&self.inner, &mut inner, previous, resume);
        Ok(())
    }

    /// Stop playback, invalidate pending work, and release scratch files.
    pub async fn close(&self) {
        self.abort_tick();
        let mut inner = self.inner.lock().await;
        inner.generation += 1;
        inner.sink.stop();
        inner.cache.purge();
        inner.duration_ms = 0;
        inner.set_status(SessionStatus::Idle);
    }

    pub async fn snapshot(&self) -> PlaybackState {
        let inner = self.inner.lock().await;
        PlaybackState {
            book_id: inner.book.id.clone(),
            status: inner.status,
            chapter_index: inner.chapter_index,
            position_ms: inner.sink.position(),
            duration_ms: inner.duration_ms,
        }
    }

    pub async fn chapter_count(&self) -> usize {
        self.inner.lock().await.chapter_count()
    }

    /// Spawn the position-report loop if it is not already running.
    ///
    /// One loop per session; each tick completes before the next runs, so
    /// reports never overlap. While playing it either emits a position or,
    /// at natural chapter end, drives the completion transition.
    fn ensure_tick_task(&self) {
        let mut guard = match self.tick.lock() {
            Ok(guard) => guard,
            Err(_) => return,
        };
        if guard.as_ref().map(|h| !h.is_finished()).unwrap_or(false) {
            return;
        }
        let shared = Arc::clone(&self.inner);
        let period = self.tick_period;
        *guard = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let mut inner = shared.lock().await;
                if inner.status != SessionStatus::Playing {
                    continue;
                }
                if inner.sink.finished() {
                    inner.set_status(SessionStatus::Completed);
                    let next = inner.chapter_index + 1;
                    if next < inner.chapter_count() {
                        begin_prepare(&shared, &mut inner, next, true);
                    }
                    continue;
                }
                let position_ms = inner.sink.position();
                let duration_ms = inner.duration_ms;
                inner.emit(PlaybackEvent::Position {
                    position_ms,
                    duration_ms,
                });
            }
        }));
    }

    fn abort_tick(&self) {
        if let Ok(mut guard) = self.tick.lock() {
            if let Some(handle) = guard.take() {
                handle.abort();
            }
        }
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        self.abort_tick();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::sink::NullSink;
    use chrono::Utc;
    use std::fs::File;
    use std::io::Write;
    use std::path::Path;
    use tempfile::TempDir;
    use zip::write::FileOptions;

    fn write_archive(dir: &TempDir, entries: &[&str]) -> PathBuf {
        let path = dir.path().join("book.zip");
        let file = File::create(&path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options =
            FileOptions::default().compression_method(zip::CompressionMethod::Stored);
        for name in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(b"audio bytes").unwrap();
        }
        writer.finish().unwrap();
        path
    }

    fn test_book(archive_path: &Path) -> Book {
        Book {
            id: "test-book".to_string(),
            archive_path: archive_path.to_path_buf(),
            title: "Test Book".to_string(),
            author: "Unknown".to_string(),
            cover_path: None,
            added_at: Utc::now(),
        }
    }

    type Recorded = Arc<StdMutex<Vec<PlaybackEvent>>>;

    async fn test_session(
        dir: &TempDir,
        entries: &[&str],
        duration_ms: u64,
    ) -> (PlaybackSession, NullSink, Recorded) {
        let archive = write_archive(dir, entries);
        let cache = ChapterCache::new(dir.path().join("scratch")).unwrap();
        let sink = NullSink::with_duration(duration_ms);
        let session = PlaybackSession::with_tick_period(
            test_book(&archive),
            cache,
            Box::new(sink.clone()),
            Duration::from_millis(10),
        );
        let events: Recorded = Arc::new(StdMutex::new(Vec::new()));
        let recorder = Arc::clone(&events);
        session
            .on_event(Arc::new(move |event| {
                recorder.lock().unwrap().push(event);
            }))
            .await;
        (session, sink, events)
    }

    async fn wait_for_status(session: &PlaybackSession, status: SessionStatus) {
        for _ in 0..500 {
            if session.snapshot().await.status == status {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!(
            "timed out waiting for {status:?}, currently {:?}",
            session.snapshot().await.status
        );
    }

    #[tokio::test]
    async fn test_open_reaches_ready() {
        let dir = TempDir::new().unwrap();
        let (session, sink, events) = test_session(&dir, &["01_intro.mp3"], 60_000).await;

        session.open(0).await.unwrap();
        wait_for_status(&session, SessionStatus::Ready).await;

        let state = session.snapshot().await;
        assert_eq!(state.chapter_index, 0);
        assert_eq!(state.duration_ms, 60_000);
        assert_eq!(state.position_ms, 0);

        // The sink got the scratch copy, not the archive itself
        let loaded = sink.loaded_path().unwrap();
        assert!(loaded.exists());
        assert_ne!(loaded, dir.path().join("book.zip"));

        let events = events.lock().unwrap();
        assert!(events.contains(&PlaybackEvent::ChapterStarted {
            index: 0,
            title: "01 intro".to_string(),
            duration_ms: 60_000,
        }));
    }

    #[tokio::test]
    async fn test_open_invalid_index_fails_fast() {
        let dir = TempDir::new().unwrap();
        let (session, _sink, _events) = test_session(&dir, &["01.mp3"], 1_000).await;

        let err = session.open(5).await.unwrap_err();
        assert_eq!(err.kind(), "chapter_index_out_of_range");
        assert_eq!(session.snapshot().await.status, SessionStatus::Idle);
    }

    #[tokio::test]
    async fn test_play_pause_transitions() {
        let dir = TempDir::new().unwrap();
        let (session, sink, _events) = test_session(&dir, &["01.mp3"], 60_000).await;

        session.open(0).await.unwrap();
        wait_for_status(&session, SessionStatus::Ready).await;

        session.play().await.unwrap();
        assert_eq!(session.snapshot().await.status, SessionStatus::Playing);
        assert!(sink.is_playing());

        session.pause().await.unwrap();
        assert_eq!(session.snapshot().await.status, SessionStatus::Paused);
        assert!(!sink.is_playing());

        // play() before anything is loaded is rejected
        let (idle_session, _, _) = test_session(&dir, &["01.mp3"], 60_000).await;
        let err = idle_session.play().await.unwrap_err();
        assert_eq!(err.kind(), "invalid_input");
    }

    #[tokio::test]
    async fn test_seek_clamps_to_duration() {
        let dir = TempDir::new().unwrap();
        let (session, _sink, _events) = test_session(&dir, &["01.mp3"], 500).await;

        session.open(0).await.unwrap();
        wait_for_status(&session, SessionStatus::Ready).await;

        session.seek(1_000).await.unwrap();
        assert_eq!(session.snapshot().await.position_ms, 500);

        session.seek(-100).await.unwrap();
        assert_eq!(session.snapshot().await.position_ms, 0);
    }

    #[tokio::test]
    async fn test_skip_back_clamps_to_zero() {
        let dir = TempDir::new().unwrap();
        let (session, sink, _events) = test_session(&dir, &["01.mp3"], 60_000).await;

        session.open(0).await.unwrap();
        wait_for_status(&session, SessionStatus::Ready).await;
        session.play().await.unwrap();

        sink.set_position(5_000);
        session.skip_back().await.unwrap();
        assert_eq!(session.snapshot().await.position_ms, 0);

        sink.set_position(55_000);
        session.skip_forward().await.unwrap();
        assert_eq!(session.snapshot().await.position_ms, 60_000);
    }

    #[tokio::test]
    async fn test_seek_restores_prior_state() {
        let dir = TempDir::new().unwrap();
        let (session, _sink, events) = test_session(&dir, &["01.mp3"], 60_000).await;

        session.open(0).await.unwrap();
        wait_for_status(&session, SessionStatus::Ready).await;
        session.play().await.unwrap();

        session.seek(30_000).await.unwrap();
        assert_eq!(session.snapshot().await.status, SessionStatus::Playing);

        let events = events.lock().unwrap();
        let seeking = events.iter().position(|e| {
            matches!(e, PlaybackEvent::StateChanged { status: SessionStatus::Seeking })
        });
        assert!(seeking.is_some(), "seek must pass through Seeking");
    }

    #[tokio::test]
    async fn test_stale_prepare_result_is_discarded() {
        let dir = TempDir::new().unwrap();
        let archive = write_archive(&dir, &["01.mp3"]);
        let cache = ChapterCache::new(dir.path().join("scratch")).unwrap();
        let sink = NullSink::with_duration(1_000);
        let mut inner = SessionInner::new(test_book(&archive), cache.clone(), Box::new(sink));
        inner.catalog = Some(ArchiveCatalog::open(&archive).unwrap());

        let scratch = cache.extract(&archive, "01.mp3").unwrap();

        // A newer open() has bumped the generation past this result's
        inner.generation = 7;
        assert!(!apply_prepared(&mut inner, 6, 0, false, Ok(scratch.clone())));
        assert_eq!(inner.status, SessionStatus::Idle);

        // The current generation's result applies normally
        assert!(apply_prepared(&mut inner, 7, 0, false, Ok(scratch)));
        assert_eq!(inner.status, SessionStatus::Ready);
    }

    #[tokio::test]
    async fn test_auto_advance_keeps_playing() {
        let dir = TempDir::new().unwrap();
        let (session, sink, events) =
            test_session(&dir, &["01.mp3", "02.mp3"], 1_000).await;

        session.open(0).await.unwrap();
        wait_for_status(&session, SessionStatus::Ready).await;
        session.play().await.unwrap();

        sink.set_finished(true);
        for _ in 0..500 {
            let state = session.snapshot().await;
            if state.chapter_index == 1 && state.status == SessionStatus::Playing {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let state = session.snapshot().await;
        assert_eq!(state.chapter_index, 1);
        assert_eq!(state.status, SessionStatus::Playing);
        assert!(sink.is_playing());

        let events = events.lock().unwrap();
        assert!(events
            .iter()
            .any(|e| matches!(e, PlaybackEvent::ChapterStarted { index: 1, .. })));
    }

    #[tokio::test]
    async fn test_completion_without_next_chapter_is_terminal() {
        let dir = TempDir::new().unwrap();
        let (session, sink, _events) = test_session(&dir, &["only.mp3"], 1_000).await;

        session.open(0).await.unwrap();
        wait_for_status(&session, SessionStatus::Ready).await;
        session.play().await.unwrap();

        sink.set_finished(true);
        wait_for_status(&session, SessionStatus::Completed).await;

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(session.snapshot().await.status, SessionStatus::Completed);
    }

    #[tokio::test]
    async fn test_close_resets_and_purges_scratch() {
        let dir = TempDir::new().unwrap();
        let (session, sink, _events) = test_session(&dir, &["01.mp3"], 60_000).await;

        session.open(0).await.unwrap();
        wait_for_status(&session, SessionStatus::Ready).await;
        session.play().await.unwrap();

        session.close().await;
        assert_eq!(session.snapshot().await.status, SessionStatus::Idle);
        assert!(!sink.is_playing());

        let scratch_files = std::fs::read_dir(dir.path().join("scratch")).unwrap().count();
        assert_eq!(scratch_files, 0);
    }

    #[tokio::test]
    async fn test_decode_failure_enters_error_state() {
        let dir = TempDir::new().unwrap();
        let (session, sink, events) = test_session(&dir, &["01.mp3"], 60_000).await;
        sink.fail_next_load("unsupported codec");

        session.open(0).await.unwrap();
        wait_for_status(&session, SessionStatus::Error).await;

        let events = events.lock().unwrap();
        assert!(events
            .iter()
            .any(|e| matches!(e, PlaybackEvent::SessionError { kind: "media_decode", .. })));
    }

    #[tokio::test]
    async fn test_position_reports_while_playing() {
        let dir = TempDir::new().unwrap();
        let (session, sink, events) = test_session(&dir, &["01.mp3"], 60_000).await;

        session.open(0).await.unwrap();
        wait_for_status(&session, SessionStatus::Ready).await;
        session.play().await.unwrap();
        sink.set_position(1_234);

        let mut reported = false;
        for _ in 0..500 {
            if events.lock().unwrap().iter().any(|e| {
                matches!(e, PlaybackEvent::Position { position_ms: 1_234, duration_ms: 60_000 })
            }) {
                reported = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(reported, "no position report observed");

        // Paused sessions stay quiet
        session.pause().await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        let before = events.lock().unwrap().len();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(events.lock().unwrap().len(), before);
    }

    #[tokio::test]
    async fn test_next_and_previous_chapter() {
        let dir = TempDir::new().unwrap();
        let (session, _sink, _events) =
            test_session(&dir, &["01.mp3", "02.mp3"], 60_000).await;

        session.open(0).await.unwrap();
        wait_for_status(&session, SessionStatus::Ready).await;

        session.next_chapter().await.unwrap();
        wait_for_status(&session, SessionStatus::Ready).await;
        assert_eq!(session.snapshot().await.chapter_index, 1);

        let err = session.next_chapter().await.unwrap_err();
        assert_eq!(err.kind(), "chapter_index_out_of_range");

        session.previous_chapter().await.unwrap();
        wait_for_status(&session, SessionStatus::Ready).await;
        assert_eq!(session.snapshot().await.chapter_index, 0);

        let err = session.previous_chapter().await.unwrap_err();
        assert_eq!(err.kind(), "chapter_index_out_of_range");
    }
}
