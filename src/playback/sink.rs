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


//! Audio output abstraction
//!
//! The session drives playback through [`AudioSink`] so the platform
//! decoder stays behind a seam: a mobile shell plugs its media player in
//! here, while tests and headless runs use [`NullSink`]. Sink methods are
//! expected to return quickly; decoding happens on the sink's own thread,
//! not the caller's.

use crate::error::{Result, VoiceboundError};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Playback backend for a single loaded chapter file
pub trait AudioSink: Send {
    /// Load a chapter file and return its duration in milliseconds.
    ///
    /// Replaces whatever was loaded before; position resets to zero.
    fn load(&mut self, path: &Path) -> Result<u64>;

    fn play(&mut self) -> Result<()>;

    fn pause(&mut self) -> Result<()>;

    /// Jump to an absolute position in milliseconds. The caller clamps to
    /// the chapter duration before calling.
    fn seek(&mut self, position_ms: u64) -> Result<()>;

    /// Current position in milliseconds
    fn position(&self) -> u64;

    /// Whether the loaded chapter has played to its end
    fn finished(&self) -> bool;

    /// Stop playback and release the loaded file
    fn stop(&mut self);
}

#[derive(Debug, Default)]
struct NullSinkState {
    duration_ms: u64,
    position_ms: u64,
    playing: bool,
    finished: bool,
    loaded: Option<PathBuf>,
    fail_load: Option<String>,
}

/// Sink that produces no audio.
///
/// Reports a fixed duration for every loaded file and only moves its
/// position when told to. Cloneable; clones share state, so a caller can
/// keep a handle while the session owns the boxed sink.
#[derive(Debug, Clone, Default)]
pub struct NullSink {
    state: Arc<Mutex<NullSinkState>>,
}

impl NullSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_duration(duration_ms: u64) -> Self {
        let sink = Self::new();
        sink.state.lock().expect("sink state").duration_ms = duration_ms;
        sink
    }

    /// Make the next `load` fail, to exercise decode-failure paths
    pub fn fail_next_load<S: Into<String>>(&self, message: S) {
        self.state.lock().expect("sink state").fail_load = Some(message.into());
    }

    pub fn set_finished(&self, finished: bool) {
        self.state.lock().expect("sink state").finished = finished;
    }

    pub fn set_position(&self, position_ms: u64) {
        self.state.lock().expect("sink state").position_ms = position_ms;
    }

    pub fn is_playing(&self) -> bool {
        self.state.lock().expect("sink state").playing
    }

    pub fn loaded_path(&self) -> Option<PathBuf> {
        self.state.lock().expect("sink state").loaded.clone()
    }
}

impl AudioSink for NullSink {
    fn load(&mut self, path: &Path) -> Result<u64> {
        let mut state = self.state.lock().expect("sink state");
        if let Some(message) = state.fail_load.take() {
            return Err(VoiceboundError::media_decode(path, message));
        }
        state.loaded = Some(path.to_path_buf());
        state.position_ms = 0;
        state.playing = false;
        state.finished = false;
        Ok(state.duration_ms)
    }

    fn play(&mut self) -> Result<()> {
        self.state.lock().expect("sink state").playing = true;
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        self.state.lock().expect("sink state").playing = false;
        Ok(())
    }

    fn seek(&mut self, position_ms: u64) -> Result<()> {
        self.state.lock().expect("sink state").position_ms = position_ms;
        Ok(())
    }

    fn position(&self) -> u64 {
        self.state.lock().expect("sink state").position_ms
    }

    fn finished(&self) -> bool {
        self.state.lock().expect("sink state").finished
    }

    fn stop(&mut self) {
        let mut state = self.state.lock().expect("sink state");
        state.playing = false;
        state.loaded = None;
        state.position_ms = 0;
        state.finished = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_load_resets_position_and_finished() {
        let mut sink = NullSink::with_duration(60_000);
        sink.set_position(45_000);
        sink.set_finished(true);

        let duration = sink.load(&PathBuf::from("/tmp/ch.mp3")).unwrap();
        assert_eq!(duration, 60_000);
        assert_eq!(sink.position(), 0);
        assert!(!sink.finished());
        assert_eq!(sink.loaded_path(), Some(PathBuf::from("/tmp/ch.mp3")));
    }

    #[test]
    fn test_clones_share_state() {
        let sink = NullSink::with_duration(10_000);
        let mut boxed: Box<dyn AudioSink> = Box::new(sink.clone());

        boxed.play().unwrap();
        assert!(sink.is_playing());
        boxed.stop();
        assert!(!sink.is_playing());
    }

    #[test]
    fn test_fail_next_load() {
        let mut sink = NullSink::new();
        sink.fail_next_load("codec not supported");

        let err = sink.load(&PathBuf::from("/tmp/ch.mp3")).unwrap_err();
        assert_eq!(err.kind(), "media_decode");

        // Only the next load fails
        sink.load(&PathBuf::from("/tmp/ch.mp3")).unwrap();
    }
}
