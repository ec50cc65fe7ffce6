// state.rs: Line store, sync state and the frame handed to presentation adapters

use crate::lyrics::parse::split_lines;
use crate::sync::LineClass;
use std::sync::Arc;

/// Lyrics for one track. Built once from fetched text and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct LyricsDocument {
    track_id: String,
    lines: Arc<Vec<String>>,
}

impl LyricsDocument {
    /// Build a document from raw lyrics text. Returns `None` when the text
    /// has no visible lines, which callers treat as "not found".
    pub fn from_text(track_id: impl Into<String>, text: &str) -> Option<Self> {
        let lines = split_lines(text);
        if lines.is_empty() {
            return None;
        }
        Some(Self {
            track_id: track_id.into(),
            lines: Arc::new(lines),
        })
    }

    pub fn track_id(&self) -> &str {
        &self.track_id
    }

    pub fn lines(&self) -> &Arc<Vec<String>> {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }
}

/// Holds the document for the currently loaded track, if any.
#[derive(Debug, Default)]
pub struct LineStore {
    document: Option<LyricsDocument>,
}

impl LineStore {
    pub fn document(&self) -> Option<&LyricsDocument> {
        self.document.as_ref()
    }

    pub fn loaded_track(&self) -> Option<&str> {
        self.document.as_ref().map(LyricsDocument::track_id)
    }

    pub fn line_count(&self) -> usize {
        self.document.as_ref().map_or(0, LyricsDocument::len)
    }

    /// True when lines for `track_key` are loaded (the cache-hit case).
    pub fn holds(&self, track_key: &str) -> bool {
        self.loaded_track() == Some(track_key) && self.line_count() > 0
    }

    pub fn replace(&mut self, document: LyricsDocument) {
        self.document = Some(document);
    }

    /// Drop the loaded document. Returns whether anything was loaded.
    pub fn clear(&mut self) -> bool {
        self.document.take().is_some()
    }
}

/// Mutable synchronization state. Written only by the sync calculator and
/// the manual override controller.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncState {
    pub current_progress_ms: u64,
    pub last_progress_ms: u64,
    /// Signed adjustment layered over tracked progress, in (fractional) ms.
    pub manual_offset_ms: f64,
    pub sync_speed_multiplier: f64,
    pub auto_scroll_enabled: bool,
    /// Derived on every tick.
    pub(crate) active_line_index: Option<usize>,
}

impl Default for SyncState {
    fn default() -> Self {
        Self {
            current_progress_ms: 0,
            last_progress_ms: 0,
            manual_offset_ms: 0.0,
            sync_speed_multiplier: 1.0,
            auto_scroll_enabled: true,
            active_line_index: None,
        }
    }
}

impl SyncState {
    pub fn with_speed(speed: f64) -> Self {
        Self {
            sync_speed_multiplier: speed,
            ..Self::default()
        }
    }

    pub fn active_line_index(&self) -> Option<usize> {
        self.active_line_index
    }

    /// Reset for a freshly loaded document. The speed multiplier is an
    /// operator setting and survives.
    pub fn reset_for_new_document(&mut self, progress_ms: u64) {
        self.current_progress_ms = progress_ms;
        self.last_progress_ms = progress_ms;
        self.manual_offset_ms = 0.0;
        self.auto_scroll_enabled = true;
        self.active_line_index = None;
    }

    pub(crate) fn clear_active(&mut self) {
        self.active_line_index = None;
    }
}

/// What the overlay header reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Status {
    #[default]
    Idle,
    AuthRequired,
    NoPlayback,
    Fetching,
    Playing,
    Paused,
    FetchFailed,
    Unreachable,
}

impl Status {
    pub fn label(&self) -> &'static str {
        match self {
            Status::Idle => "Starting…",
            Status::AuthRequired => "Not authorized",
            Status::NoPlayback => "Not playing",
            Status::Fetching => "Fetching lyrics…",
            Status::Playing => "▶ Playing",
            Status::Paused => "⏸ Paused",
            Status::FetchFailed => "No lyrics available",
            Status::Unreachable => "Server offline",
        }
    }
}

/// Represents a UI update for lyrics and playback state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Update {
    pub title: String,
    pub status: Status,
    pub notice: Option<String>,
    pub lines: Arc<Vec<String>>,
    pub classes: Vec<LineClass>,
    pub active: Option<usize>,
    /// Line to bring into view on this frame, if auto-scroll is on.
    pub scroll_to: Option<usize>,
    pub minimized: bool,
    pub auto_scroll: bool,
    pub speed: f64,
    pub version: u64, // Incremented on any state change
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_filters_blank_lines() {
        let doc = LyricsDocument::from_text("T1", "a\n\n b \n").unwrap();
        assert_eq!(doc.track_id(), "T1");
        assert_eq!(doc.lines().as_slice(), ["a", "b"]);
        assert!(LyricsDocument::from_text("T1", "\n  \n").is_none());
    }

    #[test]
    fn store_reports_cache_hits() {
        let mut store = LineStore::default();
        assert!(!store.holds("T1"));
        store.replace(LyricsDocument::from_text("T1", "x").unwrap());
        assert!(store.holds("T1"));
        assert!(!store.holds("T2"));
        assert!(store.clear());
        assert!(!store.clear());
        assert_eq!(store.line_count(), 0);
    }

    #[test]
    fn reset_keeps_speed_and_restores_auto_scroll() {
        let mut state = SyncState::with_speed(1.5);
        state.manual_offset_ms = -1200.0;
        state.auto_scroll_enabled = false;
        state.active_line_index = Some(3);
        state.reset_for_new_document(9000);
        assert_eq!(state.manual_offset_ms, 0.0);
        assert_eq!(state.last_progress_ms, 9000);
        assert_eq!(state.current_progress_ms, 9000);
        assert!(state.auto_scroll_enabled);
        assert_eq!(state.active_line_index(), None);
        assert_eq!(state.sync_speed_multiplier, 1.5);
    }
}
