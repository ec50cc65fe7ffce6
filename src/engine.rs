//! The lyric timeline synchronization engine.
//!
//! `SyncEngine` owns every piece of sync state: the line store, the progress
//! tracker, the sync state, the manual override controller and the
//! visibility controller. The event pool feeds it poll results, timer ticks
//! and user gestures; it never performs I/O itself. Network work is
//! requested through [`PollAction::Fetch`] and reported back through
//! [`SyncEngine::commit_lyrics`], so a document swap and the matching sync
//! state reset always happen inside one `&mut self` call.

use crate::lyrics::LyricsError;
use crate::overrides::{ManualOverride, adjust_speed, clamp_speed};
use crate::playback::{PlaybackError, PlaybackSnapshot};
use crate::state::{LineStore, LyricsDocument, Status, SyncState, Update};
use crate::sync::{self, ProgressSample};
use crate::timer::{ProgressTracker, SCROLL_COOLDOWN};
use crate::visibility::VisibilityController;
use std::fmt::Display;
use std::sync::Arc;
use tokio::time::Instant;

/// Consecutive transient failures tolerated before a notice is shown.
pub const UNREACHABLE_NOTICE_AFTER: u32 = 3;

pub type PollResult = Result<Option<PlaybackSnapshot>, PlaybackError>;
pub type FetchResult = Result<String, LyricsError>;

/// A lyrics lookup the engine wants performed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub id: u64,
    pub track_key: String,
    pub artists: String,
    pub title: String,
}

#[derive(Debug, PartialEq, Eq)]
pub enum PollAction {
    Nothing,
    Fetch(FetchRequest),
}

pub struct SyncEngine {
    store: LineStore,
    progress: ProgressTracker,
    sync: SyncState,
    overrides: ManualOverride,
    visibility: VisibilityController,
    now_playing: Option<PlaybackSnapshot>,
    status: Status,
    notice: Option<String>,
    sync_running: bool,
    pending_fetch: Option<FetchRequest>,
    next_request_id: u64,
    /// Track whose lookup came back "not found"; not retried until the track
    /// changes or a refresh is forced.
    failed_track: Option<String>,
    poll_failures: u32,
    fetch_failures: u32,
    scroll_to: Option<usize>,
    version: u64,
}

impl SyncEngine {
    pub fn new(speed: f64, interpolate: bool) -> Self {
        Self {
            store: LineStore::default(),
            progress: ProgressTracker::new(interpolate),
            sync: SyncState::with_speed(clamp_speed(speed)),
            overrides: ManualOverride::new(SCROLL_COOLDOWN),
            visibility: VisibilityController::default(),
            now_playing: None,
            status: Status::Idle,
            notice: None,
            sync_running: false,
            pending_fetch: None,
            next_request_id: 0,
            failed_track: None,
            poll_failures: 0,
            fetch_failures: 0,
            scroll_to: None,
            version: 0,
        }
    }

    #[cfg(test)]
    pub fn sync_state(&self) -> &SyncState {
        &self.sync
    }

    #[cfg(test)]
    pub fn store(&self) -> &LineStore {
        &self.store
    }

    #[cfg(test)]
    pub fn status(&self) -> Status {
        self.status
    }

    #[cfg(test)]
    pub fn is_minimized(&self) -> bool {
        self.visibility.is_minimized()
    }

    /// Whether the 300 ms sync timer should be running.
    pub fn sync_running(&self) -> bool {
        self.sync_running
    }

    pub fn cooldown_deadline(&self) -> Option<Instant> {
        self.overrides.resume_at()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    fn touch(&mut self) {
        self.version += 1;
    }

    fn set_status(&mut self, status: Status, notice: Option<String>) {
        if self.status != status || self.notice != notice {
            self.status = status;
            self.notice = notice;
            self.touch();
        }
    }

    fn minimize(&mut self) {
        if self.visibility.minimize() {
            self.scroll_to = None;
            self.touch();
        }
    }

    fn expand(&mut self) {
        if self.visibility.expand() {
            self.touch();
        }
    }

    fn current_key(&self) -> Option<String> {
        self.now_playing.as_ref().map(PlaybackSnapshot::track_key)
    }

    fn is_playing(&self) -> bool {
        self.now_playing.as_ref().is_some_and(|s| s.is_playing)
    }

    /// Line count of the document, but only if it belongs to the track that
    /// is currently observed.
    fn synced_line_count(&self) -> usize {
        match (self.store.document(), self.now_playing.as_ref()) {
            (Some(doc), Some(snap)) if doc.track_id() == snap.track_key() => doc.len(),
            _ => 0,
        }
    }

    // ------------------------------------------------------------------
    // Poll results
    // ------------------------------------------------------------------

    /// Apply one poll outcome and decide whether lyrics must be fetched.
    pub fn observe_poll(&mut self, result: PollResult, forced: bool, now: Instant) -> PollAction {
        match result {
            Ok(Some(snapshot)) => self.on_snapshot(snapshot, forced, now),
            Ok(None) => {
                self.on_nothing_playing();
                PollAction::Nothing
            }
            Err(e) if e.is_transient() => {
                self.on_unreachable(&e);
                PollAction::Nothing
            }
            Err(_) => {
                self.on_unauthorized();
                PollAction::Nothing
            }
        }
    }

    fn on_snapshot(&mut self, snapshot: PlaybackSnapshot, forced: bool, now: Instant) -> PollAction {
        self.poll_failures = 0;
        let key = snapshot.track_key();
        if self.current_key().as_deref() != Some(key.as_str()) {
            tracing::debug!(track = %key, title = %snapshot.title, "track changed");
            self.failed_track = None;
            self.fetch_failures = 0;
        }
        if forced {
            self.failed_track = None;
        }

        self.progress.observe(&snapshot, now);
        tracing::trace!(
            progress_ms = snapshot.progress_ms,
            advanced_ms = self.progress.elapsed_since_last_sample(),
            "playback sample"
        );
        let playing = snapshot.is_playing;
        if self.now_playing.as_ref() != Some(&snapshot) {
            self.touch();
        }
        self.now_playing = Some(snapshot);

        // Paused: keep the document for a quick resume, just stop syncing.
        if !playing {
            self.sync_running = false;
            if self.scroll_to.take().is_some() {
                self.touch();
            }
            self.set_status(Status::Paused, None);
            return PollAction::Nothing;
        }

        let loaded = self.store.holds(&key);
        if loaded && !forced {
            self.sync_running = true;
            self.set_status(Status::Playing, None);
            self.expand();
            self.tick(now);
            return PollAction::Nothing;
        }

        if self.pending_fetch.as_ref().is_some_and(|p| p.track_key == key) {
            return PollAction::Nothing;
        }

        if self.failed_track.as_deref() == Some(key.as_str()) {
            self.sync_running = false;
            self.set_status(Status::FetchFailed, None);
            return PollAction::Nothing;
        }

        // A forced refresh of a loaded document keeps syncing the old copy
        // until the new one arrives.
        self.sync_running = loaded;
        if self.fetch_failures >= UNREACHABLE_NOTICE_AFTER {
            self.set_status(Status::Unreachable, Some("Cannot reach the lyrics service, retrying".to_string()));
        } else {
            self.set_status(Status::Fetching, None);
        }

        let request = self.fetch_request(key);
        self.pending_fetch = Some(request.clone());
        PollAction::Fetch(request)
    }

    fn fetch_request(&mut self, track_key: String) -> FetchRequest {
        self.next_request_id += 1;
        let (artists, title) = self
            .now_playing
            .as_ref()
            .map(|s| (s.artists(), s.title.clone()))
            .unwrap_or_default();
        FetchRequest {
            id: self.next_request_id,
            track_key,
            artists,
            title,
        }
    }

    fn on_nothing_playing(&mut self) {
        self.poll_failures = 0;
        self.fetch_failures = 0;
        self.progress.clear();
        self.sync.clear_active();
        self.scroll_to = None;
        self.sync_running = false;
        self.pending_fetch = None;
        self.failed_track = None;
        if self.store.clear() {
            self.touch();
        }
        if self.now_playing.take().is_some() {
            self.touch();
        }
        self.set_status(Status::NoPlayback, Some("Start playing something on your music service.".to_string()));
        self.minimize();
    }

    fn on_unauthorized(&mut self) {
        self.poll_failures = 0;
        self.sync_running = false;
        self.scroll_to = None;
        if self.now_playing.take().is_some() {
            self.touch();
        }
        self.set_status(
            Status::AuthRequired,
            Some("Press l to log in in your browser, then r to refresh.".to_string()),
        );
        self.minimize();
    }

    fn on_unreachable(&mut self, err: &PlaybackError) {
        self.poll_failures += 1;
        tracing::debug!(failures = self.poll_failures, error = %err, "playback poll failed");
        if self.poll_failures >= UNREACHABLE_NOTICE_AFTER {
            if self.poll_failures == UNREACHABLE_NOTICE_AFTER {
                tracing::warn!(error = %err, "playback source unreachable");
            }
            self.set_status(
                Status::Unreachable,
                Some("Cannot reach the playback server, retrying every 3s".to_string()),
            );
        }
    }

    // ------------------------------------------------------------------
    // Lyrics results
    // ------------------------------------------------------------------

    /// Apply the outcome of a lyrics lookup. Returns false when the result
    /// was superseded (a newer request, or the track changed meanwhile).
    pub fn commit_lyrics(&mut self, request: &FetchRequest, result: FetchResult, now: Instant) -> bool {
        if self.pending_fetch.as_ref().map(|p| p.id) != Some(request.id) {
            tracing::debug!(track = %request.track_key, "discarding superseded lyrics result");
            return false;
        }
        self.pending_fetch = None;

        if self.current_key().as_deref() != Some(request.track_key.as_str()) {
            tracing::debug!(track = %request.track_key, "track changed while fetching; discarding lyrics");
            return false;
        }

        match result {
            Ok(text) => match LyricsDocument::from_text(request.track_key.as_str(), &text) {
                Some(doc) => self.load_document(doc, now),
                None => self.fetch_failed(&request.track_key, &"empty lyrics"),
            },
            Err(e) if e.is_transient() => self.fetch_unreachable(&request.track_key, &e),
            Err(e) => self.fetch_failed(&request.track_key, &e),
        }
        true
    }

    /// Swap in a new document and reset sync state in one step.
    fn load_document(&mut self, doc: LyricsDocument, now: Instant) {
        tracing::info!(track = %doc.track_id(), lines = doc.len(), "lyrics loaded");
        let playing = self.is_playing();
        self.store.replace(doc);
        self.sync.reset_for_new_document(self.progress.estimate(now));
        self.overrides.cancel_cooldown();
        self.failed_track = None;
        self.fetch_failures = 0;
        self.sync_running = playing;
        self.set_status(if playing { Status::Playing } else { Status::Paused }, None);
        self.expand();
        self.touch();
        self.tick(now);
    }

    fn fetch_failed(&mut self, track_key: &str, reason: &dyn Display) {
        tracing::info!(track = %track_key, reason = %reason, "no lyrics for track");
        self.drop_document();
        self.failed_track = Some(track_key.to_string());
        self.sync_running = false;
        self.set_status(Status::FetchFailed, None);
        self.minimize();
    }

    fn fetch_unreachable(&mut self, track_key: &str, err: &LyricsError) {
        self.fetch_failures += 1;
        tracing::debug!(track = %track_key, failures = self.fetch_failures, error = %err, "lyrics lookup failed");

        if self.store.holds(track_key) {
            // Forced refresh of a loaded track; keep what we have.
            let playing = self.is_playing();
            self.sync_running = playing;
            self.set_status(if playing { Status::Playing } else { Status::Paused }, None);
            return;
        }

        self.drop_document();
        self.sync_running = false;
        if self.fetch_failures >= UNREACHABLE_NOTICE_AFTER {
            self.set_status(Status::Unreachable, Some("Cannot reach the lyrics service, retrying".to_string()));
        }
        self.minimize();
    }

    fn drop_document(&mut self) {
        if self.store.clear() {
            self.touch();
        }
        self.sync.clear_active();
        self.scroll_to = None;
    }

    // ------------------------------------------------------------------
    // Timers and gestures
    // ------------------------------------------------------------------

    /// Recompute the active line and the scroll target. Returns whether
    /// either changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let before = (self.sync.active_line_index(), self.scroll_to);
        let sample = ProgressSample {
            progress_ms: self.progress.estimate(now),
            duration_ms: self.progress.duration_ms(),
        };
        let line_count = self.synced_line_count();
        let active = sync::tick(&mut self.sync, sample, line_count);
        // Auto-scroll is paused along with playback.
        self.scroll_to = if self.sync_running {
            self.visibility.scroll_target(active, self.sync.auto_scroll_enabled)
        } else {
            None
        };

        let changed = before != (active, self.scroll_to);
        if changed {
            self.touch();
        }
        changed
    }

    /// Click-to-sync on `line`. Ticks immediately.
    pub fn click_line(&mut self, line: usize, now: Instant) -> bool {
        // Bring the sync state up to the latest sample first so the jump
        // lands exactly on the clicked line.
        self.tick(now);
        let line_count = self.synced_line_count();
        let duration = self.progress.duration_ms();
        if !self.overrides.click_to_sync(&mut self.sync, line, line_count, duration) {
            return false;
        }
        tracing::debug!(line, offset_ms = self.sync.manual_offset_ms, "synced to clicked line");
        self.touch();
        self.tick(now);
        true
    }

    /// User wheel input. Returns the cool-down deadline to arm.
    pub fn wheel(&mut self, delta_y: i32, now: Instant) -> Option<Instant> {
        let was_enabled = self.sync.auto_scroll_enabled;
        let deadline = self.overrides.wheel(&mut self.sync, delta_y, now)?;
        self.scroll_to = None;
        if was_enabled {
            self.touch();
        }
        Some(deadline)
    }

    /// Called when the cool-down timer fires.
    pub fn cooldown_elapsed(&mut self, now: Instant) -> bool {
        if !self.overrides.resume_due(&mut self.sync, now) {
            return false;
        }
        self.touch();
        if self.sync_running {
            self.tick(now);
        }
        true
    }

    pub fn adjust_speed(&mut self, steps: i32) -> f64 {
        let speed = adjust_speed(&mut self.sync, steps);
        tracing::debug!(speed, "sync speed changed");
        self.touch();
        speed
    }

    pub fn reset_speed(&mut self) {
        self.sync.sync_speed_multiplier = 1.0;
        self.touch();
    }

    // ------------------------------------------------------------------
    // Presentation
    // ------------------------------------------------------------------

    /// Snapshot of everything a presentation adapter needs.
    pub fn update(&self) -> Update {
        let lines = match (self.store.document(), self.synced_line_count()) {
            (Some(doc), n) if n > 0 => Arc::clone(doc.lines()),
            _ => Arc::new(Vec::new()),
        };
        let active = if lines.is_empty() { None } else { self.sync.active_line_index() };
        let title = match (&self.now_playing, self.status) {
            (Some(snap), _) => snap.display_title(),
            (None, Status::AuthRequired) => "Not authorized".to_string(),
            (None, Status::Idle) => String::new(),
            (None, _) => "Not playing".to_string(),
        };
        Update {
            title,
            status: self.status,
            notice: self.notice.clone(),
            classes: sync::classify(active, lines.len()),
            lines,
            active,
            scroll_to: if active.is_some() { self.scroll_to } else { None },
            minimized: self.visibility.is_minimized(),
            auto_scroll: self.sync.auto_scroll_enabled,
            speed: self.sync.sync_speed_multiplier,
            version: self.version,
        }
    }
}
