use crate::playback::PlaybackSnapshot;
use futures_util::future::pending;
use std::pin::Pin;
use std::time::Duration;
use tokio::time::{Instant, Interval, MissedTickBehavior, Sleep, interval_at, sleep_until};

/// How often the playback source is queried.
pub const POLL_INTERVAL: Duration = Duration::from_millis(3000);
/// How often the active line is recomputed while playing.
pub const SYNC_INTERVAL: Duration = Duration::from_millis(300);
/// Quiet period after the last wheel event before auto-scroll resumes.
pub const SCROLL_COOLDOWN: Duration = Duration::from_millis(4000);

/// Latest known playback progress.
///
/// By default there is no free-running clock: the position is the last
/// observed sample, so a failed poll freezes apparent progress. With
/// interpolation enabled, the time elapsed since the sample is added while
/// the sample says the track is playing.
#[derive(Debug, Default, PartialEq)]
pub struct ProgressTracker {
    progress_ms: u64,
    previous_ms: u64,
    duration_ms: u64,
    playing: bool,
    /// Monotonic instant corresponding to `progress_ms`.
    observed_at: Option<Instant>,
    interpolate: bool,
}

impl ProgressTracker {
    pub fn new(interpolate: bool) -> Self {
        Self {
            interpolate,
            ..Self::default()
        }
    }

    /// Record a snapshot as the new ground truth, shifting the previous one
    /// into the delta slot.
    pub fn observe(&mut self, snapshot: &PlaybackSnapshot, now: Instant) {
        self.previous_ms = self.progress_ms;
        self.progress_ms = snapshot.progress_ms;
        self.duration_ms = snapshot.duration_ms;
        self.playing = snapshot.is_playing;
        self.observed_at = Some(now);
    }

    /// Forget everything; used when nothing is playing.
    pub fn clear(&mut self) {
        *self = Self::new(self.interpolate);
    }

    #[cfg(test)]
    pub fn progress_ms(&self) -> u64 {
        self.progress_ms
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn elapsed_since_last_sample(&self) -> u64 {
        self.progress_ms.saturating_sub(self.previous_ms)
    }

    pub fn estimate(&self, now: Instant) -> u64 {
        if !self.interpolate || !self.playing {
            return self.progress_ms;
        }
        let Some(at) = self.observed_at else {
            return self.progress_ms;
        };
        let elapsed = now.saturating_duration_since(at).as_millis() as u64;
        let estimate = self.progress_ms.saturating_add(elapsed);
        if self.duration_ms > 0 {
            estimate.min(self.duration_ms)
        } else {
            estimate
        }
    }
}

/// Repeating sync timer that can be stopped and restarted.
///
/// Stopping drops the underlying interval, so no tick fires after `stop`
/// until `start` is called again. A tick that is already being handled is
/// unaffected.
#[derive(Debug)]
pub struct SyncTimer {
    period: Duration,
    interval: Option<Interval>,
}

impl SyncTimer {
    pub fn new(period: Duration) -> Self {
        Self { period, interval: None }
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.interval.is_some()
    }

    pub fn start(&mut self) {
        if self.interval.is_none() {
            let mut iv = interval_at(Instant::now() + self.period, self.period);
            iv.set_missed_tick_behavior(MissedTickBehavior::Delay);
            self.interval = Some(iv);
        }
    }

    pub fn stop(&mut self) {
        self.interval = None;
    }

    pub fn set_running(&mut self, running: bool) {
        if running {
            self.start();
        } else {
            self.stop();
        }
    }

    /// Resolves on the next tick; never resolves while stopped.
    pub async fn tick(&mut self) -> Instant {
        match self.interval.as_mut() {
            Some(iv) => iv.tick().await,
            None => pending().await,
        }
    }
}

/// One-shot resettable deadline used for the wheel cool-down.
#[derive(Debug, Default)]
pub struct Cooldown {
    sleep: Option<Pin<Box<Sleep>>>,
}

impl Cooldown {
    /// Cancel any pending deadline and arm a new one.
    pub fn restart(&mut self, deadline: Instant) {
        match self.sleep.as_mut() {
            Some(s) => s.as_mut().reset(deadline),
            None => self.sleep = Some(Box::pin(sleep_until(deadline))),
        }
    }

    pub fn cancel(&mut self) {
        self.sleep = None;
    }

    #[cfg(test)]
    pub fn is_armed(&self) -> bool {
        self.sleep.is_some()
    }

    /// Resolves once when the armed deadline passes; never while disarmed.
    pub async fn expired(&mut self) {
        match self.sleep.as_mut() {
            Some(s) => {
                s.as_mut().await;
                self.sleep = None;
            }
            None => pending().await,
        }
    }
}
