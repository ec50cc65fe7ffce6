// overrides.rs: User gestures that adjust synchronization

use crate::state::SyncState;
use crate::sync::line_start_ms;
use std::time::Duration;
use tokio::time::Instant;

pub const SPEED_STEP: f64 = 0.05;
pub const MIN_SPEED: f64 = 0.25;
pub const MAX_SPEED: f64 = 4.0;

/// Captures click-to-sync and wheel-scroll intent. Only ever writes
/// `SyncState`; the line store and progress tracker are read-only inputs.
#[derive(Debug)]
pub struct ManualOverride {
    cooldown: Duration,
    /// When auto-scroll comes back after the last wheel event.
    resume_at: Option<Instant>,
}

impl ManualOverride {
    pub fn new(cooldown: Duration) -> Self {
        Self { cooldown, resume_at: None }
    }

    pub fn resume_at(&self) -> Option<Instant> {
        self.resume_at
    }

    pub fn cancel_cooldown(&mut self) {
        self.resume_at = None;
    }

    /// Jump so that `line` becomes active: the offset is set (not
    /// accumulated) to whatever puts adjusted progress at the line start.
    /// Returns false when the click can't be applied.
    pub fn click_to_sync(&mut self, state: &mut SyncState, line: usize, line_count: usize, duration_ms: u64) -> bool {
        if line >= line_count || duration_ms == 0 {
            return false;
        }
        let target = line_start_ms(line, line_count, duration_ms);
        state.manual_offset_ms = target - state.current_progress_ms as f64;
        state.auto_scroll_enabled = true;
        self.resume_at = None;
        true
    }

    /// Suspend auto-scroll and push the cool-down out to `now + cooldown`.
    /// Returns the new deadline, or `None` for a zero delta.
    pub fn wheel(&mut self, state: &mut SyncState, delta_y: i32, now: Instant) -> Option<Instant> {
        if delta_y == 0 {
            return None;
        }
        state.auto_scroll_enabled = false;
        let deadline = now + self.cooldown;
        self.resume_at = Some(deadline);
        Some(deadline)
    }

    /// Re-enable auto-scroll if the cool-down has passed.
    pub fn resume_due(&mut self, state: &mut SyncState, now: Instant) -> bool {
        match self.resume_at {
            Some(at) if now >= at => {
                self.resume_at = None;
                state.auto_scroll_enabled = true;
                true
            }
            _ => false,
        }
    }
}

pub fn clamp_speed(speed: f64) -> f64 {
    if !speed.is_finite() {
        return 1.0;
    }
    speed.clamp(MIN_SPEED, MAX_SPEED)
}

/// Nudge the speed multiplier by `steps` increments of [`SPEED_STEP`].
pub fn adjust_speed(state: &mut SyncState, steps: i32) -> f64 {
    let raw = state.sync_speed_multiplier + steps as f64 * SPEED_STEP;
    // Keep the value on the step grid so repeated nudges return to 1.0.
    let snapped = (raw / SPEED_STEP).round() * SPEED_STEP;
    state.sync_speed_multiplier = clamp_speed(snapped);
    state.sync_speed_multiplier
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::{ProgressSample, tick};
    use crate::timer::SCROLL_COOLDOWN;

    #[test]
    fn click_makes_line_active_on_next_tick() {
        let mut ctl = ManualOverride::new(SCROLL_COOLDOWN);
        let mut state = SyncState::default();
        let sample = ProgressSample { progress_ms: 37_000, duration_ms: 200_000 };
        tick(&mut state, sample, 10);
        state.auto_scroll_enabled = false;
        for line in 0..10 {
            assert!(ctl.click_to_sync(&mut state, line, 10, 200_000));
            assert_eq!(tick(&mut state, sample, 10), Some(line));
            assert!(state.auto_scroll_enabled);
        }
    }

    #[test]
    fn click_replaces_offset_instead_of_adding() {
        let mut ctl = ManualOverride::new(SCROLL_COOLDOWN);
        let mut state = SyncState::default();
        state.current_progress_ms = 50_000;
        state.manual_offset_ms = 12_345.0;
        ctl.click_to_sync(&mut state, 0, 4, 100_000);
        assert_eq!(state.manual_offset_ms, -50_000.0);
    }

    #[test]
    fn invalid_clicks_are_ignored() {
        let mut ctl = ManualOverride::new(SCROLL_COOLDOWN);
        let mut state = SyncState::default();
        assert!(!ctl.click_to_sync(&mut state, 10, 10, 200_000));
        assert!(!ctl.click_to_sync(&mut state, 0, 10, 0));
        assert_eq!(state.manual_offset_ms, 0.0);
    }

    #[test]
    fn wheel_cooldown_restarts_on_each_event() {
        let mut ctl = ManualOverride::new(SCROLL_COOLDOWN);
        let mut state = SyncState::default();
        let t0 = Instant::now();
        assert!(ctl.wheel(&mut state, 3, t0).is_some());
        assert!(!state.auto_scroll_enabled);
        ctl.wheel(&mut state, -1, t0 + Duration::from_millis(1000));

        assert!(!ctl.resume_due(&mut state, t0 + Duration::from_millis(4000)));
        assert!(!state.auto_scroll_enabled);
        assert!(ctl.resume_due(&mut state, t0 + Duration::from_millis(5000)));
        assert!(state.auto_scroll_enabled);
        assert_eq!(ctl.resume_at(), None);
    }

    #[test]
    fn zero_wheel_delta_does_nothing() {
        let mut ctl = ManualOverride::new(SCROLL_COOLDOWN);
        let mut state = SyncState::default();
        assert_eq!(ctl.wheel(&mut state, 0, Instant::now()), None);
        assert!(state.auto_scroll_enabled);
    }

    #[test]
    fn click_cancels_pending_cooldown() {
        let mut ctl = ManualOverride::new(SCROLL_COOLDOWN);
        let mut state = SyncState::default();
        ctl.wheel(&mut state, 1, Instant::now());
        ctl.click_to_sync(&mut state, 1, 5, 1000);
        assert!(state.auto_scroll_enabled);
        assert_eq!(ctl.resume_at(), None);
    }

    #[test]
    fn speed_stays_within_bounds() {
        let mut state = SyncState::default();
        assert!((adjust_speed(&mut state, 2) - 1.1).abs() < 1e-9);
        assert!((adjust_speed(&mut state, -2) - 1.0).abs() < 1e-9);
        assert_eq!(adjust_speed(&mut state, -1000), MIN_SPEED);
        assert_eq!(adjust_speed(&mut state, 1000), MAX_SPEED);
        assert_eq!(clamp_speed(f64::NAN), 1.0);
    }
}
