//! Sync calculator: maps tracked progress plus manual offset onto a lyric line.
//!
//! Lyrics here carry no timestamps, so the active line is a proportional
//! position: `floor(adjusted / duration * line_count)`. The speed multiplier
//! folds extra (or missing) time into the manual offset on every forward
//! step of progress, so its effect accumulates and persists until the offset
//! is reset by a new document or a click-to-sync.

use crate::state::SyncState;

/// Absorbs float rounding so that `i / n * D` maps back onto line `i`.
const INDEX_EPSILON: f64 = 1e-9;

/// Relation of a line to the active one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineClass {
    Past,
    Active,
    Future,
}

/// Progress and duration the calculator runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSample {
    pub progress_ms: u64,
    pub duration_ms: u64,
}

/// Recompute the active line. Returns the new index, or `None` (leaving the
/// state untouched apart from clearing the index) when there are no lines or
/// no duration to sync against.
pub fn tick(state: &mut SyncState, sample: ProgressSample, line_count: usize) -> Option<usize> {
    if line_count == 0 || sample.duration_ms == 0 {
        state.clear_active();
        return None;
    }

    state.current_progress_ms = sample.progress_ms;
    let delta = state.current_progress_ms as f64 - state.last_progress_ms as f64;
    if delta > 0.0 {
        state.manual_offset_ms += delta * (state.sync_speed_multiplier - 1.0);
    }
    state.last_progress_ms = state.current_progress_ms;

    let adjusted = state.current_progress_ms as f64 + state.manual_offset_ms;
    let index = active_index(adjusted, sample.duration_ms, line_count);
    state.active_line_index = Some(index);
    Some(index)
}

/// Index of the line at `adjusted_ms`, clamped into `[0, line_count - 1]`.
pub fn active_index(adjusted_ms: f64, duration_ms: u64, line_count: usize) -> usize {
    debug_assert!(line_count > 0 && duration_ms > 0);
    let mut fraction = adjusted_ms / duration_ms as f64;
    if !fraction.is_finite() {
        fraction = 0.0;
    }
    let fraction = fraction.clamp(0.0, 1.0);
    let index = (fraction * line_count as f64 + INDEX_EPSILON).floor() as usize;
    index.min(line_count - 1)
}

/// Progress (ms) at which line `line` starts.
pub fn line_start_ms(line: usize, line_count: usize, duration_ms: u64) -> f64 {
    (line as f64 / line_count as f64) * duration_ms as f64
}

/// Classify every line relative to `active`. With no active line nothing
/// is highlighted and everything counts as upcoming.
pub fn classify(active: Option<usize>, line_count: usize) -> Vec<LineClass> {
    (0..line_count)
        .map(|i| match active {
            Some(a) if i < a => LineClass::Past,
            Some(a) if i == a => LineClass::Active,
            _ => LineClass::Future,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(progress_ms: u64) -> ProgressSample {
        ProgressSample { progress_ms, duration_ms: 200_000 }
    }

    #[test]
    fn neutral_speed_never_drifts() {
        let mut state = SyncState::default();
        for p in (0..=200_000).step_by(3000) {
            tick(&mut state, sample(p), 10);
            assert_eq!(state.manual_offset_ms, 0.0);
        }
    }

    #[test]
    fn proportional_line_selection() {
        let mut state = SyncState::default();
        assert_eq!(tick(&mut state, sample(0), 10), Some(0));
        assert_eq!(tick(&mut state, sample(100_000), 10), Some(5));
        assert_eq!(tick(&mut state, sample(200_000), 10), Some(9));
    }

    #[test]
    fn faster_speed_accumulates_offset() {
        let mut state = SyncState::with_speed(1.5);
        tick(&mut state, sample(0), 10);
        tick(&mut state, sample(10_000), 10);
        assert_eq!(state.manual_offset_ms, 5000.0);
        // Going backwards (a seek) adds nothing and the drift persists.
        tick(&mut state, sample(4000), 10);
        assert_eq!(state.manual_offset_ms, 5000.0);
        assert_eq!(state.last_progress_ms, 4000);
    }

    #[test]
    fn slower_speed_retards_position() {
        let mut state = SyncState::with_speed(0.5);
        tick(&mut state, sample(0), 10);
        tick(&mut state, sample(40_000), 10);
        assert_eq!(state.manual_offset_ms, -20_000.0);
        assert_eq!(state.active_line_index(), Some(1));
    }

    #[test]
    fn index_is_clamped_outside_track_bounds() {
        for adjusted in [-1e12, -1.0, 0.0, 199_999.0, 200_000.0, 250_000.0, 1e12, f64::NAN] {
            let idx = active_index(adjusted, 200_000, 7);
            assert!(idx < 7, "{adjusted} -> {idx}");
        }
        assert_eq!(active_index(-5000.0, 200_000, 7), 0);
        assert_eq!(active_index(900_000.0, 200_000, 7), 6);
    }

    #[test]
    fn line_starts_map_back_to_their_line() {
        for n in 1..40usize {
            for d in [1u64, 999, 200_001, 187_333, 3_600_000] {
                for i in 0..n {
                    assert_eq!(active_index(line_start_ms(i, n, d), d, n), i, "i={i} n={n} d={d}");
                }
            }
        }
    }

    #[test]
    fn nothing_to_sync_is_a_no_op() {
        let mut state = SyncState::default();
        state.active_line_index = Some(2);
        assert_eq!(tick(&mut state, sample(50_000), 0), None);
        assert_eq!(state.active_line_index(), None);
        assert_eq!(state.current_progress_ms, 0);
        let zero = ProgressSample { progress_ms: 50_000, duration_ms: 0 };
        assert_eq!(tick(&mut state, zero, 10), None);
        assert_eq!(state.last_progress_ms, 0);
    }

    #[test]
    fn exactly_one_active_line() {
        let classes = classify(Some(2), 5);
        assert_eq!(
            classes,
            vec![LineClass::Past, LineClass::Past, LineClass::Active, LineClass::Future, LineClass::Future]
        );
        assert!(classify(None, 3).iter().all(|c| *c == LineClass::Future));
        assert!(classify(Some(0), 0).is_empty());
    }
}
