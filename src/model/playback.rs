//! Playback-related types and the transport state machine

use std::collections::VecDeque;

use rand::Rng;

use super::types::{RepeatState, Song};

/// Upper bound on remembered play positions; oldest entries fall off first.
pub const HISTORY_LIMIT: usize = 50;

/// What a transport command decided to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// Move to this view index. `record` is false when replaying history
    /// (shuffle "previous"), which must not extend the history.
    Play { index: usize, record: bool },
    /// Restart the current track from the top (repeat-one).
    Restart,
    /// Nothing to do.
    None,
}

/// Transport state: the current position in the active view, shuffle and
/// repeat modes, and the bounded history that backs "previous" in shuffle
/// mode.
///
/// The position is an index into the active view and is dropped whenever
/// the view is rebuilt. History entries can therefore refer to a view that
/// no longer exists; `previous_transition` treats any entry outside the
/// current view as absent.
#[derive(Debug, Default)]
pub struct PlaybackState {
    current: Option<usize>,
    shuffle: bool,
    repeat: RepeatState,
    history: VecDeque<usize>,
}

impl PlaybackState {
    pub fn current(&self) -> Option<usize> {
        self.current
    }

    pub fn shuffle(&self) -> bool {
        self.shuffle
    }

    pub fn set_shuffle(&mut self, shuffle: bool) {
        self.shuffle = shuffle;
    }

    pub fn repeat(&self) -> RepeatState {
        self.repeat
    }

    pub fn set_repeat(&mut self, repeat: RepeatState) {
        self.repeat = repeat;
    }

    /// Make `index` current and remember it. A consecutive duplicate is not
    /// recorded twice, and the history is capped at [`HISTORY_LIMIT`].
    pub fn record_play(&mut self, index: usize) {
        self.current = Some(index);
        if self.history.back() == Some(&index) {
            return;
        }
        if self.history.len() >= HISTORY_LIMIT {
            self.history.pop_front();
        }
        self.history.push_back(index);
    }

    /// Move to `index` without touching the history (history replay).
    pub fn replay(&mut self, index: usize) {
        self.current = Some(index);
    }

    /// Drop the current position. Called whenever the active view is
    /// rebuilt, since indices into the old view mean nothing against the
    /// new one.
    pub fn invalidate_position(&mut self) {
        self.current = None;
    }

    /// Advance rules, shared by the next command and track-ended
    /// auto-advance:
    /// repeat-one restarts the same track; shuffle draws a uniform random
    /// index, re-drawing while it lands on the current one (when there is
    /// anywhere else to go); sequential walks forward, wrapping under
    /// repeat-all and stopping at the end otherwise.
    pub fn next_transition(&self, view_len: usize, rng: &mut impl Rng) -> Transition {
        if view_len == 0 {
            return Transition::None;
        }
        if self.repeat == RepeatState::One {
            return match self.current {
                Some(_) => Transition::Restart,
                None => Transition::None,
            };
        }
        if self.shuffle {
            let mut pick = rng.random_range(0..view_len);
            if let Some(current) = self.current {
                while view_len > 1 && pick == current {
                    pick = rng.random_range(0..view_len);
                }
            }
            return Transition::Play { index: pick, record: true };
        }
        match self.current {
            None => Transition::Play { index: 0, record: true },
            Some(current) => {
                let next = current + 1;
                if next < view_len {
                    Transition::Play { index: next, record: true }
                } else if self.repeat == RepeatState::All {
                    Transition::Play { index: 0, record: true }
                } else {
                    Transition::None
                }
            }
        }
    }

    /// Step-back rules: shuffle replays the history entry preceding the
    /// last occurrence of the current index, without extending the history;
    /// sequential steps to the previous index, wrapping to the end. A no-op
    /// when nothing has been played yet or the history is empty.
    pub fn previous_transition(&self, view_len: usize) -> Transition {
        let Some(current) = self.current else {
            return Transition::None;
        };
        if view_len == 0 || self.history.is_empty() || current >= view_len {
            return Transition::None;
        }
        if self.shuffle {
            return match self.history_predecessor(current) {
                Some(prev) if prev < view_len => Transition::Play { index: prev, record: false },
                _ => Transition::None,
            };
        }
        let target = if current == 0 { view_len - 1 } else { current - 1 };
        Transition::Play { index: target, record: true }
    }

    /// The entry just before the last occurrence of `current` in history.
    fn history_predecessor(&self, current: usize) -> Option<usize> {
        let pos = self.history.iter().rposition(|&i| i == current)?;
        if pos == 0 {
            return None;
        }
        self.history.get(pos - 1).copied()
    }
}

/// State of the track currently loaded into the audio output
#[derive(Clone, Debug, Default)]
pub struct NowPlaying {
    pub song: Option<Song>,
    pub position_ms: u64,
    pub duration_ms: Option<u64>,
    pub is_playing: bool,
}

/// Complete playback information for rendering the UI
#[derive(Clone, Debug, Default)]
pub struct PlaybackInfo {
    pub track: Option<Song>,
    pub position_ms: u64,
    pub duration_ms: Option<u64>,
    pub is_playing: bool,
    pub shuffle: bool,
    pub repeat: RepeatState,
    pub volume: u8,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn history_of(state: &PlaybackState) -> Vec<usize> {
        state.history.iter().copied().collect()
    }

    #[test]
    fn record_play_sets_current_and_history() {
        let mut state = PlaybackState::default();
        state.record_play(2);
        assert_eq!(state.current(), Some(2));
        assert_eq!(history_of(&state), [2]);
    }

    #[test]
    fn record_play_skips_consecutive_duplicates() {
        let mut state = PlaybackState::default();
        state.record_play(1);
        state.record_play(1);
        state.record_play(3);
        state.record_play(1);
        assert_eq!(history_of(&state), [1, 3, 1]);
    }

    #[test]
    fn history_is_capped_evicting_oldest() {
        let mut state = PlaybackState::default();
        for i in 0..HISTORY_LIMIT + 10 {
            state.record_play(i);
        }
        assert_eq!(state.history.len(), HISTORY_LIMIT);
        assert_eq!(state.history.front(), Some(&10));
        assert_eq!(state.history.back(), Some(&(HISTORY_LIMIT + 9)));
    }

    #[test]
    fn sequential_next_advances_by_one() {
        let mut state = PlaybackState::default();
        state.record_play(1);
        assert_eq!(
            state.next_transition(5, &mut rng()),
            Transition::Play { index: 2, record: true }
        );
    }

    #[test]
    fn sequential_next_wraps_under_repeat_all() {
        let mut state = PlaybackState::default();
        state.set_repeat(RepeatState::All);
        state.record_play(4);
        assert_eq!(
            state.next_transition(5, &mut rng()),
            Transition::Play { index: 0, record: true }
        );
    }

    #[test]
    fn sequential_next_stops_at_end_with_repeat_off() {
        let mut state = PlaybackState::default();
        state.record_play(4);
        assert_eq!(state.next_transition(5, &mut rng()), Transition::None);
        assert_eq!(state.current(), Some(4));
    }

    #[test]
    fn repeat_one_restarts_without_touching_history() {
        let mut state = PlaybackState::default();
        state.set_repeat(RepeatState::One);
        state.record_play(3);
        let before = state.history.clone();
        assert_eq!(state.next_transition(5, &mut rng()), Transition::Restart);
        assert_eq!(state.current(), Some(3));
        assert_eq!(state.history, before);
    }

    #[test]
    fn repeat_one_with_nothing_playing_is_a_noop() {
        let state = PlaybackState {
            repeat: RepeatState::One,
            ..Default::default()
        };
        assert_eq!(state.next_transition(5, &mut rng()), Transition::None);
    }

    #[test]
    fn shuffle_next_never_repeats_current_when_avoidable() {
        let mut state = PlaybackState::default();
        state.set_shuffle(true);
        state.record_play(2);
        let mut rng = rng();
        for _ in 0..200 {
            match state.next_transition(4, &mut rng) {
                Transition::Play { index, record: true } => assert_ne!(index, 2),
                other => panic!("unexpected transition: {other:?}"),
            }
        }
    }

    #[test]
    fn shuffle_next_with_single_track_may_repeat() {
        let mut state = PlaybackState::default();
        state.set_shuffle(true);
        state.record_play(0);
        assert_eq!(
            state.next_transition(1, &mut rng()),
            Transition::Play { index: 0, record: true }
        );
    }

    #[test]
    fn next_on_empty_view_is_a_noop() {
        let state = PlaybackState::default();
        assert_eq!(state.next_transition(0, &mut rng()), Transition::None);
    }

    #[test]
    fn next_with_no_position_starts_from_the_top() {
        let state = PlaybackState::default();
        assert_eq!(
            state.next_transition(3, &mut rng()),
            Transition::Play { index: 0, record: true }
        );
    }

    #[test]
    fn sequential_previous_wraps_from_zero() {
        let mut state = PlaybackState::default();
        state.record_play(0);
        assert_eq!(
            state.previous_transition(5),
            Transition::Play { index: 4, record: true }
        );
    }

    #[test]
    fn shuffle_previous_replays_history_without_extending_it() {
        let mut state = PlaybackState::default();
        state.set_shuffle(true);
        state.record_play(0);
        state.record_play(2);
        state.record_play(1);
        assert_eq!(
            state.previous_transition(5),
            Transition::Play { index: 2, record: false }
        );
        // Stepping back is a replay; the history stays as played.
        state.replay(2);
        assert_eq!(history_of(&state), [0, 2, 1]);
        assert_eq!(
            state.previous_transition(5),
            Transition::Play { index: 0, record: false }
        );
    }

    #[test]
    fn shuffle_previous_without_predecessor_is_a_noop() {
        let mut state = PlaybackState::default();
        state.set_shuffle(true);
        state.record_play(3);
        assert_eq!(state.previous_transition(5), Transition::None);
    }

    #[test]
    fn previous_with_no_position_or_history_is_a_noop() {
        let state = PlaybackState::default();
        assert_eq!(state.previous_transition(5), Transition::None);

        let stale = PlaybackState {
            current: Some(1),
            ..Default::default()
        };
        assert_eq!(stale.previous_transition(5), Transition::None);
    }

    #[test]
    fn shuffle_previous_ignores_entries_outside_the_view() {
        let mut state = PlaybackState::default();
        state.set_shuffle(true);
        state.record_play(9);
        state.record_play(1);
        // The view has shrunk since index 9 was played.
        assert_eq!(state.previous_transition(3), Transition::None);
    }
}
