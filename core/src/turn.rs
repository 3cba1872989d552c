//! Turn tracking — maps simulated time onto coarse turn indices.

use crate::types::{Millis, TurnIndex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnTracker {
    turn_duration_millis: Millis,
    current_turn:         TurnIndex,
    next_threshold:       TurnIndex,
}

impl TurnTracker {
    pub fn new(turn_duration_millis: Millis) -> Self {
        debug_assert!(turn_duration_millis > 0, "turn duration must be validated before use");
        Self {
            turn_duration_millis,
            current_turn:   0,
            next_threshold: 1,
        }
    }

    /// Turn index containing `millis`.
    pub fn turn_at(&self, millis: Millis) -> TurnIndex {
        millis / self.turn_duration_millis
    }

    /// Turn index containing a time given in seconds (truncated).
    pub fn turn_for_seconds(&self, seconds: f64) -> TurnIndex {
        (seconds * 1000.0 / self.turn_duration_millis as f64) as TurnIndex
    }

    /// Record the simulated time reached by a step.
    ///
    /// Returns the turn to announce when the step reached the next
    /// threshold. The threshold advances by exactly one per announcement,
    /// so each threshold fires once and in order.
    pub fn observe(&mut self, simulated_millis: Millis) -> Option<TurnIndex> {
        self.current_turn = self.turn_at(simulated_millis);
        if self.current_turn >= self.next_threshold {
            self.next_threshold += 1;
            Some(self.current_turn)
        } else {
            None
        }
    }

    pub fn turn_duration_millis(&self) -> Millis    { self.turn_duration_millis }
    pub fn current_turn(&self)         -> TurnIndex { self.current_turn }
    pub fn next_threshold(&self)       -> TurnIndex { self.next_threshold }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_fires_once_per_threshold() {
        let mut turns = TurnTracker::new(250);

        let fired: Vec<_> = (1..=31u64).filter_map(|i| turns.observe(i * 33)).collect();

        assert_eq!(fired, vec![1, 2, 3, 4]);
        assert_eq!(turns.current_turn(), 4, "1023ms is in turn 4");
        assert_eq!(turns.next_threshold(), 5);
    }

    #[test]
    fn no_boundary_inside_first_turn() {
        let mut turns = TurnTracker::new(250);
        for ms in [33, 66, 99, 132, 165, 198, 231] {
            assert_eq!(turns.observe(ms), None, "{ms}ms should still be turn 0");
        }
        assert_eq!(turns.observe(264), Some(1));
    }

    #[test]
    fn step_longer_than_turn_announces_current_turn() {
        let mut turns = TurnTracker::new(250);
        assert_eq!(turns.observe(600), Some(2));
        assert_eq!(turns.next_threshold(), 2);
        assert_eq!(turns.observe(1200), Some(4));
        assert_eq!(turns.next_threshold(), 3);
    }

    #[test]
    fn turn_for_seconds_truncates() {
        let turns = TurnTracker::new(250);
        assert_eq!(turns.turn_for_seconds(0.0), 0);
        assert_eq!(turns.turn_for_seconds(0.249), 0);
        assert_eq!(turns.turn_for_seconds(1.0), 4);
        assert_eq!(turns.turn_for_seconds(1.3), 5);
    }
}
