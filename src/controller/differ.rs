//! # Change Detection
//!
//! Decides which parts of a new reading are worth forwarding to the virtual
//! device. Sticks and triggers are compared against the last committed values
//! with a coarse threshold to swallow ADC jitter; buttons are forwarded on
//! every edge.

use super::state::{Button, NormalizedState, SentState};
use crate::config::SessionConfig;

/// Which device writes a new reading calls for.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChangeSet {
    /// Push both stick pairs
    pub sticks: bool,
    /// Push both triggers
    pub triggers: bool,
    /// Buttons whose state flipped, with the new state
    pub buttons: Vec<(Button, bool)>,
}

impl ChangeSet {
    /// True when no device write is due.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.sticks && !self.triggers && self.buttons.is_empty()
    }
}

/// Threshold-based comparison of new readings against [`SentState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateDiffer {
    stick_threshold: i32,
    trigger_threshold: i32,
}

impl Default for StateDiffer {
    fn default() -> Self {
        Self::from_config(&SessionConfig::default())
    }
}

impl StateDiffer {
    #[must_use]
    pub fn new(stick_threshold: i32, trigger_threshold: i32) -> Self {
        Self {
            stick_threshold,
            trigger_threshold,
        }
    }

    #[must_use]
    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.stick_change_threshold, config.trigger_change_threshold)
    }

    /// True if any of the four axes moved more than the stick threshold.
    ///
    /// Each axis is compared with the same axis of the last committed state;
    /// a single axis crossing is enough to resend all four.
    #[must_use]
    pub fn should_update_sticks(&self, new: &NormalizedState, last: &NormalizedState) -> bool {
        new.sticks()
            .iter()
            .zip(last.sticks().iter())
            .any(|(n, l)| (n - l).abs() > self.stick_threshold)
    }

    /// True if either trigger moved more than the trigger threshold.
    #[must_use]
    pub fn should_update_triggers(&self, new: &NormalizedState, last: &NormalizedState) -> bool {
        new.triggers()
            .iter()
            .zip(last.triggers().iter())
            .any(|(n, l)| (n - l).abs() > self.trigger_threshold)
    }

    /// True if the button differs from its last committed state.
    #[must_use]
    pub fn button_changed(&self, button: Button, new: &NormalizedState, last: &NormalizedState) -> bool {
        new.button(button) != last.button(button)
    }

    /// Collects every pending write for `new` against `sent`.
    #[must_use]
    pub fn diff(&self, new: &NormalizedState, sent: &SentState) -> ChangeSet {
        let last = sent.state();
        ChangeSet {
            sticks: self.should_update_sticks(new, last),
            triggers: self.should_update_triggers(new, last),
            buttons: Button::ALL
                .iter()
                .filter(|&&button| self.button_changed(button, new, last))
                .map(|&button| (button, new.button(button)))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(sticks: [i32; 4], triggers: [i32; 2]) -> NormalizedState {
        NormalizedState {
            lx: sticks[0],
            ly: sticks[1],
            rx: sticks[2],
            ry: sticks[3],
            lt: triggers[0],
            rt: triggers[1],
            buttons: [false; 6],
        }
    }

    #[test]
    fn test_stick_threshold_is_exclusive() {
        let differ = StateDiffer::default();
        let last = state([0, 0, 0, 0], [0, 0]);

        assert!(!differ.should_update_sticks(&state([1000, 0, 0, 0], [0, 0]), &last));
        assert!(differ.should_update_sticks(&state([1001, 0, 0, 0], [0, 0]), &last));
        assert!(differ.should_update_sticks(&state([0, 0, 0, -1001], [0, 0]), &last));
    }

    #[test]
    fn test_stick_comparison_is_same_axis() {
        let differ = StateDiffer::default();
        let last = state([5000, -5000, 20000, -20000], [0, 0]);

        // Same values on the same axes: nothing to send
        assert!(!differ.should_update_sticks(&last, &last));

        // Swapping two axes is a real change even though the multiset matches
        let swapped = state([-5000, 5000, 20000, -20000], [0, 0]);
        assert!(differ.should_update_sticks(&swapped, &last));
    }

    #[test]
    fn test_any_single_axis_triggers_update() {
        let differ = StateDiffer::default();
        let last = state([0, 0, 0, 0], [0, 0]);
        for axis in 0..4 {
            let mut sticks = [0; 4];
            sticks[axis] = 2000;
            assert!(differ.should_update_sticks(&state(sticks, [0, 0]), &last), "axis {}", axis);
        }
    }

    #[test]
    fn test_trigger_threshold() {
        let differ = StateDiffer::default();
        let last = state([0; 4], [100, 100]);

        assert!(!differ.should_update_triggers(&state([0; 4], [105, 95]), &last));
        assert!(differ.should_update_triggers(&state([0; 4], [106, 100]), &last));
        assert!(differ.should_update_triggers(&state([0; 4], [100, 94]), &last));
    }

    #[test]
    fn test_button_edges() {
        let differ = StateDiffer::default();
        let mut new = NormalizedState::default();
        new.buttons[Button::B.index()] = true;

        let mut sent = SentState::new();
        sent.commit_button(Button::X, true);

        let changes = differ.diff(&new, &sent);
        assert_eq!(changes.buttons, vec![(Button::X, false), (Button::B, true)]);
        assert!(!changes.sticks);
        assert!(!changes.triggers);
        assert!(!changes.is_empty());
    }

    #[test]
    fn test_identical_state_has_no_changes() {
        let differ = StateDiffer::default();
        let new = state([1234, -4321, 999, 0], [50, 200]);
        let mut sent = SentState::new();
        sent.commit_sticks(&new);
        sent.commit_triggers(&new);

        assert!(differ.diff(&new, &sent).is_empty());
    }

    #[test]
    fn test_custom_thresholds() {
        let differ = StateDiffer::new(0, 0);
        let last = NormalizedState::default();
        assert!(differ.should_update_sticks(&state([1, 0, 0, 0], [0, 0]), &last));
        assert!(differ.should_update_triggers(&state([0; 4], [0, 1]), &last));
    }
}
