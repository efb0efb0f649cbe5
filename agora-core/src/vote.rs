//! Vote transition state machine
//!
//! Given the current vote state for a (voter, votable) pair and a requested
//! action, computes the next ledger state and the counter deltas to apply.
//! The table is the single source of truth for vote semantics; the storage
//! layer applies the returned deltas verbatim inside one transaction and
//! must not do its own arithmetic.
//!
//! Karma deltas apply to the *votable's author*, never the voter.

use crate::VoteKind;
use serde::{Deserialize, Serialize};

// ============================================================================
// STATES
// ============================================================================

/// Ledger state of a (voter, votable) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum VoteState {
    /// No ledger row exists for the pair.
    #[default]
    NoVote,
    /// A ledger row with kind `up` exists.
    Upvoted,
    /// A ledger row with kind `down` exists.
    Downvoted,
}

impl VoteState {
    /// The ledger row kind backing this state, if any.
    pub fn record_kind(&self) -> Option<VoteKind> {
        match self {
            VoteState::NoVote => None,
            VoteState::Upvoted => Some(VoteKind::Up),
            VoteState::Downvoted => Some(VoteKind::Down),
        }
    }
}

impl From<Option<VoteKind>> for VoteState {
    /// State as read back from the ledger: the row's kind, or `NoVote`
    /// when no row exists.
    fn from(kind: Option<VoteKind>) -> Self {
        match kind {
            None => VoteState::NoVote,
            Some(VoteKind::Up) => VoteState::Upvoted,
            Some(VoteKind::Down) => VoteState::Downvoted,
        }
    }
}

// ============================================================================
// TRANSITIONS
// ============================================================================

/// Outcome of one vote transition: the next ledger state plus the signed
/// deltas to apply to the votable's counters and the author's karma.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTransition {
    pub next: VoteState,
    pub upvote_delta: i32,
    pub downvote_delta: i32,
    pub karma_delta: i32,
}

impl VoteTransition {
    /// Whether the transition removes the ledger row (a retraction).
    pub fn is_retraction(&self) -> bool {
        self.next == VoteState::NoVote
    }

    /// Contribution of this transition to the votable's net score.
    pub fn net_delta(&self) -> i32 {
        self.upvote_delta - self.downvote_delta
    }
}

/// The transition table. Casting the same direction twice retracts the
/// vote; casting the opposite direction switches it in place.
///
/// | current \ action | up                        | down                        |
/// |------------------|---------------------------|-----------------------------|
/// | NoVote           | Upvoted; +1 up; karma +1  | Downvoted; +1 down; karma −1 |
/// | Upvoted          | NoVote; −1 up; karma −1   | Downvoted; −1 up +1 down; karma −2 |
/// | Downvoted        | Upvoted; −1 down +1 up; karma +2 | NoVote; −1 down; karma +1 |
pub fn transition(current: VoteState, action: VoteKind) -> VoteTransition {
    match (current, action) {
        (VoteState::NoVote, VoteKind::Up) => VoteTransition {
            next: VoteState::Upvoted,
            upvote_delta: 1,
            downvote_delta: 0,
            karma_delta: 1,
        },
        (VoteState::NoVote, VoteKind::Down) => VoteTransition {
            next: VoteState::Downvoted,
            upvote_delta: 0,
            downvote_delta: 1,
            karma_delta: -1,
        },
        (VoteState::Upvoted, VoteKind::Up) => VoteTransition {
            next: VoteState::NoVote,
            upvote_delta: -1,
            downvote_delta: 0,
            karma_delta: -1,
        },
        (VoteState::Upvoted, VoteKind::Down) => VoteTransition {
            next: VoteState::Downvoted,
            upvote_delta: -1,
            downvote_delta: 1,
            karma_delta: -2,
        },
        (VoteState::Downvoted, VoteKind::Up) => VoteTransition {
            next: VoteState::Upvoted,
            upvote_delta: 1,
            downvote_delta: -1,
            karma_delta: 2,
        },
        (VoteState::Downvoted, VoteKind::Down) => VoteTransition {
            next: VoteState::NoVote,
            upvote_delta: 0,
            downvote_delta: -1,
            karma_delta: 1,
        },
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Reference accumulator: applies transitions to in-memory counters the
    /// way the storage layer applies them to rows.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
    struct Tally {
        state: VoteState,
        upvotes: i32,
        downvotes: i32,
        karma: i32,
    }

    impl Tally {
        fn apply(&mut self, action: VoteKind) -> VoteTransition {
            let t = transition(self.state, action);
            self.state = t.next;
            self.upvotes += t.upvote_delta;
            self.downvotes += t.downvote_delta;
            self.karma += t.karma_delta;
            t
        }
    }

    #[test]
    fn test_first_upvote() {
        let t = transition(VoteState::NoVote, VoteKind::Up);
        assert_eq!(t.next, VoteState::Upvoted);
        assert_eq!((t.upvote_delta, t.downvote_delta, t.karma_delta), (1, 0, 1));
    }

    #[test]
    fn test_first_downvote() {
        let t = transition(VoteState::NoVote, VoteKind::Down);
        assert_eq!(t.next, VoteState::Downvoted);
        assert_eq!((t.upvote_delta, t.downvote_delta, t.karma_delta), (0, 1, -1));
    }

    #[test]
    fn test_upvote_retracts_upvote() {
        let t = transition(VoteState::Upvoted, VoteKind::Up);
        assert!(t.is_retraction());
        assert_eq!((t.upvote_delta, t.downvote_delta, t.karma_delta), (-1, 0, -1));
    }

    #[test]
    fn test_downvote_retracts_downvote() {
        let t = transition(VoteState::Downvoted, VoteKind::Down);
        assert!(t.is_retraction());
        assert_eq!((t.upvote_delta, t.downvote_delta, t.karma_delta), (0, -1, 1));
    }

    #[test]
    fn test_switch_up_to_down() {
        let t = transition(VoteState::Upvoted, VoteKind::Down);
        assert_eq!(t.next, VoteState::Downvoted);
        assert_eq!((t.upvote_delta, t.downvote_delta, t.karma_delta), (-1, 1, -2));
    }

    #[test]
    fn test_switch_down_to_up() {
        let t = transition(VoteState::Downvoted, VoteKind::Up);
        assert_eq!(t.next, VoteState::Upvoted);
        assert_eq!((t.upvote_delta, t.downvote_delta, t.karma_delta), (1, -1, 2));
    }

    #[test]
    fn test_double_upvote_is_net_zero() {
        let mut tally = Tally::default();
        tally.apply(VoteKind::Up);
        tally.apply(VoteKind::Up);
        assert_eq!(tally, Tally::default());
    }

    #[test]
    fn test_state_round_trips_through_record_kind() {
        for state in [VoteState::NoVote, VoteState::Upvoted, VoteState::Downvoted] {
            assert_eq!(VoteState::from(state.record_kind()), state);
        }
    }

    /// Scenario from the vote semantics: (0,0) → A up → (1,0) karma +1 →
    /// A down → (0,1) karma −1 → A down again → (0,0) karma 0.
    #[test]
    fn test_up_down_down_scenario() {
        let mut tally = Tally::default();

        tally.apply(VoteKind::Up);
        assert_eq!((tally.upvotes, tally.downvotes, tally.karma), (1, 0, 1));

        tally.apply(VoteKind::Down);
        assert_eq!((tally.upvotes, tally.downvotes, tally.karma), (0, 1, -1));

        tally.apply(VoteKind::Down);
        assert_eq!((tally.upvotes, tally.downvotes, tally.karma), (0, 0, 0));
        assert_eq!(tally.state, VoteState::NoVote);
    }
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    fn action_strategy() -> impl Strategy<Value = VoteKind> {
        prop_oneof![Just(VoteKind::Up), Just(VoteKind::Down)]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        /// For any action sequence by one voter on one votable, the counters
        /// stay consistent with the final state: each counter is 1 exactly
        /// when the matching ledger row exists, and never negative.
        #[test]
        fn prop_counters_match_final_state(actions in prop::collection::vec(action_strategy(), 0..64)) {
            let mut state = VoteState::NoVote;
            let mut upvotes = 0i32;
            let mut downvotes = 0i32;

            for action in actions {
                let t = transition(state, action);
                state = t.next;
                upvotes += t.upvote_delta;
                downvotes += t.downvote_delta;
                prop_assert!(upvotes >= 0 && downvotes >= 0);
                // At most one ledger row per pair: the counters contributed
                // by a single voter are 0 or 1.
                prop_assert!(upvotes <= 1 && downvotes <= 1);
            }

            let expected = match state {
                VoteState::NoVote => (0, 0),
                VoteState::Upvoted => (1, 0),
                VoteState::Downvoted => (0, 1),
            };
            prop_assert_eq!((upvotes, downvotes), expected);
        }

        /// Karma conservation: the accumulated karma delta depends only on
        /// the final state, not the path taken to reach it — +1 for a
        /// standing upvote, −1 for a standing downvote, 0 for no vote.
        #[test]
        fn prop_karma_depends_only_on_final_state(actions in prop::collection::vec(action_strategy(), 0..64)) {
            let mut state = VoteState::NoVote;
            let mut karma = 0i32;

            for action in actions {
                let t = transition(state, action);
                state = t.next;
                karma += t.karma_delta;
            }

            let expected = match state {
                VoteState::NoVote => 0,
                VoteState::Upvoted => 1,
                VoteState::Downvoted => -1,
            };
            prop_assert_eq!(karma, expected);
        }

        /// Net score delta equals karma delta for every single transition —
        /// the table is conservative in both columns at once.
        #[test]
        fn prop_net_delta_equals_karma_delta(action in action_strategy()) {
            for current in [VoteState::NoVote, VoteState::Upvoted, VoteState::Downvoted] {
                let t = transition(current, action);
                prop_assert_eq!(t.net_delta(), t.karma_delta);
            }
        }

        /// Toggle idempotence: starting from no vote (or from a standing
        /// vote in the action's own direction), applying the same action
        /// twice returns to the start with all deltas cancelled.
        #[test]
        fn prop_same_action_twice_round_trips(action in action_strategy()) {
            let aligned = VoteState::from(Some(action));
            for start in [VoteState::NoVote, aligned] {
                let first = transition(start, action);
                let second = transition(first.next, action);
                // Counter deltas cancel exactly.
                prop_assert_eq!(first.upvote_delta + second.upvote_delta, 0);
                prop_assert_eq!(first.downvote_delta + second.downvote_delta, 0);
                prop_assert_eq!(first.karma_delta + second.karma_delta, 0);
                prop_assert_eq!(second.next, start);
            }
        }
    }
}
