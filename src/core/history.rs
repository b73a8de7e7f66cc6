use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};

use crate::models::{MatchOutcome, MatchStatus};

/// Credit for a past match of a party that timed out
const TIMEOUT_CREDIT: u32 = 3;
/// Credit for a past match of a party that was rejected
const REJECTION_CREDIT: u32 = 1;
/// Credit at which the activity boost saturates
const ACTIVITY_SATURATION: u32 = 6;
/// History window, in multiples of the match timeout.
///
/// Two timeouts sometimes cut off a match that timed out just under two
/// timeouts ago; three leaves margin.
const HISTORY_WINDOW_TIMEOUTS: i64 = 3;

/// Start of the history window consumed by the activity boost
pub fn history_cutoff(now: DateTime<Utc>, match_timeout_hours: u32) -> DateTime<Utc> {
    now - Duration::hours(HISTORY_WINDOW_TIMEOUTS * i64::from(match_timeout_hours))
}

/// What past matching tells the scorer about a run's parties
///
/// Holds the pairs that must not be proposed again and per-party activity
/// credit built from recent outcomes.
#[derive(Debug, Clone, Default)]
pub struct PairingHistory {
    in_progress: HashMap<String, HashSet<String>>,
    host_credit: HashMap<String, u32>,
    guest_credit: HashMap<String, u32>,
    outcomes: usize,
}

impl PairingHistory {
    pub fn new(in_progress: Vec<(String, String)>, recent: Vec<MatchOutcome>) -> Self {
        let mut history = Self::default();

        for (host_id, guest_id) in in_progress {
            history.in_progress.entry(host_id).or_default().insert(guest_id);
        }

        for outcome in &recent {
            let credit = match outcome.status {
                MatchStatus::Timeout => TIMEOUT_CREDIT,
                MatchStatus::Rejected => REJECTION_CREDIT,
                _ => continue,
            };
            *history.host_credit.entry(outcome.host_id.clone()).or_default() += credit;
            *history.guest_credit.entry(outcome.guest_id.clone()).or_default() += credit;
        }
        history.outcomes = recent.len();

        history
    }

    #[inline]
    pub fn is_in_progress(&self, host_id: &str, guest_id: &str) -> bool {
        self.in_progress
            .get(host_id)
            .is_some_and(|guests| guests.contains(guest_id))
    }

    /// Host activity normalised to `[0, 1]`
    pub fn host_activity(&self, host_id: &str) -> f64 {
        normalise(self.host_credit.get(host_id).copied())
    }

    /// Guest activity normalised to `[0, 1]`
    pub fn guest_activity(&self, guest_id: &str) -> f64 {
        normalise(self.guest_credit.get(guest_id).copied())
    }

    pub fn in_progress_count(&self) -> usize {
        self.in_progress.values().map(HashSet::len).sum()
    }

    pub fn outcome_count(&self) -> usize {
        self.outcomes
    }
}

fn normalise(credit: Option<u32>) -> f64 {
    f64::from(credit.unwrap_or(0).min(ACTIVITY_SATURATION)) / f64::from(ACTIVITY_SATURATION)
}
