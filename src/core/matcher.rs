use chrono::{DateTime, Utc};

use crate::config::MatchingSettings;
use crate::core::{
    assignment::{self, CostMatrix},
    history::PairingHistory,
    scoring::{evaluate_pair, ScoringParams},
};
use crate::error::Result;
use crate::models::{GuestListing, HostListing, ProposedMatch, ScoringWeights};

/// Result of the matching process
#[derive(Debug, Default)]
pub struct MatchResult {
    pub matches: Vec<ProposedMatch>,
    pub eligible_pairs: usize,
}

/// Batch matcher - scores every host × guest pair and picks the assignment
/// with the highest total score
///
/// # Pipeline Stages
/// 1. Hard eligibility filtering (per pair)
/// 2. Soft scoring of eligible pairs
/// 3. Global one-to-one assignment
/// 4. Removal of assigned pairs that were never eligible
#[derive(Debug, Clone)]
pub struct Matcher {
    weights: ScoringWeights,
    match_timeout_hours: u32,
    activity_boost: bool,
}

impl Matcher {
    pub fn new(weights: ScoringWeights, match_timeout_hours: u32, activity_boost: bool) -> Self {
        Self {
            weights,
            match_timeout_hours,
            activity_boost,
        }
    }

    pub fn from_settings(weights: ScoringWeights, settings: &MatchingSettings) -> Self {
        Self::new(weights, settings.match_timeout_hours, settings.activity_boost)
    }

    pub fn match_timeout_hours(&self) -> u32 {
        self.match_timeout_hours
    }

    pub fn scoring_params(&self, now: DateTime<Utc>) -> ScoringParams {
        ScoringParams {
            weights: self.weights,
            now,
            match_timeout_hours: self.match_timeout_hours,
            activity_boost: self.activity_boost,
        }
    }

    /// Find the best global pairing of hosts and guests
    ///
    /// Costs are negated scores, so the minimum-cost assignment maximises the
    /// total score. When the pools differ in size the solver may still pair
    /// ineligible cells; those are dropped afterwards.
    pub fn find_matches(
        &self,
        hosts: &[HostListing],
        guests: &[GuestListing],
        history: &PairingHistory,
        now: DateTime<Utc>,
    ) -> Result<MatchResult> {
        if hosts.is_empty() || guests.is_empty() {
            return Ok(MatchResult::default());
        }

        let params = self.scoring_params(now);
        let costs = CostMatrix::from_fn(hosts.len(), guests.len(), |i, j| {
            -evaluate_pair(&hosts[i], &guests[j], history, &params)
        });

        let eligible_pairs = (0..hosts.len())
            .flat_map(|i| (0..guests.len()).map(move |j| (i, j)))
            .filter(|&(i, j)| costs.get(i, j) < 0.0)
            .count();

        if eligible_pairs == 0 {
            tracing::debug!(
                "No eligible pairs among {} hosts and {} guests",
                hosts.len(),
                guests.len()
            );
            return Ok(MatchResult::default());
        }

        let matches = assignment::solve(&costs)?
            .into_iter()
            .filter(|&(i, j)| costs.get(i, j) < 0.0)
            .map(|(i, j)| ProposedMatch {
                host_id: hosts[i].id.clone(),
                guest_id: guests[j].id.clone(),
                score: -costs.get(i, j),
            })
            .collect();

        Ok(MatchResult {
            matches,
            eligible_pairs,
        })
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::new(ScoringWeights::default(), 24, true)
    }
}
