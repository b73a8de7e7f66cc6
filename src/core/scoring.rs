use chrono::{DateTime, Utc};

use crate::core::{filters::is_eligible, history::PairingHistory};
use crate::models::{GuestListing, HostListing, ScoringWeights};

/// Inputs of the soft scoring terms that are fixed for a whole run
#[derive(Debug, Clone, Copy)]
pub struct ScoringParams {
    pub weights: ScoringWeights,
    pub now: DateTime<Utc>,
    pub match_timeout_hours: u32,
    pub activity_boost: bool,
}

/// Score how well a host fits a guest
///
/// Returns 0.0 if the pair is ineligible. Otherwise the score is the
/// baseline plus weighted boosts:
/// ```text
/// score = baseline                              # 0.79, earned by eligibility
///       + transport      * transport_included   # 0.01
///       + host_activity  * activity(host)       # 0.05
///       + guest_activity * activity(guest)      # 0.05
///       + host_recency   * recency(host)        # 0.05
///       + guest_recency  * recency(guest)       # 0.05
/// ```
pub fn evaluate_pair(
    host: &HostListing,
    guest: &GuestListing,
    history: &PairingHistory,
    params: &ScoringParams,
) -> f64 {
    if !is_eligible(host, guest, history) {
        return 0.0;
    }

    let w = &params.weights;
    let mut score = w.baseline;

    if host.transport_included {
        score += w.transport;
    }

    if params.activity_boost {
        score += w.host_activity * history.host_activity(&host.id);
        score += w.guest_activity * history.guest_activity(&guest.id);
    }

    score += w.host_recency
        * recency_score(host.registered_at, params.now, params.match_timeout_hours);
    score += w.guest_recency
        * recency_score(guest.registered_at, params.now, params.match_timeout_hours);

    tracing::debug!(
        "Scored pair (host={}, guest={}): {:.4}",
        host.id,
        guest.id,
        score
    );

    score
}

/// Calculate registration recency score (0-1)
///
/// Linear decay from 1.0 at registration to 0.0 at twice the match timeout.
/// Registrations stamped in the future count as brand new.
#[inline]
pub fn recency_score(
    registered_at: DateTime<Utc>,
    now: DateTime<Utc>,
    match_timeout_hours: u32,
) -> f64 {
    let horizon_hours = 2.0 * f64::from(match_timeout_hours);
    if horizon_hours <= 0.0 {
        return 0.0;
    }

    let age_hours = (now - registered_at).num_milliseconds() as f64 / 3_600_000.0;

    (1.0 - age_hours.max(0.0) / horizon_hours).clamp(0.0, 1.0)
}
