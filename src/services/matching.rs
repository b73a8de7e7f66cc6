use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::config::MatchingSettings;
use crate::core::{decode_guest, decode_host, history_cutoff, Matcher, PairingHistory};
use crate::error::Result;
use crate::models::{
    GuestListing, HostListing, ListingStatus, MatchOutcome, MatchStatus, MatchingReport,
    ProposedMatch, SweepReport,
};
use crate::services::store::{MatchStore, NewMatch, StoreTransaction};

/// Listings pulled out of the pool for one run
#[derive(Debug, Default)]
pub struct Dataset {
    pub hosts: Vec<HostListing>,
    pub guests: Vec<GuestListing>,
}

/// Claim and decode up to the configured number of available listings
///
/// Claiming flips every selected row to being-processed inside the open
/// unit of work. A row that fails to decode fails the whole run.
pub async fn load_dataset(
    tx: &mut dyn StoreTransaction,
    settings: &MatchingSettings,
) -> Result<Dataset> {
    let hosts = tx
        .claim_hosts(settings.hosts_batch_size)
        .await?
        .iter()
        .map(decode_host)
        .collect::<Result<Vec<_>>>()?;

    let guests = tx
        .claim_guests(settings.guests_batch_size)
        .await?
        .iter()
        .map(decode_guest)
        .collect::<Result<Vec<_>>>()?;

    tracing::info!("Loaded {} hosts and {} guests", hosts.len(), guests.len());

    Ok(Dataset { hosts, guests })
}

/// Read the repeat-pair exclusion set and the recent outcomes window
pub async fn load_history(
    tx: &mut dyn StoreTransaction,
    now: DateTime<Utc>,
    match_timeout_hours: u32,
) -> Result<PairingHistory> {
    let in_progress = tx.unresolved_pairs().await?;
    let recent = tx
        .matches_since(history_cutoff(now, match_timeout_hours))
        .await?;

    let history = PairingHistory::new(in_progress, recent);

    tracing::info!(
        "Loaded history: {} pairs in progress, {} recent outcomes",
        history.in_progress_count(),
        history.outcome_count()
    );

    Ok(history)
}

/// Persist accepted pairs and return every loaded listing to a final status
///
/// Matched listings move to `Matched`; everything else that was loaded goes
/// back to `Available`.
pub async fn commit_outcome(
    tx: &mut dyn StoreTransaction,
    dataset: &Dataset,
    matches: &[ProposedMatch],
    now: DateTime<Utc>,
) -> Result<MatchingReport> {
    for proposed in matches {
        let match_id = tx
            .insert_match(&NewMatch {
                host_id: proposed.host_id.clone(),
                guest_id: proposed.guest_id.clone(),
                matched_at: now,
                status: MatchStatus::INITIAL,
            })
            .await?;

        tracing::debug!(
            "Created match {} (host={}, guest={}, score={:.4})",
            match_id,
            proposed.host_id,
            proposed.guest_id,
            proposed.score
        );
    }

    let matched_hosts: HashSet<&str> = matches.iter().map(|m| m.host_id.as_str()).collect();
    let matched_guests: HashSet<&str> = matches.iter().map(|m| m.guest_id.as_str()).collect();

    let (hosts_matched, hosts_returned) =
        partition_ids(dataset.hosts.iter().map(|h| h.id.as_str()), &matched_hosts);
    let (guests_matched, guests_returned) =
        partition_ids(dataset.guests.iter().map(|g| g.id.as_str()), &matched_guests);

    tx.set_host_status(&hosts_matched, ListingStatus::Matched).await?;
    tx.set_host_status(&hosts_returned, ListingStatus::Available).await?;
    tx.set_guest_status(&guests_matched, ListingStatus::Matched).await?;
    tx.set_guest_status(&guests_returned, ListingStatus::Available).await?;

    Ok(MatchingReport {
        run_id: String::new(),
        hosts_loaded: dataset.hosts.len(),
        guests_loaded: dataset.guests.len(),
        eligible_pairs: 0,
        matches_created: matches.len(),
        hosts_matched: hosts_matched.len(),
        hosts_returned: hosts_returned.len(),
        guests_matched: guests_matched.len(),
        guests_returned: guests_returned.len(),
    })
}

fn partition_ids<'a>(
    ids: impl Iterator<Item = &'a str>,
    matched: &HashSet<&str>,
) -> (Vec<String>, Vec<String>) {
    let (hit, miss): (Vec<&str>, Vec<&str>) = ids.partition(|id| matched.contains(id));
    (
        hit.into_iter().map(str::to_string).collect(),
        miss.into_iter().map(str::to_string).collect(),
    )
}

/// Runs the matching pipeline and the match lifecycle sweeps against a store
///
/// Each operation is one unit of work: either everything it did is
/// committed, or the transaction is dropped and nothing changes.
#[derive(Clone)]
pub struct MatchingService {
    store: Arc<dyn MatchStore>,
    matcher: Matcher,
    settings: MatchingSettings,
}

impl MatchingService {
    pub fn new(store: Arc<dyn MatchStore>, matcher: Matcher, settings: MatchingSettings) -> Self {
        Self {
            store,
            matcher,
            settings,
        }
    }

    pub fn store(&self) -> &Arc<dyn MatchStore> {
        &self.store
    }

    /// One batch-matching invocation: load, score, assign, commit
    pub async fn create_matches(&self) -> Result<MatchingReport> {
        self.create_matches_at(Utc::now()).await
    }

    pub async fn create_matches_at(&self, now: DateTime<Utc>) -> Result<MatchingReport> {
        self.settings.check()?;
        let run_id = uuid::Uuid::new_v4().to_string();

        tracing::info!("Starting matching run {}", run_id);

        let mut tx = self.store.begin().await?;

        let dataset = load_dataset(tx.as_mut(), &self.settings).await?;
        let history = load_history(tx.as_mut(), now, self.matcher.match_timeout_hours()).await?;

        let result = self
            .matcher
            .find_matches(&dataset.hosts, &dataset.guests, &history, now)?;

        tracing::info!(
            "Found {} matches from {} eligible pairs",
            result.matches.len(),
            result.eligible_pairs
        );

        let mut report = commit_outcome(tx.as_mut(), &dataset, &result.matches, now).await?;
        tx.commit().await?;

        report.run_id = run_id;
        report.eligible_pairs = result.eligible_pairs;

        tracing::info!(
            "Matching run {} committed: {} matches, {} hosts and {} guests returned to pool",
            report.run_id,
            report.matches_created,
            report.hosts_returned,
            report.guests_returned
        );

        Ok(report)
    }

    /// Time out matches nobody answered within the configured window
    pub async fn process_timeouts(&self) -> Result<SweepReport> {
        self.process_timeouts_at(Utc::now()).await
    }

    pub async fn process_timeouts_at(&self, now: DateTime<Utc>) -> Result<SweepReport> {
        self.settings.check()?;
        let timeout = Duration::hours(i64::from(self.settings.match_timeout_hours));

        self.sweep(MatchStatus::Timeout, |m| {
            (m.host_status == MatchStatus::AwaitingResponse
                || m.guest_status == MatchStatus::AwaitingResponse)
                && now - m.matched_at > timeout
        })
        .await
    }

    /// Close matches that either side rejected
    pub async fn process_rejections(&self) -> Result<SweepReport> {
        self.sweep(MatchStatus::Rejected, |m| {
            m.host_status == MatchStatus::Rejected || m.guest_status == MatchStatus::Rejected
        })
        .await
    }

    /// Move selected awaiting matches to `status` and free both parties
    async fn sweep<F>(&self, status: MatchStatus, select: F) -> Result<SweepReport>
    where
        F: Fn(&MatchOutcome) -> bool,
    {
        let mut tx = self.store.begin().await?;

        let selected: Vec<MatchOutcome> = tx
            .awaiting_matches()
            .await?
            .into_iter()
            .filter(|m| select(m))
            .collect();

        for outcome in &selected {
            tracing::debug!(
                "Setting match {} (host={}, guest={}) to {:?}",
                outcome.match_id,
                outcome.host_id,
                outcome.guest_id,
                status
            );
            tx.set_match_status(&outcome.match_id, status).await?;
        }

        let hosts: Vec<String> = selected.iter().map(|m| m.host_id.clone()).collect();
        let guests: Vec<String> = selected.iter().map(|m| m.guest_id.clone()).collect();
        let hosts_returned = tx.set_host_status(&hosts, ListingStatus::Available).await?;
        let guests_returned = tx.set_guest_status(&guests, ListingStatus::Available).await?;

        tx.commit().await?;

        tracing::info!(
            "Set {} matches to {:?}; returned {} hosts and {} guests to pool",
            selected.len(),
            status,
            hosts_returned,
            guests_returned
        );

        Ok(SweepReport {
            matches_processed: selected.len(),
            hosts_returned: hosts_returned as usize,
            guests_returned: guests_returned as usize,
        })
    }
}
