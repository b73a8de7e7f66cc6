use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::models::{ListingStatus, MatchOutcome, MatchStatus};
use crate::services::store::{
    GuestRow, HostRow, MatchStore, NewMatch, StoreError, StoreTransaction,
};

#[derive(Debug, Clone)]
pub struct StoredHost {
    pub row: HostRow,
    pub status: ListingStatus,
}

#[derive(Debug, Clone)]
pub struct StoredGuest {
    pub row: GuestRow,
    pub status: ListingStatus,
}

/// Full contents of an [`InMemoryStore`]
#[derive(Debug, Clone, Default)]
pub struct StoreState {
    pub hosts: Vec<StoredHost>,
    pub guests: Vec<StoredGuest>,
    pub matches: Vec<MatchOutcome>,
}

impl StoreState {
    pub fn host_status(&self, id: &str) -> Option<ListingStatus> {
        self.hosts.iter().find(|h| h.row.id == id).map(|h| h.status)
    }

    pub fn guest_status(&self, id: &str) -> Option<ListingStatus> {
        self.guests.iter().find(|g| g.row.id == id).map(|g| g.status)
    }
}

/// In-process store with the same unit-of-work semantics as Postgres
///
/// Units of work are serialised: `begin` holds the store lock until the
/// transaction is committed or dropped. Changes go to a working copy that
/// only replaces the shared state on commit.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_host(&self, row: HostRow, status: ListingStatus) {
        self.state.lock().await.hosts.push(StoredHost { row, status });
    }

    pub async fn insert_guest(&self, row: GuestRow, status: ListingStatus) {
        self.state.lock().await.guests.push(StoredGuest { row, status });
    }

    pub async fn insert_match(&self, outcome: MatchOutcome) {
        self.state.lock().await.matches.push(outcome);
    }

    pub async fn snapshot(&self) -> StoreState {
        self.state.lock().await.clone()
    }
}

#[async_trait]
impl MatchStore for InMemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTransaction { guard, working }))
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(true)
    }
}

pub struct MemoryTransaction {
    guard: OwnedMutexGuard<StoreState>,
    working: StoreState,
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn claim_hosts(&mut self, limit: usize) -> Result<Vec<HostRow>, StoreError> {
        let mut claimed = Vec::new();
        for host in self
            .working
            .hosts
            .iter_mut()
            .filter(|h| h.status == ListingStatus::Available)
            .take(limit)
        {
            host.status = ListingStatus::BeingProcessed;
            claimed.push(host.row.clone());
        }
        Ok(claimed)
    }

    async fn claim_guests(&mut self, limit: usize) -> Result<Vec<GuestRow>, StoreError> {
        let mut available: Vec<usize> = self
            .working
            .guests
            .iter()
            .enumerate()
            .filter(|(_, g)| g.status == ListingStatus::Available)
            .map(|(idx, _)| idx)
            .collect();
        available.shuffle(&mut rand::thread_rng());

        let mut claimed = Vec::with_capacity(limit.min(available.len()));
        for idx in available.into_iter().take(limit) {
            let guest = &mut self.working.guests[idx];
            guest.status = ListingStatus::BeingProcessed;
            claimed.push(guest.row.clone());
        }
        Ok(claimed)
    }

    async fn unresolved_pairs(&mut self) -> Result<Vec<(String, String)>, StoreError> {
        Ok(self
            .working
            .matches
            .iter()
            .filter(|m| m.host_status.is_unresolved() || m.guest_status.is_unresolved())
            .map(|m| (m.host_id.clone(), m.guest_id.clone()))
            .collect())
    }

    async fn matches_since(
        &mut self,
        since: DateTime<Utc>,
    ) -> Result<Vec<MatchOutcome>, StoreError> {
        Ok(self
            .working
            .matches
            .iter()
            .filter(|m| m.matched_at >= since)
            .cloned()
            .collect())
    }

    async fn awaiting_matches(&mut self) -> Result<Vec<MatchOutcome>, StoreError> {
        Ok(self
            .working
            .matches
            .iter()
            .filter(|m| m.status == MatchStatus::AwaitingResponse)
            .cloned()
            .collect())
    }

    async fn insert_match(&mut self, record: &NewMatch) -> Result<String, StoreError> {
        let match_id = uuid::Uuid::new_v4().to_string();
        self.working.matches.push(MatchOutcome {
            match_id: match_id.clone(),
            host_id: record.host_id.clone(),
            guest_id: record.guest_id.clone(),
            matched_at: record.matched_at,
            status: record.status,
            host_status: record.status,
            guest_status: record.status,
        });
        Ok(match_id)
    }

    async fn set_match_status(
        &mut self,
        match_id: &str,
        status: MatchStatus,
    ) -> Result<(), StoreError> {
        let record = self
            .working
            .matches
            .iter_mut()
            .find(|m| m.match_id == match_id)
            .ok_or_else(|| StoreError::InvalidInput(format!("no match {match_id}")))?;
        record.status = status;
        Ok(())
    }

    async fn set_host_status(
        &mut self,
        ids: &[String],
        status: ListingStatus,
    ) -> Result<u64, StoreError> {
        let ids: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let mut updated = 0;
        for host in self.working.hosts.iter_mut().filter(|h| ids.contains(h.row.id.as_str())) {
            host.status = status;
            updated += 1;
        }
        Ok(updated)
    }

    async fn set_guest_status(
        &mut self,
        ids: &[String],
        status: ListingStatus,
    ) -> Result<u64, StoreError> {
        let ids: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let mut updated = 0;
        for guest in self.working.guests.iter_mut().filter(|g| ids.contains(g.row.id.as_str())) {
            guest.status = status;
            updated += 1;
        }
        Ok(updated)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let MemoryTransaction { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host_row(id: &str) -> HostRow {
        HostRow {
            id: id.to_string(),
            registered_at_ms: 0,
            country: None,
            city: None,
            shelter_type: "flat".to_string(),
            beds: "2".to_string(),
            acceptable_group_relations: "couple".to_string(),
            ok_for_pregnant: "TRUE".to_string(),
            ok_for_disabilities: "TRUE".to_string(),
            ok_for_animals: "TRUE".to_string(),
            ok_for_elderly: "TRUE".to_string(),
            ok_for_any_nationality: "TRUE".to_string(),
            duration_category: "3".to_string(),
            transport_included: None,
        }
    }

    #[tokio::test]
    async fn test_dropped_transaction_rolls_back() {
        let store = InMemoryStore::new();
        store.insert_host(host_row("h1"), ListingStatus::Available).await;

        {
            let mut tx = store.begin().await.unwrap();
            let claimed = tx.claim_hosts(10).await.unwrap();
            assert_eq!(claimed.len(), 1);
        }

        let state = store.snapshot().await;
        assert_eq!(state.host_status("h1"), Some(ListingStatus::Available));
    }

    #[tokio::test]
    async fn test_commit_publishes_changes() {
        let store = InMemoryStore::new();
        store.insert_host(host_row("h1"), ListingStatus::Available).await;
        store.insert_host(host_row("h2"), ListingStatus::Disabled).await;

        let mut tx = store.begin().await.unwrap();
        let claimed = tx.claim_hosts(10).await.unwrap();
        assert_eq!(claimed.len(), 1, "only available hosts are claimed");
        tx.commit().await.unwrap();

        let state = store.snapshot().await;
        assert_eq!(state.host_status("h1"), Some(ListingStatus::BeingProcessed));
        assert_eq!(state.host_status("h2"), Some(ListingStatus::Disabled));
    }

    fn guest_row(id: &str) -> GuestRow {
        GuestRow {
            id: id.to_string(),
            registered_at_ms: 0,
            country: None,
            city: None,
            acceptable_shelter_types: "flat".to_string(),
            beds: "1".to_string(),
            group_relation: "couple".to_string(),
            is_pregnant: "FALSE".to_string(),
            is_with_disability: "FALSE".to_string(),
            is_with_animal: "FALSE".to_string(),
            is_with_elderly: "FALSE".to_string(),
            is_ukrainian_nationality: "TRUE".to_string(),
            duration_category: "1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_guests_claimed_in_random_order() {
        let store = InMemoryStore::new();
        for i in 0..20 {
            store.insert_guest(guest_row(&format!("g{i:02}")), ListingStatus::Available).await;
        }
        store.insert_guest(guest_row("gone"), ListingStatus::Disabled).await;
        let inserted: Vec<String> = (0..20).map(|i| format!("g{i:02}")).collect();

        // 20 guests come back in insertion order with probability 1/20!, so
        // a handful of attempts is enough to see a different order
        let mut saw_shuffle = false;
        for _ in 0..5 {
            let mut tx = store.begin().await.unwrap();
            let claimed: Vec<String> =
                tx.claim_guests(50).await.unwrap().into_iter().map(|g| g.id).collect();

            let mut sorted = claimed.clone();
            sorted.sort();
            assert_eq!(sorted, inserted, "every available guest, and only those, is claimed");
            saw_shuffle |= claimed != inserted;
        }
        assert!(saw_shuffle);

        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.claim_guests(7).await.unwrap().len(), 7);
        assert_eq!(tx.claim_guests(50).await.unwrap().len(), 13);
    }

    #[tokio::test]
    async fn test_claim_respects_limit() {
        let store = InMemoryStore::new();
        for i in 0..5 {
            store.insert_host(host_row(&format!("h{i}")), ListingStatus::Available).await;
        }

        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.claim_hosts(3).await.unwrap().len(), 3);
        assert_eq!(tx.claim_hosts(3).await.unwrap().len(), 2);
    }
}
