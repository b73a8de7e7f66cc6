use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{ListingStatus, MatchOutcome, MatchStatus};

/// Errors raised at the persistence boundary
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Invalid data in store: {0}")]
    InvalidData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// A hosts table row exactly as stored
///
/// Categorical and boolean columns are kept as their raw string encodings;
/// turning them into a [`crate::models::HostListing`] is the loader's job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostRow {
    pub id: String,
    pub registered_at_ms: i64,
    pub country: Option<String>,
    pub city: Option<String>,
    pub shelter_type: String,
    pub beds: String,
    pub acceptable_group_relations: String,
    pub ok_for_pregnant: String,
    pub ok_for_disabilities: String,
    pub ok_for_animals: String,
    pub ok_for_elderly: String,
    pub ok_for_any_nationality: String,
    pub duration_category: String,
    pub transport_included: Option<String>,
}

/// A guests table row exactly as stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuestRow {
    pub id: String,
    pub registered_at_ms: i64,
    pub country: Option<String>,
    pub city: Option<String>,
    pub acceptable_shelter_types: String,
    pub beds: String,
    pub group_relation: String,
    pub is_pregnant: String,
    pub is_with_disability: String,
    pub is_with_animal: String,
    pub is_with_elderly: String,
    pub is_ukrainian_nationality: String,
    pub duration_category: String,
}

/// A match about to be inserted
#[derive(Debug, Clone, PartialEq)]
pub struct NewMatch {
    pub host_id: String,
    pub guest_id: String,
    pub matched_at: DateTime<Utc>,
    pub status: MatchStatus,
}

/// Backing store for hosts, guests and matches
#[async_trait]
pub trait MatchStore: Send + Sync {
    /// Open a unit of work; everything done through it is committed or
    /// rolled back together.
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError>;

    async fn health_check(&self) -> Result<bool, StoreError>;
}

/// One unit of work against the store
///
/// Dropping a transaction without calling [`StoreTransaction::commit`]
/// discards every change made through it.
#[async_trait]
pub trait StoreTransaction: Send {
    /// Select up to `limit` available hosts and mark them as being processed.
    async fn claim_hosts(&mut self, limit: usize) -> Result<Vec<HostRow>, StoreError>;

    /// Select up to `limit` available guests, in random order, and mark them
    /// as being processed.
    async fn claim_guests(&mut self, limit: usize) -> Result<Vec<GuestRow>, StoreError>;

    /// `(host id, guest id)` of every match with a side still awaiting an
    /// answer. Sweeps only close the overall status, so these pairs stay
    /// excluded after a timeout or rejection.
    async fn unresolved_pairs(&mut self) -> Result<Vec<(String, String)>, StoreError>;

    async fn matches_since(&mut self, since: DateTime<Utc>)
        -> Result<Vec<MatchOutcome>, StoreError>;

    /// Matches whose overall status is still awaiting a response.
    async fn awaiting_matches(&mut self) -> Result<Vec<MatchOutcome>, StoreError>;

    /// Insert a match with all three status fields set to `status`; returns its id.
    async fn insert_match(&mut self, record: &NewMatch) -> Result<String, StoreError>;

    async fn set_match_status(
        &mut self,
        match_id: &str,
        status: MatchStatus,
    ) -> Result<(), StoreError>;

    async fn set_host_status(
        &mut self,
        ids: &[String],
        status: ListingStatus,
    ) -> Result<u64, StoreError>;

    async fn set_guest_status(
        &mut self,
        ids: &[String],
        status: ListingStatus,
    ) -> Result<u64, StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}

pub(crate) fn listing_status(code: &str) -> Result<ListingStatus, StoreError> {
    ListingStatus::from_code(code)
        .ok_or_else(|| StoreError::InvalidData(format!("unknown listing status code {code:?}")))
}

pub(crate) fn match_status(code: &str) -> Result<MatchStatus, StoreError> {
    MatchStatus::from_code(code)
        .ok_or_else(|| StoreError::InvalidData(format!("unknown match status code {code:?}")))
}

pub(crate) fn timestamp_from_millis(ms: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .ok_or_else(|| StoreError::InvalidData(format!("timestamp {ms} out of range")))
}
