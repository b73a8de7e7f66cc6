use serde::{Deserialize, Serialize};

/// Summary of one batch-matching invocation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchingReport {
    pub run_id: String,
    pub hosts_loaded: usize,
    pub guests_loaded: usize,
    pub eligible_pairs: usize,
    pub matches_created: usize,
    pub hosts_matched: usize,
    pub hosts_returned: usize,
    pub guests_matched: usize,
    pub guests_returned: usize,
}

/// Summary of a timeout or rejection sweep
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SweepReport {
    pub matches_processed: usize,
    pub hosts_returned: usize,
    pub guests_returned: usize,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
