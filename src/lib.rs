//! Refuge Matcher - batch matching of housing hosts with refugee guests
//!
//! Each invocation pulls a batch of available hosts and guests out of the
//! pool, scores every eligible pairing and commits the assignment with the
//! highest total score, all inside one unit of work.

pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{evaluate_pair, Matcher, PairingHistory};
pub use error::MatchingError;
pub use models::{GuestListing, HostListing, MatchingReport, ProposedMatch, ScoringWeights};
pub use services::{InMemoryStore, MatchStore, MatchingService, PostgresStore};
