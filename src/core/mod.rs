// Core algorithm exports
pub mod assignment;
pub mod decode;
pub mod filters;
pub mod history;
pub mod matcher;
pub mod scoring;

pub use assignment::{solve, CostMatrix};
pub use decode::{decode_guest, decode_host};
pub use filters::is_eligible;
pub use history::{history_cutoff, PairingHistory};
pub use matcher::{MatchResult, Matcher};
pub use scoring::{evaluate_pair, recency_score, ScoringParams};
