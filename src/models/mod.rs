// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    DurationCategory, GroupRelation, GuestListing, HostListing, ListingStatus, MatchOutcome,
    MatchStatus, ProposedMatch, ScoringWeights, ShelterType,
};
pub use requests::{PushMessage, TriggerRequest};
pub use responses::{ErrorResponse, HealthResponse, MatchingReport, SweepReport};
