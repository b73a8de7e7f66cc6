use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of accommodation a host offers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShelterType {
    Bed,
    Room,
    Flat,
    House,
    Shared,
}

impl ShelterType {
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "bed" => Some(ShelterType::Bed),
            "room" => Some(ShelterType::Room),
            "flat" => Some(ShelterType::Flat),
            "house" => Some(ShelterType::House),
            "shared" => Some(ShelterType::Shared),
            _ => None,
        }
    }
}

/// How the members of a guest group are related to each other
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupRelation {
    SingleMan,
    SingleWoman,
    Couple,
    MotherWithChildren,
    FamilyWithChildren,
    UnrelatedGroup,
}

impl GroupRelation {
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "single_man" => Some(GroupRelation::SingleMan),
            "single_woman" => Some(GroupRelation::SingleWoman),
            "couple" => Some(GroupRelation::Couple),
            "mother_with_children" => Some(GroupRelation::MotherWithChildren),
            "family_with_children" => Some(GroupRelation::FamilyWithChildren),
            "unrelated_group" => Some(GroupRelation::UnrelatedGroup),
            _ => None,
        }
    }
}

/// Length of stay, ordered by ascending commitment
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationCategory {
    LessThanWeek = 0,
    Week = 1,
    TwoToThreeWeeks = 2,
    Month = 3,
    Longer = 4,
}

impl DurationCategory {
    /// Accepts either the ordinal digit or the label
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "0" | "less_than_week" => Some(DurationCategory::LessThanWeek),
            "1" | "week" => Some(DurationCategory::Week),
            "2" | "two_to_three_weeks" => Some(DurationCategory::TwoToThreeWeeks),
            "3" | "month" => Some(DurationCategory::Month),
            "4" | "longer" => Some(DurationCategory::Longer),
            _ => None,
        }
    }
}

/// Status of a host or guest listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    Disabled,
    ModerationRejected,
    Default,
    Available,
    BeingProcessed,
    Matched,
    MatchAccepted,
}

impl ListingStatus {
    pub fn code(self) -> &'static str {
        match self {
            ListingStatus::Disabled => "025",
            ListingStatus::ModerationRejected => "045",
            ListingStatus::Default => "055",
            ListingStatus::Available => "065",
            ListingStatus::BeingProcessed => "075",
            ListingStatus::Matched => "085",
            ListingStatus::MatchAccepted => "095",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "025" => Some(ListingStatus::Disabled),
            "045" => Some(ListingStatus::ModerationRejected),
            "055" => Some(ListingStatus::Default),
            "065" => Some(ListingStatus::Available),
            "075" => Some(ListingStatus::BeingProcessed),
            "085" => Some(ListingStatus::Matched),
            "095" => Some(ListingStatus::MatchAccepted),
            _ => None,
        }
    }
}

/// Status of a match, used for the overall and the per-side fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Timeout,
    Rejected,
    Default,
    AwaitingResponse,
    Accepted,
}

impl MatchStatus {
    /// Value written to all three status fields of a freshly created match
    pub const INITIAL: MatchStatus = MatchStatus::AwaitingResponse;

    pub fn code(self) -> &'static str {
        match self {
            MatchStatus::Timeout => "035",
            MatchStatus::Rejected => "045",
            MatchStatus::Default => "055",
            MatchStatus::AwaitingResponse => "065",
            MatchStatus::Accepted => "075",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "035" => Some(MatchStatus::Timeout),
            "045" => Some(MatchStatus::Rejected),
            "055" => Some(MatchStatus::Default),
            "065" => Some(MatchStatus::AwaitingResponse),
            "075" => Some(MatchStatus::Accepted),
            _ => None,
        }
    }

    /// Whether a side with this status still holds its party
    pub fn is_unresolved(self) -> bool {
        matches!(self, MatchStatus::AwaitingResponse | MatchStatus::Default)
    }
}

/// A host's housing offer as seen by one matching run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostListing {
    pub id: String,
    pub registered_at: DateTime<Utc>,
    pub country: String,
    pub city: Option<String>,
    pub shelter_type: ShelterType,
    pub beds: u32,
    pub acceptable_group_relations: BTreeSet<GroupRelation>,
    pub ok_for_any_nationality: bool,
    pub ok_for_elderly: bool,
    pub ok_for_pregnant: bool,
    pub ok_for_disabilities: bool,
    pub ok_for_animals: bool,
    pub duration_category: DurationCategory,
    pub transport_included: bool,
}

/// A guest's housing need as seen by one matching run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuestListing {
    pub id: String,
    pub registered_at: DateTime<Utc>,
    pub country: String,
    pub city: Option<String>,
    pub beds: u32,
    pub is_pregnant: bool,
    pub is_with_disability: bool,
    pub is_with_animal: bool,
    pub is_with_elderly: bool,
    pub group_relation: GroupRelation,
    pub acceptable_shelter_types: BTreeSet<ShelterType>,
    pub is_ukrainian_nationality: bool,
    pub duration_category: DurationCategory,
}

/// A past match as read back from the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub match_id: String,
    pub host_id: String,
    pub guest_id: String,
    pub matched_at: DateTime<Utc>,
    pub status: MatchStatus,
    pub host_status: MatchStatus,
    pub guest_status: MatchStatus,
}

/// A pairing accepted by the assignment solver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposedMatch {
    pub host_id: String,
    pub guest_id: String,
    pub score: f64,
}

/// Weights of the soft scoring terms
///
/// With the defaults an eligible pair always scores within `[0.79, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    pub baseline: f64,
    pub transport: f64,
    pub host_activity: f64,
    pub guest_activity: f64,
    pub host_recency: f64,
    pub guest_recency: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            baseline: 0.79,
            transport: 0.01,
            host_activity: 0.05,
            guest_activity: 0.05,
            host_recency: 0.05,
            guest_recency: 0.05,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_roundtrip() {
        for status in [
            ListingStatus::Disabled,
            ListingStatus::ModerationRejected,
            ListingStatus::Default,
            ListingStatus::Available,
            ListingStatus::BeingProcessed,
            ListingStatus::Matched,
            ListingStatus::MatchAccepted,
        ] {
            assert_eq!(ListingStatus::from_code(status.code()), Some(status));
        }
        assert_eq!(MatchStatus::from_code("065"), Some(MatchStatus::AwaitingResponse));
        assert_eq!(MatchStatus::from_code("999"), None);
    }

    #[test]
    fn test_duration_ordering() {
        assert!(DurationCategory::Month > DurationCategory::TwoToThreeWeeks);
        assert_eq!(DurationCategory::from_label("3"), Some(DurationCategory::Month));
        assert_eq!(DurationCategory::from_label(" Longer "), Some(DurationCategory::Longer));
        assert_eq!(DurationCategory::from_label("5"), None);
    }

    #[test]
    fn test_labels_case_insensitive() {
        assert_eq!(ShelterType::from_label("FLAT"), Some(ShelterType::Flat));
        assert_eq!(GroupRelation::from_label("Couple"), Some(GroupRelation::Couple));
        assert_eq!(ShelterType::from_label("castle"), None);
    }

    #[test]
    fn test_unresolved_match_status() {
        assert!(MatchStatus::AwaitingResponse.is_unresolved());
        assert!(!MatchStatus::Rejected.is_unresolved());
        assert!(!MatchStatus::Timeout.is_unresolved());
    }
}
