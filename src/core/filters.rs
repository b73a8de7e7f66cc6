use crate::core::history::PairingHistory;
use crate::models::{GuestListing, HostListing};

/// Check whether a host could take in a guest at all
///
/// Hard constraints only; the cheap scalar comparisons run first and the
/// set lookups last. Any failing condition makes the pair ineligible.
#[inline]
pub fn is_eligible(host: &HostListing, guest: &GuestListing, history: &PairingHistory) -> bool {
    if host.country != guest.country {
        return false;
    }

    // Needs the host must explicitly accept
    if (guest.is_pregnant && !host.ok_for_pregnant)
        || (guest.is_with_disability && !host.ok_for_disabilities)
        || (guest.is_with_animal && !host.ok_for_animals)
        || (guest.is_with_elderly && !host.ok_for_elderly)
    {
        return false;
    }

    if !guest.is_ukrainian_nationality && !host.ok_for_any_nationality {
        return false;
    }

    if host.duration_category < guest.duration_category {
        return false;
    }

    if host.beds < guest.beds {
        return false;
    }

    // An unspecified guest city accepts any host city
    if let Some(city) = &guest.city {
        if host.city.as_ref() != Some(city) {
            return false;
        }
    }

    if !host.acceptable_group_relations.contains(&guest.group_relation) {
        return false;
    }

    if !guest.acceptable_shelter_types.contains(&host.shelter_type) {
        return false;
    }

    !history.is_in_progress(&host.id, &guest.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DurationCategory, GroupRelation, ShelterType};
    use chrono::Utc;

    fn create_host() -> HostListing {
        HostListing {
            id: "h1".to_string(),
            registered_at: Utc::now(),
            country: "poland".to_string(),
            city: Some("warsaw".to_string()),
            shelter_type: ShelterType::Flat,
            beds: 3,
            acceptable_group_relations: [GroupRelation::Couple].into_iter().collect(),
            ok_for_any_nationality: false,
            ok_for_elderly: false,
            ok_for_pregnant: false,
            ok_for_disabilities: false,
            ok_for_animals: false,
            duration_category: DurationCategory::Month,
            transport_included: false,
        }
    }

    fn create_guest() -> GuestListing {
        GuestListing {
            id: "g1".to_string(),
            registered_at: Utc::now(),
            country: "poland".to_string(),
            city: None,
            beds: 2,
            is_pregnant: false,
            is_with_disability: false,
            is_with_animal: false,
            is_with_elderly: false,
            group_relation: GroupRelation::Couple,
            acceptable_shelter_types: [ShelterType::Flat].into_iter().collect(),
            is_ukrainian_nationality: true,
            duration_category: DurationCategory::TwoToThreeWeeks,
        }
    }

    #[test]
    fn test_eligible_pair() {
        assert!(is_eligible(&create_host(), &create_guest(), &PairingHistory::default()));
    }

    #[test]
    fn test_unmet_need_blocks() {
        let mut guest = create_guest();
        guest.is_with_animal = true;
        assert!(!is_eligible(&create_host(), &guest, &PairingHistory::default()));

        let mut host = create_host();
        host.ok_for_animals = true;
        assert!(is_eligible(&host, &guest, &PairingHistory::default()));
    }

    #[test]
    fn test_nationality() {
        let mut guest = create_guest();
        guest.is_ukrainian_nationality = false;
        assert!(!is_eligible(&create_host(), &guest, &PairingHistory::default()));

        let mut host = create_host();
        host.ok_for_any_nationality = true;
        assert!(is_eligible(&host, &guest, &PairingHistory::default()));
    }

    #[test]
    fn test_equal_duration_and_beds_allowed() {
        let mut guest = create_guest();
        guest.duration_category = DurationCategory::Month;
        guest.beds = 3;
        assert!(is_eligible(&create_host(), &guest, &PairingHistory::default()));

        guest.duration_category = DurationCategory::Longer;
        assert!(!is_eligible(&create_host(), &guest, &PairingHistory::default()));
    }

    #[test]
    fn test_city() {
        let mut guest = create_guest();
        guest.city = Some("krakow".to_string());
        assert!(!is_eligible(&create_host(), &guest, &PairingHistory::default()));

        guest.city = Some("warsaw".to_string());
        assert!(is_eligible(&create_host(), &guest, &PairingHistory::default()));

        let mut host = create_host();
        host.city = None;
        assert!(!is_eligible(&host, &guest, &PairingHistory::default()));
    }

    #[test]
    fn test_in_progress_pair_blocked() {
        let history = PairingHistory::new(vec![("h1".to_string(), "g1".to_string())], vec![]);
        assert!(!is_eligible(&create_host(), &create_guest(), &history));
    }
}
