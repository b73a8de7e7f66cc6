//! Normalisation of raw store rows into typed listings
//!
//! Every parser here is total over its input: an unrecognised encoding is a
//! [`MatchingError::Decode`], never a silent default. The only defaults are
//! a missing country (`poland`) and a missing transport flag (not included).

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::error::{MatchingError, Result};
use crate::models::{DurationCategory, GroupRelation, GuestListing, HostListing, ShelterType};
use crate::services::{GuestRow, HostRow};

pub const DEFAULT_COUNTRY: &str = "poland";

/// Field-level parser bound to one row, so errors can name the row
struct RowDecoder<'a> {
    entity: &'static str,
    id: &'a str,
}

impl<'a> RowDecoder<'a> {
    fn error(&self, field: &'static str, value: &str) -> MatchingError {
        MatchingError::decode(self.entity, self.id, field, value)
    }

    fn flag(&self, field: &'static str, value: &str) -> Result<bool> {
        match value.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(self.error(field, value)),
        }
    }

    fn beds(&self, value: &str) -> Result<u32> {
        value.trim().parse().map_err(|_| self.error("beds", value))
    }

    fn duration(&self, value: &str) -> Result<DurationCategory> {
        DurationCategory::from_label(value).ok_or_else(|| self.error("duration_category", value))
    }

    fn timestamp(&self, ms: i64) -> Result<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp_millis(ms)
            .ok_or_else(|| self.error("fnc_ts_registered", &ms.to_string()))
    }

    fn list<T: Ord>(
        &self,
        field: &'static str,
        value: &str,
        parse: impl Fn(&str) -> Option<T>,
    ) -> Result<BTreeSet<T>> {
        value
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(|item| parse(item).ok_or_else(|| self.error(field, item)))
            .collect()
    }
}

fn country(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(c) if !c.is_empty() => c.to_lowercase(),
        _ => DEFAULT_COUNTRY.to_string(),
    }
}

fn city(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_lowercase)
}

pub fn decode_host(row: &HostRow) -> Result<HostListing> {
    let d = RowDecoder {
        entity: "host",
        id: &row.id,
    };

    let transport_included = match row.transport_included.as_deref() {
        Some(value) => d.flag("transport_included", value)?,
        None => false,
    };

    Ok(HostListing {
        id: row.id.clone(),
        registered_at: d.timestamp(row.registered_at_ms)?,
        country: country(row.country.as_deref()),
        city: city(row.city.as_deref()),
        shelter_type: ShelterType::from_label(&row.shelter_type)
            .ok_or_else(|| d.error("shelter_type", &row.shelter_type))?,
        beds: d.beds(&row.beds)?,
        acceptable_group_relations: d.list(
            "acceptable_group_relations",
            &row.acceptable_group_relations,
            GroupRelation::from_label,
        )?,
        ok_for_any_nationality: d.flag("ok_for_any_nationality", &row.ok_for_any_nationality)?,
        ok_for_elderly: d.flag("ok_for_elderly", &row.ok_for_elderly)?,
        ok_for_pregnant: d.flag("ok_for_pregnant", &row.ok_for_pregnant)?,
        ok_for_disabilities: d.flag("ok_for_disabilities", &row.ok_for_disabilities)?,
        ok_for_animals: d.flag("ok_for_animals", &row.ok_for_animals)?,
        duration_category: d.duration(&row.duration_category)?,
        transport_included,
    })
}

pub fn decode_guest(row: &GuestRow) -> Result<GuestListing> {
    let d = RowDecoder {
        entity: "guest",
        id: &row.id,
    };

    Ok(GuestListing {
        id: row.id.clone(),
        registered_at: d.timestamp(row.registered_at_ms)?,
        country: country(row.country.as_deref()),
        city: city(row.city.as_deref()),
        beds: d.beds(&row.beds)?,
        is_pregnant: d.flag("is_pregnant", &row.is_pregnant)?,
        is_with_disability: d.flag("is_with_disability", &row.is_with_disability)?,
        is_with_animal: d.flag("is_with_animal", &row.is_with_animal)?,
        is_with_elderly: d.flag("is_with_elderly", &row.is_with_elderly)?,
        group_relation: GroupRelation::from_label(&row.group_relation)
            .ok_or_else(|| d.error("group_relation", &row.group_relation))?,
        acceptable_shelter_types: d.list(
            "acceptable_shelter_types",
            &row.acceptable_shelter_types,
            ShelterType::from_label,
        )?,
        is_ukrainian_nationality: d
            .flag("is_ukrainian_nationality", &row.is_ukrainian_nationality)?,
        duration_category: d.duration(&row.duration_category)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host_row() -> HostRow {
        HostRow {
            id: "h-1".to_string(),
            registered_at_ms: 1_650_000_000_000,
            country: None,
            city: Some(" Warsaw ".to_string()),
            shelter_type: "FLAT".to_string(),
            beds: "3".to_string(),
            acceptable_group_relations: "couple, single_woman,".to_string(),
            ok_for_pregnant: "TRUE".to_string(),
            ok_for_disabilities: "FALSE".to_string(),
            ok_for_animals: "true".to_string(),
            ok_for_elderly: "False".to_string(),
            ok_for_any_nationality: "TRUE".to_string(),
            duration_category: "month".to_string(),
            transport_included: None,
        }
    }

    fn guest_row() -> GuestRow {
        GuestRow {
            id: "g-1".to_string(),
            registered_at_ms: 1_650_000_000_000,
            country: Some("Poland".to_string()),
            city: Some("".to_string()),
            acceptable_shelter_types: "flat,room".to_string(),
            beds: "2".to_string(),
            group_relation: "couple".to_string(),
            is_pregnant: "FALSE".to_string(),
            is_with_disability: "FALSE".to_string(),
            is_with_animal: "TRUE".to_string(),
            is_with_elderly: "FALSE".to_string(),
            is_ukrainian_nationality: "TRUE".to_string(),
            duration_category: "2".to_string(),
        }
    }

    #[test]
    fn test_decode_host() {
        let host = decode_host(&host_row()).unwrap();

        assert_eq!(host.country, "poland");
        assert_eq!(host.city.as_deref(), Some("warsaw"));
        assert_eq!(host.shelter_type, ShelterType::Flat);
        assert_eq!(host.beds, 3);
        assert_eq!(host.acceptable_group_relations.len(), 2);
        assert!(host.ok_for_pregnant);
        assert!(!host.ok_for_disabilities);
        assert!(!host.ok_for_elderly);
        assert_eq!(host.duration_category, DurationCategory::Month);
        assert!(!host.transport_included);
    }

    #[test]
    fn test_decode_guest_blank_city_is_wildcard() {
        let guest = decode_guest(&guest_row()).unwrap();

        assert_eq!(guest.country, "poland");
        assert_eq!(guest.city, None);
        assert!(guest.is_with_animal);
        assert_eq!(guest.duration_category, DurationCategory::TwoToThreeWeeks);
    }

    #[test]
    fn test_safety_flag_never_defaults() {
        let mut row = guest_row();
        row.is_pregnant = "".to_string();

        match decode_guest(&row) {
            Err(MatchingError::Decode { field, id, .. }) => {
                assert_eq!(field, "is_pregnant");
                assert_eq!(id, "g-1");
            }
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_category_fails() {
        let mut row = host_row();
        row.acceptable_group_relations = "couple,neighbours".to_string();
        assert!(matches!(
            decode_host(&row),
            Err(MatchingError::Decode { field: "acceptable_group_relations", .. })
        ));

        let mut row = host_row();
        row.beds = "-1".to_string();
        assert!(matches!(decode_host(&row), Err(MatchingError::Decode { field: "beds", .. })));
    }

    #[test]
    fn test_present_transport_flag_must_parse() {
        let mut row = host_row();
        row.transport_included = Some("TRUE".to_string());
        assert!(decode_host(&row).unwrap().transport_included);

        row.transport_included = Some("sometimes".to_string());
        assert!(decode_host(&row).is_err());
    }
}
