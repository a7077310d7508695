use itertools::Itertools;
use std::fmt;

use crate::model::{EntityKind, CREATED_AT_FIELD, PUBLIC_ID_FIELD, STORE_ID_FIELD};

/// Deduplicated set of field names, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSet(Vec<String>);

impl FieldSet {
    pub fn new<I, T>(fields: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self(
            fields
                .into_iter()
                .map(Into::into)
                .filter(|field: &String| !field.is_empty())
                .unique()
                .collect(),
        )
    }

    /// Split a comma-separated parameter. Entries are used verbatim.
    pub fn parse(raw: &str) -> Self {
        Self::new(raw.split(','))
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.iter().any(|f| f == field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn union<I, T>(self, extra: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self::new(self.0.into_iter().chain(extra.into_iter().map(Into::into)))
    }
}

impl fmt::Display for FieldSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(" "))
    }
}

/// Whether the projection is for a paginated listing or a single-record read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionMode {
    Listing,
    Single,
}

/// Build the projection for `kind` from the raw `selectFields` parameter.
pub fn select_fields(kind: EntityKind, raw: Option<&str>, mode: ProjectionMode) -> FieldSet {
    let requested = raw.map(FieldSet::parse).filter(|set| !set.is_empty());

    let Some(requested) = requested else {
        return FieldSet::new(kind.default_fields().iter().copied());
    };

    // `id` is the public spelling of the store identity field
    let requested = FieldSet::new(requested.0.into_iter().map(|field| {
        if field == PUBLIC_ID_FIELD {
            STORE_ID_FIELD.to_string()
        } else {
            field
        }
    }));

    let mut projection = requested.union(kind.baseline_fields().iter().copied());
    if mode == ProjectionMode::Listing {
        projection = projection.union([CREATED_AT_FIELD]);
    }
    projection
}

/// Build the expansion set for `kind` from the raw `populateFields` parameter.
/// Names that are not relations of `kind` are dropped.
pub fn populate_fields(kind: EntityKind, raw: Option<&str>) -> FieldSet {
    let Some(raw) = raw else {
        return FieldSet::default();
    };
    let relations = kind.relation_fields();
    FieldSet::new(
        FieldSet::parse(raw)
            .0
            .into_iter()
            .filter(|field| relations.contains(&field.as_str())),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_deduplicates_and_keeps_values_verbatim() {
        let set = FieldSet::parse("latitude,latitude, longitude,,device");
        assert_eq!(set.to_string(), "latitude  longitude device");
        assert!(set.contains(" longitude"));
        assert!(!set.contains("longitude"));
    }

    #[test]
    fn missing_selection_falls_back_to_endpoint_default() {
        let devices = select_fields(EntityKind::Device, None, ProjectionMode::Listing);
        assert_eq!(devices.to_string(), "_id name createdAt");

        let locations = select_fields(EntityKind::Location, Some(""), ProjectionMode::Single);
        assert_eq!(
            locations.to_string(),
            "_id device latitude longitude createdAt"
        );
    }

    #[test]
    fn caller_selection_gets_baseline_and_listing_timestamp() {
        let listing = select_fields(
            EntityKind::Location,
            Some("latitude,latitude"),
            ProjectionMode::Listing,
        );
        assert_eq!(listing.to_string(), "latitude _id createdAt");

        let single = select_fields(EntityKind::Device, Some("createdAt"), ProjectionMode::Single);
        assert_eq!(single.to_string(), "createdAt _id name");
    }

    #[test]
    fn public_id_is_accepted_in_selection() {
        let set = select_fields(EntityKind::Device, Some("id"), ProjectionMode::Single);
        assert_eq!(set.to_string(), "_id name");
    }

    #[test]
    fn unknown_relations_are_silently_dropped() {
        let set = populate_fields(EntityKind::Location, Some("owner,device,device"));
        assert_eq!(set.to_string(), "device");

        assert!(populate_fields(EntityKind::Device, Some("device")).is_empty());
        assert!(populate_fields(EntityKind::Location, None).is_empty());
    }
}
