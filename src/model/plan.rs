use crate::model::{FieldSet, Id, CREATED_AT_FIELD};

/// Record filter. An empty filter matches the whole collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    /// Restrict to records belonging to (locations) or being (devices) this device.
    pub device: Option<Id>,
}

impl Filter {
    pub fn for_device(device: Id) -> Self {
        Self {
            device: Some(device),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Only the exact string `desc` sorts descending.
    pub fn from_param(order: Option<&str>) -> Self {
        match order {
            Some("desc") => SortDirection::Desc,
            _ => SortDirection::Asc,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

impl Sort {
    pub fn new(field: Option<&str>, direction: SortDirection) -> Self {
        let field = match field {
            Some(field) if !field.is_empty() => field.to_string(),
            _ => CREATED_AT_FIELD.to_string(),
        };
        Self { field, direction }
    }
}

impl Default for Sort {
    fn default() -> Self {
        Self::new(None, SortDirection::Asc)
    }
}

/// Fully-built read query. Only the repository and the stores know how to run it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryPlan {
    pub filter: Filter,
    pub sort: Sort,
    pub skip: u64,
    /// `None` means no limit clause at all.
    pub limit: Option<u64>,
    pub projection: FieldSet,
    pub expansion: FieldSet,
}
