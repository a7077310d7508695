use uuid::Uuid;

pub type Id = Uuid;

/// Loosely-typed record as it leaves the repository (projected, expanded, normalized).
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Name of the identity field inside stored documents.
pub const STORE_ID_FIELD: &str = "_id";
/// Name of the identity field in every public record.
pub const PUBLIC_ID_FIELD: &str = "id";
pub const CREATED_AT_FIELD: &str = "createdAt";

pub fn generate_id() -> Id {
    Uuid::new_v4()
}

/// Parse a caller-supplied reference as a canonical identity literal.
pub fn parse_id(reference: &str) -> Option<Id> {
    Uuid::parse_str(reference).ok()
}

/// The two collections this service persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Device,
    Location,
}

impl EntityKind {
    /// Fields every caller-supplied projection is extended with.
    pub fn baseline_fields(&self) -> &'static [&'static str] {
        match self {
            EntityKind::Device => &["_id", "name"],
            EntityKind::Location => &["_id"],
        }
    }

    /// Projection used when the caller does not ask for specific fields.
    pub fn default_fields(&self) -> &'static [&'static str] {
        match self {
            EntityKind::Device => &["_id", "name", "createdAt"],
            EntityKind::Location => &["_id", "device", "latitude", "longitude", "createdAt"],
        }
    }

    /// Fields holding a reference to another collection.
    pub fn relation_fields(&self) -> &'static [&'static str] {
        match self {
            EntityKind::Device => &[],
            EntityKind::Location => &["device"],
        }
    }

    pub fn plural(&self) -> &'static str {
        match self {
            EntityKind::Device => "devices",
            EntityKind::Location => "locations",
        }
    }
}
