use crate::model::{generate_id, Id};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A tracked device as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    #[serde(rename = "_id")]
    pub id: Id,
    pub name: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl Device {
    pub fn new(name: String) -> Self {
        Self {
            id: generate_id(),
            name,
            created_at: Utc::now(),
        }
    }
}

/// Body of `POST /devices`. Kept loose so a missing name maps to our own error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewDevice {
    pub name: Option<serde_json::Value>,
}

/// Fields of a device that may be embedded into another record on expansion.
pub const DEVICE_EXPANSION_FIELDS: &[&str] = &["_id", "name"];
