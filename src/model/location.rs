use crate::model::{generate_id, Id};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const LATITUDE_RANGE: std::ops::RangeInclusive<f64> = -90.0..=90.0;
pub const LONGITUDE_RANGE: std::ops::RangeInclusive<f64> = -180.0..=180.0;

/// A single GPS fix for a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(rename = "_id")]
    pub id: Id,
    pub device: Id,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl Location {
    pub fn new(device: Id, latitude: f64, longitude: f64) -> Self {
        Self {
            id: generate_id(),
            device,
            latitude,
            longitude,
            created_at: Utc::now(),
        }
    }
}

/// Body of `POST /locations`.
///
/// Every field stays a raw JSON value: the repository decides presence,
/// device resolution, numeric coercion and range checks in that order.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewLocation {
    pub device: Option<serde_json::Value>,
    pub latitude: Option<serde_json::Value>,
    pub longitude: Option<serde_json::Value>,
}
