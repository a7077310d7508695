use serde_json::Value;

use crate::error::{ApiError, ApiResult};
use crate::model::{LATITUDE_RANGE, LONGITUDE_RANGE};

/// A supplied field counts as present unless it is `null` or an empty string.
pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// Text form of a device reference; non-string JSON scalars use their literal form.
pub fn reference_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Numbers and numeric strings coerce; everything else, NaN and infinities do not.
pub fn coerce_coordinate(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

/// Coerce and range-check a coordinate pair.
pub fn validate_coordinates(latitude: &Value, longitude: &Value) -> ApiResult<(f64, f64)> {
    let (Some(latitude), Some(longitude)) = (coerce_coordinate(latitude), coerce_coordinate(longitude))
    else {
        return Err(ApiError::InvalidInput);
    };

    if !LATITUDE_RANGE.contains(&latitude) || !LONGITUDE_RANGE.contains(&longitude) {
        return Err(ApiError::InvalidRange);
    }

    Ok((latitude, longitude))
}
