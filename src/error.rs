use thiserror::Error;

/// Every failure a route can end in.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing required fields (device, latitude, longitude)")]
    MissingFields,
    #[error("Missing required field (name)")]
    MissingName,
    #[error("Invalid input data")]
    InvalidInput,
    #[error("Invalid latitude or longitude value")]
    InvalidRange,
    #[error("Device not found")]
    DeviceNotFound,
    #[error("Location not found")]
    LocationNotFound,
    #[error("Route not found")]
    RouteNotFound,
    /// Anything unexpected from the persistence layer. Never shown to callers.
    #[error("Server Error")]
    Store(#[from] anyhow::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;
