use axum::{
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::any::Any;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;

use crate::api::handlers;
use crate::error::ApiError;
use crate::store::traits::Store;

/// Render a panicked handler as a masked 500 in the error envelope.
pub(crate) fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("non-string panic payload");
    ApiError::Store(anyhow::anyhow!("handler panicked: {}", detail)).into_response()
}

pub fn create_router<S: Store + 'static>() -> Router<Arc<S>> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Devices
        .route(
            "/devices",
            get(handlers::list_devices::<S>).post(handlers::create_device::<S>),
        )
        .route(
            "/devices/:device/locations",
            get(handlers::list_device_locations::<S>),
        )
        .route(
            "/devices/:device/locations/latest",
            get(handlers::get_latest_device_location::<S>),
        )
        // Locations
        .route(
            "/locations",
            get(handlers::list_locations::<S>).post(handlers::create_location::<S>),
        )
        .fallback(handlers::route_not_found)
        .layer(CatchPanicLayer::custom(panic_response))
}
