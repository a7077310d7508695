use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::api::response::ApiResponse;
use crate::error::{ApiError, ApiResult};
use crate::logic::query_builder::{build_latest_location_query, build_list_query, QueryParams};
use crate::logic::repository::RecordRepository;
use crate::model::{Document, EntityKind, Id, NewDevice, NewLocation, PageEnvelope};
use crate::store::traits::Store;

pub type AppState<S> = Arc<S>;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: Id,
}

pub async fn health_check() -> ApiResponse<HealthResponse> {
    ApiResponse::ok(
        "Service is healthy",
        HealthResponse {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        },
    )
}

pub async fn route_not_found() -> ApiError {
    ApiError::RouteNotFound
}

/// Decoded query-string pairs in request order; repeated keys are resolved by `QueryParams`.
pub type QueryPairs = Vec<(String, String)>;

fn query_params(query: Result<Query<QueryPairs>, QueryRejection>) -> ApiResult<QueryParams> {
    query.map(|Query(pairs)| pairs.into_iter().collect()).map_err(|rejection| {
        log::warn!("rejected query string: {}", rejection);
        ApiError::InvalidInput
    })
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    body.map(|Json(body)| body).map_err(|rejection| {
        log::warn!("rejected request body: {}", rejection);
        ApiError::InvalidInput
    })
}

async fn list_page<S: Store>(
    store: &S,
    kind: EntityKind,
    scope: Option<&str>,
    params: &QueryParams,
) -> ApiResult<PageEnvelope<Document>> {
    let query = build_list_query(store, kind, scope, params).await?;
    Ok(RecordRepository::new(store).fetch_page(&query).await?)
}

pub async fn create_device<S: Store>(
    State(store): State<AppState<S>>,
    body: Result<Json<NewDevice>, JsonRejection>,
) -> ApiResult<ApiResponse<CreatedResponse>> {
    let body = json_body(body)?;
    let id = RecordRepository::new(&*store).create_device(body).await?;
    Ok(ApiResponse::created(
        "Device created successfully",
        CreatedResponse { id },
    ))
}

pub async fn list_devices<S: Store>(
    State(store): State<AppState<S>>,
    query: Result<Query<QueryPairs>, QueryRejection>,
) -> ApiResult<ApiResponse<PageEnvelope<Document>>> {
    let params = query_params(query)?;
    let page = list_page(&*store, EntityKind::Device, None, &params).await?;
    Ok(ApiResponse::ok("Devices fetched successfully", page))
}

pub async fn create_location<S: Store>(
    State(store): State<AppState<S>>,
    body: Result<Json<NewLocation>, JsonRejection>,
) -> ApiResult<ApiResponse<CreatedResponse>> {
    let body = json_body(body)?;
    let id = RecordRepository::new(&*store).create_location(body).await?;
    Ok(ApiResponse::created(
        "Location created successfully",
        CreatedResponse { id },
    ))
}

pub async fn list_locations<S: Store>(
    State(store): State<AppState<S>>,
    query: Result<Query<QueryPairs>, QueryRejection>,
) -> ApiResult<ApiResponse<PageEnvelope<Document>>> {
    let params = query_params(query)?;
    let page = list_page(&*store, EntityKind::Location, None, &params).await?;
    Ok(ApiResponse::ok("Locations fetched successfully", page))
}

pub async fn list_device_locations<S: Store>(
    State(store): State<AppState<S>>,
    Path(device): Path<String>,
    query: Result<Query<QueryPairs>, QueryRejection>,
) -> ApiResult<ApiResponse<PageEnvelope<Document>>> {
    let params = query_params(query)?;
    let page = list_page(&*store, EntityKind::Location, Some(&device), &params).await?;
    Ok(ApiResponse::ok("Locations fetched successfully", page))
}

pub async fn get_latest_device_location<S: Store>(
    State(store): State<AppState<S>>,
    Path(device): Path<String>,
    query: Result<Query<QueryPairs>, QueryRejection>,
) -> ApiResult<ApiResponse<Document>> {
    let params = query_params(query)?;
    let plan = build_latest_location_query(&*store, &device, &params).await?;
    let location = RecordRepository::new(&*store)
        .latest_location(&plan)
        .await?
        .ok_or(ApiError::LocationNotFound)?;
    Ok(ApiResponse::ok("Latest location fetched successfully", location))
}
