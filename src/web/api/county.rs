use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use utoipa::ToSchema;

use super::{ErrorResult, ValidationResult};
use crate::error::ZipApiError;
use crate::models::{City, County, Entity};
use crate::web::ZipState;
use crate::web::utils::{body_or_empty, parse_id};

#[derive(Deserialize, ToSchema)]
#[allow(dead_code)]
pub struct CountyPayload {
    /// Unique on create
    name: String,
}

#[utoipa::path(
    get,
    path = "/api/counties",
    responses((status = 200, body = [County])),
    tag = "Counties"
)]
pub(crate) async fn api_list(
    State(state): State<ZipState>,
) -> Result<Json<Vec<County>>, ZipApiError> {
    Ok(Json(state.counties.list().await?))
}

#[utoipa::path(
    get,
    path = "/api/counties/{id}",
    params(("id" = i64, Path, description = "County id")),
    responses(
        (status = 200, body = County),
        (status = 404, body = ErrorResult, example = json!({"message": "County with id not found"})),
    ),
    tag = "Counties"
)]
pub(crate) async fn api_get(
    State(state): State<ZipState>,
    Path(id): Path<String>,
) -> Result<Json<County>, ZipApiError> {
    let id = parse_id(&id, Entity::County)?;
    Ok(Json(state.counties.get(id).await?))
}

#[utoipa::path(
    get,
    path = "/api/counties/{id}/cities",
    params(("id" = i64, Path, description = "County id")),
    responses(
        (status = 200, body = [City]),
        (status = 404, body = ErrorResult),
    ),
    tag = "Counties"
)]
pub(crate) async fn api_cities(
    State(state): State<ZipState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<City>>, ZipApiError> {
    let id = parse_id(&id, Entity::County)?;
    Ok(Json(state.counties.cities(id).await?))
}

#[utoipa::path(
    post,
    path = "/api/counties",
    request_body = CountyPayload,
    responses(
        (status = 201, body = County),
        (status = 422, body = ValidationResult),
    ),
    tag = "Counties"
)]
pub(crate) async fn api_create(
    State(state): State<ZipState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<County>), ZipApiError> {
    let body = body_or_empty(payload);
    let county = state.counties.create(&body).await?;
    Ok((StatusCode::CREATED, Json(county)))
}

#[utoipa::path(
    put,
    path = "/api/counties/{id}",
    params(("id" = i64, Path, description = "County id")),
    request_body = CountyPayload,
    responses(
        (status = 200, body = County),
        (status = 404, body = ErrorResult),
        (status = 422, body = ValidationResult),
    ),
    tag = "Counties"
)]
pub(crate) async fn api_update(
    State(state): State<ZipState>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<County>, ZipApiError> {
    let id = parse_id(&id, Entity::County)?;
    let body = body_or_empty(payload);
    Ok(Json(state.counties.update(id, &body).await?))
}

/// Refused with a 409 while cities still belong to the county
#[utoipa::path(
    delete,
    path = "/api/counties/{id}",
    params(("id" = i64, Path, description = "County id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, body = ErrorResult),
        (status = 409, body = ErrorResult),
    ),
    tag = "Counties"
)]
pub(crate) async fn api_delete(
    State(state): State<ZipState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ZipApiError> {
    let id = parse_id(&id, Entity::County)?;
    state.counties.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
