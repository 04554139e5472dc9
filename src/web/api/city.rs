use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use utoipa::ToSchema;

use super::{ErrorResult, ValidationResult};
use crate::error::ZipApiError;
use crate::models::{City, Entity};
use crate::web::ZipState;
use crate::web::utils::{body_or_empty, parse_id};

/// What a client sends to create or update a city
#[derive(Deserialize, ToSchema)]
#[allow(dead_code)]
pub struct CityPayload {
    /// Exactly 4 digits
    zip: String,
    name: String,
    /// County *name*, created if it doesn't exist yet
    county: String,
}

#[utoipa::path(
    get,
    path = "/api/cities",
    responses((status = 200, description = "All cities with their county", body = [City])),
    tag = "Cities"
)]
pub(crate) async fn api_list(State(state): State<ZipState>) -> Result<Json<Vec<City>>, ZipApiError> {
    Ok(Json(state.cities.list().await?))
}

#[utoipa::path(
    get,
    path = "/api/cities/{id}",
    params(("id" = i64, Path, description = "City id")),
    responses(
        (status = 200, body = City),
        (status = 404, body = ErrorResult, example = json!({"message": "City with id not found"})),
    ),
    tag = "Cities"
)]
pub(crate) async fn api_get(
    State(state): State<ZipState>,
    Path(id): Path<String>,
) -> Result<Json<City>, ZipApiError> {
    let id = parse_id(&id, Entity::City)?;
    Ok(Json(state.cities.get(id).await?))
}

#[utoipa::path(
    post,
    path = "/api/cities",
    request_body = CityPayload,
    responses(
        (status = 201, body = City),
        (status = 422, body = ValidationResult),
    ),
    tag = "Cities"
)]
pub(crate) async fn api_create(
    State(state): State<ZipState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<City>), ZipApiError> {
    let body = body_or_empty(payload);
    let city = state.cities.create(&body).await?;
    debug!("api_create city={city}");
    Ok((StatusCode::CREATED, Json(city)))
}

/// HTTP Put <https://developer.mozilla.org/en-US/docs/Web/HTTP/Methods/PUT>
#[utoipa::path(
    put,
    path = "/api/cities/{id}",
    params(("id" = i64, Path, description = "City id")),
    request_body = CityPayload,
    responses(
        (status = 200, body = City),
        (status = 404, body = ErrorResult),
        (status = 422, body = ValidationResult),
    ),
    tag = "Cities"
)]
pub(crate) async fn api_update(
    State(state): State<ZipState>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<City>, ZipApiError> {
    let id = parse_id(&id, Entity::City)?;
    let body = body_or_empty(payload);
    Ok(Json(state.cities.update(id, &body).await?))
}

/// Delete an object
/// <https://developer.mozilla.org/en-US/docs/Web/HTTP/Methods/DELETE>
#[utoipa::path(
    delete,
    path = "/api/cities/{id}",
    params(("id" = i64, Path, description = "City id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, body = ErrorResult),
    ),
    tag = "Cities"
)]
pub(crate) async fn api_delete(
    State(state): State<ZipState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ZipApiError> {
    let id = parse_id(&id, Entity::City)?;
    state.cities.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
