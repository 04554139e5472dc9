use axum::Json;
use axum::Router;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::{OpenApi, ToSchema};

use super::ZipState;
use crate::error::ZipApiError;
use crate::validation::ValidationErrors;

pub mod city;
pub mod county;
pub mod docs;

/// The body of every non-validation error
#[derive(Debug, Serialize, Deserialize, Clone, ToSchema)]
pub struct ErrorResult {
    pub message: String,
}

impl From<&str> for ErrorResult {
    fn from(input: &str) -> Self {
        ErrorResult {
            message: input.to_string(),
        }
    }
}

/// A 422, every failed field with its messages
#[derive(Debug, Serialize, Clone, ToSchema)]
pub struct ValidationResult {
    pub message: String,
    #[schema(value_type = std::collections::HashMap<String, Vec<String>>)]
    pub errors: ValidationErrors,
}

impl IntoResponse for ZipApiError {
    fn into_response(self) -> Response {
        match self {
            err @ ZipApiError::NotFound(_) => (
                StatusCode::NOT_FOUND,
                Json(ErrorResult::from(err.to_string().as_str())),
            )
                .into_response(),
            err @ ZipApiError::CountyInUse => (
                StatusCode::CONFLICT,
                Json(ErrorResult::from(err.to_string().as_str())),
            )
                .into_response(),
            ZipApiError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ValidationResult {
                    message: errors.summary(),
                    errors,
                }),
            )
                .into_response(),
            err => {
                error!("Request failed: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResult::from("Server Error")),
                )
                    .into_response()
            }
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ZipApiVersion {
    version: String,
}

impl Default for ZipApiVersion {
    fn default() -> Self {
        Self {
            version: format!("zipapi {}", env!("CARGO_PKG_VERSION")),
        }
    }
}

pub async fn version_get() -> Json<ZipApiVersion> {
    Json::from(ZipApiVersion::default())
}

pub async fn openapi_get() -> Json<utoipa::openapi::OpenApi> {
    Json(docs::ApiDoc::openapi())
}

pub fn new() -> Router<ZipState> {
    Router::new()
        .route("/cities", get(city::api_list).post(city::api_create))
        .route(
            "/cities/{id}",
            get(city::api_get)
                .put(city::api_update)
                .delete(city::api_delete),
        )
        .route("/counties", get(county::api_list).post(county::api_create))
        .route(
            "/counties/{id}",
            get(county::api_get)
                .put(county::api_update)
                .delete(county::api_delete),
        )
        .route("/counties/{id}/cities", get(county::api_cities))
        .route("/version", get(version_get))
        .route("/openapi.json", get(openapi_get))
}
