use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::Value;
use tracing::debug;

use super::api::ErrorResult;
use crate::error::ZipApiError;
use crate::models::Entity;

pub async fn handler_404() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(ErrorResult::from("Not found")))
}

/// Ids come in as strings so that `/cities/abc` is a plain not-found instead of a 400.
pub fn parse_id(id: &str, entity: Entity) -> Result<i64, ZipApiError> {
    id.parse::<i64>().map_err(|_| {
        debug!("Non-numeric {entity} id requested: {id:?}");
        ZipApiError::NotFound(entity)
    })
}

/// Unparseable or missing bodies validate as if they were empty.
pub fn body_or_empty(payload: Result<Json<Value>, JsonRejection>) -> Value {
    match payload {
        Ok(Json(value)) => value,
        Err(err) => {
            debug!("Couldn't parse request body, treating it as empty: {err}");
            Value::Null
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("12", Entity::City).ok(), Some(12));
        assert!(matches!(
            parse_id("twelve", Entity::County),
            Err(ZipApiError::NotFound(Entity::County))
        ));
        assert!(parse_id("", Entity::City).is_err());
    }
}
