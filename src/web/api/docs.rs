use utoipa::OpenApi;

use crate::models::{City, County};

#[derive(OpenApi)]
#[openapi(
    paths(
        super::city::api_list,
        super::city::api_get,
        super::city::api_create,
        super::city::api_update,
        super::city::api_delete,
        super::county::api_list,
        super::county::api_get,
        super::county::api_cities,
        super::county::api_create,
        super::county::api_update,
        super::county::api_delete,
    ),
    components(
        schemas(
            City,
            County,
            super::city::CityPayload,
            super::county::CountyPayload,
            super::ErrorResult,
            super::ValidationResult,
        )
    ),
    tags(
        (name = "Cities", description = "Cities and their postal codes"),
        (name = "Counties", description = "Counties, the parents of cities"),
    )
)]
pub(crate) struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_has_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/cities",
            "/api/cities/{id}",
            "/api/counties",
            "/api/counties/{id}",
            "/api/counties/{id}/cities",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
