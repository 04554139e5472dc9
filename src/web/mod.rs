//! The HTTP API

use axum::Router;
use axum::routing::get;
use sqlx::SqlitePool;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use crate::store::{CityStore, CountyStore};

pub mod api;
pub mod generic;
pub mod utils;

pub const STATUS_OK: &str = "Ok";

/// Handed to every handler. Cheap to clone, the stores only hold a pool.
#[derive(Debug, Clone)]
pub struct ZipState {
    pub cities: CityStore,
    pub counties: CountyStore,
}

impl ZipState {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            cities: CityStore::new(pool.clone()),
            counties: CountyStore::new(pool),
        }
    }
}

pub fn build(pool: SqlitePool) -> Router {
    let state = ZipState::new(pool);

    Router::new()
        .route("/status", get(generic::status))
        .nest("/api", api::new())
        .fallback(utils::handler_404)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
