//! The request-facing stores: validation, county resolution and not-found
//! handling sit here, on top of the plain [crate::db] queries.

use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::ZipApiError;
use crate::models::County;

mod city;
mod county;

pub use city::CityStore;
pub use county::CountyStore;

/// Upsert-on-write: turn a county name from a city write into a county row.
///
/// The name must already be validated. Runs on the caller's transaction so the
/// county and the city that needs it land together.
pub(crate) async fn resolve_county(
    txn: &mut SqliteConnection,
    name: &str,
) -> Result<County, ZipApiError> {
    let (county, created) = County::find_or_create_with_txn(txn, name).await?;
    if created {
        debug!("Created county {county} while resolving a city write");
    }
    Ok(county)
}
