use sqlx::SqlitePool;
use tracing::info;

use super::resolve_county;
use crate::db::{DBEntity, begin_write};
use crate::error::ZipApiError;
use crate::models::{City, Entity};
use crate::validation::{CityInput, ValidatedInput};

#[derive(Debug, Clone)]
pub struct CityStore {
    pool: SqlitePool,
}

impl CityStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<City>, ZipApiError> {
        City::get_all(&self.pool).await
    }

    pub async fn get(&self, id: i64) -> Result<City, ZipApiError> {
        City::get(&self.pool, id)
            .await?
            .ok_or(ZipApiError::NotFound(Entity::City))
    }

    /// Validate, find-or-create the named county, insert, then read the joined row back.
    pub async fn create(
        &self,
        input: impl ValidatedInput<CityInput> + Send,
    ) -> Result<City, ZipApiError> {
        let input = input.into_validated()?;

        let mut txn = begin_write(&self.pool).await?;
        let county = resolve_county(&mut txn, &input.county).await?;
        let id = City::create_with_txn(&mut txn, &input.zip, &input.name, county.id).await?;
        let city = City::get_with_txn(&mut txn, id)
            .await?
            .ok_or(ZipApiError::NotFound(Entity::City))?;
        txn.commit().await?;

        info!("Created city {city}");
        Ok(city)
    }

    /// Same rules as [Self::create], applied to an existing row.
    ///
    /// Existence is checked before the body is looked at, so a bad id wins over a bad body.
    pub async fn update(
        &self,
        id: i64,
        input: impl ValidatedInput<CityInput> + Send,
    ) -> Result<City, ZipApiError> {
        let mut txn = begin_write(&self.pool).await?;
        if City::get_with_txn(&mut txn, id).await?.is_none() {
            return Err(ZipApiError::NotFound(Entity::City));
        }

        let input = input.into_validated()?;
        let county = resolve_county(&mut txn, &input.county).await?;
        City::update_with_txn(&mut txn, id, &input.zip, &input.name, county.id).await?;
        let city = City::get_with_txn(&mut txn, id)
            .await?
            .ok_or(ZipApiError::NotFound(Entity::City))?;
        txn.commit().await?;

        info!("Updated city {city}");
        Ok(city)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ZipApiError> {
        let mut txn = begin_write(&self.pool).await?;
        if !City::delete_with_txn(&mut txn, id).await? {
            return Err(ZipApiError::NotFound(Entity::City));
        }
        txn.commit().await?;

        info!("Deleted city id={id}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test::test_db;
    use crate::models::County;
    use crate::store::CountyStore;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_then_get() -> Result<(), ZipApiError> {
        let pool = test_db().await;
        let store = CityStore::new(pool.clone());

        let city = store
            .create(CityInput::new("1000", "Budapest", "Pest"))
            .await?;
        assert_eq!(city.zip, "1000");
        assert_eq!(city.name, "Budapest");
        assert_eq!(city.county.name, "Pest");

        let fetched = store.get(city.id).await?;
        assert_eq!(fetched, city);
        assert_eq!(fetched.county.name, "Pest");
        Ok(())
    }

    #[tokio::test]
    async fn test_county_reused() -> Result<(), ZipApiError> {
        let pool = test_db().await;
        let store = CityStore::new(pool.clone());
        let counties = CountyStore::new(pool.clone());

        let existing = counties.find_or_create("Pest").await?;
        let first = store
            .create(&json!({"zip": "2000", "name": "Szentendre", "county": "Pest"}))
            .await?;
        let second = store
            .create(&json!({"zip": "2600", "name": "Vác", "county": "Pest"}))
            .await?;

        assert_eq!(first.county_id, existing.id);
        assert_eq!(second.county_id, existing.id);
        assert_eq!(County::get_all(&pool).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_invalid_reports_all_fields() -> Result<(), ZipApiError> {
        let pool = test_db().await;
        let store = CityStore::new(pool.clone());

        match store
            .create(&json!({"zip": "12", "name": "", "county": ""}))
            .await
        {
            Err(ZipApiError::Validation(errors)) => {
                assert_eq!(errors.fields(), vec!["zip", "name", "county"]);
            }
            other => panic!("expected a validation error, got {other:?}"),
        }
        // nothing written, not even a county
        assert!(store.list().await?.is_empty());
        assert!(County::get_all(&pool).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_update_moves_county() -> Result<(), ZipApiError> {
        let pool = test_db().await;
        let store = CityStore::new(pool.clone());

        let city = store
            .create(CityInput::new("2000", "Szentendre", "Pest"))
            .await?;
        let updated = store
            .update(city.id, CityInput::new("2400", "Dunaújváros", "Fejér"))
            .await?;

        assert_eq!(updated.id, city.id);
        assert_eq!(updated.zip, "2400");
        assert_eq!(updated.name, "Dunaújváros");
        assert_eq!(updated.county.name, "Fejér");
        assert_ne!(updated.county_id, city.county_id);
        assert_eq!(store.list().await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_missing_beats_invalid() {
        let store = CityStore::new(test_db().await);
        let res = store
            .update(9999, &json!({"zip": "x", "name": "", "county": ""}))
            .await;
        assert!(matches!(res, Err(ZipApiError::NotFound(Entity::City))));

        let res = store
            .update(9999, CityInput::new("1000", "Budapest", "Pest"))
            .await;
        assert!(matches!(res, Err(ZipApiError::NotFound(Entity::City))));
    }

    #[tokio::test]
    async fn test_update_existing_invalid() -> Result<(), ZipApiError> {
        let store = CityStore::new(test_db().await);
        let city = store
            .create(CityInput::new("1000", "Budapest", "Pest"))
            .await?;
        let res = store.update(city.id, &json!({"zip": "100"})).await;
        match res {
            Err(ZipApiError::Validation(errors)) => {
                assert_eq!(errors.fields(), vec!["zip", "name", "county"]);
            }
            other => panic!("expected a validation error, got {other:?}"),
        }
        // untouched
        assert_eq!(store.get(city.id).await?, city);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete() -> Result<(), ZipApiError> {
        let store = CityStore::new(test_db().await);
        let city = store
            .create(CityInput::new("7621", "Pécs", "Baranya"))
            .await?;
        store.delete(city.id).await?;
        assert!(matches!(
            store.get(city.id).await,
            Err(ZipApiError::NotFound(Entity::City))
        ));
        assert!(matches!(
            store.delete(city.id).await,
            Err(ZipApiError::NotFound(Entity::City))
        ));
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_updates() -> Result<(), ZipApiError> {
        let dir = tempfile::tempdir().expect("failed to make tempdir");
        let pool = crate::db::test::test_db_file(dir.path()).await;
        let store = CityStore::new(pool.clone());
        let city = store
            .create(CityInput::new("1000", "Budapest", "Pest"))
            .await?;

        let counties = ["Pest", "Fejér", "Tolna", "Baranya"];
        let mut tasks = tokio::task::JoinSet::new();
        for n in 0..32 {
            let store = store.clone();
            let county = counties[n % counties.len()];
            let id = city.id;
            tasks.spawn(async move {
                store
                    .update(id, CityInput::new("1000", "Budapest", county))
                    .await
            });
        }
        while let Some(res) = tasks.join_next().await {
            res.expect("task panicked")?;
        }

        // every county name resolved to exactly one row
        assert_eq!(County::get_all(&pool).await?.len(), counties.len());
        assert_eq!(store.list().await?.len(), 1);
        Ok(())
    }
}
