use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::db::{DBEntity, begin_write};
use crate::error::ZipApiError;
use crate::models::{City, County, Entity};
use crate::validation::{CountyInput, ValidatedInput, ValidationErrors, taken_message};

#[derive(Debug, Clone)]
pub struct CountyStore {
    pool: SqlitePool,
}

impl CountyStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<County>, ZipApiError> {
        County::get_all(&self.pool).await
    }

    pub async fn get(&self, id: i64) -> Result<County, ZipApiError> {
        County::get(&self.pool, id)
            .await?
            .ok_or(ZipApiError::NotFound(Entity::County))
    }

    /// The cities belonging to a county
    pub async fn cities(&self, id: i64) -> Result<Vec<City>, ZipApiError> {
        let county = self.get(id).await?;
        City::get_all_by_county(&self.pool, county.id).await
    }

    /// Create a county, the name has to be unused.
    pub async fn create(
        &self,
        input: impl ValidatedInput<CountyInput> + Send,
    ) -> Result<County, ZipApiError> {
        let input = input.into_validated()?;

        let mut txn = begin_write(&self.pool).await?;
        if County::get_by_name_with_txn(&mut txn, &input.name)
            .await?
            .is_some()
        {
            debug!("County {:?} already exists", input.name);
            return Err(ValidationErrors::single("name", taken_message("name")).into());
        }

        let county = match County::create_with_txn(&mut txn, &input.name).await {
            Ok(county) => county,
            // lost a race with another insert of the same name
            Err(err) if err.is_unique_violation() => {
                return Err(ValidationErrors::single("name", taken_message("name")).into());
            }
            Err(err) => return Err(err),
        };
        txn.commit().await?;

        info!("Created county {county}");
        Ok(county)
    }

    /// Rename a county in place.
    ///
    /// Existence is checked before the body is looked at, so a bad id wins over a bad body.
    pub async fn update(
        &self,
        id: i64,
        input: impl ValidatedInput<CountyInput> + Send,
    ) -> Result<County, ZipApiError> {
        let mut txn = begin_write(&self.pool).await?;
        let mut county = County::get_with_txn(&mut txn, id)
            .await?
            .ok_or(ZipApiError::NotFound(Entity::County))?;

        let input = input.into_validated()?;
        county.name = input.name;

        match county.update_with_txn(&mut txn).await {
            Ok(()) => {}
            Err(err) if err.is_unique_violation() => {
                debug!("Rename of county id={id} collides with an existing name");
                return Err(ValidationErrors::single("name", taken_message("name")).into());
            }
            Err(err) => return Err(err),
        }
        txn.commit().await?;

        info!("Updated county {county}");
        Ok(county)
    }

    /// Delete a county, refused while any city still references it.
    pub async fn delete(&self, id: i64) -> Result<(), ZipApiError> {
        let mut txn = begin_write(&self.pool).await?;
        if County::get_with_txn(&mut txn, id).await?.is_none() {
            return Err(ZipApiError::NotFound(Entity::County));
        }
        let cities = County::city_count_with_txn(&mut txn, id).await?;
        if cities > 0 {
            debug!("Refusing to delete county id={id}, {cities} cities reference it");
            return Err(ZipApiError::CountyInUse);
        }
        County::delete_with_txn(&mut txn, id).await?;
        txn.commit().await?;

        info!("Deleted county id={id}");
        Ok(())
    }

    /// Existing county by that name, or a new one. Safe to repeat.
    pub async fn find_or_create(&self, name: &str) -> Result<County, ZipApiError> {
        let input = CountyInput::new(name).into_validated()?;
        let mut txn = begin_write(&self.pool).await?;
        let (county, created) = County::find_or_create_with_txn(&mut txn, &input.name).await?;
        txn.commit().await?;
        if created {
            info!("Created county {county}");
        }
        Ok(county)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test::test_db;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_then_duplicate() -> Result<(), ZipApiError> {
        let store = CountyStore::new(test_db().await);

        let county = store.create(CountyInput::new("Pest")).await?;
        assert_eq!(county.name, "Pest");
        assert_eq!(store.get(county.id).await?, county);

        match store.create(&json!({"name": "Pest"})).await {
            Err(ZipApiError::Validation(errors)) => {
                assert_eq!(
                    errors.messages("name"),
                    Some(["The name has already been taken.".to_string()].as_slice())
                );
            }
            other => panic!("expected a validation error, got {other:?}"),
        }
        assert_eq!(store.list().await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_invalid() -> Result<(), ZipApiError> {
        let store = CountyStore::new(test_db().await);
        let res = store.create(&json!({"name": "   "})).await;
        assert!(matches!(res, Err(ZipApiError::Validation(_))));
        let res = store.create(CountyInput::new(&"x".repeat(256))).await;
        assert!(matches!(res, Err(ZipApiError::Validation(_))));
        assert!(store.list().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_find_or_create_repeatable() -> Result<(), ZipApiError> {
        let store = CountyStore::new(test_db().await);
        let first = store.find_or_create("Baranya").await?;
        let second = store.find_or_create("Baranya").await?;
        assert_eq!(first.id, second.id);
        assert_eq!(store.list().await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_update() -> Result<(), ZipApiError> {
        let store = CountyStore::new(test_db().await);
        let pest = store.create(CountyInput::new("Pest")).await?;
        let fejer = store.create(CountyInput::new("Fejér")).await?;

        let renamed = store.update(pest.id, CountyInput::new("Pest megye")).await?;
        assert_eq!(renamed.id, pest.id);
        assert_eq!(store.get(pest.id).await?.name, "Pest megye");

        // renaming to its own name is fine
        store.update(fejer.id, CountyInput::new("Fejér")).await?;

        // but not to someone else's
        let res = store.update(fejer.id, CountyInput::new("Pest megye")).await;
        assert!(matches!(res, Err(ZipApiError::Validation(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_missing_beats_invalid() {
        let store = CountyStore::new(test_db().await);
        let res = store.update(404, &json!({"name": ""})).await;
        assert!(matches!(res, Err(ZipApiError::NotFound(Entity::County))));
    }

    #[tokio::test]
    async fn test_delete() -> Result<(), ZipApiError> {
        let store = CountyStore::new(test_db().await);
        let county = store.create(CountyInput::new("Tolna")).await?;
        store.delete(county.id).await?;
        assert!(matches!(
            store.get(county.id).await,
            Err(ZipApiError::NotFound(Entity::County))
        ));
        assert!(matches!(
            store.delete(county.id).await,
            Err(ZipApiError::NotFound(Entity::County))
        ));
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_duplicate_create() -> Result<(), ZipApiError> {
        let dir = tempfile::tempdir().expect("failed to make tempdir");
        let store = CountyStore::new(crate::db::test::test_db_file(dir.path()).await);

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..32 {
            let store = store.clone();
            tasks.spawn(async move { store.create(CountyInput::new("Heves")).await });
        }

        let mut created = 0;
        while let Some(res) = tasks.join_next().await {
            match res.expect("task panicked") {
                Ok(_) => created += 1,
                Err(ZipApiError::Validation(errors)) => {
                    assert_eq!(errors.fields(), vec!["name"]);
                }
                Err(err) => panic!("unexpected error: {err}"),
            }
        }
        assert_eq!(created, 1);
        assert_eq!(store.list().await?.len(), 1);
        Ok(())
    }
}
