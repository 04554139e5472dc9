use super::prelude::*;

/// Every city read goes through this join, so the county is always attached.
pub(crate) const SELECT_JOINED: &str = "SELECT
    cities.id, cities.zip, cities.name, cities.county_id, counties.name AS county_name
    FROM cities
    INNER JOIN counties ON counties.id = cities.county_id";

#[async_trait]
impl DBEntity for City {
    const TABLE: &'static str = "cities";

    async fn create_table(pool: &SqlitePool) -> Result<(), ZipApiError> {
        let mut tx = pool.begin().await?;

        debug!("Ensuring DB Cities table exists");
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS
            cities (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                zip TEXT NOT NULL,
                name TEXT NOT NULL,
                county_id INTEGER NOT NULL,
                FOREIGN KEY(county_id) REFERENCES counties(id) ON DELETE RESTRICT
            )"#,
        )
        .execute(&mut *tx)
        .await?;

        debug!("Ensuring DB Cities indexes exist");
        sqlx::query("CREATE INDEX IF NOT EXISTS ind_cities_county ON cities (county_id)")
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            "CREATE INDEX
            IF NOT EXISTS
            ind_cities_fields
            ON cities (
                zip, name, county_id
            )",
        )
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn get_with_txn(
        txn: &mut SqliteConnection,
        id: i64,
    ) -> Result<Option<Self>, ZipApiError> {
        let res = sqlx::query(&format!("{SELECT_JOINED} WHERE cities.id = ? LIMIT 1"))
            .bind(id)
            .fetch_optional(&mut *txn)
            .await?;
        Ok(res.map(City::from))
    }

    async fn get_all(pool: &SqlitePool) -> Result<Vec<Self>, ZipApiError> {
        let res = sqlx::query(&format!("{SELECT_JOINED} ORDER BY cities.id"))
            .fetch_all(pool)
            .await?;
        Ok(res.into_iter().map(City::from).collect())
    }
}

impl City {
    pub async fn get_all_by_county(
        pool: &SqlitePool,
        county_id: i64,
    ) -> Result<Vec<Self>, ZipApiError> {
        let res = sqlx::query(&format!(
            "{SELECT_JOINED} WHERE cities.county_id = ? ORDER BY cities.id"
        ))
        .bind(county_id)
        .fetch_all(pool)
        .await?;
        Ok(res.into_iter().map(City::from).collect())
    }

    /// Insert a row and hand back its id
    pub async fn create_with_txn(
        txn: &mut SqliteConnection,
        zip: &str,
        name: &str,
        county_id: i64,
    ) -> Result<i64, ZipApiError> {
        let res = sqlx::query("INSERT INTO cities (zip, name, county_id) VALUES (?1, ?2, ?3)")
            .bind(zip)
            .bind(name)
            .bind(county_id)
            .execute(&mut *txn)
            .await?;
        Ok(res.last_insert_rowid())
    }

    pub async fn update_with_txn(
        txn: &mut SqliteConnection,
        id: i64,
        zip: &str,
        name: &str,
        county_id: i64,
    ) -> Result<(), ZipApiError> {
        sqlx::query("UPDATE cities SET zip = ?, name = ?, county_id = ? WHERE id = ?")
            .bind(zip)
            .bind(name)
            .bind(county_id)
            .bind(id)
            .execute(&mut *txn)
            .await?;
        Ok(())
    }

    /// Finds the row matching all three values or inserts it, returning `(id, created)`.
    ///
    /// No UNIQUE index covers these columns because the API accepts duplicate
    /// cities, so this is only race-free inside the loader's write transaction.
    pub async fn find_or_create_with_txn(
        txn: &mut SqliteConnection,
        zip: &str,
        name: &str,
        county_id: i64,
    ) -> Result<(i64, bool), ZipApiError> {
        let existing: Option<(i64,)> = sqlx::query_as(
            "SELECT id FROM cities WHERE zip = ? AND name = ? AND county_id = ? LIMIT 1",
        )
        .bind(zip)
        .bind(name)
        .bind(county_id)
        .fetch_optional(&mut *txn)
        .await?;

        match existing {
            Some((id,)) => Ok((id, false)),
            None => Ok((Self::create_with_txn(txn, zip, name, county_id).await?, true)),
        }
    }
}
