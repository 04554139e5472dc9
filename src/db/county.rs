use super::prelude::*;

#[async_trait]
impl DBEntity for County {
    const TABLE: &'static str = "counties";

    async fn create_table(pool: &SqlitePool) -> Result<(), ZipApiError> {
        let mut tx = pool.begin().await?;

        debug!("Ensuring DB Counties table exists");
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS
            counties (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE
            )"#,
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
        let res = sqlx::query("SELECT id, name FROM counties WHERE id = ? LIMIT 1")
            .bind(id)
            .fetch_optional(&mut *txn)
            .await?;
        Ok(res.map(County::from))
    }

    async fn get_all(pool: &SqlitePool) -> Result<Vec<Self>, ZipApiError> {
        let res = sqlx::query("SELECT id, name FROM counties ORDER BY id")
            .fetch_all(pool)
            .await?;
        Ok(res.into_iter().map(County::from).collect())
    }
}

impl County {
    pub async fn get_by_name_with_txn(
        txn: &mut SqliteConnection,
        name: &str,
    ) -> Result<Option<Self>, ZipApiError> {
        let res = sqlx::query("SELECT id, name FROM counties WHERE name = ? LIMIT 1")
            .bind(name)
            .fetch_optional(&mut *txn)
            .await?;
        Ok(res.map(County::from))
    }

    /// Plain insert, fails on a duplicate name
    pub async fn create_with_txn(
        txn: &mut SqliteConnection,
        name: &str,
    ) -> Result<Self, ZipApiError> {
        let res = sqlx::query("INSERT INTO counties (name) VALUES (?)")
            .bind(name)
            .execute(&mut *txn)
            .await?;
        Ok(County {
            id: res.last_insert_rowid(),
            name: name.to_string(),
        })
    }

    pub async fn update_with_txn(&self, txn: &mut SqliteConnection) -> Result<(), ZipApiError> {
        sqlx::query("UPDATE counties SET name = ? WHERE id = ?")
            .bind(&self.name)
            .bind(self.id)
            .execute(&mut *txn)
            .await?;
        Ok(())
    }

    /// Returns the county called `name`, inserting it first if it's not there.
    ///
    /// The insert leans on the UNIQUE index instead of a check-then-insert, so
    /// two callers racing on the same name still end up with one row. The
    /// bool is true when this call created the row.
    #[instrument(level = "debug", skip(txn))]
    pub async fn find_or_create_with_txn(
        txn: &mut SqliteConnection,
        name: &str,
    ) -> Result<(Self, bool), ZipApiError> {
        let res = sqlx::query("INSERT INTO counties (name) VALUES (?) ON CONFLICT(name) DO NOTHING")
            .bind(name)
            .execute(&mut *txn)
            .await?;
        let created = res.rows_affected() == 1;

        match Self::get_by_name_with_txn(txn, name).await? {
            Some(county) => {
                trace!("find_or_create county={county} created={created}");
                Ok((county, created))
            }
            None => Err(sqlx::Error::RowNotFound.into()),
        }
    }

    /// How many cities point at this county
    pub async fn city_count_with_txn(
        txn: &mut SqliteConnection,
        id: i64,
    ) -> Result<i64, ZipApiError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM cities WHERE county_id = ?")
            .bind(id)
            .fetch_one(&mut *txn)
            .await?;
        Ok(count.0)
    }
}
