//! SQLite persistence for counties and cities.

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};

use crate::config::ConfigFile;

pub mod city;
pub mod county;
mod prelude;

use prelude::*;

pub async fn get_conn(config: &ConfigFile) -> Result<SqlitePool, ZipApiError> {
    let db_path = config.sqlite_path_expanded()?;
    let db_url = format!("sqlite://{db_path}");
    debug!("Opening Database: {db_url}");

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .connect_with(options)
        .await
        .map_err(|err| ZipApiError::StartupError(format!("Error opening SQLite DB ({db_url:?}): {err:?}")))
}

/// Every write transaction goes through here. It holds the write lock from the
/// first statement, so a read-then-write never has to upgrade a shared lock.
pub async fn begin_write(pool: &SqlitePool) -> Result<Transaction<'static, Sqlite>, ZipApiError> {
    Ok(pool.begin_with("BEGIN IMMEDIATE").await?)
}

/// Create the tables if they aren't there, counties first because cities reference them.
pub async fn start_db(pool: &SqlitePool) -> Result<(), ZipApiError> {
    County::create_table(pool).await?;
    City::create_table(pool).await?;

    info!("Completed DB Startup!");
    Ok(())
}

/// The storage interface each entity implements.
#[async_trait]
pub trait DBEntity: Sized + Send {
    const TABLE: &'static str;

    async fn create_table(pool: &SqlitePool) -> Result<(), ZipApiError>;

    /// Get by id
    async fn get(pool: &SqlitePool, id: i64) -> Result<Option<Self>, ZipApiError> {
        let mut conn = pool.acquire().await?;
        Self::get_with_txn(&mut conn, id).await
    }

    async fn get_with_txn(txn: &mut SqliteConnection, id: i64)
    -> Result<Option<Self>, ZipApiError>;

    /// Everything in the table, ordered by id
    async fn get_all(pool: &SqlitePool) -> Result<Vec<Self>, ZipApiError>;

    /// Returns false if there was nothing with that id to delete
    async fn delete_with_txn(txn: &mut SqliteConnection, id: i64) -> Result<bool, ZipApiError> {
        let query = format!("DELETE FROM {} WHERE id = ?", Self::TABLE);
        let res = sqlx::query(&query).bind(id).execute(&mut *txn).await?;
        Ok(res.rows_affected() > 0)
    }
}
