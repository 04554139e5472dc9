pub(crate) use super::DBEntity;
pub(crate) use crate::error::ZipApiError;
pub(crate) use crate::models::{City, County};
pub(crate) use async_trait::async_trait;
pub(crate) use sqlx::{SqliteConnection, SqlitePool};
pub(crate) use tracing::*;
