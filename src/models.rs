//! The two reference-data entities served by the API.

use serde::{Deserialize, Serialize};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use std::fmt::Display;
use utoipa::ToSchema;

/// An administrative region, the parent of a set of [City] records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct County {
    pub id: i64,
    /// Unique across all counties
    pub name: String,
}

/// A settlement with a postal code, always read back with its [County] attached.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct City {
    pub id: i64,
    /// Four digits, stored as text so leading zeroes survive
    pub zip: String,
    pub name: String,
    pub county_id: i64,
    pub county: County,
}

impl From<SqliteRow> for County {
    fn from(input: SqliteRow) -> Self {
        County {
            id: input.get("id"),
            name: input.get("name"),
        }
    }
}

/// Expects the joined shape produced by `crate::db::city::SELECT_JOINED`.
impl From<SqliteRow> for City {
    fn from(input: SqliteRow) -> Self {
        let county_id: i64 = input.get("county_id");
        City {
            id: input.get("id"),
            zip: input.get("zip"),
            name: input.get("name"),
            county_id,
            county: County {
                id: county_id,
                name: input.get("county_name"),
            },
        }
    }
}

impl Display for County {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "id={} name={:?}", self.id, self.name)
    }
}

impl Display for City {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "id={} zip={} name={:?} county={:?}",
            self.id, self.zip, self.name, self.county.name
        )
    }
}

/// Which kind of record a lookup was for, used to word not-found errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    City,
    County,
}

impl Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Entity::City => f.write_str("City"),
            Entity::County => f.write_str("County"),
        }
    }
}
