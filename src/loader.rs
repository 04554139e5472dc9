//! Bulk import of counties and cities from CSV files.
//!
//! Counties go first, since city rows point at them. Both loads are
//! find-or-create per row, so running them again over the same files is a no-op.

use std::path::Path;

use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{error, info, warn};

use crate::db::{DBEntity, begin_write};
use crate::error::ZipApiError;
use crate::models::{City, County};
use crate::store::resolve_county;
use crate::validation::{CityInput, CountyInput, ValidatedInput};

const BYTE_ORDER_MARK: char = '\u{feff}';

/// What a load did with its rows
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// Non-blank rows read from the file
    pub rows: usize,
    pub created: usize,
    /// Rows that matched something already in the database
    pub existing: usize,
    /// Rows that were unusable, each one is logged
    pub skipped: usize,
}

impl LoadReport {
    fn record(&mut self, created: bool) {
        match created {
            true => self.created += 1,
            false => self.existing += 1,
        }
    }
}

/// Split one CSV line into trimmed fields.
///
/// Handles double-quoted fields with `""` escapes. Quoted fields can't span lines.
pub fn parse_csv_line(line: &str) -> Vec<String> {
    let mut fields = vec![];
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match (c, in_quotes) {
            ('"', true) => {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            ('"', false) => in_quotes = true,
            (',', false) => fields.push(std::mem::take(&mut current)),
            (c, _) => current.push(c),
        }
    }
    fields.push(current);

    fields
        .into_iter()
        .map(|field| field.trim_start_matches(BYTE_ORDER_MARK).trim().to_string())
        .collect()
}

/// One non-blank line of a CSV file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvRow {
    /// 1-based line number in the file
    pub line: usize,
    pub fields: Vec<String>,
}

/// Read a whole file into rows, dropping blank ones.
///
/// A missing file is reported before anything else happens, so nothing is
/// half-imported.
pub async fn read_rows(path: &Path) -> Result<Vec<CsvRow>, ZipApiError> {
    let contents = match tokio::fs::read_to_string(path).await {
        Ok(val) => val,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(ZipApiError::MissingResourceFile(path.to_path_buf()));
        }
        Err(err) => return Err(err.into()),
    };

    Ok(contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim_start_matches(BYTE_ORDER_MARK).trim().is_empty())
        .map(|(index, line)| CsvRow {
            line: index + 1,
            fields: parse_csv_line(line),
        })
        .filter(|row| row.fields.iter().any(|field| !field.is_empty()))
        .collect())
}

/// One county name per row, only the first field is used.
pub async fn load_counties(pool: &SqlitePool, path: &Path) -> Result<LoadReport, ZipApiError> {
    let rows = read_rows(path).await?;
    let mut report = LoadReport::default();

    let mut txn = begin_write(pool).await?;
    for row in &rows {
        report.rows += 1;
        let name = row.fields.first().map(String::as_str).unwrap_or_default();
        let input = match CountyInput::new(name).into_validated() {
            Ok(val) => val,
            Err(err) => {
                warn!("Skipping county line {}: {err}", row.line);
                report.skipped += 1;
                continue;
            }
        };
        let (_, created) = County::find_or_create_with_txn(&mut txn, &input.name).await?;
        report.record(created);
    }
    txn.commit().await?;

    info!(
        "Import succeeded: {} counties loaded from {} ({} new, {} existing, {} skipped)",
        report.rows,
        path.display(),
        report.created,
        report.existing,
        report.skipped
    );
    Ok(report)
}

/// `zip,name,county` rows.
///
/// An integer county is an id from an earlier county load and has to exist
/// already. Anything else is a county name and gets find-or-created, the same
/// as the API does.
pub async fn load_cities(pool: &SqlitePool, path: &Path) -> Result<LoadReport, ZipApiError> {
    let rows = read_rows(path).await?;
    let mut report = LoadReport::default();

    let mut txn = begin_write(pool).await?;
    for row in &rows {
        report.rows += 1;
        let lineno = row.line;

        let [zip, name, county_ref] = match row.fields.as_slice() {
            [zip, name, county_ref, ..] => [zip, name, county_ref],
            _ => {
                warn!(
                    "Skipping city line {lineno}: expected 3 fields, got {}",
                    row.fields.len()
                );
                report.skipped += 1;
                continue;
            }
        };

        let input = match CityInput::new(zip, name, county_ref).into_validated() {
            Ok(val) => val,
            Err(err) => {
                warn!("Skipping city line {lineno}: {err}");
                report.skipped += 1;
                continue;
            }
        };

        let county_id = match input.county.parse::<i64>() {
            Ok(id) => match County::get_with_txn(&mut txn, id).await? {
                Some(county) => county.id,
                None => {
                    warn!("Skipping city line {lineno}: no county with id {id}");
                    report.skipped += 1;
                    continue;
                }
            },
            Err(_) => resolve_county(&mut txn, &input.county).await?.id,
        };

        let (_, created) =
            City::find_or_create_with_txn(&mut txn, &input.zip, &input.name, county_id).await?;
        report.record(created);
    }
    txn.commit().await?;

    info!(
        "Import succeeded: {} cities loaded from {} ({} new, {} existing, {} skipped)",
        report.rows,
        path.display(),
        report.created,
        report.existing,
        report.skipped
    );
    Ok(report)
}

/// Counties then cities. A failed load is logged and doesn't stop the other
/// one, the first error is returned once both have had their turn.
pub async fn seed(
    pool: &SqlitePool,
    counties_file: &Path,
    cities_file: &Path,
) -> Result<(LoadReport, LoadReport), ZipApiError> {
    let counties = load_counties(pool, counties_file).await.inspect_err(|err| {
        error!("County import failed: {err}");
    });
    let cities = load_cities(pool, cities_file).await.inspect_err(|err| {
        error!("City import failed: {err}");
    });
    Ok((counties?, cities?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test::test_db;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn csv_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("failed to create temp file");
        file.write_all(contents.as_bytes())
            .expect("failed to write temp file");
        file
    }

    #[test]
    fn test_parse_csv_line() {
        assert_eq!(parse_csv_line("1000, Budapest ,1"), vec!["1000", "Budapest", "1"]);
        assert_eq!(
            parse_csv_line(r#"2000,"Szentendre, city","Pest ""megye""""#),
            vec!["2000", "Szentendre, city", r#"Pest "megye""#]
        );
        assert_eq!(parse_csv_line("\u{feff}Baranya"), vec!["Baranya"]);
        assert_eq!(parse_csv_line(""), vec![""]);
    }

    #[tokio::test]
    async fn test_read_rows_keeps_file_line_numbers() -> Result<(), ZipApiError> {
        let file = csv_file("\u{feff}7621,Pécs,Baranya\n\n   \n,,\n1000,Budapest,Pest\r\n");
        let rows = read_rows(file.path()).await?;
        let lines: Vec<usize> = rows.iter().map(|row| row.line).collect();
        assert_eq!(lines, vec![1, 5]);
        assert_eq!(rows[0].fields, vec!["7621", "Pécs", "Baranya"]);
        assert_eq!(rows[1].fields, vec!["1000", "Budapest", "Pest"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_file() {
        let pool = test_db().await;
        let path = Path::new("/this/does/not/exist/megyek.csv");
        match load_counties(&pool, path).await {
            Err(ZipApiError::MissingResourceFile(missing)) => assert_eq!(missing, path),
            other => panic!("expected MissingResourceFile, got {other:?}"),
        }
        let err = load_cities(&pool, path).await.expect_err("should fail");
        assert!(err.to_string().contains("/this/does/not/exist/megyek.csv"));
    }

    #[tokio::test]
    async fn test_county_load_idempotent() -> Result<(), ZipApiError> {
        let pool = test_db().await;
        let file = csv_file("\u{feff}Baranya\r\n  Bács-Kiskun \n\n   \nBaranya\nPest\n");

        let first = load_counties(&pool, file.path()).await?;
        assert_eq!(
            first,
            LoadReport {
                rows: 4,
                created: 3,
                existing: 1,
                skipped: 0
            }
        );
        let counties = County::get_all(&pool).await?;
        let names: Vec<&str> = counties.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Baranya", "Bács-Kiskun", "Pest"]);

        let second = load_counties(&pool, file.path()).await?;
        assert_eq!(second.created, 0);
        assert_eq!(second.existing, 4);
        assert_eq!(County::get_all(&pool).await?.len(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_city_load() -> Result<(), ZipApiError> {
        let pool = test_db().await;
        let counties = csv_file("Baranya\nPest\n");
        let cities = csv_file(
            "7621, Pécs ,1\n1000,Budapest,2\n2000,Szentendre,Pest\n2100,Gödöllő,99\n12,Bad zip,1\nshort,row\n3300,Eger,Heves\n",
        );

        load_counties(&pool, counties.path()).await?;
        let report = load_cities(&pool, cities.path()).await?;
        assert_eq!(
            report,
            LoadReport {
                rows: 7,
                created: 4,
                existing: 0,
                skipped: 3
            }
        );

        let all = City::get_all(&pool).await?;
        assert_eq!(all.len(), 4);
        assert_eq!(all[0].name, "Pécs");
        assert_eq!(all[0].county.name, "Baranya");
        assert_eq!(all[1].county.name, "Pest");
        assert_eq!(all[2].county.name, "Pest");
        // named counties get created on the way
        assert_eq!(all[3].county.name, "Heves");

        let again = load_cities(&pool, cities.path()).await?;
        assert_eq!(again.created, 0);
        assert_eq!(again.existing, 4);
        assert_eq!(City::get_all(&pool).await?.len(), 4);
        Ok(())
    }

    #[tokio::test]
    async fn test_seed_reports_missing_cities() -> Result<(), ZipApiError> {
        let pool = test_db().await;
        let counties = csv_file("Somogy\n");
        let res = seed(&pool, counties.path(), Path::new("/nope/iranyitoszamok.csv")).await;
        assert!(matches!(res, Err(ZipApiError::MissingResourceFile(_))));
        // the county load still happened
        assert_eq!(County::get_all(&pool).await?.len(), 1);
        Ok(())
    }
}
