//! Field-level rules applied before every write.
//!
//! Inputs come either from a JSON request body or from code (the bulk loader,
//! tests). Both paths end up in [ValidatedInput::into_validated], so a rule is
//! only ever written once.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use std::fmt::Display;
use zip_lib::validators;

/// Every failed rule for a request, grouped by field in the order the fields were checked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<(&'static str, Vec<String>)>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// A single-field failure, handy for database-level conflicts.
    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        match self.errors.iter_mut().find(|(name, _)| *name == field) {
            Some((_, messages)) => messages.push(message.into()),
            None => self.errors.push((field, vec![message.into()])),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.errors.iter().any(|(name, _)| *name == field)
    }

    /// Names of the offending fields.
    pub fn fields(&self) -> Vec<&'static str> {
        self.errors.iter().map(|(name, _)| *name).collect()
    }

    pub fn messages(&self, field: &str) -> Option<&[String]> {
        self.errors
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, messages)| messages.as_slice())
    }

    /// The first message, plus a count of how many others there were.
    pub fn summary(&self) -> String {
        let mut messages = self.errors.iter().flat_map(|(_, messages)| messages.iter());
        let first = match messages.next() {
            Some(message) => message.to_owned(),
            None => return "The given data was invalid.".to_string(),
        };
        match messages.count() {
            0 => first,
            1 => format!("{first} (and 1 more error)"),
            others => format!("{first} (and {others} more errors)"),
        }
    }

    fn into_result<T>(self, value: T) -> Result<T, Self> {
        match self.is_empty() {
            true => Ok(value),
            false => Err(self),
        }
    }
}

impl std::error::Error for ValidationErrors {}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.summary())
    }
}

impl Serialize for ValidationErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.errors.len()))?;
        for (field, messages) in &self.errors {
            map.serialize_entry(field, messages)?;
        }
        map.end()
    }
}

/// Anything that can be turned into a checked `T`, reporting every failed rule at once.
pub trait ValidatedInput<T> {
    fn into_validated(self) -> Result<T, ValidationErrors>;
}

pub(crate) fn required_message(field: &str) -> String {
    format!("The {field} field is required.")
}

pub(crate) fn taken_message(field: &str) -> String {
    format!("The {field} has already been taken.")
}

fn string_message(field: &str) -> String {
    format!("The {field} field must be a string.")
}

fn too_long_message(field: &str) -> String {
    format!(
        "The {field} field must not be greater than {} characters.",
        validators::MAX_NAME_LENGTH
    )
}

fn digits_message(field: &str) -> String {
    format!("The {field} field must be 4 digits.")
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    Text,
    Digits,
}

/// Pull a field out of a request body, trimming it.
///
/// Absent, `null` and blank strings all count as missing. Digit fields also
/// take JSON integers, checked by their decimal form.
fn extract(
    body: &Value,
    field: &'static str,
    kind: FieldKind,
    errors: &mut ValidationErrors,
) -> String {
    match body.get(field) {
        None | Some(Value::Null) => {
            errors.add(field, required_message(field));
            String::new()
        }
        Some(Value::String(value)) => {
            let value = value.trim();
            if value.is_empty() {
                errors.add(field, required_message(field));
            }
            value.to_string()
        }
        Some(Value::Number(value)) if kind == FieldKind::Digits => value.to_string(),
        Some(_) => {
            errors.add(
                field,
                match kind {
                    FieldKind::Text => string_message(field),
                    FieldKind::Digits => digits_message(field),
                },
            );
            String::new()
        }
    }
}

fn check_zip(field: &'static str, value: &str, errors: &mut ValidationErrors) {
    if errors.contains(field) {
        return;
    }
    if value.is_empty() {
        errors.add(field, required_message(field));
    } else if !validators::zip_code(value) {
        errors.add(field, digits_message(field));
    }
}

fn check_name(field: &'static str, value: &str, errors: &mut ValidationErrors) {
    if errors.contains(field) {
        return;
    }
    if value.is_empty() {
        errors.add(field, required_message(field));
    } else if !validators::name(value) {
        errors.add(field, too_long_message(field));
    }
}

/// The body of a city create or update. `county` is a county *name*.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityInput {
    pub zip: String,
    pub name: String,
    pub county: String,
}

impl CityInput {
    pub fn new(zip: &str, name: &str, county: &str) -> Self {
        Self {
            zip: zip.trim().to_string(),
            name: name.trim().to_string(),
            county: county.trim().to_string(),
        }
    }

    fn check(&self, errors: &mut ValidationErrors) {
        check_zip("zip", &self.zip, errors);
        check_name("name", &self.name, errors);
        check_name("county", &self.county, errors);
    }
}

impl ValidatedInput<CityInput> for CityInput {
    fn into_validated(self) -> Result<CityInput, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        self.check(&mut errors);
        errors.into_result(self)
    }
}

impl ValidatedInput<CityInput> for &Value {
    fn into_validated(self) -> Result<CityInput, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        // each field is fully checked before the next is read, so errors keep field order
        let zip = extract(self, "zip", FieldKind::Digits, &mut errors);
        check_zip("zip", &zip, &mut errors);
        let name = extract(self, "name", FieldKind::Text, &mut errors);
        check_name("name", &name, &mut errors);
        let county = extract(self, "county", FieldKind::Text, &mut errors);
        check_name("county", &county, &mut errors);
        errors.into_result(CityInput { zip, name, county })
    }
}

/// The body of a county create or update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountyInput {
    pub name: String,
}

impl CountyInput {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.trim().to_string(),
        }
    }
}

impl ValidatedInput<CountyInput> for CountyInput {
    fn into_validated(self) -> Result<CountyInput, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_name("name", &self.name, &mut errors);
        errors.into_result(self)
    }
}

impl ValidatedInput<CountyInput> for &Value {
    fn into_validated(self) -> Result<CountyInput, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let input = CountyInput {
            name: extract(self, "name", FieldKind::Text, &mut errors),
        };
        check_name("name", &input.name, &mut errors);
        errors.into_result(input)
    }
}
