use once_cell::sync::Lazy;
use regex::Regex;

/// Longest string accepted for a name field, counted in characters.
pub const MAX_NAME_LENGTH: usize = 255;

pub static ZIP_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{4}$").expect("Failed to parse an internal regex!"));

/// Exactly four ASCII digits, nothing else.
pub fn zip_code(zip: &str) -> bool {
    ZIP_CODE.is_match(zip)
}

/// Non-empty and no longer than `max` characters.
///
/// Length is measured in `char`s so "Komárom-Esztergom" counts as 17, not 18.
pub fn bounded_string(value: &str, max: usize) -> bool {
    if value.is_empty() {
        return false;
    }
    value.chars().count() <= max
}

pub fn name(value: &str) -> bool {
    bounded_string(value, MAX_NAME_LENGTH)
}
