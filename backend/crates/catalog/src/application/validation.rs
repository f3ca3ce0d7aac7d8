//! Input helpers shared by the write use cases

use kernel::error::field_errors::FieldErrors;

use crate::domain::value_objects::ValueError;

/// Trimmed text, `None` when absent or blank
pub fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Record a length error when `value` has more than `max` characters
pub fn check_max_chars(errors: &mut FieldErrors, field: &str, value: &str, max: usize) -> bool {
    if value.chars().count() > max {
        errors.add(
            field,
            format!("Ensure this field has no more than {max} characters."),
        );
        return false;
    }
    true
}

/// Run a value-object constructor, recording its message under `field`
pub fn check<T>(errors: &mut FieldErrors, field: &str, result: Result<T, ValueError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            errors.add(field, e.to_string());
            None
        }
    }
}
