//! Normalization shared by the venue and artist writers.

use crate::error::{EntityKind, Result, StoreError};

/// Trim a required text field and reject it when nothing is left.
pub(crate) fn required(kind: EntityKind, field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(StoreError::validation(format!("{kind} {field} is required.")))
    } else {
        Ok(trimmed.to_string())
    }
}

/// Trim an optional text field; blank input means "no value".
pub(crate) fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Optional link that must look like a web URL when present.
pub(crate) fn link(field: &str, value: Option<String>) -> Result<Option<String>> {
    match optional(value) {
        Some(url) if url.starts_with("http://") || url.starts_with("https://") => Ok(Some(url)),
        Some(url) => Err(StoreError::validation(format!(
            "{field} must start with http:// or https:// (got '{url}')."
        ))),
        None => Ok(None),
    }
}
