//! JSON arrays stored in text columns.
//!
//! `categories`, `tags`, `images` and asset `files` are persisted as JSON text.
//! Decoding is fail-soft: absent, `null` or malformed values decode to an empty list
//! so a corrupt row renders as "no tags" instead of failing the whole listing.

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Encode a list as a JSON array.
pub fn encode<T: Serialize>(values: &[T]) -> String {
    serde_json::to_string(values).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to encode JSON text column");
        "[]".to_string()
    })
}

/// Encode a list of strings as a JSON array.
pub fn encode_list(values: &[String]) -> String {
    encode(values)
}

/// Decode a JSON array column, returning an empty list on absent or malformed input.
pub fn decode<T: DeserializeOwned>(raw: Option<&str>) -> Vec<T> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Vec::new();
    };

    match serde_json::from_str::<Option<Vec<T>>>(raw) {
        Ok(values) => values.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(error = %e, "malformed JSON text column, treating as empty");
            Vec::new()
        }
    }
}

/// Decode a JSON array of strings, returning an empty list on absent or malformed input.
pub fn decode_list(raw: Option<&str>) -> Vec<String> {
    decode(raw)
}
