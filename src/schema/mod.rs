//! Record shapes for upstream ranking and team data
//!
//! Upstream payloads are heterogeneous: fields go missing, change type, or
//! appear unannounced. Every field is optional and decoded leniently, so a
//! malformed value becomes `None` instead of failing the whole document.

mod rankings;
mod team;

pub use rankings::{FlattenedRow, Poll, Rank, Season, FLATTENED_COLUMNS};
pub use team::Team;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Decode a field as `T`, mapping absent, null or wrongly-typed input to `None`.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| serde_json::from_value(value).ok()))
}

/// Like [`lenient`] for sequences of records: a non-list becomes empty and
/// elements that are not objects, or fail to decode, are skipped.
pub(crate) fn lenient_seq<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter(Value::is_object)
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

/// Like [`lenient_seq`], but every element is kept: one that is not an
/// object, or fails to decode, becomes `T::default()`.
pub(crate) fn lenient_entries<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| {
                if item.is_object() {
                    serde_json::from_value(item).unwrap_or_default()
                } else {
                    T::default()
                }
            })
            .collect(),
        _ => Vec::new(),
    })
}
