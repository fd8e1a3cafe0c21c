//! Team metadata from the teams endpoint

use super::lenient;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Team metadata keyed by `school`. Every other field is carried through
/// untouched, in upstream order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Team {
    #[serde(default, deserialize_with = "lenient")]
    pub school: Option<String>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Team {
    /// Decode one upstream value; non-objects become an unmatched, empty team.
    pub fn from_value(value: Value) -> Self {
        if !value.is_object() {
            return Self::default();
        }
        serde_json::from_value(value).unwrap_or_default()
    }
}
