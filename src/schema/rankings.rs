//! Season -> Poll -> Rank nesting as delivered by the rankings endpoint

use super::{lenient, lenient_entries, lenient_seq};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Column order of a flattened ranking row.
pub const FLATTENED_COLUMNS: [&str; 9] = [
    "season",
    "seasonType",
    "week",
    "poll",
    "school",
    "rank",
    "conference",
    "firstPlaceVotes",
    "points",
];

/// One ranking snapshot: a season week with its polls.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Season {
    #[serde(default, deserialize_with = "lenient")]
    pub season: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub season_type: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub week: Option<i64>,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub polls: Vec<Poll>,
}

impl Season {
    /// Decode one upstream value. Anything that is not an object yields an
    /// empty season, which flattens to zero rows.
    pub fn from_value(value: Value) -> Self {
        if !value.is_object() {
            return Self::default();
        }
        serde_json::from_value(value).unwrap_or_default()
    }
}

/// A named poll and its ordered entries.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Poll {
    #[serde(default, deserialize_with = "lenient")]
    pub poll: Option<String>,
    /// Malformed entries decode as an empty [`Rank`] so each still yields a row
    #[serde(default, deserialize_with = "lenient_entries")]
    pub ranks: Vec<Rank>,
}

/// One team's standing within a poll.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rank {
    #[serde(default, deserialize_with = "lenient")]
    pub school: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub rank: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub conference: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub first_place_votes: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub points: Option<i64>,
}

/// Denormalized (season, poll, rank-entry) row. Absent values serialize as
/// explicit `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlattenedRow {
    pub season: Option<i64>,
    pub season_type: Option<String>,
    pub week: Option<i64>,
    pub poll: Option<String>,
    pub school: Option<String>,
    pub rank: Option<i64>,
    pub conference: Option<String>,
    pub first_place_votes: Option<i64>,
    pub points: Option<i64>,
}

impl FlattenedRow {
    /// Value of a column listed in [`FLATTENED_COLUMNS`]; unknown names are null.
    pub fn value(&self, column: &str) -> Value {
        fn num(v: Option<i64>) -> Value {
            v.map(Value::from).unwrap_or(Value::Null)
        }
        fn text(v: &Option<String>) -> Value {
            v.as_deref().map(Value::from).unwrap_or(Value::Null)
        }

        match column {
            "season" => num(self.season),
            "seasonType" => text(&self.season_type),
            "week" => num(self.week),
            "poll" => text(&self.poll),
            "school" => text(&self.school),
            "rank" => num(self.rank),
            "conference" => text(&self.conference),
            "firstPlaceVotes" => num(self.first_place_votes),
            "points" => num(self.points),
            _ => Value::Null,
        }
    }
}
