//! Left join of flattened ranking rows with team metadata on `school`

use crate::artifact::ColumnarArtifact;
use crate::schema::{FlattenedRow, Team, FLATTENED_COLUMNS};

use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use tracing::warn;

/// Appended to a team attribute whose name is already a ranking column.
pub const COLLISION_SUFFIX: &str = "_right";

/// One merged record, keyed by output column name.
pub type MergedRow = Map<String, Value>;

/// The merged dataset: ranking columns first, then team columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedTable {
    columns: Vec<String>,
    rows: Vec<MergedRow>,
}

impl MergedTable {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[MergedRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn to_artifact(&self) -> ColumnarArtifact {
        ColumnarArtifact::from_records(&self.columns, &self.rows)
    }
}

/// Team attribute names in first-seen order, paired with their output column.
///
/// An attribute named like a ranking column takes the collision suffix,
/// repeated until the name is free of every ranking column, every team
/// attribute and every output already assigned.
fn team_columns(teams: &[Team]) -> Vec<(String, String)> {
    let attributes: HashSet<&str> = teams
        .iter()
        .flat_map(|team| team.attributes.keys().map(String::as_str))
        .collect();

    let mut seen: Vec<(String, String)> = Vec::new();
    for team in teams {
        for attribute in team.attributes.keys() {
            if seen.iter().any(|(source, _)| source == attribute) {
                continue;
            }
            let mut output = attribute.clone();
            if FLATTENED_COLUMNS.contains(&attribute.as_str()) {
                output.push_str(COLLISION_SUFFIX);
                while FLATTENED_COLUMNS.contains(&output.as_str())
                    || attributes.contains(output.as_str())
                    || seen.iter().any(|(_, taken)| *taken == output)
                {
                    output.push_str(COLLISION_SUFFIX);
                }
            }
            seen.push((attribute.clone(), output));
        }
    }
    seen
}

/// Left outer join on exact, case-sensitive `school` equality.
///
/// Every ranking row appears exactly once in the output, in input order.
/// When several teams share a school the first one wins. Rows without a
/// matching team, including rows with no school, carry `null` team fields.
pub fn merge(rows: Vec<FlattenedRow>, teams: &[Team]) -> MergedTable {
    let team_columns = team_columns(teams);

    let mut by_school: HashMap<&str, &Team> = HashMap::with_capacity(teams.len());
    let mut duplicates = 0usize;
    for team in teams {
        let Some(school) = team.school.as_deref() else {
            continue;
        };
        if by_school.contains_key(school) {
            duplicates += 1;
        } else {
            by_school.insert(school, team);
        }
    }
    if duplicates > 0 {
        warn!(duplicates, "Duplicate team schools ignored; first occurrence wins");
    }

    let merged_rows = rows
        .iter()
        .map(|row| {
            let team = row
                .school
                .as_deref()
                .and_then(|school| by_school.get(school).copied());

            let mut record = Map::with_capacity(FLATTENED_COLUMNS.len() + team_columns.len());
            for column in FLATTENED_COLUMNS {
                record.insert(column.to_string(), row.value(column));
            }
            for (source, output) in &team_columns {
                let value = team
                    .and_then(|team| team.attributes.get(source))
                    .cloned()
                    .unwrap_or(Value::Null);
                record.insert(output.clone(), value);
            }
            record
        })
        .collect();

    let columns = FLATTENED_COLUMNS
        .iter()
        .map(|column| column.to_string())
        .chain(team_columns.into_iter().map(|(_, output)| output))
        .collect();

    MergedTable {
        columns,
        rows: merged_rows,
    }
}
