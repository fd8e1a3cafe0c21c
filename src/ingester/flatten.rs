//! Season flattening: nested polls and ranks into one row per rank entry

use crate::schema::{FlattenedRow, Season};
use crate::Result;

use serde_json::Value;
use std::num::NonZeroUsize;

/// Flatten one season, preserving poll order and then rank order.
pub fn flatten_season(season: &Season) -> Vec<FlattenedRow> {
    season
        .polls
        .iter()
        .flat_map(|poll| {
            poll.ranks.iter().map(move |rank| FlattenedRow {
                season: season.season,
                season_type: season.season_type.clone(),
                week: season.week,
                poll: poll.poll.clone(),
                school: rank.school.clone(),
                rank: rank.rank,
                conference: rank.conference.clone(),
                first_place_votes: rank.first_place_votes,
                points: rank.points,
            })
        })
        .collect()
}

/// Decode and flatten one raw upstream season value.
pub fn flatten_value(value: Value) -> Vec<FlattenedRow> {
    flatten_season(&Season::from_value(value))
}

/// Flatten every season on blocking worker threads.
///
/// Seasons are split into one contiguous chunk per available CPU. Chunks are
/// joined back in input order, so the output matches a sequential flatten.
pub async fn flatten_all(seasons: Vec<Value>) -> Result<Vec<FlattenedRow>> {
    if seasons.is_empty() {
        return Ok(Vec::new());
    }

    let workers = std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1);
    let chunk_size = seasons.len().div_ceil(workers);

    let mut chunks: Vec<Vec<Value>> = Vec::with_capacity(workers);
    let mut remaining = seasons.into_iter().peekable();
    while remaining.peek().is_some() {
        chunks.push(remaining.by_ref().take(chunk_size).collect());
    }

    let handles: Vec<_> = chunks
        .into_iter()
        .map(|chunk| {
            tokio::task::spawn_blocking(move || {
                chunk.into_iter().flat_map(flatten_value).collect::<Vec<_>>()
            })
        })
        .collect();

    let mut rows = Vec::new();
    for handle in handles {
        rows.extend(handle.await?);
    }
    Ok(rows)
}
