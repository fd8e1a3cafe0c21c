//! Poll artifact endpoints

use super::telemetry::{record_outcome, record_rows_served, Outcome};
use super::ApiState;
use crate::artifact::{decode_payload, ArtifactLocator, Payload};
use crate::Error;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info};

const UNCONFIGURED_MESSAGE: &str = "S3_BUCKET environment variable not set";
const NO_POLL_DATA_MESSAGE: &str = "No poll data found";

/// Why a request could not be served.
#[derive(Debug)]
enum ApiError {
    /// Object storage is not configured
    Unconfigured,
    /// No matching artifact; expected on a fresh deployment
    NotFound(String),
    /// Storage or decoding failure
    Failed(Error),
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError::Failed(e)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Unconfigured => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Failed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Unconfigured => UNCONFIGURED_MESSAGE.to_string(),
            ApiError::NotFound(message) => message.clone(),
            ApiError::Failed(e) => e.to_string(),
        }
    }

    fn outcome(&self) -> Outcome {
        match self {
            ApiError::Unconfigured => Outcome::Unconfigured,
            ApiError::NotFound(_) => Outcome::NotFound,
            ApiError::Failed(_) => Outcome::Failed,
        }
    }

    fn render(self, route: &'static str, strict_status_codes: bool) -> Response {
        record_outcome(route, self.outcome());
        match &self {
            ApiError::Failed(e) => error!(route, error = %e, "Request failed"),
            other => info!(route, reason = %other.message(), "Nothing to serve"),
        }

        let status = if strict_status_codes {
            self.status()
        } else {
            StatusCode::OK
        };
        (status, Json(json!({"error": self.message()}))).into_response()
    }
}

fn locator(state: &ApiState) -> Result<&ArtifactLocator, ApiError> {
    state.locator.as_ref().ok_or(ApiError::Unconfigured)
}

fn respond(state: &ApiState, route: &'static str, result: Result<Value, ApiError>) -> Response {
    match result {
        Ok(body) => {
            record_outcome(route, Outcome::Served);
            Json(body).into_response()
        }
        Err(e) => e.render(route, state.strict_status_codes),
    }
}

#[derive(Debug, Deserialize)]
pub struct LatestPollQuery {
    pub season: Option<i32>,
}

/// Rows of the newest merged artifact, optionally restricted to one season.
///
/// Without a season the body is a bare row array; with one it is
/// `{"season": s, "data": rows}`. Documents without `columns` are returned
/// unchanged.
pub async fn latest_poll(
    State(state): State<ApiState>,
    Query(query): Query<LatestPollQuery>,
) -> Response {
    let result = latest_poll_body(&state, query.season).await;
    respond(&state, LATEST_POLL_ROUTE, result)
}

const LATEST_POLL_ROUTE: &str = "/api/latest-poll";

async fn latest_poll_body(state: &ApiState, season: Option<i32>) -> Result<Value, ApiError> {
    let locator = locator(state)?;
    let latest = locator
        .latest(season)
        .await?
        .ok_or_else(|| ApiError::NotFound(NO_POLL_DATA_MESSAGE.to_string()))?;

    let bytes = locator.fetch(&latest).await?;
    let rows = match decode_payload(&bytes)? {
        Payload::Passthrough(document) => return Ok(document),
        Payload::Rows(rows) => rows,
    };

    info!(key = %latest.key, rows = rows.len(), "Serving poll artifact");
    record_rows_served(LATEST_POLL_ROUTE, rows.len());
    let rows = Value::Array(rows.into_iter().map(Value::Object).collect());
    Ok(match season {
        Some(season) => json!({"season": season, "data": rows}),
        None => rows,
    })
}

/// Listing metadata for every merged artifact of a season.
pub async fn season_polls(State(state): State<ApiState>, Path(season): Path<i32>) -> Response {
    let result = season_polls_body(&state, season).await;
    respond(&state, "/api/polls/:season", result)
}

async fn season_polls_body(state: &ApiState, season: i32) -> Result<Value, ApiError> {
    let files = locator(state)?.list_season(season).await?;
    if files.is_empty() {
        return Err(ApiError::NotFound(format!(
            "No poll data found for season {season}"
        )));
    }
    Ok(json!({"season": season, "files": files}))
}

/// Seasons with merged artifacts, newest first.
pub async fn seasons(State(state): State<ApiState>) -> Response {
    let result = seasons_body(&state).await;
    respond(&state, "/api/seasons", result)
}

async fn seasons_body(state: &ApiState) -> Result<Value, ApiError> {
    let seasons = locator(state)?.seasons().await?;
    Ok(json!({"seasons": seasons}))
}
