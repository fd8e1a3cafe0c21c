//! Read API instrumentation.
//!
//! Error payloads usually carry status 200, so handlers report what they
//! served through [`record_outcome`] rather than leaving it to the status
//! code seen by the middleware.

use axum::extract::MatchedPath;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use opentelemetry::global;
use opentelemetry::metrics::{Counter, Histogram};
use opentelemetry::KeyValue;
use std::sync::OnceLock;
use std::time::Instant;
use tracing::{info_span, Instrument};

/// What a data endpoint answered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Served,
    NotFound,
    Unconfigured,
    Failed,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Served => "served",
            Outcome::NotFound => "not_found",
            Outcome::Unconfigured => "unconfigured",
            Outcome::Failed => "failed",
        }
    }
}

struct ApiInstruments {
    requests: Counter<u64>,
    duration_seconds: Histogram<f64>,
    outcomes: Counter<u64>,
    rows_served: Histogram<u64>,
}

fn instruments() -> &'static ApiInstruments {
    static INSTRUMENTS: OnceLock<ApiInstruments> = OnceLock::new();
    INSTRUMENTS.get_or_init(|| {
        let meter = global::meter("poll_position.api");
        ApiInstruments {
            requests: meter
                .u64_counter("poll_position.api.requests")
                .with_description("HTTP requests handled by the poll API")
                .build(),
            duration_seconds: meter
                .f64_histogram("poll_position.api.request.duration")
                .with_description("HTTP request duration")
                .with_unit("s")
                .build(),
            outcomes: meter
                .u64_counter("poll_position.api.outcomes")
                .with_description("Data endpoint answers by outcome")
                .build(),
            rows_served: meter
                .u64_histogram("poll_position.api.rows_served")
                .with_description("Rows reconstructed from one poll artifact")
                .with_unit("{row}")
                .build(),
        }
    })
}

/// Count one data endpoint answer.
pub fn record_outcome(route: &'static str, outcome: Outcome) {
    instruments().outcomes.add(
        1,
        &[
            KeyValue::new("http.route", route),
            KeyValue::new("outcome", outcome.as_str()),
        ],
    );
}

/// Record how many rows one artifact answer carried.
pub fn record_rows_served(route: &'static str, rows: usize) {
    instruments()
        .rows_served
        .record(rows as u64, &[KeyValue::new("http.route", route)]);
}

/// Wraps each request in an `http.request` span and records its count and
/// latency by route and status.
pub async fn http_observability_middleware(req: Request<axum::body::Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().as_str().to_string();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    let span = info_span!(
        "http.request",
        otel.kind = "server",
        http.request.method = %method,
        http.route = %route
    );
    let response = next.run(req).instrument(span).await;

    let attrs = [
        KeyValue::new("http.request.method", method),
        KeyValue::new("http.route", route),
        KeyValue::new("http.response.status_code", response.status().as_u16() as i64),
    ];
    let instruments = instruments();
    instruments.requests.add(1, &attrs);
    instruments
        .duration_seconds
        .record(start.elapsed().as_secs_f64(), &attrs);

    response
}
