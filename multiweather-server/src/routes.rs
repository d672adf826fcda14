//! The single HTTP route: `GET /weather/{city}`.

use std::{sync::Arc, time::Instant};

use axum::{
    Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use multiweather_core::{MultiWeatherProvider, TemperatureReport};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

pub fn router(aggregator: Arc<MultiWeatherProvider>) -> Router {
    Router::new()
        .route("/weather/{*city}", get(weather_handler))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(aggregator)
}

/// City is everything after `/weather/`, taken verbatim.
async fn weather_handler(
    State(aggregator): State<Arc<MultiWeatherProvider>>,
    Path(city): Path<String>,
) -> Response {
    let begin = Instant::now();

    match aggregator.get_temperature(&city).await {
        Ok(temp) => {
            let report = TemperatureReport::new(city, temp, begin.elapsed());
            tracing::info!(city = %report.city, temp, time_took = %report.time_took, "served");
            json_response(&report)
        }
        Err(err) => {
            tracing::warn!(%city, error = %format!("{err:#}"), "aggregation failed");
            (StatusCode::INTERNAL_SERVER_ERROR, format!("{err:#}")).into_response()
        }
    }
}

fn json_response(report: &TemperatureReport) -> Response {
    match serde_json::to_string(report) {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response(),
    }
}
