//! JSON endpoints over a node log, for browsing the summary interactively.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use jiff::tz::TimeZone;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::services::ServeDir;

use super::summary::{hourly, human_duration, summarize, HourSummary};
use super::{load_spans, ReportError};

#[derive(Clone)]
pub struct ReportState {
    pub logfile: Arc<PathBuf>,
    pub tz: TimeZone,
}

impl ReportState {
    pub fn new(logfile: PathBuf, tz: TimeZone) -> Self {
        Self { logfile: Arc::new(logfile), tz }
    }
}

/// `?start=&end=` in epoch seconds. A missing or zero `end` means no upper bound.
#[derive(Debug, Default, Deserialize)]
pub struct Window {
    #[serde(default)]
    pub start: i64,
    #[serde(default)]
    pub end: Option<i64>,
}

impl Window {
    fn bounds(&self) -> (i64, i64) {
        let end = match self.end {
            Some(end) if end > 0 => end,
            _ => i64::MAX,
        };
        (self.start, end)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceReport {
    pub device: String,
    pub avg_vol: String,
    pub perc_time: String,
    pub total_time: String,
    pub total_time_str: String,
    pub time_above_average: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct HourReport {
    pub hour: u8,
    pub avg_vol: u32,
    pub device: &'static str,
}

impl From<HourSummary> for HourReport {
    fn from(h: HourSummary) -> Self {
        Self { hour: h.hour, avg_vol: h.avg_volume_percent, device: h.device }
    }
}

impl IntoResponse for ReportError {
    fn into_response(self) -> Response {
        tracing::error!("{}", self);
        let body = Json(json!({
            "error": self.to_string(),
        }));
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

/// GET /summary
pub async fn summary_handler(
    State(state): State<ReportState>,
    Query(window): Query<Window>,
) -> Result<Json<Vec<DeviceReport>>, ReportError> {
    let (start, end) = window.bounds();
    tracing::info!("summary for {}..{}", start, end);
    let spans = load_spans(&state.logfile, start, end)?;

    let reports = summarize(&spans)
        .into_iter()
        .map(|s| DeviceReport {
            avg_vol: ((s.avg_volume * 100.0).round() as i64).to_string(),
            perc_time: s.share_percent.to_string(),
            total_time: s.total_secs.to_string(),
            total_time_str: human_duration(s.total_secs),
            time_above_average: human_duration(s.loud_secs),
            device: s.device,
        })
        .collect();
    Ok(Json(reports))
}

/// GET /hourly
pub async fn hourly_handler(
    State(state): State<ReportState>,
    Query(window): Query<Window>,
) -> Result<Json<Vec<HourReport>>, ReportError> {
    let (start, end) = window.bounds();
    tracing::info!("hourly report for {}..{}", start, end);
    let spans = load_spans(&state.logfile, start, end)?;
    let hours = hourly(&spans, &state.tz)?;
    Ok(Json(hours.into_iter().map(HourReport::from).collect()))
}

/// Static files under `static_dir`, when given, are served for every other path.
pub fn build_router(state: ReportState, static_dir: Option<PathBuf>) -> Router {
    let router = Router::new()
        .route("/summary", get(summary_handler))
        .route("/hourly", get(hourly_handler))
        .with_state(state);
    match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    }
}

pub async fn serve(state: ReportState, port: u16, static_dir: Option<PathBuf>) -> std::io::Result<()> {
    let app = build_router(state, static_dir);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Starting server. Go to http://localhost:{}/", port);
    axum::serve(listener, app).await
}
