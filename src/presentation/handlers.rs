// HTTP request handlers
use crate::domain::error::EngineError;
use crate::domain::series::SeriesKey;
use crate::domain::threshold::{ThresholdSpec, GROUP_LEVEL_KEY};
use crate::domain::window::WindowMode;
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

#[derive(Serialize)]
pub struct GroupInfo {
    id: String,
    title: String,
    series: Vec<SeriesInfo>,
}

#[derive(Serialize)]
pub struct SeriesInfo {
    id: String,
    name: String,
}

/// List the configured groups and their series.
pub async fn list_groups(State(state): State<Arc<AppState>>) -> Json<Vec<GroupInfo>> {
    let groups = state
        .engine
        .config()
        .groups
        .iter()
        .map(|g| GroupInfo {
            id: g.id.clone(),
            title: g.title.clone(),
            series: g
                .series
                .iter()
                .map(|s| SeriesInfo {
                    id: s.id.clone(),
                    name: s.name.clone(),
                })
                .collect(),
        })
        .collect();
    Json(groups)
}

/// Selected (group, series) pairs in stable render order.
pub async fn active_series(State(state): State<Arc<AppState>>) -> Json<Vec<SeriesKey>> {
    Json(state.engine.active_series().await)
}

pub async fn toggle_group(
    Path(group): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    match state.engine.toggle_group(&group).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn toggle_series(
    Path((group, series)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> Response {
    match state.engine.toggle_series(&group, &series).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Deserialize)]
pub struct WindowRequest {
    pub mode: WindowMode,
    pub start: Option<String>,
    pub end: Option<String>,
}

/// Replace the reporting window. A custom range needs `start` and `end` in
/// `%Y-%m-%d %H:%M:%S`; an inverted range is rejected and the previous
/// window stays active.
pub async fn set_window(
    State(state): State<Arc<AppState>>,
    Json(request): Json<WindowRequest>,
) -> Response {
    let custom = match parse_custom_range(&request) {
        Ok(custom) => custom,
        Err(e) => return error_response(e),
    };

    match state
        .engine
        .set_window(request.mode, custom, Local::now().naive_local())
        .await
    {
        Ok(window) => Json(window).into_response(),
        Err(e) => error_response(e),
    }
}

fn parse_custom_range(
    request: &WindowRequest,
) -> Result<Option<(NaiveDateTime, NaiveDateTime)>, EngineError> {
    let (Some(start), Some(end)) = (&request.start, &request.end) else {
        return Ok(None);
    };
    let parse = |raw: &str| {
        NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
            .map_err(|_| EngineError::Parse(format!("bad timestamp '{raw}'")))
    };
    Ok(Some((parse(start)?, parse(end)?)))
}

#[derive(Deserialize)]
pub struct ThresholdRequest {
    pub caution: Option<f64>,
    pub warning: Option<f64>,
    /// Apply to the whole group instead of one series.
    #[serde(default)]
    pub group_level: bool,
}

pub async fn set_threshold(
    Path((group, series)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<ThresholdRequest>,
) -> Response {
    let series_id = if request.group_level {
        GROUP_LEVEL_KEY
    } else {
        series.as_str()
    };
    let spec = ThresholdSpec {
        caution: request.caution,
        warning: request.warning,
    };
    match state.engine.set_threshold(&group, series_id, spec).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn plot_data(
    Path((group, series)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let key = SeriesKey::new(group, series);
    match state.engine.plot_data(&key, Local::now().naive_local()).await {
        Ok(points) => Json(points).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn summary(
    Path((group, series)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let key = SeriesKey::new(group, series);
    match state.engine.summary(&key, Local::now().naive_local()).await {
        Ok(stats) => Json(stats).into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Deserialize)]
pub struct ClassifyQuery {
    pub value: f64,
}

pub async fn classify(
    Path((group, series)): Path<(String, String)>,
    Query(query): Query<ClassifyQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let key = SeriesKey::new(group, series);
    match state.engine.classification(&key, query.value).await {
        Ok(severity) => Json(json!({ "severity": severity })).into_response(),
        Err(e) => error_response(e),
    }
}

/// Force an immediate reload of every active group.
pub async fn refresh_now(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let reloaded = state.engine.refresh_active().await;
    Json(json!({ "reloaded": reloaded }))
}

/// Recent alarm notifications, newest last.
pub async fn recent_events(State(state): State<Arc<AppState>>) -> Response {
    Json(state.engine.recent_events().await).into_response()
}

/// Map engine errors onto status codes so the renderer can tell "no data in
/// window" (an empty 200) apart from a failed load or a bad request.
fn error_response(error: EngineError) -> Response {
    let status = match &error {
        EngineError::Config(_) => StatusCode::NOT_FOUND,
        EngineError::InvalidRange(_) | EngineError::Parse(_) => StatusCode::BAD_REQUEST,
        EngineError::DataAccess(_) => StatusCode::BAD_GATEWAY,
    };
    (status, Json(json!({ "error": error.to_string() }))).into_response()
}
