//! HTTP request handlers
//!
//! The page handler feeds selector changes into the shared session. The JSON
//! and SVG endpoints are stateless views over the startup dataset.

use super::AppState;
use crate::error::ApiError;
use crate::models::ColumnKind;
use crate::render::{render_page, Page, Tab};
use crate::report::ExecutiveSummary;
use crate::session::{DriverView, HeatmapView, InputEvent, Session};
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Query string of the dashboard page.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub tab: Option<Tab>,
    pub feature: Option<String>,
    pub a: Option<String>,
    pub b: Option<String>,
}

/// `?feature=` for driver endpoints.
#[derive(Debug, Deserialize)]
pub struct FeatureQuery {
    pub feature: Option<String>,
}

/// `?a=&b=` for heatmap endpoints.
#[derive(Debug, Deserialize)]
pub struct PairQuery {
    pub a: Option<String>,
    pub b: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub rows: usize,
    pub features: usize,
    pub attrition_rate: Option<f64>,
}

/// A selectable feature and its values in axis order.
#[derive(Debug, Serialize, Deserialize)]
pub struct FeatureInfo {
    pub name: String,
    pub kind: ColumnKind,
    pub values: Vec<String>,
}

/// Render the dashboard, running a session cycle when the selection changed.
pub async fn page(State(state): State<AppState>, Query(query): Query<PageQuery>) -> Html<String> {
    let tab = query.tab.unwrap_or_default();
    let features = state.dataset.feature_columns();
    let mut session = state.session.lock().await;

    if let Some(event) = pending_event(&session, tab, &query, features) {
        // A failure is recorded on the session and shown inline.
        let _ = session.handle(event);
        debug!(
            "Session {:?} after {} cycles",
            session.state(),
            session.cycles()
        );
    }

    let error = match tab {
        Tab::Drivers => session.driver_error(),
        Tab::Heatmap => session.heatmap_error(),
        Tab::Summary => None,
    };

    Html(render_page(&Page {
        tab,
        features,
        driver: session.driver_view(),
        heatmap: session.heatmap_view(),
        error,
        summary: &state.summary,
    }))
}

/// The input event implied by a page request, if any.
///
/// A tab opened without a selection starts from the first feature (or the
/// first two for the heatmap). A selection equal to the current view is not
/// an event unless the last cycle of that tab failed.
fn pending_event(
    session: &Session,
    tab: Tab,
    query: &PageQuery,
    features: &[String],
) -> Option<InputEvent> {
    match tab {
        Tab::Drivers => {
            let retry = session.driver_error().is_some();
            let current = session.driver_view().map(|v| v.feature.as_str());
            let feature = match (&query.feature, current) {
                (Some(f), _) => f.clone(),
                (None, Some(_)) => return None,
                (None, None) => features.first()?.clone(),
            };
            (current != Some(feature.as_str()) || retry).then_some(InputEvent::SelectDriver(feature))
        }
        Tab::Heatmap => {
            let retry = session.heatmap_error().is_some();
            let current = session
                .heatmap_view()
                .map(|v| (v.feature_a.as_str(), v.feature_b.as_str()));
            let (a, b) = match (&query.a, &query.b, current) {
                (Some(a), Some(b), _) => (a.clone(), b.clone()),
                (None, None, Some(_)) => return None,
                (a, b, current) => {
                    let first = features.first()?.as_str();
                    let second = features.get(1).map_or(first, String::as_str);
                    let default_a = current.map_or(first, |(row, _)| row);
                    let default_b = current.map_or(second, |(_, column)| column);
                    (
                        a.clone().unwrap_or_else(|| default_a.to_string()),
                        b.clone().unwrap_or_else(|| default_b.to_string()),
                    )
                }
            };
            let changed = current != Some((a.as_str(), b.as_str()));
            (changed || retry).then_some(InputEvent::SelectPair(a, b))
        }
        Tab::Summary => None,
    }
}

/// Health check handler
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let health = HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        rows: state.dataset.len(),
        features: state.dataset.feature_columns().len(),
        attrition_rate: state.dataset.outcome_rate().ok(),
    };

    (StatusCode::OK, Json(health))
}

/// List selectable features with their values.
pub async fn features(State(state): State<AppState>) -> Result<Json<Vec<FeatureInfo>>, ApiError> {
    let dataset = &state.dataset;
    let mut infos = Vec::new();

    for name in dataset.feature_columns() {
        let kind = dataset
            .column(name)
            .map(|c| c.kind)
            .unwrap_or(ColumnKind::Categorical);
        let values = dataset
            .distinct_values(name)?
            .iter()
            .map(|v| v.to_string())
            .collect();

        infos.push(FeatureInfo {
            name: name.clone(),
            kind,
            values,
        });
    }

    Ok(Json(infos))
}

/// Driver aggregation, bar chart and top combinations.
pub async fn drivers(
    State(state): State<AppState>,
    Query(query): Query<FeatureQuery>,
) -> Result<Json<DriverView>, ApiError> {
    let feature = required(query.feature, "feature")?;
    Ok(Json(DriverView::build(&state.dataset, &feature, &state.explorer)?))
}

/// Pairwise aggregation and heatmap.
pub async fn heatmap(
    State(state): State<AppState>,
    Query(query): Query<PairQuery>,
) -> Result<Json<HeatmapView>, ApiError> {
    let a = required(query.a, "a")?;
    let b = required(query.b, "b")?;
    Ok(Json(HeatmapView::build(&state.dataset, &a, &b)?))
}

/// Executive summary.
pub async fn summary(State(state): State<AppState>) -> Json<ExecutiveSummary> {
    Json(state.summary.as_ref().clone())
}

/// Bar chart as SVG.
pub async fn drivers_svg(
    State(state): State<AppState>,
    Query(query): Query<FeatureQuery>,
) -> Result<Response, ApiError> {
    let feature = required(query.feature, "feature")?;
    let view = DriverView::build(&state.dataset, &feature, &state.explorer)?;
    Ok(svg(view.chart.to_svg()?))
}

/// Heatmap as SVG.
pub async fn heatmap_svg(
    State(state): State<AppState>,
    Query(query): Query<PairQuery>,
) -> Result<Response, ApiError> {
    let a = required(query.a, "a")?;
    let b = required(query.b, "b")?;
    let view = HeatmapView::build(&state.dataset, &a, &b)?;
    Ok(svg(view.chart.to_svg()?))
}

fn required(value: Option<String>, name: &str) -> Result<String, ApiError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("missing query parameter '{}'", name)))
}

fn svg(body: String) -> Response {
    ([(header::CONTENT_TYPE, "image/svg+xml")], body).into_response()
}
