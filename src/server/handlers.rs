//! HTTP request handlers for API endpoints

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Html,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

use super::dashboard::render_dashboard;
use super::error::ApiError;
use super::state::AppState;
use crate::analytics::{
    dropoff, funnel_counts, success_rate, time_to_analysis, top_quality_issues, FunnelBreakdown,
    LatencySummary, QualityIssueCount, StageCount,
};
use crate::event::{Event, EventType};
use crate::event_store::{EventFilter, EventStore};
use crate::insights::{explainable_insights, Insight};

/// Health check endpoint
///
/// Returns a simple status response to verify the server is running
pub async fn ping() -> Json<Value> {
    Json(json!({
        "status": "pong"
    }))
}

/// POST /events - Ingest a single event
pub async fn ingest_event(
    State(state): State<Arc<AppState>>,
    Json(event): Json<Event>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let mut store = state.store.lock().await;
    store.append(event)?;
    Ok((StatusCode::CREATED, Json(json!({ "status": "recorded" }))))
}

/// POST /events/bulk - Ingest a batch of events
pub async fn ingest_bulk(
    State(state): State<Arc<AppState>>,
    Json(events): Json<Vec<Event>>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let mut store = state.store.lock().await;
    let count = store.append_all(events)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "status": "recorded", "count": count })),
    ))
}

fn default_limit() -> usize {
    200
}

/// Query parameters for the raw event listing
#[derive(Debug, Deserialize)]
pub struct EventListParams {
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub entity_id: Option<String>,
    pub event_type: Option<EventType>,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

/// Response for the raw event listing
#[derive(Debug, Serialize)]
pub struct EventListResponse {
    pub count: usize,
    pub events: Vec<Event>,
}

/// GET /events - List raw events, newest first
pub async fn list_events(
    State(state): State<Arc<AppState>>,
    Query(params): Query<EventListParams>,
) -> Result<Json<EventListResponse>, ApiError> {
    let filter = EventFilter {
        since: params.since,
        until: params.until,
        entity_id: params.entity_id,
        event_type: params.event_type,
    };

    let store = state.store.lock().await;
    let snapshot = store.events(&filter)?;

    // The store hands back ascending order; the listing shows newest first.
    let events: Vec<Event> = snapshot.into_iter().rev().take(params.limit).collect();

    Ok(Json(EventListResponse {
        count: events.len(),
        events,
    }))
}

/// Optional time window for the metrics summary
#[derive(Debug, Deserialize)]
pub struct TimeWindowParams {
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

/// The time window a summary was computed over
#[derive(Debug, Serialize)]
pub struct TimeWindow {
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

/// Total-event counts section of a summary
#[derive(Debug, Serialize)]
pub struct EventCounts {
    pub total_events: usize,
}

/// Full metrics payload computed over one event snapshot
#[derive(Debug, Serialize)]
pub struct MetricsSummary {
    pub window: TimeWindow,
    pub counts: EventCounts,
    pub success_rate: f64,
    pub funnel: Vec<StageCount>,
    pub dropoff: FunnelBreakdown,
    pub quality_issues: Vec<QualityIssueCount>,
    pub time_to_analysis_minutes: LatencySummary,
    pub insights: Vec<Insight>,
}

/// Public variant of the metrics payload (no window, aggregates only)
#[derive(Debug, Serialize)]
pub struct PublicMetricsSummary {
    pub counts: EventCounts,
    pub success_rate: f64,
    pub funnel: Vec<StageCount>,
    pub dropoff: FunnelBreakdown,
    pub quality_issues: Vec<QualityIssueCount>,
    pub time_to_analysis_minutes: LatencySummary,
    pub insights: Vec<Insight>,
    pub note: &'static str,
}

/// GET /metrics/summary - Metrics over an optional time window
pub async fn metrics_summary(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TimeWindowParams>,
) -> Result<Json<MetricsSummary>, ApiError> {
    let filter = EventFilter {
        since: params.since,
        until: params.until,
        entity_id: None,
        event_type: None,
    };

    let store = state.store.lock().await;
    let events = store.events(&filter)?;

    Ok(Json(MetricsSummary {
        window: TimeWindow {
            since: params.since,
            until: params.until,
        },
        counts: EventCounts {
            total_events: events.len(),
        },
        success_rate: success_rate(&events),
        funnel: funnel_counts(&events),
        dropoff: dropoff(&events),
        quality_issues: top_quality_issues(&events),
        time_to_analysis_minutes: time_to_analysis(&events),
        insights: explainable_insights(&events),
    }))
}

/// GET /public/metrics/summary - Public read-only aggregate summary
pub async fn public_metrics_summary(
    State(state): State<Arc<AppState>>,
) -> Result<Json<PublicMetricsSummary>, ApiError> {
    let store = state.store.lock().await;
    let events = store.events(&EventFilter::new())?;

    Ok(Json(PublicMetricsSummary {
        counts: EventCounts {
            total_events: events.len(),
        },
        success_rate: success_rate(&events),
        funnel: funnel_counts(&events),
        dropoff: dropoff(&events),
        quality_issues: top_quality_issues(&events),
        time_to_analysis_minutes: time_to_analysis(&events),
        insights: explainable_insights(&events),
        note: "Public read-only summary (no raw events).",
    }))
}

/// GET /dashboard - Public HTML dashboard (aggregates only)
pub async fn dashboard(State(state): State<Arc<AppState>>) -> Result<Html<String>, ApiError> {
    let store = state.store.lock().await;
    let events = store.events(&EventFilter::new())?;
    Ok(Html(render_dashboard(&events)))
}
