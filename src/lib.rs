pub mod event;
pub mod analytics;
pub mod insights;
pub mod event_store;
pub mod sqlite_store;
pub mod quality;
pub mod server;

#[cfg(test)]
mod integration_tests;

pub use event::{ActorRole, Event, EventType, FUNNEL_STAGES, QUALITY_EVENTS};
pub use analytics::{
    dropoff,
    funnel_counts,
    success_rate,
    time_to_analysis,
    top_quality_issues,
    FunnelBreakdown,
    LatencySummary,
    QualityIssueCount,
    StageCount,
    StageDrop,
};
pub use insights::{explainable_insights, Insight, InsightKind};
pub use event_store::{EventFilter, EventStore, EventStoreError, InMemoryEventStore};
pub use sqlite_store::SqliteEventStore;
pub use quality::{
    missing_required_fields, out_of_range_fields, RangeViolation, LAB_RANGES,
    REQUIRED_LAB_FIELDS,
};
pub use server::{run_server, ApiError, AppState, ServerConfig};
