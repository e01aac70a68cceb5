//! Event model and taxonomy (single source of truth).
//!
//! Every calculator consumes the same record shape defined here. Event type
//! names must stay consistent across ingestion, metrics, and docs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// The closed set of recognized lifecycle event types.
///
/// Spans the upload, data-quality, analysis, and clinician-review stages of a
/// medical-data submission. Producers must emit only these types; an
/// unrecognized name is rejected at the ingest boundary (deserialization
/// error), never silently tolerated downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// User started submitting medical/lab data
    DataUploadStarted,
    /// Submission completed successfully (payload accepted)
    DataUploadCompleted,
    /// Submission missing required clinical fields (data quality issue)
    MissingRequiredField,
    /// Detected a value outside expected clinical range (data quality issue)
    OutOfRangeValueDetected,
    /// Analysis pipeline completed successfully
    AnalysisCompleted,
    /// Analysis pipeline failed (e.g., quality gate, validation, system error)
    AnalysisFailed,
    /// Clinician began reviewing results
    ClinicianReviewStarted,
    /// Clinician completed review and recorded outcome
    ClinicianReviewCompleted,
}

/// The primary happy-path workflow, in order. Drop-off is computed strictly
/// between adjacent stages of this sequence.
pub const FUNNEL_STAGES: [EventType; 4] = [
    EventType::DataUploadStarted,
    EventType::DataUploadCompleted,
    EventType::AnalysisCompleted,
    EventType::ClinicianReviewCompleted,
];

/// Event types flagged as data-quality problems. Disjoint from the funnel.
pub const QUALITY_EVENTS: [EventType; 2] = [
    EventType::MissingRequiredField,
    EventType::OutOfRangeValueDetected,
];

impl EventType {
    /// All taxonomy members.
    pub const ALL: [EventType; 8] = [
        EventType::DataUploadStarted,
        EventType::DataUploadCompleted,
        EventType::MissingRequiredField,
        EventType::OutOfRangeValueDetected,
        EventType::AnalysisCompleted,
        EventType::AnalysisFailed,
        EventType::ClinicianReviewStarted,
        EventType::ClinicianReviewCompleted,
    ];

    /// Returns the wire name of this event type.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::DataUploadStarted => "data_upload_started",
            EventType::DataUploadCompleted => "data_upload_completed",
            EventType::MissingRequiredField => "missing_required_field",
            EventType::OutOfRangeValueDetected => "out_of_range_value_detected",
            EventType::AnalysisCompleted => "analysis_completed",
            EventType::AnalysisFailed => "analysis_failed",
            EventType::ClinicianReviewStarted => "clinician_review_started",
            EventType::ClinicianReviewCompleted => "clinician_review_completed",
        }
    }

    /// Human-readable description, for docs and discovery endpoints.
    pub fn description(&self) -> &'static str {
        match self {
            EventType::DataUploadStarted => "User started submitting medical/lab data.",
            EventType::DataUploadCompleted => {
                "Submission completed successfully (payload accepted)."
            }
            EventType::MissingRequiredField => {
                "Submission missing required clinical fields (data quality issue)."
            }
            EventType::OutOfRangeValueDetected => {
                "Detected a value outside expected clinical range (data quality issue)."
            }
            EventType::AnalysisCompleted => "Analysis pipeline completed successfully.",
            EventType::AnalysisFailed => {
                "Analysis pipeline failed (e.g., quality gate, validation, system error)."
            }
            EventType::ClinicianReviewStarted => "Clinician began reviewing results.",
            EventType::ClinicianReviewCompleted => {
                "Clinician completed review and recorded outcome."
            }
        }
    }

    /// Returns `true` if this type belongs to the quality event set.
    pub fn is_quality_event(&self) -> bool {
        matches!(
            self,
            EventType::MissingRequiredField | EventType::OutOfRangeValueDetected
        )
    }

    /// Returns `true` if this type is one of the four funnel stages.
    pub fn is_funnel_stage(&self) -> bool {
        FUNNEL_STAGES.contains(self)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EventType {
    type Err = UnknownEventType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "data_upload_started" => Ok(EventType::DataUploadStarted),
            "data_upload_completed" => Ok(EventType::DataUploadCompleted),
            "missing_required_field" => Ok(EventType::MissingRequiredField),
            "out_of_range_value_detected" => Ok(EventType::OutOfRangeValueDetected),
            "analysis_completed" => Ok(EventType::AnalysisCompleted),
            "analysis_failed" => Ok(EventType::AnalysisFailed),
            "clinician_review_started" => Ok(EventType::ClinicianReviewStarted),
            "clinician_review_completed" => Ok(EventType::ClinicianReviewCompleted),
            other => Err(UnknownEventType(other.to_string())),
        }
    }
}

/// Error returned when parsing a string outside the event taxonomy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEventType(pub String);

impl fmt::Display for UnknownEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown event type: '{}'", self.0)
    }
}

impl std::error::Error for UnknownEventType {}

/// Who produced an event. Not used by the current calculators but part of
/// the record shape for forward compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorRole {
    Patient,
    Clinician,
    Researcher,
    System,
}

impl ActorRole {
    /// Returns the wire name of this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActorRole::Patient => "patient",
            ActorRole::Clinician => "clinician",
            ActorRole::Researcher => "researcher",
            ActorRole::System => "system",
        }
    }
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ActorRole {
    type Err = UnknownActorRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "patient" => Ok(ActorRole::Patient),
            "clinician" => Ok(ActorRole::Clinician),
            "researcher" => Ok(ActorRole::Researcher),
            "system" => Ok(ActorRole::System),
            other => Err(UnknownActorRole(other.to_string())),
        }
    }
}

/// Error returned when parsing a string outside the actor role set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownActorRole(pub String);

impl fmt::Display for UnknownActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown actor role: '{}'", self.0)
    }
}

impl std::error::Error for UnknownActorRole {}

/// A single lifecycle event for a medical-data submission.
///
/// Immutable once constructed; the analytics engine only reads. Events relate
/// to each other only through a shared `entity_id` (the anonymized
/// submission/patient identifier, reused across an entity's lifecycle) and
/// through membership in the same snapshot collection.
///
/// Timestamps are UTC so every event lives in a single comparability domain;
/// callers normalize before ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event type, validated against the taxonomy at the ingest boundary
    pub event_type: EventType,
    /// Anonymized submission/patient identifier (no PII)
    pub entity_id: String,
    /// When the event occurred
    pub timestamp: DateTime<Utc>,
    /// Who produced the event, if known
    #[serde(default)]
    pub actor_role: Option<ActorRole>,
    /// Open key-value bag of event-specific details. Not interpreted by the
    /// analytics core; quality-rule evaluation happens upstream.
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Event {
    /// Creates a new event with no actor role and an empty metadata bag.
    pub fn new(
        event_type: EventType,
        entity_id: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Event {
            event_type,
            entity_id: entity_id.into(),
            timestamp,
            actor_role: None,
            metadata: Map::new(),
        }
    }

    /// Sets the actor role.
    pub fn with_actor_role(mut self, actor_role: ActorRole) -> Self {
        self.actor_role = Some(actor_role);
        self
    }

    /// Sets the metadata bag.
    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }
}
