//! Analytics Functions
//!
//! This module provides stateless analytics calculation functions over a
//! snapshot of submission lifecycle events: funnel counts, stage drop-off,
//! upload success rate, data-quality issue ranking, and upload-to-analysis
//! latency. Every function takes the event slice by reference, holds no state
//! between calls, and is safe to invoke concurrently.

use crate::event::{Event, EventType, FUNNEL_STAGES};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Event count for a single funnel stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageCount {
    /// The funnel stage (an event type)
    pub stage: EventType,
    /// Number of events of that type in the snapshot
    pub count: usize,
}

/// Drop-off between two adjacent funnel stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageDrop {
    /// Upstream stage
    pub from: EventType,
    /// Downstream stage
    pub to: EventType,
    /// `count[from] - count[to]`; negative when downstream events occur
    /// without a matching upstream event (reported as-is, not clamped)
    pub drop: i64,
    /// `drop / count[from]`, or `0.0` when the upstream count is zero
    pub drop_rate: f64,
}

/// Funnel counts together with the adjacent-stage drop records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunnelBreakdown {
    /// One entry per funnel stage, in funnel order
    pub counts: Vec<StageCount>,
    /// One record per adjacent stage pair, in funnel order (3 for 4 stages)
    pub drops: Vec<StageDrop>,
}

/// Occurrence count for one quality-flagged event type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityIssueCount {
    /// The quality event type
    pub event_type: EventType,
    /// Number of occurrences in the snapshot
    pub count: usize,
}

/// Aggregate of upload-completion-to-analysis latencies, in minutes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatencySummary {
    /// Number of valid (non-negative) deltas collected
    pub count: usize,
    /// Mean delta in minutes, `None` when no deltas were collected
    pub avg: Option<f64>,
    /// Smallest delta in minutes, `None` when no deltas were collected
    pub min: Option<f64>,
    /// Largest delta in minutes, `None` when no deltas were collected
    pub max: Option<f64>,
}

impl LatencySummary {
    /// The empty aggregate: `{count: 0, avg: null, min: null, max: null}`.
    pub fn empty() -> Self {
        LatencySummary {
            count: 0,
            avg: None,
            min: None,
            max: None,
        }
    }
}

fn count_of(events: &[Event], event_type: EventType) -> usize {
    events
        .iter()
        .filter(|e| e.event_type == event_type)
        .count()
}

/// Calculates the upload success rate.
///
/// # Behavior
/// - `count(data_upload_completed) / count(data_upload_started)`
/// - Returns `0.0` when no upload was started, regardless of completions
/// - Raw ratio, not clamped to [0, 1]: within a filtered window completions
///   can exceed starts, and the ratio is reported as-is
pub fn success_rate(events: &[Event]) -> f64 {
    let started = count_of(events, EventType::DataUploadStarted);
    let completed = count_of(events, EventType::DataUploadCompleted);
    if started > 0 {
        completed as f64 / started as f64
    } else {
        0.0
    }
}

/// Counts events per funnel stage.
///
/// # Behavior
/// - One entry per stage of [`FUNNEL_STAGES`], in funnel order, for any input
/// - Order-independent over the input snapshot
pub fn funnel_counts(events: &[Event]) -> Vec<StageCount> {
    FUNNEL_STAGES
        .iter()
        .map(|&stage| StageCount {
            stage,
            count: count_of(events, stage),
        })
        .collect()
}

/// Computes funnel counts plus drop-off between adjacent stages.
///
/// # Behavior
/// - Always produces exactly 3 drop records for the 4-stage funnel
/// - `drop = count[prev] - count[next]`, not clamped (may be negative)
/// - `drop_rate = drop / count[prev]` when `count[prev] > 0`, else `0.0`
///   (explicit zero-denominator policy, not an error)
pub fn dropoff(events: &[Event]) -> FunnelBreakdown {
    let counts = funnel_counts(events);
    let mut drops = Vec::with_capacity(counts.len().saturating_sub(1));

    for pair in counts.windows(2) {
        let prev = &pair[0];
        let next = &pair[1];
        let drop = prev.count as i64 - next.count as i64;
        let drop_rate = if prev.count > 0 {
            drop as f64 / prev.count as f64
        } else {
            0.0
        };
        drops.push(StageDrop {
            from: prev.stage,
            to: next.stage,
            drop,
            drop_rate,
        });
    }

    FunnelBreakdown { counts, drops }
}

/// Ranks data-quality issue types by frequency.
///
/// # Behavior
/// - Counts only event types in the quality event set
/// - Sparse: types with zero occurrences are omitted
/// - Sorted descending by count; ties keep first-encountered order
///   (stable sort over first-appearance accumulation order)
pub fn top_quality_issues(events: &[Event]) -> Vec<QualityIssueCount> {
    let mut ranking: Vec<QualityIssueCount> = Vec::new();

    for event in events {
        if !event.event_type.is_quality_event() {
            continue;
        }
        match ranking
            .iter_mut()
            .find(|issue| issue.event_type == event.event_type)
        {
            Some(issue) => issue.count += 1,
            None => ranking.push(QualityIssueCount {
                event_type: event.event_type,
                count: 1,
            }),
        }
    }

    // Stable sort keeps first-encountered order among equal counts.
    ranking.sort_by(|a, b| b.count.cmp(&a.count));
    ranking
}

/// Measures elapsed minutes between each entity's `data_upload_completed`
/// event and subsequent `analysis_completed` events.
///
/// # Behavior
/// - Processes events in ascending timestamp order (sorts a view internally)
/// - Tracks the most recent completion timestamp per entity
/// - Negative deltas (out-of-order or malformed pairs) are discarded, not
///   surfaced as errors
/// - An `analysis_completed` event with no recorded completion for its entity
///   contributes nothing
/// - The stored completion timestamp is NOT consumed: a later analysis event
///   for the same entity recomputes against the same completion
/// - Returns the empty aggregate when no valid delta exists
pub fn time_to_analysis(events: &[Event]) -> LatencySummary {
    let mut ordered: Vec<&Event> = events.iter().collect();
    ordered.sort_by_key(|e| e.timestamp);

    let mut completed_at: HashMap<&str, DateTime<Utc>> = HashMap::new();
    let mut deltas: Vec<f64> = Vec::new();

    for event in ordered {
        match event.event_type {
            EventType::DataUploadCompleted => {
                completed_at.insert(event.entity_id.as_str(), event.timestamp);
            }
            EventType::AnalysisCompleted => {
                if let Some(&completed) = completed_at.get(event.entity_id.as_str()) {
                    let minutes =
                        (event.timestamp - completed).num_milliseconds() as f64 / 60_000.0;
                    if minutes >= 0.0 {
                        deltas.push(minutes);
                    }
                }
            }
            _ => {}
        }
    }

    if deltas.is_empty() {
        return LatencySummary::empty();
    }

    let sum: f64 = deltas.iter().sum();
    let min = deltas.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = deltas.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    LatencySummary {
        count: deltas.len(),
        avg: Some(sum / deltas.len() as f64),
        min: Some(min),
        max: Some(max),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap() + Duration::minutes(minute as i64)
    }

    fn events_of(rows: &[(EventType, &str, u32)]) -> Vec<Event> {
        rows.iter()
            .map(|&(event_type, entity_id, minute)| Event::new(event_type, entity_id, at(minute)))
            .collect()
    }

    fn repeated(event_type: EventType, n: usize) -> Vec<Event> {
        (0..n)
            .map(|i| Event::new(event_type, format!("SUB-{:03}", i), at(i as u32)))
            .collect()
    }

    #[test]
    fn test_success_rate_basic_ratio() {
        let mut events = repeated(EventType::DataUploadStarted, 10);
        events.extend(repeated(EventType::DataUploadCompleted, 8));
        assert_eq!(success_rate(&events), 0.8);
    }

    #[test]
    fn test_success_rate_zero_when_no_starts() {
        let events = repeated(EventType::DataUploadCompleted, 5);
        assert_eq!(success_rate(&events), 0.0);
    }

    #[test]
    fn test_success_rate_not_clamped_above_one() {
        let mut events = repeated(EventType::DataUploadStarted, 2);
        events.extend(repeated(EventType::DataUploadCompleted, 3));
        assert_eq!(success_rate(&events), 1.5);
    }

    #[test]
    fn test_funnel_counts_covers_all_stages_in_order() {
        let counts = funnel_counts(&[]);
        let stages: Vec<EventType> = counts.iter().map(|c| c.stage).collect();
        assert_eq!(stages, FUNNEL_STAGES.to_vec());
        assert!(counts.iter().all(|c| c.count == 0));
    }

    #[test]
    fn test_funnel_counts_ignores_non_funnel_events() {
        let events = events_of(&[
            (EventType::DataUploadStarted, "A", 0),
            (EventType::MissingRequiredField, "A", 1),
            (EventType::AnalysisFailed, "A", 2),
        ]);
        let counts = funnel_counts(&events);
        assert_eq!(counts[0].count, 1);
        assert_eq!(counts[1].count, 0);
        assert_eq!(counts[2].count, 0);
        assert_eq!(counts[3].count, 0);
    }

    #[test]
    fn test_dropoff_produces_three_adjacent_records() {
        let mut events = repeated(EventType::DataUploadStarted, 10);
        events.extend(repeated(EventType::DataUploadCompleted, 8));
        events.extend(repeated(EventType::AnalysisCompleted, 6));
        events.extend(repeated(EventType::ClinicianReviewCompleted, 3));

        let breakdown = dropoff(&events);
        assert_eq!(breakdown.drops.len(), 3);

        assert_eq!(breakdown.drops[0].from, EventType::DataUploadStarted);
        assert_eq!(breakdown.drops[0].to, EventType::DataUploadCompleted);
        assert_eq!(breakdown.drops[0].drop, 2);
        assert_eq!(breakdown.drops[0].drop_rate, 0.2);

        assert_eq!(breakdown.drops[1].drop, 2);
        assert_eq!(breakdown.drops[1].drop_rate, 0.25);

        assert_eq!(breakdown.drops[2].drop, 3);
        assert_eq!(breakdown.drops[2].drop_rate, 0.5);
    }

    #[test]
    fn test_dropoff_negative_drop_not_clamped() {
        // Completions without matching starts within the window.
        let events = repeated(EventType::DataUploadCompleted, 4);
        let breakdown = dropoff(&events);
        assert_eq!(breakdown.drops[0].drop, -4);
        // Upstream count is zero, so the rate falls back to 0.0.
        assert_eq!(breakdown.drops[0].drop_rate, 0.0);
    }

    #[test]
    fn test_dropoff_empty_input_all_zero() {
        let breakdown = dropoff(&[]);
        assert_eq!(breakdown.drops.len(), 3);
        for drop in &breakdown.drops {
            assert_eq!(drop.drop, 0);
            assert_eq!(drop.drop_rate, 0.0);
        }
    }

    #[test]
    fn test_top_quality_issues_sorted_descending() {
        let events = events_of(&[
            (EventType::MissingRequiredField, "A", 0),
            (EventType::OutOfRangeValueDetected, "B", 1),
            (EventType::OutOfRangeValueDetected, "C", 2),
            (EventType::DataUploadStarted, "D", 3),
        ]);
        let ranking = top_quality_issues(&events);
        assert_eq!(ranking.len(), 2);
        assert_eq!(ranking[0].event_type, EventType::OutOfRangeValueDetected);
        assert_eq!(ranking[0].count, 2);
        assert_eq!(ranking[1].event_type, EventType::MissingRequiredField);
        assert_eq!(ranking[1].count, 1);
    }

    #[test]
    fn test_top_quality_issues_omits_zero_counts() {
        let events = events_of(&[(EventType::MissingRequiredField, "A", 0)]);
        let ranking = top_quality_issues(&events);
        assert_eq!(ranking.len(), 1);
        assert_eq!(ranking[0].event_type, EventType::MissingRequiredField);
    }

    #[test]
    fn test_top_quality_issues_ties_keep_first_encountered_order() {
        let events = events_of(&[
            (EventType::OutOfRangeValueDetected, "A", 0),
            (EventType::MissingRequiredField, "B", 1),
            (EventType::MissingRequiredField, "C", 2),
            (EventType::OutOfRangeValueDetected, "D", 3),
        ]);
        let ranking = top_quality_issues(&events);
        // Equal counts: out_of_range was encountered first and stays first.
        assert_eq!(ranking[0].event_type, EventType::OutOfRangeValueDetected);
        assert_eq!(ranking[1].event_type, EventType::MissingRequiredField);
        assert_eq!(ranking[0].count, ranking[1].count);
    }

    #[test]
    fn test_top_quality_issues_never_includes_non_quality_types() {
        let mut events = repeated(EventType::DataUploadStarted, 3);
        events.extend(repeated(EventType::AnalysisFailed, 2));
        assert!(top_quality_issues(&events).is_empty());
    }

    #[test]
    fn test_latency_single_pair_five_minutes() {
        let events = events_of(&[
            (EventType::DataUploadCompleted, "E", 0),
            (EventType::AnalysisCompleted, "E", 5),
        ]);
        let summary = time_to_analysis(&events);
        assert_eq!(summary.count, 1);
        assert_eq!(summary.avg, Some(5.0));
        assert_eq!(summary.min, Some(5.0));
        assert_eq!(summary.max, Some(5.0));
    }

    #[test]
    fn test_latency_empty_aggregate_when_no_pairs() {
        let summary = time_to_analysis(&[]);
        assert_eq!(summary, LatencySummary::empty());
    }

    #[test]
    fn test_latency_analysis_without_completion_is_ignored() {
        let events = events_of(&[(EventType::AnalysisCompleted, "E", 5)]);
        let summary = time_to_analysis(&events);
        assert_eq!(summary, LatencySummary::empty());
    }

    #[test]
    fn test_latency_pairs_correlate_by_entity() {
        let events = events_of(&[
            (EventType::DataUploadCompleted, "A", 0),
            (EventType::DataUploadCompleted, "B", 2),
            (EventType::AnalysisCompleted, "A", 10),
            (EventType::AnalysisCompleted, "B", 12),
        ]);
        let summary = time_to_analysis(&events);
        assert_eq!(summary.count, 2);
        assert_eq!(summary.avg, Some(10.0));
        assert_eq!(summary.min, Some(10.0));
        assert_eq!(summary.max, Some(10.0));
    }

    #[test]
    fn test_latency_sorts_unordered_input() {
        let events = events_of(&[
            (EventType::AnalysisCompleted, "E", 8),
            (EventType::DataUploadCompleted, "E", 2),
        ]);
        let summary = time_to_analysis(&events);
        assert_eq!(summary.count, 1);
        assert_eq!(summary.avg, Some(6.0));
    }

    #[test]
    fn test_latency_reuses_completion_for_repeated_analysis() {
        // The completion timestamp is not consumed: a second analysis event
        // for the same entity measures against the same completion.
        let events = events_of(&[
            (EventType::DataUploadCompleted, "E", 0),
            (EventType::AnalysisCompleted, "E", 5),
            (EventType::AnalysisCompleted, "E", 9),
        ]);
        let summary = time_to_analysis(&events);
        assert_eq!(summary.count, 2);
        assert_eq!(summary.avg, Some(7.0));
        assert_eq!(summary.min, Some(5.0));
        assert_eq!(summary.max, Some(9.0));
    }

    #[test]
    fn test_latency_later_completion_resets_the_reference() {
        let events = events_of(&[
            (EventType::DataUploadCompleted, "E", 0),
            (EventType::DataUploadCompleted, "E", 10),
            (EventType::AnalysisCompleted, "E", 13),
        ]);
        let summary = time_to_analysis(&events);
        assert_eq!(summary.count, 1);
        assert_eq!(summary.avg, Some(3.0));
    }

    #[test]
    fn test_latency_negative_delta_discarded() {
        // Analysis stamped before the only completion: sorting places the
        // analysis first, so no pair forms at all.
        let events = events_of(&[
            (EventType::AnalysisCompleted, "E", 0),
            (EventType::DataUploadCompleted, "E", 5),
        ]);
        assert_eq!(time_to_analysis(&events), LatencySummary::empty());
    }

    #[test]
    fn test_calculators_are_idempotent() {
        let mut events = repeated(EventType::DataUploadStarted, 7);
        events.extend(repeated(EventType::DataUploadCompleted, 4));
        events.extend(events_of(&[
            (EventType::MissingRequiredField, "Q", 1),
            (EventType::AnalysisCompleted, "SUB-000", 30),
        ]));

        assert_eq!(success_rate(&events), success_rate(&events));
        assert_eq!(funnel_counts(&events), funnel_counts(&events));
        assert_eq!(dropoff(&events), dropoff(&events));
        assert_eq!(top_quality_issues(&events), top_quality_issues(&events));
        assert_eq!(time_to_analysis(&events), time_to_analysis(&events));
    }
}
