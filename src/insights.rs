//! Rule-based insight generation.
//!
//! Composes the calculator outputs into an ordered list of human-readable,
//! evidence-backed findings. Rules run in a fixed order and each appends at
//! most one insight; tie-breaks are explicit first-max-wins linear scans, so
//! the output never depends on map iteration order.

use crate::analytics::{dropoff, success_rate, time_to_analysis, top_quality_issues};
use crate::analytics::{QualityIssueCount, StageDrop};
use crate::event::Event;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Insight category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    Workflow,
    DataQuality,
    Funnel,
    Performance,
    Info,
}

/// A structured, evidence-backed natural-language finding.
///
/// `evidence` carries the calculator output backing the claim and is
/// sufficient to reconstruct the message programmatically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    /// Insight category
    #[serde(rename = "type")]
    pub kind: InsightKind,
    /// Human-readable templated finding
    pub message: String,
    /// Structured data backing the message
    pub evidence: Value,
}

/// Renders a ratio as a whole-number percentage (0.83 becomes "83%").
fn percent(rate: f64) -> String {
    format!("{:.0}%", rate * 100.0)
}

/// Generates the ordered insight list for an event snapshot.
///
/// # Behavior
/// - Empty input short-circuits with exactly one `info` insight
/// - **workflow** (always): cautionary below an 80% success rate, affirmative
///   at or above it
/// - **data_quality** (always): names the highest-count issue type, or reports
///   no blockers; ties broken by the first maximum encountered scanning the
///   ranking in order
/// - **funnel** (when a worst drop exists): cites the adjacent stage pair with
///   the highest drop rate; the scan compares with `>`, so the first-
///   encountered maximum wins ties (including an all-zero tie)
/// - **performance** (when at least one latency delta exists): cites the
///   average upload-to-analysis time in minutes
pub fn explainable_insights(events: &[Event]) -> Vec<Insight> {
    if events.is_empty() {
        return vec![Insight {
            kind: InsightKind::Info,
            message: "No data yet. Ingest events to see metrics and insights.".to_string(),
            evidence: json!({ "total_events": 0 }),
        }];
    }

    let mut insights = Vec::with_capacity(4);

    let rate = success_rate(events);
    if rate < 0.8 {
        insights.push(Insight {
            kind: InsightKind::Workflow,
            message: format!(
                "Only {} of uploads complete successfully; investigate UX and validation bottlenecks.",
                percent(rate)
            ),
            evidence: json!({ "success_rate": rate }),
        });
    } else {
        insights.push(Insight {
            kind: InsightKind::Workflow,
            message: format!(
                "Upload completion rate is {}, indicating stable intake performance.",
                percent(rate)
            ),
            evidence: json!({ "success_rate": rate }),
        });
    }

    let ranking = top_quality_issues(events);
    let mut top: Option<&QualityIssueCount> = None;
    for issue in &ranking {
        if top.map_or(true, |t| issue.count > t.count) {
            top = Some(issue);
        }
    }
    match top {
        Some(top) => insights.push(Insight {
            kind: InsightKind::DataQuality,
            message: format!(
                "Top data-quality blocker is '{}' ({} events). Prioritize data collection and validation improvements.",
                top.event_type, top.count
            ),
            evidence: json!({ "top_quality_issues": ranking }),
        }),
        None => insights.push(Insight {
            kind: InsightKind::DataQuality,
            message: "No major data-quality blockers detected in the observed window."
                .to_string(),
            evidence: json!({ "top_quality_issues": ranking }),
        }),
    }

    let breakdown = dropoff(events);
    let mut worst: Option<&StageDrop> = None;
    for drop in &breakdown.drops {
        if worst.map_or(true, |w| drop.drop_rate > w.drop_rate) {
            worst = Some(drop);
        }
    }
    if let Some(worst) = worst {
        insights.push(Insight {
            kind: InsightKind::Funnel,
            message: format!(
                "Largest drop-off occurs from {} → {} ({}).",
                worst.from,
                worst.to,
                percent(worst.drop_rate)
            ),
            evidence: json!(worst),
        });
    }

    let latency = time_to_analysis(events);
    if latency.count > 0 {
        if let Some(avg) = latency.avg {
            insights.push(Insight {
                kind: InsightKind::Performance,
                message: format!(
                    "Average time from upload completion to analysis completion is {:.1} minutes.",
                    avg
                ),
                evidence: json!(latency),
            });
        }
    }

    insights
}
