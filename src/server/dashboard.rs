//! Server-rendered HTML dashboard.
//!
//! Public, read-only view over the aggregate metrics. Shows no raw events.

use crate::analytics::{funnel_counts, success_rate, top_quality_issues};
use crate::event::Event;
use crate::insights::explainable_insights;

fn list_items(items: &[String], empty_note: &str) -> String {
    if items.is_empty() {
        format!("<li>{}</li>", empty_note)
    } else {
        items
            .iter()
            .map(|item| format!("<li>{}</li>", item))
            .collect()
    }
}

/// Renders the dashboard page for an event snapshot.
pub fn render_dashboard(events: &[Event]) -> String {
    let rate = success_rate(events);
    let funnel = funnel_counts(events);
    let quality = top_quality_issues(events);
    let insights = explainable_insights(events);

    let quality_items: Vec<String> = quality
        .iter()
        .map(|issue| format!("{}: {}", issue.event_type, issue.count))
        .collect();
    let funnel_items: Vec<String> = funnel
        .iter()
        .map(|stage| format!("{}: {}", stage.stage, stage.count))
        .collect();
    let insight_items: Vec<String> = insights
        .iter()
        .map(|insight| insight.message.clone())
        .collect();

    format!(
        r#"<html>
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>Medical Analytics Monitor</title>
    <style>
      body {{ font-family: Arial, sans-serif; padding: 24px; max-width: 1000px; margin: 0 auto; }}
      .card {{ border: 1px solid #ddd; border-radius: 12px; padding: 16px; margin-bottom: 16px; }}
      .grid {{ display: grid; grid-template-columns: 1fr 1fr; gap: 16px; }}
      .muted {{ color: #666; }}
      code {{ background: #f6f6f6; padding: 2px 6px; border-radius: 6px; }}
    </style>
  </head>
  <body>
    <h1>Medical Web Analytics &amp; Data Quality Monitor</h1>
    <p class="muted">
      Public, read-only dashboard. Metrics are computed from the database.
    </p>
    <p>Total events in DB: <b>{total}</b></p>

    <div class="grid">
      <div class="card">
        <h2>Upload Success Rate</h2>
        <p><b>{rate:.0}%</b></p>
        <p class="muted">
          Based on <code>data_upload_started</code> &rarr; <code>data_upload_completed</code>
        </p>
      </div>

      <div class="card">
        <h2>Top Data Quality Issues</h2>
        <ul>{quality}</ul>
      </div>
    </div>

    <div class="card">
      <h2>Funnel</h2>
      <ul>{funnel}</ul>
    </div>

    <div class="card">
      <h2>Explainable Insights</h2>
      <ul>{insights}</ul>
    </div>

    <div class="card">
      <h2>How to use</h2>
      <p>Ingest events via <code>POST /events</code> (API key required).</p>
      <p>This dashboard is public and shows aggregated analytics only.</p>
    </div>
  </body>
</html>
"#,
        total = events.len(),
        rate = rate * 100.0,
        quality = list_items(&quality_items, "No issues detected"),
        funnel = list_items(&funnel_items, "No events yet"),
        insights = list_items(&insight_items, "No insights yet. Ingest events first."),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventType;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_dashboard_renders_metrics_sections() {
        let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let events = vec![
            Event::new(EventType::DataUploadStarted, "SUB-001", t0),
            Event::new(EventType::MissingRequiredField, "SUB-001", t0),
        ];

        let html = render_dashboard(&events);
        assert!(html.contains("Total events in DB: <b>2</b>"));
        assert!(html.contains("missing_required_field: 1"));
        assert!(html.contains("data_upload_started: 1"));
        // Success rate is 0/1 -> cautionary workflow insight appears
        assert!(html.contains("Only 0% of uploads complete successfully"));
    }

    #[test]
    fn test_dashboard_empty_snapshot_shows_placeholders() {
        let html = render_dashboard(&[]);
        assert!(html.contains("Total events in DB: <b>0</b>"));
        assert!(html.contains("No issues detected"));
        // Empty input short-circuits to the single info insight
        assert!(html.contains("No data yet. Ingest events to see metrics and insights."));
    }
}
