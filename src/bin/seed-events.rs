//! Seeds a database with a synthetic submission corpus.
//!
//! Run with: `cargo run --bin seed-events`
//!
//! Generates a realistic mix of funnel progressions, data-quality failures,
//! analysis failures, and clinician reviews. Skips seeding when the database
//! already holds events.

use chrono::{Duration, Utc};
use medical_analytics::event::{ActorRole, Event, EventType};
use medical_analytics::event_store::EventStore;
use medical_analytics::sqlite_store::SqliteEventStore;
use serde_json::{json, Map, Value};

fn metadata(pairs: &[(&str, Value)]) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect()
}

/// Random integer in `lo..=hi`.
fn rand_between(lo: i64, hi: i64) -> i64 {
    lo + (rand::random::<f64>() * (hi - lo + 1) as f64) as i64
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let database_path =
        std::env::var("DATABASE_PATH").unwrap_or_else(|_| "monitor.db".to_string());

    println!("Seeding events into {}...", database_path);
    println!();

    let mut store = SqliteEventStore::new(&database_path)?;

    let existing = store.count()?;
    if existing > 0 {
        println!("Database already has {} events. Skipping seed.", existing);
        return Ok(());
    }

    let now = Utc::now();
    let total_submissions = 60;
    let mut events: Vec<Event> = Vec::new();

    for i in 1..=total_submissions {
        let entity_id = format!("SUB-{:03}", i);
        let t0 = now
            - Duration::days(rand_between(0, 14))
            - Duration::minutes(rand_between(0, 600));

        // Everyone starts an upload
        let source = if rand::random::<f64>() < 0.5 {
            "web"
        } else {
            "mobile"
        };
        events.push(
            Event::new(EventType::DataUploadStarted, &entity_id, t0)
                .with_actor_role(ActorRole::Patient)
                .with_metadata(metadata(&[("source", json!(source))])),
        );

        // Some fail data quality before completion
        if rand::random::<f64>() < 0.20 {
            let quality_event = if rand::random::<f64>() < 0.5 {
                Event::new(
                    EventType::MissingRequiredField,
                    &entity_id,
                    t0 + Duration::seconds(10),
                )
                .with_actor_role(ActorRole::System)
                .with_metadata(metadata(&[("field", json!("wbc"))]))
            } else {
                Event::new(
                    EventType::OutOfRangeValueDetected,
                    &entity_id,
                    t0 + Duration::seconds(10),
                )
                .with_actor_role(ActorRole::System)
                .with_metadata(metadata(&[
                    ("field", json!("hb")),
                    ("value", json!(8.4)),
                    ("min", json!(9.0)),
                    ("max", json!(18.0)),
                ]))
            };
            events.push(quality_event);
            continue;
        }

        // Many complete the upload
        let t1 = t0 + Duration::minutes(rand_between(1, 6));
        let hb = 11.5 + rand::random::<f64>() * 5.0;
        let wbc = 4.0 + rand::random::<f64>() * 6.0;
        let glucose = rand_between(75, 160);
        events.push(
            Event::new(EventType::DataUploadCompleted, &entity_id, t1)
                .with_actor_role(ActorRole::Patient)
                .with_metadata(metadata(&[
                    ("hb", json!((hb * 10.0).round() / 10.0)),
                    ("wbc", json!((wbc * 10.0).round() / 10.0)),
                    ("glucose", json!(glucose)),
                ])),
        );

        // Some analyses fail
        if rand::random::<f64>() < 0.12 {
            events.push(
                Event::new(
                    EventType::AnalysisFailed,
                    &entity_id,
                    t1 + Duration::minutes(rand_between(1, 4)),
                )
                .with_actor_role(ActorRole::System)
                .with_metadata(metadata(&[("reason", json!("quality_gate_failed"))])),
            );
            continue;
        }

        // Many analyses complete
        let t2 = t1 + Duration::minutes(rand_between(1, 10));
        events.push(
            Event::new(EventType::AnalysisCompleted, &entity_id, t2)
                .with_actor_role(ActorRole::System)
                .with_metadata(metadata(&[("engine", json!("rules-v1"))])),
        );

        // Some clinician reviews complete
        if rand::random::<f64>() < 0.70 {
            let decisions = ["ok", "followup", "retest"];
            let decision = decisions[rand_between(0, 2) as usize];
            events.push(
                Event::new(
                    EventType::ClinicianReviewCompleted,
                    &entity_id,
                    t2 + Duration::minutes(rand_between(2, 30)),
                )
                .with_actor_role(ActorRole::Clinician)
                .with_metadata(metadata(&[("decision", json!(decision))])),
            );
        }
    }

    let created = store.append_all(events)?;

    println!(
        "Seed complete. Inserted {} events for {} submissions.",
        created, total_submissions
    );

    Ok(())
}

// Simple pseudo-random number generator
mod rand {
    use std::cell::Cell;
    use std::time::{SystemTime, UNIX_EPOCH};

    thread_local! {
        static SEED: Cell<u64> = Cell::new(
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap()
                .as_nanos() as u64
        );
    }

    pub fn random<T: FromRandom>() -> T {
        T::from_random()
    }

    pub trait FromRandom {
        fn from_random() -> Self;
    }

    impl FromRandom for f64 {
        fn from_random() -> Self {
            SEED.with(|seed| {
                let mut s = seed.get();
                s ^= s << 13;
                s ^= s >> 7;
                s ^= s << 17;
                seed.set(s);
                // Map to [0, 1)
                (s >> 11) as f64 / (1u64 << 53) as f64
            })
        }
    }
}
