//! Event store boundary.
//!
//! The analytics core never touches storage directly: a collaborator
//! implementing [`EventStore`] supplies a consistent, timestamp-ascending
//! snapshot of events per call. Implementations can be an in-memory Vec (for
//! testing and embedding), a SQLite database, or any other backend behind the
//! same read interface.

use crate::event::{Event, EventType};
use chrono::{DateTime, Duration, Utc};

/// Filter for event snapshot queries. All bounds are inclusive; unset fields
/// match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventFilter {
    /// Earliest timestamp to include (inclusive)
    pub since: Option<DateTime<Utc>>,
    /// Latest timestamp to include (inclusive)
    pub until: Option<DateTime<Utc>>,
    /// Restrict to a single entity
    pub entity_id: Option<String>,
    /// Restrict to a single event type
    pub event_type: Option<EventType>,
}

impl EventFilter {
    /// Creates an empty filter matching all events.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the inclusive lower timestamp bound.
    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    /// Sets the inclusive upper timestamp bound.
    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    /// Restricts the filter to one entity.
    pub fn entity_id(mut self, entity_id: impl Into<String>) -> Self {
        self.entity_id = Some(entity_id.into());
        self
    }

    /// Restricts the filter to one event type.
    pub fn event_type(mut self, event_type: EventType) -> Self {
        self.event_type = Some(event_type);
        self
    }

    /// Validates the filter bounds.
    ///
    /// # Errors
    /// Returns `InvalidFilter` if both bounds are set and `since > until`.
    pub fn validate(&self) -> Result<(), EventStoreError> {
        if let (Some(since), Some(until)) = (self.since, self.until) {
            if since > until {
                return Err(EventStoreError::InvalidFilter(
                    "since must be before or equal to until".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Returns `true` if the event passes every set condition.
    pub fn matches(&self, event: &Event) -> bool {
        if let Some(since) = self.since {
            if event.timestamp < since {
                return false;
            }
        }
        if let Some(until) = self.until {
            if event.timestamp > until {
                return false;
            }
        }
        if let Some(ref entity_id) = self.entity_id {
            if event.entity_id != *entity_id {
                return false;
            }
        }
        if let Some(event_type) = self.event_type {
            if event.event_type != event_type {
                return false;
            }
        }
        true
    }
}

/// Errors that can occur when accessing an event store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventStoreError {
    /// The filter is inconsistent (e.g., since > until)
    InvalidFilter(String),
    /// Backend failure (I/O, SQL, serialization)
    Storage(String),
}

impl std::fmt::Display for EventStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventStoreError::InvalidFilter(msg) => write!(f, "Invalid filter: {}", msg),
            EventStoreError::Storage(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for EventStoreError {}

/// Trait for event storage abstraction.
///
/// `events` is the read interface the analytics core depends on: it returns a
/// materialized snapshot in ascending timestamp order, which is the order the
/// latency calculator requires (the other calculators are order-independent).
/// Writes exist for the ingestion boundary and tooling; the core itself never
/// writes.
pub trait EventStore {
    /// Returns a timestamp-ascending snapshot of events passing the filter.
    ///
    /// # Errors
    /// Returns an error if the filter is invalid or the backend fails.
    fn events(&self, filter: &EventFilter) -> Result<Vec<Event>, EventStoreError>;

    /// Appends a single event.
    fn append(&mut self, event: Event) -> Result<(), EventStoreError>;

    /// Appends a batch of events, returning how many were stored.
    fn append_all(&mut self, events: Vec<Event>) -> Result<usize, EventStoreError> {
        let stored = events.len();
        for event in events {
            self.append(event)?;
        }
        Ok(stored)
    }

    /// Returns the total number of stored events.
    fn count(&self) -> Result<usize, EventStoreError>;

    /// Removes all stored events.
    fn clear(&mut self) -> Result<(), EventStoreError>;

    /// Removes events older than `days` days, returning how many were removed.
    fn prune_older_than(&mut self, days: i64) -> Result<usize, EventStoreError>;
}

/// In-memory event store backed by a Vec.
///
/// Used for tests and for embedding the engine without a database.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventStore {
    events: Vec<Event>,
}

impl InMemoryEventStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventStore for InMemoryEventStore {
    fn events(&self, filter: &EventFilter) -> Result<Vec<Event>, EventStoreError> {
        filter.validate()?;
        let mut snapshot: Vec<Event> = self
            .events
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        snapshot.sort_by_key(|e| e.timestamp);
        Ok(snapshot)
    }

    fn append(&mut self, event: Event) -> Result<(), EventStoreError> {
        self.events.push(event);
        Ok(())
    }

    fn count(&self) -> Result<usize, EventStoreError> {
        Ok(self.events.len())
    }

    fn clear(&mut self) -> Result<(), EventStoreError> {
        self.events.clear();
        Ok(())
    }

    fn prune_older_than(&mut self, days: i64) -> Result<usize, EventStoreError> {
        let cutoff = Utc::now() - Duration::days(days);
        let before = self.events.len();
        self.events.retain(|e| e.timestamp >= cutoff);
        let removed = before - self.events.len();
        if removed > 0 {
            log::debug!("pruned {} events older than {} days", removed, days);
        }
        Ok(removed)
    }
}
