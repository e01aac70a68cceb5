//! SQLite-backed event store.
//!
//! Stores submission lifecycle events in a single `events` table, created on
//! first use. Timestamps are stored as RFC 3339 text with a fixed-width
//! fractional part so text comparison follows timestamp order; metadata is
//! stored as JSON text.

use crate::event::{ActorRole, Event, EventType};
use crate::event_store::{EventFilter, EventStore, EventStoreError};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rusqlite::{Connection, Result as SqliteResult};
use std::path::Path;
use std::str::FromStr;

/// SQLite-based event store implementation.
///
/// Automatically creates the schema on first use.
#[derive(Debug)]
pub struct SqliteEventStore {
    conn: Connection,
}

fn timestamp_text(timestamp: &DateTime<Utc>) -> String {
    // Microsecond precision keeps every stored value the same width, so the
    // TEXT column compares in chronological order.
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, false)
}

fn sql_error(e: rusqlite::Error) -> EventStoreError {
    EventStoreError::Storage(format!("SQL error: {}", e))
}

impl SqliteEventStore {
    /// Creates a new SQLite event store with a file-based database.
    ///
    /// # Arguments
    /// * `db_path` - Path to the SQLite database file. Created if missing.
    ///
    /// # Errors
    /// Returns an error if the database connection cannot be established or
    /// the schema cannot be created.
    pub fn new<P: AsRef<Path>>(db_path: P) -> SqliteResult<Self> {
        let conn = Connection::open(db_path)?;
        let store = SqliteEventStore { conn };
        store.ensure_schema()?;
        Ok(store)
    }

    /// Creates a new SQLite event store with an in-memory database.
    ///
    /// Useful for testing.
    pub fn new_in_memory() -> SqliteResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = SqliteEventStore { conn };
        store.ensure_schema()?;
        Ok(store)
    }

    /// Ensures the database schema exists, creating it if necessary.
    fn ensure_schema(&self) -> SqliteResult<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                event_type TEXT NOT NULL,
                entity_id TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                actor_role TEXT,
                metadata TEXT NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_events_event_type ON events(event_type)",
            [],
        )?;
        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_events_entity_id ON events(entity_id)",
            [],
        )?;
        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_events_timestamp ON events(timestamp)",
            [],
        )?;

        Ok(())
    }

    /// Checks if a table exists in the database.
    fn table_exists(&self, table_name: &str) -> SqliteResult<bool> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name=?1")?;
        let exists = stmt.exists([table_name])?;
        Ok(exists)
    }

    /// Returns a reference to the underlying SQLite connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl EventStore for SqliteEventStore {
    fn events(&self, filter: &EventFilter) -> Result<Vec<Event>, EventStoreError> {
        filter.validate()?;

        let mut sql = String::from(
            "SELECT event_type, entity_id, timestamp, actor_role, metadata \
             FROM events WHERE 1=1",
        );
        let mut params: Vec<String> = Vec::new();

        if let Some(since) = filter.since {
            sql.push_str(" AND timestamp >= ?");
            params.push(timestamp_text(&since));
        }
        if let Some(until) = filter.until {
            sql.push_str(" AND timestamp <= ?");
            params.push(timestamp_text(&until));
        }
        if let Some(ref entity_id) = filter.entity_id {
            sql.push_str(" AND entity_id = ?");
            params.push(entity_id.clone());
        }
        if let Some(event_type) = filter.event_type {
            sql.push_str(" AND event_type = ?");
            params.push(event_type.as_str().to_string());
        }
        sql.push_str(" ORDER BY timestamp ASC");

        let mut stmt = self.conn.prepare(&sql).map_err(sql_error)?;
        let rows = stmt
            .query_map(rusqlite::params_from_iter(params.iter()), |row| {
                let event_type_str: String = row.get(0)?;
                let entity_id: String = row.get(1)?;
                let timestamp_str: String = row.get(2)?;
                let actor_role_str: Option<String> = row.get(3)?;
                let metadata_str: String = row.get(4)?;

                let event_type = EventType::from_str(&event_type_str).map_err(|e| {
                    rusqlite::Error::InvalidColumnType(
                        0,
                        e.to_string(),
                        rusqlite::types::Type::Text,
                    )
                })?;
                let timestamp = DateTime::parse_from_rfc3339(&timestamp_str)
                    .map_err(|e| {
                        rusqlite::Error::InvalidColumnType(
                            2,
                            format!("Invalid timestamp: {}", e),
                            rusqlite::types::Type::Text,
                        )
                    })?
                    .with_timezone(&Utc);
                let actor_role = match actor_role_str {
                    Some(s) => Some(ActorRole::from_str(&s).map_err(|e| {
                        rusqlite::Error::InvalidColumnType(
                            3,
                            e.to_string(),
                            rusqlite::types::Type::Text,
                        )
                    })?),
                    None => None,
                };
                let metadata = serde_json::from_str(&metadata_str).map_err(|e| {
                    rusqlite::Error::InvalidColumnType(
                        4,
                        format!("Invalid metadata JSON: {}", e),
                        rusqlite::types::Type::Text,
                    )
                })?;

                Ok(Event {
                    event_type,
                    entity_id,
                    timestamp,
                    actor_role,
                    metadata,
                })
            })
            .map_err(sql_error)?;

        let mut events = Vec::new();
        for row_result in rows {
            match row_result {
                Ok(event) => events.push(event),
                Err(e) => {
                    return Err(EventStoreError::Storage(format!(
                        "Row parsing error: {}",
                        e
                    )))
                }
            }
        }

        Ok(events)
    }

    fn append(&mut self, event: Event) -> Result<(), EventStoreError> {
        let metadata = serde_json::to_string(&event.metadata)
            .map_err(|e| EventStoreError::Storage(format!("Metadata encoding error: {}", e)))?;

        self.conn
            .execute(
                "INSERT INTO events (event_type, entity_id, timestamp, actor_role, metadata) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    event.event_type.as_str(),
                    event.entity_id,
                    timestamp_text(&event.timestamp),
                    event.actor_role.map(|r| r.as_str()),
                    metadata,
                ],
            )
            .map_err(sql_error)?;
        Ok(())
    }

    fn append_all(&mut self, events: Vec<Event>) -> Result<usize, EventStoreError> {
        let stored = events.len();
        let tx = self.conn.transaction().map_err(sql_error)?;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO events (event_type, entity_id, timestamp, actor_role, metadata) \
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                )
                .map_err(sql_error)?;
            for event in events {
                let metadata = serde_json::to_string(&event.metadata).map_err(|e| {
                    EventStoreError::Storage(format!("Metadata encoding error: {}", e))
                })?;
                stmt.execute(rusqlite::params![
                    event.event_type.as_str(),
                    event.entity_id,
                    timestamp_text(&event.timestamp),
                    event.actor_role.map(|r| r.as_str()),
                    metadata,
                ])
                .map_err(sql_error)?;
            }
        }
        tx.commit().map_err(sql_error)?;
        Ok(stored)
    }

    fn count(&self) -> Result<usize, EventStoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))
            .map_err(sql_error)?;
        Ok(count as usize)
    }

    fn clear(&mut self) -> Result<(), EventStoreError> {
        self.conn
            .execute("DELETE FROM events", [])
            .map_err(sql_error)?;
        Ok(())
    }

    fn prune_older_than(&mut self, days: i64) -> Result<usize, EventStoreError> {
        let cutoff = Utc::now() - Duration::days(days);
        let removed = self
            .conn
            .execute(
                "DELETE FROM events WHERE timestamp < ?1",
                [timestamp_text(&cutoff)],
            )
            .map_err(sql_error)?;
        if removed > 0 {
            log::debug!("pruned {} events older than {} days", removed, days);
        }
        Ok(removed)
    }
}
