//! SQLite-backed batch store (survives restarts).

use crate::{Batch, BatchStatus, BatchStore, Ingestion, Priority, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{ErrorCode, OptionalExtension};
use std::path::Path;

/// SQLite-backed batch store for persistence.
pub struct SqliteBatchStore {
    conn: std::sync::Mutex<rusqlite::Connection>,
}

impl SqliteBatchStore {
    /// Open (or create) a store at the given path.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = rusqlite::Connection::open(path).map_err(store_err)?;
        Self::init(conn)
    }

    /// Store backed by a private in-memory database.
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = rusqlite::Connection::open_in_memory().map_err(store_err)?;
        Self::init(conn)
    }

    fn init(conn: rusqlite::Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS ingestions (
                ingestion_id TEXT PRIMARY KEY,
                priority TEXT NOT NULL,
                created_at TEXT NOT NULL,
                batch_refs TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS batches (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                batch_id TEXT NOT NULL UNIQUE,
                ingestion_id TEXT NOT NULL,
                ids TEXT NOT NULL,
                priority TEXT NOT NULL,
                created_at TEXT NOT NULL,
                status TEXT NOT NULL,
                FOREIGN KEY (ingestion_id) REFERENCES ingestions(ingestion_id)
            );

            CREATE INDEX IF NOT EXISTS idx_batches_ingestion ON batches(ingestion_id);
            CREATE INDEX IF NOT EXISTS idx_batches_status ON batches(status);
            "#,
        )
        .map_err(store_err)?;

        Ok(Self {
            conn: std::sync::Mutex::new(conn),
        })
    }

    fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&rusqlite::Connection) -> Result<T, rusqlite::Error>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| StoreError::Other(format!("failed to acquire lock: {}", e)))?;
        f(&conn).map_err(store_err)
    }
}

fn store_err(e: rusqlite::Error) -> StoreError {
    match e {
        rusqlite::Error::SqliteFailure(ref f, ref msg)
            if f.code == ErrorCode::ConstraintViolation =>
        {
            StoreError::Duplicate(msg.clone().unwrap_or_else(|| f.to_string()))
        }
        other => StoreError::Other(other.to_string()),
    }
}

fn conversion_err<E>(e: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::ToSqlConversionFailure(Box::new(e))
}

fn text_err(msg: String) -> rusqlite::Error {
    rusqlite::Error::ToSqlConversionFailure(msg.into())
}

fn ts(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_ts(s: &str) -> Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(conversion_err)
}

fn batch_from_row(row: &rusqlite::Row<'_>) -> Result<Batch, rusqlite::Error> {
    let ids: String = row.get("ids")?;
    let priority: String = row.get("priority")?;
    let created_at: String = row.get("created_at")?;
    let status: String = row.get("status")?;
    Ok(Batch {
        batch_id: row.get("batch_id")?,
        ingestion_id: row.get("ingestion_id")?,
        ids: serde_json::from_str(&ids).map_err(conversion_err)?,
        priority: priority.parse::<Priority>().map_err(conversion_err)?,
        created_at: parse_ts(&created_at)?,
        status: status.parse::<BatchStatus>().map_err(text_err)?,
    })
}

/// Guarded update; true only when exactly one row moved from `from` to `to`.
fn apply_transition(
    conn: &rusqlite::Connection,
    batch_id: &str,
    from: BatchStatus,
    to: BatchStatus,
) -> Result<bool, rusqlite::Error> {
    let changed = conn.execute(
        "UPDATE batches SET status = ?1 WHERE batch_id = ?2 AND status = ?3",
        rusqlite::params![to.as_str(), batch_id, from.as_str()],
    )?;
    Ok(changed == 1)
}

const BATCH_COLUMNS: &str = "batch_id, ingestion_id, ids, priority, created_at, status";

#[async_trait]
impl BatchStore for SqliteBatchStore {
    async fn create_ingestion(
        &self,
        ingestion: &Ingestion,
        batches: &[Batch],
    ) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            let refs = serde_json::to_string(&ingestion.batch_refs).map_err(conversion_err)?;
            tx.execute(
                "INSERT INTO ingestions (ingestion_id, priority, created_at, batch_refs) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![
                    ingestion.ingestion_id,
                    ingestion.priority.as_str(),
                    ts(&ingestion.created_at),
                    refs,
                ],
            )?;
            for b in batches {
                let ids = serde_json::to_string(&b.ids).map_err(conversion_err)?;
                tx.execute(
                    "INSERT INTO batches (batch_id, ingestion_id, ids, priority, created_at, status) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    rusqlite::params![
                        b.batch_id,
                        b.ingestion_id,
                        ids,
                        b.priority.as_str(),
                        ts(&b.created_at),
                        b.status.as_str(),
                    ],
                )?;
            }
            tx.commit()
        })?;
        tracing::debug!(ingestion_id = %ingestion.ingestion_id, "ingestion stored (sqlite)");
        Ok(())
    }

    async fn get_ingestion(&self, ingestion_id: &str) -> Result<Option<Ingestion>, StoreError> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT ingestion_id, priority, created_at, batch_refs FROM ingestions WHERE ingestion_id = ?1",
                [ingestion_id],
                |row| {
                    let priority: String = row.get(1)?;
                    let created_at: String = row.get(2)?;
                    let refs: String = row.get(3)?;
                    Ok(Ingestion {
                        ingestion_id: row.get(0)?,
                        priority: priority.parse::<Priority>().map_err(conversion_err)?,
                        created_at: parse_ts(&created_at)?,
                        batch_refs: serde_json::from_str(&refs).map_err(conversion_err)?,
                    })
                },
            )
            .optional()
        })
    }

    async fn get_batches(&self, batch_ids: &[String]) -> Result<Vec<Batch>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM batches WHERE batch_id = ?1",
                BATCH_COLUMNS
            ))?;
            let mut out = Vec::with_capacity(batch_ids.len());
            for id in batch_ids {
                if let Some(b) = stmt.query_row([id], batch_from_row).optional()? {
                    out.push(b);
                }
            }
            Ok(out)
        })
    }

    async fn update_batch_status(
        &self,
        batch_id: &str,
        status: BatchStatus,
    ) -> Result<(), StoreError> {
        // Read, check and write under one lock so the transition cannot race.
        self.with_conn(|conn| {
            let current: Option<String> = conn
                .query_row(
                    "SELECT status FROM batches WHERE batch_id = ?1",
                    [batch_id],
                    |row| row.get(0),
                )
                .optional()?;
            let current = match current {
                Some(raw) => raw.parse::<BatchStatus>().map_err(StoreError::Other),
                None => Err(StoreError::NotFound(batch_id.to_string())),
            };
            let current = match current {
                Ok(c) => c,
                Err(e) => return Ok(Err(e)),
            };
            if !current.can_advance_to(status) {
                return Ok(Err(StoreError::Other(format!(
                    "illegal status transition for batch {}: {} -> {}",
                    batch_id, current, status
                ))));
            }
            if !apply_transition(conn, batch_id, current, status)? {
                return Ok(Err(StoreError::Other(format!(
                    "batch {} changed status concurrently",
                    batch_id
                ))));
            }
            Ok(Ok(()))
        })?
    }

    async fn pending_batches(&self) -> Result<Vec<Batch>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM batches WHERE status = ?1 ORDER BY seq ASC",
                BATCH_COLUMNS
            ))?;
            let rows = stmt.query_map([BatchStatus::YetToStart.as_str()], batch_from_row)?;
            let pending = rows.collect::<Result<Vec<_>, _>>();
            pending
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::ingestion_with;

    #[tokio::test]
    async fn round_trip_preserves_records() {
        let store = SqliteBatchStore::in_memory().unwrap();
        let (ing, batches) =
            ingestion_with("i1", Priority::Medium, Utc::now(), &[&[1, 2, 3], &[4]]);
        store.create_ingestion(&ing, &batches).await.unwrap();

        let got = store.get_ingestion("i1").await.unwrap().unwrap();
        assert_eq!(got, ing);
        assert_eq!(store.get_batches(&got.batch_refs).await.unwrap(), batches);
        assert!(store.get_ingestion("other").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_batch_rolls_back_ingestion() {
        let store = SqliteBatchStore::in_memory().unwrap();
        let now = Utc::now();
        let (a, ab) = ingestion_with("a", Priority::Low, now, &[&[1]]);
        store.create_ingestion(&a, &ab).await.unwrap();

        let (b, mut bb) = ingestion_with("b", Priority::Low, now, &[&[2]]);
        bb[0].batch_id = "a-b0".to_string();
        let err = store.create_ingestion(&b, &bb).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
        assert!(store.get_ingestion("b").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn status_transitions_and_pending() {
        let store = SqliteBatchStore::in_memory().unwrap();
        let (ing, batches) = ingestion_with("i", Priority::High, Utc::now(), &[&[1], &[2]]);
        store.create_ingestion(&ing, &batches).await.unwrap();

        store
            .update_batch_status("i-b0", BatchStatus::Triggered)
            .await
            .unwrap();
        assert!(store
            .update_batch_status("i-b0", BatchStatus::YetToStart)
            .await
            .is_err());
        store
            .update_batch_status("i-b0", BatchStatus::Completed)
            .await
            .unwrap();

        let pending = store.pending_batches().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].batch_id, "i-b1");
    }

    #[tokio::test]
    async fn unknown_batch_and_stale_transition_are_errors() {
        let store = SqliteBatchStore::in_memory().unwrap();
        let (ing, batches) = ingestion_with("s", Priority::Low, Utc::now(), &[&[1]]);
        store.create_ingestion(&ing, &batches).await.unwrap();

        assert!(matches!(
            store
                .update_batch_status("missing", BatchStatus::Triggered)
                .await,
            Err(StoreError::NotFound(_))
        ));

        store
            .update_batch_status("s-b0", BatchStatus::Triggered)
            .await
            .unwrap();
        // A write based on an outdated status must not report success.
        let moved = store
            .with_conn(|conn| {
                apply_transition(conn, "s-b0", BatchStatus::YetToStart, BatchStatus::Triggered)
            })
            .unwrap();
        assert!(!moved);
        let moved = store
            .with_conn(|conn| {
                apply_transition(conn, "s-b0", BatchStatus::Triggered, BatchStatus::Completed)
            })
            .unwrap();
        assert!(moved);
        assert!(matches!(
            store
                .update_batch_status("s-b0", BatchStatus::Completed)
                .await,
            Err(StoreError::Other(_))
        ));
    }
}
