//! Postgres-backed event store implementation.
//!
//! Persists SKU-keyed event streams with append-only semantics and
//! optimistic concurrency enforced at the database level. Expected schema:
//!
//! ```sql
//! CREATE TABLE inventory_events (
//!     event_id        UUID PRIMARY KEY,
//!     sku             TEXT NOT NULL,
//!     aggregate_type  TEXT NOT NULL,
//!     sequence_number BIGINT NOT NULL CHECK (sequence_number > 0),
//!     event_type      TEXT NOT NULL,
//!     event_version   INT NOT NULL,
//!     occurred_at     TIMESTAMPTZ NOT NULL,
//!     payload         JSONB NOT NULL,
//!     created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     UNIQUE (sku, sequence_number)
//! );
//! ```
//!
//! The unique constraint on `(sku, sequence_number)` is the backstop for
//! optimistic concurrency: if another transaction commits between the
//! version check and the insert, the insert fails with a unique violation
//! which is mapped to `EventStoreError::Concurrency`.

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use std::sync::Arc;
use tracing::instrument;

use commandcenter_core::{ExpectedVersion, Sku};

use super::r#trait::{EventStore, EventStoreError, StoredEvent, UncommittedEvent};

/// Postgres-backed append-only event store.
///
/// All operations run on the SQLx connection pool (thread-safe) and inside
/// transactions where atomicity matters. The synchronous `EventStore` trait
/// is bridged onto the async pool via the ambient tokio runtime handle, the
/// same way the read-model store does it.
#[derive(Debug, Clone)]
pub struct PostgresEventStore {
    pool: Arc<PgPool>,
}

impl PostgresEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Load all events for a SKU stream in sequence order.
    #[instrument(skip(self), fields(sku = %sku), err)]
    pub async fn load_stream_async(&self, sku: &Sku) -> Result<Vec<StoredEvent>, EventStoreError> {
        let rows = sqlx::query(
            r#"
            SELECT
                event_id,
                sku,
                aggregate_type,
                sequence_number,
                event_type,
                event_version,
                occurred_at,
                payload
            FROM inventory_events
            WHERE sku = $1
            ORDER BY sequence_number ASC
            "#,
        )
        .bind(sku.as_str())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("load_stream", e))?;

        let mut stored_events = Vec::with_capacity(rows.len());
        for row in rows {
            stored_events.push(row_to_stored(&row)?);
        }

        Ok(stored_events)
    }

    /// Append events to a stream with optimistic concurrency control.
    #[instrument(
        skip(self, events),
        fields(sku = %sku, event_count = events.len(), expected_version = ?expected_version),
        err
    )]
    pub async fn append_events(
        &self,
        sku: &Sku,
        events: Vec<UncommittedEvent>,
        expected_version: ExpectedVersion,
    ) -> Result<Vec<StoredEvent>, EventStoreError> {
        if events.is_empty() {
            return Ok(vec![]);
        }

        for (idx, e) in events.iter().enumerate() {
            if &e.sku != sku {
                return Err(EventStoreError::StreamMismatch(format!(
                    "batch contains multiple skus (index {idx})"
                )));
            }
        }

        let aggregate_type = events[0].aggregate_type.clone();
        for (idx, e) in events.iter().enumerate() {
            if e.aggregate_type != aggregate_type {
                return Err(EventStoreError::AggregateTypeMismatch(format!(
                    "batch contains multiple aggregate_types (index {idx})"
                )));
            }
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let (current_version, existing_aggregate_type) = check_stream_version(&mut tx, sku).await?;

        if let Some(existing_type) = &existing_aggregate_type
            && existing_type != &aggregate_type
        {
            tx.rollback().await.map_err(|e| map_sqlx_error("rollback", e))?;
            return Err(EventStoreError::AggregateTypeMismatch(format!(
                "stream aggregate_type is '{existing_type}', attempted append with '{aggregate_type}'"
            )));
        }

        if !expected_version.matches(current_version) {
            tx.rollback().await.map_err(|e| map_sqlx_error("rollback", e))?;
            return Err(EventStoreError::Concurrency(format!(
                "optimistic concurrency check failed: expected {expected_version:?}, found {current_version}"
            )));
        }

        let mut stored_events = Vec::with_capacity(events.len());
        let mut next_sequence = current_version + 1;

        for event in events {
            sqlx::query(
                r#"
                INSERT INTO inventory_events (
                    event_id,
                    sku,
                    aggregate_type,
                    sequence_number,
                    event_type,
                    event_version,
                    occurred_at,
                    payload
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(event.event_id)
            .bind(event.sku.as_str())
            .bind(&aggregate_type)
            .bind(next_sequence as i64)
            .bind(&event.event_type)
            .bind(event.event_version as i32)
            .bind(event.occurred_at)
            .bind(&event.payload)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    EventStoreError::Concurrency(format!(
                        "concurrent append detected: sequence_number {next_sequence} already exists"
                    ))
                } else {
                    map_sqlx_error("insert_event", e)
                }
            })?;

            let stored = StoredEvent {
                event_id: event.event_id,
                sku: event.sku,
                aggregate_type: event.aggregate_type,
                sequence_number: next_sequence,
                event_type: event.event_type,
                event_version: event.event_version,
                occurred_at: event.occurred_at,
                payload: event.payload,
            };
            stored_events.push(stored);
            next_sequence += 1;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Ok(stored_events)
    }
}

/// Current `(version, aggregate_type)` of a stream; `(0, None)` when the
/// stream does not exist yet.
async fn check_stream_version(
    tx: &mut Transaction<'_, Postgres>,
    sku: &Sku,
) -> Result<(u64, Option<String>), EventStoreError> {
    let row = sqlx::query(
        r#"
        SELECT
            COALESCE(MAX(sequence_number), 0) as current_version,
            MAX(aggregate_type) as aggregate_type
        FROM inventory_events
        WHERE sku = $1
        "#,
    )
    .bind(sku.as_str())
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("check_stream_version", e))?;

    let current_version: Option<i64> = row
        .try_get("current_version")
        .map_err(|e| EventStoreError::InvalidAppend(format!("failed to read current_version: {e}")))?;
    let aggregate_type: Option<String> = row
        .try_get("aggregate_type")
        .map_err(|e| EventStoreError::InvalidAppend(format!("failed to read aggregate_type: {e}")))?;

    Ok((current_version.unwrap_or(0) as u64, aggregate_type))
}

fn row_to_stored(row: &PgRow) -> Result<StoredEvent, EventStoreError> {
    let column = |e: sqlx::Error| {
        EventStoreError::InvalidAppend(format!("failed to deserialize event row: {e}"))
    };

    let sku: String = row.try_get("sku").map_err(column)?;
    let sequence_number: i64 = row.try_get("sequence_number").map_err(column)?;
    let event_version: i32 = row.try_get("event_version").map_err(column)?;

    Ok(StoredEvent {
        event_id: row.try_get("event_id").map_err(column)?,
        sku: Sku::new(&sku)
            .map_err(|e| EventStoreError::StreamMismatch(format!("stored sku invalid: {e}")))?,
        aggregate_type: row.try_get("aggregate_type").map_err(column)?,
        sequence_number: sequence_number as u64,
        event_type: row.try_get("event_type").map_err(column)?,
        event_version: event_version as u32,
        occurred_at: row.try_get("occurred_at").map_err(column)?,
        payload: row.try_get("payload").map_err(column)?,
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505")
    )
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> EventStoreError {
    EventStoreError::InvalidAppend(format!("{operation} failed: {err}"))
}

impl EventStore for PostgresEventStore {
    fn append(
        &self,
        events: Vec<UncommittedEvent>,
        expected_version: ExpectedVersion,
    ) -> Result<Vec<StoredEvent>, EventStoreError> {
        // The EventStore trait is synchronous; bridge onto the ambient tokio
        // runtime (handlers always run inside one).
        let handle = tokio::runtime::Handle::try_current().map_err(|_| {
            EventStoreError::InvalidAppend(
                "PostgresEventStore requires a tokio runtime context".to_string(),
            )
        })?;

        if events.is_empty() {
            return Ok(vec![]);
        }

        let sku = events[0].sku.clone();
        handle.block_on(self.append_events(&sku, events, expected_version))
    }

    fn load_stream(&self, sku: &Sku) -> Result<Vec<StoredEvent>, EventStoreError> {
        let handle = tokio::runtime::Handle::try_current().map_err(|_| {
            EventStoreError::InvalidAppend(
                "PostgresEventStore requires a tokio runtime context".to_string(),
            )
        })?;

        handle.block_on(self.load_stream_async(sku))
    }
}
