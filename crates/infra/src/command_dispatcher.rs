//! Command execution pipeline (application-level orchestration).
//!
//! Implements the command dispatch pattern for the event-sourced ledger:
//!
//! ```text
//! Command
//!   ↓
//! 1. Load events from store (SKU stream)
//!   ↓
//! 2. Rehydrate aggregate (apply history to rebuild state)
//!   ↓
//! 3. Handle command (pure decision logic, produces events)
//!   ↓
//! 4. Persist events (append-only, optimistic concurrency check)
//!   ↓
//! 5. Publish events to bus (projections, realtime feed)
//! ```
//!
//! The dispatcher sits between HTTP handlers and the store/bus. Events are
//! persisted before publication, so a failed publish never loses data
//! (at-least-once delivery; consumers are idempotent). Per-SKU mutual
//! exclusion falls out of the optimistic concurrency check: of two
//! interleaved read-modify-writes on one stream at most one append commits,
//! the other caller gets `DispatchError::Conflict` and may retry against
//! fresh state. Commands on different SKUs never contend.
//!
//! This module contains no IO itself; it composes the store/bus traits.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use thiserror::Error;
use uuid::Uuid;

use commandcenter_core::{Aggregate, DomainError, ExpectedVersion, Sku};
use commandcenter_events::{EventBus, EventEnvelope};

use crate::event_store::{EventStore, EventStoreError, StoredEvent, UncommittedEvent};

#[derive(Debug, Error)]
pub enum DispatchError {
    /// Optimistic concurrency failure (a concurrent writer won the race).
    #[error("conflict: {0}")]
    Conflict(String),
    /// Stream integrity violation (wrong SKU or broken sequence in storage).
    #[error("stream integrity violation: {0}")]
    StreamMismatch(String),
    /// Domain validation failure (deterministic).
    #[error("validation failed for {0}")]
    Validation(String),
    /// Malformed SKU.
    #[error("invalid sku: {0}")]
    InvalidSku(String),
    /// Create attempted against an existing SKU.
    #[error("sku already exists: {0}")]
    DuplicateSku(String),
    /// The referenced SKU is not in the active catalog.
    #[error("sku not found: {0}")]
    NotFound(String),
    /// The movement would drive stock below zero.
    #[error("insufficient stock for {sku}: current {current}, delta {delta}")]
    InsufficientStock { sku: String, current: i64, delta: i64 },
    /// Forbidden mutation path (e.g. stock change outside a movement).
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
    /// Failed to deserialize historical event payloads.
    #[error("failed to deserialize event payload: {0}")]
    Deserialize(String),
    /// Persisting to the event store failed.
    #[error("event store error: {0}")]
    Store(#[source] EventStoreError),
    /// Publication failed after a successful append (at-least-once; retry
    /// may duplicate).
    #[error("event publication failed: {0}")]
    Publish(String),
}

impl From<EventStoreError> for DispatchError {
    fn from(value: EventStoreError) -> Self {
        match &value {
            EventStoreError::Concurrency(msg) => DispatchError::Conflict(msg.clone()),
            EventStoreError::StreamMismatch(msg) => DispatchError::StreamMismatch(msg.clone()),
            _ => DispatchError::Store(value),
        }
    }
}

impl From<DomainError> for DispatchError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation { field, message } => {
                DispatchError::Validation(format!("{field}: {message}"))
            }
            DomainError::InvalidSku(msg) => DispatchError::InvalidSku(msg),
            DomainError::DuplicateSku(sku) => DispatchError::DuplicateSku(sku),
            DomainError::NotFound(sku) => DispatchError::NotFound(sku),
            DomainError::InsufficientStock { sku, current, delta } => {
                DispatchError::InsufficientStock { sku, current, delta }
            }
            DomainError::InvalidOperation(msg) => DispatchError::InvalidOperation(msg),
        }
    }
}

/// Reusable command execution engine for the event-sourced ledger.
///
/// Generic over the store and bus so tests run fully in memory and the
/// Postgres-backed store slots in without touching domain code.
#[derive(Debug)]
pub struct CommandDispatcher<S, B> {
    store: S,
    bus: B,
}

impl<S, B> CommandDispatcher<S, B> {
    pub fn new(store: S, bus: B) -> Self {
        Self { store, bus }
    }

    pub fn into_parts(self) -> (S, B) {
        (self.store, self.bus)
    }
}

impl<S, B> CommandDispatcher<S, B>
where
    S: EventStore,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    /// Dispatch a command through the full pipeline.
    ///
    /// `make_aggregate` is a factory for a fresh (empty) aggregate instance;
    /// the dispatcher rehydrates it from the stream before handling. Returns
    /// the committed `StoredEvent`s with their assigned sequence numbers.
    pub fn dispatch<A>(
        &self,
        sku: &Sku,
        aggregate_type: impl Into<String>,
        command: A::Command,
        make_aggregate: impl FnOnce(Sku) -> A,
    ) -> Result<Vec<StoredEvent>, DispatchError>
    where
        A: Aggregate<Error = DomainError>,
        A::Event: commandcenter_events::Event + Serialize + DeserializeOwned,
    {
        // 1) Load history
        let history = self.store.load_stream(sku)?;
        validate_loaded_stream(sku, &history)?;
        let expected = ExpectedVersion::Exact(stream_version(&history));

        // 2) Rehydrate aggregate
        let mut aggregate = make_aggregate(sku.clone());
        apply_history::<A>(&mut aggregate, &history)?;

        // 3) Decide events (no mutation)
        let decided = aggregate.handle(&command).map_err(DispatchError::from)?;
        if decided.is_empty() {
            return Ok(vec![]);
        }

        // 4) Persist (append-only, optimistic)
        let aggregate_type = aggregate_type.into();
        let uncommitted = decided
            .iter()
            .map(|ev| {
                UncommittedEvent::from_typed(sku.clone(), aggregate_type.clone(), Uuid::now_v7(), ev)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let committed = self.store.append(uncommitted, expected)?;

        // 5) Publish committed events (after append)
        for stored in &committed {
            self.bus
                .publish(stored.to_envelope())
                .map_err(|e| DispatchError::Publish(format!("{e:?}")))?;
        }

        Ok(committed)
    }

    /// Rehydrate the current aggregate state without dispatching anything.
    ///
    /// Reads the stream directly, so the result is strongly consistent with
    /// the write path (unlike the projection, which catches up via the bus).
    pub fn load<A>(
        &self,
        sku: &Sku,
        make_aggregate: impl FnOnce(Sku) -> A,
    ) -> Result<A, DispatchError>
    where
        A: Aggregate<Error = DomainError>,
        A::Event: commandcenter_events::Event + Serialize + DeserializeOwned,
    {
        let history = self.store.load_stream(sku)?;
        validate_loaded_stream(sku, &history)?;

        let mut aggregate = make_aggregate(sku.clone());
        apply_history::<A>(&mut aggregate, &history)?;
        Ok(aggregate)
    }

    /// The raw stream for one SKU (movement history, audits).
    pub fn history(&self, sku: &Sku) -> Result<Vec<StoredEvent>, DispatchError> {
        let history = self.store.load_stream(sku)?;
        validate_loaded_stream(sku, &history)?;
        Ok(history)
    }
}

fn stream_version(stream: &[StoredEvent]) -> u64 {
    stream.last().map(|e| e.sequence_number).unwrap_or(0)
}

fn validate_loaded_stream(sku: &Sku, stream: &[StoredEvent]) -> Result<(), DispatchError> {
    // Defense in depth: even a buggy backend must not hand us another SKU's
    // events or a broken sequence.
    let mut last = 0u64;
    for (idx, e) in stream.iter().enumerate() {
        if &e.sku != sku {
            return Err(DispatchError::StreamMismatch(format!(
                "loaded stream contains wrong sku at index {idx}"
            )));
        }
        if e.sequence_number == 0 {
            return Err(DispatchError::Store(EventStoreError::InvalidAppend(
                "stored event has sequence_number=0".to_string(),
            )));
        }
        if e.sequence_number <= last {
            return Err(DispatchError::Store(EventStoreError::InvalidAppend(format!(
                "non-monotonic sequence_number in loaded stream (last={last}, found={})",
                e.sequence_number
            ))));
        }
        last = e.sequence_number;
    }
    Ok(())
}

fn apply_history<A>(aggregate: &mut A, history: &[StoredEvent]) -> Result<(), DispatchError>
where
    A: Aggregate,
    A::Event: DeserializeOwned,
{
    // Ensure deterministic ordering.
    let mut sorted = history.to_vec();
    sorted.sort_by_key(|e| e.sequence_number);

    for stored in sorted {
        let ev: A::Event = serde_json::from_value(stored.payload)
            .map_err(|e| DispatchError::Deserialize(e.to_string()))?;
        aggregate.apply(&ev);
    }

    Ok(())
}
