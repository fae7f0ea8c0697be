//! `commandcenter-events` — event mechanics for the ledger write model.
//!
//! Defines the event contract, the envelope persisted/published per stream,
//! and a lightweight pub/sub abstraction used to feed projections.

pub mod bus;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
