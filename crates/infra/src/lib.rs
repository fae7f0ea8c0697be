//! Infrastructure layer: event storage, command dispatch, read models,
//! projections, bulk import.

pub mod command_dispatcher;
pub mod event_store;
pub mod import;
pub mod projections;
pub mod read_model;
