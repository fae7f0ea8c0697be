//! Read-model projections fed by published event envelopes.

pub mod catalog;

pub use catalog::{CatalogProjection, CatalogProjectionError};
