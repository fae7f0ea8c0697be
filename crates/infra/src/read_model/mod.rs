//! Disposable catalog read model storage.

#[cfg(feature = "postgres")]
pub mod postgres;
pub mod store;

#[cfg(feature = "postgres")]
pub use postgres::PostgresCatalogStore;
pub use store::{CatalogStore, InMemoryCatalogStore};
