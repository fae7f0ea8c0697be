//! Inventory ledger domain module (event-sourced).
//!
//! This crate contains the business rules for the stock ledger, implemented
//! purely as deterministic domain logic (no IO, no HTTP, no storage):
//!
//! - the `LedgerItem` aggregate: commands decide events, events evolve state,
//!   and every stock mutation goes through an audited movement
//! - the derived stock status rule (one pure function, used everywhere)
//! - movement audit records and the chronological series fed to forecasting
//! - catalog-level report functions (low-stock/reorder, duplicate candidates,
//!   data quality, summary)

pub mod item;
pub mod movement;
pub mod record;
pub mod reports;
pub mod status;

pub use item::{
    CreateItem, DeleteItem, DetailsUpdated, InventoryCommand, InventoryEvent, ItemCreated,
    ItemDeleted, ItemPatch, LedgerItem, RecordMovement, StockMoved, UpdateDetails,
};
pub use movement::{MovementKind, MovementRecord, SeriesPoint, movement_series};
pub use record::{ItemFilter, ItemRecord};
pub use reports::{
    CatalogSummary, DuplicateCandidate, DuplicateGroup, ReorderPolicy, ReorderPriority,
    ReorderSuggestion, catalog_summary, categories, data_quality_score, find_duplicates,
    low_stock_report,
};
pub use status::StockStatus;
