//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures. Every
/// variant carries enough context (SKU, field, values) for the caller to
/// correct the request and resubmit. Infrastructure concerns belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A field failed validation (e.g. negative stock, empty name).
    #[error("validation failed for {field}: {message}")]
    Validation { field: String, message: String },

    /// A SKU string could not be parsed (empty or whitespace-only).
    #[error("invalid sku: {0}")]
    InvalidSku(String),

    /// Create attempted against a SKU that already exists in the catalog.
    #[error("sku already exists: {0}")]
    DuplicateSku(String),

    /// The referenced SKU is not in the active catalog.
    #[error("sku not found: {0}")]
    NotFound(String),

    /// The movement would drive stock below zero.
    #[error("insufficient stock for {sku}: current {current}, delta {delta}")]
    InsufficientStock { sku: String, current: i64, delta: i64 },

    /// The operation is not allowed through this path (e.g. mutating stock
    /// outside a movement).
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
}

impl DomainError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn invalid_sku(msg: impl Into<String>) -> Self {
        Self::InvalidSku(msg.into())
    }

    pub fn duplicate_sku(sku: impl Into<String>) -> Self {
        Self::DuplicateSku(sku.into())
    }

    pub fn not_found(sku: impl Into<String>) -> Self {
        Self::NotFound(sku.into())
    }

    pub fn insufficient_stock(sku: impl Into<String>, current: i64, delta: i64) -> Self {
        Self::InsufficientStock {
            sku: sku.into(),
            current,
            delta,
        }
    }

    pub fn invalid_operation(msg: impl Into<String>) -> Self {
        Self::InvalidOperation(msg.into())
    }
}
