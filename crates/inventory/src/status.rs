//! Derived stock status.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use commandcenter_core::DomainError;

/// Stock status derived from `(current_stock, minimum_stock)`.
///
/// Never stored; recomputed on read so single-item reads, list filters and
/// reports all apply the identical rule.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StockStatus {
    InStock,
    LowStock,
    OutOfStock,
}

impl StockStatus {
    /// The status rule. Boundary inclusive: stock equal to the minimum is
    /// low-stock.
    pub fn of(current_stock: i64, minimum_stock: i64) -> Self {
        if current_stock == 0 {
            StockStatus::OutOfStock
        } else if current_stock <= minimum_stock {
            StockStatus::LowStock
        } else {
            StockStatus::InStock
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StockStatus::InStock => "in-stock",
            StockStatus::LowStock => "low-stock",
            StockStatus::OutOfStock => "out-of-stock",
        }
    }
}

impl FromStr for StockStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in-stock" => Ok(StockStatus::InStock),
            "low-stock" => Ok(StockStatus::LowStock),
            "out-of-stock" => Ok(StockStatus::OutOfStock),
            other => Err(DomainError::validation(
                "status",
                format!("unknown status '{other}' (expected in-stock, low-stock or out-of-stock)"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_stock_is_out_of_stock() {
        assert_eq!(StockStatus::of(0, 10), StockStatus::OutOfStock);
        assert_eq!(StockStatus::of(0, 0), StockStatus::OutOfStock);
    }

    #[test]
    fn boundary_is_inclusive() {
        // minimum_stock=10, current_stock=10 -> low-stock
        assert_eq!(StockStatus::of(10, 10), StockStatus::LowStock);
        assert_eq!(StockStatus::of(11, 10), StockStatus::InStock);
        assert_eq!(StockStatus::of(1, 10), StockStatus::LowStock);
    }

    #[test]
    fn positive_stock_above_minimum_is_in_stock() {
        assert_eq!(StockStatus::of(25, 10), StockStatus::InStock);
        assert_eq!(StockStatus::of(1, 0), StockStatus::InStock);
    }

    #[test]
    fn parses_kebab_case_names() {
        assert_eq!("low-stock".parse::<StockStatus>().unwrap(), StockStatus::LowStock);
        assert!("LOW_STOCK".parse::<StockStatus>().is_err());
    }
}
