//! Catalog-level reports: reorder suggestions, duplicate candidates, data
//! quality, summary.
//!
//! All functions here are pure snapshots over the catalog read model; they
//! hold no state and carry no consistency guarantee across repeated calls.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use commandcenter_core::Sku;

use crate::record::ItemRecord;
use crate::status::StockStatus;

/// Replenishment policy. The multiplier is configuration, not a discovered
/// business rule; the default targets one reorder cycle of headroom.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ReorderPolicy {
    pub multiplier: i64,
}

impl Default for ReorderPolicy {
    fn default() -> Self {
        Self { multiplier: 2 }
    }
}

impl ReorderPolicy {
    /// `max(minimum_stock * multiplier - current_stock, 0)`
    pub fn suggested_quantity(&self, current_stock: i64, minimum_stock: i64) -> i64 {
        (minimum_stock * self.multiplier - current_stock).max(0)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReorderPriority {
    High,
    Medium,
}

/// One line of the low-stock report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReorderSuggestion {
    pub sku: Sku,
    pub name: String,
    pub status: StockStatus,
    pub current_stock: i64,
    pub minimum_stock: i64,
    pub suggested_quantity: i64,
    pub estimated_cost_cents: i64,
    pub priority: ReorderPriority,
    pub supplier_id: Option<String>,
}

/// Items at or below their reorder threshold, each with a suggested
/// replenishment quantity. Out-of-stock items come first, then ascending
/// stock level.
pub fn low_stock_report(items: &[ItemRecord], policy: &ReorderPolicy) -> Vec<ReorderSuggestion> {
    let mut suggestions: Vec<ReorderSuggestion> = items
        .iter()
        .filter(|r| r.status() != StockStatus::InStock)
        .map(|r| {
            let suggested_quantity = policy.suggested_quantity(r.current_stock, r.minimum_stock);
            ReorderSuggestion {
                sku: r.sku.clone(),
                name: r.name.clone(),
                status: r.status(),
                current_stock: r.current_stock,
                minimum_stock: r.minimum_stock,
                suggested_quantity,
                estimated_cost_cents: suggested_quantity * r.cost_price_cents,
                priority: if r.status() == StockStatus::OutOfStock {
                    ReorderPriority::High
                } else {
                    ReorderPriority::Medium
                },
                supplier_id: r.supplier_id.clone(),
            }
        })
        .collect();

    suggestions.sort_by(|a, b| {
        a.priority
            .cmp(&b.priority)
            .then(a.current_stock.cmp(&b.current_stock))
            .then(a.sku.cmp(&b.sku))
    });
    suggestions
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateCandidate {
    pub sku: Sku,
    pub name: String,
}

/// A set of catalog entries that look like the same real-world item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    pub normalized_name: String,
    pub category: Option<String>,
    pub items: Vec<DuplicateCandidate>,
}

/// Group items whose normalized name and category match. Detection only —
/// merging is a manual decision, so candidates are returned for review.
pub fn find_duplicates(items: &[ItemRecord]) -> Vec<DuplicateGroup> {
    let mut groups: BTreeMap<(String, Option<String>), Vec<DuplicateCandidate>> = BTreeMap::new();

    for r in items {
        groups
            .entry((r.normalized_name(), r.category.clone()))
            .or_default()
            .push(DuplicateCandidate {
                sku: r.sku.clone(),
                name: r.name.clone(),
            });
    }

    groups
        .into_iter()
        .filter(|(_, members)| members.len() > 1)
        .map(|((normalized_name, category), items)| DuplicateGroup {
            normalized_name,
            category,
            items,
        })
        .collect()
}

/// `100 * (1 - items missing description or category / total)`, clamped to
/// [0, 100]. An empty catalog is vacuously clean (100).
pub fn data_quality_score(items: &[ItemRecord]) -> f64 {
    if items.is_empty() {
        return 100.0;
    }

    let missing = items.iter().filter(|r| r.missing_details()).count();
    let score = 100.0 * (1.0 - missing as f64 / items.len() as f64);
    score.clamp(0.0, 100.0)
}

/// Catalog analytics snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogSummary {
    pub total_items: usize,
    pub total_stock_value_cents: i64,
    pub total_selling_value_cents: i64,
    pub low_stock_items: usize,
    pub out_of_stock_items: usize,
    pub total_categories: usize,
}

pub fn catalog_summary(items: &[ItemRecord]) -> CatalogSummary {
    let categories: BTreeSet<&str> = items
        .iter()
        .filter_map(|r| r.category.as_deref())
        .filter(|c| !c.trim().is_empty())
        .collect();

    CatalogSummary {
        total_items: items.len(),
        total_stock_value_cents: items.iter().map(|r| r.current_stock * r.cost_price_cents).sum(),
        total_selling_value_cents: items
            .iter()
            .map(|r| r.current_stock * r.selling_price_cents)
            .sum(),
        low_stock_items: items.iter().filter(|r| r.status() == StockStatus::LowStock).count(),
        out_of_stock_items: items
            .iter()
            .filter(|r| r.status() == StockStatus::OutOfStock)
            .count(),
        total_categories: categories.len(),
    }
}

/// Sorted distinct category names.
pub fn categories(items: &[ItemRecord]) -> Vec<String> {
    let set: BTreeSet<String> = items
        .iter()
        .filter_map(|r| r.category.clone())
        .filter(|c| !c.trim().is_empty())
        .collect();
    set.into_iter().collect()
}
