//! Queryable catalog view of an item and the list filter applied to it.

use chrono::{DateTime, Utc};

use commandcenter_core::Sku;

use crate::status::StockStatus;

/// Catalog record: the read-model view of one active item.
///
/// `status` is intentionally not a field; call [`ItemRecord::status`] so the
/// derivation rule cannot drift between consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRecord {
    pub sku: Sku,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub current_stock: i64,
    pub minimum_stock: i64,
    pub cost_price_cents: i64,
    pub selling_price_cents: i64,
    pub warehouse_id: Option<String>,
    pub supplier_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ItemRecord {
    pub fn status(&self) -> StockStatus {
        StockStatus::of(self.current_stock, self.minimum_stock)
    }

    /// Lowercased, whitespace-collapsed name used for duplicate grouping.
    pub fn normalized_name(&self) -> String {
        self.name
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// True when the record lacks a description or a category (counts
    /// against the data-quality score).
    pub fn missing_details(&self) -> bool {
        let blank = |s: &Option<String>| s.as_deref().is_none_or(|v| v.trim().is_empty());
        blank(&self.description) || blank(&self.category)
    }
}

/// Catalog list filter. Every combination is valid; an empty result is not
/// an error. Filtering preserves the catalog's stable insertion order.
#[derive(Debug, Clone, Default)]
pub struct ItemFilter {
    pub category: Option<String>,
    pub status: Option<StockStatus>,
    /// Case-insensitive substring over SKU, name and description.
    pub search: Option<String>,
    pub warehouse_id: Option<String>,
    pub supplier_id: Option<String>,
    pub low_stock_only: bool,
    pub skip: usize,
    pub limit: Option<usize>,
}

impl ItemFilter {
    pub fn matches(&self, record: &ItemRecord) -> bool {
        if let Some(category) = &self.category
            && record.category.as_deref() != Some(category.as_str())
        {
            return false;
        }
        if let Some(status) = self.status
            && record.status() != status
        {
            return false;
        }
        if self.low_stock_only && record.status() == StockStatus::InStock {
            return false;
        }
        if let Some(warehouse_id) = &self.warehouse_id
            && record.warehouse_id.as_deref() != Some(warehouse_id.as_str())
        {
            return false;
        }
        if let Some(supplier_id) = &self.supplier_id
            && record.supplier_id.as_deref() != Some(supplier_id.as_str())
        {
            return false;
        }
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            let hit = record.sku.as_str().to_lowercase().contains(&needle)
                || record.name.to_lowercase().contains(&needle)
                || record
                    .description
                    .as_deref()
                    .is_some_and(|d| d.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }
        true
    }

    /// Filter + paginate, preserving the incoming order.
    pub fn apply(&self, records: Vec<ItemRecord>) -> Vec<ItemRecord> {
        let filtered = records.into_iter().filter(|r| self.matches(r));
        match self.limit {
            Some(limit) => filtered.skip(self.skip).take(limit).collect(),
            None => filtered.skip(self.skip).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(raw_sku: &str, name: &str, category: Option<&str>, stock: i64, minimum: i64) -> ItemRecord {
        ItemRecord {
            sku: Sku::new(raw_sku).unwrap(),
            name: name.to_string(),
            description: Some("desc".to_string()),
            category: category.map(str::to_string),
            current_stock: stock,
            minimum_stock: minimum,
            cost_price_cents: 100,
            selling_price_cents: 200,
            warehouse_id: Some("WH-1".to_string()),
            supplier_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn category_filter_is_exact() {
        let f = ItemFilter {
            category: Some("peripherals".to_string()),
            ..ItemFilter::default()
        };
        assert!(f.matches(&record("A", "Mouse", Some("peripherals"), 5, 1)));
        assert!(!f.matches(&record("B", "Mouse", Some("Peripherals"), 5, 1)));
        assert!(!f.matches(&record("C", "Mouse", None, 5, 1)));
    }

    #[test]
    fn search_is_case_insensitive_over_sku_name_description() {
        let f = ItemFilter {
            search: Some("mOuSe".to_string()),
            ..ItemFilter::default()
        };
        assert!(f.matches(&record("A-1", "Wireless Mouse", None, 5, 1)));

        let f = ItemFilter {
            search: Some("a-1".to_string()),
            ..ItemFilter::default()
        };
        assert!(f.matches(&record("A-1", "Keyboard", None, 5, 1)));

        let f = ItemFilter {
            search: Some("nope".to_string()),
            ..ItemFilter::default()
        };
        assert!(!f.matches(&record("A-1", "Keyboard", None, 5, 1)));
    }

    #[test]
    fn status_filter_uses_the_derived_rule() {
        let f = ItemFilter {
            status: Some(StockStatus::LowStock),
            ..ItemFilter::default()
        };
        assert!(f.matches(&record("A", "Mouse", None, 10, 10)));
        assert!(!f.matches(&record("B", "Mouse", None, 11, 10)));
    }

    #[test]
    fn apply_preserves_order_and_paginates() {
        let records = vec![
            record("A", "x", None, 5, 1),
            record("B", "x", None, 5, 1),
            record("C", "x", None, 5, 1),
            record("D", "x", None, 5, 1),
        ];
        let f = ItemFilter {
            skip: 1,
            limit: Some(2),
            ..ItemFilter::default()
        };
        let page = f.apply(records);
        let skus: Vec<_> = page.iter().map(|r| r.sku.as_str().to_string()).collect();
        assert_eq!(skus, vec!["B", "C"]);
    }

    #[test]
    fn missing_details_counts_blank_description_or_category() {
        let mut r = record("A", "x", Some("cat"), 5, 1);
        assert!(!r.missing_details());

        r.description = None;
        assert!(r.missing_details());

        r.description = Some("d".to_string());
        r.category = Some("  ".to_string());
        assert!(r.missing_details());
    }
}
