//! Movement audit records and the series fed to forecasting.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use commandcenter_core::Sku;

use crate::item::StockMoved;

/// Classification of a stock movement.
///
/// `Initial` is reserved for the implicit movement recorded when an item is
/// created; callers submit the other four.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MovementKind {
    Initial,
    Receipt,
    Shipment,
    Adjustment,
    Transfer,
}

impl MovementKind {
    /// Map a caller-supplied quantity to a signed delta.
    ///
    /// Receipts add stock, shipments and transfers remove it regardless of
    /// the sign the caller sent; adjustments apply the signed value as-is.
    pub fn signed_delta(self, quantity: i64) -> i64 {
        match self {
            MovementKind::Receipt => quantity.abs(),
            MovementKind::Shipment | MovementKind::Transfer => -quantity.abs(),
            MovementKind::Adjustment | MovementKind::Initial => quantity,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::Initial => "initial",
            MovementKind::Receipt => "receipt",
            MovementKind::Shipment => "shipment",
            MovementKind::Adjustment => "adjustment",
            MovementKind::Transfer => "transfer",
        }
    }
}

/// One ledger transaction, immutable once created.
///
/// `resulting_stock` is the post-apply snapshot, so the whole history of an
/// item can be audited without replaying arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovementRecord {
    pub sku: Sku,
    pub kind: MovementKind,
    pub delta: i64,
    pub resulting_stock: i64,
    pub reason: String,
    pub reference: Option<String>,
    pub actor: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl From<StockMoved> for MovementRecord {
    fn from(ev: StockMoved) -> Self {
        Self {
            sku: ev.sku,
            kind: ev.kind,
            delta: ev.delta,
            resulting_stock: ev.resulting_stock,
            reason: ev.reason,
            reference: ev.reference,
            actor: ev.actor,
            occurred_at: ev.occurred_at,
        }
    }
}

/// One point of the demand series: net quantity moved on a calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub net_quantity: i64,
}

/// Collapse a movement history into a chronological daily net-quantity
/// series. This is the ledger's only obligation towards the forecasting
/// collaborator; interpreting the series is the collaborator's business.
pub fn movement_series(movements: &[MovementRecord]) -> Vec<SeriesPoint> {
    let mut by_day: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    for m in movements {
        *by_day.entry(m.occurred_at.date_naive()).or_insert(0) += m.delta;
    }

    by_day
        .into_iter()
        .map(|(date, net_quantity)| SeriesPoint { date, net_quantity })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(day: u32, delta: i64) -> MovementRecord {
        MovementRecord {
            sku: Sku::new("M-001").unwrap(),
            kind: MovementKind::Adjustment,
            delta,
            resulting_stock: 0,
            reason: "test".to_string(),
            reference: None,
            actor: None,
            occurred_at: Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn receipts_add_and_shipments_remove() {
        assert_eq!(MovementKind::Receipt.signed_delta(-5), 5);
        assert_eq!(MovementKind::Shipment.signed_delta(5), -5);
        assert_eq!(MovementKind::Transfer.signed_delta(-5), -5);
        assert_eq!(MovementKind::Adjustment.signed_delta(-5), -5);
        assert_eq!(MovementKind::Adjustment.signed_delta(5), 5);
    }

    #[test]
    fn series_nets_per_day_in_chronological_order() {
        let movements = vec![record(3, -2), record(1, 10), record(3, 7), record(2, -1)];
        let series = movement_series(&movements);

        assert_eq!(series.len(), 3);
        assert_eq!(series[0].date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(series[0].net_quantity, 10);
        assert_eq!(series[1].net_quantity, -1);
        assert_eq!(series[2].net_quantity, 5);
    }

    #[test]
    fn series_of_empty_history_is_empty() {
        assert!(movement_series(&[]).is_empty());
    }
}
