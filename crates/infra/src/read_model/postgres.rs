//! Postgres-backed catalog store.
//!
//! Persistent read model for the catalog. Expected schema:
//!
//! ```sql
//! CREATE TABLE inventory_catalog (
//!     sku                 TEXT PRIMARY KEY,
//!     name                TEXT NOT NULL,
//!     description         TEXT,
//!     category            TEXT,
//!     current_stock       BIGINT NOT NULL,
//!     minimum_stock       BIGINT NOT NULL,
//!     cost_price_cents    BIGINT NOT NULL,
//!     selling_price_cents BIGINT NOT NULL,
//!     warehouse_id        TEXT,
//!     supplier_id         TEXT,
//!     created_at          TIMESTAMPTZ NOT NULL,
//!     updated_at          TIMESTAMPTZ NOT NULL,
//!     ordinal             BIGSERIAL
//! );
//! ```
//!
//! `ordinal` keeps the stable insertion order the listing contract promises.
//! The read model is disposable; `clear()` supports deterministic rebuilds
//! from the event stream.

use std::sync::Arc;

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use commandcenter_core::Sku;
use commandcenter_inventory::ItemRecord;

use super::store::CatalogStore;

pub struct PostgresCatalogStore {
    pool: Arc<PgPool>,
}

impl PostgresCatalogStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

fn row_to_record(row: &PgRow) -> Option<ItemRecord> {
    let sku: String = row.try_get("sku").ok()?;
    Some(ItemRecord {
        sku: Sku::new(&sku).ok()?,
        name: row.try_get("name").ok()?,
        description: row.try_get("description").ok()?,
        category: row.try_get("category").ok()?,
        current_stock: row.try_get("current_stock").ok()?,
        minimum_stock: row.try_get("minimum_stock").ok()?,
        cost_price_cents: row.try_get("cost_price_cents").ok()?,
        selling_price_cents: row.try_get("selling_price_cents").ok()?,
        warehouse_id: row.try_get("warehouse_id").ok()?,
        supplier_id: row.try_get("supplier_id").ok()?,
        created_at: row.try_get("created_at").ok()?,
        updated_at: row.try_get("updated_at").ok()?,
    })
}

impl CatalogStore for PostgresCatalogStore {
    fn get(&self, sku: &Sku) -> Option<ItemRecord> {
        let handle = tokio::runtime::Handle::try_current().ok()?;
        let pool = self.pool.clone();
        let sku = sku.as_str().to_string();

        handle.block_on(async move {
            match sqlx::query(
                r#"
                SELECT sku, name, description, category, current_stock,
                       minimum_stock, cost_price_cents, selling_price_cents,
                       warehouse_id, supplier_id, created_at, updated_at
                FROM inventory_catalog
                WHERE sku = $1
                "#,
            )
            .bind(&sku)
            .fetch_optional(&*pool)
            .await
            {
                Ok(Some(row)) => row_to_record(&row),
                _ => None,
            }
        })
    }

    fn upsert(&self, record: ItemRecord) {
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(h) => h,
            Err(_) => return,
        };
        let pool = self.pool.clone();

        let _ = handle.block_on(async move {
            sqlx::query(
                r#"
                INSERT INTO inventory_catalog (
                    sku, name, description, category, current_stock,
                    minimum_stock, cost_price_cents, selling_price_cents,
                    warehouse_id, supplier_id, created_at, updated_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                ON CONFLICT (sku)
                DO UPDATE SET
                    name = EXCLUDED.name,
                    description = EXCLUDED.description,
                    category = EXCLUDED.category,
                    current_stock = EXCLUDED.current_stock,
                    minimum_stock = EXCLUDED.minimum_stock,
                    cost_price_cents = EXCLUDED.cost_price_cents,
                    selling_price_cents = EXCLUDED.selling_price_cents,
                    warehouse_id = EXCLUDED.warehouse_id,
                    supplier_id = EXCLUDED.supplier_id,
                    created_at = EXCLUDED.created_at,
                    updated_at = EXCLUDED.updated_at
                "#,
            )
            .bind(record.sku.as_str())
            .bind(&record.name)
            .bind(&record.description)
            .bind(&record.category)
            .bind(record.current_stock)
            .bind(record.minimum_stock)
            .bind(record.cost_price_cents)
            .bind(record.selling_price_cents)
            .bind(&record.warehouse_id)
            .bind(&record.supplier_id)
            .bind(record.created_at)
            .bind(record.updated_at)
            .execute(&*pool)
            .await
        });
    }

    fn remove(&self, sku: &Sku) -> Option<ItemRecord> {
        let handle = tokio::runtime::Handle::try_current().ok()?;
        let pool = self.pool.clone();
        let sku = sku.as_str().to_string();

        handle.block_on(async move {
            match sqlx::query(
                r#"
                DELETE FROM inventory_catalog
                WHERE sku = $1
                RETURNING sku, name, description, category, current_stock,
                          minimum_stock, cost_price_cents, selling_price_cents,
                          warehouse_id, supplier_id, created_at, updated_at
                "#,
            )
            .bind(&sku)
            .fetch_optional(&*pool)
            .await
            {
                Ok(Some(row)) => row_to_record(&row),
                _ => None,
            }
        })
    }

    fn list(&self) -> Vec<ItemRecord> {
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(h) => h,
            Err(_) => return vec![],
        };
        let pool = self.pool.clone();

        handle.block_on(async move {
            match sqlx::query(
                r#"
                SELECT sku, name, description, category, current_stock,
                       minimum_stock, cost_price_cents, selling_price_cents,
                       warehouse_id, supplier_id, created_at, updated_at
                FROM inventory_catalog
                ORDER BY ordinal ASC
                "#,
            )
            .fetch_all(&*pool)
            .await
            {
                Ok(rows) => rows.iter().filter_map(row_to_record).collect(),
                Err(_) => vec![],
            }
        })
    }

    fn clear(&self) {
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(h) => h,
            Err(_) => return,
        };
        let pool = self.pool.clone();

        let _ = handle.block_on(async move {
            sqlx::query("TRUNCATE inventory_catalog").execute(&*pool).await
        });
    }
}
