use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use commandcenter_core::{Aggregate, AggregateRoot, DomainError, Sku};
use commandcenter_events::Event;

use crate::movement::MovementKind;
use crate::record::ItemRecord;
use crate::status::StockStatus;

/// Reason attached to the implicit movement recorded on item creation.
pub const INITIAL_STOCK_REASON: &str = "initial stock";

/// Aggregate root: one stock-keeping item and its ledger state.
///
/// The aggregate is rehydrated from its SKU-keyed event stream; `handle`
/// enforces every ledger invariant (stock never negative, stock mutation only
/// through movements, duplicate-create rejection) before any event is
/// emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerItem {
    sku: Sku,
    name: String,
    description: Option<String>,
    category: Option<String>,
    current_stock: i64,
    minimum_stock: i64,
    cost_price_cents: i64,
    selling_price_cents: i64,
    warehouse_id: Option<String>,
    supplier_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: u64,
    created: bool,
    deleted: bool,
}

impl LedgerItem {
    /// Stream type identifier used by the event store and projections.
    pub const AGGREGATE_TYPE: &'static str = "inventory.item";

    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(sku: Sku) -> Self {
        Self {
            sku,
            name: String::new(),
            description: None,
            category: None,
            current_stock: 0,
            minimum_stock: 0,
            cost_price_cents: 0,
            selling_price_cents: 0,
            warehouse_id: None,
            supplier_id: None,
            created_at: DateTime::<Utc>::MIN_UTC,
            updated_at: DateTime::<Utc>::MIN_UTC,
            version: 0,
            created: false,
            deleted: false,
        }
    }

    pub fn sku(&self) -> &Sku {
        &self.sku
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn current_stock(&self) -> i64 {
        self.current_stock
    }

    pub fn minimum_stock(&self) -> i64 {
        self.minimum_stock
    }

    /// Derived status; never stored.
    pub fn status(&self) -> StockStatus {
        StockStatus::of(self.current_stock, self.minimum_stock)
    }

    /// An item is active when it has been created and not deleted since.
    pub fn is_active(&self) -> bool {
        self.created && !self.deleted
    }

    /// Catalog view of the current state, or `None` for items that are not
    /// active (never created, or deleted).
    pub fn record(&self) -> Option<ItemRecord> {
        if !self.is_active() {
            return None;
        }
        Some(ItemRecord {
            sku: self.sku.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            category: self.category.clone(),
            current_stock: self.current_stock,
            minimum_stock: self.minimum_stock,
            cost_price_cents: self.cost_price_cents,
            selling_price_cents: self.selling_price_cents,
            warehouse_id: self.warehouse_id.clone(),
            supplier_id: self.supplier_id.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl AggregateRoot for LedgerItem {
    type Id = Sku;

    fn id(&self) -> &Self::Id {
        &self.sku
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Sparse patch of catalog details. Stock is deliberately absent: the only
/// legal stock mutation is a movement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub minimum_stock: Option<i64>,
    pub cost_price_cents: Option<i64>,
    pub selling_price_cents: Option<i64>,
    pub warehouse_id: Option<String>,
    pub supplier_id: Option<String>,
}

impl ItemPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.minimum_stock.is_none()
            && self.cost_price_cents.is_none()
            && self.selling_price_cents.is_none()
            && self.warehouse_id.is_none()
            && self.supplier_id.is_none()
    }
}

/// Command: CreateItem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateItem {
    pub sku: Sku,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub initial_stock: i64,
    pub minimum_stock: i64,
    pub cost_price_cents: i64,
    pub selling_price_cents: i64,
    pub warehouse_id: Option<String>,
    pub supplier_id: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RecordMovement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMovement {
    pub sku: Sku,
    pub kind: MovementKind,
    pub delta: i64,
    pub reason: String,
    pub reference: Option<String>,
    pub actor: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateDetails.
///
/// `current_stock` is representable so the forbidden attempt can be rejected
/// with a specific error instead of being silently dropped at the edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateDetails {
    pub sku: Sku,
    pub patch: ItemPatch,
    pub current_stock: Option<i64>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: DeleteItem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteItem {
    pub sku: Sku,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InventoryCommand {
    CreateItem(CreateItem),
    RecordMovement(RecordMovement),
    UpdateDetails(UpdateDetails),
    DeleteItem(DeleteItem),
}

/// Event: ItemCreated. Carries catalog fields only; the starting stock
/// arrives as the implicit initial movement that follows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemCreated {
    pub sku: Sku,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub minimum_stock: i64,
    pub cost_price_cents: i64,
    pub selling_price_cents: i64,
    pub warehouse_id: Option<String>,
    pub supplier_id: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StockMoved. One per accepted movement; immutable audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMoved {
    pub sku: Sku,
    pub kind: MovementKind,
    pub delta: i64,
    pub resulting_stock: i64,
    pub reason: String,
    pub reference: Option<String>,
    pub actor: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: DetailsUpdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailsUpdated {
    pub sku: Sku,
    pub patch: ItemPatch,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ItemDeleted. Removes the item from the active catalog; the stream
/// (and with it the movement history) is retained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDeleted {
    pub sku: Sku,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InventoryEvent {
    ItemCreated(ItemCreated),
    StockMoved(StockMoved),
    DetailsUpdated(DetailsUpdated),
    ItemDeleted(ItemDeleted),
}

impl Event for InventoryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            InventoryEvent::ItemCreated(_) => "inventory.item.created",
            InventoryEvent::StockMoved(_) => "inventory.item.stock_moved",
            InventoryEvent::DetailsUpdated(_) => "inventory.item.details_updated",
            InventoryEvent::ItemDeleted(_) => "inventory.item.deleted",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            InventoryEvent::ItemCreated(e) => e.occurred_at,
            InventoryEvent::StockMoved(e) => e.occurred_at,
            InventoryEvent::DetailsUpdated(e) => e.occurred_at,
            InventoryEvent::ItemDeleted(e) => e.occurred_at,
        }
    }
}

impl Aggregate for LedgerItem {
    type Command = InventoryCommand;
    type Event = InventoryEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            InventoryEvent::ItemCreated(e) => {
                // A fresh lifecycle: also reached when a deleted SKU is
                // re-created on its retained stream.
                self.sku = e.sku.clone();
                self.name = e.name.clone();
                self.description = e.description.clone();
                self.category = e.category.clone();
                self.current_stock = 0;
                self.minimum_stock = e.minimum_stock;
                self.cost_price_cents = e.cost_price_cents;
                self.selling_price_cents = e.selling_price_cents;
                self.warehouse_id = e.warehouse_id.clone();
                self.supplier_id = e.supplier_id.clone();
                self.created_at = e.occurred_at;
                self.updated_at = e.occurred_at;
                self.created = true;
                self.deleted = false;
            }
            InventoryEvent::StockMoved(e) => {
                self.current_stock = e.resulting_stock;
                self.updated_at = e.occurred_at;
            }
            InventoryEvent::DetailsUpdated(e) => {
                let p = &e.patch;
                if let Some(name) = &p.name {
                    self.name = name.clone();
                }
                if let Some(description) = &p.description {
                    self.description = Some(description.clone());
                }
                if let Some(category) = &p.category {
                    self.category = Some(category.clone());
                }
                if let Some(minimum_stock) = p.minimum_stock {
                    self.minimum_stock = minimum_stock;
                }
                if let Some(cost) = p.cost_price_cents {
                    self.cost_price_cents = cost;
                }
                if let Some(selling) = p.selling_price_cents {
                    self.selling_price_cents = selling;
                }
                if let Some(warehouse_id) = &p.warehouse_id {
                    self.warehouse_id = Some(warehouse_id.clone());
                }
                if let Some(supplier_id) = &p.supplier_id {
                    self.supplier_id = Some(supplier_id.clone());
                }
                self.updated_at = e.occurred_at;
            }
            InventoryEvent::ItemDeleted(e) => {
                self.deleted = true;
                self.updated_at = e.occurred_at;
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            InventoryCommand::CreateItem(cmd) => self.handle_create(cmd),
            InventoryCommand::RecordMovement(cmd) => self.handle_movement(cmd),
            InventoryCommand::UpdateDetails(cmd) => self.handle_update(cmd),
            InventoryCommand::DeleteItem(cmd) => self.handle_delete(cmd),
        }
    }
}

impl LedgerItem {
    fn ensure_sku(&self, sku: &Sku) -> Result<(), DomainError> {
        if &self.sku != sku {
            return Err(DomainError::invalid_operation(format!(
                "command sku '{sku}' does not match stream sku '{}'",
                self.sku
            )));
        }
        Ok(())
    }

    fn handle_create(&self, cmd: &CreateItem) -> Result<Vec<InventoryEvent>, DomainError> {
        self.ensure_sku(&cmd.sku)?;

        if self.is_active() {
            return Err(DomainError::duplicate_sku(cmd.sku.as_str()));
        }
        if cmd.name.trim().is_empty() {
            return Err(DomainError::validation("name", "name cannot be empty"));
        }
        if cmd.initial_stock < 0 {
            return Err(DomainError::validation(
                "current_stock",
                format!("stock cannot be negative (got {})", cmd.initial_stock),
            ));
        }
        if cmd.minimum_stock < 0 {
            return Err(DomainError::validation(
                "minimum_stock",
                format!("minimum stock cannot be negative (got {})", cmd.minimum_stock),
            ));
        }
        if cmd.cost_price_cents < 0 {
            return Err(DomainError::validation(
                "cost_price_cents",
                format!("price cannot be negative (got {})", cmd.cost_price_cents),
            ));
        }
        if cmd.selling_price_cents < 0 {
            return Err(DomainError::validation(
                "selling_price_cents",
                format!("price cannot be negative (got {})", cmd.selling_price_cents),
            ));
        }

        // Creation always records the starting stock as the first movement,
        // so the sum of all movement deltas equals current stock from the
        // very first event.
        Ok(vec![
            InventoryEvent::ItemCreated(ItemCreated {
                sku: cmd.sku.clone(),
                name: cmd.name.clone(),
                description: cmd.description.clone(),
                category: cmd.category.clone(),
                minimum_stock: cmd.minimum_stock,
                cost_price_cents: cmd.cost_price_cents,
                selling_price_cents: cmd.selling_price_cents,
                warehouse_id: cmd.warehouse_id.clone(),
                supplier_id: cmd.supplier_id.clone(),
                occurred_at: cmd.occurred_at,
            }),
            InventoryEvent::StockMoved(StockMoved {
                sku: cmd.sku.clone(),
                kind: MovementKind::Initial,
                delta: cmd.initial_stock,
                resulting_stock: cmd.initial_stock,
                reason: INITIAL_STOCK_REASON.to_string(),
                reference: None,
                actor: None,
                occurred_at: cmd.occurred_at,
            }),
        ])
    }

    fn handle_movement(&self, cmd: &RecordMovement) -> Result<Vec<InventoryEvent>, DomainError> {
        self.ensure_sku(&cmd.sku)?;

        if !self.is_active() {
            return Err(DomainError::not_found(cmd.sku.as_str()));
        }
        if cmd.kind == MovementKind::Initial {
            return Err(DomainError::invalid_operation(
                "initial movements are recorded implicitly on create",
            ));
        }
        if cmd.reason.trim().is_empty() {
            return Err(DomainError::validation("reason", "reason cannot be empty"));
        }
        if cmd.delta == 0 {
            return Err(DomainError::validation("delta", "delta cannot be zero"));
        }

        let resulting_stock = self.current_stock + cmd.delta;
        if resulting_stock < 0 {
            return Err(DomainError::insufficient_stock(
                cmd.sku.as_str(),
                self.current_stock,
                cmd.delta,
            ));
        }

        Ok(vec![InventoryEvent::StockMoved(StockMoved {
            sku: cmd.sku.clone(),
            kind: cmd.kind,
            delta: cmd.delta,
            resulting_stock,
            reason: cmd.reason.clone(),
            reference: cmd.reference.clone(),
            actor: cmd.actor.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_update(&self, cmd: &UpdateDetails) -> Result<Vec<InventoryEvent>, DomainError> {
        self.ensure_sku(&cmd.sku)?;

        if !self.is_active() {
            return Err(DomainError::not_found(cmd.sku.as_str()));
        }
        if cmd.current_stock.is_some() {
            return Err(DomainError::invalid_operation(
                "current_stock can only be changed through stock movements",
            ));
        }

        let p = &cmd.patch;
        if let Some(name) = &p.name
            && name.trim().is_empty()
        {
            return Err(DomainError::validation("name", "name cannot be empty"));
        }
        if let Some(minimum_stock) = p.minimum_stock
            && minimum_stock < 0
        {
            return Err(DomainError::validation(
                "minimum_stock",
                format!("minimum stock cannot be negative (got {minimum_stock})"),
            ));
        }
        if let Some(cost) = p.cost_price_cents
            && cost < 0
        {
            return Err(DomainError::validation(
                "cost_price_cents",
                format!("price cannot be negative (got {cost})"),
            ));
        }
        if let Some(selling) = p.selling_price_cents
            && selling < 0
        {
            return Err(DomainError::validation(
                "selling_price_cents",
                format!("price cannot be negative (got {selling})"),
            ));
        }

        if p.is_empty() {
            // Nothing to change; not an error.
            return Ok(vec![]);
        }

        Ok(vec![InventoryEvent::DetailsUpdated(DetailsUpdated {
            sku: cmd.sku.clone(),
            patch: p.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_delete(&self, cmd: &DeleteItem) -> Result<Vec<InventoryEvent>, DomainError> {
        self.ensure_sku(&cmd.sku)?;

        if !self.is_active() {
            return Err(DomainError::not_found(cmd.sku.as_str()));
        }

        Ok(vec![InventoryEvent::ItemDeleted(ItemDeleted {
            sku: cmd.sku.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::StockStatus;

    fn sku(raw: &str) -> Sku {
        Sku::new(raw).unwrap()
    }

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn create_cmd(raw_sku: &str, initial_stock: i64, minimum_stock: i64) -> CreateItem {
        CreateItem {
            sku: sku(raw_sku),
            name: "Wireless Mouse".to_string(),
            description: Some("2.4GHz wireless mouse".to_string()),
            category: Some("peripherals".to_string()),
            initial_stock,
            minimum_stock,
            cost_price_cents: 1250,
            selling_price_cents: 2999,
            warehouse_id: Some("WH-1".to_string()),
            supplier_id: None,
            occurred_at: test_time(),
        }
    }

    fn created_item(raw_sku: &str, initial_stock: i64, minimum_stock: i64) -> LedgerItem {
        let mut item = LedgerItem::empty(sku(raw_sku));
        let events = item
            .handle(&InventoryCommand::CreateItem(create_cmd(raw_sku, initial_stock, minimum_stock)))
            .unwrap();
        for ev in &events {
            item.apply(ev);
        }
        item
    }

    fn movement_cmd(raw_sku: &str, delta: i64) -> RecordMovement {
        RecordMovement {
            sku: sku(raw_sku),
            kind: MovementKind::Adjustment,
            delta,
            reason: "cycle count".to_string(),
            reference: None,
            actor: None,
            occurred_at: test_time(),
        }
    }

    #[test]
    fn create_emits_item_created_and_initial_movement() {
        let item = LedgerItem::empty(sku("M-001"));
        let events = item
            .handle(&InventoryCommand::CreateItem(create_cmd("M-001", 5, 10)))
            .unwrap();

        assert_eq!(events.len(), 2);
        match &events[0] {
            InventoryEvent::ItemCreated(e) => {
                assert_eq!(e.sku.as_str(), "M-001");
                assert_eq!(e.name, "Wireless Mouse");
                assert_eq!(e.minimum_stock, 10);
            }
            other => panic!("expected ItemCreated, got {other:?}"),
        }
        match &events[1] {
            InventoryEvent::StockMoved(e) => {
                assert_eq!(e.kind, MovementKind::Initial);
                assert_eq!(e.delta, 5);
                assert_eq!(e.resulting_stock, 5);
                assert_eq!(e.reason, INITIAL_STOCK_REASON);
            }
            other => panic!("expected StockMoved, got {other:?}"),
        }
    }

    #[test]
    fn create_records_initial_movement_even_for_zero_stock() {
        let item = LedgerItem::empty(sku("M-001"));
        let events = item
            .handle(&InventoryCommand::CreateItem(create_cmd("M-001", 0, 10)))
            .unwrap();

        assert_eq!(events.len(), 2);
        match &events[1] {
            InventoryEvent::StockMoved(e) => {
                assert_eq!(e.delta, 0);
                assert_eq!(e.resulting_stock, 0);
            }
            other => panic!("expected StockMoved, got {other:?}"),
        }
    }

    #[test]
    fn create_rejects_duplicate_sku_without_state_change() {
        let item = created_item("M-001", 5, 10);
        let before = item.clone();

        let err = item
            .handle(&InventoryCommand::CreateItem(create_cmd("M-001", 99, 1)))
            .unwrap_err();

        assert_eq!(err, DomainError::duplicate_sku("M-001"));
        assert_eq!(item, before);
    }

    #[test]
    fn create_rejects_empty_name_and_negative_numbers() {
        let item = LedgerItem::empty(sku("M-001"));

        let mut cmd = create_cmd("M-001", 5, 10);
        cmd.name = "   ".to_string();
        let err = item.handle(&InventoryCommand::CreateItem(cmd)).unwrap_err();
        assert!(matches!(err, DomainError::Validation { ref field, .. } if field == "name"));

        let mut cmd = create_cmd("M-001", -1, 10);
        cmd.name = "Mouse".to_string();
        let err = item.handle(&InventoryCommand::CreateItem(cmd)).unwrap_err();
        assert!(matches!(err, DomainError::Validation { ref field, .. } if field == "current_stock"));

        let mut cmd = create_cmd("M-001", 5, -2);
        cmd.name = "Mouse".to_string();
        let err = item.handle(&InventoryCommand::CreateItem(cmd)).unwrap_err();
        assert!(matches!(err, DomainError::Validation { ref field, .. } if field == "minimum_stock"));

        let mut cmd = create_cmd("M-001", 5, 10);
        cmd.cost_price_cents = -1;
        let err = item.handle(&InventoryCommand::CreateItem(cmd)).unwrap_err();
        assert!(matches!(err, DomainError::Validation { ref field, .. } if field == "cost_price_cents"));
    }

    #[test]
    fn status_follows_the_boundary_inclusive_rule() {
        // minimum_stock=10, current_stock=5 -> low-stock
        let item = created_item("M-001", 5, 10);
        assert_eq!(item.status(), StockStatus::LowStock);

        // boundary: current == minimum is still low-stock
        let item = created_item("M-002", 10, 10);
        assert_eq!(item.status(), StockStatus::LowStock);

        let item = created_item("M-003", 0, 10);
        assert_eq!(item.status(), StockStatus::OutOfStock);

        let item = created_item("M-004", 25, 10);
        assert_eq!(item.status(), StockStatus::InStock);
    }

    #[test]
    fn movement_applies_delta_and_snapshots_resulting_stock() {
        let mut item = created_item("M-001", 5, 10);

        let events = item
            .handle(&InventoryCommand::RecordMovement(movement_cmd("M-001", 20)))
            .unwrap();
        assert_eq!(events.len(), 1);
        match &events[0] {
            InventoryEvent::StockMoved(e) => {
                assert_eq!(e.delta, 20);
                assert_eq!(e.resulting_stock, 25);
            }
            other => panic!("expected StockMoved, got {other:?}"),
        }

        item.apply(&events[0]);
        assert_eq!(item.current_stock(), 25);
        assert_eq!(item.status(), StockStatus::InStock);
    }

    #[test]
    fn movement_that_would_go_negative_is_rejected_without_state_change() {
        let mut item = created_item("M-001", 5, 10);
        let events = item
            .handle(&InventoryCommand::RecordMovement(movement_cmd("M-001", 20)))
            .unwrap();
        item.apply(&events[0]);
        let before = item.clone();

        let err = item
            .handle(&InventoryCommand::RecordMovement(movement_cmd("M-001", -30)))
            .unwrap_err();

        assert_eq!(
            err,
            DomainError::insufficient_stock("M-001", 25, -30)
        );
        assert_eq!(item, before);
        assert_eq!(item.current_stock(), 25);
    }

    #[test]
    fn movement_to_exactly_zero_is_allowed() {
        let mut item = created_item("M-001", 5, 10);
        let events = item
            .handle(&InventoryCommand::RecordMovement(movement_cmd("M-001", -5)))
            .unwrap();
        item.apply(&events[0]);

        assert_eq!(item.current_stock(), 0);
        assert_eq!(item.status(), StockStatus::OutOfStock);
    }

    #[test]
    fn movement_rejects_zero_delta_blank_reason_and_unknown_sku() {
        let item = created_item("M-001", 5, 10);

        let err = item
            .handle(&InventoryCommand::RecordMovement(movement_cmd("M-001", 0)))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation { ref field, .. } if field == "delta"));

        let mut cmd = movement_cmd("M-001", 3);
        cmd.reason = "  ".to_string();
        let err = item.handle(&InventoryCommand::RecordMovement(cmd)).unwrap_err();
        assert!(matches!(err, DomainError::Validation { ref field, .. } if field == "reason"));

        let missing = LedgerItem::empty(sku("M-404"));
        let err = missing
            .handle(&InventoryCommand::RecordMovement(movement_cmd("M-404", 3)))
            .unwrap_err();
        assert_eq!(err, DomainError::not_found("M-404"));
    }

    #[test]
    fn callers_cannot_record_initial_movements() {
        let item = created_item("M-001", 5, 10);
        let mut cmd = movement_cmd("M-001", 3);
        cmd.kind = MovementKind::Initial;

        let err = item.handle(&InventoryCommand::RecordMovement(cmd)).unwrap_err();
        assert!(matches!(err, DomainError::InvalidOperation(_)));
    }

    #[test]
    fn update_patches_details_but_never_stock() {
        let mut item = created_item("M-001", 5, 10);

        let cmd = UpdateDetails {
            sku: sku("M-001"),
            patch: ItemPatch {
                name: Some("Wireless Mouse v2".to_string()),
                minimum_stock: Some(3),
                ..ItemPatch::default()
            },
            current_stock: None,
            occurred_at: test_time(),
        };
        let events = item.handle(&InventoryCommand::UpdateDetails(cmd)).unwrap();
        assert_eq!(events.len(), 1);
        item.apply(&events[0]);

        assert_eq!(item.name(), "Wireless Mouse v2");
        assert_eq!(item.minimum_stock(), 3);
        assert_eq!(item.current_stock(), 5);
        assert_eq!(item.status(), StockStatus::InStock);
    }

    #[test]
    fn update_with_current_stock_fails_with_invalid_operation() {
        let item = created_item("M-001", 5, 10);
        let before = item.clone();

        let cmd = UpdateDetails {
            sku: sku("M-001"),
            patch: ItemPatch::default(),
            current_stock: Some(42),
            occurred_at: test_time(),
        };
        let err = item.handle(&InventoryCommand::UpdateDetails(cmd)).unwrap_err();

        assert!(matches!(err, DomainError::InvalidOperation(_)));
        assert_eq!(item, before);
    }

    #[test]
    fn empty_update_is_a_no_op() {
        let item = created_item("M-001", 5, 10);
        let cmd = UpdateDetails {
            sku: sku("M-001"),
            patch: ItemPatch::default(),
            current_stock: None,
            occurred_at: test_time(),
        };

        let events = item.handle(&InventoryCommand::UpdateDetails(cmd)).unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn delete_closes_the_active_lifecycle() {
        let mut item = created_item("M-001", 5, 10);

        let events = item
            .handle(&InventoryCommand::DeleteItem(DeleteItem {
                sku: sku("M-001"),
                occurred_at: test_time(),
            }))
            .unwrap();
        item.apply(&events[0]);

        assert!(!item.is_active());
        assert!(item.record().is_none());

        // Subsequent movements hit NotFound.
        let err = item
            .handle(&InventoryCommand::RecordMovement(movement_cmd("M-001", 1)))
            .unwrap_err();
        assert_eq!(err, DomainError::not_found("M-001"));
    }

    #[test]
    fn deleted_sku_can_start_a_fresh_lifecycle() {
        let mut item = created_item("M-001", 5, 10);
        let events = item
            .handle(&InventoryCommand::DeleteItem(DeleteItem {
                sku: sku("M-001"),
                occurred_at: test_time(),
            }))
            .unwrap();
        item.apply(&events[0]);

        let events = item
            .handle(&InventoryCommand::CreateItem(create_cmd("M-001", 7, 2)))
            .unwrap();
        for ev in &events {
            item.apply(ev);
        }

        assert!(item.is_active());
        assert_eq!(item.current_stock(), 7);
        assert_eq!(item.minimum_stock(), 2);
    }

    #[test]
    fn handle_does_not_mutate_state() {
        let item = created_item("M-001", 5, 10);
        let before = item.clone();

        let _ = item.handle(&InventoryCommand::RecordMovement(movement_cmd("M-001", 3)));
        let _ = item.handle(&InventoryCommand::RecordMovement(movement_cmd("M-001", -300)));

        assert_eq!(item, before);
    }

    #[test]
    fn version_increments_once_per_applied_event() {
        let mut item = LedgerItem::empty(sku("M-001"));
        assert_eq!(item.version(), 0);

        let events = item
            .handle(&InventoryCommand::CreateItem(create_cmd("M-001", 5, 10)))
            .unwrap();
        for ev in &events {
            item.apply(ev);
        }
        assert_eq!(item.version(), 2);

        let events = item
            .handle(&InventoryCommand::RecordMovement(movement_cmd("M-001", 1)))
            .unwrap();
        item.apply(&events[0]);
        assert_eq!(item.version(), 3);
    }

    #[cfg(test)]
    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 1000,
                ..ProptestConfig::default()
            })]

            /// Property: stock equals the initial stock plus the sum of all
            /// accepted deltas, and never goes negative.
            #[test]
            fn stock_equals_initial_plus_accepted_deltas(
                initial in 0i64..500,
                minimum in 0i64..50,
                deltas in proptest::collection::vec(-100i64..100, 0..40)
            ) {
                let mut item = created_item("P-100", initial, minimum);
                let mut accepted_sum = initial;

                for delta in deltas {
                    let cmd = InventoryCommand::RecordMovement(movement_cmd("P-100", delta));
                    match item.handle(&cmd) {
                        Ok(events) => {
                            for ev in &events {
                                item.apply(ev);
                            }
                            accepted_sum += delta;
                        }
                        Err(err) => {
                            // Only zero deltas and would-go-negative moves fail.
                            if delta == 0 {
                                let is_validation = matches!(err, DomainError::Validation { .. });
                                prop_assert!(is_validation);
                            } else {
                                let is_insufficient = matches!(err, DomainError::InsufficientStock { .. });
                                prop_assert!(is_insufficient);
                                prop_assert!(item.current_stock() + delta < 0);
                            }
                        }
                    }

                    prop_assert!(item.current_stock() >= 0);
                    prop_assert_eq!(item.current_stock(), accepted_sum);
                }
            }

            /// Property: the status rule is total and consistent with the
            /// aggregate's derived status.
            #[test]
            fn derived_status_matches_pure_rule(
                initial in 0i64..200,
                minimum in 0i64..200
            ) {
                let item = created_item("P-101", initial, minimum);
                prop_assert_eq!(item.status(), StockStatus::of(initial, minimum));
            }

            /// Property: handle never mutates state, even on rejection.
            #[test]
            fn handle_is_pure(
                initial in 0i64..100,
                delta in -200i64..200
            ) {
                let item = created_item("P-102", initial, 10);
                let before = item.clone();
                let _ = item.handle(&InventoryCommand::RecordMovement(movement_cmd("P-102", delta)));
                prop_assert_eq!(item, before);
            }

            /// Property: every accepted movement snapshots the stock level it
            /// produced.
            #[test]
            fn movement_snapshots_are_consistent(
                initial in 0i64..100,
                deltas in proptest::collection::vec(-50i64..50, 1..20)
            ) {
                let mut item = created_item("P-103", initial, 10);

                for delta in deltas {
                    let cmd = InventoryCommand::RecordMovement(movement_cmd("P-103", delta));
                    if let Ok(events) = item.handle(&cmd) {
                        let expected = item.current_stock() + delta;
                        match &events[0] {
                            InventoryEvent::StockMoved(e) => {
                                prop_assert_eq!(e.resulting_stock, expected);
                            }
                            other => prop_assert!(false, "unexpected event {:?}", other),
                        }
                        for ev in &events {
                            item.apply(ev);
                        }
                        prop_assert_eq!(item.current_stock(), expected);
                    }
                }
            }
        }
    }
}
