use serde::{Deserialize, Serialize};

use crate::db_types::{AppliedMovement, MovementRecord, Quantity, StockRecord};

/// Emitted once for every movement that was committed to the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMovedEvent {
    pub movement: MovementRecord,
    pub record: StockRecord,
}

impl From<AppliedMovement> for StockMovedEvent {
    fn from(applied: AppliedMovement) -> Self {
        Self { movement: applied.movement, record: applied.record }
    }
}

/// Emitted when a movement that takes stock off the shelf leaves `qty_on_hand` at or below the configured threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LowStockEvent {
    pub record: StockRecord,
    pub threshold: Quantity,
}

impl LowStockEvent {
    pub fn new(record: StockRecord, threshold: Quantity) -> Self {
        Self { record, threshold }
    }
}
