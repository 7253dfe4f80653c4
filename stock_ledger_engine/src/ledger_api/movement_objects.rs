use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db_types::{MovementType, Quantity, SkuId, StockLevels, StockReference};

//--------------------------------------  MovementQueryFilter  ---------------------------------------------------------
/// Criteria for selecting movements from a SKU's history. An empty filter selects everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovementQueryFilter {
    movement_types: Vec<MovementType>,
    reference_type: Option<String>,
    reference_id: Option<String>,
    since: Option<DateTime<Utc>>,
    until: Option<DateTime<Utc>>,
    limit: Option<u32>,
}

impl MovementQueryFilter {
    /// Adds `movement_type` to the set of accepted types. Calling this more than once widens the filter.
    pub fn with_type(mut self, movement_type: MovementType) -> Self {
        if !self.movement_types.contains(&movement_type) {
            self.movement_types.push(movement_type);
        }
        self
    }

    pub fn with_reference_type<S: Into<String>>(mut self, reference_type: S) -> Self {
        self.reference_type = Some(reference_type.into());
        self
    }

    /// Restricts the history to movements caused by one business event, e.g. every movement for order "O1".
    pub fn with_reference(mut self, reference: &StockReference) -> Self {
        self.reference_type = Some(reference.reference_type.clone());
        self.reference_id = Some(reference.reference_id.clone());
        self
    }

    pub fn since(&self) -> Option<DateTime<Utc>> {
        self.since
    }

    /// Only movements created at or after `since`.
    pub fn with_since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn until(&self) -> Option<DateTime<Utc>> {
        self.until
    }

    /// Only movements created strictly before `until`.
    pub fn with_until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn movement_types(&self) -> &[MovementType] {
        &self.movement_types
    }

    pub fn reference_type(&self) -> Option<&str> {
        self.reference_type.as_deref()
    }

    pub fn reference_id(&self) -> Option<&str> {
        self.reference_id.as_deref()
    }

    pub fn limit(&self) -> Option<u32> {
        self.limit
    }

    pub fn is_empty(&self) -> bool {
        self.movement_types.is_empty() &&
            self.reference_type.is_none() &&
            self.reference_id.is_none() &&
            self.since.is_none() &&
            self.until.is_none() &&
            self.limit.is_none()
    }
}

//-------------------------------------- ReconciliationReport ---------------------------------------------------------
/// Result of replaying a SKU's movement log and comparing it with the stored counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub sku_id: SkuId,
    /// The counters as currently stored.
    pub stored: StockLevels,
    /// The counters rebuilt from the movement log.
    pub replayed: StockLevels,
    /// The sum of all signed `ADJUST` quantities.
    pub net_adjustment: Quantity,
    pub movement_count: usize,
    /// True if `stored == replayed`.
    pub consistent: bool,
    /// True if `on_hand + reserved == inbound - outbound + net_adjustment` for the stored counters.
    pub conserved: bool,
}

impl ReconciliationReport {
    pub fn new(sku_id: SkuId, stored: StockLevels, replayed: StockLevels, net_adjustment: Quantity, count: usize) -> Self {
        Self {
            sku_id,
            stored,
            replayed,
            net_adjustment,
            movement_count: count,
            consistent: stored == replayed,
            conserved: stored.is_conserved(net_adjustment),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.consistent && self.conserved && self.stored.is_valid()
    }
}

//--------------------------------------       OrderLine       ---------------------------------------------------------
/// One line item of an order or shipment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub sku: SkuId,
    pub quantity: Quantity,
}

impl OrderLine {
    pub fn new<S: Into<SkuId>>(sku: S, quantity: i64) -> Self {
        Self { sku: sku.into(), quantity: Quantity::from(quantity) }
    }
}
