//! The contract between the order lifecycle and the stock ledger.
//!
//! | Order event       | Stock movements, per line                | Reference         |
//! |-------------------|------------------------------------------|-------------------|
//! | order placed      | `RESERVE qty`                            | `("order", id)`   |
//! | order cancelled   | `RELEASE qty`                            | `("order", id)`   |
//! | shipment sent     | `RELEASE qty` then `OUTBOUND qty`        | `("shipment", id)`|
//!
//! Each call is applied as one batch. If any line fails (e.g. one SKU is out of stock), no line of the order is
//! reserved, and the caller can reject the order without having to undo anything.
use log::*;

use crate::{
    db_types::{MovementType, NewMovement, StockRecord, StockReference},
    ledger_api::{inventory_ledger::InventoryLedger, movement_objects::OrderLine},
    traits::{CatalogLookup, OpenCatalog, StockLedgerDatabase, StockLedgerError},
};

#[derive(Debug, Clone)]
pub struct OrderStockApi<B, C = OpenCatalog> {
    ledger: InventoryLedger<B, C>,
}

impl<B, C> OrderStockApi<B, C> {
    pub fn new(ledger: InventoryLedger<B, C>) -> Self {
        Self { ledger }
    }

    pub fn ledger(&self) -> &InventoryLedger<B, C> {
        &self.ledger
    }
}

impl<B, C> OrderStockApi<B, C>
where
    B: StockLedgerDatabase,
    C: CatalogLookup,
{
    /// Reserves stock for every line of a newly placed order.
    ///
    /// Returns the stock record of each line's SKU after its reservation, in line order.
    pub async fn place_order(
        &self,
        order_id: &str,
        lines: &[OrderLine],
        note: Option<String>,
    ) -> Result<Vec<StockRecord>, StockLedgerError> {
        let reference = StockReference::order(order_id);
        let movements = movements_for(lines, &[MovementType::Reserve], &reference, note)?;
        let records = self.apply(movements, 1).await.map_err(|e| {
            info!("📦️ Could not reserve stock for order {order_id}. {e}");
            e
        })?;
        info!("📦️ Reserved stock for {} line(s) of order {order_id}", lines.len());
        Ok(records)
    }

    /// Returns the reserved stock of a cancelled order to the shelf.
    pub async fn cancel_order(&self, order_id: &str, lines: &[OrderLine]) -> Result<Vec<StockRecord>, StockLedgerError> {
        let reference = StockReference::order(order_id);
        let movements = movements_for(lines, &[MovementType::Release], &reference, Some("order cancelled".into()))?;
        let records = self.apply(movements, 1).await?;
        info!("📦️ Released stock for {} line(s) of cancelled order {order_id}", lines.len());
        Ok(records)
    }

    /// Converts the reservations for shipped lines into outbound movements.
    ///
    /// Returns each line's stock record after the outbound movement, in line order.
    pub async fn dispatch_shipment(
        &self,
        shipment_id: &str,
        lines: &[OrderLine],
    ) -> Result<Vec<StockRecord>, StockLedgerError> {
        let reference = StockReference::shipment(shipment_id);
        let movements = movements_for(lines, &[MovementType::Release, MovementType::Outbound], &reference, None)?;
        let records = self.apply(movements, 2).await?;
        info!("📦️ Dispatched {} line(s) for shipment {shipment_id}", lines.len());
        Ok(records)
    }

    /// Applies the batch and keeps the record produced by the last movement of each line.
    async fn apply(&self, movements: Vec<NewMovement>, per_line: usize) -> Result<Vec<StockRecord>, StockLedgerError> {
        let applied = self.ledger.apply_batch(movements).await?;
        let records = applied.chunks(per_line).filter_map(|chunk| chunk.last()).map(|a| a.record.clone()).collect();
        Ok(records)
    }
}

fn movements_for(
    lines: &[OrderLine],
    steps: &[MovementType],
    reference: &StockReference,
    note: Option<String>,
) -> Result<Vec<NewMovement>, StockLedgerError> {
    if lines.is_empty() {
        debug!("📦️ Rejecting stock request for {reference} with no lines");
        return Err(StockLedgerError::InvalidQuantity(0));
    }
    let movements = lines
        .iter()
        .flat_map(|line| {
            steps.iter().map(|&step| {
                let movement = NewMovement::new(line.sku.clone(), step, line.quantity).with_reference(reference.clone());
                match &note {
                    Some(n) => movement.with_note(n.clone()),
                    None => movement,
                }
            })
        })
        .collect();
    Ok(movements)
}
