use std::{collections::BTreeSet, fmt::Debug};

use log::*;

use crate::{
    db_types::{
        AppliedMovement,
        MovementMemo,
        MovementRecord,
        MovementType,
        NewMovement,
        Quantity,
        SkuId,
        StockLevels,
        StockRecord,
    },
    events::{EventProducers, LowStockEvent, StockMovedEvent},
    ledger_api::{
        config::LedgerConfig,
        movement_objects::{MovementQueryFilter, ReconciliationReport},
        sku_locks::SkuLocks,
    },
    traits::{CatalogLookup, OpenCatalog, StockLedgerDatabase, StockLedgerError},
};

/// `InventoryLedger` is the only component that writes stock records and movements.
///
/// Every mutating call goes through the same pipeline:
/// 1. The request is validated (`InvalidSku`, `InvalidQuantity`). Nothing is locked yet.
/// 2. The locks for the SKUs involved are acquired, in sorted order, within `lock_timeout` (`Timeout`).
/// 3. SKUs without a stock record are checked against the catalog (`UnknownSku`).
/// 4. The backend applies the counter updates and appends the movements in one transaction. Precondition failures
///    (`InsufficientStock`) roll the transaction back. A busy database is retried up to `max_retries` times
///    (`Contention`).
/// 5. The locks are released and events are published.
///
/// Clones share the same lock registry.
#[derive(Clone)]
pub struct InventoryLedger<B, C = OpenCatalog> {
    db: B,
    catalog: C,
    locks: SkuLocks,
    config: LedgerConfig,
    producers: EventProducers,
}

impl<B, C> Debug for InventoryLedger<B, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "InventoryLedger ({} SKUs tracked, {:?})", self.locks.len(), self.config)
    }
}

impl<B, C> InventoryLedger<B, C> {
    pub fn new(db: B, catalog: C) -> Self {
        Self {
            db,
            catalog,
            locks: SkuLocks::new(),
            config: LedgerConfig::default(),
            producers: EventProducers::default(),
        }
    }

    pub fn with_config(mut self, config: LedgerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_producers(mut self, producers: EventProducers) -> Self {
        self.producers = producers;
        self
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }
}

impl<B, C> InventoryLedger<B, C>
where
    B: StockLedgerDatabase,
    C: CatalogLookup,
{
    /// Receives `quantity` units into stock. Creates the stock record if this is the SKU's first movement, provided
    /// the catalog knows the SKU.
    pub async fn inbound(
        &self,
        sku: &SkuId,
        quantity: Quantity,
        memo: MovementMemo,
    ) -> Result<StockRecord, StockLedgerError> {
        self.record_movement(NewMovement::new(sku.clone(), MovementType::Inbound, quantity).with_memo(memo)).await
    }

    /// Ships or sells `quantity` units of on-hand stock. Fails with `InsufficientStock` if less is on hand.
    ///
    /// Reserved stock is not consumed. Stock reserved for an order must be released before it is shipped
    /// (see [`crate::OrderStockApi::dispatch_shipment`]).
    pub async fn outbound(
        &self,
        sku: &SkuId,
        quantity: Quantity,
        memo: MovementMemo,
    ) -> Result<StockRecord, StockLedgerError> {
        self.record_movement(NewMovement::new(sku.clone(), MovementType::Outbound, quantity).with_memo(memo)).await
    }

    /// Moves `quantity` units from on-hand to reserved. Fails with `InsufficientStock` if less is on hand.
    pub async fn reserve(
        &self,
        sku: &SkuId,
        quantity: Quantity,
        memo: MovementMemo,
    ) -> Result<StockRecord, StockLedgerError> {
        self.record_movement(NewMovement::new(sku.clone(), MovementType::Reserve, quantity).with_memo(memo)).await
    }

    /// Moves `quantity` units from reserved back to on-hand. Fails with `InsufficientStock` if less is reserved.
    pub async fn release(
        &self,
        sku: &SkuId,
        quantity: Quantity,
        memo: MovementMemo,
    ) -> Result<StockRecord, StockLedgerError> {
        self.record_movement(NewMovement::new(sku.clone(), MovementType::Release, quantity).with_memo(memo)).await
    }

    /// Corrects on-hand stock by a signed amount (shrinkage, recount). The result may not be negative.
    ///
    /// Adjustments leave the inbound and outbound journals alone, so after an adjustment
    /// `on_hand + reserved` differs from `inbound - outbound` by the net adjusted amount.
    pub async fn adjust(
        &self,
        sku: &SkuId,
        signed_quantity: Quantity,
        memo: MovementMemo,
    ) -> Result<StockRecord, StockLedgerError> {
        self.record_movement(NewMovement::new(sku.clone(), MovementType::Adjust, signed_quantity).with_memo(memo))
            .await
    }

    /// Applies a single movement of any type.
    pub async fn record_movement(&self, movement: NewMovement) -> Result<StockRecord, StockLedgerError> {
        let sku = movement.sku_id.clone();
        let mut applied = self.apply_batch(vec![movement]).await?;
        applied.pop().map(|a| a.record).ok_or_else(|| {
            error!("📦️ The backend accepted a movement for {sku} but returned no result");
            StockLedgerError::DatabaseError(format!("No result returned for movement on {sku}"))
        })
    }

    /// Applies several movements, possibly across several SKUs, as one atomic unit. Either every movement is recorded
    /// or none is.
    ///
    /// The result contains one entry per movement, in the order given.
    pub async fn apply_batch(&self, movements: Vec<NewMovement>) -> Result<Vec<AppliedMovement>, StockLedgerError> {
        if movements.is_empty() {
            return Ok(Vec::new());
        }
        movements.iter().try_for_each(validate_movement)?;
        let skus: BTreeSet<&SkuId> = movements.iter().map(|m| &m.sku_id).collect();
        let guards = self.locks.acquire(skus.iter().copied(), self.config.lock_timeout).await?;
        trace!("📦️ Acquired {} SKU lock(s) for {} movement(s)", guards.len(), movements.len());
        for sku in &skus {
            self.ensure_known_sku(sku).await?;
        }
        let applied = self.apply_with_retry(&movements).await;
        drop(guards);
        let applied = applied?;
        for a in &applied {
            debug!(
                "📦️ {} of {} for {} recorded as movement #{}. Now {}",
                a.movement.movement_type,
                a.movement.quantity,
                a.record.sku_id,
                a.movement.id,
                a.record.levels()
            );
        }
        self.publish_events(&applied).await;
        Ok(applied)
    }

    /// Returns the current counters for `sku`. A SKU that has never moved gets a zero-valued record, which is *not*
    /// stored.
    pub async fn current_level(&self, sku: &SkuId) -> Result<StockRecord, StockLedgerError> {
        validate_sku(sku)?;
        let record = self.db.fetch_stock_record(sku).await?;
        Ok(record.unwrap_or_else(|| StockRecord::empty(sku.clone())))
    }

    /// Returns the movements for `sku`, newest first, optionally restricted to one movement type.
    pub async fn history(
        &self,
        sku: &SkuId,
        movement_type: Option<MovementType>,
    ) -> Result<Vec<MovementRecord>, StockLedgerError> {
        let filter = match movement_type {
            Some(t) => MovementQueryFilter::default().with_type(t),
            None => MovementQueryFilter::default(),
        };
        self.search_history(sku, filter).await
    }

    /// Returns the movements for `sku` that match `filter`, newest first.
    pub async fn search_history(
        &self,
        sku: &SkuId,
        filter: MovementQueryFilter,
    ) -> Result<Vec<MovementRecord>, StockLedgerError> {
        validate_sku(sku)?;
        self.db.fetch_movements(sku, &filter).await
    }

    /// Rebuilds the counters for `sku` from its movement log and compares them with the stored record.
    ///
    /// The SKU's lock is held while both are read so that no writer in this process can change one but not the other
    /// in between.
    pub async fn reconcile(&self, sku: &SkuId) -> Result<ReconciliationReport, StockLedgerError> {
        validate_sku(sku)?;
        let _guard = self.locks.acquire([sku], self.config.lock_timeout).await?;
        let stored = self.db.fetch_stock_record(sku).await?.map(|r| r.levels()).unwrap_or_default();
        let log = self.db.fetch_movements(sku, &MovementQueryFilter::default()).await?;
        let (replayed, net_adjustment) = StockLevels::replay(&log);
        let report = ReconciliationReport::new(sku.clone(), stored, replayed, net_adjustment, log.len());
        if report.is_healthy() {
            debug!("📦️ {sku} reconciles with {} movements", report.movement_count);
        } else {
            error!(
                "📦️ {sku} does not reconcile! Stored [{}], replayed [{}], net adjustment {}",
                report.stored, report.replayed, report.net_adjustment
            );
        }
        Ok(report)
    }

    /// Returns every SKU with on-hand stock at or below `threshold`.
    pub async fn low_stock(&self, threshold: Quantity) -> Result<Vec<StockRecord>, StockLedgerError> {
        self.db.fetch_low_stock(threshold).await
    }

    async fn ensure_known_sku(&self, sku: &SkuId) -> Result<(), StockLedgerError> {
        if self.db.fetch_stock_record(sku).await?.is_some() {
            return Ok(());
        }
        if self.catalog.sku_exists(sku).await? {
            trace!("📦️ {sku} has no stock record yet, but the catalog knows it");
            Ok(())
        } else {
            debug!("📦️ {sku} has no stock record and the catalog does not know it");
            Err(StockLedgerError::UnknownSku(sku.clone()))
        }
    }

    async fn apply_with_retry(&self, movements: &[NewMovement]) -> Result<Vec<AppliedMovement>, StockLedgerError> {
        let max_retries = self.config.max_retries;
        let mut attempt = 0u32;
        loop {
            match self.db.apply_movements(movements).await {
                Err(StockLedgerError::Contention(sku)) if attempt < max_retries => {
                    attempt += 1;
                    let delay = self.config.retry_backoff * attempt;
                    debug!("📦️ Database busy while moving {sku}. Retry {attempt}/{max_retries} in {delay:?}");
                    tokio::time::sleep(delay).await;
                },
                Err(StockLedgerError::Contention(sku)) => {
                    warn!("📦️ Giving up on movement for {sku} after {max_retries} retries");
                    return Err(StockLedgerError::Contention(sku));
                },
                result => return result,
            }
        }
    }

    async fn publish_events(&self, applied: &[AppliedMovement]) {
        for a in applied {
            self.producers.publish_stock_moved(StockMovedEvent::from(a.clone())).await;
            if let Some(threshold) = self.config.low_stock_threshold {
                if takes_stock_off_shelf(&a.movement) && a.record.qty_on_hand <= threshold {
                    info!("📦️ {} is low on stock: {} on hand", a.record.sku_id, a.record.qty_on_hand);
                    self.producers.publish_low_stock(LowStockEvent::new(a.record.clone(), threshold)).await;
                }
            }
        }
    }
}

fn takes_stock_off_shelf(movement: &MovementRecord) -> bool {
    match movement.movement_type {
        MovementType::Outbound | MovementType::Reserve => true,
        MovementType::Adjust => movement.quantity.is_negative(),
        MovementType::Inbound | MovementType::Release => false,
    }
}

fn validate_sku(sku: &SkuId) -> Result<(), StockLedgerError> {
    if sku.is_valid() {
        Ok(())
    } else {
        Err(StockLedgerError::InvalidSku(sku.to_string()))
    }
}

/// Checks the parts of a movement request that do not depend on stored state.
fn validate_movement(movement: &NewMovement) -> Result<(), StockLedgerError> {
    validate_sku(&movement.sku_id)?;
    let quantity = movement.quantity;
    // i64::MIN has no positive counterpart to report as the requested amount
    let valid = if movement.movement_type.is_signed() {
        !quantity.is_zero() && quantity.value() != i64::MIN
    } else {
        quantity.is_positive()
    };
    if valid {
        Ok(())
    } else {
        Err(StockLedgerError::InvalidQuantity(quantity.value()))
    }
}
