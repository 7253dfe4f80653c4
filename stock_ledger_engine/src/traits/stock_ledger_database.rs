use thiserror::Error;

use crate::{
    db_types::{AppliedMovement, MovementRecord, NewMovement, Quantity, SkuId, StockRecord},
    ledger_api::movement_objects::MovementQueryFilter,
};

/// This trait defines the storage behaviour the [`crate::InventoryLedger`] relies on.
///
/// Implementations must guarantee that:
/// * A counter update and the corresponding movement entry are written together, or not at all.
/// * A movement whose precondition fails (e.g. reserving more than is on hand) leaves no trace.
/// * The precondition check and the counter write cannot be interleaved with another writer, even one in another
///   process sharing the same store.
///
/// Backends do *not* retry. Transient locking failures are reported as [`StockLedgerError::Contention`] and the ledger
/// decides whether to try again.
#[allow(async_fn_in_trait)]
pub trait StockLedgerDatabase: Clone {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Fetches the stock record for the given SKU. Returns `None` if no movement has ever been recorded for it.
    async fn fetch_stock_record(&self, sku: &SkuId) -> Result<Option<StockRecord>, StockLedgerError>;

    /// Applies every movement in `movements`, in order, inside a single transaction.
    ///
    /// A missing stock record is created on demand with all counters at zero. If any movement fails its precondition,
    /// the whole batch is rolled back (including any records created on demand) and the error is returned.
    ///
    /// Returns one [`AppliedMovement`] per input movement, in the same order.
    async fn apply_movements(&self, movements: &[NewMovement]) -> Result<Vec<AppliedMovement>, StockLedgerError>;

    /// Fetches the movements for a SKU matching the filter, newest first.
    async fn fetch_movements(
        &self,
        sku: &SkuId,
        filter: &MovementQueryFilter,
    ) -> Result<Vec<MovementRecord>, StockLedgerError>;

    /// Fetches every stock record whose on-hand quantity is at or below `threshold`, lowest first.
    async fn fetch_low_stock(&self, threshold: Quantity) -> Result<Vec<StockRecord>, StockLedgerError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), StockLedgerError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StockLedgerError {
    #[error("Invalid quantity {0}. It must be positive (non-zero for adjustments) and keep counters in range")]
    InvalidQuantity(i64),
    #[error("Invalid SKU id: '{0}'")]
    InvalidSku(String),
    #[error("Insufficient stock for {sku}. Requested {requested}, but only {available} available")]
    InsufficientStock { sku: SkuId, requested: Quantity, available: Quantity },
    #[error("SKU {0} is not known to the catalog")]
    UnknownSku(SkuId),
    #[error("Could not complete the stock update for {0} because of concurrent writers. Try again.")]
    Contention(SkuId),
    #[error("Timed out waiting for exclusive access to {0}. Try again.")]
    Timeout(SkuId),
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
}

impl StockLedgerError {
    /// True for failures of the concurrency machinery. These never mean the operation was rejected on its merits, and
    /// the caller may try again after re-checking the current level.
    pub fn is_transient(&self) -> bool {
        matches!(self, StockLedgerError::Contention(_) | StockLedgerError::Timeout(_))
    }
}

impl From<sqlx::Error> for StockLedgerError {
    fn from(e: sqlx::Error) -> Self {
        StockLedgerError::DatabaseError(e.to_string())
    }
}
