use thiserror::Error;

use crate::{
    db_types::{Quantity, SkuId},
    traits::StockLedgerError,
};

// Primary result codes. Extended codes (e.g. SQLITE_BUSY_SNAPSHOT) carry these in the low byte.
const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;

#[derive(Debug, Error)]
pub enum SqliteDatabaseError {
    #[error("Database connection error: {0}")]
    DriverError(#[from] sqlx::Error),
    #[error("Could not migrate the database schema: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),
    #[error("Insufficient stock for {sku}. Requested {requested}, but only {available} available")]
    InsufficientStock { sku: SkuId, requested: Quantity, available: Quantity },
    #[error("Moving {quantity} of {sku} would overflow its stock counters")]
    CounterOverflow { sku: SkuId, quantity: Quantity },
    #[error("Stock record for {0} vanished in the middle of a transaction")]
    MissingStockRecord(SkuId),
}

impl SqliteDatabaseError {
    /// True if SQLite could not obtain a lock in time, or the pool had no free connection. These are the only
    /// errors worth retrying.
    pub fn is_busy(&self) -> bool {
        match self {
            SqliteDatabaseError::DriverError(sqlx::Error::PoolTimedOut) => true,
            SqliteDatabaseError::DriverError(sqlx::Error::Database(e)) => {
                let primary_code = e.code().and_then(|c| c.parse::<i32>().ok()).map(|c| c & 0xff);
                matches!(primary_code, Some(SQLITE_BUSY | SQLITE_LOCKED)) || e.message().contains("database is locked")
            },
            _ => false,
        }
    }

    /// Converts a backend error into the ledger error type. Locking failures are attributed to `sku`.
    pub fn into_ledger_error(self, sku: &SkuId) -> StockLedgerError {
        if self.is_busy() {
            return StockLedgerError::Contention(sku.clone());
        }
        match self {
            SqliteDatabaseError::InsufficientStock { sku, requested, available } => {
                StockLedgerError::InsufficientStock { sku, requested, available }
            },
            SqliteDatabaseError::CounterOverflow { quantity, .. } => {
                StockLedgerError::InvalidQuantity(quantity.value())
            },
            e => StockLedgerError::DatabaseError(e.to_string()),
        }
    }
}
