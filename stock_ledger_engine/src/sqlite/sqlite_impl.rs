//! `SqliteDatabase` is a concrete implementation of a stock ledger backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use log::*;
use sqlx::{pool::PoolConnection, Sqlite, SqliteConnection, SqlitePool};

use super::{
    db::{db_url, movements, new_pool, stock_records},
    SqliteDatabaseError,
};
use crate::{
    db_types::{AppliedMovement, MovementRecord, MovementType, NewMovement, Quantity, SkuId, StockRecord},
    ledger_api::movement_objects::MovementQueryFilter,
    traits::{StockLedgerDatabase, StockLedgerError},
};

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl StockLedgerDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn fetch_stock_record(&self, sku: &SkuId) -> Result<Option<StockRecord>, StockLedgerError> {
        let mut conn = self.acquire().await.map_err(|e| e.into_ledger_error(sku))?;
        stock_records::fetch_stock_record(sku, &mut conn).await.map_err(|e| e.into_ledger_error(sku))
    }

    /// Applies the batch in one transaction. If any movement fails, the transaction is dropped without being
    /// committed, which rolls back every counter update, movement entry and newly created record in the batch.
    async fn apply_movements(&self, movements: &[NewMovement]) -> Result<Vec<AppliedMovement>, StockLedgerError> {
        let Some(first) = movements.first() else {
            return Ok(Vec::new());
        };
        self.apply_in_transaction(movements).await.map_err(|e| e.into_ledger_error(&first.sku_id))
    }

    async fn fetch_movements(
        &self,
        sku: &SkuId,
        filter: &MovementQueryFilter,
    ) -> Result<Vec<MovementRecord>, StockLedgerError> {
        let mut conn = self.acquire().await.map_err(|e| e.into_ledger_error(sku))?;
        movements::fetch_movements(sku, filter, &mut conn).await.map_err(|e| e.into_ledger_error(sku))
    }

    async fn fetch_low_stock(&self, threshold: Quantity) -> Result<Vec<StockRecord>, StockLedgerError> {
        // Not scoped to a SKU, so a busy database cannot be reported as contention on one
        let mut conn = self.acquire().await.map_err(|e| StockLedgerError::DatabaseError(e.to_string()))?;
        stock_records::fetch_low_stock(threshold.value(), &mut conn)
            .await
            .map_err(|e| StockLedgerError::DatabaseError(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), StockLedgerError> {
        self.pool.close().await;
        Ok(())
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new() -> Result<Self, SqliteDatabaseError> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), DEFAULT_MAX_CONNECTIONS).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Brings the schema up to date by running any migrations that have not been applied yet.
    pub async fn migrate(&self) -> Result<(), SqliteDatabaseError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn acquire(&self) -> Result<PoolConnection<Sqlite>, SqliteDatabaseError> {
        Ok(self.pool.acquire().await?)
    }

    async fn apply_in_transaction(&self, movements: &[NewMovement]) -> Result<Vec<AppliedMovement>, SqliteDatabaseError> {
        let mut tx = self.pool.begin().await?;
        let mut applied = Vec::with_capacity(movements.len());
        for movement in movements {
            applied.push(apply_movement(movement, &mut tx).await?);
        }
        tx.commit().await?;
        trace!("🗃️ Committed {} stock movement(s)", applied.len());
        Ok(applied)
    }
}

/// Applies one movement: creates the stock record if needed, runs the guarded counter update and appends the log
/// entry. Callers must run this inside a transaction so that a rejected movement leaves nothing behind.
async fn apply_movement(
    movement: &NewMovement,
    conn: &mut SqliteConnection,
) -> Result<AppliedMovement, SqliteDatabaseError> {
    let sku = &movement.sku_id;
    stock_records::create_if_missing(sku, conn).await?;
    let delta = movement.delta();
    let Some(record) = stock_records::apply_delta(sku, &delta, conn).await? else {
        let current = stock_records::fetch_stock_record(sku, conn)
            .await?
            .ok_or_else(|| SqliteDatabaseError::MissingStockRecord(sku.clone()))?;
        if current.levels().checked_apply(&delta).is_none() {
            let movement_type = movement.movement_type;
            debug!("🗃️ {movement_type} of {} rejected for {sku}. The counters would overflow", movement.quantity);
            return Err(SqliteDatabaseError::CounterOverflow { sku: sku.clone(), quantity: movement.quantity });
        }
        let available = match movement.movement_type {
            MovementType::Release => current.qty_reserved,
            _ => current.qty_on_hand,
        };
        let requested = match movement.movement_type {
            MovementType::Adjust => movement.quantity.saturating_neg(),
            _ => movement.quantity,
        };
        debug!("🗃️ {} of {requested} rejected for {sku}. Only {available} available", movement.movement_type);
        return Err(SqliteDatabaseError::InsufficientStock { sku: sku.clone(), requested, available });
    };
    let entry = movements::insert_movement(movement, conn).await?;
    trace!("🗃️ Movement #{} recorded: {} {} for {sku}", entry.id, entry.movement_type, entry.quantity);
    Ok(AppliedMovement { record, movement: entry })
}
