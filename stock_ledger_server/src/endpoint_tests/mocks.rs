use mockall::mock;
use stock_ledger_engine::{
    db_types::{AppliedMovement, MovementRecord, NewMovement, Quantity, SkuId, StockRecord},
    movement_objects::MovementQueryFilter,
    StockLedgerDatabase,
    StockLedgerError,
};

mock! {
    pub StockDb {}
    impl Clone for StockDb {
        fn clone(&self) -> Self;
    }
    impl StockLedgerDatabase for StockDb {
        fn url(&self) -> &str;
        async fn fetch_stock_record(&self, sku: &SkuId) -> Result<Option<StockRecord>, StockLedgerError>;
        async fn apply_movements(&self, movements: &[NewMovement]) -> Result<Vec<AppliedMovement>, StockLedgerError>;
        async fn fetch_movements(&self, sku: &SkuId, filter: &MovementQueryFilter) -> Result<Vec<MovementRecord>, StockLedgerError>;
        async fn fetch_low_stock(&self, threshold: Quantity) -> Result<Vec<StockRecord>, StockLedgerError>;
    }
}
