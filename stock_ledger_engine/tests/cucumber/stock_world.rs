use cucumber::World;
use log::*;
use stock_ledger_engine::{
    db_types::StockRecord,
    test_utils::prepare_env::{create_database, random_db_path, run_migrations},
    InventoryLedger,
    OrderStockApi,
    SqliteDatabase,
    StaticCatalog,
    StockLedgerError,
};

#[derive(Default, Debug, World)]
pub struct StockWorld {
    pub system: Option<StockSystem>,
    /// The outcome of the last step phrased as "I try to ...".
    pub last_attempt: Option<Result<Vec<StockRecord>, StockLedgerError>>,
}

#[derive(Debug)]
pub struct StockSystem {
    pub db_path: String,
    pub ledger: InventoryLedger<SqliteDatabase, StaticCatalog>,
    pub orders: OrderStockApi<SqliteDatabase, StaticCatalog>,
}

impl StockWorld {
    pub fn ledger(&self) -> &InventoryLedger<SqliteDatabase, StaticCatalog> {
        &self.system.as_ref().expect("Stock ledger not initialised").ledger
    }

    pub fn orders(&self) -> &OrderStockApi<SqliteDatabase, StaticCatalog> {
        &self.system.as_ref().expect("Stock ledger not initialised").orders
    }

    pub fn last_error(&self) -> &StockLedgerError {
        match &self.last_attempt {
            Some(Err(e)) => e,
            Some(Ok(records)) => panic!("Expected the last attempt to fail, but it succeeded with {records:?}"),
            None => panic!("No attempt has been made yet"),
        }
    }
}

impl StockSystem {
    pub async fn new<I: IntoIterator<Item = String>>(catalog: I) -> Self {
        let url = random_db_path();
        create_database(&url).await;
        run_migrations(&url).await;
        let db = SqliteDatabase::new_with_url(&url, 1).await.expect("Error creating connection to database");
        debug!("Created database: {url}");
        let ledger = InventoryLedger::new(db, StaticCatalog::new(catalog));
        let orders = OrderStockApi::new(ledger.clone());
        Self { db_path: url, ledger, orders }
    }
}
