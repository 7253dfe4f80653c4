//! Stock Ledger Engine
//!
//! The stock ledger is the single source of truth for how much of each SKU a storefront has on hand, how much is
//! reserved for open orders, and how much has ever been received or shipped. Every change to those counters is
//! recorded as an immutable movement, so the current state of a SKU can always be rebuilt from its history.
//!
//! The library is divided into these sections:
//! 1. Data types ([`mod@db_types`]). Stock records, movements and the rules that map a movement onto the counters.
//! 2. Backend contracts ([`mod@traits`]). The storage and catalog traits the ledger depends on.
//! 3. The SQLite backend ([`mod@sqlite`]). It keeps counters and movements in one transaction and guards every update
//!    with a conditional write.
//! 4. The public API ([`mod@ledger_api`]). [`InventoryLedger`] performs the stock movements, and [`OrderStockApi`] maps
//!    the order lifecycle onto them.
//!
//! The ledger also emits events when stock moves or runs low. See [`mod@events`] for how to hook into them.
pub mod db_types;
pub mod events;
pub mod ledger_api;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use ledger_api::{
    config::LedgerConfig,
    inventory_ledger::InventoryLedger,
    movement_objects,
    order_stock_api::OrderStockApi,
    sku_locks::SkuLocks,
};
#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteDatabase, SqliteDatabaseError};
pub use traits::{CatalogLookup, OpenCatalog, StaticCatalog, StockLedgerDatabase, StockLedgerError};
