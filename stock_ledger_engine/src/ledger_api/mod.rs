//! # Stock ledger public API
//!
//! The `ledger_api` module exposes the programmatic API for the stock ledger.
//!
//! * [`inventory_ledger`] is the core service. It is the only writer of stock records and movements, and offers the
//!   five movement operations (`inbound`, `outbound`, `reserve`, `release`, `adjust`) plus the read operations.
//! * [`order_stock_api`] is the contract that order placement, order cancellation and shipment dispatch flows use.
//!   Those flows should never do stock arithmetic themselves.
//!
//! The other submodules in this module are support and utility functions and types.
//!
//! # API usage
//!
//! An API instance is created by supplying a database backend that implements [`crate::traits::StockLedgerDatabase`],
//! and a catalog that implements [`crate::traits::CatalogLookup`].
//!
//! ```rust,ignore
//! use stock_ledger_engine::{InventoryLedger, OpenCatalog, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/stock.db", 5).await?;
//! let ledger = InventoryLedger::new(db, OpenCatalog);
//! let record = ledger.inbound(&"S1".into(), Quantity::from(50), MovementMemo::default()).await?;
//! ```
//!
//! Clones of a ledger share the same per-SKU locks, so create one ledger and hand out clones rather than building a
//! new ledger per request handler.
pub mod config;
pub mod inventory_ledger;
pub mod movement_objects;
pub mod order_stock_api;
pub mod sku_locks;
