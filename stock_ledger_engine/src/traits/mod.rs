//! # Backend contracts
//!
//! This module defines the traits that the stock ledger requires from its collaborators.
//!
//! * [`StockLedgerDatabase`] is implemented by storage backends. It owns the `stock_records` and `stock_movements`
//!   tables and guarantees that a counter update and its movement entry are written in a single atomic unit.
//! * [`CatalogLookup`] is the narrow view the ledger has of the product catalog. It is only consulted when a SKU has no
//!   stock record yet.
mod catalog;
mod stock_ledger_database;

pub use catalog::{CatalogLookup, OpenCatalog, StaticCatalog};
pub use stock_ledger_database::{StockLedgerDatabase, StockLedgerError};
