//! SQLite backend for the stock ledger.
mod errors;
mod sqlite_impl;

pub mod db;

pub use errors::SqliteDatabaseError;
pub use sqlite_impl::SqliteDatabase;
