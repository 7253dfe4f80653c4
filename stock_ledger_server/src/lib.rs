//! # Stock ledger server
//! This crate hosts the HTTP front-end for the stock ledger. It is responsible for:
//! * Accepting stock movement requests (receiving, shipping, reserving, releasing and adjusting stock).
//! * Accepting order lifecycle notifications (placed, cancelled, dispatched) and turning them into reservations and
//!   outbound movements.
//! * Serving current stock levels, movement history and reconciliation reports.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `GET /health`: A health check route that returns a 200 OK response.
//! * `POST /stock/{inbound|outbound|reserve|release|adjust}`: Record a movement for one SKU.
//! * `GET /stock/low?threshold=n`: SKUs with `n` or fewer units on hand.
//! * `GET /stock/{sku}`: The current counters for a SKU.
//! * `GET /stock/{sku}/history`: The movement history of a SKU, newest first.
//! * `GET /stock/{sku}/reconcile`: Rebuild a SKU's counters from its history and compare.
//! * `POST /orders/place`, `POST /orders/cancel`, `POST /shipments/dispatch`: The order stock flow.
pub mod catalog;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
