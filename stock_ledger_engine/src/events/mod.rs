//! Stock ledger events
//!
//! Subscribers can react to stock changes (e.g. to refresh a storefront cache or notify purchasing about low stock)
//! without being able to influence the outcome of the ledger operation that produced the event.
mod channel;
mod event_types;
mod hooks;

pub use channel::{EventHandler, EventProducer, Handler};
pub use event_types::*;
pub use hooks::{EventHandlers, EventHooks, EventProducers};
