use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use futures::future::FutureExt;
use log::*;
use stock_ledger_engine::{
    events::{EventHandlers, EventHooks},
    InventoryLedger,
    OrderStockApi,
    SqliteDatabase,
};

use crate::{
    catalog::ServerCatalog,
    config::ServerConfig,
    errors::ServerError,
    routes::{
        health,
        AdjustRoute,
        CancelOrderRoute,
        DispatchShipmentRoute,
        InboundRoute,
        LowStockRoute,
        OutboundRoute,
        PlaceOrderRoute,
        ReconcileRoute,
        ReleaseRoute,
        ReserveRoute,
        StockHistoryRoute,
        StockLevelRoute,
    },
};

const EVENT_BUFFER_SIZE: usize = 100;

pub type ServerLedger = InventoryLedger<SqliteDatabase, ServerCatalog>;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, config.max_connections)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if config.run_migrations {
        db.migrate().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    }
    let handlers = EventHandlers::new(EVENT_BUFFER_SIZE, logging_hooks());
    let producers = handlers.producers();
    handlers.start_handlers().await;
    // One ledger for the whole server. Every worker gets a clone, and clones share the per-SKU locks.
    let ledger = InventoryLedger::new(db, config.catalog()).with_config(config.ledger.clone()).with_producers(producers);
    let srv = create_server_instance(config, ledger)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(config: ServerConfig, ledger: ServerLedger) -> Result<Server, ServerError> {
    let srv = HttpServer::new(move || {
        let orders_api = OrderStockApi::new(ledger.clone());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("stock::access_log"))
            .app_data(web::Data::new(ledger.clone()))
            .app_data(web::Data::new(orders_api))
            .service(health)
            .configure(configure_routes::<SqliteDatabase, ServerCatalog>)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// Registers the ledger routes. `/stock/low` must be registered before `/stock/{sku}`, which would otherwise match it.
pub fn configure_routes<B, C>(cfg: &mut web::ServiceConfig)
where
    B: stock_ledger_engine::StockLedgerDatabase + 'static,
    C: stock_ledger_engine::CatalogLookup + 'static,
{
    cfg.service(InboundRoute::<B, C>::new())
        .service(OutboundRoute::<B, C>::new())
        .service(ReserveRoute::<B, C>::new())
        .service(ReleaseRoute::<B, C>::new())
        .service(AdjustRoute::<B, C>::new())
        .service(LowStockRoute::<B, C>::new())
        .service(StockLevelRoute::<B, C>::new())
        .service(StockHistoryRoute::<B, C>::new())
        .service(ReconcileRoute::<B, C>::new())
        .service(PlaceOrderRoute::<B, C>::new())
        .service(CancelOrderRoute::<B, C>::new())
        .service(DispatchShipmentRoute::<B, C>::new());
}

/// Stock events are written to the log. Low stock is a warning so that it stands out.
fn logging_hooks() -> EventHooks {
    let mut hooks = EventHooks::default();
    hooks
        .on_stock_moved(|ev| {
            async move {
                info!(
                    "📬️ {} {} {} → {}",
                    ev.movement.sku_id, ev.movement.movement_type, ev.movement.quantity, ev.record.levels()
                );
            }
            .boxed()
        })
        .on_low_stock(|ev| {
            async move {
                warn!(
                    "📬️ {} is running low: {} on hand, {} reserved (threshold {})",
                    ev.record.sku_id, ev.record.qty_on_hand, ev.record.qty_reserved, ev.threshold
                );
            }
            .boxed()
        });
    hooks
}
