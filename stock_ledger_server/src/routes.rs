//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Every ledger operation is asynchronous, including the wait for a
//! SKU lock, so a request queued behind another writer of the same SKU does not hold up the worker.
use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use stock_ledger_engine::{
    db_types::{MovementType, NewMovement, Quantity, SkuId},
    movement_objects::MovementQueryFilter,
    CatalogLookup,
    InventoryLedger,
    OrderStockApi,
    StockLedgerDatabase,
};

use crate::{
    data_objects::{HistoryParams, LowStockParams, MovementRequest, OrderRequest, ShipmentRequest},
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Movements  ----------------------------------------------------
route!(inbound => Post "/stock/inbound" impl StockLedgerDatabase, CatalogLookup);
/// Receives stock into the warehouse. This is the only movement that may create the stock record of a new SKU.
pub async fn inbound<B, C>(
    api: web::Data<InventoryLedger<B, C>>,
    body: web::Json<MovementRequest>,
) -> Result<HttpResponse, ServerError>
where
    B: StockLedgerDatabase,
    C: CatalogLookup,
{
    record_movement(api.get_ref(), MovementType::Inbound, body.into_inner()).await
}

route!(outbound => Post "/stock/outbound" impl StockLedgerDatabase, CatalogLookup);
pub async fn outbound<B, C>(
    api: web::Data<InventoryLedger<B, C>>,
    body: web::Json<MovementRequest>,
) -> Result<HttpResponse, ServerError>
where
    B: StockLedgerDatabase,
    C: CatalogLookup,
{
    record_movement(api.get_ref(), MovementType::Outbound, body.into_inner()).await
}

route!(reserve => Post "/stock/reserve" impl StockLedgerDatabase, CatalogLookup);
pub async fn reserve<B, C>(
    api: web::Data<InventoryLedger<B, C>>,
    body: web::Json<MovementRequest>,
) -> Result<HttpResponse, ServerError>
where
    B: StockLedgerDatabase,
    C: CatalogLookup,
{
    record_movement(api.get_ref(), MovementType::Reserve, body.into_inner()).await
}

route!(release => Post "/stock/release" impl StockLedgerDatabase, CatalogLookup);
pub async fn release<B, C>(
    api: web::Data<InventoryLedger<B, C>>,
    body: web::Json<MovementRequest>,
) -> Result<HttpResponse, ServerError>
where
    B: StockLedgerDatabase,
    C: CatalogLookup,
{
    record_movement(api.get_ref(), MovementType::Release, body.into_inner()).await
}

route!(adjust => Post "/stock/adjust" impl StockLedgerDatabase, CatalogLookup);
/// Corrects on-hand stock. Unlike the other movements, `quantity` is signed.
pub async fn adjust<B, C>(
    api: web::Data<InventoryLedger<B, C>>,
    body: web::Json<MovementRequest>,
) -> Result<HttpResponse, ServerError>
where
    B: StockLedgerDatabase,
    C: CatalogLookup,
{
    record_movement(api.get_ref(), MovementType::Adjust, body.into_inner()).await
}

async fn record_movement<B, C>(
    api: &InventoryLedger<B, C>,
    movement_type: MovementType,
    req: MovementRequest,
) -> Result<HttpResponse, ServerError>
where
    B: StockLedgerDatabase,
    C: CatalogLookup,
{
    debug!("💻️ Received {movement_type} request for {} of {}", req.quantity, req.sku);
    let memo = req.memo()?;
    let movement = NewMovement::new(req.sku, movement_type, req.quantity).with_memo(memo);
    let record = api.record_movement(movement).await.map_err(|e| {
        debug!("💻️ {movement_type} request was not applied. {e}");
        e
    })?;
    Ok(HttpResponse::Ok().json(record))
}

//----------------------------------------------   Stock levels  ----------------------------------------------------
route!(low_stock => Get "/stock/low" impl StockLedgerDatabase, CatalogLookup);
/// Lists the SKUs with `threshold` or fewer units on hand. Without a `threshold` parameter, the configured low-stock
/// threshold is used (or zero, if there is none).
pub async fn low_stock<B, C>(
    api: web::Data<InventoryLedger<B, C>>,
    params: web::Query<LowStockParams>,
) -> Result<HttpResponse, ServerError>
where
    B: StockLedgerDatabase,
    C: CatalogLookup,
{
    let threshold = match params.threshold {
        Some(t) if t < 0 => return Err(ServerError::InvalidRequestPath(format!("Invalid threshold: {t}"))),
        Some(t) => Quantity::from(t),
        None => api.config().low_stock_threshold.unwrap_or(Quantity::ZERO),
    };
    trace!("💻️ Fetching SKUs with {threshold} or fewer on hand");
    let records = api.low_stock(threshold).await?;
    Ok(HttpResponse::Ok().json(records))
}

route!(stock_level => Get "/stock/{sku}" impl StockLedgerDatabase, CatalogLookup);
/// The current counters for a SKU. A SKU that has never moved reports zeroes.
pub async fn stock_level<B, C>(
    api: web::Data<InventoryLedger<B, C>>,
    path: web::Path<String>,
) -> Result<HttpResponse, ServerError>
where
    B: StockLedgerDatabase,
    C: CatalogLookup,
{
    let sku = SkuId::from(path.into_inner());
    trace!("💻️ Fetching stock level for {sku}");
    let record = api.current_level(&sku).await?;
    Ok(HttpResponse::Ok().json(record))
}

route!(stock_history => Get "/stock/{sku}/history" impl StockLedgerDatabase, CatalogLookup);
/// The movements for a SKU, newest first. Supports filtering by `type` (comma-separated), `reference_type`,
/// `reference_id`, `since`, `until` and `limit`.
pub async fn stock_history<B, C>(
    api: web::Data<InventoryLedger<B, C>>,
    path: web::Path<String>,
    params: web::Query<HistoryParams>,
) -> Result<HttpResponse, ServerError>
where
    B: StockLedgerDatabase,
    C: CatalogLookup,
{
    let sku = SkuId::from(path.into_inner());
    let filter = MovementQueryFilter::try_from(params.into_inner())?;
    trace!("💻️ Fetching history for {sku} with {filter:?}");
    let movements = api.search_history(&sku, filter).await?;
    Ok(HttpResponse::Ok().json(movements))
}

route!(reconcile => Get "/stock/{sku}/reconcile" impl StockLedgerDatabase, CatalogLookup);
pub async fn reconcile<B, C>(
    api: web::Data<InventoryLedger<B, C>>,
    path: web::Path<String>,
) -> Result<HttpResponse, ServerError>
where
    B: StockLedgerDatabase,
    C: CatalogLookup,
{
    let sku = SkuId::from(path.into_inner());
    debug!("💻️ Reconciling {sku}");
    let report = api.reconcile(&sku).await?;
    Ok(HttpResponse::Ok().json(report))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(place_order => Post "/orders/place" impl StockLedgerDatabase, CatalogLookup);
/// Reserves stock for every line of an order. If any line cannot be reserved, nothing is reserved and the order must
/// not be accepted.
pub async fn place_order<B, C>(
    api: web::Data<OrderStockApi<B, C>>,
    body: web::Json<OrderRequest>,
) -> Result<HttpResponse, ServerError>
where
    B: StockLedgerDatabase,
    C: CatalogLookup,
{
    let OrderRequest { order_id, lines, note } = body.into_inner();
    debug!("💻️ Received placement for order {order_id} with {} line(s)", lines.len());
    let records = api.place_order(&order_id, &lines, note).await?;
    Ok(HttpResponse::Ok().json(records))
}

route!(cancel_order => Post "/orders/cancel" impl StockLedgerDatabase, CatalogLookup);
pub async fn cancel_order<B, C>(
    api: web::Data<OrderStockApi<B, C>>,
    body: web::Json<OrderRequest>,
) -> Result<HttpResponse, ServerError>
where
    B: StockLedgerDatabase,
    C: CatalogLookup,
{
    let OrderRequest { order_id, lines, .. } = body.into_inner();
    debug!("💻️ Received cancellation for order {order_id}");
    let records = api.cancel_order(&order_id, &lines).await?;
    Ok(HttpResponse::Ok().json(records))
}

route!(dispatch_shipment => Post "/shipments/dispatch" impl StockLedgerDatabase, CatalogLookup);
pub async fn dispatch_shipment<B, C>(
    api: web::Data<OrderStockApi<B, C>>,
    body: web::Json<ShipmentRequest>,
) -> Result<HttpResponse, ServerError>
where
    B: StockLedgerDatabase,
    C: CatalogLookup,
{
    let ShipmentRequest { shipment_id, lines } = body.into_inner();
    debug!("💻️ Received dispatch for shipment {shipment_id} with {} line(s)", lines.len());
    let records = api.dispatch_shipment(&shipment_id, &lines).await?;
    Ok(HttpResponse::Ok().json(records))
}
