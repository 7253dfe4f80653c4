use actix_web::{http::StatusCode, test, test::TestRequest, web, web::ServiceConfig, App};
use chrono::{TimeZone, Utc};
use log::debug;
use stock_ledger_engine::{
    db_types::{AppliedMovement, MovementRecord, MovementType, Quantity, SkuId, StockRecord},
    InventoryLedger,
    LedgerConfig,
    OrderStockApi,
};

use super::mocks::MockStockDb;
use crate::{catalog::ServerCatalog, server::configure_routes};

/// Everything a request needs: the ledger backend, a separate backend for the order API and the catalog.
pub struct TestLedger {
    pub db: MockStockDb,
    pub orders_db: MockStockDb,
    pub catalog: ServerCatalog,
    pub config: LedgerConfig,
}

impl Default for TestLedger {
    fn default() -> Self {
        Self {
            db: MockStockDb::new(),
            orders_db: MockStockDb::new(),
            catalog: ServerCatalog::Open,
            config: LedgerConfig::default(),
        }
    }
}

impl TestLedger {
    fn configure(self, cfg: &mut ServiceConfig) {
        let ledger = InventoryLedger::new(self.db, self.catalog.clone()).with_config(self.config.clone());
        let orders = OrderStockApi::new(InventoryLedger::new(self.orders_db, self.catalog).with_config(self.config));
        cfg.app_data(web::Data::new(ledger))
            .app_data(web::Data::new(orders))
            .configure(configure_routes::<MockStockDb, ServerCatalog>);
    }
}

pub async fn get_request(path: &str, ledger: TestLedger) -> (StatusCode, String) {
    send(TestRequest::get().uri(path), ledger).await
}

pub async fn post_request(path: &str, body: &str, ledger: TestLedger) -> (StatusCode, String) {
    let req = TestRequest::post().uri(path).insert_header(("content-type", "application/json")).set_payload(body.to_string());
    send(req, ledger).await
}

async fn send(req: TestRequest, ledger: TestLedger) -> (StatusCode, String) {
    let app = App::new().configure(move |cfg| ledger.configure(cfg));
    let service = test::init_service(app).await;
    debug!("Making request");
    let res = test::call_service(&service, req.to_request()).await;
    let status = res.status();
    let body = String::from_utf8_lossy(&test::read_body(res).await).into_owned();
    (status, body)
}

pub fn timestamp() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 10, 18, 12, 0, 0).unwrap()
}

pub fn stock_record(sku: &str, on_hand: i64, reserved: i64, inbound: i64, outbound: i64) -> StockRecord {
    StockRecord {
        sku_id: SkuId::from(sku),
        qty_on_hand: Quantity::from(on_hand),
        qty_reserved: Quantity::from(reserved),
        qty_inbound: Quantity::from(inbound),
        qty_outbound: Quantity::from(outbound),
        created_at: timestamp(),
        updated_at: timestamp(),
    }
}

pub fn movement_record(id: i64, sku: &str, movement_type: MovementType, quantity: i64) -> MovementRecord {
    MovementRecord {
        id,
        sku_id: SkuId::from(sku),
        movement_type,
        quantity: Quantity::from(quantity),
        reference_type: None,
        reference_id: None,
        note: None,
        created_at: timestamp(),
    }
}

pub fn applied(record: StockRecord, movement: MovementRecord) -> AppliedMovement {
    AppliedMovement { record, movement }
}

pub fn json(body: &str) -> serde_json::Value {
    serde_json::from_str(body).unwrap_or_else(|e| panic!("Response is not JSON: {e}. {body}"))
}
