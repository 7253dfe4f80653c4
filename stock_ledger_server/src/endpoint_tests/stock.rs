use std::time::Duration;

use actix_web::http::StatusCode;
use stock_ledger_engine::{
    db_types::{MovementType, NewMovement, Quantity, SkuId},
    LedgerConfig,
    StockLedgerError,
};

use super::helpers::{applied, get_request, json, movement_record, post_request, stock_record, TestLedger};
use crate::catalog::ServerCatalog;

#[actix_web::test]
async fn inbound_for_a_new_sku() {
    let _ = env_logger::try_init().ok();
    let mut ledger = TestLedger::default();
    ledger.db.expect_fetch_stock_record().returning(|_| Ok(None));
    ledger
        .db
        .expect_apply_movements()
        .withf(|m: &[NewMovement]| {
            m.len() == 1 &&
                m[0].movement_type == MovementType::Inbound &&
                m[0].quantity == Quantity::from(50) &&
                m[0].memo.note.as_deref() == Some("PO-1138")
        })
        .times(1)
        .returning(|_| Ok(vec![applied(stock_record("S1", 50, 0, 50, 0), movement_record(1, "S1", MovementType::Inbound, 50))]));
    let (status, body) =
        post_request("/stock/inbound", r#"{"sku":"S1","quantity":50,"note":"PO-1138"}"#, ledger).await;
    assert_eq!(status, StatusCode::OK);
    let record = json(&body);
    assert_eq!(record["sku_id"], "S1");
    assert_eq!(record["qty_on_hand"], 50);
    assert_eq!(record["qty_inbound"], 50);
}

#[actix_web::test]
async fn reserve_with_reference() {
    let _ = env_logger::try_init().ok();
    let mut ledger = TestLedger::default();
    ledger.db.expect_fetch_stock_record().returning(|_| Ok(Some(stock_record("S1", 50, 0, 50, 0))));
    ledger
        .db
        .expect_apply_movements()
        .withf(|m: &[NewMovement]| {
            let reference = m[0].memo.reference.as_ref();
            m[0].movement_type == MovementType::Reserve &&
                reference.map(|r| (r.reference_type.as_str(), r.reference_id.as_str())) == Some(("order", "O1"))
        })
        .returning(|_| Ok(vec![applied(stock_record("S1", 40, 10, 50, 0), movement_record(2, "S1", MovementType::Reserve, 10))]));
    let body = r#"{"sku":"S1","quantity":10,"reference_type":"order","reference_id":"O1"}"#;
    let (status, body) = post_request("/stock/reserve", body, ledger).await;
    assert_eq!(status, StatusCode::OK);
    let record = json(&body);
    assert_eq!(record["qty_on_hand"], 40);
    assert_eq!(record["qty_reserved"], 10);
}

#[actix_web::test]
async fn reserve_more_than_on_hand() {
    let _ = env_logger::try_init().ok();
    let mut ledger = TestLedger::default();
    ledger.db.expect_fetch_stock_record().returning(|_| Ok(Some(stock_record("S1", 40, 10, 50, 0))));
    ledger.db.expect_apply_movements().returning(|_| {
        Err(StockLedgerError::InsufficientStock {
            sku: SkuId::from("S1"),
            requested: Quantity::from(1000),
            available: Quantity::from(40),
        })
    });
    let (status, body) = post_request("/stock/reserve", r#"{"sku":"S1","quantity":1000}"#, ledger).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json(&body)["error"], "Insufficient stock for S1. Requested 1000 units, but only 40 units available");
}

#[actix_web::test]
async fn invalid_quantities_never_reach_the_database() {
    let _ = env_logger::try_init().ok();
    for (path, body) in [
        ("/stock/reserve", r#"{"sku":"S1","quantity":0}"#),
        ("/stock/outbound", r#"{"sku":"S1","quantity":-2}"#),
        ("/stock/adjust", r#"{"sku":"S1","quantity":0}"#),
        ("/stock/adjust", r#"{"sku":"S1","quantity":-9223372036854775808}"#),
    ] {
        let (status, body) = post_request(path, body, TestLedger::default()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{path}: {body}");
    }
    let (status, _) = post_request("/stock/inbound", r#"{"sku":"   ","quantity":5}"#, TestLedger::default()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn malformed_requests() {
    let _ = env_logger::try_init().ok();
    let (status, _) = post_request("/stock/inbound", r#"{"sku":"S1"}"#, TestLedger::default()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body = r#"{"sku":"S1","quantity":5,"reference_id":"O1"}"#;
    let (status, body) = post_request("/stock/reserve", body, TestLedger::default()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("reference_type and reference_id must be supplied together"));
}

#[actix_web::test]
async fn unknown_sku() {
    let _ = env_logger::try_init().ok();
    let mut ledger = TestLedger { catalog: ServerCatalog::fixed(["S1".into()]), ..Default::default() };
    ledger.db.expect_fetch_stock_record().returning(|_| Ok(None));
    let (status, body) = post_request("/stock/inbound", r#"{"sku":"S9","quantity":5}"#, ledger).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json(&body)["error"], "SKU S9 is not known to the catalog");
}

#[actix_web::test]
async fn busy_database_is_retried_then_reported() {
    let _ = env_logger::try_init().ok();
    let config = LedgerConfig::default().with_max_retries(2).with_retry_backoff(Duration::from_millis(1));
    let mut ledger = TestLedger { config, ..Default::default() };
    ledger.db.expect_fetch_stock_record().returning(|_| Ok(Some(stock_record("S1", 5, 0, 5, 0))));
    ledger.db.expect_apply_movements().times(3).returning(|_| Err(StockLedgerError::Contention(SkuId::from("S1"))));
    let (status, _) = post_request("/stock/outbound", r#"{"sku":"S1","quantity":1}"#, ledger).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[actix_web::test]
async fn level_of_a_sku_that_never_moved() {
    let _ = env_logger::try_init().ok();
    let mut ledger = TestLedger::default();
    ledger.db.expect_fetch_stock_record().returning(|_| Ok(None));
    let (status, body) = get_request("/stock/S7", ledger).await;
    assert_eq!(status, StatusCode::OK);
    let record = json(&body);
    assert_eq!(record["sku_id"], "S7");
    for counter in ["qty_on_hand", "qty_reserved", "qty_inbound", "qty_outbound"] {
        assert_eq!(record[counter], 0);
    }
}

#[actix_web::test]
async fn history_by_type() {
    let _ = env_logger::try_init().ok();
    let mut ledger = TestLedger::default();
    ledger
        .db
        .expect_fetch_movements()
        .withf(|sku, filter| {
            sku.as_str() == "S1" && filter.movement_types() == [MovementType::Reserve] && filter.limit() == Some(5)
        })
        .returning(|_, _| Ok(vec![movement_record(2, "S1", MovementType::Reserve, 10)]));
    let (status, body) = get_request("/stock/S1/history?type=reserve&limit=5", ledger).await;
    assert_eq!(status, StatusCode::OK);
    let history = json(&body);
    assert_eq!(history.as_array().map(|a| a.len()), Some(1));
    assert_eq!(history[0]["movement_type"], "RESERVE");
    assert_eq!(history[0]["quantity"], 10);

    let (status, _) = get_request("/stock/S1/history?type=restock", TestLedger::default()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn reconcile_a_sku() {
    let _ = env_logger::try_init().ok();
    let mut ledger = TestLedger::default();
    ledger.db.expect_fetch_stock_record().returning(|_| Ok(Some(stock_record("S1", 37, 10, 50, 0))));
    ledger.db.expect_fetch_movements().returning(|_, _| {
        Ok(vec![
            movement_record(3, "S1", MovementType::Adjust, -3),
            movement_record(2, "S1", MovementType::Reserve, 10),
            movement_record(1, "S1", MovementType::Inbound, 50),
        ])
    });
    let (status, body) = get_request("/stock/S1/reconcile", ledger).await;
    assert_eq!(status, StatusCode::OK);
    let report = json(&body);
    assert_eq!(report["consistent"], true);
    assert_eq!(report["conserved"], true);
    assert_eq!(report["net_adjustment"], -3);
    assert_eq!(report["movement_count"], 3);
}

#[actix_web::test]
async fn low_stock_uses_configured_threshold() {
    let _ = env_logger::try_init().ok();
    let config = LedgerConfig::default().with_low_stock_threshold(Quantity::from(3));
    let mut ledger = TestLedger { config, ..Default::default() };
    ledger
        .db
        .expect_fetch_low_stock()
        .withf(|threshold| *threshold == Quantity::from(3))
        .returning(|_| Ok(vec![stock_record("S2", 1, 0, 4, 3)]));
    let (status, body) = get_request("/stock/low", ledger).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)[0]["sku_id"], "S2");

    let (status, _) = get_request("/stock/low?threshold=-1", TestLedger::default()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
