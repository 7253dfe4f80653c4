use std::str::FromStr;

use cucumber::{then, when};
use stock_ledger_engine::{
    db_types::{MovementMemo, MovementRecord, MovementType, Quantity, SkuId, StockRecord, StockReference},
    movement_objects::{MovementQueryFilter, OrderLine},
    StockLedgerDatabase,
    StockLedgerError,
};

use crate::cucumber::StockWorld;

/// Parses order lines written as `"S1:2, S2:3"`.
fn parse_lines(lines: &str) -> Vec<OrderLine> {
    lines
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|line| {
            let (sku, qty) = line.split_once(':').expect("Order lines must look like SKU:QTY");
            OrderLine::new(sku.trim(), qty.trim().parse::<i64>().expect("Not a valid quantity"))
        })
        .collect()
}

async fn move_stock(
    world: &StockWorld,
    action: &str,
    quantity: i64,
    sku: &str,
    memo: MovementMemo,
) -> Result<StockRecord, StockLedgerError> {
    let ledger = world.ledger();
    let sku = SkuId::from(sku);
    let quantity = Quantity::from(quantity);
    match action {
        "receive" => ledger.inbound(&sku, quantity, memo).await,
        "ship" => ledger.outbound(&sku, quantity, memo).await,
        "reserve" => ledger.reserve(&sku, quantity, memo).await,
        "release" => ledger.release(&sku, quantity, memo).await,
        "adjust" => ledger.adjust(&sku, quantity, memo).await,
        other => panic!("Unknown stock action '{other}'"),
    }
}

async fn latest_movement(world: &StockWorld, sku: &str) -> MovementRecord {
    let filter = MovementQueryFilter::default().with_limit(1);
    let mut history = world.ledger().search_history(&SkuId::from(sku), filter).await.expect("Error fetching history");
    history.pop().unwrap_or_else(|| panic!("{sku} has no movements"))
}

#[when(expr = "I {word} {int} unit(s) of {word}")]
async fn perform_movement(world: &mut StockWorld, action: String, quantity: i64, sku: String) {
    move_stock(world, &action, quantity, &sku, MovementMemo::default())
        .await
        .unwrap_or_else(|e| panic!("Could not {action} {quantity} of {sku}. {e}"));
}

#[when(expr = "I {word} {int} unit(s) of {word} for {word} {word}")]
async fn perform_movement_with_reference(
    world: &mut StockWorld,
    action: String,
    quantity: i64,
    sku: String,
    ref_type: String,
    ref_id: String,
) {
    let memo = MovementMemo::reference(StockReference::new(ref_type, ref_id));
    move_stock(world, &action, quantity, &sku, memo)
        .await
        .unwrap_or_else(|e| panic!("Could not {action} {quantity} of {sku}. {e}"));
}

#[when(expr = "I adjust {word} by {int} with note {string}")]
async fn adjust_with_note(world: &mut StockWorld, sku: String, quantity: i64, note: String) {
    move_stock(world, "adjust", quantity, &sku, MovementMemo::note(note))
        .await
        .unwrap_or_else(|e| panic!("Could not adjust {sku} by {quantity}. {e}"));
}

#[when(expr = "I try to {word} {int} unit(s) of {word}")]
async fn attempt_movement(world: &mut StockWorld, action: String, quantity: i64, sku: String) {
    let result = move_stock(world, &action, quantity, &sku, MovementMemo::default()).await;
    world.last_attempt = Some(result.map(|r| vec![r]));
}

#[when(expr = "I try to adjust {word} by {int}")]
async fn attempt_adjustment(world: &mut StockWorld, sku: String, quantity: i64) {
    let result = move_stock(world, "adjust", quantity, &sku, MovementMemo::default()).await;
    world.last_attempt = Some(result.map(|r| vec![r]));
}

#[when(expr = "order {word} is placed for {string}")]
async fn place_order(world: &mut StockWorld, order_id: String, lines: String) {
    let lines = parse_lines(&lines);
    world.orders().place_order(&order_id, &lines, None).await.expect("Error placing order");
}

#[when(expr = "I try to place order {word} for {string}")]
async fn attempt_order(world: &mut StockWorld, order_id: String, lines: String) {
    let lines = parse_lines(&lines);
    world.last_attempt = Some(world.orders().place_order(&order_id, &lines, None).await);
}

#[when(expr = "order {word} is cancelled for {string}")]
async fn cancel_order(world: &mut StockWorld, order_id: String, lines: String) {
    let lines = parse_lines(&lines);
    world.orders().cancel_order(&order_id, &lines).await.expect("Error cancelling order");
}

#[when(expr = "shipment {word} is dispatched for {string}")]
async fn dispatch_shipment(world: &mut StockWorld, shipment_id: String, lines: String) {
    let lines = parse_lines(&lines);
    world.orders().dispatch_shipment(&shipment_id, &lines).await.expect("Error dispatching shipment");
}

#[then(expr = "{word} has {int} on hand and {int} reserved")]
async fn check_levels(world: &mut StockWorld, sku: String, on_hand: i64, reserved: i64) {
    let record = world.ledger().current_level(&SkuId::from(sku.as_str())).await.expect("Error fetching level");
    assert_eq!(record.qty_on_hand, Quantity::from(on_hand), "On-hand quantity of {sku} is incorrect");
    assert_eq!(record.qty_reserved, Quantity::from(reserved), "Reserved quantity of {sku} is incorrect");
}

#[then(expr = "{word} has received {int} and shipped {int} in total")]
async fn check_journals(world: &mut StockWorld, sku: String, inbound: i64, outbound: i64) {
    let record = world.ledger().current_level(&SkuId::from(sku.as_str())).await.expect("Error fetching level");
    assert_eq!(record.qty_inbound, Quantity::from(inbound), "Inbound total of {sku} is incorrect");
    assert_eq!(record.qty_outbound, Quantity::from(outbound), "Outbound total of {sku} is incorrect");
}

#[then(expr = "{word} has no stock record")]
async fn check_no_record(world: &mut StockWorld, sku: String) {
    let record = world.ledger().db().fetch_stock_record(&SkuId::from(sku.as_str())).await.expect("Error fetching record");
    assert!(record.is_none(), "{sku} should not have a stock record, but has {record:?}");
}

#[then(expr = "{word} has {int} movement(s)")]
async fn check_movement_count(world: &mut StockWorld, sku: String, count: usize) {
    let history = world.ledger().history(&SkuId::from(sku.as_str()), None).await.expect("Error fetching history");
    assert_eq!(history.len(), count, "Unexpected number of movements for {sku}: {history:?}");
}

#[then(expr = "{word} has {int} {word} movement(s)")]
async fn check_typed_movement_count(world: &mut StockWorld, sku: String, count: usize, movement_type: String) {
    let movement_type = MovementType::from_str(&movement_type).expect("Not a valid movement type");
    let history =
        world.ledger().history(&SkuId::from(sku.as_str()), Some(movement_type)).await.expect("Error fetching history");
    assert_eq!(history.len(), count, "Unexpected number of {movement_type} movements for {sku}");
    assert!(history.iter().all(|m| m.movement_type == movement_type));
}

#[then(expr = "the latest movement for {word} is {word} of {int}")]
async fn check_latest_movement(world: &mut StockWorld, sku: String, movement_type: String, quantity: i64) {
    let movement = latest_movement(world, &sku).await;
    let movement_type = MovementType::from_str(&movement_type).expect("Not a valid movement type");
    assert_eq!(movement.movement_type, movement_type);
    assert_eq!(movement.quantity, Quantity::from(quantity));
}

#[then(expr = "the latest movement for {word} has note {string}")]
async fn check_latest_note(world: &mut StockWorld, sku: String, note: String) {
    let movement = latest_movement(world, &sku).await;
    assert_eq!(movement.note.as_deref(), Some(note.as_str()));
}

#[then(expr = "the latest movement for {word} refers to {word} {word}")]
async fn check_latest_reference(world: &mut StockWorld, sku: String, ref_type: String, ref_id: String) {
    let movement = latest_movement(world, &sku).await;
    assert_eq!(movement.reference_type.as_deref(), Some(ref_type.as_str()));
    assert_eq!(movement.reference_id.as_deref(), Some(ref_id.as_str()));
}

#[then(expr = "{word} has {int} movement(s) for {word} {word}")]
async fn check_referenced_movements(world: &mut StockWorld, sku: String, count: usize, ref_type: String, ref_id: String) {
    let filter = MovementQueryFilter::default().with_reference(&StockReference::new(ref_type, ref_id));
    let history = world.ledger().search_history(&SkuId::from(sku.as_str()), filter).await.expect("Error fetching history");
    assert_eq!(history.len(), count, "Unexpected number of referenced movements for {sku}: {history:?}");
}

#[then(expr = "the attempt fails because only {int} unit(s) of {word} is/are available")]
async fn check_insufficient(world: &mut StockWorld, available: i64, sku: String) {
    match world.last_error() {
        StockLedgerError::InsufficientStock { sku: s, available: a, .. } => {
            assert_eq!(s.as_str(), sku);
            assert_eq!(*a, Quantity::from(available));
        },
        e => panic!("Expected InsufficientStock, got {e:?}"),
    }
}

#[then(expr = "the attempt fails because {word} is unknown")]
async fn check_unknown(world: &mut StockWorld, sku: String) {
    assert_eq!(world.last_error(), &StockLedgerError::UnknownSku(SkuId::from(sku.as_str())));
}

#[then(expr = "the attempt fails with an invalid quantity of {int}")]
async fn check_invalid_quantity(world: &mut StockWorld, quantity: i64) {
    assert_eq!(world.last_error(), &StockLedgerError::InvalidQuantity(quantity));
}

#[then(expr = "{word} reconciles with a net adjustment of {int}")]
async fn check_reconciles(world: &mut StockWorld, sku: String, net_adjustment: i64) {
    let report = world.ledger().reconcile(&SkuId::from(sku.as_str())).await.expect("Error reconciling");
    assert!(report.is_healthy(), "{sku} does not reconcile: {report:?}");
    assert_eq!(report.net_adjustment, Quantity::from(net_adjustment));
}
