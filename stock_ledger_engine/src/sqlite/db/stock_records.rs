use chrono::Utc;
use log::trace;
use sqlx::SqliteConnection;

use crate::{
    db_types::{SkuId, StockDelta, StockRecord},
    sqlite::SqliteDatabaseError,
};

/// Returns the stock record for `sku`, or `None` if the SKU has never had a movement.
pub async fn fetch_stock_record(
    sku: &SkuId,
    conn: &mut SqliteConnection,
) -> Result<Option<StockRecord>, SqliteDatabaseError> {
    let record = sqlx::query_as(
        r#"
            SELECT sku_id, qty_on_hand, qty_reserved, qty_inbound, qty_outbound, created_at, updated_at
            FROM stock_records
            WHERE sku_id = ?1
        "#,
    )
    .bind(sku)
    .fetch_optional(conn)
    .await?;
    Ok(record)
}

/// Inserts a zero-valued stock record for `sku` if one does not exist yet. Returns `true` if a record was created.
///
/// This is a write, so calling it first inside a transaction also takes SQLite's write lock up front. That way the
/// transaction waits on the busy timeout instead of failing when it later tries to upgrade a read lock.
pub async fn create_if_missing(sku: &SkuId, conn: &mut SqliteConnection) -> Result<bool, SqliteDatabaseError> {
    let now = Utc::now();
    let result = sqlx::query(
        r#"
            INSERT INTO stock_records (sku_id, created_at, updated_at) VALUES (?1, ?2, ?2)
            ON CONFLICT (sku_id) DO NOTHING
        "#,
    )
    .bind(sku)
    .bind(now)
    .execute(conn)
    .await?;
    let created = result.rows_affected() == 1;
    if created {
        trace!("🗃️ Created empty stock record for {sku}");
    }
    Ok(created)
}

/// Applies `delta` to the counters of `sku` in a single conditional statement.
///
/// The update only happens if neither `qty_on_hand` nor `qty_reserved` would go negative and no counter would
/// overflow. SQLite silently turns an overflowing integer sum into a REAL, so the overflow checks subtract from
/// `i64::MAX` instead of adding. Returns the updated record, or `None` if a guard rejected the update (or the record
/// does not exist). Because the check and the write are the same statement, no other writer can slip in between them.
pub async fn apply_delta(
    sku: &SkuId,
    delta: &StockDelta,
    conn: &mut SqliteConnection,
) -> Result<Option<StockRecord>, SqliteDatabaseError> {
    let now = Utc::now();
    let record = sqlx::query_as(
        r#"
            UPDATE stock_records SET
                qty_on_hand = qty_on_hand + ?1,
                qty_reserved = qty_reserved + ?2,
                qty_inbound = qty_inbound + ?3,
                qty_outbound = qty_outbound + ?4,
                updated_at = ?5
            WHERE sku_id = ?6
              AND qty_on_hand + ?1 >= 0
              AND qty_reserved + ?2 >= 0
              AND (?1 <= 0 OR qty_on_hand <= 9223372036854775807 - ?1)
              AND (?2 <= 0 OR qty_reserved <= 9223372036854775807 - ?2)
              AND qty_inbound <= 9223372036854775807 - ?3
              AND qty_outbound <= 9223372036854775807 - ?4
            RETURNING sku_id, qty_on_hand, qty_reserved, qty_inbound, qty_outbound, created_at, updated_at
        "#,
    )
    .bind(delta.on_hand)
    .bind(delta.reserved)
    .bind(delta.inbound)
    .bind(delta.outbound)
    .bind(now)
    .bind(sku)
    .fetch_optional(conn)
    .await?;
    Ok(record)
}

/// Fetches all stock records with `qty_on_hand` at or below `threshold`, lowest first.
pub async fn fetch_low_stock(threshold: i64, conn: &mut SqliteConnection) -> Result<Vec<StockRecord>, SqliteDatabaseError> {
    let records = sqlx::query_as(
        r#"
            SELECT sku_id, qty_on_hand, qty_reserved, qty_inbound, qty_outbound, created_at, updated_at
            FROM stock_records
            WHERE qty_on_hand <= ?1
            ORDER BY qty_on_hand ASC, sku_id ASC
        "#,
    )
    .bind(threshold)
    .fetch_all(conn)
    .await?;
    Ok(records)
}
