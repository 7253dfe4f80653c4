use chrono::Utc;
use log::trace;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{MovementRecord, NewMovement, SkuId},
    ledger_api::movement_objects::MovementQueryFilter,
    sqlite::SqliteDatabaseError,
};

/// Appends a movement to the log. This is not atomic with respect to the counter update. Embed this call inside a
/// transaction and pass `&mut *tx` as the connection argument.
pub async fn insert_movement(
    movement: &NewMovement,
    conn: &mut SqliteConnection,
) -> Result<MovementRecord, SqliteDatabaseError> {
    let (reference_type, reference_id) = match &movement.memo.reference {
        Some(r) => (Some(r.reference_type.as_str()), Some(r.reference_id.as_str())),
        None => (None, None),
    };
    let record = sqlx::query_as(
        r#"
            INSERT INTO stock_movements (sku_id, movement_type, quantity, reference_type, reference_id, note, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            RETURNING id, sku_id, movement_type, quantity, reference_type, reference_id, note, created_at
        "#,
    )
    .bind(&movement.sku_id)
    .bind(movement.movement_type)
    .bind(movement.quantity)
    .bind(reference_type)
    .bind(reference_id)
    .bind(movement.memo.note.as_deref())
    .bind(Utc::now())
    .fetch_one(conn)
    .await?;
    Ok(record)
}

/// Fetches movements for `sku` according to the criteria in the `MovementQueryFilter`.
///
/// Resulting movements are ordered newest first (by `id`, which strictly increases with insertion order).
pub async fn fetch_movements(
    sku: &SkuId,
    filter: &MovementQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<Vec<MovementRecord>, SqliteDatabaseError> {
    let mut builder = QueryBuilder::new(
        r#"
    SELECT id, sku_id, movement_type, quantity, reference_type, reference_id, note, created_at FROM stock_movements
    WHERE sku_id = "#,
    );
    builder.push_bind(sku.as_str());
    if !filter.movement_types().is_empty() {
        builder.push(" AND movement_type IN (");
        let mut types = builder.separated(", ");
        for t in filter.movement_types() {
            types.push_bind(t.to_string());
        }
        types.push_unseparated(")");
    }
    if let Some(reference_type) = filter.reference_type() {
        builder.push(" AND reference_type = ");
        builder.push_bind(reference_type.to_string());
    }
    if let Some(reference_id) = filter.reference_id() {
        builder.push(" AND reference_id = ");
        builder.push_bind(reference_id.to_string());
    }
    if let Some(since) = filter.since() {
        builder.push(" AND julianday(created_at) >= julianday(");
        builder.push_bind(since);
        builder.push(")");
    }
    if let Some(until) = filter.until() {
        builder.push(" AND julianday(created_at) < julianday(");
        builder.push_bind(until);
        builder.push(")");
    }
    builder.push(" ORDER BY id DESC");
    if let Some(limit) = filter.limit() {
        builder.push(" LIMIT ");
        builder.push_bind(i64::from(limit));
    }
    trace!("🗃️ Executing query: {}", builder.sql());
    let movements = builder.build_query_as::<MovementRecord>().fetch_all(conn).await?;
    trace!("🗃️ Result of fetch_movements: {} rows", movements.len());
    Ok(movements)
}
