use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stock_ledger_engine::{
    db_types::{MovementMemo, MovementType, Quantity, SkuId, StockReference},
    movement_objects::{MovementQueryFilter, OrderLine},
};

use crate::errors::ServerError;

/// The body of the `POST /stock/{movement}` routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementRequest {
    pub sku: SkuId,
    pub quantity: Quantity,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub reference_type: Option<String>,
    #[serde(default)]
    pub reference_id: Option<String>,
}

impl MovementRequest {
    /// Collects the audit fields. A reference needs both a type and an id.
    pub fn memo(&self) -> Result<MovementMemo, ServerError> {
        let reference = match (&self.reference_type, &self.reference_id) {
            (Some(t), Some(id)) => Some(StockReference::new(t.as_str(), id.as_str())),
            (None, None) => None,
            _ => {
                return Err(ServerError::InvalidRequestBody(
                    "reference_type and reference_id must be supplied together".into(),
                ))
            },
        };
        Ok(MovementMemo { note: self.note.clone(), reference })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    pub order_id: String,
    pub lines: Vec<OrderLine>,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentRequest {
    pub shipment_id: String,
    pub lines: Vec<OrderLine>,
}

/// Query parameters for `GET /stock/{sku}/history`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryParams {
    /// A comma-separated list of movement types, e.g. `RESERVE,RELEASE`. Case does not matter.
    #[serde(rename = "type")]
    pub movement_type: Option<String>,
    pub reference_type: Option<String>,
    pub reference_id: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub limit: Option<u32>,
}

impl TryFrom<HistoryParams> for MovementQueryFilter {
    type Error = ServerError;

    fn try_from(params: HistoryParams) -> Result<Self, Self::Error> {
        let mut filter = MovementQueryFilter::default();
        if let Some(types) = params.movement_type {
            for t in types.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                let movement_type =
                    MovementType::from_str(t).map_err(|e| ServerError::InvalidRequestPath(e.to_string()))?;
                filter = filter.with_type(movement_type);
            }
        }
        filter = match (params.reference_type, params.reference_id) {
            (Some(t), Some(id)) => filter.with_reference(&StockReference::new(t, id)),
            (Some(t), None) => filter.with_reference_type(t),
            (None, Some(_)) => {
                return Err(ServerError::InvalidRequestPath("reference_id requires a reference_type".into()))
            },
            (None, None) => filter,
        };
        if let Some(since) = params.since {
            filter = filter.with_since(since);
        }
        if let Some(until) = params.until {
            filter = filter.with_until(until);
        }
        if let Some(limit) = params.limit {
            filter = filter.with_limit(limit);
        }
        Ok(filter)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LowStockParams {
    pub threshold: Option<i64>,
}
