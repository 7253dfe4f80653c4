use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
pub use stock_common::Quantity;
use thiserror::Error;

//--------------------------------------        SkuId          ---------------------------------------------------------
/// Opaque stock-keeping unit identifier. The ledger never interprets its contents.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct SkuId(pub String);

impl SkuId {
    pub fn new<S: Into<String>>(sku: S) -> Self {
        Self(sku.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// A SKU id must contain at least one non-whitespace character.
    pub fn is_valid(&self) -> bool {
        !self.0.trim().is_empty()
    }
}

impl FromStr for SkuId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for SkuId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SkuId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for SkuId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------     MovementType      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum MovementType {
    /// Stock received from outside the system.
    Inbound,
    /// Stock shipped or sold out of the system.
    Outbound,
    /// Stock committed to a pending order.
    Reserve,
    /// A reservation returned to on-hand stock.
    Release,
    /// A manual, signed correction to on-hand stock (shrinkage, recount).
    Adjust,
}

impl MovementType {
    /// The change this movement makes to a SKU's counters. This is the whole per-SKU state machine:
    ///
    /// | Type     | on_hand | reserved | inbound | outbound |
    /// |----------|---------|----------|---------|----------|
    /// | Inbound  | +q      |          | +q      |          |
    /// | Outbound | -q      |          |         | +q       |
    /// | Reserve  | -q      | +q       |         |          |
    /// | Release  | +q      | -q       |         |          |
    /// | Adjust   | +q      |          |         |          |
    pub fn delta(&self, quantity: Quantity) -> StockDelta {
        let zero = Quantity::ZERO;
        match self {
            MovementType::Inbound => StockDelta::new(quantity, zero, quantity, zero),
            MovementType::Outbound => StockDelta::new(-quantity, zero, zero, quantity),
            MovementType::Reserve => StockDelta::new(-quantity, quantity, zero, zero),
            MovementType::Release => StockDelta::new(quantity, -quantity, zero, zero),
            MovementType::Adjust => StockDelta::new(quantity, zero, zero, zero),
        }
    }

    /// Only `Adjust` movements may carry a negative quantity.
    pub fn is_signed(&self) -> bool {
        matches!(self, MovementType::Adjust)
    }
}

impl Display for MovementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MovementType::Inbound => write!(f, "INBOUND"),
            MovementType::Outbound => write!(f, "OUTBOUND"),
            MovementType::Reserve => write!(f, "RESERVE"),
            MovementType::Release => write!(f, "RELEASE"),
            MovementType::Adjust => write!(f, "ADJUST"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid movement type: {0}")]
pub struct ConversionError(String);

impl FromStr for MovementType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "INBOUND" => Ok(Self::Inbound),
            "OUTBOUND" => Ok(Self::Outbound),
            "RESERVE" => Ok(Self::Reserve),
            "RELEASE" => Ok(Self::Release),
            "ADJUST" => Ok(Self::Adjust),
            _ => Err(ConversionError(s.to_string())),
        }
    }
}

//--------------------------------------      StockDelta       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StockDelta {
    pub on_hand: Quantity,
    pub reserved: Quantity,
    pub inbound: Quantity,
    pub outbound: Quantity,
}

impl StockDelta {
    pub fn new(on_hand: Quantity, reserved: Quantity, inbound: Quantity, outbound: Quantity) -> Self {
        Self { on_hand, reserved, inbound, outbound }
    }
}

//--------------------------------------      StockLevels      ---------------------------------------------------------
/// The four stock counters of a SKU, without any bookkeeping fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevels {
    pub qty_on_hand: Quantity,
    pub qty_reserved: Quantity,
    pub qty_inbound: Quantity,
    pub qty_outbound: Quantity,
}

impl StockLevels {
    pub fn apply(&self, delta: &StockDelta) -> Self {
        Self {
            qty_on_hand: self.qty_on_hand + delta.on_hand,
            qty_reserved: self.qty_reserved + delta.reserved,
            qty_inbound: self.qty_inbound + delta.inbound,
            qty_outbound: self.qty_outbound + delta.outbound,
        }
    }

    /// Like [`StockLevels::apply`], but returns `None` if any counter would overflow.
    pub fn checked_apply(&self, delta: &StockDelta) -> Option<Self> {
        Some(Self {
            qty_on_hand: self.qty_on_hand.checked_add(delta.on_hand)?,
            qty_reserved: self.qty_reserved.checked_add(delta.reserved)?,
            qty_inbound: self.qty_inbound.checked_add(delta.inbound)?,
            qty_outbound: self.qty_outbound.checked_add(delta.outbound)?,
        })
    }

    /// True if no counter is negative.
    pub fn is_valid(&self) -> bool {
        [self.qty_on_hand, self.qty_reserved, self.qty_inbound, self.qty_outbound].iter().all(|q| !q.is_negative())
    }

    /// Checks `on_hand + reserved == inbound - outbound + net_adjustment`. Pass `Quantity::ZERO` as the adjustment
    /// for SKUs that have never been adjusted.
    pub fn is_conserved(&self, net_adjustment: Quantity) -> bool {
        self.qty_on_hand + self.qty_reserved == self.qty_inbound - self.qty_outbound + net_adjustment
    }

    /// Rebuilds the counters from a movement log. Ordering does not matter since every transition is additive.
    /// Returns the levels along with the net sum of all `ADJUST` quantities.
    pub fn replay<'a, I>(movements: I) -> (Self, Quantity)
    where I: IntoIterator<Item = &'a MovementRecord> {
        movements.into_iter().fold((Self::default(), Quantity::ZERO), |(levels, adjusted), m| {
            let adjusted = match m.movement_type {
                MovementType::Adjust => adjusted + m.quantity,
                _ => adjusted,
            };
            (levels.apply(&m.movement_type.delta(m.quantity)), adjusted)
        })
    }
}

impl Display for StockLevels {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "on hand: {}, reserved: {}, inbound: {}, outbound: {}",
            self.qty_on_hand.value(),
            self.qty_reserved.value(),
            self.qty_inbound.value(),
            self.qty_outbound.value()
        )
    }
}

//--------------------------------------      StockRecord      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct StockRecord {
    pub sku_id: SkuId,
    pub qty_on_hand: Quantity,
    pub qty_reserved: Quantity,
    pub qty_inbound: Quantity,
    pub qty_outbound: Quantity,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StockRecord {
    /// A zero-valued record for a SKU that has never had a movement. This is never persisted by itself.
    pub fn empty(sku_id: SkuId) -> Self {
        let now = Utc::now();
        Self {
            sku_id,
            qty_on_hand: Quantity::ZERO,
            qty_reserved: Quantity::ZERO,
            qty_inbound: Quantity::ZERO,
            qty_outbound: Quantity::ZERO,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn levels(&self) -> StockLevels {
        StockLevels {
            qty_on_hand: self.qty_on_hand,
            qty_reserved: self.qty_reserved,
            qty_inbound: self.qty_inbound,
            qty_outbound: self.qty_outbound,
        }
    }
}

//--------------------------------------     MovementRecord    ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct MovementRecord {
    pub id: i64,
    pub sku_id: SkuId,
    pub movement_type: MovementType,
    pub quantity: Quantity,
    pub reference_type: Option<String>,
    pub reference_id: Option<String>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------     StockReference    ---------------------------------------------------------
/// A free-form pointer to the business event that caused a movement, e.g. `("order", "O1")`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockReference {
    pub reference_type: String,
    pub reference_id: String,
}

impl StockReference {
    pub fn new<T: Into<String>, I: Into<String>>(reference_type: T, reference_id: I) -> Self {
        Self { reference_type: reference_type.into(), reference_id: reference_id.into() }
    }

    pub fn order<I: Into<String>>(order_id: I) -> Self {
        Self::new("order", order_id)
    }

    pub fn shipment<I: Into<String>>(shipment_id: I) -> Self {
        Self::new("shipment", shipment_id)
    }
}

impl Display for StockReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.reference_type, self.reference_id)
    }
}

//--------------------------------------      MovementMemo     ---------------------------------------------------------
/// The optional audit fields that accompany a movement request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementMemo {
    pub note: Option<String>,
    pub reference: Option<StockReference>,
}

impl MovementMemo {
    pub fn note<S: Into<String>>(note: S) -> Self {
        Self { note: Some(note.into()), reference: None }
    }

    pub fn reference(reference: StockReference) -> Self {
        Self { note: None, reference: Some(reference) }
    }

    pub fn with_note<S: Into<String>>(mut self, note: S) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn with_reference(mut self, reference: StockReference) -> Self {
        self.reference = Some(reference);
        self
    }
}

//--------------------------------------      NewMovement      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMovement {
    pub sku_id: SkuId,
    pub movement_type: MovementType,
    pub quantity: Quantity,
    #[serde(default)]
    pub memo: MovementMemo,
}

impl NewMovement {
    pub fn new(sku_id: SkuId, movement_type: MovementType, quantity: Quantity) -> Self {
        Self { sku_id, movement_type, quantity, memo: MovementMemo::default() }
    }

    pub fn with_memo(mut self, memo: MovementMemo) -> Self {
        self.memo = memo;
        self
    }

    pub fn with_note<S: Into<String>>(mut self, note: S) -> Self {
        self.memo.note = Some(note.into());
        self
    }

    pub fn with_reference(mut self, reference: StockReference) -> Self {
        self.memo.reference = Some(reference);
        self
    }

    pub fn delta(&self) -> StockDelta {
        self.movement_type.delta(self.quantity)
    }
}

//--------------------------------------     AppliedMovement   ---------------------------------------------------------
/// The result of a successful movement: the new counters and the log entry that records the change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedMovement {
    pub record: StockRecord,
    pub movement: MovementRecord,
}
