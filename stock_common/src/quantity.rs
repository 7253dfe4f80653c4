use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

//--------------------------------------       Quantity       ---------------------------------------------------------
/// A whole number of stock units.
///
/// Stock counters are never negative, but a `Quantity` may be: `ADJUST` movements carry a signed quantity, and
/// intermediate deltas during replay can dip below zero.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Quantity(i64);

op!(binary Quantity, Add, add);
op!(binary Quantity, Sub, sub);
op!(inplace Quantity, AddAssign, add_assign);
op!(inplace Quantity, SubAssign, sub_assign);
op!(unary Quantity, Neg, neg);

impl Sum for Quantity {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented as a stock quantity: {0}")]
pub struct QuantityConversionError(String);

impl From<i64> for Quantity {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl TryFrom<u64> for Quantity {
    type Error = QuantityConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        i64::try_from(value)
            .map(Self)
            .map_err(|_| QuantityConversionError(format!("{value} is too large to convert to a Quantity")))
    }
}

impl Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0.unsigned_abs() {
            1 => write!(f, "{} unit", self.0),
            _ => write!(f, "{} units", self.0),
        }
    }
}

impl Quantity {
    pub const ZERO: Quantity = Quantity(0);

    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Adds `rhs`, returning `None` if the result overflows an `i64`.
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// Negates the quantity, clamping `i64::MIN` to `i64::MAX`.
    pub fn saturating_neg(self) -> Self {
        Self(self.0.saturating_neg())
    }
}
