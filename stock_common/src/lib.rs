mod quantity;

pub mod helpers;
pub mod op;

pub use helpers::parse_boolean_flag;
pub use quantity::{Quantity, QuantityConversionError};
