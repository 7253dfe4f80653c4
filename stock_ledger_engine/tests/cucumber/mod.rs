mod steps;
mod stock_world;

pub use stock_world::StockWorld;
