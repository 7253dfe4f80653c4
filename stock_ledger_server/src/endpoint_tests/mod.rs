mod helpers;
mod mocks;
mod stock;
