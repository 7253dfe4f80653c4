use stock_ledger_engine::{db_types::SkuId, CatalogLookup, OpenCatalog, StaticCatalog, StockLedgerError};

/// The catalog the server runs with, chosen at startup from the configuration.
#[derive(Debug, Clone)]
pub enum ServerCatalog {
    /// Every SKU is accepted.
    Open,
    /// Only the listed SKUs are accepted.
    Fixed(StaticCatalog),
}

impl ServerCatalog {
    pub fn fixed<I: IntoIterator<Item = SkuId>>(skus: I) -> Self {
        Self::Fixed(StaticCatalog::new(skus))
    }
}

impl CatalogLookup for ServerCatalog {
    async fn sku_exists(&self, sku: &SkuId) -> Result<bool, StockLedgerError> {
        match self {
            Self::Open => OpenCatalog.sku_exists(sku).await,
            Self::Fixed(catalog) => catalog.sku_exists(sku).await,
        }
    }
}
