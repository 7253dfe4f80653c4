use std::{collections::HashSet, sync::Arc};

use crate::{db_types::SkuId, traits::StockLedgerError};

/// The ledger's view of the product catalog.
///
/// The catalog is only asked about SKUs that have no stock record yet. Once a record exists, the SKU is known to the
/// ledger for good.
#[allow(async_fn_in_trait)]
pub trait CatalogLookup: Clone {
    async fn sku_exists(&self, sku: &SkuId) -> Result<bool, StockLedgerError>;
}

/// A catalog that confirms every SKU. Useful when the catalog lives elsewhere and stock is only ever received for real
/// products.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenCatalog;

impl CatalogLookup for OpenCatalog {
    async fn sku_exists(&self, _sku: &SkuId) -> Result<bool, StockLedgerError> {
        Ok(true)
    }
}

/// A catalog backed by a fixed set of SKUs.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    skus: Arc<HashSet<SkuId>>,
}

impl StaticCatalog {
    pub fn new<I, S>(skus: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SkuId>,
    {
        let skus = skus.into_iter().map(Into::into).collect();
        Self { skus: Arc::new(skus) }
    }

    pub fn len(&self) -> usize {
        self.skus.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skus.is_empty()
    }
}

impl CatalogLookup for StaticCatalog {
    async fn sku_exists(&self, sku: &SkuId) -> Result<bool, StockLedgerError> {
        Ok(self.skus.contains(sku))
    }
}
