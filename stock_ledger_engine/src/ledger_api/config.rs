use std::time::Duration;

use stock_common::Quantity;

const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_MAX_RETRIES: u32 = 5;
const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(20);

/// Tuning knobs for the ledger's concurrency control.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// The longest a caller waits for exclusive access to the SKUs it wants to move. Exceeding it yields
    /// `StockLedgerError::Timeout`.
    pub lock_timeout: Duration,
    /// How many times a transaction that failed because the database was busy is retried before giving up with
    /// `StockLedgerError::Contention`.
    pub max_retries: u32,
    /// The delay before retry `n` is `n * retry_backoff`.
    pub retry_backoff: Duration,
    /// If set, a `LowStockEvent` is published whenever on-hand stock falls to or below this level.
    pub low_stock_threshold: Option<Quantity>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
            low_stock_threshold: None,
        }
    }
}

impl LedgerConfig {
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    pub fn with_low_stock_threshold(mut self, threshold: Quantity) -> Self {
        self.low_stock_threshold = Some(threshold);
        self
    }
}
