use std::{env, str::FromStr, time::Duration};

use log::*;
use stock_common::{parse_boolean_flag, Quantity};
use stock_ledger_engine::{db_types::SkuId, LedgerConfig};

use crate::catalog::ServerCatalog;

const DEFAULT_STOCK_HOST: &str = "127.0.0.1";
const DEFAULT_STOCK_PORT: u16 = 8370;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/stock_ledger.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 25;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub max_connections: u32,
    /// If true, pending database migrations are applied when the server starts.
    pub run_migrations: bool,
    /// Concurrency and alerting settings for the ledger.
    pub ledger: LedgerConfig,
    /// The SKUs that exist. `None` means every SKU is accepted.
    pub catalog_skus: Option<Vec<SkuId>>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_STOCK_HOST.to_string(),
            port: DEFAULT_STOCK_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            run_migrations: true,
            ledger: LedgerConfig::default(),
            catalog_skus: None,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let defaults = Self::default();
        let host = env::var("STOCK_HOST").ok().unwrap_or(defaults.host);
        let port = parse_env("STOCK_PORT", defaults.port);
        let database_url = env::var("STOCK_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ STOCK_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            defaults.database_url
        });
        let max_connections = parse_env("STOCK_DB_MAX_CONNECTIONS", defaults.max_connections);
        let run_migrations = parse_boolean_flag(env::var("STOCK_RUN_MIGRATIONS").ok(), true);
        let ledger = ledger_config_from_env(defaults.ledger);
        let catalog_skus = env::var("STOCK_CATALOG_SKUS").ok().map(|s| parse_sku_list(&s));
        if let Some(skus) = &catalog_skus {
            info!("🪛️ Stock will only be accepted for the {} SKUs listed in STOCK_CATALOG_SKUS", skus.len());
        }
        Self { host, port, database_url, max_connections, run_migrations, ledger, catalog_skus }
    }

    /// The catalog that decides whether stock may be recorded for a SKU the ledger has not seen before.
    pub fn catalog(&self) -> ServerCatalog {
        match &self.catalog_skus {
            Some(skus) => ServerCatalog::fixed(skus.iter().cloned()),
            None => ServerCatalog::Open,
        }
    }
}

fn ledger_config_from_env(defaults: LedgerConfig) -> LedgerConfig {
    let lock_timeout = parse_env("STOCK_LOCK_TIMEOUT_MS", defaults.lock_timeout.as_millis() as u64);
    let max_retries = parse_env("STOCK_MAX_RETRIES", defaults.max_retries);
    let retry_backoff = parse_env("STOCK_RETRY_BACKOFF_MS", defaults.retry_backoff.as_millis() as u64);
    let mut config = defaults
        .with_lock_timeout(Duration::from_millis(lock_timeout))
        .with_max_retries(max_retries)
        .with_retry_backoff(Duration::from_millis(retry_backoff));
    if let Ok(s) = env::var("STOCK_LOW_STOCK_THRESHOLD") {
        match s.parse::<i64>() {
            Ok(v) if v >= 0 => config = config.with_low_stock_threshold(Quantity::from(v)),
            _ => error!("🪛️ {s} is not a valid value for STOCK_LOW_STOCK_THRESHOLD. Low-stock alerts are disabled."),
        }
    }
    config
}

/// Reads and parses an environment variable, falling back to `default` (with a complaint) if the value is invalid.
fn parse_env<T>(name: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(s) => s.trim().parse::<T>().unwrap_or_else(|e| {
            error!("🪛️ {s} is not a valid value for {name}. {e} Using the default, {default}, instead.");
            default
        }),
        Err(_) => default,
    }
}

fn parse_sku_list(s: &str) -> Vec<SkuId> {
    s.split(',').map(str::trim).filter(|s| !s.is_empty()).map(SkuId::from).collect()
}
