//! Per-SKU write serialization.
//!
//! Every mutation of a SKU's stock happens while holding that SKU's lock, so two concurrent requests can never both
//! pass a stock check that only one of them can satisfy. Different SKUs have different locks and never block each
//! other.
//!
//! Locks for several SKUs are always taken in sorted order. Two batches touching overlapping SKU sets therefore cannot
//! deadlock, and the shared deadline means a caller never waits longer than the configured timeout in total.
use std::{
    collections::{BTreeSet, HashMap},
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use log::*;
use tokio::{
    sync::{Mutex as AsyncMutex, OwnedMutexGuard},
    time::{timeout_at, Instant},
};

use crate::{db_types::SkuId, traits::StockLedgerError};

/// Idle lock entries are swept once the registry grows past this many SKUs.
const PRUNE_THRESHOLD: usize = 1024;

type LockMap = HashMap<SkuId, Arc<AsyncMutex<()>>>;

#[derive(Clone, Default)]
pub struct SkuLocks {
    locks: Arc<Mutex<LockMap>>,
}

/// Holds the locks for a set of SKUs. The locks are released when this is dropped.
#[must_use = "the SKU locks are released as soon as the guard is dropped"]
pub struct SkuGuards {
    guards: Vec<OwnedMutexGuard<()>>,
}

impl SkuGuards {
    pub fn len(&self) -> usize {
        self.guards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }
}

impl SkuLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the locks for every SKU in `skus` (duplicates are ignored), waiting at most `timeout` in total.
    pub async fn acquire<'a, I>(&self, skus: I, timeout: Duration) -> Result<SkuGuards, StockLedgerError>
    where I: IntoIterator<Item = &'a SkuId> {
        let ordered: BTreeSet<&SkuId> = skus.into_iter().collect();
        let deadline = Instant::now() + timeout;
        let mut guards = Vec::with_capacity(ordered.len());
        for sku in ordered {
            let lock = self.lock_for(sku);
            match timeout_at(deadline, lock.lock_owned()).await {
                Ok(guard) => guards.push(guard),
                Err(_) => {
                    warn!("📦️ Timed out after {timeout:?} waiting for the lock on {sku}");
                    return Err(StockLedgerError::Timeout(sku.clone()));
                },
            }
        }
        Ok(SkuGuards { guards })
    }

    /// The number of SKUs currently tracked by the registry.
    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock_for(&self, sku: &SkuId) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if locks.len() >= PRUNE_THRESHOLD {
            // An entry referenced only by the map is neither held nor awaited by anyone.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            trace!("📦️ Pruned SKU lock registry down to {} entries", locks.len());
        }
        locks.entry(sku.clone()).or_default().clone()
    }
}
