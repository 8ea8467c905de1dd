//! Per-SKU advisory locks for mutating sequences.
//!
//! At most one mutating sequence (option save/delete, matrix
//! reconciliation, stock writes, template application) may run per SKU.
//! A second attempt fails fast with [`CoreError::Conflict`] instead of
//! queueing. Reads never consult these locks.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::error::CoreError;

/// Shared map of SKUs with an in-flight mutation, keyed by SKU and holding
/// the name of the operation that owns the lock.
///
/// Cheaply cloneable; every clone observes the same map.
#[derive(Debug, Clone, Default)]
pub struct SkuLocks {
    held: Arc<DashMap<String, &'static str>>,
}

impl SkuLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to take the lock for `sku` on behalf of `operation`.
    ///
    /// The returned guard releases the lock when dropped, including on
    /// early returns and errors.
    pub fn try_acquire(&self, sku: &str, operation: &'static str) -> Result<SkuGuard, CoreError> {
        match self.held.entry(sku.to_string()) {
            Entry::Occupied(owner) => {
                tracing::warn!(sku = %sku, operation, held_by = *owner.get(), "SKU lock contended");
                Err(CoreError::Conflict(format!(
                    "{} is already in progress for {sku}; try again shortly",
                    owner.get()
                )))
            }
            Entry::Vacant(slot) => {
                slot.insert(operation);
                Ok(SkuGuard {
                    held: Arc::clone(&self.held),
                    sku: sku.to_string(),
                    operation,
                })
            }
        }
    }

    /// Whether a mutation is currently in flight for `sku`.
    pub fn is_locked(&self, sku: &str) -> bool {
        self.held.contains_key(sku)
    }

    /// Number of SKUs currently locked.
    pub fn held_count(&self) -> usize {
        self.held.len()
    }
}

/// Proof that the caller holds the lock for one SKU.
#[derive(Debug)]
pub struct SkuGuard {
    held: Arc<DashMap<String, &'static str>>,
    sku: String,
    operation: &'static str,
}

impl SkuGuard {
    pub fn sku(&self) -> &str {
        &self.sku
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }
}

impl Drop for SkuGuard {
    fn drop(&mut self) {
        self.held.remove(&self.sku);
    }
}
