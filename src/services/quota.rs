//! Quota Tracker - disabled scaffolds per user against the configured ceiling

use std::sync::Arc;

use tracing::warn;

use crate::store::ScaffoldStore;
use crate::types::{Result, ScaffoldError, ScaffoldQuota};

pub struct QuotaTracker<S: ScaffoldStore> {
    store: Arc<S>,
    allowed: u64,
}

impl<S: ScaffoldStore> QuotaTracker<S> {
    pub fn new(store: Arc<S>, allowed: u64) -> Self {
        Self { store, allowed }
    }

    /// Number of the user's scaffolds whose latest summary is disabled
    pub async fn used(&self, user_id: i64) -> Result<u64> {
        self.store.count_disabled_scaffolds(user_id).await
    }

    pub async fn quota(&self, user_id: i64) -> Result<ScaffoldQuota> {
        Ok(ScaffoldQuota {
            current: self.used(user_id).await?,
            limit: self.allowed,
        })
    }

    /// Fail with `QuotaExceeded` once the user holds the allowed number of disabled scaffolds
    pub async fn ensure_available(&self, user_id: i64) -> Result<()> {
        let used = self.used(user_id).await?;
        if used >= self.allowed {
            warn!(user_id, used, allowed = self.allowed, "Disabled scaffold quota exceeded");
            return Err(ScaffoldError::QuotaExceeded {
                used,
                allowed: self.allowed,
            });
        }
        Ok(())
    }
}
