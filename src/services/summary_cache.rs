//! Summary Cache - time-bounded reuse of on-chain summaries
//!
//! Expiry is checked lazily on read. A refresh fetches everything from the
//! processor first and only then hands the snapshot to the store, which swaps
//! summary and share holders in a single transaction.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::clock::Clock;
use crate::processor::ScaffoldProcessor;
use crate::store::ScaffoldStore;
use crate::types::{Result, Scaffold, ScaffoldSummary, SummarySnapshot};

/// Whether a summary fetched at `fetched_at` may still be served at `now`
pub fn is_fresh(fetched_at: DateTime<Utc>, cache_period: Duration, now: DateTime<Utc>) -> bool {
    fetched_at + cache_period > now
}

pub struct SummaryCache<P: ScaffoldProcessor, S: ScaffoldStore> {
    processor: Arc<P>,
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    cache_period: Duration,
}

impl<P: ScaffoldProcessor, S: ScaffoldStore> SummaryCache<P, S> {
    pub fn new(processor: Arc<P>, store: Arc<S>, clock: Arc<dyn Clock>, cache_period: Duration) -> Self {
        Self {
            processor,
            store,
            clock,
            cache_period,
        }
    }

    /// Cached summary if still fresh and not forced, otherwise a refreshed one
    pub async fn summary(&self, scaffold: &Scaffold, force: bool) -> Result<ScaffoldSummary> {
        if !force {
            if let Some(cached) = self.store.find_summary(scaffold.id).await? {
                if is_fresh(cached.fetched_at, self.cache_period, self.clock.now()) {
                    debug!(address = %scaffold.address, fetched_at = %cached.fetched_at, "Summary cache hit");
                    return Ok(cached);
                }
            }
        }

        self.refresh(scaffold).await
    }

    /// Fetch the scaffold's state from the chain and replace the cached summary
    pub async fn refresh(&self, scaffold: &Scaffold) -> Result<ScaffoldSummary> {
        let chain = self.processor.get_summary(scaffold).await?;
        let share_holders = self.processor.get_share_holders(scaffold).await?;

        let snapshot = SummarySnapshot {
            chain,
            share_holders,
            fetched_at: self.clock.now(),
        };

        let summary = self.store.replace_summary(scaffold.id, snapshot).await?;

        info!(
            address = %scaffold.address,
            enabled = summary.enabled,
            share_holders = summary.share_holders.len(),
            "Summary refreshed"
        );

        Ok(summary)
    }
}
