//! Scaffold Lifecycle Orchestrator
//!
//! Drives a scaffold from compile through deploy, activation and share holder
//! changes. External calls are issued in a fixed order and are not rolled back:
//!
//! ```text
//! compile:  quota check -> processor.compile
//! deploy:   compile -> processor.deploy -> save (store + forced summary)
//! activate: processor.activate -> state tracking -> forced summary
//! ```
//!
//! Every address lookup is scoped to the requesting user; a scaffold owned by
//! somebody else is reported as not found before any external call is made.

use std::sync::Arc;

use tracing::{error, info};

use crate::clock::{Clock, SystemClock};
use crate::config::ScaffoldSettings;
use crate::processor::ScaffoldProcessor;
use crate::state::StateApi;
use crate::store::ScaffoldStore;
use crate::types::{
    Blockchain, CompileScaffoldRequest, CompiledScaffold, DeployScaffoldRequest, OpenKey, Page,
    PageRequest, Result, SaveScaffoldRequest, Scaffold, ScaffoldError, ScaffoldQuota,
    ScaffoldSummary,
};

use super::quota::QuotaTracker;
use super::summary_cache::SummaryCache;
use super::tracking::StateTracker;

pub struct ScaffoldService<P: ScaffoldProcessor, S: ScaffoldStore, A: StateApi> {
    processor: Arc<P>,
    store: Arc<S>,
    quota: QuotaTracker<S>,
    summaries: SummaryCache<P, S>,
    tracker: StateTracker<A, S>,
    clock: Arc<dyn Clock>,
}

impl<P: ScaffoldProcessor, S: ScaffoldStore, A: StateApi> ScaffoldService<P, S, A> {
    pub fn new(processor: Arc<P>, store: Arc<S>, state_api: Arc<A>, settings: ScaffoldSettings) -> Self {
        Self::with_clock(processor, store, state_api, settings, Arc::new(SystemClock))
    }

    pub fn with_clock(
        processor: Arc<P>,
        store: Arc<S>,
        state_api: Arc<A>,
        settings: ScaffoldSettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            quota: QuotaTracker::new(store.clone(), settings.allowed_disabled_contracts),
            summaries: SummaryCache::new(
                processor.clone(),
                store.clone(),
                clock.clone(),
                settings.cache_period,
            ),
            tracker: StateTracker::new(state_api, store.clone(), Blockchain::Ethereum),
            processor,
            store,
            clock,
        }
    }

    // =========================================================================
    // Ownership
    // =========================================================================

    /// Resolve an enabled, unexpired key by value
    pub async fn resolve_open_key(&self, value: &str) -> Result<OpenKey> {
        self.store
            .find_open_key(value, self.clock.now())
            .await?
            .ok_or_else(|| ScaffoldError::NotFound(format!("Not found open key {}", value)))
    }

    /// User id owning the given key value
    pub async fn owner_of(&self, open_key: &str) -> Result<i64> {
        Ok(self.resolve_open_key(open_key).await?.user_id)
    }

    async fn owned(&self, address: &str, user_id: i64) -> Result<Scaffold> {
        self.store
            .find_scaffold(address, user_id)
            .await?
            .ok_or_else(|| ScaffoldError::NotFound(format!("Not found scaffold with address {}", address)))
    }

    // =========================================================================
    // Creation
    // =========================================================================

    /// Compile a scaffold, refusing once the owner's disabled quota is used up
    pub async fn compile(&self, request: &CompileScaffoldRequest) -> Result<CompiledScaffold> {
        let key = self.resolve_open_key(&request.open_key).await?;
        self.quota.ensure_available(key.user_id).await?;

        let compiled = self.processor.compile(request).await?;
        info!(user_id = key.user_id, version = %request.version, "Scaffold compiled");
        Ok(compiled)
    }

    /// Compile, deploy on chain and record the scaffold locally
    pub async fn deploy(&self, request: DeployScaffoldRequest) -> Result<Scaffold> {
        let compiled = self.compile(&request.compile_request()).await?;
        let address = self.processor.deploy(&compiled.bin, &request).await?;
        info!(address = %address, "Scaffold deployed");

        let save = SaveScaffoldRequest::from_deploy(address.clone(), compiled.abi, request);
        self.save(&save).await.map_err(|e| {
            error!(address = %address, error = %e, "Deployed scaffold could not be recorded");
            e
        })
    }

    /// Record a scaffold that is already on chain and fetch its first summary
    pub async fn save(&self, request: &SaveScaffoldRequest) -> Result<Scaffold> {
        let key = self.resolve_open_key(&request.open_key).await?;
        let scaffold = self
            .store
            .create_scaffold(key.id, request, self.clock.now())
            .await?;

        self.summaries.refresh(&scaffold).await?;
        info!(address = %scaffold.address, user_id = key.user_id, "Scaffold saved");
        Ok(scaffold)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub async fn get_all(&self, user_id: i64, page: PageRequest) -> Result<Page<Scaffold>> {
        self.store.list_scaffolds(user_id, page).await
    }

    pub async fn get(&self, address: &str, user_id: i64) -> Result<Scaffold> {
        self.owned(address, user_id).await
    }

    /// Unscoped lookup for callers that only know the contract address
    pub async fn get_by_address(&self, address: &str) -> Result<Scaffold> {
        self.store
            .find_scaffold_by_address(address)
            .await?
            .ok_or_else(|| ScaffoldError::NotFound(format!("Not found scaffold with address {}", address)))
    }

    pub async fn get_quota(&self, user_id: i64) -> Result<ScaffoldQuota> {
        self.quota.quota(user_id).await
    }

    pub async fn get_scaffold_summary(&self, address: &str, user_id: i64, force: bool) -> Result<ScaffoldSummary> {
        let scaffold = self.owned(address, user_id).await?;
        self.summaries.summary(&scaffold, force).await
    }

    // =========================================================================
    // Updates
    // =========================================================================

    pub async fn update(&self, address: &str, user_id: i64, description: &str) -> Result<Scaffold> {
        let mut scaffold = self.owned(address, user_id).await?;
        scaffold.description = description.to_string();
        self.store.update_scaffold(&scaffold).await
    }

    /// Push the webhook to the tracking service, then persist it
    pub async fn set_web_hook(&self, address: &str, user_id: i64, web_hook: &str) -> Result<Scaffold> {
        let mut scaffold = self.owned(address, user_id).await?;
        self.tracker.update_webhook(&scaffold.open_key, web_hook).await?;

        scaffold.web_hook = Some(web_hook.to_string());
        let scaffold = self.store.update_scaffold(&scaffold).await?;
        info!(address = %address, "Scaffold webhook updated");
        Ok(scaffold)
    }

    // =========================================================================
    // Chain operations
    // =========================================================================

    pub async fn deactivate(&self, address: &str, user_id: i64) -> Result<ScaffoldSummary> {
        let scaffold = self.owned(address, user_id).await?;
        self.processor.deactivate(&scaffold).await?;
        self.tracker.stop_tracking(&scaffold).await?;
        info!(address = %address, "Scaffold deactivated");

        self.summaries.refresh(&scaffold).await
    }

    pub async fn activate(&self, address: &str, user_id: i64) -> Result<ScaffoldSummary> {
        let scaffold = self.owned(address, user_id).await?;
        self.processor.activate(&scaffold).await?;
        self.tracker.track(&scaffold).await?;
        info!(address = %address, "Scaffold activated");

        self.summaries.refresh(&scaffold).await
    }

    pub async fn add_share_holder(
        &self,
        address: &str,
        user_id: i64,
        holder: &str,
        percent: u32,
    ) -> Result<ScaffoldSummary> {
        let scaffold = self.owned(address, user_id).await?;
        self.processor.add_share_holder(&scaffold, holder, percent).await?;
        info!(address = %address, holder = %holder, percent, "Share holder added");

        self.summaries.refresh(&scaffold).await
    }

    pub async fn update_share_holder(
        &self,
        address: &str,
        user_id: i64,
        holder: &str,
        percent: u32,
    ) -> Result<ScaffoldSummary> {
        let scaffold = self.owned(address, user_id).await?;
        self.processor.update_share_holder(&scaffold, holder, percent).await?;
        info!(address = %address, holder = %holder, percent, "Share holder updated");

        self.summaries.refresh(&scaffold).await
    }

    pub async fn remove_share_holder(&self, address: &str, user_id: i64, holder: &str) -> Result<ScaffoldSummary> {
        let scaffold = self.owned(address, user_id).await?;
        self.processor.remove_share_holder(&scaffold, holder).await?;
        info!(address = %address, holder = %holder, "Share holder removed");

        self.summaries.refresh(&scaffold).await
    }
}
