//! State Tracking Adapter
//!
//! Keeps the tracking service in step with scaffold activation. The key
//! record's `state_account_id` decides everything: without it, wallet and
//! webhook updates are skipped; on first activation the account is created
//! and its id stored on the key record before returning.
//!
//! Account creation is serialized per key record, and the stored id is always
//! re-read under that lock, so a key never ends up with two accounts.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::state::StateApi;
use crate::store::ScaffoldStore;
use crate::types::{Blockchain, OpenKey, Result, Scaffold, ScaffoldError};

pub struct StateTracker<A: StateApi, S: ScaffoldStore> {
    api: Arc<A>,
    store: Arc<S>,
    blockchain: Blockchain,
    /// One lock per key record, taken around check-create-persist
    key_locks: DashMap<i64, Arc<Mutex<()>>>,
}

impl<A: StateApi, S: ScaffoldStore> StateTracker<A, S> {
    pub fn new(api: Arc<A>, store: Arc<S>, blockchain: Blockchain) -> Self {
        Self {
            api,
            store,
            blockchain,
            key_locks: DashMap::new(),
        }
    }

    fn key_lock(&self, key_id: i64) -> Arc<Mutex<()>> {
        self.key_locks
            .entry(key_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Current account of a key record, as stored
    async fn account_id(&self, key_id: i64) -> Result<Option<i64>> {
        let key = self
            .store
            .get_open_key(key_id)
            .await?
            .ok_or_else(|| ScaffoldError::NotFound(format!("Not found open key with id {}", key_id)))?;
        Ok(key.state_account_id)
    }

    /// Start tracking a scaffold's address, creating the account if needed
    pub async fn track(&self, scaffold: &Scaffold) -> Result<()> {
        let key_id = scaffold.open_key.id;
        let lock = self.key_lock(key_id);
        let _guard = lock.lock().await;

        let account_id = match self.account_id(key_id).await? {
            Some(account_id) => account_id,
            None => {
                let created = self
                    .api
                    .create_account(scaffold.web_hook.as_deref(), &scaffold.address, self.blockchain.id())
                    .await?;

                if self.store.set_state_account_id(key_id, created).await? {
                    info!(
                        open_key_id = key_id,
                        account_id = created,
                        address = %scaffold.address,
                        "State account created"
                    );
                    return Ok(());
                }

                // Linked by another process between the read and the write
                let linked = self.account_id(key_id).await?.ok_or_else(|| {
                    ScaffoldError::Database(format!("Open key {} lost its state account", key_id))
                })?;
                warn!(
                    open_key_id = key_id,
                    orphaned = created,
                    account_id = linked,
                    "Key already linked to a state account, adding wallet there"
                );
                linked
            }
        };

        self.api
            .add_wallet(account_id, &scaffold.address, self.blockchain.id())
            .await?;
        debug!(account_id, address = %scaffold.address, "Wallet added to state account");
        Ok(())
    }

    /// Stop tracking a scaffold's address
    pub async fn stop_tracking(&self, scaffold: &Scaffold) -> Result<()> {
        let Some(account_id) = self.account_id(scaffold.open_key.id).await? else {
            debug!(address = %scaffold.address, "No state account, skipping wallet removal");
            return Ok(());
        };

        self.api
            .delete_wallet(account_id, &scaffold.address, self.blockchain.id())
            .await?;
        debug!(account_id, address = %scaffold.address, "Wallet removed from state account");
        Ok(())
    }

    pub async fn update_webhook(&self, open_key: &OpenKey, web_hook: &str) -> Result<()> {
        let Some(account_id) = self.account_id(open_key.id).await? else {
            debug!(open_key_id = open_key.id, "No state account, skipping webhook update");
            return Ok(());
        };

        self.api.update_webhook(account_id, web_hook).await
    }
}
