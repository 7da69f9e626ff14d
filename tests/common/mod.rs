//! Shared fixtures for integration tests
//!
//! Recording mocks for the processor and the state service, a manual clock and
//! a harness wiring them to an in-memory store.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};

use scaffold_steward::clock::Clock;
use scaffold_steward::config::ScaffoldSettings;
use scaffold_steward::processor::ScaffoldProcessor;
use scaffold_steward::state::StateApi;
use scaffold_steward::store::{ScaffoldStore, SqliteScaffoldStore};
use scaffold_steward::types::{
    ChainSummary, CompileScaffoldRequest, CompiledScaffold, DeployScaffoldRequest, OpenKey,
    PropertyType, Result, SaveScaffoldRequest, Scaffold, ScaffoldError, ScaffoldProperty,
    ShareHolder,
};
use scaffold_steward::ScaffoldService;

pub const ABI: &str = r#"[{"type":"constructor","inputs":[]}]"#;
pub const BIN: &str = "0x608060405234801561001057600080fd5b50";

// ============================================================================
// Clock
// ============================================================================

pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now = *now + by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

// ============================================================================
// Processor
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum ChainCall {
    Activate(String),
    Deactivate(String),
    AddShareHolder(String, String, u32),
    UpdateShareHolder(String, String, u32),
    RemoveShareHolder(String, String),
}

pub struct MockProcessor {
    pub compile_calls: AtomicUsize,
    pub deploy_calls: AtomicUsize,
    pub summary_calls: AtomicUsize,
    pub share_holder_calls: AtomicUsize,
    pub chain_calls: Mutex<Vec<ChainCall>>,
    pub deployed_bins: Mutex<Vec<String>>,
    chain: Mutex<ChainSummary>,
    share_holders: Mutex<Vec<ShareHolder>>,
    next_address: AtomicUsize,
}

impl MockProcessor {
    pub fn new() -> Self {
        Self {
            compile_calls: AtomicUsize::new(0),
            deploy_calls: AtomicUsize::new(0),
            summary_calls: AtomicUsize::new(0),
            share_holder_calls: AtomicUsize::new(0),
            chain_calls: Mutex::new(Vec::new()),
            deployed_bins: Mutex::new(Vec::new()),
            chain: Mutex::new(ChainSummary {
                currency: "USD".to_string(),
                fiat_amount: "25.00".to_string(),
                transaction_index: 0,
                token_address: None,
                token_balance: "0".to_string(),
                enabled: true,
            }),
            share_holders: Mutex::new(Vec::new()),
            next_address: AtomicUsize::new(1),
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.chain.lock().unwrap().enabled = enabled;
    }

    pub fn set_transaction_index(&self, index: i64) {
        self.chain.lock().unwrap().transaction_index = index;
    }

    pub fn set_share_holders(&self, holders: Vec<ShareHolder>) {
        *self.share_holders.lock().unwrap() = holders;
    }

    pub fn summary_calls(&self) -> usize {
        self.summary_calls.load(Ordering::SeqCst)
    }

    pub fn compile_calls(&self) -> usize {
        self.compile_calls.load(Ordering::SeqCst)
    }

    pub fn chain_calls(&self) -> Vec<ChainCall> {
        self.chain_calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ScaffoldProcessor for MockProcessor {
    async fn compile(&self, _request: &CompileScaffoldRequest) -> Result<CompiledScaffold> {
        self.compile_calls.fetch_add(1, Ordering::SeqCst);
        Ok(CompiledScaffold {
            abi: ABI.to_string(),
            bin: BIN.to_string(),
        })
    }

    async fn deploy(&self, bin: &str, _request: &DeployScaffoldRequest) -> Result<String> {
        self.deploy_calls.fetch_add(1, Ordering::SeqCst);
        self.deployed_bins.lock().unwrap().push(bin.to_string());
        let n = self.next_address.fetch_add(1, Ordering::SeqCst);
        Ok(format!("0x{:040x}", n))
    }

    async fn get_summary(&self, _scaffold: &Scaffold) -> Result<ChainSummary> {
        self.summary_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.chain.lock().unwrap().clone())
    }

    async fn get_share_holders(&self, _scaffold: &Scaffold) -> Result<Vec<ShareHolder>> {
        self.share_holder_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.share_holders.lock().unwrap().clone())
    }

    async fn activate(&self, scaffold: &Scaffold) -> Result<()> {
        self.chain_calls
            .lock()
            .unwrap()
            .push(ChainCall::Activate(scaffold.address.clone()));
        self.set_enabled(true);
        Ok(())
    }

    async fn deactivate(&self, scaffold: &Scaffold) -> Result<()> {
        self.chain_calls
            .lock()
            .unwrap()
            .push(ChainCall::Deactivate(scaffold.address.clone()));
        self.set_enabled(false);
        Ok(())
    }

    async fn add_share_holder(&self, scaffold: &Scaffold, address: &str, percent: u32) -> Result<()> {
        self.chain_calls.lock().unwrap().push(ChainCall::AddShareHolder(
            scaffold.address.clone(),
            address.to_string(),
            percent,
        ));
        self.share_holders.lock().unwrap().push(ShareHolder {
            address: address.to_string(),
            percent,
        });
        Ok(())
    }

    async fn update_share_holder(&self, scaffold: &Scaffold, address: &str, percent: u32) -> Result<()> {
        self.chain_calls.lock().unwrap().push(ChainCall::UpdateShareHolder(
            scaffold.address.clone(),
            address.to_string(),
            percent,
        ));
        for holder in self.share_holders.lock().unwrap().iter_mut() {
            if holder.address == address {
                holder.percent = percent;
            }
        }
        Ok(())
    }

    async fn remove_share_holder(&self, scaffold: &Scaffold, address: &str) -> Result<()> {
        self.chain_calls.lock().unwrap().push(ChainCall::RemoveShareHolder(
            scaffold.address.clone(),
            address.to_string(),
        ));
        self.share_holders
            .lock()
            .unwrap()
            .retain(|holder| holder.address != address);
        Ok(())
    }
}

// ============================================================================
// State service
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum StateCall {
    CreateAccount {
        web_hook: Option<String>,
        address: String,
        blockchain_id: i32,
    },
    AddWallet {
        account_id: i64,
        address: String,
        blockchain_id: i32,
    },
    DeleteWallet {
        account_id: i64,
        address: String,
        blockchain_id: i32,
    },
    UpdateWebhook {
        account_id: i64,
        web_hook: String,
    },
}

pub struct MockStateApi {
    calls: Mutex<Vec<StateCall>>,
    next_account_id: AtomicI64,
    fail: AtomicBool,
}

impl MockStateApi {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            next_account_id: AtomicI64::new(500),
            fail: AtomicBool::new(false),
        }
    }

    /// Make every following call fail with a tracking error
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<StateCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: StateCall) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ScaffoldError::Tracking("state service unavailable".to_string()));
        }
        self.calls.lock().unwrap().push(call);
        Ok(())
    }
}

#[async_trait::async_trait]
impl StateApi for MockStateApi {
    async fn create_account(&self, web_hook: Option<&str>, address: &str, blockchain_id: i32) -> Result<i64> {
        // Let concurrent activations interleave here
        tokio::task::yield_now().await;
        self.record(StateCall::CreateAccount {
            web_hook: web_hook.map(str::to_string),
            address: address.to_string(),
            blockchain_id,
        })?;
        Ok(self.next_account_id.fetch_add(1, Ordering::SeqCst))
    }

    async fn add_wallet(&self, account_id: i64, address: &str, blockchain_id: i32) -> Result<()> {
        self.record(StateCall::AddWallet {
            account_id,
            address: address.to_string(),
            blockchain_id,
        })
    }

    async fn delete_wallet(&self, account_id: i64, address: &str, blockchain_id: i32) -> Result<()> {
        self.record(StateCall::DeleteWallet {
            account_id,
            address: address.to_string(),
            blockchain_id,
        })
    }

    async fn update_webhook(&self, account_id: i64, web_hook: &str) -> Result<()> {
        self.record(StateCall::UpdateWebhook {
            account_id,
            web_hook: web_hook.to_string(),
        })
    }
}

// ============================================================================
// Harness
// ============================================================================

pub struct Harness {
    pub service: ScaffoldService<MockProcessor, SqliteScaffoldStore, MockStateApi>,
    pub processor: Arc<MockProcessor>,
    pub store: Arc<SqliteScaffoldStore>,
    pub state: Arc<MockStateApi>,
    pub clock: Arc<ManualClock>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_settings(ScaffoldSettings::default())
    }

    pub fn with_settings(settings: ScaffoldSettings) -> Self {
        let processor = Arc::new(MockProcessor::new());
        let store = Arc::new(SqliteScaffoldStore::open_in_memory().unwrap());
        let state = Arc::new(MockStateApi::new());
        let clock = Arc::new(ManualClock::new(t0()));

        let service = ScaffoldService::with_clock(
            processor.clone(),
            store.clone(),
            state.clone(),
            settings,
            clock.clone(),
        );

        Self {
            service,
            processor,
            store,
            state,
            clock,
        }
    }

    /// Create a user with one enabled key
    pub async fn seed_user(&self, google_id: &str, key: &str) -> OpenKey {
        let user = self.store.create_user(google_id).await.unwrap();
        self.store.create_open_key(user.id, key, None).await.unwrap()
    }

    pub async fn open_key(&self, id: i64) -> OpenKey {
        self.store.get_open_key(id).await.unwrap().unwrap()
    }
}

pub fn deploy_request(open_key: &str) -> DeployScaffoldRequest {
    DeployScaffoldRequest {
        open_key: open_key.to_string(),
        developer_address: "0x00000000000000000000000000000000000000de".to_string(),
        description: "Coffee subscription".to_string(),
        fiat_amount: "25.00".to_string(),
        currency: "USD".to_string(),
        conversion_amount: "0.01".to_string(),
        web_hook: Some("https://hooks.example/coffee".to_string()),
        properties: vec![ScaffoldProperty {
            name: "customerName".to_string(),
            property_type: PropertyType::String,
            default_value: None,
        }],
        version: "V1".to_string(),
    }
}

pub fn save_request(open_key: &str, address: &str) -> SaveScaffoldRequest {
    SaveScaffoldRequest::from_deploy(address.to_string(), ABI.to_string(), deploy_request(open_key))
}

pub fn holder(address: &str, percent: u32) -> ShareHolder {
    ShareHolder {
        address: address.to_string(),
        percent,
    }
}
