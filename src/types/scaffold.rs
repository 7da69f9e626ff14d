//! Scaffold domain types
//!
//! Records are handed out fully materialized: a `Scaffold` carries its key
//! record and properties, a `ScaffoldSummary` carries its share holders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Blockchains a scaffold can live on, with their wire ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i32)]
pub enum Blockchain {
    Ethereum = 1,
}

impl Blockchain {
    /// Numeric id used by the state tracking service
    pub fn id(self) -> i32 {
        self as i32
    }
}

/// Account that owns API keys
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub google_id: String,
}

/// API key record; also holds the user's link to the state tracking service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenKey {
    pub id: i64,
    pub user_id: i64,
    pub value: String,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expired_date: Option<DateTime<Utc>>,
    /// Tracking account, created on first activation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_account_id: Option<i64>,
}

/// Type of a scaffold configuration property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    String,
    Number,
    Boolean,
    Address,
}

impl PropertyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Address => "address",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "string" => Some(Self::String),
            "number" => Some(Self::Number),
            "boolean" => Some(Self::Boolean),
            "address" => Some(Self::Address),
            _ => None,
        }
    }
}

/// Configuration property baked into a scaffold at compile time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaffoldProperty {
    pub name: String,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

/// Deployed scaffold contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scaffold {
    pub id: i64,
    pub address: String,
    pub abi: String,
    pub open_key: OpenKey,
    pub developer_address: String,
    pub description: String,
    pub fiat_amount: String,
    pub currency: String,
    pub conversion_amount: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_hook: Option<String>,
    pub version: String,
    pub properties: Vec<ScaffoldProperty>,
    pub created_at: DateTime<Utc>,
}

/// Address and percentage allocation on a scaffold
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareHolder {
    pub address: String,
    pub percent: u32,
}

/// On-chain snapshot as reported by the processor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainSummary {
    pub currency: String,
    pub fiat_amount: String,
    pub transaction_index: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_address: Option<String>,
    pub token_balance: String,
    pub enabled: bool,
}

/// Fetched chain state waiting to replace the cached summary
#[derive(Debug, Clone)]
pub struct SummarySnapshot {
    pub chain: ChainSummary,
    pub share_holders: Vec<ShareHolder>,
    pub fetched_at: DateTime<Utc>,
}

/// Cached summary of a scaffold's on-chain state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaffoldSummary {
    pub id: i64,
    pub scaffold_id: i64,
    pub scaffold_address: String,
    pub currency: String,
    pub fiat_amount: String,
    pub transaction_index: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_address: Option<String>,
    pub token_balance: String,
    pub enabled: bool,
    pub fetched_at: DateTime<Utc>,
    pub share_holders: Vec<ShareHolder>,
}

/// Disabled scaffolds held by a user against the allowed ceiling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaffoldQuota {
    pub current: u64,
    pub limit: u64,
}

/// Compiler output for a scaffold template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledScaffold {
    pub abi: String,
    pub bin: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileScaffoldRequest {
    pub open_key: String,
    #[serde(default)]
    pub properties: Vec<ScaffoldProperty>,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployScaffoldRequest {
    pub open_key: String,
    pub developer_address: String,
    pub description: String,
    pub fiat_amount: String,
    pub currency: String,
    pub conversion_amount: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_hook: Option<String>,
    #[serde(default)]
    pub properties: Vec<ScaffoldProperty>,
    pub version: String,
}

impl DeployScaffoldRequest {
    pub fn compile_request(&self) -> CompileScaffoldRequest {
        CompileScaffoldRequest {
            open_key: self.open_key.clone(),
            properties: self.properties.clone(),
            version: self.version.clone(),
        }
    }
}

/// Scaffold already on chain, to be recorded locally
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveScaffoldRequest {
    pub address: String,
    pub abi: String,
    pub open_key: String,
    pub developer_address: String,
    pub description: String,
    pub fiat_amount: String,
    pub currency: String,
    pub conversion_amount: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_hook: Option<String>,
    #[serde(default)]
    pub properties: Vec<ScaffoldProperty>,
    pub version: String,
}

impl SaveScaffoldRequest {
    pub fn from_deploy(address: String, abi: String, request: DeployScaffoldRequest) -> Self {
        Self {
            address,
            abi,
            open_key: request.open_key,
            developer_address: request.developer_address,
            description: request.description,
            fiat_amount: request.fiat_amount,
            currency: request.currency,
            conversion_amount: request.conversion_amount,
            web_hook: request.web_hook,
            properties: request.properties,
            version: request.version,
        }
    }
}

/// Offset/limit window for listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub offset: u32,
    pub limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { offset: 0, limit: 20 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}
