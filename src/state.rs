//! State Tracking Client - external per-owner account of tracked wallets
//!
//! The tracking service watches wallet addresses and calls the account's
//! webhook on activity.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::http::{self, HttpServiceConfig};
use crate::types::{Result, ScaffoldError};

/// Operations of the state tracking service
#[async_trait::async_trait]
pub trait StateApi: Send + Sync {
    /// Create an account tracking one wallet, returning the account id
    async fn create_account(&self, web_hook: Option<&str>, address: &str, blockchain_id: i32) -> Result<i64>;

    async fn add_wallet(&self, account_id: i64, address: &str, blockchain_id: i32) -> Result<()>;

    async fn delete_wallet(&self, account_id: i64, address: &str, blockchain_id: i32) -> Result<()>;

    async fn update_webhook(&self, account_id: i64, web_hook: &str) -> Result<()>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WalletBody<'a> {
    address: &'a str,
    blockchain: i32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateAccountBody<'a> {
    web_hook: Option<&'a str>,
    integrations: Vec<WalletBody<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateAccountBody<'a> {
    web_hook: &'a str,
}

#[derive(Deserialize)]
struct AccountResponse {
    id: i64,
}

/// REST client for the state tracking service
pub struct HttpStateApi {
    config: HttpServiceConfig,
    client: Client,
}

impl HttpStateApi {
    pub fn new(config: HttpServiceConfig) -> Result<Self> {
        let client = http::build_client(&config)?;
        Ok(Self { config, client })
    }

    fn account_url(&self, account_id: i64, suffix: &str) -> String {
        self.config.url(&format!("/api/accounts/{}{}", account_id, suffix))
    }
}

#[async_trait::async_trait]
impl StateApi for HttpStateApi {
    async fn create_account(&self, web_hook: Option<&str>, address: &str, blockchain_id: i32) -> Result<i64> {
        let body = CreateAccountBody {
            web_hook,
            integrations: vec![WalletBody {
                address,
                blockchain: blockchain_id,
            }],
        };

        let response = self
            .client
            .post(self.config.url("/api/accounts"))
            .json(&body)
            .send()
            .await
            .map_err(|e| ScaffoldError::Tracking(e.to_string()))?;
        let account: AccountResponse = http::read_json(response, ScaffoldError::Tracking).await?;

        debug!(account_id = account.id, "State account created");
        Ok(account.id)
    }

    async fn add_wallet(&self, account_id: i64, address: &str, blockchain_id: i32) -> Result<()> {
        let response = self
            .client
            .post(self.account_url(account_id, "/wallets"))
            .json(&WalletBody {
                address,
                blockchain: blockchain_id,
            })
            .send()
            .await
            .map_err(|e| ScaffoldError::Tracking(e.to_string()))?;
        http::check_status(response, ScaffoldError::Tracking).await?;
        Ok(())
    }

    async fn delete_wallet(&self, account_id: i64, address: &str, blockchain_id: i32) -> Result<()> {
        let url = format!(
            "{}?address={}&blockchain={}",
            self.account_url(account_id, "/wallets"),
            urlencoding::encode(address),
            blockchain_id
        );

        let response = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(|e| ScaffoldError::Tracking(e.to_string()))?;
        http::check_status(response, ScaffoldError::Tracking).await?;
        Ok(())
    }

    async fn update_webhook(&self, account_id: i64, web_hook: &str) -> Result<()> {
        let response = self
            .client
            .put(self.account_url(account_id, ""))
            .json(&UpdateAccountBody { web_hook })
            .send()
            .await
            .map_err(|e| ScaffoldError::Tracking(e.to_string()))?;
        http::check_status(response, ScaffoldError::Tracking).await?;
        Ok(())
    }
}
