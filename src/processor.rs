//! Blockchain Processor - compiles, deploys and drives scaffold contracts
//!
//! Every call here reaches the chain and cannot be rolled back. The trait is
//! the seam the services depend on; `HttpScaffoldProcessor` talks to a
//! processor sidecar over JSON.

use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use crate::http::{self, HttpServiceConfig};
use crate::types::{
    ChainSummary, CompileScaffoldRequest, CompiledScaffold, DeployScaffoldRequest, Result,
    Scaffold, ScaffoldError, ShareHolder,
};

/// Operations against deployed scaffold contracts
#[async_trait::async_trait]
pub trait ScaffoldProcessor: Send + Sync {
    async fn compile(&self, request: &CompileScaffoldRequest) -> Result<CompiledScaffold>;

    /// Deploy compiled bytecode, returning the contract address
    async fn deploy(&self, bin: &str, request: &DeployScaffoldRequest) -> Result<String>;

    async fn get_summary(&self, scaffold: &Scaffold) -> Result<ChainSummary>;

    async fn get_share_holders(&self, scaffold: &Scaffold) -> Result<Vec<ShareHolder>>;

    async fn activate(&self, scaffold: &Scaffold) -> Result<()>;

    async fn deactivate(&self, scaffold: &Scaffold) -> Result<()>;

    async fn add_share_holder(&self, scaffold: &Scaffold, address: &str, percent: u32) -> Result<()>;

    async fn update_share_holder(&self, scaffold: &Scaffold, address: &str, percent: u32) -> Result<()>;

    async fn remove_share_holder(&self, scaffold: &Scaffold, address: &str) -> Result<()>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeployBody<'a> {
    bin: &'a str,
    #[serde(flatten)]
    request: &'a DeployScaffoldRequest,
}

#[derive(serde::Deserialize)]
struct DeployResponse {
    address: String,
}

#[derive(Serialize)]
struct ShareHolderBody<'a> {
    address: &'a str,
    percent: u32,
}

#[derive(Serialize)]
struct PercentBody {
    percent: u32,
}

/// REST client for the processor sidecar
pub struct HttpScaffoldProcessor {
    config: HttpServiceConfig,
    client: Client,
}

impl HttpScaffoldProcessor {
    pub fn new(config: HttpServiceConfig) -> Result<Self> {
        let client = http::build_client(&config)?;
        Ok(Self { config, client })
    }

    fn scaffold_url(&self, address: &str, suffix: &str) -> String {
        self.config
            .url(&format!("/scaffolds/{}{}", urlencoding::encode(address), suffix))
    }

    async fn post_empty(&self, url: String) -> Result<()> {
        let response = self
            .client
            .post(&url)
            .send()
            .await
            .map_err(|e| ScaffoldError::ChainOperation(e.to_string()))?;
        http::check_status(response, ScaffoldError::ChainOperation).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl ScaffoldProcessor for HttpScaffoldProcessor {
    async fn compile(&self, request: &CompileScaffoldRequest) -> Result<CompiledScaffold> {
        debug!(version = %request.version, "Compiling scaffold");
        let response = self
            .client
            .post(self.config.url("/scaffolds/compile"))
            .json(request)
            .send()
            .await
            .map_err(|e| ScaffoldError::Compile(e.to_string()))?;
        http::read_json(response, ScaffoldError::Compile).await
    }

    async fn deploy(&self, bin: &str, request: &DeployScaffoldRequest) -> Result<String> {
        let response = self
            .client
            .post(self.config.url("/scaffolds/deploy"))
            .json(&DeployBody { bin, request })
            .send()
            .await
            .map_err(|e| ScaffoldError::Deploy(e.to_string()))?;
        let deployed: DeployResponse = http::read_json(response, ScaffoldError::Deploy).await?;
        Ok(deployed.address)
    }

    async fn get_summary(&self, scaffold: &Scaffold) -> Result<ChainSummary> {
        let response = self
            .client
            .get(self.scaffold_url(&scaffold.address, "/summary"))
            .send()
            .await
            .map_err(|e| ScaffoldError::ChainOperation(e.to_string()))?;
        http::read_json(response, ScaffoldError::ChainOperation).await
    }

    async fn get_share_holders(&self, scaffold: &Scaffold) -> Result<Vec<ShareHolder>> {
        let response = self
            .client
            .get(self.scaffold_url(&scaffold.address, "/share-holders"))
            .send()
            .await
            .map_err(|e| ScaffoldError::ChainOperation(e.to_string()))?;
        http::read_json(response, ScaffoldError::ChainOperation).await
    }

    async fn activate(&self, scaffold: &Scaffold) -> Result<()> {
        self.post_empty(self.scaffold_url(&scaffold.address, "/activate"))
            .await
    }

    async fn deactivate(&self, scaffold: &Scaffold) -> Result<()> {
        self.post_empty(self.scaffold_url(&scaffold.address, "/deactivate"))
            .await
    }

    async fn add_share_holder(&self, scaffold: &Scaffold, address: &str, percent: u32) -> Result<()> {
        let response = self
            .client
            .post(self.scaffold_url(&scaffold.address, "/share-holders"))
            .json(&ShareHolderBody { address, percent })
            .send()
            .await
            .map_err(|e| ScaffoldError::ChainOperation(e.to_string()))?;
        http::check_status(response, ScaffoldError::ChainOperation).await?;
        Ok(())
    }

    async fn update_share_holder(&self, scaffold: &Scaffold, address: &str, percent: u32) -> Result<()> {
        let suffix = format!("/share-holders/{}", urlencoding::encode(address));
        let response = self
            .client
            .put(self.scaffold_url(&scaffold.address, &suffix))
            .json(&PercentBody { percent })
            .send()
            .await
            .map_err(|e| ScaffoldError::ChainOperation(e.to_string()))?;
        http::check_status(response, ScaffoldError::ChainOperation).await?;
        Ok(())
    }

    async fn remove_share_holder(&self, scaffold: &Scaffold, address: &str) -> Result<()> {
        let suffix = format!("/share-holders/{}", urlencoding::encode(address));
        let response = self
            .client
            .delete(self.scaffold_url(&scaffold.address, &suffix))
            .send()
            .await
            .map_err(|e| ScaffoldError::ChainOperation(e.to_string()))?;
        http::check_status(response, ScaffoldError::ChainOperation).await?;
        Ok(())
    }
}
