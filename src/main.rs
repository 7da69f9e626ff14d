//! scaffold-steward - operator CLI for scaffold contracts

use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scaffold_steward::{
    config::{Args, Command},
    types::{CompileScaffoldRequest, DeployScaffoldRequest, PageRequest},
    HttpScaffoldProcessor, HttpStateApi, ScaffoldError, ScaffoldService, ScaffoldStore,
    SqliteScaffoldStore,
};

type Service = ScaffoldService<HttpScaffoldProcessor, SqliteScaffoldStore, HttpStateApi>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("scaffold_steward={},info", args.log_level).into());
    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("Database: {:?}", args.database_path);
    info!("Processor: {}", args.processor_url);
    info!("State service: {}", args.state_url);

    let store = Arc::new(SqliteScaffoldStore::open(&args.database_path)?);
    let processor = Arc::new(HttpScaffoldProcessor::new(args.processor_config())?);
    let state_api = Arc::new(HttpStateApi::new(args.state_config())?);
    let service = ScaffoldService::new(processor, store.clone(), state_api, args.scaffold_settings());

    if let Err(e) = run(args.command, &service, store.as_ref()).await {
        if e.is_expected() {
            info!("{}", e);
        } else {
            error!("{}", e);
        }
        std::process::exit(1);
    }

    Ok(())
}

async fn run(command: Command, service: &Service, store: &SqliteScaffoldStore) -> scaffold_steward::Result<()> {
    match command {
        Command::CreateUser { google_id, open_key } => {
            let user = match store.find_user(&google_id).await? {
                Some(user) => user,
                None => store.create_user(&google_id).await?,
            };
            let key = store.create_open_key(user.id, &open_key, None).await?;
            print_json(&key)
        }
        Command::Keys { google_id } => {
            let user = store
                .find_user(&google_id)
                .await?
                .ok_or_else(|| ScaffoldError::NotFound(format!("Not found user {}", google_id)))?;
            print_json(&store.find_open_keys_by_user(user.id).await?)
        }
        Command::Quota { open_key } => {
            let user_id = service.owner_of(&open_key).await?;
            print_json(&service.get_quota(user_id).await?)
        }
        Command::List { open_key, offset, limit } => {
            let user_id = service.owner_of(&open_key).await?;
            print_json(&service.get_all(user_id, PageRequest { offset, limit }).await?)
        }
        Command::Summary { open_key, address, force } => {
            let user_id = service.owner_of(&open_key).await?;
            print_json(&service.get_scaffold_summary(&address, user_id, force).await?)
        }
        Command::Compile { request } => {
            let request: CompileScaffoldRequest = read_request(&request)?;
            print_json(&service.compile(&request).await?)
        }
        Command::Deploy { request } => {
            let request: DeployScaffoldRequest = read_request(&request)?;
            print_json(&service.deploy(request).await?)
        }
        Command::Activate { open_key, address } => {
            let user_id = service.owner_of(&open_key).await?;
            print_json(&service.activate(&address, user_id).await?)
        }
        Command::Deactivate { open_key, address } => {
            let user_id = service.owner_of(&open_key).await?;
            print_json(&service.deactivate(&address, user_id).await?)
        }
        Command::Update { open_key, address, description } => {
            let user_id = service.owner_of(&open_key).await?;
            print_json(&service.update(&address, user_id, &description).await?)
        }
        Command::SetWebHook { open_key, address, web_hook } => {
            let user_id = service.owner_of(&open_key).await?;
            print_json(&service.set_web_hook(&address, user_id, &web_hook).await?)
        }
        Command::AddShareHolder { open_key, address, holder, percent } => {
            let user_id = service.owner_of(&open_key).await?;
            print_json(&service.add_share_holder(&address, user_id, &holder, percent).await?)
        }
        Command::UpdateShareHolder { open_key, address, holder, percent } => {
            let user_id = service.owner_of(&open_key).await?;
            print_json(&service.update_share_holder(&address, user_id, &holder, percent).await?)
        }
        Command::RemoveShareHolder { open_key, address, holder } => {
            let user_id = service.owner_of(&open_key).await?;
            print_json(&service.remove_share_holder(&address, user_id, &holder).await?)
        }
    }
}

fn read_request<T: DeserializeOwned>(path: &Path) -> scaffold_steward::Result<T> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ScaffoldError::Config(format!("Failed to read {:?}: {}", path, e)))?;
    serde_json::from_str(&raw)
        .map_err(|e| ScaffoldError::Config(format!("Invalid request in {:?}: {}", path, e)))
}

fn print_json<T: Serialize>(value: &T) -> scaffold_steward::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
