//! Scaffold Steward - lifecycle orchestration for scaffold contracts
//!
//! A scaffold is a payment contract compiled from a template, deployed through
//! a blockchain processor and watched by an external state tracking service.
//! This crate keeps the local record of each scaffold and its owner, caches
//! the on-chain summary for a configurable period, and enforces a per-user
//! ceiling on disabled scaffolds before anything new is compiled.
//!
//! ## Components
//!
//! - **ScaffoldService**: compile, deploy, activation and share holder operations
//! - **SummaryCache**: time-bounded summaries, refreshed after every chain mutation
//! - **QuotaTracker**: disabled scaffold count against `allowed_disabled_contracts`
//! - **StateTracker**: tracking account creation and wallet bookkeeping
//! - **ScaffoldStore**: SQLite persistence with transactional multi-row writes

pub mod clock;
pub mod config;
pub mod db;
pub mod http;
pub mod processor;
pub mod services;
pub mod state;
pub mod store;
pub mod types;

pub use clock::{Clock, SystemClock};
pub use config::{Args, ScaffoldSettings};
pub use processor::{HttpScaffoldProcessor, ScaffoldProcessor};
pub use services::ScaffoldService;
pub use state::{HttpStateApi, StateApi};
pub use store::{ScaffoldStore, SqliteScaffoldStore};
pub use types::{Result, ScaffoldError};
