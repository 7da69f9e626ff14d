//! Services
//!
//! - `scaffold`: lifecycle orchestration over processor, store and state tracking
//! - `summary_cache`: time-bounded reuse of on-chain summaries
//! - `quota`: disabled scaffold ceiling per user
//! - `tracking`: state tracking account and wallet bookkeeping

pub mod quota;
pub mod scaffold;
pub mod summary_cache;
pub mod tracking;

pub use quota::QuotaTracker;
pub use scaffold::ScaffoldService;
pub use summary_cache::{is_fresh, SummaryCache};
pub use tracking::StateTracker;
