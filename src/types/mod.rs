//! Shared types

pub mod error;
pub mod scaffold;

pub use error::{Result, ScaffoldError};
pub use scaffold::*;
