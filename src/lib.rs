pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::cli::CliArgs;

pub use crate::adapters::storage::LocalStorage;
pub use crate::config::{FileConfig, Overrides};
pub use crate::core::{caller::ApiCaller, engine::CallEngine, engine::RunOutcome};
pub use crate::domain::model::ApiContext;
pub use crate::utils::error::{CallerError, Result};
