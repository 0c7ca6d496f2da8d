pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliArgs;

pub use config::HarnessConfig;
pub use core::harness::{DomainHarness, LiveHarness};
pub use core::propagation::PropagationPolicy;
pub use domain::model::{random_string, BasePathMapping, CommandSpec, DomainReport};
pub use utils::error::{HarnessError, Result};
