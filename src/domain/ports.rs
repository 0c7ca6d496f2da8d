use crate::domain::model::{BasePathMapping, CommandOutput, CommandSpec};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Runs external processes. A non-zero exit is reported in the output, not as an error.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, command: &CommandSpec) -> Result<CommandOutput>;
}

#[async_trait]
pub trait HttpProbe: Send + Sync {
    /// Status code of a GET request to `url`.
    async fn status(&self, url: &str) -> Result<u16>;
}

#[async_trait]
pub trait DnsProbe: Send + Sync {
    /// `Ok(false)` when the name does not exist or has no address records yet.
    async fn resolves(&self, host: &str) -> Result<bool>;
}

/// Read-only view of API Gateway custom domains.
#[async_trait]
pub trait DomainLookup: Send + Sync {
    async fn endpoint_types(&self, domain: &str) -> Result<Vec<String>>;
    async fn base_path_mappings(&self, domain: &str) -> Result<Vec<BasePathMapping>>;
}
