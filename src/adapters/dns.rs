use crate::domain::ports::DnsProbe;
use crate::utils::error::Result;
use async_trait::async_trait;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::error::ResolveErrorKind;
use hickory_resolver::TokioAsyncResolver;

/// Address lookups through `hickory-resolver`.
pub struct HickoryDnsProbe {
    resolver: TokioAsyncResolver,
}

impl HickoryDnsProbe {
    pub fn new(resolver: TokioAsyncResolver) -> Self {
        Self { resolver }
    }

    /// Uses the host's resolver configuration (`/etc/resolv.conf` and hosts file).
    pub fn from_system_conf() -> Result<Self> {
        Ok(Self::new(TokioAsyncResolver::tokio_from_system_conf()?))
    }

    /// System configuration when available, otherwise the library's public-resolver defaults.
    pub fn from_system_conf_or_default() -> Self {
        Self::from_system_conf().unwrap_or_else(|e| {
            tracing::warn!("System DNS configuration unavailable ({}), using defaults", e);
            Self::new(TokioAsyncResolver::tokio(
                ResolverConfig::default(),
                ResolverOpts::default(),
            ))
        })
    }
}

#[async_trait]
impl DnsProbe for HickoryDnsProbe {
    async fn resolves(&self, host: &str) -> Result<bool> {
        match self.resolver.lookup_ip(host).await {
            Ok(lookup) => Ok(lookup.iter().next().is_some()),
            Err(e) => match e.kind() {
                ResolveErrorKind::NoRecordsFound { .. } => {
                    tracing::debug!("{} has no address records yet", host);
                    Ok(false)
                }
                _ => Err(e.into()),
            },
        }
    }
}
