use crate::domain::ports::HttpProbe;
use crate::utils::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ReqwestProbe {
    client: Client,
}

impl ReqwestProbe {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpProbe for ReqwestProbe {
    async fn status(&self, url: &str) -> Result<u16> {
        tracing::debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        tracing::debug!("GET {} -> {}", url, response.status());
        Ok(response.status().as_u16())
    }
}
