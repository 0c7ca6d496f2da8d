use crate::config::toml_config::AwsSettings;
use crate::domain::model::BasePathMapping;
use crate::domain::ports::DomainLookup;
use crate::utils::error::{HarnessError, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_apigateway::config::Region;
use aws_sdk_apigateway::error::DisplayErrorContext;
use aws_sdk_apigateway::types::{self as sdk};
use aws_sdk_apigateway::Client as ApiGatewayClient;

#[derive(Debug, Clone)]
pub struct ApiGatewayLookup {
    client: ApiGatewayClient,
}

impl ApiGatewayLookup {
    pub fn new(client: ApiGatewayClient) -> Self {
        Self { client }
    }

    /// Client for the configured region, using the named credentials profile when one is set.
    pub async fn from_settings(settings: &AwsSettings) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()));
        if let Some(profile) = &settings.profile {
            loader = loader.profile_name(profile);
        }
        let sdk_config = loader.load().await;

        tracing::debug!(
            "API Gateway client for region {} (profile: {})",
            settings.region,
            settings.profile.as_deref().unwrap_or("default chain")
        );
        Self::new(ApiGatewayClient::new(&sdk_config))
    }
}

fn endpoint_types_from_sdk(config: Option<&sdk::EndpointConfiguration>) -> Vec<String> {
    config
        .map(|c| c.types().iter().map(|t| t.as_str().to_string()).collect())
        .unwrap_or_default()
}

fn mapping_from_sdk(mapping: &sdk::BasePathMapping) -> BasePathMapping {
    BasePathMapping {
        base_path: mapping.base_path().map(str::to_string),
        stage: mapping.stage().map(str::to_string),
        rest_api_id: mapping.rest_api_id().map(str::to_string),
    }
}

#[async_trait]
impl DomainLookup for ApiGatewayLookup {
    async fn endpoint_types(&self, domain: &str) -> Result<Vec<String>> {
        let output = self
            .client
            .get_domain_name()
            .domain_name(domain)
            .send()
            .await
            .map_err(|e| HarnessError::aws("GetDomainName", DisplayErrorContext(&e)))?;

        Ok(endpoint_types_from_sdk(output.endpoint_configuration()))
    }

    async fn base_path_mappings(&self, domain: &str) -> Result<Vec<BasePathMapping>> {
        let output = self
            .client
            .get_base_path_mappings()
            .domain_name(domain)
            .send()
            .await
            .map_err(|e| HarnessError::aws("GetBasePathMappings", DisplayErrorContext(&e)))?;

        Ok(output.items().iter().map(mapping_from_sdk).collect())
    }
}
