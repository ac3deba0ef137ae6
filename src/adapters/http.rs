use crate::domain::model::{PhysicianRecord, PostalCode};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{LocatorError, Result};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

pub const DEFAULT_REGISTRY_ENDPOINT: &str = "https://npiregistry.cms.hhs.gov/api/";
pub const DEFAULT_REGISTRY_VERSION: &str = "2.1";
pub const DEFAULT_PAGE_LIMIT: u32 = 20;

#[derive(Debug, Deserialize)]
struct RegistryResponse {
    #[serde(default)]
    results: Vec<PhysicianRecord>,
}

/// Thin client for the NPI registry search endpoint. One call, one attempt.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    client: Client,
    endpoint: String,
    version: String,
    limit: u32,
}

impl RegistryClient {
    pub fn new(client: Client, endpoint: &str, version: &str, limit: u32) -> Self {
        Self {
            client,
            endpoint: endpoint.to_string(),
            version: version.to_string(),
            limit,
        }
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self::new(
            client,
            config.registry_endpoint(),
            config.registry_version(),
            config.page_limit(),
        ))
    }

    /// Returns the `results` array of the response, or an empty list when the field is absent.
    pub async fn search(&self, postal_code: &PostalCode) -> Result<Vec<PhysicianRecord>> {
        let limit = self.limit.to_string();
        tracing::debug!(
            "GET {} postal_code={} version={} limit={}",
            self.endpoint,
            postal_code,
            self.version,
            limit
        );

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("postal_code", postal_code.as_str()),
                ("version", self.version.as_str()),
                ("limit", limit.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(LocatorError::HttpStatusError {
                postal_code: postal_code.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        let parsed: RegistryResponse = serde_json::from_slice(&body)?;
        Ok(parsed.results)
    }
}
