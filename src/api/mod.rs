pub mod client;
pub mod config;
pub mod credentials;
pub mod resource;
pub mod leads;
pub mod support_requests;
pub mod stats;

#[cfg(test)]
mod tests;

pub use client::*;
pub use config::*;
pub use credentials::*;
pub use resource::*;
pub use leads::{leads_client, LeadsClient, LEADS_PATH};
pub use support_requests::{support_requests_client, SupportRequestsClient, SUPPORT_REQUESTS_PATH};
pub use stats::{stats_client, StatsClient, STATS_PATH};

use std::sync::Arc;

/// Every resource client over one shared [`ApiClient`].
pub struct Api {
    client: ApiClient,
    pub leads: LeadsClient,
    pub support_requests: SupportRequestsClient,
    pub stats: StatsClient,
}

impl Api {
    pub fn new(config: &ClientConfig, credentials: Arc<dyn CredentialStore>) -> Result<Self, ApiError> {
        let client = ApiClient::new(config, credentials)?;

        Ok(Self {
            leads: leads_client(client.clone(), config.stale_time),
            support_requests: support_requests_client(client.clone(), config.stale_time),
            stats: stats_client(client.clone(), config.stale_time),
            client,
        })
    }

    /// Build from config alone, reading the token from `token_file` when one is set.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        let credentials: Arc<dyn CredentialStore> = match &config.token_file {
            Some(path) => Arc::new(FileCredentials::new(path)),
            None => Arc::new(NoCredentials),
        };
        Self::new(config, credentials)
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }
}
