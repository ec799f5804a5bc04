//! Chain Service Config

use std::time::Duration;

use bazaar_app::chain::ChainConfig;
use clap::Args;

/// Chain service settings.
#[derive(Debug, Args)]
pub struct ChainServiceConfig {
    /// Base URL of the chain service
    #[arg(long, env = "CHAIN_SERVICE_URL", default_value = "http://localhost:8899")]
    pub chain_service_url: String,

    /// Per-request timeout in seconds
    #[arg(long, env = "CHAIN_SERVICE_TIMEOUT_SECONDS", default_value_t = 10_u64)]
    pub chain_service_timeout_seconds: u64,
}

impl ChainServiceConfig {
    #[must_use]
    pub fn client_config(&self) -> ChainConfig {
        ChainConfig {
            base_url: self.chain_service_url.clone(),
            timeout: Duration::from_secs(self.chain_service_timeout_seconds),
        }
    }
}
