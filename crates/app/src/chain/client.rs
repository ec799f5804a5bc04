//! HTTP chain service client.

use std::time::Duration;

use async_trait::async_trait;
use mockall::automock;
use reqwest::{Client, StatusCode, Url};

use crate::chain::{ChainError, SignatureStatus};

/// Configuration for reaching the chain service.
#[derive(Debug, Clone)]
pub struct ChainConfig {
    /// Service base URL, e.g. `"http://localhost:8899"`.
    pub base_url: String,

    /// Per-request timeout.
    pub timeout: Duration,
}

#[automock]
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Look up a signature. `Ok(None)` means the service has never seen it.
    async fn signature_status(
        &self,
        transaction_hash: &str,
    ) -> Result<Option<SignatureStatus>, ChainError>;
}

/// Chain client over HTTP.
#[derive(Debug, Clone)]
pub struct HttpChainClient {
    base_url: Url,
    http: Client,
}

impl HttpChainClient {
    /// Create a new client from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when the base URL is invalid or the HTTP client
    /// cannot be built.
    pub fn new(config: &ChainConfig) -> Result<Self, ChainError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|error| ChainError::InvalidUrl(error.to_string()))?;

        if base_url.cannot_be_a_base() {
            return Err(ChainError::InvalidUrl(config.base_url.clone()));
        }

        let http = Client::builder().timeout(config.timeout).build()?;

        Ok(Self { base_url, http })
    }

    fn signature_url(&self, transaction_hash: &str) -> Result<Url, ChainError> {
        let mut url = self.base_url.clone();

        url.path_segments_mut()
            .map_err(|()| ChainError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(["signatures", transaction_hash]);

        Ok(url)
    }
}

#[async_trait]
impl ChainClient for HttpChainClient {
    async fn signature_status(
        &self,
        transaction_hash: &str,
    ) -> Result<Option<SignatureStatus>, ChainError> {
        let url = self.signature_url(transaction_hash)?;

        let response = self.http.get(url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            return Err(ChainError::UnexpectedResponse(format!(
                "signature lookup failed with status {status}: {text}"
            )));
        }

        Ok(Some(response.json::<SignatureStatus>().await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> HttpChainClient {
        HttpChainClient::new(&ChainConfig {
            base_url: base_url.to_string(),
            timeout: Duration::from_secs(1),
        })
        .expect("valid chain config")
    }

    #[test]
    fn signature_url_appends_encoded_segments() {
        let url = client("http://chain.local/api/")
            .signature_url("5Vx/abc")
            .expect("signature url");

        assert_eq!(url.as_str(), "http://chain.local/api/signatures/5Vx%2Fabc");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let result = HttpChainClient::new(&ChainConfig {
            base_url: "not a url".to_string(),
            timeout: Duration::from_secs(1),
        });

        assert!(matches!(result, Err(ChainError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn unreachable_service_is_an_http_error() {
        let result = client("http://127.0.0.1:9").signature_status("abc").await;

        assert!(
            matches!(result, Err(ChainError::Http(_))),
            "expected Http error, got {result:?}"
        );
    }
}
