//! Etherscan-compatible block explorer source.
//!
//! Supports:
//! - `module=proxy` reads (blocks, transactions, receipts, code, storage, gas price)
//! - `module=logs&action=getLogs` with topic operators
//! - Host-keyed throttling for keyless ("community") access

mod query;
mod response;

use std::{
    fmt,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use reqwest::Client;
use scout_domain::ChainName;
use url::Url;

use crate::{
    BlockExplorer, CapabilitySet, ChainDataSource, ChainRequest, ChainResponse,
    ExplorerFamily, ExplorerRateLimiter, Method, SourceError, SourceKind,
};
use query::{QueryParams, query_params};
use response::{ExplorerEnvelope, parse_result};

/// Methods explorer APIs cannot serve reliably.
const EXPLORER_EXCLUDED: [Method; 3] = [Method::Call, Method::EstimateGas, Method::SendTransaction];

/// Explorer-backed [`ChainDataSource`].
pub struct ExplorerSource {
    chain: ChainName,
    client: Client,
    endpoint: Url,
    host: String,
    api_key: Option<String>,
    family: ExplorerFamily,
    capabilities: CapabilitySet,
    limiter: ExplorerRateLimiter,
    label: String,
}

impl ExplorerSource {
    /// Builds a source for one configured explorer; fails if the url has no host.
    pub fn new(
        chain: ChainName,
        config: &BlockExplorer,
        limiter: ExplorerRateLimiter,
        request_timeout: Duration,
    ) -> Result<Self, SourceError> {
        let client = Client::builder()
            .pool_max_idle_per_host(4)
            .connect_timeout(Duration::from_secs(10))
            .timeout(request_timeout)
            .build()?;

        let endpoint = api_endpoint(&config.api_url);
        let host = config
            .api_url
            .host_str()
            .ok_or_else(|| {
                SourceError::InvalidRequest(format!(
                    "explorer url '{}' has no host",
                    config.api_url
                ))
            })?
            .to_string();

        Ok(Self {
            label: format!("explorer:{host}"),
            chain,
            client,
            endpoint,
            host,
            api_key: config.api_key.clone(),
            family: config.family,
            capabilities: capabilities_for(config.family),
            limiter,
        })
    }

    /// Keyless access shares the host's free tier and is throttled.
    pub fn is_community_resource(&self) -> bool {
        self.api_key.is_none()
    }

    async fn query(&self, mut params: QueryParams) -> Result<serde_json::Value, SourceError> {
        if let Some(key) = &self.api_key {
            params.push(("apikey", key.clone()));
        }

        let _turn = if self.is_community_resource() {
            Some(self.limiter.acquire(&self.host).await)
        } else {
            None
        };

        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SourceError::HttpStatus(response.status().as_u16()));
        }

        let envelope: ExplorerEnvelope = response.json().await?;
        envelope.into_result()
    }
}

impl fmt::Debug for ExplorerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExplorerSource")
            .field("chain", &self.chain)
            .field("endpoint", &self.host)
            .field("family", &self.family)
            .field("keyed", &self.api_key.is_some())
            .field("capabilities", &self.capabilities.len())
            .finish()
    }
}

#[async_trait]
impl ChainDataSource for ExplorerSource {
    fn label(&self) -> &str {
        &self.label
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Explorer
    }

    fn capabilities(&self) -> CapabilitySet {
        self.capabilities
    }

    async fn perform(&self, request: &ChainRequest) -> Result<ChainResponse, SourceError> {
        let method = request.method();
        if !self.capabilities.contains(method) {
            return Err(SourceError::UnsupportedMethod { method });
        }

        let params = query_params(request)?;
        let started = Instant::now();
        let result = self
            .query(params)
            .await
            .and_then(|value| parse_result(request, value));

        let status = if result.is_ok() { "ok" } else { "error" };
        scout_observability::record_source_call(
            self.chain.as_str(),
            self.kind().as_str(),
            method.as_str(),
            status,
            started.elapsed(),
        );
        tracing::trace!(
            chain = %self.chain,
            source = %self.label,
            %method,
            status,
            "Explorer request finished"
        );

        result
    }
}

fn capabilities_for(family: ExplorerFamily) -> CapabilitySet {
    if family.is_etherscan_compatible() {
        CapabilitySet::all_except(&EXPLORER_EXCLUDED)
    } else {
        CapabilitySet::empty()
    }
}

/// `{base}/api`, unless the configured url already points at the api path.
fn api_endpoint(base: &Url) -> Url {
    let path = base.path().trim_end_matches('/');
    if path.ends_with("/api") {
        return base.clone();
    }
    let mut endpoint = base.clone();
    endpoint.set_path(&format!("{path}/api"));
    endpoint
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn explorer(api_url: &str, api_key: Option<&str>, family: ExplorerFamily) -> ExplorerSource {
        let config = BlockExplorer {
            api_url: api_url.parse().unwrap(),
            api_key: api_key.map(str::to_string),
            family,
        };
        ExplorerSource::new(
            ChainName::from("test"),
            &config,
            ExplorerRateLimiter::new(Duration::from_secs(6)),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn api_path_is_appended_once() {
        let base: Url = "https://api.etherscan.io".parse().unwrap();
        assert_eq!(api_endpoint(&base).as_str(), "https://api.etherscan.io/api");
        let with_api: Url = "https://explorer.example/api/".parse().unwrap();
        assert_eq!(api_endpoint(&with_api).as_str(), "https://explorer.example/api/");
    }

    #[test]
    fn explorer_excludes_write_and_call_methods() {
        let source = explorer("https://api.etherscan.io", None, ExplorerFamily::Etherscan);
        let caps = source.capabilities();
        assert!(!caps.contains(Method::Call));
        assert!(!caps.contains(Method::EstimateGas));
        assert!(!caps.contains(Method::SendTransaction));
        assert!(caps.contains(Method::GetLogs));
        assert!(caps.contains(Method::GetTransactionReceipt));
        assert_eq!(source.label(), "explorer:api.etherscan.io");
    }

    #[test]
    fn other_family_has_no_capabilities() {
        let source = explorer("https://scan.example", None, ExplorerFamily::Other);
        assert!(source.capabilities().is_empty());
    }

    #[test]
    fn keyed_access_is_not_community() {
        assert!(
            explorer("https://a.example", None, ExplorerFamily::Blockscout).is_community_resource()
        );
        assert!(
            !explorer("https://a.example", Some("KEY"), ExplorerFamily::Blockscout)
                .is_community_resource()
        );
    }

    #[test]
    fn debug_output_hides_api_key() {
        let source = explorer("https://a.example", Some("SECRET"), ExplorerFamily::Etherscan);
        let rendered = format!("{source:?}");
        assert!(!rendered.contains("SECRET"));
        assert!(rendered.contains("keyed: true"));
    }

    #[tokio::test]
    async fn unsupported_method_is_rejected_without_request() {
        let source = explorer("https://a.example", None, ExplorerFamily::Etherscan);
        let err = source
            .perform(&ChainRequest::EstimateGas { tx: Box::default() })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SourceError::UnsupportedMethod {
                method: Method::EstimateGas
            }
        ));
        // No request means the host never entered the throttle map.
        assert_eq!(source.limiter.tracked_hosts(), 0);
    }
}
