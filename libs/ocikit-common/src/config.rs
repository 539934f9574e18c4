use crate::dispatch::Dispatcher;
use crate::endpoint::Endpoint;
use crate::error::OciError;
use figment::Figment;
use ocikit_http::{HttpClient, HttpClientBuilder, HttpClientConfig, TransportSecurity};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Realm domain of the commercial cloud.
pub const DEFAULT_REALM_DOMAIN: &str = "oraclecloud.com";

/// Client settings loaded from configuration.
///
/// ```yaml
/// oci:
///   region: eu-frankfurt-1
///   request_timeout: 30s
///   client_info: my-tool/1.2
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    pub region: String,
    pub realm_domain: String,
    /// Full base URL replacing the regional endpoint (private endpoints, mocks)
    pub endpoint: Option<String>,
    /// Per-attempt timeout
    #[serde(with = "crate::humantime_serde")]
    pub request_timeout: Duration,
    pub user_agent: Option<String>,
    /// Sent as `opc-client-info`
    pub client_info: Option<String>,
    pub max_body_size: usize,
    /// Permit `http://` endpoints; for local mock servers only
    pub allow_insecure_http: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let http = HttpClientConfig::default();
        Self {
            region: String::new(),
            realm_domain: DEFAULT_REALM_DOMAIN.to_owned(),
            endpoint: None,
            request_timeout: http.request_timeout,
            user_agent: None,
            client_info: None,
            max_body_size: http.max_body_size,
            allow_insecure_http: false,
        }
    }
}

impl ClientConfig {
    /// Extract the section under `key`; a missing section yields defaults.
    ///
    /// # Errors
    /// Returns `OciError::Config` when the section is malformed.
    pub fn from_figment(figment: &Figment, key: &str) -> Result<Self, OciError> {
        if !figment.contains(key) {
            return Ok(Self::default());
        }
        figment
            .focus(key)
            .extract()
            .map_err(|e| OciError::Config(format!("failed to load '{key}': {e}")))
    }

    /// Endpoint for one service: the override when set, the regional URL
    /// otherwise.
    ///
    /// # Errors
    /// Returns `OciError::Config` when neither an override nor a region is
    /// configured, or the override is not a valid URL.
    pub fn endpoint_for(&self, service: &str, base_path: &str) -> Result<Endpoint, OciError> {
        if let Some(url) = &self.endpoint {
            return Endpoint::from_url(url, base_path);
        }
        if self.region.is_empty() {
            return Err(OciError::Config(
                "either 'region' or 'endpoint' must be set".to_owned(),
            ));
        }
        Ok(Endpoint::for_service(
            service,
            &self.region,
            &self.realm_domain,
            base_path,
        ))
    }

    /// Transport settings derived from this configuration.
    #[must_use]
    pub fn http_config(&self) -> HttpClientConfig {
        let mut http = HttpClientConfig {
            request_timeout: self.request_timeout,
            max_body_size: self.max_body_size,
            client_info: self.client_info.clone(),
            ..HttpClientConfig::default()
        };
        if let Some(user_agent) = &self.user_agent {
            http.user_agent.clone_from(user_agent);
        }
        if self.allow_insecure_http {
            http.transport = TransportSecurity::AllowInsecureHttp;
        }
        http
    }

    /// Build a dispatcher for one service over a fresh HTTPS client.
    ///
    /// # Errors
    /// Returns `OciError::Config` for endpoint problems and
    /// `OciError::Transport` if the client cannot be built.
    pub fn build_dispatcher(&self, service: &str, base_path: &str) -> Result<Dispatcher, OciError> {
        let endpoint = self.endpoint_for(service, base_path)?;
        let client: HttpClient = HttpClientBuilder::with_config(self.http_config()).build()?;
        Ok(Dispatcher::new(Arc::new(client), endpoint).with_max_body_size(self.max_body_size))
    }
}
