use crate::error::OciError;
use url::Url;

/// Base URL every operation path of one service is appended to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    base_url: String,
}

impl Endpoint {
    /// Regional endpoint: `https://{service}.{region}.{realm_domain}{base_path}`.
    #[must_use]
    pub fn for_service(service: &str, region: &str, realm_domain: &str, base_path: &str) -> Self {
        Self {
            base_url: join(&format!("https://{service}.{region}.{realm_domain}"), base_path),
        }
    }

    /// Explicit host override (private endpoints, mock servers).
    ///
    /// # Errors
    /// Returns `OciError::Config` unless `url` is an absolute `http(s)` URL
    /// with a host.
    pub fn from_url(url: &str, base_path: &str) -> Result<Self, OciError> {
        let parsed =
            Url::parse(url).map_err(|e| OciError::Config(format!("invalid endpoint '{url}': {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(OciError::Config(format!(
                "endpoint '{url}' must be an absolute http(s) URL"
            )));
        }
        Ok(Self {
            base_url: join(url, base_path),
        })
    }

    /// Base URL without trailing slash
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

fn join(host: &str, base_path: &str) -> String {
    let host = host.trim_end_matches('/');
    let path = base_path.trim_matches('/');
    if path.is_empty() {
        host.to_owned()
    } else {
        format!("{host}/{path}")
    }
}
