#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![warn(warnings)]

//! Shared HTTPS transport for `ocikit` service clients
//!
//! This crate provides the hyper-based connection pool that every generated
//! operation is dispatched through:
//! - Automatic TLS via rustls (HTTPS only by default)
//! - Connection pooling shared by all concurrent calls
//! - Per-attempt timeouts
//! - Default header injection (`User-Agent`, `Accept`, `opc-client-info`)
//! - An optional signing layer that runs once per attempt
//! - Concurrency limiting with fail-fast load shedding
//! - Transparent response decompression (gzip, brotli, deflate)
//!
//! There are no retries at this layer. Each [`HttpClient::execute`] is one
//! round trip; the per-call retry policy is applied by the dispatcher in
//! `ocikit-common`.
//!
//! # Example
//!
//! ```ignore
//! use ocikit_http::HttpClient;
//! use std::time::Duration;
//!
//! let client = HttpClient::builder()
//!     .timeout(Duration::from_secs(60))
//!     .user_agent("my-tool/1.0")
//!     .build()?;
//!
//! let request = http::Request::get("https://iaas.us-ashburn-1.oraclecloud.com/20160918/vcns")
//!     .body(http_body_util::Full::new(bytes::Bytes::new()))?;
//! let body = client.execute(request).await?.bytes().await?;
//! ```

mod builder;
mod client;
mod config;
mod error;
mod layers;
mod response;
mod tls;

pub use builder::HttpClientBuilder;
pub use client::HttpClient;
pub use config::{
    DEFAULT_USER_AGENT, HttpClientConfig, RateLimitConfig, TlsRootConfig, TransportSecurity,
};
pub use error::{HttpError, InvalidUriKind};
pub use layers::{DefaultHeadersLayer, DefaultHeadersService};
pub use response::{HttpResponse, ResponseBody, parse_retry_after, read_body_limited};
