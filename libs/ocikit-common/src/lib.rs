#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Operation dispatch shared by every ocikit service client.
//!
//! A service client describes each API operation with an [`Operation`]
//! constant plus a request type implementing [`OciRequest`] and a response
//! type implementing [`OciResponse`]. [`Dispatcher::call`] does the rest:
//!
//! - renders the request once into a single HTTP request
//! - attaches an `opc-retry-token` to create and action operations
//! - runs attempts under the request's [`RetryPolicy`] (single attempt when none)
//! - honours cancellation and deadlines from the [`CallContext`]
//! - turns non-2xx answers into [`OciError::Service`] with the raw response attached
//!
//! ```rust,ignore
//! let dispatcher = ClientConfig::from_figment(&figment, "oci")?
//!     .build_dispatcher("iaas", "/20160918")?;
//! let vcn: GetVcnResponse = dispatcher.call(&CallContext::new(), &GET_VCN, &request).await?;
//! ```

pub mod config;
pub mod context;
pub mod dispatch;
pub mod endpoint;
pub mod error;
pub mod headers;
pub mod humantime_serde;
pub mod pager;
pub mod request;
pub mod response;
pub mod retry;
pub mod token;
pub mod transport;

pub use config::{ClientConfig, DEFAULT_REALM_DOMAIN};
pub use context::CallContext;
pub use dispatch::Dispatcher;
pub use endpoint::Endpoint;
pub use error::{OciError, ServiceError};
pub use pager::{ItemsPager, Page, PagesPager};
pub use request::{OciRequest, Operation, OperationKind, PreparedRequest, RequestParts};
pub use response::{OciResponse, RawResponse};
pub use retry::{ExponentialBackoff, RetryPolicy, RetryPredicate, RetryTrigger};
pub use token::{RETRY_TOKEN_VALIDITY, generate_retry_token};
pub use transport::Transport;

pub use tokio_util::sync::CancellationToken;
