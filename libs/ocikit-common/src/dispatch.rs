//! The single entry point every typed operation goes through.

use crate::context::CallContext;
use crate::endpoint::Endpoint;
use crate::error::{OciError, ServiceError};
use crate::headers::OPC_RETRY_TOKEN;
use crate::request::{OciRequest, Operation, PreparedRequest};
use crate::response::{OciResponse, RawResponse};
use crate::retry::{RetryPolicy, RetryScope, run_with_retry};
use crate::token::generate_retry_token;
use crate::transport::Transport;
use bytes::Bytes;
use http::HeaderValue;
use ocikit_http::{HttpClientConfig, HttpError, read_body_limited};
use std::sync::Arc;
use tracing::Instrument;

/// Renders typed requests, sends them with retries and decodes the answer.
///
/// Holds no mutable state; clones share the transport.
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    endpoint: Endpoint,
    max_body_size: usize,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("endpoint", &self.endpoint)
            .field("max_body_size", &self.max_body_size)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, endpoint: Endpoint) -> Self {
        Self {
            transport,
            endpoint,
            max_body_size: HttpClientConfig::default().max_body_size,
        }
    }

    /// Cap on decompressed response body size per attempt.
    #[must_use]
    pub fn with_max_body_size(mut self, max_body_size: usize) -> Self {
        self.max_body_size = max_body_size;
        self
    }

    #[must_use]
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Dispatch `req` as operation `op` and decode the successful answer as `Resp`.
    ///
    /// The request is rendered once and replayed unchanged on every attempt.
    /// Create and action operations carry an `opc-retry-token`, generated here
    /// when the caller did not supply one, so retried attempts stay
    /// idempotent on the service side.
    ///
    /// # Errors
    /// - `InvalidRequest` if rendering fails; nothing is sent
    /// - `Transport` or `Service` from the last attempt
    /// - `Decode` if a 2xx body does not match `Resp`
    /// - `Cancelled` / `DeadlineExceeded` from the call context
    pub async fn call<Req, Resp>(
        &self,
        ctx: &CallContext,
        op: &Operation,
        req: &Req,
    ) -> Result<Resp, OciError>
    where
        Req: OciRequest + ?Sized,
        Resp: OciResponse,
    {
        let span = tracing::debug_span!("oci_call", operation = op.name, method = %op.method);
        async {
            let default_policy;
            let policy = match req.retry_policy() {
                Some(policy) => policy,
                None => {
                    default_policy = RetryPolicy::no_retry();
                    &default_policy
                }
            };

            let mut parts = req.to_parts(op);
            if op.kind.requires_retry_token() {
                let token = HeaderValue::from_str(&generate_retry_token())
                    .map_err(|e| OciError::invalid(op.name, e.to_string()))?;
                if parts.insert_header_if_absent(OPC_RETRY_TOKEN, token) {
                    tracing::trace!("Generated opc-retry-token");
                }
            }
            let has_retry_token = parts.headers().contains_key(OPC_RETRY_TOKEN);
            let prepared = parts.render(&self.endpoint)?;

            let scope = RetryScope {
                operation: op.name,
                method: prepared.method(),
                has_retry_token,
            };
            let raw = run_with_retry(ctx, policy, scope, |attempt| {
                self.attempt(op.name, &prepared, attempt)
            })
            .await?;

            Resp::from_raw(raw)
        }
        .instrument(span)
        .await
    }

    /// One exchange: send, read the whole body, classify by status.
    ///
    /// An error answer whose body exceeds the size cap still becomes a
    /// service error, with an empty body.
    async fn attempt(
        &self,
        operation: &'static str,
        prepared: &PreparedRequest,
        attempt: usize,
    ) -> Result<RawResponse, OciError> {
        tracing::trace!(attempt, uri = %prepared.uri(), "Sending request");

        let response = self.transport.send(prepared.to_http()).await?;
        let status = response.status();
        let headers = response.headers().clone();

        if status.is_success() {
            let body = read_body_limited(response, self.max_body_size).await?;
            return Ok(RawResponse::new(operation, status, headers, body));
        }

        let body = match read_body_limited(response, self.max_body_size).await {
            Ok(body) => body,
            Err(HttpError::BodyTooLarge { limit, actual }) => {
                tracing::debug!(
                    status = status.as_u16(),
                    limit,
                    actual,
                    "Error body over size limit, discarded"
                );
                Bytes::new()
            }
            Err(e) => return Err(e.into()),
        };
        Err(ServiceError::from_raw(RawResponse::new(operation, status, headers, body)).into())
    }
}
