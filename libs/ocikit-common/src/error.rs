use crate::response::RawResponse;
use http::StatusCode;
use ocikit_http::HttpError;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Error returned by every dispatched operation.
///
/// A typed response only exists on success. When the service answers with a
/// non-2xx status the raw response is carried by [`OciError::Service`] and
/// reachable through [`OciError::raw_response`].
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum OciError {
    /// The request could not be rendered; nothing was sent
    #[error("Invalid {operation} request: {reason}")]
    InvalidRequest {
        operation: &'static str,
        reason: String,
    },

    /// The exchange failed before a response arrived (includes per-attempt timeouts)
    #[error("Transport error: {0}")]
    Transport(#[from] HttpError),

    /// The service answered with a non-2xx status
    #[error("{0}")]
    Service(Box<ServiceError>),

    /// A 2xx body did not match the expected shape
    #[error("Failed to decode {operation} response: {source}")]
    Decode {
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The call context was cancelled
    #[error("Call cancelled")]
    Cancelled,

    /// The call context deadline passed; carries the time spent in the call
    #[error("Call deadline exceeded after {0:?}")]
    DeadlineExceeded(Duration),

    /// Client configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),
}

impl OciError {
    pub(crate) fn invalid(operation: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            operation,
            reason: reason.into(),
        }
    }

    /// Raw response attached to a service error, for diagnostics.
    #[must_use]
    pub fn raw_response(&self) -> Option<&RawResponse> {
        match self {
            Self::Service(err) => Some(&err.raw),
            _ => None,
        }
    }

    /// HTTP status of a service error.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Service(err) => Some(err.status),
            _ => None,
        }
    }

    /// Service error code such as `NotAuthorizedOrNotFound`.
    #[must_use]
    pub fn service_code(&self) -> Option<&str> {
        match self {
            Self::Service(err) => Some(&err.code),
            _ => None,
        }
    }
}

impl From<ServiceError> for OciError {
    fn from(err: ServiceError) -> Self {
        Self::Service(Box::new(err))
    }
}

/// Error body returned by the service: `{"code": "...", "message": "..."}`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ErrorBody {
    code: String,
    message: String,
}

/// A non-2xx answer from the service.
pub struct ServiceError {
    pub status: StatusCode,
    /// Service error code; falls back to the status reason when the body has none
    pub code: String,
    pub message: String,
    pub opc_request_id: Option<String>,
    /// Full response as received
    pub raw: RawResponse,
}

impl ServiceError {
    /// Build from a non-2xx response; an unparseable body leaves `message` empty.
    #[must_use]
    pub fn from_raw(raw: RawResponse) -> Self {
        let body: ErrorBody = serde_json::from_slice(raw.body()).unwrap_or_default();
        let status = raw.status();
        let code = if body.code.is_empty() {
            status.canonical_reason().unwrap_or("Unknown").to_owned()
        } else {
            body.code
        };

        Self {
            status,
            code,
            message: body.message,
            opc_request_id: raw.opc_request_id().map(ToOwned::to_owned),
            raw,
        }
    }
}

impl fmt::Debug for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceError")
            .field("operation", &self.raw.operation())
            .field("status", &self.status)
            .field("code", &self.code)
            .field("message", &self.message)
            .field("opc_request_id", &self.opc_request_id)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} failed with {} {}",
            self.raw.operation(),
            self.status.as_u16(),
            self.code
        )?;
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(id) = &self.opc_request_id {
            write!(f, " (opc-request-id: {id})")?;
        }
        Ok(())
    }
}
