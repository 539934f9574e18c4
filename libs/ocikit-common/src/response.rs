use crate::error::OciError;
use crate::headers::{ETAG, OPC_NEXT_PAGE, OPC_REQUEST_ID, OPC_WORK_REQUEST_ID};
use bytes::Bytes;
use http::{HeaderMap, HeaderName, StatusCode};
use serde::de::DeserializeOwned;

/// A response as received, body fully read.
#[derive(Debug, Clone)]
pub struct RawResponse {
    operation: &'static str,
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl RawResponse {
    #[must_use]
    pub fn new(operation: &'static str, status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            operation,
            status,
            headers,
            body,
        }
    }

    /// Name of the operation that produced this response
    #[must_use]
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Header value as a string; non-UTF-8 values read as absent.
    #[must_use]
    pub fn header_str(&self, name: &HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    #[must_use]
    pub fn etag(&self) -> Option<&str> {
        self.header_str(&ETAG)
    }

    #[must_use]
    pub fn opc_request_id(&self) -> Option<&str> {
        self.header_str(&OPC_REQUEST_ID)
    }

    #[must_use]
    pub fn opc_work_request_id(&self) -> Option<&str> {
        self.header_str(&OPC_WORK_REQUEST_ID)
    }

    #[must_use]
    pub fn opc_next_page(&self) -> Option<&str> {
        self.header_str(&OPC_NEXT_PAGE)
    }

    /// Decode the JSON body.
    ///
    /// # Errors
    /// Returns `OciError::Decode` if the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, OciError> {
        serde_json::from_slice(&self.body).map_err(|source| OciError::Decode {
            operation: self.operation,
            source,
        })
    }
}

/// Typed projection of a successful [`RawResponse`].
pub trait OciResponse: Sized {
    /// # Errors
    /// Returns `OciError::Decode` when the payload cannot be decoded.
    fn from_raw(raw: RawResponse) -> Result<Self, OciError>;
}

impl OciResponse for RawResponse {
    fn from_raw(raw: RawResponse) -> Result<Self, OciError> {
        Ok(raw)
    }
}
