use async_trait::async_trait;
use bytes::Bytes;
use http::{Request, Response};
use http_body_util::Full;
use ocikit_http::{HttpClient, HttpError, ResponseBody};

/// The one seam between dispatch and the network.
///
/// Implementations perform a single exchange and return every status as-is.
/// Tests substitute their own implementation to script responses.
#[async_trait]
pub trait Transport: Send + Sync {
    /// # Errors
    /// Returns `HttpError` when no response was received.
    async fn send(&self, request: Request<Full<Bytes>>) -> Result<Response<ResponseBody>, HttpError>;
}

#[async_trait]
impl Transport for HttpClient {
    async fn send(&self, request: Request<Full<Bytes>>) -> Result<Response<ResponseBody>, HttpError> {
        Ok(self.execute(request).await?.into_inner())
    }
}
