use crate::error::HttpError;
use http::header::{ACCEPT, USER_AGENT};
use http::{HeaderMap, HeaderName, HeaderValue, Request, Response};
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// Header identifying the calling SDK to the service.
const CLIENT_INFO: HeaderName = HeaderName::from_static("opc-client-info");

/// Tower layer that fills in headers every service request carries.
///
/// A header already present on the request is left untouched.
#[derive(Clone)]
pub struct DefaultHeadersLayer {
    headers: Arc<HeaderMap>,
}

impl DefaultHeadersLayer {
    /// Defaults for `User-Agent`, `Accept: application/json` and, when given,
    /// `opc-client-info`.
    ///
    /// # Errors
    /// Returns `HttpError::InvalidHeaderValue` if a value is not a valid header value
    pub fn try_new(user_agent: &str, client_info: Option<&str>) -> Result<Self, HttpError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_str(user_agent)?);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(info) = client_info {
            headers.insert(CLIENT_INFO, HeaderValue::from_str(info)?);
        }
        Ok(Self {
            headers: Arc::new(headers),
        })
    }
}

impl<S> Layer<S> for DefaultHeadersLayer {
    type Service = DefaultHeadersService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        DefaultHeadersService {
            inner,
            headers: Arc::clone(&self.headers),
        }
    }
}

/// Service produced by [`DefaultHeadersLayer`]
#[derive(Clone)]
pub struct DefaultHeadersService<S> {
    inner: S,
    headers: Arc<HeaderMap>,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for DefaultHeadersService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let target = req.headers_mut();
        for (name, value) in self.headers.iter() {
            if !target.contains_key(name) {
                target.insert(name.clone(), value.clone());
            }
        }
        self.inner.call(req)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::{Method, StatusCode};
    use http_body_util::Full;
    use std::sync::Mutex;
    use tower::ServiceExt;

    /// Records the headers of the last request it saw.
    #[derive(Clone, Default)]
    struct CaptureService {
        seen: Arc<Mutex<Option<HeaderMap>>>,
    }

    impl Service<Request<Full<Bytes>>> for CaptureService {
        type Response = Response<Full<Bytes>>;
        type Error = Box<dyn std::error::Error + Send + Sync>;
        type Future = std::future::Ready<Result<Self::Response, Self::Error>>;

        fn poll_ready(&mut self, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, req: Request<Full<Bytes>>) -> Self::Future {
            *self.seen.lock().unwrap() = Some(req.headers().clone());
            std::future::ready(Ok(Response::builder()
                .status(StatusCode::OK)
                .body(Full::new(Bytes::new()))
                .unwrap()))
        }
    }

    fn request() -> http::request::Builder {
        Request::builder()
            .method(Method::GET)
            .uri("https://iaas.us-phoenix-1.oraclecloud.com/20160918/vcns")
    }

    #[tokio::test]
    async fn test_defaults_added() {
        let capture = CaptureService::default();
        let layer = DefaultHeadersLayer::try_new("ocikit-test/1.0", Some("ocikit-test")).unwrap();
        let svc = layer.layer(capture.clone());

        let req = request().body(Full::new(Bytes::new())).unwrap();
        svc.oneshot(req).await.unwrap();

        let headers = capture.seen.lock().unwrap().take().unwrap();
        assert_eq!(headers[USER_AGENT], "ocikit-test/1.0");
        assert_eq!(headers[ACCEPT], "application/json");
        assert_eq!(headers["opc-client-info"], "ocikit-test");
    }

    #[tokio::test]
    async fn test_existing_headers_not_overwritten() {
        let capture = CaptureService::default();
        let layer = DefaultHeadersLayer::try_new("ocikit-test/1.0", None).unwrap();
        let svc = layer.layer(capture.clone());

        let req = request()
            .header(USER_AGENT, "custom/2.0")
            .header(ACCEPT, "text/plain")
            .body(Full::new(Bytes::new()))
            .unwrap();
        svc.oneshot(req).await.unwrap();

        let headers = capture.seen.lock().unwrap().take().unwrap();
        assert_eq!(headers[USER_AGENT], "custom/2.0");
        assert_eq!(headers[ACCEPT], "text/plain");
        assert!(!headers.contains_key("opc-client-info"));
    }

    #[test]
    fn test_invalid_value_rejected() {
        assert!(DefaultHeadersLayer::try_new("invalid\x00agent", None).is_err());
        assert!(DefaultHeadersLayer::try_new("ok", Some("bad\nvalue")).is_err());
    }
}
