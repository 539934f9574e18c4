use crate::error::HttpError;
use bytes::Bytes;
use http::{HeaderMap, Response, StatusCode};
use http_body_util::BodyExt;
use std::time::{Duration, SystemTime};

/// Boxed response body, already passed through the decompression layer.
pub type ResponseBody =
    http_body_util::combinators::BoxBody<Bytes, Box<dyn std::error::Error + Send + Sync>>;

/// Parse the `Retry-After` header into a delay.
///
/// Accepts delta-seconds (`"120"`) and HTTP-date values. Returns `None` when
/// the header is missing, malformed, negative or names a moment already past.
#[must_use]
pub fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(http::header::RETRY_AFTER)?.to_str().ok()?.trim();

    if let Ok(seconds) = value.parse::<i64>() {
        return u64::try_from(seconds).ok().map(Duration::from_secs);
    }

    let at = httpdate::parse_http_date(value).ok()?;
    at.duration_since(SystemTime::now()).ok()
}

/// Read a whole body, failing once more than `limit` decompressed bytes arrive.
///
/// The response is consumed, so its body is released when this returns
/// regardless of the outcome.
///
/// # Errors
/// Returns `HttpError::BodyTooLarge` past the limit and `HttpError::Transport`
/// if the stream fails.
pub async fn read_body_limited(
    response: Response<ResponseBody>,
    limit: usize,
) -> Result<Bytes, HttpError> {
    let mut body = std::pin::pin!(response.into_body());
    let mut collected = Vec::new();

    while let Some(frame) = body.frame().await {
        let frame = frame.map_err(HttpError::Transport)?;
        if let Some(chunk) = frame.data_ref() {
            let actual = collected.len() + chunk.len();
            if actual > limit {
                return Err(HttpError::BodyTooLarge { limit, actual });
            }
            collected.extend_from_slice(chunk);
        }
    }

    Ok(Bytes::from(collected))
}

/// Response returned by [`crate::HttpClient::execute`].
///
/// Every status is returned as-is; interpreting non-2xx is the caller's job.
#[derive(Debug)]
pub struct HttpResponse {
    pub(crate) inner: Response<ResponseBody>,
    pub(crate) max_body_size: usize,
}

impl HttpResponse {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.inner.status()
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    /// Configured limit applied by [`Self::bytes`]
    #[must_use]
    pub fn max_body_size(&self) -> usize {
        self.max_body_size
    }

    /// Unwrap into the underlying response, body unread.
    #[must_use]
    pub fn into_inner(self) -> Response<ResponseBody> {
        self.inner
    }

    /// Read the full body under the configured `max_body_size`.
    ///
    /// # Errors
    /// Returns `HttpError::BodyTooLarge` if the body exceeds the limit.
    pub async fn bytes(self) -> Result<Bytes, HttpError> {
        read_body_limited(self.inner, self.max_body_size).await
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use http_body_util::Full;

    fn retry_after(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(http::header::RETRY_AFTER, value.parse().unwrap());
        headers
    }

    fn response(body: &'static [u8]) -> Response<ResponseBody> {
        let body: ResponseBody = Full::new(Bytes::from_static(body))
            .map_err(|never| match never {})
            .boxed();
        Response::new(body)
    }

    #[test]
    fn test_parse_retry_after_seconds() {
        assert_eq!(
            parse_retry_after(&retry_after("120")),
            Some(Duration::from_secs(120))
        );
        assert_eq!(
            parse_retry_after(&retry_after("  7 ")),
            Some(Duration::from_secs(7))
        );
        assert_eq!(parse_retry_after(&retry_after("0")), Some(Duration::ZERO));
    }

    #[test]
    fn test_parse_retry_after_rejects_garbage() {
        assert_eq!(parse_retry_after(&HeaderMap::new()), None);
        assert_eq!(parse_retry_after(&retry_after("soon")), None);
        assert_eq!(parse_retry_after(&retry_after("-5")), None);
    }

    #[test]
    fn test_parse_retry_after_http_date() {
        assert_eq!(
            parse_retry_after(&retry_after("Wed, 21 Oct 2015 07:28:00 GMT")),
            None
        );

        let future = httpdate::fmt_http_date(SystemTime::now() + Duration::from_secs(60));
        let delay = parse_retry_after(&retry_after(&future)).unwrap();
        assert!((58..=60).contains(&delay.as_secs()));
    }

    #[tokio::test]
    async fn test_read_body_within_limit() {
        let bytes = read_body_limited(response(b"{\"id\":\"ocid1\"}"), 64)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"{\"id\":\"ocid1\"}");
    }

    #[tokio::test]
    async fn test_read_body_over_limit() {
        let err = read_body_limited(response(b"0123456789"), 4)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            HttpError::BodyTooLarge {
                limit: 4,
                actual: 10
            }
        ));
    }
}
