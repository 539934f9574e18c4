//! Per-call retry policy and the executor that applies it.

use crate::context::CallContext;
use crate::error::OciError;
use http::Method;
use ocikit_http::{HttpError, parse_retry_after};
use rand::Rng;
use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Conditions that make a failed attempt eligible for retry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum RetryTrigger {
    /// Connection refused, reset, DNS failure, TLS failure
    TransportError,
    /// Per-attempt timeout
    Timeout,
    /// Any service error with this HTTP status
    Status(u16),
    /// Service error with this status and error code
    Code { status: u16, code: &'static str },
}

impl RetryTrigger {
    pub const INCORRECT_STATE: Self = Self::Code {
        status: 409,
        code: "IncorrectState",
    };
    pub const TOO_MANY_REQUESTS: Self = Self::Status(429);
    pub const INTERNAL_SERVER_ERROR: Self = Self::Status(500);
    pub const BAD_GATEWAY: Self = Self::Status(502);
    pub const SERVICE_UNAVAILABLE: Self = Self::Status(503);
    pub const GATEWAY_TIMEOUT: Self = Self::Status(504);
}

/// Check if HTTP method is idempotent per RFC 9110.
#[must_use]
pub fn is_idempotent_method(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::PUT | Method::DELETE | Method::OPTIONS | Method::TRACE
    )
}

/// Exponential backoff: `min(initial * multiplier^attempt, max)`, plus up to
/// 25% jitter when enabled.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    pub initial: Duration,
    pub max: Duration,
    pub multiplier: f64,
    pub jitter: bool,
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(1),
            max: Duration::from_secs(30),
            multiplier: 2.0,
            jitter: true,
        }
    }
}

impl ExponentialBackoff {
    #[must_use]
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max,
            ..Default::default()
        }
    }

    /// 1ms initial, 100ms max, no jitter
    #[must_use]
    pub fn fast() -> Self {
        Self {
            initial: Duration::from_millis(1),
            max: Duration::from_millis(100),
            multiplier: 2.0,
            jitter: false,
        }
    }
}

/// Custom retry decision consulted in addition to the trigger set.
pub type RetryPredicate = Arc<dyn Fn(&OciError) -> bool + Send + Sync>;

/// Retry policy selected per call.
///
/// Errors raised before anything reached the wire, decode errors,
/// cancellation and deadline expiry are never retried, whatever the policy
/// says. Transport errors and timeouts on a non-idempotent method are only
/// retried when the request carries an `opc-retry-token`.
#[derive(Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt; total attempts = 1 + `max_retries`
    pub max_retries: usize,
    pub backoff: ExponentialBackoff,
    pub retry_on: HashSet<RetryTrigger>,
    pub predicate: Option<RetryPredicate>,
    /// Ignore the `Retry-After` header and always use the backoff curve
    pub ignore_retry_after: bool,
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_retries", &self.max_retries)
            .field("backoff", &self.backoff)
            .field("retry_on", &self.retry_on)
            .field("predicate", &self.predicate.is_some())
            .field("ignore_retry_after", &self.ignore_retry_after)
            .finish()
    }
}

impl Default for RetryPolicy {
    /// Eight attempts with jittered exponential backoff capped at 30 seconds.
    fn default() -> Self {
        Self {
            max_retries: 7,
            backoff: ExponentialBackoff::default(),
            retry_on: HashSet::from([
                RetryTrigger::TransportError,
                RetryTrigger::Timeout,
                RetryTrigger::INCORRECT_STATE,
                RetryTrigger::TOO_MANY_REQUESTS,
                RetryTrigger::INTERNAL_SERVER_ERROR,
                RetryTrigger::BAD_GATEWAY,
                RetryTrigger::SERVICE_UNAVAILABLE,
                RetryTrigger::GATEWAY_TIMEOUT,
            ]),
            predicate: None,
            ignore_retry_after: false,
        }
    }
}

impl RetryPolicy {
    /// Single attempt
    #[must_use]
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            backoff: ExponentialBackoff::default(),
            retry_on: HashSet::new(),
            predicate: None,
            ignore_retry_after: false,
        }
    }

    #[must_use]
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    #[must_use]
    pub fn with_backoff(mut self, backoff: ExponentialBackoff) -> Self {
        self.backoff = backoff;
        self
    }

    #[must_use]
    pub fn retry_on(mut self, trigger: RetryTrigger) -> Self {
        self.retry_on.insert(trigger);
        self
    }

    #[must_use]
    pub fn with_predicate(
        mut self,
        predicate: impl Fn(&OciError) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    #[must_use]
    pub fn ignore_retry_after(mut self, ignore: bool) -> Self {
        self.ignore_retry_after = ignore;
        self
    }

    /// Trigger under which `err` should be retried, if any.
    ///
    /// A predicate match with no matching trigger reports the error's own
    /// classification.
    #[must_use]
    pub fn should_retry(
        &self,
        err: &OciError,
        method: &Method,
        has_retry_token: bool,
    ) -> Option<RetryTrigger> {
        let candidates = classify(err)?;

        if matches!(
            candidates.primary,
            RetryTrigger::TransportError | RetryTrigger::Timeout
        ) && !is_idempotent_method(method)
            && !has_retry_token
        {
            return None;
        }

        let matched = [Some(candidates.primary), candidates.code]
            .into_iter()
            .flatten()
            .find(|t| self.retry_on.contains(t));

        match (matched, &self.predicate) {
            (Some(trigger), _) => Some(trigger),
            (None, Some(predicate)) if predicate(err) => Some(candidates.primary),
            _ => None,
        }
    }

    /// Delay before the retry following `attempt` (0-based).
    ///
    /// A `Retry-After` header on the failed response wins unless ignored.
    #[must_use]
    pub fn delay_for(&self, err: &OciError, attempt: usize) -> Duration {
        if !self.ignore_retry_after
            && let Some(delay) = err
                .raw_response()
                .and_then(|raw| parse_retry_after(raw.headers()))
        {
            return delay;
        }
        calculate_backoff(&self.backoff, attempt)
    }
}

struct Classified {
    primary: RetryTrigger,
    code: Option<RetryTrigger>,
}

/// Map an error to the triggers it could satisfy; `None` for errors that are
/// never retryable.
fn classify(err: &OciError) -> Option<Classified> {
    match err {
        OciError::Transport(HttpError::Timeout(_)) => Some(Classified {
            primary: RetryTrigger::Timeout,
            code: None,
        }),
        OciError::Transport(e) if e.is_local() => None,
        // The same answer would arrive again.
        OciError::Transport(HttpError::BodyTooLarge { .. }) => None,
        OciError::Transport(_) => Some(Classified {
            primary: RetryTrigger::TransportError,
            code: None,
        }),
        OciError::Service(svc) => {
            let status = svc.status.as_u16();
            Some(Classified {
                primary: RetryTrigger::Status(status),
                code: code_trigger(status, &svc.code),
            })
        }
        _ => None,
    }
}

/// Code triggers hold `&'static str`, so only codes this crate knows about
/// can match one.
fn code_trigger(status: u16, code: &str) -> Option<RetryTrigger> {
    const KNOWN: &[RetryTrigger] = &[RetryTrigger::INCORRECT_STATE];
    KNOWN.iter().copied().find(|t| {
        matches!(t, RetryTrigger::Code { status: s, code: c } if *s == status && *c == code)
    })
}

/// Compute the backoff for a 0-based attempt.
///
/// Non-finite or negative inputs are sanitized; the result never exceeds
/// `backoff.max` (itself capped at one day).
#[must_use]
pub fn calculate_backoff(backoff: &ExponentialBackoff, attempt: usize) -> Duration {
    const MAX_BACKOFF_SECS: f64 = 86_400.0;

    let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
    let multiplier = if backoff.multiplier.is_finite() && backoff.multiplier >= 0.0 {
        backoff.multiplier
    } else {
        1.0
    };
    let max_secs = backoff.max.as_secs_f64().min(MAX_BACKOFF_SECS);

    let base = backoff.initial.as_secs_f64() * multiplier.powi(exponent);
    let clamped = if base.is_finite() {
        base.clamp(0.0, max_secs)
    } else {
        max_secs
    };
    let delay = Duration::from_secs_f64(clamped);

    let delay = if backoff.jitter {
        delay + delay.mul_f64(rand::rng().random_range(0.0..=0.25))
    } else {
        delay
    };
    delay.min(Duration::from_secs_f64(max_secs))
}

/// What the executor needs to know about the call it is retrying.
#[derive(Debug, Clone, Copy)]
pub struct RetryScope<'a> {
    pub operation: &'static str,
    pub method: &'a Method,
    pub has_retry_token: bool,
}

/// Run `attempt` until it succeeds, the policy gives up, or the context stops
/// the call. Exhausted retries surface the last error.
///
/// # Errors
/// Returns the last attempt's error, `OciError::Cancelled` or
/// `OciError::DeadlineExceeded`.
pub async fn run_with_retry<T, F, Fut>(
    ctx: &CallContext,
    policy: &RetryPolicy,
    scope: RetryScope<'_>,
    mut attempt: F,
) -> Result<T, OciError>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<T, OciError>>,
{
    let started = Instant::now();
    let mut retry = 0;

    loop {
        ctx.check(started)?;

        let err = match ctx.guard(started, attempt(retry)).await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if retry >= policy.max_retries {
            return Err(err);
        }
        let Some(trigger) = policy.should_retry(&err, scope.method, scope.has_retry_token) else {
            return Err(err);
        };

        let backoff = policy.delay_for(&err, retry);
        tracing::debug!(
            retry = retry + 1,
            max_retries = policy.max_retries,
            operation = scope.operation,
            method = %scope.method,
            trigger = ?trigger,
            status = err.status().map(|s| s.as_u16()),
            error = %err,
            backoff_ms = backoff.as_millis(),
            "Retrying call"
        );
        ctx.sleep(started, backoff).await?;
        retry += 1;
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::response::RawResponse;
    use bytes::Bytes;
    use http::{HeaderMap, StatusCode};
    use std::sync::Mutex;

    fn service_error(status: u16, code: &str) -> OciError {
        service_error_with(status, code, HeaderMap::new())
    }

    fn service_error_with(status: u16, code: &str, headers: HeaderMap) -> OciError {
        let body = format!(r#"{{"code":"{code}","message":"test"}}"#);
        OciError::from(ServiceError::from_raw(RawResponse::new(
            "CreateVcn",
            StatusCode::from_u16(status).unwrap(),
            headers,
            Bytes::from(body),
        )))
    }

    fn transport_error() -> OciError {
        OciError::Transport(HttpError::Transport("connection reset".into()))
    }

    fn scope(method: &Method, has_retry_token: bool) -> RetryScope<'_> {
        RetryScope {
            operation: "Test",
            method,
            has_retry_token,
        }
    }

    #[test]
    fn test_default_policy_shape() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 7);
        assert_eq!(policy.backoff.max, Duration::from_secs(30));
        assert!(policy.backoff.jitter);
        assert!(policy.retry_on.contains(&RetryTrigger::INCORRECT_STATE));
        assert!(policy.retry_on.contains(&RetryTrigger::TOO_MANY_REQUESTS));
        assert!(!policy.retry_on.contains(&RetryTrigger::Status(404)));
    }

    #[test]
    fn test_no_retry_matches_nothing() {
        let policy = RetryPolicy::no_retry();
        assert_eq!(policy.max_retries, 0);
        assert!(policy
            .should_retry(&service_error(503, "ServiceUnavailable"), &Method::GET, false)
            .is_none());
    }

    #[test]
    fn test_status_and_code_triggers() {
        let policy = RetryPolicy::default();

        assert_eq!(
            policy.should_retry(&service_error(429, "TooManyRequests"), &Method::POST, false),
            Some(RetryTrigger::TOO_MANY_REQUESTS)
        );
        assert_eq!(
            policy.should_retry(&service_error(409, "IncorrectState"), &Method::DELETE, false),
            Some(RetryTrigger::INCORRECT_STATE)
        );
        assert_eq!(
            policy.should_retry(&service_error(409, "Conflict"), &Method::DELETE, false),
            None
        );
        assert_eq!(
            policy.should_retry(&service_error(404, "NotAuthorizedOrNotFound"), &Method::GET, false),
            None
        );
    }

    #[test]
    fn test_transport_errors_need_token_for_post() {
        let policy = RetryPolicy::default();

        assert_eq!(
            policy.should_retry(&transport_error(), &Method::GET, false),
            Some(RetryTrigger::TransportError)
        );
        assert_eq!(policy.should_retry(&transport_error(), &Method::POST, false), None);
        assert_eq!(
            policy.should_retry(&transport_error(), &Method::POST, true),
            Some(RetryTrigger::TransportError)
        );

        let timeout = OciError::Transport(HttpError::Timeout(Duration::from_secs(1)));
        assert_eq!(
            policy.should_retry(&timeout, &Method::PUT, false),
            Some(RetryTrigger::Timeout)
        );
    }

    #[test]
    fn test_never_retried_errors() {
        let policy = RetryPolicy::default().with_predicate(|_| true);

        let local = OciError::Transport(HttpError::InvalidScheme {
            scheme: "http".to_owned(),
            reason: "tls only".to_owned(),
        });
        assert!(policy.should_retry(&local, &Method::GET, false).is_none());
        let too_large = OciError::Transport(HttpError::BodyTooLarge {
            limit: 16,
            actual: 64,
        });
        assert!(policy.should_retry(&too_large, &Method::GET, false).is_none());
        assert!(policy.should_retry(&OciError::Cancelled, &Method::GET, false).is_none());
        assert!(policy
            .should_retry(&OciError::invalid("GetVcn", "bad"), &Method::GET, false)
            .is_none());
    }

    #[test]
    fn test_predicate_extends_triggers() {
        let policy = RetryPolicy::no_retry()
            .with_max_retries(2)
            .with_predicate(|err| err.service_code() == Some("NotAuthorizedOrNotFound"));

        assert_eq!(
            policy.should_retry(&service_error(404, "NotAuthorizedOrNotFound"), &Method::GET, false),
            Some(RetryTrigger::Status(404))
        );
        assert!(policy
            .should_retry(&service_error(400, "InvalidParameter"), &Method::GET, false)
            .is_none());
    }

    #[test]
    fn test_delay_prefers_retry_after() {
        let mut headers = HeaderMap::new();
        headers.insert(http::header::RETRY_AFTER, "3".parse().unwrap());
        let err = service_error_with(429, "TooManyRequests", headers);

        let policy = RetryPolicy::default().with_backoff(ExponentialBackoff::fast());
        assert_eq!(policy.delay_for(&err, 0), Duration::from_secs(3));

        let policy = policy.ignore_retry_after(true);
        assert_eq!(policy.delay_for(&err, 0), Duration::from_millis(1));
    }

    #[test]
    fn test_calculate_backoff_growth_and_cap() {
        let backoff = ExponentialBackoff {
            initial: Duration::from_millis(100),
            max: Duration::from_secs(1),
            multiplier: 2.0,
            jitter: false,
        };
        assert_eq!(calculate_backoff(&backoff, 0), Duration::from_millis(100));
        assert_eq!(calculate_backoff(&backoff, 2), Duration::from_millis(400));
        assert_eq!(calculate_backoff(&backoff, 10), Duration::from_secs(1));
        assert_eq!(calculate_backoff(&backoff, usize::MAX), Duration::from_secs(1));
    }

    #[test]
    fn test_calculate_backoff_jitter_bounded() {
        let backoff = ExponentialBackoff::new(Duration::from_millis(100), Duration::from_secs(10));
        for _ in 0..50 {
            let delay = calculate_backoff(&backoff, 0);
            assert!(delay >= Duration::from_millis(100));
            assert!(delay <= Duration::from_millis(125));
        }
    }

    #[test]
    fn test_calculate_backoff_sanitizes_multiplier() {
        let backoff = ExponentialBackoff {
            initial: Duration::from_millis(10),
            max: Duration::from_secs(1),
            multiplier: f64::NAN,
            jitter: false,
        };
        assert_eq!(calculate_backoff(&backoff, 5), Duration::from_millis(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_with_retry_exhausts_and_returns_last_error() {
        let calls = Arc::new(Mutex::new(0usize));
        let policy = RetryPolicy::default()
            .with_max_retries(3)
            .with_backoff(ExponentialBackoff::fast());

        let counter = calls.clone();
        let result: Result<(), OciError> = run_with_retry(
            &CallContext::new(),
            &policy,
            scope(&Method::GET, false),
            move |attempt| {
                *counter.lock().unwrap() += 1;
                async move { Err(service_error(503, &format!("Unavailable{attempt}"))) }
            },
        )
        .await;

        assert_eq!(*calls.lock().unwrap(), 4);
        assert_eq!(result.unwrap_err().service_code(), Some("Unavailable3"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_with_retry_stops_on_success() {
        let calls = Arc::new(Mutex::new(0usize));
        let policy = RetryPolicy::default().with_backoff(ExponentialBackoff::fast());

        let counter = calls.clone();
        let result = run_with_retry(
            &CallContext::new(),
            &policy,
            scope(&Method::GET, false),
            move |attempt| {
                *counter.lock().unwrap() += 1;
                async move {
                    if attempt < 2 {
                        Err(service_error(500, "InternalServerError"))
                    } else {
                        Ok(attempt)
                    }
                }
            },
        )
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(*calls.lock().unwrap(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_with_retry_cancelled_during_backoff() {
        let ctx = CallContext::new();
        let policy = RetryPolicy::default()
            .with_backoff(ExponentialBackoff::new(Duration::from_secs(60), Duration::from_secs(60)));

        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            canceller.cancel();
        });

        let calls = Arc::new(Mutex::new(0usize));
        let counter = calls.clone();
        let result: Result<(), OciError> =
            run_with_retry(&ctx, &policy, scope(&Method::GET, false), move |_| {
                *counter.lock().unwrap() += 1;
                async { Err(service_error(503, "ServiceUnavailable")) }
            })
            .await;

        assert!(matches!(result, Err(OciError::Cancelled)));
        assert_eq!(*calls.lock().unwrap(), 1);
    }
}
