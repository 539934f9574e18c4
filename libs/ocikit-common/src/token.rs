use std::time::Duration;
use uuid::Uuid;

/// How long the service remembers a retry token.
///
/// A request replayed with the same token inside this window is answered with
/// the outcome of the first one instead of being executed again.
pub const RETRY_TOKEN_VALIDITY: Duration = Duration::from_secs(24 * 60 * 60);

/// Generate an opaque idempotency token for one logical call.
#[must_use]
pub fn generate_retry_token() -> String {
    Uuid::new_v4().simple().to_string()
}
