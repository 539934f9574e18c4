//! Header names with protocol meaning for every operation.

use http::HeaderName;

/// Optimistic concurrency precondition on update and delete.
pub const IF_MATCH: HeaderName = HeaderName::from_static("if-match");

/// Entity tag of the returned resource version.
pub const ETAG: HeaderName = HeaderName::from_static("etag");

/// Client-generated idempotency token for create and action operations.
pub const OPC_RETRY_TOKEN: HeaderName = HeaderName::from_static("opc-retry-token");

/// Correlation id; echoed by the service and quoted in support requests.
pub const OPC_REQUEST_ID: HeaderName = HeaderName::from_static("opc-request-id");

/// Id of the asynchronous work request started by an action.
pub const OPC_WORK_REQUEST_ID: HeaderName = HeaderName::from_static("opc-work-request-id");

/// Pagination token for the next page of a list call.
pub const OPC_NEXT_PAGE: HeaderName = HeaderName::from_static("opc-next-page");
