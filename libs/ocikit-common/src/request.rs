//! Rendering of typed requests into HTTP requests.
//!
//! Each operation describes its wire shape with an [`Operation`] constant and
//! an [`OciRequest::to_parts`] implementation that places every field
//! explicitly: path segment, query parameter, header or JSON body.

use crate::endpoint::Endpoint;
use crate::error::OciError;
use crate::retry::RetryPolicy;
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderName, HeaderValue, Method, Request, Uri};
use http_body_util::Full;
use serde::Serialize;
use std::fmt::Display;

/// What an operation does to server state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum OperationKind {
    /// Fetch one resource
    Read,
    /// Fetch a page of resources
    List,
    /// Create a resource
    Create,
    /// Replace mutable fields of a resource (guarded by `if-match`)
    Update,
    /// Delete a resource (guarded by `if-match`)
    Delete,
    /// Trigger a server-side action such as a compartment move
    Action,
}

impl OperationKind {
    /// Create and action calls are unsafe to replay without an idempotency token.
    #[must_use]
    pub const fn requires_retry_token(self) -> bool {
        matches!(self, Self::Create | Self::Action)
    }
}

/// Static description of one API operation.
#[derive(Debug, Clone)]
pub struct Operation {
    pub name: &'static str,
    pub method: Method,
    /// Path relative to the service base path, e.g. `/vcns/{vcnId}`
    pub path_template: &'static str,
    pub kind: OperationKind,
}

impl Operation {
    #[must_use]
    pub const fn new(
        name: &'static str,
        method: Method,
        path_template: &'static str,
        kind: OperationKind,
    ) -> Self {
        Self {
            name,
            method,
            path_template,
            kind,
        }
    }
}

/// A typed request that can be dispatched.
pub trait OciRequest {
    /// Place every field of the request.
    fn to_parts(&self, op: &Operation) -> RequestParts;

    /// Retry policy for this call; `None` means a single attempt.
    fn retry_policy(&self) -> Option<&RetryPolicy> {
        None
    }
}

/// Builder collecting the wire placement of each request field.
///
/// Errors from setters are deferred and reported by [`RequestParts::render`],
/// so `to_parts` implementations stay infallible.
#[derive(Debug)]
pub struct RequestParts {
    operation: &'static str,
    method: Method,
    template: &'static str,
    path_params: Vec<(&'static str, String)>,
    query: Vec<(&'static str, String)>,
    headers: HeaderMap,
    body: Option<Bytes>,
    error: Option<OciError>,
}

impl RequestParts {
    #[must_use]
    pub fn new(op: &Operation) -> Self {
        Self {
            operation: op.name,
            method: op.method.clone(),
            template: op.path_template,
            path_params: Vec::new(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
            error: None,
        }
    }

    /// Bind a `{name}` placeholder of the path template.
    #[must_use]
    pub fn path_param(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.path_params.push((name, value.into()));
        self
    }

    #[must_use]
    pub fn query(mut self, name: &'static str, value: impl Display) -> Self {
        self.query.push((name, value.to_string()));
        self
    }

    /// Add a query parameter that must be non-empty; an empty value fails at
    /// [`render`](Self::render).
    #[must_use]
    pub fn query_required(mut self, name: &'static str, value: impl Display) -> Self {
        let value = value.to_string();
        if value.is_empty() {
            self.defer(format!("query parameter {name} must not be empty"));
            return self;
        }
        self.query.push((name, value));
        self
    }

    /// Add a query parameter when the value is present.
    #[must_use]
    pub fn query_opt<V: Display>(self, name: &'static str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.query(name, value),
            None => self,
        }
    }

    #[must_use]
    pub fn header(mut self, name: HeaderName, value: &str) -> Self {
        match HeaderValue::from_str(value) {
            Ok(value) => {
                self.headers.insert(name, value);
            }
            Err(e) => self.defer(format!("invalid value for header {name}: {e}")),
        }
        self
    }

    /// Add a header when the value is present.
    #[must_use]
    pub fn header_opt(self, name: HeaderName, value: Option<&str>) -> Self {
        match value {
            Some(value) => self.header(name, value),
            None => self,
        }
    }

    /// Serialize `body` as the JSON payload.
    #[must_use]
    pub fn json_body<T: Serialize + ?Sized>(mut self, body: &T) -> Self {
        match serde_json::to_vec(body) {
            Ok(bytes) => {
                self.headers
                    .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                self.body = Some(Bytes::from(bytes));
            }
            Err(e) => self.defer(format!("failed to serialize body: {e}")),
        }
        self
    }

    #[must_use]
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Set a header unless one is already present. Returns whether it was set.
    pub fn insert_header_if_absent(&mut self, name: HeaderName, value: HeaderValue) -> bool {
        if self.headers.contains_key(&name) {
            return false;
        }
        self.headers.insert(name, value);
        true
    }

    fn defer(&mut self, reason: String) {
        if self.error.is_none() {
            self.error = Some(OciError::invalid(self.operation, reason));
        }
    }

    /// Produce the single HTTP request this call maps to.
    ///
    /// Path parameters are percent-encoded as one segment each; an empty or
    /// unbound placeholder is an error.
    ///
    /// # Errors
    /// Returns `OciError::InvalidRequest` for any deferred setter error, a
    /// missing or empty path parameter, or a URL that does not parse.
    pub fn render(self, endpoint: &Endpoint) -> Result<PreparedRequest, OciError> {
        if let Some(err) = self.error {
            return Err(err);
        }

        let path = fill_template(self.operation, self.template, &self.path_params)?;
        let mut url = format!("{}{path}", endpoint.base_url());
        if !self.query.is_empty() {
            let query = serde_urlencoded::to_string(&self.query)
                .map_err(|e| OciError::invalid(self.operation, e.to_string()))?;
            url.push('?');
            url.push_str(&query);
        }

        let uri: Uri = url
            .parse()
            .map_err(|e| OciError::invalid(self.operation, format!("invalid URL '{url}': {e}")))?;

        Ok(PreparedRequest {
            method: self.method,
            uri,
            headers: self.headers,
            body: self.body.unwrap_or_default(),
        })
    }
}

fn fill_template(
    operation: &'static str,
    template: &str,
    params: &[(&'static str, String)],
) -> Result<String, OciError> {
    let mut out = String::with_capacity(template.len() + 32);
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            return Err(OciError::invalid(
                operation,
                format!("unterminated placeholder in path template '{template}'"),
            ));
        };
        let name = &after[..close];
        let value = params
            .iter()
            .find(|(param, _)| *param == name)
            .map(|(_, value)| value.as_str())
            .ok_or_else(|| OciError::invalid(operation, format!("missing path parameter {name}")))?;
        if value.is_empty() {
            return Err(OciError::invalid(
                operation,
                format!("path parameter {name} must not be empty"),
            ));
        }
        out.push_str(&urlencoding::encode(value));
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

/// A rendered request, replayable once per attempt.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
}

impl PreparedRequest {
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Build a fresh `http::Request` for one attempt.
    #[must_use]
    pub fn to_http(&self) -> Request<Full<Bytes>> {
        let mut request = Request::new(Full::new(self.body.clone()));
        *request.method_mut() = self.method.clone();
        *request.uri_mut() = self.uri.clone();
        *request.headers_mut() = self.headers.clone();
        request
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::headers::{IF_MATCH, OPC_REQUEST_ID};
    use serde_json::json;

    const GET_VCN: Operation =
        Operation::new("GetVcn", Method::GET, "/vcns/{vcnId}", OperationKind::Read);
    const LIST_VCNS: Operation =
        Operation::new("ListVcns", Method::GET, "/vcns", OperationKind::List);
    const UPDATE_VCN: Operation =
        Operation::new("UpdateVcn", Method::PUT, "/vcns/{vcnId}", OperationKind::Update);

    fn endpoint() -> Endpoint {
        Endpoint::for_service("iaas", "us-phoenix-1", "oraclecloud.com", "/20160918")
    }

    #[test]
    fn test_retry_token_required_for_create_and_action_only() {
        assert!(OperationKind::Create.requires_retry_token());
        assert!(OperationKind::Action.requires_retry_token());
        assert!(!OperationKind::Read.requires_retry_token());
        assert!(!OperationKind::List.requires_retry_token());
        assert!(!OperationKind::Update.requires_retry_token());
        assert!(!OperationKind::Delete.requires_retry_token());
    }

    #[test]
    fn test_render_fills_and_encodes_path() {
        let prepared = RequestParts::new(&GET_VCN)
            .path_param("vcnId", "ocid1.vcn.oc1/../x y")
            .render(&endpoint())
            .unwrap();

        assert_eq!(*prepared.method(), Method::GET);
        assert_eq!(
            prepared.uri().to_string(),
            "https://iaas.us-phoenix-1.oraclecloud.com/20160918/vcns/ocid1.vcn.oc1%2F..%2Fx%20y"
        );
        assert!(prepared.body().is_empty());
    }

    #[test]
    fn test_render_is_deterministic() {
        let render = || {
            RequestParts::new(&LIST_VCNS)
                .query("compartmentId", "ocid1.compartment.oc1..aaa")
                .query_opt("limit", Some(50))
                .query_opt::<&str>("page", None)
                .header(OPC_REQUEST_ID, "req-7")
                .render(&endpoint())
                .unwrap()
        };
        let (a, b) = (render(), render());

        assert_eq!(a.uri(), b.uri());
        assert_eq!(a.headers(), b.headers());
        assert_eq!(
            a.uri().query(),
            Some("compartmentId=ocid1.compartment.oc1..aaa&limit=50")
        );
    }

    #[test]
    fn test_render_json_body_and_headers() {
        let prepared = RequestParts::new(&UPDATE_VCN)
            .path_param("vcnId", "ocid1.vcn.oc1..aaa")
            .header_opt(IF_MATCH, Some("\"etag-1\""))
            .json_body(&json!({"displayName": "prod"}))
            .render(&endpoint())
            .unwrap();

        assert_eq!(prepared.headers()[IF_MATCH], "\"etag-1\"");
        assert_eq!(prepared.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(prepared.body().as_ref(), br#"{"displayName":"prod"}"#);

        let http = prepared.to_http();
        assert_eq!(*http.method(), Method::PUT);
        assert_eq!(http.headers()[IF_MATCH], "\"etag-1\"");
    }

    #[test]
    fn test_render_rejects_empty_path_param() {
        let err = RequestParts::new(&GET_VCN)
            .path_param("vcnId", "")
            .render(&endpoint())
            .unwrap_err();
        assert!(
            matches!(err, OciError::InvalidRequest { operation: "GetVcn", ref reason } if reason.contains("vcnId"))
        );
    }

    #[test]
    fn test_render_rejects_empty_required_query() {
        let err = RequestParts::new(&LIST_VCNS)
            .query_required("compartmentId", "")
            .query_opt("limit", Some(10))
            .render(&endpoint())
            .unwrap_err();
        assert!(
            matches!(err, OciError::InvalidRequest { operation: "ListVcns", ref reason } if reason.contains("compartmentId"))
        );

        let prepared = RequestParts::new(&LIST_VCNS)
            .query_required("compartmentId", "ocid1.compartment.oc1..aaa")
            .render(&endpoint())
            .unwrap();
        assert_eq!(prepared.uri().query(), Some("compartmentId=ocid1.compartment.oc1..aaa"));
    }

    #[test]
    fn test_render_rejects_missing_path_param() {
        let err = RequestParts::new(&GET_VCN).render(&endpoint()).unwrap_err();
        assert!(matches!(err, OciError::InvalidRequest { .. }));
    }

    #[test]
    fn test_invalid_header_deferred_to_render() {
        let err = RequestParts::new(&GET_VCN)
            .path_param("vcnId", "ocid1.vcn.oc1..aaa")
            .header(OPC_REQUEST_ID, "bad\nvalue")
            .render(&endpoint())
            .unwrap_err();
        assert!(matches!(err, OciError::InvalidRequest { .. }));
    }

    #[test]
    fn test_insert_header_if_absent() {
        let mut parts = RequestParts::new(&GET_VCN).header(OPC_REQUEST_ID, "mine");
        assert!(!parts.insert_header_if_absent(OPC_REQUEST_ID, HeaderValue::from_static("other")));
        assert!(parts.insert_header_if_absent(IF_MATCH, HeaderValue::from_static("x")));
        assert_eq!(parts.headers()[OPC_REQUEST_ID], "mine");
    }
}
