//! VCN operations: requests, responses and their wire placement.

use crate::models::{
    ChangeVcnCompartmentDetails, CreateVcnDetails, UpdateVcnDetails, Vcn, VcnLifecycleState,
};
use http::Method;
use ocikit_common::headers::{IF_MATCH, OPC_REQUEST_ID, OPC_RETRY_TOKEN};
use ocikit_common::{
    OciError, OciRequest, OciResponse, Operation, OperationKind, RawResponse, RequestParts,
    RetryPolicy,
};

pub const LIST_VCNS: Operation = Operation::new("ListVcns", Method::GET, "/vcns", OperationKind::List);
pub const GET_VCN: Operation =
    Operation::new("GetVcn", Method::GET, "/vcns/{vcnId}", OperationKind::Read);
pub const CREATE_VCN: Operation =
    Operation::new("CreateVcn", Method::POST, "/vcns", OperationKind::Create);
pub const UPDATE_VCN: Operation =
    Operation::new("UpdateVcn", Method::PUT, "/vcns/{vcnId}", OperationKind::Update);
pub const DELETE_VCN: Operation =
    Operation::new("DeleteVcn", Method::DELETE, "/vcns/{vcnId}", OperationKind::Delete);
pub const CHANGE_VCN_COMPARTMENT: Operation = Operation::new(
    "ChangeVcnCompartment",
    Method::POST,
    "/vcns/{vcnId}/actions/changeCompartment",
    OperationKind::Action,
);

fn owned(value: Option<&str>) -> Option<String> {
    value.map(ToOwned::to_owned)
}

// ListVcns

#[derive(Debug, Clone, Default)]
pub struct ListVcnsRequest {
    pub compartment_id: String,
    /// Page size
    pub limit: Option<u32>,
    /// `opc-next-page` of the previous page
    pub page: Option<String>,
    pub display_name: Option<String>,
    pub lifecycle_state: Option<VcnLifecycleState>,
    pub opc_request_id: Option<String>,
    pub retry_policy: Option<RetryPolicy>,
}

impl OciRequest for ListVcnsRequest {
    fn to_parts(&self, op: &Operation) -> RequestParts {
        RequestParts::new(op)
            .query_required("compartmentId", &self.compartment_id)
            .query_opt("limit", self.limit)
            .query_opt("page", self.page.as_deref())
            .query_opt("displayName", self.display_name.as_deref())
            .query_opt("lifecycleState", self.lifecycle_state)
            .header_opt(OPC_REQUEST_ID, self.opc_request_id.as_deref())
    }

    fn retry_policy(&self) -> Option<&RetryPolicy> {
        self.retry_policy.as_ref()
    }
}

#[derive(Debug)]
pub struct ListVcnsResponse {
    pub items: Vec<Vcn>,
    /// Token for the next page; absent on the last page
    pub opc_next_page: Option<String>,
    pub opc_request_id: Option<String>,
    pub raw_response: RawResponse,
}

impl OciResponse for ListVcnsResponse {
    fn from_raw(raw: RawResponse) -> Result<Self, OciError> {
        Ok(Self {
            items: raw.json()?,
            opc_next_page: owned(raw.opc_next_page()),
            opc_request_id: owned(raw.opc_request_id()),
            raw_response: raw,
        })
    }
}

// GetVcn

#[derive(Debug, Clone, Default)]
pub struct GetVcnRequest {
    pub vcn_id: String,
    pub opc_request_id: Option<String>,
    pub retry_policy: Option<RetryPolicy>,
}

impl OciRequest for GetVcnRequest {
    fn to_parts(&self, op: &Operation) -> RequestParts {
        RequestParts::new(op)
            .path_param("vcnId", self.vcn_id.as_str())
            .header_opt(OPC_REQUEST_ID, self.opc_request_id.as_deref())
    }

    fn retry_policy(&self) -> Option<&RetryPolicy> {
        self.retry_policy.as_ref()
    }
}

/// A single VCN with the version tag to use as `if-match` on later writes.
#[derive(Debug)]
pub struct VcnResponse {
    pub vcn: Vcn,
    pub etag: Option<String>,
    pub opc_request_id: Option<String>,
    pub raw_response: RawResponse,
}

impl OciResponse for VcnResponse {
    fn from_raw(raw: RawResponse) -> Result<Self, OciError> {
        Ok(Self {
            vcn: raw.json()?,
            etag: owned(raw.etag()),
            opc_request_id: owned(raw.opc_request_id()),
            raw_response: raw,
        })
    }
}

pub type GetVcnResponse = VcnResponse;
pub type CreateVcnResponse = VcnResponse;
pub type UpdateVcnResponse = VcnResponse;

// CreateVcn

#[derive(Debug, Clone, Default)]
pub struct CreateVcnRequest {
    pub details: CreateVcnDetails,
    /// Idempotency token; generated per call when unset
    pub opc_retry_token: Option<String>,
    pub opc_request_id: Option<String>,
    pub retry_policy: Option<RetryPolicy>,
}

impl OciRequest for CreateVcnRequest {
    fn to_parts(&self, op: &Operation) -> RequestParts {
        RequestParts::new(op)
            .header_opt(OPC_RETRY_TOKEN, self.opc_retry_token.as_deref())
            .header_opt(OPC_REQUEST_ID, self.opc_request_id.as_deref())
            .json_body(&self.details)
    }

    fn retry_policy(&self) -> Option<&RetryPolicy> {
        self.retry_policy.as_ref()
    }
}

// UpdateVcn

#[derive(Debug, Clone, Default)]
pub struct UpdateVcnRequest {
    pub vcn_id: String,
    pub details: UpdateVcnDetails,
    /// Fail with 412 unless the current etag matches
    pub if_match: Option<String>,
    pub opc_request_id: Option<String>,
    pub retry_policy: Option<RetryPolicy>,
}

impl OciRequest for UpdateVcnRequest {
    fn to_parts(&self, op: &Operation) -> RequestParts {
        RequestParts::new(op)
            .path_param("vcnId", self.vcn_id.as_str())
            .header_opt(IF_MATCH, self.if_match.as_deref())
            .header_opt(OPC_REQUEST_ID, self.opc_request_id.as_deref())
            .json_body(&self.details)
    }

    fn retry_policy(&self) -> Option<&RetryPolicy> {
        self.retry_policy.as_ref()
    }
}

// DeleteVcn

#[derive(Debug, Clone, Default)]
pub struct DeleteVcnRequest {
    pub vcn_id: String,
    pub if_match: Option<String>,
    pub opc_request_id: Option<String>,
    pub retry_policy: Option<RetryPolicy>,
}

impl OciRequest for DeleteVcnRequest {
    fn to_parts(&self, op: &Operation) -> RequestParts {
        RequestParts::new(op)
            .path_param("vcnId", self.vcn_id.as_str())
            .header_opt(IF_MATCH, self.if_match.as_deref())
            .header_opt(OPC_REQUEST_ID, self.opc_request_id.as_deref())
    }

    fn retry_policy(&self) -> Option<&RetryPolicy> {
        self.retry_policy.as_ref()
    }
}

/// Answer to a call with no response body.
#[derive(Debug)]
pub struct EmptyResponse {
    pub opc_request_id: Option<String>,
    pub raw_response: RawResponse,
}

impl OciResponse for EmptyResponse {
    fn from_raw(raw: RawResponse) -> Result<Self, OciError> {
        Ok(Self {
            opc_request_id: owned(raw.opc_request_id()),
            raw_response: raw,
        })
    }
}

pub type DeleteVcnResponse = EmptyResponse;

// ChangeVcnCompartment

#[derive(Debug, Clone, Default)]
pub struct ChangeVcnCompartmentRequest {
    pub vcn_id: String,
    pub details: ChangeVcnCompartmentDetails,
    pub if_match: Option<String>,
    pub opc_retry_token: Option<String>,
    pub opc_request_id: Option<String>,
    pub retry_policy: Option<RetryPolicy>,
}

impl OciRequest for ChangeVcnCompartmentRequest {
    fn to_parts(&self, op: &Operation) -> RequestParts {
        RequestParts::new(op)
            .path_param("vcnId", self.vcn_id.as_str())
            .header_opt(IF_MATCH, self.if_match.as_deref())
            .header_opt(OPC_RETRY_TOKEN, self.opc_retry_token.as_deref())
            .header_opt(OPC_REQUEST_ID, self.opc_request_id.as_deref())
            .json_body(&self.details)
    }

    fn retry_policy(&self) -> Option<&RetryPolicy> {
        self.retry_policy.as_ref()
    }
}

/// The move runs asynchronously; poll the work request to follow it.
#[derive(Debug)]
pub struct ChangeVcnCompartmentResponse {
    pub opc_work_request_id: Option<String>,
    pub opc_request_id: Option<String>,
    pub raw_response: RawResponse,
}

impl OciResponse for ChangeVcnCompartmentResponse {
    fn from_raw(raw: RawResponse) -> Result<Self, OciError> {
        Ok(Self {
            opc_work_request_id: owned(raw.opc_work_request_id()),
            opc_request_id: owned(raw.opc_request_id()),
            raw_response: raw,
        })
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use ocikit_common::Endpoint;

    fn endpoint() -> Endpoint {
        Endpoint::for_service("iaas", "eu-frankfurt-1", "oraclecloud.com", "/20160918")
    }

    #[test]
    fn test_list_vcns_query() {
        let req = ListVcnsRequest {
            compartment_id: "ocid1.compartment.oc1..ccc".to_owned(),
            limit: Some(10),
            page: Some("p2".to_owned()),
            lifecycle_state: Some(VcnLifecycleState::Available),
            ..ListVcnsRequest::default()
        };
        let prepared = req.to_parts(&LIST_VCNS).render(&endpoint()).unwrap();

        assert_eq!(
            prepared.uri().query(),
            Some("compartmentId=ocid1.compartment.oc1..ccc&limit=10&page=p2&lifecycleState=AVAILABLE")
        );
    }

    #[test]
    fn test_list_vcns_requires_compartment() {
        let err = ListVcnsRequest::default()
            .to_parts(&LIST_VCNS)
            .render(&endpoint())
            .unwrap_err();
        assert!(matches!(err, OciError::InvalidRequest { operation: "ListVcns", .. }));
    }

    #[test]
    fn test_change_compartment_placement() {
        let req = ChangeVcnCompartmentRequest {
            vcn_id: "ocid1.vcn.oc1..aaa".to_owned(),
            details: ChangeVcnCompartmentDetails {
                compartment_id: "ocid1.compartment.oc1..dst".to_owned(),
            },
            if_match: Some("\"v3\"".to_owned()),
            ..ChangeVcnCompartmentRequest::default()
        };
        let prepared = req.to_parts(&CHANGE_VCN_COMPARTMENT).render(&endpoint()).unwrap();

        assert_eq!(*prepared.method(), Method::POST);
        assert_eq!(
            prepared.uri().path(),
            "/20160918/vcns/ocid1.vcn.oc1..aaa/actions/changeCompartment"
        );
        assert_eq!(prepared.headers()[IF_MATCH], "\"v3\"");
        assert_eq!(
            prepared.body().as_ref(),
            br#"{"compartmentId":"ocid1.compartment.oc1..dst"}"#
        );
    }

    #[test]
    fn test_operation_kinds() {
        assert!(CREATE_VCN.kind.requires_retry_token());
        assert!(CHANGE_VCN_COMPARTMENT.kind.requires_retry_token());
        assert!(!UPDATE_VCN.kind.requires_retry_token());
        assert!(!DELETE_VCN.kind.requires_retry_token());
        assert!(!GET_VCN.kind.requires_retry_token());
    }
}
