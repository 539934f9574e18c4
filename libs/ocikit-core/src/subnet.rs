use crate::models::{CreateSubnetDetails, Subnet};
use crate::vcn::EmptyResponse;
use http::Method;
use ocikit_common::headers::{IF_MATCH, OPC_REQUEST_ID, OPC_RETRY_TOKEN};
use ocikit_common::{
    OciError, OciRequest, OciResponse, Operation, OperationKind, RawResponse, RequestParts,
    RetryPolicy,
};

pub const GET_SUBNET: Operation =
    Operation::new("GetSubnet", Method::GET, "/subnets/{subnetId}", OperationKind::Read);
pub const CREATE_SUBNET: Operation =
    Operation::new("CreateSubnet", Method::POST, "/subnets", OperationKind::Create);
pub const DELETE_SUBNET: Operation = Operation::new(
    "DeleteSubnet",
    Method::DELETE,
    "/subnets/{subnetId}",
    OperationKind::Delete,
);

#[derive(Debug, Clone, Default)]
pub struct GetSubnetRequest {
    pub subnet_id: String,
    pub opc_request_id: Option<String>,
    pub retry_policy: Option<RetryPolicy>,
}

impl OciRequest for GetSubnetRequest {
    fn to_parts(&self, op: &Operation) -> RequestParts {
        RequestParts::new(op)
            .path_param("subnetId", self.subnet_id.as_str())
            .header_opt(OPC_REQUEST_ID, self.opc_request_id.as_deref())
    }

    fn retry_policy(&self) -> Option<&RetryPolicy> {
        self.retry_policy.as_ref()
    }
}

#[derive(Debug, Clone, Default)]
pub struct CreateSubnetRequest {
    pub details: CreateSubnetDetails,
    pub opc_retry_token: Option<String>,
    pub opc_request_id: Option<String>,
    pub retry_policy: Option<RetryPolicy>,
}

impl OciRequest for CreateSubnetRequest {
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

#[derive(Debug, Clone, Default)]
pub struct DeleteSubnetRequest {
    pub subnet_id: String,
    pub if_match: Option<String>,
    pub opc_request_id: Option<String>,
    pub retry_policy: Option<RetryPolicy>,
}

impl OciRequest for DeleteSubnetRequest {
    fn to_parts(&self, op: &Operation) -> RequestParts {
        RequestParts::new(op)
            .path_param("subnetId", self.subnet_id.as_str())
            .header_opt(IF_MATCH, self.if_match.as_deref())
            .header_opt(OPC_REQUEST_ID, self.opc_request_id.as_deref())
    }

    fn retry_policy(&self) -> Option<&RetryPolicy> {
        self.retry_policy.as_ref()
    }
}

#[derive(Debug)]
pub struct SubnetResponse {
    pub subnet: Subnet,
    pub etag: Option<String>,
    pub opc_request_id: Option<String>,
    pub raw_response: RawResponse,
}

impl OciResponse for SubnetResponse {
    fn from_raw(raw: RawResponse) -> Result<Self, OciError> {
        Ok(Self {
            subnet: raw.json()?,
            etag: raw.etag().map(ToOwned::to_owned),
            opc_request_id: raw.opc_request_id().map(ToOwned::to_owned),
            raw_response: raw,
        })
    }
}

pub type GetSubnetResponse = SubnetResponse;
pub type CreateSubnetResponse = SubnetResponse;
pub type DeleteSubnetResponse = EmptyResponse;
