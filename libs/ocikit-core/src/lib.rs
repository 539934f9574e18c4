#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Virtual Cloud Network operations of the core services API.
//!
//! ```rust,ignore
//! use ocikit_common::{CallContext, ClientConfig, RetryPolicy};
//! use ocikit_core::{CreateVcnRequest, VirtualNetworkClient, models::CreateVcnDetails};
//!
//! let client = VirtualNetworkClient::new(&ClientConfig::from_figment(&figment, "oci")?)?;
//! let created = client
//!     .create_vcn(
//!         &CallContext::new(),
//!         &CreateVcnRequest {
//!             details: CreateVcnDetails {
//!                 compartment_id: compartment.clone(),
//!                 cidr_blocks: vec!["10.0.0.0/16".into()],
//!                 ..Default::default()
//!             },
//!             retry_policy: Some(RetryPolicy::default()),
//!             ..Default::default()
//!         },
//!     )
//!     .await?;
//! println!("{} ({:?})", created.vcn.id, created.etag);
//! ```

pub mod client;
pub mod models;
pub mod subnet;
pub mod vcn;

pub use client::VirtualNetworkClient;
pub use subnet::{
    CREATE_SUBNET, CreateSubnetRequest, CreateSubnetResponse, DELETE_SUBNET, DeleteSubnetRequest,
    DeleteSubnetResponse, GET_SUBNET, GetSubnetRequest, GetSubnetResponse, SubnetResponse,
};
pub use vcn::{
    CHANGE_VCN_COMPARTMENT, CREATE_VCN, ChangeVcnCompartmentRequest, ChangeVcnCompartmentResponse,
    CreateVcnRequest, CreateVcnResponse, DELETE_VCN, DeleteVcnRequest, DeleteVcnResponse,
    EmptyResponse, GET_VCN, GetVcnRequest, GetVcnResponse, LIST_VCNS, ListVcnsRequest,
    ListVcnsResponse, UPDATE_VCN, UpdateVcnRequest, UpdateVcnResponse, VcnResponse,
};
