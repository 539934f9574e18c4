//! Wire models of the virtual network resources.
//!
//! Field names follow the service's camelCase JSON. Read models default every
//! missing field so that new service-side fields and states never break
//! decoding.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Lifecycle state of a VCN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum VcnLifecycleState {
    Provisioning,
    Available,
    Terminating,
    Terminated,
    Updating,
    /// A state this client does not know about
    #[default]
    #[serde(other)]
    Unknown,
}

impl VcnLifecycleState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Provisioning => "PROVISIONING",
            Self::Available => "AVAILABLE",
            Self::Terminating => "TERMINATING",
            Self::Terminated => "TERMINATED",
            Self::Updating => "UPDATING",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for VcnLifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a subnet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum SubnetLifecycleState {
    Provisioning,
    Available,
    Terminating,
    Terminated,
    Updating,
    #[default]
    #[serde(other)]
    Unknown,
}

/// A virtual cloud network.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Vcn {
    pub id: String,
    pub compartment_id: String,
    pub display_name: Option<String>,
    pub cidr_block: Option<String>,
    pub cidr_blocks: Vec<String>,
    pub dns_label: Option<String>,
    pub vcn_domain_name: Option<String>,
    pub default_route_table_id: Option<String>,
    pub default_security_list_id: Option<String>,
    pub default_dhcp_options_id: Option<String>,
    pub lifecycle_state: VcnLifecycleState,
    /// RFC 3339 timestamp
    pub time_created: Option<String>,
    pub freeform_tags: HashMap<String, String>,
}

/// A subnet inside a VCN.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Subnet {
    pub id: String,
    pub compartment_id: String,
    pub vcn_id: String,
    pub cidr_block: String,
    pub display_name: Option<String>,
    /// `None` for regional subnets
    pub availability_domain: Option<String>,
    pub dns_label: Option<String>,
    pub subnet_domain_name: Option<String>,
    pub route_table_id: Option<String>,
    pub security_list_ids: Vec<String>,
    pub prohibit_public_ip_on_vnic: Option<bool>,
    pub lifecycle_state: SubnetLifecycleState,
    pub time_created: Option<String>,
    pub freeform_tags: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVcnDetails {
    pub compartment_id: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub cidr_blocks: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns_label: Option<String>,
    #[serde(skip_serializing_if = "HashMap::is_empty", default)]
    pub freeform_tags: HashMap<String, String>,
}

/// Mutable VCN fields; unset fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVcnDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub freeform_tags: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeVcnCompartmentDetails {
    /// Destination compartment
    pub compartment_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubnetDetails {
    pub compartment_id: String,
    pub vcn_id: String,
    pub cidr_block: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability_domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prohibit_public_ip_on_vnic: Option<bool>,
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_vcn_decodes_camel_case() {
        let vcn: Vcn = serde_json::from_value(json!({
            "id": "ocid1.vcn.oc1..aaa",
            "compartmentId": "ocid1.compartment.oc1..ccc",
            "displayName": "prod",
            "cidrBlocks": ["10.0.0.0/16"],
            "lifecycleState": "AVAILABLE",
            "freeformTags": {"env": "prod"}
        }))
        .unwrap();

        assert_eq!(vcn.id, "ocid1.vcn.oc1..aaa");
        assert_eq!(vcn.compartment_id, "ocid1.compartment.oc1..ccc");
        assert_eq!(vcn.cidr_blocks, vec!["10.0.0.0/16"]);
        assert_eq!(vcn.lifecycle_state, VcnLifecycleState::Available);
        assert_eq!(vcn.freeform_tags["env"], "prod");
    }

    #[test]
    fn test_unknown_lifecycle_state_tolerated() {
        let vcn: Vcn =
            serde_json::from_value(json!({"id": "x", "lifecycleState": "MIGRATING"})).unwrap();
        assert_eq!(vcn.lifecycle_state, VcnLifecycleState::Unknown);
    }

    #[test]
    fn test_create_details_omit_unset_fields() {
        let details = CreateVcnDetails {
            compartment_id: "ocid1.compartment.oc1..ccc".to_owned(),
            cidr_blocks: vec!["10.0.0.0/16".to_owned()],
            ..CreateVcnDetails::default()
        };
        assert_eq!(
            serde_json::to_value(&details).unwrap(),
            json!({
                "compartmentId": "ocid1.compartment.oc1..ccc",
                "cidrBlocks": ["10.0.0.0/16"]
            })
        );
    }

    #[test]
    fn test_lifecycle_state_display_matches_wire() {
        assert_eq!(VcnLifecycleState::Terminated.to_string(), "TERMINATED");
        assert_eq!(
            serde_json::to_value(VcnLifecycleState::Terminated).unwrap(),
            json!("TERMINATED")
        );
    }
}
