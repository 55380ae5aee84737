use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AwsSubnetExtension {
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub map_public_ip_on_launch: bool,
    #[serde(default)]
    pub assign_ipv6_address_on_creation: bool,
    #[serde(default)]
    pub hostname_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TCloudSubnetExtension {
    #[serde(default)]
    pub is_default: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_network_acl_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HuaWeiSubnetExtension {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub dhcp_enable: bool,
    #[serde(default)]
    pub gateway_ip: String,
    #[serde(default)]
    pub dns_list: Vec<String>,
    #[serde(default)]
    pub ntp_addresses: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AzureSubnetExtension {
    #[serde(default)]
    pub resource_group_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nat_gateway: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_security_group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_group_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GcpSubnetExtension {
    #[serde(default)]
    pub self_link: String,
    /// Network URL of the parent VPC; resolved to the internal vpc id on sync
    #[serde(default)]
    pub vpc_self_link: String,
    #[serde(default)]
    pub stack_type: String,
    #[serde(default)]
    pub ipv6_access_type: String,
    #[serde(default)]
    pub gateway_address: String,
    #[serde(default)]
    pub private_ip_google_access: bool,
    #[serde(default)]
    pub enable_flow_logs: bool,
}
