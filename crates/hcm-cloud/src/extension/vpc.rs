use serde::{Deserialize, Serialize};

/// IP protocol family of a CIDR block
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpAddressType {
    #[default]
    Ipv4,
    Ipv6,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AwsCidr {
    #[serde(rename = "type")]
    pub kind: IpAddressType,
    pub cidr: String,
    #[serde(default)]
    pub address_pool: String,
    #[serde(default)]
    pub state: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AwsVpcExtension {
    #[serde(default)]
    pub cidr: Vec<AwsCidr>,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub instance_tenancy: String,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub enable_dns_hostnames: bool,
    #[serde(default)]
    pub enable_dns_support: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TCloudCidr {
    #[serde(rename = "type")]
    pub kind: IpAddressType,
    pub cidr: String,
    /// `ipv4_cidr` for the primary block, `ipv4_assist_cidr` for secondary blocks
    #[serde(default)]
    pub category: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TCloudVpcExtension {
    #[serde(default)]
    pub cidr: Vec<TCloudCidr>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub enable_multicast: bool,
    #[serde(default)]
    pub dns_server_set: Vec<String>,
    #[serde(default)]
    pub domain_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VpcCidr {
    #[serde(rename = "type")]
    pub kind: IpAddressType,
    pub cidr: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HuaWeiVpcExtension {
    #[serde(default)]
    pub cidr: Vec<VpcCidr>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub enterprise_project_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AzureVpcExtension {
    #[serde(default)]
    pub resource_group_name: String,
    #[serde(default)]
    pub dns_servers: Vec<String>,
    #[serde(default)]
    pub cidr: Vec<VpcCidr>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GcpVpcExtension {
    /// Fully qualified network URL, the key subnets and interfaces refer to
    #[serde(default)]
    pub self_link: String,
    #[serde(default)]
    pub auto_create_subnetworks: bool,
    #[serde(default)]
    pub enable_ula_internal_ipv6: bool,
    #[serde(default)]
    pub internal_ipv6_range: String,
    #[serde(default)]
    pub mtu: i64,
    #[serde(default)]
    pub routing_mode: String,
}
