use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InterfaceIpConfiguration {
    #[serde(default)]
    pub cloud_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub private_ip_address: String,
    /// `IPv4` or `IPv6`
    #[serde(default)]
    pub private_ip_address_version: String,
    /// `Static` or `Dynamic`
    #[serde(default)]
    pub private_ip_allocation_method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_ip_address: Option<String>,
    #[serde(default)]
    pub cloud_subnet_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AzureNIExtension {
    #[serde(default)]
    pub resource_group_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_accelerated_networking: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_ip_forwarding: Option<bool>,
    #[serde(default)]
    pub dns_servers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_gateway_load_balancer_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_security_group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_group_id: Option<String>,
    #[serde(default)]
    pub ip_configurations: Vec<InterfaceIpConfiguration>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccessConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub nat_ip: String,
    #[serde(default)]
    pub network_tier: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GcpNIExtension {
    #[serde(default)]
    pub can_ip_forward: bool,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub stack_type: String,
    #[serde(default)]
    pub vpc_self_link: String,
    #[serde(default)]
    pub subnet_self_link: String,
    #[serde(default)]
    pub access_configs: Vec<AccessConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HuaWeiFixedIp {
    pub ip_address: String,
    #[serde(default)]
    pub subnet_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NetVirtualIp {
    pub ip: String,
    #[serde(default)]
    pub elasticity_ip: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EipNetwork {
    #[serde(default)]
    pub bandwidth_id: String,
    #[serde(default)]
    pub bandwidth_size: i32,
    #[serde(default)]
    pub bandwidth_type: String,
    #[serde(default)]
    pub public_ip_address: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HuaWeiNIExtension {
    #[serde(default)]
    pub mac_addr: String,
    #[serde(default)]
    pub net_id: String,
    #[serde(default)]
    pub port_state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete_on_termination: Option<bool>,
    #[serde(default)]
    pub driver_mode: String,
    #[serde(default)]
    pub min_rate: i32,
    #[serde(default)]
    pub multiqueue_num: i32,
    #[serde(default)]
    pub pci_address: String,
    #[serde(default)]
    pub ipv6: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub addresses: Option<EipNetwork>,
    #[serde(default)]
    pub cloud_security_group_ids: Vec<String>,
    #[serde(default)]
    pub fixed_ips: Vec<HuaWeiFixedIp>,
    #[serde(default)]
    pub virtual_ip_list: Vec<NetVirtualIp>,
}
