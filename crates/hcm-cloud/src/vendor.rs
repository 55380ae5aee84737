//! Vendor and resource kind discriminators

use crate::error::CloudError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Cloud vendor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vendor {
    Aws,
    Azure,
    Gcp,
    #[serde(rename = "huawei")]
    HuaWei,
    #[serde(rename = "tcloud")]
    TCloud,
}

impl Vendor {
    pub const ALL: [Vendor; 5] = [
        Vendor::Aws,
        Vendor::Azure,
        Vendor::Gcp,
        Vendor::HuaWei,
        Vendor::TCloud,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Vendor::Aws => "aws",
            Vendor::Azure => "azure",
            Vendor::Gcp => "gcp",
            Vendor::HuaWei => "huawei",
            Vendor::TCloud => "tcloud",
        }
    }
}

impl std::fmt::Display for Vendor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Vendor {
    type Err = CloudError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "aws" => Ok(Vendor::Aws),
            "azure" => Ok(Vendor::Azure),
            "gcp" => Ok(Vendor::Gcp),
            "huawei" => Ok(Vendor::HuaWei),
            "tcloud" => Ok(Vendor::TCloud),
            other => Err(CloudError::InvalidParameter(format!(
                "unknown vendor: {}",
                other
            ))),
        }
    }
}

/// Kind of synchronized resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Vpc,
    Subnet,
    NetworkInterface,
    /// Read-only reference rows (instance business ownership)
    Cvm,
}

impl ResourceKind {
    /// Path segment used by the data-service and the HTTP routes
    pub fn path_segment(&self) -> &'static str {
        match self {
            ResourceKind::Vpc => "vpcs",
            ResourceKind::Subnet => "subnets",
            ResourceKind::NetworkInterface => "network_interfaces",
            ResourceKind::Cvm => "cvms",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::Vpc => write!(f, "vpc"),
            ResourceKind::Subnet => write!(f, "subnet"),
            ResourceKind::NetworkInterface => write!(f, "network-interface"),
            ResourceKind::Cvm => write!(f, "cvm"),
        }
    }
}

impl FromStr for ResourceKind {
    type Err = CloudError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vpc" | "vpcs" => Ok(ResourceKind::Vpc),
            "subnet" | "subnets" => Ok(ResourceKind::Subnet),
            "network-interface" | "network_interface" | "network_interfaces" => {
                Ok(ResourceKind::NetworkInterface)
            }
            other => Err(CloudError::InvalidParameter(format!(
                "unknown resource kind: {}",
                other
            ))),
        }
    }
}
