//! Resource model shared by every vendor
//!
//! A persisted row is a [`CloudResource`]: identity and ownership fields, a
//! kind-specific spec ([`VpcSpec`], [`SubnetSpec`], [`NetworkInterfaceSpec`])
//! flattened next to them, and the vendor extension. What the cloud lister
//! observes is a [`CloudItem`], the same spec and extension without the
//! internal identity.

use crate::error::{CloudError, Result};
use crate::extension::VendorExtension;
use crate::vendor::{ResourceKind, Vendor};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Business id of a resource that has not been assigned yet
pub const UNASSIGNED_BIZ: i64 = -1;

/// Cloud area id of a VPC that is not bound to any area
pub const UNBIND_BK_CLOUD_ID: i64 = -1;

fn unassigned_biz() -> i64 {
    UNASSIGNED_BIZ
}

fn unbind_bk_cloud_id() -> i64 {
    UNBIND_BK_CLOUD_ID
}

/// Kind-specific denormalized fields of a resource
pub trait ResourceSpec:
    Serialize + DeserializeOwned + Clone + Debug + PartialEq + Send + Sync + 'static
{
    const KIND: ResourceKind;

    fn name(&self) -> &str;

    fn region(&self) -> &str;
}

/// VPC category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VpcCategory {
    #[default]
    Biz,
    BackBone,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VpcSpec {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub category: VpcCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    #[serde(default = "unbind_bk_cloud_id")]
    pub bk_cloud_id: i64,
}

impl VpcSpec {
    pub fn new(name: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            region: region.into(),
            category: VpcCategory::Biz,
            memo: None,
            bk_cloud_id: UNBIND_BK_CLOUD_ID,
        }
    }
}

impl ResourceSpec for VpcSpec {
    const KIND: ResourceKind = ResourceKind::Vpc;

    fn name(&self) -> &str {
        &self.name
    }

    fn region(&self) -> &str {
        &self.region
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubnetSpec {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub zone: String,
    #[serde(default)]
    pub cloud_vpc_id: String,
    /// Internal id of the parent VPC, resolved by the syncer
    #[serde(default)]
    pub vpc_id: String,
    #[serde(default)]
    pub ipv4_cidr: Vec<String>,
    #[serde(default)]
    pub ipv6_cidr: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_route_table_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_table_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
}

impl ResourceSpec for SubnetSpec {
    const KIND: ResourceKind = ResourceKind::Subnet;

    fn name(&self) -> &str {
        &self.name
    }

    fn region(&self) -> &str {
        &self.region
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkInterfaceSpec {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub zone: String,
    #[serde(default)]
    pub cloud_vpc_id: String,
    #[serde(default)]
    pub vpc_id: String,
    #[serde(default)]
    pub cloud_subnet_id: String,
    #[serde(default)]
    pub subnet_id: String,
    #[serde(default)]
    pub private_ipv4: Vec<String>,
    #[serde(default)]
    pub private_ipv6: Vec<String>,
    #[serde(default)]
    pub public_ipv4: Vec<String>,
    #[serde(default)]
    pub public_ipv6: Vec<String>,
    /// Cloud id of the instance the interface is attached to
    #[serde(default)]
    pub instance_id: String,
}

impl ResourceSpec for NetworkInterfaceSpec {
    const KIND: ResourceKind = ResourceKind::NetworkInterface;

    fn name(&self) -> &str {
        &self.name
    }

    fn region(&self) -> &str {
        &self.region
    }
}

/// Revision metadata maintained by the data-service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Revision {
    #[serde(default)]
    pub creator: String,
    #[serde(default)]
    pub reviser: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A persisted resource row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudResource<S, E> {
    pub id: String,
    pub vendor: Vendor,
    pub account_id: String,
    pub cloud_id: String,
    #[serde(default = "unassigned_biz")]
    pub bk_biz_id: i64,
    #[serde(flatten)]
    pub spec: S,
    #[serde(default)]
    pub extension: Option<E>,
    #[serde(flatten)]
    pub revision: Revision,
}

impl<S, E> CloudResource<S, E> {
    pub fn is_biz_assigned(&self) -> bool {
        self.bk_biz_id != UNASSIGNED_BIZ
    }

    /// Guard for biz-scoped operations
    pub fn ensure_biz_assigned(&self) -> Result<()> {
        if self.is_biz_assigned() {
            Ok(())
        } else {
            Err(CloudError::BizUnassigned(format!(
                "{} ({})",
                self.id, self.cloud_id
            )))
        }
    }

    /// Guard that the row belongs to the given business
    pub fn ensure_biz(&self, bk_biz_id: i64) -> Result<()> {
        self.ensure_biz_assigned()?;
        if self.bk_biz_id != bk_biz_id {
            return Err(CloudError::InvalidParameter(format!(
                "resource {} does not belong to biz {}",
                self.id, bk_biz_id
            )));
        }
        Ok(())
    }
}

pub type Vpc<E> = CloudResource<VpcSpec, E>;
pub type Subnet<E> = CloudResource<SubnetSpec, E>;
pub type NetworkInterface<E> = CloudResource<NetworkInterfaceSpec, E>;

/// A resource as observed from the vendor API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudItem<S, E> {
    pub cloud_id: String,
    #[serde(flatten)]
    pub spec: S,
    pub extension: E,
}

impl<S, E> CloudItem<S, E> {
    pub fn new(cloud_id: impl Into<String>, spec: S, extension: E) -> Self {
        Self {
            cloud_id: cloud_id.into(),
            spec,
            extension,
        }
    }
}

pub type CloudVpc<E> = CloudItem<VpcSpec, E>;
pub type CloudSubnet<E> = CloudItem<SubnetSpec, E>;
pub type CloudNetworkInterface<E> = CloudItem<NetworkInterfaceSpec, E>;

/// Batch create entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateReq<S, E> {
    pub account_id: String,
    pub cloud_id: String,
    pub bk_biz_id: i64,
    #[serde(flatten)]
    pub spec: S,
    pub extension: E,
}

impl<S: ResourceSpec, E: VendorExtension> CreateReq<S, E> {
    /// Create entry for a newly observed cloud item, unassigned to any business
    pub fn from_item(account_id: impl Into<String>, item: CloudItem<S, E>) -> Self {
        Self {
            account_id: account_id.into(),
            cloud_id: item.cloud_id,
            bk_biz_id: UNASSIGNED_BIZ,
            spec: item.spec,
            extension: item.extension,
        }
    }

    pub fn vendor(&self) -> Vendor {
        E::VENDOR
    }
}

/// Batch update entry; tracked fields are replaced as a whole
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateReq<S, E> {
    pub id: String,
    #[serde(flatten)]
    pub spec: S,
    pub extension: E,
}

impl<S, E> UpdateReq<S, E> {
    pub fn from_item(id: impl Into<String>, item: CloudItem<S, E>) -> Self {
        Self {
            id: id.into(),
            spec: item.spec,
            extension: item.extension,
        }
    }
}

/// Identity projection of any row, independent of vendor extension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRef {
    pub id: String,
    pub cloud_id: String,
    pub vendor: Vendor,
    #[serde(default)]
    pub account_id: String,
    #[serde(default)]
    pub region: String,
    #[serde(default = "unassigned_biz")]
    pub bk_biz_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extension::AwsVpcExtension;
    use serde_json::json;

    #[test]
    fn test_decode_row_without_extension() {
        let row = json!({
            "id": "00000001",
            "vendor": "aws",
            "account_id": "acc-1",
            "cloud_id": "vpc-1",
            "name": "default",
            "region": "ap-guangzhou",
            "creator": "sync",
        });

        let vpc: Vpc<AwsVpcExtension> = serde_json::from_value(row).unwrap();
        assert_eq!(vpc.bk_biz_id, UNASSIGNED_BIZ);
        assert_eq!(vpc.spec.bk_cloud_id, UNBIND_BK_CLOUD_ID);
        assert!(vpc.extension.is_none());
        assert_eq!(vpc.revision.creator, "sync");
    }

    #[test]
    fn test_biz_guard() {
        let row = json!({
            "id": "00000002",
            "vendor": "aws",
            "account_id": "acc-1",
            "cloud_id": "vpc-2",
            "name": "n",
        });
        let mut vpc: Vpc<AwsVpcExtension> = serde_json::from_value(row).unwrap();
        assert!(matches!(
            vpc.ensure_biz_assigned(),
            Err(CloudError::BizUnassigned(_))
        ));

        vpc.bk_biz_id = 310;
        assert!(vpc.ensure_biz(310).is_ok());
        assert!(vpc.ensure_biz(311).is_err());
    }

    #[test]
    fn test_create_req_is_unassigned() {
        let item = CloudItem::new(
            "vpc-3",
            VpcSpec::new("prod", "us-east-1"),
            AwsVpcExtension::default(),
        );
        let req = CreateReq::from_item("acc-1", item);
        assert_eq!(req.bk_biz_id, UNASSIGNED_BIZ);
        assert_eq!(req.vendor(), Vendor::Aws);

        let body = serde_json::to_value(&req).unwrap();
        assert_eq!(body["name"], "prod");
        assert_eq!(body["cloud_id"], "vpc-3");
    }
}
