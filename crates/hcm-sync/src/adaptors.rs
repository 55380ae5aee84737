//! Adaptor set of every vendor and resource kind

use hcm_cloud::{
    AvailIpResult, AwsSubnetExtension, AwsVpcExtension, AzureNIExtension, AzureSubnetExtension,
    AzureVpcExtension, CloudError, CountIpOption, GcpNIExtension, GcpSubnetExtension,
    GcpVpcExtension, HuaWeiNIExtension, HuaWeiSubnetExtension, HuaWeiVpcExtension, Kit,
    NetworkInterfaceAdaptor, ResourceLocator, Result, SubnetAdaptor, SubnetCreateOption,
    TCloudSubnetExtension, TCloudVpcExtension, UpdateOption, Vendor, VpcAdaptor, VpcCreateOption,
};
use std::collections::HashMap;
use std::sync::Arc;

/// An adaptor serving every vendor, like the gateway client or the fake cloud
pub trait CloudAdaptor:
    VpcAdaptor<AwsVpcExtension>
    + VpcAdaptor<AzureVpcExtension>
    + VpcAdaptor<GcpVpcExtension>
    + VpcAdaptor<HuaWeiVpcExtension>
    + VpcAdaptor<TCloudVpcExtension>
    + SubnetAdaptor<AwsSubnetExtension>
    + SubnetAdaptor<AzureSubnetExtension>
    + SubnetAdaptor<GcpSubnetExtension>
    + SubnetAdaptor<HuaWeiSubnetExtension>
    + SubnetAdaptor<TCloudSubnetExtension>
    + NetworkInterfaceAdaptor<AzureNIExtension>
    + NetworkInterfaceAdaptor<GcpNIExtension>
    + NetworkInterfaceAdaptor<HuaWeiNIExtension>
    + 'static
{
}

impl<T> CloudAdaptor for T where
    T: VpcAdaptor<AwsVpcExtension>
        + VpcAdaptor<AzureVpcExtension>
        + VpcAdaptor<GcpVpcExtension>
        + VpcAdaptor<HuaWeiVpcExtension>
        + VpcAdaptor<TCloudVpcExtension>
        + SubnetAdaptor<AwsSubnetExtension>
        + SubnetAdaptor<AzureSubnetExtension>
        + SubnetAdaptor<GcpSubnetExtension>
        + SubnetAdaptor<HuaWeiSubnetExtension>
        + SubnetAdaptor<TCloudSubnetExtension>
        + NetworkInterfaceAdaptor<AzureNIExtension>
        + NetworkInterfaceAdaptor<GcpNIExtension>
        + NetworkInterfaceAdaptor<HuaWeiNIExtension>
        + 'static
{
}

/// One adaptor per `(vendor, kind)`
#[derive(Clone)]
pub struct Adaptors {
    pub aws_vpc: Arc<dyn VpcAdaptor<AwsVpcExtension>>,
    pub azure_vpc: Arc<dyn VpcAdaptor<AzureVpcExtension>>,
    pub gcp_vpc: Arc<dyn VpcAdaptor<GcpVpcExtension>>,
    pub huawei_vpc: Arc<dyn VpcAdaptor<HuaWeiVpcExtension>>,
    pub tcloud_vpc: Arc<dyn VpcAdaptor<TCloudVpcExtension>>,
    pub aws_subnet: Arc<dyn SubnetAdaptor<AwsSubnetExtension>>,
    pub azure_subnet: Arc<dyn SubnetAdaptor<AzureSubnetExtension>>,
    pub gcp_subnet: Arc<dyn SubnetAdaptor<GcpSubnetExtension>>,
    pub huawei_subnet: Arc<dyn SubnetAdaptor<HuaWeiSubnetExtension>>,
    pub tcloud_subnet: Arc<dyn SubnetAdaptor<TCloudSubnetExtension>>,
    pub azure_ni: Arc<dyn NetworkInterfaceAdaptor<AzureNIExtension>>,
    pub gcp_ni: Arc<dyn NetworkInterfaceAdaptor<GcpNIExtension>>,
    pub huawei_ni: Arc<dyn NetworkInterfaceAdaptor<HuaWeiNIExtension>>,
}

/// Dispatch a call to the VPC or subnet adaptor of `vendor`
macro_rules! by_vendor {
    ($self:ident, $vendor:expr, vpc => |$a:ident| $call:expr) => {
        match $vendor {
            Vendor::Aws => {
                let $a = &$self.aws_vpc;
                $call
            }
            Vendor::Azure => {
                let $a = &$self.azure_vpc;
                $call
            }
            Vendor::Gcp => {
                let $a = &$self.gcp_vpc;
                $call
            }
            Vendor::HuaWei => {
                let $a = &$self.huawei_vpc;
                $call
            }
            Vendor::TCloud => {
                let $a = &$self.tcloud_vpc;
                $call
            }
        }
    };
    ($self:ident, $vendor:expr, subnet => |$a:ident| $call:expr) => {
        match $vendor {
            Vendor::Aws => {
                let $a = &$self.aws_subnet;
                $call
            }
            Vendor::Azure => {
                let $a = &$self.azure_subnet;
                $call
            }
            Vendor::Gcp => {
                let $a = &$self.gcp_subnet;
                $call
            }
            Vendor::HuaWei => {
                let $a = &$self.huawei_subnet;
                $call
            }
            Vendor::TCloud => {
                let $a = &$self.tcloud_subnet;
                $call
            }
        }
    };
}

impl Adaptors {
    /// Every slot served by the same adaptor
    pub fn uniform<A: CloudAdaptor>(adaptor: Arc<A>) -> Self {
        Self {
            aws_vpc: adaptor.clone(),
            azure_vpc: adaptor.clone(),
            gcp_vpc: adaptor.clone(),
            huawei_vpc: adaptor.clone(),
            tcloud_vpc: adaptor.clone(),
            aws_subnet: adaptor.clone(),
            azure_subnet: adaptor.clone(),
            gcp_subnet: adaptor.clone(),
            huawei_subnet: adaptor.clone(),
            tcloud_subnet: adaptor.clone(),
            azure_ni: adaptor.clone(),
            gcp_ni: adaptor.clone(),
            huawei_ni: adaptor,
        }
    }

    pub fn with_aws_vpc(mut self, adaptor: Arc<dyn VpcAdaptor<AwsVpcExtension>>) -> Self {
        self.aws_vpc = adaptor;
        self
    }

    pub fn with_aws_subnet(mut self, adaptor: Arc<dyn SubnetAdaptor<AwsSubnetExtension>>) -> Self {
        self.aws_subnet = adaptor;
        self
    }

    pub async fn create_vpc(
        &self,
        kt: &Kit,
        vendor: Vendor,
        opt: &VpcCreateOption,
    ) -> Result<String> {
        by_vendor!(self, vendor, vpc => |a| a.create_vpc(kt, opt).await)
    }

    pub async fn update_vpc(&self, kt: &Kit, vendor: Vendor, opt: &UpdateOption) -> Result<()> {
        by_vendor!(self, vendor, vpc => |a| a.update_vpc(kt, opt).await)
    }

    pub async fn delete_vpc(
        &self,
        kt: &Kit,
        vendor: Vendor,
        target: &ResourceLocator,
    ) -> Result<()> {
        by_vendor!(self, vendor, vpc => |a| a.delete_vpc(kt, target).await)
    }

    pub async fn create_subnet(
        &self,
        kt: &Kit,
        vendor: Vendor,
        opt: &SubnetCreateOption,
    ) -> Result<String> {
        by_vendor!(self, vendor, subnet => |a| a.create_subnet(kt, opt).await)
    }

    pub async fn update_subnet(&self, kt: &Kit, vendor: Vendor, opt: &UpdateOption) -> Result<()> {
        by_vendor!(self, vendor, subnet => |a| a.update_subnet(kt, opt).await)
    }

    pub async fn delete_subnet(
        &self,
        kt: &Kit,
        vendor: Vendor,
        target: &ResourceLocator,
    ) -> Result<()> {
        by_vendor!(self, vendor, subnet => |a| a.delete_subnet(kt, target).await)
    }

    pub async fn count_subnet_ips(
        &self,
        kt: &Kit,
        vendor: Vendor,
        opt: &CountIpOption,
    ) -> Result<HashMap<String, AvailIpResult>> {
        if opt.cloud_ids.is_empty() {
            return Err(CloudError::InvalidParameter("ids is required".to_string()));
        }
        by_vendor!(self, vendor, subnet => |a| a.count_subnet_ips(kt, opt).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::FakeCloud;

    #[tokio::test]
    async fn test_dispatch_reaches_the_vendor_slot() {
        let cloud = Arc::new(FakeCloud::new());
        let adaptors = Adaptors::uniform(cloud.clone());
        let kt = Kit::new();

        let opt = VpcCreateOption {
            account_id: "acc-1".to_string(),
            region: "cn-north-4".to_string(),
            name: "core".to_string(),
            ..Default::default()
        };
        let cloud_id = adaptors.create_vpc(&kt, Vendor::HuaWei, &opt).await.unwrap();

        let target = ResourceLocator {
            account_id: "acc-1".to_string(),
            region: "cn-north-4".to_string(),
            cloud_id: cloud_id.clone(),
            ..Default::default()
        };
        // Created under HuaWei, so another vendor cannot see it
        assert!(adaptors.delete_vpc(&kt, Vendor::Aws, &target).await.is_err());
        adaptors.delete_vpc(&kt, Vendor::HuaWei, &target).await.unwrap();
    }

    #[tokio::test]
    async fn test_count_requires_ids() {
        let adaptors = Adaptors::uniform(Arc::new(FakeCloud::new()));
        let opt = CountIpOption {
            account_id: "acc-1".to_string(),
            ..Default::default()
        };
        let result = adaptors
            .count_subnet_ips(&Kit::new(), Vendor::TCloud, &opt)
            .await;
        assert!(matches!(result, Err(CloudError::InvalidParameter(_))));
    }
}
