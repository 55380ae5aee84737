//! EC2-backed VPC and subnet adaptor

use crate::convert::{convert_subnet, convert_vpc, ip_count};
use crate::error::AwsError;
use async_trait::async_trait;
use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_ec2::Client;
use aws_sdk_ec2::config::Region;
use aws_sdk_ec2::types::{ResourceType, Tag, TagSpecification, VpcAttributeName};
use hcm_cloud::{
    AvailIpResult, AwsSubnetExtension, AwsVpcExtension, CloudError, CloudSubnet, CloudVpc,
    CountIpOption, Kit, ListOption, ListPage, MAX_CLOUD_ID_FILTER, PageCursor, ResourceLocator,
    Result, SubnetAdaptor, SubnetCreateOption, UpdateOption, VpcAdaptor, VpcCreateOption,
};
use std::collections::HashMap;

/// Page size when listing without an id filter
const PAGE_SIZE: i32 = 1000;

/// Native AWS adaptor; one EC2 client is built per call for the requested region
#[derive(Clone)]
pub struct AwsAdaptor {
    sdk_config: SdkConfig,
}

impl AwsAdaptor {
    pub fn new(sdk_config: SdkConfig) -> Self {
        Self { sdk_config }
    }

    /// Credentials and settings from the default provider chain
    pub async fn from_env() -> Self {
        Self::new(aws_config::defaults(BehaviorVersion::latest()).load().await)
    }

    fn client(&self, region: &str) -> Result<Client> {
        if region.is_empty() {
            return Err(CloudError::InvalidParameter(
                "aws region is required".to_string(),
            ));
        }
        let config = aws_sdk_ec2::config::Builder::from(&self.sdk_config)
            .region(Region::new(region.to_string()))
            .build();
        Ok(Client::from_conf(config))
    }

    fn page_token(opt: &ListOption) -> Result<Option<String>> {
        match &opt.page {
            None => Ok(None),
            Some(PageCursor::Token(token)) => Ok(Some(token.clone())),
            Some(PageCursor::Offset(_)) => Err(CloudError::InvalidParameter(
                "aws listings page by token".to_string(),
            )),
        }
    }

    /// EC2 rejects MaxResults together with explicit ids
    fn page_size(opt: &ListOption) -> Option<i32> {
        opt.cloud_ids.is_empty().then_some(PAGE_SIZE)
    }

    fn ids(opt: &ListOption) -> Option<Vec<String>> {
        (!opt.cloud_ids.is_empty()).then(|| opt.cloud_ids.clone())
    }

    fn name_tags(resource_type: ResourceType, name: &str) -> TagSpecification {
        TagSpecification::builder()
            .resource_type(resource_type)
            .tags(Tag::builder().key("Name").value(name).build())
            .build()
    }

    async fn vpc_dns_attributes(&self, client: &Client, vpc_id: &str) -> Result<(bool, bool)> {
        let hostnames = client
            .describe_vpc_attribute()
            .vpc_id(vpc_id)
            .attribute(VpcAttributeName::EnableDnsHostnames)
            .send()
            .await
            .map_err(|e| AwsError::from_sdk("DescribeVpcAttribute", e))?;
        let support = client
            .describe_vpc_attribute()
            .vpc_id(vpc_id)
            .attribute(VpcAttributeName::EnableDnsSupport)
            .send()
            .await
            .map_err(|e| AwsError::from_sdk("DescribeVpcAttribute", e))?;

        Ok((
            hostnames
                .enable_dns_hostnames()
                .and_then(|v| v.value())
                .unwrap_or_default(),
            support
                .enable_dns_support()
                .and_then(|v| v.value())
                .unwrap_or_default(),
        ))
    }
}

#[async_trait]
impl VpcAdaptor<AwsVpcExtension> for AwsAdaptor {
    async fn list_vpc(
        &self,
        kt: &Kit,
        opt: &ListOption,
    ) -> Result<ListPage<CloudVpc<AwsVpcExtension>>> {
        opt.check_bound(MAX_CLOUD_ID_FILTER)?;
        let client = self.client(&opt.region)?;

        let resp = client
            .describe_vpcs()
            .set_vpc_ids(Self::ids(opt))
            .set_next_token(Self::page_token(opt)?)
            .set_max_results(Self::page_size(opt))
            .send()
            .await
            .map_err(|e| {
                let err = AwsError::from_sdk("DescribeVpcs", e);
                if !matches!(err, AwsError::NotFound(_)) {
                    tracing::error!(rid = %kt.rid, region = %opt.region, error = %err, "list aws vpc failed");
                }
                err
            })?;

        let mut details = Vec::with_capacity(resp.vpcs().len());
        for vpc in resp.vpcs() {
            let Some(mut item) = convert_vpc(vpc, &opt.region) else {
                continue;
            };
            let (hostnames, support) = self.vpc_dns_attributes(&client, &item.cloud_id).await?;
            item.extension.enable_dns_hostnames = hostnames;
            item.extension.enable_dns_support = support;
            details.push(item);
        }

        Ok(ListPage {
            details,
            next: resp
                .next_token()
                .map(|t| PageCursor::Token(t.to_string())),
        })
    }

    async fn create_vpc(&self, kt: &Kit, opt: &VpcCreateOption) -> Result<String> {
        let cidr = opt.ipv4_cidr.as_deref().unwrap_or_default();
        if cidr.is_empty() || opt.name.is_empty() {
            return Err(CloudError::InvalidParameter(
                "aws vpc create requires name and ipv4_cidr".to_string(),
            ));
        }
        let client = self.client(&opt.region)?;

        let resp = client
            .create_vpc()
            .cidr_block(cidr)
            .tag_specifications(Self::name_tags(ResourceType::Vpc, &opt.name))
            .send()
            .await
            .map_err(|e| AwsError::from_sdk("CreateVpc", e))?;

        let cloud_id = resp
            .vpc()
            .and_then(|v| v.vpc_id())
            .ok_or(AwsError::MissingField("Vpc.VpcId"))?;
        tracing::info!(rid = %kt.rid, region = %opt.region, cloud_id, "aws vpc created");
        Ok(cloud_id.to_string())
    }

    /// AWS VPCs carry no memo; the memo lives in the DB only
    async fn update_vpc(&self, kt: &Kit, opt: &UpdateOption) -> Result<()> {
        tracing::debug!(rid = %kt.rid, cloud_id = %opt.target.cloud_id, "aws vpc update is db-only");
        Ok(())
    }

    async fn delete_vpc(&self, kt: &Kit, target: &ResourceLocator) -> Result<()> {
        let client = self.client(&target.region)?;
        client
            .delete_vpc()
            .vpc_id(&target.cloud_id)
            .send()
            .await
            .map_err(|e| AwsError::from_sdk("DeleteVpc", e))?;
        tracing::info!(rid = %kt.rid, region = %target.region, cloud_id = %target.cloud_id, "aws vpc deleted");
        Ok(())
    }
}

#[async_trait]
impl SubnetAdaptor<AwsSubnetExtension> for AwsAdaptor {
    async fn list_subnet(
        &self,
        kt: &Kit,
        opt: &ListOption,
    ) -> Result<ListPage<CloudSubnet<AwsSubnetExtension>>> {
        opt.check_bound(MAX_CLOUD_ID_FILTER)?;
        let client = self.client(&opt.region)?;

        let resp = client
            .describe_subnets()
            .set_subnet_ids(Self::ids(opt))
            .set_next_token(Self::page_token(opt)?)
            .set_max_results(Self::page_size(opt))
            .send()
            .await
            .map_err(|e| {
                let err = AwsError::from_sdk("DescribeSubnets", e);
                tracing::error!(rid = %kt.rid, region = %opt.region, error = %err, "list aws subnet failed");
                err
            })?;

        Ok(ListPage {
            details: resp
                .subnets()
                .iter()
                .filter_map(|s| convert_subnet(s, &opt.region))
                .collect(),
            next: resp
                .next_token()
                .map(|t| PageCursor::Token(t.to_string())),
        })
    }

    async fn create_subnet(&self, kt: &Kit, opt: &SubnetCreateOption) -> Result<String> {
        let cidr = opt.ipv4_cidr.as_deref().unwrap_or_default();
        if cidr.is_empty() || opt.cloud_vpc_id.is_empty() {
            return Err(CloudError::InvalidParameter(
                "aws subnet create requires cloud_vpc_id and ipv4_cidr".to_string(),
            ));
        }
        let client = self.client(&opt.region)?;

        let resp = client
            .create_subnet()
            .vpc_id(&opt.cloud_vpc_id)
            .cidr_block(cidr)
            .set_ipv6_cidr_block(opt.ipv6_cidr.clone())
            .set_availability_zone(opt.zone.clone())
            .tag_specifications(Self::name_tags(ResourceType::Subnet, &opt.name))
            .send()
            .await
            .map_err(|e| AwsError::from_sdk("CreateSubnet", e))?;

        let cloud_id = resp
            .subnet()
            .and_then(|s| s.subnet_id())
            .ok_or(AwsError::MissingField("Subnet.SubnetId"))?;
        tracing::info!(rid = %kt.rid, region = %opt.region, cloud_id, "aws subnet created");
        Ok(cloud_id.to_string())
    }

    async fn update_subnet(&self, kt: &Kit, opt: &UpdateOption) -> Result<()> {
        tracing::debug!(rid = %kt.rid, cloud_id = %opt.target.cloud_id, "aws subnet update is db-only");
        Ok(())
    }

    async fn delete_subnet(&self, kt: &Kit, target: &ResourceLocator) -> Result<()> {
        let client = self.client(&target.region)?;
        client
            .delete_subnet()
            .subnet_id(&target.cloud_id)
            .send()
            .await
            .map_err(|e| AwsError::from_sdk("DeleteSubnet", e))?;
        tracing::info!(rid = %kt.rid, region = %target.region, cloud_id = %target.cloud_id, "aws subnet deleted");
        Ok(())
    }

    async fn count_subnet_ips(
        &self,
        _kt: &Kit,
        opt: &CountIpOption,
    ) -> Result<HashMap<String, AvailIpResult>> {
        if opt.cloud_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let client = self.client(&opt.region)?;

        let resp = client
            .describe_subnets()
            .set_subnet_ids(Some(opt.cloud_ids.clone()))
            .send()
            .await
            .map_err(|e| AwsError::from_sdk("DescribeSubnets", e))?;

        let mut counts = HashMap::with_capacity(resp.subnets().len());
        for subnet in resp.subnets() {
            let (Some(id), Some(cidr)) = (subnet.subnet_id(), subnet.cidr_block()) else {
                continue;
            };
            let available = subnet.available_ip_address_count().unwrap_or_default();
            counts.insert(id.to_string(), ip_count(cidr, available)?);
        }
        Ok(counts)
    }
}
