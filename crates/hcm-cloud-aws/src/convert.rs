//! EC2 model to HCM model conversion

use crate::error::{AwsError, Result};
use aws_sdk_ec2::types::{Subnet, Tag, Vpc};
use hcm_cloud::{
    AvailIpResult, AwsCidr, AwsSubnetExtension, AwsVpcExtension, CloudSubnet, CloudVpc,
    IpAddressType, SubnetSpec, VpcSpec,
};

/// Addresses AWS keeps for itself in every subnet
const RESERVED_IPS: u64 = 5;

/// Value of the `Name` tag, empty when untagged
pub(crate) fn name_tag(tags: &[Tag]) -> String {
    tags.iter()
        .find(|t| t.key() == Some("Name"))
        .and_then(|t| t.value())
        .unwrap_or_default()
        .to_string()
}

pub(crate) fn convert_vpc(vpc: &Vpc, region: &str) -> Option<CloudVpc<AwsVpcExtension>> {
    let cloud_id = vpc.vpc_id()?;
    let primary = vpc.cidr_block().unwrap_or_default();

    let mut cidr = Vec::new();
    if !primary.is_empty() {
        cidr.push(AwsCidr {
            kind: IpAddressType::Ipv4,
            cidr: primary.to_string(),
            ..Default::default()
        });
    }
    for assoc in vpc.cidr_block_association_set() {
        let Some(block) = assoc.cidr_block().filter(|b| !b.is_empty()) else {
            continue;
        };
        let state = assoc
            .cidr_block_state()
            .and_then(|s| s.state())
            .map(|s| s.as_str().to_string())
            .unwrap_or_default();

        // the primary block is listed again among the associations
        if block == primary {
            if let Some(first) = cidr.first_mut() {
                first.state = state;
            }
            continue;
        }
        cidr.push(AwsCidr {
            kind: IpAddressType::Ipv4,
            cidr: block.to_string(),
            address_pool: String::new(),
            state,
        });
    }
    for assoc in vpc.ipv6_cidr_block_association_set() {
        cidr.push(AwsCidr {
            kind: IpAddressType::Ipv6,
            cidr: assoc.ipv6_cidr_block().unwrap_or_default().to_string(),
            address_pool: assoc.ipv6_pool().unwrap_or_default().to_string(),
            state: assoc
                .ipv6_cidr_block_state()
                .and_then(|s| s.state())
                .map(|s| s.as_str().to_string())
                .unwrap_or_default(),
        });
    }

    let extension = AwsVpcExtension {
        cidr,
        state: vpc.state().map(|s| s.as_str().to_string()).unwrap_or_default(),
        instance_tenancy: vpc
            .instance_tenancy()
            .map(|t| t.as_str().to_string())
            .unwrap_or_default(),
        is_default: vpc.is_default().unwrap_or_default(),
        ..Default::default()
    };

    Some(CloudVpc::new(
        cloud_id,
        VpcSpec::new(name_tag(vpc.tags()), region),
        extension,
    ))
}

pub(crate) fn convert_subnet(
    subnet: &Subnet,
    region: &str,
) -> Option<CloudSubnet<AwsSubnetExtension>> {
    let cloud_id = subnet.subnet_id()?;

    let spec = SubnetSpec {
        name: name_tag(subnet.tags()),
        region: region.to_string(),
        zone: subnet.availability_zone().unwrap_or_default().to_string(),
        cloud_vpc_id: subnet.vpc_id().unwrap_or_default().to_string(),
        ipv4_cidr: subnet.cidr_block().map(str::to_string).into_iter().collect(),
        ipv6_cidr: subnet
            .ipv6_cidr_block_association_set()
            .iter()
            .filter_map(|a| a.ipv6_cidr_block())
            .map(str::to_string)
            .collect(),
        ..Default::default()
    };
    let extension = AwsSubnetExtension {
        state: subnet.state().map(|s| s.as_str().to_string()).unwrap_or_default(),
        is_default: subnet.default_for_az().unwrap_or_default(),
        map_public_ip_on_launch: subnet.map_public_ip_on_launch().unwrap_or_default(),
        assign_ipv6_address_on_creation: subnet
            .assign_ipv6_address_on_creation()
            .unwrap_or_default(),
        hostname_type: subnet
            .private_dns_name_options_on_launch()
            .and_then(|o| o.hostname_type())
            .map(|h| h.as_str().to_string())
            .unwrap_or_default(),
    };

    Some(CloudSubnet::new(cloud_id, spec, extension))
}

/// IP usage of a subnet from its IPv4 block and the available count EC2 reports
pub(crate) fn ip_count(cidr: &str, available: i32) -> Result<AvailIpResult> {
    let prefix: u32 = cidr
        .split_once('/')
        .and_then(|(_, p)| p.parse().ok())
        .filter(|p| *p <= 32)
        .ok_or_else(|| AwsError::InvalidRequest(format!("bad ipv4 cidr: {}", cidr)))?;

    let total = (1u64 << (32 - prefix)).saturating_sub(RESERVED_IPS);
    let available = u64::try_from(available).unwrap_or_default();
    Ok(AvailIpResult {
        available_ip_count: available,
        total_ip_count: total,
        used_ip_count: total.saturating_sub(available),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_ec2::types::{
        SubnetState, VpcCidrBlockAssociation, VpcCidrBlockState, VpcCidrBlockStateCode, VpcState,
    };

    fn tag(key: &str, value: &str) -> Tag {
        Tag::builder().key(key).value(value).build()
    }

    #[test]
    fn test_convert_vpc_merges_primary_block_state() {
        let vpc = Vpc::builder()
            .vpc_id("vpc-1")
            .cidr_block("10.0.0.0/16")
            .state(VpcState::Available)
            .is_default(false)
            .tags(tag("env", "prod"))
            .tags(tag("Name", "core"))
            .cidr_block_association_set(
                VpcCidrBlockAssociation::builder()
                    .cidr_block("10.0.0.0/16")
                    .cidr_block_state(
                        VpcCidrBlockState::builder()
                            .state(VpcCidrBlockStateCode::Associated)
                            .build(),
                    )
                    .build(),
            )
            .cidr_block_association_set(
                VpcCidrBlockAssociation::builder()
                    .cidr_block("10.1.0.0/16")
                    .build(),
            )
            .build();

        let item = convert_vpc(&vpc, "us-east-1").unwrap();
        assert_eq!(item.cloud_id, "vpc-1");
        assert_eq!(item.spec.name, "core");
        assert_eq!(item.spec.region, "us-east-1");
        assert_eq!(item.extension.state, "available");

        let blocks: Vec<_> = item
            .extension
            .cidr
            .iter()
            .map(|c| (c.cidr.as_str(), c.state.as_str()))
            .collect();
        assert_eq!(
            blocks,
            vec![("10.0.0.0/16", "associated"), ("10.1.0.0/16", "")]
        );
    }

    #[test]
    fn test_convert_without_id_is_skipped() {
        assert!(convert_vpc(&Vpc::builder().build(), "us-east-1").is_none());
        assert!(convert_subnet(&Subnet::builder().build(), "us-east-1").is_none());
    }

    #[test]
    fn test_convert_subnet() {
        let subnet = Subnet::builder()
            .subnet_id("subnet-1")
            .vpc_id("vpc-1")
            .availability_zone("us-east-1a")
            .cidr_block("10.0.1.0/24")
            .state(SubnetState::Available)
            .default_for_az(true)
            .build();

        let item = convert_subnet(&subnet, "us-east-1").unwrap();
        assert_eq!(item.spec.cloud_vpc_id, "vpc-1");
        assert_eq!(item.spec.zone, "us-east-1a");
        assert_eq!(item.spec.ipv4_cidr, vec!["10.0.1.0/24".to_string()]);
        assert!(item.spec.ipv6_cidr.is_empty());
        assert!(item.extension.is_default);
    }

    #[test]
    fn test_ip_count() {
        let count = ip_count("10.0.1.0/24", 240).unwrap();
        assert_eq!(count.total_ip_count, 251);
        assert_eq!(count.used_ip_count, 11);

        assert!(ip_count("10.0.1.0", 1).is_err());
        assert!(ip_count("10.0.1.0/33", 1).is_err());
    }
}
