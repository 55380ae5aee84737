use super::VpcRules;
use crate::diff::same_set;
use hcm_cloud::AwsVpcExtension;

impl VpcRules for AwsVpcExtension {
    fn extension_changed(cloud: &Self, db: &Self) -> bool {
        !same_set(&cloud.cidr, &db.cidr)
            || cloud.state != db.state
            || cloud.instance_tenancy != db.instance_tenancy
            || cloud.is_default != db.is_default
            || cloud.enable_dns_hostnames != db.enable_dns_hostnames
            || cloud.enable_dns_support != db.enable_dns_support
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hcm_cloud::{AwsCidr, IpAddressType};

    fn cidr(block: &str) -> AwsCidr {
        AwsCidr {
            kind: IpAddressType::Ipv4,
            cidr: block.to_string(),
            address_pool: String::new(),
            state: "associated".to_string(),
        }
    }

    #[test]
    fn test_cidr_order_is_ignored() {
        let db = AwsVpcExtension {
            cidr: vec![cidr("10.0.0.0/16"), cidr("10.1.0.0/16")],
            ..Default::default()
        };
        let cloud = AwsVpcExtension {
            cidr: vec![cidr("10.1.0.0/16"), cidr("10.0.0.0/16")],
            ..Default::default()
        };
        assert!(!AwsVpcExtension::extension_changed(&cloud, &db));

        let dns = AwsVpcExtension {
            enable_dns_support: true,
            ..cloud
        };
        assert!(AwsVpcExtension::extension_changed(&dns, &db));
    }
}
