use super::SubnetRules;
use hcm_cloud::AwsSubnetExtension;

impl SubnetRules for AwsSubnetExtension {
    fn extension_changed(cloud: &Self, db: &Self) -> bool {
        cloud.state != db.state
            || cloud.is_default != db.is_default
            || cloud.map_public_ip_on_launch != db.map_public_ip_on_launch
            || cloud.assign_ipv6_address_on_creation != db.assign_ipv6_address_on_creation
            || cloud.hostname_type != db.hostname_type
    }
}
