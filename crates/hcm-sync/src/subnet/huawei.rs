use super::SubnetRules;
use crate::diff::same_set;
use hcm_cloud::HuaWeiSubnetExtension;

impl SubnetRules for HuaWeiSubnetExtension {
    fn extension_changed(cloud: &Self, db: &Self) -> bool {
        cloud.status != db.status
            || cloud.dhcp_enable != db.dhcp_enable
            || cloud.gateway_ip != db.gateway_ip
            || !same_set(&cloud.dns_list, &db.dns_list)
            || !same_set(&cloud.ntp_addresses, &db.ntp_addresses)
    }
}
