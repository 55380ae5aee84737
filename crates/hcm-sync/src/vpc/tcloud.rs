use super::VpcRules;
use crate::diff::same_set;
use hcm_cloud::TCloudVpcExtension;

/// TCloud Describe* calls accept at most 100 ids each
pub const TCLOUD_QUERY_LIMIT: usize = 100;

impl VpcRules for TCloudVpcExtension {
    const QUERY_CHUNK: usize = TCLOUD_QUERY_LIMIT;

    fn extension_changed(cloud: &Self, db: &Self) -> bool {
        !same_set(&cloud.cidr, &db.cidr)
            || !same_set(&cloud.dns_server_set, &db.dns_server_set)
            || cloud.is_default != db.is_default
            || cloud.enable_multicast != db.enable_multicast
            || cloud.domain_name != db.domain_name
    }
}
