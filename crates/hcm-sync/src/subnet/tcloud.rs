use super::SubnetRules;
use crate::diff::opt_str_changed;
use crate::vpc::TCLOUD_QUERY_LIMIT;
use hcm_cloud::TCloudSubnetExtension;

impl SubnetRules for TCloudSubnetExtension {
    const QUERY_CHUNK: usize = TCLOUD_QUERY_LIMIT;

    fn extension_changed(cloud: &Self, db: &Self) -> bool {
        cloud.is_default != db.is_default
            || opt_str_changed(&cloud.cloud_network_acl_id, &db.cloud_network_acl_id)
    }
}
