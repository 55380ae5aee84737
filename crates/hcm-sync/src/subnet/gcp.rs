use super::SubnetRules;
use crate::relation::ParentKey;
use crate::request::SyncRequest;
use crate::syncer::{ConfirmStrategy, Item};
use hcm_cloud::GcpSubnetExtension;

impl SubnetRules for GcpSubnetExtension {
    const CONFIRM: ConfirmStrategy = ConfirmStrategy::NoConfirm;
    const PARENT: ParentKey = ParentKey::SelfLink;

    fn parent_key(item: &Item<Self>) -> &str {
        &item.extension.vpc_self_link
    }

    /// GCP networks are global, so the parent sync drops the region
    fn parent_scope(req: &SyncRequest) -> SyncRequest {
        SyncRequest::new(req.account_id.clone(), "")
    }

    fn extension_changed(cloud: &Self, db: &Self) -> bool {
        cloud.self_link != db.self_link
            || cloud.vpc_self_link != db.vpc_self_link
            || cloud.stack_type != db.stack_type
            || cloud.ipv6_access_type != db.ipv6_access_type
            || cloud.gateway_address != db.gateway_address
            || cloud.private_ip_google_access != db.private_ip_google_access
            || cloud.enable_flow_logs != db.enable_flow_logs
    }
}
