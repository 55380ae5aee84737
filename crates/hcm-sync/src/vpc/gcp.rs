use super::VpcRules;
use crate::request::{ScopeFilter, SyncRequest};
use crate::syncer::ConfirmStrategy;
use hcm_cloud::{Expression, GcpVpcExtension, Result, VendorExtension};

/// GCP networks are global; the account is the whole scope
impl VpcRules for GcpVpcExtension {
    const CONFIRM: ConfirmStrategy = ConfirmStrategy::NoConfirm;

    fn validate(_req: &SyncRequest) -> Result<()> {
        Ok(())
    }

    fn db_scope(req: &SyncRequest) -> Expression {
        ScopeFilter::account(Self::VENDOR, &req.account_id)
            .in_list("cloud_id", &req.cloud_ids)
            .build()
    }

    fn extension_changed(cloud: &Self, db: &Self) -> bool {
        cloud.self_link != db.self_link
            || cloud.auto_create_subnetworks != db.auto_create_subnetworks
            || cloud.enable_ula_internal_ipv6 != db.enable_ula_internal_ipv6
            || cloud.internal_ipv6_range != db.internal_ipv6_range
            || cloud.mtu != db.mtu
            || cloud.routing_mode != db.routing_mode
    }
}
