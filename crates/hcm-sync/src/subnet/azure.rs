use super::SubnetRules;
use crate::diff::opt_str_changed;
use crate::request::{ScopeFilter, SyncRequest, lowercase_resource_group};
use crate::syncer::Item;
use hcm_cloud::{AzureSubnetExtension, Expression, Result, VendorExtension};

impl SubnetRules for AzureSubnetExtension {
    fn validate(req: &SyncRequest) -> Result<()> {
        req.require_resource_group().map(|_| ())
    }

    fn db_scope(req: &SyncRequest) -> Expression {
        ScopeFilter::account(Self::VENDOR, &req.account_id)
            .eq_lowercase(
                "extension.resource_group_name",
                req.resource_group_name.as_deref().unwrap_or_default(),
            )
            .in_list("cloud_id", &req.cloud_ids)
            .build()
    }

    fn normalize(item: &mut Item<Self>) {
        lowercase_resource_group(&mut item.extension.resource_group_name);
    }

    /// `security_group_id` is the internal id, owned by HCM
    fn extension_changed(cloud: &Self, db: &Self) -> bool {
        !cloud
            .resource_group_name
            .eq_ignore_ascii_case(&db.resource_group_name)
            || opt_str_changed(&cloud.nat_gateway, &db.nat_gateway)
            || opt_str_changed(&cloud.cloud_security_group_id, &db.cloud_security_group_id)
    }
}
