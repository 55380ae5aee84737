use super::VpcRules;
use crate::diff::same_set;
use crate::request::{ScopeFilter, SyncRequest, lowercase_resource_group};
use crate::syncer::Item;
use hcm_cloud::{AzureVpcExtension, Expression, Result, VendorExtension};

impl VpcRules for AzureVpcExtension {
    fn validate(req: &SyncRequest) -> Result<()> {
        req.require_resource_group().map(|_| ())
    }

    /// Azure networks are scoped by resource group, not region
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

    fn extension_changed(cloud: &Self, db: &Self) -> bool {
        !same_set(&cloud.cidr, &db.cidr)
            || !same_set(&cloud.dns_servers, &db.dns_servers)
            || !cloud
                .resource_group_name
                .eq_ignore_ascii_case(&db.resource_group_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hcm_cloud::{CloudItem, VpcSpec};
    use serde_json::json;

    #[test]
    fn test_scope_matches_resource_group_case_insensitively() {
        let req = SyncRequest::new("acc-1", "").with_resource_group("RG-Prod");
        let scope = AzureVpcExtension::db_scope(&req);

        assert!(scope.matches(&json!({
            "vendor": "azure",
            "account_id": "acc-1",
            "extension": {"resource_group_name": "rg-prod"},
        })));
        assert!(!scope.matches(&json!({
            "vendor": "azure",
            "account_id": "acc-1",
            "extension": {"resource_group_name": "rg-dev"},
        })));
    }

    #[test]
    fn test_normalize_lowercases_resource_group() {
        let mut item: Item<AzureVpcExtension> = CloudItem::new(
            "vnet-1",
            VpcSpec::new("web", ""),
            AzureVpcExtension {
                resource_group_name: "RG-Prod".to_string(),
                ..Default::default()
            },
        );
        AzureVpcExtension::normalize(&mut item);
        assert_eq!(item.extension.resource_group_name, "rg-prod");
    }

    #[test]
    fn test_requires_resource_group() {
        assert!(AzureVpcExtension::validate(&SyncRequest::new("acc-1", "eastus")).is_err());
    }
}
