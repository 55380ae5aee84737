use super::{attach_subnet, create_in_server_biz, spec_changed};
use crate::diff::{self, same_set};
use crate::relation::{ParentKey, ParentResolver};
use crate::request::{ScopeFilter, SyncRequest};
use crate::syncer::{ConfirmStrategy, Item, ResourceSyncer, Row};
use async_trait::async_trait;
use hcm_cloud::{
    CloudError, DataService, Expression, HuaWeiNIExtension, Kit, MAX_NI_ID_FILTER,
    NetworkInterfaceAdaptor, ResourceLocator, Result, VendorExtension, collect_pages,
};
use std::collections::HashSet;
use std::sync::Arc;

/// HuaWei interfaces, listed server by server
pub struct HuaWeiNISyncer {
    data: Arc<dyn DataService>,
    adaptor: Arc<dyn NetworkInterfaceAdaptor<HuaWeiNIExtension>>,
    subnets: Arc<ParentResolver>,
}

impl HuaWeiNISyncer {
    pub fn new(
        data: Arc<dyn DataService>,
        adaptor: Arc<dyn NetworkInterfaceAdaptor<HuaWeiNIExtension>>,
        subnets: Arc<ParentResolver>,
    ) -> Self {
        Self {
            data,
            adaptor,
            subnets,
        }
    }
}

fn dedup_in_place(values: &mut Vec<String>) {
    let mut seen = HashSet::new();
    values.retain(|v| seen.insert(v.clone()));
}

fn ext_changed(cloud: &HuaWeiNIExtension, db: &HuaWeiNIExtension) -> bool {
    cloud.mac_addr != db.mac_addr
        || cloud.net_id != db.net_id
        || cloud.port_state != db.port_state
        || cloud.delete_on_termination != db.delete_on_termination
        || cloud.driver_mode != db.driver_mode
        || cloud.min_rate != db.min_rate
        || cloud.multiqueue_num != db.multiqueue_num
        || cloud.pci_address != db.pci_address
        || cloud.ipv6 != db.ipv6
        || cloud.addresses != db.addresses
        || !same_set(&cloud.cloud_security_group_ids, &db.cloud_security_group_ids)
        || !same_set(&cloud.fixed_ips, &db.fixed_ips)
        || !same_set(&cloud.virtual_ip_list, &db.virtual_ip_list)
}

#[async_trait]
impl ResourceSyncer for HuaWeiNISyncer {
    type Ext = HuaWeiNIExtension;

    fn data(&self) -> &dyn DataService {
        self.data.as_ref()
    }

    fn id_filter_limit(&self) -> usize {
        MAX_NI_ID_FILTER
    }

    fn validate(&self, req: &SyncRequest) -> Result<()> {
        req.validate(self.id_filter_limit())?;
        req.require_region()?;
        if req.cloud_cvm_ids.is_empty() {
            return Err(CloudError::InvalidParameter(
                "cloud_cvm_ids is required".to_string(),
            ));
        }
        Ok(())
    }

    async fn list(&self, kt: &Kit, req: &SyncRequest) -> Result<Vec<Item<HuaWeiNIExtension>>> {
        let mut items = Vec::new();
        for cvm_id in &req.cloud_cvm_ids {
            let opt = req.list_option().with_cloud_cvm_ids(vec![cvm_id.clone()]);
            let ports = collect_pages(&opt, |o| async move {
                self.adaptor.list_network_interface(kt, &o).await
            })
            .await?;
            tracing::debug!(rid = %kt.rid, cvm_id = %cvm_id, count = ports.len(), "listed server ports");
            items.extend(ports);
        }

        let keys: Vec<String> = items
            .iter()
            .map(|item| item.spec.cloud_subnet_id.clone())
            .collect();
        let subnets = self
            .subnets
            .query_ids_and_sync(kt, &req.narrowed(Vec::new()), ParentKey::CloudId, &keys)
            .await?;

        for item in items.iter_mut() {
            dedup_in_place(&mut item.extension.cloud_security_group_ids);
            if let Some(subnet) = subnets.get(&item.spec.cloud_subnet_id) {
                attach_subnet(&mut item.spec, subnet);
            }
        }
        Ok(items)
    }

    fn db_scope(&self, req: &SyncRequest) -> Expression {
        ScopeFilter::account(HuaWeiNIExtension::VENDOR, &req.account_id)
            .eq("region", &req.region)
            .in_list("instance_id", &req.cloud_cvm_ids)
            .in_list("cloud_id", &req.cloud_ids)
            .build()
    }

    fn is_changed(&self, cloud: &Item<HuaWeiNIExtension>, db: &Row<HuaWeiNIExtension>) -> bool {
        spec_changed(&cloud.spec, &db.spec)
            || diff::extension_changed(&cloud.extension, db.extension.as_ref(), ext_changed)
    }

    async fn create(
        &self,
        kt: &Kit,
        req: &SyncRequest,
        items: Vec<Item<HuaWeiNIExtension>>,
    ) -> Result<Vec<String>> {
        create_in_server_biz(self.data(), kt, &req.account_id, items).await
    }

    fn confirm_strategy(&self) -> ConfirmStrategy {
        ConfirmStrategy::DirectLookup
    }

    async fn lookup(
        &self,
        kt: &Kit,
        req: &SyncRequest,
        row: &Row<HuaWeiNIExtension>,
    ) -> Result<()> {
        let target = ResourceLocator {
            account_id: req.account_id.clone(),
            region: req.region.clone(),
            zone: None,
            resource_group_name: None,
            cloud_id: row.cloud_id.clone(),
        };
        self.adaptor.get_network_interface(kt, &target).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_keeps_first_seen_order() {
        let mut groups = vec!["sg-b".to_string(), "sg-a".to_string(), "sg-b".to_string()];
        dedup_in_place(&mut groups);
        assert_eq!(groups, vec!["sg-b", "sg-a"]);
    }
}
