use super::{attach_subnet, create_in_server_biz, spec_changed};
use crate::diff::{self, Changed, opt_str_changed, same_set};
use crate::relation::{ParentKey, ParentResolver};
use crate::request::{ScopeFilter, SyncRequest, lowercase_resource_group};
use crate::syncer::{ConfirmStrategy, Item, ResourceSyncer, Row};
use crate::writer;
use async_trait::async_trait;
use hcm_cloud::{
    AzureNIExtension, DataService, Expression, Kit, MAX_NI_ID_FILTER, NetworkInterfaceAdaptor,
    ResourceLocator, Result, UpdateReq, VendorExtension, collect_pages,
};
use std::sync::Arc;

/// Azure interfaces, scoped by resource group and confirmed one by one
pub struct AzureNISyncer {
    data: Arc<dyn DataService>,
    adaptor: Arc<dyn NetworkInterfaceAdaptor<AzureNIExtension>>,
    subnets: Arc<ParentResolver>,
}

impl AzureNISyncer {
    pub fn new(
        data: Arc<dyn DataService>,
        adaptor: Arc<dyn NetworkInterfaceAdaptor<AzureNIExtension>>,
        subnets: Arc<ParentResolver>,
    ) -> Self {
        Self {
            data,
            adaptor,
            subnets,
        }
    }
}

fn ext_changed(cloud: &AzureNIExtension, db: &AzureNIExtension) -> bool {
    !cloud
        .resource_group_name
        .eq_ignore_ascii_case(&db.resource_group_name)
        || opt_str_changed(&cloud.mac_address, &db.mac_address)
        || cloud.enable_accelerated_networking != db.enable_accelerated_networking
        || cloud.enable_ip_forwarding != db.enable_ip_forwarding
        || !same_set(&cloud.dns_servers, &db.dns_servers)
        || opt_str_changed(
            &cloud.cloud_gateway_load_balancer_id,
            &db.cloud_gateway_load_balancer_id,
        )
        || opt_str_changed(&cloud.cloud_security_group_id, &db.cloud_security_group_id)
        || !same_set(&cloud.ip_configurations, &db.ip_configurations)
}

#[async_trait]
impl ResourceSyncer for AzureNISyncer {
    type Ext = AzureNIExtension;

    fn data(&self) -> &dyn DataService {
        self.data.as_ref()
    }

    fn id_filter_limit(&self) -> usize {
        MAX_NI_ID_FILTER
    }

    fn validate(&self, req: &SyncRequest) -> Result<()> {
        req.validate(self.id_filter_limit())?;
        req.require_resource_group().map(|_| ())
    }

    async fn list(&self, kt: &Kit, req: &SyncRequest) -> Result<Vec<Item<AzureNIExtension>>> {
        let opt = req.list_option();
        let mut items = collect_pages(&opt, |o| async move {
            self.adaptor.list_network_interface(kt, &o).await
        })
        .await?;

        let keys: Vec<String> = items
            .iter()
            .map(|item| item.spec.cloud_subnet_id.clone())
            .collect();
        let subnets = self
            .subnets
            .query_ids_and_sync(kt, &req.narrowed(Vec::new()), ParentKey::CloudId, &keys)
            .await?;
        for item in items.iter_mut() {
            lowercase_resource_group(&mut item.extension.resource_group_name);
            if let Some(subnet) = subnets.get(&item.spec.cloud_subnet_id) {
                attach_subnet(&mut item.spec, subnet);
            }
        }
        Ok(items)
    }

    fn db_scope(&self, req: &SyncRequest) -> Expression {
        ScopeFilter::account(AzureNIExtension::VENDOR, &req.account_id)
            .eq_lowercase(
                "extension.resource_group_name",
                req.resource_group_name.as_deref().unwrap_or_default(),
            )
            .in_list("cloud_id", &req.cloud_ids)
            .in_list("instance_id", &req.cloud_cvm_ids)
            .build()
    }

    fn is_changed(&self, cloud: &Item<AzureNIExtension>, db: &Row<AzureNIExtension>) -> bool {
        spec_changed(&cloud.spec, &db.spec)
            || diff::extension_changed(&cloud.extension, db.extension.as_ref(), ext_changed)
    }

    async fn create(
        &self,
        kt: &Kit,
        req: &SyncRequest,
        items: Vec<Item<AzureNIExtension>>,
    ) -> Result<Vec<String>> {
        create_in_server_biz(self.data(), kt, &req.account_id, items).await
    }

    async fn update(
        &self,
        kt: &Kit,
        _req: &SyncRequest,
        items: Vec<Changed<AzureNIExtension>>,
    ) -> Result<()> {
        let reqs = items
            .into_iter()
            .map(|Changed { mut cloud, db }| {
                if let Some(ext) = db.extension {
                    if cloud.extension.security_group_id.is_none() {
                        cloud.extension.security_group_id = ext.security_group_id;
                    }
                }
                UpdateReq::from_item(db.id, cloud)
            })
            .collect();
        writer::update_rows::<AzureNIExtension>(self.data(), kt, reqs).await
    }

    fn confirm_strategy(&self) -> ConfirmStrategy {
        ConfirmStrategy::DirectLookup
    }

    async fn lookup(
        &self,
        kt: &Kit,
        req: &SyncRequest,
        row: &Row<AzureNIExtension>,
    ) -> Result<()> {
        let rg = row
            .extension
            .as_ref()
            .map(|ext| ext.resource_group_name.clone())
            .filter(|rg| !rg.is_empty())
            .or_else(|| req.resource_group_name.clone());
        let target = ResourceLocator {
            account_id: req.account_id.clone(),
            region: row.spec.region.clone(),
            zone: None,
            resource_group_name: rg,
            cloud_id: row.cloud_id.clone(),
        };
        self.adaptor.get_network_interface(kt, &target).await.map(|_| ())
    }
}
