use super::{attach_subnet, create_in_server_biz, spec_changed};
use crate::diff;
use crate::relation::{ParentKey, ParentResolver};
use crate::request::{ScopeFilter, SyncRequest};
use crate::syncer::{ConfirmStrategy, Item, ResourceSyncer, Row};
use async_trait::async_trait;
use hcm_cloud::{
    CloudError, DataService, Expression, GcpNIExtension, Kit, MAX_NI_ID_FILTER,
    NetworkInterfaceAdaptor, Result, VendorExtension, collect_pages,
};
use std::sync::Arc;

/// GCP interfaces, listed per zone and referring to parents by self link
pub struct GcpNISyncer {
    data: Arc<dyn DataService>,
    adaptor: Arc<dyn NetworkInterfaceAdaptor<GcpNIExtension>>,
    vpcs: Arc<ParentResolver>,
    subnets: Arc<ParentResolver>,
}

impl GcpNISyncer {
    pub fn new(
        data: Arc<dyn DataService>,
        adaptor: Arc<dyn NetworkInterfaceAdaptor<GcpNIExtension>>,
        vpcs: Arc<ParentResolver>,
        subnets: Arc<ParentResolver>,
    ) -> Self {
        Self {
            data,
            adaptor,
            vpcs,
            subnets,
        }
    }

    async fn resolve_parents(
        &self,
        kt: &Kit,
        req: &SyncRequest,
        items: &mut [Item<GcpNIExtension>],
    ) -> Result<()> {
        let vpc_links: Vec<String> = items
            .iter()
            .map(|item| item.extension.vpc_self_link.clone())
            .collect();
        let subnet_links: Vec<String> = items
            .iter()
            .map(|item| item.extension.subnet_self_link.clone())
            .collect();

        let global = SyncRequest::new(req.account_id.clone(), "");
        let vpcs = self
            .vpcs
            .query_ids_and_sync(kt, &global, ParentKey::SelfLink, &vpc_links)
            .await?;
        let regional = SyncRequest::new(req.account_id.clone(), req.region.clone());
        let subnets = self
            .subnets
            .query_ids_and_sync(kt, &regional, ParentKey::SelfLink, &subnet_links)
            .await?;

        for item in items.iter_mut() {
            if let Some(subnet) = subnets.get(&item.extension.subnet_self_link) {
                attach_subnet(&mut item.spec, subnet);
            }
            if let Some(vpc) = vpcs.get(&item.extension.vpc_self_link) {
                item.spec.vpc_id = vpc.id.clone();
                item.spec.cloud_vpc_id = vpc.cloud_id.clone();
            }
        }
        Ok(())
    }
}

fn ext_changed(cloud: &GcpNIExtension, db: &GcpNIExtension) -> bool {
    cloud.can_ip_forward != db.can_ip_forward
        || cloud.status != db.status
        || cloud.stack_type != db.stack_type
        || cloud.vpc_self_link != db.vpc_self_link
        || cloud.subnet_self_link != db.subnet_self_link
        || !diff::same_set(&cloud.access_configs, &db.access_configs)
}

#[async_trait]
impl ResourceSyncer for GcpNISyncer {
    type Ext = GcpNIExtension;

    fn data(&self) -> &dyn DataService {
        self.data.as_ref()
    }

    fn id_filter_limit(&self) -> usize {
        MAX_NI_ID_FILTER
    }

    fn validate(&self, req: &SyncRequest) -> Result<()> {
        req.validate(self.id_filter_limit())?;
        req.require_region()?;
        match req.zone.as_deref() {
            Some(zone) if !zone.is_empty() => Ok(()),
            _ => Err(CloudError::InvalidParameter("zone is required".to_string())),
        }
    }

    async fn list(&self, kt: &Kit, req: &SyncRequest) -> Result<Vec<Item<GcpNIExtension>>> {
        let opt = req.list_option();
        let mut items = collect_pages(&opt, |o| async move {
            self.adaptor.list_network_interface(kt, &o).await
        })
        .await?;
        self.resolve_parents(kt, req, &mut items).await?;
        Ok(items)
    }

    fn db_scope(&self, req: &SyncRequest) -> Expression {
        ScopeFilter::account(GcpNIExtension::VENDOR, &req.account_id)
            .eq("region", &req.region)
            .eq("zone", req.zone.as_deref().unwrap_or_default())
            .in_list("cloud_id", &req.cloud_ids)
            .in_list("instance_id", &req.cloud_cvm_ids)
            .build()
    }

    fn is_changed(&self, cloud: &Item<GcpNIExtension>, db: &Row<GcpNIExtension>) -> bool {
        spec_changed(&cloud.spec, &db.spec)
            || diff::extension_changed(&cloud.extension, db.extension.as_ref(), ext_changed)
    }

    async fn create(
        &self,
        kt: &Kit,
        req: &SyncRequest,
        items: Vec<Item<GcpNIExtension>>,
    ) -> Result<Vec<String>> {
        create_in_server_biz(self.data(), kt, &req.account_id, items).await
    }

    fn confirm_strategy(&self) -> ConfirmStrategy {
        ConfirmStrategy::NoConfirm
    }
}
