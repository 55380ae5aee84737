//! Vendor-keyed syncer registry

use crate::adaptors::Adaptors;
use crate::lease::{LeaseManager, LeasedSyncer};
use crate::network_interface::{AzureNISyncer, GcpNISyncer, HuaWeiNISyncer};
use crate::relation::ParentResolver;
use crate::subnet::{SubnetRules, SubnetSyncer};
use crate::syncer::Syncer;
use crate::vpc::{VpcRules, VpcSyncer};
use hcm_cloud::{CloudError, DataService, ResourceKind, Result, SubnetAdaptor, Vendor, VpcAdaptor};
use std::collections::HashMap;
use std::sync::Arc;

/// Every syncer of the service, looked up per `(vendor, kind)`
#[derive(Default, Clone)]
pub struct SyncerRegistry {
    syncers: HashMap<(Vendor, ResourceKind), Arc<dyn Syncer>>,
}

impl SyncerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers under the syncer's own vendor and kind, replacing any previous one
    pub fn register(&mut self, syncer: Arc<dyn Syncer>) {
        self.syncers.insert((syncer.vendor(), syncer.kind()), syncer);
    }

    pub fn get(&self, vendor: Vendor, kind: ResourceKind) -> Result<Arc<dyn Syncer>> {
        self.syncers.get(&(vendor, kind)).cloned().ok_or_else(|| {
            CloudError::VendorNotSupported(format!("{} sync is not supported for {}", kind, vendor))
        })
    }

    /// Registered keys in a stable order
    pub fn keys(&self) -> Vec<(Vendor, ResourceKind)> {
        let mut keys: Vec<_> = self.syncers.keys().copied().collect();
        keys.sort_by_key(|(vendor, kind)| (vendor.as_str(), kind.path_segment()));
        keys
    }

    /// Wire up the syncers of every vendor
    ///
    /// Every registered syncer holds its scope lease, and so do the parent
    /// syncs the resolvers trigger.
    pub fn build(
        data: Arc<dyn DataService>,
        adaptors: &Adaptors,
        leases: Arc<LeaseManager>,
    ) -> Self {
        let mut registry = Self::new();

        registry.network(&data, &leases, adaptors.aws_vpc.clone(), adaptors.aws_subnet.clone());
        registry.network(
            &data,
            &leases,
            adaptors.tcloud_vpc.clone(),
            adaptors.tcloud_subnet.clone(),
        );

        let (_, azure_subnets) = registry.network(
            &data,
            &leases,
            adaptors.azure_vpc.clone(),
            adaptors.azure_subnet.clone(),
        );
        registry.register_leased(
            &leases,
            Arc::new(AzureNISyncer::new(
                data.clone(),
                adaptors.azure_ni.clone(),
                azure_subnets,
            )),
        );

        let (gcp_vpcs, gcp_subnets) = registry.network(
            &data,
            &leases,
            adaptors.gcp_vpc.clone(),
            adaptors.gcp_subnet.clone(),
        );
        registry.register_leased(
            &leases,
            Arc::new(GcpNISyncer::new(
                data.clone(),
                adaptors.gcp_ni.clone(),
                gcp_vpcs,
                gcp_subnets,
            )),
        );

        let (_, huawei_subnets) = registry.network(
            &data,
            &leases,
            adaptors.huawei_vpc.clone(),
            adaptors.huawei_subnet.clone(),
        );
        registry.register_leased(
            &leases,
            Arc::new(HuaWeiNISyncer::new(
                data.clone(),
                adaptors.huawei_ni.clone(),
                huawei_subnets,
            )),
        );

        tracing::debug!(syncers = registry.syncers.len(), "syncer registry built");
        registry
    }

    fn register_leased(
        &mut self,
        leases: &Arc<LeaseManager>,
        syncer: Arc<dyn Syncer>,
    ) -> Arc<dyn Syncer> {
        let leased: Arc<dyn Syncer> = Arc::new(LeasedSyncer::new(syncer, leases.clone()));
        self.register(leased.clone());
        leased
    }

    /// Register the VPC and subnet syncers of one vendor, returning their resolvers
    fn network<V: VpcRules, S: SubnetRules>(
        &mut self,
        data: &Arc<dyn DataService>,
        leases: &Arc<LeaseManager>,
        vpc_adaptor: Arc<dyn VpcAdaptor<V>>,
        subnet_adaptor: Arc<dyn SubnetAdaptor<S>>,
    ) -> (Arc<ParentResolver>, Arc<ParentResolver>) {
        let vpc = self.register_leased(
            leases,
            Arc::new(VpcSyncer::new(data.clone(), vpc_adaptor)),
        );
        let vpcs = Arc::new(ParentResolver::new(data.clone(), vpc));

        let subnet = self.register_leased(
            leases,
            Arc::new(SubnetSyncer::new(data.clone(), subnet_adaptor, vpcs.clone())),
        );
        let subnets = Arc::new(ParentResolver::new(data.clone(), subnet));
        (vpcs, subnets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lease::LeaseConfig;
    use crate::testkit::FakeCloud;
    use hcm_dataservice::MemoryDataService;
    use tempfile::tempdir;

    #[test]
    fn test_build_covers_every_vendor() {
        let temp_dir = tempdir().unwrap();
        let registry = SyncerRegistry::build(
            Arc::new(MemoryDataService::new()),
            &Adaptors::uniform(Arc::new(FakeCloud::new())),
            Arc::new(LeaseManager::new(LeaseConfig::new(temp_dir.path()))),
        );

        for vendor in Vendor::ALL {
            assert!(registry.get(vendor, ResourceKind::Vpc).is_ok());
            assert!(registry.get(vendor, ResourceKind::Subnet).is_ok());
        }
        assert_eq!(registry.keys().len(), 13);
        assert!(matches!(
            registry.get(Vendor::Aws, ResourceKind::NetworkInterface),
            Err(CloudError::VendorNotSupported(_))
        ));
        assert!(registry.get(Vendor::HuaWei, ResourceKind::NetworkInterface).is_ok());
    }
}
