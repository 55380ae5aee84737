//! Shared application state, wired once at startup

use crate::notice::{LogNotifier, NoticeQueue, Notifier, WebhookNotifier};
use anyhow::Context;
use hcm_cloud::{
    CloudError, DataService, Kit, ResourceKind, Result, RetryConfig, SyncResult, Vendor,
};
use hcm_cloud_gateway::{GatewayClient, GatewayConfig};
use hcm_config::ServiceConfig;
use hcm_dataservice::{HttpDataService, HttpDataServiceConfig, MemoryDataService};
use hcm_sync::{
    Adaptors, LeaseConfig, LeaseManager, ParentResolver, SyncEngine, SyncRequest, SyncerRegistry,
};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Everything a handler needs
#[derive(Clone)]
pub struct AppState {
    pub engine: SyncEngine,
    pub data: Arc<dyn DataService>,
    pub adaptors: Arc<Adaptors>,
    pub leases: Arc<LeaseManager>,
    pub notices: NoticeQueue,
}

impl AppState {
    pub fn new(
        data: Arc<dyn DataService>,
        adaptors: Adaptors,
        leases: Arc<LeaseManager>,
        notices: NoticeQueue,
    ) -> Self {
        let registry = SyncerRegistry::build(data.clone(), &adaptors, leases.clone());
        Self {
            engine: SyncEngine::new(Arc::new(registry), data.clone()),
            data,
            adaptors: Arc::new(adaptors),
            leases,
            notices,
        }
    }

    /// VPC id lookup that syncs missing parents through the registered VPC syncer
    pub fn vpc_resolver(&self, vendor: Vendor) -> Result<ParentResolver> {
        let syncer = self.engine.registry().get(vendor, ResourceKind::Vpc)?;
        Ok(ParentResolver::new(self.data.clone(), syncer))
    }

    pub async fn sync(
        &self,
        kt: &Kit,
        vendor: Vendor,
        kind: ResourceKind,
        req: &SyncRequest,
    ) -> Result<SyncResult> {
        if kind == ResourceKind::Cvm {
            return Err(CloudError::VendorNotSupported(
                "cvm rows are read-only references".to_string(),
            ));
        }
        self.engine.sync(kt, vendor, kind, req).await
    }
}

/// Build the state from configuration
///
/// Returns the notice worker handle too; it ends once the state is dropped.
pub async fn build_state(config: &ServiceConfig) -> anyhow::Result<(AppState, JoinHandle<()>)> {
    let data: Arc<dyn DataService> = if config.data_service.endpoint.is_empty() {
        tracing::warn!("data_service.endpoint is empty, rows are kept in memory");
        Arc::new(MemoryDataService::new())
    } else {
        let mut ds_config = HttpDataServiceConfig::new(&config.data_service.endpoint);
        ds_config.timeout = config.adaptor.timeout();
        Arc::new(HttpDataService::new(ds_config).context("data-service client")?)
    };

    anyhow::ensure!(
        !config.adaptor.gateway_endpoint.is_empty(),
        "adaptor.gateway_endpoint is required"
    );
    let gateway = GatewayClient::new(
        GatewayConfig::new(&config.adaptor.gateway_endpoint).with_timeout(config.adaptor.timeout()),
    )
    .context("gateway client")?;
    let adaptors = with_native_adaptors(Adaptors::uniform(Arc::new(gateway))).await;

    std::fs::create_dir_all(&config.lease.dir)
        .with_context(|| format!("lease dir {}", config.lease.dir.display()))?;
    let leases = Arc::new(LeaseManager::new(LeaseConfig {
        dir: config.lease.dir.clone(),
        ttl: config.lease.ttl(),
        wait: config.lease.wait(),
    }));

    let notifier: Arc<dyn Notifier> = if config.notice.webhook.is_empty() {
        Arc::new(LogNotifier)
    } else {
        Arc::new(
            WebhookNotifier::new(&config.notice.webhook, config.adaptor.timeout())
                .context("notice webhook client")?,
        )
    };
    let (notices, worker) = NoticeQueue::start(
        notifier,
        config.notice.queue_size,
        RetryConfig::new(config.notice.max_attempts, config.notice.initial_delay()),
    );

    Ok((AppState::new(data, adaptors, leases, notices), worker))
}

#[cfg(feature = "aws-sdk")]
async fn with_native_adaptors(adaptors: Adaptors) -> Adaptors {
    let aws = Arc::new(hcm_cloud_aws::AwsAdaptor::from_env().await);
    tracing::info!("aws vpc/subnet use the native ec2 adaptor");
    adaptors.with_aws_vpc(aws.clone()).with_aws_subnet(aws)
}

#[cfg(not(feature = "aws-sdk"))]
async fn with_native_adaptors(adaptors: Adaptors) -> Adaptors {
    adaptors
}
