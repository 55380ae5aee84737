use hc_service::{AppState, LogNotifier, NoticeQueue};
use hcm_cloud::kit::RID_HEADER;
use hcm_cloud::{
    AwsSubnetExtension, AwsVpcExtension, CloudItem, RetryConfig, SubnetSpec, VpcSpec,
};
use hcm_dataservice::MemoryDataService;
use hcm_sync::syncer::Item;
use hcm_sync::testkit::FakeCloud;
use hcm_sync::{Adaptors, LeaseConfig, LeaseManager};
use reqwest::StatusCode;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::oneshot;

pub const ACCOUNT: &str = "acc-1";
pub const REGION: &str = "us-east-1";

/// hc-service on an ephemeral port, backed by a fake cloud and an in-memory store
pub struct TestServer {
    pub addr: SocketAddr,
    pub cloud: Arc<FakeCloud>,
    pub store: Arc<MemoryDataService>,
    client: reqwest::Client,
    shutdown: Option<oneshot::Sender<()>>,
    _lease_dir: TempDir,
}

impl TestServer {
    pub async fn start() -> Self {
        let cloud = Arc::new(FakeCloud::new());
        let store = Arc::new(MemoryDataService::new());

        let lease_dir = tempfile::tempdir().unwrap();
        let leases = Arc::new(LeaseManager::new(LeaseConfig {
            dir: lease_dir.path().to_path_buf(),
            ttl: Duration::from_secs(3600),
            wait: Duration::from_millis(300),
        }));
        let (notices, _worker) = NoticeQueue::start(
            Arc::new(LogNotifier),
            16,
            RetryConfig::new(1, Duration::from_millis(1)),
        );

        let state = AppState::new(
            store.clone(),
            Adaptors::uniform(cloud.clone()),
            leases,
            notices,
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel::<()>();
        tokio::spawn(hc_service::serve(listener, Arc::new(state), async move {
            rx.await.ok();
        }));

        Self {
            addr,
            cloud,
            store,
            client: reqwest::Client::new(),
            shutdown: Some(tx),
            _lease_dir: lease_dir,
        }
    }

    pub fn url(&self, vendor: &str, path: &str) -> String {
        format!("http://{}/api/v1/hc/vendors/{}{}", self.addr, vendor, path)
    }

    pub async fn send(&self, req: reqwest::RequestBuilder) -> (StatusCode, Value) {
        let resp = req.header(RID_HEADER, "test-rid").send().await.unwrap();
        let status = resp.status();
        let body = resp.json::<Value>().await.unwrap_or(Value::Null);
        (status, body)
    }

    pub async fn post(&self, vendor: &str, path: &str, body: Value) -> (StatusCode, Value) {
        self.send(self.client.post(self.url(vendor, path)).json(&body))
            .await
    }

    pub async fn patch(&self, vendor: &str, path: &str, body: Value) -> (StatusCode, Value) {
        self.send(self.client.patch(self.url(vendor, path)).json(&body))
            .await
    }

    pub async fn delete(&self, vendor: &str, path: &str) -> (StatusCode, Value) {
        self.send(self.client.delete(self.url(vendor, path))).await
    }

    pub async fn get_raw(&self, path: &str) -> (StatusCode, Value) {
        self.send(self.client.get(format!("http://{}{}", self.addr, path)))
            .await
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

pub fn aws_vpc(cloud_id: &str, name: &str) -> Item<AwsVpcExtension> {
    CloudItem::new(cloud_id, VpcSpec::new(name, REGION), AwsVpcExtension::default())
}

pub fn aws_subnet(cloud_id: &str, cloud_vpc_id: &str) -> Item<AwsSubnetExtension> {
    CloudItem::new(
        cloud_id,
        SubnetSpec {
            name: format!("sub-{}", cloud_id),
            region: REGION.to_string(),
            zone: format!("{}a", REGION),
            cloud_vpc_id: cloud_vpc_id.to_string(),
            ipv4_cidr: vec!["10.0.1.0/24".to_string()],
            ..Default::default()
        },
        AwsSubnetExtension::default(),
    )
}

/// Internal id of the row carrying `cloud_id`
pub fn id_of(rows: &[Value], cloud_id: &str) -> String {
    rows.iter()
        .find(|row| row["cloud_id"] == cloud_id)
        .and_then(|row| row["id"].as_str())
        .unwrap_or_else(|| panic!("{} not in db", cloud_id))
        .to_string()
}
