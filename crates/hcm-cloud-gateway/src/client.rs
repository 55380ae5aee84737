//! Vendor gateway API client
//!
//! Every adaptor call becomes one POST against the gateway:
//! `{endpoint}/api/v1/cloud/vendors/{vendor}/{kind}/{action}`. The vendor is
//! taken from the extension type, so the same client serves all vendors.

use crate::error::{GatewayError, Result};
use async_trait::async_trait;
use hcm_cloud::{
    AvailIpResult, CloudNetworkInterface, CloudSubnet, CloudVpc, CountIpOption, Kit, ListOption,
    ListPage, NetworkInterfaceAdaptor, NetworkInterfaceSpec, ResourceKind, ResourceLocator,
    RetryConfig, SubnetAdaptor, SubnetCreateOption, SubnetSpec, UpdateOption, Vendor,
    VendorExtension, VpcAdaptor, VpcCreateOption, VpcSpec,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Configuration for the gateway client
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub endpoint: String,
    pub timeout: Duration,
    /// Applied to list/get/count calls only; writes are never replayed
    pub retry: RetryConfig,
}

impl GatewayConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout: Duration::from_secs(30),
            retry: RetryConfig::default(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

/// Gateway-backed adaptor for every vendor and resource kind
pub struct GatewayClient {
    client: reqwest::Client,
    config: GatewayConfig,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiErrorDetail>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

#[derive(Debug, Deserialize)]
struct CreatedId {
    id: String,
}

impl GatewayClient {
    pub fn new(config: GatewayConfig) -> Result<Self> {
        if config.endpoint.trim().is_empty() {
            return Err(GatewayError::InvalidConfig(
                "gateway endpoint is empty".to_string(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, config })
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    fn url(&self, vendor: Vendor, kind: ResourceKind, action: &str) -> String {
        format!(
            "{}/api/v1/cloud/vendors/{}/{}/{}",
            self.config.endpoint.trim_end_matches('/'),
            vendor,
            kind.path_segment(),
            action
        )
    }

    async fn call<B, T>(
        &self,
        kt: &Kit,
        vendor: Vendor,
        kind: ResourceKind,
        action: &str,
        body: &B,
    ) -> Result<Option<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(vendor, kind, action);
        let mut request = self.client.post(&url).json(body);
        for (name, value) in kt.headers() {
            if !value.is_empty() {
                request = request.header(name, value);
            }
        }

        let response = request.send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(GatewayError::NotFound(format!(
                "{} {} {}",
                vendor, kind, action
            )));
        }

        let text = response.text().await?;
        let api_response: ApiResponse<T> = match serde_json::from_str(&text) {
            Ok(parsed) => parsed,
            Err(_) if !status.is_success() => {
                return Err(GatewayError::Api {
                    status: status.as_u16(),
                    message: text,
                });
            }
            Err(e) => return Err(e.into()),
        };

        if !status.is_success() || !api_response.success {
            let message = api_response
                .errors
                .first()
                .map(|e| e.message.clone())
                .unwrap_or_else(|| "Unknown error".to_string());
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(api_response.result)
    }

    /// Read-only call, retried on transient failures
    async fn read<B, T>(
        &self,
        kt: &Kit,
        vendor: Vendor,
        kind: ResourceKind,
        action: &str,
        body: &B,
    ) -> hcm_cloud::Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let outcome = self
            .config
            .retry
            .run(
                |_| self.call(kt, vendor, kind, action, body),
                GatewayError::is_transient,
            )
            .await;

        if outcome.attempts > 1 {
            tracing::debug!(
                rid = %kt.rid, %vendor, %kind, action,
                attempts = outcome.attempts, "gateway read retried"
            );
        }
        outcome
            .result
            .and_then(|result| {
                result.ok_or_else(|| {
                    GatewayError::EmptyResult(format!("{} {} {}", vendor, kind, action))
                })
            })
            .map_err(|e| {
                tracing::warn!(rid = %kt.rid, %vendor, %kind, action, error = %e, "gateway read failed");
                e.into_cloud(vendor)
            })
    }

    /// Mutating call, sent exactly once; `None` when the gateway returns no result
    async fn write<B, T>(
        &self,
        kt: &Kit,
        vendor: Vendor,
        kind: ResourceKind,
        action: &str,
        body: &B,
    ) -> hcm_cloud::Result<Option<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.call(kt, vendor, kind, action, body)
            .await
            .map_err(|e| {
                tracing::error!(rid = %kt.rid, %vendor, %kind, action, error = %e, "gateway write failed");
                e.into_cloud(vendor)
            })
    }
}

fn created_id(vendor: Vendor, created: Option<CreatedId>) -> hcm_cloud::Result<String> {
    match created {
        Some(created) if !created.id.is_empty() => Ok(created.id),
        _ => Err(hcm_cloud::CloudError::api(
            vendor,
            "gateway create returned no cloud id",
        )),
    }
}

#[async_trait]
impl<E> VpcAdaptor<E> for GatewayClient
where
    E: VendorExtension<Spec = VpcSpec>,
{
    async fn list_vpc(&self, kt: &Kit, opt: &ListOption) -> hcm_cloud::Result<ListPage<CloudVpc<E>>> {
        self.read(kt, E::VENDOR, ResourceKind::Vpc, "list", opt).await
    }

    async fn create_vpc(&self, kt: &Kit, opt: &VpcCreateOption) -> hcm_cloud::Result<String> {
        let created: Option<CreatedId> = self
            .write(kt, E::VENDOR, ResourceKind::Vpc, "create", opt)
            .await?;
        created_id(E::VENDOR, created)
    }

    async fn update_vpc(&self, kt: &Kit, opt: &UpdateOption) -> hcm_cloud::Result<()> {
        let _: Option<serde_json::Value> = self
            .write(kt, E::VENDOR, ResourceKind::Vpc, "update", opt)
            .await?;
        Ok(())
    }

    async fn delete_vpc(&self, kt: &Kit, target: &ResourceLocator) -> hcm_cloud::Result<()> {
        let _: Option<serde_json::Value> = self
            .write(kt, E::VENDOR, ResourceKind::Vpc, "delete", target)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl<E> SubnetAdaptor<E> for GatewayClient
where
    E: VendorExtension<Spec = SubnetSpec>,
{
    async fn list_subnet(
        &self,
        kt: &Kit,
        opt: &ListOption,
    ) -> hcm_cloud::Result<ListPage<CloudSubnet<E>>> {
        self.read(kt, E::VENDOR, ResourceKind::Subnet, "list", opt).await
    }

    async fn create_subnet(&self, kt: &Kit, opt: &SubnetCreateOption) -> hcm_cloud::Result<String> {
        let created: Option<CreatedId> = self
            .write(kt, E::VENDOR, ResourceKind::Subnet, "create", opt)
            .await?;
        created_id(E::VENDOR, created)
    }

    async fn update_subnet(&self, kt: &Kit, opt: &UpdateOption) -> hcm_cloud::Result<()> {
        let _: Option<serde_json::Value> = self
            .write(kt, E::VENDOR, ResourceKind::Subnet, "update", opt)
            .await?;
        Ok(())
    }

    async fn delete_subnet(&self, kt: &Kit, target: &ResourceLocator) -> hcm_cloud::Result<()> {
        let _: Option<serde_json::Value> = self
            .write(kt, E::VENDOR, ResourceKind::Subnet, "delete", target)
            .await?;
        Ok(())
    }

    async fn count_subnet_ips(
        &self,
        kt: &Kit,
        opt: &CountIpOption,
    ) -> hcm_cloud::Result<HashMap<String, AvailIpResult>> {
        self.read(kt, E::VENDOR, ResourceKind::Subnet, "ips/count", opt)
            .await
    }
}

#[async_trait]
impl<E> NetworkInterfaceAdaptor<E> for GatewayClient
where
    E: VendorExtension<Spec = NetworkInterfaceSpec>,
{
    async fn list_network_interface(
        &self,
        kt: &Kit,
        opt: &ListOption,
    ) -> hcm_cloud::Result<ListPage<CloudNetworkInterface<E>>> {
        self.read(kt, E::VENDOR, ResourceKind::NetworkInterface, "list", opt)
            .await
    }

    async fn get_network_interface(
        &self,
        kt: &Kit,
        target: &ResourceLocator,
    ) -> hcm_cloud::Result<CloudNetworkInterface<E>> {
        self.read(kt, E::VENDOR, ResourceKind::NetworkInterface, "get", target)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_layout() {
        let client = GatewayClient::new(GatewayConfig::new("http://gw.local:8080/")).unwrap();
        assert_eq!(
            client.url(Vendor::HuaWei, ResourceKind::NetworkInterface, "list"),
            "http://gw.local:8080/api/v1/cloud/vendors/huawei/network_interfaces/list"
        );
        assert_eq!(
            client.url(Vendor::TCloud, ResourceKind::Subnet, "ips/count"),
            "http://gw.local:8080/api/v1/cloud/vendors/tcloud/subnets/ips/count"
        );
    }

    #[test]
    fn test_empty_endpoint_rejected() {
        assert!(matches!(
            GatewayClient::new(GatewayConfig::new("  ")),
            Err(GatewayError::InvalidConfig(_))
        ));
    }
}
