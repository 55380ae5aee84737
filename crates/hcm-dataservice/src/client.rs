//! HTTP client of the remote data-service

use async_trait::async_trait;
use hcm_cloud::{
    BaseInfoUpdateReq, BatchCreateResult, BatchDeleteReq, CloudError, DataService, Kit, ListReq,
    ListResult, ResourceKind, Result, Vendor,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

const API_PREFIX: &str = "/api/v1/data";

/// Error codes the data-service answers with
const CODE_RECORD_NOT_FOUND: i32 = 2000010;
const CODE_RECORD_DUPLICATED: i32 = 2000011;

/// Response envelope of every data-service route
#[derive(Debug, Deserialize)]
struct BaseResp<T> {
    code: i32,
    #[serde(default)]
    message: String,
    data: Option<T>,
}

#[derive(Debug, Serialize)]
struct BatchReq<'a> {
    items: &'a [Value],
}

/// Configuration of the HTTP data-service client
#[derive(Debug, Clone)]
pub struct HttpDataServiceConfig {
    pub endpoint: String,
    pub timeout: Duration,
}

impl HttpDataServiceConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Data-service reached over HTTP
pub struct HttpDataService {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpDataService {
    pub fn new(config: HttpDataServiceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CloudError::Http(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn url(&self, kind: ResourceKind, vendor: Option<Vendor>, action: &str) -> String {
        match vendor {
            Some(vendor) => format!(
                "{}{}/vendors/{}/{}/{}",
                self.endpoint,
                API_PREFIX,
                vendor,
                kind.path_segment(),
                action
            ),
            None => format!(
                "{}{}/{}/{}",
                self.endpoint,
                API_PREFIX,
                kind.path_segment(),
                action
            ),
        }
    }

    async fn call<B, T>(
        &self,
        kt: &Kit,
        method: reqwest::Method,
        url: String,
        body: &B,
    ) -> Result<Option<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut request = self.client.request(method.clone(), &url).json(body);
        for (name, value) in kt.headers() {
            request = request.header(name, value);
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!(rid = %kt.rid, %url, error = %e, "data-service request failed");
            CloudError::Http(e.to_string())
        })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| CloudError::Http(e.to_string()))?;

        let resp: BaseResp<T> = serde_json::from_str(&text).map_err(|e| {
            CloudError::DataService(format!(
                "{} {} returned {} with undecodable body: {}",
                method, url, status, e
            ))
        })?;

        match resp.code {
            0 => Ok(resp.data),
            CODE_RECORD_NOT_FOUND => Err(CloudError::ResourceNotFound(resp.message)),
            CODE_RECORD_DUPLICATED => Err(CloudError::ResourceAlreadyExists(resp.message)),
            code => {
                tracing::error!(rid = %kt.rid, %url, code, message = %resp.message, "data-service call failed");
                Err(CloudError::DataService(format!(
                    "code {}: {}",
                    code, resp.message
                )))
            }
        }
    }
}

#[async_trait]
impl DataService for HttpDataService {
    async fn list(
        &self,
        kt: &Kit,
        kind: ResourceKind,
        vendor: Option<Vendor>,
        req: &ListReq,
    ) -> Result<ListResult<Value>> {
        req.validate()?;
        let url = self.url(kind, vendor, "list");
        let result: Option<ListResult<Value>> =
            self.call(kt, reqwest::Method::POST, url, req).await?;
        Ok(result.unwrap_or_default())
    }

    async fn batch_create(
        &self,
        kt: &Kit,
        kind: ResourceKind,
        vendor: Vendor,
        items: Vec<Value>,
    ) -> Result<BatchCreateResult> {
        let url = self.url(kind, Some(vendor), "batch/create");
        let result: Option<BatchCreateResult> = self
            .call(kt, reqwest::Method::POST, url, &BatchReq { items: &items })
            .await?;
        let result = result.unwrap_or_default();

        if result.ids.len() != items.len() {
            return Err(CloudError::DataService(format!(
                "batch create {} returned {} ids for {} items",
                kind,
                result.ids.len(),
                items.len()
            )));
        }
        Ok(result)
    }

    async fn batch_update(
        &self,
        kt: &Kit,
        kind: ResourceKind,
        vendor: Vendor,
        items: Vec<Value>,
    ) -> Result<()> {
        let url = self.url(kind, Some(vendor), "batch/update");
        let _: Option<Value> = self
            .call(kt, reqwest::Method::PATCH, url, &BatchReq { items: &items })
            .await?;
        Ok(())
    }

    async fn batch_update_base_info(
        &self,
        kt: &Kit,
        kind: ResourceKind,
        req: &BaseInfoUpdateReq,
    ) -> Result<()> {
        let url = self.url(kind, None, "base/batch/update");
        let _: Option<Value> = self.call(kt, reqwest::Method::PATCH, url, req).await?;
        Ok(())
    }

    async fn batch_delete(
        &self,
        kt: &Kit,
        kind: ResourceKind,
        req: &BatchDeleteReq,
    ) -> Result<()> {
        req.filter.validate()?;
        let url = self.url(kind, None, "batch");
        let _: Option<Value> = self.call(kt, reqwest::Method::DELETE, url, req).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_layout() {
        let client =
            HttpDataService::new(HttpDataServiceConfig::new("http://data-service:9600/")).unwrap();
        assert_eq!(
            client.url(ResourceKind::Subnet, Some(Vendor::HuaWei), "batch/create"),
            "http://data-service:9600/api/v1/data/vendors/huawei/subnets/batch/create"
        );
        assert_eq!(
            client.url(ResourceKind::NetworkInterface, None, "list"),
            "http://data-service:9600/api/v1/data/network_interfaces/list"
        );
    }

    #[test]
    fn test_envelope_decoding() {
        let resp: BaseResp<BatchCreateResult> =
            serde_json::from_str(r#"{"code":0,"message":"","data":{"ids":["00000001"]}}"#)
                .unwrap();
        assert_eq!(resp.data.unwrap().ids, vec!["00000001"]);

        let resp: BaseResp<Value> =
            serde_json::from_str(r#"{"code":2000010,"message":"vpc not found"}"#).unwrap();
        assert!(resp.data.is_none());
        assert_eq!(resp.code, CODE_RECORD_NOT_FOUND);
    }
}
