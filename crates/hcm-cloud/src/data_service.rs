//! Data-service abstraction
//!
//! [`DataService`] is the persistence boundary of the sync engine. It works on
//! JSON rows so the trait stays object safe; typed access over a vendor
//! extension is layered on top by [`DataServiceExt`].

use crate::error::{CloudError, Result};
use crate::extension::VendorExtension;
use crate::filter::{Expression, Page};
use crate::kit::Kit;
use crate::resource::{CloudResource, CreateReq, ResourceRef, ResourceSpec, UpdateReq};
use crate::vendor::{ResourceKind, Vendor};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// List request: filter, page and an optional field projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListReq {
    pub filter: Expression,
    pub page: Page,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
}

impl ListReq {
    pub fn new(filter: Expression, page: Page) -> Self {
        Self {
            filter,
            page,
            fields: Vec::new(),
        }
    }

    pub fn with_fields<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.filter.validate()?;
        self.page.validate()
    }
}

/// List response; `count` is only meaningful for count pages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListResult<T> {
    #[serde(default)]
    pub count: u64,
    #[serde(default = "Vec::new")]
    pub details: Vec<T>,
}

impl<T> Default for ListResult<T> {
    fn default() -> Self {
        Self {
            count: 0,
            details: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchCreateResult {
    pub ids: Vec<String>,
}

/// Fields a base-info update may touch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bk_biz_id: Option<i64>,
}

/// Apply the same base info to a set of rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseInfoUpdateReq {
    pub ids: Vec<String>,
    pub data: BaseInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchDeleteReq {
    pub filter: Expression,
}

/// Persistence operations used by the sync engine and the HTTP handlers
#[async_trait]
pub trait DataService: Send + Sync {
    /// List rows of one kind, optionally narrowed to a vendor table
    async fn list(
        &self,
        kt: &Kit,
        kind: ResourceKind,
        vendor: Option<Vendor>,
        req: &ListReq,
    ) -> Result<ListResult<Value>>;

    /// Insert rows and return their assigned ids in input order
    async fn batch_create(
        &self,
        kt: &Kit,
        kind: ResourceKind,
        vendor: Vendor,
        items: Vec<Value>,
    ) -> Result<BatchCreateResult>;

    /// Replace the tracked fields of rows addressed by `id`
    async fn batch_update(
        &self,
        kt: &Kit,
        kind: ResourceKind,
        vendor: Vendor,
        items: Vec<Value>,
    ) -> Result<()>;

    async fn batch_update_base_info(
        &self,
        kt: &Kit,
        kind: ResourceKind,
        req: &BaseInfoUpdateReq,
    ) -> Result<()>;

    /// Delete every row matching the filter
    async fn batch_delete(&self, kt: &Kit, kind: ResourceKind, req: &BatchDeleteReq)
    -> Result<()>;
}

fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(CloudError::from))
        .collect()
}

fn encode_rows<T: Serialize>(items: &[T]) -> Result<Vec<Value>> {
    items
        .iter()
        .map(|item| serde_json::to_value(item).map_err(CloudError::from))
        .collect()
}

/// Typed helpers over any [`DataService`]
#[async_trait]
pub trait DataServiceExt: DataService {
    /// List rows of the vendor table bound to `E`
    async fn list_ext<E: VendorExtension>(
        &self,
        kt: &Kit,
        req: &ListReq,
    ) -> Result<Vec<CloudResource<E::Spec, E>>> {
        let result = self
            .list(kt, <E::Spec as ResourceSpec>::KIND, Some(E::VENDOR), req)
            .await?;
        decode_rows(result.details)
    }

    /// List identity projections of any vendor
    async fn list_refs(
        &self,
        kt: &Kit,
        kind: ResourceKind,
        req: &ListReq,
    ) -> Result<Vec<ResourceRef>> {
        let result = self.list(kt, kind, None, req).await?;
        decode_rows(result.details)
    }

    /// Number of rows matching the filter
    async fn count(
        &self,
        kt: &Kit,
        kind: ResourceKind,
        vendor: Option<Vendor>,
        filter: Expression,
    ) -> Result<u64> {
        let req = ListReq::new(filter, Page::count());
        Ok(self.list(kt, kind, vendor, &req).await?.count)
    }

    async fn batch_create_ext<E: VendorExtension>(
        &self,
        kt: &Kit,
        items: Vec<CreateReq<E::Spec, E>>,
    ) -> Result<Vec<String>> {
        let rows = encode_rows(&items)?;
        let result = self
            .batch_create(kt, <E::Spec as ResourceSpec>::KIND, E::VENDOR, rows)
            .await?;
        Ok(result.ids)
    }

    async fn batch_update_ext<E: VendorExtension>(
        &self,
        kt: &Kit,
        items: Vec<UpdateReq<E::Spec, E>>,
    ) -> Result<()> {
        let rows = encode_rows(&items)?;
        self.batch_update(kt, <E::Spec as ResourceSpec>::KIND, E::VENDOR, rows)
            .await
    }
}

impl<T: DataService + ?Sized> DataServiceExt for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::AtomRule;
    use serde_json::json;

    #[test]
    fn test_list_req_validation() {
        let req = ListReq::new(
            Expression::and([AtomRule::eq("account_id", "acc-1")]),
            Page::default(),
        );
        assert!(req.validate().is_ok());

        let bad = ListReq::new(Expression::and(Vec::<AtomRule>::new()), Page::default());
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_list_req_wire_format() {
        let req = ListReq::new(
            Expression::and([AtomRule::eq("vendor", "gcp")]),
            Page::new(500, 500),
        )
        .with_fields(["id", "cloud_id"]);

        let body = serde_json::to_value(&req).unwrap();
        assert_eq!(body["page"], json!({"count": false, "start": 500, "limit": 500}));
        assert_eq!(body["fields"], json!(["id", "cloud_id"]));
    }

    #[test]
    fn test_base_info_omits_unset_fields() {
        let req = BaseInfoUpdateReq {
            ids: vec!["00000001".to_string()],
            data: BaseInfo {
                bk_biz_id: Some(310),
                ..Default::default()
            },
        };
        let body = serde_json::to_value(&req).unwrap();
        assert_eq!(body, json!({"ids": ["00000001"], "data": {"bk_biz_id": 310}}));
    }
}
