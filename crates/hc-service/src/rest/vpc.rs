use super::{ApiResult, CreatedResp, MemoUpdateReq, kit_from, load_row, locator_of, respond};
use crate::notice::Notice;
use crate::state::AppState;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use hcm_cloud::{
    AtomRule, BaseInfo, BaseInfoUpdateReq, BatchDeleteReq, CloudError, Expression, Kit,
    ResourceKind, Result, UpdateOption, Vendor, VpcCategory, VpcCreateOption,
};
use hcm_sync::SyncRequest;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VpcCreateReq {
    pub account_id: String,
    #[serde(default)]
    pub region: String,
    pub name: String,
    #[serde(default)]
    pub category: VpcCategory,
    #[serde(default)]
    pub memo: Option<String>,
    #[serde(default)]
    pub ipv4_cidr: Option<String>,
    #[serde(default)]
    pub resource_group_name: Option<String>,
    /// Business to assign the new row to
    #[serde(default)]
    pub bk_biz_id: Option<i64>,
    #[serde(default)]
    pub extension: serde_json::Value,
}

/// Scope a VPC of this vendor is synced in; GCP networks are global
pub(super) fn vpc_scope(
    vendor: Vendor,
    account_id: &str,
    region: &str,
    resource_group_name: Option<&str>,
) -> SyncRequest {
    if vendor == Vendor::Gcp {
        return SyncRequest::new(account_id, "");
    }
    let scope = SyncRequest::new(account_id, region);
    match resource_group_name {
        Some(rg) => scope.with_resource_group(rg),
        None => scope,
    }
}

/// Put a freshly synced row into its business and announce it
pub(super) async fn settle_created(
    state: &AppState,
    kt: &Kit,
    vendor: Vendor,
    kind: ResourceKind,
    id: &str,
    cloud_id: &str,
    bk_biz_id: Option<i64>,
) -> Result<()> {
    if let Some(bk_biz_id) = bk_biz_id {
        let req = BaseInfoUpdateReq {
            ids: vec![id.to_string()],
            data: BaseInfo {
                bk_biz_id: Some(bk_biz_id),
                ..Default::default()
            },
        };
        state.data.batch_update_base_info(kt, kind, &req).await?;
    }

    if let Err(e) = state
        .notices
        .submit(Notice::created(vendor, kind, id, cloud_id, &kt.rid))
    {
        tracing::warn!(rid = %kt.rid, %vendor, %kind, id, error = %e, "created notice not queued");
    }
    Ok(())
}

async fn create(state: &AppState, kt: &Kit, vendor: &str, req: VpcCreateReq) -> Result<CreatedResp> {
    let vendor: Vendor = vendor.parse()?;
    if req.account_id.is_empty() || req.name.is_empty() {
        return Err(CloudError::InvalidParameter(
            "account_id and name are required".to_string(),
        ));
    }

    let opt = VpcCreateOption {
        account_id: req.account_id.clone(),
        region: req.region.clone(),
        name: req.name.clone(),
        category: req.category,
        memo: req.memo.clone(),
        ipv4_cidr: req.ipv4_cidr.clone(),
        resource_group_name: req.resource_group_name.clone(),
        extension: req.extension.clone(),
    };
    let cloud_id = state.adaptors.create_vpc(kt, vendor, &opt).await?;
    tracing::info!(rid = %kt.rid, %vendor, account_id = %req.account_id, %cloud_id, "vpc created in cloud");

    let scope = vpc_scope(
        vendor,
        &req.account_id,
        &req.region,
        req.resource_group_name.as_deref(),
    );
    let row = state
        .engine
        .sync_created(kt, vendor, ResourceKind::Vpc, &scope, &cloud_id)
        .await?;

    settle_created(state, kt, vendor, ResourceKind::Vpc, &row.id, &cloud_id, req.bk_biz_id).await?;
    Ok(CreatedResp { id: row.id })
}

pub async fn create_vpc(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(vendor): Path<String>,
    Json(req): Json<VpcCreateReq>,
) -> ApiResult<CreatedResp> {
    let kt = kit_from(&headers);
    respond(&kt, create(&state, &kt, &vendor, req).await)
}

async fn update(
    state: &AppState,
    kt: &Kit,
    vendor: &str,
    id: &str,
    req: MemoUpdateReq,
) -> Result<()> {
    let vendor: Vendor = vendor.parse()?;
    let row = load_row(state, kt, vendor, ResourceKind::Vpc, id).await?;

    let opt = UpdateOption {
        target: locator_of(&row),
        memo: req.memo.clone(),
    };
    state.adaptors.update_vpc(kt, vendor, &opt).await?;

    let base = BaseInfoUpdateReq {
        ids: vec![id.to_string()],
        data: BaseInfo {
            memo: req.memo,
            ..Default::default()
        },
    };
    state
        .data
        .batch_update_base_info(kt, ResourceKind::Vpc, &base)
        .await
}

pub async fn update_vpc(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((vendor, id)): Path<(String, String)>,
    Json(req): Json<MemoUpdateReq>,
) -> ApiResult<()> {
    let kt = kit_from(&headers);
    respond(&kt, update(&state, &kt, &vendor, &id, req).await)
}

/// Delete in the cloud, then the row; a resource already gone from the cloud
/// still has its row removed
pub(super) async fn delete_row(
    state: &AppState,
    kt: &Kit,
    kind: ResourceKind,
    id: &str,
    cloud_result: Result<()>,
) -> Result<()> {
    match cloud_result {
        Ok(()) => {}
        Err(e) if e.is_not_found() => {
            tracing::warn!(rid = %kt.rid, %kind, id, "already gone from cloud, removing row");
        }
        Err(e) => return Err(e),
    }
    let req = BatchDeleteReq {
        filter: Expression::and([AtomRule::eq("id", id)]),
    };
    state.data.batch_delete(kt, kind, &req).await
}

async fn delete(state: &AppState, kt: &Kit, vendor: &str, id: &str) -> Result<()> {
    let vendor: Vendor = vendor.parse()?;
    let row = load_row(state, kt, vendor, ResourceKind::Vpc, id).await?;
    let cloud_result = state.adaptors.delete_vpc(kt, vendor, &locator_of(&row)).await;
    delete_row(state, kt, ResourceKind::Vpc, id, cloud_result).await
}

pub async fn delete_vpc(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((vendor, id)): Path<(String, String)>,
) -> ApiResult<()> {
    let kt = kit_from(&headers);
    respond(&kt, delete(&state, &kt, &vendor, &id).await)
}
