use super::vpc::{delete_row, settle_created, vpc_scope};
use super::{
    ApiResult, CreatedResp, MemoUpdateReq, kit_from, load_row, locator_of, respond, str_field,
};
use crate::state::AppState;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use hcm_cloud::{
    AtomRule, AvailIpResult, BaseInfo, BaseInfoUpdateReq, CloudError, CountIpOption,
    DEFAULT_MAX_IN_LIMIT, DEFAULT_MAX_PAGE_LIMIT, Expression, Kit, ListReq, Page, ResourceKind,
    Result, SubnetCreateOption, UpdateOption, Vendor, Vpc,
};
use hcm_sync::{ParentKey, SyncRequest};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubnetCreateReq {
    pub account_id: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub zone: Option<String>,
    #[serde(default)]
    pub resource_group_name: Option<String>,
    pub cloud_vpc_id: String,
    pub name: String,
    #[serde(default)]
    pub ipv4_cidr: Option<String>,
    #[serde(default)]
    pub ipv6_cidr: Option<String>,
    #[serde(default)]
    pub memo: Option<String>,
    #[serde(default)]
    pub bk_biz_id: Option<i64>,
    #[serde(default)]
    pub extension: serde_json::Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListCountIpReq {
    pub account_id: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub resource_group_name: Option<String>,
    pub ids: Vec<String>,
}

fn subnet_scope(req: &SubnetCreateReq) -> SyncRequest {
    let scope = SyncRequest::new(&req.account_id, &req.region);
    match &req.resource_group_name {
        Some(rg) => scope.with_resource_group(rg),
        None => scope,
    }
}

async fn create(
    state: &AppState,
    kt: &Kit,
    vendor: &str,
    req: SubnetCreateReq,
) -> Result<CreatedResp> {
    let vendor: Vendor = vendor.parse()?;
    if req.account_id.is_empty() || req.name.is_empty() || req.cloud_vpc_id.is_empty() {
        return Err(CloudError::InvalidParameter(
            "account_id, name and cloud_vpc_id are required".to_string(),
        ));
    }

    // the parent must be in the db before the subnet row can point at it
    let vpc_scope = vpc_scope(
        vendor,
        &req.account_id,
        &req.region,
        req.resource_group_name.as_deref(),
    );
    let vpcs = state
        .vpc_resolver(vendor)?
        .query_ids_and_sync(
            kt,
            &vpc_scope,
            ParentKey::CloudId,
            std::slice::from_ref(&req.cloud_vpc_id),
        )
        .await?;
    let vpc = vpcs.get(&req.cloud_vpc_id).ok_or_else(|| {
        CloudError::ResourceNotFound(format!("vpc {} not found", req.cloud_vpc_id))
    })?;
    if let Some(bk_biz_id) = req.bk_biz_id {
        // a business subnet needs its vpc in the same business
        let row = load_row(state, kt, vendor, ResourceKind::Vpc, &vpc.id).await?;
        let parent: Vpc<serde_json::Value> = serde_json::from_value(row)?;
        parent.ensure_biz(bk_biz_id)?;
    }

    let opt = SubnetCreateOption {
        account_id: req.account_id.clone(),
        region: req.region.clone(),
        zone: req.zone.clone(),
        resource_group_name: req.resource_group_name.clone(),
        cloud_vpc_id: req.cloud_vpc_id.clone(),
        name: req.name.clone(),
        ipv4_cidr: req.ipv4_cidr.clone(),
        ipv6_cidr: req.ipv6_cidr.clone(),
        memo: req.memo.clone(),
        extension: req.extension.clone(),
    };
    let cloud_id = state.adaptors.create_subnet(kt, vendor, &opt).await?;
    tracing::info!(
        rid = %kt.rid, %vendor, account_id = %req.account_id,
        vpc_id = %vpc.id, %cloud_id, "subnet created in cloud"
    );

    let row = state
        .engine
        .sync_created(kt, vendor, ResourceKind::Subnet, &subnet_scope(&req), &cloud_id)
        .await?;

    settle_created(
        state,
        kt,
        vendor,
        ResourceKind::Subnet,
        &row.id,
        &cloud_id,
        req.bk_biz_id,
    )
    .await?;
    Ok(CreatedResp { id: row.id })
}

pub async fn create_subnet(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(vendor): Path<String>,
    Json(req): Json<SubnetCreateReq>,
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
    let row = load_row(state, kt, vendor, ResourceKind::Subnet, id).await?;

    let opt = UpdateOption {
        target: locator_of(&row),
        memo: req.memo.clone(),
    };
    state.adaptors.update_subnet(kt, vendor, &opt).await?;

    let base = BaseInfoUpdateReq {
        ids: vec![id.to_string()],
        data: BaseInfo {
            memo: req.memo,
            ..Default::default()
        },
    };
    state
        .data
        .batch_update_base_info(kt, ResourceKind::Subnet, &base)
        .await
}

pub async fn update_subnet(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((vendor, id)): Path<(String, String)>,
    Json(req): Json<MemoUpdateReq>,
) -> ApiResult<()> {
    let kt = kit_from(&headers);
    respond(&kt, update(&state, &kt, &vendor, &id, req).await)
}

async fn delete(state: &AppState, kt: &Kit, vendor: &str, id: &str) -> Result<()> {
    let vendor: Vendor = vendor.parse()?;
    let row = load_row(state, kt, vendor, ResourceKind::Subnet, id).await?;
    let cloud_result = state
        .adaptors
        .delete_subnet(kt, vendor, &locator_of(&row))
        .await;
    delete_row(state, kt, ResourceKind::Subnet, id, cloud_result).await
}

pub async fn delete_subnet(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((vendor, id)): Path<(String, String)>,
) -> ApiResult<()> {
    let kt = kit_from(&headers);
    respond(&kt, delete(&state, &kt, &vendor, &id).await)
}

/// IP usage keyed by subnet id
async fn list_count(
    state: &AppState,
    kt: &Kit,
    vendor: &str,
    req: ListCountIpReq,
) -> Result<HashMap<String, AvailIpResult>> {
    let vendor: Vendor = vendor.parse()?;
    if req.account_id.is_empty() || req.ids.is_empty() {
        return Err(CloudError::InvalidParameter(
            "account_id and ids are required".to_string(),
        ));
    }
    if req.ids.len() > DEFAULT_MAX_IN_LIMIT {
        return Err(CloudError::TooManyRequest(format!(
            "ids should <= {}, got {}",
            DEFAULT_MAX_IN_LIMIT,
            req.ids.len()
        )));
    }

    let filter = Expression::and([
        AtomRule::eq("account_id", req.account_id.as_str()),
        AtomRule::in_list("id", &req.ids),
    ]);
    let rows = state
        .data
        .list(
            kt,
            ResourceKind::Subnet,
            Some(vendor),
            &ListReq::new(filter, Page::new(0, DEFAULT_MAX_PAGE_LIMIT)),
        )
        .await?
        .details;

    let id_by_cloud: HashMap<String, String> = rows
        .iter()
        .map(|row| (str_field(row, &["cloud_id"]), str_field(row, &["id"])))
        .collect();
    if id_by_cloud.is_empty() {
        return Err(CloudError::ResourceNotFound(format!(
            "subnets {:?} not found",
            req.ids
        )));
    }

    let opt = CountIpOption {
        account_id: req.account_id,
        region: req.region,
        resource_group_name: req.resource_group_name,
        cloud_ids: id_by_cloud.keys().cloned().collect(),
    };
    let counts = state.adaptors.count_subnet_ips(kt, vendor, &opt).await?;

    Ok(counts
        .into_iter()
        .filter_map(|(cloud_id, count)| id_by_cloud.get(&cloud_id).map(|id| (id.clone(), count)))
        .collect())
}

pub async fn list_count_ip(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(vendor): Path<String>,
    Json(req): Json<ListCountIpReq>,
) -> ApiResult<HashMap<String, AvailIpResult>> {
    let kt = kit_from(&headers);
    respond(&kt, list_count(&state, &kt, &vendor, req).await)
}

/// Single-subnet count; only HuaWei exposes it
async fn count_one(state: &AppState, kt: &Kit, vendor: &str, id: &str) -> Result<AvailIpResult> {
    let vendor: Vendor = vendor.parse()?;
    if vendor != Vendor::HuaWei {
        return Err(CloudError::VendorNotSupported(format!(
            "single subnet ip count is not supported for {}",
            vendor
        )));
    }
    let row = load_row(state, kt, vendor, ResourceKind::Subnet, id).await?;
    let target = locator_of(&row);

    let opt = CountIpOption {
        account_id: target.account_id,
        region: target.region,
        resource_group_name: None,
        cloud_ids: vec![target.cloud_id.clone()],
    };
    let mut counts = state.adaptors.count_subnet_ips(kt, vendor, &opt).await?;
    counts.remove(&target.cloud_id).ok_or_else(|| {
        CloudError::ResourceNotFound(format!("ip count of subnet {} not found", id))
    })
}

pub async fn count_ip(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((vendor, id)): Path<(String, String)>,
) -> ApiResult<AvailIpResult> {
    let kt = kit_from(&headers);
    respond(&kt, count_one(&state, &kt, &vendor, &id).await)
}
