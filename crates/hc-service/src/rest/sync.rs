use super::{ApiResult, kit_from, respond};
use crate::state::AppState;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use hcm_cloud::{Kit, ResourceKind, Result, Vendor};
use hcm_sync::SyncRequest;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Serialize, Deserialize)]
pub struct SyncResp {
    pub task_id: String,
}

async fn run(
    state: &AppState,
    kt: &Kit,
    vendor: &str,
    kind: ResourceKind,
    req: &SyncRequest,
) -> Result<SyncResp> {
    let vendor: Vendor = vendor.parse()?;
    let result = state.sync(kt, vendor, kind, req).await?;
    tracing::info!(
        rid = %kt.rid, %vendor, %kind, account_id = %req.account_id,
        summary = %result.summary, "sync request done"
    );
    Ok(SyncResp {
        task_id: result.task_id.to_string(),
    })
}

pub async fn sync_vpc(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(vendor): Path<String>,
    Json(req): Json<SyncRequest>,
) -> ApiResult<SyncResp> {
    let kt = kit_from(&headers);
    respond(&kt, run(&state, &kt, &vendor, ResourceKind::Vpc, &req).await)
}

pub async fn sync_subnet(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(vendor): Path<String>,
    Json(req): Json<SyncRequest>,
) -> ApiResult<SyncResp> {
    let kt = kit_from(&headers);
    respond(&kt, run(&state, &kt, &vendor, ResourceKind::Subnet, &req).await)
}

pub async fn sync_network_interface(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(vendor): Path<String>,
    Json(req): Json<SyncRequest>,
) -> ApiResult<SyncResp> {
    let kt = kit_from(&headers);
    respond(
        &kt,
        run(&state, &kt, &vendor, ResourceKind::NetworkInterface, &req).await,
    )
}
