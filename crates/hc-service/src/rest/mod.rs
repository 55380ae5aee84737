//! HTTP API
//!
//! Every response is wrapped as `{"code": 0, "message": "", "data": ...}`;
//! failures carry a non-zero code, the message and the request id.

mod subnet;
mod sync;
mod vpc;

use crate::state::AppState;
use axum::Json;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, patch, post};
use axum::Router;
use hcm_cloud::kit::{APP_CODE_HEADER, RID_HEADER, USER_HEADER};
use hcm_cloud::{
    AtomRule, CloudError, Expression, Kit, ListReq, Page, ResourceKind, ResourceLocator, Vendor,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Success envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub code: i32,
    pub message: String,
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            code: 0,
            message: String::new(),
            data,
        }
    }
}

/// Error envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub code: i32,
    pub message: String,
    pub rid: String,
    #[serde(skip)]
    status: u16,
}

impl ApiError {
    pub fn new(err: &CloudError, kt: &Kit) -> Self {
        Self {
            code: err.code(),
            message: err.to_string(),
            rid: kt.rid.clone(),
            status: err.status_code(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<Json<Envelope<T>>, ApiError>;

/// Wrap a handler outcome, logging failures with the request id
fn respond<T>(kt: &Kit, result: hcm_cloud::Result<T>) -> ApiResult<T> {
    match result {
        Ok(data) => Ok(Json(Envelope::ok(data))),
        Err(err) => {
            if err.status_code() >= 500 {
                tracing::error!(rid = %kt.rid, code = err.code(), error = %err, "request failed");
            } else {
                tracing::warn!(rid = %kt.rid, code = err.code(), error = %err, "request rejected");
            }
            Err(ApiError::new(&err, kt))
        }
    }
}

/// Request kit from the gateway headers; a missing rid gets a fresh one
fn kit_from(headers: &HeaderMap) -> Kit {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    let mut kt = Kit::new();
    if let Some(rid) = header(RID_HEADER) {
        kt = kt.with_rid(rid);
    }
    if let Some(user) = header(USER_HEADER) {
        kt = kt.with_user(user);
    }
    if let Some(app_code) = header(APP_CODE_HEADER) {
        kt = kt.with_app_code(app_code);
    }
    kt
}

/// Row of `kind` in the vendor table, by internal id
async fn load_row(
    state: &AppState,
    kt: &Kit,
    vendor: Vendor,
    kind: ResourceKind,
    id: &str,
) -> hcm_cloud::Result<Value> {
    let req = ListReq::new(Expression::and([AtomRule::eq("id", id)]), Page::new(0, 1));
    state
        .data
        .list(kt, kind, Some(vendor), &req)
        .await?
        .details
        .into_iter()
        .next()
        .ok_or_else(|| CloudError::ResourceNotFound(format!("{} {} {}", vendor, kind, id)))
}

fn str_field(row: &Value, path: &[&str]) -> String {
    path.iter()
        .try_fold(row, |v, seg| v.get(*seg))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Cloud address of a DB row
fn locator_of(row: &Value) -> ResourceLocator {
    let optional = |path: &[&str]| Some(str_field(row, path)).filter(|v| !v.is_empty());
    ResourceLocator {
        account_id: str_field(row, &["account_id"]),
        region: str_field(row, &["region"]),
        zone: optional(&["zone"]),
        resource_group_name: optional(&["extension", "resource_group_name"]),
        cloud_id: str_field(row, &["cloud_id"]),
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedResp {
    pub id: String,
}

/// Memo update body shared by VPC and subnet
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct MemoUpdateReq {
    #[serde(default)]
    pub memo: Option<String>,
}

async fn healthz() -> Json<Envelope<Value>> {
    Json(Envelope::ok(serde_json::json!({"status": "ok"})))
}

pub fn create_router(state: Arc<AppState>) -> Router {
    let vendor_routes = Router::new()
        // Sync
        .route("/vpcs/sync", post(sync::sync_vpc))
        .route("/subnets/sync", post(sync::sync_subnet))
        .route("/network_interfaces/sync", post(sync::sync_network_interface))
        // VPC
        .route("/vpcs/create", post(vpc::create_vpc))
        .route("/vpcs/{id}", patch(vpc::update_vpc).delete(vpc::delete_vpc))
        // Subnet
        .route("/subnets/create", post(subnet::create_subnet))
        .route("/subnets/ips/count/list", post(subnet::list_count_ip))
        .route("/subnets/{id}/ips/count", post(subnet::count_ip))
        .route(
            "/subnets/{id}",
            patch(subnet::update_subnet).delete(subnet::delete_subnet),
        );

    Router::new()
        .route("/healthz", get(healthz))
        .nest("/api/v1/hc/vendors/{vendor}", vendor_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kit_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(RID_HEADER, "rid-123".parse().unwrap());
        headers.insert(USER_HEADER, "alice".parse().unwrap());

        let kt = kit_from(&headers);
        assert_eq!(kt.rid, "rid-123");
        assert_eq!(kt.user, "alice");

        let generated = kit_from(&HeaderMap::new());
        assert!(!generated.rid.is_empty());
    }

    #[test]
    fn test_locator_of_row() {
        let row = json!({
            "id": "00000001",
            "account_id": "acc-1",
            "region": "eastus",
            "cloud_id": "/subscriptions/s/vnet-1",
            "extension": {"resource_group_name": "rg-prod"}
        });
        let locator = locator_of(&row);
        assert_eq!(locator.cloud_id, "/subscriptions/s/vnet-1");
        assert_eq!(locator.resource_group_name.as_deref(), Some("rg-prod"));
        assert!(locator.zone.is_none());
    }

    #[test]
    fn test_error_envelope() {
        let kt = Kit::new().with_rid("rid-9");
        let err = ApiError::new(&CloudError::TooManyRequest("cloud_ids".into()), &kt);
        let body = serde_json::to_value(&err).unwrap();
        assert_eq!(body["code"], 2000015);
        assert_eq!(body["rid"], "rid-9");
        assert!(body.get("status").is_none());
    }
}
