mod common;

use common::*;
use hcm_cloud::{
    AvailIpResult, BaseInfo, BaseInfoUpdateReq, DataService, Kit, ResourceKind, Vendor,
};
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn test_healthz() {
    let server = TestServer::start().await;
    let (status, body) = server.get_raw("/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], 0);
    assert_eq!(body["data"]["status"], "ok");
}

#[tokio::test]
async fn test_sync_vpc_returns_task_id() {
    let server = TestServer::start().await;
    server.cloud.put(ACCOUNT, aws_vpc("vpc-1", "web")).await;
    server.cloud.put(ACCOUNT, aws_vpc("vpc-2", "db")).await;

    let (status, body) = server
        .post("aws", "/vpcs/sync", json!({"account_id": ACCOUNT, "region": REGION}))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["code"], 0);
    assert!(!body["data"]["task_id"].as_str().unwrap().is_empty());

    let synced = server.store.cloud_ids(ResourceKind::Vpc, Vendor::Aws, ACCOUNT).await;
    assert_eq!(synced.len(), 2);
}

#[tokio::test]
async fn test_unknown_vendor_is_rejected_with_rid() {
    let server = TestServer::start().await;
    let (status, body) = server
        .post("oracle", "/vpcs/sync", json!({"account_id": ACCOUNT, "region": REGION}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_ne!(body["code"], 0);
    assert_eq!(body["rid"], "test-rid");
}

#[tokio::test]
async fn test_ni_sync_rejects_too_many_ids() {
    let server = TestServer::start().await;
    let cloud_ids: Vec<String> = (0..101).map(|i| format!("port-{}", i)).collect();

    let (status, body) = server
        .post(
            "huawei",
            "/network_interfaces/sync",
            json!({
                "account_id": ACCOUNT,
                "region": "cn-north-4",
                "cloud_ids": cloud_ids,
                "cloud_cvm_ids": ["ecs-1"],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 2000015);
    assert_eq!(server.cloud.list_calls(), 0);
}

#[tokio::test]
async fn test_create_vpc_syncs_row_into_business() {
    let server = TestServer::start().await;

    let (status, body) = server
        .post(
            "aws",
            "/vpcs/create",
            json!({
                "account_id": ACCOUNT,
                "region": REGION,
                "name": "web",
                "ipv4_cidr": "10.0.0.0/16",
                "bk_biz_id": 7,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let rows = server.store.rows(ResourceKind::Vpc).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], id.as_str());
    assert_eq!(rows[0]["name"], "web");
    assert_eq!(rows[0]["bk_biz_id"], 7);
}

#[tokio::test]
async fn test_create_vpc_requires_name() {
    let server = TestServer::start().await;
    let (status, body) = server
        .post(
            "aws",
            "/vpcs/create",
            json!({"account_id": ACCOUNT, "region": REGION, "name": ""}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_ne!(body["code"], 0);
    assert!(server.store.rows(ResourceKind::Vpc).await.is_empty());
}

#[tokio::test]
async fn test_create_subnet_syncs_missing_vpc_first() {
    let server = TestServer::start().await;
    server.cloud.put(ACCOUNT, aws_vpc("vpc-1", "web")).await;

    let (status, body) = server
        .post(
            "aws",
            "/subnets/create",
            json!({
                "account_id": ACCOUNT,
                "region": REGION,
                "zone": "us-east-1a",
                "cloud_vpc_id": "vpc-1",
                "name": "web-a",
                "ipv4_cidr": "10.0.1.0/24",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let subnet_id = body["data"]["id"].as_str().unwrap().to_string();

    let vpcs = server.store.rows(ResourceKind::Vpc).await;
    let subnets = server.store.rows(ResourceKind::Subnet).await;
    assert_eq!(subnets.len(), 1);
    assert_eq!(subnets[0]["id"], subnet_id.as_str());
    assert_eq!(subnets[0]["vpc_id"], id_of(&vpcs, "vpc-1").as_str());
}

#[tokio::test]
async fn test_create_subnet_in_unknown_vpc_is_not_found() {
    let server = TestServer::start().await;
    let (status, body) = server
        .post(
            "aws",
            "/subnets/create",
            json!({
                "account_id": ACCOUNT,
                "region": REGION,
                "cloud_vpc_id": "vpc-missing",
                "name": "web-a",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND, "{}", body);
    assert!(server.store.rows(ResourceKind::Subnet).await.is_empty());
}

#[tokio::test]
async fn test_business_subnet_needs_vpc_in_that_business() {
    let server = TestServer::start().await;
    server.cloud.put(ACCOUNT, aws_vpc("vpc-1", "web")).await;
    let subnet = |bk_biz_id: i64| {
        json!({
            "account_id": ACCOUNT,
            "region": REGION,
            "cloud_vpc_id": "vpc-1",
            "name": "web-a",
            "ipv4_cidr": "10.0.1.0/24",
            "bk_biz_id": bk_biz_id,
        })
    };

    // the vpc is pulled in unassigned
    let (status, body) = server.post("aws", "/subnets/create", subnet(8)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
    assert_eq!(body["code"], 2000016);
    assert!(server.store.rows(ResourceKind::Subnet).await.is_empty());

    let vpc_id = id_of(&server.store.rows(ResourceKind::Vpc).await, "vpc-1");
    let assign = BaseInfoUpdateReq {
        ids: vec![vpc_id],
        data: BaseInfo {
            bk_biz_id: Some(8),
            ..Default::default()
        },
    };
    server
        .store
        .batch_update_base_info(&Kit::new(), ResourceKind::Vpc, &assign)
        .await
        .unwrap();

    let (status, _) = server.post("aws", "/subnets/create", subnet(9)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(server.store.rows(ResourceKind::Subnet).await.is_empty());

    let (status, body) = server.post("aws", "/subnets/create", subnet(8)).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let subnets = server.store.rows(ResourceKind::Subnet).await;
    assert_eq!(subnets.len(), 1);
    assert_eq!(subnets[0]["bk_biz_id"], 8);
}

#[tokio::test]
async fn test_update_vpc_memo() {
    let server = TestServer::start().await;
    server.cloud.put(ACCOUNT, aws_vpc("vpc-1", "web")).await;
    server
        .post("aws", "/vpcs/sync", json!({"account_id": ACCOUNT, "region": REGION}))
        .await;
    let id = id_of(&server.store.rows(ResourceKind::Vpc).await, "vpc-1");

    let (status, body) = server
        .patch("aws", &format!("/vpcs/{}", id), json!({"memo": "prod network"}))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let rows = server.store.rows(ResourceKind::Vpc).await;
    assert_eq!(rows[0]["memo"], "prod network");
}

#[tokio::test]
async fn test_delete_subnet_twice() {
    let server = TestServer::start().await;
    server.cloud.put(ACCOUNT, aws_vpc("vpc-1", "web")).await;
    server.cloud.put(ACCOUNT, aws_subnet("subnet-1", "vpc-1")).await;
    server
        .post("aws", "/subnets/sync", json!({"account_id": ACCOUNT, "region": REGION}))
        .await;
    let id = id_of(&server.store.rows(ResourceKind::Subnet).await, "subnet-1");

    let (status, _) = server.delete("aws", &format!("/subnets/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(server.store.rows(ResourceKind::Subnet).await.is_empty());

    let (status, body) = server.delete("aws", &format!("/subnets/{}", id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["rid"], "test-rid");
}

#[tokio::test]
async fn test_delete_vpc_already_gone_from_cloud() {
    let server = TestServer::start().await;
    server.cloud.put(ACCOUNT, aws_vpc("vpc-1", "web")).await;
    server
        .post("aws", "/vpcs/sync", json!({"account_id": ACCOUNT, "region": REGION}))
        .await;
    let id = id_of(&server.store.rows(ResourceKind::Vpc).await, "vpc-1");
    server.cloud.remove(Vendor::Aws, ResourceKind::Vpc, "vpc-1").await;

    let (status, body) = server.delete("aws", &format!("/vpcs/{}", id)).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert!(server.store.rows(ResourceKind::Vpc).await.is_empty());
}

#[tokio::test]
async fn test_list_count_ip_keyed_by_subnet_id() {
    let server = TestServer::start().await;
    server.cloud.put(ACCOUNT, aws_vpc("vpc-1", "web")).await;
    server.cloud.put(ACCOUNT, aws_subnet("subnet-1", "vpc-1")).await;
    server.cloud.put(ACCOUNT, aws_subnet("subnet-2", "vpc-1")).await;
    server
        .post("aws", "/subnets/sync", json!({"account_id": ACCOUNT, "region": REGION}))
        .await;
    let rows = server.store.rows(ResourceKind::Subnet).await;
    let first = id_of(&rows, "subnet-1");
    let second = id_of(&rows, "subnet-2");
    server
        .cloud
        .set_ip_usage(
            "subnet-2",
            AvailIpResult {
                available_ip_count: 200,
                total_ip_count: 251,
                used_ip_count: 51,
            },
        )
        .await;

    let (status, body) = server
        .post(
            "aws",
            "/subnets/ips/count/list",
            json!({"account_id": ACCOUNT, "region": REGION, "ids": [first, second]}),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"][first.as_str()]["total_ip_count"], 256);
    assert_eq!(body["data"][second.as_str()]["used_ip_count"], 51);
}

#[tokio::test]
async fn test_list_count_ip_requires_ids() {
    let server = TestServer::start().await;
    let (status, _) = server
        .post(
            "aws",
            "/subnets/ips/count/list",
            json!({"account_id": ACCOUNT, "region": REGION, "ids": []}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_single_subnet_count_is_huawei_only() {
    let server = TestServer::start().await;
    let ids = server
        .store
        .seed(
            ResourceKind::Subnet,
            Vendor::HuaWei,
            vec![json!({
                "account_id": ACCOUNT,
                "region": "cn-north-4",
                "cloud_id": "hw-subnet-1",
                "name": "web",
            })],
        )
        .await
        .unwrap();
    server
        .cloud
        .set_ip_usage(
            "hw-subnet-1",
            AvailIpResult {
                available_ip_count: 10,
                total_ip_count: 16,
                used_ip_count: 6,
            },
        )
        .await;

    let (status, body) = server
        .post("huawei", &format!("/subnets/{}/ips/count", ids[0]), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["available_ip_count"], 10);

    let (status, body) = server
        .post("aws", &format!("/subnets/{}/ips/count", ids[0]), json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 2000007);
}
