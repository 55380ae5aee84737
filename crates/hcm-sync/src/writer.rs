//! Batched writes to the data-service

use hcm_cloud::{
    BatchDeleteReq, CreateReq, DEFAULT_MAX_IN_LIMIT, DataService, DataServiceExt, Expression, Kit,
    ResourceKind, Result, UpdateReq, VendorExtension,
};

/// Insert all rows in one call, returning the assigned ids
pub async fn create_rows<E: VendorExtension>(
    data: &dyn DataService,
    kt: &Kit,
    reqs: Vec<CreateReq<E::Spec, E>>,
) -> Result<Vec<String>> {
    if reqs.is_empty() {
        return Ok(Vec::new());
    }
    let count = reqs.len();
    let ids = data.batch_create_ext::<E>(kt, reqs).await?;
    tracing::info!(rid = %kt.rid, vendor = %E::VENDOR, count, "created rows");
    Ok(ids)
}

/// Replace the tracked fields of all rows in one call
pub async fn update_rows<E: VendorExtension>(
    data: &dyn DataService,
    kt: &Kit,
    reqs: Vec<UpdateReq<E::Spec, E>>,
) -> Result<()> {
    if reqs.is_empty() {
        return Ok(());
    }
    let count = reqs.len();
    data.batch_update_ext::<E>(kt, reqs).await?;
    tracing::info!(rid = %kt.rid, vendor = %E::VENDOR, count, "updated rows");
    Ok(())
}

/// Delete rows by internal id in chunks; the first failed chunk aborts the rest
pub async fn delete_ids(
    data: &dyn DataService,
    kt: &Kit,
    kind: ResourceKind,
    ids: &[String],
) -> Result<usize> {
    let mut deleted = 0;
    for chunk in ids.chunks(DEFAULT_MAX_IN_LIMIT) {
        let req = BatchDeleteReq {
            filter: Expression::containers("id", chunk),
        };
        data.batch_delete(kt, kind, &req).await.inspect_err(|e| {
            tracing::error!(
                rid = %kt.rid, %kind, deleted, remaining = ids.len() - deleted,
                error = %e, "batch delete failed"
            );
        })?;
        deleted += chunk.len();
    }
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hcm_cloud::Vendor;
    use hcm_dataservice::{MemoryDataService, Operation};
    use serde_json::json;

    async fn seeded(n: usize) -> (MemoryDataService, Vec<String>) {
        let store = MemoryDataService::new();
        let rows = (0..n)
            .map(|i| json!({"account_id": "acc-1", "cloud_id": format!("eni-{}", i)}))
            .collect();
        let ids = store
            .seed(ResourceKind::NetworkInterface, Vendor::Azure, rows)
            .await
            .unwrap();
        (store, ids)
    }

    #[tokio::test]
    async fn test_delete_chunks_are_bounded() {
        let (store, ids) = seeded(1200).await;
        let deleted = delete_ids(&store, &Kit::new(), ResourceKind::NetworkInterface, &ids)
            .await
            .unwrap();

        assert_eq!(deleted, 1200);
        let stats = store.stats().await;
        assert_eq!(stats.delete_calls, 3);
        assert_eq!(stats.deleted_rows, 1200);
    }

    #[tokio::test]
    async fn test_failed_chunk_aborts_remaining() {
        let (store, ids) = seeded(1200).await;
        store.fail_after(Operation::Delete, 1).await;

        let result = delete_ids(&store, &Kit::new(), ResourceKind::NetworkInterface, &ids).await;
        assert!(result.is_err());

        let stats = store.stats().await;
        assert_eq!(stats.delete_calls, 2);
        assert_eq!(stats.deleted_rows, 500);
        assert_eq!(store.rows(ResourceKind::NetworkInterface).await.len(), 700);
    }
}
