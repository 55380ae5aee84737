//! Stale row confirmation and deletion
//!
//! Candidates are the DB rows of the scope that the listing did not report.
//! They are all collected before the first delete, then confirmed against the
//! cloud according to the syncer's [`ConfirmStrategy`].

use crate::request::SyncRequest;
use crate::syncer::{ConfirmStrategy, ResourceSyncer, Row};
use crate::writer;
use hcm_cloud::{CloudError, Kit, ResourceSpec, Result, VendorExtension};

/// Confirm `candidates` are gone and delete them
pub async fn delete_stale<S>(
    syncer: &S,
    kt: &Kit,
    req: &SyncRequest,
    candidates: Vec<Row<S::Ext>>,
) -> Result<usize>
where
    S: ResourceSyncer + ?Sized,
{
    let vendor = S::Ext::VENDOR;
    let kind = <<S::Ext as VendorExtension>::Spec as ResourceSpec>::KIND;
    if candidates.is_empty() {
        return Ok(0);
    }

    let confirmed = match syncer.confirm_strategy() {
        ConfirmStrategy::NoConfirm => candidates,
        ConfirmStrategy::Relist => {
            relist(syncer, kt, req, &candidates).await?;
            candidates
        }
        ConfirmStrategy::DirectLookup => lookup_each(syncer, kt, req, candidates).await,
    };

    if confirmed.is_empty() {
        return Ok(0);
    }

    let ids: Vec<String> = confirmed.iter().map(|row| row.id.clone()).collect();
    tracing::info!(
        rid = %kt.rid, %vendor, %kind, account_id = %req.account_id,
        count = ids.len(), "deleting rows removed from cloud"
    );
    writer::delete_ids(syncer.data(), kt, kind, &ids).await
}

/// List the candidates again; any survivor fails the whole delete
async fn relist<S>(
    syncer: &S,
    kt: &Kit,
    req: &SyncRequest,
    candidates: &[Row<S::Ext>],
) -> Result<()>
where
    S: ResourceSyncer + ?Sized,
{
    let cloud_ids: Vec<String> = candidates.iter().map(|row| row.cloud_id.clone()).collect();

    for chunk in cloud_ids.chunks(syncer.id_filter_limit()) {
        let survivors = syncer.list(kt, &req.narrowed(chunk.to_vec())).await?;
        if !survivors.is_empty() {
            let ids: Vec<&str> = survivors.iter().map(|s| s.cloud_id.as_str()).collect();
            tracing::error!(
                rid = %kt.rid, vendor = %S::Ext::VENDOR, account_id = %req.account_id,
                survivors = ?ids, "delete candidates still exist in cloud"
            );
            return Err(CloudError::StaleStillExists(format!(
                "{} still exist in {}",
                ids.join(","),
                S::Ext::VENDOR
            )));
        }
    }
    Ok(())
}

/// Look up every candidate; keep it unless the cloud cleanly says not found
async fn lookup_each<S>(
    syncer: &S,
    kt: &Kit,
    req: &SyncRequest,
    candidates: Vec<Row<S::Ext>>,
) -> Vec<Row<S::Ext>>
where
    S: ResourceSyncer + ?Sized,
{
    let mut confirmed = Vec::with_capacity(candidates.len());
    for row in candidates {
        match syncer.lookup(kt, req, &row).await {
            Err(e) if e.is_not_found() => confirmed.push(row),
            Ok(()) => {
                tracing::warn!(
                    rid = %kt.rid, vendor = %S::Ext::VENDOR, cloud_id = %row.cloud_id,
                    "resource missing from listing but found by lookup, kept"
                );
            }
            Err(e) => {
                tracing::warn!(
                    rid = %kt.rid, vendor = %S::Ext::VENDOR, cloud_id = %row.cloud_id,
                    error = %e, "stale lookup failed, kept"
                );
            }
        }
    }
    confirmed
}
