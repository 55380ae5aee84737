//! hc-service
//!
//! HTTP front of the HCM sync engine. Routes live under
//! `/api/v1/hc/vendors/{vendor}`:
//!
//! - `POST {kind}/sync` reconciles VPCs, subnets or network interfaces
//! - `POST vpcs/create`, `POST subnets/create` create in the cloud, then sync the new row
//! - `PATCH|DELETE vpcs/{id}`, `subnets/{id}` update or delete in both places
//! - `POST subnets/ips/count/list`, `POST subnets/{id}/ips/count` report IP usage

pub mod notice;
pub mod rest;
pub mod state;

pub use notice::{LogNotifier, Notice, NoticeQueue, Notifier, WebhookNotifier};
pub use rest::create_router;
pub use state::{AppState, build_state};

use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Serve the API on `listener` until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, state: Arc<AppState>, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "hc-service listening");

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("hc-service stopped");
    Ok(())
}
