//! Post-creation notifications
//!
//! Handlers submit a [`Notice`] and get a [`NoticeTicket`] back right away.
//! A single worker task drains the bounded queue and delivers each notice
//! with exponential backoff; the ticket resolves to the final
//! [`DeliveryReport`].

use async_trait::async_trait;
use hcm_cloud::{ResourceKind, RetryConfig, Vendor};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NoticeError {
    #[error("Notice queue is full")]
    QueueFull,

    #[error("Notice worker has stopped")]
    WorkerStopped,

    #[error("Delivery failed: {0}")]
    Delivery(String),
}

/// A resource created through hc-service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    pub event: String,
    pub vendor: Vendor,
    pub kind: ResourceKind,
    pub id: String,
    pub cloud_id: String,
    pub rid: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Notice {
    pub fn created(
        vendor: Vendor,
        kind: ResourceKind,
        id: impl Into<String>,
        cloud_id: impl Into<String>,
        rid: impl Into<String>,
    ) -> Self {
        Self {
            event: format!("{}.created", kind),
            vendor,
            kind,
            id: id.into(),
            cloud_id: cloud_id.into(),
            rid: rid.into(),
            created_at: chrono::Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeliveryOutcome {
    Delivered,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryReport {
    pub attempts: u32,
    pub outcome: DeliveryOutcome,
}

impl DeliveryReport {
    pub fn is_delivered(&self) -> bool {
        self.outcome == DeliveryOutcome::Delivered
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, notice: &Notice) -> Result<(), NoticeError>;
}

/// Logs notices; used when no webhook is configured
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn deliver(&self, notice: &Notice) -> Result<(), NoticeError> {
        tracing::info!(
            rid = %notice.rid, vendor = %notice.vendor, event = %notice.event,
            id = %notice.id, cloud_id = %notice.cloud_id, "resource created"
        );
        Ok(())
    }
}

/// POSTs each notice as JSON
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, NoticeError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NoticeError::Delivery(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn deliver(&self, notice: &Notice) -> Result<(), NoticeError> {
        let response = self
            .client
            .post(&self.url)
            .header(hcm_cloud::kit::RID_HEADER, &notice.rid)
            .json(notice)
            .send()
            .await
            .map_err(|e| NoticeError::Delivery(e.to_string()))?;

        if !response.status().is_success() {
            return Err(NoticeError::Delivery(format!(
                "webhook answered {}",
                response.status()
            )));
        }
        Ok(())
    }
}

struct Job {
    notice: Notice,
    done: oneshot::Sender<DeliveryReport>,
}

/// Resolves once the worker is done with one notice
#[derive(Debug)]
pub struct NoticeTicket {
    done: oneshot::Receiver<DeliveryReport>,
}

impl NoticeTicket {
    pub async fn wait(self) -> DeliveryReport {
        self.done.await.unwrap_or(DeliveryReport {
            attempts: 0,
            outcome: DeliveryOutcome::Failed(NoticeError::WorkerStopped.to_string()),
        })
    }
}

/// Sending half of the notification queue
#[derive(Clone)]
pub struct NoticeQueue {
    tx: mpsc::Sender<Job>,
}

impl NoticeQueue {
    /// Start the worker; it stops once every queue handle is dropped
    pub fn start(
        notifier: Arc<dyn Notifier>,
        capacity: usize,
        retry: RetryConfig,
    ) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let worker = tokio::spawn(run_worker(rx, notifier, retry));
        (Self { tx }, worker)
    }

    /// Enqueue without waiting; a full queue is an error, never a silent drop
    pub fn submit(&self, notice: Notice) -> Result<NoticeTicket, NoticeError> {
        let (done, rx) = oneshot::channel();
        self.tx.try_send(Job { notice, done }).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => NoticeError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => NoticeError::WorkerStopped,
        })?;
        Ok(NoticeTicket { done: rx })
    }
}

async fn run_worker(mut rx: mpsc::Receiver<Job>, notifier: Arc<dyn Notifier>, retry: RetryConfig) {
    while let Some(Job { notice, done }) = rx.recv().await {
        let outcome = retry
            .run(|_| notifier.deliver(&notice), |_: &NoticeError| true)
            .await;

        let report = DeliveryReport {
            attempts: outcome.attempts,
            outcome: match outcome.result {
                Ok(()) => DeliveryOutcome::Delivered,
                Err(e) => {
                    tracing::error!(
                        rid = %notice.rid, event = %notice.event, attempts = outcome.attempts,
                        error = %e, "notice delivery failed"
                    );
                    DeliveryOutcome::Failed(e.to_string())
                }
            },
        };
        // submitter may have stopped waiting
        let _ = done.send(report);
    }
    tracing::debug!("notice worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails the first `failures` deliveries
    struct Flaky {
        failures: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl Notifier for Flaky {
        async fn deliver(&self, _notice: &Notice) -> Result<(), NoticeError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err(NoticeError::Delivery(format!("attempt {} refused", call + 1)));
            }
            Ok(())
        }
    }

    /// Never finishes, so the queue stays occupied
    struct Stuck;

    #[async_trait]
    impl Notifier for Stuck {
        async fn deliver(&self, _notice: &Notice) -> Result<(), NoticeError> {
            std::future::pending::<()>().await;
            Ok(())
        }
    }

    fn retry(max_attempts: u32) -> RetryConfig {
        RetryConfig::new(max_attempts, Duration::from_millis(5))
    }

    fn notice() -> Notice {
        Notice::created(Vendor::TCloud, ResourceKind::Subnet, "00000001", "subnet-1", "rid-1")
    }

    #[tokio::test]
    async fn test_delivered_after_retries() {
        let flaky = Arc::new(Flaky {
            failures: 2,
            calls: AtomicU32::new(0),
        });
        let (queue, _worker) = NoticeQueue::start(flaky.clone(), 4, retry(3));

        let report = queue.submit(notice()).unwrap().wait().await;
        assert!(report.is_delivered());
        assert_eq!(report.attempts, 3);
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let flaky = Arc::new(Flaky {
            failures: u32::MAX,
            calls: AtomicU32::new(0),
        });
        let (queue, _worker) = NoticeQueue::start(flaky.clone(), 4, retry(2));

        let report = queue.submit(notice()).unwrap().wait().await;
        assert_eq!(report.attempts, 2);
        assert_eq!(
            report.outcome,
            DeliveryOutcome::Failed("Delivery failed: attempt 2 refused".to_string())
        );
    }

    #[tokio::test]
    async fn test_full_queue_is_reported() {
        let (queue, _worker) = NoticeQueue::start(Arc::new(Stuck), 1, retry(1));

        // the worker takes the first job and hangs; the second fills the queue
        let _first = queue.submit(notice()).unwrap();
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        let _second = queue.submit(notice()).unwrap();

        assert_eq!(queue.submit(notice()).unwrap_err(), NoticeError::QueueFull);
    }

    #[test]
    fn test_event_name() {
        assert_eq!(notice().event, "subnet.created");
    }
}
