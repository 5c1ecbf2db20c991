use crate::application::services::QueueService;
use std::time::Duration;
use tracing::{error, info};

/// Periodic queue maintenance: expire stale pending entries and requeue
/// assignments stuck past their timeout, tenant by tenant. Failures are
/// logged and retried on the next pass; the worker itself never dies.
pub struct SweepWorker {
    queue_service: QueueService,
    interval: Duration,
}

impl SweepWorker {
    pub fn new(queue_service: QueueService, interval: Duration) -> Self {
        Self {
            queue_service,
            interval,
        }
    }

    pub async fn run(&self) {
        info!(
            "Starting queue sweep worker (interval {}s)",
            self.interval.as_secs()
        );
        loop {
            if let Err(e) = self.sweep_all().await {
                error!("Queue sweep pass failed: {}", e);
            }
            tokio::time::sleep(self.interval).await;
        }
    }

    async fn sweep_all(&self) -> Result<(), crate::domain::errors::DomainError> {
        let tenants = self.queue_service.tenants_with_live_entries().await?;
        for tenant_id in tenants {
            match self.queue_service.expire_sweep(&tenant_id).await {
                Ok(expired) if expired > 0 => {
                    info!("Sweep expired {} entries for tenant {}", expired, tenant_id)
                }
                Ok(_) => {}
                Err(e) => error!("Expire sweep failed for tenant {}: {}", tenant_id, e),
            }

            match self.queue_service.requeue_stuck(&tenant_id).await {
                Ok(requeued) if requeued > 0 => {
                    info!("Sweep requeued {} entries for tenant {}", requeued, tenant_id)
                }
                Ok(_) => {}
                Err(e) => error!("Stuck requeue failed for tenant {}: {}", tenant_id, e),
            }

            // Refresh the utilization gauge while we are here.
            if let Err(e) = self.queue_service.get_statistics(&tenant_id).await {
                error!("Statistics refresh failed for tenant {}: {}", tenant_id, e);
            }
        }
        Ok(())
    }
}
