use crate::application::services::ScoringService;
use crate::domain::entities::{
    AddToQueueRequest, QueueConfiguration, QueueEntry, QueueEntryStatus, QueueHealth,
    QueuePriority, QueueStatistics,
};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::{
    clock::Clock, queue_config_repository::QueueConfigRepository,
    queue_repository::QueueRepository,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Neutral score used when scoring is unavailable at enqueue time. Queueing
/// must not block on scoring availability.
const FALLBACK_SCORE: f64 = 50.0;

/// Orchestrates the per-tenant lead queue: enqueue, claim, assign, status
/// transitions, expiry and health. Holds no mutable state of its own; every
/// invariant lives in the store, which keeps this service stateless and
/// horizontally scalable.
#[derive(Clone)]
pub struct QueueService {
    queue_repo: Arc<dyn QueueRepository>,
    config_repo: Arc<dyn QueueConfigRepository>,
    scoring_service: ScoringService,
    clock: Arc<dyn Clock>,
}

impl QueueService {
    pub fn new(
        queue_repo: Arc<dyn QueueRepository>,
        config_repo: Arc<dyn QueueConfigRepository>,
        scoring_service: ScoringService,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            queue_repo,
            config_repo,
            scoring_service,
            clock,
        }
    }

    /// Tenant queue configuration, materialized with defaults on first
    /// access.
    pub async fn get_queue_configuration(
        &self,
        tenant_id: &str,
    ) -> DomainResult<QueueConfiguration> {
        if let Some(config) = self.config_repo.get_configuration(tenant_id).await? {
            return Ok(config);
        }

        let defaults = QueueConfiguration::defaults_for(tenant_id);
        self.config_repo.upsert_configuration(&defaults).await?;
        info!("Created default queue configuration for tenant {}", tenant_id);
        Ok(defaults)
    }

    /// Replace a tenant's queue configuration wholesale.
    pub async fn update_queue_configuration(
        &self,
        config: QueueConfiguration,
    ) -> DomainResult<QueueConfiguration> {
        config.validate().map_err(DomainError::Validation)?;
        self.config_repo.upsert_configuration(&config).await?;
        info!("Updated queue configuration for tenant {}", config.tenant_id);
        Ok(config)
    }

    pub async fn get_entry(&self, tenant_id: &str, entry_id: &str) -> DomainResult<QueueEntry> {
        self.queue_repo
            .get_entry(tenant_id, entry_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Queue entry {} not found", entry_id)))
    }

    pub async fn list_entries(
        &self,
        tenant_id: &str,
        status: Option<QueueEntryStatus>,
        limit: i64,
        offset: i64,
    ) -> DomainResult<Vec<QueueEntry>> {
        self.queue_repo
            .list_entries(tenant_id, status, limit, offset)
            .await
    }

    /// Enqueue one lead. Capacity is enforced transactionally in the store;
    /// a missing score falls back to the scoring engine and, failing that,
    /// to a neutral default.
    pub async fn add_to_queue(
        &self,
        tenant_id: &str,
        request: AddToQueueRequest,
    ) -> DomainResult<QueueEntry> {
        let config = self.get_queue_configuration(tenant_id).await?;
        let entry = self.build_entry(tenant_id, request, &config).await;

        let mut inserted = self
            .queue_repo
            .insert_entries(tenant_id, vec![entry], config.max_queue_size)
            .await?;

        metrics::counter!("queue_entries_added_total").increment(1);
        let entry = inserted
            .pop()
            .ok_or_else(|| DomainError::Storage("Insert returned no entry".to_string()))?;
        info!(
            "Queued lead {} for tenant {} at position {} ({} priority, score {:.1})",
            entry.lead_id, tenant_id, entry.queue_position, entry.priority, entry.score
        );
        Ok(entry)
    }

    /// Enqueue a batch. The capacity check covers the whole set inside the
    /// insert transaction, so concurrent batch callers cannot overcommit;
    /// the insert is all-or-nothing.
    pub async fn batch_add(
        &self,
        tenant_id: &str,
        requests: Vec<AddToQueueRequest>,
    ) -> DomainResult<Vec<QueueEntry>> {
        if requests.is_empty() {
            return Ok(Vec::new());
        }

        let config = self.get_queue_configuration(tenant_id).await?;
        let mut entries = Vec::with_capacity(requests.len());
        for request in requests {
            entries.push(self.build_entry(tenant_id, request, &config).await);
        }

        let inserted = self
            .queue_repo
            .insert_entries(tenant_id, entries, config.max_queue_size)
            .await?;

        metrics::counter!("queue_entries_added_total").increment(inserted.len() as u64);
        info!(
            "Queued batch of {} leads for tenant {}",
            inserted.len(),
            tenant_id
        );
        Ok(inserted)
    }

    async fn build_entry(
        &self,
        tenant_id: &str,
        request: AddToQueueRequest,
        config: &QueueConfiguration,
    ) -> QueueEntry {
        let now = self.clock.now();

        let score = match request.score {
            Some(score) => score,
            None => match self
                .scoring_service
                .score_lead(tenant_id, &request.lead_id)
                .await
            {
                Ok(result) => result.percentage_score,
                Err(e) => {
                    // Scoring being down must not block the queue.
                    warn!(
                        "Scoring lead {} failed ({}); using neutral score {}",
                        request.lead_id, e, FALLBACK_SCORE
                    );
                    FALLBACK_SCORE
                }
            },
        };

        let priority = request
            .priority
            .unwrap_or_else(|| QueuePriority::from_score(score));

        let expires_at = now + chrono::Duration::hours(config.queue_entry_expiration_hours);

        QueueEntry {
            id: uuid::Uuid::new_v4().to_string(),
            tenant_id: tenant_id.to_string(),
            lead_id: request.lead_id,
            priority,
            status: QueueEntryStatus::Pending,
            score,
            // Allocated from the per-tenant counter inside the insert
            // transaction.
            queue_position: 0,
            wait_time_minutes: 0,
            estimated_processing_time: request.estimated_processing_time,
            assignment_reason: request.assignment_reason,
            notes: request.notes,
            tags: request.tags,
            created_at: now.to_rfc3339(),
            expires_at: expires_at.to_rfc3339(),
            assigned_to: None,
            assigned_by: None,
            assigned_at: None,
            completed_at: None,
            actual_processing_time: None,
        }
    }

    /// Claim the next eligible entry: highest priority first, oldest first
    /// within a tier. At most one caller wins any given entry; the store
    /// enforces this with a status-guarded conditional update.
    pub async fn claim_next(&self, tenant_id: &str) -> DomainResult<Option<QueueEntry>> {
        let now = self.clock.now();
        let claimed = self.queue_repo.claim_next_pending(tenant_id, now).await?;

        if let Some(entry) = &claimed {
            metrics::counter!("queue_claims_total").increment(1);
            info!(
                "Claimed entry {} (lead {}) for tenant {} after {} minutes in queue",
                entry.id, entry.lead_id, tenant_id, entry.wait_time_minutes
            );
        }
        Ok(claimed)
    }

    /// Attach an agent to an entry that is pending or freshly claimed.
    pub async fn assign(
        &self,
        tenant_id: &str,
        entry_id: &str,
        agent_id: &str,
        assigned_by: &str,
    ) -> DomainResult<QueueEntry> {
        let now = self.clock.now();
        let matched = self
            .queue_repo
            .assign_entry(tenant_id, entry_id, agent_id, assigned_by, now)
            .await?;

        if !matched {
            // Guard failed: distinguish a missing entry from an illegal state.
            let entry = self.get_entry(tenant_id, entry_id).await?;
            return Err(DomainError::InvalidTransition(format!(
                "Entry {} cannot be assigned from status {}",
                entry_id, entry.status
            )));
        }

        let entry = self.get_entry(tenant_id, entry_id).await?;
        info!(
            "Assigned entry {} to agent {} (by {}) for tenant {}",
            entry_id, agent_id, assigned_by, tenant_id
        );
        Ok(entry)
    }

    /// Drive an entry along the state machine. Completion stamps
    /// `completed_at` and derives the actual processing time from the
    /// assignment timestamp.
    pub async fn update_status(
        &self,
        tenant_id: &str,
        entry_id: &str,
        new_status: QueueEntryStatus,
    ) -> DomainResult<QueueEntry> {
        let entry = self.get_entry(tenant_id, entry_id).await?;

        if !entry.status.can_transition_to(new_status) {
            return Err(DomainError::InvalidTransition(format!(
                "Entry {} cannot move from {} to {}",
                entry_id, entry.status, new_status
            )));
        }

        let now = self.clock.now();
        let (completed_at, actual_processing_time) = if new_status == QueueEntryStatus::Completed {
            let processing_minutes = entry
                .assigned_at_datetime()
                .map(|assigned| (now - assigned).num_minutes());
            (Some(now.to_rfc3339()), processing_minutes)
        } else {
            (None, None)
        };

        let matched = self
            .queue_repo
            .update_status(
                tenant_id,
                entry_id,
                entry.status,
                new_status,
                completed_at,
                actual_processing_time,
            )
            .await?;

        if !matched {
            return Err(DomainError::Conflict(format!(
                "Entry {} changed concurrently; transition to {} not applied",
                entry_id, new_status
            )));
        }

        info!(
            "Entry {} moved {} -> {} for tenant {}",
            entry_id, entry.status, new_status, tenant_id
        );
        self.get_entry(tenant_id, entry_id).await
    }

    /// Change the priority of a pending entry in place. Queue position and
    /// creation time are untouched, so the entry keeps its FIFO slot within
    /// the new tier.
    pub async fn reorder(
        &self,
        tenant_id: &str,
        entry_id: &str,
        new_priority: QueuePriority,
    ) -> DomainResult<QueueEntry> {
        let entry = self.get_entry(tenant_id, entry_id).await?;
        if entry.status != QueueEntryStatus::Pending {
            return Err(DomainError::InvalidTransition(format!(
                "Entry {} is {}; reorder is only allowed while pending",
                entry_id, entry.status
            )));
        }

        let matched = self
            .queue_repo
            .update_priority(tenant_id, entry_id, new_priority)
            .await?;
        if !matched {
            return Err(DomainError::Conflict(format!(
                "Entry {} left pending while being reordered",
                entry_id
            )));
        }

        info!(
            "Reordered entry {} to {} for tenant {}",
            entry_id, new_priority, tenant_id
        );
        self.get_entry(tenant_id, entry_id).await
    }

    pub async fn remove_from_queue(&self, tenant_id: &str, entry_id: &str) -> DomainResult<()> {
        let deleted = self.queue_repo.delete_entry(tenant_id, entry_id).await?;
        if !deleted {
            return Err(DomainError::NotFound(format!(
                "Queue entry {} not found",
                entry_id
            )));
        }
        info!("Removed entry {} from tenant {} queue", entry_id, tenant_id);
        Ok(())
    }

    /// Mark every pending entry past its expiry as expired. Entries a
    /// concurrent caller has already claimed are out of `pending` and stay
    /// untouched.
    pub async fn expire_sweep(&self, tenant_id: &str) -> DomainResult<u64> {
        let now = self.clock.now();
        let expired = self.queue_repo.expire_pending_before(tenant_id, now).await?;
        if expired > 0 {
            metrics::counter!("queue_entries_expired_total").increment(expired);
            info!("Expired {} pending entries for tenant {}", expired, tenant_id);
        }
        Ok(expired)
    }

    /// Watchdog: entries stuck in `assigned`/`processing` beyond the
    /// configured assignment timeout go back to `pending`. A timeout of 0
    /// disables the sweep.
    pub async fn requeue_stuck(&self, tenant_id: &str) -> DomainResult<u64> {
        let config = self.get_queue_configuration(tenant_id).await?;
        if config.assignment_timeout_minutes == 0 {
            return Ok(0);
        }

        let cutoff =
            self.clock.now() - chrono::Duration::minutes(config.assignment_timeout_minutes);
        let requeued = self
            .queue_repo
            .requeue_stuck_assignments(tenant_id, cutoff)
            .await?;
        if requeued > 0 {
            warn!(
                "Requeued {} entries stuck past {} minutes for tenant {}",
                requeued, config.assignment_timeout_minutes, tenant_id
            );
        }
        Ok(requeued)
    }

    /// Point-in-time queue health for a tenant.
    pub async fn get_statistics(&self, tenant_id: &str) -> DomainResult<QueueStatistics> {
        let now = self.clock.now();
        let config = self.get_queue_configuration(tenant_id).await?;
        let counts = self.queue_repo.count_by_status(tenant_id).await?;

        let count_for = |status: QueueEntryStatus| -> i64 {
            counts
                .iter()
                .find(|(s, _)| *s == status)
                .map(|(_, n)| *n)
                .unwrap_or(0)
        };

        let pending = count_for(QueueEntryStatus::Pending);
        let assigned = count_for(QueueEntryStatus::Assigned);
        let processing = count_for(QueueEntryStatus::Processing);
        let total_entries = pending + assigned + processing;

        let queue_utilization_pct = if config.max_queue_size > 0 {
            total_entries as f64 / config.max_queue_size as f64 * 100.0
        } else {
            0.0
        };

        let statistics = QueueStatistics {
            tenant_id: tenant_id.to_string(),
            total_entries,
            pending_entries: pending,
            assigned_entries: assigned,
            processing_entries: processing,
            completed_entries: count_for(QueueEntryStatus::Completed),
            cancelled_entries: count_for(QueueEntryStatus::Cancelled),
            expired_entries: count_for(QueueEntryStatus::Expired),
            average_wait_time_minutes: self
                .queue_repo
                .average_wait_time_pending(tenant_id, now)
                .await?,
            average_processing_time_minutes: self
                .queue_repo
                .average_processing_time_completed(tenant_id)
                .await?,
            queue_utilization_pct,
            health: QueueHealth::from_utilization(queue_utilization_pct),
            active_agents: self.queue_repo.distinct_active_agents(tenant_id).await?,
        };

        metrics::gauge!("queue_utilization_pct").set(queue_utilization_pct);
        Ok(statistics)
    }

    /// Tenants the maintenance worker should sweep.
    pub async fn tenants_with_live_entries(&self) -> DomainResult<Vec<String>> {
        self.queue_repo.tenants_with_live_entries().await
    }
}
