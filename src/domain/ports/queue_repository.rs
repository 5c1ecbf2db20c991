use crate::domain::entities::{QueueEntry, QueueEntryStatus, QueuePriority};
use crate::domain::errors::DomainResult;
use chrono::{DateTime, Utc};

/// Durable, tenant-partitioned queue store. All mutations that guard on the
/// current status are single conditional updates at the store layer; callers
/// get a `bool` telling them whether the guard matched, never a chance to
/// read-then-write around it.
#[async_trait::async_trait]
pub trait QueueRepository: Send + Sync {
    /// Insert a batch of entries in one transaction. The capacity check
    /// (live entries + batch size vs `max_queue_size`) and the per-tenant
    /// queue-position allocation happen inside the same transaction, so
    /// concurrent batch callers can never overcommit capacity. Entries are
    /// returned with their allocated positions. All-or-nothing.
    async fn insert_entries(
        &self,
        tenant_id: &str,
        entries: Vec<QueueEntry>,
        max_queue_size: i64,
    ) -> DomainResult<Vec<QueueEntry>>;

    async fn get_entry(&self, tenant_id: &str, entry_id: &str) -> DomainResult<Option<QueueEntry>>;

    /// Atomically claim the best eligible pending entry: smallest
    /// (priority rank, created_at, id) among pending entries that have not
    /// expired. The select-and-transition is a conditional update keyed by
    /// entry id and guarded on `status = 'pending'`; two concurrent callers
    /// never both win the same entry. The claimed entry is returned with
    /// status `assigned`, no agent, and its wait time recomputed.
    async fn claim_next_pending(
        &self,
        tenant_id: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<Option<QueueEntry>>;

    /// Attach an agent. Guard: status is `pending`, or `assigned` with no
    /// agent yet (a claim awaiting confirmation). Returns false when the
    /// guard did not match.
    async fn assign_entry(
        &self,
        tenant_id: &str,
        entry_id: &str,
        agent_id: &str,
        assigned_by: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<bool>;

    /// Status transition guarded on the expected current status. Completion
    /// timestamps travel with the same update.
    async fn update_status(
        &self,
        tenant_id: &str,
        entry_id: &str,
        expected: QueueEntryStatus,
        new_status: QueueEntryStatus,
        completed_at: Option<String>,
        actual_processing_time: Option<i64>,
    ) -> DomainResult<bool>;

    /// Re-tier a pending entry. Position and creation time are untouched so
    /// FIFO fairness inside the new tier is preserved.
    async fn update_priority(
        &self,
        tenant_id: &str,
        entry_id: &str,
        priority: QueuePriority,
    ) -> DomainResult<bool>;

    /// Hard delete. Returns false when no such entry exists.
    async fn delete_entry(&self, tenant_id: &str, entry_id: &str) -> DomainResult<bool>;

    /// Pending entries past their expiry move to `expired`. The status guard
    /// keeps a concurrently claimed entry out of the sweep.
    async fn expire_pending_before(
        &self,
        tenant_id: &str,
        cutoff: DateTime<Utc>,
    ) -> DomainResult<u64>;

    /// Watchdog: entries sitting in `assigned`/`processing` since before the
    /// cutoff go back to `pending` with their assignment fields cleared.
    async fn requeue_stuck_assignments(
        &self,
        tenant_id: &str,
        cutoff: DateTime<Utc>,
    ) -> DomainResult<u64>;

    /// Live entries: pending, assigned or processing.
    async fn count_live_entries(&self, tenant_id: &str) -> DomainResult<i64>;

    async fn count_by_status(
        &self,
        tenant_id: &str,
    ) -> DomainResult<Vec<(QueueEntryStatus, i64)>>;

    /// Mean minutes pending entries have been waiting, measured against the
    /// supplied instant (the stored wait time is only refreshed at claim).
    async fn average_wait_time_pending(
        &self,
        tenant_id: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<f64>;

    async fn average_processing_time_completed(&self, tenant_id: &str) -> DomainResult<f64>;

    /// Distinct agents holding `assigned` or `processing` entries.
    async fn distinct_active_agents(&self, tenant_id: &str) -> DomainResult<i64>;

    async fn list_entries(
        &self,
        tenant_id: &str,
        status: Option<QueueEntryStatus>,
        limit: i64,
        offset: i64,
    ) -> DomainResult<Vec<QueueEntry>>;

    /// Tenants that currently have live entries; drives the sweep worker.
    async fn tenants_with_live_entries(&self) -> DomainResult<Vec<String>>;
}
