use crate::domain::entities::{QueueEntry, QueueEntryStatus, QueuePriority};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::queue_repository::QueueRepository;
use crate::infrastructure::persistence::{with_read_retry, Database};
use chrono::{DateTime, Utc};
use sqlx::any::AnyRow;
use sqlx::Row;

const ENTRY_COLUMNS: &str = "id, tenant_id, lead_id, priority, status, score, queue_position, \
     wait_time_minutes, estimated_processing_time, assignment_reason, notes, tags, \
     created_at, expires_at, assigned_to, assigned_by, assigned_at, completed_at, \
     actual_processing_time";

/// Claim ordering: highest priority first, oldest first within a tier,
/// entry id as the deterministic tie-break for identical timestamps.
const CLAIM_ORDER: &str = "CASE priority WHEN 'urgent' THEN 0 WHEN 'high' THEN 1 \
     WHEN 'normal' THEN 2 ELSE 3 END ASC, created_at ASC, id ASC";

const MAX_CLAIM_ATTEMPTS: u32 = 5;

fn map_entry_row(row: &AnyRow) -> Result<QueueEntry, sqlx::Error> {
    let tags_json: Option<String> = row.try_get("tags").ok();
    let tags = tags_json
        .as_deref()
        .and_then(|s| serde_json::from_str(s).ok())
        .unwrap_or_default();

    Ok(QueueEntry {
        id: row.try_get("id")?,
        tenant_id: row.try_get("tenant_id")?,
        lead_id: row.try_get("lead_id")?,
        priority: row.try_get("priority")?,
        status: row.try_get("status")?,
        score: row.try_get("score")?,
        queue_position: row.try_get("queue_position")?,
        wait_time_minutes: row.try_get("wait_time_minutes")?,
        estimated_processing_time: row.try_get("estimated_processing_time").ok(),
        assignment_reason: row.try_get("assignment_reason").ok(),
        notes: row.try_get("notes").ok(),
        tags,
        created_at: row.try_get("created_at")?,
        expires_at: row.try_get("expires_at")?,
        assigned_to: row.try_get("assigned_to").ok(),
        assigned_by: row.try_get("assigned_by").ok(),
        assigned_at: row.try_get("assigned_at").ok(),
        completed_at: row.try_get("completed_at").ok(),
        actual_processing_time: row.try_get("actual_processing_time").ok(),
    })
}

#[async_trait::async_trait]
impl QueueRepository for Database {
    async fn insert_entries(
        &self,
        tenant_id: &str,
        mut entries: Vec<QueueEntry>,
        max_queue_size: i64,
    ) -> DomainResult<Vec<QueueEntry>> {
        let mut tx = self.pool.begin().await.map_err(DomainError::from)?;

        let row = sqlx::query(
            "SELECT COUNT(*) as count FROM queue_entries
             WHERE tenant_id = ? AND status IN ('pending', 'assigned', 'processing')",
        )
        .bind(tenant_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(DomainError::from)?;
        let live: i64 = row.try_get("count").map_err(DomainError::from)?;

        if live + entries.len() as i64 > max_queue_size {
            // Dropping the transaction rolls everything back; no partial
            // insert escapes a failed capacity check.
            return Err(DomainError::CapacityExceeded(format!(
                "Queue for tenant {} holds {} live entries; adding {} would exceed the limit of {}",
                tenant_id,
                live,
                entries.len(),
                max_queue_size
            )));
        }

        for entry in &mut entries {
            // Positions come from a dedicated counter so they are strictly
            // increasing and never reused, even after deletions.
            sqlx::query(
                "INSERT INTO queue_positions (tenant_id, next_position) VALUES (?, 1)
                 ON CONFLICT(tenant_id) DO UPDATE SET next_position = next_position + 1",
            )
            .bind(tenant_id)
            .execute(&mut *tx)
            .await
            .map_err(DomainError::from)?;

            let row = sqlx::query("SELECT next_position FROM queue_positions WHERE tenant_id = ?")
                .bind(tenant_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(DomainError::from)?;
            entry.queue_position = row.try_get("next_position").map_err(DomainError::from)?;

            let tags_json = serde_json::to_string(&entry.tags)
                .map_err(|e| DomainError::Storage(format!("Failed to encode tags: {}", e)))?;

            sqlx::query(
                "INSERT INTO queue_entries (id, tenant_id, lead_id, priority, status, score,
                     queue_position, wait_time_minutes, estimated_processing_time,
                     assignment_reason, notes, tags, created_at, expires_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&entry.id)
            .bind(&entry.tenant_id)
            .bind(&entry.lead_id)
            .bind(entry.priority.to_string())
            .bind(entry.status.to_string())
            .bind(entry.score)
            .bind(entry.queue_position)
            .bind(entry.wait_time_minutes)
            .bind(entry.estimated_processing_time)
            .bind(entry.assignment_reason.as_deref())
            .bind(entry.notes.as_deref())
            .bind(&tags_json)
            .bind(&entry.created_at)
            .bind(&entry.expires_at)
            .execute(&mut *tx)
            .await
            .map_err(DomainError::from)?;
        }

        tx.commit().await.map_err(DomainError::from)?;
        Ok(entries)
    }

    async fn get_entry(&self, tenant_id: &str, entry_id: &str) -> DomainResult<Option<QueueEntry>> {
        let query = format!(
            "SELECT {} FROM queue_entries WHERE tenant_id = ? AND id = ?",
            ENTRY_COLUMNS
        );
        let row = with_read_retry("get_entry", || {
            sqlx::query(&query)
                .bind(tenant_id)
                .bind(entry_id)
                .fetch_optional(&self.pool)
        })
        .await
        .map_err(DomainError::from)?;

        row.as_ref().map(map_entry_row).transpose().map_err(DomainError::from)
    }

    async fn claim_next_pending(
        &self,
        tenant_id: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<Option<QueueEntry>> {
        let select = format!(
            "SELECT {} FROM queue_entries
             WHERE tenant_id = ? AND status = 'pending' AND expires_at > ?
             ORDER BY {} LIMIT 1",
            ENTRY_COLUMNS, CLAIM_ORDER
        );

        for _ in 0..MAX_CLAIM_ATTEMPTS {
            let row = sqlx::query(&select)
                .bind(tenant_id)
                .bind(now.to_rfc3339())
                .fetch_optional(&self.pool)
                .await
                .map_err(DomainError::from)?;

            let Some(row) = row else {
                return Ok(None);
            };
            let mut entry = map_entry_row(&row).map_err(DomainError::from)?;

            let wait_minutes = entry
                .created_at_datetime()
                .map(|created| (now - created).num_minutes().max(0))
                .unwrap_or(0);

            // The claim itself: a single conditional update guarded on the
            // entry still being pending. Losing the race means another
            // caller owns this entry; move on to the next candidate.
            let result = sqlx::query(
                "UPDATE queue_entries SET status = 'assigned', wait_time_minutes = ?
                 WHERE tenant_id = ? AND id = ? AND status = 'pending'",
            )
            .bind(wait_minutes)
            .bind(tenant_id)
            .bind(&entry.id)
            .execute(&self.pool)
            .await
            .map_err(DomainError::from)?;

            if result.rows_affected() > 0 {
                entry.status = QueueEntryStatus::Assigned;
                entry.wait_time_minutes = wait_minutes;
                return Ok(Some(entry));
            }
            tracing::debug!(
                "Lost claim race for entry {} (tenant {}); retrying",
                entry.id,
                tenant_id
            );
        }

        Err(DomainError::Conflict(format!(
            "Could not claim an entry for tenant {} after {} attempts",
            tenant_id, MAX_CLAIM_ATTEMPTS
        )))
    }

    async fn assign_entry(
        &self,
        tenant_id: &str,
        entry_id: &str,
        agent_id: &str,
        assigned_by: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<bool> {
        let result = sqlx::query(
            "UPDATE queue_entries
             SET status = 'assigned', assigned_to = ?, assigned_by = ?, assigned_at = ?
             WHERE tenant_id = ? AND id = ?
               AND (status = 'pending' OR (status = 'assigned' AND assigned_to IS NULL))",
        )
        .bind(agent_id)
        .bind(assigned_by)
        .bind(now.to_rfc3339())
        .bind(tenant_id)
        .bind(entry_id)
        .execute(&self.pool)
        .await
        .map_err(DomainError::from)?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_status(
        &self,
        tenant_id: &str,
        entry_id: &str,
        expected: QueueEntryStatus,
        new_status: QueueEntryStatus,
        completed_at: Option<String>,
        actual_processing_time: Option<i64>,
    ) -> DomainResult<bool> {
        let result = sqlx::query(
            "UPDATE queue_entries
             SET status = ?,
                 completed_at = COALESCE(?, completed_at),
                 actual_processing_time = COALESCE(?, actual_processing_time)
             WHERE tenant_id = ? AND id = ? AND status = ?",
        )
        .bind(new_status.to_string())
        .bind(completed_at)
        .bind(actual_processing_time)
        .bind(tenant_id)
        .bind(entry_id)
        .bind(expected.to_string())
        .execute(&self.pool)
        .await
        .map_err(DomainError::from)?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_priority(
        &self,
        tenant_id: &str,
        entry_id: &str,
        priority: QueuePriority,
    ) -> DomainResult<bool> {
        let result = sqlx::query(
            "UPDATE queue_entries SET priority = ?
             WHERE tenant_id = ? AND id = ? AND status = 'pending'",
        )
        .bind(priority.to_string())
        .bind(tenant_id)
        .bind(entry_id)
        .execute(&self.pool)
        .await
        .map_err(DomainError::from)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_entry(&self, tenant_id: &str, entry_id: &str) -> DomainResult<bool> {
        let result = sqlx::query("DELETE FROM queue_entries WHERE tenant_id = ? AND id = ?")
            .bind(tenant_id)
            .bind(entry_id)
            .execute(&self.pool)
            .await
            .map_err(DomainError::from)?;

        Ok(result.rows_affected() > 0)
    }

    async fn expire_pending_before(
        &self,
        tenant_id: &str,
        cutoff: DateTime<Utc>,
    ) -> DomainResult<u64> {
        // Guarded on 'pending': an entry claimed while the sweep runs has
        // already left pending and is not touched.
        let result = sqlx::query(
            "UPDATE queue_entries SET status = 'expired'
             WHERE tenant_id = ? AND status = 'pending' AND expires_at < ?",
        )
        .bind(tenant_id)
        .bind(cutoff.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(DomainError::from)?;

        Ok(result.rows_affected())
    }

    async fn requeue_stuck_assignments(
        &self,
        tenant_id: &str,
        cutoff: DateTime<Utc>,
    ) -> DomainResult<u64> {
        // Claims that were never confirmed carry no assigned_at; their age
        // falls back to created_at.
        let result = sqlx::query(
            "UPDATE queue_entries
             SET status = 'pending', assigned_to = NULL, assigned_by = NULL, assigned_at = NULL
             WHERE tenant_id = ? AND status IN ('assigned', 'processing')
               AND COALESCE(assigned_at, created_at) < ?",
        )
        .bind(tenant_id)
        .bind(cutoff.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(DomainError::from)?;

        Ok(result.rows_affected())
    }

    async fn count_live_entries(&self, tenant_id: &str) -> DomainResult<i64> {
        let row = with_read_retry("count_live_entries", || {
            sqlx::query(
                "SELECT COUNT(*) as count FROM queue_entries
                 WHERE tenant_id = ? AND status IN ('pending', 'assigned', 'processing')",
            )
            .bind(tenant_id)
            .fetch_one(&self.pool)
        })
        .await
        .map_err(DomainError::from)?;

        row.try_get("count").map_err(DomainError::from)
    }

    async fn count_by_status(
        &self,
        tenant_id: &str,
    ) -> DomainResult<Vec<(QueueEntryStatus, i64)>> {
        let rows = with_read_retry("count_by_status", || {
            sqlx::query(
                "SELECT status, COUNT(*) as count FROM queue_entries
                 WHERE tenant_id = ? GROUP BY status",
            )
            .bind(tenant_id)
            .fetch_all(&self.pool)
        })
        .await
        .map_err(DomainError::from)?;

        let mut counts = Vec::with_capacity(rows.len());
        for row in rows {
            let status: String = row.try_get("status").map_err(DomainError::from)?;
            let count: i64 = row.try_get("count").map_err(DomainError::from)?;
            counts.push((QueueEntryStatus::from(status), count));
        }
        Ok(counts)
    }

    async fn average_wait_time_pending(
        &self,
        tenant_id: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<f64> {
        let rows = with_read_retry("average_wait_time_pending", || {
            sqlx::query("SELECT created_at FROM queue_entries WHERE tenant_id = ? AND status = 'pending'")
                .bind(tenant_id)
                .fetch_all(&self.pool)
        })
        .await
        .map_err(DomainError::from)?;

        if rows.is_empty() {
            return Ok(0.0);
        }

        let mut total_minutes = 0i64;
        let mut counted = 0i64;
        for row in rows {
            let created_at: String = row.try_get("created_at").map_err(DomainError::from)?;
            if let Ok(created) = DateTime::parse_from_rfc3339(&created_at) {
                total_minutes += (now - created.with_timezone(&Utc)).num_minutes().max(0);
                counted += 1;
            }
        }

        if counted == 0 {
            return Ok(0.0);
        }
        Ok(total_minutes as f64 / counted as f64)
    }

    async fn average_processing_time_completed(&self, tenant_id: &str) -> DomainResult<f64> {
        let row = with_read_retry("average_processing_time_completed", || {
            sqlx::query(
                "SELECT AVG(actual_processing_time) as avg_minutes FROM queue_entries
                 WHERE tenant_id = ? AND status = 'completed' AND actual_processing_time IS NOT NULL",
            )
            .bind(tenant_id)
            .fetch_one(&self.pool)
        })
        .await
        .map_err(DomainError::from)?;

        let avg: Option<f64> = row.try_get("avg_minutes").ok().flatten();
        Ok(avg.unwrap_or(0.0))
    }

    async fn distinct_active_agents(&self, tenant_id: &str) -> DomainResult<i64> {
        let row = with_read_retry("distinct_active_agents", || {
            sqlx::query(
                "SELECT COUNT(DISTINCT assigned_to) as count FROM queue_entries
                 WHERE tenant_id = ? AND status IN ('assigned', 'processing')
                   AND assigned_to IS NOT NULL",
            )
            .bind(tenant_id)
            .fetch_one(&self.pool)
        })
        .await
        .map_err(DomainError::from)?;

        row.try_get("count").map_err(DomainError::from)
    }

    async fn list_entries(
        &self,
        tenant_id: &str,
        status: Option<QueueEntryStatus>,
        limit: i64,
        offset: i64,
    ) -> DomainResult<Vec<QueueEntry>> {
        let rows = match status {
            Some(status) => {
                let query = format!(
                    "SELECT {} FROM queue_entries WHERE tenant_id = ? AND status = ?
                     ORDER BY queue_position ASC LIMIT ? OFFSET ?",
                    ENTRY_COLUMNS
                );
                sqlx::query(&query)
                    .bind(tenant_id)
                    .bind(status.to_string())
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(&self.pool)
                    .await
            }
            None => {
                let query = format!(
                    "SELECT {} FROM queue_entries WHERE tenant_id = ?
                     ORDER BY queue_position ASC LIMIT ? OFFSET ?",
                    ENTRY_COLUMNS
                );
                sqlx::query(&query)
                    .bind(tenant_id)
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(DomainError::from)?;

        rows.iter()
            .map(|row| map_entry_row(row).map_err(DomainError::from))
            .collect()
    }

    async fn tenants_with_live_entries(&self) -> DomainResult<Vec<String>> {
        let rows = with_read_retry("tenants_with_live_entries", || {
            sqlx::query(
                "SELECT DISTINCT tenant_id FROM queue_entries
                 WHERE status IN ('pending', 'assigned', 'processing')",
            )
            .fetch_all(&self.pool)
        })
        .await
        .map_err(DomainError::from)?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("tenant_id").map_err(DomainError::from))
            .collect()
    }
}
