use crate::domain::entities::{PriorityWeights, QueueConfiguration};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::queue_config_repository::QueueConfigRepository;
use crate::infrastructure::persistence::{with_read_retry, Database};
use chrono::Utc;
use sqlx::Row;

#[async_trait::async_trait]
impl QueueConfigRepository for Database {
    async fn get_configuration(&self, tenant_id: &str) -> DomainResult<Option<QueueConfiguration>> {
        let row = with_read_retry("get_queue_configuration", || {
            sqlx::query(
                "SELECT tenant_id, max_queue_size, max_wait_time_minutes,
                        assignment_timeout_minutes, queue_entry_expiration_hours,
                        max_leads_per_agent, weight_urgent, weight_high, weight_normal,
                        weight_low, alert_threshold_pct, scaling_threshold_pct
                 FROM queue_configurations WHERE tenant_id = ?",
            )
            .bind(tenant_id)
            .fetch_optional(&self.pool)
        })
        .await
        .map_err(DomainError::from)?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(QueueConfiguration {
            tenant_id: row.try_get("tenant_id").map_err(DomainError::from)?,
            max_queue_size: row.try_get("max_queue_size").map_err(DomainError::from)?,
            max_wait_time_minutes: row
                .try_get("max_wait_time_minutes")
                .map_err(DomainError::from)?,
            assignment_timeout_minutes: row
                .try_get("assignment_timeout_minutes")
                .map_err(DomainError::from)?,
            queue_entry_expiration_hours: row
                .try_get("queue_entry_expiration_hours")
                .map_err(DomainError::from)?,
            max_leads_per_agent: row
                .try_get("max_leads_per_agent")
                .map_err(DomainError::from)?,
            priority_weights: PriorityWeights {
                urgent: row.try_get("weight_urgent").map_err(DomainError::from)?,
                high: row.try_get("weight_high").map_err(DomainError::from)?,
                normal: row.try_get("weight_normal").map_err(DomainError::from)?,
                low: row.try_get("weight_low").map_err(DomainError::from)?,
            },
            alert_threshold_pct: row
                .try_get("alert_threshold_pct")
                .map_err(DomainError::from)?,
            scaling_threshold_pct: row
                .try_get("scaling_threshold_pct")
                .map_err(DomainError::from)?,
        }))
    }

    async fn upsert_configuration(&self, config: &QueueConfiguration) -> DomainResult<()> {
        sqlx::query(
            "INSERT INTO queue_configurations (tenant_id, max_queue_size, max_wait_time_minutes,
                 assignment_timeout_minutes, queue_entry_expiration_hours, max_leads_per_agent,
                 weight_urgent, weight_high, weight_normal, weight_low,
                 alert_threshold_pct, scaling_threshold_pct, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(tenant_id) DO UPDATE SET
                 max_queue_size = excluded.max_queue_size,
                 max_wait_time_minutes = excluded.max_wait_time_minutes,
                 assignment_timeout_minutes = excluded.assignment_timeout_minutes,
                 queue_entry_expiration_hours = excluded.queue_entry_expiration_hours,
                 max_leads_per_agent = excluded.max_leads_per_agent,
                 weight_urgent = excluded.weight_urgent,
                 weight_high = excluded.weight_high,
                 weight_normal = excluded.weight_normal,
                 weight_low = excluded.weight_low,
                 alert_threshold_pct = excluded.alert_threshold_pct,
                 scaling_threshold_pct = excluded.scaling_threshold_pct,
                 updated_at = excluded.updated_at",
        )
        .bind(&config.tenant_id)
        .bind(config.max_queue_size)
        .bind(config.max_wait_time_minutes)
        .bind(config.assignment_timeout_minutes)
        .bind(config.queue_entry_expiration_hours)
        .bind(config.max_leads_per_agent)
        .bind(config.priority_weights.urgent)
        .bind(config.priority_weights.high)
        .bind(config.priority_weights.normal)
        .bind(config.priority_weights.low)
        .bind(config.alert_threshold_pct)
        .bind(config.scaling_threshold_pct)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(DomainError::from)?;

        Ok(())
    }
}
