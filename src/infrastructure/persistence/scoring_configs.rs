use crate::domain::entities::ScoringConfiguration;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::scoring_config_repository::ScoringConfigRepository;
use crate::infrastructure::persistence::{with_read_retry, Database};
use chrono::Utc;
use sqlx::Row;

#[async_trait::async_trait]
impl ScoringConfigRepository for Database {
    async fn get_configuration(
        &self,
        tenant_id: &str,
    ) -> DomainResult<Option<ScoringConfiguration>> {
        let row = with_read_retry("get_scoring_configuration", || {
            sqlx::query("SELECT config FROM scoring_configurations WHERE tenant_id = ?")
                .bind(tenant_id)
                .fetch_optional(&self.pool)
        })
        .await
        .map_err(DomainError::from)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let config_json: String = row.try_get("config").map_err(DomainError::from)?;
        let config = serde_json::from_str(&config_json).map_err(|e| {
            DomainError::Storage(format!(
                "Stored scoring configuration for tenant {} is unreadable: {}",
                tenant_id, e
            ))
        })?;
        Ok(Some(config))
    }

    async fn upsert_configuration(
        &self,
        tenant_id: &str,
        config: &ScoringConfiguration,
    ) -> DomainResult<()> {
        let config_json = serde_json::to_string(config)
            .map_err(|e| DomainError::Storage(format!("Failed to encode configuration: {}", e)))?;

        sqlx::query(
            "INSERT INTO scoring_configurations (tenant_id, config, updated_at)
             VALUES (?, ?, ?)
             ON CONFLICT(tenant_id) DO UPDATE SET
                 config = excluded.config,
                 updated_at = excluded.updated_at",
        )
        .bind(tenant_id)
        .bind(&config_json)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(DomainError::from)?;

        Ok(())
    }
}
