use crate::domain::entities::QueueConfiguration;
use crate::domain::errors::DomainResult;

#[async_trait::async_trait]
pub trait QueueConfigRepository: Send + Sync {
    async fn get_configuration(&self, tenant_id: &str) -> DomainResult<Option<QueueConfiguration>>;

    async fn upsert_configuration(&self, config: &QueueConfiguration) -> DomainResult<()>;
}
