use crate::domain::entities::ScoringConfiguration;
use crate::domain::errors::DomainResult;

#[async_trait::async_trait]
pub trait ScoringConfigRepository: Send + Sync {
    async fn get_configuration(&self, tenant_id: &str)
        -> DomainResult<Option<ScoringConfiguration>>;

    async fn upsert_configuration(
        &self,
        tenant_id: &str,
        config: &ScoringConfiguration,
    ) -> DomainResult<()>;
}
