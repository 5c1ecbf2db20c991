use crate::domain::entities::LeadSnapshot;
use crate::domain::errors::DomainResult;

/// Read-only view onto the lead CRUD service's records. The engine never
/// writes through this port.
#[async_trait::async_trait]
pub trait LeadRepository: Send + Sync {
    async fn get_lead(&self, lead_id: &str) -> DomainResult<Option<LeadSnapshot>>;
}
