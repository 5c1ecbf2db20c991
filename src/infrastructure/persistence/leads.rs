use crate::domain::entities::{
    BudgetRange, CommunicationRecord, FinancialProfile, LeadSnapshot, LeadSource, LeadStatus,
    PropertyPreferences,
};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::lead_repository::LeadRepository;
use crate::infrastructure::persistence::{with_read_retry, Database};
use sqlx::Row;

/// Read-only adapter over the lead CRUD service's tables. Scoring consumes
/// this snapshot; nothing here ever writes.
#[async_trait::async_trait]
impl LeadRepository for Database {
    async fn get_lead(&self, lead_id: &str) -> DomainResult<Option<LeadSnapshot>> {
        let row = with_read_retry("get_lead", || {
            sqlx::query(
                "SELECT id, tenant_id, status, source, property_type, bedrooms, bathrooms,
                        preferred_locations, desired_features, budget_min, budget_max,
                        pre_approved, lender, proof_of_funds, annual_income, move_in_date,
                        viewings_count, offers_count, created_at, last_contact_at
                 FROM leads WHERE id = ?",
            )
            .bind(lead_id)
            .fetch_optional(&self.pool)
        })
        .await
        .map_err(DomainError::from)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let status: String = row.try_get("status").map_err(DomainError::from)?;
        let source: String = row.try_get("source").map_err(DomainError::from)?;

        let preferred_locations = decode_string_list(row.try_get("preferred_locations").ok());
        let desired_features = decode_string_list(row.try_get("desired_features").ok());
        let property_type: Option<String> = row.try_get("property_type").ok();
        let bedrooms: Option<i64> = row.try_get("bedrooms").ok();
        let bathrooms: Option<i64> = row.try_get("bathrooms").ok();

        let has_preferences = property_type.is_some()
            || bedrooms.is_some()
            || bathrooms.is_some()
            || !preferred_locations.is_empty()
            || !desired_features.is_empty();
        let property_preferences = has_preferences.then(|| PropertyPreferences {
            property_type,
            bedrooms,
            bathrooms,
            preferred_locations,
            desired_features,
        });

        let budget_min: Option<f64> = row.try_get("budget_min").ok().flatten();
        let budget_max: Option<f64> = row.try_get("budget_max").ok().flatten();
        let budget = match (budget_min, budget_max) {
            (Some(min), Some(max)) => Some(BudgetRange { min, max }),
            (Some(min), None) => Some(BudgetRange { min, max: min }),
            (None, Some(max)) => Some(BudgetRange { min: max, max }),
            (None, None) => None,
        };

        let pre_approved: Option<i64> = row.try_get("pre_approved").ok().flatten();
        let proof_of_funds: Option<i64> = row.try_get("proof_of_funds").ok().flatten();
        let lender: Option<String> = row.try_get("lender").ok().flatten();
        let annual_income: Option<f64> = row.try_get("annual_income").ok().flatten();

        let has_financial = pre_approved.is_some()
            || proof_of_funds.is_some()
            || lender.is_some()
            || annual_income.is_some();
        let financial = has_financial.then(|| FinancialProfile {
            pre_approved: pre_approved.unwrap_or(0) != 0,
            lender,
            proof_of_funds: proof_of_funds.unwrap_or(0) != 0,
            annual_income,
        });

        let id: String = row.try_get("id").map_err(DomainError::from)?;
        let communications = self.load_communications(&id).await?;

        Ok(Some(LeadSnapshot {
            id,
            tenant_id: row.try_get("tenant_id").map_err(DomainError::from)?,
            status: LeadStatus::from(status),
            source: LeadSource::from(source),
            property_preferences,
            budget,
            financial,
            move_in_date: row.try_get("move_in_date").ok().flatten(),
            communications,
            viewings_count: row.try_get("viewings_count").unwrap_or(0),
            offers_count: row.try_get("offers_count").unwrap_or(0),
            created_at: row.try_get("created_at").map_err(DomainError::from)?,
            last_contact_at: row.try_get("last_contact_at").ok().flatten(),
        }))
    }
}

impl Database {
    async fn load_communications(&self, lead_id: &str) -> DomainResult<Vec<CommunicationRecord>> {
        let rows = with_read_retry("load_communications", || {
            sqlx::query(
                "SELECT direction, channel, occurred_at, responded_at, notes
                 FROM lead_communications WHERE lead_id = ?
                 ORDER BY occurred_at ASC",
            )
            .bind(lead_id)
            .fetch_all(&self.pool)
        })
        .await
        .map_err(DomainError::from)?;

        let mut communications = Vec::with_capacity(rows.len());
        for row in rows {
            let direction: String = row.try_get("direction").map_err(DomainError::from)?;
            communications.push(CommunicationRecord {
                direction: direction.into(),
                channel: row.try_get("channel").map_err(DomainError::from)?,
                occurred_at: row.try_get("occurred_at").map_err(DomainError::from)?,
                responded_at: row.try_get("responded_at").ok().flatten(),
                notes: row.try_get("notes").ok().flatten(),
            });
        }
        Ok(communications)
    }
}

fn decode_string_list(json: Option<String>) -> Vec<String> {
    json.as_deref()
        .and_then(|s| serde_json::from_str(s).ok())
        .unwrap_or_default()
}
