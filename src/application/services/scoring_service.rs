use crate::domain::entities::{
    CommunicationDirection, FactorKind, FactorScore, LeadSnapshot, LeadSource, LeadStatus,
    ScoringConfiguration, ScoringConfigurationUpdate, ScoringResult,
};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::{
    clock::Clock, lead_repository::LeadRepository,
    scoring_config_repository::ScoringConfigRepository,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Vocabulary that marks a lead as someone who already knows the process.
const SOPHISTICATION_KEYWORDS: [&str; 6] = [
    "pre-approval",
    "comps",
    "escrow",
    "inspection",
    "contingency",
    "appraisal",
];

/// Deterministic weighted-factor scoring over the lead read model, plus
/// per-tenant configuration management. Scoring never mutates a lead or a
/// queue entry; it only computes and returns a result.
#[derive(Clone)]
pub struct ScoringService {
    lead_repo: Arc<dyn LeadRepository>,
    config_repo: Arc<dyn ScoringConfigRepository>,
    clock: Arc<dyn Clock>,
    // Per-tenant cache, invalidated explicitly on update. The store owns the
    // configuration; this is only a read-through copy.
    config_cache: Arc<RwLock<HashMap<String, Arc<ScoringConfiguration>>>>,
}

impl ScoringService {
    pub fn new(
        lead_repo: Arc<dyn LeadRepository>,
        config_repo: Arc<dyn ScoringConfigRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            lead_repo,
            config_repo,
            clock,
            config_cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Active configuration for a tenant; a lazily materialized default when
    /// none has been stored yet.
    pub async fn get_configuration(&self, tenant_id: &str) -> DomainResult<ScoringConfiguration> {
        if let Some(cached) = self.config_cache.read().await.get(tenant_id) {
            return Ok(cached.as_ref().clone());
        }

        let config = self
            .config_repo
            .get_configuration(tenant_id)
            .await?
            .unwrap_or_default();

        self.config_cache
            .write()
            .await
            .insert(tenant_id.to_string(), Arc::new(config.clone()));

        Ok(config)
    }

    /// Merge a partial update over the current configuration, validate the
    /// result and replace the stored configuration wholesale. A rejected
    /// update leaves the old configuration active.
    pub async fn update_configuration(
        &self,
        tenant_id: &str,
        update: ScoringConfigurationUpdate,
    ) -> DomainResult<ScoringConfiguration> {
        let current = self.get_configuration(tenant_id).await?;
        let merged = update.apply_to(&current);
        merged.validate().map_err(DomainError::Validation)?;

        self.config_repo
            .upsert_configuration(tenant_id, &merged)
            .await?;

        // Invalidate after the write so no reader sees the new configuration
        // before it is durable.
        self.config_cache
            .write()
            .await
            .insert(tenant_id.to_string(), Arc::new(merged.clone()));

        tracing::info!(
            "Updated scoring configuration for tenant {} ({} factors)",
            tenant_id,
            merged.factors.len()
        );
        Ok(merged)
    }

    /// Score one lead by id under the tenant's active configuration.
    pub async fn score_lead(&self, tenant_id: &str, lead_id: &str) -> DomainResult<ScoringResult> {
        let config = self.get_configuration(tenant_id).await?;
        self.score_lead_with_config(lead_id, &config).await
    }

    /// Score one lead under a caller-supplied configuration, e.g. to preview
    /// a configuration change before storing it.
    pub async fn score_lead_with_config(
        &self,
        lead_id: &str,
        config: &ScoringConfiguration,
    ) -> DomainResult<ScoringResult> {
        let lead = self
            .lead_repo
            .get_lead(lead_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Lead {} not found", lead_id)))?;

        Ok(calculate_score(&lead, config, self.clock.now()))
    }

    /// Score many leads concurrently. Leads are independent, so one failure
    /// is logged and omitted rather than aborting the batch.
    pub async fn batch_score(
        &self,
        tenant_id: &str,
        lead_ids: &[String],
    ) -> DomainResult<HashMap<String, ScoringResult>> {
        let config = self.get_configuration(tenant_id).await?;
        let now = self.clock.now();

        let score_futures = lead_ids.iter().map(|lead_id| {
            let lead_repo = self.lead_repo.clone();
            let config = config.clone();
            async move {
                match lead_repo.get_lead(lead_id).await {
                    Ok(Some(lead)) => Some((lead_id.clone(), calculate_score(&lead, &config, now))),
                    Ok(None) => {
                        tracing::warn!("Skipping unknown lead {} in batch scoring", lead_id);
                        None
                    }
                    Err(e) => {
                        tracing::error!("Failed to load lead {} for batch scoring: {}", lead_id, e);
                        None
                    }
                }
            }
        });

        let results = futures::future::join_all(score_futures).await;
        Ok(results.into_iter().flatten().collect())
    }
}

/// Pure scoring function: identical `(lead, config, now)` always yields an
/// identical result. Factors with missing input data score 0 instead of
/// failing, so a completely empty lead still scores cleanly.
pub fn calculate_score(
    lead: &LeadSnapshot,
    config: &ScoringConfiguration,
    now: DateTime<Utc>,
) -> ScoringResult {
    let mut factor_scores: Vec<FactorScore> = Vec::with_capacity(config.factors.len());

    for factor in &config.factors {
        let (fraction, explanation) = factor_fraction(lead, factor.kind, now);
        let fraction = fraction.clamp(0.0, 1.0);
        factor_scores.push(FactorScore {
            kind: factor.kind,
            name: factor.kind.name().to_string(),
            score: fraction * factor.max_value,
            max_value: factor.max_value,
            weight: factor.weight,
            weighted_score: fraction * factor.weight,
            explanation,
            category: factor.category,
        });
    }

    let total_score: f64 = factor_scores.iter().map(|f| f.weighted_score).sum();
    let max_possible_score: f64 = factor_scores.iter().map(|f| f.weight).sum();
    let percentage_score = if max_possible_score > 0.0 {
        total_score / max_possible_score * 100.0
    } else {
        0.0
    };

    let category = config.category_for(percentage_score);
    let confidence = confidence_for(lead, &factor_scores, now);
    let explanation = build_explanation(percentage_score, category, &factor_scores);

    ScoringResult {
        lead_id: lead.id.clone(),
        total_score,
        max_possible_score,
        percentage_score,
        category,
        factor_scores,
        explanation,
        confidence,
        last_updated: now.to_rfc3339(),
    }
}

/// Confidence starts at 100 and drops with sparse data and lead youth:
/// half a point per percent of zero-scoring factors, 20 points under a week
/// of history, 10 under a month.
fn confidence_for(lead: &LeadSnapshot, factor_scores: &[FactorScore], now: DateTime<Utc>) -> f64 {
    let mut confidence = 100.0;

    if !factor_scores.is_empty() {
        let zero_count = factor_scores.iter().filter(|f| f.score == 0.0).count();
        let zero_pct = zero_count as f64 / factor_scores.len() as f64 * 100.0;
        confidence -= 0.5 * zero_pct;
    }

    if let Some(created_at) = lead.created_at_datetime() {
        let age_days = (now - created_at).num_days();
        if age_days < 7 {
            confidence -= 20.0;
        } else if age_days < 30 {
            confidence -= 10.0;
        }
    }

    confidence.max(0.0)
}

fn build_explanation(
    percentage_score: f64,
    category: crate::domain::entities::ScoreCategory,
    factor_scores: &[FactorScore],
) -> String {
    let mut ranked: Vec<&FactorScore> = factor_scores.iter().collect();
    ranked.sort_by(|a, b| {
        b.weighted_score
            .partial_cmp(&a.weighted_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let top: Vec<String> = ranked
        .iter()
        .take(3)
        .map(|f| format!("{} ({:.1} of {:.0})", f.name, f.weighted_score, f.weight))
        .collect();

    format!(
        "Lead scores {:.1}% ({}). Strongest signals: {}",
        percentage_score,
        category,
        top.join(", ")
    )
}

/// Exhaustive dispatch over the factor set. Every arm is a pure function of
/// the lead snapshot; each returns a fraction of the factor's max value and
/// a short explanation.
fn factor_fraction(lead: &LeadSnapshot, kind: FactorKind, now: DateTime<Utc>) -> (f64, String) {
    match kind {
        FactorKind::PropertyPreferenceMatch => property_preference_match(lead),
        FactorKind::LocationSpecificity => location_specificity(lead),
        FactorKind::BudgetAlignment => budget_alignment(lead),
        FactorKind::FinancialQualification => financial_qualification(lead),
        FactorKind::EngagementLevel => engagement_level(lead, now),
        FactorKind::SourceQuality => source_quality(lead),
        FactorKind::Urgency => urgency(lead, now),
        FactorKind::ResponseTime => response_time(lead),
        FactorKind::MarketSophistication => market_sophistication(lead),
    }
}

fn property_preference_match(lead: &LeadSnapshot) -> (f64, String) {
    let Some(prefs) = &lead.property_preferences else {
        return (0.0, "No property preferences on file".to_string());
    };

    let mut fraction = 0.0;
    let mut parts: Vec<&str> = Vec::new();
    if prefs.property_type.is_some() {
        fraction += 0.3;
        parts.push("property type");
    }
    if prefs.bedrooms.is_some() {
        fraction += 0.2;
        parts.push("bedrooms");
    }
    if prefs.bathrooms.is_some() {
        fraction += 0.2;
        parts.push("bathrooms");
    }
    if !prefs.desired_features.is_empty() {
        fraction += 0.3;
        parts.push("desired features");
    }

    if parts.is_empty() {
        (0.0, "Property preferences are empty".to_string())
    } else {
        (fraction, format!("Preferences specify {}", parts.join(", ")))
    }
}

fn location_specificity(lead: &LeadSnapshot) -> (f64, String) {
    let count = lead
        .property_preferences
        .as_ref()
        .map(|p| p.preferred_locations.len())
        .unwrap_or(0);

    match count {
        0 => (0.0, "No preferred locations on file".to_string()),
        1..=2 => (1.0, format!("Narrow search area ({} locations)", count)),
        3..=5 => (0.7, format!("Moderate search area ({} locations)", count)),
        _ => (0.4, format!("Broad search area ({} locations)", count)),
    }
}

fn budget_alignment(lead: &LeadSnapshot) -> (f64, String) {
    let Some(budget) = &lead.budget else {
        return (0.0, "No budget on file".to_string());
    };

    if budget.max <= 0.0 || budget.max <= budget.min {
        return (0.3, "Budget has a single usable bound".to_string());
    }

    let spread = (budget.max - budget.min) / budget.max;
    let (fraction, adjective) = if spread <= 0.1 {
        (1.0, "very tight")
    } else if spread <= 0.25 {
        (0.8, "tight")
    } else if spread <= 0.5 {
        (0.6, "moderate")
    } else {
        (0.4, "wide")
    };
    (
        fraction,
        format!(
            "Budget range {:.0}-{:.0} is {} ({:.0}% spread)",
            budget.min,
            budget.max,
            adjective,
            spread * 100.0
        ),
    )
}

fn financial_qualification(lead: &LeadSnapshot) -> (f64, String) {
    let Some(fin) = &lead.financial else {
        return (0.0, "No financial profile on file".to_string());
    };

    if fin.pre_approved {
        (1.0, "Pre-approved for financing".to_string())
    } else if fin.proof_of_funds {
        (0.9, "Proof of funds provided".to_string())
    } else if fin.lender.is_some() {
        (0.6, "Working with a lender".to_string())
    } else if fin.annual_income.is_some() {
        (0.4, "Income stated, not yet qualified".to_string())
    } else {
        (0.0, "Financial profile is empty".to_string())
    }
}

fn engagement_level(lead: &LeadSnapshot, now: DateTime<Utc>) -> (f64, String) {
    let cutoff = now - chrono::Duration::days(30);
    let recent = lead
        .communications
        .iter()
        .filter(|c| c.occurred_at_datetime().is_some_and(|t| t >= cutoff))
        .count();

    let fraction = match recent {
        0 => 0.0,
        1 => 0.3,
        2..=4 => 0.5,
        5..=9 => 0.8,
        _ => 1.0,
    };
    (
        fraction,
        format!("{} communications in the last 30 days", recent),
    )
}

fn source_quality(lead: &LeadSnapshot) -> (f64, String) {
    let fraction = match lead.source {
        LeadSource::Referral => 0.95,
        LeadSource::WalkIn => 0.75,
        LeadSource::Website => 0.7,
        LeadSource::Social => 0.6,
        LeadSource::Advertisement => 0.5,
        LeadSource::Other => 0.4,
        LeadSource::ColdCall => 0.3,
        LeadSource::PurchasedList => 0.2,
    };
    (fraction, format!("Acquired via {}", lead.source))
}

fn urgency(lead: &LeadSnapshot, now: DateTime<Utc>) -> (f64, String) {
    let stage_floor = matches!(lead.status, LeadStatus::Viewing | LeadStatus::Negotiating);

    let from_date = lead.move_in_date_datetime().map(|move_in| {
        let days = (move_in - now).num_days();
        let fraction: f64 = if days <= 30 {
            1.0
        } else if days <= 60 {
            0.8
        } else if days <= 90 {
            0.6
        } else {
            0.3
        };
        (fraction, days)
    });

    match (from_date, stage_floor) {
        (Some((fraction, days)), floored) => {
            let fraction = if floored { fraction.max(0.5) } else { fraction };
            (fraction, format!("Move-in target in {} days", days))
        }
        (None, true) => (
            0.5,
            format!("No move-in date, but lead is {}", lead.status),
        ),
        (None, false) => (0.0, "No timeline signal on file".to_string()),
    }
}

fn response_time(lead: &LeadSnapshot) -> (f64, String) {
    let latencies: Vec<i64> = lead
        .communications
        .iter()
        .filter(|c| c.direction == CommunicationDirection::Outbound)
        .filter_map(|c| {
            let sent = c.occurred_at_datetime()?;
            let responded = c.responded_at_datetime()?;
            let minutes = (responded - sent).num_minutes();
            (minutes >= 0).then_some(minutes)
        })
        .collect();

    if latencies.is_empty() {
        return (0.0, "No response history yet".to_string());
    }

    let mean_minutes = latencies.iter().sum::<i64>() as f64 / latencies.len() as f64;
    let fraction = if mean_minutes <= 60.0 {
        1.0
    } else if mean_minutes <= 240.0 {
        0.8
    } else if mean_minutes <= 1440.0 {
        0.6
    } else if mean_minutes <= 4320.0 {
        0.3
    } else {
        0.1
    };
    (
        fraction,
        format!("Responds in {:.0} minutes on average", mean_minutes),
    )
}

fn market_sophistication(lead: &LeadSnapshot) -> (f64, String) {
    let mut fraction: f64 = 0.0;
    let mut signals: Vec<String> = Vec::new();

    if lead.viewings_count >= 5 {
        fraction += 0.4;
        signals.push(format!("{} viewings", lead.viewings_count));
    } else if lead.viewings_count >= 1 {
        fraction += 0.2;
        signals.push(format!("{} viewings", lead.viewings_count));
    }

    if lead.offers_count >= 1 {
        fraction += 0.4;
        signals.push(format!("{} offers made", lead.offers_count));
    }

    let keyword_hit = lead.communications.iter().any(|c| {
        c.notes.as_deref().is_some_and(|notes| {
            let lower = notes.to_lowercase();
            SOPHISTICATION_KEYWORDS.iter().any(|kw| lower.contains(kw))
        })
    });
    if keyword_hit {
        fraction += 0.2;
        signals.push("market vocabulary in communications".to_string());
    }

    if signals.is_empty() {
        (0.0, "No viewing, offer or vocabulary signals".to_string())
    } else {
        (fraction.min(1.0), signals.join(", "))
    }
}
