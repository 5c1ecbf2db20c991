use serde::{Deserialize, Serialize};
use std::fmt;

/// The fixed set of scoring inputs. The engine dispatches on this enum
/// with an exhaustive match, so adding a factor means the compiler walks
/// you through every place that must handle it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorKind {
    PropertyPreferenceMatch,
    LocationSpecificity,
    BudgetAlignment,
    FinancialQualification,
    EngagementLevel,
    SourceQuality,
    Urgency,
    ResponseTime,
    MarketSophistication,
}

impl FactorKind {
    pub const ALL: [FactorKind; 9] = [
        FactorKind::PropertyPreferenceMatch,
        FactorKind::LocationSpecificity,
        FactorKind::BudgetAlignment,
        FactorKind::FinancialQualification,
        FactorKind::EngagementLevel,
        FactorKind::SourceQuality,
        FactorKind::Urgency,
        FactorKind::ResponseTime,
        FactorKind::MarketSophistication,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FactorKind::PropertyPreferenceMatch => "property_preference_match",
            FactorKind::LocationSpecificity => "location_specificity",
            FactorKind::BudgetAlignment => "budget_alignment",
            FactorKind::FinancialQualification => "financial_qualification",
            FactorKind::EngagementLevel => "engagement_level",
            FactorKind::SourceQuality => "source_quality",
            FactorKind::Urgency => "urgency",
            FactorKind::ResponseTime => "response_time",
            FactorKind::MarketSophistication => "market_sophistication",
        }
    }

    pub fn default_category(&self) -> FactorCategory {
        match self {
            FactorKind::PropertyPreferenceMatch => FactorCategory::Demographic,
            FactorKind::LocationSpecificity => FactorCategory::Demographic,
            FactorKind::BudgetAlignment => FactorCategory::Financial,
            FactorKind::FinancialQualification => FactorCategory::Financial,
            FactorKind::EngagementLevel => FactorCategory::Engagement,
            FactorKind::SourceQuality => FactorCategory::Source,
            FactorKind::Urgency => FactorCategory::Behavioral,
            FactorKind::ResponseTime => FactorCategory::Engagement,
            FactorKind::MarketSophistication => FactorCategory::Behavioral,
        }
    }
}

impl fmt::Display for FactorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorCategory {
    Demographic,
    Behavioral,
    Financial,
    Engagement,
    Source,
}

impl fmt::Display for FactorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FactorCategory::Demographic => "demographic",
            FactorCategory::Behavioral => "behavioral",
            FactorCategory::Financial => "financial",
            FactorCategory::Engagement => "engagement",
            FactorCategory::Source => "source",
        };
        write!(f, "{}", s)
    }
}

/// One weighted input to the scoring formula.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringFactor {
    pub kind: FactorKind,
    pub weight: f64,
    pub max_value: f64,
    pub description: String,
    pub category: FactorCategory,
}

impl ScoringFactor {
    pub fn new(kind: FactorKind, weight: f64, description: &str) -> Self {
        Self {
            kind,
            weight,
            max_value: 100.0,
            description: description.to_string(),
            category: kind.default_category(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringAlgorithm {
    Weighted,
    Ml,
    Hybrid,
}

/// Percentage cut lines between score tiers. Must be strictly descending.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoreThresholds {
    pub hot: f64,
    pub warm: f64,
    pub cold: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreCategory {
    Hot,
    Warm,
    Cold,
}

impl fmt::Display for ScoreCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreCategory::Hot => write!(f, "hot"),
            ScoreCategory::Warm => write!(f, "warm"),
            ScoreCategory::Cold => write!(f, "cold"),
        }
    }
}

/// The active scoring recipe for a tenant. Replaced wholesale on update,
/// never mutated field-by-field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfiguration {
    pub factors: Vec<ScoringFactor>,
    pub algorithm: ScoringAlgorithm,
    pub min_score: f64,
    pub max_score: f64,
    pub thresholds: ScoreThresholds,
}

impl Default for ScoringConfiguration {
    fn default() -> Self {
        Self {
            factors: vec![
                ScoringFactor::new(
                    FactorKind::BudgetAlignment,
                    20.0,
                    "How tightly the stated budget range is pinned down",
                ),
                ScoringFactor::new(
                    FactorKind::FinancialQualification,
                    15.0,
                    "Pre-approval, proof of funds and lender on file",
                ),
                ScoringFactor::new(
                    FactorKind::EngagementLevel,
                    15.0,
                    "Communication volume over the last 30 days",
                ),
                ScoringFactor::new(
                    FactorKind::PropertyPreferenceMatch,
                    10.0,
                    "Completeness of stated property preferences",
                ),
                ScoringFactor::new(
                    FactorKind::SourceQuality,
                    10.0,
                    "Historical quality of the acquisition channel",
                ),
                ScoringFactor::new(
                    FactorKind::Urgency,
                    10.0,
                    "Move-in timeline and pipeline stage",
                ),
                ScoringFactor::new(
                    FactorKind::ResponseTime,
                    10.0,
                    "How quickly the lead answers outreach",
                ),
                ScoringFactor::new(
                    FactorKind::LocationSpecificity,
                    5.0,
                    "How narrowly the search area is defined",
                ),
                ScoringFactor::new(
                    FactorKind::MarketSophistication,
                    5.0,
                    "Viewing/offer history and vocabulary signals",
                ),
            ],
            algorithm: ScoringAlgorithm::Weighted,
            min_score: 0.0,
            max_score: 100.0,
            thresholds: ScoreThresholds {
                hot: 80.0,
                warm: 60.0,
                cold: 40.0,
            },
        }
    }
}

const WEIGHT_SUM_TOLERANCE: f64 = 1e-3;

impl ScoringConfiguration {
    /// Validate the whole configuration. Callers reject the update and keep
    /// the previous configuration active when this fails.
    pub fn validate(&self) -> Result<(), String> {
        if self.algorithm != ScoringAlgorithm::Weighted {
            return Err("Only the weighted scoring algorithm is supported".to_string());
        }
        if self.factors.is_empty() {
            return Err("Configuration must define at least one factor".to_string());
        }
        let mut seen: Vec<FactorKind> = Vec::with_capacity(self.factors.len());
        for factor in &self.factors {
            if seen.contains(&factor.kind) {
                return Err(format!("Duplicate factor: {}", factor.kind));
            }
            seen.push(factor.kind);
            if !(0.0..=100.0).contains(&factor.weight) {
                return Err(format!(
                    "Factor {} weight must be between 0 and 100, got {}",
                    factor.kind, factor.weight
                ));
            }
            if factor.max_value <= 0.0 {
                return Err(format!(
                    "Factor {} max_value must be positive, got {}",
                    factor.kind, factor.max_value
                ));
            }
        }
        let weight_sum: f64 = self.factors.iter().map(|f| f.weight).sum();
        if (weight_sum - 100.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(format!(
                "Total factor weights must equal 100, got {}",
                weight_sum
            ));
        }
        if self.min_score >= self.max_score {
            return Err(format!(
                "min_score ({}) must be below max_score ({})",
                self.min_score, self.max_score
            ));
        }
        let t = &self.thresholds;
        if !(t.hot > t.warm && t.warm > t.cold) {
            return Err(format!(
                "Thresholds must be strictly descending (hot > warm > cold), got {} / {} / {}",
                t.hot, t.warm, t.cold
            ));
        }
        Ok(())
    }

    pub fn category_for(&self, percentage_score: f64) -> ScoreCategory {
        if percentage_score >= self.thresholds.hot {
            ScoreCategory::Hot
        } else if percentage_score >= self.thresholds.warm {
            ScoreCategory::Warm
        } else {
            ScoreCategory::Cold
        }
    }
}

/// Partial update; unset fields keep their current value. The merged result
/// is validated before it replaces the stored configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoringConfigurationUpdate {
    pub factors: Option<Vec<ScoringFactor>>,
    pub algorithm: Option<ScoringAlgorithm>,
    pub min_score: Option<f64>,
    pub max_score: Option<f64>,
    pub thresholds: Option<ScoreThresholds>,
}

impl ScoringConfigurationUpdate {
    pub fn apply_to(&self, current: &ScoringConfiguration) -> ScoringConfiguration {
        ScoringConfiguration {
            factors: self.factors.clone().unwrap_or_else(|| current.factors.clone()),
            algorithm: self.algorithm.unwrap_or(current.algorithm),
            min_score: self.min_score.unwrap_or(current.min_score),
            max_score: self.max_score.unwrap_or(current.max_score),
            thresholds: self.thresholds.unwrap_or(current.thresholds),
        }
    }
}

/// Per-factor contribution, produced fresh on every scoring call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactorScore {
    pub kind: FactorKind,
    pub name: String,
    pub score: f64,
    pub max_value: f64,
    pub weight: f64,
    pub weighted_score: f64,
    pub explanation: String,
    pub category: FactorCategory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringResult {
    pub lead_id: String,
    pub total_score: f64,
    pub max_possible_score: f64,
    pub percentage_score: f64,
    pub category: ScoreCategory,
    pub factor_scores: Vec<FactorScore>,
    pub explanation: String,
    pub confidence: f64,
    pub last_updated: String,
}
