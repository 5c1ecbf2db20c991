use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a lead entered the pipeline. Source quality feeds directly into
/// scoring, so the set is closed rather than free-form text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadSource {
    Referral,
    WalkIn,
    Website,
    Social,
    Advertisement,
    ColdCall,
    PurchasedList,
    Other,
}

impl fmt::Display for LeadSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LeadSource::Referral => "referral",
            LeadSource::WalkIn => "walk_in",
            LeadSource::Website => "website",
            LeadSource::Social => "social",
            LeadSource::Advertisement => "advertisement",
            LeadSource::ColdCall => "cold_call",
            LeadSource::PurchasedList => "purchased_list",
            LeadSource::Other => "other",
        };
        write!(f, "{}", s)
    }
}

// Convert from string (for SQLx)
impl From<String> for LeadSource {
    fn from(s: String) -> Self {
        match s.as_str() {
            "referral" => LeadSource::Referral,
            "walk_in" => LeadSource::WalkIn,
            "website" => LeadSource::Website,
            "social" => LeadSource::Social,
            "advertisement" => LeadSource::Advertisement,
            "cold_call" => LeadSource::ColdCall,
            "purchased_list" => LeadSource::PurchasedList,
            _ => LeadSource::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    New,
    Contacted,
    Qualified,
    Viewing,
    Negotiating,
    Converted,
    Lost,
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LeadStatus::New => "new",
            LeadStatus::Contacted => "contacted",
            LeadStatus::Qualified => "qualified",
            LeadStatus::Viewing => "viewing",
            LeadStatus::Negotiating => "negotiating",
            LeadStatus::Converted => "converted",
            LeadStatus::Lost => "lost",
        };
        write!(f, "{}", s)
    }
}

impl From<String> for LeadStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "contacted" => LeadStatus::Contacted,
            "qualified" => LeadStatus::Qualified,
            "viewing" => LeadStatus::Viewing,
            "negotiating" => LeadStatus::Negotiating,
            "converted" => LeadStatus::Converted,
            "lost" => LeadStatus::Lost,
            _ => LeadStatus::New,
        }
    }
}

/// What the lead is looking for.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PropertyPreferences {
    pub property_type: Option<String>,
    pub bedrooms: Option<i64>,
    pub bathrooms: Option<i64>,
    pub preferred_locations: Vec<String>,
    pub desired_features: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FinancialProfile {
    pub pre_approved: bool,
    pub lender: Option<String>,
    pub proof_of_funds: bool,
    pub annual_income: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommunicationDirection {
    Inbound,
    Outbound,
}

impl From<String> for CommunicationDirection {
    fn from(s: String) -> Self {
        match s.as_str() {
            "outbound" => CommunicationDirection::Outbound,
            _ => CommunicationDirection::Inbound,
        }
    }
}

/// One logged touch point with the lead (call, SMS, email).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunicationRecord {
    pub direction: CommunicationDirection,
    pub channel: String,
    pub occurred_at: String,
    /// When the lead replied to an outbound message, if they did.
    pub responded_at: Option<String>,
    pub notes: Option<String>,
}

impl CommunicationRecord {
    pub fn occurred_at_datetime(&self) -> Option<DateTime<Utc>> {
        parse_rfc3339(&self.occurred_at)
    }

    pub fn responded_at_datetime(&self) -> Option<DateTime<Utc>> {
        self.responded_at.as_deref().and_then(parse_rfc3339)
    }
}

/// Read model handed to the scoring engine by the lead CRUD service.
/// The engine never writes any of this back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadSnapshot {
    pub id: String,
    pub tenant_id: String,
    pub status: LeadStatus,
    pub source: LeadSource,
    pub property_preferences: Option<PropertyPreferences>,
    pub budget: Option<BudgetRange>,
    pub financial: Option<FinancialProfile>,
    pub move_in_date: Option<String>,
    pub communications: Vec<CommunicationRecord>,
    pub viewings_count: i64,
    pub offers_count: i64,
    pub created_at: String,
    pub last_contact_at: Option<String>,
}

impl LeadSnapshot {
    pub fn created_at_datetime(&self) -> Option<DateTime<Utc>> {
        parse_rfc3339(&self.created_at)
    }

    pub fn move_in_date_datetime(&self) -> Option<DateTime<Utc>> {
        self.move_in_date.as_deref().and_then(parse_rfc3339)
    }
}

fn parse_rfc3339(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
