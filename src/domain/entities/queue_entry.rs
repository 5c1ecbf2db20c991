use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueuePriority {
    Urgent,
    High,
    Normal,
    Low,
}

impl QueuePriority {
    /// Claim ordering rank. Lower rank is claimed first.
    pub fn rank(&self) -> i64 {
        match self {
            QueuePriority::Urgent => 0,
            QueuePriority::High => 1,
            QueuePriority::Normal => 2,
            QueuePriority::Low => 3,
        }
    }

    /// Derive a priority tier from a percentage score when the caller did
    /// not pick one explicitly.
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            QueuePriority::Urgent
        } else if score >= 60.0 {
            QueuePriority::High
        } else if score >= 40.0 {
            QueuePriority::Normal
        } else {
            QueuePriority::Low
        }
    }
}

impl fmt::Display for QueuePriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueuePriority::Urgent => write!(f, "urgent"),
            QueuePriority::High => write!(f, "high"),
            QueuePriority::Normal => write!(f, "normal"),
            QueuePriority::Low => write!(f, "low"),
        }
    }
}

// Convert from string (for SQLx)
impl From<String> for QueuePriority {
    fn from(s: String) -> Self {
        match s.as_str() {
            "urgent" => QueuePriority::Urgent,
            "high" => QueuePriority::High,
            "low" => QueuePriority::Low,
            _ => QueuePriority::Normal,
        }
    }
}

// Allow reading from DB as string
impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for QueuePriority {
    fn decode(value: sqlx::sqlite::SqliteValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Sqlite>>::decode(value)?;
        Ok(QueuePriority::from(s))
    }
}

impl sqlx::Type<sqlx::Sqlite> for QueuePriority {
    fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
        <String as sqlx::Type<sqlx::Sqlite>>::type_info()
    }
}

impl sqlx::Type<sqlx::Any> for QueuePriority {
    fn type_info() -> sqlx::any::AnyTypeInfo {
        <String as sqlx::Type<sqlx::Any>>::type_info()
    }

    fn compatible(ty: &sqlx::any::AnyTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Any>>::compatible(ty)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Any> for QueuePriority {
    fn decode(value: sqlx::any::AnyValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Any>>::decode(value)?;
        Ok(QueuePriority::from(s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueEntryStatus {
    Pending,
    Assigned,
    Processing,
    Completed,
    Cancelled,
    Expired,
}

impl QueueEntryStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            QueueEntryStatus::Completed | QueueEntryStatus::Cancelled | QueueEntryStatus::Expired
        )
    }

    /// The entry lifecycle: pending -> assigned -> processing -> completed,
    /// cancellation from any non-terminal state, expiry from pending only.
    pub fn can_transition_to(&self, next: QueueEntryStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match (self, next) {
            (QueueEntryStatus::Pending, QueueEntryStatus::Assigned) => true,
            (QueueEntryStatus::Pending, QueueEntryStatus::Expired) => true,
            (QueueEntryStatus::Assigned, QueueEntryStatus::Processing) => true,
            (QueueEntryStatus::Processing, QueueEntryStatus::Completed) => true,
            (_, QueueEntryStatus::Cancelled) => true,
            _ => false,
        }
    }
}

impl fmt::Display for QueueEntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueEntryStatus::Pending => write!(f, "pending"),
            QueueEntryStatus::Assigned => write!(f, "assigned"),
            QueueEntryStatus::Processing => write!(f, "processing"),
            QueueEntryStatus::Completed => write!(f, "completed"),
            QueueEntryStatus::Cancelled => write!(f, "cancelled"),
            QueueEntryStatus::Expired => write!(f, "expired"),
        }
    }
}

impl From<String> for QueueEntryStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "assigned" => QueueEntryStatus::Assigned,
            "processing" => QueueEntryStatus::Processing,
            "completed" => QueueEntryStatus::Completed,
            "cancelled" => QueueEntryStatus::Cancelled,
            "expired" => QueueEntryStatus::Expired,
            _ => QueueEntryStatus::Pending,
        }
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for QueueEntryStatus {
    fn decode(value: sqlx::sqlite::SqliteValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Sqlite>>::decode(value)?;
        Ok(QueueEntryStatus::from(s))
    }
}

impl sqlx::Type<sqlx::Sqlite> for QueueEntryStatus {
    fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
        <String as sqlx::Type<sqlx::Sqlite>>::type_info()
    }
}

impl sqlx::Type<sqlx::Any> for QueueEntryStatus {
    fn type_info() -> sqlx::any::AnyTypeInfo {
        <String as sqlx::Type<sqlx::Any>>::type_info()
    }

    fn compatible(ty: &sqlx::any::AnyTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Any>>::compatible(ty)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Any> for QueueEntryStatus {
    fn decode(value: sqlx::any::AnyValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Any>>::decode(value)?;
        Ok(QueueEntryStatus::from(s))
    }
}

/// A lead waiting in (or worked out of) a tenant's assignment queue.
/// Owned exclusively by the queue service; `tenant_id` never changes and
/// `queue_position` is never reused, even after deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueEntry {
    pub id: String,
    pub tenant_id: String,
    pub lead_id: String,
    pub priority: QueuePriority,
    pub status: QueueEntryStatus,
    pub score: f64,
    pub queue_position: i64,
    pub wait_time_minutes: i64,
    pub estimated_processing_time: Option<i64>,
    pub assignment_reason: Option<String>,
    pub notes: Option<String>,
    pub tags: Vec<String>,
    pub created_at: String,
    pub expires_at: String,
    pub assigned_to: Option<String>,
    pub assigned_by: Option<String>,
    pub assigned_at: Option<String>,
    pub completed_at: Option<String>,
    pub actual_processing_time: Option<i64>,
}

// Helper methods for timestamps (converting String <-> DateTime<Utc>)
impl QueueEntry {
    pub fn created_at_datetime(&self) -> Option<DateTime<Utc>> {
        parse_rfc3339(&self.created_at)
    }

    pub fn expires_at_datetime(&self) -> Option<DateTime<Utc>> {
        parse_rfc3339(&self.expires_at)
    }

    pub fn assigned_at_datetime(&self) -> Option<DateTime<Utc>> {
        self.assigned_at.as_deref().and_then(parse_rfc3339)
    }

    pub fn completed_at_datetime(&self) -> Option<DateTime<Utc>> {
        self.completed_at.as_deref().and_then(parse_rfc3339)
    }
}

fn parse_rfc3339(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Caller-supplied fields for enqueueing a lead. Score and priority are
/// optional; the service backfills them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddToQueueRequest {
    pub lead_id: String,
    pub priority: Option<QueuePriority>,
    pub score: Option<f64>,
    pub estimated_processing_time: Option<i64>,
    pub assignment_reason: Option<String>,
    pub notes: Option<String>,
    pub tags: Vec<String>,
}

impl AddToQueueRequest {
    pub fn for_lead(lead_id: &str) -> Self {
        Self {
            lead_id: lead_id.to_string(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueHealth {
    Healthy,
    Warning,
    Critical,
}

impl QueueHealth {
    pub fn from_utilization(utilization_pct: f64) -> Self {
        if utilization_pct > 90.0 {
            QueueHealth::Critical
        } else if utilization_pct > 75.0 {
            QueueHealth::Warning
        } else {
            QueueHealth::Healthy
        }
    }
}

impl fmt::Display for QueueHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueHealth::Healthy => write!(f, "healthy"),
            QueueHealth::Warning => write!(f, "warning"),
            QueueHealth::Critical => write!(f, "critical"),
        }
    }
}

/// Point-in-time health report for one tenant's queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueStatistics {
    pub tenant_id: String,
    /// Live entries only (pending, assigned, processing).
    pub total_entries: i64,
    pub pending_entries: i64,
    pub assigned_entries: i64,
    pub processing_entries: i64,
    pub completed_entries: i64,
    pub cancelled_entries: i64,
    pub expired_entries: i64,
    pub average_wait_time_minutes: f64,
    pub average_processing_time_minutes: f64,
    pub queue_utilization_pct: f64,
    pub health: QueueHealth,
    pub active_agents: i64,
}
