use serde::{Deserialize, Serialize};

/// Relative weights per priority tier. Carried as configuration surface for
/// schedulers that want weighted draining; claim ordering itself is strict
/// priority-then-FIFO.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PriorityWeights {
    pub urgent: f64,
    pub high: f64,
    pub normal: f64,
    pub low: f64,
}

impl Default for PriorityWeights {
    fn default() -> Self {
        Self {
            urgent: 1000.0,
            high: 100.0,
            normal: 10.0,
            low: 1.0,
        }
    }
}

/// Per-tenant queue tunables. Lazily created with defaults on first access
/// and replaced wholesale by an administrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfiguration {
    pub tenant_id: String,
    pub max_queue_size: i64,
    pub max_wait_time_minutes: i64,
    /// 0 disables the stuck-assignment requeue sweep.
    pub assignment_timeout_minutes: i64,
    pub queue_entry_expiration_hours: i64,
    pub max_leads_per_agent: i64,
    pub priority_weights: PriorityWeights,
    pub alert_threshold_pct: f64,
    pub scaling_threshold_pct: f64,
}

impl QueueConfiguration {
    pub fn defaults_for(tenant_id: &str) -> Self {
        Self {
            tenant_id: tenant_id.to_string(),
            max_queue_size: 500,
            max_wait_time_minutes: 1440,
            assignment_timeout_minutes: 30,
            queue_entry_expiration_hours: 72,
            max_leads_per_agent: 10,
            priority_weights: PriorityWeights::default(),
            alert_threshold_pct: 75.0,
            scaling_threshold_pct: 90.0,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.tenant_id.trim().is_empty() {
            return Err("tenant_id must not be empty".to_string());
        }
        if self.max_queue_size <= 0 {
            return Err(format!(
                "max_queue_size must be positive, got {}",
                self.max_queue_size
            ));
        }
        if self.max_wait_time_minutes <= 0 {
            return Err(format!(
                "max_wait_time_minutes must be positive, got {}",
                self.max_wait_time_minutes
            ));
        }
        if self.assignment_timeout_minutes < 0 {
            return Err(format!(
                "assignment_timeout_minutes must not be negative, got {}",
                self.assignment_timeout_minutes
            ));
        }
        if self.queue_entry_expiration_hours <= 0 {
            return Err(format!(
                "queue_entry_expiration_hours must be positive, got {}",
                self.queue_entry_expiration_hours
            ));
        }
        if self.max_leads_per_agent <= 0 {
            return Err(format!(
                "max_leads_per_agent must be positive, got {}",
                self.max_leads_per_agent
            ));
        }
        let w = &self.priority_weights;
        if w.urgent <= 0.0 || w.high <= 0.0 || w.normal <= 0.0 || w.low <= 0.0 {
            return Err("priority weights must all be positive".to_string());
        }
        if self.alert_threshold_pct >= self.scaling_threshold_pct {
            return Err(format!(
                "alert_threshold_pct ({}) must be below scaling_threshold_pct ({})",
                self.alert_threshold_pct, self.scaling_threshold_pct
            ));
        }
        Ok(())
    }
}
