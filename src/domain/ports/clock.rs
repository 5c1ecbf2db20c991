use chrono::{DateTime, Utc};

/// Source of "now". Injected so scoring and expiration stay deterministic
/// under test.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
