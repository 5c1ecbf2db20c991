use crate::domain::ports::clock::Clock;
use chrono::{DateTime, Utc};

#[derive(Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
