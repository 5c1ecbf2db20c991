use crate::application::services::{QueueService, ScoringService};
use crate::infrastructure::clock::SystemClock;
use crate::infrastructure::persistence::Database;
use std::sync::Arc;

/// Fully wired engine services over one database connection pool.
#[derive(Clone)]
pub struct AppState {
    pub scoring_service: ScoringService,
    pub queue_service: QueueService,
}

pub fn build_app_state(db: Database) -> AppState {
    let db = Arc::new(db);
    let clock = Arc::new(SystemClock);

    let scoring_service = ScoringService::new(db.clone(), db.clone(), clock.clone());
    let queue_service =
        QueueService::new(db.clone(), db.clone(), scoring_service.clone(), clock);

    AppState {
        scoring_service,
        queue_service,
    }
}
