pub mod queue_service;
pub mod scoring_service;

pub use queue_service::QueueService;
pub use scoring_service::{calculate_score, ScoringService};
