pub mod clock;
pub mod lead_repository;
pub mod queue_config_repository;
pub mod queue_repository;
pub mod scoring_config_repository;
