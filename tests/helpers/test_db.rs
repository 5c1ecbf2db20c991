use leadrouter::application::services::{QueueService, ScoringService};
use leadrouter::domain::ports::clock::Clock;
use leadrouter::infrastructure::persistence::Database;
use std::sync::Arc;
use uuid::Uuid;

/// File-backed sqlite database, unique per test so tests can run in
/// parallel. The file is removed when the handle drops.
pub struct TestDb {
    db: Database,
    path: String,
}

impl TestDb {
    pub fn db(&self) -> Database {
        self.db.clone()
    }
}

impl Drop for TestDb {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
        let _ = std::fs::remove_file(format!("{}-wal", self.path));
        let _ = std::fs::remove_file(format!("{}-shm", self.path));
    }
}

pub async fn setup_test_db() -> TestDb {
    // Install drivers for AnyPool (required for tests)
    sqlx::any::install_default_drivers();

    let path = format!("test_{}.db", Uuid::new_v4());
    let db_url = format!("sqlite://{}?mode=rwc", path);

    let db = Database::connect(&db_url)
        .await
        .expect("Failed to connect to test database");

    db.run_migrations()
        .await
        .expect("Failed to run migrations on test database");

    TestDb { db, path }
}

/// Wire the engine services over a test database with an injectable clock.
pub fn build_services(db: &Database, clock: Arc<dyn Clock>) -> (ScoringService, QueueService) {
    let db = Arc::new(db.clone());
    let scoring_service = ScoringService::new(db.clone(), db.clone(), clock.clone());
    let queue_service = QueueService::new(db.clone(), db.clone(), scoring_service.clone(), clock);
    (scoring_service, queue_service)
}
