use leadrouter::domain::entities::{AddToQueueRequest, QueueConfiguration, QueueEntryStatus, QueuePriority};
use std::sync::Arc;

mod helpers;
use helpers::*;

const TENANT: &str = "tenant-sweep";

fn request(lead_id: &str) -> AddToQueueRequest {
    AddToQueueRequest {
        lead_id: lead_id.to_string(),
        priority: Some(QueuePriority::Normal),
        score: Some(50.0),
        ..Default::default()
    }
}

#[tokio::test]
async fn sweep_expires_only_overdue_pending_entries() {
    let test_db = setup_test_db().await;
    let clock = Arc::new(TestClock::at("2026-06-01T12:00:00+00:00"));
    let (_, queue_service) = build_services(&test_db.db(), clock.clone());

    // Old entry: will be 73h past creation at sweep time.
    let old = queue_service
        .add_to_queue(TENANT, request("lead-old"))
        .await
        .expect("Failed to enqueue");

    // Fresh entry: only 10h old at sweep time.
    clock.advance_hours(63);
    let fresh = queue_service
        .add_to_queue(TENANT, request("lead-fresh"))
        .await
        .expect("Failed to enqueue");

    clock.advance_hours(10);
    let removed = queue_service
        .expire_sweep(TENANT)
        .await
        .expect("Sweep failed");
    assert_eq!(removed, 1);

    let old_entry = queue_service
        .get_entry(TENANT, &old.id)
        .await
        .expect("Failed to read entry");
    assert_eq!(old_entry.status, QueueEntryStatus::Expired);

    let fresh_entry = queue_service
        .get_entry(TENANT, &fresh.id)
        .await
        .expect("Failed to read entry");
    assert_eq!(fresh_entry.status, QueueEntryStatus::Pending);
}

#[tokio::test]
async fn sweep_never_touches_claimed_or_working_entries() {
    let test_db = setup_test_db().await;
    let clock = Arc::new(TestClock::at("2026-06-01T12:00:00+00:00"));
    let (_, queue_service) = build_services(&test_db.db(), clock.clone());

    let worked = queue_service
        .add_to_queue(TENANT, request("lead-worked"))
        .await
        .expect("Failed to enqueue");
    let waiting = queue_service
        .add_to_queue(TENANT, request("lead-waiting"))
        .await
        .expect("Failed to enqueue");

    queue_service
        .assign(TENANT, &worked.id, "agent-1", "agent-1")
        .await
        .expect("Failed to assign");
    queue_service
        .update_status(TENANT, &worked.id, QueueEntryStatus::Processing)
        .await
        .expect("Failed to start processing");

    // Way past every expiry.
    clock.advance_hours(100);
    let removed = queue_service
        .expire_sweep(TENANT)
        .await
        .expect("Sweep failed");
    assert_eq!(removed, 1, "only the pending entry may expire");

    let worked_entry = queue_service
        .get_entry(TENANT, &worked.id)
        .await
        .expect("Failed to read entry");
    assert_eq!(
        worked_entry.status,
        QueueEntryStatus::Processing,
        "in-flight work is untouched regardless of expires_at"
    );

    let waiting_entry = queue_service
        .get_entry(TENANT, &waiting.id)
        .await
        .expect("Failed to read entry");
    assert_eq!(waiting_entry.status, QueueEntryStatus::Expired);
}

#[tokio::test]
async fn sweep_on_an_empty_queue_is_a_no_op() {
    let test_db = setup_test_db().await;
    let clock = Arc::new(TestClock::at("2026-06-01T12:00:00+00:00"));
    let (_, queue_service) = build_services(&test_db.db(), clock);

    let removed = queue_service
        .expire_sweep(TENANT)
        .await
        .expect("Sweep failed");
    assert_eq!(removed, 0);
}

#[tokio::test]
async fn stuck_assignments_are_requeued_after_timeout() {
    let test_db = setup_test_db().await;
    let clock = Arc::new(TestClock::at("2026-06-01T12:00:00+00:00"));
    let (_, queue_service) = build_services(&test_db.db(), clock.clone());

    let entry = queue_service
        .add_to_queue(TENANT, request("lead-stuck"))
        .await
        .expect("Failed to enqueue");
    queue_service
        .assign(TENANT, &entry.id, "agent-gone", "agent-gone")
        .await
        .expect("Failed to assign");

    // Default assignment timeout is 30 minutes.
    clock.advance_minutes(45);
    let requeued = queue_service
        .requeue_stuck(TENANT)
        .await
        .expect("Requeue sweep failed");
    assert_eq!(requeued, 1);

    let entry = queue_service
        .get_entry(TENANT, &entry.id)
        .await
        .expect("Failed to read entry");
    assert_eq!(entry.status, QueueEntryStatus::Pending);
    assert!(entry.assigned_to.is_none());
    assert!(entry.assigned_at.is_none());

    // And it is claimable again.
    let claimed = queue_service
        .claim_next(TENANT)
        .await
        .expect("Claim failed")
        .expect("requeued entry must be claimable");
    assert_eq!(claimed.id, entry.id);
}

#[tokio::test]
async fn fresh_assignments_survive_the_requeue_sweep() {
    let test_db = setup_test_db().await;
    let clock = Arc::new(TestClock::at("2026-06-01T12:00:00+00:00"));
    let (_, queue_service) = build_services(&test_db.db(), clock.clone());

    let entry = queue_service
        .add_to_queue(TENANT, request("lead-active"))
        .await
        .expect("Failed to enqueue");
    queue_service
        .assign(TENANT, &entry.id, "agent-1", "agent-1")
        .await
        .expect("Failed to assign");

    clock.advance_minutes(10);
    let requeued = queue_service
        .requeue_stuck(TENANT)
        .await
        .expect("Requeue sweep failed");
    assert_eq!(requeued, 0, "a 10-minute-old assignment is not stuck");
}

#[tokio::test]
async fn zero_timeout_disables_the_requeue_sweep() {
    let test_db = setup_test_db().await;
    let clock = Arc::new(TestClock::at("2026-06-01T12:00:00+00:00"));
    let (_, queue_service) = build_services(&test_db.db(), clock.clone());

    let mut config = QueueConfiguration::defaults_for(TENANT);
    config.assignment_timeout_minutes = 0;
    queue_service
        .update_queue_configuration(config)
        .await
        .expect("Failed to update configuration");

    let entry = queue_service
        .add_to_queue(TENANT, request("lead-parked"))
        .await
        .expect("Failed to enqueue");
    queue_service
        .assign(TENANT, &entry.id, "agent-1", "agent-1")
        .await
        .expect("Failed to assign");

    clock.advance_hours(10);
    let requeued = queue_service
        .requeue_stuck(TENANT)
        .await
        .expect("Requeue sweep failed");
    assert_eq!(requeued, 0, "a zero timeout disables the watchdog");
}
