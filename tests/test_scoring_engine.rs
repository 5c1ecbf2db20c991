use leadrouter::domain::entities::{
    FactorKind, ScoreCategory, ScoreThresholds, ScoringConfigurationUpdate, ScoringFactor,
};
use leadrouter::DomainError;
use std::sync::Arc;

mod helpers;
use helpers::*;

const TENANT: &str = "tenant-scoring";

#[tokio::test]
async fn scoring_unknown_lead_is_not_found() {
    let test_db = setup_test_db().await;
    let clock = Arc::new(TestClock::at("2026-06-01T12:00:00+00:00"));
    let (scoring_service, _) = build_services(&test_db.db(), clock);

    let err = scoring_service
        .score_lead(TENANT, "no-such-lead")
        .await
        .expect_err("unknown lead must be NotFound");
    assert!(matches!(err, DomainError::NotFound(_)));
}

#[tokio::test]
async fn qualified_referral_outranks_empty_lead() {
    let test_db = setup_test_db().await;
    let db = test_db.db();
    let clock = Arc::new(TestClock::at("2026-06-01T12:00:00+00:00"));
    let (scoring_service, _) = build_services(&db, clock);

    let strong = create_full_lead(&db, TENANT, "2026-03-01T00:00:00+00:00").await;
    let weak = create_bare_lead(&db, TENANT, "2026-03-01T00:00:00+00:00").await;

    let strong_result = scoring_service
        .score_lead(TENANT, &strong)
        .await
        .expect("Failed to score full lead");
    let weak_result = scoring_service
        .score_lead(TENANT, &weak)
        .await
        .expect("Failed to score bare lead");

    assert!(strong_result.percentage_score > weak_result.percentage_score);
    assert!(strong_result.confidence > weak_result.confidence);
}

#[tokio::test]
async fn empty_lead_scores_within_bounds_without_error() {
    let test_db = setup_test_db().await;
    let db = test_db.db();
    let clock = Arc::new(TestClock::at("2026-06-01T12:00:00+00:00"));
    let (scoring_service, _) = build_services(&db, clock);

    // Created yesterday: young lead, so confidence also takes the age hit.
    let lead_id = create_bare_lead(&db, TENANT, "2026-05-31T12:00:00+00:00").await;

    let result = scoring_service
        .score_lead(TENANT, &lead_id)
        .await
        .expect("an empty lead must still score");

    assert!((0.0..=100.0).contains(&result.percentage_score));
    assert_eq!(result.category, ScoreCategory::Cold);
    assert!(result.confidence < 60.0, "confidence {} should reflect sparse data and youth", result.confidence);
    assert_eq!(result.factor_scores.len(), 9);
}

#[tokio::test]
async fn two_factor_example_scores_hot_at_86() {
    let test_db = setup_test_db().await;
    let db = test_db.db();
    let clock = Arc::new(TestClock::at("2026-06-01T12:00:00+00:00"));
    let (scoring_service, _) = build_services(&db, clock);

    let update = ScoringConfigurationUpdate {
        factors: Some(vec![
            ScoringFactor::new(FactorKind::BudgetAlignment, 60.0, "budget"),
            ScoringFactor::new(FactorKind::SourceQuality, 40.0, "source"),
        ]),
        thresholds: Some(ScoreThresholds {
            hot: 80.0,
            warm: 60.0,
            cold: 40.0,
        }),
        ..Default::default()
    };
    scoring_service
        .update_configuration(TENANT, update)
        .await
        .expect("valid update must be accepted");

    // 400k-500k is a 20% spread (0.8 of 60) and referral looks up to 0.95
    // of 40: 48 + 38 = 86.
    let lead_id = create_budget_lead(
        &db,
        TENANT,
        400_000.0,
        500_000.0,
        "referral",
        "2026-03-01T00:00:00+00:00",
    )
    .await;

    let result = scoring_service
        .score_lead(TENANT, &lead_id)
        .await
        .expect("Failed to score lead");

    assert!(
        (result.percentage_score - 86.0).abs() < 0.5,
        "expected about 86, got {}",
        result.percentage_score
    );
    assert_eq!(result.category, ScoreCategory::Hot);
    assert_eq!(result.max_possible_score, 100.0);
}

#[tokio::test]
async fn scoring_is_deterministic_under_a_fixed_clock() {
    let test_db = setup_test_db().await;
    let db = test_db.db();
    let clock = Arc::new(TestClock::at("2026-06-01T12:00:00+00:00"));
    let (scoring_service, _) = build_services(&db, clock);

    let lead_id = create_full_lead(&db, TENANT, "2026-03-01T00:00:00+00:00").await;

    let first = scoring_service
        .score_lead(TENANT, &lead_id)
        .await
        .expect("Failed to score lead");
    let second = scoring_service
        .score_lead(TENANT, &lead_id)
        .await
        .expect("Failed to score lead");

    assert_eq!(first.percentage_score, second.percentage_score);
    assert_eq!(first.total_score, second.total_score);
    assert_eq!(first.confidence, second.confidence);
    assert_eq!(first.explanation, second.explanation);
}

#[tokio::test]
async fn explanation_cites_the_top_three_factors() {
    let test_db = setup_test_db().await;
    let db = test_db.db();
    let clock = Arc::new(TestClock::at("2026-06-01T12:00:00+00:00"));
    let (scoring_service, _) = build_services(&db, clock);

    let lead_id = create_full_lead(&db, TENANT, "2026-03-01T00:00:00+00:00").await;
    let result = scoring_service
        .score_lead(TENANT, &lead_id)
        .await
        .expect("Failed to score lead");

    let mut ranked = result.factor_scores.clone();
    ranked.sort_by(|a, b| b.weighted_score.partial_cmp(&a.weighted_score).unwrap());
    for factor in ranked.iter().take(3) {
        assert!(
            result.explanation.contains(&factor.name),
            "explanation should mention {}: {}",
            factor.name,
            result.explanation
        );
    }
}

#[tokio::test]
async fn batch_scoring_skips_failures_without_aborting() {
    let test_db = setup_test_db().await;
    let db = test_db.db();
    let clock = Arc::new(TestClock::at("2026-06-01T12:00:00+00:00"));
    let (scoring_service, _) = build_services(&db, clock);

    let known_a = create_full_lead(&db, TENANT, "2026-03-01T00:00:00+00:00").await;
    let known_b = create_bare_lead(&db, TENANT, "2026-03-01T00:00:00+00:00").await;

    let ids = vec![
        known_a.clone(),
        "missing-lead".to_string(),
        known_b.clone(),
    ];
    let results = scoring_service
        .batch_score(TENANT, &ids)
        .await
        .expect("batch scoring must not abort on a missing lead");

    assert_eq!(results.len(), 2);
    assert!(results.contains_key(&known_a));
    assert!(results.contains_key(&known_b));
    assert!(!results.contains_key("missing-lead"));
}

#[tokio::test]
async fn engagement_and_response_signals_move_the_score() {
    let test_db = setup_test_db().await;
    let db = test_db.db();
    let clock = Arc::new(TestClock::at("2026-06-01T12:00:00+00:00"));
    let (scoring_service, _) = build_services(&db, clock);

    let quiet = create_bare_lead(&db, TENANT, "2026-03-01T00:00:00+00:00").await;
    let chatty = create_bare_lead(&db, TENANT, "2026-03-01T00:00:00+00:00").await;
    // Five recent touches, one answered within the hour.
    for day in 20..25 {
        insert_communication(
            &db,
            &chatty,
            "inbound",
            &format!("2026-05-{:02}T09:00:00+00:00", day),
            None,
            None,
        )
        .await;
    }
    insert_communication(
        &db,
        &chatty,
        "outbound",
        "2026-05-26T09:00:00+00:00",
        Some("2026-05-26T09:30:00+00:00"),
        Some("Asked for comps before the viewing"),
    )
    .await;

    let quiet_result = scoring_service
        .score_lead(TENANT, &quiet)
        .await
        .expect("Failed to score quiet lead");
    let chatty_result = scoring_service
        .score_lead(TENANT, &chatty)
        .await
        .expect("Failed to score chatty lead");

    assert!(chatty_result.percentage_score > quiet_result.percentage_score);

    let factor = |kind: FactorKind, r: &leadrouter::domain::entities::ScoringResult| {
        r.factor_scores
            .iter()
            .find(|f| f.kind == kind)
            .map(|f| f.score)
            .unwrap_or(0.0)
    };
    assert!(factor(FactorKind::EngagementLevel, &chatty_result) > 0.0);
    assert!(factor(FactorKind::ResponseTime, &chatty_result) > 0.0);
    assert!(factor(FactorKind::MarketSophistication, &chatty_result) > 0.0);
    assert_eq!(factor(FactorKind::EngagementLevel, &quiet_result), 0.0);
}
