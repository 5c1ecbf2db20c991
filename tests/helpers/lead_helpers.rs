use leadrouter::infrastructure::persistence::Database;
use uuid::Uuid;

/// Insert a lead with strong signals everywhere: referral source, tight
/// budget, pre-approved, narrow preferences. Returns the lead id.
pub async fn create_full_lead(db: &Database, tenant_id: &str, created_at: &str) -> String {
    let lead_id = Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO leads (id, tenant_id, status, source, property_type, bedrooms, bathrooms,
             preferred_locations, desired_features, budget_min, budget_max, pre_approved,
             lender, proof_of_funds, annual_income, move_in_date, viewings_count, offers_count,
             created_at, last_contact_at)
         VALUES (?, ?, 'viewing', 'referral', 'condo', 2, 2,
             '[\"downtown\"]', '[\"parking\",\"balcony\"]', 400000, 500000, 1,
             'Acme Mortgage', 1, 140000, NULL, 3, 1,
             ?, NULL)",
    )
    .bind(&lead_id)
    .bind(tenant_id)
    .bind(created_at)
    .execute(db.pool())
    .await
    .expect("Failed to insert full lead");
    lead_id
}

/// Insert a lead with every optional field absent.
pub async fn create_bare_lead(db: &Database, tenant_id: &str, created_at: &str) -> String {
    let lead_id = Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO leads (id, tenant_id, status, source, viewings_count, offers_count, created_at)
         VALUES (?, ?, 'new', 'other', 0, 0, ?)",
    )
    .bind(&lead_id)
    .bind(tenant_id)
    .bind(created_at)
    .execute(db.pool())
    .await
    .expect("Failed to insert bare lead");
    lead_id
}

/// Insert a lead carrying only a budget range and a source, for the
/// two-factor scoring example.
pub async fn create_budget_lead(
    db: &Database,
    tenant_id: &str,
    budget_min: f64,
    budget_max: f64,
    source: &str,
    created_at: &str,
) -> String {
    let lead_id = Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO leads (id, tenant_id, status, source, budget_min, budget_max,
             viewings_count, offers_count, created_at)
         VALUES (?, ?, 'new', ?, ?, ?, 0, 0, ?)",
    )
    .bind(&lead_id)
    .bind(tenant_id)
    .bind(source)
    .bind(budget_min)
    .bind(budget_max)
    .bind(created_at)
    .execute(db.pool())
    .await
    .expect("Failed to insert budget lead");
    lead_id
}

pub async fn insert_communication(
    db: &Database,
    lead_id: &str,
    direction: &str,
    occurred_at: &str,
    responded_at: Option<&str>,
    notes: Option<&str>,
) {
    sqlx::query(
        "INSERT INTO lead_communications (id, lead_id, direction, channel, occurred_at,
             responded_at, notes)
         VALUES (?, ?, ?, 'sms', ?, ?, ?)",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(lead_id)
    .bind(direction)
    .bind(occurred_at)
    .bind(responded_at)
    .bind(notes)
    .execute(db.pool())
    .await
    .expect("Failed to insert communication");
}
