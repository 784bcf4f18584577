//! Scenario database queries

use anyhow::Result;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::types::Scenario;

/// Persist a scenario document. Returns the generated scenario id.
pub async fn insert_scenario(pool: &PgPool, scenario: &Scenario) -> Result<Uuid> {
    let id = Uuid::new_v4();
    let document = serde_json::to_value(scenario)?;

    sqlx::query(
        r#"
        INSERT INTO scenarios (id, name, document, created_at)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(id)
    .bind(&scenario.name)
    .bind(document)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(id)
}
