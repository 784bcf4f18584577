//! Embedding database queries

use anyhow::Result;
use chrono::Utc;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

/// A raw stored vector, the durable source of truth for search
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoredVector {
    pub id: Uuid,
    pub vector: Json<Vec<f64>>,
}

/// Persist a raw embedding vector keyed to a scenario.
/// Returns the generated embedding id.
pub async fn insert_embedding(
    pool: &PgPool,
    scenario_id: Option<Uuid>,
    vector: &[f64],
) -> Result<Uuid> {
    let id = Uuid::new_v4();

    sqlx::query(
        r#"
        INSERT INTO embeddings (id, scenario_id, dim, vector, created_at)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(id)
    .bind(scenario_id)
    .bind(vector.len() as i32)
    .bind(Json(vector))
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(id)
}

/// Load every stored vector of the given dimensionality
pub async fn fetch_by_dim(pool: &PgPool, dim: usize) -> Result<Vec<StoredVector>> {
    let rows = sqlx::query_as::<_, StoredVector>(
        r#"
        SELECT id, vector
        FROM embeddings
        WHERE dim = $1
        ORDER BY created_at
        "#,
    )
    .bind(dim as i32)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
