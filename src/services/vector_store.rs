//! Vector store
//!
//! Persists scenarios and raw embedding vectors and answers
//! nearest-neighbor queries by cosine distance. The primary search path
//! uses a lazily created per-dimension pgvector table; the raw `embeddings`
//! table remains the source of truth, and an exact in-process fallback is
//! always available, correct even if no index was ever built.
//!
//! The store also owns the in-memory scenario registry. Concurrent reads
//! proceed freely; writes are mutually exclusive per store instance.

use std::collections::HashMap;

use parking_lot::RwLock;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::db::queries;
use crate::defaults::DEFAULT_SEARCH_K;
use crate::error::WorkerError;
use crate::types::{Scenario, SearchHit};

pub struct VectorStore {
    pool: Option<PgPool>,
    scenarios: RwLock<HashMap<String, Scenario>>,
}

impl VectorStore {
    pub fn new(pool: Option<PgPool>) -> Self {
        Self {
            pool,
            scenarios: RwLock::new(HashMap::new()),
        }
    }

    fn pool(&self) -> Result<&PgPool, WorkerError> {
        self.pool.as_ref().ok_or(WorkerError::StorageUnavailable)
    }

    /// Upsert a scenario into the in-memory registry, assigning a generated
    /// name when the document carries none. Returns the registry key.
    pub fn register_scenario(&self, mut scenario: Scenario) -> String {
        let mut registry = self.scenarios.write();
        if scenario.name.is_empty() {
            scenario.name = format!("scenario-{}", registry.len() + 1);
        }
        let name = scenario.name.clone();
        registry.insert(name.clone(), scenario);
        name
    }

    /// Snapshot of all registered scenarios
    pub fn list_scenarios(&self) -> Vec<Scenario> {
        self.scenarios.read().values().cloned().collect()
    }

    /// Persist a scenario document. Fails only if persistence is unavailable.
    pub async fn save_scenario(&self, scenario: &Scenario) -> Result<Uuid, WorkerError> {
        let pool = self.pool()?;
        queries::scenario::insert_scenario(pool, scenario)
            .await
            .map_err(|e| match e.downcast::<sqlx::Error>() {
                Ok(sql) => WorkerError::Storage(sql),
                Err(other) => WorkerError::Validation(other.to_string()),
            })
    }

    /// Persist a raw embedding vector keyed to a scenario
    pub async fn save_embedding(
        &self,
        scenario_id: Option<Uuid>,
        vector: &[f64],
    ) -> Result<Uuid, WorkerError> {
        if vector.is_empty() {
            return Err(WorkerError::Validation("empty vector".into()));
        }
        let pool = self.pool()?;
        queries::embedding::insert_embedding(pool, scenario_id, vector)
            .await
            .map_err(|e| match e.downcast::<sqlx::Error>() {
                Ok(sql) => WorkerError::Storage(sql),
                Err(other) => WorkerError::Validation(other.to_string()),
            })
    }

    /// Best-effort insertion into the per-dimension similarity index.
    /// Creation and insertion failures are reported but never fail the
    /// enclosing save; the raw vector stays durable and searchable.
    pub async fn index_vector(&self, id: Uuid, vector: &[f64]) -> Result<(), WorkerError> {
        let pool = self.pool()?;
        let dim = vector.len();
        let table = index_table(dim);

        sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
            .execute(pool)
            .await
            .map_err(|e| WorkerError::IndexWrite(format!("extension: {e}")))?;

        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS {table} (id UUID PRIMARY KEY, embedding vector({dim}))"
        ))
        .execute(pool)
        .await
        .map_err(|e| WorkerError::IndexWrite(format!("create {table}: {e}")))?;

        sqlx::query(&format!(
            "INSERT INTO {table} (id, embedding) VALUES ($1, $2::vector)"
        ))
        .bind(id)
        .bind(vector_literal(vector))
        .execute(pool)
        .await
        .map_err(|e| WorkerError::IndexWrite(format!("insert into {table}: {e}")))?;

        Ok(())
    }

    /// Nearest neighbors of `query` by ascending cosine distance.
    ///
    /// Asks the per-dimension index first; when the index is absent or
    /// returns nothing, falls back to an exact scan over the raw vectors.
    pub async fn search(&self, query: &[f64], k: i64) -> Result<Vec<SearchHit>, WorkerError> {
        if query.is_empty() {
            return Err(WorkerError::Validation("empty query vector".into()));
        }
        let pool = self.pool()?;
        let k = if k <= 0 { DEFAULT_SEARCH_K } else { k };
        let dim = query.len();

        match self.search_indexed(pool, query, k).await {
            Ok(hits) if !hits.is_empty() => return Ok(hits),
            Ok(_) => debug!("index for dim {dim} returned no hits, using exact fallback"),
            Err(e) => debug!("index path failed ({e}), using exact fallback"),
        }

        let stored = queries::embedding::fetch_by_dim(pool, dim)
            .await
            .map_err(|e| match e.downcast::<sqlx::Error>() {
                Ok(sql) => WorkerError::Storage(sql),
                Err(other) => WorkerError::Validation(other.to_string()),
            })?;

        let candidates: Vec<(String, Vec<f64>)> = stored
            .into_iter()
            .filter(|row| row.vector.0.len() == dim)
            .map(|row| (row.id.to_string(), row.vector.0))
            .collect();

        Ok(rank_by_cosine(query, &candidates, k as usize))
    }

    async fn search_indexed(
        &self,
        pool: &PgPool,
        query: &[f64],
        k: i64,
    ) -> Result<Vec<SearchHit>, sqlx::Error> {
        let table = index_table(query.len());
        let rows: Vec<(Uuid, f64)> = sqlx::query_as(&format!(
            "SELECT id, (embedding <=> $1::vector)::float8 AS distance \
             FROM {table} ORDER BY distance ASC LIMIT $2"
        ))
        .bind(vector_literal(query))
        .bind(k)
        .fetch_all(pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, distance)| SearchHit {
                reference: format!("{table}:{id}"),
                distance,
            })
            .collect())
    }
}

fn index_table(dim: usize) -> String {
    format!("vec_embeddings_{dim}")
}

/// pgvector text literal: `[x1,x2,...]`
fn vector_literal(vector: &[f64]) -> String {
    let mut out = String::with_capacity(vector.len() * 8 + 2);
    out.push('[');
    for (i, x) in vector.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&x.to_string());
    }
    out.push(']');
    out
}

/// Exact fallback ranking: L2-normalize query and candidates, compute
/// `1 - dot`, sort ascending, keep the first `k`. A zero vector normalizes
/// to itself; its distance to anything is 1, never NaN.
pub fn rank_by_cosine(
    query: &[f64],
    candidates: &[(String, Vec<f64>)],
    k: usize,
) -> Vec<SearchHit> {
    let query_n = normalized_copy(query);

    let mut hits: Vec<SearchHit> = candidates
        .iter()
        .map(|(id, vector)| SearchHit {
            reference: id.clone(),
            distance: cosine_distance(&query_n, &normalized_copy(vector)),
        })
        .collect();

    hits.sort_by(|a, b| {
        a.distance
            .partial_cmp(&b.distance)
            .expect("cosine distance is never NaN")
    });
    hits.truncate(k);
    hits
}

fn normalized_copy(vector: &[f64]) -> Vec<f64> {
    let mut out = vector.to_vec();
    crate::services::embedding::l2_normalize(&mut out);
    out
}

/// `1 - dot` over already normalized vectors, range [0, 2]
fn cosine_distance(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    1.0 - dot
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EmbeddingParams, Globals};

    fn named_scenario(name: &str) -> Scenario {
        Scenario {
            name: name.into(),
            agents: vec![],
            accounts: vec![],
            globals: Globals::default(),
            params: EmbeddingParams::default(),
        }
    }

    #[test]
    fn test_register_generates_name_when_missing() {
        let store = VectorStore::new(None);
        let name = store.register_scenario(named_scenario(""));
        assert_eq!(name, "scenario-1");
        assert_eq!(store.list_scenarios().len(), 1);
    }

    #[test]
    fn test_register_upserts_by_name() {
        let store = VectorStore::new(None);
        store.register_scenario(named_scenario("demo"));
        store.register_scenario(named_scenario("demo"));
        assert_eq!(store.list_scenarios().len(), 1);
    }

    #[test]
    fn test_storage_unavailable_without_pool() {
        let store = VectorStore::new(None);
        let err = tokio_test::block_on(store.save_scenario(&named_scenario("x"))).unwrap_err();
        assert!(matches!(err, WorkerError::StorageUnavailable));

        let err = tokio_test::block_on(store.search(&[1.0, 0.0], 5)).unwrap_err();
        assert!(matches!(err, WorkerError::StorageUnavailable));
    }

    #[test]
    fn test_empty_query_is_validation_error() {
        let store = VectorStore::new(None);
        let err = tokio_test::block_on(store.search(&[], 5)).unwrap_err();
        assert!(matches!(err, WorkerError::Validation(_)));
    }

    #[test]
    fn test_rank_by_cosine_matches_brute_force_ordering() {
        let candidates = vec![
            ("opposite".to_string(), vec![-1.0, 0.0]),
            ("identical".to_string(), vec![2.0, 0.0]),
            ("orthogonal".to_string(), vec![0.0, 3.0]),
        ];

        let hits = rank_by_cosine(&[1.0, 0.0], &candidates, 10);

        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].reference, "identical");
        assert!(hits[0].distance.abs() < 1e-9);
        assert_eq!(hits[1].reference, "orthogonal");
        assert!((hits[1].distance - 1.0).abs() < 1e-9);
        assert_eq!(hits[2].reference, "opposite");
        assert!((hits[2].distance - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_rank_truncates_to_k() {
        let candidates: Vec<(String, Vec<f64>)> = (0..10)
            .map(|i| (format!("v{i}"), vec![1.0, i as f64]))
            .collect();
        let hits = rank_by_cosine(&[1.0, 0.0], &candidates, 3);
        assert_eq!(hits.len(), 3);
        assert!(hits[0].distance <= hits[1].distance);
        assert!(hits[1].distance <= hits[2].distance);
    }

    #[test]
    fn test_zero_vectors_never_produce_nan() {
        let candidates = vec![
            ("zero".to_string(), vec![0.0, 0.0]),
            ("unit".to_string(), vec![1.0, 0.0]),
        ];

        // Zero query: every distance is exactly 1
        let hits = rank_by_cosine(&[0.0, 0.0], &candidates, 10);
        for hit in &hits {
            assert!((hit.distance - 1.0).abs() < 1e-9);
            assert!(!hit.distance.is_nan());
        }

        // Zero candidate against a real query
        let hits = rank_by_cosine(&[1.0, 0.0], &candidates, 10);
        let zero_hit = hits.iter().find(|h| h.reference == "zero").unwrap();
        assert!((zero_hit.distance - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_vector_literal_format() {
        assert_eq!(vector_literal(&[1.0, -0.5, 2.0]), "[1,-0.5,2]");
        assert_eq!(vector_literal(&[]), "[]");
    }
}
