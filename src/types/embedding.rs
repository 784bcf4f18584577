//! Embedding result and similarity-search types

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Fixed channel order for the flat embedding vector.
///
/// The flat vector is the named channels concatenated in exactly this order;
/// `offsets` records the half-open `[start, end)` range of each channel.
pub const CHANNEL_ORDER: [&str; 6] = [
    "service_stop_time",
    "service_window_start",
    "service_window_duration",
    "pinned_accounts",
    "agents_available",
    "agent_start_locations",
];

/// Result of embedding synthesis
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingResult {
    /// Channels concatenated in [`CHANNEL_ORDER`]
    pub embedding: Vec<f64>,
    /// Per-channel sub-vectors
    pub components: HashMap<String, Vec<f64>>,
    /// Half-open `[start, end)` range of each channel within `embedding`
    pub offsets: HashMap<String, (usize, usize)>,
    pub meta: EmbeddingMeta,
}

/// Metadata describing how an embedding was synthesized
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingMeta {
    pub resolution_levels: Vec<i32>,
    pub cycle_days: u32,
    pub order: Vec<String>,
}

/// One nearest-neighbor search result. `distance` is cosine distance:
/// non-negative, 0 = identical direction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    #[serde(rename = "ref")]
    pub reference: String,
    pub distance: f64,
}

/// Payload for `fieldwave.embedding.index`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEmbeddingRequest {
    #[serde(default)]
    pub scenario_id: Option<uuid::Uuid>,
    pub vector: Vec<f64>,
}

/// Payload for `fieldwave.embedding.search`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub vector: Vec<f64>,
    #[serde(default)]
    pub k: i64,
}

/// Response for `fieldwave.embedding.search`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub hits: Vec<SearchHit>,
}
