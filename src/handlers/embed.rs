//! Embedding synthesis and indexing message handlers

use std::sync::Arc;

use anyhow::Result;
use async_nats::{Client, Subscriber};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::services::embedding::EmbeddingSynthesizer;
use crate::services::vector_store::VectorStore;
use crate::types::{
    ErrorResponse, IndexEmbeddingRequest, Request, Scenario, SuccessResponse,
};

/// Handle embed messages: synthesize the embedding for a scenario
pub async fn handle_embed(
    client: Client,
    mut subscriber: Subscriber,
    synthesizer: Arc<EmbeddingSynthesizer>,
) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received embed message");

        let reply = match msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                warn!("Message without reply subject");
                continue;
            }
        };

        let request: Request<Scenario> = match serde_json::from_slice(&msg.payload) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse embed request: {}", e);
                let error = ErrorResponse::new(Uuid::nil(), "INVALID_REQUEST", e.to_string());
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
                continue;
            }
        };

        let result = synthesizer.build(&request.payload);
        debug!(
            "Synthesized embedding of dim {} for scenario {:?}",
            result.embedding.len(),
            request.payload.name
        );

        let response = SuccessResponse::new(request.id, result);
        let _ = client.publish(reply, serde_json::to_vec(&response)?.into()).await;
    }

    Ok(())
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndexEmbeddingResponse {
    embedding_id: Uuid,
}

/// Handle embedding.index messages
///
/// Persists the raw vector (source of truth), then inserts it into the
/// per-dimension similarity index best-effort; an index failure is logged
/// and the save still succeeds.
pub async fn handle_index(
    client: Client,
    mut subscriber: Subscriber,
    store: Arc<VectorStore>,
) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received embedding.index message");

        let reply = match msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                warn!("Message without reply subject");
                continue;
            }
        };

        let request: Request<IndexEmbeddingRequest> = match serde_json::from_slice(&msg.payload)
        {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse embedding.index request: {}", e);
                let error = ErrorResponse::new(Uuid::nil(), "INVALID_REQUEST", e.to_string());
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
                continue;
            }
        };

        let payload = &request.payload;
        if payload.vector.is_empty() {
            let error = ErrorResponse::new(request.id, "VALIDATION_ERROR", "empty vector");
            let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
            continue;
        }

        let embedding_id = match store.save_embedding(payload.scenario_id, &payload.vector).await
        {
            Ok(id) => id,
            Err(e) => {
                error!("Failed to save embedding: {}", e);
                let error = ErrorResponse::new(request.id, e.code(), e.to_string());
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
                continue;
            }
        };

        if let Err(e) = store.index_vector(embedding_id, &payload.vector).await {
            warn!("Similarity index write failed (raw vector persisted): {}", e);
        }

        let response = SuccessResponse::new(request.id, IndexEmbeddingResponse { embedding_id });
        let _ = client.publish(reply, serde_json::to_vec(&response)?.into()).await;
    }

    Ok(())
}
