//! Similarity search message handler

use std::sync::Arc;

use anyhow::Result;
use async_nats::{Client, Subscriber};
use futures::StreamExt;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::services::vector_store::VectorStore;
use crate::types::{ErrorResponse, Request, SearchRequest, SearchResponse, SuccessResponse};

/// Handle embedding.search messages
pub async fn handle_search(
    client: Client,
    mut subscriber: Subscriber,
    store: Arc<VectorStore>,
) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received embedding.search message");

        let reply = match msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                warn!("Message without reply subject");
                continue;
            }
        };

        let request: Request<SearchRequest> = match serde_json::from_slice(&msg.payload) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse embedding.search request: {}", e);
                let error = ErrorResponse::new(Uuid::nil(), "INVALID_REQUEST", e.to_string());
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
                continue;
            }
        };

        match store.search(&request.payload.vector, request.payload.k).await {
            Ok(hits) => {
                debug!("Search returned {} hits", hits.len());
                let response = SuccessResponse::new(request.id, SearchResponse { hits });
                let _ = client.publish(reply, serde_json::to_vec(&response)?.into()).await;
            }
            Err(e) => {
                error!("Search failed: {}", e);
                let error = ErrorResponse::new(request.id, e.code(), e.to_string());
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
            }
        }
    }

    Ok(())
}
