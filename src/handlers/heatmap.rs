//! Heatmap message handler

use anyhow::Result;
use async_nats::{Client, Subscriber};
use futures::StreamExt;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::services::heatmap;
use crate::types::{ErrorResponse, HeatmapRequest, HeatmapResponse, Request, SuccessResponse};

/// Handle heatmap messages
///
/// Pure computation over the request scenario; an unknown feature name
/// yields an empty cell list rather than an error.
pub async fn handle_heatmap(client: Client, mut subscriber: Subscriber) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received heatmap message");

        let reply = match msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                warn!("Message without reply subject");
                continue;
            }
        };

        let request: Request<HeatmapRequest> = match serde_json::from_slice(&msg.payload) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse heatmap request: {}", e);
                let error = ErrorResponse::new(Uuid::nil(), "INVALID_REQUEST", e.to_string());
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
                continue;
            }
        };

        let payload = &request.payload;
        let cells = heatmap::aggregate(
            &payload.scenario,
            &payload.feature,
            payload.day,
            payload.resolution,
        );
        debug!(
            "Heatmap for {:?} day {} produced {} cells",
            payload.feature,
            payload.day,
            cells.len()
        );

        let response = SuccessResponse::new(request.id, HeatmapResponse { cells });
        let _ = client.publish(reply, serde_json::to_vec(&response)?.into()).await;
    }

    Ok(())
}
