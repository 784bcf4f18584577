//! Routing simulation message handler

use std::sync::Arc;

use anyhow::Result;
use async_nats::{Client, Subscriber};
use futures::StreamExt;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::services::optimizer::RouteOptimizer;
use crate::services::{feature_vector, simulate};
use crate::types::{ErrorResponse, Request, SimulateRequest, SimulateResponse, SuccessResponse};

/// Handle simulate messages
///
/// Always runs the naive greedy simulation; the external optimizer is
/// consulted best-effort and its absence or failure never aborts the
/// request.
pub async fn handle_simulate(
    client: Client,
    mut subscriber: Subscriber,
    optimizer: Arc<dyn RouteOptimizer>,
) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received simulate message");

        let reply = match msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                warn!("Message without reply subject");
                continue;
            }
        };

        let request: Request<SimulateRequest> = match serde_json::from_slice(&msg.payload) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse simulate request: {}", e);
                let error = ErrorResponse::new(Uuid::nil(), "INVALID_REQUEST", e.to_string());
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
                continue;
            }
        };

        let payload = &request.payload;
        let optimizer_input = simulate::build_optimizer_input(&payload.scenario, payload.day);

        let optimizer_output = match optimizer.optimize(&optimizer_input).await {
            Ok(output) => Some(output),
            Err(e) => {
                info!("Optimizer unavailable, returning naive stats only: {}", e);
                None
            }
        };

        let stats = simulate::run(&payload.scenario, payload.day);
        let vector = feature_vector::from_sim_stats(&stats);

        let response = SuccessResponse::new(
            request.id,
            SimulateResponse {
                optimizer_input,
                optimizer_output,
                stats,
                vector,
            },
        );
        let _ = client.publish(reply, serde_json::to_vec(&response)?.into()).await;
    }

    Ok(())
}
