//! Scenario message handlers

use std::sync::Arc;

use anyhow::Result;
use async_nats::{Client, Subscriber};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::services::vector_store::VectorStore;
use crate::types::{ErrorResponse, Request, Scenario, SuccessResponse};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SaveScenarioResponse {
    id: Uuid,
    name: String,
}

/// Handle scenario.save messages
///
/// Registers the scenario in the in-memory registry and persists the
/// document. Only storage unavailability surfaces as a request failure.
pub async fn handle_save(
    client: Client,
    mut subscriber: Subscriber,
    store: Arc<VectorStore>,
) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received scenario.save message");

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
                error!("Failed to parse scenario.save request: {}", e);
                let error = ErrorResponse::new(Uuid::nil(), "INVALID_REQUEST", e.to_string());
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
                continue;
            }
        };

        let name = store.register_scenario(request.payload.clone());
        let mut scenario = request.payload;
        scenario.name = name.clone();

        match store.save_scenario(&scenario).await {
            Ok(id) => {
                let response =
                    SuccessResponse::new(request.id, SaveScenarioResponse { id, name });
                let _ = client.publish(reply, serde_json::to_vec(&response)?.into()).await;
            }
            Err(e) => {
                error!("Failed to save scenario: {}", e);
                let error = ErrorResponse::new(request.id, e.code(), e.to_string());
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
            }
        }
    }

    Ok(())
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListScenariosResponse {
    scenarios: Vec<Scenario>,
}

/// Handle scenario.list messages: snapshot of the in-memory registry
pub async fn handle_list(
    client: Client,
    mut subscriber: Subscriber,
    store: Arc<VectorStore>,
) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received scenario.list message");

        let reply = match msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                warn!("Message without reply subject");
                continue;
            }
        };

        let request_id = serde_json::from_slice::<Request<serde_json::Value>>(&msg.payload)
            .map(|r| r.id)
            .unwrap_or_else(|_| Uuid::nil());

        let response = SuccessResponse::new(
            request_id,
            ListScenariosResponse {
                scenarios: store.list_scenarios(),
            },
        );
        let _ = client.publish(reply, serde_json::to_vec(&response)?.into()).await;
    }

    Ok(())
}
