//! NATS message handlers

pub mod embed;
pub mod heatmap;
pub mod ping;
pub mod scenario;
pub mod search;
pub mod simulate;

use std::sync::Arc;

use anyhow::Result;
use async_nats::Client;
use tokio::select;
use tracing::{error, info};

use crate::config::Config;
use crate::defaults::EmbeddingDefaults;
use crate::services::embedding::EmbeddingSynthesizer;
use crate::services::optimizer::create_optimizer;
use crate::services::vector_store::VectorStore;

/// Start all message handlers
pub async fn start_handlers(
    client: Client,
    store: Arc<VectorStore>,
    config: &Config,
) -> Result<()> {
    info!("Starting message handlers...");

    let ping_sub = client.subscribe("fieldwave.ping").await?;
    let scenario_save_sub = client.subscribe("fieldwave.scenario.save").await?;
    let scenario_list_sub = client.subscribe("fieldwave.scenario.list").await?;
    let embed_sub = client.subscribe("fieldwave.embed").await?;
    let index_sub = client.subscribe("fieldwave.embedding.index").await?;
    let search_sub = client.subscribe("fieldwave.embedding.search").await?;
    let heatmap_sub = client.subscribe("fieldwave.heatmap").await?;
    let simulate_sub = client.subscribe("fieldwave.simulate").await?;

    info!("Subscribed to NATS subjects");

    let synthesizer = Arc::new(EmbeddingSynthesizer::new(EmbeddingDefaults::default()));
    let optimizer: Arc<dyn crate::services::optimizer::RouteOptimizer> =
        Arc::from(create_optimizer(config));

    let client_ping = client.clone();
    let client_scenario_save = client.clone();
    let client_scenario_list = client.clone();
    let client_embed = client.clone();
    let client_index = client.clone();
    let client_search = client.clone();
    let client_heatmap = client.clone();
    let client_simulate = client.clone();

    let store_scenario_save = store.clone();
    let store_scenario_list = store.clone();
    let store_index = store.clone();
    let store_search = store.clone();

    let ping_handle = tokio::spawn(async move {
        ping::handle_ping(client_ping, ping_sub).await
    });

    let scenario_save_handle = tokio::spawn(async move {
        scenario::handle_save(client_scenario_save, scenario_save_sub, store_scenario_save).await
    });

    let scenario_list_handle = tokio::spawn(async move {
        scenario::handle_list(client_scenario_list, scenario_list_sub, store_scenario_list).await
    });

    let embed_handle = tokio::spawn(async move {
        embed::handle_embed(client_embed, embed_sub, synthesizer).await
    });

    let index_handle = tokio::spawn(async move {
        embed::handle_index(client_index, index_sub, store_index).await
    });

    let search_handle = tokio::spawn(async move {
        search::handle_search(client_search, search_sub, store_search).await
    });

    let heatmap_handle = tokio::spawn(async move {
        heatmap::handle_heatmap(client_heatmap, heatmap_sub).await
    });

    let simulate_handle = tokio::spawn(async move {
        simulate::handle_simulate(client_simulate, simulate_sub, optimizer).await
    });

    info!("All handlers started");

    // Handlers run until the NATS connection drops; any one finishing is
    // a reason to shut the worker down.
    select! {
        result = ping_handle => {
            error!("Ping handler finished: {:?}", result);
        }
        result = scenario_save_handle => {
            error!("Scenario save handler finished: {:?}", result);
        }
        result = scenario_list_handle => {
            error!("Scenario list handler finished: {:?}", result);
        }
        result = embed_handle => {
            error!("Embed handler finished: {:?}", result);
        }
        result = index_handle => {
            error!("Embedding index handler finished: {:?}", result);
        }
        result = search_handle => {
            error!("Embedding search handler finished: {:?}", result);
        }
        result = heatmap_handle => {
            error!("Heatmap handler finished: {:?}", result);
        }
        result = simulate_handle => {
            error!("Simulate handler finished: {:?}", result);
        }
    }

    Ok(())
}
