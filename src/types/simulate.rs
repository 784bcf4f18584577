//! Routing simulation types

use serde::{Deserialize, Serialize};

use crate::types::Scenario;

/// Summary statistics of one simulated service day
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimStats {
    /// Driving seconds accumulated per vehicle, in agent order
    pub driving_sec_per_rep: Vec<f64>,
    /// Service seconds accumulated per vehicle, in agent order
    pub service_sec_per_rep: Vec<f64>,
    pub reps_used_per_day: Vec<u32>,
    pub unassigned_stops: u32,
    pub total_travel_sec: f64,
    pub total_service_sec: f64,
    pub total_idle_sec: f64,
}

/// Job/vehicle model handed to the external route optimizer.
/// Locations are `[lng, lat]`, times are seconds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptimizerInput {
    pub jobs: Vec<OptimizerJob>,
    pub vehicles: Vec<OptimizerVehicle>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizerJob {
    pub id: u64,
    pub service: u64,
    pub location: [f64; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_windows: Option<Vec<[u64; 2]>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizerVehicle {
    pub id: u64,
    pub start: [f64; 2],
    pub end: [f64; 2],
}

/// Payload for `fieldwave.simulate`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulateRequest {
    pub scenario: Scenario,
    #[serde(default)]
    pub day: u32,
}

/// Response for `fieldwave.simulate`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulateResponse {
    pub optimizer_input: OptimizerInput,
    /// Raw assignment from the external optimizer, absent when it is
    /// unavailable or failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimizer_output: Option<serde_json::Value>,
    pub stats: SimStats,
    /// Fixed-width reduction of `stats` for storage and search
    pub vector: Vec<f64>,
}
