//! Heatmap types

use serde::{Deserialize, Serialize};

use crate::types::Scenario;

/// One nonempty geospatial cell with its accumulated feature amplitude
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatCell {
    /// Stable cell identifier (`r<level>:<row>:<col>`)
    pub cell: String,
    /// Cell center latitude
    pub lat: f64,
    /// Cell center longitude
    pub lng: f64,
    /// Sum of clamped amplitudes of all accounts in the cell
    pub value: f64,
}

/// Payload for `fieldwave.heatmap`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapRequest {
    pub scenario: Scenario,
    pub feature: String,
    #[serde(default)]
    pub day: u32,
    #[serde(default = "default_resolution")]
    pub resolution: i32,
}

fn default_resolution() -> i32 {
    5
}

/// Response for `fieldwave.heatmap`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapResponse {
    pub cells: Vec<HeatCell>,
}
