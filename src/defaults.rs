//! Process-wide defaults for embedding synthesis and simulation

/// Reference resolution level: frequency scaling and heatmap cell size are
/// both anchored here (each level away halves/doubles).
pub const REFERENCE_LEVEL: i32 = 5;

/// Denominator that maps estimated service minutes to a [0,1] ratio
pub const SERVICE_MINUTES_SCALE: f64 = 200.0;

/// Minutes in a day, maps window start/duration to a [0,1] ratio
pub const MINUTES_PER_DAY: f64 = 1440.0;

/// Fixed average travel speed used by the naive simulator
pub const AVERAGE_SPEED_KMH: f64 = 50.0;

/// Default `k` for similarity search when the request gives none
pub const DEFAULT_SEARCH_K: i64 = 5;

/// Fallback values for [`crate::types::EmbeddingParams`] fields left
/// zero/empty by the request.
#[derive(Debug, Clone)]
pub struct EmbeddingDefaults {
    pub res_service_stop_time: usize,
    pub res_service_window_start: usize,
    pub res_service_window_duration: usize,
    pub res_pinned_accounts: usize,
    pub res_agents_available: usize,
    pub res_agent_start_locations: usize,
    pub resolution_levels: Vec<i32>,
    pub cycle_days: u32,
    pub overshoot: f64,
    pub base_frequency: f64,
}

impl Default for EmbeddingDefaults {
    fn default() -> Self {
        Self {
            res_service_stop_time: 128,
            res_service_window_start: 64,
            res_service_window_duration: 64,
            res_pinned_accounts: 32,
            res_agents_available: 32,
            res_agent_start_locations: 64,
            resolution_levels: vec![4, 5, 6],
            cycle_days: 28,
            overshoot: 0.25,
            base_frequency: 8.0,
        }
    }
}
