//! Scenario types
//!
//! A scenario is the immutable input document for every computation:
//! a fleet of mobile agents plus a set of recurring service accounts.

use serde::{Deserialize, Serialize};

use crate::defaults::EmbeddingDefaults;

/// A complete field-service scheduling scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub agents: Vec<Agent>,
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub globals: Globals,
    #[serde(default)]
    pub params: EmbeddingParams,
}

/// A mobile agent (vehicle/rep start position)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    /// Agent-side recurring availability. Parsed but not consulted by any
    /// component yet.
    #[serde(default)]
    pub schedule: Schedule,
}

/// A recurring service account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub estimated_service_minutes: f64,
    #[serde(default)]
    pub service_window_start_min: f64,
    #[serde(default)]
    pub service_window_duration_min: f64,
    /// Non-empty when the account is pinned to a specific agent
    #[serde(default)]
    pub pinned_agent_id: String,
    /// Ratio override in (0, 1]; <= 0 means "derive from fleet size"
    #[serde(default)]
    pub agents_available_ratio: f64,
    #[serde(default)]
    pub schedule: Schedule,
}

/// Recurrence definition for an account or agent.
///
/// Either a recurrence type tag (`WEEKLY`, `BIWEEKLY_AC`, `BIWEEKLY_BD`,
/// `MONTHLY_<n>`) with an anchor weekday, or, when the tag is absent,
/// a raw RFC 5545 rule string.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    #[serde(rename = "type", default)]
    pub recurrence_type: String,
    #[serde(default)]
    pub anchor: String,
    #[serde(default)]
    pub rrule: String,
}

/// Fleet-wide limits. Informational only: the simulator does not
/// enforce work/travel ceilings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Globals {
    #[serde(default)]
    pub max_agents: i32,
    #[serde(default)]
    pub max_work_minutes_per_week: f64,
    #[serde(default)]
    pub max_work_minutes_per_day: f64,
    #[serde(default)]
    pub max_travel_minutes_per_day: f64,
}

/// Per-request embedding parameters. Zero/empty fields fall back to the
/// process-wide defaults, so an embedding is reproducible given the same
/// scenario and resolved parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingParams {
    #[serde(default)]
    pub res_service_stop_time: usize,
    #[serde(default)]
    pub res_service_window_start: usize,
    #[serde(default)]
    pub res_service_window_duration: usize,
    #[serde(default)]
    pub res_pinned_accounts: usize,
    #[serde(default)]
    pub res_agents_available: usize,
    #[serde(default)]
    pub res_agent_start_locations: usize,
    #[serde(default)]
    pub resolution_levels: Vec<i32>,
    #[serde(default)]
    pub cycle_days: u32,
}

impl EmbeddingParams {
    /// Resolve zero/empty fields against the process defaults.
    pub fn resolved(&self, defaults: &EmbeddingDefaults) -> EmbeddingParams {
        let pick = |v: usize, d: usize| if v == 0 { d } else { v };
        EmbeddingParams {
            res_service_stop_time: pick(self.res_service_stop_time, defaults.res_service_stop_time),
            res_service_window_start: pick(
                self.res_service_window_start,
                defaults.res_service_window_start,
            ),
            res_service_window_duration: pick(
                self.res_service_window_duration,
                defaults.res_service_window_duration,
            ),
            res_pinned_accounts: pick(self.res_pinned_accounts, defaults.res_pinned_accounts),
            res_agents_available: pick(self.res_agents_available, defaults.res_agents_available),
            res_agent_start_locations: pick(
                self.res_agent_start_locations,
                defaults.res_agent_start_locations,
            ),
            resolution_levels: if self.resolution_levels.is_empty() {
                defaults.resolution_levels.clone()
            } else {
                self.resolution_levels.clone()
            },
            cycle_days: if self.cycle_days == 0 {
                defaults.cycle_days
            } else {
                self.cycle_days
            },
        }
    }
}

impl Scenario {
    /// Effective fleet cap: `globals.max_agents` when positive,
    /// otherwise at least one and at most the actual fleet size.
    pub fn effective_max_agents(&self) -> usize {
        if self.globals.max_agents > 0 {
            self.globals.max_agents as usize
        } else {
            self.agents.len().max(1)
        }
    }
}
