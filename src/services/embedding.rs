//! Embedding synthesis
//!
//! Encodes scenario attributes into a space-time oscillatory signal:
//! each entity contributes, for each of its active days, a sine wave whose
//! phase couples location and day-of-cycle and whose amplitude carries the
//! attribute value. Contributions superimpose additively, so colocated,
//! co-scheduled entities reinforce a channel while differently scheduled
//! ones interfere. Channels are L2-normalized, making scenarios of any
//! size comparable by cosine similarity.

use std::collections::HashMap;
use std::f64::consts::PI;

use crate::defaults::{
    EmbeddingDefaults, MINUTES_PER_DAY, REFERENCE_LEVEL, SERVICE_MINUTES_SCALE,
};
use crate::services::schedule;
use crate::types::{EmbeddingMeta, EmbeddingResult, Scenario, CHANNEL_ORDER};

/// Embedding synthesizer, parameterized by the process defaults
pub struct EmbeddingSynthesizer {
    defaults: EmbeddingDefaults,
}

impl EmbeddingSynthesizer {
    pub fn new(defaults: EmbeddingDefaults) -> Self {
        Self { defaults }
    }

    /// Synthesize the six-channel embedding for a scenario.
    ///
    /// Deterministic: identical (scenario, resolved params) inputs produce
    /// identical output.
    pub fn build(&self, scenario: &Scenario) -> EmbeddingResult {
        let params = scenario.params.resolved(&self.defaults);
        let overshoot = self.defaults.overshoot;
        let base_freq = self.defaults.base_frequency;
        let levels = &params.resolution_levels;
        let cycle = params.cycle_days;

        // Agents contribute once each, with day-0 phase and unit ratio.
        let mut agent_vec = vec![0.0; params.res_agent_start_locations];
        for agent in &scenario.agents {
            let phi = phase(agent.lat, agent.lng, 0, cycle);
            superimpose(
                &mut agent_vec,
                amplitude(1.0, overshoot),
                base_freq,
                levels,
                phi,
            );
        }
        l2_normalize(&mut agent_vec);

        let mut stop_time_vec = vec![0.0; params.res_service_stop_time];
        let mut win_start_vec = vec![0.0; params.res_service_window_start];
        let mut win_dur_vec = vec![0.0; params.res_service_window_duration];
        let mut pinned_vec = vec![0.0; params.res_pinned_accounts];
        let mut avail_vec = vec![0.0; params.res_agents_available];

        let max_agents = scenario.effective_max_agents();

        for account in &scenario.accounts {
            let active_days = schedule::expand(&account.schedule, cycle);

            let stop_amp = clamp01(account.estimated_service_minutes / SERVICE_MINUTES_SCALE);
            let win_start_amp = clamp01(account.service_window_start_min / MINUTES_PER_DAY);
            let win_dur_amp = clamp01(account.service_window_duration_min / MINUTES_PER_DAY);
            let pinned_amp = if account.pinned_agent_id.trim().is_empty() {
                0.0
            } else {
                1.0
            };
            let avail_amp = clamp01(if account.agents_available_ratio > 0.0 {
                account.agents_available_ratio
            } else {
                scenario.agents.len() as f64 / max_agents as f64
            });

            for &day in &active_days {
                let phi = phase(account.lat, account.lng, day, cycle);
                superimpose(
                    &mut stop_time_vec,
                    amplitude(stop_amp, overshoot),
                    base_freq,
                    levels,
                    phi,
                );
                superimpose(
                    &mut win_start_vec,
                    amplitude(win_start_amp, overshoot),
                    base_freq,
                    levels,
                    phi,
                );
                superimpose(
                    &mut win_dur_vec,
                    amplitude(win_dur_amp, overshoot),
                    base_freq,
                    levels,
                    phi,
                );
                superimpose(
                    &mut pinned_vec,
                    amplitude(pinned_amp, overshoot),
                    base_freq,
                    levels,
                    phi,
                );
                superimpose(
                    &mut avail_vec,
                    amplitude(avail_amp, overshoot),
                    base_freq,
                    levels,
                    phi,
                );
            }
        }

        l2_normalize(&mut stop_time_vec);
        l2_normalize(&mut win_start_vec);
        l2_normalize(&mut win_dur_vec);
        l2_normalize(&mut pinned_vec);
        l2_normalize(&mut avail_vec);

        let channels: [(&str, Vec<f64>); 6] = [
            (CHANNEL_ORDER[0], stop_time_vec),
            (CHANNEL_ORDER[1], win_start_vec),
            (CHANNEL_ORDER[2], win_dur_vec),
            (CHANNEL_ORDER[3], pinned_vec),
            (CHANNEL_ORDER[4], avail_vec),
            (CHANNEL_ORDER[5], agent_vec),
        ];

        let mut embedding = Vec::with_capacity(channels.iter().map(|(_, v)| v.len()).sum());
        let mut offsets = HashMap::new();
        let mut components = HashMap::new();
        for (name, vec) in channels {
            let start = embedding.len();
            embedding.extend_from_slice(&vec);
            offsets.insert(name.to_string(), (start, embedding.len()));
            components.insert(name.to_string(), vec);
        }

        EmbeddingResult {
            embedding,
            components,
            offsets,
            meta: EmbeddingMeta {
                resolution_levels: params.resolution_levels.clone(),
                cycle_days: cycle,
                order: CHANNEL_ORDER.iter().map(|s| s.to_string()).collect(),
            },
        }
    }
}

/// Normalize a value from `[min, max]` into `[0, 1]`, clamping outside input
fn normalize(x: f64, min: f64, max: f64) -> f64 {
    if max <= min {
        return 0.0;
    }
    ((x - min) / (max - min)).clamp(0.0, 1.0)
}

fn clamp01(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

/// Phase offset coupling spatial position with day-of-cycle. Entities at
/// the same location but active on different days interfere differently.
pub fn phase(lat: f64, lng: f64, day: u32, cycle_days: u32) -> f64 {
    let lat_n = normalize(lat, -90.0, 90.0);
    let lng_n = normalize(lng, -180.0, 180.0);
    let phi_space = (lat_n - 0.5) * PI + (lng_n - 0.5) * PI;
    let phi_day = 2.0 * PI * f64::from(day) / f64::from(cycle_days.max(1));
    phi_space + phi_day
}

/// Amplitude with overshoot expansion. The overshoot lets post-superposition
/// values exceed unit scale before final renormalization, preserving
/// contrast between close-to-saturated inputs.
pub fn amplitude(ratio: f64, overshoot: f64) -> f64 {
    (ratio * (1.0 + overshoot)).clamp(0.0, 1.0 + overshoot)
}

/// Frequency for a resolution level: the reference level carries the base
/// frequency, each level away halves/doubles it.
pub fn frequency_for_level(base: f64, level: i32) -> f64 {
    base / 2f64.powi(level - REFERENCE_LEVEL)
}

/// Add one entity-day wave into a channel vector, once per resolution level
fn superimpose(vec: &mut [f64], amp: f64, base_freq: f64, levels: &[i32], phi: f64) {
    let n = vec.len() as f64;
    if vec.is_empty() || amp == 0.0 {
        return;
    }
    for &level in levels {
        let f = frequency_for_level(base_freq, level);
        for (i, slot) in vec.iter_mut().enumerate() {
            let theta = 2.0 * PI * f * (i as f64 / n) + phi;
            *slot += amp * theta.sin();
        }
    }
}

/// L2-normalize in place; a zero vector is left unchanged
pub fn l2_normalize(vec: &mut [f64]) {
    let sum_sq: f64 = vec.iter().map(|x| x * x).sum();
    if sum_sq == 0.0 {
        return;
    }
    let inv = 1.0 / sum_sq.sqrt();
    for x in vec.iter_mut() {
        *x *= inv;
    }
}
