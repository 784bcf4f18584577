//! Greedy routing simulation
//!
//! Vehicles start at each agent's location. Every account active on the
//! requested day is assigned, in input order, to the vehicle currently
//! nearest by great-circle distance; the vehicle then moves to the account.
//! Sequential order is observable and must be preserved; the greedy
//! outcome depends on it.

use crate::defaults::{EmbeddingDefaults, SERVICE_MINUTES_SCALE};
use crate::services::{geo, schedule};
use crate::types::{
    Account, OptimizerInput, OptimizerJob, OptimizerVehicle, Scenario, SimStats,
};

/// Run the naive greedy simulation for one day of the cycle.
pub fn run(scenario: &Scenario, day: u32) -> SimStats {
    struct Vehicle {
        lat: f64,
        lng: f64,
        drive_sec: f64,
        service_sec: f64,
    }

    let mut vehicles: Vec<Vehicle> = scenario
        .agents
        .iter()
        .map(|agent| Vehicle {
            lat: agent.lat,
            lng: agent.lng,
            drive_sec: 0.0,
            service_sec: 0.0,
        })
        .collect();

    let mut assigned = 0usize;
    if !vehicles.is_empty() {
        for account in active_accounts(scenario, day) {
            let mut best = 0usize;
            let mut best_km = f64::MAX;
            for (i, vehicle) in vehicles.iter().enumerate() {
                let km = geo::haversine_km(vehicle.lat, vehicle.lng, account.lat, account.lng);
                if km < best_km {
                    best_km = km;
                    best = i;
                }
            }

            let vehicle = &mut vehicles[best];
            vehicle.drive_sec += geo::travel_seconds(best_km);
            vehicle.lat = account.lat;
            vehicle.lng = account.lng;
            vehicle.service_sec += clamped_service_seconds(account);
            assigned += 1;
        }
    }

    let driving: Vec<f64> = vehicles.iter().map(|v| v.drive_sec).collect();
    let service: Vec<f64> = vehicles.iter().map(|v| v.service_sec).collect();
    let total_travel: f64 = driving.iter().sum();
    let total_service: f64 = service.iter().sum();

    SimStats {
        driving_sec_per_rep: driving,
        service_sec_per_rep: service,
        reps_used_per_day: vec![scenario.agents.len() as u32],
        unassigned_stops: scenario.accounts.len().saturating_sub(assigned) as u32,
        total_travel_sec: total_travel,
        total_service_sec: total_service,
        total_idle_sec: 0.0,
    }
}

/// Build the job/vehicle model for the external optimizer. Jobs are the
/// accounts active on `day` with clamped service seconds and an optional
/// time window; vehicles are the agents with fixed start = end location.
/// Locations use `[lng, lat]` ordering.
pub fn build_optimizer_input(scenario: &Scenario, day: u32) -> OptimizerInput {
    let vehicles = scenario
        .agents
        .iter()
        .enumerate()
        .map(|(i, agent)| OptimizerVehicle {
            id: i as u64 + 1,
            start: [agent.lng, agent.lat],
            end: [agent.lng, agent.lat],
        })
        .collect();

    let jobs = active_accounts(scenario, day)
        .enumerate()
        .map(|(i, account)| {
            let window_start = account.service_window_start_min.max(0.0) as u64 * 60;
            let window_end = (account.service_window_start_min
                + account.service_window_duration_min)
                .max(0.0) as u64
                * 60;
            OptimizerJob {
                id: i as u64 + 1,
                service: clamped_service_seconds(account) as u64,
                location: [account.lng, account.lat],
                time_windows: (window_end > window_start)
                    .then(|| vec![[window_start, window_end]]),
            }
        })
        .collect();

    OptimizerInput { jobs, vehicles }
}

/// Accounts active on `day`, preserving scenario input order
fn active_accounts(scenario: &Scenario, day: u32) -> impl Iterator<Item = &Account> {
    let cycle = if scenario.params.cycle_days > 0 {
        scenario.params.cycle_days
    } else {
        EmbeddingDefaults::default().cycle_days
    };
    scenario
        .accounts
        .iter()
        .filter(move |a| schedule::expand(&a.schedule, cycle).contains(&day))
}

/// Service minutes clamped to the amplitude scale, in seconds
fn clamped_service_seconds(account: &Account) -> f64 {
    (account.estimated_service_minutes / SERVICE_MINUTES_SCALE).clamp(0.0, 1.0)
        * SERVICE_MINUTES_SCALE
        * 60.0
}
