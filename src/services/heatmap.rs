//! Heatmap aggregation
//!
//! Buckets the raw clamped amplitude of one feature into geospatial grid
//! cells for the accounts active on a given day. The synthesized wave is
//! not used here, only the scalar amplitude that feeds it.

use std::collections::BTreeMap;

use crate::defaults::{MINUTES_PER_DAY, SERVICE_MINUTES_SCALE};
use crate::services::geo::GridCell;
use crate::services::schedule;
use crate::types::{Account, HeatCell, Scenario};

/// Aggregate one feature's amplitude per grid cell for accounts active on
/// `day`. An unrecognized feature name yields an empty list, not an error.
/// Cells are emitted in ascending cell order so output is deterministic.
pub fn aggregate(scenario: &Scenario, feature: &str, day: u32, resolution: i32) -> Vec<HeatCell> {
    let cycle = if scenario.params.cycle_days > 0 {
        scenario.params.cycle_days
    } else {
        crate::defaults::EmbeddingDefaults::default().cycle_days
    };

    let mut cells: BTreeMap<GridCell, f64> = BTreeMap::new();

    for account in &scenario.accounts {
        if !schedule::expand(&account.schedule, cycle).contains(&day) {
            continue;
        }
        let Some(amp) = feature_amplitude(scenario, account, feature) else {
            continue;
        };
        let cell = GridCell::containing(account.lat, account.lng, resolution);
        *cells.entry(cell).or_insert(0.0) += amp;
    }

    cells
        .into_iter()
        .map(|(cell, value)| {
            let (lat, lng) = cell.center();
            HeatCell {
                cell: cell.id(),
                lat,
                lng,
                value,
            }
        })
        .collect()
}

/// The scalar clamped amplitude of one feature for one account, using the
/// same formulas as the embedding synthesizer. `None` for unknown features.
fn feature_amplitude(scenario: &Scenario, account: &Account, feature: &str) -> Option<f64> {
    let amp = match feature {
        "service_stop_time" => {
            (account.estimated_service_minutes / SERVICE_MINUTES_SCALE).clamp(0.0, 1.0)
        }
        "service_window_start" => {
            (account.service_window_start_min / MINUTES_PER_DAY).clamp(0.0, 1.0)
        }
        "service_window_duration" => {
            (account.service_window_duration_min / MINUTES_PER_DAY).clamp(0.0, 1.0)
        }
        "pinned_accounts" => {
            if account.pinned_agent_id.trim().is_empty() {
                0.0
            } else {
                1.0
            }
        }
        "agents_available" => {
            let ratio = if account.agents_available_ratio > 0.0 {
                account.agents_available_ratio
            } else {
                scenario.agents.len() as f64 / scenario.effective_max_agents() as f64
            };
            ratio.clamp(0.0, 1.0)
        }
        _ => return None,
    };
    Some(amp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EmbeddingParams, Globals, Schedule};

    fn weekly_account(lat: f64, lng: f64, service_minutes: f64) -> Account {
        Account {
            id: String::new(),
            name: String::new(),
            lat,
            lng,
            estimated_service_minutes: service_minutes,
            service_window_start_min: 360.0,
            service_window_duration_min: 720.0,
            pinned_agent_id: String::new(),
            agents_available_ratio: 0.0,
            schedule: Schedule {
                recurrence_type: "WEEKLY".into(),
                anchor: "Mon".into(),
                rrule: String::new(),
            },
        }
    }

    fn scenario_with(accounts: Vec<Account>) -> Scenario {
        Scenario {
            name: "hm".into(),
            agents: vec![],
            accounts,
            globals: Globals::default(),
            params: EmbeddingParams {
                cycle_days: 28,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_same_cell_amplitudes_sum() {
        // Two accounts well inside the same 1-degree cell
        let scenario = scenario_with(vec![
            weekly_account(50.2, 14.2, 100.0),
            weekly_account(50.3, 14.3, 60.0),
        ]);

        let cells = aggregate(&scenario, "service_stop_time", 0, 5);

        assert_eq!(cells.len(), 1);
        assert!((cells[0].value - (0.5 + 0.3)).abs() < 1e-9);
    }

    #[test]
    fn test_inactive_day_yields_no_cells() {
        let scenario = scenario_with(vec![weekly_account(50.2, 14.2, 100.0)]);
        // Monday accounts are inactive on day 1 (Tuesday)
        assert!(aggregate(&scenario, "service_stop_time", 1, 5).is_empty());
    }

    #[test]
    fn test_unknown_feature_yields_empty() {
        let scenario = scenario_with(vec![weekly_account(50.2, 14.2, 100.0)]);
        assert!(aggregate(&scenario, "travel_entropy", 0, 5).is_empty());
    }

    #[test]
    fn test_window_start_feature() {
        let scenario = scenario_with(vec![weekly_account(50.2, 14.2, 100.0)]);
        let cells = aggregate(&scenario, "service_window_start", 0, 5);
        assert_eq!(cells.len(), 1);
        assert!((cells[0].value - 360.0 / 1440.0).abs() < 1e-9);
    }

    #[test]
    fn test_pinned_feature_is_indicator() {
        let mut pinned = weekly_account(50.2, 14.2, 100.0);
        pinned.pinned_agent_id = "agent-7".into();
        let unpinned = weekly_account(50.3, 14.3, 100.0);

        let scenario = scenario_with(vec![pinned, unpinned]);
        let cells = aggregate(&scenario, "pinned_accounts", 0, 5);

        assert_eq!(cells.len(), 1);
        assert!((cells[0].value - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_cells_sorted_deterministically() {
        let scenario = scenario_with(vec![
            weekly_account(52.5, 13.4, 100.0),
            weekly_account(48.2, 16.4, 100.0),
            weekly_account(50.1, 14.4, 100.0),
        ]);

        let cells = aggregate(&scenario, "service_stop_time", 0, 5);
        assert_eq!(cells.len(), 3);
        let rows: Vec<f64> = cells.iter().map(|c| c.lat).collect();
        let mut sorted = rows.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(rows, sorted);
    }

    #[test]
    fn test_cell_center_is_representative() {
        let scenario = scenario_with(vec![weekly_account(50.2, 14.2, 100.0)]);
        let cells = aggregate(&scenario, "service_stop_time", 0, 5);
        // Cell [50, 51) x [14, 15) at level 5 has center (50.5, 14.5)
        assert!((cells[0].lat - 50.5).abs() < 1e-9);
        assert!((cells[0].lng - 14.5).abs() < 1e-9);
        assert_eq!(cells[0].cell, "r5:50:14");
    }
}
