//! Schedule expansion
//!
//! Resolves a recurrence definition into the set of active day offsets
//! within a fixed-length planning cycle. Tagged recurrences (`WEEKLY`,
//! `BIWEEKLY_AC`, `BIWEEKLY_BD`, `MONTHLY_<n>`) are expanded directly;
//! raw RFC 5545 rules are delegated to the `rrule` evaluator.

use chrono::{Duration, TimeZone, Utc};
use rrule::{RRule, Tz, Unvalidated};
use tracing::warn;

use crate::error::WorkerError;
use crate::types::Schedule;

/// Weekday index with fixed mapping Mon=0 … Sun=6.
/// Unrecognized anchors map to Monday.
pub fn weekday_index(anchor: &str) -> u32 {
    match anchor.trim().to_ascii_uppercase().as_str() {
        "MON" => 0,
        "TUE" => 1,
        "WED" => 2,
        "THU" => 3,
        "FRI" => 4,
        "SAT" => 5,
        "SUN" => 6,
        _ => 0,
    }
}

/// Expand a schedule into its active day offsets in `[0, cycle_days)`.
///
/// Day offsets are returned in ascending order and may be empty. An
/// unknown recurrence tag yields an empty result, not an error; a raw
/// rule the evaluator rejects is logged and also yields an empty result.
pub fn expand(schedule: &Schedule, cycle_days: u32) -> Vec<u32> {
    let tagged = expand_tagged(schedule, cycle_days);
    if !tagged.is_empty() {
        return tagged;
    }
    if schedule.rrule.trim().is_empty() {
        return tagged;
    }
    match expand_rrule(&schedule.rrule, cycle_days) {
        Ok(days) => days,
        Err(e) => {
            warn!("{} (rule: {:?})", e, schedule.rrule);
            Vec::new()
        }
    }
}

/// Expand the tagged recurrence types. The raw-rule path is not consulted.
fn expand_tagged(schedule: &Schedule, cycle_days: u32) -> Vec<u32> {
    let anchor = weekday_index(&schedule.anchor);
    let tag = schedule.recurrence_type.trim().to_ascii_uppercase();
    if tag.is_empty() {
        return Vec::new();
    }

    let mut days = Vec::new();
    match tag.as_str() {
        "WEEKLY" => {
            for d in 0..cycle_days {
                if d % 7 == anchor {
                    days.push(d);
                }
            }
        }
        "BIWEEKLY_AC" => {
            for d in 0..cycle_days {
                let week = d / 7;
                if (week == 0 || week == 2) && d % 7 == anchor {
                    days.push(d);
                }
            }
        }
        "BIWEEKLY_BD" => {
            for d in 0..cycle_days {
                let week = d / 7;
                if (week == 1 || week == 3) && d % 7 == anchor {
                    days.push(d);
                }
            }
        }
        _ => {
            if let Some(suffix) = tag.strip_prefix("MONTHLY_") {
                if let Ok(n) = suffix.parse::<i64>() {
                    let week = (n - 1).clamp(0, 3) as u32;
                    for d in (week * 7)..((week + 1) * 7).min(cycle_days) {
                        if d % 7 == anchor {
                            days.push(d);
                        }
                    }
                }
            }
        }
    }
    days
}

/// Evaluate a raw RFC 5545 rule over the half-open window
/// `[cycle start, cycle start + cycle_days)`. Occurrence instants are
/// converted to zero-based day offsets by whole-day truncation.
fn expand_rrule(rule: &str, cycle_days: u32) -> Result<Vec<u32>, WorkerError> {
    let rrule: RRule<Unvalidated> = rule
        .parse()
        .map_err(|e| WorkerError::RecurrenceParse(format!("{e}")))?;

    // Window starts at midnight UTC of the current day, matching how
    // scenario cycles are anchored everywhere else.
    let start_naive = Utc::now()
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .expect("valid static midnight");
    let window_start = Tz::UTC.from_utc_datetime(&start_naive);

    let set = rrule
        .build(window_start)
        .map_err(|e| WorkerError::RecurrenceParse(format!("{e}")))?;

    let window_end = window_start + Duration::days(i64::from(cycle_days));
    // Cap scales with the window so sub-daily rules still reach every day:
    // one occurrence per hour of the cycle, floor 1000.
    let limit = cycle_days
        .saturating_mul(24)
        .clamp(1000, u32::from(u16::MAX)) as u16;
    let occurrences = set.after(window_start).before(window_end).all(limit);
    if occurrences.limited {
        warn!(
            "recurrence rule produced more than {limit} occurrences in a \
             {cycle_days}-day window, later days may be missing (rule: {rule:?})"
        );
    }

    let mut days: Vec<u32> = occurrences
        .dates
        .into_iter()
        .filter_map(|t| {
            let offset = (t - window_start).num_days();
            if offset >= 0 && (offset as u32) < cycle_days {
                Some(offset as u32)
            } else {
                None
            }
        })
        .collect();
    days.sort_unstable();
    days.dedup();
    Ok(days)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tagged(recurrence_type: &str, anchor: &str) -> Schedule {
        Schedule {
            recurrence_type: recurrence_type.to_string(),
            anchor: anchor.to_string(),
            rrule: String::new(),
        }
    }

    #[test]
    fn test_weekly_monday_in_four_week_cycle() {
        let days = expand(&tagged("WEEKLY", "Mon"), 28);
        assert_eq!(days, vec![0, 7, 14, 21]);
    }

    #[test]
    fn test_biweekly_ac_wednesday() {
        // Weeks 0 and 2 only, on Wednesdays
        let days = expand(&tagged("BIWEEKLY_AC", "Wed"), 28);
        assert_eq!(days, vec![2, 16]);
    }

    #[test]
    fn test_biweekly_bd_friday() {
        let days = expand(&tagged("BIWEEKLY_BD", "Fri"), 28);
        assert_eq!(days, vec![11, 25]);
    }

    #[test]
    fn test_monthly_window_clamps_week() {
        // MONTHLY_3 restricts to the third 7-day window
        assert_eq!(expand(&tagged("MONTHLY_3", "Tue"), 28), vec![15]);
        // n out of range clamps into [0, 3]
        assert_eq!(expand(&tagged("MONTHLY_9", "Mon"), 28), vec![21]);
        assert_eq!(expand(&tagged("MONTHLY_0", "Mon"), 28), vec![0]);
    }

    #[test]
    fn test_short_cycle_truncates_monthly_window() {
        let days = expand(&tagged("MONTHLY_2", "Mon"), 10);
        // Window [7, 14) intersected with [0, 10) keeps only Monday day 7
        assert_eq!(days, vec![7]);
    }

    #[test]
    fn test_unknown_tag_yields_empty() {
        assert!(expand(&tagged("FORTNIGHTLY", "Mon"), 28).is_empty());
    }

    #[test]
    fn test_unknown_anchor_maps_to_monday() {
        let days = expand(&tagged("WEEKLY", "Blursday"), 14);
        assert_eq!(days, vec![0, 7]);
    }

    #[test]
    fn test_case_insensitive_tag_and_anchor() {
        let days = expand(&tagged("weekly", "sun"), 14);
        assert_eq!(days, vec![6, 13]);
    }

    #[test]
    fn test_daily_rrule_covers_every_day() {
        let schedule = Schedule {
            recurrence_type: String::new(),
            anchor: String::new(),
            rrule: "FREQ=DAILY".to_string(),
        };
        let days = expand(&schedule, 7);
        assert_eq!(days, vec![0, 1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_rrule_count_limits_occurrences() {
        let schedule = Schedule {
            recurrence_type: String::new(),
            anchor: String::new(),
            rrule: "FREQ=DAILY;COUNT=3".to_string(),
        };
        let days = expand(&schedule, 28);
        assert_eq!(days, vec![0, 1, 2]);
    }

    #[test]
    fn test_hourly_rrule_reaches_every_day_of_a_long_cycle() {
        let schedule = Schedule {
            recurrence_type: String::new(),
            anchor: String::new(),
            rrule: "FREQ=HOURLY".to_string(),
        };
        // 60 days of hourly occurrences exceed a fixed 1000-occurrence cap
        let days = expand(&schedule, 60);
        assert_eq!(days, (0..60).collect::<Vec<u32>>());
    }

    #[test]
    fn test_invalid_rrule_degrades_to_empty() {
        let schedule = Schedule {
            recurrence_type: String::new(),
            anchor: String::new(),
            rrule: "FREQ=SOMETIMES".to_string(),
        };
        assert!(expand(&schedule, 28).is_empty());
    }

    #[test]
    fn test_empty_schedule_is_empty() {
        assert!(expand(&Schedule::default(), 28).is_empty());
    }
}
