//! Fixed-width reduction of simulation outcomes
//!
//! Per-vehicle distributions vary with fleet size; reducing each one to a
//! fixed six-number summary lets outcomes of differently sized fleets be
//! compared, stored, or searched like any other embedding.

use crate::types::SimStats;

/// Six-number summary of a distribution: min, max, mean, p50, p75, p95.
/// An empty distribution reduces to six zeros.
pub fn reduce(values: &[f64]) -> [f64; 6] {
    if values.is_empty() {
        return [0.0; 6];
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).expect("no NaN in distributions"));

    let n = sorted.len();
    let mean = sorted.iter().sum::<f64>() / n as f64;

    [
        sorted[0],
        sorted[n - 1],
        mean,
        percentile(&sorted, 0.5),
        percentile(&sorted, 0.75),
        percentile(&sorted, 0.95),
    ]
}

/// Linear-interpolation percentile on an already sorted slice
fn percentile(sorted: &[f64], q: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let pos = q * (n as f64 - 1.0);
    let i = pos as usize;
    if i >= n - 1 {
        return sorted[n - 1];
    }
    let frac = pos - i as f64;
    sorted[i] * (1.0 - frac) + sorted[i + 1] * frac
}

/// Flatten simulation stats into the fixed feature vector:
/// four six-number summaries (driving, service, reps used, unassigned)
/// followed by the scenario totals and the unassigned count.
pub fn from_sim_stats(stats: &SimStats) -> Vec<f64> {
    let reps: Vec<f64> = stats.reps_used_per_day.iter().map(|&x| f64::from(x)).collect();

    let mut out = Vec::with_capacity(28);
    out.extend_from_slice(&reduce(&stats.driving_sec_per_rep));
    out.extend_from_slice(&reduce(&stats.service_sec_per_rep));
    out.extend_from_slice(&reduce(&reps));
    out.extend_from_slice(&reduce(&[f64::from(stats.unassigned_stops)]));
    out.extend_from_slice(&[
        stats.total_travel_sec,
        stats.total_service_sec,
        stats.total_idle_sec,
        f64::from(stats.unassigned_stops),
    ]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_reduce_known_distribution() {
        let summary = reduce(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert!((summary[0] - 1.0).abs() < EPS); // min
        assert!((summary[1] - 5.0).abs() < EPS); // max
        assert!((summary[2] - 3.0).abs() < EPS); // mean
        assert!((summary[3] - 3.0).abs() < EPS); // p50
        assert!((summary[4] - 4.0).abs() < EPS); // p75
        assert!((summary[5] - 4.8).abs() < EPS); // p95
    }

    #[test]
    fn test_reduce_empty_is_six_zeros() {
        assert_eq!(reduce(&[]), [0.0; 6]);
    }

    #[test]
    fn test_reduce_singleton() {
        let summary = reduce(&[7.5]);
        assert_eq!(summary, [7.5; 6]);
    }

    #[test]
    fn test_reduce_is_order_independent() {
        let a = reduce(&[5.0, 1.0, 3.0, 2.0, 4.0]);
        let b = reduce(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_percentile_interpolates() {
        let sorted = [10.0, 20.0];
        assert!((percentile(&sorted, 0.5) - 15.0).abs() < EPS);
        assert!((percentile(&sorted, 0.0) - 10.0).abs() < EPS);
        assert!((percentile(&sorted, 1.0) - 20.0).abs() < EPS);
    }

    #[test]
    fn test_sim_stats_vector_has_fixed_width() {
        let stats = SimStats {
            driving_sec_per_rep: vec![100.0, 200.0, 300.0],
            service_sec_per_rep: vec![600.0, 1200.0, 1800.0],
            reps_used_per_day: vec![3],
            unassigned_stops: 2,
            total_travel_sec: 600.0,
            total_service_sec: 3600.0,
            total_idle_sec: 0.0,
        };

        let vector = from_sim_stats(&stats);

        // 4 summaries of 6 plus 4 scalar tail entries, regardless of fleet size
        assert_eq!(vector.len(), 28);
        assert!((vector[0] - 100.0).abs() < EPS); // driving min
        assert!((vector[1] - 300.0).abs() < EPS); // driving max
        assert!((vector[24] - 600.0).abs() < EPS); // total travel
        assert!((vector[27] - 2.0).abs() < EPS); // unassigned tail

        let empty_fleet = SimStats {
            driving_sec_per_rep: vec![],
            service_sec_per_rep: vec![],
            reps_used_per_day: vec![0],
            unassigned_stops: 0,
            total_travel_sec: 0.0,
            total_service_sec: 0.0,
            total_idle_sec: 0.0,
        };
        assert_eq!(from_sim_stats(&empty_fleet).len(), 28);
    }
}
