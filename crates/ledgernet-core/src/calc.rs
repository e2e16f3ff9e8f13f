//! Shared financial statistics.
//!
//! Every function returns a defined value on empty or degenerate input
//! instead of failing; the scoring layers rely on that.

use std::cmp::Ordering;

/// Total deposits minus total withdrawals.
pub fn net_flow(deposits: &[f64], withdrawals: &[f64]) -> f64 {
    deposits.iter().sum::<f64>() - withdrawals.iter().sum::<f64>()
}

/// Net savings as a percentage of total deposits. 0 when there are no
/// deposits.
pub fn savings_rate(deposits: &[f64], withdrawals: &[f64]) -> f64 {
    let total_deposits: f64 = deposits.iter().sum();
    if total_deposits == 0.0 {
        return 0.0;
    }
    net_flow(deposits, withdrawals) / total_deposits * 100.0
}

/// Percentage change from `start` to `end`. 0 when `start` is 0.
pub fn growth_rate(start: f64, end: f64) -> f64 {
    if start == 0.0 {
        return 0.0;
    }
    (end - start) / start * 100.0
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Sample standard deviation (n − 1 denominator). 0 for fewer than 2 values.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>()
        / (values.len() - 1) as f64;
    var.sqrt()
}

/// Standard deviation over mean, a scale-free dispersion measure.
/// 0 when there are fewer than 2 values or the mean is 0.
pub fn coefficient_of_variation(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    if m == 0.0 {
        return 0.0;
    }
    std_dev(values) / m
}

/// Weighted mean of `values`. 0 on length mismatch or zero total weight.
pub fn weighted_average(values: &[f64], weights: &[f64]) -> f64 {
    if values.is_empty() || values.len() != weights.len() {
        return 0.0;
    }
    let total: f64 = weights.iter().sum();
    if total == 0.0 {
        return 0.0;
    }
    values.iter().zip(weights).map(|(v, w)| v * w).sum::<f64>() / total
}

/// Gini coefficient of a set of non-negative totals, via cumulative sums
/// over the sorted Lorenz proportions.
///
/// 0 for fewer than 2 values or a zero total. Perfectly even spreads come
/// out slightly below 0 (−1/n) under this discrete form; callers that map
/// to a score clamp afterwards.
pub fn gini_coefficient(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let total: f64 = values.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }
    let mut proportions: Vec<f64> = values.iter().map(|v| v / total).collect();
    proportions.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let n = proportions.len() as f64;
    let mut cumulative = 0.0;
    let mut area_under_lorenz = 0.0;
    for p in &proportions {
        cumulative += p;
        area_under_lorenz += cumulative;
    }
    1.0 - 2.0 * area_under_lorenz / n
}

/// Herfindahl–Hirschman concentration index: the sum of squared shares.
/// Ranges from 1/n (even spread) to 1.0 (fully concentrated); 0 on empty
/// input or zero total.
pub fn herfindahl_index(values: &[f64]) -> f64 {
    let total: f64 = values.iter().sum();
    if values.is_empty() || total == 0.0 {
        return 0.0;
    }
    values.iter().map(|v| (v / total) * (v / total)).sum()
}

/// Value at the given percentile (0–100), with linear interpolation
/// between ranks. 0 on empty input.
pub fn percentile(values: &[f64], pct: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let k = (sorted.len() - 1) as f64 * (pct / 100.0);
    let f = k.floor() as usize;
    let c = k - f as f64;
    if f + 1 < sorted.len() {
        sorted[f] + c * (sorted[f + 1] - sorted[f])
    } else {
        sorted[f]
    }
}

/// Round to two decimals, the precision every reported figure uses.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Trailing moving average: element `i` averages the last `window`
/// values up to and including `i`, fewer at the head. Empty on empty
/// input or a zero window.
pub fn moving_average(values: &[f64], window: usize) -> Vec<f64> {
    if values.is_empty() || window == 0 {
        return Vec::new();
    }
    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            mean(&values[start..=i])
        })
        .collect()
}

/// Average spend per day over a window. 0 when the window is empty.
pub fn burn_rate(withdrawals: &[f64], days: i64) -> f64 {
    if days <= 0 {
        return 0.0;
    }
    withdrawals.iter().sum::<f64>() / days as f64
}

/// Whole days until the balance runs out at the given daily burn.
/// `Some(0)` when there is no balance to begin with; `None` when the
/// balance never depletes (no spending, or net gaining).
pub fn runway_days(balance: f64, daily_burn: f64) -> Option<i64> {
    if balance <= 0.0 {
        return Some(0);
    }
    if daily_burn <= 0.0 {
        return None;
    }
    Some((balance / daily_burn) as i64)
}

/// Indices of values whose z-score (against the sample standard
/// deviation) exceeds `threshold`. Empty for fewer than 3 values or
/// when the deviation is 0.
pub fn outlier_indices(values: &[f64], threshold: f64) -> Vec<usize> {
    if values.len() < 3 {
        return Vec::new();
    }
    let m = mean(values);
    let sd = std_dev(values);
    if sd == 0.0 {
        return Vec::new();
    }
    values
        .iter()
        .enumerate()
        .filter(|&(_, &v)| ((v - m) / sd).abs() > threshold)
        .map(|(i, _)| i)
        .collect()
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn net_flow_subtracts_withdrawals() {
        assert_eq!(net_flow(&[1000.0, 1000.0], &[400.0, 200.0]), 1400.0);
        assert_eq!(net_flow(&[], &[]), 0.0);
    }

    #[test]
    fn savings_rate_is_net_over_deposits() {
        let rate = savings_rate(&[1000.0, 1000.0], &[400.0, 200.0]);
        assert!((rate - 70.0).abs() < 1e-9);
    }

    #[test]
    fn savings_rate_without_deposits_is_zero() {
        assert_eq!(savings_rate(&[], &[100.0]), 0.0);
    }

    #[test]
    fn savings_rate_can_go_negative() {
        let rate = savings_rate(&[100.0], &[300.0]);
        assert!((rate - -200.0).abs() < 1e-9);
    }

    #[test]
    fn median_even_and_odd_lengths() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), 2.5);
        assert_eq!(median(&[]), 0.0);
    }

    #[test]
    fn std_dev_is_sample_form() {
        // Sample stdev of [2, 4, 4, 4, 5, 5, 7, 9] is ~2.138
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((std_dev(&values) - 2.13809).abs() < 1e-4);
        assert_eq!(std_dev(&[5.0]), 0.0);
    }

    #[test]
    fn cv_of_identical_values_is_zero() {
        assert_eq!(coefficient_of_variation(&[3.0, 3.0, 3.0]), 0.0);
    }

    #[test]
    fn cv_handles_zero_mean() {
        assert_eq!(coefficient_of_variation(&[-1.0, 1.0]), 0.0);
    }

    #[test]
    fn weighted_average_respects_weights() {
        let avg = weighted_average(&[10.0, 20.0], &[1.0, 3.0]);
        assert!((avg - 17.5).abs() < 1e-9);
        assert_eq!(weighted_average(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(weighted_average(&[1.0, 2.0], &[0.0, 0.0]), 0.0);
    }

    #[test]
    fn gini_concentrated_distribution_is_high() {
        // One category holds almost everything
        let g = gini_coefficient(&[1000.0, 1.0, 1.0, 1.0]);
        assert!(g > 0.7, "expected high inequality, got {g}");
    }

    #[test]
    fn gini_even_distribution_is_near_zero() {
        let g = gini_coefficient(&[100.0, 100.0, 100.0, 100.0]);
        // Discrete Lorenz form lands at -1/n for perfectly even input
        assert!(g <= 0.0 && g > -0.3, "expected ~-0.25, got {g}");
    }

    #[test]
    fn gini_degenerate_inputs_are_zero() {
        assert_eq!(gini_coefficient(&[]), 0.0);
        assert_eq!(gini_coefficient(&[42.0]), 0.0);
        assert_eq!(gini_coefficient(&[0.0, 0.0]), 0.0);
    }

    #[test]
    fn hhi_bounds() {
        assert!((herfindahl_index(&[50.0, 50.0]) - 0.5).abs() < 1e-9);
        assert!((herfindahl_index(&[100.0]) - 1.0).abs() < 1e-9);
        assert_eq!(herfindahl_index(&[]), 0.0);
    }

    #[test]
    fn percentile_interpolates() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert!((percentile(&values, 50.0) - 2.5).abs() < 1e-9);
        assert_eq!(percentile(&values, 0.0), 1.0);
        assert_eq!(percentile(&values, 100.0), 4.0);
    }

    #[test]
    fn round2_keeps_two_decimals() {
        assert_eq!(round2(1234.5678), 1234.57);
        assert_eq!(round2(0.125), 0.13);
        assert_eq!(round2(10.0), 10.0);
    }

    #[test]
    fn moving_average_widens_at_the_head() {
        let avgs = moving_average(&[3.0, 6.0, 9.0, 12.0], 3);
        assert_eq!(avgs, vec![3.0, 4.5, 6.0, 9.0]);
        assert!(moving_average(&[], 3).is_empty());
        assert!(moving_average(&[1.0], 0).is_empty());
    }

    #[test]
    fn burn_rate_averages_over_the_window() {
        assert_eq!(burn_rate(&[300.0, 300.0], 30), 20.0);
        assert_eq!(burn_rate(&[100.0], 0), 0.0);
        assert_eq!(burn_rate(&[], 10), 0.0);
    }

    #[test]
    fn runway_truncates_to_whole_days() {
        assert_eq!(runway_days(10_000.0, 100.0), Some(100));
        assert_eq!(runway_days(1_050.0, 100.0), Some(10));
        assert_eq!(runway_days(0.0, 100.0), Some(0));
        // No spending means the balance never depletes
        assert_eq!(runway_days(5_000.0, 0.0), None);
        assert_eq!(runway_days(5_000.0, -50.0), None);
    }

    #[test]
    fn outlier_indices_flag_extreme_values() {
        let values = [100.0, 102.0, 98.0, 101.0, 99.0, 100.0, 500.0];
        assert_eq!(outlier_indices(&values, 2.0), vec![6]);
    }

    #[test]
    fn outlier_detection_needs_spread_and_size() {
        assert!(outlier_indices(&[1.0, 500.0], 2.0).is_empty());
        assert!(outlier_indices(&[5.0, 5.0, 5.0, 5.0], 2.0).is_empty());
    }
}
