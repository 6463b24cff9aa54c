use crate::utils::finite_or_zero;

/// Each value's share of the sum of `values`.
///
/// Falls back to an even spread when the values sum to zero, so the result
/// always sums to 1.0 for a non-empty input.
pub fn historical_shares(values: &[f64]) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    let sum: f64 = values.iter().sum();
    if sum == 0.0 || !sum.is_finite() {
        return vec![1.0 / values.len() as f64; values.len()];
    }
    values.iter().map(|v| v / sum).collect()
}

/// Spreads `total` over `count` months following `shares`.
///
/// Month `i` takes `shares[i % shares.len()]`, so a pattern shorter than the
/// horizon repeats from its start.
pub fn distribute_by_shares(total: f64, shares: &[f64], count: usize) -> Vec<f64> {
    if shares.is_empty() {
        return vec![0.0; count];
    }
    (0..count)
        .map(|i| finite_or_zero(total * shares[i % shares.len()]))
        .collect()
}
