//! Scalar statistics helpers shared by the analytics, optimizer, simulator
//! and overfitting crates.
//!
//! Standard deviations here are population (divide by n); the optimizer's
//! covariance matrix is the one place that divides by n - 1.

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Percentile with linear interpolation between order statistics, `pct` in
/// [0, 100].
pub fn percentile(values: &[f64], pct: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let rank = pct / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        return sorted[lower];
    }
    let weight = rank - lower as f64;
    sorted[lower] * (1.0 - weight) + sorted[upper] * weight
}

/// Population third standardized moment. 0 for a degenerate distribution.
pub fn skewness(values: &[f64]) -> f64 {
    let m = mean(values);
    let sd = std_dev(values);
    if sd == 0.0 {
        return 0.0;
    }
    values.iter().map(|v| ((v - m) / sd).powi(3)).sum::<f64>() / values.len() as f64
}

/// Excess kurtosis (normal distribution scores 0).
pub fn excess_kurtosis(values: &[f64]) -> f64 {
    let m = mean(values);
    let sd = std_dev(values);
    if sd == 0.0 {
        return 0.0;
    }
    values.iter().map(|v| ((v - m) / sd).powi(4)).sum::<f64>() / values.len() as f64 - 3.0
}

/// Pearson correlation; 0 when either side has zero variance (the convention
/// the overfitting detector's constant-formula property relies on).
pub fn pearson(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.len() < 2 {
        return 0.0;
    }
    let n = a.len() as f64;
    let mean_a = mean(a);
    let mean_b = mean(b);
    let cov = a
        .iter()
        .zip(b)
        .map(|(x, y)| (x - mean_a) * (y - mean_b))
        .sum::<f64>()
        / n;
    let denom = std_dev(a) * std_dev(b);
    if denom == 0.0 { 0.0 } else { cov / denom }
}

/// Least-squares line `y = slope * x + intercept` over `(0..n, values)`.
pub fn linear_fit(values: &[f64]) -> (f64, f64) {
    let n = values.len();
    if n < 2 {
        return (0.0, values.first().copied().unwrap_or(0.0));
    }
    let xs: Vec<f64> = (0..n).map(|i| i as f64).collect();
    let mean_x = mean(&xs);
    let mean_y = mean(values);
    let sxx: f64 = xs.iter().map(|x| (x - mean_x).powi(2)).sum();
    let sxy: f64 = xs
        .iter()
        .zip(values)
        .map(|(x, y)| (x - mean_x) * (y - mean_y))
        .sum();
    let slope = if sxx == 0.0 { 0.0 } else { sxy / sxx };
    (slope, mean_y - slope * mean_x)
}

/// Running cumulative sum.
pub fn cumulative_sum(values: &[f64]) -> Vec<f64> {
    values
        .iter()
        .scan(0.0, |acc, v| {
            *acc += v;
            Some(*acc)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentile_interpolates_linearly() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert!((percentile(&values, 50.0) - 2.5).abs() < 1e-12);
        assert!((percentile(&values, 0.0) - 1.0).abs() < 1e-12);
        assert!((percentile(&values, 100.0) - 4.0).abs() < 1e-12);
        assert!((percentile(&values, 25.0) - 1.75).abs() < 1e-12);
    }

    #[test]
    fn population_std_dev() {
        let values = [1.0, 2.0, 3.0, 4.0];
        // Population variance of 1..4 is 1.25.
        assert!((variance(&values) - 1.25).abs() < 1e-12);
    }

    #[test]
    fn pearson_of_constant_is_zero() {
        let constant = [5.0, 5.0, 5.0];
        let varied = [1.0, 2.0, 3.0];
        assert_eq!(pearson(&constant, &varied), 0.0);
    }

    #[test]
    fn linear_fit_recovers_exact_line() {
        let values = [1.0, 3.0, 5.0, 7.0];
        let (slope, intercept) = linear_fit(&values);
        assert!((slope - 2.0).abs() < 1e-12);
        assert!((intercept - 1.0).abs() < 1e-12);
    }

    #[test]
    fn skewness_of_symmetric_sample_is_zero() {
        let values = [-1.0, 0.0, 1.0];
        assert!(skewness(&values).abs() < 1e-12);
    }
}
