//! Per-window summary statistics.
//!
//! Reduces an ordered numeric sample to the eight moments consumed by the
//! feature vector. Small samples fall back to zero according to a fixed
//! threshold table:
//!
//! | statistic | minimum n | below minimum |
//! |-----------|-----------|---------------|
//! | std_dev   | 2         | 0             |
//! | skew      | 3         | 0             |
//! | kurtosis  | 4         | 0             |
//!
//! These thresholds decide whether a near-empty window reports a real
//! (possibly degenerate) statistic or a zero, which affects feature
//! comparability downstream — keep them here, not inline at call sites.

use statrs::statistics::{Data, Distribution, Max, Min, OrderStatistics};

/// Minimum sample size for a defined sample standard deviation.
pub const MIN_SAMPLES_STD_DEV: usize = 2;
/// Minimum sample size for a defined skewness.
pub const MIN_SAMPLES_SKEW: usize = 3;
/// Minimum sample size for a defined excess kurtosis.
pub const MIN_SAMPLES_KURTOSIS: usize = 4;

/// The eight summary statistics of one window's raw samples.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SampleSummary {
    pub sum: f64,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    pub std_dev: f64,
    pub kurtosis: f64,
    pub skew: f64,
}

/// Summarizes an ordered numeric sample.
///
/// An empty sample reports zero for every statistic. The median of an
/// even-length sample is the average of the two central order statistics.
/// Standard deviation uses the sample (`n - 1`) divisor; skewness and
/// kurtosis use population moments with no bias correction, kurtosis being
/// the Fisher (excess) definition.
pub fn summarize(samples: &[f64]) -> SampleSummary {
    if samples.is_empty() {
        return SampleSummary::default();
    }

    let n = samples.len();
    let mut data = Data::new(samples.to_vec());

    let sum = samples.iter().sum();
    let mean = data.mean().unwrap_or(0.0);
    let median = data.median();
    let min = data.min();
    let max = data.max();
    let std_dev = if n >= MIN_SAMPLES_STD_DEV {
        data.std_dev().unwrap_or(0.0)
    } else {
        0.0
    };
    let skew = if n >= MIN_SAMPLES_SKEW {
        population_skewness(samples, mean)
    } else {
        0.0
    };
    let kurtosis = if n >= MIN_SAMPLES_KURTOSIS {
        excess_kurtosis(samples, mean)
    } else {
        0.0
    };

    SampleSummary {
        sum,
        mean,
        median,
        min,
        max,
        std_dev,
        kurtosis,
        skew,
    }
}

/// Third standardized moment over population moments. A zero-variance
/// sample has no defined asymmetry and reports zero.
fn population_skewness(samples: &[f64], mean: f64) -> f64 {
    let n = samples.len() as f64;
    let m2 = central_moment(samples, mean, 2) / n;
    if m2 == 0.0 {
        return 0.0;
    }
    let m3 = central_moment(samples, mean, 3) / n;
    m3 / m2.powf(1.5)
}

/// Fisher (excess) kurtosis over population moments. A zero-variance
/// sample reports zero.
fn excess_kurtosis(samples: &[f64], mean: f64) -> f64 {
    let n = samples.len() as f64;
    let m2 = central_moment(samples, mean, 2) / n;
    if m2 == 0.0 {
        return 0.0;
    }
    let m4 = central_moment(samples, mean, 4) / n;
    m4 / (m2 * m2) - 3.0
}

fn central_moment(samples: &[f64], mean: f64, order: i32) -> f64 {
    samples.iter().map(|x| (x - mean).powi(order)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    #[test]
    fn test_empty_sample_is_all_zero() {
        let summary = summarize(&[]);
        assert_eq!(summary, SampleSummary::default());
    }

    #[test]
    fn test_basic_statistics() {
        let summary = summarize(&[100.0, 200.0, 300.0, 400.0, 500.0]);

        assert_close(summary.sum, 1500.0);
        assert_close(summary.mean, 300.0);
        assert_close(summary.median, 300.0);
        assert_close(summary.min, 100.0);
        assert_close(summary.max, 500.0);
        // Sample standard deviation of an arithmetic progression.
        assert_close(summary.std_dev, 158.11388300841898);
        // A symmetric sample has no asymmetry.
        assert_close(summary.skew, 0.0);
    }

    #[test]
    fn test_even_length_median_averages_central_pair() {
        let summary = summarize(&[1.0, 2.0, 3.0, 4.0]);
        assert_close(summary.median, 2.5);
    }

    #[test]
    fn test_single_sample_falls_back_to_zero_spread() {
        let summary = summarize(&[42.0]);

        assert_close(summary.sum, 42.0);
        assert_close(summary.mean, 42.0);
        assert_close(summary.median, 42.0);
        assert_close(summary.min, 42.0);
        assert_close(summary.max, 42.0);
        assert_close(summary.std_dev, 0.0);
        assert_close(summary.skew, 0.0);
        assert_close(summary.kurtosis, 0.0);
    }

    #[test]
    fn test_two_samples_have_std_but_no_skew() {
        let summary = summarize(&[10.0, 20.0]);

        assert_close(summary.std_dev, std::f64::consts::SQRT_2 * 5.0);
        assert_close(summary.skew, 0.0);
        assert_close(summary.kurtosis, 0.0);
    }

    #[test]
    fn test_three_samples_have_skew_but_no_kurtosis() {
        let summary = summarize(&[1.0, 2.0, 6.0]);

        // Population moments: mean 3, m2 = 14/3, m3 = 6.
        let m2: f64 = 14.0 / 3.0;
        assert_close(summary.skew, 6.0 / m2.powf(1.5));
        assert_close(summary.kurtosis, 0.0);
    }

    #[test]
    fn test_four_samples_have_kurtosis() {
        let summary = summarize(&[1.0, 2.0, 3.0, 10.0]);

        // Population moments: mean 4, m2 = 12.5, m4 = 348.5.
        assert_close(summary.kurtosis, 348.5 / (12.5 * 12.5) - 3.0);
        assert!(summary.kurtosis != 0.0);
    }

    #[test]
    fn test_uniform_four_samples_kurtosis() {
        // Two-point distribution {0, 1} x2: skew 0, excess kurtosis -2.
        let summary = summarize(&[0.0, 1.0, 0.0, 1.0]);
        assert_close(summary.skew, 0.0);
        assert_close(summary.kurtosis, -2.0);
    }

    #[test]
    fn test_constant_sample_reports_zero_moments() {
        let summary = summarize(&[7.0, 7.0, 7.0, 7.0, 7.0]);

        assert_close(summary.std_dev, 0.0);
        assert_close(summary.skew, 0.0);
        assert_close(summary.kurtosis, 0.0);
        assert_close(summary.mean, 7.0);
    }
}
