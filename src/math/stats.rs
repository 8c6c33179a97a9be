//! Descriptive statistics over sample columns.
//!
//! All functions take plain `&[f64]` slices of finite values; prior and
//! posterior tables never hold NaN or infinities.

use serde::Serialize;

/// Arithmetic mean. `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation. `None` for an empty slice.
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let mu = mean(values)?;
    let var = values.iter().map(|v| (v - mu).powi(2)).sum::<f64>() / values.len() as f64;
    Some(var.sqrt())
}

/// Quantile with linear interpolation between order statistics.
///
/// `sorted` must be ascending. `p` is clamped to `[0, 1]`.
pub fn quantile_sorted(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let p = p.clamp(0.0, 1.0);
    let pos = p * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

pub fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(f64::total_cmp);
    out
}

/// Marginal summary of one column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub p05: f64,
    pub p50: f64,
    pub p95: f64,
    pub max: f64,
}

impl ColumnSummary {
    /// `None` when `values` is empty.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let sorted = sorted_copy(values);
        Some(Self {
            count: values.len(),
            mean: mean(values)?,
            std: std_dev(values)?,
            min: *sorted.first()?,
            p05: quantile_sorted(&sorted, 0.05)?,
            p50: quantile_sorted(&sorted, 0.50)?,
            p95: quantile_sorted(&sorted, 0.95)?,
            max: *sorted.last()?,
        })
    }
}

/// Equal-width histogram over `[low, high]`.
///
/// Values outside the range are ignored; `high` itself falls in the last bin.
pub fn histogram(values: &[f64], low: f64, high: f64, bins: usize) -> Vec<usize> {
    let mut counts = vec![0usize; bins];
    if bins == 0 || !(high > low) {
        if bins > 0 {
            counts[0] = values.iter().filter(|v| **v == low).count();
        }
        return counts;
    }
    let width = (high - low) / bins as f64;
    for &v in values {
        if v < low || v > high {
            continue;
        }
        let idx = (((v - low) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }
    counts
}

/// Result of a two-sample Kolmogorov–Smirnov test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KsTest {
    /// Maximum distance between the two empirical CDFs.
    pub statistic: f64,
    /// Asymptotic p-value.
    pub p_value: f64,
    pub n1: usize,
    pub n2: usize,
}

/// Two-sample Kolmogorov–Smirnov test. `None` if either sample is empty.
pub fn ks_two_sample(sample1: &[f64], sample2: &[f64]) -> Option<KsTest> {
    let n1 = sample1.len();
    let n2 = sample2.len();
    if n1 == 0 || n2 == 0 {
        return None;
    }

    let s1 = sorted_copy(sample1);
    let s2 = sorted_copy(sample2);

    // Walk both sorted samples; evaluate the ECDF gap after consuming every
    // copy of the current value from both sides.
    let (mut i, mut j) = (0usize, 0usize);
    let mut d_max = 0.0f64;
    while i < n1 && j < n2 {
        let x = s1[i].min(s2[j]);
        while i < n1 && s1[i] <= x {
            i += 1;
        }
        while j < n2 && s2[j] <= x {
            j += 1;
        }
        let gap = (i as f64 / n1 as f64 - j as f64 / n2 as f64).abs();
        d_max = d_max.max(gap);
    }

    let n = (n1 * n2) as f64 / (n1 + n2) as f64;
    let z = d_max * n.sqrt();

    Some(KsTest {
        statistic: d_max,
        p_value: ks_p_value(z),
        n1,
        n2,
    })
}

/// Survival function of the Kolmogorov distribution.
///
/// P(K > z) = 2 Σ_{k>=1} (-1)^{k-1} exp(-2 k² z²)
pub fn ks_p_value(z: f64) -> f64 {
    if z <= 0.0 {
        return 1.0;
    }
    if z > 3.0 {
        return (2.0 * (-2.0 * z * z).exp()).clamp(0.0, 1.0);
    }

    let mut p = 0.0;
    for k in 1..=100 {
        let term = (-2.0 * (k as f64).powi(2) * z * z).exp();
        if k % 2 == 1 {
            p += term;
        } else {
            p -= term;
        }
        if term < 1e-12 {
            break;
        }
    }
    (2.0 * p).clamp(0.0, 1.0)
}
