//! Statistics used by the detectors.
//!
//! Everything here works on plain aligned `f64` vectors; the detectors take
//! care of key alignment, smoothing and flooring before calling in.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::error::{FaultError, FaultResult};

const MAX_ITERATIONS: usize = 500;
const EPSILON: f64 = 1e-15;
const TINY: f64 = 1e-300;

const LANCZOS_G: f64 = 7.0;
const LANCZOS_COEFFICIENTS: [f64; 9] = [
    0.999_999_999_999_809_9,
    676.520_368_121_885_1,
    -1_259.139_216_722_402_8,
    771.323_428_777_653_1,
    -176.615_029_162_140_6,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_12,
    9.984_369_578_019_572e-6,
    1.505_632_735_149_311_6e-7,
];

/// Result of a Pearson chi-square goodness-of-fit test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChiSquareOutcome {
    /// Σ (oᵢ − eᵢ)² / eᵢ.
    pub statistic: f64,
    /// Number of categories minus one.
    pub degrees_of_freedom: usize,
    /// Probability of a statistic at least this large under the null.
    pub p_value: f64,
}

/// Pearson chi-square test of `observed` against `expected`.
///
/// Both slices must be the same non-zero length, finite, `observed`
/// non-negative and `expected` strictly positive. With a single category
/// there is nothing to test and the p-value is 1.
pub fn chi_square_test(observed: &[f64], expected: &[f64]) -> FaultResult<ChiSquareOutcome> {
    if observed.is_empty() {
        return Err(FaultError::StatisticalTest(
            "chi-square test needs at least one category".into(),
        ));
    }
    if observed.len() != expected.len() {
        return Err(FaultError::StatisticalTest(format!(
            "observed has {} categories but expected has {}",
            observed.len(),
            expected.len()
        )));
    }
    if let Some(o) = observed.iter().find(|o| !o.is_finite() || **o < 0.0) {
        return Err(FaultError::StatisticalTest(format!(
            "observed frequency {o} is not a finite non-negative number"
        )));
    }
    if let Some(e) = expected.iter().find(|e| !e.is_finite() || **e <= 0.0) {
        return Err(FaultError::StatisticalTest(format!(
            "expected frequency {e} is not a finite positive number"
        )));
    }

    let statistic: f64 = observed
        .iter()
        .zip(expected)
        .map(|(o, e)| (o - e).powi(2) / e)
        .sum();
    if !statistic.is_finite() {
        return Err(FaultError::StatisticalTest(format!(
            "chi-square statistic is not finite ({statistic})"
        )));
    }

    let degrees_of_freedom = observed.len() - 1;
    let p_value = if degrees_of_freedom == 0 {
        1.0
    } else {
        chi_square_survival(statistic, degrees_of_freedom as f64)
    };
    if !p_value.is_finite() {
        return Err(FaultError::StatisticalTest(format!(
            "p-value is not finite for statistic {statistic} with {degrees_of_freedom} degrees of freedom"
        )));
    }

    Ok(ChiSquareOutcome {
        statistic,
        degrees_of_freedom,
        p_value: p_value.clamp(0.0, 1.0),
    })
}

/// `P(X ≥ x)` for `X ~ χ²(k)`.
pub fn chi_square_survival(x: f64, k: f64) -> f64 {
    regularized_gamma_q(k / 2.0, x / 2.0)
}

/// Kullback-Leibler divergence `D(p ‖ q)` in nats.
///
/// Both inputs are rescaled to sum to 1 first. Terms with `pᵢ = 0`
/// contribute nothing; a term with `pᵢ > 0` and `qᵢ = 0` makes the result
/// infinite.
pub fn kl_divergence(p: &[f64], q: &[f64]) -> FaultResult<f64> {
    if p.len() != q.len() {
        return Err(FaultError::StatisticalTest(format!(
            "cannot compare distributions of length {} and {}",
            p.len(),
            q.len()
        )));
    }
    let p_total = checked_total(p, "p")?;
    let q_total = checked_total(q, "q")?;

    Ok(p.iter()
        .zip(q)
        .map(|(pi, qi)| {
            let (pi, qi) = (pi / p_total, qi / q_total);
            if pi == 0.0 {
                0.0
            } else if qi == 0.0 {
                f64::INFINITY
            } else {
                pi * (pi / qi).ln()
            }
        })
        .sum())
}

fn checked_total(values: &[f64], label: &str) -> FaultResult<f64> {
    if let Some(v) = values.iter().find(|v| !v.is_finite() || **v < 0.0) {
        return Err(FaultError::StatisticalTest(format!(
            "{label} contains invalid probability {v}"
        )));
    }
    let total: f64 = values.iter().sum();
    if total <= 0.0 {
        return Err(FaultError::StatisticalTest(format!(
            "{label} has no probability mass"
        )));
    }
    Ok(total)
}

/// The `q`-th percentile (`0 ≤ q ≤ 100`) with linear interpolation between
/// the two nearest order statistics.
pub fn percentile(values: &[f64], q: f64) -> FaultResult<f64> {
    if values.is_empty() {
        return Err(FaultError::StatisticalTest(
            "percentile of an empty sample".into(),
        ));
    }
    if !(0.0..=100.0).contains(&q) {
        return Err(FaultError::InvalidConfiguration(format!(
            "percentile {q} is outside [0, 100]"
        )));
    }
    if values.iter().any(|v| v.is_nan()) {
        return Err(FaultError::StatisticalTest(
            "percentile of a sample containing NaN".into(),
        ));
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let rank = q / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    if lo == hi {
        return Ok(sorted[lo]);
    }
    Ok(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Derive an independent seed for stream `index` from `base` (SplitMix64).
pub fn stream_seed(base: u64, index: u64) -> u64 {
    let mut z = base.wrapping_add(index.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// `ln Γ(x)` for `x > 0` (Lanczos, g = 7).
pub fn ln_gamma(x: f64) -> f64 {
    if x < 0.5 {
        // Reflection: Γ(x)Γ(1−x) = π / sin(πx)
        return (PI / (PI * x).sin()).ln() - ln_gamma(1.0 - x);
    }
    let x = x - 1.0;
    let t = x + LANCZOS_G + 0.5;
    let series = LANCZOS_COEFFICIENTS
        .iter()
        .enumerate()
        .skip(1)
        .fold(LANCZOS_COEFFICIENTS[0], |acc, (i, c)| acc + c / (x + i as f64));
    0.5 * (2.0 * PI).ln() + (x + 0.5) * t.ln() - t + series.ln()
}

/// Regularized upper incomplete gamma `Q(a, x) = Γ(a, x) / Γ(a)`.
pub fn regularized_gamma_q(a: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 1.0;
    }
    if x < a + 1.0 {
        1.0 - lower_gamma_series(a, x)
    } else {
        upper_gamma_continued_fraction(a, x)
    }
}

fn lower_gamma_series(a: f64, x: f64) -> f64 {
    let mut ap = a;
    let mut term = 1.0 / a;
    let mut sum = term;
    for _ in 0..MAX_ITERATIONS {
        ap += 1.0;
        term *= x / ap;
        sum += term;
        if term.abs() < sum.abs() * EPSILON {
            break;
        }
    }
    sum * (-x + a * x.ln() - ln_gamma(a)).exp()
}

// Modified Lentz evaluation.
fn upper_gamma_continued_fraction(a: f64, x: f64) -> f64 {
    let mut b = x + 1.0 - a;
    let mut c = 1.0 / TINY;
    let mut d = 1.0 / b;
    let mut h = d;
    for i in 1..MAX_ITERATIONS {
        let an = -(i as f64) * (i as f64 - a);
        b += 2.0;
        d = an * d + b;
        if d.abs() < TINY {
            d = TINY;
        }
        c = b + an / c;
        if c.abs() < TINY {
            c = TINY;
        }
        d = 1.0 / d;
        let delta = d * c;
        h *= delta;
        if (delta - 1.0).abs() < EPSILON {
            break;
        }
    }
    (-x + a * x.ln() - ln_gamma(a)).exp() * h
}
