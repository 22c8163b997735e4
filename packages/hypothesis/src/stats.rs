//! Descriptive statistics, Student t-tests, Shapiro-Wilk and p-value
//! corrections.
//!
//! Descriptive helpers ([`mean`], [`variance`]) skip `NaN` values. The
//! t-tests do not: a `NaN` anywhere in the input, an empty group or a
//! group too small for a variance yields a `NaN` statistic and p-value.

#![allow(clippy::cast_precision_loss)]

use hurricane_impact_hypothesis_models::{Alternative, Correction, TestOutcome};
use statrs::distribution::{ContinuousCDF, Normal, StudentsT};

/// Mean of the non-`NaN` values, `NaN` if there are none.
#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    let (sum, count) = values
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0_usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

/// Sample variance (`ddof = 1`) of the non-`NaN` values, `NaN` with fewer
/// than two.
#[must_use]
pub fn variance(values: &[f64]) -> f64 {
    let finite: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    raw_variance(&finite)
}

fn raw_mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn raw_variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = raw_mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64
}

/// One-sample t-test of `sample` against `popmean`.
#[must_use]
pub fn ttest_1samp(sample: &[f64], popmean: f64, alternative: Alternative) -> TestOutcome {
    let n = sample.len() as f64;
    let standard_error = (raw_variance(sample) / n).sqrt();
    let statistic = (raw_mean(sample) - popmean) / standard_error;
    TestOutcome {
        statistic,
        p_value: t_p_value(statistic, n - 1.0, alternative),
    }
}

/// Independent two-sample t-test with pooled variance.
///
/// `alternative` is phrased for `a` relative to `b`.
#[must_use]
pub fn ttest_ind(a: &[f64], b: &[f64], alternative: Alternative) -> TestOutcome {
    if a.is_empty() || b.is_empty() {
        return TestOutcome::NAN;
    }
    let (n1, n2) = (a.len() as f64, b.len() as f64);
    let df = n1 + n2 - 2.0;
    let pooled = (n1 - 1.0).mul_add(raw_variance(a), (n2 - 1.0) * raw_variance(b)) / df;
    let standard_error = (pooled * (1.0 / n1 + 1.0 / n2)).sqrt();
    let statistic = (raw_mean(a) - raw_mean(b)) / standard_error;
    TestOutcome {
        statistic,
        p_value: t_p_value(statistic, df, alternative),
    }
}

fn t_p_value(statistic: f64, df: f64, alternative: Alternative) -> f64 {
    if statistic.is_nan() || df.is_nan() || df <= 0.0 {
        return f64::NAN;
    }
    let Ok(dist) = StudentsT::new(0.0, 1.0, df) else {
        return f64::NAN;
    };
    let cdf = |x: f64| {
        if x.is_infinite() {
            if x > 0.0 { 1.0 } else { 0.0 }
        } else {
            dist.cdf(x)
        }
    };
    match alternative {
        Alternative::TwoSided => (2.0 * cdf(-statistic.abs())).min(1.0),
        Alternative::Less => cdf(statistic),
        Alternative::Greater => cdf(-statistic),
    }
}

/// Adjusts a family of p-values. `NaN` entries stay `NaN` and do not count
/// towards the family size.
#[must_use]
pub fn adjust_p_values(p_values: &[f64], correction: Correction) -> Vec<f64> {
    let family = p_values.iter().filter(|p| !p.is_nan()).count() as f64;
    match correction {
        Correction::None => p_values.to_vec(),
        Correction::Bonferroni => p_values
            .iter()
            .map(|p| if p.is_nan() { *p } else { (p * family).min(1.0) })
            .collect(),
        Correction::Holm => {
            let mut order: Vec<usize> = (0..p_values.len())
                .filter(|i| !p_values[*i].is_nan())
                .collect();
            order.sort_by(|a, b| p_values[*a].total_cmp(&p_values[*b]));

            let mut adjusted = vec![f64::NAN; p_values.len()];
            let mut running_max = 0.0_f64;
            for (rank, index) in order.into_iter().enumerate() {
                let scaled = ((family - rank as f64) * p_values[index]).min(1.0);
                running_max = running_max.max(scaled);
                adjusted[index] = running_max;
            }
            adjusted
        }
    }
}

/// Shapiro-Wilk W statistic and p-value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapiroWilk {
    pub w: f64,
    pub p_value: f64,
}

const C1: [f64; 6] = [0.0, 0.221_157, -0.147_981, -2.071_190, 4.434_685, -2.706_056];
const C2: [f64; 6] = [0.0, 0.042_981, -0.293_762, -1.752_461, 5.682_633, -3.582_633];
const C3: [f64; 4] = [0.544, -0.399_78, 0.025_054, -6.714e-4];
const C4: [f64; 4] = [1.382_2, -0.778_57, 0.062_767, -0.002_032_2];
const C5: [f64; 4] = [-1.586_1, -0.310_82, -0.083_751, 0.003_891_5];
const C6: [f64; 3] = [-0.480_3, -0.082_676, 0.003_030_2];
const G: [f64; 2] = [-2.273, 0.459];

/// Shapiro-Wilk normality test (Royston's approximation).
///
/// Returns `NaN` for fewer than three values, any `NaN` value or data with
/// zero range.
#[must_use]
pub fn shapiro_wilk(values: &[f64]) -> ShapiroWilk {
    const NAN: ShapiroWilk = ShapiroWilk {
        w: f64::NAN,
        p_value: f64::NAN,
    };

    let n = values.len();
    if n < 3 || values.iter().any(|v| v.is_nan()) {
        return NAN;
    }
    let mut x = values.to_vec();
    x.sort_by(f64::total_cmp);
    if x[n - 1] - x[0] <= f64::EPSILON * x[n - 1].abs().max(1.0) {
        return NAN;
    }
    let Some(coefficients) = shapiro_coefficients(n) else {
        return NAN;
    };

    let numerator: f64 = coefficients
        .iter()
        .enumerate()
        .map(|(i, a)| a * (x[n - 1 - i] - x[i]))
        .sum();
    let m = raw_mean(&x);
    let ss: f64 = x.iter().map(|v| (v - m).powi(2)).sum();
    let w = (numerator * numerator / ss).min(1.0);

    ShapiroWilk {
        w,
        p_value: shapiro_p_value(w, n),
    }
}

/// Positive half of the antisymmetric coefficient vector, `a_1..a_{n/2}`.
fn shapiro_coefficients(n: usize) -> Option<Vec<f64>> {
    let half = n / 2;
    if n == 3 {
        return Some(vec![std::f64::consts::FRAC_1_SQRT_2]);
    }

    let normal = Normal::new(0.0, 1.0).ok()?;
    let an = n as f64;
    let m: Vec<f64> = (1..=half)
        .map(|i| -normal.inverse_cdf((i as f64 - 0.375) / (an + 0.25)))
        .collect();
    let summ2 = 2.0 * m.iter().map(|v| v * v).sum::<f64>();
    let ssumm2 = summ2.sqrt();
    let rsn = 1.0 / an.sqrt();

    let a1 = m[0] / ssumm2 + poly(&C1, rsn);
    let mut a = Vec::with_capacity(half);
    a.push(a1);
    let (fac, first) = if n > 5 {
        let a2 = m[1] / ssumm2 + poly(&C2, rsn);
        a.push(a2);
        let fac = ((summ2 - 2.0 * m[0].powi(2) - 2.0 * m[1].powi(2))
            / (1.0 - 2.0 * a1.powi(2) - 2.0 * a2.powi(2)))
        .sqrt();
        (fac, 2)
    } else {
        let fac = ((summ2 - 2.0 * m[0].powi(2)) / (1.0 - 2.0 * a1.powi(2))).sqrt();
        (fac, 1)
    };
    a.extend(m[first..].iter().map(|mi| mi / fac));
    Some(a)
}

fn shapiro_p_value(w: f64, n: usize) -> f64 {
    if n == 3 {
        let p = 6.0 / std::f64::consts::PI
            * (w.sqrt().asin() - std::f64::consts::FRAC_PI_3);
        return p.clamp(0.0, 1.0);
    }
    if w >= 1.0 {
        return 1.0;
    }

    let an = n as f64;
    let mut y = (1.0 - w).ln();
    let (mean, sd) = if n <= 11 {
        let gamma = poly(&G, an);
        if y >= gamma {
            return 1e-99;
        }
        y = -(gamma - y).ln();
        (poly(&C3, an), poly(&C4, an).exp())
    } else {
        let ln_n = an.ln();
        (poly(&C5, ln_n), poly(&C6, ln_n).exp())
    };

    Normal::new(mean, sd).map_or(f64::NAN, |dist| dist.sf(y))
}

/// `c[0] + c[1] x + c[2] x^2 + ...`
fn poly(coefficients: &[f64], x: f64) -> f64 {
    coefficients
        .iter()
        .rev()
        .fold(0.0, |acc, c| acc.mul_add(x, *c))
}
