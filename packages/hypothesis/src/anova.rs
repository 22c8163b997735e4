//! Two-way ANOVA of `case_difference` on the mobility-variation and
//! hurricane-affected factors.
//!
//! Models are fitted by least squares on dummy-coded factors through an SVD
//! of the design matrix. The numerical rank of the design gives each term's
//! degrees of freedom, so a factor with a single observed level contributes
//! none.

#![allow(clippy::cast_precision_loss)]

use hurricane_impact_hypothesis_models::{AnovaRow, AnovaTable, AnovaType, CountyTestResult};
use nalgebra::{DMatrix, DVector};
use statrs::distribution::{ContinuousCDF, FisherSnedecor};

pub const MOBILITY_TERM: &str = "C(mobility_variation)";
pub const AFFECTED_TERM: &str = "C(affected_hurricane)";
pub const INTERACTION_TERM: &str = "C(mobility_variation):C(affected_hurricane)";
pub const RESIDUAL_TERM: &str = "Residual";

/// One observation of the two-factor design.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FactorialPoint {
    pub response: f64,
    pub mobility_variation: bool,
    pub affected_hurricane: bool,
}

impl From<&CountyTestResult> for FactorialPoint {
    fn from(result: &CountyTestResult) -> Self {
        Self {
            response: result.case_difference,
            mobility_variation: result.mobility_variation,
            affected_hurricane: result.affected_hurricane,
        }
    }
}

/// Residual sum of squares and rank of a least-squares fit.
#[derive(Debug, Clone, Copy)]
struct Fit {
    rss: f64,
    rank: usize,
}

fn fit<C: AsRef<[f64]>>(columns: &[C], y: &[f64]) -> Fit {
    let n = y.len();
    if n == 0 || columns.is_empty() {
        return Fit {
            rss: y.iter().map(|v| v * v).sum(),
            rank: 0,
        };
    }

    let design = DMatrix::from_fn(n, columns.len(), |i, j| columns[j].as_ref()[i]);
    let observed = DVector::from_column_slice(y);
    let svd = design.clone().svd(true, true);
    let tolerance = svd.singular_values.max() * n.max(columns.len()) as f64 * f64::EPSILON;
    let rank = svd.rank(tolerance);

    let rss = svd.solve(&observed, tolerance).map_or(f64::NAN, |coefficients| {
        (observed - design * coefficients).norm_squared()
    });
    Fit { rss, rank }
}

/// Fits `response ~ C(mobility_variation) * C(affected_hurricane)` and
/// returns the ANOVA table. Points with a `NaN` response are dropped.
#[must_use]
pub fn two_way_anova(points: &[FactorialPoint], anova_type: AnovaType) -> AnovaTable {
    let kept: Vec<&FactorialPoint> = points.iter().filter(|p| !p.response.is_nan()).collect();
    let n_dropped = points.len() - kept.len();
    if n_dropped > 0 {
        log::info!("ANOVA: dropped {n_dropped} rows with a missing case difference");
    }

    let indicator = |flag: bool| if flag { 1.0 } else { 0.0 };
    let y: Vec<f64> = kept.iter().map(|p| p.response).collect();
    let intercept = vec![1.0; kept.len()];
    let a: Vec<f64> = kept.iter().map(|p| indicator(p.mobility_variation)).collect();
    let b: Vec<f64> = kept.iter().map(|p| indicator(p.affected_hurricane)).collect();
    let ab: Vec<f64> = a.iter().zip(&b).map(|(x, y)| x * y).collect();

    let base = fit(&[&intercept], &y);
    let with_a = fit(&[&intercept, &a], &y);
    let with_b = fit(&[&intercept, &b], &y);
    let main = fit(&[&intercept, &a, &b], &y);
    let full = fit(&[&intercept, &a, &b, &ab], &y);

    let (ss_a, df_a, ss_b, df_b) = match anova_type {
        AnovaType::Type1 => (
            base.rss - with_a.rss,
            with_a.rank.saturating_sub(base.rank),
            with_a.rss - main.rss,
            main.rank.saturating_sub(with_a.rank),
        ),
        AnovaType::Type2 => (
            with_b.rss - main.rss,
            main.rank.saturating_sub(with_b.rank),
            with_a.rss - main.rss,
            main.rank.saturating_sub(with_a.rank),
        ),
    };
    let ss_ab = main.rss - full.rss;
    let df_ab = full.rank.saturating_sub(main.rank);

    let df_resid = kept.len().saturating_sub(full.rank) as f64;
    let residual_mean_sq = if df_resid > 0.0 {
        full.rss / df_resid
    } else {
        f64::NAN
    };

    let term = |name: &str, sum_sq: f64, df: usize| {
        let sum_sq = sum_sq.max(0.0);
        let df = df as f64;
        let mean_sq = if df > 0.0 { sum_sq / df } else { f64::NAN };
        let f_value = mean_sq / residual_mean_sq;
        AnovaRow {
            term: name.to_string(),
            df,
            sum_sq,
            mean_sq,
            f_value,
            p_value: f_sf(f_value, df, df_resid),
        }
    };

    let rows = vec![
        term(MOBILITY_TERM, ss_a, df_a),
        term(AFFECTED_TERM, ss_b, df_b),
        term(INTERACTION_TERM, ss_ab, df_ab),
        AnovaRow {
            term: RESIDUAL_TERM.to_string(),
            df: df_resid,
            sum_sq: full.rss,
            mean_sq: residual_mean_sq,
            f_value: f64::NAN,
            p_value: f64::NAN,
        },
    ];

    AnovaTable {
        anova_type,
        n_observations: kept.len(),
        n_dropped,
        rows,
    }
}

fn f_sf(f_value: f64, df_num: f64, df_den: f64) -> f64 {
    if !f_value.is_finite() || df_num <= 0.0 || df_den <= 0.0 {
        return f64::NAN;
    }
    FisherSnedecor::new(df_num, df_den).map_or(f64::NAN, |dist| dist.sf(f_value))
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};
    use rand_distr::{Distribution, StandardNormal};

    use super::*;

    fn design(n: usize, response: impl Fn(usize, bool, bool) -> f64) -> Vec<FactorialPoint> {
        (0..n)
            .map(|i| {
                let a = i % 2 == 0;
                let b = (i / 2) % 2 == 0;
                FactorialPoint {
                    response: response(i, a, b),
                    mobility_variation: a,
                    affected_hurricane: b,
                }
            })
            .collect()
    }

    #[test]
    fn independent_response_rarely_shows_interaction() {
        let mut rng = StdRng::seed_from_u64(20_200_823);
        let mut not_significant = 0;
        for _ in 0..50 {
            let noise: Vec<f64> = (0..80).map(|_| StandardNormal.sample(&mut rng)).collect();
            let points = design(80, |i, _, _| noise[i]);
            let table = two_way_anova(&points, AnovaType::Type2);
            let interaction = table.row(INTERACTION_TERM).unwrap();
            if interaction.p_value > 0.05 {
                not_significant += 1;
            }
        }
        assert!(not_significant >= 40, "only {not_significant} of 50");
    }

    #[test]
    fn strong_interaction_is_detected() {
        let points = design(40, |i, a, b| {
            let effect = if a && b { 10.0 } else { 0.0 };
            effect + (i % 7) as f64 * 0.1
        });
        let table = two_way_anova(&points, AnovaType::Type2);
        assert!(table.row(INTERACTION_TERM).unwrap().p_value < 0.001);
        assert_eq!(table.row(RESIDUAL_TERM).unwrap().df, 36.0);
    }

    #[test]
    fn balanced_design_types_agree() {
        let points = design(24, |i, a, _| if a { 2.0 } else { 0.0 } + (i % 5) as f64);
        let type1 = two_way_anova(&points, AnovaType::Type1);
        let type2 = two_way_anova(&points, AnovaType::Type2);
        for (r1, r2) in type1.rows.iter().zip(&type2.rows) {
            assert_eq!(r1.term, r2.term);
            assert!((r1.sum_sq - r2.sum_sq).abs() < 1e-9, "{}", r1.term);
        }
    }

    #[test]
    fn unbalanced_design_separates_type1_from_type2() {
        let cells = [
            (false, false, 1.0),
            (false, false, 2.0),
            (false, true, 3.0),
            (true, false, 4.0),
            (true, false, 5.0),
            (true, false, 6.0),
            (true, true, 7.0),
            (true, true, 9.0),
        ];
        let points: Vec<FactorialPoint> = cells
            .iter()
            .map(|&(a, b, response)| FactorialPoint {
                response,
                mobility_variation: a,
                affected_hurricane: b,
            })
            .collect();

        let type1 = two_way_anova(&points, AnovaType::Type1);
        let type2 = two_way_anova(&points, AnovaType::Type2);
        let sum_sq = |table: &AnovaTable, term| table.row(term).unwrap().sum_sq;

        assert!((sum_sq(&type1, MOBILITY_TERM) - 1323.0 / 40.0).abs() < 1e-9);
        assert!((sum_sq(&type2, MOBILITY_TERM) - 12769.0 / 420.0).abs() < 1e-9);
        for table in [&type1, &type2] {
            assert!((sum_sq(table, AFFECTED_TERM) - 1587.0 / 140.0).abs() < 1e-9);
            assert!((sum_sq(table, INTERACTION_TERM) - 27.0 / 28.0).abs() < 1e-9);
            assert!((sum_sq(table, RESIDUAL_TERM) - 4.5).abs() < 1e-9);
            assert_eq!(table.row(RESIDUAL_TERM).unwrap().df, 4.0);
        }
    }

    #[test]
    fn sums_of_squares_add_up_when_balanced() {
        let points = design(16, |i, a, b| {
            f64::from(u8::from(a)) * 1.5 - f64::from(u8::from(b)) + (i % 3) as f64
        });
        let table = two_way_anova(&points, AnovaType::Type1);
        let total: f64 = table.rows.iter().map(|r| r.sum_sq).sum();

        let mean = points.iter().map(|p| p.response).sum::<f64>() / 16.0;
        let expected: f64 = points.iter().map(|p| (p.response - mean).powi(2)).sum();
        assert!((total - expected).abs() < 1e-9);
    }

    #[test]
    fn nan_responses_are_dropped() {
        let mut points = design(20, |i, _, _| (i % 4) as f64);
        points[3].response = f64::NAN;
        points[7].response = f64::NAN;
        let table = two_way_anova(&points, AnovaType::Type2);
        assert_eq!(table.n_observations, 18);
        assert_eq!(table.n_dropped, 2);
        assert!(table.rows.iter().all(|r| !r.sum_sq.is_nan()));
    }

    #[test]
    fn single_level_factor_has_no_degrees_of_freedom() {
        let points: Vec<FactorialPoint> = (0..10)
            .map(|i| FactorialPoint {
                response: (i % 3) as f64,
                mobility_variation: i % 2 == 0,
                affected_hurricane: true,
            })
            .collect();
        let table = two_way_anova(&points, AnovaType::Type2);
        let affected = table.row(AFFECTED_TERM).unwrap();
        assert_eq!(affected.df, 0.0);
        assert!(affected.p_value.is_nan());
        assert_eq!(table.row(INTERACTION_TERM).unwrap().df, 0.0);
        assert_eq!(table.row(MOBILITY_TERM).unwrap().df, 1.0);
        assert_eq!(table.row(RESIDUAL_TERM).unwrap().df, 8.0);
    }
}
