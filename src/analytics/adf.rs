//! Augmented Dickey-Fuller unit-root test.
//!
//! Regression with constant, automatic lag selection by AIC up to the
//! Schwert-rule maxlag, MacKinnon approximate p-values and MacKinnon
//! (2010) finite-sample critical values. Matches the conventional
//! `adfuller` result contract.

use serde::Serialize;

use crate::error::{QuantStreamError, Result};

#[derive(Clone, Copy, Debug, Serialize)]
pub struct CriticalValues {
    #[serde(rename = "1%")]
    pub one_pct: f64,
    #[serde(rename = "5%")]
    pub five_pct: f64,
    #[serde(rename = "10%")]
    pub ten_pct: f64,
}

#[derive(Clone, Copy, Debug, Serialize)]
pub struct AdfResult {
    pub test_statistic: f64,
    pub p_value: f64,
    pub lags_used: usize,
    pub num_observations: usize,
    pub critical_values: CriticalValues,
}

/// Runs the ADF test on `series`, dropping non-finite values first.
/// A low p-value (conventionally < 0.05) indicates the series is
/// stationary, i.e. mean-reverting.
pub fn adf_test(series: &[f64]) -> Result<AdfResult> {
    let y: Vec<f64> = series.iter().copied().filter(|v| v.is_finite()).collect();
    let n = y.len();
    // Need room for at least a lag-0 regression with two coefficients.
    if n < 6 {
        return Err(QuantStreamError::InsufficientData { have: n, need: 6 });
    }

    // Schwert rule, capped so the regression keeps enough rows.
    let schwert = (12.0 * (n as f64 / 100.0).powf(0.25)).ceil() as usize;
    let maxlag = schwert.min(n / 2 - 3);

    // Lag selection: fit every candidate on the same sample (rows that
    // a maxlag regression would use) and keep the AIC minimizer.
    let mut best_lag = 0;
    let mut best_aic = f64::INFINITY;
    for lag in 0..=maxlag {
        if let Some(fit) = adf_ols(&y, lag, maxlag) {
            if fit.aic < best_aic {
                best_aic = fit.aic;
                best_lag = lag;
            }
        }
    }

    // Refit at the chosen lag using its full usable sample.
    let fit = adf_ols(&y, best_lag, best_lag)
        .ok_or(QuantStreamError::UndefinedRegression)?;

    let nobs = fit.nobs;
    Ok(AdfResult {
        test_statistic: fit.tstat,
        p_value: mackinnon_p(fit.tstat),
        lags_used: best_lag,
        num_observations: nobs,
        critical_values: mackinnon_crit(nobs),
    })
}

struct AdfFit {
    /// t-statistic of the lagged-level coefficient.
    tstat: f64,
    aic: f64,
    nobs: usize,
}

/// Fits dy[t] on (const, y[t-1], dy[t-1..t-lag]) using rows starting at
/// `offset` diffs in (so candidate lags share a sample when `offset` is
/// held at maxlag).
fn adf_ols(y: &[f64], lag: usize, offset: usize) -> Option<AdfFit> {
    let diffs: Vec<f64> = y.windows(2).map(|w| w[1] - w[0]).collect();
    let ncols = 2 + lag;
    let first = offset; // index into diffs
    let rows = diffs.len().checked_sub(first)?;
    if rows <= ncols {
        return None;
    }

    let mut xmat = Vec::with_capacity(rows);
    let mut dep = Vec::with_capacity(rows);
    for t in first..diffs.len() {
        let mut row = Vec::with_capacity(ncols);
        row.push(1.0);
        row.push(y[t]); // level lagged once relative to diffs[t]
        for l in 1..=lag {
            row.push(diffs[t - l]);
        }
        xmat.push(row);
        dep.push(diffs[t]);
    }

    let ols = ols_fit(&xmat, &dep)?;
    let m = rows as f64;
    let aic = m * (ols.ssr / m).ln() + 2.0 * ncols as f64;
    Some(AdfFit {
        tstat: ols.tstats[1],
        aic,
        nobs: rows,
    })
}

struct OlsFit {
    ssr: f64,
    tstats: Vec<f64>,
}

/// Dense OLS via normal equations; returns per-coefficient t-statistics.
fn ols_fit(x: &[Vec<f64>], y: &[f64]) -> Option<OlsFit> {
    let m = x.len();
    let p = x[0].len();
    if m <= p {
        return None;
    }

    // X'X and X'y
    let mut xtx = vec![vec![0.0; p]; p];
    let mut xty = vec![0.0; p];
    for (row, yv) in x.iter().zip(y) {
        for i in 0..p {
            xty[i] += row[i] * yv;
            for j in i..p {
                xtx[i][j] += row[i] * row[j];
            }
        }
    }
    for i in 0..p {
        for j in 0..i {
            xtx[i][j] = xtx[j][i];
        }
    }

    let inv = invert(&mut xtx.clone())?;
    let beta: Vec<f64> = (0..p)
        .map(|i| (0..p).map(|j| inv[i][j] * xty[j]).sum())
        .collect();

    let mut ssr = 0.0;
    for (row, yv) in x.iter().zip(y) {
        let fitted: f64 = row.iter().zip(&beta).map(|(xv, b)| xv * b).sum();
        let resid = yv - fitted;
        ssr += resid * resid;
    }
    let sigma2 = ssr / (m - p) as f64;

    let mut tstats = Vec::with_capacity(p);
    for i in 0..p {
        let se = (sigma2 * inv[i][i]).sqrt();
        if se == 0.0 || !se.is_finite() {
            return None;
        }
        tstats.push(beta[i] / se);
    }
    Some(OlsFit { ssr, tstats })
}

/// Gauss-Jordan inverse for the small symmetric X'X matrices used here.
fn invert(a: &mut [Vec<f64>]) -> Option<Vec<Vec<f64>>> {
    let p = a.len();
    let mut inv = vec![vec![0.0; p]; p];
    for (i, row) in inv.iter_mut().enumerate() {
        row[i] = 1.0;
    }
    for col in 0..p {
        // Partial pivot.
        let pivot_row = (col..p).max_by(|&r1, &r2| {
            a[r1][col]
                .abs()
                .partial_cmp(&a[r2][col].abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })?;
        if a[pivot_row][col].abs() < 1e-12 {
            return None;
        }
        a.swap(col, pivot_row);
        inv.swap(col, pivot_row);
        let pivot = a[col][col];
        for j in 0..p {
            a[col][j] /= pivot;
            inv[col][j] /= pivot;
        }
        for r in 0..p {
            if r == col {
                continue;
            }
            let factor = a[r][col];
            if factor == 0.0 {
                continue;
            }
            for j in 0..p {
                a[r][j] -= factor * a[col][j];
                inv[r][j] -= factor * inv[col][j];
            }
        }
    }
    Some(inv)
}

// MacKinnon (1994) approximate asymptotic p-value for the constant-only
// Dickey-Fuller distribution.
const TAU_MAX: f64 = 2.74;
const TAU_MIN: f64 = -18.83;
const TAU_STAR: f64 = -1.61;
const TAU_SMALLP: [f64; 3] = [2.1659, 1.4412, 0.038269];
const TAU_LARGEP: [f64; 4] = [1.7339, 0.93202, -0.12745, -0.0024380];

fn mackinnon_p(stat: f64) -> f64 {
    if stat > TAU_MAX {
        return 1.0;
    }
    if stat < TAU_MIN {
        return 0.0;
    }
    let z = if stat <= TAU_STAR {
        polyval(&TAU_SMALLP, stat)
    } else {
        polyval(&TAU_LARGEP, stat)
    };
    norm_cdf(z)
}

fn polyval(coeffs: &[f64], x: f64) -> f64 {
    coeffs
        .iter()
        .enumerate()
        .map(|(i, c)| c * x.powi(i as i32))
        .sum()
}

/// Standard normal CDF via the Abramowitz & Stegun 7.1.26 erf
/// approximation (abs error < 1.5e-7).
fn norm_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / std::f64::consts::SQRT_2))
}

fn erf(x: f64) -> f64 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + 0.3275911 * x);
    let poly = t
        * (0.254829592
            + t * (-0.284496736 + t * (1.421413741 + t * (-1.453152027 + t * 1.061405429))));
    sign * (1.0 - poly * (-x * x).exp())
}

// MacKinnon (2010) finite-sample response-surface coefficients,
// constant-only regression, one variable.
const CRIT_1PCT: [f64; 4] = [-3.43035, -6.5393, -16.786, -79.433];
const CRIT_5PCT: [f64; 4] = [-2.86154, -2.8903, -4.234, -40.040];
const CRIT_10PCT: [f64; 4] = [-2.56677, -1.5384, -2.809, 0.0];

fn mackinnon_crit(nobs: usize) -> CriticalValues {
    let surface = |b: &[f64; 4]| {
        let n = nobs as f64;
        b[0] + b[1] / n + b[2] / (n * n) + b[3] / (n * n * n)
    };
    CriticalValues {
        one_pct: surface(&CRIT_1PCT),
        five_pct: surface(&CRIT_5PCT),
        ten_pct: surface(&CRIT_10PCT),
    }
}
