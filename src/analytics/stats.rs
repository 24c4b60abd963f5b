//! Pairs-trading statistics: OLS hedge ratio, spread, z-score and
//! rolling correlation. All functions are pure and operate over an
//! already-aligned pair of price series.

use crate::error::{QuantStreamError, Result};

/// Fitted Y = intercept + hedge_ratio * X model.
#[derive(Clone, Copy, Debug)]
pub struct Regression {
    pub hedge_ratio: f64,
    pub intercept: f64,
}

impl Regression {
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.hedge_ratio * x
    }
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator).
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}

/// OLS regression of Y on X with intercept. The slope is the hedge
/// ratio. A zero-variance X makes the regression ill-posed; that is
/// reported explicitly, never as a fabricated slope of 0.
pub fn hedge_ratio(y: &[f64], x: &[f64]) -> Result<Regression> {
    if y.len() != x.len() || y.len() < 2 {
        return Err(QuantStreamError::InsufficientData {
            have: y.len().min(x.len()),
            need: 2,
        });
    }
    let mx = mean(x);
    let my = mean(y);
    let sxx: f64 = x.iter().map(|v| (v - mx) * (v - mx)).sum();
    if sxx == 0.0 {
        return Err(QuantStreamError::UndefinedRegression);
    }
    let sxy: f64 = x.iter().zip(y).map(|(xv, yv)| (xv - mx) * (yv - my)).sum();
    let slope = sxy / sxx;
    Ok(Regression {
        hedge_ratio: slope,
        intercept: my - slope * mx,
    })
}

/// Spread = Y - hedge_ratio * X, elementwise.
pub fn spread(y: &[f64], x: &[f64], hedge_ratio: f64) -> Vec<f64> {
    y.iter().zip(x).map(|(yv, xv)| yv - hedge_ratio * xv).collect()
}

/// Z-score of the spread against its own mean and sample std. A spread
/// with exactly zero std carries no variance to normalize, so every
/// z-score is defined as 0.
pub fn zscore(spread: &[f64]) -> Vec<f64> {
    let m = mean(spread);
    let sd = std_dev(spread);
    if sd == 0.0 {
        return vec![0.0; spread.len()];
    }
    spread.iter().map(|s| (s - m) / sd).collect()
}

/// Pearson correlation over a trailing window of `window` points.
/// Positions before the window has filled are `None`. Fails with the
/// insufficient-data condition when the series is shorter than the
/// window.
pub fn rolling_correlation(
    y: &[f64],
    x: &[f64],
    window: usize,
) -> Result<Vec<Option<f64>>> {
    if window < 2 {
        return Err(QuantStreamError::InsufficientData { have: window, need: 2 });
    }
    let n = y.len().min(x.len());
    if n < window {
        return Err(QuantStreamError::InsufficientData { have: n, need: window });
    }
    let mut out = vec![None; n];
    for end in window..=n {
        let ys = &y[end - window..end];
        let xs = &x[end - window..end];
        out[end - 1] = pearson(ys, xs);
    }
    Ok(out)
}

fn pearson(y: &[f64], x: &[f64]) -> Option<f64> {
    let my = mean(y);
    let mx = mean(x);
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (yv, xv) in y.iter().zip(x) {
        let dy = yv - my;
        let dx = xv - mx;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some(sxy / (sxx * syy).sqrt())
}
