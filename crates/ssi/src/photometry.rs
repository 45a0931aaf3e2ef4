//! Disk-resolved photometric fits (Buratti et al. 1983).
//!
//! Both models reduce to a straight line in a transformed space:
//!
//! - Minnaert: `I/F = B₀ μ₀ᵏ μ₁ᵏ⁻¹`, fitted as
//!   `log(I/F) + log μ₁ = k (log μ₀ + log μ₁) + log B₀`
//! - Hapke (simplified): `I/F = A μ₀ / (μ₀ + μ₁) f(α) + (1 - A) μ₀`, fitted
//!   as `I/F / μ₀ - 1 = a / (μ₀ + μ₁) + b` with `A = -b` and `f(α) = -a / b`

use std::str::FromStr;

use isis_common::{IsisError, IsisResult, Mask};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::view::InstrumentView;

/// Least-squares line `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LineFit {
    pub fn eval(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Fit a line through the finite (x, y) pairs.
pub fn fit_line(x: &[f64], y: &[f64]) -> IsisResult<LineFit> {
    if x.len() != y.len() {
        return Err(IsisError::invalid_argument(format!(
            "x and y lengths differ: {} vs {}",
            x.len(),
            y.len()
        )));
    }

    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .map(|(&a, &b)| (a, b))
        .collect();
    if pairs.len() < 2 {
        return Err(IsisError::invalid_argument(format!(
            "line fit needs at least 2 finite points, got {}",
            pairs.len()
        )));
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let (sxx, sxy) = pairs.iter().fold((0.0, 0.0), |(sxx, sxy), &(a, b)| {
        let dx = a - mean_x;
        (sxx + dx * dx, sxy + dx * (b - mean_y))
    });
    if sxx == 0.0 {
        return Err(IsisError::invalid_argument(
            "line fit needs at least 2 distinct x values",
        ));
    }

    let slope = sxy / sxx;
    Ok(LineFit {
        slope,
        intercept: mean_y - slope * mean_x,
    })
}

/// Fit parameters with the reduced data and the fitted segment.
#[derive(Debug, Clone, PartialEq)]
pub struct FitDebug {
    /// (B₀, k) or (A, f(α)).
    pub params: (f64, f64),
    pub xdata: Vec<f64>,
    pub ydata: Vec<f64>,
    /// Fitted line evaluated at the finite x extrema.
    pub xfit: [f64; 2],
    pub yfit: [f64; 2],
}

fn check_lengths(i_f: &[f64], mu0: &[f64], mu1: &[f64]) -> IsisResult<()> {
    if i_f.len() != mu0.len() || i_f.len() != mu1.len() {
        return Err(IsisError::invalid_argument(format!(
            "photometric inputs differ in length: {}, {}, {}",
            i_f.len(),
            mu0.len(),
            mu1.len()
        )));
    }
    Ok(())
}

fn debug_output(params: (f64, f64), fit: LineFit, xdata: Vec<f64>, ydata: Vec<f64>) -> FitDebug {
    let finite = xdata.iter().copied().filter(|v| v.is_finite());
    let xmin = finite.clone().fold(f64::INFINITY, f64::min);
    let xmax = finite.fold(f64::NEG_INFINITY, f64::max);
    FitDebug {
        params,
        xdata,
        ydata,
        xfit: [xmin, xmax],
        yfit: [fit.eval(xmin), fit.eval(xmax)],
    }
}

fn minnaert_reduce(i_f: &[f64], mu0: &[f64], mu1: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let xdata = mu0.iter().zip(mu1).map(|(a, b)| a.ln() + b.ln()).collect();
    let ydata = i_f.iter().zip(mu1).map(|(r, b)| r.ln() + b.ln()).collect();
    (xdata, ydata)
}

fn hapke_reduce(i_f: &[f64], mu0: &[f64], mu1: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let xdata = mu0.iter().zip(mu1).map(|(a, b)| 1.0 / (a + b)).collect();
    let ydata = i_f.iter().zip(mu0).map(|(r, a)| r / a - 1.0).collect();
    (xdata, ydata)
}

/// Minnaert fit returning `(B₀, k)`.
pub fn fit_minnaert(i_f: &[f64], mu0: &[f64], mu1: &[f64]) -> IsisResult<(f64, f64)> {
    Ok(fit_minnaert_debug(i_f, mu0, mu1)?.params)
}

pub fn fit_minnaert_debug(i_f: &[f64], mu0: &[f64], mu1: &[f64]) -> IsisResult<FitDebug> {
    check_lengths(i_f, mu0, mu1)?;
    let (xdata, ydata) = minnaert_reduce(i_f, mu0, mu1);
    let fit = fit_line(&xdata, &ydata)?;
    let params = (fit.intercept.exp(), fit.slope);
    Ok(debug_output(params, fit, xdata, ydata))
}

/// Simplified Hapke fit returning `(A, f(α))`.
pub fn fit_hapke(i_f: &[f64], mu0: &[f64], mu1: &[f64]) -> IsisResult<(f64, f64)> {
    Ok(fit_hapke_debug(i_f, mu0, mu1)?.params)
}

pub fn fit_hapke_debug(i_f: &[f64], mu0: &[f64], mu1: &[f64]) -> IsisResult<FitDebug> {
    check_lengths(i_f, mu0, mu1)?;
    let (xdata, ydata) = hapke_reduce(i_f, mu0, mu1);
    let fit = fit_line(&xdata, &ydata)?;
    let params = (-fit.intercept, -fit.slope / fit.intercept);
    Ok(debug_output(params, fit, xdata, ydata))
}

/// Photometric model selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhotometricModel {
    Minnaert,
    Hapke,
}

impl FromStr for PhotometricModel {
    type Err = IsisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "minnaert" => Ok(Self::Minnaert),
            "hapke" => Ok(Self::Hapke),
            _ => Err(IsisError::invalid_argument(format!(
                "unknown model `{}`, only `minnaert` and `hapke` are available",
                s
            ))),
        }
    }
}

/// I/F, μ₀ and μ₁ of the pixels selected by `mask`.
fn select(view: &InstrumentView, mask: &Mask) -> IsisResult<[Vec<f64>; 3]> {
    let widen = |v: Vec<f32>| v.into_iter().map(f64::from).collect::<Vec<_>>();
    Ok([
        widen(view.data()?.select(mask)?),
        widen(view.mu0()?.select(mask)?),
        widen(view.mu1()?.select(mask)?),
    ])
}

/// Fit the pixels of `view` selected by `mask` with a model given by name.
pub fn fit(view: &InstrumentView, mask: &Mask, model: &str) -> IsisResult<(f64, f64)> {
    Ok(fit_debug(view, mask, model)?.params)
}

pub fn fit_debug(view: &InstrumentView, mask: &Mask, model: &str) -> IsisResult<FitDebug> {
    let model: PhotometricModel = model.parse()?;
    let [i_f, mu0, mu1] = select(view, mask)?;
    debug!(?model, pixels = i_f.len(), "Photometric fit");
    match model {
        PhotometricModel::Minnaert => fit_minnaert_debug(&i_f, &mu0, &mu1),
        PhotometricModel::Hapke => fit_hapke_debug(&i_f, &mu0, &mu1),
    }
}
