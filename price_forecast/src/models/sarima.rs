//! Seasonal ARIMA estimated by conditional sum of squares
//!
//! The model is written in lag-operator form as
//!
//! `φ(B) Φ(B^s) (1 - B)^d (1 - B^s)^D y_t = θ(B) Θ(B^s) e_t`
//!
//! Coefficients are kept inside the stationary/invertible region by
//! mapping unconstrained values through partial autocorrelations.

use super::{ForecastModel, ForecastResult, TrainedForecastModel};
use crate::error::{ForecastError, Result};
use crate::optimize::{nelder_mead, NelderMeadOptions};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use std::f64::consts::PI;
use std::fmt;
use tracing::{debug, warn};

const MAX_ORDER: usize = 5;
const MAX_DIFFERENCE: usize = 2;
const MAX_SEASONAL_ORDER: usize = 2;
const MAX_SEASONAL_DIFFERENCE: usize = 1;

/// Non-seasonal order `(p, d, q)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub p: usize,
    pub d: usize,
    pub q: usize,
}

impl From<[usize; 3]> for Order {
    fn from([p, d, q]: [usize; 3]) -> Self {
        Self { p, d, q }
    }
}

/// Seasonal order `(P, D, Q, s)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonalOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
    pub s: usize,
}

impl SeasonalOrder {
    fn is_active(&self) -> bool {
        self.p + self.d + self.q > 0
    }
}

impl From<[usize; 4]> for SeasonalOrder {
    fn from([p, d, q, s]: [usize; 4]) -> Self {
        Self { p, d, q, s }
    }
}

/// SARIMA orders and estimation options, before fitting
#[derive(Debug, Clone)]
pub struct SarimaModel {
    name: String,
    order: Order,
    seasonal: SeasonalOrder,
    options: NelderMeadOptions,
    confidence_level: f64,
}

impl SarimaModel {
    /// Create a new SARIMA model
    pub fn new(order: Order, seasonal: SeasonalOrder) -> Result<Self> {
        if order.p > MAX_ORDER || order.q > MAX_ORDER {
            return Err(ForecastError::InvalidParameter(format!(
                "AR and MA orders must be at most {}",
                MAX_ORDER
            )));
        }
        if order.d > MAX_DIFFERENCE {
            return Err(ForecastError::InvalidParameter(format!(
                "Differencing order must be at most {}",
                MAX_DIFFERENCE
            )));
        }
        if seasonal.p > MAX_SEASONAL_ORDER || seasonal.q > MAX_SEASONAL_ORDER {
            return Err(ForecastError::InvalidParameter(format!(
                "Seasonal AR and MA orders must be at most {}",
                MAX_SEASONAL_ORDER
            )));
        }
        if seasonal.d > MAX_SEASONAL_DIFFERENCE {
            return Err(ForecastError::InvalidParameter(format!(
                "Seasonal differencing order must be at most {}",
                MAX_SEASONAL_DIFFERENCE
            )));
        }
        if seasonal.is_active() && seasonal.s < 2 {
            return Err(ForecastError::InvalidParameter(
                "Seasonal period must be at least 2".to_string(),
            ));
        }

        let name = format!(
            "SARIMA({},{},{})({},{},{},{})",
            order.p, order.d, order.q, seasonal.p, seasonal.d, seasonal.q, seasonal.s
        );

        Ok(Self {
            name,
            order,
            seasonal,
            options: NelderMeadOptions::default(),
            confidence_level: 0.95,
        })
    }

    /// Create a model from plain order arrays, e.g. `[1, 1, 1]` and `[1, 1, 1, 12]`
    pub fn from_orders(order: [usize; 3], seasonal: [usize; 4]) -> Result<Self> {
        Self::new(order.into(), seasonal.into())
    }

    /// Cap the number of optimiser iterations
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.options.max_iterations = max_iterations.max(1);
        self
    }

    /// Coverage of the prediction intervals produced by the trained model
    pub fn with_confidence_level(mut self, level: f64) -> Result<Self> {
        if !(level > 0.0 && level < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "Confidence level must be in (0, 1), got {}",
                level
            )));
        }
        self.confidence_level = level;
        Ok(self)
    }

    pub fn order(&self) -> Order {
        self.order
    }

    pub fn seasonal_order(&self) -> SeasonalOrder {
        self.seasonal
    }

    fn period(&self) -> usize {
        if self.seasonal.is_active() {
            self.seasonal.s
        } else {
            0
        }
    }

    fn n_params(&self) -> usize {
        self.order.p + self.order.q + self.seasonal.p + self.seasonal.q
    }

    fn ar_degree(&self) -> usize {
        self.order.p + self.period() * self.seasonal.p
    }

    fn ma_degree(&self) -> usize {
        self.order.q + self.period() * self.seasonal.q
    }

    fn difference_degree(&self) -> usize {
        self.order.d + self.period() * self.seasonal.d
    }

    /// Smallest series length the model can be estimated on
    pub fn min_observations(&self) -> usize {
        self.difference_degree() + self.ar_degree() + self.ma_degree() + self.n_params() + 1
    }

    /// Map an unconstrained parameter vector to model coefficients
    fn unpack(&self, x: &[f64]) -> Coefficients {
        let (p, q) = (self.order.p, self.order.q);
        let (sp, sq) = (self.seasonal.p, self.seasonal.q);

        let ar = constrain_stationary(&x[..p]);
        let ma = negate(constrain_stationary(&x[p..p + q]));
        let seasonal_ar = constrain_stationary(&x[p + q..p + q + sp]);
        let seasonal_ma = negate(constrain_stationary(&x[p + q + sp..p + q + sp + sq]));

        Coefficients {
            ar,
            ma,
            seasonal_ar,
            seasonal_ma,
        }
    }
}

impl ForecastModel for SarimaModel {
    type Trained = TrainedSarima;

    fn train(&self, data: &[f64]) -> Result<Self::Trained> {
        if data.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::DataError(
                "Series contains non-finite values".to_string(),
            ));
        }
        let required = self.min_observations();
        if data.len() < required {
            return Err(ForecastError::InsufficientData {
                required,
                actual: data.len(),
            });
        }

        let period = self.period();
        let difference = differencing_polynomial(self.order.d, self.seasonal.d, period);
        let differenced = apply_polynomial(&difference, data);
        let start = self.ar_degree();
        let n_effective = differenced.len() - start;

        let objective = |x: &[f64]| {
            let coefficients = self.unpack(x);
            let (ar, ma) = coefficients.lag_polynomials(period);
            let residuals = css_residuals(&differenced, &ar, &ma);
            sum_of_squares(&residuals[start..]) / n_effective as f64
        };

        let minimum = nelder_mead(objective, &vec![0.0; self.n_params()], &self.options);
        if !minimum.value.is_finite() {
            return Err(ForecastError::ModelError(format!(
                "{}: objective is not finite at the optimum",
                self.name
            )));
        }
        if !minimum.converged {
            warn!(
                model = %self.name,
                iterations = minimum.iterations,
                "optimiser stopped before converging"
            );
        }

        let coefficients = self.unpack(&minimum.x);
        let (ar_polynomial, ma_polynomial) = coefficients.lag_polynomials(period);
        let residuals = css_residuals(&differenced, &ar_polynomial, &ma_polynomial);
        let sigma2 = sum_of_squares(&residuals[start..]) / n_effective as f64;

        let log_likelihood = if sigma2 > 0.0 {
            Some(-0.5 * n_effective as f64 * ((2.0 * PI * sigma2).ln() + 1.0))
        } else {
            None
        };
        let aic = log_likelihood.map(|llf| -2.0 * llf + 2.0 * (self.n_params() + 1) as f64);

        let summary = FitSummary {
            model: self.name.clone(),
            coefficients: coefficients.named(period),
            sigma2,
            log_likelihood,
            aic,
            n_effective,
            iterations: minimum.iterations,
            converged: minimum.converged,
        };
        debug!(model = %self.name, sigma2, iterations = minimum.iterations, "fitted");

        Ok(TrainedSarima {
            name: self.name.clone(),
            confidence_level: self.confidence_level,
            ar_polynomial,
            ma_polynomial,
            difference,
            history: data.to_vec(),
            differenced,
            residuals,
            summary,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Estimation summary of a fitted SARIMA model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitSummary {
    pub model: String,
    /// Coefficients named by lag, e.g. `ar.L1` or `ma.S.L12`
    pub coefficients: Vec<(String, f64)>,
    /// Innovation variance
    pub sigma2: f64,
    /// Gaussian log-likelihood, `None` for a perfect fit
    pub log_likelihood: Option<f64>,
    pub aic: Option<f64>,
    /// Residuals that entered the objective
    pub n_effective: usize,
    pub iterations: usize,
    pub converged: bool,
}

impl FitSummary {
    /// Look up a coefficient by name
    pub fn coefficient(&self, name: &str) -> Option<f64> {
        self.coefficients
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }
}

impl fmt::Display for FitSummary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.model)?;
        for (name, value) in &self.coefficients {
            writeln!(f, "  {:<10} {:>10.4}", name, value)?;
        }
        writeln!(f, "  {:<10} {:>10.4}", "sigma2", self.sigma2)?;
        if let Some(aic) = self.aic {
            writeln!(f, "  {:<10} {:>10.2}", "aic", aic)?;
        }
        write!(
            f,
            "  converged: {} after {} iterations",
            self.converged, self.iterations
        )
    }
}

/// SARIMA model fitted to a series
#[derive(Debug, Clone)]
pub struct TrainedSarima {
    name: String,
    confidence_level: f64,
    /// Expanded `φ(B)Φ(B^s)`, leading coefficient 1
    ar_polynomial: Vec<f64>,
    /// Expanded `θ(B)Θ(B^s)`, leading coefficient 1
    ma_polynomial: Vec<f64>,
    /// Expanded `(1 - B)^d (1 - B^s)^D`
    difference: Vec<f64>,
    history: Vec<f64>,
    differenced: Vec<f64>,
    residuals: Vec<f64>,
    summary: FitSummary,
}

impl TrainedSarima {
    /// Innovation variance
    pub fn sigma2(&self) -> f64 {
        self.summary.sigma2
    }

    /// Point forecasts for the next `horizons` steps
    pub fn point_forecast(&self, horizons: usize) -> Vec<f64> {
        let mut w = self.differenced.clone();
        let mut e = self.residuals.clone();

        for _ in 0..horizons {
            let t = w.len();
            let mut next = 0.0;
            for (k, a) in self.ar_polynomial.iter().enumerate().skip(1) {
                if t >= k {
                    next -= a * w[t - k];
                }
            }
            for (k, m) in self.ma_polynomial.iter().enumerate().skip(1) {
                if t >= k {
                    next += m * e[t - k];
                }
            }
            w.push(next);
            e.push(0.0);
        }

        let mut y = self.history.clone();
        let n = y.len();
        for w_t in &w[self.differenced.len()..] {
            let t = y.len();
            let mut next = *w_t;
            for (k, c) in self.difference.iter().enumerate().skip(1) {
                next -= c * y[t - k];
            }
            y.push(next);
        }

        y.split_off(n)
    }

    /// Moving-average weights of the integrated model
    fn psi_weights(&self, horizons: usize) -> Vec<f64> {
        let full_ar = polymul(&self.ar_polynomial, &self.difference);
        let mut psi = Vec::with_capacity(horizons);

        for j in 0..horizons {
            if j == 0 {
                psi.push(1.0);
                continue;
            }
            let mut value = self.ma_polynomial.get(j).copied().unwrap_or(0.0);
            for k in 1..full_ar.len().min(j + 1) {
                value -= full_ar[k] * psi[j - k];
            }
            psi.push(value);
        }
        psi
    }
}

impl TrainedForecastModel for TrainedSarima {
    fn forecast(&self, horizons: usize) -> Result<ForecastResult> {
        let values = self.point_forecast(horizons);

        let normal = Normal::new(0.0, 1.0)
            .map_err(|e| ForecastError::MathError(e.to_string()))?;
        let z = normal.inverse_cdf(0.5 + self.confidence_level / 2.0);

        let mut cumulative = 0.0;
        let intervals = self
            .psi_weights(horizons)
            .iter()
            .zip(&values)
            .map(|(psi, value)| {
                cumulative += psi * psi;
                let half_width = z * (self.summary.sigma2 * cumulative).sqrt();
                (value - half_width, value + half_width)
            })
            .collect();

        ForecastResult::new_with_intervals(values, horizons, intervals, self.confidence_level)
    }

    fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    fn fit_summary(&self) -> Option<&FitSummary> {
        Some(&self.summary)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone)]
struct Coefficients {
    ar: Vec<f64>,
    ma: Vec<f64>,
    seasonal_ar: Vec<f64>,
    seasonal_ma: Vec<f64>,
}

impl Coefficients {
    /// Expanded AR and MA lag polynomials, each with leading coefficient 1
    fn lag_polynomials(&self, period: usize) -> (Vec<f64>, Vec<f64>) {
        let ar = polymul(
            &lag_polynomial(&self.ar, 1, -1.0),
            &lag_polynomial(&self.seasonal_ar, period, -1.0),
        );
        let ma = polymul(
            &lag_polynomial(&self.ma, 1, 1.0),
            &lag_polynomial(&self.seasonal_ma, period, 1.0),
        );
        (ar, ma)
    }

    fn named(&self, period: usize) -> Vec<(String, f64)> {
        let mut named = Vec::new();
        for (i, v) in self.ar.iter().enumerate() {
            named.push((format!("ar.L{}", i + 1), *v));
        }
        for (i, v) in self.ma.iter().enumerate() {
            named.push((format!("ma.L{}", i + 1), *v));
        }
        for (i, v) in self.seasonal_ar.iter().enumerate() {
            named.push((format!("ar.S.L{}", (i + 1) * period), *v));
        }
        for (i, v) in self.seasonal_ma.iter().enumerate() {
            named.push((format!("ma.S.L{}", (i + 1) * period), *v));
        }
        named
    }
}

/// `1 + sign * Σ c_i B^(i * step)`
fn lag_polynomial(coefficients: &[f64], step: usize, sign: f64) -> Vec<f64> {
    let mut poly = vec![0.0; coefficients.len() * step + 1];
    poly[0] = 1.0;
    for (i, c) in coefficients.iter().enumerate() {
        poly[(i + 1) * step] = sign * c;
    }
    poly
}

fn polymul(a: &[f64], b: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, x) in a.iter().enumerate() {
        for (j, y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

/// Expanded `(1 - B)^d (1 - B^s)^D`
pub fn differencing_polynomial(d: usize, seasonal_d: usize, period: usize) -> Vec<f64> {
    let mut poly = vec![1.0];
    for _ in 0..d {
        poly = polymul(&poly, &[1.0, -1.0]);
    }
    if period > 0 {
        for _ in 0..seasonal_d {
            poly = polymul(&poly, &lag_polynomial(&[1.0], period, -1.0));
        }
    }
    poly
}

/// Apply a lag polynomial, dropping the first `degree` observations
fn apply_polynomial(poly: &[f64], series: &[f64]) -> Vec<f64> {
    let degree = poly.len() - 1;
    (degree..series.len())
        .map(|t| poly.iter().enumerate().map(|(k, c)| c * series[t - k]).sum())
        .collect()
}

/// Conditional residuals with pre-sample innovations set to zero
fn css_residuals(w: &[f64], ar: &[f64], ma: &[f64]) -> Vec<f64> {
    let start = ar.len() - 1;
    let mut e = vec![0.0; w.len()];

    for t in start..w.len() {
        let mut value = w[t];
        for (k, a) in ar.iter().enumerate().skip(1) {
            value += a * w[t - k];
        }
        for (k, m) in ma.iter().enumerate().skip(1) {
            if t >= k {
                value -= m * e[t - k];
            }
        }
        e[t] = value;
    }
    e
}

fn sum_of_squares(values: &[f64]) -> f64 {
    values.iter().map(|v| v * v).sum()
}

fn negate(mut values: Vec<f64>) -> Vec<f64> {
    values.iter_mut().for_each(|v| *v = -*v);
    values
}

/// Map unconstrained values to coefficients of a stationary AR polynomial.
///
/// Each value becomes a partial autocorrelation in (-1, 1), and the
/// Durbin–Levinson recursion turns those into AR coefficients.
pub fn constrain_stationary(unconstrained: &[f64]) -> Vec<f64> {
    let mut phi: Vec<f64> = Vec::with_capacity(unconstrained.len());
    for (k, x) in unconstrained.iter().enumerate() {
        let r = x.tanh();
        let previous = phi.clone();
        for j in 0..k {
            phi[j] = previous[j] - r * previous[k - 1 - j];
        }
        phi.push(r);
    }
    phi
}
