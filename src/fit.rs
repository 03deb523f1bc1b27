use crate::error::{ForecastError, Result};
use crate::types::FitParams;
use nalgebra::{Matrix3, Vector3};

const LAMBDA_INIT: f64 = 1e-3;
const LAMBDA_SCALE: f64 = 10.0;
const LAMBDA_MAX: f64 = 1e12;
const SSE_TOL: f64 = 1e-10;

#[derive(Debug, Clone)]
pub struct FitOptions {
    /// Budget of residual-vector evaluations; convergence is slow on small
    /// or noisy series, so the default is deliberately very high.
    pub max_evaluations: usize,
}

impl Default for FitOptions {
    fn default() -> Self {
        FitOptions {
            max_evaluations: 1_000_000,
        }
    }
}

/// Fit `f(x) = a * e^(-b * e^(-c*x))` to `y` observed at positions `0..n`
/// by Levenberg–Marquardt least squares.
///
/// The initial guess `a0 = max(y)`, `b0 = median(X)`, `c0 = 0.1` is
/// load-bearing: without it the fit routinely lands on degenerate curves.
/// Trial steps whose evaluation overflows to non-finite values are rejected
/// through the damping schedule instead of surfacing an error, so overflow
/// stays harmless as long as the fit converges.
pub fn fit_logistic(y: &[f64], options: &FitOptions) -> Result<FitParams> {
    let n = y.len();
    if n < 3 {
        return Err(ForecastError::InsufficientData {
            required: 3,
            actual: n,
        });
    }

    let a0 = y.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    // Positions are consecutive integers, so the median is the midpoint
    let b0 = (n - 1) as f64 / 2.0;
    let mut params = FitParams {
        a: a0,
        b: b0,
        c: 0.1,
    };

    let mut evaluations = 0usize;
    let mut sse = sum_squared_error(y, &params);
    evaluations += 1;
    let mut lambda = LAMBDA_INIT;

    while evaluations < options.max_evaluations {
        if sse <= f64::EPSILON {
            return Ok(params);
        }

        let (jtj, jtr) = normal_equations(y, &params);
        evaluations += 1;

        let mut stepped = false;
        while lambda <= LAMBDA_MAX && evaluations < options.max_evaluations {
            let damped = jtj + Matrix3::from_diagonal(&jtj.diagonal()) * lambda;
            let delta = match damped.lu().solve(&jtr) {
                Some(delta) => delta,
                None => {
                    lambda *= LAMBDA_SCALE;
                    continue;
                }
            };

            let trial = FitParams {
                a: params.a + delta[0],
                b: params.b + delta[1],
                c: params.c + delta[2],
            };
            let trial_sse = sum_squared_error(y, &trial);
            evaluations += 1;

            if trial_sse.is_finite() && trial_sse <= sse {
                let improvement = sse - trial_sse;
                params = trial;
                let converged = improvement <= SSE_TOL * sse.max(SSE_TOL);
                sse = trial_sse;
                lambda = (lambda / LAMBDA_SCALE).max(1e-12);
                stepped = true;
                if converged {
                    return Ok(params);
                }
                break;
            }

            lambda *= LAMBDA_SCALE;
        }

        if !stepped {
            // Damping saturated without an acceptable step
            return Err(ForecastError::FitDiverged { evaluations });
        }
    }

    Err(ForecastError::FitDiverged { evaluations })
}

fn sum_squared_error(y: &[f64], params: &FitParams) -> f64 {
    y.iter()
        .enumerate()
        .map(|(x, &observed)| {
            let residual = observed - params.eval(x as f64);
            residual * residual
        })
        .sum()
}

/// Accumulate `J^T J` and `J^T r` over all positions, using the analytic
/// partials of the logistic. Rows where the model or a partial overflowed
/// are dropped from the accumulation.
fn normal_equations(y: &[f64], params: &FitParams) -> (Matrix3<f64>, Vector3<f64>) {
    let mut jtj = Matrix3::zeros();
    let mut jtr = Vector3::zeros();

    for (i, &observed) in y.iter().enumerate() {
        let x = i as f64;
        let u = (-params.c * x).exp();
        let shape = (-params.b * u).exp();
        let f = params.a * shape;

        let df_da = shape;
        let df_db = -u * f;
        let df_dc = params.b * x * u * f;
        let residual = observed - f;

        let row = [df_da, df_db, df_dc];
        if !residual.is_finite() || row.iter().any(|v| !v.is_finite()) {
            continue;
        }

        for r in 0..3 {
            jtr[r] += row[r] * residual;
            for c in 0..3 {
                jtj[(r, c)] += row[r] * row[c];
            }
        }
    }

    (jtj, jtr)
}
