//! Area-normalised Gaussian profile and its Levenberg-Marquardt fit.
//!
//! The profile is
//!
//! ```text
//! g(x) = amp / (√(2π) wid) exp(-(x - cen)² / (2 wid²))
//! ```
//!
//! so `amp` is the integrated line flux.

use std::f64::consts::PI;

use crate::error::{FivelError, Result};

use super::linalg::DenseSystem;

/// Default maximum Levenberg-Marquardt iterations.
pub const DEFAULT_MAX_ITERATIONS: usize = 200;

/// Relative reduction in the residual sum below which the fit has converged.
pub const FIT_TOLERANCE: f64 = 1e-10;

/// Starting width in Angstrom.
pub const INITIAL_WIDTH: f64 = 1.5;

const LAMBDA_START: f64 = 1e-3;
const LAMBDA_MAX: f64 = 1e12;

/// Gaussian line profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gaussian {
    /// Integrated area
    pub amplitude: f64,
    /// Centre in Angstrom
    pub center: f64,
    /// Standard deviation in Angstrom
    pub width: f64,
}

impl Gaussian {
    /// Create a profile.
    pub fn new(amplitude: f64, center: f64, width: f64) -> Self {
        Self {
            amplitude,
            center,
            width,
        }
    }

    /// Initial guess from the highest sample, with [`INITIAL_WIDTH`].
    pub fn initial_guess(x: &[f64], y: &[f64]) -> Self {
        let (peak, height) = y
            .iter()
            .copied()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |best, (i, v)| if v > best.1 { (i, v) } else { best });
        let height = if height.is_finite() { height } else { 0.0 };
        let center = x.get(peak).copied().unwrap_or_default();
        Self::new(height * (2.0 * PI).sqrt() * INITIAL_WIDTH, center, INITIAL_WIDTH)
    }

    /// Evaluate the profile at `x`.
    pub fn eval(&self, x: f64) -> f64 {
        let z = (x - self.center) / self.width;
        self.amplitude / ((2.0 * PI).sqrt() * self.width) * (-0.5 * z * z).exp()
    }

    /// Peak height.
    pub fn peak(&self) -> f64 {
        self.amplitude / ((2.0 * PI).sqrt() * self.width)
    }

    /// Full width at half maximum.
    pub fn fwhm(&self) -> f64 {
        2.0 * (2.0 * 2f64.ln()).sqrt() * self.width
    }

    /// Partial derivatives with respect to (amplitude, center, width).
    fn gradient(&self, x: f64) -> [f64; 3] {
        let w = self.width;
        let dx = x - self.center;
        let z = dx / w;
        let shape = (-0.5 * z * z).exp() / ((2.0 * PI).sqrt() * w);
        let g = self.amplitude * shape;
        [shape, g * dx / (w * w), g * (dx * dx / (w * w * w) - 1.0 / w)]
    }

    fn with_step(&self, step: &[f64]) -> Self {
        Self::new(
            self.amplitude + step[0],
            self.center + step[1],
            self.width + step[2],
        )
    }

    fn residual_sum(&self, x: &[f64], y: &[f64]) -> f64 {
        x.iter()
            .zip(y)
            .map(|(&xi, &yi)| {
                let r = yi - self.eval(xi);
                r * r
            })
            .sum()
    }
}

/// Outcome of a profile fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianFit {
    /// Best-fit profile
    pub profile: Gaussian,
    /// Residual sum of squares
    pub residual: f64,
    /// Iterations used
    pub iterations: usize,
}

/// Fate of one damped step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepOutcome {
    /// Residual did not grow; `converged` when the gain is below tolerance
    Accepted { converged: bool },
    /// Residual grew; retry with more damping
    Rejected,
    /// Residual grew at maximum damping; the fit has converged
    Stalled,
}

/// Levenberg-Marquardt fitter for a single Gaussian.
#[derive(Debug, Clone)]
pub struct GaussianFitter {
    /// Maximum iterations
    pub max_iterations: usize,
    /// Convergence tolerance on the relative residual change
    pub tolerance: f64,
    system: DenseSystem,
}

impl Default for GaussianFitter {
    fn default() -> Self {
        Self::new()
    }
}

impl GaussianFitter {
    /// Create a fitter with default limits.
    pub fn new() -> Self {
        Self::with_config(DEFAULT_MAX_ITERATIONS, FIT_TOLERANCE)
    }

    /// Create a fitter with custom limits.
    pub fn with_config(max_iterations: usize, tolerance: f64) -> Self {
        Self {
            max_iterations,
            tolerance,
            system: DenseSystem::new(3),
        }
    }

    /// Fit `y(x)` starting from `initial`. `label` names the line in errors.
    pub fn fit(&mut self, label: &str, x: &[f64], y: &[f64], initial: Gaussian) -> Result<GaussianFit> {
        if x.len() != y.len() || x.len() < 3 {
            return Err(FivelError::fit_failed(
                label,
                0,
                format!("need at least 3 paired samples, got {} and {}", x.len(), y.len()),
            ));
        }

        let mut current = initial;
        let mut ssr = current.residual_sum(x, y);
        let mut lambda = LAMBDA_START;

        for iter in 0..self.max_iterations {
            self.assemble(&current, x, y);

            let step = loop {
                match self.damped_step(lambda) {
                    Ok(step) => break step,
                    Err(_) if lambda < LAMBDA_MAX => lambda *= 10.0,
                    Err(_) => {
                        return Err(FivelError::fit_failed(label, iter, "singular normal equations"));
                    }
                }
            };

            let candidate = current.with_step(&step);
            let candidate_ssr = if candidate.width > 0.0 {
                candidate.residual_sum(x, y)
            } else {
                f64::INFINITY
            };

            match self.judge_step(ssr, candidate_ssr, lambda) {
                StepOutcome::Accepted { converged } => {
                    current = candidate;
                    ssr = candidate_ssr;
                    lambda = (lambda / 10.0).max(1e-12);
                    if converged {
                        return Ok(GaussianFit {
                            profile: current,
                            residual: ssr,
                            iterations: iter + 1,
                        });
                    }
                }
                StepOutcome::Rejected => lambda *= 10.0,
                StepOutcome::Stalled => {
                    // Even the most damped step goes uphill: current is a local minimum
                    tracing::trace!(line = label, iterations = iter + 1, "fit stalled at minimum");
                    return Ok(GaussianFit {
                        profile: current,
                        residual: ssr,
                        iterations: iter + 1,
                    });
                }
            }
        }

        Err(FivelError::fit_failed(
            label,
            self.max_iterations,
            format!("did not converge (residual {ssr:.3e})"),
        ))
    }

    /// Classify a trial step from residual `ssr` to `candidate_ssr` at damping `lambda`.
    fn judge_step(&self, ssr: f64, candidate_ssr: f64, lambda: f64) -> StepOutcome {
        if candidate_ssr.is_finite() && candidate_ssr <= ssr {
            let improvement = ssr - candidate_ssr;
            StepOutcome::Accepted {
                converged: improvement <= self.tolerance * candidate_ssr.max(f64::MIN_POSITIVE),
            }
        } else if lambda * 10.0 > LAMBDA_MAX {
            StepOutcome::Stalled
        } else {
            StepOutcome::Rejected
        }
    }

    /// Build JᵀJ and Jᵀr at `profile`.
    fn assemble(&mut self, profile: &Gaussian, x: &[f64], y: &[f64]) {
        self.system.clear();
        for (&xi, &yi) in x.iter().zip(y) {
            let grad = profile.gradient(xi);
            let r = yi - profile.eval(xi);
            for row in 0..3 {
                for col in 0..3 {
                    self.system.add(row, col, grad[row] * grad[col]);
                }
                self.system.b[row] += grad[row] * r;
            }
        }
    }

    /// Solve (JᵀJ + λ diag(JᵀJ)) δ = Jᵀr.
    fn damped_step(&self, lambda: f64) -> Result<Vec<f64>> {
        let mut damped = self.system.clone();
        for i in 0..3 {
            let d = self.system.get(i, i);
            damped.add(i, i, lambda * d.max(f64::MIN_POSITIVE));
        }
        damped.factor()?;
        damped.solve()
    }
}
