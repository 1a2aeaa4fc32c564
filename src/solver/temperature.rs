//! Temperature solve for 2p²-like ions.
//!
//! The ¹S and ¹D populations of the five-level atom are balanced against the
//! observed nebular-to-auroral ratio J:
//!
//! ```text
//! y1(T) = f1 E(-λds, T) [Ne/√T + f2 (1 + (f3/f2) E(λds, T))]
//! y2(T) = J (Ne/√T + f4)
//! ```
//!
//! with `E(λ, T) = exp(-hc / (k T λ))`. The temperature is the lowest grid
//! sample at which `sign(y1 - y2)` flips.

use crate::atomic::{IonId, TemperatureIon};
use crate::error::{FivelError, Result};
use crate::{BOLTZMANN, PLANCK, SPEED_OF_LIGHT};

use super::{COLLISION_RATE_COEFFICIENT, G_D, G_S, MAX_GRID_SAMPLES, T_MAX, T_MIN, T_STEP};

/// Angstrom per metre.
const ANGSTROM_PER_METRE: f64 = 1e10;

/// Uniform temperature grid `min + i * step` for `i` in `0..len()`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureGrid {
    min: f64,
    max: f64,
    step: f64,
}

impl Default for TemperatureGrid {
    fn default() -> Self {
        Self {
            min: T_MIN,
            max: T_MAX,
            step: T_STEP,
        }
    }
}

impl TemperatureGrid {
    /// Create a grid over `[min, max)` in Kelvin.
    pub fn new(min: f64, max: f64, step: f64) -> Result<Self> {
        if !(min.is_finite() && max.is_finite() && step.is_finite()) {
            return Err(FivelError::invalid_parameter(
                "temperature grid bounds and step must be finite",
            ));
        }
        if min <= 0.0 {
            return Err(FivelError::invalid_parameter(format!(
                "temperature grid must start above 0 K, got {min}"
            )));
        }
        if max <= min {
            return Err(FivelError::invalid_parameter(format!(
                "temperature grid upper bound {max} must exceed lower bound {min}"
            )));
        }
        if step <= 0.0 {
            return Err(FivelError::invalid_parameter(format!(
                "temperature grid step must be positive, got {step}"
            )));
        }
        let samples = ((max - min) / step).ceil();
        if samples > MAX_GRID_SAMPLES as f64 {
            return Err(FivelError::invalid_parameter(format!(
                "temperature grid of {samples:.3e} samples exceeds the limit of {MAX_GRID_SAMPLES}"
            )));
        }
        if min + step == min {
            return Err(FivelError::invalid_parameter(format!(
                "temperature grid step {step} is below the resolution of {min} K"
            )));
        }
        Ok(Self { min, max, step })
    }

    /// Lower bound (inclusive).
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Upper bound (exclusive).
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Spacing between samples.
    pub fn step(&self) -> f64 {
        self.step
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        ((self.max - self.min) / self.step).ceil() as usize
    }

    /// Whether the grid holds no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Temperature of sample `i`.
    pub fn sample(&self, i: usize) -> f64 {
        self.min + i as f64 * self.step
    }

    /// Iterate over the samples in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.len()).map(move |i| self.sample(i))
    }
}

/// Boltzmann factor `exp(-hc / (k T λ))` for a wavelength in Angstrom.
///
/// A negative wavelength gives the reciprocal factor.
pub fn boltzmann_factor(wavelength: f64, temperature: f64) -> f64 {
    (-PLANCK * SPEED_OF_LIGHT * ANGSTROM_PER_METRE / (BOLTZMANN * temperature * wavelength)).exp()
}

/// Level-population balance for one temperature-family ion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmissivityBalance {
    f1: f64,
    f2: f64,
    f3: f64,
    f4: f64,
    lds: f64,
}

impl EmissivityBalance {
    /// Precompute the coefficients for an ion.
    pub fn new(ion: &TemperatureIon) -> Self {
        let v = COLLISION_RATE_COEFFICIENT;
        let g = ion.g;

        Self {
            f1: G_D * ion.dp2.a * ion.ds.wavelength / (G_S * ion.ds.a * ion.dp2.wavelength),
            f2: G_S * (ion.ds.a + ion.ps.a) / (g * v * ion.ps.omega),
            f3: G_S * ion.ds.a / (g * v * ion.dp2.omega),
            f4: G_D * ion.dp2.a / (g * v * ion.dp2.omega),
            lds: ion.ds.wavelength,
        }
    }

    /// Coefficients `[f1, f2, f3, f4]`.
    pub fn coefficients(&self) -> [f64; 4] {
        [self.f1, self.f2, self.f3, self.f4]
    }

    /// Both sides `(y1, y2)` of the balance at temperature `t`.
    pub fn sides(&self, t: f64, density: f64, ratio: f64) -> (f64, f64) {
        let collisional = density / t.sqrt();
        let fac = self.f1 * boltzmann_factor(-self.lds, t);
        let y1 = fac * (collisional + self.f2 * (1.0 + (self.f3 / self.f2) * boltzmann_factor(self.lds, t)));
        let y2 = ratio * (collisional + self.f4);
        (y1, y2)
    }

    /// `y1 - y2` at temperature `t`.
    pub fn residual(&self, t: f64, density: f64, ratio: f64) -> f64 {
        let (y1, y2) = self.sides(t, density, ratio);
        y1 - y2
    }
}

/// Sign as -1, 0 or 1. NaN maps to 0.
fn sign(value: f64) -> i8 {
    if value > 0.0 {
        1
    } else if value < 0.0 {
        -1
    } else {
        0
    }
}

/// Solve for the temperature that reproduces `ratio` at fixed `density`.
///
/// Returns the last grid sample before the first sign change of
/// `y1 - y2`, scanning upward from the grid minimum.
pub fn solve_temperature(
    ion_id: IonId,
    ion: &TemperatureIon,
    ratio: f64,
    density: f64,
    grid: &TemperatureGrid,
) -> Result<f64> {
    if !density.is_finite() || density < 0.0 {
        return Err(FivelError::invalid_parameter(format!(
            "assumed density for {ion_id} must be finite and >= 0, got {density}"
        )));
    }

    let balance = EmissivityBalance::new(ion);
    let mut previous: Option<(i8, f64)> = None;

    for t in grid.iter() {
        let s = sign(balance.residual(t, density, ratio));
        if let Some((previous_sign, previous_t)) = previous {
            if s != previous_sign {
                tracing::trace!(ion = %ion_id, ratio, density, temperature = previous_t, "temperature root");
                return Ok(previous_t);
            }
        }
        previous = Some((s, t));
    }

    Err(FivelError::NoRootFound {
        ion: ion_id,
        ratio,
        density,
        t_min: grid.min(),
        t_max: grid.max(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atomic::AtomicDataTable;
    use approx::assert_abs_diff_eq;

    fn oiii() -> TemperatureIon {
        *AtomicDataTable::osterbrock().temperature_ion(IonId::Oiii).unwrap()
    }

    #[test]
    fn test_default_grid() {
        let grid = TemperatureGrid::default();
        assert_eq!(grid.len(), 999_000);
        assert_eq!(grid.sample(0), 100.0);
        assert_abs_diff_eq!(grid.sample(grid.len() - 1), 99_999.9, epsilon = 1e-6);
    }

    #[test]
    fn test_grid_rejects_bad_bounds() {
        assert!(TemperatureGrid::new(100.0, 50.0, 0.1).is_err());
        assert!(TemperatureGrid::new(0.0, 1e5, 0.1).is_err());
        assert!(TemperatureGrid::new(100.0, 1e5, 0.0).is_err());
        assert!(TemperatureGrid::new(100.0, f64::INFINITY, 0.1).is_err());
    }

    #[test]
    fn test_grid_rejects_unbounded_scans() {
        let fine = TemperatureGrid::new(100.0, 1e5, 1e-14).unwrap_err();
        assert!(matches!(fine, FivelError::InvalidParameter { .. }));
        assert!(TemperatureGrid::new(100.0, 1e5, 1e-300).is_err());

        // 65536 K of range but a 1 K step vanishes against 1e20 K
        let stuck = TemperatureGrid::new(1e20, 1e20 + 65_536.0, 1.0).unwrap_err();
        assert!(matches!(stuck, FivelError::InvalidParameter { .. }));

        let default = TemperatureGrid::new(T_MIN, T_MAX, T_STEP).unwrap();
        assert_eq!(default, TemperatureGrid::default());
        assert!(TemperatureGrid::new(100.0, 1e5, 0.01).is_ok());
    }

    #[test]
    fn test_boltzmann_factor_reciprocal() {
        let t = 10_000.0;
        let product = boltzmann_factor(4363.0, t) * boltzmann_factor(-4363.0, t);
        assert_abs_diff_eq!(product, 1.0, epsilon = 1e-12);
        // hc/kλ for 4363 A is about 32977 K
        assert_abs_diff_eq!(boltzmann_factor(4363.0, t), (-3.2977f64).exp(), epsilon = 1e-4);
    }

    #[test]
    fn test_oiii_coefficients() {
        let [f1, f2, f3, f4] = EmissivityBalance::new(&oiii()).coefficients();
        let v = COLLISION_RATE_COEFFICIENT;
        assert_abs_diff_eq!(f1, 5.0 * 2.0e-2 * 4363.0 / (1.6 * 5007.0), epsilon = 1e-12);
        assert_abs_diff_eq!(f2, (1.6 + 0.23) / (3.0 * v * 0.29), epsilon = 1e-6);
        assert_abs_diff_eq!(f3, 1.6 / (3.0 * v * 2.29), epsilon = 1e-6);
        assert_abs_diff_eq!(f4, 5.0 * 2.0e-2 / (3.0 * v * 2.29), epsilon = 1e-6);
    }

    #[test]
    fn test_residual_changes_sign_once_across_root() {
        let balance = EmissivityBalance::new(&oiii());
        assert!(balance.residual(5_000.0, 1e4, 122.72) > 0.0);
        assert!(balance.residual(20_000.0, 1e4, 122.72) < 0.0);
    }

    #[test]
    fn test_solve_returns_sample_before_flip() {
        let grid = TemperatureGrid::default();
        let t = solve_temperature(IonId::Oiii, &oiii(), 122.72, 1e4, &grid).unwrap();
        assert_abs_diff_eq!(t, 11_808.4, epsilon = 0.11);

        let balance = EmissivityBalance::new(&oiii());
        assert!(balance.residual(t, 1e4, 122.72) > 0.0);
        assert!(balance.residual(t + grid.step(), 1e4, 122.72) <= 0.0);
    }

    #[test]
    fn test_coarse_grid_brackets_fine_root() {
        let coarse = TemperatureGrid::new(100.0, 1e5, 10.0).unwrap();
        let t = solve_temperature(IonId::Oiii, &oiii(), 122.72, 1e4, &coarse).unwrap();
        assert!(t <= 11_808.4 && t + 10.0 > 11_808.4);
    }

    #[test]
    fn test_no_root_for_small_ratio() {
        let err = solve_temperature(IonId::Oiii, &oiii(), 1.0, 1e4, &TemperatureGrid::default())
            .unwrap_err();
        assert!(matches!(err, FivelError::NoRootFound { ion: IonId::Oiii, .. }));
    }

    #[test]
    fn test_rejects_negative_density() {
        let err = solve_temperature(IonId::Oiii, &oiii(), 122.72, -5.0, &TemperatureGrid::default())
            .unwrap_err();
        assert!(matches!(err, FivelError::InvalidParameter { .. }));
    }
}
