//! Fixed-point coupling of the temperature and density diagnostics.

use std::fmt;

use crate::atomic::{AtomicDataTable, IonFamily, IonId};
use crate::error::{FivelError, Result};

use super::diagnostic::DiagnosticSolver;
use super::temperature::TemperatureGrid;
use super::{DEFAULT_DENSITY_SEED, DEFAULT_ROUNDS, DEFAULT_TEMPERATURE_SEED};

/// Which diagnostic is solved from the seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IterationOrder {
    /// Seed a density, solve temperature first
    #[default]
    TemperatureFirst,
    /// Seed a temperature, solve density first
    DensityFirst,
}

/// Configuration for the coupled iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationConfig {
    /// Number of alternating rounds.
    pub rounds: usize,
    /// Seed value; density for temperature-first, temperature for
    /// density-first. `None` uses the order's default.
    pub seed: Option<f64>,
    /// Stop early once relative changes fall to this value.
    pub tolerance: Option<f64>,
    /// Iteration order.
    pub order: IterationOrder,
}

impl Default for IterationConfig {
    fn default() -> Self {
        Self {
            rounds: DEFAULT_ROUNDS,
            seed: None,
            tolerance: None,
            order: IterationOrder::default(),
        }
    }
}

impl IterationConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of rounds.
    pub fn with_rounds(mut self, rounds: usize) -> Self {
        self.rounds = rounds;
        self
    }

    /// Set the seed value.
    pub fn with_seed(mut self, seed: f64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Stop once `|ΔT|/T` and `|ΔNe|/max(Ne, 1)` are both at most `tolerance`.
    ///
    /// Without a tolerance the loop always runs `rounds` times.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    /// Set the iteration order.
    pub fn with_order(mut self, order: IterationOrder) -> Self {
        self.order = order;
        self
    }

    /// Seed after applying the order's default.
    pub fn effective_seed(&self) -> f64 {
        self.seed.unwrap_or(match self.order {
            IterationOrder::TemperatureFirst => DEFAULT_DENSITY_SEED,
            IterationOrder::DensityFirst => DEFAULT_TEMPERATURE_SEED,
        })
    }

    fn validate(&self) -> Result<()> {
        let seed = self.effective_seed();
        let seed_ok = match self.order {
            IterationOrder::TemperatureFirst => seed.is_finite() && seed >= 0.0,
            IterationOrder::DensityFirst => seed.is_finite() && seed > 0.0,
        };
        if !seed_ok {
            return Err(FivelError::invalid_parameter(format!(
                "invalid {:?} seed {seed}",
                self.order
            )));
        }
        if let Some(tolerance) = self.tolerance {
            if !tolerance.is_finite() || tolerance < 0.0 {
                return Err(FivelError::invalid_parameter(format!(
                    "tolerance must be finite and >= 0, got {tolerance}"
                )));
            }
        }
        Ok(())
    }
}

/// One round of the iteration, for display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationRecord {
    /// Round index, starting at 1
    pub round: usize,
    /// Density in cm^-3
    pub density: f64,
    /// Temperature in K paired with `density`
    pub temperature: f64,
}

impl fmt::Display for IterationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Iteration {}: Ne {} [part/cm3], T {} [K]",
            self.round, self.density, self.temperature
        )
    }
}

/// Result of a coupled solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Diagnosis {
    /// Electron temperature in K
    pub temperature: f64,
    /// Electron density in cm^-3
    pub density: f64,
    /// Rounds actually run
    pub rounds: usize,
}

impl From<Diagnosis> for (f64, f64) {
    fn from(d: Diagnosis) -> Self {
        (d.temperature, d.density)
    }
}

/// Alternates temperature and density solves until they agree.
#[derive(Debug, Clone, Copy)]
pub struct CoupledIterator<'a> {
    solver: DiagnosticSolver<'a>,
    config: IterationConfig,
}

impl<'a> CoupledIterator<'a> {
    /// Create an iterator over `table` with default configuration.
    pub fn new(table: &'a AtomicDataTable) -> Self {
        Self::with_config(DiagnosticSolver::new(table), IterationConfig::default())
    }

    /// Create an iterator with a custom solver and configuration.
    pub fn with_config(solver: DiagnosticSolver<'a>, config: IterationConfig) -> Self {
        Self { solver, config }
    }

    /// Create an iterator with a custom temperature grid.
    pub fn with_grid(table: &'a AtomicDataTable, grid: TemperatureGrid, config: IterationConfig) -> Self {
        Self::with_config(DiagnosticSolver::with_grid(table, grid), config)
    }

    /// Get the configuration.
    pub fn config(&self) -> &IterationConfig {
        &self.config
    }

    /// Solve for `(T, Ne)`.
    pub fn converge(
        &self,
        temperature_ratio: f64,
        density_ratio: f64,
        temperature_ion: IonId,
        density_ion: IonId,
    ) -> Result<Diagnosis> {
        self.converge_with(temperature_ratio, density_ratio, temperature_ion, density_ion, |_| {})
    }

    /// Solve for `(T, Ne)` and collect the per-round trace.
    pub fn converge_traced(
        &self,
        temperature_ratio: f64,
        density_ratio: f64,
        temperature_ion: IonId,
        density_ion: IonId,
    ) -> Result<(Diagnosis, Vec<IterationRecord>)> {
        let mut trace = Vec::with_capacity(self.config.rounds);
        let diagnosis = self.converge_with(
            temperature_ratio,
            density_ratio,
            temperature_ion,
            density_ion,
            |record| trace.push(*record),
        )?;
        Ok((diagnosis, trace))
    }

    /// Solve for `(T, Ne)`, calling `observer` after every round.
    pub fn converge_with<F>(
        &self,
        temperature_ratio: f64,
        density_ratio: f64,
        temperature_ion: IonId,
        density_ion: IonId,
        mut observer: F,
    ) -> Result<Diagnosis>
    where
        F: FnMut(&IterationRecord),
    {
        temperature_ion.require_family(IonFamily::Temperature)?;
        density_ion.require_family(IonFamily::Density)?;
        self.config.validate()?;

        let solve_t = |density: f64| self.solver.temperature(temperature_ratio, density, temperature_ion);
        let solve_ne = |temperature: f64| self.solver.density(density_ratio, temperature, density_ion);

        let seed = self.config.effective_seed();
        let (mut temperature, mut density) = match self.config.order {
            IterationOrder::TemperatureFirst => (solve_t(seed)?, seed),
            IterationOrder::DensityFirst => (seed, solve_ne(seed)?),
        };
        tracing::debug!(
            order = ?self.config.order,
            temperature,
            density,
            "begin iteration"
        );

        let mut completed = 0;
        for round in 1..=self.config.rounds {
            let (previous_t, previous_ne) = (temperature, density);

            let record = match self.config.order {
                IterationOrder::TemperatureFirst => {
                    density = solve_ne(temperature)?;
                    temperature = solve_t(density)?;
                    IterationRecord {
                        round,
                        density,
                        temperature: previous_t,
                    }
                }
                IterationOrder::DensityFirst => {
                    temperature = solve_t(density)?;
                    density = solve_ne(temperature)?;
                    IterationRecord {
                        round,
                        density: previous_ne,
                        temperature,
                    }
                }
            };

            tracing::debug!(round, density = record.density, temperature = record.temperature, "iteration");
            observer(&record);
            completed = round;

            if let Some(tolerance) = self.config.tolerance {
                let dt = (temperature - previous_t).abs() / temperature;
                let dn = (density - previous_ne).abs() / density.max(1.0);
                if dt <= tolerance && dn <= tolerance {
                    tracing::debug!(round, "converged within tolerance");
                    break;
                }
            }
        }

        Ok(Diagnosis {
            temperature,
            density,
            rounds: completed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn test_zero_rounds_returns_seed_solve() {
        let table = AtomicDataTable::osterbrock();
        let config = IterationConfig::new().with_rounds(0);
        let iter = CoupledIterator::with_config(DiagnosticSolver::new(&table), config);

        let d = iter.converge(122.72, 1.36, IonId::Oiii, IonId::Sii).unwrap();
        assert_abs_diff_eq!(d.temperature, 11_808.4, epsilon = 0.11);
        assert_eq!(d.density, 1e4);
        assert_eq!(d.rounds, 0);
    }

    #[test]
    fn test_trace_has_one_record_per_round() {
        let table = AtomicDataTable::osterbrock();
        let iter = CoupledIterator::new(&table);
        let (d, trace) = iter.converge_traced(122.72, 1.36, IonId::Oiii, IonId::Sii).unwrap();

        assert_eq!(d.rounds, 4);
        assert_eq!(trace.len(), 4);
        assert_eq!(trace.iter().map(|r| r.round).collect::<Vec<_>>(), vec![1, 2, 3, 4]);

        // First record pairs the first density with the seed temperature
        assert_abs_diff_eq!(trace[0].temperature, 11_808.4, epsilon = 0.11);
        assert_relative_eq!(trace[0].density, 113.6227, max_relative = 1e-4);
        assert_relative_eq!(trace[3].density, d.density);
    }

    #[test]
    fn test_tolerance_stops_early() {
        let table = AtomicDataTable::osterbrock();
        let config = IterationConfig::new().with_rounds(50).with_tolerance(1e-9);
        let iter = CoupledIterator::with_config(DiagnosticSolver::new(&table), config);
        let d = iter.converge(122.72, 1.36, IonId::Oiii, IonId::Sii).unwrap();

        assert!(d.rounds < 50);
        assert_abs_diff_eq!(d.temperature, 12_033.8, epsilon = 0.11);
    }

    #[test]
    fn test_density_first_zero_rounds() {
        let table = AtomicDataTable::osterbrock();
        let config = IterationConfig::new()
            .with_order(IterationOrder::DensityFirst)
            .with_rounds(0);
        let iter = CoupledIterator::with_config(DiagnosticSolver::new(&table), config);
        let d = iter.converge(122.72, 1.36, IonId::Oiii, IonId::Sii).unwrap();

        assert_eq!(d.temperature, 1e4);
        assert_relative_eq!(d.density, 104.560_945, max_relative = 1e-6);
    }

    #[test]
    fn test_roles_checked_before_solving() {
        let table = AtomicDataTable::osterbrock();
        let iter = CoupledIterator::new(&table);
        let mut calls = 0;
        let err = iter
            .converge_with(1.36, 122.72, IonId::Sii, IonId::Oiii, |_| calls += 1)
            .unwrap_err();
        assert!(matches!(err, FivelError::FamilyMismatch { ion: IonId::Sii, .. }));
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_invalid_seed() {
        let table = AtomicDataTable::osterbrock();
        let config = IterationConfig::new().with_seed(f64::NAN);
        let iter = CoupledIterator::with_config(DiagnosticSolver::new(&table), config);
        assert!(matches!(
            iter.converge(122.72, 1.36, IonId::Oiii, IonId::Sii),
            Err(FivelError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_diagnosis_into_tuple() {
        let d = Diagnosis {
            temperature: 1.0,
            density: 2.0,
            rounds: 4,
        };
        let (t, ne): (f64, f64) = d.into();
        assert_eq!((t, ne), (1.0, 2.0));
    }
}
