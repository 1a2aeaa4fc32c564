//! Single-ion diagnostic solves.

use crate::atomic::{AtomicDataTable, IonFamily, IonId, IonRecord};
use crate::error::Result;

use super::density::solve_density;
use super::temperature::{solve_temperature, TemperatureGrid};

/// Solves one line-ratio diagnostic against the atomic data table.
///
/// Temperature-family ions return a temperature for an assumed density;
/// density-family ions return a density for an assumed temperature. The
/// solver holds no state between calls.
#[derive(Debug, Clone, Copy)]
pub struct DiagnosticSolver<'a> {
    table: &'a AtomicDataTable,
    grid: TemperatureGrid,
}

impl<'a> DiagnosticSolver<'a> {
    /// Create a solver over `table` with the default temperature grid.
    pub fn new(table: &'a AtomicDataTable) -> Self {
        Self::with_grid(table, TemperatureGrid::default())
    }

    /// Create a solver with a custom temperature grid.
    pub fn with_grid(table: &'a AtomicDataTable, grid: TemperatureGrid) -> Self {
        Self { table, grid }
    }

    /// The atomic data in use.
    pub fn table(&self) -> &'a AtomicDataTable {
        self.table
    }

    /// The temperature grid in use.
    pub fn grid(&self) -> &TemperatureGrid {
        &self.grid
    }

    /// Solve the diagnostic for an ion given by name.
    ///
    /// `companion` is the assumed density (cm^-3) for temperature-family ions
    /// and the assumed temperature (K) for density-family ions.
    pub fn solve(&self, ratio: f64, companion: f64, ion: &str) -> Result<f64> {
        let ion: IonId = ion.parse()?;
        self.solve_ion(ratio, companion, ion)
    }

    /// Solve the diagnostic for a parsed ion.
    pub fn solve_ion(&self, ratio: f64, companion: f64, ion: IonId) -> Result<f64> {
        match self.table.lookup(ion)? {
            IonRecord::Temperature(record) => {
                solve_temperature(ion, record, ratio, companion, &self.grid)
            }
            IonRecord::Density(record) => solve_density(ion, record, ratio, companion),
        }
    }

    /// Temperature from a temperature-family ratio at fixed density.
    pub fn temperature(&self, ratio: f64, density: f64, ion: IonId) -> Result<f64> {
        ion.require_family(IonFamily::Temperature)?;
        let record = self.table.temperature_ion(ion)?;
        solve_temperature(ion, record, ratio, density, &self.grid)
    }

    /// Density from a density-family ratio at fixed temperature.
    pub fn density(&self, ratio: f64, temperature: f64, ion: IonId) -> Result<f64> {
        ion.require_family(IonFamily::Density)?;
        let record = self.table.density_ion(ion)?;
        solve_density(ion, record, ratio, temperature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FivelError;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_dispatch_by_family() {
        let table = AtomicDataTable::osterbrock();
        let solver = DiagnosticSolver::new(&table);

        let t = solver.solve(300.0, 100.0, "OIII").unwrap();
        assert_abs_diff_eq!(t, 9_063.4, epsilon = 0.11);

        let t = solver.solve(100.0, 100.0, "[N II]").unwrap();
        assert_abs_diff_eq!(t, 10_018.0, epsilon = 0.11);

        let ne = solver.solve(1.36, 1e4, "SII").unwrap();
        assert_abs_diff_eq!(ne, 104.5609, epsilon = 1e-3);
    }

    #[test]
    fn test_temperature_in_grid_for_low_density_ratios() {
        let table = AtomicDataTable::osterbrock();
        let solver = DiagnosticSolver::new(&table);
        for (ion, ratio) in [(IonId::Oiii, 300.0), (IonId::Nii, 100.0)] {
            let t = solver.temperature(ratio, 1.0, ion).unwrap();
            assert!(t > 100.0 && t < 1e5, "{ion}: {t}");
        }
    }

    #[test]
    fn test_unknown_ion_name() {
        let table = AtomicDataTable::osterbrock();
        let solver = DiagnosticSolver::new(&table);
        let err = solver.solve(1.36, 1e4, "XEON").unwrap_err();
        assert!(matches!(err, FivelError::UnknownIon { ref ion } if ion == "XEON"));
    }

    #[test]
    fn test_role_checked_entry_points() {
        let table = AtomicDataTable::osterbrock();
        let solver = DiagnosticSolver::new(&table);
        assert!(matches!(
            solver.temperature(1.36, 1e4, IonId::Sii),
            Err(FivelError::FamilyMismatch { .. })
        ));
        assert!(matches!(
            solver.density(122.72, 1e4, IonId::Oiii),
            Err(FivelError::FamilyMismatch { .. })
        ));
    }
}
