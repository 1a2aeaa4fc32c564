//! Atomic data for the five-level-atom diagnostics.
//!
//! This module holds the per-ion constants (statistical weights, rest
//! wavelengths, Einstein coefficients and collision strengths) used by the
//! solver. The [`AtomicDataTable`] is immutable once built and is passed to
//! the solver by reference.

mod table;
mod types;
mod validate;

pub use table::{AtomicDataTable, DensityIon, IonRecord, TemperatureIon, Transition};
pub use types::*;
pub use validate::validate_record;
