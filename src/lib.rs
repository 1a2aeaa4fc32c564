//! # Fivel
//!
//! Electron temperature and density of AGN narrow-line regions from
//! forbidden-line ratios.
//!
//! This library provides:
//! - Atomic constants for [O III], [N II], [S II] and [O II]
//! - A five-level-atom solver for temperature (grid root scan) and density
//!   (closed form)
//! - Fixed-point coupling of the two diagnostics
//! - Gaussian line-flux extraction from a rest-frame spectrum
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`atomic`] - Per-ion constants and the lookup table
//! - [`solver`] - Temperature and density solves and their coupling
//! - [`spectrum`] - Spectrum reading, Gaussian fitting and line fluxes
//!
//! ## Usage
//!
//! ### Native CLI
//!
//! ```bash
//! fivel solve --temperature-ratio 122.72 --density-ratio 1.36 --temperature-ion OIII --density-ion SII
//! fivel extract spectrum.csv --redshift 0.00420765
//! ```
//!
//! ### Library
//!
//! ```no_run
//! use fivel::{AtomicDataTable, CoupledIterator, IonId};
//!
//! let table = AtomicDataTable::osterbrock();
//! let diagnosis = CoupledIterator::new(&table)
//!     .converge(122.72, 1.36, IonId::Oiii, IonId::Sii)?;
//! println!("T = {} K, Ne = {} cm^-3", diagnosis.temperature, diagnosis.density);
//! # Ok::<(), fivel::FivelError>(())
//! ```
//!
//! ### WASM
//!
//! ```javascript
//! import { WasmDiagnostics } from 'fivel';
//!
//! const diag = new WasmDiagnostics();
//! const [t, ne] = diag.converge(122.72, 1.36, "OIII", "SII");
//! ```

pub mod atomic;
pub mod error;
pub mod solver;
pub mod spectrum;

// Re-export main types for convenience
pub use atomic::{AtomicDataTable, IonFamily, IonId};
pub use error::{FivelError, Result};
pub use solver::{CoupledIterator, Diagnosis, DiagnosticSolver, IterationConfig};

// WASM bindings
#[cfg(feature = "wasm")]
mod wasm;

#[cfg(feature = "wasm")]
pub use wasm::WasmDiagnostics;

/// Planck constant in J s
pub const PLANCK: f64 = 6.62607004e-34;

/// Speed of light in m/s
pub const SPEED_OF_LIGHT: f64 = 2.99792458e8;

/// Boltzmann constant in J/K
pub const BOLTZMANN: f64 = 1.38064852e-23;
