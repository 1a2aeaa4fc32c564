//! Five-level-atom diagnostic solver.
//!
//! This module turns observed line ratios into physical conditions.
//!
//! ## Temperature (2p² ions: [O III], [N II])
//!
//! The ratio `J = (I(dp1) + I(dp2)) / I(ds)` is balanced against the level
//! populations at an assumed density. The balance is not guaranteed to be
//! monotonic, so the root is found by scanning a uniform temperature grid
//! from the bottom and taking the sample just before the first sign change.
//!
//! ## Density (2p³ ions: [S II], [O II])
//!
//! The doublet ratio has a closed-form inverse at an assumed temperature.
//!
//! ## Coupling
//!
//! Each diagnostic depends weakly on the other's output, so
//! [`CoupledIterator`] alternates the two solves for a fixed number of
//! rounds:
//!
//! ```text
//! T  <- temperature(J1, Ne0)
//! repeat rounds:
//!     Ne <- density(J2, T)
//!     T  <- temperature(J1, Ne)
//! ```

mod density;
mod diagnostic;
mod iterate;
mod temperature;

pub use density::solve_density;
pub use diagnostic::DiagnosticSolver;
pub use iterate::{CoupledIterator, Diagnosis, IterationConfig, IterationOrder, IterationRecord};
pub use temperature::{boltzmann_factor, solve_temperature, EmissivityBalance, TemperatureGrid};

/// Collisional rate prefactor `8.629e-6` (cgs), rounded as in Osterbrock.
pub const COLLISION_RATE_COEFFICIENT: f64 = 8.6e-6;

/// Statistical weight of ¹D₂.
pub const G_D: f64 = 5.0;

/// Statistical weight of ¹S₀.
pub const G_S: f64 = 1.0;

/// Statistical weight of ²D₃/₂.
pub const G_B: f64 = 4.0;

/// Statistical weight of ²D₅/₂.
pub const G_G: f64 = 6.0;

/// Lower bound of the temperature scan in K.
pub const T_MIN: f64 = 100.0;

/// Upper bound (exclusive) of the temperature scan in K.
pub const T_MAX: f64 = 1e5;

/// Temperature scan resolution in K.
pub const T_STEP: f64 = 0.1;

/// Largest number of samples a temperature grid may hold.
pub const MAX_GRID_SAMPLES: usize = 10_000_000;

/// Relative size below which the density denominator counts as zero.
pub const DEGENERACY_TOLERANCE: f64 = 1e-12;

/// Default number of coupled rounds.
pub const DEFAULT_ROUNDS: usize = 4;

/// Default density seed in cm^-3.
pub const DEFAULT_DENSITY_SEED: f64 = 1e4;

/// Default temperature seed in K.
pub const DEFAULT_TEMPERATURE_SEED: f64 = 1e4;
