//! Density solve for 2p³-like ions.
//!
//! The ²D doublet ratio J = I(a-g)/I(a-b) has a closed-form inverse at fixed
//! temperature:
//!
//! ```text
//! Ne = (ff3/ff1) Aag Aab (gg - J gb) / (C (J gb Aab - gb Aag)),   C = V/√T
//! ```

use crate::atomic::{DensityIon, IonId};
use crate::error::{FivelError, Result};

use super::{COLLISION_RATE_COEFFICIENT, DEGENERACY_TOLERANCE, G_B, G_G};

/// Solve for the electron density that reproduces `ratio` at `temperature`.
///
/// Fails with [`FivelError::DegenerateRatio`] when the denominator vanishes
/// or the result is negative or not finite.
pub fn solve_density(ion_id: IonId, ion: &DensityIon, ratio: f64, temperature: f64) -> Result<f64> {
    if !temperature.is_finite() || temperature <= 0.0 {
        return Err(FivelError::invalid_parameter(format!(
            "assumed temperature for {ion_id} must be finite and > 0, got {temperature}"
        )));
    }

    let c = COLLISION_RATE_COEFFICIENT / temperature.sqrt();
    let ff1 = 1.0 + (ion.obg / ion.oab) + (ion.obg / ion.oag);
    let ff3 = G_G / ion.oag;

    let bracket = ratio * G_B * ion.aab - G_B * ion.aag;
    if bracket.abs() <= DEGENERACY_TOLERANCE * G_B * ion.aag {
        return Err(FivelError::degenerate(
            ion_id,
            ratio,
            temperature,
            format!("ratio equals the high-density limit Aag/Aab = {:.6}", ion.aag / ion.aab),
        ));
    }

    let up = (ff3 / ff1) * ion.aag * ion.aab * (G_G - ratio * G_B);
    let down = c * bracket;
    let density = up / down;

    if !density.is_finite() {
        return Err(FivelError::degenerate(
            ion_id,
            ratio,
            temperature,
            format!("density is not finite ({density})"),
        ));
    }
    if density < 0.0 {
        return Err(FivelError::degenerate(
            ion_id,
            ratio,
            temperature,
            format!(
                "density {density:.4} cm^-3 is negative; ratio lies outside ({:.4}, {:.4})",
                ion.aag / ion.aab,
                G_G / G_B
            ),
        ));
    }

    tracing::trace!(ion = %ion_id, ratio, temperature, density, "density solve");
    Ok(density)
}
