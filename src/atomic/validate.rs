//! Atomic record validation.

use crate::error::{FivelError, Result};

use super::table::{IonRecord, Transition};
use super::types::IonId;

/// Validate an atomic record before it is used by the solver.
///
/// Checks:
/// - The record family matches the ion
/// - Every collision strength, wavelength and Einstein coefficient is
///   finite and strictly positive
pub fn validate_record(ion: IonId, record: &IonRecord) -> Result<()> {
    if record.family() != ion.family() {
        return Err(FivelError::invalid_atomic(
            ion,
            "family",
            format!("{} is a {} ion, record is {}", ion, ion.family(), record.family()),
        ));
    }

    match record {
        IonRecord::Temperature(t) => {
            positive(ion, "g", t.g)?;
            transition(ion, "ds", &t.ds)?;
            transition(ion, "ps", &t.ps)?;
            transition(ion, "dp1", &t.dp1)?;
            transition(ion, "dp2", &t.dp2)?;
        }
        IonRecord::Density(d) => {
            positive(ion, "oab", d.oab)?;
            positive(ion, "oag", d.oag)?;
            positive(ion, "obg", d.obg)?;
            positive(ion, "aab", d.aab)?;
            positive(ion, "aag", d.aag)?;
            positive(ion, "lab", d.lab)?;
            positive(ion, "lag", d.lag)?;
        }
    }

    Ok(())
}

fn transition(ion: IonId, name: &str, t: &Transition) -> Result<()> {
    positive(ion, &format!("{name}.omega"), t.omega)?;
    positive(ion, &format!("{name}.wavelength"), t.wavelength)?;
    positive(ion, &format!("{name}.a"), t.a)
}

fn positive(ion: IonId, field: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(FivelError::invalid_atomic(
            ion,
            field,
            format!("must be finite and > 0, got {value}"),
        ))
    }
}
