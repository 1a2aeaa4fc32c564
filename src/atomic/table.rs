//! Per-ion atomic constants and the lookup table.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::types::{IonFamily, IonId};
use super::validate::validate_record;
use crate::error::{FivelError, Result};

/// A radiative transition: collision strength, rest wavelength and
/// Einstein coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    /// Collision strength Ω (dimensionless)
    pub omega: f64,
    /// Rest wavelength in Angstrom
    pub wavelength: f64,
    /// Einstein A coefficient in s^-1
    pub a: f64,
}

impl Transition {
    /// Create a transition from (Ω, λ, A).
    pub const fn new(omega: f64, wavelength: f64, a: f64) -> Self {
        Self {
            omega,
            wavelength,
            a,
        }
    }
}

/// Constants for a 2p²-like (temperature-sensitive) ion.
///
/// Levels are labelled by their role in the five-level atom: `s` is ¹S₀,
/// `d` is ¹D₂ and `p` is the ³P ground term.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureIon {
    /// Statistical weight ratio of the ground term
    pub g: f64,
    /// ¹S → ¹D (auroral line, e.g. 4363)
    pub ds: Transition,
    /// ¹S → ³P (transauroral line, e.g. 2321)
    pub ps: Transition,
    /// ¹D → ³P₁ (weaker nebular line, e.g. 4959)
    pub dp1: Transition,
    /// ¹D → ³P₂ (stronger nebular line, e.g. 5007)
    pub dp2: Transition,
}

/// Constants for a 2p³-like (density-sensitive) ion.
///
/// `a` is the ⁴S ground level, `b` and `g` are the two ²D levels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DensityIon {
    /// Collision strength a-b
    pub oab: f64,
    /// Collision strength a-g
    pub oag: f64,
    /// Collision strength b-g
    pub obg: f64,
    /// Einstein A of b -> a in s^-1
    pub aab: f64,
    /// Einstein A of g -> a in s^-1
    pub aag: f64,
    /// Wavelength of the a-b line in Angstrom
    pub lab: f64,
    /// Wavelength of the a-g line in Angstrom
    pub lag: f64,
}

/// Atomic record for a single ion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum IonRecord {
    Temperature(TemperatureIon),
    Density(DensityIon),
}

impl IonRecord {
    /// The family this record describes.
    pub fn family(&self) -> IonFamily {
        match self {
            Self::Temperature(_) => IonFamily::Temperature,
            Self::Density(_) => IonFamily::Density,
        }
    }
}

/// Immutable mapping from ion to atomic record.
///
/// Build it once (usually [`AtomicDataTable::osterbrock`]) and hand it to
/// the solver by reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AtomicDataTable {
    records: BTreeMap<IonId, IonRecord>,
}

impl Default for AtomicDataTable {
    fn default() -> Self {
        Self::osterbrock()
    }
}

impl AtomicDataTable {
    /// Values from Osterbrock & Ferland, *Astrophysics of Gaseous Nebulae
    /// and Active Galactic Nuclei* (2006).
    pub fn osterbrock() -> Self {
        let mut records = BTreeMap::new();

        records.insert(
            IonId::Oiii,
            IonRecord::Temperature(TemperatureIon {
                g: 3.00,
                ds: Transition::new(0.58, 4363.0, 1.6),
                ps: Transition::new(0.29, 2321.0, 2.3e-1),
                dp1: Transition::new(2.29, 4959.0, 6.8e-3),
                dp2: Transition::new(2.29, 5007.0, 2.0e-2),
            }),
        );
        records.insert(
            IonId::Nii,
            IonRecord::Temperature(TemperatureIon {
                g: 3.86,
                ds: Transition::new(0.83, 5755.0, 1.0),
                ps: Transition::new(0.29, 3063.0, 3.3e-2),
                dp1: Transition::new(2.64, 6548.0, 9.8e-4),
                dp2: Transition::new(2.64, 6583.0, 3.0e-3),
            }),
        );
        records.insert(
            IonId::Sii,
            IonRecord::Density(DensityIon {
                oab: 2.76,
                oag: 4.14,
                obg: 7.47,
                aab: 8.8e-4,
                aag: 2.6e-4,
                lab: 6731.0,
                lag: 6716.0,
            }),
        );
        records.insert(
            IonId::Oii,
            IonRecord::Density(DensityIon {
                oab: 0.536,
                oag: 0.804,
                obg: 1.17,
                aab: 1.6e-4,
                aag: 3.6e-5,
                lab: 3726.0,
                lag: 3729.0,
            }),
        );

        Self { records }
    }

    /// Parse and validate a JSON table.
    ///
    /// The document maps ion identifiers to records tagged by `family`:
    ///
    /// ```json
    /// { "SII": { "family": "density", "oab": 2.76, "oag": 4.14, "obg": 7.47,
    ///            "aab": 8.8e-4, "aag": 2.6e-4, "lab": 6731.0, "lag": 6716.0 } }
    /// ```
    pub fn from_json_str(json: &str) -> Result<Self> {
        let table: Self = serde_json::from_str(json)?;
        for (ion, record) in &table.records {
            validate_record(*ion, record)?;
        }
        tracing::debug!(ions = table.records.len(), "loaded atomic data table");
        Ok(table)
    }

    /// Read and validate a JSON table from disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| FivelError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_json_str(&content)
    }

    /// Serialize the table to pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Look up the record for an ion.
    pub fn lookup(&self, ion: IonId) -> Result<&IonRecord> {
        self.records
            .get(&ion)
            .ok_or_else(|| FivelError::unknown_ion(ion.as_str()))
    }

    /// Look up a temperature-family record.
    pub fn temperature_ion(&self, ion: IonId) -> Result<&TemperatureIon> {
        match self.lookup(ion)? {
            IonRecord::Temperature(record) => Ok(record),
            IonRecord::Density(_) => Err(FivelError::FamilyMismatch {
                ion,
                expected: IonFamily::Temperature,
                actual: IonFamily::Density,
            }),
        }
    }

    /// Look up a density-family record.
    pub fn density_ion(&self, ion: IonId) -> Result<&DensityIon> {
        match self.lookup(ion)? {
            IonRecord::Density(record) => Ok(record),
            IonRecord::Temperature(_) => Err(FivelError::FamilyMismatch {
                ion,
                expected: IonFamily::Density,
                actual: IonFamily::Temperature,
            }),
        }
    }

    /// Ions present in the table.
    pub fn ions(&self) -> impl Iterator<Item = IonId> + '_ {
        self.records.keys().copied()
    }
}
