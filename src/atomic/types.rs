//! Ion identifiers and diagnostic families.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FivelError;

/// The two diagnostic families of the five-level atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IonFamily {
    /// 2p²-like ions whose auroral/nebular ratio tracks temperature
    Temperature,
    /// 2p³-like ions whose doublet ratio tracks density
    Density,
}

impl fmt::Display for IonFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Temperature => write!(f, "temperature"),
            Self::Density => write!(f, "density"),
        }
    }
}

/// One of the four supported forbidden-line ions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IonId {
    /// [O III] 4363/4959/5007
    #[serde(rename = "OIII")]
    Oiii,
    /// [N II] 5755/6548/6583
    #[serde(rename = "NII")]
    Nii,
    /// [S II] 6716/6731
    #[serde(rename = "SII")]
    Sii,
    /// [O II] 3726/3729
    #[serde(rename = "OII")]
    Oii,
}

impl IonId {
    /// All ions, temperature family first.
    pub const ALL: [IonId; 4] = [IonId::Oiii, IonId::Nii, IonId::Sii, IonId::Oii];

    /// Canonical identifier, e.g. `"OIII"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Oiii => "OIII",
            Self::Nii => "NII",
            Self::Sii => "SII",
            Self::Oii => "OII",
        }
    }

    /// Spectroscopic notation, e.g. `"[O III]"`.
    pub fn notation(&self) -> &'static str {
        match self {
            Self::Oiii => "[O III]",
            Self::Nii => "[N II]",
            Self::Sii => "[S II]",
            Self::Oii => "[O II]",
        }
    }

    /// The family this ion diagnoses.
    pub fn family(&self) -> IonFamily {
        match self {
            Self::Oiii | Self::Nii => IonFamily::Temperature,
            Self::Sii | Self::Oii => IonFamily::Density,
        }
    }

    /// Check that this ion belongs to `expected`.
    pub fn require_family(self, expected: IonFamily) -> Result<Self, FivelError> {
        let actual = self.family();
        if actual == expected {
            Ok(self)
        } else {
            Err(FivelError::FamilyMismatch {
                ion: self,
                expected,
                actual,
            })
        }
    }
}

impl fmt::Display for IonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IonId {
    type Err = FivelError;

    /// Accepts `OIII`, `[OIII]`, `O[III]`, `[O III]` in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, '[' | ']') && !c.is_whitespace())
            .collect::<String>()
            .to_ascii_uppercase();

        match key.as_str() {
            "OIII" => Ok(Self::Oiii),
            "NII" => Ok(Self::Nii),
            "SII" => Ok(Self::Sii),
            "OII" => Ok(Self::Oii),
            _ => Err(FivelError::unknown_ion(s)),
        }
    }
}
