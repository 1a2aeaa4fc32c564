//! Error types for the fivel diagnostics.
//!
//! This module provides a unified error type [`FivelError`] that covers
//! all error conditions that can occur during atomic data loading,
//! temperature and density solves, and spectrum line extraction.

use thiserror::Error;

use crate::atomic::{IonFamily, IonId};

/// Result type alias using [`FivelError`].
pub type Result<T> = std::result::Result<T, FivelError>;

/// Unified error type for all fivel operations.
#[derive(Error, Debug)]
pub enum FivelError {
    // ============ Atomic Data Errors ============
    /// Ion identifier not recognized, or absent from the loaded table
    #[error("Unknown ion '{ion}' (expected one of OIII, NII, SII, OII)")]
    UnknownIon { ion: String },

    /// Ion used in a role reserved for the other family
    #[error(
        "Ion {} is a {actual} diagnostic, but a {expected} diagnostic is required",
        .ion.notation()
    )]
    FamilyMismatch {
        ion: IonId,
        expected: IonFamily,
        actual: IonFamily,
    },

    /// Atomic record violates a physical invariant
    #[error("Invalid atomic data for {ion}, field '{field}': {message}")]
    InvalidAtomicData {
        ion: IonId,
        field: String,
        message: String,
    },

    /// Malformed atomic data document
    #[error("Failed to parse atomic data: {0}")]
    AtomicDataParse(#[from] serde_json::Error),

    // ============ Solver Errors ============
    /// Temperature grid scan found no sign change
    #[error(
        "No temperature root for {ion} with ratio {ratio} at density {density:.4e} cm^-3 \
         in [{t_min}, {t_max}) K"
    )]
    NoRootFound {
        ion: IonId,
        ratio: f64,
        density: f64,
        t_min: f64,
        t_max: f64,
    },

    /// Density solve is undefined or non-physical for this ratio
    #[error("Degenerate ratio {ratio} for {ion} at temperature {temperature:.1} K: {message}")]
    DegenerateRatio {
        ion: IonId,
        ratio: f64,
        temperature: f64,
        message: String,
    },

    /// Invalid solver or extractor parameter
    #[error("Invalid parameter: {message}")]
    InvalidParameter { message: String },

    // ============ Spectrum Errors ============
    /// Malformed spectrum row
    #[error("Spectrum parse error at row {row}: {message}")]
    SpectrumParse { row: usize, message: String },

    /// Not enough spectrum samples inside a line window
    #[error("Line {line} has {found} samples in [{lo}, {hi}] A, at least {required} required")]
    InsufficientSamples {
        line: String,
        lo: f64,
        hi: f64,
        found: usize,
        required: usize,
    },

    /// Gaussian profile fit failed
    #[error("Gaussian fit for line {line} failed after {iterations} iterations: {message}")]
    FitFailed {
        line: String,
        iterations: usize,
        message: String,
    },

    /// Normal equations of a fit are singular
    #[error("Singular matrix in least-squares step")]
    SingularMatrix,

    /// Line flux used as a ratio denominator is zero
    #[error("Line {line} has zero integrated flux and cannot divide a ratio")]
    ZeroFlux { line: String },

    // ============ I/O Errors ============
    /// Error reading an input file
    #[error("Failed to read file '{path}': {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl FivelError {
    /// Create an unknown ion error
    pub fn unknown_ion(ion: impl Into<String>) -> Self {
        Self::UnknownIon { ion: ion.into() }
    }

    /// Create a degenerate ratio error
    pub fn degenerate(ion: IonId, ratio: f64, temperature: f64, message: impl Into<String>) -> Self {
        Self::DegenerateRatio {
            ion,
            ratio,
            temperature,
            message: message.into(),
        }
    }

    /// Create an invalid atomic data error
    pub fn invalid_atomic(ion: IonId, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidAtomicData {
            ion,
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            message: message.into(),
        }
    }

    /// Create a spectrum parse error
    pub fn spectrum_parse(row: usize, message: impl Into<String>) -> Self {
        Self::SpectrumParse {
            row,
            message: message.into(),
        }
    }

    /// Create a fit failure error
    pub fn fit_failed(line: impl Into<String>, iterations: usize, message: impl Into<String>) -> Self {
        Self::FitFailed {
            line: line.into(),
            iterations,
            message: message.into(),
        }
    }
}
