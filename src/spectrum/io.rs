//! Plain-text spectrum input.
//!
//! Rows are `wavelength, flux` pairs separated by commas or whitespace.
//! Lines starting with `#` are comments.

use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, Trim};

use crate::error::{FivelError, Result};

/// Which columns hold wavelength and flux.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    /// Zero-based wavelength column
    pub wavelength: usize,
    /// Zero-based flux column
    pub flux: usize,
    /// Wavelength column holds log10(Angstrom)
    pub log_wavelength: bool,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            wavelength: 0,
            flux: 1,
            log_wavelength: false,
        }
    }
}

impl ColumnLayout {
    /// SDSS `coadd` table order: `flux, loglam`.
    pub fn sdss() -> Self {
        Self {
            wavelength: 1,
            flux: 0,
            log_wavelength: true,
        }
    }
}

/// A one-dimensional spectrum with ascending wavelengths.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    wavelength: Vec<f64>,
    flux: Vec<f64>,
}

impl Spectrum {
    /// Create a spectrum from paired samples.
    pub fn new(wavelength: Vec<f64>, flux: Vec<f64>) -> Result<Self> {
        if wavelength.len() != flux.len() {
            return Err(FivelError::invalid_parameter(format!(
                "{} wavelengths but {} flux values",
                wavelength.len(),
                flux.len()
            )));
        }
        if wavelength.len() < 2 {
            return Err(FivelError::invalid_parameter(
                "spectrum needs at least two samples",
            ));
        }
        for (i, (w, f)) in wavelength.iter().zip(&flux).enumerate() {
            if !w.is_finite() || !f.is_finite() {
                return Err(FivelError::spectrum_parse(i + 1, "non-finite sample"));
            }
        }
        if let Some(i) = wavelength.windows(2).position(|w| w[1] <= w[0]) {
            return Err(FivelError::spectrum_parse(
                i + 2,
                format!(
                    "wavelengths must increase ({} follows {})",
                    wavelength[i + 1],
                    wavelength[i]
                ),
            ));
        }
        Ok(Self { wavelength, flux })
    }

    /// Parse a spectrum from text.
    pub fn parse(input: &str, layout: ColumnLayout) -> Result<Self> {
        Self::from_reader(input.as_bytes(), layout)
    }

    /// Read a spectrum file.
    pub fn from_path(path: &Path, layout: ColumnLayout) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|e| FivelError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;
        let spectrum = Self::from_reader(file, layout)?;
        tracing::debug!(path = %path.display(), samples = spectrum.len(), "read spectrum");
        Ok(spectrum)
    }

    /// Parse a spectrum from any reader.
    pub fn from_reader<R: Read>(reader: R, layout: ColumnLayout) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(false)
            .comment(Some(b'#'))
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);

        let mut wavelength = Vec::new();
        let mut flux = Vec::new();

        for (index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| {
                let row = e.position().map(|p| p.line() as usize).unwrap_or(index + 1);
                FivelError::spectrum_parse(row, e.to_string())
            })?;
            let row = record.position().map(|p| p.line() as usize).unwrap_or(index + 1);

            // Whitespace-separated rows arrive as a single field
            let fields: Vec<&str> = if record.len() == 1 {
                record[0].split_whitespace().collect()
            } else {
                record.iter().collect()
            };
            if fields.iter().all(|f| f.is_empty()) {
                continue;
            }

            let w = column(&fields, layout.wavelength, row)?;
            let f = column(&fields, layout.flux, row)?;
            wavelength.push(if layout.log_wavelength { 10f64.powf(w) } else { w });
            flux.push(f);
        }

        Self::new(wavelength, flux)
    }

    /// Wavelengths in Angstrom.
    pub fn wavelength(&self) -> &[f64] {
        &self.wavelength
    }

    /// Flux values.
    pub fn flux(&self) -> &[f64] {
        &self.flux
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.wavelength.len()
    }

    /// Whether the spectrum holds no samples.
    pub fn is_empty(&self) -> bool {
        self.wavelength.is_empty()
    }

    /// Shift observed wavelengths to the rest frame, `λ / (1 + z)`.
    pub fn to_rest_frame(&self, redshift: f64) -> Result<Self> {
        if !redshift.is_finite() || redshift <= -1.0 {
            return Err(FivelError::invalid_parameter(format!(
                "redshift must be finite and > -1, got {redshift}"
            )));
        }
        let scale = redshift + 1.0;
        Ok(Self {
            wavelength: self.wavelength.iter().map(|w| w / scale).collect(),
            flux: self.flux.clone(),
        })
    }

    /// Samples with `lo <= λ <= hi`.
    pub fn window(&self, lo: f64, hi: f64) -> (&[f64], &[f64]) {
        let start = self.wavelength.partition_point(|&w| w < lo);
        let end = self.wavelength.partition_point(|&w| w <= hi).max(start);
        (&self.wavelength[start..end], &self.flux[start..end])
    }
}

fn column(fields: &[&str], index: usize, row: usize) -> Result<f64> {
    let raw = fields
        .get(index)
        .ok_or_else(|| FivelError::spectrum_parse(row, format!("missing column {}", index + 1)))?;
    raw.parse::<f64>()
        .map_err(|_| FivelError::spectrum_parse(row, format!("'{raw}' is not a number")))
}
