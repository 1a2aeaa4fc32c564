//! Emission-line windows and flux extraction.

use std::fmt;
use std::path::Path;

use crate::atomic::IonId;
use crate::error::{FivelError, Result};

use super::gaussian::{Gaussian, GaussianFit, GaussianFitter, DEFAULT_MAX_ITERATIONS, FIT_TOLERANCE};
use super::integrate::{linspace, simpson, trapezoid};
use super::io::{ColumnLayout, Spectrum};

/// Minimum samples inside a window for a fit.
pub const MIN_WINDOW_SAMPLES: usize = 4;

/// Default number of points the fitted profile is sampled on.
pub const DEFAULT_PROFILE_SAMPLES: usize = 1000;

/// FWHM-to-sigma divisor used for the equivalent width.
const FWHM_PER_SIGMA: f64 = 2.35;

/// A forbidden line used by the diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EmissionLine {
    Sii6716,
    Sii6731,
    Oiii4363,
    Oiii4959,
    Oiii5007,
}

impl EmissionLine {
    /// All lines in extraction order.
    pub const ALL: [EmissionLine; 5] = [
        EmissionLine::Sii6716,
        EmissionLine::Sii6731,
        EmissionLine::Oiii4363,
        EmissionLine::Oiii4959,
        EmissionLine::Oiii5007,
    ];

    /// Ion emitting the line.
    pub fn ion(self) -> IonId {
        match self {
            EmissionLine::Sii6716 | EmissionLine::Sii6731 => IonId::Sii,
            _ => IonId::Oiii,
        }
    }

    /// Rest wavelength in air, Angstrom.
    pub fn rest_wavelength(self) -> f64 {
        match self {
            EmissionLine::Sii6716 => 6716.44,
            EmissionLine::Sii6731 => 6730.82,
            EmissionLine::Oiii4363 => 4363.21,
            EmissionLine::Oiii4959 => 4958.91,
            EmissionLine::Oiii5007 => 5006.84,
        }
    }

    /// Rest-frame fitting window `(lo, hi)` in Angstrom.
    pub fn window(self) -> (f64, f64) {
        match self {
            EmissionLine::Sii6716 => (6706.0, 6732.0),
            EmissionLine::Sii6731 => (6723.0, 6742.0),
            EmissionLine::Oiii4363 => (4354.0, 4372.0),
            EmissionLine::Oiii4959 => (4954.0, 4970.0),
            EmissionLine::Oiii5007 => (5002.0, 5013.0),
        }
    }

    /// Display label, e.g. `"[O III] 5007"`.
    pub fn label(self) -> &'static str {
        match self {
            EmissionLine::Sii6716 => "[S II] 6716",
            EmissionLine::Sii6731 => "[S II] 6731",
            EmissionLine::Oiii4363 => "[O III] 4363",
            EmissionLine::Oiii4959 => "[O III] 4959",
            EmissionLine::Oiii5007 => "[O III] 5007",
        }
    }
}

impl fmt::Display for EmissionLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Extraction settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtractorConfig {
    /// Source redshift; observed wavelengths are divided by `1 + z`
    pub redshift: f64,
    /// Points the fitted profile is sampled on before integration
    pub profile_samples: usize,
    /// Levenberg-Marquardt iteration cap per line
    pub max_iterations: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            redshift: 0.0,
            profile_samples: DEFAULT_PROFILE_SAMPLES,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl ExtractorConfig {
    /// Create a config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the source redshift.
    pub fn with_redshift(mut self, redshift: f64) -> Self {
        self.redshift = redshift;
        self
    }

    /// Set the number of profile sampling points.
    pub fn with_profile_samples(mut self, samples: usize) -> Self {
        self.profile_samples = samples;
        self
    }

    /// Set the fit iteration cap.
    pub fn with_max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = iterations;
        self
    }

    fn validate(&self) -> Result<()> {
        if !self.redshift.is_finite() || self.redshift <= -1.0 {
            return Err(FivelError::invalid_parameter(format!(
                "redshift must be finite and > -1, got {}",
                self.redshift
            )));
        }
        if self.profile_samples < 2 {
            return Err(FivelError::invalid_parameter(format!(
                "profile sample count must be at least 2, got {}",
                self.profile_samples
            )));
        }
        if self.max_iterations == 0 {
            return Err(FivelError::invalid_parameter("fit iteration cap must be positive"));
        }
        Ok(())
    }
}

/// Window summary alongside a measured flux.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineStatistics {
    pub min_flux: f64,
    pub max_flux: f64,
    /// First wavelength inside the window
    pub lambda_start: f64,
    /// Last wavelength inside the window
    pub lambda_end: f64,
    /// `(max - min) σ √(2π) / max` with `σ` from the window width
    pub equivalent_width: f64,
    pub trapezoid_area: f64,
    pub simpson_area: f64,
}

/// A fitted and integrated line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineMeasurement {
    pub line: EmissionLine,
    pub fit: GaussianFit,
    /// Constant subtracted before fitting
    pub pedestal: f64,
    /// Integrated line flux
    pub flux: f64,
    pub statistics: LineStatistics,
}

/// The two ratios consumed by the coupled solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiagnosticRatios {
    /// `(F5007 + F4959) / F4363`
    pub temperature: f64,
    /// `F6716 / F6731`
    pub density: f64,
}

impl DiagnosticRatios {
    /// Ion the temperature ratio belongs to.
    pub const TEMPERATURE_ION: IonId = IonId::Oiii;
    /// Ion the density ratio belongs to.
    pub const DENSITY_ION: IonId = IonId::Sii;
}

/// Measurements for every diagnostic line.
#[derive(Debug, Clone, PartialEq)]
pub struct LineFluxes {
    measurements: Vec<LineMeasurement>,
}

impl LineFluxes {
    /// Wrap a set of measurements.
    pub fn new(measurements: Vec<LineMeasurement>) -> Self {
        Self { measurements }
    }

    /// All measurements in extraction order.
    pub fn measurements(&self) -> &[LineMeasurement] {
        &self.measurements
    }

    /// Measurement for `line`, if present.
    pub fn get(&self, line: EmissionLine) -> Option<&LineMeasurement> {
        self.measurements.iter().find(|m| m.line == line)
    }

    /// Integrated flux for `line`, if present.
    pub fn flux(&self, line: EmissionLine) -> Option<f64> {
        self.get(line).map(|m| m.flux)
    }

    /// Form the temperature and density ratios.
    pub fn ratios(&self) -> Result<DiagnosticRatios> {
        let f4363 = self.denominator(EmissionLine::Oiii4363)?;
        let f6731 = self.denominator(EmissionLine::Sii6731)?;
        let f4959 = self.numerator(EmissionLine::Oiii4959)?;
        let f5007 = self.numerator(EmissionLine::Oiii5007)?;
        let f6716 = self.numerator(EmissionLine::Sii6716)?;

        Ok(DiagnosticRatios {
            temperature: (f5007 + f4959) / f4363,
            density: f6716 / f6731,
        })
    }

    fn numerator(&self, line: EmissionLine) -> Result<f64> {
        self.flux(line).ok_or_else(|| {
            FivelError::invalid_parameter(format!("line {line} was not measured"))
        })
    }

    fn denominator(&self, line: EmissionLine) -> Result<f64> {
        let flux = self.numerator(line)?;
        if flux == 0.0 || !flux.is_finite() {
            return Err(FivelError::ZeroFlux {
                line: line.to_string(),
            });
        }
        Ok(flux)
    }
}

/// Measures line fluxes from a spectrum by Gaussian fitting.
#[derive(Debug, Clone)]
pub struct LineExtractor {
    config: ExtractorConfig,
}

impl Default for LineExtractor {
    fn default() -> Self {
        Self::new(ExtractorConfig::default())
    }
}

impl LineExtractor {
    /// Create an extractor with the given settings.
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Read a spectrum file and measure every line.
    pub fn extract_path(&self, path: &Path, layout: ColumnLayout) -> Result<LineFluxes> {
        let spectrum = Spectrum::from_path(path, layout)?;
        self.extract(&spectrum)
    }

    /// Shift an observed spectrum to the rest frame and measure every line.
    pub fn extract(&self, observed: &Spectrum) -> Result<LineFluxes> {
        self.config.validate()?;
        let rest = observed.to_rest_frame(self.config.redshift)?;
        let measurements = EmissionLine::ALL
            .iter()
            .map(|&line| self.measure(&rest, line))
            .collect::<Result<Vec<_>>>()?;
        Ok(LineFluxes::new(measurements))
    }

    /// Fit and integrate one line of a rest-frame spectrum.
    pub fn measure(&self, rest: &Spectrum, line: EmissionLine) -> Result<LineMeasurement> {
        self.config.validate()?;
        let (lo, hi) = line.window();
        let (x, raw) = rest.window(lo, hi);
        if x.len() < MIN_WINDOW_SAMPLES {
            return Err(FivelError::InsufficientSamples {
                line: line.to_string(),
                lo,
                hi,
                found: x.len(),
                required: MIN_WINDOW_SAMPLES,
            });
        }

        let last = x.len() - 1;
        let pedestal = raw[0].min(raw[last]);
        let y: Vec<f64> = raw.iter().map(|v| v - pedestal).collect();

        let mut fitter = GaussianFitter::with_config(self.config.max_iterations, FIT_TOLERANCE);
        let fit = fitter.fit(line.label(), x, &y, Gaussian::initial_guess(x, &y))?;

        let xs = linspace(x[0], x[last], self.config.profile_samples);
        let ys: Vec<f64> = xs.iter().map(|&v| fit.profile.eval(v)).collect();
        let flux = trapezoid(&ys, &xs);

        let (min_flux, max_flux) = raw
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(mn, mx), &v| (mn.min(v), mx.max(v)));
        let sigma = (hi - lo) / FWHM_PER_SIGMA;
        let statistics = LineStatistics {
            min_flux,
            max_flux,
            lambda_start: x[0],
            lambda_end: x[last],
            equivalent_width: (max_flux - min_flux) * sigma * (2.0 * std::f64::consts::PI).sqrt()
                / max_flux,
            trapezoid_area: flux,
            simpson_area: simpson(&ys, &xs),
        };

        tracing::debug!(
            line = %line,
            flux,
            center = fit.profile.center,
            width = fit.profile.width,
            iterations = fit.iterations,
            "measured line"
        );

        Ok(LineMeasurement {
            line,
            fit,
            pedestal,
            flux,
            statistics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const LINES: [(EmissionLine, f64); 5] = [
        (EmissionLine::Oiii4363, 10.0),
        (EmissionLine::Oiii4959, 100.0),
        (EmissionLine::Oiii5007, 300.0),
        (EmissionLine::Sii6716, 40.0),
        (EmissionLine::Sii6731, 30.0),
    ];

    fn synthetic(redshift: f64, step: f64) -> Spectrum {
        let n = ((6800.0 - 4300.0) / step) as usize + 1;
        let mut wavelength = Vec::with_capacity(n);
        let mut flux = Vec::with_capacity(n);
        for i in 0..n {
            let w = 4300.0 + i as f64 * step;
            let f = 2.0
                + LINES
                    .iter()
                    .map(|&(line, area)| Gaussian::new(area, line.rest_wavelength(), 1.2).eval(w))
                    .sum::<f64>();
            wavelength.push(w * (1.0 + redshift));
            flux.push(f);
        }
        Spectrum::new(wavelength, flux).unwrap()
    }

    #[test]
    fn test_windows_contain_rest_wavelength() {
        for line in EmissionLine::ALL {
            let (lo, hi) = line.window();
            assert!(lo < line.rest_wavelength() && line.rest_wavelength() < hi, "{line}");
        }
        assert_eq!(EmissionLine::Sii6731.ion(), IonId::Sii);
        assert_eq!(EmissionLine::Oiii4363.to_string(), "[O III] 4363");
    }

    #[test]
    fn test_measure_single_line() {
        let spectrum = synthetic(0.0, 0.5);
        let m = LineExtractor::default()
            .measure(&spectrum, EmissionLine::Oiii4363)
            .unwrap();

        assert_relative_eq!(m.flux, 10.0, max_relative = 1e-6);
        assert_relative_eq!(m.fit.profile.center, 4363.21, max_relative = 1e-8);
        assert_relative_eq!(m.pedestal, 2.0, max_relative = 1e-6);
        assert_eq!(m.statistics.lambda_start, 4354.0);
        assert_eq!(m.statistics.lambda_end, 4372.0);
        assert_relative_eq!(m.statistics.simpson_area, m.flux, max_relative = 1e-6);
        assert_relative_eq!(m.statistics.equivalent_width, 11.9188, max_relative = 1e-4);
    }

    #[test]
    fn test_extract_ratios() {
        let fluxes = LineExtractor::default().extract(&synthetic(0.0, 0.5)).unwrap();
        assert_eq!(fluxes.measurements().len(), 5);

        let ratios = fluxes.ratios().unwrap();
        assert_relative_eq!(ratios.temperature, 40.0, max_relative = 1e-3);
        assert_relative_eq!(ratios.density, 40.0 / 30.0, max_relative = 1e-5);
    }

    #[test]
    fn test_extract_with_redshift() {
        let z = 0.00420765;
        let config = ExtractorConfig::new().with_redshift(z);
        let ratios = LineExtractor::new(config)
            .extract(&synthetic(z, 0.5))
            .unwrap()
            .ratios()
            .unwrap();
        assert_relative_eq!(ratios.temperature, 40.0, max_relative = 1e-3);
        assert_relative_eq!(ratios.density, 40.0 / 30.0, max_relative = 1e-3);
    }

    #[test]
    fn test_sparse_spectrum_rejected() {
        let err = LineExtractor::default()
            .extract(&synthetic(0.0, 10.0))
            .unwrap_err();
        assert!(matches!(err, FivelError::InsufficientSamples { required: 4, .. }));
    }

    #[test]
    fn test_zero_denominator_flux() {
        let spectrum = synthetic(0.0, 0.5);
        let extractor = LineExtractor::default();
        let mut measurements: Vec<LineMeasurement> = EmissionLine::ALL
            .iter()
            .map(|&line| extractor.measure(&spectrum, line).unwrap())
            .collect();
        for m in measurements.iter_mut().filter(|m| m.line == EmissionLine::Oiii4363) {
            m.flux = 0.0;
        }

        let err = LineFluxes::new(measurements).ratios().unwrap_err();
        assert!(matches!(err, FivelError::ZeroFlux { ref line } if line == "[O III] 4363"));
    }

    #[test]
    fn test_invalid_config() {
        let extractor = LineExtractor::new(ExtractorConfig::new().with_profile_samples(1));
        let err = extractor.extract(&synthetic(0.0, 0.5)).unwrap_err();
        assert!(matches!(err, FivelError::InvalidParameter { .. }));
    }
}
