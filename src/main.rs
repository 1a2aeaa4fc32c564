//! Fivel - AGN narrow-line-region diagnostics
//!
//! Electron temperature and density from forbidden-line ratios.
//!
//! # Usage
//!
//! ```bash
//! fivel solve --temperature-ratio 122.72 --density-ratio 1.36
//! fivel extract spectrum.csv --redshift 0.00420765 --solve
//! ```

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use fivel::{
    error::Result,
    solver::{IterationOrder, DEFAULT_ROUNDS},
    spectrum::{ColumnLayout, DiagnosticRatios, ExtractorConfig, LineExtractor},
    AtomicDataTable, CoupledIterator, DiagnosticSolver, IonId, IterationConfig,
};
use tracing_subscriber::EnvFilter;

/// Five-level-atom temperature and density diagnostics
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Solve (T, Ne) from two observed line ratios
    Solve {
        /// Temperature-sensitive ratio, e.g. ([O III] 5007 + 4959) / 4363
        #[arg(long)]
        temperature_ratio: f64,

        /// Density-sensitive ratio, e.g. [S II] 6716 / 6731
        #[arg(long)]
        density_ratio: f64,

        /// Temperature ion (OIII or NII)
        #[arg(long, default_value = "OIII")]
        temperature_ion: IonId,

        /// Density ion (SII or OII)
        #[arg(long, default_value = "SII")]
        density_ion: IonId,

        #[command(flatten)]
        coupling: CouplingArgs,
    },

    /// Measure [O III] and [S II] line fluxes from a spectrum
    Extract {
        /// Spectrum file with wavelength and flux columns
        #[arg(value_name = "SPECTRUM_FILE")]
        spectrum: PathBuf,

        /// Source redshift
        #[arg(short, long, default_value_t = 0.0, allow_hyphen_values = true)]
        redshift: f64,

        /// SDSS column order (flux, loglam)
        #[arg(long)]
        sdss: bool,

        /// Wavelength column holds log10(Angstrom)
        #[arg(long)]
        log_wavelength: bool,

        /// Also run the coupled solve on the measured ratios
        #[arg(long)]
        solve: bool,

        #[command(flatten)]
        coupling: CouplingArgs,
    },
}

#[derive(Args, Debug)]
struct CouplingArgs {
    /// Number of coupled rounds
    #[arg(long, default_value_t = DEFAULT_ROUNDS)]
    rounds: usize,

    /// Seed for the first solve (cm^-3, or K with --density-first)
    #[arg(long)]
    seed: Option<f64>,

    /// Stop early once both quantities change by less than this fraction
    #[arg(long)]
    tolerance: Option<f64>,

    /// Solve density first from a seed temperature
    #[arg(long)]
    density_first: bool,

    /// JSON file replacing the built-in atomic data
    #[arg(long, value_name = "FILE")]
    atomic_data: Option<PathBuf>,
}

impl CouplingArgs {
    fn config(&self) -> IterationConfig {
        let mut config = IterationConfig::new().with_rounds(self.rounds);
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        if let Some(tolerance) = self.tolerance {
            config = config.with_tolerance(tolerance);
        }
        if self.density_first {
            config = config.with_order(IterationOrder::DensityFirst);
        }
        config
    }

    fn table(&self) -> Result<AtomicDataTable> {
        match &self.atomic_data {
            Some(path) => AtomicDataTable::from_path(path),
            None => Ok(AtomicDataTable::osterbrock()),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Solve {
            temperature_ratio,
            density_ratio,
            temperature_ion,
            density_ion,
            coupling,
        } => solve(
            temperature_ratio,
            density_ratio,
            temperature_ion,
            density_ion,
            &coupling,
        ),
        Command::Extract {
            spectrum,
            redshift,
            sdss,
            log_wavelength,
            solve: then_solve,
            coupling,
        } => {
            let mut layout = if sdss { ColumnLayout::sdss() } else { ColumnLayout::default() };
            layout.log_wavelength |= log_wavelength;
            let ratios = extract(&spectrum, redshift, layout)?;
            if then_solve {
                solve(
                    ratios.temperature,
                    ratios.density,
                    DiagnosticRatios::TEMPERATURE_ION,
                    DiagnosticRatios::DENSITY_ION,
                    &coupling,
                )?;
            }
            Ok(())
        }
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn solve(
    temperature_ratio: f64,
    density_ratio: f64,
    temperature_ion: IonId,
    density_ion: IonId,
    coupling: &CouplingArgs,
) -> Result<()> {
    let table = coupling.table()?;
    let iterator = CoupledIterator::with_config(DiagnosticSolver::new(&table), coupling.config());

    let diagnosis = iterator.converge_with(
        temperature_ratio,
        density_ratio,
        temperature_ion,
        density_ion,
        |record| println!("{record}"),
    )?;

    println!(
        "Result ({} / {}): T {} [K], Ne {} [part/cm3] after {} rounds",
        temperature_ion.notation(),
        density_ion.notation(),
        diagnosis.temperature,
        diagnosis.density,
        diagnosis.rounds
    );
    Ok(())
}

fn extract(path: &Path, redshift: f64, layout: ColumnLayout) -> Result<DiagnosticRatios> {
    let extractor = LineExtractor::new(ExtractorConfig::new().with_redshift(redshift));
    let fluxes = extractor.extract_path(path, layout)?;

    for m in fluxes.measurements() {
        let s = &m.statistics;
        println!(
            "{}: flux {:.6e}  center {:.3}  sigma {:.3}  EW {:.4}  range [{:.2}, {:.2}]  min {:.4e}  max {:.4e}  simpson {:.6e}",
            m.line,
            m.flux,
            m.fit.profile.center,
            m.fit.profile.width,
            s.equivalent_width,
            s.lambda_start,
            s.lambda_end,
            s.min_flux,
            s.max_flux,
            s.simpson_area,
        );
    }

    let ratios = fluxes.ratios()?;
    println!("J_temperature {}", ratios.temperature);
    println!("J_density {}", ratios.density);
    Ok(ratios)
}
