//! WASM bindings for Fivel.
//!
//! This module provides JavaScript-friendly bindings for running the coupled
//! temperature and density solve in a browser.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { WasmDiagnostics } from 'fivel';
//!
//! await init();
//!
//! const diag = new WasmDiagnostics();
//! const [t, ne] = diag.converge(122.72, 1.36, "OIII", "SII");
//!
//! // Custom atomic data
//! const custom = WasmDiagnostics.with_atomic_data(json, 6);
//! ```

use wasm_bindgen::prelude::*;

use crate::atomic::{AtomicDataTable, IonId};
use crate::solver::{CoupledIterator, DiagnosticSolver, IterationConfig, DEFAULT_ROUNDS};

/// Initialize panic hook for better error messages in browser console.
#[wasm_bindgen(start)]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// WASM-compatible diagnostic solver.
///
/// Owns its atomic data so each call can borrow it for a native
/// `CoupledIterator`.
#[wasm_bindgen]
pub struct WasmDiagnostics {
    table: AtomicDataTable,
    rounds: usize,
}

impl Default for WasmDiagnostics {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl WasmDiagnostics {
    /// Create a solver with the built-in atomic data and the default round count.
    #[wasm_bindgen(constructor)]
    pub fn new() -> WasmDiagnostics {
        WasmDiagnostics {
            table: AtomicDataTable::osterbrock(),
            rounds: DEFAULT_ROUNDS,
        }
    }

    /// Create a solver from an atomic-data JSON document.
    ///
    /// # Arguments
    /// * `json` - Atomic data keyed by ion (`"OIII"`, `"SII"`, ...)
    /// * `rounds` - Number of coupled rounds
    #[wasm_bindgen]
    pub fn with_atomic_data(json: &str, rounds: usize) -> Result<WasmDiagnostics, JsValue> {
        let table = AtomicDataTable::from_json_str(json).map_err(js_error)?;
        Ok(WasmDiagnostics { table, rounds })
    }

    /// Solve for temperature and density.
    ///
    /// # Arguments
    /// * `temperature_ratio` - Ratio for the temperature ion
    /// * `density_ratio` - Ratio for the density ion
    /// * `temperature_ion` - `"OIII"` or `"NII"`
    /// * `density_ion` - `"SII"` or `"OII"`
    ///
    /// # Returns
    /// `[T, Ne]` in K and cm^-3, or an error message.
    #[wasm_bindgen]
    pub fn converge(
        &self,
        temperature_ratio: f64,
        density_ratio: f64,
        temperature_ion: &str,
        density_ion: &str,
    ) -> Result<Vec<f64>, JsValue> {
        let temperature_ion: IonId = temperature_ion.parse().map_err(js_error)?;
        let density_ion: IonId = density_ion.parse().map_err(js_error)?;

        let config = IterationConfig::new().with_rounds(self.rounds);
        let diagnosis = CoupledIterator::with_config(DiagnosticSolver::new(&self.table), config)
            .converge(temperature_ratio, density_ratio, temperature_ion, density_ion)
            .map_err(js_error)?;

        Ok(vec![diagnosis.temperature, diagnosis.density])
    }

    /// Solve a single diagnostic, dispatching on the ion's family.
    ///
    /// `companion` is the density for temperature ions and the temperature
    /// for density ions.
    #[wasm_bindgen]
    pub fn solve(&self, ratio: f64, companion: f64, ion: &str) -> Result<f64, JsValue> {
        DiagnosticSolver::new(&self.table)
            .solve(ratio, companion, ion)
            .map_err(js_error)
    }

    /// Number of coupled rounds.
    #[wasm_bindgen(getter)]
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    /// Set the number of coupled rounds.
    #[wasm_bindgen(setter)]
    pub fn set_rounds(&mut self, rounds: usize) {
        self.rounds = rounds;
    }
}

/// Get the library version.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
