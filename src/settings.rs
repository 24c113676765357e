//! JSON-backed solver settings.
//!
//! Settings structs deserialize from the JSON fragments driving a
//! simulation; every field has a default so partial documents are valid.

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Nonlinear strategy settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategySettings {
    /// Maximum nonlinear iterations per solution step.
    pub max_iterations: usize,
    /// Verbosity: 0 silent, 1 convergence summaries, 2 per-iteration detail.
    pub echo_level: u32,
}

impl Default for StrategySettings {
    fn default() -> Self {
        Self {
            max_iterations: 30,
            echo_level: 0,
        }
    }
}

impl StrategySettings {
    /// Parse settings from a JSON document.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

fn default_rel_tol() -> f64 {
    1.0e-4
}

fn default_abs_tol() -> f64 {
    1.0e-9
}

/// One convergence-variable entry: variable name plus tolerances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvergenceVariableSettings {
    /// Registered variable name (vector source or scalar).
    pub variable: String,
    /// Relative tolerance.
    #[serde(default = "default_rel_tol")]
    pub rel_tol: f64,
    /// Absolute tolerance.
    #[serde(default = "default_abs_tol")]
    pub abs_tol: f64,
}

/// Parse a convergence-variable list from a JSON array.
pub fn convergence_variables_from_json(text: &str) -> Result<Vec<ConvergenceVariableSettings>> {
    Ok(serde_json::from_str(text)?)
}
