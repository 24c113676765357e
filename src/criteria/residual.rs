//! Residual-norm convergence criterion.

use crate::criteria::ConvergenceCriterion;
use crate::dof::DofSet;
use crate::error::Result;
use crate::model::ModelPart;
use crate::sparse::norm;
use log::info;

/// Checks ‖b‖ against its value at the first check of the solution step:
/// converged when ‖b‖ ≤ max(rel_tol · ‖b₀‖, abs_tol).
pub struct ResidualCriterion {
    rel_tol: f64,
    abs_tol: f64,
    initial_norm: Option<f64>,
    echo_level: u32,
}

impl ResidualCriterion {
    /// Create a residual criterion with the given tolerances.
    pub fn new(rel_tol: f64, abs_tol: f64) -> Self {
        Self {
            rel_tol,
            abs_tol,
            initial_norm: None,
            echo_level: 0,
        }
    }
}

impl ConvergenceCriterion for ResidualCriterion {
    fn initialize_solution_step(&mut self, _model: &ModelPart, _dofs: &DofSet) {
        self.initial_norm = None;
    }

    fn post_criteria(
        &mut self,
        _model: &ModelPart,
        _dofs: &DofSet,
        _dx: &[f64],
        rhs: &[f64],
    ) -> Result<bool> {
        if rhs.is_empty() {
            return Ok(true);
        }

        let residual_norm = norm(rhs);
        let initial = *self.initial_norm.get_or_insert(residual_norm);
        let threshold = (self.rel_tol * initial).max(self.abs_tol);

        if self.echo_level > 0 {
            info!(
                "residual check: |b| = {:.6e}, threshold = {:.6e} (|b0| = {:.6e})",
                residual_norm, threshold, initial
            );
        }
        Ok(residual_norm <= threshold)
    }

    fn echo_level(&self) -> u32 {
        self.echo_level
    }

    fn set_echo_level(&mut self, level: u32) {
        self.echo_level = level;
    }
}
