//! Convergence criteria for the nonlinear solution loop.
//!
//! A criterion is consulted twice per iteration: [`pre_criteria`] before the
//! linear solve and [`post_criteria`] after the DOF update, with the solved
//! increment and the assembled residual at hand. Implementations:
//!
//! - [`MixedGenericCriteria`]: per-variable solution/increment norms checked
//!   against relative and absolute tolerances (the workhorse for mixed
//!   vector-scalar problems);
//! - [`ResidualCriterion`]: residual norm against its step-initial value;
//! - [`AndCriteria`] / [`OrCriteria`]: boolean composition.
//!
//! [`pre_criteria`]: ConvergenceCriterion::pre_criteria
//! [`post_criteria`]: ConvergenceCriterion::post_criteria

use crate::dof::DofSet;
use crate::error::Result;
use crate::model::ModelPart;

pub mod composite;
pub mod mixed;
pub mod residual;

pub use composite::{AndCriteria, OrCriteria};
pub use mixed::{ConvergenceVariable, MixedGenericCriteria};
pub use residual::ResidualCriterion;

/// Convergence control interface.
pub trait ConvergenceCriterion: Send + Sync {
    /// Reset per-step state at the beginning of a solution step.
    fn initialize_solution_step(&mut self, _model: &ModelPart, _dofs: &DofSet) {}

    /// Check performed before the linear solve. Criteria that only inspect
    /// post-update quantities return `true` here.
    fn pre_criteria(&mut self, _model: &ModelPart, _dofs: &DofSet) -> bool {
        true
    }

    /// Check performed after the DOF update.
    ///
    /// `dx` is the solved increment over the free DOFs and `rhs` the
    /// residual the increment was solved from.
    fn post_criteria(
        &mut self,
        model: &ModelPart,
        dofs: &DofSet,
        dx: &[f64],
        rhs: &[f64],
    ) -> Result<bool>;

    /// Verbosity level; 0 is silent.
    fn echo_level(&self) -> u32 {
        0
    }

    /// Set the verbosity level.
    fn set_echo_level(&mut self, _level: u32) {}
}
