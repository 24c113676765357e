//! Element and condition traits.
//!
//! Elements and conditions are the discretization entities contributing
//! local stiffness/residual blocks to the global system. Both expose the
//! same protocol: a DOF list naming the scalar unknowns they touch, and a
//! local system evaluated at the current nodal state (tangent LHS, residual
//! RHS). The residual convention is RHS = external - internal forces, so a
//! converged state has a vanishing RHS.
//!
//! Entities must be thread-safe (`Send + Sync`) to enable parallel assembly
//! and parallel per-entity iteration hooks.

use crate::error::Result;
use crate::model::ModelPart;
use crate::variable::Variable;
use nalgebra::{DMatrix, DVector};

pub mod conduction;
pub mod point_load;
pub mod spring;
pub mod truss;

pub use conduction::ConductionBar2;
pub use point_load::PointLoadCondition;
pub use spring::NonlinearSpring;
pub use truss::TrussElement3d;

/// Domain element contributing to the global system.
pub trait Element: Send + Sync {
    /// Element id (diagnostics only).
    fn id(&self) -> usize;

    /// The (node id, variable) pairs this element contributes to, in local
    /// DOF order. Vector unknowns appear through their component variables.
    fn dofs(&self) -> Vec<(usize, Variable)>;

    /// Evaluate tangent matrix and residual vector at the current state.
    fn calculate_local_system(&self, model: &ModelPart) -> Result<(DMatrix<f64>, DVector<f64>)>;

    /// Evaluate the residual vector only.
    fn calculate_rhs(&self, model: &ModelPart) -> Result<DVector<f64>> {
        Ok(self.calculate_local_system(model)?.1)
    }

    /// Hook invoked at the start of every nonlinear iteration.
    fn initialize_nonlinear_iteration(&self, _model: &ModelPart) {}
}

/// Boundary/loading entity. Same protocol as [`Element`], kept as a separate
/// trait so model parts can hold and dispatch the two populations apart.
pub trait Condition: Send + Sync {
    /// Condition id (diagnostics only).
    fn id(&self) -> usize;

    /// The (node id, variable) pairs this condition contributes to.
    fn dofs(&self) -> Vec<(usize, Variable)>;

    /// Evaluate tangent matrix and residual vector at the current state.
    fn calculate_local_system(&self, model: &ModelPart) -> Result<(DMatrix<f64>, DVector<f64>)>;

    /// Evaluate the residual vector only.
    fn calculate_rhs(&self, model: &ModelPart) -> Result<DVector<f64>> {
        Ok(self.calculate_local_system(model)?.1)
    }

    /// Hook invoked at the start of every nonlinear iteration.
    fn initialize_nonlinear_iteration(&self, _model: &ModelPart) {}
}
