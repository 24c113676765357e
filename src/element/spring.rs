//! Single-DOF spring with cubic hardening.
//!
//! Internal force k·u + k3·u³ against ground, with the consistent tangent
//! k + 3·k3·u². With k3 = 0 this is a plain linear spring; with k3 > 0 it
//! gives the solution loop a genuinely nonlinear residual to iterate on.

use crate::element::Element;
use crate::error::{Error, Result};
use crate::model::ModelPart;
use crate::variable::Variable;
use nalgebra::{DMatrix, DVector};

/// Grounded spring acting on one scalar or component DOF.
pub struct NonlinearSpring {
    id: usize,
    node: usize,
    variable: Variable,
    stiffness: f64,
    cubic_stiffness: f64,
}

impl NonlinearSpring {
    /// Create a spring with linear stiffness `stiffness` and cubic hardening
    /// coefficient `cubic_stiffness` (may be zero).
    pub fn new(
        id: usize,
        node: usize,
        variable: Variable,
        stiffness: f64,
        cubic_stiffness: f64,
    ) -> Result<Self> {
        if stiffness <= 0.0 {
            return Err(Error::Element(format!(
                "spring {}: linear stiffness must be positive",
                id
            )));
        }
        if cubic_stiffness < 0.0 {
            return Err(Error::Element(format!(
                "spring {}: cubic stiffness must not soften",
                id
            )));
        }
        Ok(Self {
            id,
            node,
            variable,
            stiffness,
            cubic_stiffness,
        })
    }
}

impl Element for NonlinearSpring {
    fn id(&self) -> usize {
        self.id
    }

    fn dofs(&self) -> Vec<(usize, Variable)> {
        vec![(self.node, self.variable.clone())]
    }

    fn calculate_local_system(&self, model: &ModelPart) -> Result<(DMatrix<f64>, DVector<f64>)> {
        let u = model.try_node(self.node)?.value(&self.variable);
        let tangent = self.stiffness + 3.0 * self.cubic_stiffness * u * u;
        let internal_force = self.stiffness * u + self.cubic_stiffness * u * u * u;

        let lhs = DMatrix::from_element(1, 1, tangent);
        let rhs = DVector::from_element(1, -internal_force);
        Ok((lhs, rhs))
    }
}
