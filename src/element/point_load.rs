//! Nodal point-load condition.

use crate::element::Condition;
use crate::error::Result;
use crate::model::ModelPart;
use crate::variable::Variable;
use nalgebra::{DMatrix, DVector};

/// Constant external load applied to a single DOF. Contributes to the RHS
/// only; its tangent block is zero.
pub struct PointLoadCondition {
    id: usize,
    node: usize,
    variable: Variable,
    value: f64,
}

impl PointLoadCondition {
    /// Create a point load of `value` on `variable` at `node`.
    pub fn new(id: usize, node: usize, variable: Variable, value: f64) -> Self {
        Self {
            id,
            node,
            variable,
            value,
        }
    }
}

impl Condition for PointLoadCondition {
    fn id(&self) -> usize {
        self.id
    }

    fn dofs(&self) -> Vec<(usize, Variable)> {
        vec![(self.node, self.variable.clone())]
    }

    fn calculate_local_system(&self, _model: &ModelPart) -> Result<(DMatrix<f64>, DVector<f64>)> {
        Ok((DMatrix::zeros(1, 1), DVector::from_element(1, self.value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variable::VariableRegistry;
    use approx::assert_relative_eq;

    #[test]
    fn test_load_contribution() {
        let mut registry = VariableRegistry::new();
        let disp = registry.vector3("DISPLACEMENT");
        let model = ModelPart::new("loads");

        let load = PointLoadCondition::new(1, 7, disp.components[2].clone(), -9.81);
        let (lhs, rhs) = load.calculate_local_system(&model).unwrap();
        assert_relative_eq!(lhs[(0, 0)], 0.0);
        assert_relative_eq!(rhs[0], -9.81);
        assert_eq!(load.dofs(), vec![(7, disp.components[2].clone())]);
    }
}
