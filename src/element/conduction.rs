//! Two-node lumped conduction element for a scalar field.

use crate::element::Element;
use crate::error::{Error, Result};
use crate::model::ModelPart;
use crate::variable::{Variable, VariableKind};
use nalgebra::{DMatrix, DVector};

/// Linear conduction link between two nodes of a scalar variable, with
/// conductance `c`: flux = c · (t₁ - t₂).
pub struct ConductionBar2 {
    id: usize,
    nodes: [usize; 2],
    variable: Variable,
    conductance: f64,
}

impl ConductionBar2 {
    /// Create a conduction link. The variable must be a scalar.
    pub fn new(id: usize, nodes: [usize; 2], variable: Variable, conductance: f64) -> Result<Self> {
        if variable.kind() != VariableKind::Scalar {
            return Err(Error::Element(format!(
                "conduction bar {}: variable {} is not a scalar",
                id,
                variable.name()
            )));
        }
        if conductance <= 0.0 {
            return Err(Error::Element(format!(
                "conduction bar {}: conductance must be positive",
                id
            )));
        }
        Ok(Self {
            id,
            nodes,
            variable,
            conductance,
        })
    }
}

impl Element for ConductionBar2 {
    fn id(&self) -> usize {
        self.id
    }

    fn dofs(&self) -> Vec<(usize, Variable)> {
        self.nodes
            .iter()
            .map(|&node| (node, self.variable.clone()))
            .collect()
    }

    fn calculate_local_system(&self, model: &ModelPart) -> Result<(DMatrix<f64>, DVector<f64>)> {
        let t0 = model.try_node(self.nodes[0])?.value(&self.variable);
        let t1 = model.try_node(self.nodes[1])?.value(&self.variable);

        let c = self.conductance;
        let lhs = DMatrix::from_row_slice(2, 2, &[c, -c, -c, c]);
        let flux = c * (t0 - t1);
        let rhs = DVector::from_row_slice(&[-flux, flux]);
        Ok((lhs, rhs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Point3;
    use crate::variable::VariableRegistry;
    use approx::assert_relative_eq;

    #[test]
    fn test_vector_variable_rejected() {
        let mut registry = VariableRegistry::new();
        let disp = registry.vector3("DISPLACEMENT");
        assert!(ConductionBar2::new(1, [1, 2], disp.source, 1.0).is_err());
    }

    #[test]
    fn test_equilibrium_at_uniform_field() {
        let mut registry = VariableRegistry::new();
        let temp = registry.scalar("TEMPERATURE");
        let mut model = ModelPart::new("thermal");
        model.add_node(1, Point3::new(0.0, 0.0, 0.0)).unwrap();
        model.add_node(2, Point3::new(1.0, 0.0, 0.0)).unwrap();
        for id in [1, 2] {
            model.node_mut(id).unwrap().set_value(&temp, 35.0);
        }

        let bar = ConductionBar2::new(1, [1, 2], temp, 4.0).unwrap();
        let rhs = bar.calculate_rhs(&model).unwrap();
        assert_relative_eq!(rhs[0], 0.0);
        assert_relative_eq!(rhs[1], 0.0);
    }

    #[test]
    fn test_flux_direction() {
        let mut registry = VariableRegistry::new();
        let temp = registry.scalar("TEMPERATURE");
        let mut model = ModelPart::new("thermal");
        model.add_node(1, Point3::new(0.0, 0.0, 0.0)).unwrap();
        model.add_node(2, Point3::new(1.0, 0.0, 0.0)).unwrap();
        model.node_mut(1).unwrap().set_value(&temp, 10.0);

        let bar = ConductionBar2::new(1, [1, 2], temp, 2.0).unwrap();
        let (lhs, rhs) = bar.calculate_local_system(&model).unwrap();
        assert_relative_eq!(lhs[(0, 1)], -2.0);
        // Hot node loses flux, cold node gains it.
        assert_relative_eq!(rhs[0], -20.0);
        assert_relative_eq!(rhs[1], 20.0);
    }
}
