//! Degree-of-freedom set.
//!
//! The [`DofSet`] collects the scalar unknowns referenced by the elements and
//! conditions of a model part, deduplicates them and assigns dense equation
//! ids with the free DOFs first. Only the first `n_free` equations enter the
//! assembled system; fixed DOFs keep ids past that range so their prescribed
//! values stay in the nodal database.

use crate::model::ModelPart;
use crate::variable::{Variable, VariableKey};
use std::collections::HashMap;

/// One scalar unknown at a node.
#[derive(Debug, Clone)]
pub struct Dof {
    node: usize,
    variable: Variable,
    equation_id: usize,
    fixed: bool,
}

impl Dof {
    /// Id of the owning node.
    pub fn node(&self) -> usize {
        self.node
    }

    /// The (scalar or component) variable solved for.
    pub fn variable(&self) -> &Variable {
        &self.variable
    }

    /// Position in the global system. Free DOFs come first.
    pub fn equation_id(&self) -> usize {
        self.equation_id
    }

    /// Whether the DOF is fixed (Dirichlet).
    pub fn is_fixed(&self) -> bool {
        self.fixed
    }

    /// Whether the DOF is solved for.
    pub fn is_free(&self) -> bool {
        !self.fixed
    }
}

/// Ordered set of the model's DOFs with a free/fixed equation-id partition.
pub struct DofSet {
    dofs: Vec<Dof>,
    n_free: usize,
    equation_ids: HashMap<(usize, VariableKey), usize>,
}

impl DofSet {
    /// Build the DOF set from the element and condition DOF lists of a model
    /// part. Duplicates collapse; ordering is by (node id, variable key).
    pub fn from_model(model: &ModelPart) -> Self {
        let mut seen: HashMap<(usize, VariableKey), Variable> = HashMap::new();
        for element in model.elements() {
            for (node, variable) in element.dofs() {
                seen.entry((node, variable.key())).or_insert(variable);
            }
        }
        for condition in model.conditions() {
            for (node, variable) in condition.dofs() {
                seen.entry((node, variable.key())).or_insert(variable);
            }
        }

        let mut entries: Vec<((usize, VariableKey), Variable)> = seen.into_iter().collect();
        entries.sort_by_key(|((node, key), _)| (*node, *key));

        let mut free = Vec::new();
        let mut constrained = Vec::new();
        for ((node, _), variable) in entries {
            let fixed = model
                .node(node)
                .map(|n| n.is_fixed(&variable))
                .unwrap_or(false);
            let dof = Dof {
                node,
                variable,
                equation_id: 0,
                fixed,
            };
            if fixed {
                constrained.push(dof);
            } else {
                free.push(dof);
            }
        }

        let n_free = free.len();
        let mut dofs = free;
        dofs.extend(constrained);
        let mut equation_ids = HashMap::with_capacity(dofs.len());
        for (i, dof) in dofs.iter_mut().enumerate() {
            dof.equation_id = i;
            equation_ids.insert((dof.node, dof.variable.key()), i);
        }

        Self {
            dofs,
            n_free,
            equation_ids,
        }
    }

    /// Number of free (solved) DOFs; the assembled system dimension.
    pub fn n_free(&self) -> usize {
        self.n_free
    }

    /// Total number of DOFs, fixed included.
    pub fn len(&self) -> usize {
        self.dofs.len()
    }

    /// Whether the set holds no DOFs at all.
    pub fn is_empty(&self) -> bool {
        self.dofs.is_empty()
    }

    /// All DOFs, free block first.
    pub fn dofs(&self) -> &[Dof] {
        &self.dofs
    }

    /// Equation id of a (node, variable) pair, if it is a DOF of the model.
    pub fn equation_id(&self, node: usize, variable: &Variable) -> Option<usize> {
        self.equation_ids.get(&(node, variable.key())).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::spring::NonlinearSpring;
    use crate::model::Point3;
    use crate::variable::VariableRegistry;

    fn spring_model() -> (ModelPart, VariableRegistry) {
        let mut registry = VariableRegistry::new();
        let disp = registry.vector3("DISPLACEMENT");
        let mut model = ModelPart::new("springs");
        model.add_node(1, Point3::new(0.0, 0.0, 0.0)).unwrap();
        model.add_node(2, Point3::new(1.0, 0.0, 0.0)).unwrap();
        model.add_element(Box::new(
            NonlinearSpring::new(1, 1, disp.components[0].clone(), 100.0, 0.0).unwrap(),
        ));
        model.add_element(Box::new(
            NonlinearSpring::new(2, 2, disp.components[0].clone(), 100.0, 0.0).unwrap(),
        ));
        // Same DOF referenced twice: must not duplicate.
        model.add_element(Box::new(
            NonlinearSpring::new(3, 2, disp.components[0].clone(), 50.0, 0.0).unwrap(),
        ));
        (model, registry)
    }

    #[test]
    fn test_deduplication_and_ordering() {
        let (model, _registry) = spring_model();
        let dofs = DofSet::from_model(&model);
        assert_eq!(dofs.len(), 2);
        assert_eq!(dofs.n_free(), 2);
        assert_eq!(dofs.dofs()[0].node(), 1);
        assert_eq!(dofs.dofs()[1].node(), 2);
    }

    #[test]
    fn test_free_first_partition() {
        let (mut model, registry) = spring_model();
        let x = registry.get("DISPLACEMENT_X").unwrap().clone();
        model.node_mut(1).unwrap().fix(&x);

        let dofs = DofSet::from_model(&model);
        assert_eq!(dofs.len(), 2);
        assert_eq!(dofs.n_free(), 1);

        // Free DOF occupies equation 0, fixed one comes after.
        assert_eq!(dofs.dofs()[0].node(), 2);
        assert!(dofs.dofs()[0].is_free());
        assert_eq!(dofs.dofs()[0].equation_id(), 0);
        assert_eq!(dofs.dofs()[1].node(), 1);
        assert!(dofs.dofs()[1].is_fixed());
        assert_eq!(dofs.dofs()[1].equation_id(), 1);
    }

    #[test]
    fn test_equation_id_lookup() {
        let (model, registry) = spring_model();
        let x = registry.get("DISPLACEMENT_X").unwrap().clone();
        let y = registry.get("DISPLACEMENT_Y").unwrap().clone();
        let dofs = DofSet::from_model(&model);

        assert_eq!(dofs.equation_id(1, &x), Some(0));
        assert_eq!(dofs.equation_id(2, &x), Some(1));
        assert_eq!(dofs.equation_id(1, &y), None);
    }

    #[test]
    fn test_empty_model() {
        let model = ModelPart::new("empty");
        let dofs = DofSet::from_model(&model);
        assert!(dofs.is_empty());
        assert_eq!(dofs.n_free(), 0);
    }
}
