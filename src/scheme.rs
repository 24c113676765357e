//! Solution schemes.
//!
//! A [`Scheme`] owns the per-step lifecycle of the nonlinear loop and the
//! dispatch from discretization entities to assembled contributions: it asks
//! each element/condition for its local tangent and residual and pairs them
//! with global equation ids. The [`StaticScheme`] is the residual-based
//! incremental-update variant: the only state transfer it performs is adding
//! the solved increment onto the nodal database; no prediction is done.

use crate::dof::DofSet;
use crate::element::{Condition, Element};
use crate::error::{Error, Result};
use crate::model::ModelPart;
use crate::variable::Variable;
use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;

/// A local contribution paired with its global equation ids.
pub struct LocalSystem {
    /// Local tangent matrix.
    pub lhs: DMatrix<f64>,
    /// Local residual vector.
    pub rhs: DVector<f64>,
    /// Global equation id per local DOF.
    pub equation_ids: Vec<usize>,
}

fn resolve_equation_ids(dof_list: &[(usize, Variable)], dofs: &DofSet) -> Result<Vec<usize>> {
    dof_list
        .iter()
        .map(|(node, variable)| {
            dofs.equation_id(*node, variable).ok_or_else(|| {
                Error::Assembly(format!(
                    "no equation id for {} at node {}",
                    variable.name(),
                    node
                ))
            })
        })
        .collect()
}

/// Time/solution integration scheme interface.
pub trait Scheme: Send + Sync {
    /// Called once at the beginning of every solution step.
    fn initialize_solution_step(&self, _model: &mut ModelPart, _dofs: &DofSet) -> Result<()> {
        Ok(())
    }

    /// Called once after a solution step completes.
    fn finalize_solution_step(&self, _model: &mut ModelPart, _dofs: &DofSet) -> Result<()> {
        Ok(())
    }

    /// Called at the start of every nonlinear iteration; runs the per-entity
    /// iteration hooks.
    fn initialize_nonlinear_iteration(&self, model: &ModelPart) -> Result<()>;

    /// Predict the solution before iterating.
    fn predict(&self, model: &mut ModelPart, dofs: &DofSet) -> Result<()>;

    /// Apply the solved increment `dx` (length = free DOF count) to the
    /// nodal database.
    fn update(&self, model: &mut ModelPart, dofs: &DofSet, dx: &[f64]) -> Result<()>;

    /// Tangent and residual of one element, with equation ids.
    fn element_system(
        &self,
        element: &dyn Element,
        model: &ModelPart,
        dofs: &DofSet,
    ) -> Result<LocalSystem>;

    /// Tangent and residual of one condition, with equation ids.
    fn condition_system(
        &self,
        condition: &dyn Condition,
        model: &ModelPart,
        dofs: &DofSet,
    ) -> Result<LocalSystem>;

    /// Residual of one element, with equation ids.
    fn element_rhs(
        &self,
        element: &dyn Element,
        model: &ModelPart,
        dofs: &DofSet,
    ) -> Result<(DVector<f64>, Vec<usize>)>;

    /// Residual of one condition, with equation ids.
    fn condition_rhs(
        &self,
        condition: &dyn Condition,
        model: &ModelPart,
        dofs: &DofSet,
    ) -> Result<(DVector<f64>, Vec<usize>)>;
}

/// Residual-based incremental-update static scheme.
///
/// `update` adds the DOF increments to the nodal values; `predict` is a
/// no-op, so each step starts iterating from the previous converged state.
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticScheme;

impl StaticScheme {
    /// Create a static scheme.
    pub fn new() -> Self {
        Self
    }
}

impl Scheme for StaticScheme {
    fn initialize_nonlinear_iteration(&self, model: &ModelPart) -> Result<()> {
        model
            .elements()
            .par_iter()
            .for_each(|element| element.initialize_nonlinear_iteration(model));
        model
            .conditions()
            .par_iter()
            .for_each(|condition| condition.initialize_nonlinear_iteration(model));
        Ok(())
    }

    fn predict(&self, _model: &mut ModelPart, _dofs: &DofSet) -> Result<()> {
        Ok(())
    }

    fn update(&self, model: &mut ModelPart, dofs: &DofSet, dx: &[f64]) -> Result<()> {
        if dx.len() != dofs.n_free() {
            return Err(Error::Assembly(format!(
                "increment size {} does not match free DOF count {}",
                dx.len(),
                dofs.n_free()
            )));
        }
        for dof in &dofs.dofs()[..dofs.n_free()] {
            let increment = dx[dof.equation_id()];
            let node = model.node_mut(dof.node()).ok_or_else(|| {
                Error::Model(format!("DOF references missing node {}", dof.node()))
            })?;
            node.add_value(dof.variable(), increment);
        }
        Ok(())
    }

    fn element_system(
        &self,
        element: &dyn Element,
        model: &ModelPart,
        dofs: &DofSet,
    ) -> Result<LocalSystem> {
        let (lhs, rhs) = element.calculate_local_system(model)?;
        let equation_ids = resolve_equation_ids(&element.dofs(), dofs)?;
        Ok(LocalSystem {
            lhs,
            rhs,
            equation_ids,
        })
    }

    fn condition_system(
        &self,
        condition: &dyn Condition,
        model: &ModelPart,
        dofs: &DofSet,
    ) -> Result<LocalSystem> {
        let (lhs, rhs) = condition.calculate_local_system(model)?;
        let equation_ids = resolve_equation_ids(&condition.dofs(), dofs)?;
        Ok(LocalSystem {
            lhs,
            rhs,
            equation_ids,
        })
    }

    fn element_rhs(
        &self,
        element: &dyn Element,
        model: &ModelPart,
        dofs: &DofSet,
    ) -> Result<(DVector<f64>, Vec<usize>)> {
        let rhs = element.calculate_rhs(model)?;
        let equation_ids = resolve_equation_ids(&element.dofs(), dofs)?;
        Ok((rhs, equation_ids))
    }

    fn condition_rhs(
        &self,
        condition: &dyn Condition,
        model: &ModelPart,
        dofs: &DofSet,
    ) -> Result<(DVector<f64>, Vec<usize>)> {
        let rhs = condition.calculate_rhs(model)?;
        let equation_ids = resolve_equation_ids(&condition.dofs(), dofs)?;
        Ok((rhs, equation_ids))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::NonlinearSpring;
    use crate::model::Point3;
    use crate::variable::VariableRegistry;
    use approx::assert_relative_eq;

    fn two_spring_model() -> (ModelPart, VariableRegistry) {
        let mut registry = VariableRegistry::new();
        let u = registry.scalar("DISPLACEMENT_1D");
        let mut model = ModelPart::new("springs");
        model.add_node(1, Point3::new(0.0, 0.0, 0.0)).unwrap();
        model.add_node(2, Point3::new(1.0, 0.0, 0.0)).unwrap();
        model.add_element(Box::new(NonlinearSpring::new(1, 1, u.clone(), 10.0, 0.0).unwrap()));
        model.add_element(Box::new(NonlinearSpring::new(2, 2, u, 20.0, 0.0).unwrap()));
        (model, registry)
    }

    #[test]
    fn test_update_applies_increments() {
        let (mut model, registry) = two_spring_model();
        let u = registry.get("DISPLACEMENT_1D").unwrap().clone();
        let dofs = DofSet::from_model(&model);

        StaticScheme::new()
            .update(&mut model, &dofs, &[0.5, -0.25])
            .unwrap();
        assert_relative_eq!(model.node(1).unwrap().value(&u), 0.5);
        assert_relative_eq!(model.node(2).unwrap().value(&u), -0.25);
    }

    #[test]
    fn test_update_skips_fixed_dofs() {
        let (mut model, registry) = two_spring_model();
        let u = registry.get("DISPLACEMENT_1D").unwrap().clone();
        model.node_mut(1).unwrap().set_value(&u, 3.0);
        model.node_mut(1).unwrap().fix(&u);

        let dofs = DofSet::from_model(&model);
        assert_eq!(dofs.n_free(), 1);

        StaticScheme::new().update(&mut model, &dofs, &[0.1]).unwrap();
        assert_relative_eq!(model.node(1).unwrap().value(&u), 3.0);
        assert_relative_eq!(model.node(2).unwrap().value(&u), 0.1);
    }

    #[test]
    fn test_update_rejects_size_mismatch() {
        let (mut model, _registry) = two_spring_model();
        let dofs = DofSet::from_model(&model);
        assert!(StaticScheme::new().update(&mut model, &dofs, &[0.1]).is_err());
    }

    #[test]
    fn test_element_system_pairs_equation_ids() {
        let (model, _registry) = two_spring_model();
        let dofs = DofSet::from_model(&model);
        let scheme = StaticScheme::new();

        let local = scheme
            .element_system(model.elements()[1].as_ref(), &model, &dofs)
            .unwrap();
        assert_eq!(local.equation_ids, vec![1]);
        assert_relative_eq!(local.lhs[(0, 0)], 20.0);
    }
}
