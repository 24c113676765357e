//! Newton-Raphson solution strategy.
//!
//! Drives one solution step through the scheme/criteria protocol:
//! predict, then iterate { initialize nonlinear iteration, assemble, solve,
//! update, check convergence } until the criterion accepts or the iteration
//! budget runs out.

use crate::builder::BuilderAndSolver;
use crate::criteria::ConvergenceCriterion;
use crate::error::Result;
use crate::model::ModelPart;
use crate::scheme::Scheme;
use crate::settings::StrategySettings;
use crate::solver::{CachedCholesky, LinearSolver};
use log::{debug, warn};

/// Outcome of one solution step.
#[derive(Debug, Clone, Copy)]
pub struct SolveReport {
    /// Whether the convergence criterion accepted.
    pub converged: bool,
    /// Nonlinear iterations performed.
    pub iterations: usize,
    /// Free DOFs solved for.
    pub n_free: usize,
}

/// Full Newton-Raphson strategy with a fresh tangent every iteration.
pub struct NewtonRaphsonStrategy {
    scheme: Box<dyn Scheme>,
    criterion: Box<dyn ConvergenceCriterion>,
    builder: BuilderAndSolver,
    settings: StrategySettings,
}

impl NewtonRaphsonStrategy {
    /// Create a strategy from its scheme, convergence criterion and
    /// settings.
    pub fn new(
        scheme: Box<dyn Scheme>,
        criterion: Box<dyn ConvergenceCriterion>,
        settings: StrategySettings,
    ) -> Self {
        let mut criterion = criterion;
        criterion.set_echo_level(settings.echo_level);
        Self {
            scheme,
            criterion,
            builder: BuilderAndSolver::new(),
            settings,
        }
    }

    /// Strategy settings.
    pub fn settings(&self) -> &StrategySettings {
        &self.settings
    }

    /// Solve one nonlinear solution step.
    pub fn solve_solution_step(&mut self, model: &mut ModelPart) -> Result<SolveReport> {
        let dofs = self.builder.set_up_dofs(model);
        let n_free = dofs.n_free();
        model.process_info_mut().nonlinear_iteration = 0;

        if n_free == 0 {
            debug!("all DOFs constrained, nothing to solve");
            return Ok(SolveReport {
                converged: true,
                iterations: 0,
                n_free,
            });
        }

        self.scheme.initialize_solution_step(model, &dofs)?;
        self.criterion.initialize_solution_step(model, &dofs);
        self.scheme.predict(model, &dofs)?;

        // The sparsity pattern is fixed by the mesh topology, so the
        // symbolic factorization is shared by all iterations of the step.
        let mut solver = CachedCholesky::new();
        let mut converged = false;
        let mut iterations = 0;

        for iteration in 1..=self.settings.max_iterations {
            iterations = iteration;
            model.process_info_mut().nonlinear_iteration = iteration;

            self.scheme.initialize_nonlinear_iteration(model)?;
            let (tangent, residual) = self.builder.build(self.scheme.as_ref(), model, &dofs)?;
            if !solver.is_analyzed() {
                solver.analyze(&tangent)?;
            }

            let pre_ok = self.criterion.pre_criteria(model, &dofs);
            let dx = solver.solve(&tangent, &residual)?;
            self.scheme.update(model, &dofs, &dx)?;

            if self.settings.echo_level > 1 {
                debug!(
                    "iteration {}: |b| = {:.6e}, |dx| = {:.6e}",
                    iteration,
                    crate::sparse::norm(&residual),
                    crate::sparse::norm(&dx)
                );
            }

            if pre_ok && self.criterion.post_criteria(model, &dofs, &dx, &residual)? {
                converged = true;
                break;
            }
        }

        self.scheme.finalize_solution_step(model, &dofs)?;

        if !converged {
            warn!(
                "step {} did not converge within {} iterations",
                model.process_info().step,
                self.settings.max_iterations
            );
        }

        Ok(SolveReport {
            converged,
            iterations,
            n_free,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::{ConvergenceVariable, MixedGenericCriteria};
    use crate::element::{NonlinearSpring, PointLoadCondition};
    use crate::model::Point3;
    use crate::scheme::StaticScheme;
    use crate::variable::VariableRegistry;
    use approx::assert_relative_eq;

    fn displacement_criterion(registry: &VariableRegistry) -> Box<dyn ConvergenceCriterion> {
        Box::new(MixedGenericCriteria::new(vec![ConvergenceVariable {
            variable: registry.get("U").unwrap().clone(),
            rel_tol: 1e-10,
            abs_tol: 1e-12,
        }]))
    }

    #[test]
    fn test_linear_problem_converges_in_one_iteration_pair() {
        let mut registry = VariableRegistry::new();
        let u = registry.scalar("U");
        let mut model = ModelPart::new("linear");
        model.add_node(1, Point3::new(0.0, 0.0, 0.0)).unwrap();
        model.add_element(Box::new(NonlinearSpring::new(1, 1, u.clone(), 100.0, 0.0).unwrap()));
        model.add_condition(Box::new(PointLoadCondition::new(1, 1, u.clone(), 50.0)));

        let mut strategy = NewtonRaphsonStrategy::new(
            Box::new(StaticScheme::new()),
            displacement_criterion(&registry),
            StrategySettings::default(),
        );

        let report = strategy.solve_solution_step(&mut model).unwrap();
        assert!(report.converged);
        assert_eq!(report.n_free, 1);
        // The first update already lands on the solution; the second
        // iteration produces a zero increment and passes the check.
        assert!(report.iterations <= 2);
        assert_relative_eq!(model.node(1).unwrap().value(&u), 0.5, epsilon = 1e-10);
    }

    #[test]
    fn test_fully_constrained_step() {
        let mut registry = VariableRegistry::new();
        let u = registry.scalar("U");
        let mut model = ModelPart::new("constrained");
        model.add_node(1, Point3::new(0.0, 0.0, 0.0)).unwrap();
        model.node_mut(1).unwrap().fix(&u);
        model.add_element(Box::new(NonlinearSpring::new(1, 1, u, 100.0, 0.0).unwrap()));

        let mut strategy = NewtonRaphsonStrategy::new(
            Box::new(StaticScheme::new()),
            displacement_criterion(&registry),
            StrategySettings::default(),
        );

        let report = strategy.solve_solution_step(&mut model).unwrap();
        assert!(report.converged);
        assert_eq!(report.iterations, 0);
        assert_eq!(report.n_free, 0);
    }

    #[test]
    fn test_iteration_budget_exhaustion_is_reported() {
        let mut registry = VariableRegistry::new();
        let u = registry.scalar("U");
        let mut model = ModelPart::new("stiff");
        model.add_node(1, Point3::new(0.0, 0.0, 0.0)).unwrap();
        // Strongly nonlinear spring and a one-iteration budget.
        model.add_element(Box::new(NonlinearSpring::new(1, 1, u.clone(), 1.0, 50.0).unwrap()));
        model.add_condition(Box::new(PointLoadCondition::new(1, 1, u, 40.0)));

        let settings = StrategySettings {
            max_iterations: 1,
            echo_level: 0,
        };
        let mut strategy = NewtonRaphsonStrategy::new(
            Box::new(StaticScheme::new()),
            displacement_criterion(&registry),
            settings,
        );

        let report = strategy.solve_solution_step(&mut model).unwrap();
        assert!(!report.converged);
        assert_eq!(report.iterations, 1);
    }
}
