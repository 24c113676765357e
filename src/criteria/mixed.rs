//! Multi-variable convergence criterion for mixed problems.
//!
//! Error is evaluated separately for each listed variable: solution and
//! increment norms are accumulated over the free DOFs (components folding
//! onto their source vector variable), reduced across processes, and checked
//! against per-variable relative and absolute tolerances.

use crate::communicator::{DataCommunicator, SerialCommunicator};
use crate::criteria::ConvergenceCriterion;
use crate::dof::DofSet;
use crate::error::{Error, Result};
use crate::model::ModelPart;
use crate::settings::ConvergenceVariableSettings;
use crate::variable::{Variable, VariableKey, VariableRegistry};
use log::info;
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

/// A variable to check, with its tolerances.
#[derive(Debug, Clone)]
pub struct ConvergenceVariable {
    /// Scalar or vector variable (vector components are folded onto it).
    pub variable: Variable,
    /// Relative tolerance on ‖Δx‖/‖x‖.
    pub rel_tol: f64,
    /// Absolute tolerance on ‖Δx‖ per DOF.
    pub abs_tol: f64,
}

/// Per-variable convergence measures of one check.
#[derive(Debug, Clone)]
pub struct ConvergenceNorms {
    /// ‖Δx‖/‖x‖ per listed variable.
    pub ratios: Vec<f64>,
    /// ‖Δx‖ divided by the variable's global DOF count.
    pub absolutes: Vec<f64>,
}

/// Generic convergence criterion for mixed vector-scalar problems.
pub struct MixedGenericCriteria {
    entries: Vec<ConvergenceVariable>,
    key_map: HashMap<VariableKey, usize>,
    communicator: Arc<dyn DataCommunicator>,
    echo_level: u32,
}

/// Solution norms below this are treated as unity to avoid division blowup.
const ZERO_NORM_TOLERANCE: f64 = 1.0e-12;

impl MixedGenericCriteria {
    /// Create the criterion from a list of variables and tolerances.
    pub fn new(entries: Vec<ConvergenceVariable>) -> Self {
        let key_map = entries
            .iter()
            .enumerate()
            .map(|(slot, entry)| (entry.variable.key(), slot))
            .collect();
        Self {
            entries,
            key_map,
            communicator: Arc::new(SerialCommunicator),
            echo_level: 0,
        }
    }

    /// Build the criterion from settings, resolving variable names through
    /// the registry.
    pub fn from_settings(
        registry: &VariableRegistry,
        settings: &[ConvergenceVariableSettings],
    ) -> Result<Self> {
        let entries = settings
            .iter()
            .map(|s| {
                let variable = registry
                    .get(&s.variable)
                    .cloned()
                    .ok_or_else(|| Error::Variable(format!("unknown variable {}", s.variable)))?;
                Ok(ConvergenceVariable {
                    variable,
                    rel_tol: s.rel_tol,
                    abs_tol: s.abs_tol,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(entries))
    }

    /// Replace the reduction communicator (serial by default).
    pub fn with_communicator(mut self, communicator: Arc<dyn DataCommunicator>) -> Self {
        self.communicator = communicator;
        self
    }

    /// Number of checked variables.
    pub fn n_variables(&self) -> usize {
        self.entries.len()
    }

    /// Accumulate per-variable norms over the free DOFs and reduce them
    /// across processes.
    pub fn calculate_norms(
        &self,
        model: &ModelPart,
        dofs: &DofSet,
        dx: &[f64],
    ) -> ConvergenceNorms {
        let n_vars = self.entries.len();
        let identity = || (vec![0usize; n_vars], vec![0.0; n_vars], vec![0.0; n_vars]);

        // Per-thread reduction over the free block; components fold onto
        // their source variable's slot, unlisted variables are skipped.
        let (counts, solution, increment) = dofs.dofs()[..dofs.n_free()]
            .par_iter()
            .fold(identity, |mut acc, dof| {
                if let Some(&slot) = self.key_map.get(&dof.variable().effective_key()) {
                    if let Some(node) = model.node(dof.node()) {
                        let value = node.value(dof.variable());
                        let delta = dx[dof.equation_id()];
                        acc.0[slot] += 1;
                        acc.1[slot] += value * value;
                        acc.2[slot] += delta * delta;
                    }
                }
                acc
            })
            .reduce(identity, |mut a, b| {
                for i in 0..n_vars {
                    a.0[i] += b.0[i];
                    a.1[i] += b.1[i];
                    a.2[i] += b.2[i];
                }
                a
            });

        let counts = self.communicator.sum_counts(&counts);
        let mut solution = self.communicator.sum_floats(&solution);
        let increment = self.communicator.sum_floats(&increment);

        for s in &mut solution {
            if *s < ZERO_NORM_TOLERANCE {
                *s = 1.0;
            }
        }

        let mut ratios = vec![0.0; n_vars];
        let mut absolutes = vec![0.0; n_vars];
        for i in 0..n_vars {
            ratios[i] = (increment[i] / solution[i]).sqrt();
            absolutes[i] = if counts[i] > 0 {
                increment[i].sqrt() / counts[i] as f64
            } else {
                0.0
            };
        }

        ConvergenceNorms { ratios, absolutes }
    }

    fn output_status(&self, norms: &ConvergenceNorms) {
        if self.echo_level == 0 {
            return;
        }
        for (i, entry) in self.entries.iter().enumerate() {
            info!(
                "convergence check {}: ratio = {:.6e} (tol {:.3e}), abs = {:.6e} (tol {:.3e})",
                entry.variable.name(),
                norms.ratios[i],
                entry.rel_tol,
                norms.absolutes[i],
                entry.abs_tol
            );
        }
    }

    fn check(&self, norms: &ConvergenceNorms) -> bool {
        let converged = self
            .entries
            .iter()
            .enumerate()
            .all(|(i, entry)| {
                norms.ratios[i] <= entry.rel_tol || norms.absolutes[i] <= entry.abs_tol
            });
        if converged && self.echo_level > 0 {
            info!("convergence achieved for all {} variables", self.entries.len());
        }
        converged
    }
}

impl ConvergenceCriterion for MixedGenericCriteria {
    fn post_criteria(
        &mut self,
        model: &ModelPart,
        dofs: &DofSet,
        dx: &[f64],
        _rhs: &[f64],
    ) -> Result<bool> {
        // All DOFs constrained: nothing is being solved for.
        if dx.is_empty() {
            return Ok(true);
        }
        let norms = self.calculate_norms(model, dofs, dx);
        self.output_status(&norms);
        Ok(self.check(&norms))
    }

    fn echo_level(&self) -> u32 {
        self.echo_level
    }

    fn set_echo_level(&mut self, level: u32) {
        self.echo_level = level;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::NonlinearSpring;
    use crate::model::{ModelPart, Point3};
    use approx::assert_relative_eq;

    /// Two nodes, DISPLACEMENT_X/_Y on both plus TEMPERATURE on both:
    /// 6 free DOFs ordered by (node, registration key).
    fn mixed_model() -> (ModelPart, VariableRegistry) {
        let mut registry = VariableRegistry::new();
        let temp = registry.scalar("TEMPERATURE");
        let disp = registry.vector3("DISPLACEMENT");

        let mut model = ModelPart::new("mixed");
        model.add_node(1, Point3::new(0.0, 0.0, 0.0)).unwrap();
        model.add_node(2, Point3::new(1.0, 0.0, 0.0)).unwrap();

        let mut id = 0;
        for node in [1, 2] {
            for variable in [&temp, &disp.components[0], &disp.components[1]] {
                id += 1;
                model.add_element(Box::new(
                    NonlinearSpring::new(id, node, variable.clone(), 1.0, 0.0).unwrap(),
                ));
            }
        }
        (model, registry)
    }

    fn criteria(registry: &VariableRegistry, rel: f64, abs: f64) -> MixedGenericCriteria {
        let temp = registry.get("TEMPERATURE").unwrap().clone();
        let disp = registry.get("DISPLACEMENT").unwrap().clone();
        MixedGenericCriteria::new(vec![
            ConvergenceVariable {
                variable: disp,
                rel_tol: rel,
                abs_tol: abs,
            },
            ConvergenceVariable {
                variable: temp,
                rel_tol: rel,
                abs_tol: abs,
            },
        ])
    }

    #[test]
    fn test_component_folding_in_norms() {
        let (mut model, registry) = mixed_model();
        let x = registry.get("DISPLACEMENT_X").unwrap().clone();
        let y = registry.get("DISPLACEMENT_Y").unwrap().clone();
        let t = registry.get("TEMPERATURE").unwrap().clone();
        for node in [1, 2] {
            let n = model.node_mut(node).unwrap();
            n.set_value(&x, 3.0);
            n.set_value(&y, 4.0);
            n.set_value(&t, 2.0);
        }

        let dofs = crate::dof::DofSet::from_model(&model);
        assert_eq!(dofs.n_free(), 6);
        let criterion = criteria(&registry, 1e-4, 1e-9);

        // Zero increment: ratios and absolutes all vanish; the solution
        // norms are finite so no zero guard kicks in.
        let norms = criterion.calculate_norms(&model, &dofs, &[0.0; 6]);
        assert_relative_eq!(norms.ratios[0], 0.0);
        assert_relative_eq!(norms.ratios[1], 0.0);

        // Unit increment on DISPLACEMENT_X of node 1 only:
        // displacement slot: sol = 2*(9+16) = 50, inc = 1 -> ratio = sqrt(1/50)
        // abs = 1/4 (four displacement DOFs).
        let mut dx = vec![0.0; 6];
        let eq = dofs.equation_id(1, &x).unwrap();
        dx[eq] = 1.0;
        let norms = criterion.calculate_norms(&model, &dofs, &dx);
        assert_relative_eq!(norms.ratios[0], (1.0f64 / 50.0).sqrt(), epsilon = 1e-12);
        assert_relative_eq!(norms.absolutes[0], 0.25, epsilon = 1e-12);
        assert_relative_eq!(norms.ratios[1], 0.0);
    }

    #[test]
    fn test_all_variables_must_pass() {
        let (mut model, registry) = mixed_model();
        let x = registry.get("DISPLACEMENT_X").unwrap().clone();
        let t = registry.get("TEMPERATURE").unwrap().clone();
        for node in [1, 2] {
            let n = model.node_mut(node).unwrap();
            n.set_value(&x, 1.0);
            n.set_value(&t, 1.0);
        }
        let dofs = crate::dof::DofSet::from_model(&model);
        let mut criterion = criteria(&registry, 1e-2, 1e-12);

        // Large temperature increment, tiny displacement increment: the
        // check must fail even though displacement converged.
        let mut dx = vec![0.0; 6];
        dx[dofs.equation_id(1, &t).unwrap()] = 0.5;
        assert!(!criterion.post_criteria(&model, &dofs, &dx, &[]).unwrap());

        // Both tiny: converged.
        let dx = vec![1e-8; 6];
        assert!(criterion.post_criteria(&model, &dofs, &dx, &[]).unwrap());
    }

    #[test]
    fn test_zero_solution_norm_guard() {
        let (model, registry) = mixed_model();
        let dofs = crate::dof::DofSet::from_model(&model);
        let criterion = criteria(&registry, 1e-4, 1e-9);

        // All solution values are zero; norms divide by 1.0 instead.
        let dx = vec![0.1; 6];
        let norms = criterion.calculate_norms(&model, &dofs, &dx);
        assert!(norms.ratios.iter().all(|r| r.is_finite()));
        assert_relative_eq!(norms.ratios[0], (4.0f64 * 0.01).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_fully_constrained_system_converges() {
        let (model, registry) = mixed_model();
        let dofs = crate::dof::DofSet::from_model(&model);
        let mut criterion = criteria(&registry, 1e-4, 1e-9);
        assert!(criterion.post_criteria(&model, &dofs, &[], &[]).unwrap());
    }

    #[test]
    fn test_unlisted_variable_is_ignored() {
        let (mut model, registry) = mixed_model();
        let t = registry.get("TEMPERATURE").unwrap().clone();
        let disp = registry.get("DISPLACEMENT").unwrap().clone();
        model.node_mut(1).unwrap().set_value(&t, 1.0);
        model.node_mut(2).unwrap().set_value(&t, 1.0);

        let dofs = crate::dof::DofSet::from_model(&model);
        // Only displacement listed: wild temperature increments don't matter.
        let mut criterion = MixedGenericCriteria::new(vec![ConvergenceVariable {
            variable: disp,
            rel_tol: 1e-4,
            abs_tol: 1e-9,
        }]);

        let mut dx = vec![0.0; 6];
        dx[dofs.equation_id(1, &t).unwrap()] = 100.0;
        assert!(criterion.post_criteria(&model, &dofs, &dx, &[]).unwrap());
    }

    #[test]
    fn test_from_settings_unknown_variable() {
        let registry = VariableRegistry::new();
        let settings = [ConvergenceVariableSettings {
            variable: "PRESSURE".into(),
            rel_tol: 1e-4,
            abs_tol: 1e-9,
        }];
        assert!(MixedGenericCriteria::from_settings(&registry, &settings).is_err());
    }
}
