//! Boolean composition of convergence criteria.
//!
//! Both operands are always evaluated, so their side effects (norm
//! bookkeeping, status output) happen every iteration regardless of the
//! other operand's verdict.

use crate::criteria::ConvergenceCriterion;
use crate::dof::DofSet;
use crate::error::Result;
use crate::model::ModelPart;

/// Converged when both operands are converged.
pub struct AndCriteria {
    first: Box<dyn ConvergenceCriterion>,
    second: Box<dyn ConvergenceCriterion>,
}

impl AndCriteria {
    /// Combine two criteria conjunctively.
    pub fn new(first: Box<dyn ConvergenceCriterion>, second: Box<dyn ConvergenceCriterion>) -> Self {
        Self { first, second }
    }
}

impl ConvergenceCriterion for AndCriteria {
    fn initialize_solution_step(&mut self, model: &ModelPart, dofs: &DofSet) {
        self.first.initialize_solution_step(model, dofs);
        self.second.initialize_solution_step(model, dofs);
    }

    fn pre_criteria(&mut self, model: &ModelPart, dofs: &DofSet) -> bool {
        let first = self.first.pre_criteria(model, dofs);
        let second = self.second.pre_criteria(model, dofs);
        first && second
    }

    fn post_criteria(
        &mut self,
        model: &ModelPart,
        dofs: &DofSet,
        dx: &[f64],
        rhs: &[f64],
    ) -> Result<bool> {
        let first = self.first.post_criteria(model, dofs, dx, rhs)?;
        let second = self.second.post_criteria(model, dofs, dx, rhs)?;
        Ok(first && second)
    }

    fn echo_level(&self) -> u32 {
        self.first.echo_level().max(self.second.echo_level())
    }

    fn set_echo_level(&mut self, level: u32) {
        self.first.set_echo_level(level);
        self.second.set_echo_level(level);
    }
}

/// Converged when either operand is converged.
pub struct OrCriteria {
    first: Box<dyn ConvergenceCriterion>,
    second: Box<dyn ConvergenceCriterion>,
}

impl OrCriteria {
    /// Combine two criteria disjunctively.
    pub fn new(first: Box<dyn ConvergenceCriterion>, second: Box<dyn ConvergenceCriterion>) -> Self {
        Self { first, second }
    }
}

impl ConvergenceCriterion for OrCriteria {
    fn initialize_solution_step(&mut self, model: &ModelPart, dofs: &DofSet) {
        self.first.initialize_solution_step(model, dofs);
        self.second.initialize_solution_step(model, dofs);
    }

    fn pre_criteria(&mut self, model: &ModelPart, dofs: &DofSet) -> bool {
        let first = self.first.pre_criteria(model, dofs);
        let second = self.second.pre_criteria(model, dofs);
        first || second
    }

    fn post_criteria(
        &mut self,
        model: &ModelPart,
        dofs: &DofSet,
        dx: &[f64],
        rhs: &[f64],
    ) -> Result<bool> {
        let first = self.first.post_criteria(model, dofs, dx, rhs)?;
        let second = self.second.post_criteria(model, dofs, dx, rhs)?;
        Ok(first || second)
    }

    fn echo_level(&self) -> u32 {
        self.first.echo_level().max(self.second.echo_level())
    }

    fn set_echo_level(&mut self, level: u32) {
        self.first.set_echo_level(level);
        self.second.set_echo_level(level);
    }
}
