//! mufem - Multiphysics FEM solving strategies
//!
//! Generic nonlinear solution machinery for finite element problems:
//! - Model parts holding nodes, elements, conditions and process state
//! - Variable registry with scalar and vector (component) unknowns
//! - Residual-based incremental-update static scheme
//! - Mixed multi-variable and residual-norm convergence criteria
//! - Parallel builder-and-solver and Newton-Raphson strategy
//! - Sparse assembly (CSR) and direct linear solvers
//!
//! # Architecture
//!
//! The solution loop is built from these abstractions:
//!
//! - [`Element`] / [`Condition`] traits: local tangent and residual
//! - [`Scheme`] trait: entity dispatch and DOF update (see [`StaticScheme`])
//! - [`ConvergenceCriterion`] trait: iteration acceptance
//!   (see [`MixedGenericCriteria`])
//! - [`NewtonRaphsonStrategy`]: the step driver tying them together
//! - [`LinearSolver`] trait: linear system solution strategies

pub mod builder;
pub mod communicator;
pub mod criteria;
pub mod dof;
pub mod element;
pub mod error;
pub mod model;
pub mod scheme;
pub mod settings;
pub mod solver;
pub mod sparse;
pub mod strategy;
pub mod variable;
pub mod variable_utils;

pub use builder::BuilderAndSolver;
pub use communicator::{DataCommunicator, SerialCommunicator};
pub use criteria::{
    AndCriteria, ConvergenceCriterion, ConvergenceVariable, MixedGenericCriteria, OrCriteria,
    ResidualCriterion,
};
pub use dof::{Dof, DofSet};
pub use element::{Condition, Element};
pub use error::{Error, Result};
pub use model::{ModelPart, Node, Point3, ProcessInfo};
pub use scheme::{Scheme, StaticScheme};
pub use settings::{ConvergenceVariableSettings, StrategySettings};
pub use solver::{CachedCholesky, DenseLu, LinearSolver, SparseCholesky};
pub use sparse::CsrMatrix;
pub use strategy::{NewtonRaphsonStrategy, SolveReport};
pub use variable::{Variable, VariableKind, VariableRegistry, Vector3Variable};
