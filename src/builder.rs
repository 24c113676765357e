//! Builder and solver: parallel assembly of the free-DOF system.
//!
//! Local contributions are dispatched through the scheme and scattered into
//! a triplet accumulator behind a mutex; equation ids past the free count
//! (the fixed DOFs) are dropped on scatter, which realizes the Dirichlet
//! conditions without touching the matrix afterwards.

use crate::dof::DofSet;
use crate::error::Result;
use crate::model::ModelPart;
use crate::scheme::{LocalSystem, Scheme};
use crate::sparse::{CsrMatrix, TripletMatrix};
use rayon::prelude::*;
use std::sync::Mutex;

/// Assembles the global tangent and residual from scheme-dispatched
/// contributions.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuilderAndSolver;

impl BuilderAndSolver {
    /// Create a builder.
    pub fn new() -> Self {
        Self
    }

    /// Build the DOF set for the model's current element/condition layout
    /// and fixity state.
    pub fn set_up_dofs(&self, model: &ModelPart) -> DofSet {
        DofSet::from_model(model)
    }

    /// Assemble the free-DOF tangent matrix and residual vector.
    pub fn build(
        &self,
        scheme: &dyn Scheme,
        model: &ModelPart,
        dofs: &DofSet,
    ) -> Result<(CsrMatrix, Vec<f64>)> {
        let n = dofs.n_free();
        // Small-stencil estimate; the triplet store grows if it is exceeded.
        let nnz_estimate = n * 12;
        let triplet = Mutex::new(TripletMatrix::with_capacity(n, n, nnz_estimate));
        let rhs = Mutex::new(vec![0.0; n]);

        model
            .elements()
            .par_iter()
            .try_for_each(|element| -> Result<()> {
                let local = scheme.element_system(element.as_ref(), model, dofs)?;
                scatter_system(&local, n, &triplet, &rhs);
                Ok(())
            })?;

        model
            .conditions()
            .par_iter()
            .try_for_each(|condition| -> Result<()> {
                let local = scheme.condition_system(condition.as_ref(), model, dofs)?;
                scatter_system(&local, n, &triplet, &rhs);
                Ok(())
            })?;

        let stiffness = triplet.into_inner().unwrap().to_csr();
        Ok((stiffness, rhs.into_inner().unwrap()))
    }

    /// Assemble the residual vector only.
    pub fn build_rhs(
        &self,
        scheme: &dyn Scheme,
        model: &ModelPart,
        dofs: &DofSet,
    ) -> Result<Vec<f64>> {
        let n = dofs.n_free();
        let rhs = Mutex::new(vec![0.0; n]);

        model
            .elements()
            .par_iter()
            .try_for_each(|element| -> Result<()> {
                let (local_rhs, equation_ids) = scheme.element_rhs(element.as_ref(), model, dofs)?;
                scatter_rhs(&local_rhs, &equation_ids, n, &rhs);
                Ok(())
            })?;

        model
            .conditions()
            .par_iter()
            .try_for_each(|condition| -> Result<()> {
                let (local_rhs, equation_ids) =
                    scheme.condition_rhs(condition.as_ref(), model, dofs)?;
                scatter_rhs(&local_rhs, &equation_ids, n, &rhs);
                Ok(())
            })?;

        Ok(rhs.into_inner().unwrap())
    }
}

fn scatter_system(
    local: &LocalSystem,
    n_free: usize,
    triplet: &Mutex<TripletMatrix>,
    rhs: &Mutex<Vec<f64>>,
) {
    triplet
        .lock()
        .unwrap()
        .scatter(&local.equation_ids, &local.equation_ids, &local.lhs);

    let mut global_rhs = rhs.lock().unwrap();
    for (i, &gi) in local.equation_ids.iter().enumerate() {
        if gi < n_free {
            global_rhs[gi] += local.rhs[i];
        }
    }
}

fn scatter_rhs(
    local_rhs: &nalgebra::DVector<f64>,
    equation_ids: &[usize],
    n_free: usize,
    rhs: &Mutex<Vec<f64>>,
) {
    let mut global_rhs = rhs.lock().unwrap();
    for (i, &gi) in equation_ids.iter().enumerate() {
        if gi < n_free {
            global_rhs[gi] += local_rhs[i];
        }
    }
}
