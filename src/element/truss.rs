//! Linear elastic 3D two-node truss element.
//!
//! Axial stiffness EA/L along the reference axis, three translational DOFs
//! per node. The residual is assembled from the current nodal displacements,
//! so the element plugs directly into the incremental-update solution loop.

use crate::element::Element;
use crate::error::{Error, Result};
use crate::model::ModelPart;
use crate::variable::{Variable, Vector3Variable};
use nalgebra::{DMatrix, DVector, Matrix3, Vector3};

/// 3D two-node truss with 3 translational DOFs per node.
pub struct TrussElement3d {
    id: usize,
    nodes: [usize; 2],
    displacement: Vector3Variable,
    youngs_modulus: f64,
    area: f64,
}

impl TrussElement3d {
    /// Create a truss element.
    ///
    /// # Errors
    ///
    /// Returns an error for non-positive Young's modulus or cross-section
    /// area.
    pub fn new(
        id: usize,
        nodes: [usize; 2],
        displacement: Vector3Variable,
        youngs_modulus: f64,
        area: f64,
    ) -> Result<Self> {
        if youngs_modulus <= 0.0 {
            return Err(Error::Element(format!(
                "truss {}: Young's modulus must be positive",
                id
            )));
        }
        if area <= 0.0 {
            return Err(Error::Element(format!(
                "truss {}: cross-section area must be positive",
                id
            )));
        }
        Ok(Self {
            id,
            nodes,
            displacement,
            youngs_modulus,
            area,
        })
    }

    /// Axis direction and reference length.
    fn axis(&self, model: &ModelPart) -> Result<(Vector3<f64>, f64)> {
        let a = model.try_node(self.nodes[0])?.coords();
        let b = model.try_node(self.nodes[1])?.coords();
        let delta = b - a;
        let length = delta.norm();
        if length < 1e-14 {
            return Err(Error::Element(format!(
                "truss {}: zero reference length",
                self.id
            )));
        }
        Ok((delta / length, length))
    }

    /// Gather the 6 current displacement components.
    fn displacements(&self, model: &ModelPart) -> Result<DVector<f64>> {
        let mut u = DVector::zeros(6);
        for (i, &node) in self.nodes.iter().enumerate() {
            let n = model.try_node(node)?;
            for (j, component) in self.displacement.components.iter().enumerate() {
                u[3 * i + j] = n.value(component);
            }
        }
        Ok(u)
    }
}

impl Element for TrussElement3d {
    fn id(&self) -> usize {
        self.id
    }

    fn dofs(&self) -> Vec<(usize, Variable)> {
        self.nodes
            .iter()
            .flat_map(|&node| {
                self.displacement
                    .components
                    .iter()
                    .map(move |c| (node, c.clone()))
            })
            .collect()
    }

    fn calculate_local_system(&self, model: &ModelPart) -> Result<(DMatrix<f64>, DVector<f64>)> {
        let (direction, length) = self.axis(model)?;
        let k_axial = self.youngs_modulus * self.area / length;

        // K = EA/L * [ d d^T  -d d^T ; -d d^T  d d^T ]
        let block: Matrix3<f64> = direction * direction.transpose() * k_axial;
        let mut lhs = DMatrix::zeros(6, 6);
        for i in 0..3 {
            for j in 0..3 {
                lhs[(i, j)] = block[(i, j)];
                lhs[(i + 3, j + 3)] = block[(i, j)];
                lhs[(i, j + 3)] = -block[(i, j)];
                lhs[(i + 3, j)] = -block[(i, j)];
            }
        }

        let u = self.displacements(model)?;
        let rhs = -&lhs * u;
        Ok((lhs, rhs))
    }
}
