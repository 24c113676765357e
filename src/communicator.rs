//! Distributed-memory reduction seam.
//!
//! Convergence norms accumulated over a locally owned DOF set must be summed
//! across processes before tolerances are checked. The [`DataCommunicator`]
//! trait is that hook; the serial implementation is the identity. An MPI
//! transport is out of scope, but anything providing element-wise sum-all
//! semantics can plug in.

use std::fmt::Debug;

/// Process-group reduction interface.
pub trait DataCommunicator: Send + Sync + Debug {
    /// Element-wise sum of `values` across all processes.
    fn sum_floats(&self, values: &[f64]) -> Vec<f64>;

    /// Element-wise sum of `counts` across all processes.
    fn sum_counts(&self, counts: &[usize]) -> Vec<usize>;

    /// Rank of the calling process.
    fn rank(&self) -> usize;

    /// Number of processes in the group.
    fn size(&self) -> usize;
}

/// Single-process communicator; all reductions are identities.
#[derive(Debug, Default, Clone, Copy)]
pub struct SerialCommunicator;

impl DataCommunicator for SerialCommunicator {
    fn sum_floats(&self, values: &[f64]) -> Vec<f64> {
        values.to_vec()
    }

    fn sum_counts(&self, counts: &[usize]) -> Vec<usize> {
        counts.to_vec()
    }

    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }
}
