//! Parallelized bulk operations on nodal variable values and fixity.

use crate::model::ModelPart;
use crate::variable::{Variable, Vector3Variable};
use rayon::prelude::*;

/// Set a scalar (or component) variable to `value` on every node.
pub fn set_scalar(model: &mut ModelPart, variable: &Variable, value: f64) {
    model
        .nodes_mut()
        .par_iter_mut()
        .for_each(|node| node.set_value(variable, value));
}

/// Copy the values of `source` into `destination` on every node.
pub fn copy_scalar(model: &mut ModelPart, source: &Variable, destination: &Variable) {
    model.nodes_mut().par_iter_mut().for_each(|node| {
        let value = node.value(source);
        node.set_value(destination, value);
    });
}

/// Set all three components of a vector variable on every node.
pub fn apply_vector3(model: &mut ModelPart, variable: &Vector3Variable, value: [f64; 3]) {
    model.nodes_mut().par_iter_mut().for_each(|node| {
        for (component, v) in variable.components.iter().zip(value) {
            node.set_value(component, v);
        }
    });
}

/// Fix a variable on every node.
pub fn fix(model: &mut ModelPart, variable: &Variable) {
    model
        .nodes_mut()
        .par_iter_mut()
        .for_each(|node| node.fix(variable));
}

/// Free a variable on every node.
pub fn free(model: &mut ModelPart, variable: &Variable) {
    model
        .nodes_mut()
        .par_iter_mut()
        .for_each(|node| node.free(variable));
}
