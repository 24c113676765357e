//! Model part: the mesh-region container driven by the solution loop.
//!
//! A [`ModelPart`] owns the nodes of one physical region together with the
//! elements and conditions discretizing it, plus the [`ProcessInfo`] shared
//! state (step, time, nonlinear iteration). Nodes store one `f64` per
//! registered variable key and a fixity flag per key; unset values read as
//! zero.

use crate::element::{Condition, Element};
use crate::error::{Error, Result};
use crate::variable::{Variable, VariableKey};
use nalgebra::Vector3;
use std::collections::{HashMap, HashSet};

/// A point in 3D space.
pub type Point3 = Vector3<f64>;

/// A mesh node carrying solution-step data.
#[derive(Debug, Clone)]
pub struct Node {
    id: usize,
    coords: Point3,
    values: HashMap<VariableKey, f64>,
    fixed: HashSet<VariableKey>,
}

impl Node {
    /// Create a node at the given coordinates.
    pub fn new(id: usize, coords: Point3) -> Self {
        Self {
            id,
            coords,
            values: HashMap::new(),
            fixed: HashSet::new(),
        }
    }

    /// Node id.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Nodal coordinates.
    pub fn coords(&self) -> &Point3 {
        &self.coords
    }

    /// Current value of a variable at this node. Unset variables read 0.0.
    pub fn value(&self, variable: &Variable) -> f64 {
        self.values.get(&variable.key()).copied().unwrap_or(0.0)
    }

    /// Overwrite the value of a variable.
    pub fn set_value(&mut self, variable: &Variable, value: f64) {
        self.values.insert(variable.key(), value);
    }

    /// Add an increment to the value of a variable.
    pub fn add_value(&mut self, variable: &Variable, increment: f64) {
        *self.values.entry(variable.key()).or_insert(0.0) += increment;
    }

    /// Mark a variable as fixed (Dirichlet) at this node.
    pub fn fix(&mut self, variable: &Variable) {
        self.fixed.insert(variable.key());
    }

    /// Release a previously fixed variable.
    pub fn free(&mut self, variable: &Variable) {
        self.fixed.remove(&variable.key());
    }

    /// Whether a variable is fixed at this node.
    pub fn is_fixed(&self, variable: &Variable) -> bool {
        self.fixed.contains(&variable.key())
    }
}

/// Per-step shared solution state.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessInfo {
    /// Solution step counter.
    pub step: usize,
    /// Current time.
    pub time: f64,
    /// Time increment of the current step.
    pub delta_time: f64,
    /// Nonlinear iteration number inside the current step (1-based).
    pub nonlinear_iteration: usize,
}

/// Container for one physical region: nodes, elements, conditions and
/// process-wide state.
pub struct ModelPart {
    name: String,
    nodes: Vec<Node>,
    node_index: HashMap<usize, usize>,
    elements: Vec<Box<dyn Element>>,
    conditions: Vec<Box<dyn Condition>>,
    process_info: ProcessInfo,
}

impl ModelPart {
    /// Create an empty model part.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: Vec::new(),
            node_index: HashMap::new(),
            elements: Vec::new(),
            conditions: Vec::new(),
            process_info: ProcessInfo::default(),
        }
    }

    /// Model part name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a node with a unique id.
    pub fn add_node(&mut self, id: usize, coords: Point3) -> Result<&mut Node> {
        if self.node_index.contains_key(&id) {
            return Err(Error::Model(format!("duplicate node id {}", id)));
        }
        let slot = self.nodes.len();
        self.node_index.insert(id, slot);
        self.nodes.push(Node::new(id, coords));
        Ok(&mut self.nodes[slot])
    }

    /// Look up a node by id.
    pub fn node(&self, id: usize) -> Option<&Node> {
        self.node_index.get(&id).map(|&slot| &self.nodes[slot])
    }

    /// Look up a node by id, mutably.
    pub fn node_mut(&mut self, id: usize) -> Option<&mut Node> {
        let slot = *self.node_index.get(&id)?;
        Some(&mut self.nodes[slot])
    }

    /// Look up a node by id, erroring on absence.
    pub fn try_node(&self, id: usize) -> Result<&Node> {
        self.node(id)
            .ok_or_else(|| Error::Model(format!("node {} not in model part '{}'", id, self.name)))
    }

    /// All nodes in insertion order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// All nodes in insertion order, mutably.
    pub fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    /// Add an element.
    pub fn add_element(&mut self, element: Box<dyn Element>) {
        self.elements.push(element);
    }

    /// Add a condition.
    pub fn add_condition(&mut self, condition: Box<dyn Condition>) {
        self.conditions.push(condition);
    }

    /// All elements.
    pub fn elements(&self) -> &[Box<dyn Element>] {
        &self.elements
    }

    /// All conditions.
    pub fn conditions(&self) -> &[Box<dyn Condition>] {
        &self.conditions
    }

    /// Number of nodes.
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Shared process state.
    pub fn process_info(&self) -> &ProcessInfo {
        &self.process_info
    }

    /// Shared process state, mutably.
    pub fn process_info_mut(&mut self) -> &mut ProcessInfo {
        &mut self.process_info
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variable::VariableRegistry;
    use approx::assert_relative_eq;

    #[test]
    fn test_node_values_default_to_zero() {
        let mut registry = VariableRegistry::new();
        let temp = registry.scalar("TEMPERATURE");
        let node = Node::new(1, Point3::new(0.0, 0.0, 0.0));
        assert_relative_eq!(node.value(&temp), 0.0);
    }

    #[test]
    fn test_node_value_updates() {
        let mut registry = VariableRegistry::new();
        let temp = registry.scalar("TEMPERATURE");
        let mut node = Node::new(1, Point3::new(0.0, 0.0, 0.0));

        node.set_value(&temp, 20.0);
        node.add_value(&temp, 5.0);
        assert_relative_eq!(node.value(&temp), 25.0);
    }

    #[test]
    fn test_node_fixity() {
        let mut registry = VariableRegistry::new();
        let disp = registry.vector3("DISPLACEMENT");
        let mut node = Node::new(1, Point3::new(0.0, 0.0, 0.0));

        node.fix(&disp.components[0]);
        assert!(node.is_fixed(&disp.components[0]));
        assert!(!node.is_fixed(&disp.components[1]));

        node.free(&disp.components[0]);
        assert!(!node.is_fixed(&disp.components[0]));
    }

    #[test]
    fn test_duplicate_node_id_rejected() {
        let mut model = ModelPart::new("test");
        model.add_node(1, Point3::new(0.0, 0.0, 0.0)).unwrap();
        assert!(model.add_node(1, Point3::new(1.0, 0.0, 0.0)).is_err());
    }

    #[test]
    fn test_node_lookup() {
        let mut model = ModelPart::new("test");
        model.add_node(10, Point3::new(1.0, 2.0, 3.0)).unwrap();
        model.add_node(20, Point3::new(4.0, 5.0, 6.0)).unwrap();

        let node = model.node(20).expect("node 20 exists");
        assert_relative_eq!(node.coords().x, 4.0);
        assert!(model.node(30).is_none());
        assert!(model.try_node(30).is_err());
    }
}
