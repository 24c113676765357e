//! Solution variable handles and registry.
//!
//! Every nodal unknown is addressed through a [`Variable`]: a cheap-to-clone
//! handle carrying a registry-unique key. Vector quantities register a source
//! variable plus one component variable per spatial direction; degrees of
//! freedom always reference scalar or component variables, and convergence
//! accounting folds components back onto their source via
//! [`Variable::effective_key`].

use std::collections::HashMap;
use std::sync::Arc;

/// Registry-unique identifier of a variable.
pub type VariableKey = u32;

/// What a variable represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    /// A standalone scalar unknown (e.g. TEMPERATURE).
    Scalar,
    /// A 3-component vector quantity (e.g. DISPLACEMENT). Never used as a
    /// DOF directly; its components are.
    Vector3,
    /// One component of a vector variable.
    Component {
        /// Key of the owning vector variable.
        source: VariableKey,
        /// Component index (0 = x, 1 = y, 2 = z).
        index: usize,
    },
}

/// Handle to a registered solution variable.
///
/// Equality and hashing are by key, so clones of the same registration
/// compare equal.
#[derive(Debug, Clone)]
pub struct Variable {
    key: VariableKey,
    name: Arc<str>,
    kind: VariableKind,
}

impl Variable {
    /// Registry-unique key.
    pub fn key(&self) -> VariableKey {
        self.key
    }

    /// Display name (components are suffixed `_X`/`_Y`/`_Z`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Variable kind.
    pub fn kind(&self) -> VariableKind {
        self.kind
    }

    /// Whether this is a component of a vector variable.
    pub fn is_component(&self) -> bool {
        matches!(self.kind, VariableKind::Component { .. })
    }

    /// Key used for per-variable accounting: components resolve to their
    /// source vector variable, everything else to itself.
    pub fn effective_key(&self) -> VariableKey {
        match self.kind {
            VariableKind::Component { source, .. } => source,
            _ => self.key,
        }
    }
}

impl PartialEq for Variable {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Variable {}

impl std::hash::Hash for Variable {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

/// A vector variable together with its three component handles.
#[derive(Debug, Clone)]
pub struct Vector3Variable {
    /// The vector (source) variable.
    pub source: Variable,
    /// Component variables in x, y, z order.
    pub components: [Variable; 3],
}

/// Registry assigning unique keys to variables.
///
/// Registering a name twice returns the existing handle.
#[derive(Debug, Default)]
pub struct VariableRegistry {
    by_name: HashMap<String, Variable>,
    vectors: HashMap<VariableKey, [Variable; 3]>,
    next_key: VariableKey,
}

const COMPONENT_SUFFIXES: [&str; 3] = ["_X", "_Y", "_Z"];

impl VariableRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self, name: &str, kind: VariableKind) -> Variable {
        let var = Variable {
            key: self.next_key,
            name: Arc::from(name),
            kind,
        };
        self.next_key += 1;
        self.by_name.insert(name.to_string(), var.clone());
        var
    }

    /// Register a scalar variable, or return the existing handle for `name`.
    pub fn scalar(&mut self, name: &str) -> Variable {
        if let Some(existing) = self.by_name.get(name) {
            return existing.clone();
        }
        self.allocate(name, VariableKind::Scalar)
    }

    /// Register a 3-component vector variable and its components, or return
    /// the existing registration for `name`.
    pub fn vector3(&mut self, name: &str) -> Vector3Variable {
        if let Some(existing) = self.by_name.get(name).cloned() {
            if let Some(components) = self.vectors.get(&existing.key) {
                return Vector3Variable {
                    source: existing,
                    components: components.clone(),
                };
            }
        }
        let source = self.allocate(name, VariableKind::Vector3);
        let components = std::array::from_fn(|i| {
            let component_name = format!("{}{}", name, COMPONENT_SUFFIXES[i]);
            self.allocate(
                &component_name,
                VariableKind::Component {
                    source: source.key,
                    index: i,
                },
            )
        });
        self.vectors.insert(source.key, components.clone());
        Vector3Variable { source, components }
    }

    /// Look up a variable by name.
    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.by_name.get(name)
    }

    /// Number of registered variables (components count individually).
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
