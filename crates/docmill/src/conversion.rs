//! Conversion descriptors, graph actions and paths.

use crate::capability::{Capability, ConvertError};
use crate::datatype::DataType;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::io::{Read, Write};
use std::sync::Arc;

/// One legal transformation between two formats.
///
/// Equality and hashing consider `(input, output, options)`; cost and
/// visibility are ranking metadata, not identity. Two differently-configured
/// conversions over the same type pair stay distinct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversion {
    /// Source format.
    pub input: DataType,
    /// Target format.
    pub output: DataType,
    /// Higher cost = more expensive, lower priority.
    pub cost: u32,
    /// Whether this conversion is advertised as a selectable entry point.
    pub visible: bool,
    /// Free-form configuration handed to the capability at execution time.
    #[serde(default)]
    pub options: IndexMap<String, String>,
}

impl Conversion {
    /// Create a visible conversion with no options.
    pub fn new(input: DataType, output: DataType, cost: u32) -> Self {
        Self {
            input,
            output,
            cost,
            visible: true,
            options: IndexMap::new(),
        }
    }

    /// Mark this conversion as not advertised as an entry point.
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Attach a configuration option.
    pub fn option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }
}

impl PartialEq for Conversion {
    fn eq(&self, other: &Self) -> bool {
        self.input == other.input && self.output == other.output && self.options == other.options
    }
}

impl Eq for Conversion {}

impl Hash for Conversion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.input.hash(state);
        self.output.hash(state);
        for (key, value) in &self.options {
            key.hash(state);
            value.hash(state);
        }
    }
}

impl fmt::Display for Conversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.input, self.output)
    }
}

/// A node in the conversion graph: one conversion bound to the capability
/// instance that performs it.
///
/// Equality is capability identity plus conversion equality, so two
/// capabilities advertising the same type pair remain distinct nodes.
#[derive(Clone)]
pub struct ConversionAction {
    conversion: Conversion,
    capability: Arc<dyn Capability>,
}

impl ConversionAction {
    /// Bind a conversion to the capability that performs it.
    pub fn new(conversion: Conversion, capability: Arc<dyn Capability>) -> Self {
        Self {
            conversion,
            capability,
        }
    }

    /// The bound conversion.
    pub fn conversion(&self) -> &Conversion {
        &self.conversion
    }

    /// The capability performing it.
    pub fn capability(&self) -> &Arc<dyn Capability> {
        &self.capability
    }

    /// Input format of this action.
    pub fn input(&self) -> &DataType {
        &self.conversion.input
    }

    /// Output format of this action.
    pub fn output(&self) -> &DataType {
        &self.conversion.output
    }

    /// Cost of this action.
    pub fn cost(&self) -> u32 {
        self.conversion.cost
    }

    /// Run the bound capability over the given streams.
    pub fn convert(
        &self,
        input: &mut dyn Read,
        output: &mut dyn Write,
    ) -> Result<(), ConvertError> {
        self.capability.convert(input, output, &self.conversion)
    }
}

impl PartialEq for ConversionAction {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.capability, &other.capability) && self.conversion == other.conversion
    }
}

impl Eq for ConversionAction {}

impl fmt::Debug for ConversionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionAction")
            .field("conversion", &self.conversion)
            .field("capability", &self.capability.name())
            .finish()
    }
}

impl fmt::Display for ConversionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.conversion, self.capability.name())
    }
}

/// An ordered chain of conversion actions from a source type to an output
/// type.
///
/// Paths are created per search request; duplicate detection during search
/// uses the `(input, output, length)` signature, and result ordering is by
/// total cost ascending, ties broken by length.
#[derive(Debug, Clone)]
pub struct ConversionPath {
    actions: Vec<Arc<ConversionAction>>,
}

impl ConversionPath {
    /// Create a path from an ordered action sequence.
    pub fn new(actions: Vec<Arc<ConversionAction>>) -> Self {
        Self { actions }
    }

    /// The actions, in execution order.
    pub fn actions(&self) -> &[Arc<ConversionAction>] {
        &self.actions
    }

    /// Number of stages.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether the path has no stages.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Input format of the first action.
    pub fn input(&self) -> Option<&DataType> {
        self.actions.first().map(|a| a.input())
    }

    /// Output format of the last action.
    pub fn output(&self) -> Option<&DataType> {
        self.actions.last().map(|a| a.output())
    }

    /// Sum of the action costs.
    pub fn cost(&self) -> u32 {
        self.actions.iter().map(|a| a.cost()).sum()
    }
}

impl fmt::Display for ConversionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.actions.first() {
            Some(first) => write!(f, "{}", first.input().format)?,
            None => return f.write_str("(empty)"),
        }
        for action in &self.actions {
            write!(f, " -> {}", action.output().format)?;
        }
        write!(f, " (cost {})", self.cost())
    }
}
