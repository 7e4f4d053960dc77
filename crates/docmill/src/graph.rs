//! The conversion graph: capability actions and their connections.

use crate::conversion::ConversionAction;
use crate::datatype::DataType;
use crate::registry::Registry;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

/// Directed multigraph of conversion actions.
///
/// Nodes are (capability, conversion) pairs; an edge runs from `a` to `b`
/// whenever `a`'s output type equals `b`'s input type, so several distinct
/// edges may connect the same type pair. Nodes live in an arena indexed by
/// position, which keeps iteration deterministic (registration order).
///
/// Built once from the registry and read-only afterwards; `&ConversionGraph`
/// can be shared freely across threads.
pub struct ConversionGraph {
    nodes: Vec<Arc<ConversionAction>>,
    successors: Vec<Vec<usize>>,
}

impl ConversionGraph {
    /// Materialize nodes and edges from every registered capability.
    pub fn build(registry: &Registry) -> Self {
        let mut nodes: Vec<Arc<ConversionAction>> = Vec::new();
        for capability in registry.capabilities() {
            for conversion in capability.conversions() {
                let action = ConversionAction::new(conversion, Arc::clone(capability));
                if !nodes.iter().any(|existing| **existing == action) {
                    nodes.push(Arc::new(action));
                }
            }
        }

        // All-pairs scan, self-edges included; the registry is small and
        // static, so O(n²) at build time is acceptable. The path finder's
        // cycle rule suppresses self-loops during search.
        let successors: Vec<Vec<usize>> = nodes
            .iter()
            .map(|from| {
                nodes
                    .iter()
                    .enumerate()
                    .filter(|(_, to)| from.output() == to.input())
                    .map(|(idx, _)| idx)
                    .collect()
            })
            .collect();

        let edges: usize = successors.iter().map(Vec::len).sum();
        debug!(nodes = nodes.len(), edges, "conversion graph built");

        Self { nodes, successors }
    }

    /// All actions, in arena order.
    pub fn nodes(&self) -> &[Arc<ConversionAction>] {
        &self.nodes
    }

    /// The action at `idx`.
    pub fn node(&self, idx: usize) -> &Arc<ConversionAction> {
        &self.nodes[idx]
    }

    /// Number of actions.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the graph has no actions.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Indices of actions whose input type equals the output type of `idx`.
    pub fn successors(&self, idx: usize) -> &[usize] {
        &self.successors[idx]
    }

    /// Indices of every action whose input type equals `input`.
    pub fn start_nodes(&self, input: &DataType) -> Vec<usize> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, action)| action.input() == input)
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Distinct visible input types, sorted.
    ///
    /// These are the conversion entry points advertised to callers.
    pub fn input_formats(&self) -> BTreeSet<DataType> {
        self.nodes
            .iter()
            .filter(|action| action.conversion().visible)
            .map(|action| action.input().clone())
            .collect()
    }
}
