//! Ranked, acyclic conversion path search.
//!
//! Depth-first expansion over the conversion graph with cycle suppression
//! and cost-based pruning. Pure DFS is exponential on densely connected
//! registries; the pruning rule trades "all possible paths" for "all
//! cost-competitive paths", which is what callers picking the cheapest
//! route actually need.

use crate::conversion::ConversionPath;
use crate::datatype::DataType;
use crate::graph::ConversionGraph;
use std::sync::Arc;

/// Raised by callers when no capability chain links the requested types.
#[derive(Debug, Clone, thiserror::Error)]
#[error("no conversion from {from} to {to}")]
pub struct UnsupportedConversion {
    pub from: DataType,
    pub to: DataType,
}

/// Search-internal path candidate over arena indices.
#[derive(Clone)]
struct Candidate {
    nodes: Vec<usize>,
    cost: u32,
}

impl Candidate {
    fn push(&mut self, node: usize, cost: u32) {
        self.nodes.push(node);
        self.cost += cost;
    }
}

/// Depth-first path enumerator over a built conversion graph.
pub struct PathFinder<'a> {
    graph: &'a ConversionGraph,
}

impl<'a> PathFinder<'a> {
    /// Create a finder over `graph`.
    pub fn new(graph: &'a ConversionGraph) -> Self {
        Self { graph }
    }

    /// Every cost-competitive acyclic path starting at `source`, optionally
    /// narrowed to paths ending at `target`.
    ///
    /// The result is sorted by total cost ascending, ties broken by path
    /// length, and never contains two paths with the same
    /// `(input, output, length)` signature where one is strictly cheaper.
    /// Because dominated branches are cut during search, this is a
    /// best-effort ranking, not an exhaustive shortest-path enumeration.
    pub fn find_paths(
        &self,
        source: &DataType,
        target: Option<&DataType>,
    ) -> Vec<ConversionPath> {
        let mut found: Vec<Candidate> = Vec::new();
        for start in self.graph.start_nodes(source) {
            self.expand(
                Candidate {
                    nodes: Vec::new(),
                    cost: 0,
                },
                start,
                &mut found,
                target,
            );
        }
        found.sort_by_key(|candidate| (candidate.cost, candidate.nodes.len()));
        found
            .into_iter()
            .map(|candidate| {
                ConversionPath::new(
                    candidate
                        .nodes
                        .iter()
                        .map(|&idx| Arc::clone(self.graph.node(idx)))
                        .collect(),
                )
            })
            .collect()
    }

    fn expand(
        &self,
        mut current: Candidate,
        node: usize,
        found: &mut Vec<Candidate>,
        target: Option<&DataType>,
    ) {
        let action = self.graph.node(node);
        let len = current.nodes.len();

        // Cycle rule: a type already touched anywhere but the last position
        // kills the branch; a touch at the last position is a closing
        // back-edge, allowed unless it ping-pongs straight back through the
        // node it just came from.
        for (pos, &idx) in current.nodes.iter().enumerate() {
            let touched = self.graph.node(idx);
            if touched.input() == action.input() || touched.output() == action.output() {
                if pos + 1 != len {
                    return;
                }
                if pos > 0 && current.nodes[pos - 1] == node {
                    return;
                }
                current.push(node, action.cost());
                self.emit(&current, found, target);
                // A back-edge closes the path; no expansion past it.
                return;
            }
        }

        current.push(node, action.cost());
        self.emit(&current, found, target);

        // Dominance pruning: stop if a stored path with this signature is
        // already strictly cheaper than what we are carrying.
        if let Some(pos) = self.position_of(&current, found) {
            if found[pos].cost < current.cost {
                return;
            }
        }
        for &succ in self.graph.successors(node) {
            self.expand(current.clone(), succ, found, target);
        }
    }

    /// Dedup/insert: a strictly cheaper candidate replaces the stored
    /// same-signature path in place; a new signature is appended; anything
    /// else is discarded. Paths looping back to their own input type are
    /// no-op round trips and never emitted.
    fn emit(&self, candidate: &Candidate, found: &mut Vec<Candidate>, target: Option<&DataType>) {
        let (input, output) = self.endpoints(candidate);
        if input == output {
            return;
        }
        if let Some(target) = target {
            if output != target {
                return;
            }
        }
        match self.position_of(candidate, found) {
            Some(pos) => {
                if candidate.cost < found[pos].cost {
                    found[pos] = candidate.clone();
                }
            }
            None => found.push(candidate.clone()),
        }
    }

    fn position_of(&self, candidate: &Candidate, found: &[Candidate]) -> Option<usize> {
        let (input, output) = self.endpoints(candidate);
        found.iter().position(|stored| {
            stored.nodes.len() == candidate.nodes.len() && self.endpoints(stored) == (input, output)
        })
    }

    fn endpoints(&self, candidate: &Candidate) -> (&DataType, &DataType) {
        let first = self.graph.node(candidate.nodes[0]);
        let last = self.graph.node(candidate.nodes[candidate.nodes.len() - 1]);
        (first.input(), last.output())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{Capability, ConvertError};
    use crate::conversion::Conversion;
    use crate::datatype::Family;
    use crate::registry::Registry;
    use std::collections::HashSet;
    use std::io::{Read, Write};

    struct StubCapability {
        name: String,
        conversions: Vec<Conversion>,
    }

    impl StubCapability {
        fn new(name: &str, conversions: Vec<Conversion>) -> Self {
            Self {
                name: name.into(),
                conversions,
            }
        }
    }

    impl Capability for StubCapability {
        fn name(&self) -> &str {
            &self.name
        }

        fn conversions(&self) -> Vec<Conversion> {
            self.conversions.clone()
        }

        fn convert(
            &self,
            input: &mut dyn Read,
            output: &mut dyn Write,
            _conversion: &Conversion,
        ) -> Result<(), ConvertError> {
            std::io::copy(input, output)?;
            Ok(())
        }
    }

    fn dt(code: &str) -> DataType {
        DataType::new(code, format!("text/{code}"), "", Family::Text)
    }

    fn conv(from: &str, to: &str, cost: u32) -> Conversion {
        Conversion::new(dt(from), dt(to), cost)
    }

    fn graph_of(edges: &[(&str, &str, u32)]) -> ConversionGraph {
        let mut registry = Registry::new();
        registry.register_capability(StubCapability::new(
            "stub",
            edges.iter().map(|(a, b, c)| conv(a, b, *c)).collect(),
        ));
        ConversionGraph::build(&registry)
    }

    #[test]
    fn test_direct_path_ranked_before_cheaper_chain() {
        let graph = graph_of(&[("a", "b", 2), ("b", "c", 3), ("a", "c", 1)]);
        let finder = PathFinder::new(&graph);

        let paths = finder.find_paths(&dt("a"), Some(&dt("c")));
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0].len(), 1);
        assert_eq!(paths[0].cost(), 1);
        assert_eq!(paths[1].len(), 2);
        assert_eq!(paths[1].cost(), 5);
        assert_eq!(paths[1].to_string(), "a -> b -> c (cost 5)");
    }

    #[test]
    fn test_round_trip_never_emitted() {
        let graph = graph_of(&[("a", "b", 1), ("b", "a", 1)]);
        let finder = PathFinder::new(&graph);

        let paths = finder.find_paths(&dt("a"), None);
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].to_string(), "a -> b (cost 1)");
    }

    #[test]
    fn test_cheaper_equal_signature_path_wins() {
        let mut registry = Registry::new();
        registry.register_capability(StubCapability::new("slow", vec![conv("a", "b", 4)]));
        registry.register_capability(StubCapability::new("fast", vec![conv("a", "b", 2)]));
        let graph = ConversionGraph::build(&registry);
        let finder = PathFinder::new(&graph);

        let paths = finder.find_paths(&dt("a"), Some(&dt("b")));
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].cost(), 2);
        assert_eq!(paths[0].actions()[0].capability().name(), "fast");
    }

    #[test]
    fn test_all_reachable_without_target() {
        let graph = graph_of(&[("a", "b", 1), ("b", "c", 2), ("c", "d", 3)]);
        let finder = PathFinder::new(&graph);

        let paths = finder.find_paths(&dt("a"), None);
        let outputs: Vec<_> = paths
            .iter()
            .map(|p| p.output().unwrap().format.clone())
            .collect();
        assert_eq!(outputs, ["b", "c", "d"]);
    }

    #[test]
    fn test_cost_ordering_holds() {
        let graph = graph_of(&[
            ("a", "b", 7),
            ("a", "c", 1),
            ("c", "b", 1),
            ("b", "d", 1),
            ("c", "d", 9),
        ]);
        let finder = PathFinder::new(&graph);

        let paths = finder.find_paths(&dt("a"), None);
        assert!(!paths.is_empty());
        for pair in paths.windows(2) {
            assert!(pair[0].cost() <= pair[1].cost());
        }
    }

    #[test]
    fn test_returned_paths_are_acyclic() {
        let graph = graph_of(&[
            ("a", "b", 1),
            ("b", "c", 1),
            ("c", "a", 1),
            ("b", "a", 1),
            ("a", "c", 2),
            ("c", "b", 2),
        ]);
        let finder = PathFinder::new(&graph);

        for path in finder.find_paths(&dt("a"), None) {
            let mut inputs = HashSet::new();
            let mut outputs = HashSet::new();
            for action in path.actions() {
                assert!(inputs.insert(action.input().format.clone()), "path revisits an input type: {path}");
                assert!(outputs.insert(action.output().format.clone()), "path revisits an output type: {path}");
            }
            assert_ne!(path.input(), path.output(), "no-op round trip emitted: {path}");
        }
    }

    #[test]
    fn test_self_conversion_rejected_as_first_step() {
        let graph = graph_of(&[("a", "a", 1)]);
        let finder = PathFinder::new(&graph);
        assert!(finder.find_paths(&dt("a"), None).is_empty());
    }

    #[test]
    fn test_back_edge_closes_path() {
        // c->c touches the type the previous step produced; it may close the
        // path but not extend it further.
        let graph = graph_of(&[("a", "b", 1), ("b", "c", 1), ("c", "c", 1)]);
        let finder = PathFinder::new(&graph);

        let paths = finder.find_paths(&dt("a"), None);
        let rendered: Vec<_> = paths.iter().map(|p| p.to_string()).collect();
        assert_eq!(
            rendered,
            [
                "a -> b (cost 1)",
                "a -> b -> c (cost 2)",
                "a -> b -> c -> c (cost 3)",
            ]
        );
    }

    #[test]
    fn test_unknown_source_yields_no_paths() {
        let graph = graph_of(&[("a", "b", 1)]);
        let finder = PathFinder::new(&graph);
        assert!(finder.find_paths(&dt("nope"), None).is_empty());
        assert!(finder.find_paths(&dt("a"), Some(&dt("nope"))).is_empty());
    }

    #[test]
    fn test_dedup_law() {
        let graph = graph_of(&[
            ("a", "b", 1),
            ("b", "c", 1),
            ("a", "c", 5),
            ("c", "d", 1),
        ]);
        let finder = PathFinder::new(&graph);

        let paths = finder.find_paths(&dt("a"), None);
        for (i, p) in paths.iter().enumerate() {
            for q in &paths[i + 1..] {
                let same_signature = p.input() == q.input()
                    && p.output() == q.output()
                    && p.len() == q.len();
                assert!(
                    !(same_signature && p.cost() != q.cost()),
                    "dominated duplicate kept: {p} vs {q}"
                );
            }
        }
    }
}
