// src/dag/graph.rs

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use petgraph::Direction;

use crate::dag::task::{Node, TaskName};
use crate::types::AssetKind;

/// Nodes of one task invocation with "must finish before" edges.
///
/// Graphs are built from a fixed shape per [`TaskName`] and are acyclic by
/// construction.
#[derive(Debug, Clone)]
pub struct TaskGraph {
    graph: DiGraphMap<Node, ()>,
}

impl TaskGraph {
    pub fn for_task(task: TaskName) -> Self {
        let mut graph = DiGraphMap::new();
        match task {
            TaskName::Clean => {
                graph.add_node(Node::Clean);
            }
            TaskName::Clear => {
                graph.add_node(Node::Clear);
            }
            TaskName::Watch | TaskName::Default => {
                graph.add_node(Node::Watch);
            }
            TaskName::Stage(kind) => {
                graph.add_node(Node::Stage(kind));
            }
            TaskName::Build => add_build(&mut graph),
            TaskName::Dev => {
                add_build(&mut graph);
                for kind in AssetKind::ALL {
                    graph.add_edge(Node::Stage(kind), Node::Watch, ());
                }
            }
        }
        Self { graph }
    }

    pub fn nodes(&self) -> impl Iterator<Item = Node> + '_ {
        self.graph.nodes()
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn contains(&self, node: Node) -> bool {
        self.graph.contains_node(node)
    }

    /// Nodes that must finish before `node` starts.
    pub fn dependencies_of(&self, node: Node) -> Vec<Node> {
        self.graph.neighbors_directed(node, Direction::Incoming).collect()
    }

    /// Nodes waiting on `node`.
    pub fn dependents_of(&self, node: Node) -> Vec<Node> {
        self.graph.neighbors_directed(node, Direction::Outgoing).collect()
    }

    /// Every node after all of its dependencies.
    pub fn topological_order(&self) -> Vec<Node> {
        match toposort(&self.graph, None) {
            Ok(order) => order,
            // Unreachable for graphs built by `for_task`.
            Err(_) => self.graph.nodes().collect(),
        }
    }
}

/// `clean` first, then the six stages with no order between them.
fn add_build(graph: &mut DiGraphMap<Node, ()>) {
    graph.add_node(Node::Clean);
    for kind in AssetKind::ALL {
        graph.add_edge(Node::Clean, Node::Stage(kind), ());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_is_clean_then_six_independent_stages() {
        let graph = TaskGraph::for_task(TaskName::Build);

        assert_eq!(graph.len(), 7);
        assert!(graph.dependencies_of(Node::Clean).is_empty());
        for kind in AssetKind::ALL {
            assert_eq!(graph.dependencies_of(Node::Stage(kind)), vec![Node::Clean]);
        }
        assert_eq!(graph.topological_order()[0], Node::Clean);
    }

    #[test]
    fn dev_watches_after_every_stage() {
        let graph = TaskGraph::for_task(TaskName::Dev);

        let mut deps = graph.dependencies_of(Node::Watch);
        deps.sort();
        let mut expected: Vec<Node> = AssetKind::ALL.into_iter().map(Node::Stage).collect();
        expected.sort();
        assert_eq!(deps, expected);
        assert_eq!(graph.topological_order().last(), Some(&Node::Watch));
    }

    #[test]
    fn default_is_watch_alone() {
        let graph = TaskGraph::for_task(TaskName::Default);
        assert_eq!(graph.nodes().collect::<Vec<_>>(), vec![Node::Watch]);
    }

    #[test]
    fn single_stage_task_has_no_clean() {
        let graph = TaskGraph::for_task(TaskName::Stage(AssetKind::Img));
        assert!(!graph.contains(Node::Clean));
        assert_eq!(graph.len(), 1);
    }
}
