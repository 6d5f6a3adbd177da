// src/dag/scheduler.rs

use std::collections::BTreeMap;

use tracing::debug;

use crate::dag::graph::TaskGraph;
use crate::dag::task::Node;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    Pending,
    Running,
    Succeeded,
    Failed,
    /// Never started because a dependency failed.
    Skipped,
}

/// Per-invocation state of every node in a [`TaskGraph`].
///
/// Pure bookkeeping: callers start ready nodes and report completions.
#[derive(Debug)]
pub struct GraphScheduler<'a> {
    graph: &'a TaskGraph,
    states: BTreeMap<Node, NodeState>,
}

impl<'a> GraphScheduler<'a> {
    pub fn new(graph: &'a TaskGraph) -> Self {
        let states = graph.nodes().map(|n| (n, NodeState::Pending)).collect();
        Self { graph, states }
    }

    pub fn state(&self, node: Node) -> Option<NodeState> {
        self.states.get(&node).copied()
    }

    /// Pending nodes whose dependencies have all succeeded.
    pub fn ready(&self) -> Vec<Node> {
        self.states
            .iter()
            .filter(|(_, state)| **state == NodeState::Pending)
            .map(|(node, _)| *node)
            .filter(|node| {
                self.graph
                    .dependencies_of(*node)
                    .iter()
                    .all(|dep| self.state(*dep) == Some(NodeState::Succeeded))
            })
            .collect()
    }

    pub fn start(&mut self, node: Node) {
        self.set(node, NodeState::Running);
    }

    /// Record a finished node. On failure every transitive dependent that has
    /// not started is skipped; the skipped nodes are returned.
    pub fn complete(&mut self, node: Node, success: bool) -> Vec<Node> {
        if success {
            self.set(node, NodeState::Succeeded);
            return Vec::new();
        }

        self.set(node, NodeState::Failed);
        let mut skipped = Vec::new();
        let mut stack = self.graph.dependents_of(node);
        while let Some(next) = stack.pop() {
            if self.state(next) == Some(NodeState::Pending) {
                self.set(next, NodeState::Skipped);
                skipped.push(next);
                stack.extend(self.graph.dependents_of(next));
            }
        }
        skipped
    }

    /// True once no node is pending or running.
    pub fn is_finished(&self) -> bool {
        self.states
            .values()
            .all(|s| !matches!(s, NodeState::Pending | NodeState::Running))
    }

    pub fn failed(&self) -> Vec<Node> {
        self.in_state(NodeState::Failed)
    }

    pub fn skipped(&self) -> Vec<Node> {
        self.in_state(NodeState::Skipped)
    }

    fn in_state(&self, wanted: NodeState) -> Vec<Node> {
        self.states
            .iter()
            .filter(|(_, state)| **state == wanted)
            .map(|(node, _)| *node)
            .collect()
    }

    fn set(&mut self, node: Node, state: NodeState) {
        debug!(task = %node, ?state, "task state changed");
        self.states.insert(node, state);
    }
}
