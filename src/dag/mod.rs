// src/dag/mod.rs

//! Task Graph.
//!
//! - [`task`] names the command-line tasks and the typed graph nodes.
//! - [`graph`] expands a task into a small DAG of nodes.
//! - [`scheduler`] tracks node states and decides what is ready.
//! - [`executor`] runs ready nodes concurrently until the graph settles.
//! - [`runner`] maps each node onto the project's operations.

pub mod executor;
pub mod graph;
pub mod runner;
pub mod scheduler;
pub mod task;

pub use executor::{run_graph, NodeRunner};
pub use graph::TaskGraph;
pub use runner::ProjectRunner;
pub use scheduler::{GraphScheduler, NodeState};
pub use task::{Node, TaskName};
