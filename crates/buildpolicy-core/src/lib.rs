//! Build policy core.
//!
//! Attaches cross-cutting behavior to a build's task graph without touching
//! the task definitions themselves:
//! - Compiler diagnostics, static analysis and documentation options applied
//!   to every matching task once the graph is stable
//! - Dependency-resolution rule additions
//! - A publish gate that enables at most one upload channel, chosen from CI
//!   environment signals
//!
//! Configuration runs in two phases. Policies register deferred actions with a
//! [`DeferredRegistry`]; [`DeferredRegistry::finalize`] runs them once, after
//! all tasks are known.

pub mod build;
pub mod channel;
pub mod config;
pub mod deferred;
pub mod env;
pub mod error;
pub mod graph;
pub mod obs;
pub mod policy;
pub mod publish_gate;
pub mod report;
pub mod resolution;
pub mod task;
pub mod telemetry;

pub use build::{Build, BuildManifest, TaskDecl};
pub use channel::{decide, Channel};
pub use config::PolicyConfig;
pub use deferred::{DeferredRegistry, FinalizeSummary};
pub use env::{EnvSnapshot, PullRequestFlag, SignalNames};
pub use error::{PolicyError, Result};
pub use graph::{GraphPhase, TaskGraph, TaskId, TaskSelector};
pub use policy::{Policy, PolicySet};
pub use publish_gate::{configure_publish_gate, GateState, PublishGate, PublishGateConfig};
pub use report::ConfigurationReport;
pub use resolution::ResolutionRules;
pub use task::{DocOptions, Task, TaskKind, TaskOptions, Visibility};
pub use telemetry::init_tracing;
