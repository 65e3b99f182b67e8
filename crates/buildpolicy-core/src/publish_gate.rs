//! Publish gate.
//!
//! Turns a [`Channel`] decision into upload-task enablement. Of the two upload
//! targets at most one is ever enabled, and a composite entry point is
//! registered that depends on the release-tag step and both targets.

use crate::channel::Channel;
use crate::error::{PolicyError, Result};
use crate::graph::TaskGraph;
use crate::obs;
use crate::task::{Task, TaskKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Task names wired by the publish gate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PublishGateConfig {
    /// Upload target enabled for tagged releases.
    pub release_target: String,
    /// Upload target enabled for continuous snapshots.
    pub snapshot_target: String,
    /// Step that tags the release in version control.
    pub release_step: String,
    /// Name of the composite entry point created by the gate.
    pub entry_point: String,
    pub entry_point_group: String,
}

impl Default for PublishGateConfig {
    fn default() -> Self {
        Self {
            release_target: "bintrayUpload".to_string(),
            snapshot_target: "artifactoryPublish".to_string(),
            release_step: "release".to_string(),
            entry_point: "publish".to_string(),
            entry_point_group: "publishing".to_string(),
        }
    }
}

/// Gate state. Starts `Undetermined`; one transition per build invocation.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GateState {
    #[default]
    Undetermined,
    ReleaseEnabled,
    SnapshotEnabled,
    Suppressed,
}

impl GateState {
    /// The only transition out of `Undetermined`.
    pub fn from_channel(channel: Channel) -> Self {
        match channel {
            Channel::TaggedRelease => GateState::ReleaseEnabled,
            Channel::ContinuousSnapshot => GateState::SnapshotEnabled,
            Channel::None => GateState::Suppressed,
        }
    }

    /// Channel this state was reached from, if any.
    pub fn channel(&self) -> Option<Channel> {
        match self {
            GateState::Undetermined => None,
            GateState::ReleaseEnabled => Some(Channel::TaggedRelease),
            GateState::SnapshotEnabled => Some(Channel::ContinuousSnapshot),
            GateState::Suppressed => Some(Channel::None),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GateState::Undetermined => "UNDETERMINED",
            GateState::ReleaseEnabled => "RELEASE_ENABLED",
            GateState::SnapshotEnabled => "SNAPSHOT_ENABLED",
            GateState::Suppressed => "SUPPRESSED",
        }
    }
}

impl fmt::Display for GateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Single-use publish gate for one build invocation.
#[derive(Debug, Clone)]
pub struct PublishGate {
    config: PublishGateConfig,
    state: GateState,
}

impl PublishGate {
    pub fn new(config: PublishGateConfig) -> Self {
        Self {
            config,
            state: GateState::Undetermined,
        }
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    /// Apply `decision` to the graph.
    ///
    /// Fails without touching the graph if any of the upload targets or the
    /// release step is missing, if the entry point name is taken, or if the
    /// gate was already applied. Target enablement only changes once the
    /// entry point has been registered.
    pub fn apply(&mut self, decision: Channel, graph: &mut TaskGraph) -> Result<GateState> {
        if self.state != GateState::Undetermined {
            return Err(PolicyError::GateAlreadyApplied {
                state: self.state.to_string(),
            });
        }

        let cfg = &self.config;
        for name in [&cfg.release_target, &cfg.snapshot_target, &cfg.release_step] {
            graph.id_of(name)?;
        }
        if graph.contains(&cfg.entry_point) {
            return Err(PolicyError::DuplicateTask {
                name: cfg.entry_point.clone(),
            });
        }

        let entry = Task::new(cfg.entry_point.clone(), TaskKind::Lifecycle)
            .with_group(cfg.entry_point_group.clone())
            .with_dependency(cfg.release_step.clone())
            .with_dependency(cfg.release_target.clone())
            .with_dependency(cfg.snapshot_target.clone());
        graph.add_task(entry)?;

        let next = GateState::from_channel(decision);
        graph
            .select_by_name_mut(&cfg.release_target)?
            .set_enabled(next == GateState::ReleaseEnabled);
        graph
            .select_by_name_mut(&cfg.snapshot_target)?
            .set_enabled(next == GateState::SnapshotEnabled);

        self.state = next;
        obs::emit_gate_applied(next, &cfg.release_target, &cfg.snapshot_target);
        Ok(next)
    }
}

/// Apply a fresh gate to `graph`.
pub fn configure_publish_gate(
    decision: Channel,
    config: &PublishGateConfig,
    graph: &mut TaskGraph,
) -> Result<GateState> {
    PublishGate::new(config.clone()).apply(decision, graph)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_with_targets() -> TaskGraph {
        let mut graph = TaskGraph::new();
        graph.add_task(Task::new("release", TaskKind::ReleaseTag)).unwrap();
        graph.add_task(Task::new("bintrayUpload", TaskKind::Upload)).unwrap();
        graph
            .add_task(Task::new("artifactoryPublish", TaskKind::Upload))
            .unwrap();
        graph
    }

    fn enabled(graph: &TaskGraph, name: &str) -> bool {
        graph.select_by_name(name).unwrap().is_enabled()
    }

    #[test]
    fn test_state_transitions() {
        assert_eq!(
            GateState::from_channel(Channel::TaggedRelease),
            GateState::ReleaseEnabled
        );
        assert_eq!(
            GateState::from_channel(Channel::ContinuousSnapshot),
            GateState::SnapshotEnabled
        );
        assert_eq!(GateState::from_channel(Channel::None), GateState::Suppressed);
        assert_eq!(GateState::Undetermined.channel(), None);
    }

    #[test]
    fn test_release_enables_only_release_target() {
        let mut graph = graph_with_targets();
        let state =
            configure_publish_gate(Channel::TaggedRelease, &PublishGateConfig::default(), &mut graph)
                .unwrap();
        assert_eq!(state, GateState::ReleaseEnabled);
        assert!(enabled(&graph, "bintrayUpload"));
        assert!(!enabled(&graph, "artifactoryPublish"));
    }

    #[test]
    fn test_none_disables_both() {
        let mut graph = graph_with_targets();
        configure_publish_gate(Channel::None, &PublishGateConfig::default(), &mut graph).unwrap();
        assert!(!enabled(&graph, "bintrayUpload"));
        assert!(!enabled(&graph, "artifactoryPublish"));
    }

    #[test]
    fn test_entry_point_dependencies() {
        let mut graph = graph_with_targets();
        configure_publish_gate(
            Channel::ContinuousSnapshot,
            &PublishGateConfig::default(),
            &mut graph,
        )
        .unwrap();

        let publish = graph.select_by_name("publish").unwrap();
        assert_eq!(publish.kind(), &TaskKind::Lifecycle);
        assert_eq!(publish.group(), Some("publishing"));
        assert_eq!(
            publish.depends_on(),
            &[
                "release".to_string(),
                "bintrayUpload".to_string(),
                "artifactoryPublish".to_string()
            ]
        );
    }

    #[test]
    fn test_gate_applies_once() {
        let mut graph = graph_with_targets();
        let mut gate = PublishGate::new(PublishGateConfig::default());
        gate.apply(Channel::None, &mut graph).unwrap();
        let err = gate.apply(Channel::TaggedRelease, &mut graph).unwrap_err();
        assert!(matches!(err, PolicyError::GateAlreadyApplied { .. }));
        assert_eq!(gate.state(), GateState::Suppressed);
        assert!(!enabled(&graph, "bintrayUpload"));
    }

    #[test]
    fn test_taken_entry_point_leaves_targets_untouched() {
        let mut graph = graph_with_targets();
        graph
            .select_by_name_mut("artifactoryPublish")
            .unwrap()
            .set_enabled(false);
        graph.add_task(Task::new("publish", TaskKind::Lifecycle)).unwrap();

        let mut gate = PublishGate::new(PublishGateConfig::default());
        let err = gate.apply(Channel::None, &mut graph).unwrap_err();

        assert!(matches!(err, PolicyError::DuplicateTask { ref name } if name == "publish"));
        assert!(enabled(&graph, "bintrayUpload"));
        assert!(!enabled(&graph, "artifactoryPublish"));
        assert_eq!(gate.state(), GateState::Undetermined);
        assert!(graph.select_by_name("publish").unwrap().depends_on().is_empty());
    }

    #[test]
    fn test_missing_release_step_fails() {
        let mut graph = TaskGraph::new();
        graph.add_task(Task::new("bintrayUpload", TaskKind::Upload)).unwrap();
        graph
            .add_task(Task::new("artifactoryPublish", TaskKind::Upload))
            .unwrap();
        let err = configure_publish_gate(Channel::None, &PublishGateConfig::default(), &mut graph)
            .unwrap_err();
        assert!(matches!(err, PolicyError::TaskNotFound { name } if name == "release"));
        assert!(!graph.contains("publish"));
    }
}
